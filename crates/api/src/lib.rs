//! Folio HTTP and WebSocket server.
//!
//! The binary in `main.rs` wires these modules together; integration tests
//! build the same router through [`router::build_app_router`].

pub mod auth;
pub mod background;
pub mod broadcaster;
pub mod cached;
pub mod collab;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notify;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;
