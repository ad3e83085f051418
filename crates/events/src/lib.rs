//! Folio content event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`ContentEvent`]: the envelope every mutation publishes, serialized to
//!   WebSocket clients as `{ "type", "data", "timestamp" }`.

pub mod bus;

pub use bus::{ContentEvent, EventBus};
