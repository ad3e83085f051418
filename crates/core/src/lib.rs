//! Folio domain core.
//!
//! Zero-IO building blocks shared by the repository layer, the HTTP API and
//! the WebSocket handlers: identifiers, the domain error type, role rules,
//! content-lock rules, cache key scheme, and the small pure helpers used by
//! the blog, documentation and commerce resources.

pub mod blog;
pub mod cache_keys;
pub mod comments;
pub mod commerce;
pub mod content_lock;
pub mod error;
pub mod event_types;
pub mod pagination;
pub mod roles;
pub mod slug;
pub mod tree;
pub mod types;
pub mod validation;
