//! Response cache for read-heavy API views.
//!
//! [`ResponseCache`] stores serialized JSON responses under string keys
//! (see `folio_core::cache_keys`), each tagged with the resources it was
//! built from. Mutating handlers drop entries by tag; admins can drop them
//! by glob pattern or clear everything.

mod response_cache;

pub use response_cache::{CacheConfig, CacheGeneration, CacheStats, ResponseCache};
