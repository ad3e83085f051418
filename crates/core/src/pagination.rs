//! Pagination defaults and clamping helpers.

/// Default page size for list endpoints.
pub const DEFAULT_LIMIT: i64 = 20;

/// Maximum page size for list endpoints.
pub const MAX_LIMIT: i64 = 100;

/// Clamp a caller-supplied limit into `1..=max`, falling back to `default`.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}

/// Clamp a caller-supplied offset to be non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}
