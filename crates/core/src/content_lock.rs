//! Documentation content-lock rules.
//!
//! A lock records which user is editing a documentation content item. Locks
//! are advisory: they drive the editor UI and gate the collaborative
//! `update_content` relay, but the REST update path does not consult them.
//! Expiry is purely time based, with no fencing token.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Lock lifetime in minutes, counted from the last acquire/refresh.
pub const LOCK_DURATION_MINS: i64 = 30;

/// How often the expired-lock cleanup task runs (in seconds).
pub const LOCK_CLEANUP_INTERVAL_SECS: u64 = 60;

/// Maximum length of a library type identifier.
pub const MAX_LIBRARY_TYPE_LEN: usize = 64;

/// Room prefix for documentation library rooms.
const LIBRARY_ROOM_PREFIX: &str = "documentation_";

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

/// WebSocket room name for a documentation library.
pub fn library_room(library_type: &str) -> String {
    format!("{LIBRARY_ROOM_PREFIX}{library_type}")
}

/// Validate a library type: non-empty, bounded, `[a-z0-9_-]` only.
pub fn validate_library_type(library_type: &str) -> Result<(), String> {
    if library_type.is_empty() {
        return Err("library_type must not be empty".to_string());
    }
    if library_type.len() > MAX_LIBRARY_TYPE_LEN {
        return Err(format!(
            "library_type must be at most {MAX_LIBRARY_TYPE_LEN} characters"
        ));
    }
    if !library_type
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(format!(
            "library_type '{library_type}' may only contain lowercase letters, digits, '_' and '-'"
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Lock evaluation
// ---------------------------------------------------------------------------

/// The holder of an existing lock row, as far as the rules are concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockHolder {
    pub user_id: DbId,
    pub user_name: String,
    pub expires_at: Timestamp,
}

impl LockHolder {
    /// A lock whose expiry is not in the future is treated as absent.
    pub fn is_live(&self, now: Timestamp) -> bool {
        self.expires_at > now
    }
}

/// Outcome of a lock acquisition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockDecision {
    /// No live lock exists: create one.
    Acquire,
    /// The requester already holds the lock: push the expiry out.
    Refresh,
    /// Another user holds a live lock.
    Denied(LockHolder),
}

/// Decide what an acquire request from `requester` should do.
pub fn evaluate_lock(existing: Option<&LockHolder>, requester: DbId, now: Timestamp) -> LockDecision {
    match existing {
        Some(holder) if holder.is_live(now) => {
            if holder.user_id == requester {
                LockDecision::Refresh
            } else {
                LockDecision::Denied(holder.clone())
            }
        }
        _ => LockDecision::Acquire,
    }
}

/// Outcome of a lock release attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseDecision {
    /// Delete the lock row.
    Release,
    /// Nothing to release.
    NotLocked,
    /// Someone else holds the lock and the requester is not an admin.
    NotHolder,
}

/// Decide whether `requester` may release the lock on a content item.
///
/// Admins may release any lock; everyone else only their own.
pub fn can_release(
    existing: Option<&LockHolder>,
    requester: DbId,
    is_admin: bool,
    now: Timestamp,
) -> ReleaseDecision {
    match existing {
        Some(holder) if holder.is_live(now) => {
            if holder.user_id == requester || is_admin {
                ReleaseDecision::Release
            } else {
                ReleaseDecision::NotHolder
            }
        }
        _ => ReleaseDecision::NotLocked,
    }
}

/// Expiry timestamp for a lock acquired or refreshed at `now`.
pub fn lock_expiry(now: Timestamp) -> Timestamp {
    now + chrono::Duration::minutes(LOCK_DURATION_MINS)
}
