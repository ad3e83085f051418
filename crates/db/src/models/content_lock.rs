//! Documentation content-lock model.

use folio_core::content_lock::LockHolder;
use folio_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `content_locks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContentLock {
    pub id: DbId,
    pub content_id: DbId,
    pub user_id: DbId,
    pub user_name: String,
    pub locked_at: Timestamp,
    pub expires_at: Timestamp,
}

impl ContentLock {
    pub fn holder(&self) -> LockHolder {
        LockHolder {
            user_id: self.user_id,
            user_name: self.user_name.clone(),
            expires_at: self.expires_at,
        }
    }
}

/// A released lock together with the library its content belongs to.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReleasedLock {
    pub content_id: DbId,
    pub library_type: String,
}
