//! Repository for the `content_locks` table.
//!
//! One row per documentation content item. A row whose `expires_at` has
//! passed is treated as absent and is taken over by the next acquirer.

use folio_core::content_lock::LOCK_DURATION_MINS;
use folio_core::types::DbId;
use sqlx::PgPool;

use crate::models::content_lock::{ContentLock, ReleasedLock};

const COLUMNS: &str = "id, content_id, user_id, user_name, locked_at, expires_at";

/// Provides acquire/release/cleanup for documentation editor locks.
pub struct ContentLockRepo;

impl ContentLockRepo {
    /// Acquire or refresh the lock on a content item.
    ///
    /// Atomic upsert on `content_id`: inserts when no row exists, takes over
    /// an expired row, and restarts both `locked_at` and the expiry when
    /// `user_id` already holds the lock. Returns `None` when another user
    /// holds an unexpired lock.
    pub async fn acquire(
        pool: &PgPool,
        content_id: DbId,
        user_id: DbId,
        user_name: &str,
    ) -> Result<Option<ContentLock>, sqlx::Error> {
        let query = format!(
            "INSERT INTO content_locks (content_id, user_id, user_name, locked_at, expires_at)
             VALUES ($1, $2, $3, NOW(), NOW() + INTERVAL '{LOCK_DURATION_MINS} minutes')
             ON CONFLICT (content_id) DO UPDATE SET
                locked_at = NOW(),
                user_id = EXCLUDED.user_id,
                user_name = EXCLUDED.user_name,
                expires_at = EXCLUDED.expires_at
             WHERE content_locks.user_id = EXCLUDED.user_id
                OR content_locks.expires_at <= NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentLock>(&query)
            .bind(content_id)
            .bind(user_id)
            .bind(user_name)
            .fetch_optional(pool)
            .await
    }

    /// The unexpired lock on a content item, if any.
    pub async fn get_active(
        pool: &PgPool,
        content_id: DbId,
    ) -> Result<Option<ContentLock>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_locks WHERE content_id = $1 AND expires_at > NOW()"
        );
        sqlx::query_as::<_, ContentLock>(&query)
            .bind(content_id)
            .fetch_optional(pool)
            .await
    }

    /// Release a lock held by `user_id`. Returns `true` if a row was removed.
    pub async fn release(pool: &PgPool, content_id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM content_locks WHERE content_id = $1 AND user_id = $2")
            .bind(content_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Release a lock regardless of holder (admin override).
    pub async fn force_release(pool: &PgPool, content_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM content_locks WHERE content_id = $1")
            .bind(content_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Release every lock held by a user, returning what was released.
    pub async fn release_all_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<ReleasedLock>, sqlx::Error> {
        sqlx::query_as::<_, ReleasedLock>(
            "DELETE FROM content_locks cl
             USING doc_contents dc
             WHERE cl.user_id = $1 AND dc.id = cl.content_id
             RETURNING cl.content_id, dc.library_type",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Delete expired locks. Returns the number of rows removed.
    pub async fn cleanup_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM content_locks WHERE expires_at < NOW()")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
