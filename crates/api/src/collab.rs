//! Content-lock operations shared by the REST lock endpoints and the
//! WebSocket collaboration protocol.
//!
//! Each operation applies the rules in `folio_core::content_lock`, writes
//! through [`ContentLockRepo`], and announces the change to the content's
//! library room.

use chrono::Utc;
use folio_core::content_lock::{
    can_release, evaluate_lock, library_room, LockDecision, LockHolder, ReleaseDecision,
};
use folio_core::event_types::collab;
use folio_core::types::DbId;
use folio_db::models::content_lock::ContentLock;
use folio_db::repositories::{ContentLockRepo, DocContentRepo};
use folio_events::ContentEvent;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Who is asking for a lock.
#[derive(Debug, Clone)]
pub struct LockRequester<'a> {
    pub user_id: DbId,
    pub user_name: &'a str,
    pub is_admin: bool,
    /// WebSocket connection to leave out of the room announcement.
    pub conn_id: Option<&'a str>,
}

#[derive(Debug)]
pub enum AcquireOutcome {
    /// The requester now holds the lock (new or refreshed).
    Acquired(ContentLock),
    /// Another user holds an unexpired lock.
    Held(LockHolder),
}

#[derive(Debug)]
pub enum ReleaseOutcome {
    Released,
    NotLocked,
    NotHolder(LockHolder),
}

/// Library type of a content item, or 404.
async fn library_of(state: &AppState, content_id: DbId) -> AppResult<String> {
    DocContentRepo::library_type_of(&state.pool, content_id)
        .await?
        .ok_or_else(|| AppError::not_found("DocContent", content_id))
}

/// Acquire or refresh the lock on a content item.
pub async fn acquire(
    state: &AppState,
    content_id: DbId,
    requester: &LockRequester<'_>,
) -> AppResult<AcquireOutcome> {
    let library_type = library_of(state, content_id).await?;

    let existing = ContentLockRepo::get_active(&state.pool, content_id).await?;
    let holder = existing.as_ref().map(ContentLock::holder);
    if let LockDecision::Denied(holder) = evaluate_lock(holder.as_ref(), requester.user_id, Utc::now())
    {
        return Ok(AcquireOutcome::Held(holder));
    }

    let Some(lock) = ContentLockRepo::acquire(
        &state.pool,
        content_id,
        requester.user_id,
        requester.user_name,
    )
    .await?
    else {
        // Another editor won the race between the read and the upsert.
        return match ContentLockRepo::get_active(&state.pool, content_id).await? {
            Some(lock) => Ok(AcquireOutcome::Held(lock.holder())),
            None => Err(AppError::Core(folio_core::error::CoreError::Conflict(
                "Lock changed concurrently, retry".into(),
            ))),
        };
    };

    tracing::info!(
        content_id,
        user_id = requester.user_id,
        expires_at = %lock.expires_at,
        "Content locked",
    );

    let mut event = ContentEvent::new(collab::CONTENT_LOCKED)
        .with_data(json!({ "content_id": content_id, "lock": &lock }))
        .to_room(library_room(&library_type))
        .with_actor(requester.user_id);
    if let Some(conn_id) = requester.conn_id {
        event = event.excluding(conn_id);
    }
    state.event_bus.publish(event);

    Ok(AcquireOutcome::Acquired(lock))
}

/// Release the lock on a content item.
///
/// Holders release their own locks; admins may release anyone's.
pub async fn release(
    state: &AppState,
    content_id: DbId,
    requester: &LockRequester<'_>,
) -> AppResult<ReleaseOutcome> {
    let library_type = library_of(state, content_id).await?;

    let existing = ContentLockRepo::get_active(&state.pool, content_id).await?;
    let holder = existing.as_ref().map(ContentLock::holder);

    match can_release(
        holder.as_ref(),
        requester.user_id,
        requester.is_admin,
        Utc::now(),
    ) {
        ReleaseDecision::NotLocked => return Ok(ReleaseOutcome::NotLocked),
        ReleaseDecision::NotHolder => {
            let holder = holder.ok_or_else(|| {
                AppError::InternalError("NotHolder decision without a holder".into())
            })?;
            return Ok(ReleaseOutcome::NotHolder(holder));
        }
        ReleaseDecision::Release => {}
    }

    let released = match holder {
        Some(h) if h.user_id == requester.user_id => {
            ContentLockRepo::release(&state.pool, content_id, requester.user_id).await?
        }
        _ => ContentLockRepo::force_release(&state.pool, content_id).await?,
    };
    if !released {
        return Ok(ReleaseOutcome::NotLocked);
    }

    tracing::info!(content_id, user_id = requester.user_id, "Content unlocked");

    let mut event = ContentEvent::new(collab::CONTENT_UNLOCKED)
        .with_data(json!({ "content_id": content_id, "released_by": requester.user_id }))
        .to_room(library_room(&library_type))
        .with_actor(requester.user_id);
    if let Some(conn_id) = requester.conn_id {
        event = event.excluding(conn_id);
    }
    state.event_bus.publish(event);

    Ok(ReleaseOutcome::Released)
}

/// Whether `user_id` currently holds the lock on `content_id`.
pub async fn holds_lock(state: &AppState, content_id: DbId, user_id: DbId) -> AppResult<bool> {
    Ok(ContentLockRepo::get_active(&state.pool, content_id)
        .await?
        .is_some_and(|lock| lock.user_id == user_id))
}

/// Drop every lock a user holds and tell each affected library room.
pub async fn release_all_for_user(state: &AppState, user_id: DbId) -> AppResult<usize> {
    let released = ContentLockRepo::release_all_for_user(&state.pool, user_id).await?;
    for lock in &released {
        state.event_bus.publish(
            ContentEvent::new(collab::CONTENT_UNLOCKED)
                .with_data(json!({ "content_id": lock.content_id, "released_by": user_id }))
                .to_room(library_room(&lock.library_type))
                .with_actor(user_id),
        );
    }
    if !released.is_empty() {
        tracing::info!(user_id, count = released.len(), "Released locks for user");
    }
    Ok(released.len())
}

/// Human-readable description of a conflicting lock.
pub fn describe_holder(holder: &LockHolder) -> String {
    format!(
        "Content is locked by {} (user_id {}) until {}",
        holder.user_name,
        holder.user_id,
        holder.expires_at.to_rfc3339()
    )
}
