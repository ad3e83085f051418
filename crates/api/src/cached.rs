//! Read-through response caching for public GET endpoints.

use std::future::Future;

use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Return the cached body for `key`, or run `load`, cache the serialized
/// body under `tags`, and return it.
///
/// Errors from `load` are returned as-is and never cached. A body whose
/// tags were invalidated while it loaded is returned but not cached.
pub async fn cached_body<B, F, Fut>(
    state: &AppState,
    key: String,
    tags: &[&str],
    load: F,
) -> AppResult<Value>
where
    B: Serialize,
    F: FnOnce() -> Fut,
    Fut: Future<Output = AppResult<B>>,
{
    if let Some(hit) = state.cache.get(&key).await {
        tracing::trace!(key = %key, "Response cache hit");
        return Ok(hit);
    }

    let seen = state.cache.generation(tags).await;
    let body = serde_json::to_value(load().await?)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize response: {e}")))?;
    if !state
        .cache
        .insert_if_current(key.clone(), body.clone(), tags, &seen)
        .await
    {
        tracing::debug!(key = %key, "Skipped caching a response invalidated mid-load");
    }
    Ok(body)
}

/// [`cached_body`] for the usual `{ "data": ... }` envelope.
pub async fn cached_data<T, F, Fut>(
    state: &AppState,
    key: String,
    tags: &[&str],
    load: F,
) -> AppResult<Value>
where
    T: Serialize,
    F: FnOnce() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    cached_body(state, key, tags, || async move {
        Ok(DataResponse { data: load().await? })
    })
    .await
}
