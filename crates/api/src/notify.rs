//! Announcing mutations: cache invalidation plus WebSocket broadcast.

use folio_core::event_types::CACHE_INVALIDATED;
use folio_events::ContentEvent;
use serde_json::json;

use crate::state::AppState;

/// Publish an event to connected clients.
pub fn publish(state: &AppState, event: ContentEvent) {
    state.event_bus.publish(event);
}

/// Invalidate every cache entry tagged `tag` and return the removed keys.
pub async fn invalidate_tag(state: &AppState, tag: &str) -> Vec<String> {
    state.cache.invalidate_tag(tag).await
}

/// The standard mutation sequence: clear the resource's cache entries,
/// publish the resource event, then publish `CACHE_INVALIDATED` naming what
/// was cleared.
pub async fn announce_mutation(state: &AppState, tags: &[&str], event: ContentEvent) {
    let mut keys = Vec::new();
    for tag in tags {
        keys.extend(invalidate_tag(state, tag).await);
    }

    let actor = event.actor_user_id;
    publish(state, event);

    let mut invalidated = ContentEvent::new(CACHE_INVALIDATED).with_data(json!({
        "tags": tags,
        "keys": keys,
    }));
    if let Some(user_id) = actor {
        invalidated = invalidated.with_actor(user_id);
    }
    publish(state, invalidated);
}
