//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`ContentEvent`]s. It is
//! shared via `Arc<EventBus>` across the application; the WebSocket
//! broadcaster is its main subscriber.

use chrono::{DateTime, Utc};
use folio_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// ContentEvent
// ---------------------------------------------------------------------------

/// A change that connected clients should hear about.
///
/// Constructed via [`ContentEvent::new`] and enriched with
/// [`with_data`](ContentEvent::with_data), [`to_room`](ContentEvent::to_room),
/// [`excluding`](ContentEvent::excluding) and
/// [`with_actor`](ContentEvent::with_actor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentEvent {
    /// Event name sent as the wire `type`, e.g. `"blog_created"`.
    pub event_type: String,

    /// Event-specific payload sent as the wire `data`.
    pub data: serde_json::Value,

    /// Deliver only to connections in this room. `None` means everyone.
    pub room: Option<String>,

    /// Connection id that should not receive the event (usually the sender).
    pub exclude_conn: Option<String>,

    /// User whose action produced the event. Logged, never sent.
    pub actor_user_id: Option<DbId>,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

/// The JSON shape clients receive.
#[derive(Serialize)]
struct WireMessage<'a> {
    #[serde(rename = "type")]
    event_type: &'a str,
    data: &'a serde_json::Value,
    timestamp: DateTime<Utc>,
}

impl ContentEvent {
    /// Create an event with an empty-object payload, addressed to everyone.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data: serde_json::Value::Object(Default::default()),
            room: None,
            exclude_conn: None,
            actor_user_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// Restrict delivery to one room.
    pub fn to_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    /// Skip one connection when fanning out.
    pub fn excluding(mut self, conn_id: impl Into<String>) -> Self {
        self.exclude_conn = Some(conn_id.into());
        self
    }

    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    /// Serialize to the client wire format.
    pub fn to_wire(&self) -> String {
        let wire = WireMessage {
            event_type: &self.event_type,
            data: &self.data,
            timestamp: self.timestamp,
        };
        // A Value payload and string fields cannot fail to serialize.
        serde_json::to_string(&wire).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use folio_events::bus::{ContentEvent, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(ContentEvent::new("blog_created"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<ContentEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed events are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers the event is dropped.
    pub fn publish(&self, event: ContentEvent) {
        tracing::debug!(
            event_type = %event.event_type,
            room = ?event.room,
            actor_user_id = ?event.actor_user_id,
            "Publishing content event",
        );
        // SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ContentEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            ContentEvent::new("blog_created")
                .with_data(json!({"id": 42}))
                .with_actor(7),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, "blog_created");
        assert_eq!(received.data["id"], 42);
        assert_eq!(received.actor_user_id, Some(7));
        assert!(received.room.is_none());
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(ContentEvent::new("MEDIA_UPDATE"));

        assert_eq!(rx1.recv().await.unwrap().event_type, "MEDIA_UPDATE");
        assert_eq!(rx2.recv().await.unwrap().event_type, "MEDIA_UPDATE");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(ContentEvent::new("orphan"));
    }

    #[test]
    fn room_and_exclusion_builders() {
        let event = ContentEvent::new("content_locked")
            .to_room("documentation_api")
            .excluding("conn-1");
        assert_eq!(event.room.as_deref(), Some("documentation_api"));
        assert_eq!(event.exclude_conn.as_deref(), Some("conn-1"));
    }

    #[test]
    fn wire_format_has_type_data_timestamp_only() {
        let event = ContentEvent::new("CACHE_INVALIDATED")
            .with_data(json!({"keys": ["blog:*"]}))
            .to_room("documentation_api")
            .with_actor(3);
        let wire: serde_json::Value = serde_json::from_str(&event.to_wire()).unwrap();

        assert_eq!(wire["type"], "CACHE_INVALIDATED");
        assert_eq!(wire["data"]["keys"][0], "blog:*");
        assert!(wire["timestamp"].is_string());
        let obj = wire.as_object().unwrap();
        assert_eq!(obj.len(), 3);
    }

    #[test]
    fn default_payload_is_empty_object() {
        let event = ContentEvent::new("bare");
        assert!(event.data.is_object());
        assert!(event.data.as_object().unwrap().is_empty());
    }
}
