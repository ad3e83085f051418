//! Event-bus to WebSocket fan-out.
//!
//! [`Broadcaster`] subscribes to the event bus and delivers every
//! [`ContentEvent`] to either all connections or the members of its room.

use std::sync::Arc;

use axum::extract::ws::Message;
use folio_events::ContentEvent;
use tokio::sync::broadcast;

use crate::ws::WsManager;

pub struct Broadcaster {
    ws_manager: Arc<WsManager>,
}

impl Broadcaster {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the delivery loop.
    ///
    /// Exits when the channel closes, i.e. when the
    /// [`EventBus`](folio_events::EventBus) is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<ContentEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.deliver(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Broadcaster lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, broadcaster shutting down");
                    break;
                }
            }
        }
    }

    /// Serialize the event once and send it to its audience.
    ///
    /// Returns the number of connections it was queued for.
    pub async fn deliver(&self, event: &ContentEvent) -> usize {
        let message = Message::Text(event.to_wire().into());

        let recipients = match event.room.as_deref() {
            Some(room) => {
                self.ws_manager
                    .broadcast_to_room(room, message, event.exclude_conn.as_deref())
                    .await
            }
            None => self.ws_manager.broadcast(message).await,
        };

        tracing::debug!(
            event_type = %event.event_type,
            room = event.room.as_deref().unwrap_or("*"),
            recipients,
            actor_user_id = event.actor_user_id,
            "Broadcast event",
        );
        recipients
    }
}
