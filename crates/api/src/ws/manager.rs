use std::collections::{BTreeMap, HashMap, HashSet};

use axum::body::Bytes;
use axum::extract::ws::Message;
use folio_core::types::{DbId, Timestamp};
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// The user a connection authenticated as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WsUser {
    pub user_id: DbId,
    pub name: String,
    pub role: String,
}

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Set when the upgrade request carried a valid token.
    pub user: Option<WsUser>,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// Rooms this connection has joined.
    pub rooms: HashSet<String>,
    /// When this connection was established.
    pub connected_at: Timestamp,
}

/// Connection counts reported by the admin realtime endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RealtimeStats {
    pub connections: usize,
    pub authenticated: usize,
    /// Members per room.
    pub rooms: BTreeMap<String, usize>,
}

/// Manages all active WebSocket connections and their room membership.
///
/// Thread-safe via interior `RwLock`; shared as `Arc<WsManager>`.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(
        &self,
        conn_id: String,
        user: Option<WsUser>,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            user,
            sender: tx,
            rooms: HashSet::new(),
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection, returning it so the caller can clean up after it.
    pub async fn remove(&self, conn_id: &str) -> Option<WsConnection> {
        self.connections.write().await.remove(conn_id)
    }

    /// The user bound to a connection, if any.
    pub async fn user_of(&self, conn_id: &str) -> Option<WsUser> {
        self.connections
            .read()
            .await
            .get(conn_id)
            .and_then(|c| c.user.clone())
    }

    /// Add a connection to a room. Returns `false` for unknown connections.
    pub async fn join_room(&self, conn_id: &str, room: &str) -> bool {
        match self.connections.write().await.get_mut(conn_id) {
            Some(conn) => {
                conn.rooms.insert(room.to_string());
                true
            }
            None => false,
        }
    }

    /// Remove a connection from a room. Returns `true` if it was a member.
    pub async fn leave_room(&self, conn_id: &str, room: &str) -> bool {
        self.connections
            .write()
            .await
            .get_mut(conn_id)
            .is_some_and(|conn| conn.rooms.remove(room))
    }

    /// Whether a connection is currently in `room`.
    pub async fn in_room(&self, conn_id: &str, room: &str) -> bool {
        self.connections
            .read()
            .await
            .get(conn_id)
            .is_some_and(|conn| conn.rooms.contains(room))
    }

    /// Broadcast a message to all connected clients.
    ///
    /// Connections whose send channels are closed are skipped (they are
    /// cleaned up when their receive loop ends). Returns the number of
    /// connections the message was queued for.
    pub async fn broadcast(&self, message: Message) -> usize {
        let conns = self.connections.read().await;
        conns
            .values()
            .filter(|conn| conn.sender.send(message.clone()).is_ok())
            .count()
    }

    /// Send a message to every member of `room`, optionally skipping one
    /// connection (usually the sender).
    pub async fn broadcast_to_room(
        &self,
        room: &str,
        message: Message,
        exclude: Option<&str>,
    ) -> usize {
        let conns = self.connections.read().await;
        conns
            .iter()
            .filter(|(id, conn)| conn.rooms.contains(room) && Some(id.as_str()) != exclude)
            .filter(|(_, conn)| conn.sender.send(message.clone()).is_ok())
            .count()
    }

    /// Send a message to a single connection. Returns `false` if it is gone.
    pub async fn send_to(&self, conn_id: &str, message: Message) -> bool {
        self.connections
            .read()
            .await
            .get(conn_id)
            .is_some_and(|conn| conn.sender.send(message).is_ok())
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Connection and room membership counts.
    pub async fn stats(&self) -> RealtimeStats {
        let conns = self.connections.read().await;
        let mut rooms = BTreeMap::new();
        for conn in conns.values() {
            for room in &conn.rooms {
                *rooms.entry(room.clone()).or_insert(0) += 1;
            }
        }
        RealtimeStats {
            connections: conns.len(),
            authenticated: conns.values().filter(|c| c.user.is_some()).count(),
            rooms,
        }
    }

    /// Send a Close frame to every connection, then clear the map.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
