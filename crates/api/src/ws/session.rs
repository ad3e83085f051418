//! One WebSocket connection's view of the collaboration protocol.
//!
//! [`WsSession`] is independent of the socket: the upgrade handler feeds it
//! text frames and forwards its replies, so the protocol can be driven
//! directly against a [`WsManager`](crate::ws::WsManager).

use axum::extract::ws::Message;
use folio_core::content_lock::{library_room, validate_library_type};
use folio_core::error::CoreError;
use folio_core::event_types::{collab, user_room, ADMIN_ROOM};
use folio_core::roles::{can_edit_content, ROLE_ADMIN};
use folio_core::types::DbId;
use folio_db::repositories::DocContentRepo;
use folio_events::ContentEvent;
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::collab::{self as locks, AcquireOutcome, LockRequester, ReleaseOutcome};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::ws::manager::WsUser;
use crate::ws::protocol::{self, server_message, ClientMessage};

/// Per-connection protocol state.
pub struct WsSession {
    conn_id: String,
    user: Option<WsUser>,
    library_type: Option<String>,
}

impl WsSession {
    /// Register a connection with the manager and greet it.
    ///
    /// Authenticated connections join their user room, admins also join
    /// [`ADMIN_ROOM`]. The returned receiver carries every frame addressed
    /// to the connection, starting with `_connected`.
    pub async fn open(
        state: &AppState,
        conn_id: String,
        user: Option<WsUser>,
    ) -> (Self, UnboundedReceiver<Message>) {
        let rx = state.ws_manager.add(conn_id.clone(), user.clone()).await;
        if let Some(user) = &user {
            state
                .ws_manager
                .join_room(&conn_id, &user_room(user.user_id))
                .await;
            if user.role == ROLE_ADMIN {
                state.ws_manager.join_room(&conn_id, ADMIN_ROOM).await;
            }
        }

        state
            .ws_manager
            .send_to(
                &conn_id,
                server_message(
                    protocol::CONNECTED,
                    json!({
                        "connection_id": conn_id,
                        "authenticated": user.is_some(),
                        "user_id": user.as_ref().map(|u| u.user_id),
                    }),
                ),
            )
            .await;

        let session = Self {
            conn_id,
            user,
            library_type: None,
        };
        (session, rx)
    }

    pub fn conn_id(&self) -> &str {
        &self.conn_id
    }

    pub fn library_type(&self) -> Option<&str> {
        self.library_type.as_deref()
    }

    /// Handle one text frame, returning the direct reply (if any).
    pub async fn handle_text(&mut self, state: &AppState, text: &str) -> Option<Message> {
        match ClientMessage::parse(text) {
            Ok(msg) => self.dispatch(state, msg).await,
            Err(error) => Some(server_message(protocol::ERROR, json!({ "error": error }))),
        }
    }

    /// Remove the connection, release its user's locks and tell its library room.
    pub async fn close(self, state: &AppState) {
        state.ws_manager.remove(&self.conn_id).await;

        let Some(user) = &self.user else {
            return;
        };

        if let Err(e) = locks::release_all_for_user(state, user.user_id).await {
            tracing::error!(user_id = user.user_id, error = %e, "Failed to release locks on disconnect");
        }

        if let Some(library_type) = &self.library_type {
            state.event_bus.publish(
                ContentEvent::new(collab::USER_DISCONNECTED)
                    .with_data(json!({ "user_id": user.user_id, "user_name": user.name }))
                    .to_room(library_room(library_type))
                    .with_actor(user.user_id),
            );
        }
    }

    pub async fn dispatch(&mut self, state: &AppState, msg: ClientMessage) -> Option<Message> {
        match msg {
            ClientMessage::Ping => Some(server_message(protocol::PONG, json!({}))),
            ClientMessage::JoinLibrary { library_type } => {
                Some(self.join_library(state, library_type).await)
            }
            ClientMessage::LeaveLibrary => Some(self.leave_library(state).await),
            ClientMessage::LockContent { content_id } => Some(
                self.lock_content(state, content_id)
                    .await
                    .unwrap_or_else(|e| failure(protocol::LOCK_FAILED, content_id, &e)),
            ),
            ClientMessage::UnlockContent { content_id } => Some(
                self.unlock_content(state, content_id)
                    .await
                    .unwrap_or_else(|e| failure(protocol::UNLOCK_FAILED, content_id, &e)),
            ),
            ClientMessage::UpdateContent {
                content_id,
                content,
            } => self
                .update_content(state, content_id, content)
                .await
                .unwrap_or_else(|e| Some(failure(protocol::UPDATE_FAILED, content_id, &e))),
        }
    }

    async fn join_library(&mut self, state: &AppState, library_type: String) -> Message {
        if let Err(error) = validate_library_type(&library_type) {
            return server_message(protocol::ERROR, json!({ "error": error }));
        }

        if let Some(previous) = self.library_type.take() {
            state
                .ws_manager
                .leave_room(&self.conn_id, &library_room(&previous))
                .await;
        }

        let room = library_room(&library_type);
        state.ws_manager.join_room(&self.conn_id, &room).await;
        tracing::debug!(conn_id = %self.conn_id, room = %room, "Joined library room");
        self.library_type = Some(library_type.clone());

        server_message(
            protocol::LIBRARY_JOINED,
            json!({ "library_type": library_type, "room": room }),
        )
    }

    async fn leave_library(&mut self, state: &AppState) -> Message {
        let left = match self.library_type.take() {
            Some(library_type) => {
                state
                    .ws_manager
                    .leave_room(&self.conn_id, &library_room(&library_type))
                    .await;
                Some(library_type)
            }
            None => None,
        };
        server_message(protocol::LIBRARY_LEFT, json!({ "library_type": left }))
    }

    /// The session's user, if they may edit documentation.
    fn editor(&self) -> AppResult<&WsUser> {
        let user = self
            .user
            .as_ref()
            .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Authentication required".into())))?;
        if !can_edit_content(&user.role) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Editor or Admin role required".into(),
            )));
        }
        Ok(user)
    }

    fn requester<'a>(&'a self, user: &'a WsUser) -> LockRequester<'a> {
        LockRequester {
            user_id: user.user_id,
            user_name: &user.name,
            is_admin: user.role == ROLE_ADMIN,
            conn_id: Some(&self.conn_id),
        }
    }

    async fn lock_content(&self, state: &AppState, content_id: DbId) -> AppResult<Message> {
        let user = self.editor()?;
        let reply = match locks::acquire(state, content_id, &self.requester(user)).await? {
            AcquireOutcome::Acquired(lock) => server_message(
                protocol::LOCK_SUCCESS,
                json!({ "content_id": content_id, "lock": lock }),
            ),
            AcquireOutcome::Held(holder) => server_message(
                protocol::LOCK_FAILED,
                json!({
                    "content_id": content_id,
                    "error": "Content is already locked by another user",
                    "lock": holder,
                }),
            ),
        };
        Ok(reply)
    }

    async fn unlock_content(&self, state: &AppState, content_id: DbId) -> AppResult<Message> {
        let user = self.editor()?;
        let reply = match locks::release(state, content_id, &self.requester(user)).await? {
            ReleaseOutcome::Released => {
                server_message(protocol::UNLOCK_SUCCESS, json!({ "content_id": content_id }))
            }
            ReleaseOutcome::NotLocked => server_message(
                protocol::UNLOCK_FAILED,
                json!({ "content_id": content_id, "error": "Content is not locked" }),
            ),
            ReleaseOutcome::NotHolder(holder) => server_message(
                protocol::UNLOCK_FAILED,
                json!({
                    "content_id": content_id,
                    "error": "Content is locked by another user",
                    "lock": holder,
                }),
            ),
        };
        Ok(reply)
    }

    /// Relay live edits to the library room. Only the lock holder may relay;
    /// nothing is persisted here.
    async fn update_content(
        &self,
        state: &AppState,
        content_id: DbId,
        content: String,
    ) -> AppResult<Option<Message>> {
        let user = self.editor()?;

        if !locks::holds_lock(state, content_id, user.user_id).await? {
            return Ok(Some(server_message(
                protocol::UPDATE_FAILED,
                json!({
                    "content_id": content_id,
                    "error": "You must lock the content before updating",
                }),
            )));
        }

        let library_type = DocContentRepo::library_type_of(&state.pool, content_id)
            .await?
            .ok_or_else(|| AppError::not_found("DocContent", content_id))?;

        state.event_bus.publish(
            ContentEvent::new(collab::CONTENT_UPDATED)
                .with_data(json!({
                    "content_id": content_id,
                    "content": content,
                    "user_id": user.user_id,
                    "user_name": user.name,
                }))
                .to_room(library_room(&library_type))
                .excluding(self.conn_id.clone())
                .with_actor(user.user_id),
        );
        Ok(None)
    }
}

/// Reply for a failed lock operation. Internal details are not sent.
fn failure(message_type: &str, content_id: DbId, err: &AppError) -> Message {
    let error = match err {
        AppError::Core(core) => match core {
            CoreError::NotFound { .. } => "Content not found".to_string(),
            CoreError::Internal(_) => "Operation failed".to_string(),
            other => other.to_string(),
        },
        AppError::NotFound(msg) | AppError::BadRequest(msg) => msg.clone(),
        AppError::Database(e) => {
            tracing::error!(content_id, error = %e, "Lock operation failed");
            "Operation failed".to_string()
        }
        AppError::InternalError(msg) => {
            tracing::error!(content_id, error = %msg, "Lock operation failed");
            "Operation failed".to_string()
        }
    };
    server_message(message_type, json!({ "content_id": content_id, "error": error }))
}
