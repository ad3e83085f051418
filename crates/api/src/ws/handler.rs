use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;

use crate::middleware::auth::{request_token, AuthUser};
use crate::state::AppState;
use crate::ws::manager::WsUser;
use crate::ws::protocol::{self, server_message};
use crate::ws::session::WsSession;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// HTTP handler that upgrades the connection to WebSocket.
///
/// The upgrade is open to anyone. A valid token from the Bearer header, the
/// session cookie or `?token=` binds the connection to that user, which the
/// lock messages require.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let user = params
        .token
        .or_else(|| request_token(&headers))
        .and_then(|token| AuthUser::from_token(&token, &state.config.jwt))
        .map(|u| WsUser {
            user_id: u.user_id,
            name: u.name,
            role: u.role,
        });

    ws.on_upgrade(move |socket| handle_socket(socket, state, user))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Opens a [`WsSession`], spawns a sender task that drains the manager
/// channel into the sink, feeds inbound frames to the session on the
/// current task, and closes the session (locks included) on disconnect.
async fn handle_socket(socket: WebSocket, state: AppState, user: Option<WsUser>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(
        conn_id = %conn_id,
        user_id = user.as_ref().map(|u| u.user_id),
        "WebSocket connected",
    );

    let (mut session, mut rx) = WsSession::open(&state, conn_id.clone(), user).await;
    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if let Some(reply) = session.handle_text(&state, text.as_str()).await {
                    state.ws_manager.send_to(&conn_id, reply).await;
                }
            }
            Ok(Message::Binary(_)) => {
                state
                    .ws_manager
                    .send_to(
                        &conn_id,
                        server_message(
                            protocol::ERROR,
                            json!({ "error": "Binary frames are not supported" }),
                        ),
                    )
                    .await;
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Ping(_)) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    session.close(&state).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}
