//! The collaboration protocol, driven through `WsSession` without a socket.
//!
//! Frames addressed to a connection land on the receiver returned by
//! `WsSession::open`; room events are routed by pumping the event bus
//! through a `Broadcaster`, the way the server's broadcast task does.

mod common;

use axum::extract::ws::Message;
use axum::http::StatusCode;
use common::{body_json, build_test_app, lazy_pool, post_json_auth, test_state, token_for};
use folio_api::auth::password::hash_password;
use folio_api::broadcaster::Broadcaster;
use folio_api::state::AppState;
use folio_api::ws::{WsSession, WsUser};
use folio_core::event_types::{collab, user_room, ADMIN_ROOM};
use folio_db::models::user::{CreateUser, User};
use folio_db::repositories::{ContentLockRepo, RoleRepo, UserRepo};
use folio_events::ContentEvent;
use serde_json::{json, Value};
use sqlx::PgPool;
use tokio::sync::broadcast;
use tokio::sync::mpsc::UnboundedReceiver;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ws_user(user_id: i64, role: &str) -> WsUser {
    WsUser {
        user_id,
        name: format!("{role}-{user_id}"),
        role: role.to_string(),
    }
}

fn parse(msg: Message) -> Value {
    match msg {
        Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

/// Every frame queued for a connection so far.
fn drain(rx: &mut UnboundedReceiver<Message>) -> Vec<Value> {
    let mut frames = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        frames.push(parse(msg));
    }
    frames
}

fn types(frames: &[Value]) -> Vec<&str> {
    frames.iter().filter_map(|f| f["type"].as_str()).collect()
}

/// Deliver every published event to the connections it is addressed to.
async fn pump(state: &AppState, events: &mut broadcast::Receiver<ContentEvent>) {
    let broadcaster = Broadcaster::new(state.ws_manager.clone());
    while let Ok(event) = events.try_recv() {
        broadcaster.deliver(&event).await;
    }
}

async fn send(session: &mut WsSession, state: &AppState, frame: Value) -> Option<Value> {
    session
        .handle_text(state, &frame.to_string())
        .await
        .map(parse)
}

async fn create_user(pool: &PgPool, username: &str, role: &str) -> User {
    let role = RoleRepo::find_by_name(pool, role).await.unwrap().unwrap();
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: hash_password("correct-horse-battery").unwrap(),
            first_name: None,
            last_name: None,
            role_id: role.id,
        },
    )
    .await
    .unwrap()
}

async fn create_doc_content(pool: &PgPool, editor: &str) -> i64 {
    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/documentation/sections",
        json!({ "title": "Guides" }),
        editor,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let section_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/documentation/contents",
        json!({
            "section_id": section_id,
            "library_type": "api",
            "title": "Authentication",
            "content": "Send a bearer token.",
        }),
        editor,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Two editors connected and joined to the `api` library room.
struct Room {
    state: AppState,
    events: broadcast::Receiver<ContentEvent>,
    ada: WsSession,
    ada_rx: UnboundedReceiver<Message>,
    grace: WsSession,
    grace_rx: UnboundedReceiver<Message>,
    ada_id: i64,
    grace_id: i64,
    content_id: i64,
}

async fn editors_in_room(pool: PgPool) -> Room {
    let ada = create_user(&pool, "ada", "editor").await;
    let grace = create_user(&pool, "grace", "editor").await;
    let content_id = create_doc_content(&pool, &token_for(ada.id, "editor")).await;

    let state = test_state(pool);
    let events = state.event_bus.subscribe();
    let (mut ada_session, mut ada_rx) =
        WsSession::open(&state, "ada-conn".into(), Some(ws_user(ada.id, "editor"))).await;
    let (mut grace_session, mut grace_rx) =
        WsSession::open(&state, "grace-conn".into(), Some(ws_user(grace.id, "editor"))).await;

    let join = json!({ "type": "join_library", "library_type": "api" });
    send(&mut ada_session, &state, join.clone()).await;
    send(&mut grace_session, &state, join).await;
    drain(&mut ada_rx);
    drain(&mut grace_rx);

    Room {
        state,
        events,
        ada: ada_session,
        ada_rx,
        grace: grace_session,
        grace_rx,
        ada_id: ada.id,
        grace_id: grace.id,
        content_id,
    }
}

// ---------------------------------------------------------------------------
// Connection and rooms (no database)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn open_greets_and_joins_personal_rooms() {
    let state = test_state(lazy_pool());
    let (session, mut rx) = WsSession::open(&state, "c1".into(), Some(ws_user(7, "admin"))).await;

    let frames = drain(&mut rx);
    assert_eq!(types(&frames), vec!["_connected"]);
    assert_eq!(frames[0]["data"]["connection_id"], "c1");
    assert_eq!(frames[0]["data"]["authenticated"], true);
    assert_eq!(frames[0]["data"]["user_id"], 7);

    assert!(state.ws_manager.in_room("c1", &user_room(7)).await);
    assert!(state.ws_manager.in_room("c1", ADMIN_ROOM).await);

    session.close(&state).await;
    assert_eq!(state.ws_manager.connection_count().await, 0);
}

#[tokio::test]
async fn anonymous_connection_joins_no_rooms() {
    let state = test_state(lazy_pool());
    let (_session, mut rx) = WsSession::open(&state, "anon".into(), None).await;

    assert_eq!(drain(&mut rx)[0]["data"]["authenticated"], false);
    assert!(!state.ws_manager.in_room("anon", ADMIN_ROOM).await);
}

#[tokio::test]
async fn ping_join_and_leave() {
    let state = test_state(lazy_pool());
    let (mut session, _rx) = WsSession::open(&state, "c1".into(), None).await;

    let reply = send(&mut session, &state, json!({ "type": "ping" })).await.unwrap();
    assert_eq!(reply["type"], "pong");

    let reply = send(&mut session, &state, json!({ "type": "join_library", "library_type": "api" }))
        .await
        .unwrap();
    assert_eq!(reply["type"], "library_joined");
    assert_eq!(reply["data"]["room"], "documentation_api");
    assert!(state.ws_manager.in_room("c1", "documentation_api").await);

    let reply = send(&mut session, &state, json!({ "type": "join_library", "library_type": "guides" }))
        .await
        .unwrap();
    assert_eq!(reply["data"]["room"], "documentation_guides");
    assert!(!state.ws_manager.in_room("c1", "documentation_api").await);
    assert_eq!(session.library_type(), Some("guides"));

    let reply = send(&mut session, &state, json!({ "type": "leave_library" })).await.unwrap();
    assert_eq!(reply["type"], "library_left");
    assert_eq!(reply["data"]["library_type"], "guides");
    assert!(!state.ws_manager.in_room("c1", "documentation_guides").await);
}

#[tokio::test]
async fn malformed_frames_and_bad_library_names_are_errors() {
    let state = test_state(lazy_pool());
    let (mut session, _rx) = WsSession::open(&state, "c1".into(), None).await;

    let reply = session.handle_text(&state, "not json").await.map(parse).unwrap();
    assert_eq!(reply["type"], "error");

    let reply = send(&mut session, &state, json!({ "type": "join_library", "library_type": "Bad Name" }))
        .await
        .unwrap();
    assert_eq!(reply["type"], "error");
    assert_eq!(session.library_type(), None);
}

#[tokio::test]
async fn lock_messages_require_an_editor() {
    let state = test_state(lazy_pool());

    let (mut anon, _rx) = WsSession::open(&state, "anon".into(), None).await;
    let reply = send(&mut anon, &state, json!({ "type": "lock_content", "content_id": 1 }))
        .await
        .unwrap();
    assert_eq!(reply["type"], "lock_failed");
    assert_eq!(reply["data"]["content_id"], 1);
    assert_eq!(reply["data"]["error"], "Unauthorized: Authentication required");

    let (mut reader, _rx) = WsSession::open(&state, "reader".into(), Some(ws_user(3, "user"))).await;
    let reply = send(
        &mut reader,
        &state,
        json!({ "type": "update_content", "content_id": 1, "content": "x" }),
    )
    .await
    .unwrap();
    assert_eq!(reply["type"], "update_failed");
    assert_eq!(reply["data"]["error"], "Forbidden: Editor or Admin role required");
}

// ---------------------------------------------------------------------------
// Locks (database)
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn lock_is_announced_to_the_room_but_not_the_sender(pool: PgPool) {
    let mut room = editors_in_room(pool).await;
    let content_id = room.content_id;

    let reply = send(
        &mut room.ada,
        &room.state,
        json!({ "type": "lock_content", "content_id": content_id }),
    )
    .await
    .unwrap();
    assert_eq!(reply["type"], "lock_success");
    assert_eq!(reply["data"]["lock"]["user_id"], room.ada_id);

    pump(&room.state, &mut room.events).await;
    let seen_by_grace = drain(&mut room.grace_rx);
    assert_eq!(types(&seen_by_grace), vec![collab::CONTENT_LOCKED]);
    assert_eq!(seen_by_grace[0]["data"]["content_id"], content_id);
    assert!(drain(&mut room.ada_rx).is_empty());

    let reply = send(
        &mut room.grace,
        &room.state,
        json!({ "type": "lock_content", "content_id": content_id }),
    )
    .await
    .unwrap();
    assert_eq!(reply["type"], "lock_failed");
    assert_eq!(reply["data"]["lock"]["user_id"], room.ada_id);

    // The holder may refresh without a conflict.
    let reply = send(
        &mut room.ada,
        &room.state,
        json!({ "type": "lock_content", "content_id": content_id }),
    )
    .await
    .unwrap();
    assert_eq!(reply["type"], "lock_success");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn updates_need_the_lock_and_are_relayed_to_others(pool: PgPool) {
    let mut room = editors_in_room(pool).await;
    let content_id = room.content_id;
    let update = json!({ "type": "update_content", "content_id": content_id, "content": "# Draft" });

    let reply = send(&mut room.grace, &room.state, update.clone()).await.unwrap();
    assert_eq!(reply["type"], "update_failed");
    assert_eq!(reply["data"]["error"], "You must lock the content before updating");

    send(
        &mut room.ada,
        &room.state,
        json!({ "type": "lock_content", "content_id": content_id }),
    )
    .await;
    pump(&room.state, &mut room.events).await;
    drain(&mut room.grace_rx);

    assert!(send(&mut room.ada, &room.state, update).await.is_none());
    pump(&room.state, &mut room.events).await;

    let seen_by_grace = drain(&mut room.grace_rx);
    assert_eq!(types(&seen_by_grace), vec![collab::CONTENT_UPDATED]);
    assert_eq!(seen_by_grace[0]["data"]["content"], "# Draft");
    assert_eq!(seen_by_grace[0]["data"]["user_id"], room.ada_id);
    assert!(drain(&mut room.ada_rx).is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn unlock_by_a_non_holder_fails(pool: PgPool) {
    let mut room = editors_in_room(pool).await;
    let content_id = room.content_id;
    let unlock = json!({ "type": "unlock_content", "content_id": content_id });

    let reply = send(&mut room.grace, &room.state, unlock.clone()).await.unwrap();
    assert_eq!(reply["type"], "unlock_failed");
    assert_eq!(reply["data"]["error"], "Content is not locked");

    send(
        &mut room.ada,
        &room.state,
        json!({ "type": "lock_content", "content_id": content_id }),
    )
    .await;
    let reply = send(&mut room.grace, &room.state, unlock.clone()).await.unwrap();
    assert_eq!(reply["type"], "unlock_failed");
    assert_eq!(reply["data"]["lock"]["user_id"], room.ada_id);

    let reply = send(&mut room.ada, &room.state, unlock).await.unwrap();
    assert_eq!(reply["type"], "unlock_success");
    pump(&room.state, &mut room.events).await;
    let seen_by_grace = drain(&mut room.grace_rx);
    assert_eq!(
        types(&seen_by_grace),
        vec![collab::CONTENT_LOCKED, collab::CONTENT_UNLOCKED]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn disconnect_releases_locks_and_tells_the_room(pool: PgPool) {
    let mut room = editors_in_room(pool).await;
    let content_id = room.content_id;

    send(
        &mut room.ada,
        &room.state,
        json!({ "type": "lock_content", "content_id": content_id }),
    )
    .await;
    pump(&room.state, &mut room.events).await;
    drain(&mut room.grace_rx);

    room.ada.close(&room.state).await;
    pump(&room.state, &mut room.events).await;

    let seen_by_grace = drain(&mut room.grace_rx);
    assert_eq!(
        types(&seen_by_grace),
        vec![collab::CONTENT_UNLOCKED, collab::USER_DISCONNECTED]
    );
    assert_eq!(seen_by_grace[0]["data"]["content_id"], content_id);
    assert_eq!(seen_by_grace[0]["data"]["released_by"], room.ada_id);
    assert_eq!(seen_by_grace[1]["data"]["user_id"], room.ada_id);

    assert!(ContentLockRepo::get_active(&room.state.pool, content_id)
        .await
        .unwrap()
        .is_none());
    assert!(!room.state.ws_manager.in_room("ada-conn", "documentation_api").await);

    let reply = send(
        &mut room.grace,
        &room.state,
        json!({ "type": "lock_content", "content_id": content_id }),
    )
    .await
    .unwrap();
    assert_eq!(reply["type"], "lock_success");
    assert_eq!(reply["data"]["lock"]["user_id"], room.grace_id);
}
