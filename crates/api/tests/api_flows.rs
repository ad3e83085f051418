//! End-to-end HTTP flows against a real database.
//!
//! Each test gets a fresh migrated database from `sqlx::test`.

mod common;

use axum::http::StatusCode;
use common::{
    app_with_state, body_json, build_test_app, delete_auth, get, get_auth, post_json,
    post_json_auth, put_json_auth, test_state, token_for,
};
use folio_api::auth::password::hash_password;
use folio_core::event_types::{collab, comment, user, user_room, ADMIN_ROOM, CART_UPDATE};
use folio_db::models::user::{CreateUser, User};
use folio_db::repositories::{RoleRepo, UserRepo};
use serde_json::json;
use sqlx::PgPool;

const PASSWORD: &str = "correct-horse-battery";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn create_user(pool: &PgPool, username: &str, role: &str) -> User {
    let role = RoleRepo::find_by_name(pool, role).await.unwrap().unwrap();
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: hash_password(PASSWORD).unwrap(),
            first_name: None,
            last_name: None,
            role_id: role.id,
        },
    )
    .await
    .unwrap()
}

async fn create_product(pool: &PgPool, admin: &str, title: &str, price_cents: i64) -> i64 {
    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/products",
        json!({ "title": title, "price_cents": price_cents }),
        admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn create_doc_content(pool: &PgPool, editor: &str) -> i64 {
    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/documentation/sections",
        json!({ "title": "Getting started" }),
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
            "title": "Install",
            "content": "Run the installer.",
        }),
        editor,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn register_login_and_me(pool: PgPool) {
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/auth/register",
        json!({ "username": "reader", "email": "Reader@Example.com", "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("folio_session="));
    assert!(cookie.contains("HttpOnly"));
    let json = body_json(response).await;
    assert_eq!(json["data"]["user"]["email"], "reader@example.com");
    assert!(json["data"]["user"].get("password_hash").is_none());

    let response = post_json(
        build_test_app(pool.clone()),
        "/api/auth/login",
        json!({ "email": "reader@example.com", "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let token = body_json(response).await["data"]["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = get_auth(build_test_app(pool), "/api/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["username"], "reader");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn wrong_password_is_401(pool: PgPool) {
    create_user(&pool, "victim", "user").await;

    let response = post_json(
        build_test_app(pool),
        "/api/auth/login",
        json!({ "username": "victim", "password": "definitely-wrong" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn refresh_token_rotates_and_old_one_is_revoked(pool: PgPool) {
    create_user(&pool, "rotator", "user").await;
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/auth/login",
        json!({ "username": "rotator", "password": PASSWORD }),
    )
    .await;
    let refresh = body_json(response).await["data"]["refresh_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = post_json(
        build_test_app(pool.clone()),
        "/api/auth/refresh",
        json!({ "refresh_token": refresh }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(
        build_test_app(pool),
        "/api/auth/refresh",
        json!({ "refresh_token": refresh }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Blog + cache
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn publishing_a_post_invalidates_the_public_list(pool: PgPool) {
    let editor = create_user(&pool, "writer", "editor").await;
    let token = token_for(editor.id, "editor");
    let state = test_state(pool);

    let response = get(app_with_state(state.clone()), "/api/blog").await;
    assert_eq!(body_json(response).await["total"], 0);
    assert!(state.cache.get("blog:list:limit=20&offset=0").await.is_some());

    let response = post_json_auth(
        app_with_state(state.clone()),
        "/api/blog",
        json!({ "title": "Launch day", "content": "We shipped.", "status": "published" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let post = body_json(response).await;
    assert_eq!(post["data"]["slug"], "launch-day");

    assert!(state.cache.get("blog:list:limit=20&offset=0").await.is_none());
    let response = get(app_with_state(state), "/api/blog").await;
    assert_eq!(body_json(response).await["total"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn drafts_are_hidden_from_the_public(pool: PgPool) {
    let editor = create_user(&pool, "drafter", "editor").await;
    let token = token_for(editor.id, "editor");

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/blog",
        json!({ "title": "Secret plans", "content": "Not yet." }),
        &token,
    )
    .await;
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = get(build_test_app(pool.clone()), &format!("/api/blog/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(build_test_app(pool), &format!("/api/blog/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "draft");
}

// ---------------------------------------------------------------------------
// Cart + checkout
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn cart_checkout_and_tracking(pool: PgPool) {
    let admin = create_user(&pool, "boss", "admin").await;
    let buyer = create_user(&pool, "buyer", "user").await;
    let admin_token = token_for(admin.id, "admin");
    let buyer_token = token_for(buyer.id, "user");

    let product_id = create_product(&pool, &admin_token, "Mug", 1250).await;

    let state = test_state(pool.clone());
    let mut events = state.event_bus.subscribe();
    let response = post_json_auth(
        app_with_state(state),
        "/api/cart/items",
        json!({ "product_id": product_id, "quantity": 2 }),
        &buyer_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let cart = body_json(response).await;
    assert_eq!(cart["data"]["total_items"], 2);
    assert_eq!(cart["data"]["subtotal_cents"], 2500);

    let event = events.try_recv().unwrap();
    assert_eq!(event.event_type, CART_UPDATE);
    assert_eq!(event.room, Some(user_room(buyer.id)));

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/orders",
        json!({ "customer_name": "Buyer" }),
        &buyer_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = body_json(response).await;
    assert_eq!(order["data"]["status"], "pending");
    assert_eq!(order["data"]["subtotal_cents"], 2500);
    assert_eq!(order["data"]["items"].as_array().unwrap().len(), 1);
    let order_id = order["data"]["id"].as_i64().unwrap();
    let order_number = order["data"]["order_number"].as_str().unwrap().to_string();

    let response = get_auth(build_test_app(pool.clone()), "/api/cart", &buyer_token).await;
    assert_eq!(body_json(response).await["data"]["total_items"], 0);

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/orders",
        json!({}),
        &buyer_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/orders/{order_id}/status"),
        json!({ "status": "processing" }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(
        build_test_app(pool.clone()),
        &format!("/api/orders/track/{order_number}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let tracking = body_json(response).await;
    assert_eq!(tracking["data"]["status"], "processing");
    assert!(tracking["data"].get("customer_name").is_none());

    let response = put_json_auth(
        build_test_app(pool),
        &format!("/api/orders/{order_id}/status"),
        json!({ "status": "pending" }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn other_users_orders_are_not_visible(pool: PgPool) {
    let admin = create_user(&pool, "boss", "admin").await;
    let alice = create_user(&pool, "alice", "user").await;
    let mallory = create_user(&pool, "mallory", "user").await;
    let admin_token = token_for(admin.id, "admin");
    let alice_token = token_for(alice.id, "user");

    let product_id = create_product(&pool, &admin_token, "Poster", 900).await;
    post_json_auth(
        build_test_app(pool.clone()),
        "/api/cart/items",
        json!({ "product_id": product_id }),
        &alice_token,
    )
    .await;
    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/orders",
        json!({}),
        &alice_token,
    )
    .await;
    let order_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/orders/{order_id}"),
        &token_for(mallory.id, "user"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(
        build_test_app(pool),
        &format!("/api/orders/{order_id}"),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Admin user management
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn admin_user_changes_are_announced_to_admins(pool: PgPool) {
    let admin = create_user(&pool, "boss", "admin").await;
    let admin_token = token_for(admin.id, "admin");
    let state = test_state(pool);
    let mut events = state.event_bus.subscribe();

    let response = post_json_auth(
        app_with_state(state.clone()),
        "/api/admin/users",
        json!({
            "username": "newbie",
            "email": "Newbie@Example.com",
            "password": PASSWORD,
            "role": "editor",
        }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let new_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let created = events.try_recv().unwrap();
    assert_eq!(created.event_type, user::CREATED);
    assert_eq!(created.room.as_deref(), Some(ADMIN_ROOM));
    assert_eq!(created.actor_user_id, Some(admin.id));
    assert_eq!(created.data["id"], new_id);
    assert_eq!(created.data["email"], "newbie@example.com");
    assert_eq!(created.data["role"], "editor");
    assert!(created.data.get("password_hash").is_none());

    let response = put_json_auth(
        app_with_state(state.clone()),
        &format!("/api/admin/users/{new_id}"),
        json!({ "first_name": "New" }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = events.try_recv().unwrap();
    assert_eq!(updated.event_type, user::UPDATED);
    assert_eq!(updated.room.as_deref(), Some(ADMIN_ROOM));
    assert_eq!(updated.data["first_name"], "New");

    let response = delete_auth(
        app_with_state(state.clone()),
        &format!("/api/admin/users/{new_id}"),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let deleted = events.try_recv().unwrap();
    assert_eq!(deleted.event_type, user::DELETED);
    assert_eq!(deleted.data, json!({ "id": new_id }));
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn comment_thread_reactions_and_moderation(pool: PgPool) {
    let editor = create_user(&pool, "writer", "editor").await;
    let reader = create_user(&pool, "reader", "user").await;
    let admin = create_user(&pool, "boss", "admin").await;
    let editor_token = token_for(editor.id, "editor");
    let reader_token = token_for(reader.id, "user");
    let admin_token = token_for(admin.id, "admin");

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/blog",
        json!({ "title": "Open thread", "content": "Talk.", "status": "published" }),
        &editor_token,
    )
    .await;
    let post_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let state = test_state(pool.clone());
    let mut events = state.event_bus.subscribe();

    let response = post_json_auth(
        app_with_state(state.clone()),
        "/api/comments",
        json!({ "post_id": post_id, "content": "First <b>post</b>" }),
        &reader_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let root = body_json(response).await["data"].clone();
    let root_id = root["id"].as_i64().unwrap();
    assert_eq!(root["content_html"], "First &lt;b&gt;post&lt;/b&gt;");
    assert_eq!(root["username"], "reader");
    assert_eq!(root["status"], "approved");

    let created = events.try_recv().unwrap();
    assert_eq!(created.event_type, comment::CREATED);
    assert_eq!(created.data["post_id"], post_id);
    assert_eq!(created.data["is_reply"], false);

    let response = post_json_auth(
        app_with_state(state.clone()),
        "/api/comments",
        json!({ "post_id": post_id, "content": "Welcome", "parent_id": root_id }),
        &editor_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let reply_id = body_json(response).await["data"]["id"].as_i64().unwrap();
    assert_eq!(events.try_recv().unwrap().data["is_reply"], true);

    let response = get(build_test_app(pool.clone()), &format!("/api/comments/{post_id}")).await;
    let list = body_json(response).await;
    assert_eq!(list["total"], 1);
    assert_eq!(list["data"][0]["reply_count"], 1);

    let response = get(
        build_test_app(pool.clone()),
        &format!("/api/comments/{root_id}/replies"),
    )
    .await;
    let replies = body_json(response).await;
    assert_eq!(replies["limit"], 10);
    assert_eq!(replies["data"][0]["id"], reply_id);

    let response = get(
        build_test_app(pool.clone()),
        &format!("/api/comments/{post_id}/count"),
    )
    .await;
    assert_eq!(body_json(response).await["data"]["count"], 2);

    // Only the author edits.
    let response = put_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/comments/{root_id}"),
        json!({ "content": "Hijacked" }),
        &editor_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let reactions = format!("/api/comments/{root_id}/reactions");
    let like = json!({ "reaction_type": "like" });
    let response =
        post_json_auth(build_test_app(pool.clone()), &reactions, like.clone(), &editor_token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = post_json_auth(build_test_app(pool.clone()), &reactions, like, &editor_token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/comments/{post_id}/reactions"),
        &editor_token,
    )
    .await;
    let mine = body_json(response).await;
    assert_eq!(mine["data"][root_id.to_string()], json!(["like"]));

    // Rejection hides the comment and its thread from readers.
    let response = put_json_auth(
        app_with_state(state.clone()),
        &format!("/api/admin/comments/{root_id}/reject"),
        json!({}),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let moderated = events.try_recv().unwrap();
    assert_eq!(moderated.event_type, comment::UPDATED);
    assert_eq!(moderated.data["comment"]["status"], "rejected");

    let response = get(build_test_app(pool.clone()), &format!("/api/comments/{post_id}")).await;
    assert_eq!(body_json(response).await["total"], 0);
    let response = get(
        build_test_app(pool.clone()),
        &format!("/api/comments/{root_id}/replies"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(
        build_test_app(pool.clone()),
        "/api/admin/comments/stats",
        &admin_token,
    )
    .await;
    let stats = body_json(response).await["data"].clone();
    assert_eq!((stats["total"].as_i64(), stats["rejected"].as_i64()), (Some(2), Some(1)));

    let response = delete_auth(
        app_with_state(state.clone()),
        &format!("/api/comments/{root_id}"),
        &reader_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let deleted = events.try_recv().unwrap();
    assert_eq!(deleted.event_type, comment::DELETED);
    assert_eq!(
        deleted.data,
        json!({ "comment_id": root_id, "post_id": post_id, "is_reply": false })
    );

    let response = get_auth(
        build_test_app(pool),
        "/api/admin/comments?status=all",
        &admin_token,
    )
    .await;
    assert_eq!(body_json(response).await["total"], 0);
}

// ---------------------------------------------------------------------------
// Documentation locks
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn content_lock_lifecycle_over_rest(pool: PgPool) {
    let ada = create_user(&pool, "ada", "editor").await;
    let grace = create_user(&pool, "grace", "editor").await;
    let admin = create_user(&pool, "boss", "admin").await;
    let ada_token = token_for(ada.id, "editor");
    let grace_token = token_for(grace.id, "editor");

    let content_id = create_doc_content(&pool, &ada_token).await;
    let lock_uri = format!("/api/documentation/content/{content_id}/lock");

    let state = test_state(pool.clone());
    let mut events = state.event_bus.subscribe();
    let response = post_json_auth(app_with_state(state), &lock_uri, json!({}), &ada_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["user_id"], ada.id);

    let event = events.try_recv().unwrap();
    assert_eq!(event.event_type, collab::CONTENT_LOCKED);
    assert_eq!(event.room.as_deref(), Some("documentation_api"));

    let response = post_json_auth(build_test_app(pool.clone()), &lock_uri, json!({}), &grace_token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = delete_auth(build_test_app(pool.clone()), &lock_uri, &grace_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(build_test_app(pool.clone()), &lock_uri, &grace_token).await;
    assert_eq!(body_json(response).await["data"]["locked"], true);

    let response = delete_auth(
        build_test_app(pool.clone()),
        &lock_uri,
        &token_for(admin.id, "admin"),
    )
    .await;
    assert_eq!(body_json(response).await["data"]["released"], true);

    let response = post_json_auth(build_test_app(pool), &lock_uri, json!({}), &grace_token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn locking_missing_content_is_404(pool: PgPool) {
    let ada = create_user(&pool, "ada", "editor").await;

    let response = post_json_auth(
        build_test_app(pool),
        "/api/documentation/content/999999/lock",
        json!({}),
        &token_for(ada.id, "editor"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
