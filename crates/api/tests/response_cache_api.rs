//! Response-cache behaviour visible over HTTP.
//!
//! The pool behind these apps is unreachable, so a 200 from a public read
//! can only have come from the cache.

mod common;

use axum::http::StatusCode;
use common::{
    app_with_state, body_json, delete_auth, get, get_auth, lazy_pool, post_json_auth,
    test_state, token_for,
};
use folio_core::cache_keys::{item_key, TAG_BLOG, TAG_PRODUCTS};
use folio_api::cached::cached_data;
use folio_api::error::AppResult;
use folio_core::event_types::CACHE_INVALIDATED;
use serde_json::json;

#[tokio::test]
async fn public_blog_list_is_served_from_cache() {
    let state = test_state(lazy_pool());
    let cached = json!({ "data": [{ "id": 1, "title": "Cached" }], "total": 1, "limit": 20, "offset": 0 });
    state
        .cache
        .insert("blog:list:limit=20&offset=0", cached.clone(), &[TAG_BLOG])
        .await;

    let response = get(app_with_state(state.clone()), "/api/blog").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, cached);
    assert_eq!(state.cache.stats().await.hits, 1);
}

#[tokio::test]
async fn cached_item_is_returned_with_its_envelope() {
    let state = test_state(lazy_pool());
    let product = json!({ "id": 4, "name": "Mug", "price_cents": 1250 });
    state
        .cache
        .insert(item_key("products", 4), json!({ "data": product }), &[TAG_PRODUCTS])
        .await;

    let response = get(app_with_state(state), "/api/products/4").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], product);
}

#[tokio::test]
async fn admin_can_inspect_cache_stats() {
    let state = test_state(lazy_pool());
    state.cache.insert("blog:tree", json!([]), &[TAG_BLOG]).await;

    let response = get_auth(
        app_with_state(state),
        "/api/admin/cache/stats",
        &token_for(1, "admin"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["stats"]["entry_count"], 1);
    assert!(json["data"]["tags"]
        .as_array()
        .unwrap()
        .contains(&json!("documentation")));
}

#[tokio::test]
async fn invalidate_by_tag_removes_only_tagged_entries_and_notifies() {
    let state = test_state(lazy_pool());
    let mut events = state.event_bus.subscribe();
    state.cache.insert("blog:list", json!([]), &[TAG_BLOG]).await;
    state.cache.insert("products:list", json!([]), &[TAG_PRODUCTS]).await;

    let response = post_json_auth(
        app_with_state(state.clone()),
        "/api/admin/cache/invalidate",
        json!({ "tag": "blog" }),
        &token_for(1, "admin"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["removed"], 1);
    assert_eq!(json["data"]["keys"], json!(["blog:list"]));

    assert!(state.cache.get("blog:list").await.is_none());
    assert!(state.cache.get("products:list").await.is_some());

    let event = events.try_recv().expect("invalidation should be announced");
    assert_eq!(event.event_type, CACHE_INVALIDATED);
    assert_eq!(event.data["tags"], json!(["blog"]));
    assert_eq!(event.room, None);
}

#[tokio::test]
async fn invalidate_by_pattern() {
    let state = test_state(lazy_pool());
    state.cache.insert("products:item:1", json!({}), &[TAG_PRODUCTS]).await;
    state.cache.insert("products:item:2", json!({}), &[TAG_PRODUCTS]).await;
    state.cache.insert("products:list", json!([]), &[TAG_PRODUCTS]).await;

    let response = post_json_auth(
        app_with_state(state.clone()),
        "/api/admin/cache/invalidate",
        json!({ "pattern": "products:item:*" }),
        &token_for(1, "admin"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["removed"], 2);
    assert!(state.cache.get("products:list").await.is_some());
}

#[tokio::test]
async fn invalidate_rejects_bad_requests() {
    let admin = token_for(1, "admin");

    let response = post_json_auth(
        app_with_state(test_state(lazy_pool())),
        "/api/admin/cache/invalidate",
        json!({ "tag": "nonsense" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        app_with_state(test_state(lazy_pool())),
        "/api/admin/cache/invalidate",
        json!({ "tag": "blog", "pattern": "blog:*" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        app_with_state(test_state(lazy_pool())),
        "/api/admin/cache/invalidate",
        json!({}),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn clear_cache_empties_everything() {
    let state = test_state(lazy_pool());
    let mut events = state.event_bus.subscribe();
    state.cache.insert("blog:list", json!([]), &[TAG_BLOG]).await;
    state.cache.insert("products:list", json!([]), &[TAG_PRODUCTS]).await;

    let response = delete_auth(
        app_with_state(state.clone()),
        "/api/admin/cache",
        &token_for(1, "admin"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(state.cache.stats().await.entry_count, 0);
    assert_eq!(events.try_recv().unwrap().data["all"], true);
}

#[tokio::test]
async fn read_through_skips_a_load_invalidated_mid_flight() {
    let state = test_state(lazy_pool());

    let inner = state.clone();
    let body = cached_data(&state, "products:list".to_string(), &[TAG_PRODUCTS], || async move {
        // A product write lands after the read started.
        inner.cache.invalidate_tag(TAG_PRODUCTS).await;
        AppResult::Ok(json!(["stale"]))
    })
    .await
    .unwrap();

    assert_eq!(body["data"], json!(["stale"]));
    assert!(state.cache.get("products:list").await.is_none());

    let body = cached_data(&state, "products:list".to_string(), &[TAG_PRODUCTS], || async {
        AppResult::Ok(json!(["fresh"]))
    })
    .await
    .unwrap();
    assert_eq!(body["data"], json!(["fresh"]));
    assert_eq!(
        state.cache.get("products:list").await.unwrap()["data"],
        json!(["fresh"])
    );
}
