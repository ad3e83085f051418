//! Event-bus to WebSocket delivery.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use folio_api::broadcaster::Broadcaster;
use folio_api::ws::WsManager;
use folio_core::event_types::{collab, user_room, CART_UPDATE};
use folio_events::{ContentEvent, EventBus};
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;

fn frame(rx: &mut UnboundedReceiver<Message>) -> Option<serde_json::Value> {
    match rx.try_recv() {
        Ok(Message::Text(t)) => serde_json::from_str(t.as_str()).ok(),
        _ => None,
    }
}

#[tokio::test]
async fn room_event_skips_excluded_and_outsiders() {
    let manager = Arc::new(WsManager::new());
    let mut sender = manager.add("sender".to_string(), None).await;
    let mut peer = manager.add("peer".to_string(), None).await;
    let mut other = manager.add("other".to_string(), None).await;
    manager.join_room("sender", "documentation_api").await;
    manager.join_room("peer", "documentation_api").await;
    manager.join_room("other", "documentation_guides").await;

    let broadcaster = Broadcaster::new(manager.clone());
    let event = ContentEvent::new(collab::CONTENT_LOCKED)
        .with_data(json!({ "content_id": 3 }))
        .to_room("documentation_api")
        .excluding("sender");

    assert_eq!(broadcaster.deliver(&event).await, 1);

    let received = frame(&mut peer).expect("peer should receive the event");
    assert_eq!(received["type"], "content_locked");
    assert_eq!(received["data"]["content_id"], 3);
    assert!(frame(&mut sender).is_none());
    assert!(frame(&mut other).is_none());
}

#[tokio::test]
async fn unaddressed_event_goes_to_everyone() {
    let manager = Arc::new(WsManager::new());
    let mut a = manager.add("a".to_string(), None).await;
    let mut b = manager.add("b".to_string(), None).await;

    let broadcaster = Broadcaster::new(manager.clone());
    assert_eq!(broadcaster.deliver(&ContentEvent::new("blog_created")).await, 2);

    assert_eq!(frame(&mut a).unwrap()["type"], "blog_created");
    assert_eq!(frame(&mut b).unwrap()["type"], "blog_created");
}

#[tokio::test]
async fn cart_events_stay_in_the_owners_room() {
    let manager = Arc::new(WsManager::new());
    let mut owner = manager.add("owner".to_string(), None).await;
    let mut stranger = manager.add("stranger".to_string(), None).await;
    manager.join_room("owner", &user_room(5)).await;
    manager.join_room("stranger", &user_room(6)).await;

    let broadcaster = Broadcaster::new(manager.clone());
    let event = ContentEvent::new(CART_UPDATE)
        .with_data(json!({ "action": "add" }))
        .to_room(user_room(5));
    broadcaster.deliver(&event).await;

    assert_eq!(frame(&mut owner).unwrap()["data"]["action"], "add");
    assert!(frame(&mut stranger).is_none());
}

#[tokio::test]
async fn run_loop_delivers_published_events_and_stops_with_the_bus() {
    let manager = Arc::new(WsManager::new());
    let mut rx = manager.add("a".to_string(), None).await;

    let bus = EventBus::default();
    let handle = tokio::spawn(Broadcaster::new(manager.clone()).run(bus.subscribe()));

    bus.publish(ContentEvent::new("product_created"));
    let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("event should arrive")
        .expect("channel open");
    let Message::Text(text) = msg else {
        panic!("expected a text frame");
    };
    let value: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
    assert_eq!(value["type"], "product_created");

    drop(bus);
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("broadcaster should exit once the bus is dropped")
        .unwrap();
}
