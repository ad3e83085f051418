//! Integration tests for documentation content locks.

mod common;

use folio_db::models::content_lock::ContentLock;
use folio_db::repositories::ContentLockRepo;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_acquire_refresh_and_deny(pool: PgPool) {
    let alice = common::create_user(&pool, "alice", "editor").await;
    let bob = common::create_user(&pool, "bob", "editor").await;
    let content = common::create_content(&pool, &alice, "intro", "api").await;

    let first = ContentLockRepo::acquire(&pool, content.id, alice.id, "alice")
        .await
        .unwrap()
        .expect("unlocked content should be acquired");
    assert_eq!(first.user_id, alice.id);
    assert!(first.expires_at > first.locked_at);

    let refreshed = ContentLockRepo::acquire(&pool, content.id, alice.id, "alice")
        .await
        .unwrap()
        .expect("holder should refresh");
    assert!(refreshed.locked_at >= first.locked_at);
    assert!(refreshed.expires_at >= first.expires_at);

    let denied = ContentLockRepo::acquire(&pool, content.id, bob.id, "bob")
        .await
        .unwrap();
    assert!(denied.is_none(), "another user's live lock must not be taken");

    let active = ContentLockRepo::get_active(&pool, content.id).await.unwrap().unwrap();
    assert_eq!(active.user_id, alice.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_holder_refresh_restarts_locked_at(pool: PgPool) {
    let alice = common::create_user(&pool, "alice", "editor").await;
    let content = common::create_content(&pool, &alice, "refresh", "api").await;

    ContentLockRepo::acquire(&pool, content.id, alice.id, "alice")
        .await
        .unwrap()
        .unwrap();
    let backdated: ContentLock = sqlx::query_as(
        "UPDATE content_locks
         SET locked_at = NOW() - INTERVAL '20 minutes',
             expires_at = NOW() + INTERVAL '10 minutes'
         WHERE content_id = $1
         RETURNING id, content_id, user_id, user_name, locked_at, expires_at",
    )
    .bind(content.id)
    .fetch_one(&pool)
    .await
    .unwrap();

    let refreshed = ContentLockRepo::acquire(&pool, content.id, alice.id, "alice")
        .await
        .unwrap()
        .expect("holder should refresh");

    assert!(refreshed.locked_at > backdated.locked_at + chrono::Duration::minutes(19));
    assert!(refreshed.expires_at > backdated.expires_at + chrono::Duration::minutes(19));
    assert_eq!(refreshed.id, backdated.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_expired_lock_is_taken_over_and_cleaned(pool: PgPool) {
    let alice = common::create_user(&pool, "alice", "editor").await;
    let bob = common::create_user(&pool, "bob", "editor").await;
    let content = common::create_content(&pool, &alice, "guide", "api").await;

    ContentLockRepo::acquire(&pool, content.id, alice.id, "alice")
        .await
        .unwrap()
        .unwrap();
    sqlx::query("UPDATE content_locks SET expires_at = NOW() - INTERVAL '1 minute'")
        .execute(&pool)
        .await
        .unwrap();

    assert!(ContentLockRepo::get_active(&pool, content.id).await.unwrap().is_none());

    let taken = ContentLockRepo::acquire(&pool, content.id, bob.id, "bob")
        .await
        .unwrap()
        .expect("expired lock should be taken over");
    assert_eq!(taken.user_id, bob.id);

    sqlx::query("UPDATE content_locks SET expires_at = NOW() - INTERVAL '1 minute'")
        .execute(&pool)
        .await
        .unwrap();
    assert_eq!(ContentLockRepo::cleanup_expired(&pool).await.unwrap(), 1);
    assert_eq!(ContentLockRepo::cleanup_expired(&pool).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_release_rules(pool: PgPool) {
    let alice = common::create_user(&pool, "alice", "editor").await;
    let bob = common::create_user(&pool, "bob", "editor").await;
    let content = common::create_content(&pool, &alice, "faq", "guides").await;

    ContentLockRepo::acquire(&pool, content.id, alice.id, "alice")
        .await
        .unwrap()
        .unwrap();

    assert!(!ContentLockRepo::release(&pool, content.id, bob.id).await.unwrap());
    assert!(ContentLockRepo::release(&pool, content.id, alice.id).await.unwrap());
    assert!(!ContentLockRepo::force_release(&pool, content.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_release_all_for_user_reports_libraries(pool: PgPool) {
    let alice = common::create_user(&pool, "alice", "editor").await;
    let a = common::create_content(&pool, &alice, "a", "api").await;
    let b = common::create_content(&pool, &alice, "b", "guides").await;

    ContentLockRepo::acquire(&pool, a.id, alice.id, "alice").await.unwrap().unwrap();
    ContentLockRepo::acquire(&pool, b.id, alice.id, "alice").await.unwrap().unwrap();

    let mut released = ContentLockRepo::release_all_for_user(&pool, alice.id).await.unwrap();
    released.sort_by_key(|r| r.content_id);
    let libraries: Vec<&str> = released.iter().map(|r| r.library_type.as_str()).collect();
    assert_eq!(libraries, vec!["api", "guides"]);

    assert!(ContentLockRepo::get_active(&pool, a.id).await.unwrap().is_none());
}
