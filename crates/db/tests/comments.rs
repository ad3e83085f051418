//! Integration tests for threaded comments, moderation and reactions.

mod common;

use assert_matches::assert_matches;
use folio_core::comments::{render_html, STATUS_APPROVED, STATUS_REJECTED};
use folio_core::types::DbId;
use folio_db::models::comment::{Comment, NewComment};
use folio_db::repositories::CommentRepo;
use sqlx::PgPool;

async fn comment(
    pool: &PgPool,
    post_id: DbId,
    user_id: DbId,
    parent_id: Option<DbId>,
    text: &str,
) -> Comment {
    let html = render_html(text);
    CommentRepo::create(
        pool,
        &NewComment {
            post_id,
            user_id,
            parent_id,
            content: text,
            content_html: &html,
            status: STATUS_APPROVED,
            ip_address: Some("203.0.113.9"),
            user_agent: Some("tests"),
        },
    )
    .await
    .unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_threads_and_counts(pool: PgPool) {
    let author = common::create_user(&pool, "author", "editor").await;
    let reader = common::create_user(&pool, "reader", "user").await;
    let post = common::create_post(&pool, &author, "hello").await;

    let first = comment(&pool, post.id, reader.id, None, "First!").await;
    let second = comment(&pool, post.id, author.id, None, "Thanks\nfor reading").await;
    comment(&pool, post.id, author.id, Some(first.id), "Welcome").await;
    comment(&pool, post.id, reader.id, Some(first.id), "Cheers").await;

    assert_eq!(second.content_html, "Thanks<br>for reading");

    let top = CommentRepo::list_for_post(&pool, post.id, Some(STATUS_APPROVED), 20, 0)
        .await
        .unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].comment.id, second.id, "newest first");
    assert_eq!(top[1].reply_count, 2);
    assert_eq!(top[1].username.as_deref(), Some("reader"));
    assert_eq!(
        CommentRepo::count_top_level(&pool, post.id, Some(STATUS_APPROVED)).await.unwrap(),
        2
    );

    let replies = CommentRepo::list_replies(&pool, first.id, Some(STATUS_APPROVED), 10, 0)
        .await
        .unwrap();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].comment.content, "Welcome", "oldest first");
    assert_eq!(CommentRepo::count_for_post(&pool, post.id, None).await.unwrap(), 4);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_only_the_author_can_edit(pool: PgPool) {
    let author = common::create_user(&pool, "author", "editor").await;
    let other = common::create_user(&pool, "other", "user").await;
    let post = common::create_post(&pool, &author, "edits").await;
    let c = comment(&pool, post.id, author.id, None, "Draft").await;

    let denied = CommentRepo::update_content(&pool, c.id, other.id, "Hijack", "Hijack")
        .await
        .unwrap();
    assert_matches!(denied, None);

    let edited = CommentRepo::update_content(&pool, c.id, author.id, "Final", "Final")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(edited.content, "Final");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_delete_cascades_to_replies_and_reactions(pool: PgPool) {
    let author = common::create_user(&pool, "author", "editor").await;
    let post = common::create_post(&pool, &author, "cascade").await;
    let root = comment(&pool, post.id, author.id, None, "Root").await;
    let reply = comment(&pool, post.id, author.id, Some(root.id), "Reply").await;
    CommentRepo::add_reaction(&pool, reply.id, author.id, "like").await.unwrap();

    let deleted = CommentRepo::delete(&pool, root.id).await.unwrap().unwrap();
    assert_eq!(deleted.id, root.id);

    assert!(CommentRepo::find_by_id(&pool, reply.id).await.unwrap().is_none());
    assert!(CommentRepo::delete(&pool, root.id).await.unwrap().is_none());
    assert!(CommentRepo::user_reactions_for_post(&pool, post.id, author.id)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_moderation_and_stats(pool: PgPool) {
    let admin = common::create_user(&pool, "admin1", "admin").await;
    let reader = common::create_user(&pool, "reader", "user").await;
    let post = common::create_post(&pool, &admin, "moderated").await;
    let keep = comment(&pool, post.id, reader.id, None, "Fine").await;
    let spam = comment(&pool, post.id, reader.id, None, "Buy now").await;

    let rejected = CommentRepo::set_status(&pool, spam.id, STATUS_REJECTED, admin.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rejected.status, STATUS_REJECTED);
    assert_eq!(rejected.approved_by, Some(admin.id));
    assert!(rejected.approved_at.is_some());

    let visible = CommentRepo::list_for_post(&pool, post.id, Some(STATUS_APPROVED), 20, 0)
        .await
        .unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].comment.id, keep.id);

    let stats = CommentRepo::stats(&pool).await.unwrap();
    assert_eq!((stats.total, stats.approved, stats.rejected, stats.pending), (2, 1, 1, 0));

    let queue = CommentRepo::list_admin(&pool, Some(STATUS_REJECTED), 20, 0)
        .await
        .unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].post_title.as_deref(), Some("Post moderated"));
    assert_eq!(queue[0].ip_address.as_deref(), Some("203.0.113.9"));
    assert_eq!(CommentRepo::count_admin(&pool, None).await.unwrap(), 2);

    assert!(CommentRepo::set_status(&pool, 999_999, STATUS_APPROVED, admin.id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn test_reactions_are_idempotent_per_type(pool: PgPool) {
    let author = common::create_user(&pool, "author", "editor").await;
    let fan = common::create_user(&pool, "fan", "user").await;
    let post = common::create_post(&pool, &author, "reactions").await;
    let c = comment(&pool, post.id, author.id, None, "React to me").await;

    assert!(CommentRepo::add_reaction(&pool, c.id, fan.id, "like").await.unwrap().is_some());
    assert!(CommentRepo::add_reaction(&pool, c.id, fan.id, "like").await.unwrap().is_none());
    assert!(CommentRepo::add_reaction(&pool, c.id, fan.id, "heart").await.unwrap().is_some());

    let view = CommentRepo::find_view(&pool, c.id, None).await.unwrap().unwrap();
    assert_eq!(view.like_count, 2);

    let mine = CommentRepo::user_reactions_for_post(&pool, post.id, fan.id).await.unwrap();
    assert_eq!(mine, vec![(c.id, "heart".to_string()), (c.id, "like".to_string())]);

    assert_eq!(
        CommentRepo::remove_reactions(&pool, c.id, fan.id, Some("heart")).await.unwrap(),
        1
    );
    assert_eq!(CommentRepo::remove_reactions(&pool, c.id, fan.id, None).await.unwrap(), 1);
    assert_eq!(CommentRepo::remove_reactions(&pool, c.id, fan.id, None).await.unwrap(), 0);
}
