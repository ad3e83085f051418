//! Repository for the `comments` and `comment_reactions` tables.

use folio_core::comments::{STATUS_APPROVED, STATUS_PENDING, STATUS_REJECTED};
use folio_core::types::DbId;
use sqlx::PgPool;

use crate::models::comment::{
    AdminCommentView, Comment, CommentReaction, CommentStats, CommentView, NewComment,
};

const COLUMNS: &str = "id, post_id, user_id, parent_id, content, content_html, status, \
                       approved_by, approved_at, created_at, updated_at";

/// [`COLUMNS`] qualified for queries that join `comments c`.
const C_COLUMNS: &str = "c.id, c.post_id, c.user_id, c.parent_id, c.content, c.content_html, \
                         c.status, c.approved_by, c.approved_at, c.created_at, c.updated_at";

const REACTION_COLUMNS: &str = "id, comment_id, user_id, reaction_type, created_at";

/// Author names plus reply and reaction counters for `comments c`.
///
/// `$2` is the status filter applied to replies (NULL counts all).
const VIEW_EXTRAS: &str = "u.username, u.first_name, u.last_name,
    (SELECT COUNT(*) FROM comments r
      WHERE r.parent_id = c.id AND ($2::TEXT IS NULL OR r.status = $2)) AS reply_count,
    (SELECT COUNT(*) FROM comment_reactions cr WHERE cr.comment_id = c.id) AS like_count";

/// Provides threaded comment storage, moderation and reactions.
pub struct CommentRepo;

impl CommentRepo {
    pub async fn create(pool: &PgPool, input: &NewComment<'_>) -> Result<Comment, sqlx::Error> {
        let query = format!(
            "INSERT INTO comments
                (post_id, user_id, parent_id, content, content_html, status, ip_address, user_agent)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(input.post_id)
            .bind(input.user_id)
            .bind(input.parent_id)
            .bind(input.content)
            .bind(input.content_html)
            .bind(input.status)
            .bind(input.ip_address)
            .bind(input.user_agent)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM comments WHERE id = $1");
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// One comment with its author and counters. Replies are counted when
    /// their status matches `status` (all replies when `None`).
    pub async fn find_view(
        pool: &PgPool,
        id: DbId,
        status: Option<&str>,
    ) -> Result<Option<CommentView>, sqlx::Error> {
        let query = format!(
            "SELECT {C_COLUMNS}, {VIEW_EXTRAS}
             FROM comments c
             LEFT JOIN users u ON u.id = c.user_id
             WHERE c.id = $1"
        );
        sqlx::query_as::<_, CommentView>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Top-level comments on a post, newest first.
    pub async fn list_for_post(
        pool: &PgPool,
        post_id: DbId,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CommentView>, sqlx::Error> {
        let query = format!(
            "SELECT {C_COLUMNS}, {VIEW_EXTRAS}
             FROM comments c
             LEFT JOIN users u ON u.id = c.user_id
             WHERE c.post_id = $1 AND c.parent_id IS NULL
               AND ($2::TEXT IS NULL OR c.status = $2)
             ORDER BY c.created_at DESC, c.id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, CommentView>(&query)
            .bind(post_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_top_level(
        pool: &PgPool,
        post_id: DbId,
        status: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM comments
             WHERE post_id = $1 AND parent_id IS NULL AND ($2::TEXT IS NULL OR status = $2)",
        )
        .bind(post_id)
        .bind(status)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Direct replies to a comment, oldest first.
    pub async fn list_replies(
        pool: &PgPool,
        parent_id: DbId,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CommentView>, sqlx::Error> {
        let query = format!(
            "SELECT {C_COLUMNS}, {VIEW_EXTRAS}
             FROM comments c
             LEFT JOIN users u ON u.id = c.user_id
             WHERE c.parent_id = $1 AND ($2::TEXT IS NULL OR c.status = $2)
             ORDER BY c.created_at ASC, c.id ASC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, CommentView>(&query)
            .bind(parent_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_replies(
        pool: &PgPool,
        parent_id: DbId,
        status: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM comments
             WHERE parent_id = $1 AND ($2::TEXT IS NULL OR status = $2)",
        )
        .bind(parent_id)
        .bind(status)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Every comment on a post, replies included.
    pub async fn count_for_post(
        pool: &PgPool,
        post_id: DbId,
        status: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM comments
             WHERE post_id = $1 AND ($2::TEXT IS NULL OR status = $2)",
        )
        .bind(post_id)
        .bind(status)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Replace the text of a comment. Only its author's rows match.
    pub async fn update_content(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        content: &str,
        content_html: &str,
    ) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!(
            "UPDATE comments SET content = $3, content_html = $4
             WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .bind(user_id)
            .bind(content)
            .bind(content_html)
            .fetch_optional(pool)
            .await
    }

    /// Delete a comment and, through the foreign key, its whole reply thread.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!("DELETE FROM comments WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Moderation
    // -----------------------------------------------------------------------

    /// Set the moderation status and record who decided.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
        moderator_id: DbId,
    ) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!(
            "UPDATE comments SET status = $2, approved_by = $3, approved_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .bind(status)
            .bind(moderator_id)
            .fetch_optional(pool)
            .await
    }

    /// All comments across posts, newest first, for moderators.
    pub async fn list_admin(
        pool: &PgPool,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AdminCommentView>, sqlx::Error> {
        let query = format!(
            "SELECT {C_COLUMNS}, u.username, u.first_name, u.last_name,
                    bp.title AS post_title, c.ip_address, c.user_agent
             FROM comments c
             LEFT JOIN users u ON u.id = c.user_id
             LEFT JOIN blog_posts bp ON bp.id = c.post_id
             WHERE ($1::TEXT IS NULL OR c.status = $1)
             ORDER BY c.created_at DESC, c.id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, AdminCommentView>(&query)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_admin(pool: &PgPool, status: Option<&str>) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM comments WHERE ($1::TEXT IS NULL OR status = $1)")
                .bind(status)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }

    pub async fn stats(pool: &PgPool) -> Result<CommentStats, sqlx::Error> {
        sqlx::query_as::<_, CommentStats>(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE status = $1) AS pending,
                    COUNT(*) FILTER (WHERE status = $2) AS approved,
                    COUNT(*) FILTER (WHERE status = $3) AS rejected
             FROM comments",
        )
        .bind(STATUS_PENDING)
        .bind(STATUS_APPROVED)
        .bind(STATUS_REJECTED)
        .fetch_one(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Reactions
    // -----------------------------------------------------------------------

    /// Record a reaction. Returns `None` when the user already reacted this way.
    pub async fn add_reaction(
        pool: &PgPool,
        comment_id: DbId,
        user_id: DbId,
        reaction_type: &str,
    ) -> Result<Option<CommentReaction>, sqlx::Error> {
        let query = format!(
            "INSERT INTO comment_reactions (comment_id, user_id, reaction_type)
             VALUES ($1, $2, $3)
             ON CONFLICT (comment_id, user_id, reaction_type) DO NOTHING
             RETURNING {REACTION_COLUMNS}"
        );
        sqlx::query_as::<_, CommentReaction>(&query)
            .bind(comment_id)
            .bind(user_id)
            .bind(reaction_type)
            .fetch_optional(pool)
            .await
    }

    /// Remove the user's reactions on a comment, or only `reaction_type`.
    pub async fn remove_reactions(
        pool: &PgPool,
        comment_id: DbId,
        user_id: DbId,
        reaction_type: Option<&str>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM comment_reactions
             WHERE comment_id = $1 AND user_id = $2
               AND ($3::TEXT IS NULL OR reaction_type = $3)",
        )
        .bind(comment_id)
        .bind(user_id)
        .bind(reaction_type)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// `(comment_id, reaction_type)` pairs the user left on a post's comments.
    pub async fn user_reactions_for_post(
        pool: &PgPool,
        post_id: DbId,
        user_id: DbId,
    ) -> Result<Vec<(DbId, String)>, sqlx::Error> {
        sqlx::query_as(
            "SELECT cr.comment_id, cr.reaction_type
             FROM comment_reactions cr
             JOIN comments c ON c.id = cr.comment_id
             WHERE c.post_id = $1 AND cr.user_id = $2
             ORDER BY cr.comment_id, cr.reaction_type",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
