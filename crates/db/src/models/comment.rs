//! Blog comment and reaction models.

use folio_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `comments` table, without the client metadata.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: DbId,
    pub post_id: DbId,
    pub user_id: Option<DbId>,
    pub parent_id: Option<DbId>,
    pub content: String,
    pub content_html: String,
    pub status: String,
    pub approved_by: Option<DbId>,
    pub approved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A comment as shown to readers: author names and counters attached.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CommentView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub comment: Comment,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Visible direct replies.
    pub reply_count: i64,
    /// Reactions of any type.
    pub like_count: i64,
}

/// A comment in the moderation queue.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AdminCommentView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub comment: Comment,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub post_title: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize)]
pub struct CommentStats {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CommentReaction {
    pub id: DbId,
    pub comment_id: DbId,
    pub user_id: DbId,
    pub reaction_type: String,
    pub created_at: Timestamp,
}

/// Request body for `POST /comments`.
#[derive(Debug, Deserialize)]
pub struct CreateComment {
    pub post_id: DbId,
    pub content: String,
    pub parent_id: Option<DbId>,
}

/// Request body for `PUT /comments/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateComment {
    pub content: String,
}

/// Everything the repository writes for a new comment.
#[derive(Debug)]
pub struct NewComment<'a> {
    pub post_id: DbId,
    pub user_id: DbId,
    pub parent_id: Option<DbId>,
    pub content: &'a str,
    pub content_html: &'a str,
    pub status: &'a str,
    pub ip_address: Option<&'a str>,
    pub user_agent: Option<&'a str>,
}
