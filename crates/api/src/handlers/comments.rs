//! Handlers for blog comments: the public `/comments` resource and the
//! moderation routes under `/admin/comments`.
//!
//! Comments are always read from the database. Readers see approved
//! comments only; a rejected comment and its replies drop out of every
//! listing and count.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use folio_core::blog::STATUS_PUBLISHED;
use folio_core::comments::{
    render_html, validate_comment, validate_reaction_type, validate_status, DEFAULT_REPLIES_LIMIT,
    DEFAULT_STATUS, STATUS_APPROVED, STATUS_REJECTED,
};
use folio_core::error::CoreError;
use folio_core::event_types::comment;
use folio_core::pagination::{clamp_limit, clamp_offset, MAX_LIMIT};
use folio_core::roles::{can_edit_content, ROLE_ADMIN};
use folio_core::types::DbId;
use folio_db::models::comment::{Comment, CreateComment, NewComment, UpdateComment};
use folio_db::repositories::{BlogPostRepo, CommentRepo};
use folio_events::ContentEvent;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, OptionalAuthUser};
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::notify::publish;
use crate::query::PaginationParams;
use crate::response::{DataResponse, ListResponse};
use crate::state::AppState;

/// Longest user agent kept with a comment.
const MAX_USER_AGENT_LEN: usize = 512;

/// Query parameters for `GET /admin/comments`.
#[derive(Debug, Default, Deserialize)]
pub struct AdminCommentParams {
    /// `pending`, `approved`, `rejected`, or `all` (the default).
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Optional query for `DELETE /comments/{id}/reactions`.
#[derive(Debug, Default, Deserialize)]
pub struct ReactionParams {
    pub reaction_type: Option<String>,
}

/// Request body for `POST /comments/{id}/reactions`.
#[derive(Debug, Deserialize)]
pub struct AddReaction {
    pub reaction_type: String,
}

/// 404 unless the post exists and the caller may read it.
async fn require_visible_post(
    state: &AppState,
    post_id: DbId,
    user: Option<&AuthUser>,
) -> AppResult<()> {
    let post = BlogPostRepo::find_by_id(&state.pool, post_id)
        .await?
        .ok_or_else(|| AppError::not_found("BlogPost", post_id))?;
    let editor = user.is_some_and(|u| can_edit_content(&u.role));
    if post.status != STATUS_PUBLISHED && !editor {
        return Err(AppError::not_found("BlogPost", post_id));
    }
    Ok(())
}

async fn find_comment(state: &AppState, id: DbId) -> AppResult<Comment> {
    CommentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment", id))
}

/// A comment readers can see, or 404.
async fn find_visible_comment(state: &AppState, id: DbId) -> AppResult<Comment> {
    let comment = find_comment(state, id).await?;
    if comment.status != STATUS_APPROVED {
        return Err(AppError::not_found("Comment", id));
    }
    Ok(comment)
}

/// Forwarded client address, when a proxy supplied one.
fn client_ip(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
}

fn user_agent(headers: &HeaderMap) -> Option<&str> {
    let agent = headers.get(USER_AGENT)?.to_str().ok()?;
    let mut end = agent.len().min(MAX_USER_AGENT_LEN);
    while !agent.is_char_boundary(end) {
        end -= 1;
    }
    Some(&agent[..end])
}

fn announce(state: &AppState, event_type: &str, data: serde_json::Value, actor: DbId) {
    publish(
        state,
        ContentEvent::new(event_type).with_data(data).with_actor(actor),
    );
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/comments/{post_id}
///
/// Approved top-level comments, newest first.
pub async fn list_comments(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    Path(post_id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    require_visible_post(&state, post_id, user.as_ref()).await?;

    let (limit, offset) = params.clamped();
    let status = Some(STATUS_APPROVED);
    let data = CommentRepo::list_for_post(&state.pool, post_id, status, limit, offset).await?;
    let total = CommentRepo::count_top_level(&state.pool, post_id, status).await?;
    Ok(Json(ListResponse {
        data,
        total,
        limit,
        offset,
    }))
}

/// GET /api/comments/{post_id}/count
///
/// Approved comments on the post, replies included.
pub async fn count_comments(
    State(state): State<AppState>,
    Path(post_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let count = CommentRepo::count_for_post(&state.pool, post_id, Some(STATUS_APPROVED)).await?;
    Ok(Json(DataResponse {
        data: json!({ "count": count }),
    }))
}

/// GET /api/comments/{comment_id}/replies
///
/// Approved direct replies, oldest first. Pages hold 10 replies by default.
pub async fn list_replies(
    State(state): State<AppState>,
    Path(comment_id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    find_visible_comment(&state, comment_id).await?;

    let limit = clamp_limit(params.limit, DEFAULT_REPLIES_LIMIT, MAX_LIMIT);
    let offset = clamp_offset(params.offset);
    let status = Some(STATUS_APPROVED);
    let data = CommentRepo::list_replies(&state.pool, comment_id, status, limit, offset).await?;
    let total = CommentRepo::count_replies(&state.pool, comment_id, status).await?;
    Ok(Json(ListResponse {
        data,
        total,
        limit,
        offset,
    }))
}

/// GET /api/comments/{post_id}/reactions
///
/// The caller's reactions on the post's comments, keyed by comment id.
pub async fn my_reactions(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(post_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let mut data: BTreeMap<DbId, Vec<String>> = BTreeMap::new();
    for (comment_id, reaction) in
        CommentRepo::user_reactions_for_post(&state.pool, post_id, user.user_id).await?
    {
        data.entry(comment_id).or_default().push(reaction);
    }
    Ok(Json(DataResponse { data }))
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// POST /api/comments
///
/// A reply must target a visible comment on the same post.
pub async fn create_comment(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateComment>,
) -> AppResult<impl IntoResponse> {
    validate_comment(&input.content).map_err(AppError::validation)?;
    require_visible_post(&state, input.post_id, Some(&user)).await?;

    if let Some(parent_id) = input.parent_id {
        let parent = find_visible_comment(&state, parent_id).await?;
        if parent.post_id != input.post_id {
            return Err(AppError::validation(
                "Parent comment belongs to a different post",
            ));
        }
    }

    let content = input.content.trim();
    let html = render_html(content);
    let created = CommentRepo::create(
        &state.pool,
        &NewComment {
            post_id: input.post_id,
            user_id: user.user_id,
            parent_id: input.parent_id,
            content,
            content_html: &html,
            status: DEFAULT_STATUS,
            ip_address: client_ip(&headers),
            user_agent: user_agent(&headers),
        },
    )
    .await?;
    let view = CommentRepo::find_view(&state.pool, created.id, Some(STATUS_APPROVED))
        .await?
        .ok_or_else(|| AppError::InternalError("Created comment vanished".into()))?;

    tracing::info!(
        comment_id = created.id,
        post_id = created.post_id,
        user_id = user.user_id,
        reply = created.parent_id.is_some(),
        "Comment created",
    );

    announce(
        &state,
        comment::CREATED,
        json!({
            "post_id": created.post_id,
            "comment": &view,
            "is_reply": created.parent_id.is_some(),
        }),
        user.user_id,
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

/// PUT /api/comments/{id}
///
/// Authors edit their own comments only.
pub async fn update_comment(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateComment>,
) -> AppResult<impl IntoResponse> {
    validate_comment(&input.content).map_err(AppError::validation)?;

    let existing = find_comment(&state, id).await?;
    if existing.user_id != Some(user.user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "You can only edit your own comments".into(),
        )));
    }

    let content = input.content.trim();
    let updated = CommentRepo::update_content(
        &state.pool,
        id,
        user.user_id,
        content,
        &render_html(content),
    )
    .await?
    .ok_or_else(|| AppError::not_found("Comment", id))?;

    tracing::info!(comment_id = id, user_id = user.user_id, "Comment updated");

    announce(
        &state,
        comment::UPDATED,
        json!({ "comment_id": id, "comment": &updated }),
        user.user_id,
    );

    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/comments/{id}
///
/// Authors delete their own comments; admins may delete any. Replies go
/// with their parent.
pub async fn delete_comment(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let existing = find_comment(&state, id).await?;
    if existing.user_id != Some(user.user_id) && user.role != ROLE_ADMIN {
        return Err(AppError::Core(CoreError::Forbidden(
            "You can only delete your own comments".into(),
        )));
    }
    remove_comment(&state, id, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_comment(state: &AppState, id: DbId, actor: DbId) -> AppResult<()> {
    let deleted = CommentRepo::delete(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment", id))?;

    tracing::info!(comment_id = id, user_id = actor, "Comment deleted");

    announce(
        state,
        comment::DELETED,
        json!({
            "comment_id": id,
            "post_id": deleted.post_id,
            "is_reply": deleted.parent_id.is_some(),
        }),
        actor,
    );
    Ok(())
}

/// POST /api/comments/{id}/reactions
///
/// 201 when the reaction is new, 200 when the caller already left it.
pub async fn add_reaction(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AddReaction>,
) -> AppResult<impl IntoResponse> {
    validate_reaction_type(&input.reaction_type).map_err(AppError::validation)?;
    find_visible_comment(&state, id).await?;

    let added =
        CommentRepo::add_reaction(&state.pool, id, user.user_id, &input.reaction_type).await?;
    let status = if added.is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(DataResponse {
            data: json!({
                "comment_id": id,
                "reaction_type": input.reaction_type,
                "added": added.is_some(),
            }),
        }),
    ))
}

/// DELETE /api/comments/{id}/reactions[?reaction_type=]
pub async fn remove_reaction(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<ReactionParams>,
) -> AppResult<impl IntoResponse> {
    let removed = CommentRepo::remove_reactions(
        &state.pool,
        id,
        user.user_id,
        params.reaction_type.as_deref(),
    )
    .await?;
    Ok(Json(DataResponse {
        data: json!({ "comment_id": id, "removed": removed }),
    }))
}

// ---------------------------------------------------------------------------
// Moderation
// ---------------------------------------------------------------------------

/// GET /api/admin/comments[?status=]
pub async fn admin_list_comments(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<AdminCommentParams>,
) -> AppResult<impl IntoResponse> {
    let status = params.status.as_deref().filter(|s| *s != "all");
    if let Some(status) = status {
        validate_status(status).map_err(AppError::validation)?;
    }

    let page = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    };
    let (limit, offset) = page.clamped();
    let data = CommentRepo::list_admin(&state.pool, status, limit, offset).await?;
    let total = CommentRepo::count_admin(&state.pool, status).await?;
    Ok(Json(ListResponse {
        data,
        total,
        limit,
        offset,
    }))
}

/// GET /api/admin/comments/stats
pub async fn comment_stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let stats = CommentRepo::stats(&state.pool).await?;
    Ok(Json(DataResponse { data: stats }))
}

/// PUT /api/admin/comments/{id}/approve
pub async fn approve_comment(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    moderate(&state, id, STATUS_APPROVED, admin.user_id).await
}

/// PUT /api/admin/comments/{id}/reject
pub async fn reject_comment(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    moderate(&state, id, STATUS_REJECTED, admin.user_id).await
}

async fn moderate(
    state: &AppState,
    id: DbId,
    status: &str,
    admin_id: DbId,
) -> AppResult<Json<DataResponse<Comment>>> {
    let comment = CommentRepo::set_status(&state.pool, id, status, admin_id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment", id))?;

    tracing::info!(comment_id = id, user_id = admin_id, status, "Comment moderated");

    announce(
        state,
        comment::UPDATED,
        json!({ "comment_id": id, "comment": &comment }),
        admin_id,
    );
    Ok(Json(DataResponse { data: comment }))
}

/// DELETE /api/admin/comments/{id}
pub async fn admin_delete_comment(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    remove_comment(&state, id, admin.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
