//! Handlers for the `/blog` resource.
//!
//! Anonymous readers only ever see published posts, served from the response
//! cache. Editors read straight from the database and see every status.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use folio_core::blog::{
    validate_content, validate_status, validate_tags, validate_title, STATUS_DRAFT,
    STATUS_PUBLISHED,
};
use folio_core::cache_keys::{item_key, list_key, TAG_BLOG};
use folio_core::event_types::blog;
use folio_core::pagination::{clamp_limit, DEFAULT_LIMIT, MAX_LIMIT};
use folio_core::roles::can_edit_content;
use folio_core::slug::{resolve_slug, validate_slug};
use folio_core::types::DbId;
use folio_db::models::blog::{BlogPost, BlogPostFilter, CreateBlogPost, UpdateBlogPost};
use folio_db::repositories::BlogPostRepo;
use folio_events::ContentEvent;
use serde::Deserialize;
use serde_json::json;

use crate::cached::{cached_body, cached_data};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, OptionalAuthUser};
use crate::middleware::rbac::RequireEditor;
use crate::notify::announce_mutation;
use crate::query::{PaginationParams, SearchParams};
use crate::response::{DataResponse, ListResponse};
use crate::state::AppState;

const RESOURCE: &str = "blog";

/// Query parameters for `GET /blog`.
#[derive(Debug, Default, Deserialize)]
pub struct BlogListParams {
    pub status: Option<String>,
    pub category_id: Option<DbId>,
    #[serde(flatten)]
    pub page: PaginationParams,
}

fn is_editor(user: &Option<AuthUser>) -> bool {
    user.as_ref().is_some_and(|u| can_edit_content(&u.role))
}

fn require_visible(post: BlogPost, editor: bool) -> AppResult<BlogPost> {
    if editor || post.status == STATUS_PUBLISHED {
        Ok(post)
    } else {
        Err(AppError::not_found("BlogPost", post.id))
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/blog
pub async fn list_posts(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    Query(params): Query<BlogListParams>,
) -> AppResult<impl IntoResponse> {
    let editor = is_editor(&user);
    let status = if editor {
        params.status.clone()
    } else {
        Some(STATUS_PUBLISHED.to_string())
    };
    if let Some(status) = &status {
        validate_status(status).map_err(AppError::validation)?;
    }

    let (limit, offset) = params.page.clamped();
    let filter = BlogPostFilter {
        status,
        category_id: params.category_id,
        limit,
        offset,
    };

    let load = || async {
        let posts = BlogPostRepo::list(&state.pool, &filter).await?;
        let total = BlogPostRepo::count(&state.pool, &filter).await?;
        Ok::<_, AppError>(ListResponse {
            data: posts,
            total,
            limit,
            offset,
        })
    };

    if editor {
        return Ok(Json(json!(load().await?)));
    }

    let key = list_key(
        RESOURCE,
        &[
            ("category_id", filter.category_id.map(|id| id.to_string())),
            ("limit", Some(limit.to_string())),
            ("offset", Some(offset.to_string())),
        ],
    );
    let body = cached_body(&state, key, &[TAG_BLOG], load).await?;
    Ok(Json(body))
}

/// GET /api/blog/search?q=
pub async fn search_posts(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    Query(params): Query<SearchParams>,
) -> AppResult<impl IntoResponse> {
    let q = params.q.trim();
    if q.is_empty() {
        return Err(AppError::validation("Search query 'q' is required"));
    }
    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let posts = BlogPostRepo::search(&state.pool, q, !is_editor(&user), limit).await?;
    Ok(Json(DataResponse { data: posts }))
}

/// GET /api/blog/{id}
pub async fn get_post(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if is_editor(&user) {
        let post = BlogPostRepo::find_by_id(&state.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("BlogPost", id))?;
        return Ok(Json(json!(DataResponse { data: post })));
    }

    let body = cached_data(&state, item_key(RESOURCE, id), &[TAG_BLOG], || async {
        let post = BlogPostRepo::find_by_id(&state.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("BlogPost", id))?;
        require_visible(post, false)
    })
    .await?;
    Ok(Json(body))
}

/// GET /api/blog/slug/{slug}
pub async fn get_post_by_slug(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let post = BlogPostRepo::find_by_slug(&state.pool, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Blog post '{slug}' not found")))?;
    let post = require_visible(post, is_editor(&user))?;
    Ok(Json(DataResponse { data: post }))
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// POST /api/blog
pub async fn create_post(
    RequireEditor(editor): RequireEditor,
    State(state): State<AppState>,
    Json(input): Json<CreateBlogPost>,
) -> AppResult<impl IntoResponse> {
    validate_title(&input.title).map_err(AppError::validation)?;
    validate_content(&input.content).map_err(AppError::validation)?;
    validate_tags(&input.tags).map_err(AppError::validation)?;
    let status = input.status.as_deref().unwrap_or(STATUS_DRAFT);
    validate_status(status).map_err(AppError::validation)?;
    let slug = resolve_slug(input.slug.as_deref(), &input.title).map_err(AppError::validation)?;

    let post = BlogPostRepo::create(&state.pool, &input, &slug, status, editor.user_id).await?;

    tracing::info!(post_id = post.id, user_id = editor.user_id, slug = %post.slug, "Blog post created");

    announce_mutation(
        &state,
        &[TAG_BLOG],
        ContentEvent::new(blog::CREATED)
            .with_data(json!(&post))
            .with_actor(editor.user_id),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: post })))
}

/// PUT /api/blog/{id}
pub async fn update_post(
    RequireEditor(editor): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateBlogPost>,
) -> AppResult<impl IntoResponse> {
    if let Some(title) = &input.title {
        validate_title(title).map_err(AppError::validation)?;
    }
    if let Some(content) = &input.content {
        validate_content(content).map_err(AppError::validation)?;
    }
    if let Some(tags) = &input.tags {
        validate_tags(tags).map_err(AppError::validation)?;
    }
    if let Some(status) = &input.status {
        validate_status(status).map_err(AppError::validation)?;
    }
    if let Some(slug) = &input.slug {
        validate_slug(slug).map_err(AppError::validation)?;
    }

    let post = BlogPostRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("BlogPost", id))?;

    tracing::info!(post_id = id, user_id = editor.user_id, "Blog post updated");

    announce_mutation(
        &state,
        &[TAG_BLOG],
        ContentEvent::new(blog::UPDATED)
            .with_data(json!(&post))
            .with_actor(editor.user_id),
    )
    .await;

    Ok(Json(DataResponse { data: post }))
}

/// DELETE /api/blog/{id}
pub async fn delete_post(
    RequireEditor(editor): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !BlogPostRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("BlogPost", id));
    }

    tracing::info!(post_id = id, user_id = editor.user_id, "Blog post deleted");

    announce_mutation(
        &state,
        &[TAG_BLOG],
        ContentEvent::new(blog::DELETED)
            .with_data(json!({ "id": id }))
            .with_actor(editor.user_id),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
