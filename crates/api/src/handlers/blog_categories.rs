//! Handlers for the `/categories` resource (blog categories).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use folio_core::cache_keys::{tree_key, TAG_BLOG, TAG_BLOG_CATEGORIES};
use folio_core::error::CoreError;
use folio_core::event_types::blog_category;
use folio_core::slug::{resolve_slug, validate_slug};
use folio_core::tree::build_tree;
use folio_core::types::DbId;
use folio_core::validation::validate_required;
use folio_db::models::blog::{CreateBlogCategory, UpdateBlogCategory};
use folio_db::repositories::BlogCategoryRepo;
use folio_events::ContentEvent;
use serde_json::json;

use super::{validate_parent, MAX_NAME_LEN};
use crate::cached::cached_data;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::notify::announce_mutation;
use crate::response::DataResponse;
use crate::state::AppState;

const RESOURCE: &str = "blog_categories";

/// Posts embed their category, so category changes clear both tags.
const TAGS: &[&str] = &[TAG_BLOG_CATEGORIES, TAG_BLOG];

/// GET /api/categories
///
/// The whole category hierarchy as a nested tree.
pub async fn category_tree(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let body = cached_data(&state, tree_key(RESOURCE), &[TAG_BLOG_CATEGORIES], || async {
        let categories = BlogCategoryRepo::list(&state.pool).await?;
        Ok::<_, AppError>(build_tree(categories))
    })
    .await?;
    Ok(Json(body))
}

/// GET /api/categories/{id}
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let category = BlogCategoryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("BlogCategory", id))?;
    Ok(Json(DataResponse { data: category }))
}

/// POST /api/categories
pub async fn create_category(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateBlogCategory>,
) -> AppResult<impl IntoResponse> {
    validate_required("name", &input.name, MAX_NAME_LEN).map_err(AppError::validation)?;
    let slug = resolve_slug(input.slug.as_deref(), &input.name).map_err(AppError::validation)?;
    if input.parent_id.is_some() {
        let all = BlogCategoryRepo::list(&state.pool).await?;
        validate_parent(&all, None, input.parent_id)?;
    }

    let category = BlogCategoryRepo::create(&state.pool, &input, &slug).await?;

    tracing::info!(category_id = category.id, user_id = admin.user_id, "Blog category created");

    announce_mutation(
        &state,
        TAGS,
        ContentEvent::new(blog_category::CREATED)
            .with_data(json!(&category))
            .with_actor(admin.user_id),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}

/// PUT /api/categories/{id}
pub async fn update_category(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateBlogCategory>,
) -> AppResult<impl IntoResponse> {
    if let Some(name) = &input.name {
        validate_required("name", name, MAX_NAME_LEN).map_err(AppError::validation)?;
    }
    if let Some(slug) = &input.slug {
        validate_slug(slug).map_err(AppError::validation)?;
    }
    if input.parent_id.is_some() {
        let all = BlogCategoryRepo::list(&state.pool).await?;
        validate_parent(&all, Some(id), input.parent_id)?;
    }

    let category = BlogCategoryRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("BlogCategory", id))?;

    tracing::info!(category_id = id, user_id = admin.user_id, "Blog category updated");

    announce_mutation(
        &state,
        TAGS,
        ContentEvent::new(blog_category::UPDATED)
            .with_data(json!(&category))
            .with_actor(admin.user_id),
    )
    .await;

    Ok(Json(DataResponse { data: category }))
}

/// DELETE /api/categories/{id}
///
/// Refused with 409 while the category has children.
pub async fn delete_category(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let children = BlogCategoryRepo::count_children(&state.pool, id).await?;
    if children > 0 {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Category {id} has {children} child categories; move or delete them first"
        ))));
    }

    if !BlogCategoryRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("BlogCategory", id));
    }

    tracing::info!(category_id = id, user_id = admin.user_id, "Blog category deleted");

    announce_mutation(
        &state,
        TAGS,
        ContentEvent::new(blog_category::DELETED)
            .with_data(json!({ "id": id }))
            .with_actor(admin.user_id),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
