//! Handlers for the `/product-categories` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use folio_core::cache_keys::{list_key, tree_key, TAG_PRODUCTS, TAG_PRODUCT_CATEGORIES};
use folio_core::event_types::product_category;
use folio_core::slug::{resolve_slug, validate_slug};
use folio_core::tree::build_tree;
use folio_core::types::DbId;
use folio_core::validation::validate_required;
use folio_db::models::product::{CreateProductCategory, UpdateProductCategory};
use folio_db::repositories::ProductCategoryRepo;
use folio_events::ContentEvent;
use serde_json::json;

use super::{validate_parent, MAX_NAME_LEN};
use crate::cached::cached_data;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::OptionalAuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::notify::announce_mutation;
use crate::query::IncludeInactiveParams;
use crate::response::DataResponse;
use crate::state::AppState;

const RESOURCE: &str = "product_categories";

const TAGS: &[&str] = &[TAG_PRODUCT_CATEGORIES, TAG_PRODUCTS];

/// GET /api/product-categories
///
/// Flat list ordered by `sort_order`. `include_inactive` is honoured for
/// admins only.
pub async fn list_categories(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    Query(params): Query<IncludeInactiveParams>,
) -> AppResult<impl IntoResponse> {
    let include_inactive = params.include_inactive && user.as_ref().is_some_and(|u| u.is_admin());
    if include_inactive {
        let categories = ProductCategoryRepo::list(&state.pool, true).await?;
        return Ok(Json(json!(DataResponse { data: categories })));
    }

    let body = cached_data(&state, list_key(RESOURCE, &[]), &[TAG_PRODUCT_CATEGORIES], || async {
        Ok::<_, AppError>(ProductCategoryRepo::list(&state.pool, false).await?)
    })
    .await?;
    Ok(Json(body))
}

/// GET /api/product-categories/tree
pub async fn category_tree(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let body = cached_data(&state, tree_key(RESOURCE), &[TAG_PRODUCT_CATEGORIES], || async {
        let categories = ProductCategoryRepo::list(&state.pool, false).await?;
        Ok::<_, AppError>(build_tree(categories))
    })
    .await?;
    Ok(Json(body))
}

/// GET /api/product-categories/{id}
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let category = ProductCategoryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("ProductCategory", id))?;
    Ok(Json(DataResponse { data: category }))
}

/// POST /api/product-categories
pub async fn create_category(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateProductCategory>,
) -> AppResult<impl IntoResponse> {
    validate_required("name", &input.name, MAX_NAME_LEN).map_err(AppError::validation)?;
    let slug = resolve_slug(input.slug.as_deref(), &input.name).map_err(AppError::validation)?;
    if input.parent_id.is_some() {
        let all = ProductCategoryRepo::list(&state.pool, true).await?;
        validate_parent(&all, None, input.parent_id)?;
    }

    let category = ProductCategoryRepo::create(&state.pool, &input, &slug).await?;

    tracing::info!(category_id = category.id, user_id = admin.user_id, "Product category created");

    announce_mutation(
        &state,
        TAGS,
        ContentEvent::new(product_category::CREATED)
            .with_data(json!(&category))
            .with_actor(admin.user_id),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}

/// PUT /api/product-categories/{id}
pub async fn update_category(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProductCategory>,
) -> AppResult<impl IntoResponse> {
    if let Some(name) = &input.name {
        validate_required("name", name, MAX_NAME_LEN).map_err(AppError::validation)?;
    }
    if let Some(slug) = &input.slug {
        validate_slug(slug).map_err(AppError::validation)?;
    }
    if input.parent_id.is_some() {
        let all = ProductCategoryRepo::list(&state.pool, true).await?;
        validate_parent(&all, Some(id), input.parent_id)?;
    }

    let category = ProductCategoryRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("ProductCategory", id))?;

    tracing::info!(category_id = id, user_id = admin.user_id, "Product category updated");

    announce_mutation(
        &state,
        TAGS,
        ContentEvent::new(product_category::UPDATED)
            .with_data(json!(&category))
            .with_actor(admin.user_id),
    )
    .await;

    Ok(Json(DataResponse { data: category }))
}

/// DELETE /api/product-categories/{id}
///
/// Refused with 400 while products still reference the category.
pub async fn delete_category(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let products = ProductCategoryRepo::count_products(&state.pool, id).await?;
    if products > 0 {
        return Err(AppError::BadRequest(format!(
            "Cannot delete category {id}: {products} products still belong to it"
        )));
    }

    if !ProductCategoryRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("ProductCategory", id));
    }

    tracing::info!(category_id = id, user_id = admin.user_id, "Product category deleted");

    announce_mutation(
        &state,
        TAGS,
        ContentEvent::new(product_category::DELETED)
            .with_data(json!({ "id": id }))
            .with_actor(admin.user_id),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
