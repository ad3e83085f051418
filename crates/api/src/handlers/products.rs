//! Handlers for the `/products` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use folio_core::cache_keys::{item_key, list_key, TAG_PRODUCTS};
use folio_core::commerce::validate_price_cents;
use folio_core::event_types::product;
use folio_core::pagination::{clamp_limit, DEFAULT_LIMIT, MAX_LIMIT};
use folio_core::slug::{resolve_slug, validate_slug};
use folio_core::types::DbId;
use folio_core::validation::validate_required;
use folio_db::models::product::{CreateProduct, ProductFilter, UpdateProduct};
use folio_db::repositories::ProductRepo;
use folio_events::ContentEvent;
use serde::Deserialize;
use serde_json::json;

use super::MAX_NAME_LEN;
use crate::cached::cached_data;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::OptionalAuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::notify::announce_mutation;
use crate::query::{PaginationParams, SearchParams};
use crate::response::DataResponse;
use crate::state::AppState;

const RESOURCE: &str = "products";

/// Query parameters for `GET /products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub category_id: Option<DbId>,
    #[serde(default)]
    pub include_inactive: bool,
    #[serde(flatten)]
    pub page: PaginationParams,
}

/// GET /api/products
///
/// Active products, cached. Admins may pass `include_inactive=true` to read
/// the full catalog uncached.
pub async fn list_products(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    Query(params): Query<ProductListParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = params.page.clamped();
    let filter = ProductFilter {
        category_id: params.category_id,
        include_inactive: params.include_inactive && user.as_ref().is_some_and(|u| u.is_admin()),
        limit,
        offset,
    };

    if filter.include_inactive {
        let products = ProductRepo::list(&state.pool, &filter).await?;
        return Ok(Json(json!(DataResponse { data: products })));
    }

    let key = list_key(
        RESOURCE,
        &[
            ("category_id", filter.category_id.map(|id| id.to_string())),
            ("limit", Some(limit.to_string())),
            ("offset", Some(offset.to_string())),
        ],
    );
    let body = cached_data(&state, key, &[TAG_PRODUCTS], || async {
        Ok::<_, AppError>(ProductRepo::list(&state.pool, &filter).await?)
    })
    .await?;
    Ok(Json(body))
}

/// GET /api/products/search?q=
pub async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<impl IntoResponse> {
    let q = params.q.trim();
    if q.is_empty() {
        return Err(AppError::validation("Search query 'q' is required"));
    }
    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let products = ProductRepo::search(&state.pool, q, limit).await?;
    Ok(Json(DataResponse { data: products }))
}

/// GET /api/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let body = cached_data(&state, item_key(RESOURCE, id), &[TAG_PRODUCTS], || async {
        ProductRepo::find_by_id(&state.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Product", id))
    })
    .await?;
    Ok(Json(body))
}

/// GET /api/products/slug/{slug}
pub async fn get_product_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let product = ProductRepo::find_by_slug(&state.pool, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product '{slug}' not found")))?;
    Ok(Json(DataResponse { data: product }))
}

/// POST /api/products
pub async fn create_product(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateProduct>,
) -> AppResult<impl IntoResponse> {
    validate_required("title", &input.title, MAX_NAME_LEN).map_err(AppError::validation)?;
    validate_price_cents(input.price_cents).map_err(AppError::validation)?;
    let slug = resolve_slug(input.slug.as_deref(), &input.title).map_err(AppError::validation)?;

    let product = ProductRepo::create(&state.pool, &input, &slug).await?;

    tracing::info!(product_id = product.id, user_id = admin.user_id, price_cents = product.price_cents, "Product created");

    announce_mutation(
        &state,
        &[TAG_PRODUCTS],
        ContentEvent::new(product::CREATED)
            .with_data(json!(&product))
            .with_actor(admin.user_id),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: product })))
}

/// PUT /api/products/{id}
pub async fn update_product(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProduct>,
) -> AppResult<impl IntoResponse> {
    if let Some(title) = &input.title {
        validate_required("title", title, MAX_NAME_LEN).map_err(AppError::validation)?;
    }
    if let Some(price) = input.price_cents {
        validate_price_cents(price).map_err(AppError::validation)?;
    }
    if let Some(slug) = &input.slug {
        validate_slug(slug).map_err(AppError::validation)?;
    }

    let product = ProductRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Product", id))?;

    tracing::info!(product_id = id, user_id = admin.user_id, "Product updated");

    announce_mutation(
        &state,
        &[TAG_PRODUCTS],
        ContentEvent::new(product::UPDATED)
            .with_data(json!(&product))
            .with_actor(admin.user_id),
    )
    .await;

    Ok(Json(DataResponse { data: product }))
}

/// DELETE /api/products/{id}
pub async fn delete_product(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !ProductRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("Product", id));
    }

    tracing::info!(product_id = id, user_id = admin.user_id, "Product deleted");

    announce_mutation(
        &state,
        &[TAG_PRODUCTS],
        ContentEvent::new(product::DELETED)
            .with_data(json!({ "id": id }))
            .with_actor(admin.user_id),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
