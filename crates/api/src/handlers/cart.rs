//! Handlers for the `/cart` resource.
//!
//! Each authenticated user has one cart. Every change is pushed to that
//! user's own connections as `CART_UPDATE`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use folio_core::commerce::validate_quantity;
use folio_core::event_types::{actions, user_room, CART_UPDATE};
use folio_core::types::DbId;
use folio_db::models::cart::{AddCartItem, Cart, UpdateCartItem};
use folio_db::repositories::{CartRepo, ProductRepo};
use folio_events::ContentEvent;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAuth;
use crate::notify::publish;
use crate::response::DataResponse;
use crate::state::AppState;

async fn load_cart(state: &AppState, user_id: DbId) -> AppResult<Cart> {
    let lines = CartRepo::list_lines(&state.pool, user_id).await?;
    Ok(Cart::from_lines(lines))
}

fn announce(state: &AppState, user_id: DbId, action: &str, cart: &Cart) {
    publish(
        state,
        ContentEvent::new(CART_UPDATE)
            .with_data(json!({ "action": action, "cart": cart }))
            .to_room(user_room(user_id))
            .with_actor(user_id),
    );
}

/// GET /api/cart
pub async fn get_cart(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let cart = load_cart(&state, user.user_id).await?;
    Ok(Json(DataResponse { data: cart }))
}

/// POST /api/cart/items
///
/// Adds a product, or increases the quantity when it is already in the cart.
/// The unit price is captured from the product at this moment.
pub async fn add_item(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<AddCartItem>,
) -> AppResult<impl IntoResponse> {
    validate_quantity(input.quantity).map_err(AppError::validation)?;

    let product = ProductRepo::find_by_id(&state.pool, input.product_id)
        .await?
        .ok_or_else(|| AppError::not_found("Product", input.product_id))?;
    if !product.is_active {
        return Err(AppError::BadRequest(format!(
            "Product {} is not available",
            product.id
        )));
    }

    let item = CartRepo::add_item(
        &state.pool,
        user.user_id,
        product.id,
        input.quantity,
        product.price_cents,
    )
    .await?;

    tracing::info!(
        user_id = user.user_id,
        product_id = product.id,
        cart_item_id = item.id,
        quantity = item.quantity,
        "Cart item added",
    );

    let cart = load_cart(&state, user.user_id).await?;
    announce(&state, user.user_id, actions::ADD, &cart);
    Ok((StatusCode::CREATED, Json(DataResponse { data: cart })))
}

/// PUT /api/cart/items/{id}
pub async fn update_item(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(item_id): Path<DbId>,
    Json(input): Json<UpdateCartItem>,
) -> AppResult<impl IntoResponse> {
    validate_quantity(input.quantity).map_err(AppError::validation)?;

    CartRepo::update_quantity(&state.pool, user.user_id, item_id, input.quantity)
        .await?
        .ok_or_else(|| AppError::not_found("CartItem", item_id))?;

    tracing::info!(user_id = user.user_id, cart_item_id = item_id, quantity = input.quantity, "Cart item updated");

    let cart = load_cart(&state, user.user_id).await?;
    announce(&state, user.user_id, actions::UPDATE, &cart);
    Ok(Json(DataResponse { data: cart }))
}

/// DELETE /api/cart/items/{id}
pub async fn remove_item(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(item_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !CartRepo::remove_item(&state.pool, user.user_id, item_id).await? {
        return Err(AppError::not_found("CartItem", item_id));
    }

    tracing::info!(user_id = user.user_id, cart_item_id = item_id, "Cart item removed");

    let cart = load_cart(&state, user.user_id).await?;
    announce(&state, user.user_id, actions::REMOVE, &cart);
    Ok(Json(DataResponse { data: cart }))
}

/// DELETE /api/cart
pub async fn clear_cart(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let removed = CartRepo::clear(&state.pool, user.user_id).await?;
    tracing::info!(user_id = user.user_id, removed, "Cart cleared");

    let cart = Cart::from_lines(Vec::new());
    announce(&state, user.user_id, actions::CLEAR, &cart);
    Ok(Json(DataResponse { data: cart }))
}
