//! Handlers for the `/orders` resource.
//!
//! Orders are created from the caller's cart in a single transaction.
//! Order events go to the owner's connections and to the admin room.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use folio_core::commerce::{generate_order_number, validate_payment_status, validate_transition};
use folio_core::error::CoreError;
use folio_core::event_types::{actions, order, user_room, ADMIN_ROOM, CART_UPDATE};
use folio_core::types::{DbId, Timestamp};
use folio_core::validation::validate_email;
use folio_db::models::cart::Cart;
use folio_db::models::order::{CreateOrder, Order, OrderWithItems, UpdateOrderStatus};
use folio_db::repositories::order_repo::CheckoutPricing;
use folio_db::repositories::OrderRepo;
use folio_events::ContentEvent;
use serde::Serialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::notify::publish;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Public view of an order returned by the tracking endpoint.
#[derive(Debug, Serialize)]
pub struct OrderTracking {
    pub order_number: String,
    pub status: String,
    pub payment_status: String,
    pub total_cents: i64,
    pub currency: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Order> for OrderTracking {
    fn from(o: Order) -> Self {
        Self {
            order_number: o.order_number,
            status: o.status,
            payment_status: o.payment_status,
            total_cents: o.total_cents,
            currency: o.currency,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

/// Publish an order event to the owner and to admins.
fn announce(state: &AppState, event_type: &str, order: &Order, actor: DbId) {
    let data = json!({
        "id": order.id,
        "order_number": order.order_number,
        "status": order.status,
        "payment_status": order.payment_status,
        "total_cents": order.total_cents,
        "user_id": order.user_id,
    });
    if let Some(owner) = order.user_id {
        publish(
            state,
            ContentEvent::new(event_type)
                .with_data(data.clone())
                .to_room(user_room(owner))
                .with_actor(actor),
        );
    }
    publish(
        state,
        ContentEvent::new(event_type)
            .with_data(data)
            .to_room(ADMIN_ROOM)
            .with_actor(actor),
    );
}

fn can_view(user: &AuthUser, order: &Order) -> bool {
    user.is_admin() || order.user_id == Some(user.user_id)
}

/// POST /api/orders
///
/// Check out the caller's cart. Inactive products are skipped; an empty
/// cart is a 400.
pub async fn create_order(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<CreateOrder>,
) -> AppResult<impl IntoResponse> {
    if let Some(email) = &input.customer_email {
        validate_email(email).map_err(AppError::validation)?;
    }

    let order_number = generate_order_number(Utc::now());
    let created = OrderRepo::create_from_cart(
        &state.pool,
        user.user_id,
        &input,
        &order_number,
        CheckoutPricing::default(),
    )
    .await?
    .ok_or_else(|| AppError::BadRequest("Cart is empty".into()))?;

    tracing::info!(
        order_id = created.order.id,
        order_number = %created.order.order_number,
        user_id = user.user_id,
        items = created.items.len(),
        total_cents = created.order.total_cents,
        "Order created",
    );

    announce(&state, order::CREATED, &created.order, user.user_id);
    publish(
        &state,
        ContentEvent::new(CART_UPDATE)
            .with_data(json!({
                "action": actions::CLEAR,
                "cart": Cart::from_lines(Vec::new()),
            }))
            .to_room(user_room(user.user_id))
            .with_actor(user.user_id),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// GET /api/orders
///
/// The caller's own orders; admins see every order.
pub async fn list_orders(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = params.clamped();
    let owner = if user.is_admin() {
        None
    } else {
        Some(user.user_id)
    };
    let orders = OrderRepo::list(&state.pool, owner, limit, offset).await?;
    Ok(Json(DataResponse { data: orders }))
}

/// GET /api/orders/{id}
///
/// Other users' orders are reported as not found.
pub async fn get_order(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let order = OrderRepo::find_by_id(&state.pool, id)
        .await?
        .filter(|o| can_view(&user, o))
        .ok_or_else(|| AppError::not_found("Order", id))?;
    let items = OrderRepo::items(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: OrderWithItems { order, items },
    }))
}

/// PUT /api/orders/{id}/status
pub async fn update_order_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateOrderStatus>,
) -> AppResult<impl IntoResponse> {
    if let Some(payment) = &input.payment_status {
        validate_payment_status(payment).map_err(AppError::validation)?;
    }

    let current = OrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Order", id))?;
    validate_transition(&current.status, &input.status).map_err(AppError::validation)?;

    let updated = OrderRepo::update_status(
        &state.pool,
        id,
        &current.status,
        &input.status,
        input.payment_status.as_deref(),
    )
    .await?
    .ok_or_else(|| {
        AppError::Core(CoreError::Conflict(format!(
            "Order {id} changed status concurrently; reload and retry"
        )))
    })?;

    tracing::info!(
        order_id = id,
        user_id = admin.user_id,
        from = %current.status,
        to = %updated.status,
        "Order status updated",
    );

    announce(&state, order::STATUS_UPDATED, &updated, admin.user_id);

    Ok(Json(DataResponse { data: updated }))
}

/// GET /api/orders/track/{order_number}
///
/// Public status lookup by order number.
pub async fn track_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> AppResult<impl IntoResponse> {
    let order = OrderRepo::find_by_number(&state.pool, order_number.trim())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order '{order_number}' not found")))?;
    Ok(Json(DataResponse {
        data: OrderTracking::from(order),
    }))
}
