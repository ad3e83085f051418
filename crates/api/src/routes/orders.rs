//! Route definitions for the `/orders` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::orders;
use crate::state::AppState;

/// Routes mounted at `/orders`.
///
/// ```text
/// GET    /                        -> list_orders (auth; admins see all)
/// POST   /                        -> create_order (auth; checks out the cart)
/// GET    /track/{order_number}    -> track_order (public)
/// GET    /{id}                    -> get_order (owner or admin)
/// PUT    /{id}/status             -> update_order_status (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list_orders).post(orders::create_order))
        .route("/track/{order_number}", get(orders::track_order))
        .route("/{id}", get(orders::get_order))
        .route("/{id}/status", put(orders::update_order_status))
}
