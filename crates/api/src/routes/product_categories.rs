//! Route definitions for the `/product-categories` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::product_categories;
use crate::state::AppState;

/// Routes mounted at `/product-categories`.
///
/// ```text
/// GET    /        -> list_categories (?include_inactive, admin only)
/// POST   /        -> create_category (admin)
/// GET    /tree    -> category_tree
/// GET    /{id}    -> get_category
/// PUT    /{id}    -> update_category (admin)
/// DELETE /{id}    -> delete_category (admin, 400 while products remain)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(product_categories::list_categories).post(product_categories::create_category),
        )
        .route("/tree", get(product_categories::category_tree))
        .route(
            "/{id}",
            get(product_categories::get_category)
                .put(product_categories::update_category)
                .delete(product_categories::delete_category),
        )
}
