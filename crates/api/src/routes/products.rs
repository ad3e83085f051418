//! Route definitions for the `/products` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::products;
use crate::state::AppState;

/// Routes mounted at `/products`.
///
/// ```text
/// GET    /               -> list_products (?category_id, include_inactive, limit, offset)
/// POST   /               -> create_product (admin)
/// GET    /search         -> search_products (?q, limit)
/// GET    /slug/{slug}    -> get_product_by_slug
/// GET    /{id}           -> get_product
/// PUT    /{id}           -> update_product (admin)
/// DELETE /{id}           -> delete_product (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list_products).post(products::create_product))
        .route("/search", get(products::search_products))
        .route("/slug/{slug}", get(products::get_product_by_slug))
        .route(
            "/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
}
