//! Route definitions for the `/categories` resource (blog categories).

use axum::routing::get;
use axum::Router;

use crate::handlers::blog_categories;
use crate::state::AppState;

/// Routes mounted at `/categories`.
///
/// ```text
/// GET    /        -> category_tree
/// POST   /        -> create_category (admin)
/// GET    /{id}    -> get_category
/// PUT    /{id}    -> update_category (admin)
/// DELETE /{id}    -> delete_category (admin, 409 with children)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(blog_categories::category_tree).post(blog_categories::create_category),
        )
        .route(
            "/{id}",
            get(blog_categories::get_category)
                .put(blog_categories::update_category)
                .delete(blog_categories::delete_category),
        )
}
