//! Route definitions for the `/blog` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::blog;
use crate::state::AppState;

/// Routes mounted at `/blog`.
///
/// ```text
/// GET    /               -> list_posts (?status, category_id, limit, offset)
/// POST   /               -> create_post (editor)
/// GET    /search         -> search_posts (?q, limit)
/// GET    /slug/{slug}    -> get_post_by_slug
/// GET    /{id}           -> get_post
/// PUT    /{id}           -> update_post (editor)
/// DELETE /{id}           -> delete_post (editor)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(blog::list_posts).post(blog::create_post))
        .route("/search", get(blog::search_posts))
        .route("/slug/{slug}", get(blog::get_post_by_slug))
        .route(
            "/{id}",
            get(blog::get_post)
                .put(blog::update_post)
                .delete(blog::delete_post),
        )
}
