//! Route definitions for the `/admin` resource. All routes require admin.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::{admin, comments};
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET    /users               -> list_users
/// POST   /users               -> create_user
/// GET    /users/{id}          -> get_user
/// PUT    /users/{id}          -> update_user
/// DELETE /users/{id}          -> delete_user
///
/// GET    /comments                -> admin_list_comments (?status, limit, offset)
/// GET    /comments/stats          -> comment_stats
/// PUT    /comments/{id}/approve   -> approve_comment
/// PUT    /comments/{id}/reject    -> reject_comment
/// DELETE /comments/{id}           -> admin_delete_comment
///
/// GET    /cache/stats         -> cache_stats
/// POST   /cache/invalidate    -> invalidate_cache ({ tag } or { pattern })
/// DELETE /cache               -> clear_cache
///
/// GET    /realtime            -> realtime_stats
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/users/{id}",
            get(admin::get_user)
                .put(admin::update_user)
                .delete(admin::delete_user),
        )
        .route("/comments", get(comments::admin_list_comments))
        .route("/comments/stats", get(comments::comment_stats))
        .route("/comments/{id}", delete(comments::admin_delete_comment))
        .route("/comments/{id}/approve", put(comments::approve_comment))
        .route("/comments/{id}/reject", put(comments::reject_comment))
        .route("/cache/stats", get(admin::cache_stats))
        .route("/cache/invalidate", post(admin::invalidate_cache))
        .route("/cache", delete(admin::clear_cache))
        .route("/realtime", get(admin::realtime_stats))
}
