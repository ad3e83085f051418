//! Route definitions for the `/comments` resource.
//!
//! `{id}` is a post id on the list, count and reactions reads, and a comment
//! id everywhere else.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::comments;
use crate::state::AppState;

/// Routes mounted at `/comments`.
///
/// ```text
/// POST   /                  -> create_comment (auth)
/// GET    /{id}              -> list_comments (post id; ?limit, offset)
/// PUT    /{id}              -> update_comment (author)
/// DELETE /{id}              -> delete_comment (author or admin)
/// GET    /{id}/count        -> count_comments (post id)
/// GET    /{id}/replies      -> list_replies (?limit, offset)
/// GET    /{id}/reactions    -> my_reactions (post id, auth)
/// POST   /{id}/reactions    -> add_reaction (auth)
/// DELETE /{id}/reactions    -> remove_reaction (?reaction_type, auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(comments::create_comment))
        .route(
            "/{id}",
            get(comments::list_comments)
                .put(comments::update_comment)
                .delete(comments::delete_comment),
        )
        .route("/{id}/count", get(comments::count_comments))
        .route("/{id}/replies", get(comments::list_replies))
        .route(
            "/{id}/reactions",
            get(comments::my_reactions)
                .post(comments::add_reaction)
                .delete(comments::remove_reaction),
        )
}
