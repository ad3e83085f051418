//! Route definitions for the `/media` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::media;
use crate::state::AppState;

/// Routes mounted at `/media`.
///
/// ```text
/// GET    /        -> list_media (?category, source, limit, offset)
/// POST   /        -> create_media (editor)
/// GET    /{id}    -> get_media
/// PUT    /{id}    -> update_media (editor)
/// DELETE /{id}    -> delete_media (editor)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(media::list_media).post(media::create_media))
        .route(
            "/{id}",
            get(media::get_media)
                .put(media::update_media)
                .delete(media::delete_media),
        )
}
