//! Route definitions for the `/documentation` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::documentation as docs;
use crate::state::AppState;

/// Routes mounted at `/documentation`.
///
/// `/contents/{id}` takes a slug on GET and a numeric id on PUT/DELETE.
///
/// ```text
/// GET    /sections                -> section_tree (?include_inactive, editor)
/// POST   /sections                -> create_section (editor)
/// POST   /sections/reorder        -> reorder_sections (editor)
/// GET    /sections/{id}           -> get_section
/// PUT    /sections/{id}           -> update_section (editor)
/// DELETE /sections/{id}           -> delete_section (editor)
///
/// GET    /contents                -> list_contents (?section_id, library_type, limit, offset)
/// POST   /contents                -> create_content (editor)
/// POST   /contents/reorder        -> reorder_contents (editor)
/// GET    /contents/{slug}         -> get_content_by_slug (?library_type; counts a view)
/// PUT    /contents/{id}           -> update_content (editor)
/// DELETE /contents/{id}           -> delete_content (editor)
/// GET    /contents/{id}/versions  -> list_versions (editor)
///
/// GET    /menu                    -> menu_tree (?include_inactive, editor)
/// POST   /menu                    -> create_menu_item (editor)
/// POST   /menu/reorder            -> reorder_menu (editor)
/// PUT    /menu/{id}               -> update_menu_item (editor)
/// DELETE /menu/{id}               -> delete_menu_item (editor)
///
/// GET    /content/{id}/lock       -> get_lock (editor)
/// POST   /content/{id}/lock       -> acquire_lock (editor)
/// DELETE /content/{id}/lock       -> release_lock (editor; admins release any)
/// POST   /locks/cleanup           -> cleanup_locks (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        // Sections
        .route("/sections", get(docs::section_tree).post(docs::create_section))
        .route("/sections/reorder", post(docs::reorder_sections))
        .route(
            "/sections/{id}",
            get(docs::get_section)
                .put(docs::update_section)
                .delete(docs::delete_section),
        )
        // Contents
        .route("/contents", get(docs::list_contents).post(docs::create_content))
        .route("/contents/reorder", post(docs::reorder_contents))
        .route(
            "/contents/{id}",
            get(docs::get_content_by_slug)
                .put(docs::update_content)
                .delete(docs::delete_content),
        )
        .route("/contents/{id}/versions", get(docs::list_versions))
        // Menu
        .route("/menu", get(docs::menu_tree).post(docs::create_menu_item))
        .route("/menu/reorder", post(docs::reorder_menu))
        .route(
            "/menu/{id}",
            put(docs::update_menu_item).delete(docs::delete_menu_item),
        )
        // Locks
        .route(
            "/content/{id}/lock",
            get(docs::get_lock)
                .post(docs::acquire_lock)
                .delete(docs::release_lock),
        )
        .route("/locks/cleanup", post(docs::cleanup_locks))
}
