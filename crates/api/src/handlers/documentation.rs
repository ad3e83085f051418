//! Handlers for the `/documentation` resource: sections, contents, the
//! navigation menu, and content edit locks.
//!
//! Content events go to the content's library room; section and menu events
//! go to every connection.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use folio_core::blog::{validate_content, validate_tags};
use folio_core::cache_keys::{list_key, tree_key, TAG_DOCUMENTATION};
use folio_core::content_lock::{library_room, validate_library_type};
use folio_core::error::CoreError;
use folio_core::event_types::{actions, documentation};
use folio_core::roles::can_edit_content;
use folio_core::slug::{resolve_slug, validate_slug};
use folio_core::tree::build_tree;
use folio_core::types::DbId;
use folio_core::validation::validate_required;
use folio_db::models::documentation::{
    CreateDocContent, CreateDocMenuItem, CreateDocSection, DocContent, DocContentFilter,
    UpdateDocContent, UpdateDocMenuItem, UpdateDocSection, DEFAULT_LIBRARY_TYPE,
};
use folio_db::models::ReorderItem;
use folio_db::repositories::{ContentLockRepo, DocContentRepo, DocMenuRepo, DocSectionRepo};
use folio_events::ContentEvent;
use serde::Deserialize;
use serde_json::json;

use super::{validate_parent, MAX_NAME_LEN};
use crate::cached::cached_data;
use crate::collab::{self, AcquireOutcome, LockRequester, ReleaseOutcome};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, OptionalAuthUser};
use crate::middleware::rbac::{RequireAdmin, RequireEditor};
use crate::notify::announce_mutation;
use crate::query::{IncludeInactiveParams, PaginationParams};
use crate::response::DataResponse;
use crate::state::AppState;

const SECTIONS: &str = "doc_sections";
const CONTENTS: &str = "doc_contents";
const MENU: &str = "doc_menu";

/// Body of the bulk reorder endpoints.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub items: Vec<ReorderItem>,
}

/// Query parameters for `GET /documentation/contents`.
#[derive(Debug, Default, Deserialize)]
pub struct ContentListParams {
    pub section_id: Option<DbId>,
    pub library_type: Option<String>,
    #[serde(flatten)]
    pub page: PaginationParams,
}

/// Query parameters for `GET /documentation/contents/{slug}`.
#[derive(Debug, Default, Deserialize)]
pub struct ContentLookupParams {
    pub library_type: Option<String>,
}

fn is_editor(user: &Option<AuthUser>) -> bool {
    user.as_ref().is_some_and(|u| can_edit_content(&u.role))
}

fn validate_reorder(items: &[ReorderItem]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::validation("items must not be empty"));
    }
    Ok(())
}

async fn announce(state: &AppState, event: ContentEvent) {
    announce_mutation(state, &[TAG_DOCUMENTATION], event).await;
}

fn content_event(event_type: &str, data: serde_json::Value, library_type: &str, actor: DbId) -> ContentEvent {
    ContentEvent::new(event_type)
        .with_data(data)
        .to_room(library_room(library_type))
        .with_actor(actor)
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// GET /api/documentation/sections
///
/// Active sections as a tree. Editors may add `include_inactive=true`.
pub async fn section_tree(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    Query(params): Query<IncludeInactiveParams>,
) -> AppResult<impl IntoResponse> {
    if params.include_inactive && is_editor(&user) {
        let sections = DocSectionRepo::list(&state.pool, true).await?;
        return Ok(Json(json!(DataResponse {
            data: build_tree(sections)
        })));
    }

    let body = cached_data(&state, tree_key(SECTIONS), &[TAG_DOCUMENTATION], || async {
        let sections = DocSectionRepo::list(&state.pool, false).await?;
        Ok::<_, AppError>(build_tree(sections))
    })
    .await?;
    Ok(Json(body))
}

/// GET /api/documentation/sections/{id}
pub async fn get_section(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let section = DocSectionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("DocSection", id))?;
    Ok(Json(DataResponse { data: section }))
}

/// POST /api/documentation/sections
pub async fn create_section(
    RequireEditor(editor): RequireEditor,
    State(state): State<AppState>,
    Json(input): Json<CreateDocSection>,
) -> AppResult<impl IntoResponse> {
    validate_required("title", &input.title, MAX_NAME_LEN).map_err(AppError::validation)?;
    let slug = resolve_slug(input.slug.as_deref(), &input.title).map_err(AppError::validation)?;
    if input.parent_id.is_some() {
        let all = DocSectionRepo::list(&state.pool, true).await?;
        validate_parent(&all, None, input.parent_id)?;
    }

    let section = DocSectionRepo::create(&state.pool, &input, &slug).await?;

    tracing::info!(section_id = section.id, user_id = editor.user_id, "Documentation section created");

    announce(
        &state,
        ContentEvent::new(documentation::SECTION_CREATED)
            .with_data(json!(&section))
            .with_actor(editor.user_id),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: section })))
}

/// PUT /api/documentation/sections/{id}
pub async fn update_section(
    RequireEditor(editor): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateDocSection>,
) -> AppResult<impl IntoResponse> {
    if let Some(title) = &input.title {
        validate_required("title", title, MAX_NAME_LEN).map_err(AppError::validation)?;
    }
    if let Some(slug) = &input.slug {
        validate_slug(slug).map_err(AppError::validation)?;
    }
    if input.parent_id.is_some() {
        let all = DocSectionRepo::list(&state.pool, true).await?;
        validate_parent(&all, Some(id), input.parent_id)?;
    }

    let section = DocSectionRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("DocSection", id))?;

    tracing::info!(section_id = id, user_id = editor.user_id, "Documentation section updated");

    announce(
        &state,
        ContentEvent::new(documentation::SECTION_UPDATED)
            .with_data(json!(&section))
            .with_actor(editor.user_id),
    )
    .await;

    Ok(Json(DataResponse { data: section }))
}

/// DELETE /api/documentation/sections/{id}
///
/// The section's contents are deleted with it.
pub async fn delete_section(
    RequireEditor(editor): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !DocSectionRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("DocSection", id));
    }

    tracing::info!(section_id = id, user_id = editor.user_id, "Documentation section deleted");

    announce(
        &state,
        ContentEvent::new(documentation::SECTION_DELETED)
            .with_data(json!({ "id": id }))
            .with_actor(editor.user_id),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/documentation/sections/reorder
pub async fn reorder_sections(
    RequireEditor(editor): RequireEditor,
    State(state): State<AppState>,
    Json(input): Json<ReorderRequest>,
) -> AppResult<impl IntoResponse> {
    validate_reorder(&input.items)?;
    let updated = DocSectionRepo::reorder(&state.pool, &input.items).await?;

    tracing::info!(user_id = editor.user_id, updated, "Documentation sections reordered");

    announce(
        &state,
        ContentEvent::new(documentation::REORDERED)
            .with_data(json!({ "kind": "sections", "updated": updated }))
            .with_actor(editor.user_id),
    )
    .await;

    Ok(Json(DataResponse {
        data: json!({ "updated": updated }),
    }))
}

// ---------------------------------------------------------------------------
// Contents
// ---------------------------------------------------------------------------

/// GET /api/documentation/contents
///
/// Published contents, cached. Editors read every content uncached.
pub async fn list_contents(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    Query(params): Query<ContentListParams>,
) -> AppResult<impl IntoResponse> {
    if let Some(library_type) = &params.library_type {
        validate_library_type(library_type).map_err(AppError::validation)?;
    }
    let (limit, offset) = params.page.clamped();
    let editor = is_editor(&user);
    let filter = DocContentFilter {
        section_id: params.section_id,
        library_type: params.library_type.clone(),
        published_only: !editor,
        limit,
        offset,
    };

    if editor {
        let contents = DocContentRepo::list(&state.pool, &filter).await?;
        return Ok(Json(json!(DataResponse { data: contents })));
    }

    let key = list_key(
        CONTENTS,
        &[
            ("section_id", filter.section_id.map(|id| id.to_string())),
            ("library_type", filter.library_type.clone()),
            ("limit", Some(limit.to_string())),
            ("offset", Some(offset.to_string())),
        ],
    );
    let body = cached_data(&state, key, &[TAG_DOCUMENTATION], || async {
        Ok::<_, AppError>(DocContentRepo::list(&state.pool, &filter).await?)
    })
    .await?;
    Ok(Json(body))
}

/// GET /api/documentation/contents/{slug}
///
/// Counts a view on every successful read, so it is never cached.
pub async fn get_content_by_slug(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    Path(slug): Path<String>,
    Query(params): Query<ContentLookupParams>,
) -> AppResult<impl IntoResponse> {
    let not_found = || AppError::NotFound(format!("Documentation '{slug}' not found"));

    let mut content = DocContentRepo::find_by_slug(&state.pool, &slug, params.library_type.as_deref())
        .await?
        .ok_or_else(not_found)?;
    if !content.is_published && !is_editor(&user) {
        return Err(not_found());
    }

    DocContentRepo::increment_view_count(&state.pool, content.id).await?;
    content.view_count += 1;

    Ok(Json(DataResponse { data: content }))
}

/// POST /api/documentation/contents
pub async fn create_content(
    RequireEditor(editor): RequireEditor,
    State(state): State<AppState>,
    Json(input): Json<CreateDocContent>,
) -> AppResult<impl IntoResponse> {
    validate_required("title", &input.title, MAX_NAME_LEN).map_err(AppError::validation)?;
    validate_content(&input.content).map_err(AppError::validation)?;
    validate_tags(&input.tags).map_err(AppError::validation)?;
    let library_type = input
        .library_type
        .clone()
        .unwrap_or_else(|| DEFAULT_LIBRARY_TYPE.to_string());
    validate_library_type(&library_type).map_err(AppError::validation)?;
    let slug = resolve_slug(input.slug.as_deref(), &input.title).map_err(AppError::validation)?;

    DocSectionRepo::find_by_id(&state.pool, input.section_id)
        .await?
        .ok_or_else(|| AppError::validation(format!("Section {} does not exist", input.section_id)))?;

    let content =
        DocContentRepo::create(&state.pool, &input, &slug, &library_type, editor.user_id).await?;

    tracing::info!(
        content_id = content.id,
        user_id = editor.user_id,
        library_type = %content.library_type,
        "Documentation content created",
    );

    announce(
        &state,
        content_event(
            documentation::CONTENT_CREATED,
            json!(&content),
            &content.library_type,
            editor.user_id,
        ),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: content })))
}

/// PUT /api/documentation/contents/{id}
///
/// A change to title or body records a new version.
pub async fn update_content(
    RequireEditor(editor): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateDocContent>,
) -> AppResult<impl IntoResponse> {
    if let Some(title) = &input.title {
        validate_required("title", title, MAX_NAME_LEN).map_err(AppError::validation)?;
    }
    if let Some(body) = &input.content {
        validate_content(body).map_err(AppError::validation)?;
    }
    if let Some(tags) = &input.tags {
        validate_tags(tags).map_err(AppError::validation)?;
    }
    if let Some(slug) = &input.slug {
        validate_slug(slug).map_err(AppError::validation)?;
    }

    let content = DocContentRepo::update(&state.pool, id, &input, editor.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("DocContent", id))?;

    tracing::info!(content_id = id, user_id = editor.user_id, "Documentation content updated");

    announce(
        &state,
        content_event(
            documentation::CONTENT_UPDATED,
            json!(&content),
            &content.library_type,
            editor.user_id,
        ),
    )
    .await;

    Ok(Json(DataResponse { data: content }))
}

/// DELETE /api/documentation/contents/{id}
pub async fn delete_content(
    RequireEditor(editor): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted: DocContent = DocContentRepo::delete(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("DocContent", id))?;

    tracing::info!(content_id = id, user_id = editor.user_id, "Documentation content deleted");

    announce(
        &state,
        content_event(
            documentation::CONTENT_DELETED,
            json!({ "id": id, "slug": deleted.slug }),
            &deleted.library_type,
            editor.user_id,
        ),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/documentation/contents/{id}/versions
pub async fn list_versions(
    RequireEditor(_editor): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    DocContentRepo::library_type_of(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("DocContent", id))?;
    let versions = DocContentRepo::versions(&state.pool, id).await?;
    Ok(Json(DataResponse { data: versions }))
}

/// POST /api/documentation/contents/reorder
pub async fn reorder_contents(
    RequireEditor(editor): RequireEditor,
    State(state): State<AppState>,
    Json(input): Json<ReorderRequest>,
) -> AppResult<impl IntoResponse> {
    validate_reorder(&input.items)?;
    let updated = DocContentRepo::reorder(&state.pool, &input.items).await?;

    tracing::info!(user_id = editor.user_id, updated, "Documentation contents reordered");

    announce(
        &state,
        ContentEvent::new(documentation::REORDERED)
            .with_data(json!({ "kind": "contents", "updated": updated }))
            .with_actor(editor.user_id),
    )
    .await;

    Ok(Json(DataResponse {
        data: json!({ "updated": updated }),
    }))
}

// ---------------------------------------------------------------------------
// Menu
// ---------------------------------------------------------------------------

/// GET /api/documentation/menu
pub async fn menu_tree(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    Query(params): Query<IncludeInactiveParams>,
) -> AppResult<impl IntoResponse> {
    if params.include_inactive && is_editor(&user) {
        let items = DocMenuRepo::list(&state.pool, true).await?;
        return Ok(Json(json!(DataResponse {
            data: build_tree(items)
        })));
    }

    let body = cached_data(&state, tree_key(MENU), &[TAG_DOCUMENTATION], || async {
        let items = DocMenuRepo::list(&state.pool, false).await?;
        Ok::<_, AppError>(build_tree(items))
    })
    .await?;
    Ok(Json(body))
}

/// POST /api/documentation/menu
pub async fn create_menu_item(
    RequireEditor(editor): RequireEditor,
    State(state): State<AppState>,
    Json(input): Json<CreateDocMenuItem>,
) -> AppResult<impl IntoResponse> {
    validate_required("title", &input.title, MAX_NAME_LEN).map_err(AppError::validation)?;
    if input.parent_id.is_some() {
        let all = DocMenuRepo::list(&state.pool, true).await?;
        validate_parent(&all, None, input.parent_id)?;
    }

    let item = DocMenuRepo::create(&state.pool, &input).await?;

    tracing::info!(menu_item_id = item.id, user_id = editor.user_id, "Documentation menu item created");

    announce(
        &state,
        ContentEvent::new(documentation::MENU_UPDATED)
            .with_data(json!({ "action": actions::CREATE, "item": &item }))
            .with_actor(editor.user_id),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: item })))
}

/// PUT /api/documentation/menu/{id}
pub async fn update_menu_item(
    RequireEditor(editor): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateDocMenuItem>,
) -> AppResult<impl IntoResponse> {
    if let Some(title) = &input.title {
        validate_required("title", title, MAX_NAME_LEN).map_err(AppError::validation)?;
    }
    if input.parent_id.is_some() {
        let all = DocMenuRepo::list(&state.pool, true).await?;
        validate_parent(&all, Some(id), input.parent_id)?;
    }

    let item = DocMenuRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("DocMenuItem", id))?;

    tracing::info!(menu_item_id = id, user_id = editor.user_id, "Documentation menu item updated");

    announce(
        &state,
        ContentEvent::new(documentation::MENU_UPDATED)
            .with_data(json!({ "action": actions::UPDATE, "item": &item }))
            .with_actor(editor.user_id),
    )
    .await;

    Ok(Json(DataResponse { data: item }))
}

/// DELETE /api/documentation/menu/{id}
pub async fn delete_menu_item(
    RequireEditor(editor): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !DocMenuRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("DocMenuItem", id));
    }

    tracing::info!(menu_item_id = id, user_id = editor.user_id, "Documentation menu item deleted");

    announce(
        &state,
        ContentEvent::new(documentation::MENU_UPDATED)
            .with_data(json!({ "action": actions::DELETE, "id": id }))
            .with_actor(editor.user_id),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/documentation/menu/reorder
pub async fn reorder_menu(
    RequireEditor(editor): RequireEditor,
    State(state): State<AppState>,
    Json(input): Json<ReorderRequest>,
) -> AppResult<impl IntoResponse> {
    validate_reorder(&input.items)?;
    let updated = DocMenuRepo::reorder(&state.pool, &input.items).await?;

    tracing::info!(user_id = editor.user_id, updated, "Documentation menu reordered");

    announce(
        &state,
        ContentEvent::new(documentation::REORDERED)
            .with_data(json!({ "kind": "menu", "updated": updated }))
            .with_actor(editor.user_id),
    )
    .await;

    Ok(Json(DataResponse {
        data: json!({ "updated": updated }),
    }))
}

// ---------------------------------------------------------------------------
// Locks
// ---------------------------------------------------------------------------

fn requester(user: &AuthUser) -> LockRequester<'_> {
    LockRequester {
        user_id: user.user_id,
        user_name: &user.name,
        is_admin: user.is_admin(),
        conn_id: None,
    }
}

/// GET /api/documentation/content/{id}/lock
pub async fn get_lock(
    RequireEditor(_editor): RequireEditor,
    State(state): State<AppState>,
    Path(content_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let lock = ContentLockRepo::get_active(&state.pool, content_id).await?;
    Ok(Json(DataResponse {
        data: json!({ "locked": lock.is_some(), "lock": lock }),
    }))
}

/// POST /api/documentation/content/{id}/lock
///
/// Acquire, or refresh when already held by the caller. 409 while another
/// user holds an unexpired lock.
pub async fn acquire_lock(
    RequireEditor(editor): RequireEditor,
    State(state): State<AppState>,
    Path(content_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    match collab::acquire(&state, content_id, &requester(&editor)).await? {
        AcquireOutcome::Acquired(lock) => Ok(Json(DataResponse { data: lock })),
        AcquireOutcome::Held(holder) => Err(AppError::Core(CoreError::Conflict(
            collab::describe_holder(&holder),
        ))),
    }
}

/// DELETE /api/documentation/content/{id}/lock
///
/// Holders release their own lock; admins may release any lock.
pub async fn release_lock(
    RequireEditor(editor): RequireEditor,
    State(state): State<AppState>,
    Path(content_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    match collab::release(&state, content_id, &requester(&editor)).await? {
        ReleaseOutcome::Released => Ok(Json(DataResponse {
            data: json!({ "released": true }),
        })),
        ReleaseOutcome::NotLocked => Ok(Json(DataResponse {
            data: json!({ "released": false }),
        })),
        ReleaseOutcome::NotHolder(holder) => Err(AppError::Core(CoreError::Forbidden(
            collab::describe_holder(&holder),
        ))),
    }
}

/// POST /api/documentation/locks/cleanup
///
/// Run the expired-lock sweep now instead of waiting for the background job.
pub async fn cleanup_locks(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let removed = ContentLockRepo::cleanup_expired(&state.pool).await?;
    tracing::info!(user_id = admin.user_id, removed, "Expired content locks removed");
    Ok(Json(DataResponse {
        data: json!({ "removed": removed }),
    }))
}
