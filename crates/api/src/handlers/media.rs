//! Handlers for the `/media` resource.
//!
//! Files are stored elsewhere; this resource tracks their metadata.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use folio_core::cache_keys::{item_key, list_key, TAG_MEDIA};
use folio_core::event_types::{actions, MEDIA_UPDATE};
use folio_core::types::DbId;
use folio_core::validation::validate_required;
use folio_db::models::media::{CreateMediaFile, MediaFile, UpdateMediaFile, DEFAULT_SOURCE};
use folio_db::repositories::MediaFileRepo;
use folio_events::ContentEvent;
use serde::Deserialize;
use serde_json::json;

use super::MAX_NAME_LEN;
use crate::cached::cached_data;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireEditor;
use crate::notify::announce_mutation;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

const RESOURCE: &str = "media";

/// Query parameters for `GET /media`.
#[derive(Debug, Default, Deserialize)]
pub struct MediaListParams {
    pub category: Option<String>,
    pub source: Option<String>,
    #[serde(flatten)]
    pub page: PaginationParams,
}

fn media_event(action: &str, item: serde_json::Value, file: &MediaFile, user_id: DbId) -> ContentEvent {
    ContentEvent::new(MEDIA_UPDATE)
        .with_data(json!({
            "action": action,
            "item": item,
            "category": file.category,
            "source": file.source,
        }))
        .with_actor(user_id)
}

/// GET /api/media
pub async fn list_media(
    State(state): State<AppState>,
    Query(params): Query<MediaListParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = params.page.clamped();
    let key = list_key(
        RESOURCE,
        &[
            ("category", params.category.clone()),
            ("source", params.source.clone()),
            ("limit", Some(limit.to_string())),
            ("offset", Some(offset.to_string())),
        ],
    );

    let body = cached_data(&state, key, &[TAG_MEDIA], || async {
        let files = MediaFileRepo::list(
            &state.pool,
            params.category.as_deref(),
            params.source.as_deref(),
            limit,
            offset,
        )
        .await?;
        Ok::<_, AppError>(files)
    })
    .await?;
    Ok(Json(body))
}

/// GET /api/media/{id}
pub async fn get_media(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let body = cached_data(&state, item_key(RESOURCE, id), &[TAG_MEDIA], || async {
        MediaFileRepo::find_by_id(&state.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("MediaFile", id))
    })
    .await?;
    Ok(Json(body))
}

/// POST /api/media
///
/// Register an uploaded file's metadata.
pub async fn create_media(
    RequireEditor(editor): RequireEditor,
    State(state): State<AppState>,
    Json(mut input): Json<CreateMediaFile>,
) -> AppResult<impl IntoResponse> {
    validate_required("filename", &input.filename, MAX_NAME_LEN).map_err(AppError::validation)?;
    validate_required("original_name", &input.original_name, MAX_NAME_LEN)
        .map_err(AppError::validation)?;
    validate_required("mime_type", &input.mime_type, 100).map_err(AppError::validation)?;
    validate_required("url", &input.url, 2048).map_err(AppError::validation)?;
    if input.size_bytes < 0 {
        return Err(AppError::validation("size_bytes must not be negative"));
    }
    if input.source.as_deref().is_none_or(|s| s.trim().is_empty()) {
        input.source = Some(DEFAULT_SOURCE.to_string());
    }

    let file = MediaFileRepo::create(&state.pool, &input, editor.user_id).await?;

    tracing::info!(media_id = file.id, user_id = editor.user_id, filename = %file.filename, "Media file registered");

    announce_mutation(
        &state,
        &[TAG_MEDIA],
        media_event(actions::CREATE, json!(&file), &file, editor.user_id),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: file })))
}

/// PUT /api/media/{id}
pub async fn update_media(
    RequireEditor(editor): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateMediaFile>,
) -> AppResult<impl IntoResponse> {
    if let Some(name) = &input.original_name {
        validate_required("original_name", name, MAX_NAME_LEN).map_err(AppError::validation)?;
    }

    let file = MediaFileRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("MediaFile", id))?;

    tracing::info!(media_id = id, user_id = editor.user_id, "Media file updated");

    announce_mutation(
        &state,
        &[TAG_MEDIA],
        media_event(actions::UPDATE, json!(&file), &file, editor.user_id),
    )
    .await;

    Ok(Json(DataResponse { data: file }))
}

/// DELETE /api/media/{id}
pub async fn delete_media(
    RequireEditor(editor): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let file = MediaFileRepo::delete(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("MediaFile", id))?;

    tracing::info!(media_id = id, user_id = editor.user_id, url = %file.url, "Media file deleted");

    announce_mutation(
        &state,
        &[TAG_MEDIA],
        media_event(actions::DELETE, json!({ "id": id }), &file, editor.user_id),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
