//! Handlers for the `/admin` resource: user management, the response cache,
//! and realtime connection stats. Every route requires the admin role.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use folio_core::cache_keys::{is_known_tag, validate_pattern, ALL_TAGS};
use folio_core::event_types::user as user_events;
use folio_core::event_types::{ADMIN_ROOM, CACHE_INVALIDATED};
use folio_core::roles::DEFAULT_ROLE_NAME;
use folio_core::types::DbId;
use folio_core::validation::{validate_email, validate_password, validate_username};
use folio_db::models::user::{CreateUser, UpdateUser, UserResponse};
use folio_db::repositories::{RoleRepo, SessionRepo, UserRepo};
use folio_events::ContentEvent;
use serde::Deserialize;
use serde_json::json;

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::notify::{invalidate_tag, publish};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /admin/users`.
#[derive(Debug, Deserialize)]
pub struct AdminCreateUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Role name; defaults to `user`.
    pub role: Option<String>,
}

/// Request body for `PUT /admin/users/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct AdminUpdateUser {
    #[serde(flatten)]
    pub fields: UpdateUser,
    /// Role name, resolved to `role_id`. Wins over `role_id` when both are set.
    pub role: Option<String>,
    /// New password; existing sessions are revoked when set.
    pub password: Option<String>,
}

/// Request body for `POST /admin/cache/invalidate`. Exactly one field is set.
#[derive(Debug, Deserialize)]
pub struct InvalidateRequest {
    pub tag: Option<String>,
    pub pattern: Option<String>,
}

async fn role_id_for(state: &AppState, name: &str) -> AppResult<DbId> {
    RoleRepo::find_by_name(&state.pool, name)
        .await?
        .map(|role| role.id)
        .ok_or_else(|| AppError::validation(format!("Unknown role '{name}'")))
}

/// User changes are only visible to other admins.
fn announce_user(state: &AppState, event_type: &str, data: serde_json::Value, actor: DbId) {
    publish(
        state,
        ContentEvent::new(event_type)
            .with_data(data)
            .to_room(ADMIN_ROOM)
            .with_actor(actor),
    );
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// GET /api/admin/users
pub async fn list_users(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = params.clamped();
    let users = UserRepo::list(&state.pool, limit, offset).await?;
    let roles: HashMap<DbId, String> = RoleRepo::list(&state.pool)
        .await?
        .into_iter()
        .map(|r| (r.id, r.name))
        .collect();

    let data: Vec<UserResponse> = users
        .into_iter()
        .map(|u| {
            let role = roles.get(&u.role_id).cloned().unwrap_or_default();
            u.into_response(role)
        })
        .collect();
    Ok(Json(DataResponse { data }))
}

/// GET /api/admin/users/{id}
pub async fn get_user(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;
    let role = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    Ok(Json(DataResponse {
        data: user.into_response(role),
    }))
}

/// POST /api/admin/users
pub async fn create_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<AdminCreateUser>,
) -> AppResult<impl IntoResponse> {
    validate_username(&input.username).map_err(AppError::validation)?;
    validate_email(&input.email).map_err(AppError::validation)?;
    validate_password(&input.password).map_err(AppError::validation)?;

    let role_name = input.role.as_deref().unwrap_or(DEFAULT_ROLE_NAME);
    let role_id = role_id_for(&state, role_name).await?;
    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: input.username,
            email: input.email.to_lowercase(),
            password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            role_id,
        },
    )
    .await?;

    tracing::info!(new_user_id = user.id, user_id = admin.user_id, role = role_name, "User created");

    let data = user.into_response(role_name.to_string());
    announce_user(&state, user_events::CREATED, json!(&data), admin.user_id);

    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// PUT /api/admin/users/{id}
///
/// Deactivating or blocking a user, or changing their password, revokes
/// their sessions.
pub async fn update_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AdminUpdateUser>,
) -> AppResult<impl IntoResponse> {
    let AdminUpdateUser {
        mut fields,
        role,
        password,
    } = input;

    if let Some(password) = &password {
        validate_password(password).map_err(AppError::validation)?;
    }
    if let Some(username) = &fields.username {
        validate_username(username).map_err(AppError::validation)?;
    }
    if let Some(email) = &fields.email {
        validate_email(email).map_err(AppError::validation)?;
        fields.email = Some(email.to_lowercase());
    }
    if let Some(name) = &role {
        fields.role_id = Some(role_id_for(&state, name).await?);
    }
    if id == admin.user_id && (fields.is_active == Some(false) || fields.is_blocked == Some(true)) {
        return Err(AppError::BadRequest(
            "Admins cannot deactivate or block themselves".into(),
        ));
    }

    let mut user = UserRepo::update(&state.pool, id, &fields)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;

    if let Some(password) = &password {
        let hash = hash_password(password)
            .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
        UserRepo::update_password(&state.pool, id, &hash).await?;
        user.password_hash = hash;
    }

    if password.is_some() || !user.can_sign_in() {
        let revoked = SessionRepo::revoke_all_for_user(&state.pool, id).await?;
        tracing::info!(target_user_id = id, revoked, "Sessions revoked");
    }

    tracing::info!(target_user_id = id, user_id = admin.user_id, "User updated");

    let role_name = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    let data = user.into_response(role_name);
    announce_user(&state, user_events::UPDATED, json!(&data), admin.user_id);

    Ok(Json(DataResponse { data }))
}

/// DELETE /api/admin/users/{id}
pub async fn delete_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if id == admin.user_id {
        return Err(AppError::BadRequest("Admins cannot delete themselves".into()));
    }
    if !UserRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("User", id));
    }

    tracing::info!(target_user_id = id, user_id = admin.user_id, "User deleted");
    announce_user(&state, user_events::DELETED, json!({ "id": id }), admin.user_id);

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// GET /api/admin/cache/stats
pub async fn cache_stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let stats = state.cache.stats().await;
    Ok(Json(DataResponse {
        data: json!({ "stats": stats, "tags": ALL_TAGS }),
    }))
}

/// POST /api/admin/cache/invalidate
pub async fn invalidate_cache(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<InvalidateRequest>,
) -> AppResult<impl IntoResponse> {
    let (data, keys) = match (input.tag, input.pattern) {
        (Some(tag), None) => {
            if !is_known_tag(&tag) {
                return Err(AppError::validation(format!("Unknown cache tag '{tag}'")));
            }
            let keys = invalidate_tag(&state, &tag).await;
            (json!({ "tags": [tag], "keys": &keys }), keys)
        }
        (None, Some(pattern)) => {
            validate_pattern(&pattern).map_err(AppError::validation)?;
            let keys = state.cache.invalidate_pattern(&pattern).await;
            (json!({ "pattern": pattern, "keys": &keys }), keys)
        }
        _ => {
            return Err(AppError::validation(
                "Provide exactly one of 'tag' or 'pattern'",
            ))
        }
    };

    tracing::info!(user_id = admin.user_id, removed = keys.len(), "Cache invalidated by admin");

    publish(
        &state,
        ContentEvent::new(CACHE_INVALIDATED)
            .with_data(data)
            .with_actor(admin.user_id),
    );

    Ok(Json(DataResponse {
        data: json!({ "removed": keys.len(), "keys": keys }),
    }))
}

/// DELETE /api/admin/cache
pub async fn clear_cache(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    state.cache.clear().await;
    tracing::info!(user_id = admin.user_id, "Cache cleared by admin");

    publish(
        &state,
        ContentEvent::new(CACHE_INVALIDATED)
            .with_data(json!({ "tags": ALL_TAGS, "all": true }))
            .with_actor(admin.user_id),
    );

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Realtime
// ---------------------------------------------------------------------------

/// GET /api/admin/realtime
pub async fn realtime_stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let stats = state.ws_manager.stats().await;
    Ok(Json(DataResponse {
        data: json!({
            "connections": stats.connections,
            "authenticated": stats.authenticated,
            "rooms": stats.rooms,
            "event_subscribers": state.event_bus.subscriber_count(),
        }),
    }))
}
