//! Handlers for the `/auth` resource (register, login, refresh, logout, me).

use axum::extract::State;
use axum::http::header::{SET_COOKIE, USER_AGENT};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use folio_core::error::CoreError;
use folio_core::roles::DEFAULT_ROLE_NAME;
use folio_core::validation::{validate_email, validate_password, validate_username};
use folio_db::models::session::CreateSession;
use folio_db::models::user::{CreateUser, User, UserResponse};
use folio_db::repositories::{RoleRepo, SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::auth::cookie::{clear_session_cookie, session_cookie};
use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Request body for `POST /auth/login`. `login` is a username or an email.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username", alias = "email")]
    pub login: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful authentication response returned by register, login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Invalid username or password".into(),
    ))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/register
///
/// Create a `user`-role account and sign it in.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    validate_username(&input.username).map_err(AppError::validation)?;
    validate_email(&input.email).map_err(AppError::validation)?;
    validate_password(&input.password).map_err(AppError::validation)?;

    let role = RoleRepo::find_by_name(&state.pool, DEFAULT_ROLE_NAME)
        .await?
        .ok_or_else(|| AppError::InternalError("Default role is missing".into()))?;

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
            role_id: role.id,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    let (cookie, response) = create_auth_response(&state, user, role.name, &headers).await?;
    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, cookie)],
        Json(DataResponse { data: response }),
    ))
}

/// POST /api/auth/login
///
/// Authenticate with username (or email) + password. Returns tokens and sets
/// the session cookie.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_login(&state.pool, input.login.trim())
        .await?
        .ok_or_else(invalid_credentials)?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(user_id = user.id, "Login failed: wrong password");
        return Err(invalid_credentials());
    }

    if !user.can_sign_in() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated or blocked".into(),
        )));
    }

    UserRepo::record_login(&state.pool, user.id).await?;
    let role_name = RoleRepo::resolve_name(&state.pool, user.role_id).await?;

    tracing::info!(user_id = user.id, role = %role_name, "User logged in");

    let (cookie, response) = create_auth_response(&state, user, role_name, &headers).await?;
    Ok(([(SET_COOKIE, cookie)], Json(DataResponse { data: response })))
}

/// POST /api/auth/refresh
///
/// Exchange a valid refresh token for new tokens. The old session is revoked.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RefreshRequest>,
) -> AppResult<impl IntoResponse> {
    let token_hash = hash_refresh_token(&input.refresh_token);

    let session = SessionRepo::find_by_refresh_token_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ))
        })?;

    SessionRepo::revoke(&state.pool, session.id).await?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    if !user.can_sign_in() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated or blocked".into(),
        )));
    }

    let role_name = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    let (cookie, response) = create_auth_response(&state, user, role_name, &headers).await?;
    Ok(([(SET_COOKIE, cookie)], Json(DataResponse { data: response })))
}

/// POST /api/auth/logout
///
/// Revoke all sessions for the authenticated user and clear the cookie.
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<impl IntoResponse> {
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;
    tracing::info!(user_id = auth_user.user_id, revoked, "User logged out");

    Ok((
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, clear_session_cookie(state.config.cookie_secure))],
    ))
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_id(&state.pool, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", auth_user.user_id))?;
    let role_name = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    Ok(Json(DataResponse {
        data: user.into_response(role_name),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Generate tokens, persist a session row, and build the cookie + body.
async fn create_auth_response(
    state: &AppState,
    user: User,
    role: String,
    headers: &HeaderMap,
) -> AppResult<(String, AuthResponse)> {
    let jwt = &state.config.jwt;
    let access_token = generate_access_token(user.id, &role, &user.display_name(), jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();

    let session_input = CreateSession {
        user_id: user.id,
        refresh_token_hash: refresh_hash,
        expires_at: Utc::now() + chrono::Duration::days(jwt.refresh_token_expiry_days),
        user_agent: headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    SessionRepo::create(&state.pool, &session_input).await?;

    let expires_in = jwt.access_token_expiry_secs();
    let cookie = session_cookie(&access_token, expires_in, state.config.cookie_secure);

    Ok((
        cookie,
        AuthResponse {
            access_token,
            refresh_token: refresh_plaintext,
            expires_in,
            user: user.into_response(role),
        },
    ))
}

