//! JWT-based authentication extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use folio_core::error::CoreError;
use folio_core::roles::ROLE_ADMIN;
use folio_core::types::DbId;

use crate::auth::cookie::session_token;
use crate::auth::jwt::{validate_token, JwtConfig};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from the `Authorization: Bearer` header or,
/// failing that, the `folio_session` cookie.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    /// The user's role name.
    pub role: String,
    /// Display name carried in the token.
    pub name: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Decode an access token into the user it was issued to.
    pub fn from_token(token: &str, config: &JwtConfig) -> Option<Self> {
        let claims = validate_token(token, config).ok()?;
        Some(AuthUser {
            user_id: claims.sub,
            role: claims.role,
            name: claims.name,
        })
    }
}

/// Where the request's credentials came from, if anywhere.
enum Credential {
    Token(String),
    MalformedHeader,
    Missing,
}

fn credential(headers: &HeaderMap) -> Credential {
    if let Some(value) = headers.get(AUTHORIZATION) {
        return match value.to_str().ok().and_then(|v| v.strip_prefix("Bearer ")) {
            Some(token) if !token.is_empty() => Credential::Token(token.to_string()),
            _ => Credential::MalformedHeader,
        };
    }
    match session_token(headers) {
        Some(token) => Credential::Token(token),
        None => Credential::Missing,
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = match credential(&parts.headers) {
            Credential::Token(token) => token,
            Credential::MalformedHeader => {
                return Err(AppError::Core(CoreError::Unauthorized(
                    "Invalid Authorization format. Expected: Bearer <token>".into(),
                )))
            }
            Credential::Missing => {
                return Err(AppError::Core(CoreError::Unauthorized(
                    "Authentication required".into(),
                )))
            }
        };

        AuthUser::from_token(&token, &state.config.jwt).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })
    }
}

/// The authenticated user if the request carries valid credentials.
///
/// Never rejects: missing, malformed or expired credentials yield `None`.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = match credential(&parts.headers) {
            Credential::Token(token) => AuthUser::from_token(&token, &state.config.jwt),
            _ => None,
        };
        Ok(OptionalAuthUser(user))
    }
}

/// Token from the Bearer header or session cookie, without validating it.
pub fn request_token(headers: &HeaderMap) -> Option<String> {
    match credential(headers) {
        Credential::Token(token) => Some(token),
        _ => None,
    }
}
