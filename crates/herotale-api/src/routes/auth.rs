//! Authentication routes and token extraction.
//!
//! Clients authenticate with `Authorization: JWT <token>`; `Bearer` is
//! accepted as well. Every request builds its own [`AuthContext`], so no
//! identity outlives the request that presented it.

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use herotale_core::identity::{AuthToken, NewAccount, Principal, User};
use herotale_story::application::auth::AuthContext;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Request body for POST /login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned after a successful login or registration.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Token to send back as `Authorization: JWT <token>`.
    pub token: String,
    pub user: User,
}

/// Reads the token from an `Authorization` header, if any.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<AuthToken> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    (scheme.eq_ignore_ascii_case("jwt") || scheme.eq_ignore_ascii_case("bearer"))
        .then(|| AuthToken::new(token))
}

/// Builds the caller's auth context. No header means anonymous; a header the
/// backend does not accept is an error rather than a silent downgrade.
pub(crate) async fn auth_context(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AuthContext, ApiError> {
    let mut context = AuthContext::anonymous(state.identity.clone());
    if let Some(token) = bearer_token(headers) {
        if context.restore(token).await?.is_none() {
            return Err(ApiError::Unauthenticated);
        }
    }
    Ok(context)
}

/// Like [`auth_context`], but anonymous callers are refused.
pub(crate) async fn require_principal(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Principal, ApiError> {
    auth_context(state, headers)
        .await?
        .principal()
        .cloned()
        .ok_or(ApiError::Unauthenticated)
}

fn signed_in(context: &AuthContext) -> Result<AuthResponse, ApiError> {
    let principal = context.principal().ok_or(ApiError::Unauthenticated)?;
    Ok(AuthResponse {
        token: principal.token.expose().to_owned(),
        user: principal.user.clone(),
    })
}

/// POST /login
#[instrument(skip_all, fields(email = %request.email))]
async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let mut context = AuthContext::anonymous(state.identity.clone());
    context.login(&request.email, &request.password).await?;
    info!("login succeeded");
    Ok(Json(signed_in(&context)?))
}

/// POST /register
#[instrument(skip_all, fields(email = %account.email))]
async fn register(
    State(state): State<AppState>,
    ApiJson(account): ApiJson<NewAccount>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let mut context = AuthContext::anonymous(state.identity.clone());
    context.register(&account).await?;
    info!("registration succeeded");
    Ok((StatusCode::CREATED, Json(signed_in(&context)?)))
}

/// GET /me
async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<User>, ApiError> {
    let principal = require_principal(&state, &headers).await?;
    Ok(Json(principal.user))
}

/// Returns the router for authentication.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/me", get(me))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_jwt_scheme_is_accepted() {
        let token = bearer_token(&headers("JWT abc.def")).unwrap();
        assert_eq!(token.expose(), "abc.def");
    }

    #[test]
    fn test_bearer_scheme_is_accepted_case_insensitively() {
        let token = bearer_token(&headers("bearer abc")).unwrap();
        assert_eq!(token.expose(), "abc");
    }

    #[test]
    fn test_unknown_scheme_is_ignored() {
        assert!(bearer_token(&headers("Basic dXNlcjpwdw==")).is_none());
    }

    #[test]
    fn test_missing_header_has_no_token() {
        assert!(bearer_token(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_empty_token_is_ignored() {
        assert!(bearer_token(&headers("JWT ")).is_none());
    }
}
