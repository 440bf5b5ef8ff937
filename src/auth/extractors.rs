//! Authentication extractors for Axum
//!
//! `AuthedUser` is the "authentication required" guard: it runs header
//! extraction, token verification, and user resolution in that order and
//! attaches the resolved user. `AdminUser` layers "admin required" on top.
//! Any failure short-circuits the wrapped handler with the triggering
//! error's status and body.

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderValue},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use tower_sessions::Session;

use super::error::AuthError;
use super::models::{SessionUser, SESSION_USER_KEY};
use crate::common::{safe_email_log, ApiError, AppState};

/// Authenticated user attached to the request after the guard chain ran.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub is_admin: bool,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let app_state = state_lock.read().await.clone();

        // The session only matters when no Authorization header is present,
        // but the extraction itself is infallible request-extension lookup.
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| ApiError::InternalServer(msg.to_string()))?;
        let session_user: Option<SessionUser> =
            session.get(SESSION_USER_KEY).await.unwrap_or(None);

        let token = bearer_token(parts.headers.get(AUTHORIZATION), session_user.as_ref())?;

        let claims = app_state.verifier.verify(&token).await?;

        let user = app_state
            .user_service
            .get_or_create(&claims, &app_state.config.admin_claim)
            .await?;

        debug!(
            user_id = %user.user_id,
            email = %safe_email_log(&user.email),
            is_admin = user.is_admin,
            "Request authenticated"
        );

        Ok(AuthedUser {
            id: user.user_id,
            email: user.email,
            name: user.name,
            is_admin: user.is_admin,
        })
    }
}

/// "Admin required" guard. Runs the authentication guard first and fails
/// closed: an unauthenticated request gets 401, a non-admin gets 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthedUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let authed = AuthedUser::from_request_parts(parts, state).await?;

        if !authed.is_admin {
            warn!(user_id = %authed.id, "Admin access denied");
            return Err(ApiError::Forbidden("Admin privileges required".to_string()));
        }

        Ok(AdminUser(authed))
    }
}

/// Obtain the access token: a well-formed bearer Authorization header wins,
/// otherwise fall back to a previously materialized session's stored token.
pub fn bearer_token(
    header: Option<&HeaderValue>,
    session_user: Option<&SessionUser>,
) -> Result<String, AuthError> {
    let Some(raw) = header else {
        if let Some(user) = session_user {
            debug!("No Authorization header present, using session token");
            return Ok(user.access_token.clone());
        }
        return Err(AuthError::AuthorizationHeaderMissing(
            "Authorization header is expected".to_string(),
        ));
    };

    let raw = raw.to_str().map_err(|_| {
        AuthError::InvalidHeader("Authorization header must be valid ASCII".to_string())
    })?;

    let parts: Vec<&str> = raw.split_whitespace().collect();

    if parts.is_empty() {
        return Err(AuthError::InvalidHeader("Token not found".to_string()));
    }
    if !parts[0].eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidHeader(
            "Authorization header must start with Bearer".to_string(),
        ));
    }
    if parts.len() == 1 {
        return Err(AuthError::InvalidHeader("Token not found".to_string()));
    }
    if parts.len() > 2 {
        return Err(AuthError::InvalidHeader(
            "Authorization header must be Bearer token".to_string(),
        ));
    }

    Ok(parts[1].to_string())
}
