//! Authentication handlers
//!
//! The redirect-based OAuth flow (`/login` → provider → `/callback` →
//! session), logout, and the admin endpoints. Product handlers live in the
//! products module; this file owns everything that touches the identity
//! provider or the session.

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use rand::{distributions::Alphanumeric, Rng};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_sessions::Session;
use tracing::{debug, error, info, warn};

use super::extractors::{AdminUser, AuthedUser};
use super::models::{
    AdminSetBody, CallbackQuery, Claims, SessionUser, TokenResponse, SESSION_OAUTH_STATE_KEY,
    SESSION_USER_KEY,
};
use crate::common::{safe_email_log, safe_token_log, ApiError, AppState};

/// GET /login
/// Redirects to the provider's authorization endpoint with
/// `scope=openid profile email` and the configured audience.
pub async fn login(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    session: Session,
) -> Result<Redirect, ApiError> {
    let state = state_lock.read().await.clone();

    let nonce: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();

    session
        .insert(SESSION_OAUTH_STATE_KEY, &nonce)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to store OAuth state in session");
            ApiError::InternalServer("session error".to_string())
        })?;

    let url = format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&audience={}&state={}",
        state.config.authorize_url(),
        urlencoding::encode(&state.config.client_id),
        urlencoding::encode(&state.config.callback_url),
        urlencoding::encode("openid profile email"),
        urlencoding::encode(&state.config.api_audience),
        nonce,
    );

    info!("Redirecting to identity provider for login");
    Ok(Redirect::to(&url))
}

fn callback_error(description: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": description })),
    )
        .into_response()
}

/// GET /callback
/// Exchanges the authorization code for tokens, fetches userinfo, resolves
/// or creates the local user, and stores the session. Every failure path
/// returns a JSON error with HTTP 500 and leaves no session behind.
pub async fn callback(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    session: Session,
    Query(params): Query<CallbackQuery>,
) -> Response {
    let state = state_lock.read().await.clone();

    if let Some(err) = params.error {
        error!(
            oauth_error = %err,
            description = ?params.error_description,
            "Identity provider returned an error on callback"
        );
        return callback_error("OAuth authentication error");
    }

    // The state nonce stored at login must round-trip unchanged.
    let stored_state: Option<String> = session
        .remove(SESSION_OAUTH_STATE_KEY)
        .await
        .unwrap_or(None);
    match (&stored_state, &params.state) {
        (Some(stored), Some(returned)) if stored == returned => {}
        _ => {
            warn!("OAuth state mismatch on callback");
            return callback_error("OAuth authentication error");
        }
    }

    let Some(code) = params.code else {
        warn!("No authorization code in callback");
        return callback_error("OAuth authentication error");
    };

    // Exchange the authorization code for tokens.
    let token_resp = state
        .http
        .post(state.config.token_url())
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", &state.config.client_id),
            ("client_secret", &state.config.client_secret),
            ("code", &code),
            ("redirect_uri", &state.config.callback_url),
        ])
        .send()
        .await;

    let token = match token_resp {
        Ok(resp) if resp.status().is_success() => match resp.json::<TokenResponse>().await {
            Ok(t) => t,
            Err(e) => {
                error!(error = %e, "Failed to decode token endpoint response");
                return callback_error("OAuth authentication error");
            }
        },
        Ok(resp) => {
            error!(http_status = %resp.status(), "Token exchange failed");
            return callback_error("OAuth authentication error");
        }
        Err(e) => {
            error!(error = %e, "HTTP error during token exchange");
            return callback_error("OAuth authentication error");
        }
    };

    debug!(
        access_token = %safe_token_log(&token.access_token),
        "Authorization code exchanged for tokens"
    );

    // Fetch the user's profile from the provider.
    let userinfo_resp = state
        .http
        .get(state.config.userinfo_url())
        .bearer_auth(&token.access_token)
        .send()
        .await;

    let userinfo = match userinfo_resp {
        Ok(resp) if resp.status().is_success() => match resp.json::<Claims>().await {
            Ok(claims) => claims,
            Err(e) => {
                error!(error = %e, "Error decoding userinfo response");
                return callback_error("Failed to decode user information");
            }
        },
        Ok(resp) => {
            error!(http_status = %resp.status(), "HTTP error during user info fetch");
            return callback_error("Failed to fetch user information");
        }
        Err(e) => {
            error!(error = %e, "HTTP error during user info fetch");
            return callback_error("Failed to fetch user information");
        }
    };

    let user = match state
        .user_service
        .get_or_create(&userinfo, &state.config.admin_claim)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            error!(error = %e, "Failed to resolve user during callback");
            return callback_error("An unexpected error occurred");
        }
    };

    let session_user = SessionUser {
        user_id: user.user_id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        access_token: token.access_token,
    };
    if let Err(e) = session.insert(SESSION_USER_KEY, &session_user).await {
        error!(error = %e, "Failed to store session on callback");
        return callback_error("An unexpected error occurred");
    }

    info!(
        user_id = %user.user_id,
        email = %safe_email_log(&user.email),
        "User authenticated via OAuth callback"
    );

    Redirect::to("/").into_response()
}

/// GET /logout
/// Clears the session and redirects to the provider's logout endpoint.
pub async fn logout(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    session: Session,
) -> Result<Redirect, ApiError> {
    let state = state_lock.read().await.clone();

    session.flush().await.map_err(|e| {
        error!(error = %e, "Failed to clear session on logout");
        ApiError::InternalServer("session error".to_string())
    })?;

    let url = format!(
        "{}?returnTo={}&client_id={}",
        state.config.logout_url(),
        urlencoding::encode(&state.config.base_url),
        urlencoding::encode(&state.config.client_id),
    );

    info!("User logged out");
    Ok(Redirect::to(&url))
}

/// GET /admin/check
/// Requires authentication; reports whether the caller is an admin.
pub async fn check_admin(authed: AuthedUser) -> Json<serde_json::Value> {
    Json(json!({ "is_admin": authed.is_admin }))
}

/// Promotion policy: once any admin exists, only admins may promote; with an
/// empty admin set the first authenticated caller may promote (bootstrap).
pub fn may_promote(caller_is_admin: bool, admin_exists: bool) -> bool {
    caller_is_admin || !admin_exists
}

/// POST /admin/set
/// Promotes a user (looked up by email) to admin and best-effort syncs the
/// flag back to the identity provider's user metadata.
pub async fn set_admin(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(body): Json<AdminSetBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    if !may_promote(authed.is_admin, state.user_service.admin_exists().await?) {
        warn!(
            user_id = %authed.id,
            "Admin promotion denied: caller is not an admin"
        );
        return Err(ApiError::Forbidden(
            "Only existing admins can set new admins".to_string(),
        ));
    }

    let Some(user) = state.user_service.find_by_email(&body.email).await? else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };

    state.user_service.set_admin(&user.user_id, true).await?;

    info!(
        admin_user_id = %authed.id,
        target_user_id = %user.user_id,
        "User promoted to admin"
    );

    // Local state is authoritative; a failed provider sync is a partial
    // success, not an error.
    let synced = state
        .management_service
        .sync_admin_flag(&user.user_id, true)
        .await;
    if !synced {
        warn!(
            target_user_id = %user.user_id,
            "Admin flag updated locally but provider sync failed"
        );
    }

    Ok(Json(json!({
        "message": "User set as admin successfully",
        "synced": synced,
    })))
}

/// GET /session
/// Session/token debug view. Requires authentication and admin.
pub async fn get_session(
    session: Session,
    _admin: AdminUser,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let user: Option<SessionUser> = session.get(SESSION_USER_KEY).await.unwrap_or(None);

    match user {
        Some(u) => {
            let access_token = u.access_token.clone();
            Ok((
                StatusCode::OK,
                Json(json!({
                    "authenticated": true,
                    "user": u,
                    "access_token": access_token,
                })),
            ))
        }
        None => Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "authenticated": false,
                "user": null,
            })),
        )),
    }
}

/// GET /admin/users
/// Lists all users. The stored access token is included only for the
/// caller's own row.
pub async fn get_all_users(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    session: Session,
    AdminUser(authed): AdminUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let users = state.user_service.list_all().await?;
    let session_user: Option<SessionUser> = session.get(SESSION_USER_KEY).await.unwrap_or(None);

    let users_info: Vec<serde_json::Value> = users
        .iter()
        .map(|u| {
            let access_token = if u.user_id == authed.id {
                session_user.as_ref().map(|s| s.access_token.clone())
            } else {
                None
            };
            json!({
                "user_id": u.user_id,
                "email": u.email,
                "name": u.name,
                "is_admin": u.is_admin,
                "access_token": access_token,
            })
        })
        .collect();

    Ok(Json(json!({ "users": users_info })))
}
