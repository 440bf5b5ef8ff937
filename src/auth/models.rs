//! Authentication data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;

/// Session key under which the authenticated user is stored.
pub const SESSION_USER_KEY: &str = "user";
/// Session key for the OAuth `state` nonce during the login redirect.
pub const SESSION_OAUTH_STATE_KEY: &str = "oauth_state";

/// Verified token claims. Transient: consumed once per request to resolve
/// or create a local user, never persisted.
///
/// `extra` captures provider-namespaced custom claims (the admin flag lives
/// under the configured claim key). The same structure is used to parse the
/// provider's userinfo response, which carries no `exp`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub exp: usize,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Claims {
    /// Read the admin indicator from the configured namespaced claim.
    /// Absent or non-boolean values mean "not an admin".
    pub fn admin_flag(&self, claim_key: &str) -> bool {
        self.extra
            .get(claim_key)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// User database model, keyed by the provider-assigned subject identifier
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub name: Option<String>,
    pub is_admin: bool,
    pub created_at: Option<String>,
}

/// Minimal session record materialized on OAuth callback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: String,
    pub email: String,
    pub name: Option<String>,
    pub access_token: String,
}

/// Query parameters the provider sends to the callback endpoint
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Token endpoint response for the authorization-code exchange. Only the
/// access token is consumed; the rest of the grant payload is ignored.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// POST /admin/set request body
#[derive(Debug, Deserialize)]
pub struct AdminSetBody {
    pub email: String,
}
