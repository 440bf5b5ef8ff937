// src/common/config.rs
//! Environment-driven configuration
//!
//! Every option has a development-only default so the server can boot in a
//! local sandbox. All defaults are insecure and must be overridden in any
//! real deployment; a warning is logged for each default left in place.

use std::env;
use tracing::warn;

/// Identity provider and session configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Identity provider tenant domain (e.g. "my-tenant.auth0.com").
    pub auth0_domain: String,
    /// Audience identifier of this API, validated against the token's `aud`.
    pub api_audience: String,
    /// OAuth client id used for the browser login flow.
    pub client_id: String,
    /// OAuth client secret used for the authorization-code exchange.
    pub client_secret: String,
    /// Audience of the provider's management API.
    pub management_audience: String,
    /// Client id for the client-credentials grant against the management API.
    pub management_client_id: String,
    /// Client secret for the client-credentials grant.
    pub management_client_secret: String,
    /// Redirect URI registered with the provider for `/callback`.
    pub callback_url: String,
    /// Secret used to sign the session cookie. Must be at least 32 bytes.
    pub session_secret: String,
    /// Namespaced custom claim carrying the admin flag. Validated at startup.
    pub admin_claim: String,
    /// Public base URL of this server, used as the logout return target.
    pub base_url: String,
}

fn env_or_default(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(v) if !v.is_empty() => v,
        _ => {
            warn!(
                env_var = key,
                "Using insecure development default; override this in production"
            );
            default.to_string()
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let auth0_domain = env_or_default("AUTH0_DOMAIN", "your-auth0-domain");
        let default_management_audience = format!("https://{}/api/v2/", auth0_domain);
        let default_admin_claim = format!("https://{}/claims/is_admin", auth0_domain);

        Self {
            api_audience: env_or_default("API_AUDIENCE", "your-api-audience"),
            client_id: env_or_default("CLIENT_ID", "your-client-id"),
            client_secret: env_or_default("CLIENT_SECRET", "your-client-secret"),
            management_audience: env_or_default(
                "API_MANAGEMENT_AUDIENCE",
                &default_management_audience,
            ),
            management_client_id: env_or_default(
                "API_MANAGEMENT_CLIENT_ID",
                "your-management-client-id",
            ),
            management_client_secret: env_or_default(
                "API_MANAGEMENT_CLIENT_SECRET",
                "your-management-client-secret",
            ),
            callback_url: env_or_default("AUTH0_CALLBACK_URL", "http://localhost:8080/callback"),
            session_secret: env_or_default(
                "SECRET_KEY",
                "dev-only-session-secret-0123456789-change-me",
            ),
            admin_claim: env_or_default("ADMIN_CLAIM", &default_admin_claim),
            base_url: env_or_default("BASE_URL", "http://localhost:8080"),
            auth0_domain,
        }
    }

    /// Validate startup invariants that would otherwise fail at request time.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.session_secret.len() < 32 {
            anyhow::bail!("SECRET_KEY must be at least 32 bytes");
        }
        // The admin claim must be a provider-namespaced key, not a bare word
        // that could collide with a standard claim.
        if !self.admin_claim.contains("://") {
            anyhow::bail!(
                "ADMIN_CLAIM must be a namespaced claim key (URL form), got '{}'",
                self.admin_claim
            );
        }
        if !self.callback_url.starts_with("http://") && !self.callback_url.starts_with("https://") {
            anyhow::bail!("AUTH0_CALLBACK_URL must be an absolute URL");
        }
        Ok(())
    }

    /// Expected token issuer, `https://{domain}/`.
    pub fn issuer(&self) -> String {
        format!("https://{}/", self.auth0_domain)
    }

    /// Well-known JWKS discovery URL.
    pub fn jwks_url(&self) -> String {
        format!("https://{}/.well-known/jwks.json", self.auth0_domain)
    }

    /// Authorization endpoint for the redirect-based login flow.
    pub fn authorize_url(&self) -> String {
        format!("https://{}/authorize", self.auth0_domain)
    }

    /// Token endpoint, shared by the code exchange and the client-credentials grant.
    pub fn token_url(&self) -> String {
        format!("https://{}/oauth/token", self.auth0_domain)
    }

    /// Userinfo endpoint queried after the code exchange.
    pub fn userinfo_url(&self) -> String {
        format!("https://{}/userinfo", self.auth0_domain)
    }

    /// Provider logout endpoint.
    pub fn logout_url(&self) -> String {
        format!("https://{}/v2/logout", self.auth0_domain)
    }
}
