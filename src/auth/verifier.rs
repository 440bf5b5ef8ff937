//! Bearer token verification
//!
//! Validates a token's signature against the provider's key set and checks
//! the standard claims: audience must equal the configured API audience,
//! issuer must equal `https://{domain}/`, and the expiry must be in the
//! future. There is no path that skips verification.

use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use std::sync::Arc;
use tracing::warn;

use super::error::AuthError;
use super::jwks::{JwksClient, JwksError};
use super::models::Claims;

pub struct TokenVerifier {
    jwks: Arc<JwksClient>,
    audience: String,
    issuer: String,
}

impl TokenVerifier {
    pub fn new(jwks: Arc<JwksClient>, audience: String, issuer: String) -> Self {
        Self {
            jwks,
            audience,
            issuer,
        }
    }

    /// Verify a bearer token and return its claims.
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|e| {
            warn!(error = %e, "Failed to parse token header");
            AuthError::InvalidHeader(format!("Unable to parse authentication token: {}", e))
        })?;

        let kid = header.kid.ok_or_else(|| {
            warn!("Token header carries no key id");
            AuthError::InvalidHeader("Unable to find appropriate key".to_string())
        })?;

        let key = self.jwks.get_key(&kid).await.map_err(|e| match e {
            JwksError::KeyNotFound => {
                warn!(kid = %kid, "No matching key in the provider's key set");
                AuthError::InvalidHeader("Unable to find appropriate key".to_string())
            }
            other => {
                warn!(error = %other, "Key set unavailable");
                AuthError::InvalidToken(format!("Unable to verify token: {}", other))
            }
        })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);

        let data = decode::<Claims>(token, &key, &validation).map_err(map_jwt_error)?;
        Ok(data.claims)
    }
}

/// Map jsonwebtoken failures onto the error taxonomy.
pub(crate) fn map_jwt_error(e: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired("Token is expired".to_string()),
        ErrorKind::InvalidAudience | ErrorKind::InvalidIssuer => AuthError::InvalidClaims(
            "Incorrect claims. Please, check the audience and issuer.".to_string(),
        ),
        _ => AuthError::InvalidToken(format!("Unable to parse authentication token: {}", e)),
    }
}
