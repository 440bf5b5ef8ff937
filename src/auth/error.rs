//! Authentication error taxonomy
//!
//! Every variant maps to HTTP 401 with a JSON body of the form
//! `{"code": ..., "description": ...}` so clients can distinguish a missing
//! header from a bad token from an expired one.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Authentication failure raised by header extraction or token verification.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    #[error("{0}")]
    AuthorizationHeaderMissing(String),
    #[error("{0}")]
    InvalidHeader(String),
    #[error("{0}")]
    InvalidToken(String),
    #[error("{0}")]
    TokenExpired(String),
    #[error("{0}")]
    InvalidClaims(String),
}

impl AuthError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::AuthorizationHeaderMissing(_) => "authorization_header_missing",
            AuthError::InvalidHeader(_) => "invalid_header",
            AuthError::InvalidToken(_) => "invalid_token",
            AuthError::TokenExpired(_) => "token_expired",
            AuthError::InvalidClaims(_) => "invalid_claims",
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        match self {
            AuthError::AuthorizationHeaderMissing(d)
            | AuthError::InvalidHeader(d)
            | AuthError::InvalidToken(d)
            | AuthError::TokenExpired(d)
            | AuthError::InvalidClaims(d) => d,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        let body = json!({
            "code": self.code(),
            "description": self.description(),
        });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}
