//! Tests for auth module
//!
//! These tests verify core authentication functionality including:
//! - Bearer token extraction from headers and session fallback
//! - Admin promotion bootstrap policy
//! - Error taxonomy codes and response bodies
//! - jsonwebtoken failure mapping
//! - JWKS parsing and key lookup
//! - Verifier rejection of tokens without a usable key id

#[cfg(test)]
mod tests {
    use super::super::*;
    use axum::http::HeaderValue;
    use axum::response::IntoResponse;
    use jsonwebtoken::errors::ErrorKind;
    use std::collections::HashMap;

    use extractors::bearer_token;
    use handlers::may_promote;
    use jwks::Jwks;
    use models::{Claims, SessionUser};
    use verifier::map_jwt_error;

    fn session_user(token: &str) -> SessionUser {
        SessionUser {
            user_id: "auth0|abc".to_string(),
            email: "abc@example.com".to_string(),
            name: None,
            access_token: token.to_string(),
        }
    }

    // ------------------------------------------------------------------
    // Authorization header extraction
    // ------------------------------------------------------------------

    #[test]
    fn test_bearer_token_missing_header_and_session() {
        let result = bearer_token(None, None);
        assert_eq!(
            result.unwrap_err(),
            AuthError::AuthorizationHeaderMissing(
                "Authorization header is expected".to_string()
            )
        );
    }

    #[test]
    fn test_bearer_token_falls_back_to_session() {
        let user = session_user("session-token");
        let result = bearer_token(None, Some(&user));
        assert_eq!(result.unwrap(), "session-token");
    }

    #[test]
    fn test_bearer_token_header_wins_over_session() {
        let user = session_user("session-token");
        let header = HeaderValue::from_static("Bearer header-token");
        let result = bearer_token(Some(&header), Some(&user));
        assert_eq!(result.unwrap(), "header-token");
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let header = HeaderValue::from_static("Token abc");
        let err = bearer_token(Some(&header), None).unwrap_err();
        assert_eq!(err.code(), "invalid_header");
        assert_eq!(err.description(), "Authorization header must start with Bearer");
    }

    #[test]
    fn test_bearer_token_missing_token_segment() {
        let header = HeaderValue::from_static("Bearer");
        let err = bearer_token(Some(&header), None).unwrap_err();
        assert_eq!(err.code(), "invalid_header");
        assert_eq!(err.description(), "Token not found");
    }

    #[test]
    fn test_bearer_token_too_many_parts() {
        let header = HeaderValue::from_static("Bearer abc def");
        let err = bearer_token(Some(&header), None).unwrap_err();
        assert_eq!(err.code(), "invalid_header");
        assert_eq!(err.description(), "Authorization header must be Bearer token");
    }

    #[test]
    fn test_bearer_token_scheme_is_case_insensitive() {
        let header = HeaderValue::from_static("bearer abc");
        assert_eq!(bearer_token(Some(&header), None).unwrap(), "abc");
    }

    // ------------------------------------------------------------------
    // Error taxonomy
    // ------------------------------------------------------------------

    #[test]
    fn test_auth_error_codes() {
        assert_eq!(
            AuthError::AuthorizationHeaderMissing(String::new()).code(),
            "authorization_header_missing"
        );
        assert_eq!(AuthError::InvalidHeader(String::new()).code(), "invalid_header");
        assert_eq!(AuthError::InvalidToken(String::new()).code(), "invalid_token");
        assert_eq!(AuthError::TokenExpired(String::new()).code(), "token_expired");
        assert_eq!(AuthError::InvalidClaims(String::new()).code(), "invalid_claims");
    }

    #[tokio::test]
    async fn test_auth_error_response_shape() {
        let err = AuthError::TokenExpired("Token is expired".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), 401);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let body: serde_json::Value =
            serde_json::from_slice(&bytes).expect("Body should be JSON");
        assert_eq!(body["code"], "token_expired");
        assert_eq!(body["description"], "Token is expired");
    }

    // ------------------------------------------------------------------
    // jsonwebtoken failure mapping
    // ------------------------------------------------------------------

    #[test]
    fn test_expired_signature_maps_to_token_expired() {
        let err = map_jwt_error(ErrorKind::ExpiredSignature.into());
        assert_eq!(err.code(), "token_expired");
    }

    #[test]
    fn test_audience_and_issuer_map_to_invalid_claims() {
        assert_eq!(
            map_jwt_error(ErrorKind::InvalidAudience.into()).code(),
            "invalid_claims"
        );
        assert_eq!(
            map_jwt_error(ErrorKind::InvalidIssuer.into()).code(),
            "invalid_claims"
        );
    }

    #[test]
    fn test_bad_signature_maps_to_invalid_token() {
        assert_eq!(
            map_jwt_error(ErrorKind::InvalidSignature.into()).code(),
            "invalid_token"
        );
    }

    // ------------------------------------------------------------------
    // Admin promotion policy
    // ------------------------------------------------------------------

    #[test]
    fn test_promotion_requires_admin_once_one_exists() {
        assert!(!may_promote(false, true));
        assert!(may_promote(true, true));
    }

    #[test]
    fn test_first_promotion_is_open_while_no_admin_exists() {
        assert!(may_promote(false, false));
        assert!(may_promote(true, false));
    }

    // ------------------------------------------------------------------
    // Claims
    // ------------------------------------------------------------------

    const ADMIN_CLAIM: &str = "https://tenant.example.com/claims/is_admin";

    #[test]
    fn test_admin_flag_from_namespaced_claim() {
        let mut extra = HashMap::new();
        extra.insert(ADMIN_CLAIM.to_string(), serde_json::Value::Bool(true));
        let claims = Claims {
            sub: "auth0|abc".to_string(),
            email: None,
            name: None,
            exp: 0,
            extra,
        };
        assert!(claims.admin_flag(ADMIN_CLAIM));
    }

    #[test]
    fn test_admin_flag_defaults_to_false() {
        let claims = Claims {
            sub: "auth0|abc".to_string(),
            email: None,
            name: None,
            exp: 0,
            extra: HashMap::new(),
        };
        assert!(!claims.admin_flag(ADMIN_CLAIM));

        // Non-boolean claim values are not trusted either.
        let mut extra = HashMap::new();
        extra.insert(
            ADMIN_CLAIM.to_string(),
            serde_json::Value::String("true".to_string()),
        );
        let claims = Claims {
            sub: "auth0|abc".to_string(),
            email: None,
            name: None,
            exp: 0,
            extra,
        };
        assert!(!claims.admin_flag(ADMIN_CLAIM));
    }

    #[test]
    fn test_claims_parse_userinfo_without_exp() {
        // The userinfo endpoint returns a profile without exp.
        let json = format!(
            r#"{{"sub": "auth0|abc", "email": "abc@example.com", "name": "Abc", "{}": true}}"#,
            ADMIN_CLAIM
        );
        let claims: Claims = serde_json::from_str(&json).expect("userinfo should parse");
        assert_eq!(claims.sub, "auth0|abc");
        assert_eq!(claims.email, Some("abc@example.com".to_string()));
        assert_eq!(claims.exp, 0);
        assert!(claims.admin_flag(ADMIN_CLAIM));
    }

    // ------------------------------------------------------------------
    // JWKS
    // ------------------------------------------------------------------

    #[test]
    fn test_jwks_parse_and_find() {
        let json = r#"{
            "keys": [
                {"kty": "RSA", "kid": "key-1", "use": "sig", "alg": "RS256", "n": "AQAB", "e": "AQAB"},
                {"kty": "RSA", "kid": "key-2", "n": "AQAB", "e": "AQAB"}
            ]
        }"#;
        let jwks: Jwks = serde_json::from_str(json).expect("JWKS should parse");
        assert_eq!(jwks.keys.len(), 2);
        assert!(jwks.find("key-1").is_some());
        assert!(jwks.find("key-2").is_some());
        assert!(jwks.find("rotated-away").is_none());
    }

    // ------------------------------------------------------------------
    // Verifier
    // ------------------------------------------------------------------

    fn test_verifier() -> TokenVerifier {
        // The JWKS endpoint is never reached by these tests: both inputs
        // fail before any key lookup happens.
        let jwks = std::sync::Arc::new(JwksClient::new(
            reqwest::Client::new(),
            "https://tenant.invalid/.well-known/jwks.json".to_string(),
        ));
        TokenVerifier::new(
            jwks,
            "https://api.example.com".to_string(),
            "https://tenant.example.com/".to_string(),
        )
    }

    #[tokio::test]
    async fn test_verify_rejects_garbage_token() {
        let err = test_verifier().verify("not-a-jwt").await.unwrap_err();
        assert_eq!(err.code(), "invalid_header");
    }

    #[tokio::test]
    async fn test_verify_rejects_token_without_kid() {
        // Header {"alg":"RS256","typ":"JWT"} with no key id.
        let token = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.e30.c2ln";
        let err = test_verifier().verify(token).await.unwrap_err();
        assert_eq!(err.code(), "invalid_header");
        assert_eq!(err.description(), "Unable to find appropriate key");
    }
}
