//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Bearer token verification against the provider's JWKS
//! - The redirect-based OAuth login/callback/logout flow
//! - Session materialization for same-origin requests
//! - AuthedUser/AdminUser extractors for protected routes

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod jwks;
pub mod models;
pub mod routes;
pub mod verifier;

#[cfg(test)]
mod tests;

pub use error::AuthError;
pub use extractors::{AdminUser, AuthedUser};
pub use jwks::JwksClient;
pub use models::{Claims, User};
pub use routes::auth_routes;
pub use verifier::TokenVerifier;
