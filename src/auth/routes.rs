//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `GET /login` - Redirect to the identity provider's login page
/// - `GET /callback` - OAuth callback (code exchange + session)
/// - `GET /logout` - Clear session, redirect to provider logout
/// - `GET /session` - Session/token debug view (admin)
/// - `GET /admin/check` - Report the caller's admin status
/// - `POST /admin/set` - Promote a user to admin
/// - `GET /admin/users` - List all users (admin)
pub fn auth_routes() -> Router {
    Router::new()
        .route("/login", get(handlers::login))
        .route("/callback", get(handlers::callback))
        .route("/logout", get(handlers::logout))
        .route("/session", get(handlers::get_session))
        .route("/admin/check", get(handlers::check_admin))
        .route("/admin/set", post(handlers::set_admin))
        .route("/admin/users", get(handlers::get_all_users))
}
