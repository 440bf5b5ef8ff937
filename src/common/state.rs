// Application state shared across all modules

use reqwest::Client;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::common::config::Config;
use crate::services::{ManagementService, UserService};

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub http: Client,
    pub config: Arc<Config>,
    pub verifier: Arc<TokenVerifier>,
    pub user_service: Arc<UserService>,
    pub management_service: Arc<ManagementService>,
}
