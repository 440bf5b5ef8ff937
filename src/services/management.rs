// src/services/management.rs
//! Management-API token client
//!
//! Obtains a short-lived service credential via a client-credentials grant
//! and uses it to push admin-flag changes back to the identity provider's
//! user metadata. A missing token or failed push is reported to the caller
//! as "cannot sync", never as a request failure: local state stays
//! authoritative.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::common::Config;

#[derive(Debug, Error)]
pub enum ManagementError {
    #[error("token request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("token endpoint returned status {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Deserialize)]
struct ManagementTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

pub struct ManagementService {
    http: Client,
    config: Arc<Config>,
}

impl ManagementService {
    pub fn new(http: Client, config: Arc<Config>) -> Self {
        Self { http, config }
    }

    /// Exchange service credentials for a management-API access token.
    /// Returns None on any failure; callers treat that as "cannot sync".
    pub async fn get_token(&self) -> Option<String> {
        match self.request_token().await {
            Ok(token) => Some(token),
            Err(e) => {
                error!(error = %e, "Failed to obtain management API token");
                None
            }
        }
    }

    async fn request_token(&self) -> Result<String, ManagementError> {
        let resp = self
            .http
            .post(self.config.token_url())
            .json(&json!({
                "grant_type": "client_credentials",
                "client_id": self.config.management_client_id,
                "client_secret": self.config.management_client_secret,
                "audience": self.config.management_audience,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ManagementError::Status(resp.status()));
        }

        let token = resp.json::<ManagementTokenResponse>().await?;
        debug!(
            expires_in = ?token.expires_in,
            "Obtained management API token"
        );
        Ok(token.access_token)
    }

    /// Push the admin flag into the provider's user metadata. Returns
    /// whether the sync succeeded.
    pub async fn sync_admin_flag(&self, user_id: &str, is_admin: bool) -> bool {
        let Some(token) = self.get_token().await else {
            warn!(user_id = %user_id, "No management token, skipping provider sync");
            return false;
        };

        let url = format!(
            "https://{}/api/v2/users/{}",
            self.config.auth0_domain,
            urlencoding::encode(user_id),
        );

        let result = self
            .http
            .patch(&url)
            .bearer_auth(token)
            .json(&json!({ "app_metadata": { "is_admin": is_admin } }))
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                info!(user_id = %user_id, is_admin, "Synced admin flag to identity provider");
                true
            }
            Ok(resp) => {
                warn!(
                    user_id = %user_id,
                    http_status = %resp.status(),
                    "Provider rejected admin flag sync"
                );
                false
            }
            Err(e) => {
                error!(error = %e, user_id = %user_id, "HTTP error syncing admin flag");
                false
            }
        }
    }
}
