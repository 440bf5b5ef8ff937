//! JSON Web Key Set fetcher
//!
//! Retrieves the identity provider's current RSA signing keys from the
//! well-known discovery URL. Successful fetches are cached for a short TTL;
//! failures are never cached, so a transient outage surfaces as a
//! verification failure on the request that hit it and nothing more.

use jsonwebtoken::DecodingKey;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error};

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum JwksError {
    #[error("failed to fetch key set: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("unable to find appropriate key")]
    KeyNotFound,
    #[error("invalid key material: {0}")]
    BadKey(#[from] jsonwebtoken::errors::Error),
}

/// A single key from the provider's key set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub kid: String,
    #[serde(rename = "use", default)]
    pub usage: Option<String>,
    #[serde(default)]
    pub alg: Option<String>,
    pub n: String,
    pub e: String,
}

/// The provider's published key set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

impl Jwks {
    /// Find a key by its key id.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid == kid)
    }
}

struct CachedJwks {
    jwks: Jwks,
    fetched_at: Instant,
}

/// Fetches and caches the provider's key set.
pub struct JwksClient {
    http: Client,
    jwks_url: String,
    ttl: Duration,
    cache: RwLock<Option<CachedJwks>>,
}

impl JwksClient {
    pub fn new(http: Client, jwks_url: String) -> Self {
        Self {
            http,
            jwks_url,
            ttl: DEFAULT_CACHE_TTL,
            cache: RwLock::new(None),
        }
    }

    /// Resolve the decoding key for a key id, refetching the set when the
    /// cache is stale or does not contain the id (key rotation).
    pub async fn get_key(&self, kid: &str) -> Result<DecodingKey, JwksError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.fetched_at.elapsed() < self.ttl {
                    if let Some(jwk) = cached.jwks.find(kid) {
                        return decoding_key(jwk);
                    }
                    debug!(kid = %kid, "Key id not in cached set, refetching");
                }
            }
        }

        let jwks = self.fetch().await?;
        let key = match jwks.find(kid) {
            Some(jwk) => decoding_key(jwk),
            None => Err(JwksError::KeyNotFound),
        };

        let mut cache = self.cache.write().await;
        *cache = Some(CachedJwks {
            jwks,
            fetched_at: Instant::now(),
        });

        key
    }

    async fn fetch(&self) -> Result<Jwks, JwksError> {
        debug!(url = %self.jwks_url, "Fetching JWKS from identity provider");
        let resp = self
            .http
            .get(&self.jwks_url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| {
                error!(error = %e, url = %self.jwks_url, "JWKS endpoint returned error status");
                e
            })?;
        let jwks = resp.json::<Jwks>().await?;
        debug!(key_count = jwks.keys.len(), "Fetched JWKS");
        Ok(jwks)
    }
}

fn decoding_key(jwk: &Jwk) -> Result<DecodingKey, JwksError> {
    Ok(DecodingKey::from_rsa_components(&jwk.n, &jwk.e)?)
}
