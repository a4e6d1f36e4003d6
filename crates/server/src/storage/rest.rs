//! Object storage client.
//!
//! Talks to the storage backend's signing endpoint: a POST to
//! `storage/v1/object/sign/<bucket>/<path>` returns a relative signed URL
//! which is joined back onto the storage base.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use crate::config::StorageConfig;

use super::{ObjectStorage, StorageError};

/// Signing response from the storage backend.
#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

/// Storage backend client.
#[derive(Clone)]
pub struct RestStorage {
    client: Client,
    base_url: Url,
    service_key: SecretString,
}

impl std::fmt::Debug for RestStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStorage")
            .field("base_url", &self.base_url.as_str())
            .field("service_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl RestStorage {
    /// Create a client with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Request` if the HTTP client cannot be built.
    pub fn new(config: &StorageConfig, timeout: Duration) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            service_key: config.service_key.clone(),
        })
    }
}

#[async_trait]
impl ObjectStorage for RestStorage {
    #[instrument(skip(self), fields(bucket = %bucket))]
    async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        let endpoint = self
            .base_url
            .join(&format!("storage/v1/object/sign/{bucket}/{path}"))
            .map_err(|e| StorageError::Request(e.to_string()))?;

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(self.service_key.expose_secret())
            .json(&serde_json::json!({ "expiresIn": expires_in.as_secs() }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    StorageError::Timeout
                } else {
                    StorageError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Signing {
                status: status.as_u16(),
            });
        }

        let signed: SignResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Decode(e.to_string()))?;

        // The backend answers with a path relative to the storage root.
        let base = self.base_url.as_str().trim_end_matches('/');
        let relative = signed.signed_url.trim_start_matches('/');
        Ok(format!("{base}/storage/v1/{relative}"))
    }
}
