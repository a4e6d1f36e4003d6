//! CLI command implementations.

pub mod admin;
pub mod requests;

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use centerdesk_server::config::DatastoreConfig;
use centerdesk_server::store::{RestStore, StoreError};

/// Timeout for CLI datastore calls.
const CLI_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors shared by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Environment variable has an invalid value.
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(&'static str, String),

    /// Row API error.
    #[error("Datastore error: {0}")]
    Store(#[from] StoreError),

    /// Invalid command input.
    #[error("{0}")]
    InvalidInput(String),
}

/// Build a row API client from the environment.
pub(crate) fn store_from_env() -> Result<RestStore, CliError> {
    dotenvy::dotenv().ok();

    let base_url = std::env::var("DATASTORE_URL")
        .map_err(|_| CliError::MissingEnvVar("DATASTORE_URL"))?;
    let base_url = Url::parse(&base_url)
        .map_err(|e| CliError::InvalidEnvVar("DATASTORE_URL", e.to_string()))?;
    let service_key = std::env::var("DATASTORE_SERVICE_KEY")
        .map_err(|_| CliError::MissingEnvVar("DATASTORE_SERVICE_KEY"))?;

    let config = DatastoreConfig {
        base_url,
        service_key: SecretString::from(service_key),
    };

    Ok(RestStore::new(&config, CLI_TIMEOUT)?)
}
