//! Application state shared across handlers.

use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::ServerConfig;
use crate::storage::{ObjectStorage, RestStorage, StorageError};
use crate::store::{CredentialStore, RestStore, StoreError};

/// Error constructing the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("datastore client: {0}")]
    Store(#[from] StoreError),
    #[error("storage client: {0}")]
    Storage(#[from] StorageError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Everything inside is read-only after
/// startup: the signing key is initialized once and never rotated, and the
/// remote clients hold no mutable state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    tokens: TokenService,
    store: Arc<dyn CredentialStore>,
    storage: Arc<dyn ObjectStorage>,
}

impl AppState {
    /// Create the production state: REST clients against the configured
    /// datastore and storage backends.
    ///
    /// # Errors
    ///
    /// Returns an error if either HTTP client cannot be built.
    pub fn new(config: ServerConfig) -> Result<Self, StateError> {
        let store = RestStore::new(&config.datastore, config.upstream_timeout)?;
        let storage = RestStorage::new(&config.storage, config.upstream_timeout)?;
        Ok(Self::from_parts(config, Arc::new(store), Arc::new(storage)))
    }

    /// Assemble state from explicit parts. Used by tests to inject the
    /// in-memory store and storage.
    #[must_use]
    pub fn from_parts(
        config: ServerConfig,
        store: Arc<dyn CredentialStore>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        let tokens = TokenService::new(&config.session_secret);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                tokens,
                store,
                storage,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get a reference to the credential store.
    #[must_use]
    pub fn store(&self) -> &dyn CredentialStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the object storage backend.
    #[must_use]
    pub fn storage(&self) -> &dyn ObjectStorage {
        self.inner.storage.as_ref()
    }
}
