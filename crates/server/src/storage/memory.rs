//! In-memory object storage for tests and local development.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{ObjectStorage, StorageError};

/// Deterministic [`ObjectStorage`] implementation.
///
/// Produces stable fake signed URLs and can be flipped into a failing mode
/// to exercise degradation paths.
#[derive(Default)]
pub struct MemoryStorage {
    denied: AtomicBool,
}

impl MemoryStorage {
    /// Create a storage stub that signs everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every signing request fail, simulating a backend denial.
    pub fn set_denied(&self, denied: bool) {
        self.denied.store(denied, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        if self.denied.load(Ordering::SeqCst) {
            return Err(StorageError::Signing { status: 403 });
        }
        Ok(format!(
            "memory://{bucket}/{path}?expires={}",
            expires_in.as_secs()
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signs_with_expiry() {
        let storage = MemoryStorage::new();
        let url = storage
            .signed_url("receipts", "a/b.png", Duration::from_secs(180))
            .await
            .unwrap();
        assert_eq!(url, "memory://receipts/a/b.png?expires=180");
    }

    #[tokio::test]
    async fn test_denied_mode_fails() {
        let storage = MemoryStorage::new();
        storage.set_denied(true);
        let err = storage
            .signed_url("receipts", "a/b.png", Duration::from_secs(180))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Signing { status: 403 }));
    }
}
