//! Signed-asset access proxy.
//!
//! Stored media references point at private objects. Every render goes
//! through this module: [`resolve`] recognizes the stored URL shapes and
//! extracts the bucket and object path, and [`ObjectStorage::signed_url`]
//! exchanges them for a short-lived retrieval URL. References that match
//! neither shape are served as-is, so exposure is bounded by the signing
//! window for everything this proxy understands.

mod memory;
mod rest;

pub use memory::MemoryStorage;
pub use rest::RestStorage;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Default lifetime of a signed retrieval URL.
pub const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(180);

/// The two URL shapes a stored reference may use. The public shape predates
/// the move to private buckets; both layouts coexist in stored rows.
const PUBLIC_MARKER: &str = "/object/public/";
const AUTHENTICATED_MARKER: &str = "/object/authenticated/";

/// Failures of the object storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The request could not be sent or the connection failed.
    #[error("storage request failed: {0}")]
    Request(String),

    /// The backend denied or failed the signing request.
    #[error("storage signing denied: status {status}")]
    Signing { status: u16 },

    /// The response body could not be decoded.
    #[error("storage response could not be decoded: {0}")]
    Decode(String),

    /// The request exceeded the configured upstream timeout.
    #[error("storage request timed out")]
    Timeout,
}

/// A storage bucket and object path extracted from a stored reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub path: String,
}

/// Extract the bucket and object path from a stored media reference.
///
/// Recognizes the public shape `…/object/public/<bucket>/<path>` and the
/// private shape `…/object/authenticated/<bucket>/<path>`; the path is
/// URL-decoded. Returns `None` for anything else; the caller then uses the
/// value as-is rather than re-signing it.
#[must_use]
pub fn resolve(raw_url: &str) -> Option<ObjectRef> {
    // Private references may carry a stale signing token in the query.
    let without_query = match raw_url.split_once('?') {
        Some((before, _)) => before,
        None => raw_url,
    };

    let rest = without_query
        .split_once(PUBLIC_MARKER)
        .or_else(|| without_query.split_once(AUTHENTICATED_MARKER))
        .map(|(_, rest)| rest)?;

    let (bucket, path) = rest.split_once('/')?;
    if bucket.is_empty() || path.is_empty() {
        return None;
    }

    let path = urlencoding::decode(path).ok()?.into_owned();
    Some(ObjectRef {
        bucket: bucket.to_string(),
        path,
    })
}

/// Issues short-lived signed retrieval URLs for private objects.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Request a signed URL for `bucket`/`path` valid for `expires_in`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Signing`] when the backend denies the
    /// request; callers degrade to the raw stored URL rather than failing
    /// the whole page.
    async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_public_shape() {
        let resolved = resolve(
            "https://files.example.com/storage/v1/object/public/receipts/2024/photo.jpg",
        )
        .unwrap();
        assert_eq!(resolved.bucket, "receipts");
        assert_eq!(resolved.path, "2024/photo.jpg");
    }

    #[test]
    fn test_resolve_decodes_path() {
        let resolved = resolve(
            "https://files.example.com/storage/v1/object/public/receipts/front%20desk/photo.jpg",
        )
        .unwrap();
        assert_eq!(resolved.path, "front desk/photo.jpg");
    }

    #[test]
    fn test_resolve_authenticated_shape() {
        let resolved = resolve(
            "https://files.example.com/storage/v1/object/authenticated/receipts/a/b.png?token=stale",
        )
        .unwrap();
        assert_eq!(resolved.bucket, "receipts");
        assert_eq!(resolved.path, "a/b.png");
    }

    #[test]
    fn test_resolve_rejects_unknown_shapes() {
        assert!(resolve("https://cdn.example.com/images/photo.jpg").is_none());
        assert!(resolve("not a url at all").is_none());
        assert!(resolve("").is_none());
    }

    #[test]
    fn test_resolve_rejects_missing_path() {
        // A bucket with no object path is not a usable reference.
        assert!(
            resolve("https://files.example.com/storage/v1/object/public/receipts").is_none()
        );
        assert!(
            resolve("https://files.example.com/storage/v1/object/public/receipts/").is_none()
        );
    }
}
