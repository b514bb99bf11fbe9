//! Blob store abstraction and implementation.
//!
//! S3-compatible object semantics over an arbitrary endpoint (MinIO in
//! development, any S3-compatible provider in production). Object keys are
//! forward-slash-delimited paths, UUID-prefixed by callers so overwrites are
//! never possible; content-type is advisory metadata only.

pub mod minio;

use std::time::Duration;

use crate::error::BlobError;

/// Trait abstracting blob store operations.
///
/// The trait is object-safe for use as `Box<dyn BlobStore>`.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload `bytes` under `key`, creating the bucket first if absent.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), BlobError>;

    /// Fetch the bytes stored under `key`.
    ///
    /// Returns [`BlobError::NotFound`] if no object exists at `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, BlobError>;

    /// Delete the object at `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), BlobError>;

    /// Check whether an object exists at `key`.
    async fn exists(&self, key: &str) -> Result<bool, BlobError>;

    /// Produce a time-limited, pre-signed GET URL for `key`, valid for `ttl`.
    fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, BlobError>;
}
