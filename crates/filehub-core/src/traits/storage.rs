//! Storage adapter trait for pluggable object storage backends.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::AppResult;

/// Metadata about a stored object.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StorageObjectMeta {
    /// Object key within the provider.
    pub key: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// MIME type (if known).
    pub content_type: Option<String>,
    /// Last modified timestamp.
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

/// A byte stream type used for reading object contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// An opened object: its length and a stream over its bytes.
pub struct StorageObject {
    /// Object length in bytes, as reported by the backend.
    pub size_bytes: u64,
    /// The object contents.
    pub stream: ByteStream,
}

impl fmt::Debug for StorageObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageObject")
            .field("size_bytes", &self.size_bytes)
            .finish_non_exhaustive()
    }
}

/// Trait for object storage backends.
///
/// Implementations exist for the local filesystem, S3 and process memory.
/// Keys are opaque `/`-separated strings allocated by the caller.
///
/// `delete` is idempotent: deleting a missing key succeeds.
#[async_trait]
pub trait StorageProvider: Send + Sync + fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "s3").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Store `data` under `key`, replacing any previous object.
    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> AppResult<()>;

    /// Open the object at `key` for streaming.
    async fn get(&self, key: &str) -> AppResult<StorageObject>;

    /// Delete the object at `key`.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check whether an object exists at `key`.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Get metadata about the object at `key`.
    async fn head(&self, key: &str) -> AppResult<StorageObjectMeta>;
}
