//! Storage manager: the single entry point services use to reach object
//! storage. Every call is bounded by a timeout and download streams fail
//! when they stall.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use tracing::{info, warn};

use filehub_core::config::StorageConfig;
use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_core::traits::storage::{ByteStream, StorageObject, StorageObjectMeta, StorageProvider};

use crate::providers::{LocalStorageProvider, MemoryStorageProvider};

/// Timeout-guarded handle on the configured storage provider.
#[derive(Debug, Clone)]
pub struct StorageManager {
    provider: Arc<dyn StorageProvider>,
    operation_timeout: Duration,
    stream_idle_timeout: Duration,
}

impl StorageManager {
    /// Wrap a provider with the given timeouts.
    pub fn new(
        provider: Arc<dyn StorageProvider>,
        operation_timeout: Duration,
        stream_idle_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            operation_timeout,
            stream_idle_timeout,
        }
    }

    /// Build the provider named by `config.provider`.
    pub async fn from_config(config: &StorageConfig) -> AppResult<Self> {
        let provider: Arc<dyn StorageProvider> = match config.provider.as_str() {
            "local" => Arc::new(LocalStorageProvider::new(&config.local.root_path).await?),
            "memory" => Arc::new(MemoryStorageProvider::new()),
            #[cfg(feature = "s3")]
            "s3" => Arc::new(crate::providers::S3StorageProvider::new(&config.s3).await?),
            other => {
                return Err(AppError::configuration(format!(
                    "Unsupported storage provider '{other}'"
                )));
            }
        };
        info!(
            provider = provider.provider_type(),
            timeout_secs = config.operation_timeout_seconds,
            "Storage provider ready"
        );
        Ok(Self::new(
            provider,
            Duration::from_secs(config.operation_timeout_seconds),
            Duration::from_secs(config.stream_idle_timeout_seconds),
        ))
    }

    /// Name of the underlying provider.
    pub fn provider_type(&self) -> &str {
        self.provider.provider_type()
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        key: &str,
        fut: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(op, key, timeout = ?self.operation_timeout, "Storage call timed out");
                Err(AppError::timeout(format!(
                    "Storage {op} of '{key}' did not complete within {:?}",
                    self.operation_timeout
                )))
            }
        }
    }

    /// Check provider reachability.
    pub async fn health_check(&self) -> AppResult<bool> {
        self.bounded("health_check", "", self.provider.health_check())
            .await
    }

    /// Store an object.
    pub async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> AppResult<()> {
        self.bounded("put", key, self.provider.put(key, data, content_type))
            .await
    }

    /// Open an object for streaming.
    ///
    /// Opening is bounded by the operation timeout; afterwards each chunk
    /// must arrive within the idle timeout or the stream yields a
    /// `TimedOut` error and ends.
    pub async fn get(&self, key: &str) -> AppResult<StorageObject> {
        let object = self.bounded("get", key, self.provider.get(key)).await?;
        Ok(StorageObject {
            size_bytes: object.size_bytes,
            stream: idle_timeout(object.stream, self.stream_idle_timeout),
        })
    }

    /// Read a whole object into memory.
    pub async fn read_all(&self, key: &str) -> AppResult<Bytes> {
        let object = self.get(key).await?;
        let mut buf = Vec::with_capacity(usize::try_from(object.size_bytes).unwrap_or(0));
        let mut stream = object.stream;
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(Bytes::from(buf))
    }

    /// Delete an object. Missing objects are not an error.
    pub async fn delete(&self, key: &str) -> AppResult<()> {
        self.bounded("delete", key, self.provider.delete(key)).await
    }

    /// Check whether an object exists.
    pub async fn exists(&self, key: &str) -> AppResult<bool> {
        self.bounded("exists", key, self.provider.exists(key)).await
    }

    /// Fetch object metadata.
    pub async fn head(&self, key: &str) -> AppResult<StorageObjectMeta> {
        self.bounded("head", key, self.provider.head(key)).await
    }
}

fn idle_timeout(stream: ByteStream, idle: Duration) -> ByteStream {
    Box::pin(futures::stream::unfold(Some(stream), move |state| async move {
        let mut stream = state?;
        match tokio::time::timeout(idle, stream.next()).await {
            Ok(Some(item)) => Some((item, Some(stream))),
            Ok(None) => None,
            Err(_) => Some((
                Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("storage stream produced no data for {idle:?}"),
                )),
                None,
            )),
        }
    }))
}
