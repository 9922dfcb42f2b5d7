//! In-process storage provider.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_core::traits::storage::{StorageObject, StorageObjectMeta, StorageProvider};

/// Chunk size used when streaming an object back out.
const READ_CHUNK_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
    written_at: DateTime<Utc>,
}

/// Storage provider keeping every object in a concurrent map.
///
/// Clones share the same objects. Intended for tests and for running the
/// services without external infrastructure.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorageProvider {
    objects: Arc<DashMap<String, StoredObject>>,
}

impl MemoryStorageProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no objects are stored.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Every stored key, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl StorageProvider for MemoryStorageProvider {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> AppResult<()> {
        self.objects.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.map(str::to_string),
                written_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<StorageObject> {
        let data = self
            .objects
            .get(key)
            .map(|o| o.data.clone())
            .ok_or_else(|| AppError::not_found(format!("Object not found: {key}")))?;

        let mut chunks: Vec<Result<Bytes, std::io::Error>> = Vec::new();
        let mut rest = data.clone();
        while !rest.is_empty() {
            let take = rest.len().min(READ_CHUNK_BYTES);
            chunks.push(Ok(rest.split_to(take)));
        }
        Ok(StorageObject {
            size_bytes: data.len() as u64,
            stream: Box::pin(futures::stream::iter(chunks)),
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.objects.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.objects.contains_key(key))
    }

    async fn head(&self, key: &str) -> AppResult<StorageObjectMeta> {
        let object = self
            .objects
            .get(key)
            .ok_or_else(|| AppError::not_found(format!("Object not found: {key}")))?;
        Ok(StorageObjectMeta {
            key: key.to_string(),
            size_bytes: object.data.len() as u64,
            content_type: object.content_type.clone(),
            last_modified: Some(object.written_at),
        })
    }
}
