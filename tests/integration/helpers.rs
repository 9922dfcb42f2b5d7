//! Shared test helpers for integration tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;

use filehub_core::config::QuotaConfig;
use filehub_core::error::AppError;
use filehub_core::events::{ActivityAction, ActivityEvent};
use filehub_core::result::AppResult;
use filehub_core::traits::{ActivityLogger, StorageObject, StorageObjectMeta, StorageProvider};
use filehub_database::repositories::Repositories;
use filehub_entity::folder::Folder;
use filehub_entity::user::User;
use filehub_service::file::{UploadOutcome, UploadRequest};
use filehub_service::user::CreateAccountRequest;
use filehub_service::{RequestContext, Services};
use filehub_storage::StorageManager;
use filehub_storage::providers::MemoryStorageProvider;
use uuid::Uuid;

/// Collects every activity event.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    events: Mutex<Vec<ActivityEvent>>,
}

impl RecordingLogger {
    /// Actions recorded so far, in order.
    pub fn actions(&self) -> Vec<ActivityAction> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.action)
            .collect()
    }
}

#[async_trait]
impl ActivityLogger for RecordingLogger {
    async fn record(&self, event: ActivityEvent) -> AppResult<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Memory storage with switchable failures: deletes of keys containing a
/// marker, and every put.
#[derive(Debug, Clone)]
pub struct FlakyProvider {
    pub inner: MemoryStorageProvider,
    pub fail_marker: Arc<Mutex<Option<String>>>,
    pub fail_puts: Arc<AtomicBool>,
}

impl FlakyProvider {
    pub fn new(inner: MemoryStorageProvider) -> Self {
        Self {
            inner,
            fail_marker: Arc::new(Mutex::new(None)),
            fail_puts: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Makes every put fail until switched back.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Makes deletes of keys containing `marker` fail.
    pub fn fail_deletes_of(&self, marker: &str) {
        *self.fail_marker.lock().unwrap() = Some(marker.to_string());
    }
}

#[async_trait]
impl StorageProvider for FlakyProvider {
    fn provider_type(&self) -> &str {
        "flaky"
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> AppResult<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(AppError::storage(format!("put of {key} refused")));
        }
        self.inner.put(key, data, content_type).await
    }

    async fn get(&self, key: &str) -> AppResult<StorageObject> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let marker = self.fail_marker.lock().unwrap().clone();
        if marker.is_some_and(|m| key.contains(&m)) {
            return Err(AppError::storage(format!("delete of {key} refused")));
        }
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key).await
    }

    async fn head(&self, key: &str) -> AppResult<StorageObjectMeta> {
        self.inner.head(key).await
    }
}

/// A service container over in-memory collaborators.
pub struct TestEnv {
    pub services: Services,
    pub objects: MemoryStorageProvider,
    pub storage: FlakyProvider,
    pub activity: Arc<RecordingLogger>,
}

impl TestEnv {
    pub fn new() -> Self {
        let objects = MemoryStorageProvider::new();
        let storage = FlakyProvider::new(objects.clone());
        let manager = StorageManager::new(
            Arc::new(storage.clone()),
            Duration::from_secs(5),
            Duration::from_secs(5),
        );
        let activity = Arc::new(RecordingLogger::default());
        let services = Services::new(
            Repositories::in_memory(),
            Arc::new(manager),
            activity.clone(),
            QuotaConfig::default(),
        );
        Self {
            services,
            objects,
            storage,
            activity,
        }
    }

    /// Creates an account and returns it with a request context.
    pub async fn user(&self, email: &str, quota: i64) -> (User, RequestContext) {
        let user = self
            .services
            .users
            .create_account(CreateAccountRequest {
                email: email.to_string(),
                storage_quota_bytes: Some(quota),
            })
            .await
            .unwrap();
        let ctx = RequestContext::new(user.id);
        (user, ctx)
    }

    pub async fn root(&self, user_id: Uuid) -> Folder {
        self.services.users.ensure_root(user_id).await.unwrap()
    }

    pub async fn folder(&self, ctx: &RequestContext, name: &str, parent: Option<Uuid>) -> Folder {
        self.services
            .folders
            .create_folder(ctx, name, parent)
            .await
            .unwrap()
    }

    pub async fn try_upload(
        &self,
        ctx: &RequestContext,
        folder_id: Option<Uuid>,
        name: &str,
        data: &[u8],
    ) -> AppResult<UploadOutcome> {
        self.services
            .uploads
            .upload(
                ctx,
                UploadRequest {
                    folder_id,
                    name: name.to_string(),
                    data: Bytes::copy_from_slice(data),
                },
            )
            .await
    }

    pub async fn upload(
        &self,
        ctx: &RequestContext,
        folder_id: Option<Uuid>,
        name: &str,
        data: &[u8],
    ) -> UploadOutcome {
        self.try_upload(ctx, folder_id, name, data).await.unwrap()
    }

    pub async fn used(&self, user_id: Uuid) -> i64 {
        self.services.users.usage(user_id).await.unwrap().used_bytes
    }
}

/// Drains a byte stream into one buffer.
pub async fn collect<S, E>(mut stream: S) -> Vec<u8>
where
    S: futures::Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Debug,
{
    let mut out = Vec::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk.unwrap());
    }
    out
}
