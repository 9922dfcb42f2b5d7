//! File download service: streams file content after a view check.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use filehub_auth::acl::SharePermissionResolver;
use filehub_core::error::AppError;
use filehub_core::events::ActivityAction;
use filehub_core::result::AppResult;
use filehub_core::traits::ByteStream;
use filehub_database::repositories::{FileRepository, FileVersionRepository};
use filehub_entity::file::File;
use filehub_entity::share::SharePermission;
use filehub_storage::StorageManager;
use filehub_storage::keys::content_type_for;

use crate::activity::ActivityRecorder;
use crate::context::RequestContext;
use crate::lookup;

/// An open download.
pub struct FileDownload {
    /// File metadata.
    pub file: File,
    /// Version being served.
    pub version: i32,
    /// Declared length of the content.
    pub size_bytes: u64,
    /// MIME type for Content-Type header.
    pub content_type: String,
    /// Suggested filename for Content-Disposition.
    pub file_name: String,
    /// Content bytes.
    pub stream: ByteStream,
}

impl std::fmt::Debug for FileDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDownload")
            .field("file_id", &self.file.id)
            .field("version", &self.version)
            .field("size_bytes", &self.size_bytes)
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Handles file downloads with permission checking and streaming.
#[derive(Debug, Clone)]
pub struct DownloadService {
    files: Arc<dyn FileRepository>,
    versions: Arc<dyn FileVersionRepository>,
    storage: Arc<StorageManager>,
    resolver: Arc<SharePermissionResolver>,
    activity: ActivityRecorder,
}

impl DownloadService {
    /// Creates a new download service.
    pub fn new(
        files: Arc<dyn FileRepository>,
        versions: Arc<dyn FileVersionRepository>,
        storage: Arc<StorageManager>,
        resolver: Arc<SharePermissionResolver>,
        activity: ActivityRecorder,
    ) -> Self {
        Self {
            files,
            versions,
            storage,
            resolver,
            activity,
        }
    }

    async fn viewable(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<File> {
        let file = lookup::live_file(self.files.as_ref(), file_id).await?;
        self.resolver
            .require_file(&file, ctx.user_id, SharePermission::View)
            .await?;
        Ok(file)
    }

    /// Opens the current version of a live file.
    pub async fn download(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<FileDownload> {
        let file = self.viewable(ctx, file_id).await?;
        let key = file.storage_key.clone();
        let version = file.current_version;
        self.open(ctx, file, version, &key).await
    }

    /// Opens a specific historical version of a live file.
    pub async fn download_version(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        version: i32,
    ) -> AppResult<FileDownload> {
        let file = self.viewable(ctx, file_id).await?;
        let row = self
            .versions
            .find_version(file_id, version)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Version {version} of file {file_id} not found")))?;
        self.open(ctx, file, row.version, &row.storage_key).await
    }

    async fn open(&self, ctx: &RequestContext, file: File, version: i32, key: &str) -> AppResult<FileDownload> {
        let object = self.storage.get(key).await?;

        self.activity
            .file(
                ctx,
                ActivityAction::FileDownload,
                file.id,
                json!({ "name": file.name, "version": version }),
            )
            .await;

        Ok(FileDownload {
            content_type: content_type_for(&file.name),
            file_name: file.name.clone(),
            size_bytes: object.size_bytes,
            version,
            stream: object.stream,
            file,
        })
    }
}
