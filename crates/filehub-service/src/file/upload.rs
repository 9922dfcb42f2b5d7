//! Uploads: create-or-version of a single file, and multi-file uploads
//! carrying relative paths.
//!
//! Bytes are written to storage before any row is touched; if the row
//! write fails the object is deleted again. The quota check and the row
//! write run under the owner's accounting lock.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use filehub_core::error::{AppError, ErrorKind};
use filehub_core::events::ActivityAction;
use filehub_core::result::AppResult;
use filehub_database::repositories::FileRepository;
use filehub_entity::file::{CreateFile, File, FileVersion, VersionContent};
use filehub_entity::name::{split_relative_path, validate_name};
use filehub_storage::StorageManager;
use filehub_storage::keys::{content_type_for, object_key};

use crate::activity::ActivityRecorder;
use crate::context::RequestContext;
use crate::folder::FolderService;
use crate::quota::QuotaAccountant;

/// A single upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Target folder; the caller's root level when `None`.
    pub folder_id: Option<Uuid>,
    /// File name.
    pub name: String,
    /// File content.
    pub data: Bytes,
}

/// Result of a single upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOutcome {
    /// The file after the upload.
    pub file: File,
    /// The version the upload created.
    pub version: FileVersion,
    /// Whether the upload created a new logical file.
    pub created: bool,
}

/// One entry of a multi-file upload.
#[derive(Debug, Clone)]
pub struct PathUpload {
    /// Path relative to the upload base, e.g. `docs/2024/report.pdf`.
    pub relative_path: String,
    /// File content.
    pub data: Bytes,
}

/// A stored entry of a multi-file upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedPath {
    /// The relative path as given.
    pub path: String,
    /// File it was stored as.
    pub file_id: Uuid,
    /// Version created.
    pub version_id: Uuid,
    /// Version number.
    pub version: i32,
}

/// A failed entry of a multi-file upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedPath {
    /// The relative path as given.
    pub path: String,
    /// Error category.
    pub kind: ErrorKind,
    /// Error message.
    pub message: String,
}

/// Per-entry results of a multi-file upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultiUploadResult {
    /// Stored entries.
    pub successes: Vec<UploadedPath>,
    /// Failed entries.
    pub errors: Vec<FailedPath>,
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Handles uploads.
#[derive(Debug, Clone)]
pub struct UploadService {
    files: Arc<dyn FileRepository>,
    folder_service: Arc<FolderService>,
    storage: Arc<StorageManager>,
    accountant: Arc<QuotaAccountant>,
    activity: ActivityRecorder,
}

impl UploadService {
    /// Creates a new upload service.
    pub fn new(
        files: Arc<dyn FileRepository>,
        folder_service: Arc<FolderService>,
        storage: Arc<StorageManager>,
        accountant: Arc<QuotaAccountant>,
        activity: ActivityRecorder,
    ) -> Self {
        Self {
            files,
            folder_service,
            storage,
            accountant,
            activity,
        }
    }

    /// Uploads a file, or a new version when a live file of that name exists.
    pub async fn upload(&self, ctx: &RequestContext, req: UploadRequest) -> AppResult<UploadOutcome> {
        let name = validate_name(&req.name)?;

        // Root level of the caller, or a folder the caller can write into.
        let (owner_id, folder_id) = match req.folder_id {
            Some(id) => {
                let folder = self.folder_service.writable_folder(ctx, Some(id)).await?;
                // Files directly in a root folder live at the root level.
                (folder.owner_id, (!folder.is_root()).then_some(folder.id))
            }
            None => (ctx.user_id, None),
        };

        self.store(ctx, owner_id, folder_id, name, req.data).await
    }

    /// Uploads many files, creating the folders named in their paths.
    ///
    /// Entries are processed independently.
    pub async fn upload_with_paths(
        &self,
        ctx: &RequestContext,
        base_folder: Option<Uuid>,
        entries: Vec<PathUpload>,
    ) -> MultiUploadResult {
        let mut result = MultiUploadResult::default();
        for entry in entries {
            match self.upload_path(ctx, base_folder, &entry.relative_path, entry.data).await {
                Ok(outcome) => result.successes.push(UploadedPath {
                    path: entry.relative_path,
                    file_id: outcome.file.id,
                    version_id: outcome.version.id,
                    version: outcome.version.version,
                }),
                Err(e) => result.errors.push(FailedPath {
                    path: entry.relative_path,
                    kind: e.kind,
                    message: e.message,
                }),
            }
        }
        info!(
            user_id = %ctx.user_id,
            stored = result.successes.len(),
            failed = result.errors.len(),
            "Multi-file upload finished"
        );
        result
    }

    async fn upload_path(
        &self,
        ctx: &RequestContext,
        base_folder: Option<Uuid>,
        relative_path: &str,
        data: Bytes,
    ) -> AppResult<UploadOutcome> {
        let mut segments = split_relative_path(relative_path)?;
        let name = segments
            .pop()
            .ok_or_else(|| AppError::validation("Upload path has no file name"))?;

        let folder_id = if segments.is_empty() {
            base_folder
        } else {
            let dir = segments.join("/");
            Some(self.folder_service.ensure_path(ctx, &dir, base_folder).await?.id)
        };

        self.upload(
            ctx,
            UploadRequest {
                folder_id,
                name,
                data,
            },
        )
        .await
    }

    async fn store(
        &self,
        ctx: &RequestContext,
        owner_id: Uuid,
        folder_id: Option<Uuid>,
        name: String,
        data: Bytes,
    ) -> AppResult<UploadOutcome> {
        let size = i64::try_from(data.len())
            .map_err(|_| AppError::validation("Upload is too large"))?;

        let _guard = self.accountant.lock(owner_id).await;
        // The folder may have been trashed while this upload waited for the lock.
        if let Some(id) = folder_id {
            self.folder_service.live_folder(id).await?;
        }

        let existing = self.files.find_live_by_name(owner_id, folder_id, &name).await?;
        let replaced = existing.as_ref().map_or(0, |f| f.size_bytes);
        self.accountant.assert_within_quota(owner_id, size, replaced).await?;

        let file_id = existing.as_ref().map_or_else(Uuid::new_v4, |f| f.id);
        let version_id = Uuid::now_v7();
        let content = VersionContent {
            version_id,
            storage_key: object_key(owner_id, file_id, version_id, &name),
            size_bytes: size,
            checksum_sha256: sha256_hex(&data),
        };

        self.storage
            .put(&content.storage_key, data, Some(&content_type_for(&name)))
            .await?;

        let written = match existing {
            Some(file) => self
                .files
                .append_version(file.id, &content)
                .await
                .map(|(f, v)| (f, v, false)),
            None => self.create_or_append(owner_id, folder_id, file_id, &name, &content).await,
        };

        let (file, version, created) = match written {
            Ok(w) => w,
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&content.storage_key).await {
                    warn!(
                        key = %content.storage_key,
                        error = %cleanup,
                        "Failed to remove object of aborted upload"
                    );
                }
                return Err(e);
            }
        };

        info!(
            user_id = %ctx.user_id,
            file_id = %file.id,
            version = version.version,
            size = size,
            created = created,
            "Upload completed"
        );
        self.activity
            .file(
                ctx,
                ActivityAction::FileUpload,
                file.id,
                json!({
                    "name": file.name,
                    "size": size,
                    "version": version.version,
                    "folder_id": file.folder_id,
                }),
            )
            .await;

        Ok(UploadOutcome {
            file,
            version,
            created,
        })
    }

    /// Creates the file; a concurrent creator of the same name turns this
    /// upload into a new version of the winner's file.
    async fn create_or_append(
        &self,
        owner_id: Uuid,
        folder_id: Option<Uuid>,
        file_id: Uuid,
        name: &str,
        content: &VersionContent,
    ) -> AppResult<(File, FileVersion, bool)> {
        let created = self
            .files
            .create_with_version(
                &CreateFile {
                    id: file_id,
                    owner_id,
                    folder_id,
                    name: name.to_string(),
                },
                content,
            )
            .await;

        match created {
            Ok((file, version)) => Ok((file, version, true)),
            Err(e) if e.is(ErrorKind::Conflict) => {
                let winner = self
                    .files
                    .find_live_by_name(owner_id, folder_id, name)
                    .await?
                    .ok_or(e)?;
                let (file, version) = self.files.append_version(winner.id, content).await?;
                Ok((file, version, false))
            }
            Err(e) => Err(e),
        }
    }
}
