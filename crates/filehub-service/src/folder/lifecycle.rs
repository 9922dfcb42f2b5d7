//! Recursive soft-delete, restore and purge of folder subtrees.
//!
//! A restore re-checks the owner's quota for the aggregate size of every
//! file it brings back, under the owner's accounting lock, and either
//! restores the whole subtree or nothing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use filehub_auth::acl::SharePermissionResolver;
use filehub_core::error::AppError;
use filehub_core::events::ActivityAction;
use filehub_core::result::AppResult;
use filehub_database::repositories::{FileRepository, FolderRepository};
use filehub_entity::lifecycle::Lifecycle;
use filehub_entity::share::SharePermission;

use crate::activity::ActivityRecorder;
use crate::context::RequestContext;
use crate::file::purge::{PurgeReport, Purger};
use crate::lookup;
use crate::quota::QuotaAccountant;

/// What a subtree delete or restore touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtreeSummary {
    /// Folders whose state changed, the target included.
    pub folders: u64,
    /// Files whose state changed.
    pub files: u64,
    /// Total size of the affected files.
    pub size_bytes: i64,
}

/// Soft-deletes, restores and purges folders with their contents.
#[derive(Debug, Clone)]
pub struct FolderLifecycleService {
    folders: Arc<dyn FolderRepository>,
    files: Arc<dyn FileRepository>,
    resolver: Arc<SharePermissionResolver>,
    accountant: Arc<QuotaAccountant>,
    purger: Arc<Purger>,
    activity: ActivityRecorder,
}

impl FolderLifecycleService {
    /// Creates a new folder lifecycle service.
    pub fn new(
        folders: Arc<dyn FolderRepository>,
        files: Arc<dyn FileRepository>,
        resolver: Arc<SharePermissionResolver>,
        accountant: Arc<QuotaAccountant>,
        purger: Arc<Purger>,
        activity: ActivityRecorder,
    ) -> Self {
        Self {
            folders,
            files,
            resolver,
            accountant,
            purger,
            activity,
        }
    }

    /// Moves a folder to the trash.
    ///
    /// Without `recursive` the folder must have no live subfolders or files.
    pub async fn delete_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        recursive: bool,
    ) -> AppResult<SubtreeSummary> {
        let folder = lookup::folder(self.folders.as_ref(), folder_id).await?;
        if folder.is_root() {
            return Err(AppError::validation("The root folder cannot be deleted"));
        }
        folder.lifecycle.soft_delete()?;
        self.resolver
            .require_folder(&folder, ctx.user_id, SharePermission::Edit)
            .await?;

        let _guard = self.accountant.lock(folder.owner_id).await;
        let folder = lookup::folder(self.folders.as_ref(), folder_id).await?;
        folder.lifecycle.soft_delete()?;

        if !recursive {
            let has_children = !self.folders.find_children(folder_id, false).await?.is_empty();
            let has_files = !self
                .files
                .find_in_folder(folder.owner_id, Some(folder_id), false)
                .await?
                .is_empty();
            if has_children || has_files {
                return Err(AppError::conflict(format!(
                    "Folder '{}' is not empty",
                    folder.name
                )));
            }
        }

        let folder_ids: Vec<Uuid> = self
            .folders
            .find_subtree(folder_id, false)
            .await?
            .into_iter()
            .map(|f| f.id)
            .collect();
        let files = self.files.find_in_folders(&folder_ids, false).await?;
        let file_ids: Vec<Uuid> = files.iter().map(|f| f.id).collect();

        let summary = SubtreeSummary {
            folders: folder_ids.len() as u64,
            files: files.len() as u64,
            size_bytes: files.iter().map(|f| f.size_bytes).sum(),
        };

        self.files.set_lifecycle(&file_ids, Lifecycle::Deleted).await?;
        self.folders.set_lifecycle(&folder_ids, Lifecycle::Deleted).await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder_id,
            folders = summary.folders,
            files = summary.files,
            bytes = summary.size_bytes,
            "Folder moved to trash"
        );
        self.activity
            .folder(
                ctx,
                ActivityAction::FolderDelete,
                folder_id,
                json!({ "name": folder.name, "folders": summary.folders, "files": summary.files }),
            )
            .await;
        Ok(summary)
    }

    /// Restores a trashed folder with its whole subtree.
    pub async fn restore_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
    ) -> AppResult<SubtreeSummary> {
        let folder = lookup::folder(self.folders.as_ref(), folder_id).await?;
        folder.lifecycle.restore()?;
        self.resolver
            .require_folder(&folder, ctx.user_id, SharePermission::Edit)
            .await?;

        let _guard = self.accountant.lock(folder.owner_id).await;
        let folder = lookup::folder(self.folders.as_ref(), folder_id).await?;
        folder.lifecycle.restore()?;
        if let Some(parent_id) = folder.parent_id {
            let parent = lookup::folder(self.folders.as_ref(), parent_id).await?;
            if !parent.is_active() {
                return Err(AppError::conflict(format!(
                    "Restore the parent folder '{}' first",
                    parent.name
                )));
            }
        }

        let subtree = self.folders.find_subtree(folder_id, true).await?;
        let all_ids: Vec<Uuid> = subtree.iter().map(|f| f.id).collect();
        let folder_ids: Vec<Uuid> = subtree
            .iter()
            .filter(|f| f.lifecycle.is_deleted())
            .map(|f| f.id)
            .collect();
        let files: Vec<_> = self
            .files
            .find_in_folders(&all_ids, true)
            .await?
            .into_iter()
            .filter(|f| f.lifecycle.is_deleted())
            .collect();
        let file_ids: Vec<Uuid> = files.iter().map(|f| f.id).collect();

        let summary = SubtreeSummary {
            folders: folder_ids.len() as u64,
            files: files.len() as u64,
            size_bytes: files.iter().map(|f| f.size_bytes).sum(),
        };

        self.accountant
            .assert_within_quota(folder.owner_id, summary.size_bytes, 0)
            .await?;

        // Each call is all-or-nothing; a folder clash undoes the file restore.
        self.files.set_lifecycle(&file_ids, Lifecycle::Active).await?;
        if let Err(e) = self.folders.set_lifecycle(&folder_ids, Lifecycle::Active).await {
            if let Err(undo) = self.files.set_lifecycle(&file_ids, Lifecycle::Deleted).await {
                warn!(
                    folder_id = %folder_id,
                    error = %undo,
                    "Failed to roll back file restore"
                );
            }
            return Err(e);
        }

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder_id,
            folders = summary.folders,
            files = summary.files,
            bytes = summary.size_bytes,
            "Folder restored"
        );
        self.activity
            .folder(
                ctx,
                ActivityAction::FolderRestore,
                folder_id,
                json!({ "name": folder.name, "folders": summary.folders, "files": summary.files }),
            )
            .await;
        Ok(summary)
    }

    /// Permanently deletes a folder and everything beneath it.
    ///
    /// Only the owner may purge.
    pub async fn purge_folder(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<PurgeReport> {
        let folder = lookup::folder(self.folders.as_ref(), folder_id).await?;
        if folder.is_root() {
            return Err(AppError::validation("The root folder cannot be deleted"));
        }
        folder.lifecycle.purge()?;
        if folder.owner_id != ctx.user_id {
            return Err(AppError::forbidden("Only the owner can permanently delete a folder"));
        }

        let _guard = self.accountant.lock(folder.owner_id).await;
        let report = self.purger.purge_folder_tree(&folder).await?;

        self.activity
            .folder(
                ctx,
                ActivityAction::FolderPurge,
                folder_id,
                json!({
                    "name": folder.name,
                    "folders": report.folders_removed,
                    "files": report.files_removed,
                    "failed_objects": report.failed_objects.len(),
                }),
            )
            .await;
        Ok(report)
    }
}
