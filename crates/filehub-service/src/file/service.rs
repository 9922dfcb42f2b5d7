//! File metadata and lifecycle operations with permission checks.

use std::sync::Arc;

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use filehub_auth::acl::SharePermissionResolver;
use filehub_core::error::AppError;
use filehub_core::events::ActivityAction;
use filehub_core::result::AppResult;
use filehub_database::repositories::{FileRepository, FolderRepository};
use filehub_entity::file::File;
use filehub_entity::lifecycle::Lifecycle;
use filehub_entity::name::validate_name;
use filehub_entity::share::SharePermission;

use crate::activity::ActivityRecorder;
use crate::context::RequestContext;
use crate::file::purge::{PurgeReport, Purger};
use crate::lookup;
use crate::quota::QuotaAccountant;

/// Manages file rename, move, trash and purge.
#[derive(Debug, Clone)]
pub struct FileService {
    /// File repository.
    files: Arc<dyn FileRepository>,
    /// Folder repository.
    folders: Arc<dyn FolderRepository>,
    /// Permission resolver.
    resolver: Arc<SharePermissionResolver>,
    /// Quota checks on restore.
    accountant: Arc<QuotaAccountant>,
    /// Permanent deletion.
    purger: Arc<Purger>,
    /// Activity sink.
    activity: ActivityRecorder,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(
        files: Arc<dyn FileRepository>,
        folders: Arc<dyn FolderRepository>,
        resolver: Arc<SharePermissionResolver>,
        accountant: Arc<QuotaAccountant>,
        purger: Arc<Purger>,
        activity: ActivityRecorder,
    ) -> Self {
        Self {
            files,
            folders,
            resolver,
            accountant,
            purger,
            activity,
        }
    }

    /// Gets a live file the caller can view.
    pub async fn get_file(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<File> {
        let file = lookup::live_file(self.files.as_ref(), file_id).await?;
        self.resolver
            .require_file(&file, ctx.user_id, SharePermission::View)
            .await?;
        Ok(file)
    }

    /// Renames a file.
    pub async fn rename_file(&self, ctx: &RequestContext, file_id: Uuid, new_name: &str) -> AppResult<File> {
        let new_name = validate_name(new_name)?;
        let file = lookup::live_file(self.files.as_ref(), file_id).await?;
        self.resolver
            .require_file(&file, ctx.user_id, SharePermission::Edit)
            .await?;

        if file.name == new_name {
            return Ok(file);
        }
        if self
            .files
            .find_live_by_name(file.owner_id, file.folder_id, &new_name)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "A file named '{new_name}' already exists here"
            )));
        }

        let renamed = self.files.rename(file_id, &new_name).await?;
        info!(
            user_id = %ctx.user_id,
            file_id = %file_id,
            new_name = %new_name,
            "File renamed"
        );
        self.activity
            .file(
                ctx,
                ActivityAction::FileRename,
                file_id,
                json!({ "from": file.name, "to": renamed.name }),
            )
            .await;
        Ok(renamed)
    }

    /// Moves a file into `destination` (the owner's root level when `None`).
    pub async fn move_file(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        destination: Option<Uuid>,
    ) -> AppResult<File> {
        let file = lookup::live_file(self.files.as_ref(), file_id).await?;
        self.resolver
            .require_file(&file, ctx.user_id, SharePermission::Edit)
            .await?;

        let target = match destination {
            Some(id) => lookup::live_folder(self.folders.as_ref(), id).await?,
            None => lookup::root_folder(self.folders.as_ref(), file.owner_id).await?,
        };
        self.resolver
            .require_folder(&target, ctx.user_id, SharePermission::Edit)
            .await?;
        if target.owner_id != file.owner_id {
            return Err(AppError::validation(
                "Items cannot be moved between different owners",
            ));
        }
        let destination = (!target.is_root()).then_some(target.id);
        if file.folder_id == destination {
            return Ok(file);
        }

        // The tree may have changed while the checks above ran.
        let _guard = self.accountant.lock(file.owner_id).await;
        let file = lookup::live_file(self.files.as_ref(), file_id).await?;
        lookup::live_folder(self.folders.as_ref(), target.id).await?;

        if self
            .files
            .find_live_by_name(file.owner_id, destination, &file.name)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "A file named '{}' already exists in the destination",
                file.name
            )));
        }

        let moved = self.files.relocate(file_id, destination).await?;
        info!(
            user_id = %ctx.user_id,
            file_id = %file_id,
            folder_id = ?destination,
            "File moved"
        );
        self.activity
            .file(
                ctx,
                ActivityAction::FileMove,
                file_id,
                json!({ "from": file.folder_id, "to": destination }),
            )
            .await;
        Ok(moved)
    }

    /// Moves a file to the trash.
    pub async fn delete_file(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<File> {
        let mut file = lookup::file(self.files.as_ref(), file_id).await?;
        file.lifecycle.soft_delete()?;
        self.resolver
            .require_file(&file, ctx.user_id, SharePermission::Edit)
            .await?;

        let _guard = self.accountant.lock(file.owner_id).await;
        self.files.set_lifecycle(&[file_id], Lifecycle::Deleted).await?;
        file.soft_delete()?;

        info!(
            user_id = %ctx.user_id,
            file_id = %file_id,
            size = file.size_bytes,
            "File moved to trash"
        );
        self.activity
            .file(ctx, ActivityAction::FileDelete, file_id, json!({ "name": file.name }))
            .await;
        Ok(file)
    }

    /// Restores a trashed file, re-checking the owner's quota.
    pub async fn restore_file(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<File> {
        let file = lookup::file(self.files.as_ref(), file_id).await?;
        file.lifecycle.restore()?;
        self.resolver
            .require_file(&file, ctx.user_id, SharePermission::Edit)
            .await?;

        let _guard = self.accountant.lock(file.owner_id).await;
        let mut file = lookup::file(self.files.as_ref(), file_id).await?;
        file.lifecycle.restore()?;
        if let Some(folder_id) = file.folder_id {
            let folder = lookup::folder(self.folders.as_ref(), folder_id).await?;
            if !folder.is_active() {
                return Err(AppError::conflict(format!(
                    "Restore the folder '{}' first",
                    folder.name
                )));
            }
        }
        self.accountant
            .assert_within_quota(file.owner_id, file.size_bytes, 0)
            .await?;
        if self
            .files
            .find_live_by_name(file.owner_id, file.folder_id, &file.name)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "A live file named '{}' already exists in its folder",
                file.name
            )));
        }
        self.files.set_lifecycle(&[file_id], Lifecycle::Active).await?;
        file.restore()?;

        info!(
            user_id = %ctx.user_id,
            file_id = %file_id,
            size = file.size_bytes,
            "File restored"
        );
        self.activity
            .file(ctx, ActivityAction::FileRestore, file_id, json!({ "name": file.name }))
            .await;
        Ok(file)
    }

    /// Permanently deletes a file with all of its versions.
    ///
    /// Only the owner may purge.
    pub async fn purge_file(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<PurgeReport> {
        let file = lookup::file(self.files.as_ref(), file_id).await?;
        file.lifecycle.purge()?;
        if file.owner_id != ctx.user_id {
            return Err(AppError::forbidden("Only the owner can permanently delete a file"));
        }

        let _guard = self.accountant.lock(file.owner_id).await;
        let report = self.purger.purge_files(std::slice::from_ref(&file)).await?;

        self.activity
            .file(
                ctx,
                ActivityAction::FilePurge,
                file_id,
                json!({ "name": file.name, "failed_objects": report.failed_objects }),
            )
            .await;
        Ok(report)
    }
}
