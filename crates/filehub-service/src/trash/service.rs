//! Listing and emptying the trash.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use filehub_core::error::ErrorKind;
use filehub_core::events::{ActivityAction, ActivityTarget};
use filehub_core::result::AppResult;
use filehub_database::repositories::{FileRepository, FolderRepository};
use filehub_entity::file::File;
use filehub_entity::folder::Folder;

use crate::activity::ActivityRecorder;
use crate::context::RequestContext;
use crate::file::purge::{PurgeReport, Purger};
use crate::quota::QuotaAccountant;

/// Soft-deleted items of one user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrashListing {
    /// Trashed folders, most recently deleted first.
    pub folders: Vec<Folder>,
    /// Trashed files, most recently deleted first.
    pub files: Vec<File>,
}

impl TrashListing {
    /// Whether the trash holds nothing.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }
}

/// Lists and empties the caller's trash.
#[derive(Debug, Clone)]
pub struct TrashService {
    folders: Arc<dyn FolderRepository>,
    files: Arc<dyn FileRepository>,
    accountant: Arc<QuotaAccountant>,
    purger: Arc<Purger>,
    activity: ActivityRecorder,
}

impl TrashService {
    /// Creates a new trash service.
    pub fn new(
        folders: Arc<dyn FolderRepository>,
        files: Arc<dyn FileRepository>,
        accountant: Arc<QuotaAccountant>,
        purger: Arc<Purger>,
        activity: ActivityRecorder,
    ) -> Self {
        Self {
            folders,
            files,
            accountant,
            purger,
            activity,
        }
    }

    /// The caller's trashed items.
    pub async fn list(&self, ctx: &RequestContext) -> AppResult<TrashListing> {
        Ok(TrashListing {
            folders: self.folders.find_trashed(ctx.user_id).await?,
            files: self.files.find_trashed(ctx.user_id).await?,
        })
    }

    /// Permanently deletes everything in the caller's trash.
    ///
    /// Trashed folders that still hold live items are left in place.
    pub async fn empty(&self, ctx: &RequestContext) -> AppResult<PurgeReport> {
        let _guard = self.accountant.lock(ctx.user_id).await;

        let trashed = self.folders.find_trashed(ctx.user_id).await?;
        let trashed_ids: HashSet<Uuid> = trashed.iter().map(|f| f.id).collect();

        let mut report = PurgeReport::default();
        // Purging the topmost trashed folders takes their trashed descendants along.
        for folder in trashed
            .iter()
            .filter(|f| !f.parent_id.is_some_and(|p| trashed_ids.contains(&p)))
        {
            match self.purger.purge_folder_tree(folder).await {
                Ok(purged) => report.merge(purged),
                Err(e) if e.is(ErrorKind::Conflict) => {
                    warn!(
                        user_id = %ctx.user_id,
                        folder_id = %folder.id,
                        error = %e,
                        "Skipping trashed folder that holds live items"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        let loose_files = self.files.find_trashed(ctx.user_id).await?;
        report.merge(self.purger.purge_files(&loose_files).await?);

        info!(
            user_id = %ctx.user_id,
            folders = report.folders_removed,
            files = report.files_removed,
            failed = report.failed_objects.len(),
            "Trash emptied"
        );
        self.activity
            .record(
                ctx,
                ActivityAction::TrashEmpty,
                ActivityTarget::Many,
                json!({
                    "folders": report.folders_removed,
                    "files": report.files_removed,
                    "failed_objects": report.failed_objects,
                }),
            )
            .await;
        Ok(report)
    }
}
