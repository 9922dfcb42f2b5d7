//! Permanent deletion of files and folder subtrees.
//!
//! Storage objects are deleted first, best effort: a failed object delete
//! is logged and reported but never stops the rows from being removed.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_database::repositories::{
    FileRepository, FileVersionRepository, FolderRepository, ShareRepository,
};
use filehub_entity::file::File;
use filehub_entity::folder::Folder;
use filehub_entity::item::ItemType;
use filehub_storage::StorageManager;

/// Outcome of a permanent delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeReport {
    /// File rows removed.
    pub files_removed: u64,
    /// Folder rows removed.
    pub folders_removed: u64,
    /// Storage objects deleted.
    pub objects_removed: u64,
    /// Storage keys whose delete failed and that may still hold bytes.
    pub failed_objects: Vec<String>,
}

impl PurgeReport {
    /// Folds another report into this one.
    pub fn merge(&mut self, other: PurgeReport) {
        self.files_removed += other.files_removed;
        self.folders_removed += other.folders_removed;
        self.objects_removed += other.objects_removed;
        self.failed_objects.extend(other.failed_objects);
    }

    /// Whether every storage object was released.
    pub fn is_clean(&self) -> bool {
        self.failed_objects.is_empty()
    }
}

/// Removes rows and storage objects irrevocably.
#[derive(Debug, Clone)]
pub struct Purger {
    folders: Arc<dyn FolderRepository>,
    files: Arc<dyn FileRepository>,
    versions: Arc<dyn FileVersionRepository>,
    shares: Arc<dyn ShareRepository>,
    storage: Arc<StorageManager>,
}

impl Purger {
    /// Creates a new purger.
    pub fn new(
        folders: Arc<dyn FolderRepository>,
        files: Arc<dyn FileRepository>,
        versions: Arc<dyn FileVersionRepository>,
        shares: Arc<dyn ShareRepository>,
        storage: Arc<StorageManager>,
    ) -> Self {
        Self {
            folders,
            files,
            versions,
            shares,
            storage,
        }
    }

    /// Purges the given files with every version they hold.
    pub async fn purge_files(&self, files: &[File]) -> AppResult<PurgeReport> {
        let mut report = PurgeReport::default();
        if files.is_empty() {
            return Ok(report);
        }
        let ids: Vec<Uuid> = files.iter().map(|f| f.id).collect();

        let mut keys: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        let versions = self.versions.find_by_files(&ids).await?;
        let all_keys = versions
            .into_iter()
            .map(|v| v.storage_key)
            .chain(files.iter().map(|f| f.storage_key.clone()));
        for key in all_keys {
            if seen.insert(key.clone()) {
                keys.push(key);
            }
        }

        for key in keys {
            match self.storage.delete(&key).await {
                Ok(()) => report.objects_removed += 1,
                Err(e) => {
                    warn!(key = %key, error = %e, "Failed to delete storage object during purge");
                    report.failed_objects.push(key);
                }
            }
        }

        report.files_removed = self.files.delete_many(&ids).await?;
        self.shares.delete_for_items(ItemType::File, &ids).await?;

        info!(
            files = report.files_removed,
            objects = report.objects_removed,
            failed = report.failed_objects.len(),
            "Files purged"
        );
        Ok(report)
    }

    /// Purges `folder` and everything beneath it.
    ///
    /// A live folder takes its whole subtree along. A trashed folder that
    /// still holds live folders or files is refused with a conflict and
    /// nothing is removed.
    pub async fn purge_folder_tree(&self, folder: &Folder) -> AppResult<PurgeReport> {
        let subtree = self.folders.find_subtree(folder.id, true).await?;
        let ids: Vec<Uuid> = subtree.iter().map(|f| f.id).collect();

        let files = self.files.find_in_folders(&ids, true).await?;
        if !folder.is_active()
            && (subtree.iter().any(|f| f.is_active()) || files.iter().any(|f| f.is_active()))
        {
            return Err(AppError::conflict(format!(
                "Trashed folder '{}' still holds live items",
                folder.name
            )));
        }
        let mut report = self.purge_files(&files).await?;

        // Leaves first: BFS order reversed never removes a parent before its children.
        let leaves_first: Vec<Uuid> = ids.iter().rev().copied().collect();
        self.shares.delete_for_items(ItemType::Folder, &leaves_first).await?;
        report.folders_removed = self.folders.delete_many(&leaves_first).await?;

        info!(
            folder_id = %folder.id,
            folders = report.folders_removed,
            files = report.files_removed,
            "Folder tree purged"
        );
        Ok(report)
    }
}
