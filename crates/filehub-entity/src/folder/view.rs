//! Read models returned by folder listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::file::File;
use crate::folder::Folder;
use crate::quota::QuotaSnapshot;

/// A folder with the total size of its live subtree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderSummary {
    /// Folder ID.
    pub id: Uuid,
    /// Folder name.
    pub name: String,
    /// Parent folder ID.
    pub parent_id: Option<Uuid>,
    /// Owner of the folder.
    pub owner_id: Uuid,
    /// Sum of live file sizes anywhere under the folder.
    pub size_bytes: i64,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
}

impl FolderSummary {
    /// Summarize a folder with its computed subtree size.
    pub fn new(folder: &Folder, size_bytes: i64) -> Self {
        Self {
            id: folder.id,
            name: folder.name.clone(),
            parent_id: folder.parent_id,
            owner_id: folder.owner_id,
            size_bytes,
            created_at: folder.created_at,
        }
    }
}

/// A file as shown in a folder listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSummary {
    /// File ID.
    pub id: Uuid,
    /// File name.
    pub name: String,
    /// Size of the current version.
    pub size_bytes: i64,
    /// Current version number.
    pub current_version: i32,
    /// When the current version was written.
    pub updated_at: DateTime<Utc>,
}

impl From<&File> for FileSummary {
    fn from(file: &File) -> Self {
        Self {
            id: file.id,
            name: file.name.clone(),
            size_bytes: file.size_bytes,
            current_version: file.current_version,
            updated_at: file.updated_at,
        }
    }
}

/// Contents of one folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderView {
    /// The listed folder with its subtree size.
    pub folder: FolderSummary,
    /// Name of the parent folder (None at the root).
    pub parent_name: Option<String>,
    /// Live child folders with their subtree sizes.
    pub folders: Vec<FolderSummary>,
    /// Live files directly inside the folder.
    pub files: Vec<FileSummary>,
    /// The caller's own usage and quota.
    pub storage: QuotaSnapshot,
}

/// One step of a root-first path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// Folder ID.
    pub id: Uuid,
    /// Folder name.
    pub name: String,
}

impl From<&Folder> for Breadcrumb {
    fn from(folder: &Folder) -> Self {
        Self {
            id: folder.id,
            name: folder.name.clone(),
        }
    }
}
