//! Activity records describing what a user did to which item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of activity performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    FileUpload,
    FileDownload,
    FileDelete,
    FileRestore,
    FilePurge,
    FileRename,
    FileMove,
    FolderCreate,
    FolderDelete,
    FolderRestore,
    FolderPurge,
    FolderRename,
    FolderMove,
    FolderDownload,
    ShareCreate,
    ShareRevoke,
    BatchDelete,
    BatchMove,
    BatchRestore,
    TrashEmpty,
}

impl ActivityAction {
    /// Stable string form used in log output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileUpload => "file_upload",
            Self::FileDownload => "file_download",
            Self::FileDelete => "file_delete",
            Self::FileRestore => "file_restore",
            Self::FilePurge => "file_purge",
            Self::FileRename => "file_rename",
            Self::FileMove => "file_move",
            Self::FolderCreate => "folder_create",
            Self::FolderDelete => "folder_delete",
            Self::FolderRestore => "folder_restore",
            Self::FolderPurge => "folder_purge",
            Self::FolderRename => "folder_rename",
            Self::FolderMove => "folder_move",
            Self::FolderDownload => "folder_download",
            Self::ShareCreate => "share_create",
            Self::ShareRevoke => "share_revoke",
            Self::BatchDelete => "batch_delete",
            Self::BatchMove => "batch_move",
            Self::BatchRestore => "batch_restore",
            Self::TrashEmpty => "trash_empty",
        }
    }
}

impl std::fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an activity was performed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ActivityTarget {
    /// A single file.
    File(Uuid),
    /// A single folder.
    Folder(Uuid),
    /// A share grant.
    Share(Uuid),
    /// Several items at once (batch operations, trash).
    Many,
}

/// One activity record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// The acting user.
    pub user_id: Uuid,
    /// What was done.
    pub action: ActivityAction,
    /// What it was done to.
    pub target: ActivityTarget,
    /// Free-form details (names, sizes, counts).
    pub details: serde_json::Value,
    /// Client IP address, when the caller supplied one.
    pub ip_address: Option<String>,
    /// Client user agent, when the caller supplied one.
    pub user_agent: Option<String>,
    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,
}

impl ActivityEvent {
    /// Create an event with empty details and no client metadata.
    pub fn new(user_id: Uuid, action: ActivityAction, target: ActivityTarget) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            action,
            target,
            details: serde_json::Value::Null,
            ip_address: None,
            user_agent: None,
            occurred_at: Utc::now(),
        }
    }

    /// Attach details to the event.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}
