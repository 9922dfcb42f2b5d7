//! Folder entity model.

use chrono::{DateTime, Utc};
use filehub_core::AppResult;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::lifecycle::Lifecycle;

/// Name given to every user's root folder.
pub const ROOT_FOLDER_NAME: &str = "root";

/// A folder in a user's tree.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: Uuid,
    /// The folder owner (owner of the whole tree).
    pub owner_id: Uuid,
    /// Parent folder ID (null only for the owner's root folder).
    pub parent_id: Option<Uuid>,
    /// Folder name, unique among live siblings.
    pub name: String,
    /// Active or in the trash.
    pub lifecycle: Lifecycle,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last renamed, moved, deleted or restored.
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Check if this is a root folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Whether the folder is visible outside the trash.
    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    /// Move into the trash.
    pub fn soft_delete(&mut self) -> AppResult<()> {
        self.lifecycle = self.lifecycle.soft_delete()?;
        Ok(())
    }

    /// Move out of the trash.
    pub fn restore(&mut self) -> AppResult<()> {
        self.lifecycle = self.lifecycle.restore()?;
        Ok(())
    }

    /// Mark as permanently removed.
    pub fn purge(&mut self) -> AppResult<()> {
        self.lifecycle = self.lifecycle.purge()?;
        Ok(())
    }
}

/// Data required to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// The folder owner.
    pub owner_id: Uuid,
    /// Parent folder (None for a root folder).
    pub parent_id: Option<Uuid>,
    /// Folder name.
    pub name: String,
}
