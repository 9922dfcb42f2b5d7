//! File entity model.

use chrono::{DateTime, Utc};
use filehub_core::AppResult;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::lifecycle::Lifecycle;

/// A file. Its content lives in the storage backend, one object per version.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Unique file identifier.
    pub id: Uuid,
    /// The file owner (owner of the tree it lives in).
    pub owner_id: Uuid,
    /// The containing folder. `None` means the owner's root level.
    pub folder_id: Option<Uuid>,
    /// The file name (including extension), unique among live siblings.
    pub name: String,
    /// Size of the current version in bytes.
    pub size_bytes: i64,
    /// Current version number (starts at 1).
    pub current_version: i32,
    /// Storage key of the current version.
    pub storage_key: String,
    /// SHA-256 checksum of the current version.
    pub checksum_sha256: String,
    /// Active or in the trash.
    pub lifecycle: Lifecycle,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
    /// When the file was last updated.
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.name)
    }

    /// Whether the file is visible outside the trash.
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

/// Lowercase extension of a file name, without the dot.
pub fn extension_of(name: &str) -> Option<String> {
    name.rsplit_once('.')
        .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
        .map(|(_, ext)| ext.to_lowercase())
}

/// Data required to create a new file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    /// Pre-allocated file ID (part of the storage key).
    pub id: Uuid,
    /// The file owner.
    pub owner_id: Uuid,
    /// The folder to place the file in (None for the root level).
    pub folder_id: Option<Uuid>,
    /// The file name.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.TXT").as_deref(), Some("txt"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_of(".bashrc"), None);
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of("trailing."), None);
    }
}
