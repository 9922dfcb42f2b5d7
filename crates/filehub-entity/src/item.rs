//! Item type discriminator shared by shares, batches and activity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether an item is a file or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "item_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// A file.
    File,
    /// A folder.
    Folder,
}

impl ItemType {
    /// Return the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed reference to a file or folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    /// File or folder.
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// The item ID.
    pub id: Uuid,
}

impl ItemRef {
    /// Reference a file.
    pub fn file(id: Uuid) -> Self {
        Self {
            item_type: ItemType::File,
            id,
        }
    }

    /// Reference a folder.
    pub fn folder(id: Uuid) -> Self {
        Self {
            item_type: ItemType::Folder,
            id,
        }
    }
}
