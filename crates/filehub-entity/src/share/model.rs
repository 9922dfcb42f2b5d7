//! Share entity model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::item::ItemType;

/// Permission level granted by a share.
///
/// Ordered by privilege: Edit > View.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "share_permission", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SharePermission {
    /// Read-only access.
    View,
    /// Read and modify.
    Edit,
}

impl SharePermission {
    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::Edit => 2,
            Self::View => 1,
        }
    }

    /// Check if this permission grants at least the given level.
    pub fn satisfies(&self, required: SharePermission) -> bool {
        self.privilege_level() >= required.privilege_level()
    }

    /// Return the permission as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
        }
    }
}

impl fmt::Display for SharePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SharePermission {
    type Err = filehub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "view" => Ok(Self::View),
            "edit" => Ok(Self::Edit),
            _ => Err(filehub_core::AppError::validation(format!(
                "Invalid share permission: '{s}'"
            ))),
        }
    }
}

/// A direct grant of access on one item to one user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Share {
    /// Unique share identifier.
    pub id: Uuid,
    /// Type of the shared item.
    pub item_type: ItemType,
    /// ID of the shared item.
    pub item_id: Uuid,
    /// Owner of the item, who created the share.
    pub owner_id: Uuid,
    /// The grantee.
    pub shared_with: Uuid,
    /// Permission level granted.
    pub permission: SharePermission,
    /// When the share was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShare {
    /// Type of the shared item.
    pub item_type: ItemType,
    /// ID of the shared item.
    pub item_id: Uuid,
    /// Owner of the item.
    pub owner_id: Uuid,
    /// The grantee.
    pub shared_with: Uuid,
    /// Permission level.
    pub permission: SharePermission,
}

/// A share as listed for its grantee, with the item's current name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedItem {
    /// The share row.
    pub share: Share,
    /// Current name of the shared item.
    pub item_name: String,
    /// Email of the item owner.
    pub owner_email: String,
    /// Size of the file, or the live subtree of the folder.
    pub size_bytes: i64,
}
