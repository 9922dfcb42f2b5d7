//! Tri-state lifecycle shared by files and folders.

use std::fmt;

use filehub_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Where an item is in its life.
///
/// `Active` items are visible. `Deleted` items sit in the trash, hidden from
/// every listing except the trash, and can be restored. `Purged` is terminal
/// and never persisted: purging removes the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "item_lifecycle", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// Visible and counted against quota.
    Active,
    /// In the trash.
    Deleted,
    /// Permanently removed.
    Purged,
}

impl Lifecycle {
    /// Active -> Deleted.
    pub fn soft_delete(self) -> AppResult<Self> {
        match self {
            Self::Active => Ok(Self::Deleted),
            Self::Deleted => Err(AppError::not_found("Item is already in the trash")),
            Self::Purged => Err(AppError::not_found("Item no longer exists")),
        }
    }

    /// Deleted -> Active.
    pub fn restore(self) -> AppResult<Self> {
        match self {
            Self::Deleted => Ok(Self::Active),
            Self::Active => Err(AppError::conflict("Item is not in the trash")),
            Self::Purged => Err(AppError::not_found("Item no longer exists")),
        }
    }

    /// Active or Deleted -> Purged.
    pub fn purge(self) -> AppResult<Self> {
        match self {
            Self::Active | Self::Deleted => Ok(Self::Purged),
            Self::Purged => Err(AppError::not_found("Item no longer exists")),
        }
    }

    /// Whether the item is visible outside the trash.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Whether the item is in the trash.
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }

    /// Return the lifecycle as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deleted => "deleted",
            Self::Purged => "purged",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
