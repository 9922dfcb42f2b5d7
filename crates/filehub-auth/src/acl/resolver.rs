//! Effective permission resolver over ownership and shares.
//!
//! Resolution order:
//! 1. Owner check: item owners have full access.
//! 2. Direct share on the item.
//! 3. Inherited share on any ancestor folder.
//!
//! `Edit` satisfies a `View` requirement. Missing items resolve to denied.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_database::repositories::{FileRepository, FolderRepository, Repositories};
use filehub_entity::file::File;
use filehub_entity::folder::Folder;
use filehub_entity::item::ItemType;
use filehub_entity::share::SharePermission;

use super::checker::ShareChecker;
use super::inheritance::{ShareGrant, ShareInheritanceResolver};

/// Result of resolving effective permissions.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EffectivePermission {
    /// Whether access is granted.
    pub granted: bool,
    /// The share level held, if access comes from a share.
    pub share_permission: Option<SharePermission>,
    /// The source of the permission grant.
    pub source: PermissionSource,
}

/// Where the permission was derived from.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionSource {
    /// User owns the item.
    Owner,
    /// A share on the item itself.
    DirectShare,
    /// A share on an ancestor folder.
    InheritedShare {
        /// Folder carrying the share.
        folder_id: Uuid,
    },
    /// No grant found.
    Denied,
}

impl EffectivePermission {
    fn owner() -> Self {
        Self {
            granted: true,
            share_permission: None,
            source: PermissionSource::Owner,
        }
    }

    fn denied(held: Option<SharePermission>) -> Self {
        Self {
            granted: false,
            share_permission: held,
            source: PermissionSource::Denied,
        }
    }

    fn from_grant(grant: Option<ShareGrant>, required: SharePermission) -> Self {
        match grant {
            Some(g) if g.permission.satisfies(required) => Self {
                granted: true,
                share_permission: Some(g.permission),
                source: if g.direct {
                    PermissionSource::DirectShare
                } else {
                    PermissionSource::InheritedShare {
                        folder_id: g.granted_on,
                    }
                },
            },
            other => Self::denied(other.map(|g| g.permission)),
        }
    }
}

/// Resolves effective permissions on files and folders.
#[derive(Clone)]
pub struct SharePermissionResolver {
    folders: Arc<dyn FolderRepository>,
    files: Arc<dyn FileRepository>,
    inheritance: ShareInheritanceResolver,
}

impl std::fmt::Debug for SharePermissionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharePermissionResolver").finish()
    }
}

impl SharePermissionResolver {
    /// Creates a new resolver.
    pub fn new(
        folders: Arc<dyn FolderRepository>,
        files: Arc<dyn FileRepository>,
        inheritance: ShareInheritanceResolver,
    ) -> Self {
        Self {
            folders,
            files,
            inheritance,
        }
    }

    /// Builds a resolver from a repository set.
    pub fn from_repositories(repos: &Repositories) -> Self {
        let checker = ShareChecker::new(Arc::clone(&repos.shares));
        let inheritance = ShareInheritanceResolver::new(Arc::clone(&repos.folders), checker);
        Self::new(Arc::clone(&repos.folders), Arc::clone(&repos.files), inheritance)
    }

    /// Resolves the effective permission of `user_id` on a folder.
    pub async fn resolve_folder(
        &self,
        folder: &Folder,
        user_id: Uuid,
        required: SharePermission,
    ) -> AppResult<EffectivePermission> {
        if folder.owner_id == user_id {
            return Ok(EffectivePermission::owner());
        }
        let grant = self.inheritance.resolve_folder_grant(folder.id, user_id).await?;
        Ok(EffectivePermission::from_grant(grant, required))
    }

    /// Resolves the effective permission of `user_id` on a file.
    pub async fn resolve_file(
        &self,
        file: &File,
        user_id: Uuid,
        required: SharePermission,
    ) -> AppResult<EffectivePermission> {
        if file.owner_id == user_id {
            return Ok(EffectivePermission::owner());
        }
        let grant = self.inheritance.resolve_file_grant(file, user_id).await?;
        Ok(EffectivePermission::from_grant(grant, required))
    }

    /// Whether `user_id` holds at least `required` on the item.
    ///
    /// Returns `false` when the item does not exist.
    pub async fn has_permission(
        &self,
        user_id: Uuid,
        item_type: ItemType,
        item_id: Uuid,
        required: SharePermission,
    ) -> AppResult<bool> {
        let effective = match item_type {
            ItemType::Folder => match self.folders.find_by_id(item_id).await? {
                Some(folder) => self.resolve_folder(&folder, user_id, required).await?,
                None => return Ok(false),
            },
            ItemType::File => match self.files.find_by_id(item_id).await? {
                Some(file) => self.resolve_file(&file, user_id, required).await?,
                None => return Ok(false),
            },
        };
        debug!(
            user_id = %user_id,
            item_type = %item_type.as_str(),
            item_id = %item_id,
            required = %required,
            source = ?effective.source,
            granted = effective.granted,
            "Permission resolved"
        );
        Ok(effective.granted)
    }

    /// Whether `user_id` holds at least `required` on the folder.
    pub async fn check_folder(
        &self,
        folder: &Folder,
        user_id: Uuid,
        required: SharePermission,
    ) -> AppResult<bool> {
        Ok(self.resolve_folder(folder, user_id, required).await?.granted)
    }

    /// Whether `user_id` holds at least `required` on the file.
    pub async fn check_file(
        &self,
        file: &File,
        user_id: Uuid,
        required: SharePermission,
    ) -> AppResult<bool> {
        Ok(self.resolve_file(file, user_id, required).await?.granted)
    }

    /// Fails with `Forbidden` unless `user_id` holds `required` on the folder.
    pub async fn require_folder(
        &self,
        folder: &Folder,
        user_id: Uuid,
        required: SharePermission,
    ) -> AppResult<()> {
        if self.check_folder(folder, user_id, required).await? {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "{required} access to folder '{}' denied",
                folder.name
            )))
        }
    }

    /// Fails with `Forbidden` unless `user_id` holds `required` on the file.
    pub async fn require_file(
        &self,
        file: &File,
        user_id: Uuid,
        required: SharePermission,
    ) -> AppResult<()> {
        if self.check_file(file, user_id, required).await? {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "{required} access to file '{}' denied",
                file.name
            )))
        }
    }
}
