//! Share inheritance along the folder chain.
//!
//! A share on a folder applies to every descendant folder and file. For a
//! given item the effective share permission is the highest one found on
//! the item itself or on any of its ancestors.

use std::sync::Arc;

use uuid::Uuid;

use filehub_core::result::AppResult;
use filehub_database::repositories::FolderRepository;
use filehub_entity::file::File;
use filehub_entity::item::ItemType;
use filehub_entity::share::SharePermission;

use super::checker::ShareChecker;

/// Where an effective share permission was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareGrant {
    /// The granted level.
    pub permission: SharePermission,
    /// Item carrying the share.
    pub granted_on: Uuid,
    /// Whether the share sits on the item itself rather than an ancestor.
    pub direct: bool,
}

/// Resolves share permissions through folder ancestry.
#[derive(Debug, Clone)]
pub struct ShareInheritanceResolver {
    folders: Arc<dyn FolderRepository>,
    checker: ShareChecker,
}

impl ShareInheritanceResolver {
    /// Creates a new inheritance resolver.
    pub fn new(folders: Arc<dyn FolderRepository>, checker: ShareChecker) -> Self {
        Self { folders, checker }
    }

    /// Strongest grant `user_id` holds on a folder, directly or inherited.
    pub async fn resolve_folder_grant(
        &self,
        folder_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<ShareGrant>> {
        let chain: Vec<Uuid> = self
            .folders
            .find_ancestors(folder_id)
            .await?
            .into_iter()
            .map(|f| f.id)
            .collect();

        Ok(self
            .checker
            .best_on_folders(&chain, user_id)
            .await?
            .map(|(granted_on, permission)| ShareGrant {
                permission,
                granted_on,
                direct: granted_on == folder_id,
            }))
    }

    /// Strongest grant `user_id` holds on a file.
    ///
    /// A direct share on the file and shares on its folder chain are all
    /// considered; files at the root level inherit from the owner's root
    /// folder.
    pub async fn resolve_file_grant(&self, file: &File, user_id: Uuid) -> AppResult<Option<ShareGrant>> {
        let direct = self
            .checker
            .direct_permission(ItemType::File, file.id, user_id)
            .await?
            .map(|permission| ShareGrant {
                permission,
                granted_on: file.id,
                direct: true,
            });

        let container = match file.folder_id {
            Some(id) => Some(id),
            None => self.folders.find_root(file.owner_id).await?.map(|f| f.id),
        };
        let inherited = match container {
            Some(folder_id) => self
                .resolve_folder_grant(folder_id, user_id)
                .await?
                .map(|g| ShareGrant { direct: false, ..g }),
            None => None,
        };

        Ok([direct, inherited]
            .into_iter()
            .flatten()
            .max_by_key(|g| (g.permission.privilege_level(), g.direct)))
    }
}
