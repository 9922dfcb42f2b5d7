//! Folder tree operations with share-based permission checks.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use filehub_auth::acl::SharePermissionResolver;
use filehub_core::error::{AppError, ErrorKind};
use filehub_core::events::ActivityAction;
use filehub_core::result::AppResult;
use filehub_database::repositories::folder::MAX_TREE_DEPTH;
use filehub_database::repositories::{FileRepository, FolderRepository};
use filehub_entity::folder::{Breadcrumb, CreateFolder, FileSummary, Folder, FolderSummary, FolderView};
use filehub_entity::name::{split_relative_path, validate_name};
use filehub_entity::share::SharePermission;

use crate::activity::ActivityRecorder;
use crate::context::RequestContext;
use crate::lookup;
use crate::quota::QuotaAccountant;

/// Manages the folder tree: creation, rename, move, listing.
#[derive(Debug, Clone)]
pub struct FolderService {
    /// Folder repository.
    folders: Arc<dyn FolderRepository>,
    /// File repository.
    files: Arc<dyn FileRepository>,
    /// Permission resolver.
    resolver: Arc<SharePermissionResolver>,
    /// Per-owner lock and usage snapshots.
    accountant: Arc<QuotaAccountant>,
    /// Activity sink.
    activity: ActivityRecorder,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(
        folders: Arc<dyn FolderRepository>,
        files: Arc<dyn FileRepository>,
        resolver: Arc<SharePermissionResolver>,
        accountant: Arc<QuotaAccountant>,
        activity: ActivityRecorder,
    ) -> Self {
        Self {
            folders,
            files,
            resolver,
            accountant,
            activity,
        }
    }

    /// Gets a live folder the caller can view.
    pub async fn get_folder(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<Folder> {
        let folder = lookup::live_folder(self.folders.as_ref(), folder_id).await?;
        self.resolver
            .require_folder(&folder, ctx.user_id, SharePermission::View)
            .await?;
        Ok(folder)
    }

    /// A live folder, without a permission check.
    pub(crate) async fn live_folder(&self, folder_id: Uuid) -> AppResult<Folder> {
        lookup::live_folder(self.folders.as_ref(), folder_id).await
    }

    /// Level of `folder` in its tree; a root folder is level 0.
    async fn depth_of(&self, folder: &Folder) -> AppResult<i32> {
        let chain = self.folders.find_ancestors(folder.id).await?;
        Ok(chain.len() as i32 - 1)
    }

    /// Resolves a target folder the caller may write into.
    ///
    /// `None` means the caller's own root folder.
    pub async fn writable_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Option<Uuid>,
    ) -> AppResult<Folder> {
        let folder = match folder_id {
            Some(id) => lookup::live_folder(self.folders.as_ref(), id).await?,
            None => lookup::root_folder(self.folders.as_ref(), ctx.user_id).await?,
        };
        self.resolver
            .require_folder(&folder, ctx.user_id, SharePermission::Edit)
            .await?;
        Ok(folder)
    }

    /// Creates a folder, or returns the live sibling that already has the name.
    ///
    /// The folder belongs to the owner of the parent.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        name: &str,
        parent_id: Option<Uuid>,
    ) -> AppResult<Folder> {
        let name = validate_name(name)?;
        let parent = self.writable_folder(ctx, parent_id).await?;
        let (folder, created) = self.child_folder(&parent, &name).await?;

        if created {
            info!(
                user_id = %ctx.user_id,
                folder_id = %folder.id,
                parent_id = %parent.id,
                name = %folder.name,
                "Folder created"
            );
            self.activity
                .folder(
                    ctx,
                    ActivityAction::FolderCreate,
                    folder.id,
                    json!({ "name": folder.name, "parent_id": parent.id }),
                )
                .await;
        }
        Ok(folder)
    }

    /// Idempotently creates every missing folder of `path` below `base`.
    ///
    /// Returns the deepest folder.
    pub async fn ensure_path(
        &self,
        ctx: &RequestContext,
        path: &str,
        base: Option<Uuid>,
    ) -> AppResult<Folder> {
        let segments = split_relative_path(path)?;
        let mut current = self.writable_folder(ctx, base).await?;
        for segment in &segments {
            let (next, created) = self.child_folder(&current, segment).await?;
            if created {
                self.activity
                    .folder(
                        ctx,
                        ActivityAction::FolderCreate,
                        next.id,
                        json!({ "name": next.name, "parent_id": current.id }),
                    )
                    .await;
            }
            current = next;
        }
        Ok(current)
    }

    /// Finds or creates the live child `name` of `parent`.
    ///
    /// Runs under the owner's lock so the parent cannot be trashed or moved
    /// midway.
    /// A unique violation from a concurrent creator is resolved by looking
    /// the winner up again.
    async fn child_folder(&self, parent: &Folder, name: &str) -> AppResult<(Folder, bool)> {
        let _guard = self.accountant.lock(parent.owner_id).await;
        let parent = lookup::live_folder(self.folders.as_ref(), parent.id).await?;

        if let Some(existing) = self
            .folders
            .find_live_child(parent.owner_id, parent.id, name)
            .await?
        {
            return Ok((existing, false));
        }
        if self.depth_of(&parent).await? >= MAX_TREE_DEPTH {
            return Err(AppError::validation(format!(
                "Folders cannot be nested more than {MAX_TREE_DEPTH} levels deep"
            )));
        }

        let created = self
            .folders
            .create(&CreateFolder {
                owner_id: parent.owner_id,
                parent_id: Some(parent.id),
                name: name.to_string(),
            })
            .await;

        match created {
            Ok(folder) => Ok((folder, true)),
            Err(e) if e.is(ErrorKind::Conflict) => self
                .folders
                .find_live_child(parent.owner_id, parent.id, name)
                .await?
                .map(|f| (f, false))
                .ok_or(e),
            Err(e) => Err(e),
        }
    }

    /// Renames a folder.
    pub async fn rename_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        new_name: &str,
    ) -> AppResult<Folder> {
        let new_name = validate_name(new_name)?;
        let folder = lookup::live_folder(self.folders.as_ref(), folder_id).await?;
        let parent_id = folder
            .parent_id
            .ok_or_else(|| AppError::validation("The root folder cannot be renamed"))?;
        self.resolver
            .require_folder(&folder, ctx.user_id, SharePermission::Edit)
            .await?;

        if folder.name == new_name {
            return Ok(folder);
        }
        if self
            .folders
            .find_live_child(folder.owner_id, parent_id, &new_name)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "A folder named '{new_name}' already exists here"
            )));
        }

        let renamed = self.folders.rename(folder_id, &new_name).await?;
        info!(
            user_id = %ctx.user_id,
            folder_id = %folder_id,
            new_name = %new_name,
            "Folder renamed"
        );
        self.activity
            .folder(
                ctx,
                ActivityAction::FolderRename,
                folder_id,
                json!({ "from": folder.name, "to": renamed.name }),
            )
            .await;
        Ok(renamed)
    }

    /// Moves a folder under `destination_id` (the owner's root when `None`).
    ///
    /// The checks and the move run under the owner's lock, so concurrent
    /// moves cannot combine into a cycle.
    pub async fn move_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        destination_id: Option<Uuid>,
    ) -> AppResult<Folder> {
        let folder = lookup::live_folder(self.folders.as_ref(), folder_id).await?;
        if folder.is_root() {
            return Err(AppError::validation("The root folder cannot be moved"));
        }
        self.resolver
            .require_folder(&folder, ctx.user_id, SharePermission::Edit)
            .await?;

        let destination = match destination_id {
            Some(id) => lookup::live_folder(self.folders.as_ref(), id).await?,
            None => lookup::root_folder(self.folders.as_ref(), folder.owner_id).await?,
        };
        self.resolver
            .require_folder(&destination, ctx.user_id, SharePermission::Edit)
            .await?;

        if destination.owner_id != folder.owner_id {
            return Err(AppError::validation(
                "Items cannot be moved between different owners",
            ));
        }

        let _guard = self.accountant.lock(folder.owner_id).await;
        let folder = lookup::live_folder(self.folders.as_ref(), folder_id).await?;
        let destination = lookup::live_folder(self.folders.as_ref(), destination.id).await?;
        if folder.parent_id == Some(destination.id) {
            return Ok(folder);
        }

        let chain = self.folders.find_ancestors(destination.id).await?;
        if chain.iter().any(|f| f.id == folder_id) {
            return Err(AppError::validation(
                "Cannot move a folder into itself or one of its descendants",
            ));
        }
        let destination_depth = chain.len() as i32 - 1;
        let moved_height = subtree_height(&self.folders.find_subtree(folder_id, true).await?);
        if destination_depth + 1 + moved_height > MAX_TREE_DEPTH {
            return Err(AppError::validation(format!(
                "Folders cannot be nested more than {MAX_TREE_DEPTH} levels deep"
            )));
        }

        if self
            .folders
            .find_live_child(folder.owner_id, destination.id, &folder.name)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "A folder named '{}' already exists in the destination",
                folder.name
            )));
        }

        let moved = self.folders.reparent(folder_id, destination.id).await?;
        info!(
            user_id = %ctx.user_id,
            folder_id = %folder_id,
            new_parent = %destination.id,
            "Folder moved"
        );
        self.activity
            .folder(
                ctx,
                ActivityAction::FolderMove,
                folder_id,
                json!({ "from": folder.parent_id, "to": destination.id }),
            )
            .await;
        Ok(moved)
    }

    /// Lists a folder (the caller's root when `folder_id` is `None`).
    pub async fn get_view(&self, ctx: &RequestContext, folder_id: Option<Uuid>) -> AppResult<FolderView> {
        let folder = match folder_id {
            Some(id) => self.get_folder(ctx, id).await?,
            None => lookup::root_folder(self.folders.as_ref(), ctx.user_id).await?,
        };

        let parent_name = match folder.parent_id {
            Some(pid) => self.folders.find_by_id(pid).await?.map(|p| p.name),
            None => None,
        };

        let mut folders = Vec::new();
        for child in self.folders.find_children(folder.id, false).await? {
            let size = self.subtree_size(&child).await?;
            folders.push(FolderSummary::new(&child, size));
        }

        let mut files: Vec<FileSummary> = self
            .files
            .find_in_folder(folder.owner_id, Some(folder.id), false)
            .await?
            .iter()
            .map(FileSummary::from)
            .collect();
        if folder.is_root() {
            files.extend(
                self.files
                    .find_in_folder(folder.owner_id, None, false)
                    .await?
                    .iter()
                    .map(FileSummary::from),
            );
            files.sort_by(|a, b| a.name.cmp(&b.name));
        }

        let size = self.subtree_size(&folder).await?;
        let storage = self.accountant.snapshot(ctx.user_id).await?;

        Ok(FolderView {
            folder: FolderSummary::new(&folder, size),
            parent_name,
            folders,
            files,
            storage,
        })
    }

    /// Root-first chain of folders down to `folder_id`.
    pub async fn ancestors(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<Vec<Breadcrumb>> {
        let folder = self.get_folder(ctx, folder_id).await?;
        let chain = self.folders.find_ancestors(folder.id).await?;
        Ok(chain.iter().rev().map(Breadcrumb::from).collect())
    }

    /// Sum of live file sizes anywhere under `folder`.
    ///
    /// Root-level files count towards the root folder.
    pub async fn subtree_size(&self, folder: &Folder) -> AppResult<i64> {
        let ids: Vec<Uuid> = self
            .folders
            .find_subtree(folder.id, false)
            .await?
            .into_iter()
            .map(|f| f.id)
            .collect();
        let mut total = self.files.sum_live_size_in_folders(&ids).await?;
        if folder.is_root() {
            total += self.files.sum_live_size_at_root(folder.owner_id).await?;
        }
        Ok(total)
    }
}

/// Levels below the first folder of a root-first subtree listing.
fn subtree_height(subtree: &[Folder]) -> i32 {
    let mut levels: HashMap<Uuid, i32> = HashMap::new();
    let mut height = 0;
    for folder in subtree {
        let level = folder
            .parent_id
            .and_then(|p| levels.get(&p))
            .map_or(0, |l| l + 1);
        height = height.max(level);
        levels.insert(folder.id, level);
    }
    height
}
