//! Share creation, listing, and revocation.

use std::sync::Arc;

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_core::events::{ActivityAction, ActivityTarget};
use filehub_core::result::AppResult;
use filehub_database::repositories::{FileRepository, FolderRepository, ShareRepository, UserRepository};
use filehub_entity::item::ItemType;
use filehub_entity::share::{CreateShare, Share, SharePermission, SharedItem};

use crate::activity::ActivityRecorder;
use crate::context::RequestContext;
use crate::folder::FolderService;
use crate::lookup;

/// Request to share an item with another user.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateShareRequest {
    /// Kind of item.
    pub item_type: ItemType,
    /// Item ID.
    pub item_id: Uuid,
    /// Email of the user receiving access.
    pub target_email: String,
    /// Granted level.
    pub permission: SharePermission,
}

/// Manages direct user shares.
#[derive(Debug, Clone)]
pub struct ShareService {
    shares: Arc<dyn ShareRepository>,
    users: Arc<dyn UserRepository>,
    folders: Arc<dyn FolderRepository>,
    files: Arc<dyn FileRepository>,
    folder_service: Arc<FolderService>,
    activity: ActivityRecorder,
}

impl ShareService {
    /// Creates a new share service.
    pub fn new(
        shares: Arc<dyn ShareRepository>,
        users: Arc<dyn UserRepository>,
        folders: Arc<dyn FolderRepository>,
        files: Arc<dyn FileRepository>,
        folder_service: Arc<FolderService>,
        activity: ActivityRecorder,
    ) -> Self {
        Self {
            shares,
            users,
            folders,
            files,
            folder_service,
            activity,
        }
    }

    /// Shares a live item the caller owns.
    pub async fn create_share(&self, ctx: &RequestContext, req: CreateShareRequest) -> AppResult<Share> {
        let owner_id = match req.item_type {
            ItemType::File => lookup::live_file(self.files.as_ref(), req.item_id).await?.owner_id,
            ItemType::Folder => lookup::live_folder(self.folders.as_ref(), req.item_id).await?.owner_id,
        };
        if owner_id != ctx.user_id {
            return Err(AppError::forbidden("Only the owner can share an item"));
        }

        let target = self
            .users
            .find_by_email(req.target_email.trim())
            .await?
            .ok_or_else(|| AppError::not_found(format!("No user with email '{}'", req.target_email)))?;
        if target.id == ctx.user_id {
            return Err(AppError::validation("Cannot share an item with yourself"));
        }

        let share = self
            .shares
            .create(&CreateShare {
                item_type: req.item_type,
                item_id: req.item_id,
                owner_id,
                shared_with: target.id,
                permission: req.permission,
            })
            .await?;

        info!(
            user_id = %ctx.user_id,
            share_id = %share.id,
            item_type = %share.item_type,
            item_id = %share.item_id,
            shared_with = %share.shared_with,
            permission = %share.permission,
            "Share created"
        );
        self.activity
            .record(
                ctx,
                ActivityAction::ShareCreate,
                ActivityTarget::Share(share.id),
                json!({
                    "item_type": share.item_type,
                    "item_id": share.item_id,
                    "shared_with": share.shared_with,
                    "permission": share.permission,
                }),
            )
            .await;
        Ok(share)
    }

    /// Items other users have shared with the caller.
    ///
    /// Items in the trash or gone for good are left out.
    pub async fn list_shared_with_me(&self, ctx: &RequestContext) -> AppResult<Vec<SharedItem>> {
        let mut out = Vec::new();
        for share in self.shares.list_shared_with(ctx.user_id).await? {
            let (item_name, size_bytes) = match share.item_type {
                ItemType::File => match self.files.find_by_id(share.item_id).await? {
                    Some(f) if f.is_active() => (f.name, f.size_bytes),
                    _ => continue,
                },
                ItemType::Folder => match self.folders.find_by_id(share.item_id).await? {
                    Some(f) if f.is_active() => {
                        let size = self.folder_service.subtree_size(&f).await?;
                        (f.name, size)
                    }
                    _ => continue,
                },
            };
            let owner_email = self
                .users
                .find_by_id(share.owner_id)
                .await?
                .map(|u| u.email)
                .unwrap_or_default();
            out.push(SharedItem {
                share,
                item_name,
                owner_email,
                size_bytes,
            });
        }
        Ok(out)
    }

    /// Shares the caller has created.
    pub async fn list_sent(&self, ctx: &RequestContext) -> AppResult<Vec<Share>> {
        self.shares.list_by_owner(ctx.user_id).await
    }

    /// Revokes a share the caller created.
    pub async fn revoke(&self, ctx: &RequestContext, share_id: Uuid) -> AppResult<()> {
        let share = self
            .shares
            .find_by_id(share_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Share {share_id} not found")))?;
        if share.owner_id != ctx.user_id {
            return Err(AppError::forbidden("Only the owner can revoke this share"));
        }

        if !self.shares.delete(share_id).await? {
            return Err(AppError::not_found(format!("Share {share_id} not found")));
        }

        info!(user_id = %ctx.user_id, share_id = %share_id, "Share revoked");
        self.activity
            .record(
                ctx,
                ActivityAction::ShareRevoke,
                ActivityTarget::Share(share_id),
                json!({ "item_type": share.item_type, "item_id": share.item_id }),
            )
            .await;
        Ok(())
    }
}
