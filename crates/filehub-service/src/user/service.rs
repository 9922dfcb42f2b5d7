//! User accounts: creation with a root folder, and usage snapshots.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use filehub_core::config::QuotaConfig;
use filehub_core::error::{AppError, ErrorKind};
use filehub_core::result::AppResult;
use filehub_database::repositories::{FolderRepository, UserRepository};
use filehub_entity::folder::{CreateFolder, Folder, ROOT_FOLDER_NAME};
use filehub_entity::quota::QuotaSnapshot;
use filehub_entity::user::{CreateUser, User};

use crate::quota::QuotaAccountant;

/// Request to create an account.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAccountRequest {
    /// Login email, unique case-insensitively.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Byte quota; the configured default when omitted.
    #[validate(range(min = 0, message = "Quota cannot be negative"))]
    pub storage_quota_bytes: Option<i64>,
}

/// Creates accounts and reports usage.
#[derive(Debug, Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    folders: Arc<dyn FolderRepository>,
    accountant: Arc<QuotaAccountant>,
    quota: QuotaConfig,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(
        users: Arc<dyn UserRepository>,
        folders: Arc<dyn FolderRepository>,
        accountant: Arc<QuotaAccountant>,
        quota: QuotaConfig,
    ) -> Self {
        Self {
            users,
            folders,
            accountant,
            quota,
        }
    }

    /// Creates a user and its root folder.
    pub async fn create_account(&self, req: CreateAccountRequest) -> AppResult<User> {
        req.validate()
            .map_err(|e| AppError::validation(format!("Invalid account request: {e}")))?;

        let user = self
            .users
            .create(&CreateUser {
                email: req.email.trim().to_string(),
                storage_quota_bytes: req
                    .storage_quota_bytes
                    .unwrap_or(self.quota.default_quota_bytes),
            })
            .await?;
        self.ensure_root(user.id).await?;

        info!(
            user_id = %user.id,
            quota = user.storage_quota_bytes,
            "Account created"
        );
        Ok(user)
    }

    /// Returns the user's root folder, creating it when missing.
    pub async fn ensure_root(&self, user_id: Uuid) -> AppResult<Folder> {
        if let Some(root) = self.folders.find_root(user_id).await? {
            return Ok(root);
        }
        let created = self
            .folders
            .create(&CreateFolder {
                owner_id: user_id,
                parent_id: None,
                name: ROOT_FOLDER_NAME.to_string(),
            })
            .await;
        match created {
            Ok(root) => Ok(root),
            Err(e) if e.is(ErrorKind::Conflict) => self
                .folders
                .find_root(user_id)
                .await?
                .ok_or_else(|| AppError::internal(format!("Root folder of {user_id} vanished"))),
            Err(e) => Err(e),
        }
    }

    /// Looks a user up by ID.
    pub async fn get(&self, user_id: Uuid) -> AppResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))
    }

    /// Looks a user up by email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<User> {
        self.users
            .find_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::not_found(format!("No user with email '{email}'")))
    }

    /// Current usage against quota.
    pub async fn usage(&self, user_id: Uuid) -> AppResult<QuotaSnapshot> {
        self.accountant.snapshot(user_id).await
    }
}
