//! Share repository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use filehub_core::result::AppResult;
use filehub_entity::item::ItemType;
use filehub_entity::share::{CreateShare, Share};

use crate::error::db_error;

/// Persistence operations for direct user shares.
#[async_trait]
pub trait ShareRepository: Send + Sync + std::fmt::Debug {
    /// Find a share by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Share>>;

    /// The share granting `user_id` access to one item, if any.
    async fn find_for_item(
        &self,
        item_type: ItemType,
        item_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<Share>>;

    /// Shares granting `user_id` access to any of the given items.
    async fn find_for_items(
        &self,
        item_type: ItemType,
        item_ids: &[Uuid],
        user_id: Uuid,
    ) -> AppResult<Vec<Share>>;

    /// Shares received by a user, newest first.
    async fn list_shared_with(&self, user_id: Uuid) -> AppResult<Vec<Share>>;

    /// Shares created by an owner, newest first.
    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Share>>;

    /// Create a share. `Conflict` if the grantee already has one on the item.
    async fn create(&self, data: &CreateShare) -> AppResult<Share>;

    /// Delete a share. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Delete every share on the given items.
    async fn delete_for_items(&self, item_type: ItemType, item_ids: &[Uuid]) -> AppResult<u64>;
}

/// PostgreSQL share repository.
#[derive(Debug, Clone)]
pub struct PgShareRepository {
    pool: PgPool,
}

impl PgShareRepository {
    /// Create a new share repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShareRepository for PgShareRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Share>> {
        sqlx::query_as::<_, Share>("SELECT * FROM shares WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find share", e))
    }

    async fn find_for_item(
        &self,
        item_type: ItemType,
        item_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<Share>> {
        sqlx::query_as::<_, Share>(
            "SELECT * FROM shares WHERE item_type = $1 AND item_id = $2 AND shared_with = $3",
        )
        .bind(item_type)
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find share for item", e))
    }

    async fn find_for_items(
        &self,
        item_type: ItemType,
        item_ids: &[Uuid],
        user_id: Uuid,
    ) -> AppResult<Vec<Share>> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Share>(
            "SELECT * FROM shares WHERE item_type = $1 AND item_id = ANY($2) AND shared_with = $3",
        )
        .bind(item_type)
        .bind(item_ids)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find shares for items", e))
    }

    async fn list_shared_with(&self, user_id: Uuid) -> AppResult<Vec<Share>> {
        sqlx::query_as::<_, Share>(
            "SELECT * FROM shares WHERE shared_with = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list received shares", e))
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Share>> {
        sqlx::query_as::<_, Share>(
            "SELECT * FROM shares WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list sent shares", e))
    }

    async fn create(&self, data: &CreateShare) -> AppResult<Share> {
        sqlx::query_as::<_, Share>(
            "INSERT INTO shares (id, item_type, item_id, owner_id, shared_with, permission) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(data.item_type)
        .bind(data.item_id)
        .bind(data.owner_id)
        .bind(data.shared_with)
        .bind(data.permission)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create share", e))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM shares WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete share", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_items(&self, item_type: ItemType, item_ids: &[Uuid]) -> AppResult<u64> {
        if item_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM shares WHERE item_type = $1 AND item_id = ANY($2)")
            .bind(item_type)
            .bind(item_ids)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete shares for items", e))?;
        Ok(result.rows_affected())
    }
}
