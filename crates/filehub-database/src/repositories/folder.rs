//! Folder repository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_entity::folder::{CreateFolder, Folder};
use filehub_entity::lifecycle::Lifecycle;

use crate::error::{contains_pattern, db_error};

/// Deepest level a folder may sit at; a root folder is level 0.
///
/// Tree walks that go past it fail instead of returning a truncated chain.
pub const MAX_TREE_DEPTH: i32 = 1024;

/// Error for a walk that went past [`MAX_TREE_DEPTH`].
pub(crate) fn depth_exceeded(folder_id: Uuid) -> AppError {
    AppError::internal(format!(
        "Folder {folder_id} has a cyclic or too deep folder chain"
    ))
}

/// A folder row tagged with its distance from the walk's start.
#[derive(Debug, sqlx::FromRow)]
struct LeveledFolder {
    #[sqlx(flatten)]
    folder: Folder,
    lvl: i32,
}

/// Strip levels, failing if any row lies beyond the allowed depth.
fn within_depth(folder_id: Uuid, rows: Vec<LeveledFolder>) -> AppResult<Vec<Folder>> {
    if rows.iter().any(|r| r.lvl > MAX_TREE_DEPTH) {
        return Err(depth_exceeded(folder_id));
    }
    Ok(rows.into_iter().map(|r| r.folder).collect())
}

/// Persistence operations for folder trees.
#[async_trait]
pub trait FolderRepository: Send + Sync + std::fmt::Debug {
    /// Find a folder by ID, whatever its lifecycle.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Folder>>;

    /// Find the owner's live root folder.
    async fn find_root(&self, owner_id: Uuid) -> AppResult<Option<Folder>>;

    /// Find a live child of `parent_id` by exact name.
    async fn find_live_child(
        &self,
        owner_id: Uuid,
        parent_id: Uuid,
        name: &str,
    ) -> AppResult<Option<Folder>>;

    /// List direct children, ordered by name.
    async fn find_children(&self, parent_id: Uuid, include_deleted: bool)
    -> AppResult<Vec<Folder>>;

    /// The folder followed by its ancestors, ending at the root.
    async fn find_ancestors(&self, folder_id: Uuid) -> AppResult<Vec<Folder>>;

    /// The folder followed by its descendants.
    ///
    /// With `include_deleted == false` the walk does not descend into
    /// deleted folders, so the result is exactly the live subtree below a
    /// live folder.
    async fn find_subtree(&self, folder_id: Uuid, include_deleted: bool) -> AppResult<Vec<Folder>>;

    /// List the owner's deleted folders.
    async fn find_trashed(&self, owner_id: Uuid) -> AppResult<Vec<Folder>>;

    /// Case-insensitive substring search over the owner's live folders.
    async fn search_by_name(&self, owner_id: Uuid, query: &str, limit: i64)
    -> AppResult<Vec<Folder>>;

    /// Create a live folder. `Conflict` if a live sibling has the name.
    async fn create(&self, data: &CreateFolder) -> AppResult<Folder>;

    /// Rename a folder. `Conflict` if a live sibling has the name.
    async fn rename(&self, id: Uuid, name: &str) -> AppResult<Folder>;

    /// Move a folder under a new parent. `Conflict` on a live name clash.
    async fn reparent(&self, id: Uuid, parent_id: Uuid) -> AppResult<Folder>;

    /// Set the lifecycle of every listed folder in one statement.
    async fn set_lifecycle(&self, ids: &[Uuid], lifecycle: Lifecycle) -> AppResult<u64>;

    /// Remove folder rows.
    async fn delete_many(&self, ids: &[Uuid]) -> AppResult<u64>;
}

/// PostgreSQL folder repository.
#[derive(Debug, Clone)]
pub struct PgFolderRepository {
    pool: PgPool,
}

impl PgFolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FolderRepository for PgFolderRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find folder", e))
    }

    async fn find_root(&self, owner_id: Uuid) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders \
             WHERE owner_id = $1 AND parent_id IS NULL AND lifecycle = 'active'",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find root folder", e))
    }

    async fn find_live_child(
        &self,
        owner_id: Uuid,
        parent_id: Uuid,
        name: &str,
    ) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders \
             WHERE owner_id = $1 AND parent_id = $2 AND name = $3 AND lifecycle = 'active'",
        )
        .bind(owner_id)
        .bind(parent_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find child folder", e))
    }

    async fn find_children(
        &self,
        parent_id: Uuid,
        include_deleted: bool,
    ) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders \
             WHERE parent_id = $1 AND ($2 OR lifecycle = 'active') \
             ORDER BY name ASC",
        )
        .bind(parent_id)
        .bind(include_deleted)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list child folders", e))
    }

    async fn find_ancestors(&self, folder_id: Uuid) -> AppResult<Vec<Folder>> {
        // One level past the limit so an over-deep chain is detected, not cut.
        let rows = sqlx::query_as::<_, LeveledFolder>(
            "WITH RECURSIVE ancestors AS ( \
                SELECT f.*, 0 AS lvl FROM folders f WHERE f.id = $1 \
                UNION ALL \
                SELECT f.*, a.lvl + 1 FROM folders f \
                INNER JOIN ancestors a ON f.id = a.parent_id \
                WHERE a.lvl <= $2 \
             ) SELECT * FROM ancestors ORDER BY lvl ASC",
        )
        .bind(folder_id)
        .bind(MAX_TREE_DEPTH)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find ancestors", e))?;
        within_depth(folder_id, rows)
    }

    async fn find_subtree(&self, folder_id: Uuid, include_deleted: bool) -> AppResult<Vec<Folder>> {
        let rows = sqlx::query_as::<_, LeveledFolder>(
            "WITH RECURSIVE tree AS ( \
                SELECT f.*, 0 AS lvl FROM folders f WHERE f.id = $1 \
                UNION ALL \
                SELECT f.*, t.lvl + 1 FROM folders f \
                INNER JOIN tree t ON f.parent_id = t.id \
                WHERE ($2 OR f.lifecycle = 'active') AND t.lvl <= $3 \
             ) SELECT * FROM tree ORDER BY lvl ASC, name ASC",
        )
        .bind(folder_id)
        .bind(include_deleted)
        .bind(MAX_TREE_DEPTH)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list folder subtree", e))?;
        within_depth(folder_id, rows)
    }

    async fn find_trashed(&self, owner_id: Uuid) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE owner_id = $1 AND lifecycle = 'deleted' \
             ORDER BY updated_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list deleted folders", e))
    }

    async fn search_by_name(
        &self,
        owner_id: Uuid,
        query: &str,
        limit: i64,
    ) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders \
             WHERE owner_id = $1 AND lifecycle = 'active' AND parent_id IS NOT NULL \
               AND name ILIKE $2 \
             ORDER BY name ASC LIMIT $3",
        )
        .bind(owner_id)
        .bind(contains_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to search folders", e))
    }

    async fn create(&self, data: &CreateFolder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (id, owner_id, parent_id, name) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(data.owner_id)
        .bind(data.parent_id)
        .bind(&data.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create folder", e))
    }

    async fn rename(&self, id: Uuid, name: &str) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "UPDATE folders SET name = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to rename folder", e))
    }

    async fn reparent(&self, id: Uuid, parent_id: Uuid) -> AppResult<Folder> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        // Moves within one owner's tree run one at a time, so the cycle
        // check below always sees the other moves' results.
        let locked = sqlx::query(
            "SELECT pg_advisory_xact_lock(hashtextextended(owner_id::text, 0)) \
             FROM folders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to lock folder tree", e))?;
        if locked.is_none() {
            return Err(AppError::not_found(format!("Folder {id} not found")));
        }

        let moved = sqlx::query_as::<_, Folder>(
            "UPDATE folders SET parent_id = $2, updated_at = NOW() \
             WHERE id = $1 AND NOT EXISTS ( \
                WITH RECURSIVE chain AS ( \
                    SELECT c.id, c.parent_id, 0 AS lvl FROM folders c WHERE c.id = $2 \
                    UNION ALL \
                    SELECT f.id, f.parent_id, ch.lvl + 1 FROM folders f \
                    INNER JOIN chain ch ON f.id = ch.parent_id \
                    WHERE ch.lvl <= $3 \
                ) SELECT 1 FROM chain WHERE chain.id = $1 \
             ) RETURNING *",
        )
        .bind(id)
        .bind(parent_id)
        .bind(MAX_TREE_DEPTH)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to move folder", e))?;

        let Some(moved) = moved else {
            return Err(AppError::validation(
                "Cannot move a folder into itself or one of its descendants",
            ));
        };
        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit folder move", e))?;
        Ok(moved)
    }

    async fn set_lifecycle(&self, ids: &[Uuid], lifecycle: Lifecycle) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE folders SET lifecycle = $2, updated_at = NOW() WHERE id = ANY($1)",
        )
        .bind(ids)
        .bind(lifecycle)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update folder lifecycle", e))?;
        Ok(result.rows_affected())
    }

    async fn delete_many(&self, ids: &[Uuid]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM folders WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete folders", e))?;
        Ok(result.rows_affected())
    }
}
