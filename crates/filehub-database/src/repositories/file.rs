//! File repository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use filehub_core::result::AppResult;
use filehub_entity::file::{CreateFile, File, FileVersion, VersionContent};
use filehub_entity::lifecycle::Lifecycle;

use crate::error::{contains_pattern, db_error};

/// Persistence operations for file rows.
///
/// `folder_id == None` addresses the owner's root level.
#[async_trait]
pub trait FileRepository: Send + Sync + std::fmt::Debug {
    /// Find a file by ID, whatever its lifecycle.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<File>>;

    /// Find a live file by exact name within one folder (or the root level).
    async fn find_live_by_name(
        &self,
        owner_id: Uuid,
        folder_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Option<File>>;

    /// List files directly inside one folder (or the root level), by name.
    async fn find_in_folder(
        &self,
        owner_id: Uuid,
        folder_id: Option<Uuid>,
        include_deleted: bool,
    ) -> AppResult<Vec<File>>;

    /// List files directly inside any of the given folders.
    async fn find_in_folders(&self, folder_ids: &[Uuid], include_deleted: bool)
    -> AppResult<Vec<File>>;

    /// Total size of live files directly inside any of the given folders.
    async fn sum_live_size_in_folders(&self, folder_ids: &[Uuid]) -> AppResult<i64>;

    /// Total size of the owner's live files at the root level.
    async fn sum_live_size_at_root(&self, owner_id: Uuid) -> AppResult<i64>;

    /// Total size of all of the owner's live files.
    async fn used_bytes(&self, owner_id: Uuid) -> AppResult<i64>;

    /// List the owner's deleted files.
    async fn find_trashed(&self, owner_id: Uuid) -> AppResult<Vec<File>>;

    /// Case-insensitive substring search over the owner's live files.
    async fn search_by_name(&self, owner_id: Uuid, query: &str, limit: i64)
    -> AppResult<Vec<File>>;

    /// Atomically insert a file row and its version 1.
    ///
    /// `Conflict` if a live sibling already has the name.
    async fn create_with_version(
        &self,
        data: &CreateFile,
        content: &VersionContent,
    ) -> AppResult<(File, FileVersion)>;

    /// Atomically bump `current_version`, point the file at the new content
    /// and insert the matching version row.
    async fn append_version(
        &self,
        file_id: Uuid,
        content: &VersionContent,
    ) -> AppResult<(File, FileVersion)>;

    /// Rename a file. `Conflict` if a live sibling has the name.
    async fn rename(&self, id: Uuid, name: &str) -> AppResult<File>;

    /// Move a file into another folder (or the root level).
    async fn relocate(&self, id: Uuid, folder_id: Option<Uuid>) -> AppResult<File>;

    /// Set the lifecycle of every listed file in one statement.
    async fn set_lifecycle(&self, ids: &[Uuid], lifecycle: Lifecycle) -> AppResult<u64>;

    /// Remove file rows together with their version rows.
    async fn delete_many(&self, ids: &[Uuid]) -> AppResult<u64>;
}

/// PostgreSQL file repository.
#[derive(Debug, Clone)]
pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find file", e))
    }

    async fn find_live_by_name(
        &self,
        owner_id: Uuid,
        folder_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files \
             WHERE owner_id = $1 AND folder_id IS NOT DISTINCT FROM $2 \
               AND name = $3 AND lifecycle = 'active'",
        )
        .bind(owner_id)
        .bind(folder_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find file by name", e))
    }

    async fn find_in_folder(
        &self,
        owner_id: Uuid,
        folder_id: Option<Uuid>,
        include_deleted: bool,
    ) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files \
             WHERE owner_id = $1 AND folder_id IS NOT DISTINCT FROM $2 \
               AND ($3 OR lifecycle = 'active') \
             ORDER BY name ASC",
        )
        .bind(owner_id)
        .bind(folder_id)
        .bind(include_deleted)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list files", e))
    }

    async fn find_in_folders(
        &self,
        folder_ids: &[Uuid],
        include_deleted: bool,
    ) -> AppResult<Vec<File>> {
        if folder_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, File>(
            "SELECT * FROM files \
             WHERE folder_id = ANY($1) AND ($2 OR lifecycle = 'active') \
             ORDER BY name ASC",
        )
        .bind(folder_ids)
        .bind(include_deleted)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list files in folders", e))
    }

    async fn sum_live_size_in_folders(&self, folder_ids: &[Uuid]) -> AppResult<i64> {
        if folder_ids.is_empty() {
            return Ok(0);
        }
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(size_bytes), 0)::BIGINT FROM files \
             WHERE folder_id = ANY($1) AND lifecycle = 'active'",
        )
        .bind(folder_ids)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to sum folder sizes", e))
    }

    async fn sum_live_size_at_root(&self, owner_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(size_bytes), 0)::BIGINT FROM files \
             WHERE owner_id = $1 AND folder_id IS NULL AND lifecycle = 'active'",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to sum root-level sizes", e))
    }

    async fn used_bytes(&self, owner_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(size_bytes), 0)::BIGINT FROM files \
             WHERE owner_id = $1 AND lifecycle = 'active'",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to compute storage usage", e))
    }

    async fn find_trashed(&self, owner_id: Uuid) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE owner_id = $1 AND lifecycle = 'deleted' \
             ORDER BY updated_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list deleted files", e))
    }

    async fn search_by_name(
        &self,
        owner_id: Uuid,
        query: &str,
        limit: i64,
    ) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files \
             WHERE owner_id = $1 AND lifecycle = 'active' AND name ILIKE $2 \
             ORDER BY name ASC LIMIT $3",
        )
        .bind(owner_id)
        .bind(contains_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to search files", e))
    }

    async fn create_with_version(
        &self,
        data: &CreateFile,
        content: &VersionContent,
    ) -> AppResult<(File, FileVersion)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let file = sqlx::query_as::<_, File>(
            "INSERT INTO files \
                (id, owner_id, folder_id, name, size_bytes, current_version, storage_key, checksum_sha256) \
             VALUES ($1, $2, $3, $4, $5, 1, $6, $7) RETURNING *",
        )
        .bind(data.id)
        .bind(data.owner_id)
        .bind(data.folder_id)
        .bind(&data.name)
        .bind(content.size_bytes)
        .bind(&content.storage_key)
        .bind(&content.checksum_sha256)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to create file", e))?;

        let version = insert_version(&mut tx, file.id, 1, content).await?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit file creation", e))?;
        Ok((file, version))
    }

    async fn append_version(
        &self,
        file_id: Uuid,
        content: &VersionContent,
    ) -> AppResult<(File, FileVersion)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let file = sqlx::query_as::<_, File>(
            "UPDATE files SET \
                current_version = current_version + 1, \
                size_bytes = $2, storage_key = $3, checksum_sha256 = $4, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(file_id)
        .bind(content.size_bytes)
        .bind(&content.storage_key)
        .bind(&content.checksum_sha256)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to update file version", e))?;

        let version = insert_version(&mut tx, file.id, file.current_version, content).await?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit new version", e))?;
        Ok((file, version))
    }

    async fn rename(&self, id: Uuid, name: &str) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET name = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to rename file", e))
    }

    async fn relocate(&self, id: Uuid, folder_id: Option<Uuid>) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET folder_id = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(folder_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to move file", e))
    }

    async fn set_lifecycle(&self, ids: &[Uuid], lifecycle: Lifecycle) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result =
            sqlx::query("UPDATE files SET lifecycle = $2, updated_at = NOW() WHERE id = ANY($1)")
                .bind(ids)
                .bind(lifecycle)
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("Failed to update file lifecycle", e))?;
        Ok(result.rows_affected())
    }

    async fn delete_many(&self, ids: &[Uuid]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        // file_versions rows go with ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM files WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete files", e))?;
        Ok(result.rows_affected())
    }
}

async fn insert_version(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    file_id: Uuid,
    version: i32,
    content: &VersionContent,
) -> AppResult<FileVersion> {
    sqlx::query_as::<_, FileVersion>(
        "INSERT INTO file_versions (id, file_id, version, storage_key, size_bytes, checksum_sha256) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(content.version_id)
    .bind(file_id)
    .bind(version)
    .bind(&content.storage_key)
    .bind(content.size_bytes)
    .bind(&content.checksum_sha256)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to record file version", e))
}
