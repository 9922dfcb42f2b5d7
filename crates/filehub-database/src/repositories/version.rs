//! File version repository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use filehub_core::result::AppResult;
use filehub_entity::file::FileVersion;

use crate::error::db_error;

/// Read access to file version history.
///
/// Versions are written together with their file row through
/// [`FileRepository`](super::FileRepository) and removed with it.
#[async_trait]
pub trait FileVersionRepository: Send + Sync + std::fmt::Debug {
    /// All versions of a file, newest first.
    async fn find_by_file(&self, file_id: Uuid) -> AppResult<Vec<FileVersion>>;

    /// One version of a file by number.
    async fn find_version(&self, file_id: Uuid, version: i32) -> AppResult<Option<FileVersion>>;

    /// All versions of the given files.
    async fn find_by_files(&self, file_ids: &[Uuid]) -> AppResult<Vec<FileVersion>>;
}

/// PostgreSQL file version repository.
#[derive(Debug, Clone)]
pub struct PgFileVersionRepository {
    pool: PgPool,
}

impl PgFileVersionRepository {
    /// Create a new version repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileVersionRepository for PgFileVersionRepository {
    async fn find_by_file(&self, file_id: Uuid) -> AppResult<Vec<FileVersion>> {
        sqlx::query_as::<_, FileVersion>(
            "SELECT * FROM file_versions WHERE file_id = $1 ORDER BY version DESC",
        )
        .bind(file_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list file versions", e))
    }

    async fn find_version(&self, file_id: Uuid, version: i32) -> AppResult<Option<FileVersion>> {
        sqlx::query_as::<_, FileVersion>(
            "SELECT * FROM file_versions WHERE file_id = $1 AND version = $2",
        )
        .bind(file_id)
        .bind(version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find file version", e))
    }

    async fn find_by_files(&self, file_ids: &[Uuid]) -> AppResult<Vec<FileVersion>> {
        if file_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, FileVersion>(
            "SELECT * FROM file_versions WHERE file_id = ANY($1) ORDER BY file_id, version",
        )
        .bind(file_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list versions of files", e))
    }
}
