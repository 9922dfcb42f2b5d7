//! File version entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One immutable version of a file's content.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FileVersion {
    /// Unique version identifier.
    pub id: Uuid,
    /// The file this version belongs to.
    pub file_id: Uuid,
    /// Sequential version number, unique per file.
    pub version: i32,
    /// Storage key of this version's content.
    pub storage_key: String,
    /// Size in bytes.
    pub size_bytes: i64,
    /// SHA-256 checksum (lowercase hex).
    pub checksum_sha256: String,
    /// When this version was created.
    pub created_at: DateTime<Utc>,
}

/// Content already written to storage, ready to be recorded as a version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionContent {
    /// Pre-allocated version ID (part of the storage key).
    pub version_id: Uuid,
    /// Storage key the bytes were written to.
    pub storage_key: String,
    /// Size in bytes.
    pub size_bytes: i64,
    /// SHA-256 checksum (lowercase hex).
    pub checksum_sha256: String,
}
