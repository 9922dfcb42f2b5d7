//! Repository traits and their PostgreSQL implementations.
//!
//! Services depend only on the traits; [`Repositories`] wires a complete
//! set either over a PostgreSQL pool or over [`MemoryDatabase`].

pub mod file;
pub mod folder;
pub mod share;
pub mod user;
pub mod version;

use std::sync::Arc;

use sqlx::PgPool;

use crate::memory::MemoryDatabase;

pub use file::{FileRepository, PgFileRepository};
pub use folder::{FolderRepository, PgFolderRepository};
pub use share::{PgShareRepository, ShareRepository};
pub use user::{PgUserRepository, UserRepository};
pub use version::{FileVersionRepository, PgFileVersionRepository};

/// One implementation of every repository trait.
#[derive(Debug, Clone)]
pub struct Repositories {
    /// User accounts.
    pub users: Arc<dyn UserRepository>,
    /// Folder trees.
    pub folders: Arc<dyn FolderRepository>,
    /// File rows.
    pub files: Arc<dyn FileRepository>,
    /// File version history.
    pub versions: Arc<dyn FileVersionRepository>,
    /// Direct user shares.
    pub shares: Arc<dyn ShareRepository>,
}

impl Repositories {
    /// Repositories backed by PostgreSQL.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            folders: Arc::new(PgFolderRepository::new(pool.clone())),
            files: Arc::new(PgFileRepository::new(pool.clone())),
            versions: Arc::new(PgFileVersionRepository::new(pool.clone())),
            shares: Arc::new(PgShareRepository::new(pool)),
        }
    }

    /// Repositories sharing one fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::from_memory(MemoryDatabase::new())
    }

    /// Repositories over an existing in-memory store.
    pub fn from_memory(db: MemoryDatabase) -> Self {
        Self {
            users: Arc::new(db.clone()),
            folders: Arc::new(db.clone()),
            files: Arc::new(db.clone()),
            versions: Arc::new(db.clone()),
            shares: Arc::new(db),
        }
    }
}
