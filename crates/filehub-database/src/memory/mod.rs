//! In-memory implementation of every repository trait.
//!
//! Enforces the same uniqueness rules as the PostgreSQL schema (live
//! sibling names, one live root per owner, one share per grantee and item,
//! unique emails) so services behave identically over either backend.
//! Suitable for tests and single-process embedding only.

mod file;
mod folder;
mod share;
mod user;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use filehub_entity::file::{File, FileVersion};
use filehub_entity::folder::Folder;
use filehub_entity::share::Share;
use filehub_entity::user::User;

/// Tables of the in-memory store.
#[derive(Debug, Default)]
struct InnerState {
    users: HashMap<Uuid, User>,
    folders: HashMap<Uuid, Folder>,
    files: HashMap<Uuid, File>,
    versions: HashMap<Uuid, FileVersion>,
    shares: HashMap<Uuid, Share>,
}

impl InnerState {
    /// Whether a live folder other than `except` occupies the sibling slot.
    fn folder_name_taken(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
        except: Option<Uuid>,
    ) -> bool {
        self.folders.values().any(|f| {
            f.is_active()
                && Some(f.id) != except
                && f.owner_id == owner_id
                && f.parent_id == parent_id
                && (parent_id.is_none() || f.name == name)
        })
    }

    /// Whether a live file other than `except` occupies the sibling slot.
    fn file_name_taken(
        &self,
        owner_id: Uuid,
        folder_id: Option<Uuid>,
        name: &str,
        except: Option<Uuid>,
    ) -> bool {
        self.files.values().any(|f| {
            f.is_active()
                && Some(f.id) != except
                && f.owner_id == owner_id
                && f.folder_id == folder_id
                && f.name == name
        })
    }
}

/// Shared in-memory database. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<RwLock<InnerState>>,
}

impl MemoryDatabase {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Case-insensitive substring match used by the search methods.
fn name_matches(name: &str, query: &str) -> bool {
    name.to_lowercase().contains(&query.to_lowercase())
}
