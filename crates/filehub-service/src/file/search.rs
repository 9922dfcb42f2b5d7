//! Name search over the caller's own live files and folders.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_database::repositories::{FileRepository, FolderRepository};
use filehub_entity::folder::{FileSummary, Folder};

use crate::context::RequestContext;

/// Cap on results of each kind.
pub const MAX_SEARCH_RESULTS: i64 = 200;

/// Search hits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    /// Matching folders.
    pub folders: Vec<Folder>,
    /// Matching files.
    pub files: Vec<FileSummary>,
}

/// Case-insensitive substring search by name.
#[derive(Debug, Clone)]
pub struct SearchService {
    folders: Arc<dyn FolderRepository>,
    files: Arc<dyn FileRepository>,
}

impl SearchService {
    /// Creates a new search service.
    pub fn new(folders: Arc<dyn FolderRepository>, files: Arc<dyn FileRepository>) -> Self {
        Self { folders, files }
    }

    /// Searches the caller's live items whose name contains `query`.
    pub async fn search(&self, ctx: &RequestContext, query: &str) -> AppResult<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::validation("Search query cannot be empty"));
        }

        let folders = self
            .folders
            .search_by_name(ctx.user_id, query, MAX_SEARCH_RESULTS)
            .await?;
        let files = self
            .files
            .search_by_name(ctx.user_id, query, MAX_SEARCH_RESULTS)
            .await?
            .iter()
            .map(FileSummary::from)
            .collect();

        Ok(SearchResults { folders, files })
    }
}
