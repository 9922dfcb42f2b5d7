//! Version history of a file.

use std::sync::Arc;

use uuid::Uuid;

use filehub_auth::acl::SharePermissionResolver;
use filehub_core::result::AppResult;
use filehub_database::repositories::{FileRepository, FileVersionRepository};
use filehub_entity::file::FileVersion;
use filehub_entity::share::SharePermission;

use crate::context::RequestContext;
use crate::lookup;

/// Lists file versions.
#[derive(Debug, Clone)]
pub struct VersionService {
    files: Arc<dyn FileRepository>,
    versions: Arc<dyn FileVersionRepository>,
    resolver: Arc<SharePermissionResolver>,
}

impl VersionService {
    /// Creates a new version service.
    pub fn new(
        files: Arc<dyn FileRepository>,
        versions: Arc<dyn FileVersionRepository>,
        resolver: Arc<SharePermissionResolver>,
    ) -> Self {
        Self {
            files,
            versions,
            resolver,
        }
    }

    /// All versions of a live file, newest first.
    pub async fn list_versions(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<Vec<FileVersion>> {
        let file = lookup::live_file(self.files.as_ref(), file_id).await?;
        self.resolver
            .require_file(&file, ctx.user_id, SharePermission::View)
            .await?;
        self.versions.find_by_file(file_id).await
    }
}
