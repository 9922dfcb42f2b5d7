//! Wires every service from one repository set and one storage manager.

use std::sync::Arc;

use filehub_auth::acl::SharePermissionResolver;
use filehub_core::config::QuotaConfig;
use filehub_core::traits::ActivityLogger;
use filehub_database::repositories::Repositories;
use filehub_storage::StorageManager;

use crate::activity::ActivityRecorder;
use crate::batch::BatchService;
use crate::file::{DownloadService, FileService, Purger, SearchService, UploadService, VersionService};
use crate::folder::{ArchiveService, FolderLifecycleService, FolderService};
use crate::quota::QuotaAccountant;
use crate::share::ShareService;
use crate::trash::TrashService;
use crate::user::UserService;

/// All services sharing one set of collaborators.
#[derive(Debug, Clone)]
pub struct Services {
    /// Repositories the services were built on.
    pub repositories: Repositories,
    /// Storage manager.
    pub storage: Arc<StorageManager>,
    /// Permission resolver.
    pub resolver: Arc<SharePermissionResolver>,
    /// Quota accountant.
    pub accountant: Arc<QuotaAccountant>,
    /// Accounts.
    pub users: Arc<UserService>,
    /// Folder tree.
    pub folders: Arc<FolderService>,
    /// Folder delete, restore, purge.
    pub folder_lifecycle: Arc<FolderLifecycleService>,
    /// Zip downloads.
    pub archives: Arc<ArchiveService>,
    /// File rename, move, delete, restore, purge.
    pub files: Arc<FileService>,
    /// Uploads.
    pub uploads: Arc<UploadService>,
    /// Downloads.
    pub downloads: Arc<DownloadService>,
    /// Version history.
    pub versions: Arc<VersionService>,
    /// Name search.
    pub search: Arc<SearchService>,
    /// Shares.
    pub shares: Arc<ShareService>,
    /// Trash.
    pub trash: Arc<TrashService>,
    /// Batch operations.
    pub batch: Arc<BatchService>,
}

impl Services {
    /// Builds every service.
    pub fn new(
        repos: Repositories,
        storage: Arc<StorageManager>,
        activity_logger: Arc<dyn ActivityLogger>,
        quota: QuotaConfig,
    ) -> Self {
        let activity = ActivityRecorder::new(activity_logger);
        let resolver = Arc::new(SharePermissionResolver::from_repositories(&repos));
        let accountant = Arc::new(QuotaAccountant::new(
            Arc::clone(&repos.users),
            Arc::clone(&repos.files),
        ));
        let purger = Arc::new(Purger::new(
            Arc::clone(&repos.folders),
            Arc::clone(&repos.files),
            Arc::clone(&repos.versions),
            Arc::clone(&repos.shares),
            Arc::clone(&storage),
        ));

        let users = Arc::new(UserService::new(
            Arc::clone(&repos.users),
            Arc::clone(&repos.folders),
            Arc::clone(&accountant),
            quota,
        ));
        let folders = Arc::new(FolderService::new(
            Arc::clone(&repos.folders),
            Arc::clone(&repos.files),
            Arc::clone(&resolver),
            Arc::clone(&accountant),
            activity.clone(),
        ));
        let folder_lifecycle = Arc::new(FolderLifecycleService::new(
            Arc::clone(&repos.folders),
            Arc::clone(&repos.files),
            Arc::clone(&resolver),
            Arc::clone(&accountant),
            Arc::clone(&purger),
            activity.clone(),
        ));
        let archives = Arc::new(ArchiveService::new(
            Arc::clone(&repos.folders),
            Arc::clone(&repos.files),
            Arc::clone(&storage),
            Arc::clone(&resolver),
            activity.clone(),
        ));
        let files = Arc::new(FileService::new(
            Arc::clone(&repos.files),
            Arc::clone(&repos.folders),
            Arc::clone(&resolver),
            Arc::clone(&accountant),
            Arc::clone(&purger),
            activity.clone(),
        ));
        let uploads = Arc::new(UploadService::new(
            Arc::clone(&repos.files),
            Arc::clone(&folders),
            Arc::clone(&storage),
            Arc::clone(&accountant),
            activity.clone(),
        ));
        let downloads = Arc::new(DownloadService::new(
            Arc::clone(&repos.files),
            Arc::clone(&repos.versions),
            Arc::clone(&storage),
            Arc::clone(&resolver),
            activity.clone(),
        ));
        let versions = Arc::new(VersionService::new(
            Arc::clone(&repos.files),
            Arc::clone(&repos.versions),
            Arc::clone(&resolver),
        ));
        let search = Arc::new(SearchService::new(
            Arc::clone(&repos.folders),
            Arc::clone(&repos.files),
        ));
        let shares = Arc::new(ShareService::new(
            Arc::clone(&repos.shares),
            Arc::clone(&repos.users),
            Arc::clone(&repos.folders),
            Arc::clone(&repos.files),
            Arc::clone(&folders),
            activity.clone(),
        ));
        let trash = Arc::new(TrashService::new(
            Arc::clone(&repos.folders),
            Arc::clone(&repos.files),
            Arc::clone(&accountant),
            Arc::clone(&purger),
            activity.clone(),
        ));
        let batch = Arc::new(BatchService::new(
            Arc::clone(&files),
            Arc::clone(&folders),
            Arc::clone(&folder_lifecycle),
            activity,
        ));

        Self {
            repositories: repos,
            storage,
            resolver,
            accountant,
            users,
            folders,
            folder_lifecycle,
            archives,
            files,
            uploads,
            downloads,
            versions,
            search,
            shares,
            trash,
            batch,
        }
    }
}
