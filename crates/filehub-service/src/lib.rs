//! # filehub-service
//!
//! Business logic service layer for FileHub. Each service orchestrates
//! repositories, storage, the share resolver and the quota accountant to
//! implement one group of use cases.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references. [`Services`] wires them all.

pub mod activity;
pub mod batch;
pub mod container;
pub mod context;
pub mod file;
pub mod folder;
mod lookup;
pub mod quota;
pub mod share;
pub mod trash;
pub mod user;

pub use activity::{ActivityRecorder, NoopActivityLogger, TracingActivityLogger};
pub use batch::{BatchResult, BatchService};
pub use container::Services;
pub use context::RequestContext;
pub use file::{
    DownloadService, FileService, PurgeReport, SearchService, UploadService, VersionService,
};
pub use folder::{ArchiveService, FolderLifecycleService, FolderService};
pub use quota::QuotaAccountant;
pub use share::ShareService;
pub use trash::TrashService;
pub use user::UserService;
