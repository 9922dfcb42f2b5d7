//! Folder tree, lifecycle and archive services.

pub mod archive;
pub mod lifecycle;
pub mod service;

pub use archive::{ArchiveService, FolderArchive};
pub use lifecycle::{FolderLifecycleService, SubtreeSummary};
pub use service::FolderService;
