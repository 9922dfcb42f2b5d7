//! File services: upload, download, versions, search, lifecycle, purge.

pub mod download;
pub mod purge;
pub mod search;
pub mod service;
pub mod upload;
pub mod version;

pub use download::{DownloadService, FileDownload};
pub use purge::{PurgeReport, Purger};
pub use search::{SearchResults, SearchService};
pub use service::FileService;
pub use upload::{
    MultiUploadResult, PathUpload, UploadOutcome, UploadRequest, UploadService, sha256_hex,
};
pub use version::VersionService;
