//! Folder entity and folder view models.

pub mod model;
pub mod view;

pub use model::{CreateFolder, Folder, ROOT_FOLDER_NAME};
pub use view::{Breadcrumb, FileSummary, FolderSummary, FolderView};
