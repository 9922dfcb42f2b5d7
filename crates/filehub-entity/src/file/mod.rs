//! File and file version entities.

pub mod model;
pub mod version;

pub use model::{CreateFile, File};
pub use version::{FileVersion, VersionContent};
