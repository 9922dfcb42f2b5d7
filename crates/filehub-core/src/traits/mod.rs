//! Core traits defined in `filehub-core` and implemented by other crates.

pub mod activity;
pub mod storage;

pub use activity::ActivityLogger;
pub use storage::{ByteStream, StorageObject, StorageObjectMeta, StorageProvider};
