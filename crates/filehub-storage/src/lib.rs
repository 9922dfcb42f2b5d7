//! # filehub-storage
//!
//! Storage provider implementations for FileHub (local filesystem,
//! S3-compatible object stores, process memory) and the
//! [`StorageManager`] through which services reach them with bounded
//! latency.

pub mod keys;
pub mod manager;
pub mod providers;

pub use manager::StorageManager;
