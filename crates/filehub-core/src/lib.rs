//! # filehub-core
//!
//! Core crate for FileHub. Contains the unified error system, configuration
//! schemas, the storage adapter and activity logger traits, and the
//! activity event types.
//!
//! This crate has **no** internal dependencies on other FileHub crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
