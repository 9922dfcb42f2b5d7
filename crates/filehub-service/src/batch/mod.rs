//! Batch operations over mixed file and folder lists.

pub mod service;

pub use service::{BatchItemError, BatchResult, BatchService};
