//! The caller's trash.

pub mod service;

pub use service::{TrashListing, TrashService};
