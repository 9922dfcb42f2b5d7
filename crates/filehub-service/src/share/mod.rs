//! Direct user shares.

pub mod service;

pub use service::{CreateShareRequest, ShareService};
