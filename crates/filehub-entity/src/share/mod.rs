//! Share entity.

pub mod model;

pub use model::{CreateShare, Share, SharePermission, SharedItem};
