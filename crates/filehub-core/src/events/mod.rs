//! Activity events emitted by FileHub operations.

pub mod activity;

pub use activity::{ActivityAction, ActivityEvent, ActivityTarget};
