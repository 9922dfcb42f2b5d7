//! Account bootstrap and usage reporting.

pub mod service;

pub use service::{CreateAccountRequest, UserService};
