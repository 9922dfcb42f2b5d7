//! Per-user byte accounting.

pub mod accountant;

pub use accountant::QuotaAccountant;
