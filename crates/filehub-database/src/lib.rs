//! # filehub-database
//!
//! Persistence port for FileHub: one repository trait per entity, the
//! PostgreSQL implementations used in production, and an in-memory
//! implementation of every trait for tests and embedded use.

pub mod connection;
mod error;
pub mod memory;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use memory::MemoryDatabase;
pub use repositories::Repositories;
