//! # filehub-entity
//!
//! Domain entity models for FileHub. Every struct in this crate represents
//! a database table row or a domain value object. Database entities derive
//! `sqlx::FromRow`; enums stored in PostgreSQL derive `sqlx::Type`.

pub mod file;
pub mod folder;
pub mod item;
pub mod lifecycle;
pub mod name;
pub mod quota;
pub mod share;
pub mod user;

pub use item::{ItemRef, ItemType};
pub use lifecycle::Lifecycle;
