//! Share-based access control with folder inheritance.

pub mod checker;
pub mod inheritance;
pub mod resolver;

pub use checker::ShareChecker;
pub use inheritance::ShareInheritanceResolver;
pub use resolver::{EffectivePermission, PermissionSource, SharePermissionResolver};
