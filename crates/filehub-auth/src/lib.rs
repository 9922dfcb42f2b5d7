//! # filehub-auth
//!
//! Authorization for FileHub items.
//!
//! ## Modules
//!
//! - `acl`: share lookup, ancestor-chain inheritance and effective
//!   permission resolution (owner, direct share, inherited share)

pub mod acl;

pub use acl::{EffectivePermission, PermissionSource, ShareChecker, ShareInheritanceResolver, SharePermissionResolver};
