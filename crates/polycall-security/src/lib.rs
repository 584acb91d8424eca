#![doc = include_str!("../README.md")]

mod acl;
mod audit;
mod error;
mod glob;
mod identity;
mod isolation;
mod mask;

pub use acl::{AclEntry, AclTable, CallerContext};
pub use audit::{AuditBuffer, AuditEvent};
pub use error::SecurityError;
pub use glob::glob_match;
pub use identity::{Identity, Token, TokenIssuer};
pub use isolation::IsolationLevel;
pub use mask::{PermissionMask, USER_RANGE};
