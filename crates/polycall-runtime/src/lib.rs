#![doc = include_str!("../README.md")]

mod component;
mod error;
mod limiter;
mod registry;

pub use component::{Component, SecurityMode};
pub use error::RuntimeError;
pub use limiter::{LimiterConfig, ResourceKind, ResourceLimiter, ResourceUsage};
pub use registry::{ComponentRegistry, RegistryError};
