#![doc = include_str!("../README.md")]

mod error;
mod region;

pub use error::MemoryError;
pub use region::{ComponentId, Ownership, RegionHandle, RegionManager, RegionStats};
