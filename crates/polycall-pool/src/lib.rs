#![doc = include_str!("../README.md")]

mod entry;
mod error;
mod pool;
mod strategy;

pub use entry::{EntryState, PoolEntry};
pub use error::PoolError;
pub use pool::{Opener, Pool, PoolConfig, Validator};
pub use strategy::PoolStrategy;
