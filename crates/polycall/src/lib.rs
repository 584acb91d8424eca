#![doc = include_str!("../README.md")]

mod config;
mod context;

pub use config::ContextConfig;
pub use context::Context;
