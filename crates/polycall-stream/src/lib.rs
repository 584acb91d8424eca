#![doc = include_str!("../README.md")]

mod config;
mod engine;
mod error;
mod observer;
mod reconnect;
mod state;
mod stats;

pub use config::StreamConfig;
pub use engine::DuplexStream;
pub use error::StreamError;
pub use observer::StreamObserver;
pub use reconnect::backoff_delay_ms;
pub use state::StreamState;
pub use stats::StreamStats;
