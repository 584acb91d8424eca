#![doc = include_str!("../README.md")]

mod harness;

pub use harness::Harness;
pub use polycall_wire::Transport;
