#![doc = include_str!("../README.md")]

mod machine;

pub use machine::{ConnectionState, Engine, Snapshot, StateError, StateGraph, StateMachine};
