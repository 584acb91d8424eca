#![doc = include_str!("../README.md")]

mod bridge;
mod codec;
mod error;
mod local;
mod observer;
mod remote;
mod routing;

pub use bridge::{Bridge, OutboundChannel, FFI_INVOKE_COMMAND_ID};
pub use codec::{decode_value, encode_value};
pub use error::FfiError;
pub use local::{LocalFunction, LocalFunctionRegistry};
pub use observer::FfiObserver;
pub use remote::{RemoteFunctionEntry, RemoteFunctionRegistry};
pub use routing::{RoutingRule, RoutingTable};
