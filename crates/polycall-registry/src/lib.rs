#![doc = include_str!("../README.md")]

mod descriptor;
mod error;
mod message;
mod registry;

pub use descriptor::{CommandDescriptor, CommandError, CommandFlags, CommandSpec, Handler, Validator};
pub use error::RegistryError;
pub use message::{CommandMessage, CommandResponse, Param, Status};
pub use registry::Registry;
