#![doc = include_str!("../README.md")]

mod checksum;
mod error;
mod message;
mod transport;

pub use checksum::checksum;
pub use error::{CodecError, TransportError};
pub use message::{Message, MessageFlags, MessageType, HEADER_SIZE, MAGIC, MAX_MESSAGE_SIZE, VERSION};
pub use transport::Transport;
