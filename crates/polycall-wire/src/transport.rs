//! Byte-stream transport abstraction.
//!
//! The public API is the [`Transport`] enum; each backend implements the
//! internal [`ByteTransport`] trait. Grounded in the teacher's
//! `TransportBackend`/`Transport` pair, trimmed to the single in-memory
//! backend this spec requires (`spec.md` §1, §9: "the transport is an
//! abstracted byte-stream").

use crate::error::TransportError;
use crate::message::Message;

pub(crate) trait ByteTransport: Send + Sync {
    async fn send(&self, message: Message) -> Result<(), TransportError>;
    async fn recv(&self) -> Result<Message, TransportError>;
    fn close(&self);
    fn is_closed(&self) -> bool;
}

/// A connected byte-stream transport carrying [`Message`] frames.
#[derive(Clone, Debug)]
pub enum Transport {
    Mem(mem::MemTransport),
}

impl Transport {
    pub async fn send(&self, message: Message) -> Result<(), TransportError> {
        match self {
            Transport::Mem(t) => t.send(message).await,
        }
    }

    pub async fn recv(&self) -> Result<Message, TransportError> {
        match self {
            Transport::Mem(t) => t.recv().await,
        }
    }

    pub fn close(&self) {
        match self {
            Transport::Mem(t) => t.close(),
        }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            Transport::Mem(t) => t.is_closed(),
        }
    }

    /// Creates a cross-wired pair of in-memory transports, useful for tests
    /// and for components dispatching within the same process.
    pub fn mem_pair() -> (Self, Self) {
        let (a, b) = mem::MemTransport::pair();
        (Transport::Mem(a), Transport::Mem(b))
    }
}

pub mod mem;
