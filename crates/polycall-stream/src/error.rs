use std::fmt;

use polycall_error::{ErrorKind, PolyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    /// A non-blocking `send` couldn't proceed because buffered bytes are
    /// over the configured backpressure threshold (`spec.md` §4.4).
    WouldBlock,
    /// The message exceeds `StreamConfig::max_message_size`.
    MessageTooLarge { size: usize, max: usize },
    /// The stream isn't in a state that allows sending or receiving.
    NotActive,
    /// The underlying transport is closed.
    Closed,
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::WouldBlock => write!(f, "stream send would block"),
            StreamError::MessageTooLarge { size, max } => {
                write!(f, "message of {size} bytes exceeds stream maximum of {max} bytes")
            }
            StreamError::NotActive => write!(f, "stream is not in an active state"),
            StreamError::Closed => write!(f, "stream is closed"),
        }
    }
}

impl std::error::Error for StreamError {}

impl From<StreamError> for PolyError {
    #[track_caller]
    fn from(err: StreamError) -> Self {
        let kind = match err {
            StreamError::WouldBlock => ErrorKind::OperationFailed,
            StreamError::MessageTooLarge { .. } => ErrorKind::CapacityExceeded,
            StreamError::NotActive => ErrorKind::InvalidState,
            StreamError::Closed => ErrorKind::OperationFailed,
        };
        PolyError::new(kind, "polycall-stream", err.to_string())
    }
}
