use std::fmt;

use polycall_error::{ErrorKind, PolyError};

/// Errors raised while decoding or encoding a [`crate::Message`] on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Buffer too short to hold a header, or declared sizes overrun the buffer.
    MalformedFrame,
    /// `version` field does not match the version this codec understands.
    UnsupportedVersion { found: u8 },
    /// Recomputed checksum does not match the header's `checksum` field.
    ChecksumMismatch,
    /// `payload_size` exceeds [`crate::MAX_MESSAGE_SIZE`].
    PayloadTooLarge { size: u32 },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::MalformedFrame => write!(f, "malformed frame"),
            CodecError::UnsupportedVersion { found } => {
                write!(f, "unsupported wire version {found}")
            }
            CodecError::ChecksumMismatch => write!(f, "checksum mismatch"),
            CodecError::PayloadTooLarge { size } => {
                write!(f, "payload of {size} bytes exceeds the maximum message size")
            }
        }
    }
}

impl std::error::Error for CodecError {}

impl From<CodecError> for PolyError {
    #[track_caller]
    fn from(err: CodecError) -> Self {
        let kind = match err {
            CodecError::MalformedFrame => ErrorKind::MalformedFrame,
            CodecError::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            CodecError::ChecksumMismatch => ErrorKind::ChecksumMismatch,
            CodecError::PayloadTooLarge { .. } => ErrorKind::CapacityExceeded,
        };
        PolyError::new(kind, "polycall-wire", err.to_string())
    }
}

/// Errors raised by a [`crate::ByteTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The transport has been closed, locally or by the peer.
    Closed,
    /// The operation did not complete within its timeout.
    Timeout,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Closed => write!(f, "transport closed"),
            TransportError::Timeout => write!(f, "transport operation timed out"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<TransportError> for PolyError {
    #[track_caller]
    fn from(err: TransportError) -> Self {
        let kind = match err {
            TransportError::Closed => ErrorKind::OperationFailed,
            TransportError::Timeout => ErrorKind::Timeout,
        };
        PolyError::new(kind, "polycall-wire", err.to_string())
    }
}
