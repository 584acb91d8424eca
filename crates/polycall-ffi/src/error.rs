use std::fmt;

use polycall_error::{ErrorKind, PolyError};
use polycall_types::TypeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FfiError {
    /// A local or remote function was registered twice under the same
    /// qualified name.
    DuplicateFunction { name: String },
    /// No local function is registered under the requested name.
    FunctionNotFound { name: String },
    /// Neither an explicit endpoint, a remote registry entry, nor a routing
    /// rule resolved a target for an outbound call.
    NoRoute { name: String },
    /// A call's argument or return value failed conversion to the target
    /// signature's declared type.
    TypeMismatch(String),
    /// A command message's FFI-invoke payload didn't decode cleanly (missing
    /// or malformed function-name / argument parameters).
    MalformedPayload,
    /// The outbound send channel rejected the message.
    SendFailed(String),
    /// No response arrived for an outbound call before its deadline.
    Timeout,
    /// The remote side reported a failure; carries its status code and
    /// message verbatim.
    InvocationFailed { code: u16, message: String },
}

impl fmt::Display for FfiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FfiError::DuplicateFunction { name } => write!(f, "function '{name}' is already registered"),
            FfiError::FunctionNotFound { name } => write!(f, "no function registered as '{name}'"),
            FfiError::NoRoute { name } => write!(f, "no route to a target for '{name}'"),
            FfiError::TypeMismatch(msg) => write!(f, "type mismatch: {msg}"),
            FfiError::MalformedPayload => write!(f, "malformed FFI invoke payload"),
            FfiError::SendFailed(msg) => write!(f, "send failed: {msg}"),
            FfiError::Timeout => write!(f, "outbound call timed out"),
            FfiError::InvocationFailed { code, message } => write!(f, "remote error {code}: {message}"),
        }
    }
}

impl std::error::Error for FfiError {}

impl From<TypeError> for FfiError {
    fn from(err: TypeError) -> Self {
        FfiError::TypeMismatch(err.to_string())
    }
}

impl From<FfiError> for PolyError {
    #[track_caller]
    fn from(err: FfiError) -> Self {
        let kind = match err {
            FfiError::DuplicateFunction { .. } => ErrorKind::Duplicate,
            FfiError::FunctionNotFound { .. } | FfiError::NoRoute { .. } => ErrorKind::NotFound,
            FfiError::TypeMismatch(_) => ErrorKind::TypeMismatch,
            FfiError::MalformedPayload => ErrorKind::MalformedFrame,
            FfiError::SendFailed(_) => ErrorKind::OperationFailed,
            FfiError::Timeout => ErrorKind::Timeout,
            FfiError::InvocationFailed { .. } => ErrorKind::OperationFailed,
        };
        PolyError::new(kind, "polycall-ffi", err.to_string())
    }
}
