use std::fmt;

use polycall_error::{ErrorKind, PolyError};

use crate::limiter::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeError {
    QuotaExceeded { kind: ResourceKind, requested: u64, quota: u64 },
    InvalidThreshold { percent: u8 },
    NotActive,
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::QuotaExceeded { kind, requested, quota } => {
                write!(f, "{kind:?} quota exceeded: requested {requested}, quota {quota}")
            }
            RuntimeError::InvalidThreshold { percent } => {
                write!(f, "threshold percentage {percent} is outside 1..=100")
            }
            RuntimeError::NotActive => write!(f, "component is not active"),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<RuntimeError> for PolyError {
    #[track_caller]
    fn from(err: RuntimeError) -> Self {
        let kind = match err {
            RuntimeError::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            RuntimeError::InvalidThreshold { .. } => ErrorKind::InvalidParameters,
            RuntimeError::NotActive => ErrorKind::InvalidState,
        };
        PolyError::new(kind, "polycall-runtime", err.to_string())
    }
}
