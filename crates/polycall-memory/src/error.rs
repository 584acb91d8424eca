use polycall_error::{ErrorKind, PolyError};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// Requested size exceeds the largest configured size class.
    RequestTooLarge { requested: usize, max_class: usize },
    /// A handle's generation didn't match the slot's current generation —
    /// either it was already freed, or its sentinel was corrupted.
    StaleOrWildFree,
    /// Handle refers to a slot outside the pool.
    InvalidHandle,
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::RequestTooLarge { requested, max_class } => write!(
                f,
                "requested allocation of {requested} bytes exceeds largest size class ({max_class} bytes)"
            ),
            MemoryError::StaleOrWildFree => {
                write!(f, "attempted to free a stale or already-freed region handle")
            }
            MemoryError::InvalidHandle => write!(f, "region handle does not belong to this pool"),
        }
    }
}

impl std::error::Error for MemoryError {}

impl From<MemoryError> for PolyError {
    #[track_caller]
    fn from(err: MemoryError) -> Self {
        let kind = match err {
            MemoryError::RequestTooLarge { .. } => ErrorKind::CapacityExceeded,
            MemoryError::StaleOrWildFree | MemoryError::InvalidHandle => ErrorKind::InvalidParameters,
        };
        PolyError::new(kind, "polycall-memory", err.to_string())
    }
}
