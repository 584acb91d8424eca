use std::fmt;

use polycall_error::{ErrorKind, PolyError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// No idle entry was available and either `max` was reached or
    /// `auto_scale` is disabled, for the full wait timeout.
    PoolExhausted,
    /// The configured opener failed to establish a new connection.
    OpenFailed(String),
    /// `release`/`mark_error` referenced an endpoint the pool doesn't hold.
    NotFound,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::PoolExhausted => write!(f, "connection pool exhausted"),
            PoolError::OpenFailed(msg) => write!(f, "failed to open connection: {msg}"),
            PoolError::NotFound => write!(f, "no such pool entry"),
        }
    }
}

impl std::error::Error for PoolError {}

impl From<PoolError> for PolyError {
    #[track_caller]
    fn from(err: PoolError) -> Self {
        let kind = match err {
            PoolError::PoolExhausted => ErrorKind::PoolExhausted,
            PoolError::OpenFailed(_) => ErrorKind::OperationFailed,
            PoolError::NotFound => ErrorKind::NotFound,
        };
        PolyError::new(kind, "polycall-pool", err.to_string())
    }
}
