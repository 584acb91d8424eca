use std::fmt;

use polycall_error::{ErrorKind, PolyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityError {
    /// No ACL entry matched, or a matching entry's requirements weren't met
    /// (`spec.md` §4.7: "Default policy is deny when no entry matches.").
    Denied,
}

impl fmt::Display for SecurityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityError::Denied => write!(f, "permission denied"),
        }
    }
}

impl std::error::Error for SecurityError {}

impl From<SecurityError> for PolyError {
    #[track_caller]
    fn from(err: SecurityError) -> Self {
        PolyError::new(ErrorKind::PermissionDenied, "polycall-security", err.to_string())
    }
}
