use std::fmt;

use polycall_error::{ErrorKind, PolyError};

use crate::tag::ValueTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeError {
    /// No converter is registered for `(from, to)`.
    NoConversionRule { from: ValueTag, to: ValueTag },
    /// A conversion exists but the value doesn't fit in the target
    /// representation (narrowing overflow).
    RangeError { from: ValueTag, to: ValueTag },
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::NoConversionRule { from, to } => {
                write!(f, "no conversion rule from {from:?} to {to:?}")
            }
            TypeError::RangeError { from, to } => {
                write!(f, "value of type {from:?} does not fit in {to:?}")
            }
        }
    }
}

impl std::error::Error for TypeError {}

impl From<TypeError> for PolyError {
    #[track_caller]
    fn from(err: TypeError) -> Self {
        let kind = match err {
            TypeError::NoConversionRule { .. } => ErrorKind::TypeMismatch,
            TypeError::RangeError { .. } => ErrorKind::RangeError,
        };
        PolyError::new(kind, "polycall-types", err.to_string())
    }
}
