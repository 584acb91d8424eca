use std::fmt;

use polycall_error::{ErrorKind, PolyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// Registration used a name or explicit id that's already taken.
    DuplicateCommand,
    /// No command with this id is registered.
    UnknownCommand { command_id: u32 },
    /// A parameter id appeared twice in the same command message.
    DuplicateParam { param_id: u32 },
    /// A parameter's declared type tag doesn't match what the command
    /// expects (and isn't `ANY`).
    ParamTypeMismatch { param_id: u32 },
    /// A required parameter is missing from the message.
    MissingParam { param_id: u32 },
    /// Buffer too short, or declared sizes overrun it, while decoding a
    /// command message or response.
    MalformedPayload,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateCommand => write!(f, "command id or name already registered"),
            RegistryError::UnknownCommand { command_id } => {
                write!(f, "no command registered with id {command_id}")
            }
            RegistryError::DuplicateParam { param_id } => {
                write!(f, "duplicate parameter id {param_id} in command message")
            }
            RegistryError::ParamTypeMismatch { param_id } => {
                write!(f, "parameter {param_id} has an unexpected type tag")
            }
            RegistryError::MissingParam { param_id } => {
                write!(f, "required parameter {param_id} is missing")
            }
            RegistryError::MalformedPayload => write!(f, "malformed command payload"),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<RegistryError> for PolyError {
    #[track_caller]
    fn from(err: RegistryError) -> Self {
        let kind = match err {
            RegistryError::DuplicateCommand => ErrorKind::Duplicate,
            RegistryError::UnknownCommand { .. } => ErrorKind::NotFound,
            RegistryError::DuplicateParam { .. }
            | RegistryError::ParamTypeMismatch { .. }
            | RegistryError::MissingParam { .. }
            | RegistryError::MalformedPayload => ErrorKind::InvalidParameters,
        };
        PolyError::new(kind, "polycall-registry", err.to_string())
    }
}
