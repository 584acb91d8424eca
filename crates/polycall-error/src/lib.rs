#![doc = include_str!("../README.md")]

mod guid;
mod kind;

pub use guid::CryptonomicGuid;
pub use kind::ErrorKind;

use std::fmt;

/// How serious an error is, independent of its [`ErrorKind`].
///
/// Severities `>= Error` are also written to the security audit buffer
/// (see `polycall-security`); `Fatal` marks the owning context unhealthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        };
        f.write_str(s)
    }
}

/// Call-site location attached to every [`PolyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: &'static str,
    pub line: u32,
}

/// The global error taxonomy every subsystem converts into at its boundary.
///
/// Subsystems return their own narrow error type internally (e.g.
/// `polycall_wire::CodecError`) and implement `From<SubsystemError> for
/// PolyError` so the orchestrator can map everything to one shape, per
/// `spec.md` §7: "each subsystem returns its own kind; the orchestrator maps
/// to the global taxonomy."
#[derive(Debug, Clone)]
pub struct PolyError {
    pub kind: ErrorKind,
    pub subsystem: &'static str,
    pub severity: Severity,
    pub location: Location,
    pub message: String,
}

impl PolyError {
    #[track_caller]
    pub fn new(kind: ErrorKind, subsystem: &'static str, message: impl Into<String>) -> Self {
        let caller = std::panic::Location::caller();
        Self {
            severity: kind.default_severity(),
            kind,
            subsystem,
            location: Location {
                file: caller.file(),
                line: caller.line(),
            },
            message: message.into(),
        }
    }

    #[track_caller]
    pub fn with_severity(
        kind: ErrorKind,
        subsystem: &'static str,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        let mut err = Self::new(kind, subsystem, message);
        err.severity = severity;
        err
    }

    /// True once severity reaches `Error`, i.e. this should be audited.
    pub fn is_auditable(&self) -> bool {
        self.severity >= Severity::Error
    }
}

impl fmt::Display for PolyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}:{}): {}",
            self.severity, self.subsystem, self.location.file, self.location.line, self.message
        )
    }
}

impl std::error::Error for PolyError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auditable_threshold() {
        let info = PolyError::new(ErrorKind::NotFound, "test", "missing");
        assert!(!info.is_auditable());

        let fatal = PolyError::with_severity(
            ErrorKind::Internal,
            "test",
            Severity::Fatal,
            "boom",
        );
        assert!(fatal.is_auditable());
    }

    #[test]
    fn display_includes_subsystem_and_message() {
        let err = PolyError::new(ErrorKind::Timeout, "pool", "acquire timed out");
        let rendered = err.to_string();
        assert!(rendered.contains("pool"));
        assert!(rendered.contains("acquire timed out"));
    }
}
