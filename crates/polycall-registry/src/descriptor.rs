use polycall_types::ValueTag;

use crate::error::RegistryError;
use crate::message::{CommandMessage, CommandResponse};

/// Per-descriptor behavior flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandFlags {
    /// Force single-flight dispatch for this command id (`spec.md` §5:
    /// "invocations of the same command are serialized only if the
    /// command's flags request it").
    pub serialize: bool,
}

pub type Handler = Box<dyn Fn(&CommandMessage) -> Result<Vec<u8>, CommandError> + Send + Sync>;
pub type Validator = Box<dyn Fn(&CommandMessage) -> Result<(), CommandError> + Send + Sync>;

/// Error a handler or validator can signal; distinct from [`RegistryError`]
/// because it crosses into application code and carries a free-form code +
/// message rather than the registry's own closed taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
    pub code: u16,
    pub message: String,
}

impl CommandError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

/// `spec.md` §3 "Command descriptor".
pub struct CommandDescriptor {
    pub id: u32,
    pub name: String,
    pub handler: Handler,
    pub validator: Option<Validator>,
    pub permission_mask: u64,
    pub flags: CommandFlags,
    /// Declared `(param_id, type)` pairs checked against the message's
    /// actual tags before the validator runs (`spec.md` §4.3: "Parameter
    /// type ANY matches any tag on read; all other tags must match
    /// exactly."). A param id with no declared entry here isn't checked.
    pub param_types: Vec<(u32, ValueTag)>,
}

impl CommandDescriptor {
    /// Checks every declared param type against the param actually present
    /// in `message` (missing params are left for the validator/handler to
    /// reject), per `spec.md` §4.3.
    fn check_param_types(&self, message: &CommandMessage) -> Result<(), CommandError> {
        for &(param_id, expected) in &self.param_types {
            if let Some(param) = message.param(param_id) {
                if !expected.accepts(param.type_tag) {
                    return Err(param_type_mismatch(param_id));
                }
            }
        }
        Ok(())
    }

    /// Checks declared param types, then the validator (if any), then the
    /// handler, wrapping the outcome into a [`CommandResponse`] (`spec.md`
    /// §4.3 dispatch order).
    pub(crate) fn invoke(&self, message: &CommandMessage) -> CommandResponse {
        if let Err(err) = self.check_param_types(message) {
            return CommandResponse::error(err.code, err.message);
        }
        if let Some(validator) = &self.validator {
            if let Err(err) = validator(message) {
                return CommandResponse::error(err.code, err.message);
            }
        }
        match (self.handler)(message) {
            Ok(data) => CommandResponse::success(data),
            Err(err) => CommandResponse::error(err.code, err.message),
        }
    }
}

impl std::fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("permission_mask", &self.permission_mask)
            .field("flags", &self.flags)
            .field("param_types", &self.param_types)
            .finish()
    }
}

/// Builder used at registration time; `id == 0` means "auto-assign"
/// (`spec.md` §3/§4.3).
pub struct CommandSpec {
    pub id: u32,
    pub name: String,
    pub handler: Handler,
    pub validator: Option<Validator>,
    pub permission_mask: u64,
    pub flags: CommandFlags,
    pub param_types: Vec<(u32, ValueTag)>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>, handler: Handler) -> Self {
        Self {
            id: 0,
            name: name.into(),
            handler,
            validator: None,
            permission_mask: 0,
            flags: CommandFlags::default(),
            param_types: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_permission_mask(mut self, mask: u64) -> Self {
        self.permission_mask = mask;
        self
    }

    pub fn with_flags(mut self, flags: CommandFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Declares the expected type tag for `param_id`; checked against the
    /// actual param on every dispatch before the validator runs (`spec.md`
    /// §4.3). `ValueTag::Any` accepts any actual tag.
    pub fn with_param_type(mut self, param_id: u32, tag: ValueTag) -> Self {
        self.param_types.push((param_id, tag));
        self
    }
}

pub(crate) fn missing_param(param_id: u32) -> CommandError {
    let err = RegistryError::MissingParam { param_id };
    CommandError::new(1, err.to_string())
}

pub(crate) fn param_type_mismatch(param_id: u32) -> CommandError {
    let err = RegistryError::ParamTypeMismatch { param_id };
    CommandError::new(2, err.to_string())
}
