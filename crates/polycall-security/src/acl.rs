use parking_lot::RwLock;

use crate::error::SecurityError;
use crate::glob::glob_match;
use crate::isolation::IsolationLevel;
use crate::mask::PermissionMask;

/// `(function glob, caller language, caller context) -> (required
/// permission mask, required isolation level)` (`spec.md` §4.7).
#[derive(Debug, Clone)]
pub struct AclEntry {
    pub function_glob: String,
    /// `None` matches any caller language.
    pub caller_language: Option<u16>,
    /// `None` matches any caller context.
    pub caller_context: Option<String>,
    pub required_mask: PermissionMask,
    pub required_isolation: IsolationLevel,
}

impl AclEntry {
    pub fn new(function_glob: impl Into<String>, required_mask: PermissionMask, required_isolation: IsolationLevel) -> Self {
        Self {
            function_glob: function_glob.into(),
            caller_language: None,
            caller_context: None,
            required_mask,
            required_isolation,
        }
    }

    pub fn for_language(mut self, language_id: u16) -> Self {
        self.caller_language = Some(language_id);
        self
    }

    pub fn for_context(mut self, context: impl Into<String>) -> Self {
        self.caller_context = Some(context.into());
        self
    }

    fn matches(&self, caller: &CallerContext<'_>) -> bool {
        glob_match(&self.function_glob, caller.function)
            && self.caller_language.is_none_or(|lang| lang == caller.language)
            && self
                .caller_context
                .as_deref()
                .is_none_or(|ctx| ctx == caller.context)
    }
}

/// The caller-side facts an ACL check is evaluated against.
pub struct CallerContext<'a> {
    pub function: &'a str,
    pub language: u16,
    pub context: &'a str,
    pub permission_mask: PermissionMask,
    pub isolation: IsolationLevel,
}

/// Read-mostly ACL table (`spec.md` §5: "the routing table are read-mostly
/// and guarded by reader-writer locks" — the same applies to the ACL).
/// Entries are evaluated in registration order; the first match decides.
#[derive(Default)]
pub struct AclTable {
    entries: RwLock<Vec<AclEntry>>,
}

impl AclTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, entry: AclEntry) {
        self.entries.write().push(entry);
    }

    /// Evaluates `caller` against the table, zero-trust default deny.
    pub fn check(&self, caller: &CallerContext<'_>) -> Result<(), SecurityError> {
        let entries = self.entries.read();
        let entry = entries.iter().find(|e| e.matches(caller)).ok_or(SecurityError::Denied)?;

        if !caller.permission_mask.grants(entry.required_mask) {
            return Err(SecurityError::Denied);
        }
        if caller.isolation < entry.required_isolation {
            return Err(SecurityError::Denied);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller<'a>(function: &'a str, mask: PermissionMask, isolation: IsolationLevel) -> CallerContext<'a> {
        CallerContext { function, language: 1, context: "default", permission_mask: mask, isolation }
    }

    #[test]
    fn no_matching_entry_is_denied_by_default() {
        let table = AclTable::new();
        let err = table
            .check(&caller("math.add", PermissionMask::EXECUTE, IsolationLevel::None))
            .unwrap_err();
        assert_eq!(err, SecurityError::Denied);
    }

    #[test]
    fn matching_entry_with_sufficient_mask_and_isolation_is_allowed() {
        let table = AclTable::new();
        table.add(AclEntry::new("math.*", PermissionMask::EXECUTE, IsolationLevel::Function));

        let ok = table.check(&caller(
            "math.add",
            PermissionMask::EXECUTE | PermissionMask::NETWORK,
            IsolationLevel::Module,
        ));
        assert!(ok.is_ok());
    }

    #[test]
    fn insufficient_permission_mask_is_denied() {
        let table = AclTable::new();
        table.add(AclEntry::new("math.*", PermissionMask::ADMIN, IsolationLevel::None));

        let err = table
            .check(&caller("math.add", PermissionMask::EXECUTE, IsolationLevel::Container))
            .unwrap_err();
        assert_eq!(err, SecurityError::Denied);
    }

    #[test]
    fn insufficient_isolation_level_is_denied() {
        let table = AclTable::new();
        table.add(AclEntry::new("math.*", PermissionMask::EXECUTE, IsolationLevel::Process));

        let err = table
            .check(&caller("math.add", PermissionMask::EXECUTE, IsolationLevel::None))
            .unwrap_err();
        assert_eq!(err, SecurityError::Denied);
    }

    #[test]
    fn language_and_context_filters_are_respected() {
        let table = AclTable::new();
        table.add(
            AclEntry::new("math.*", PermissionMask::EXECUTE, IsolationLevel::None)
                .for_language(2)
                .for_context("sandbox"),
        );

        let err = table
            .check(&caller("math.add", PermissionMask::EXECUTE, IsolationLevel::None))
            .unwrap_err();
        assert_eq!(err, SecurityError::Denied, "entry requires language 2 and context sandbox");
    }
}
