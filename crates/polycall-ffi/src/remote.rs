use std::collections::HashMap;

use parking_lot::RwLock;
use polycall_types::FfiSignature;

use crate::error::FfiError;

/// A function known to live on another peer, with a fixed address
/// (`spec.md` §3 "Remote function entry": "qualified name, language id,
/// signature, target endpoint locator").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFunctionEntry {
    pub qualified_name: String,
    pub language_id: u16,
    pub signature: FfiSignature,
    pub target_endpoint: String,
}

/// Qualified-name-keyed directory of remote functions with a known, fixed
/// target. Consulted by outbound calls before falling back to
/// [`crate::routing::RoutingTable`]'s glob matching. Lookup key is the
/// qualified name; duplicates are forbidden (`spec.md` §3).
#[derive(Default)]
pub struct RemoteFunctionRegistry {
    entries: RwLock<HashMap<String, RemoteFunctionEntry>>,
}

impl RemoteFunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, entry: RemoteFunctionEntry) -> Result<(), FfiError> {
        let mut entries = self.entries.write();
        if entries.contains_key(&entry.qualified_name) {
            return Err(FfiError::DuplicateFunction { name: entry.qualified_name });
        }
        entries.insert(entry.qualified_name.clone(), entry);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<RemoteFunctionEntry> {
        self.entries.read().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polycall_types::ValueTag;

    fn entry(name: &str, endpoint: &str) -> RemoteFunctionEntry {
        RemoteFunctionEntry {
            qualified_name: name.into(),
            language_id: 2,
            signature: FfiSignature::new(vec![ValueTag::I32], ValueTag::I32, 2),
            target_endpoint: endpoint.into(),
        }
    }

    #[test]
    fn register_then_lookup() {
        let registry = RemoteFunctionRegistry::new();
        registry.register(entry("math.add", "tcp://peer-a")).unwrap();
        let found = registry.lookup("math.add").unwrap();
        assert_eq!(found.target_endpoint, "tcp://peer-a");
    }

    #[test]
    fn duplicate_qualified_name_is_rejected() {
        let registry = RemoteFunctionRegistry::new();
        registry.register(entry("math.add", "tcp://peer-a")).unwrap();
        let err = registry.register(entry("math.add", "tcp://peer-b")).unwrap_err();
        assert_eq!(err, FfiError::DuplicateFunction { name: "math.add".into() });
    }

    #[test]
    fn unknown_function_is_none() {
        let registry = RemoteFunctionRegistry::new();
        assert!(registry.lookup("nope").is_none());
    }
}
