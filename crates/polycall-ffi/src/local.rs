use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use polycall_types::{FfiSignature, FfiValue};

use crate::error::FfiError;

type Invoke = Box<dyn Fn(&[FfiValue]) -> Result<FfiValue, FfiError> + Send + Sync>;

/// A function exposed to remote callers by this process (`spec.md` §1:
/// "routes remote calls to locally registered functions").
pub struct LocalFunction {
    pub signature: FfiSignature,
    invoke: Invoke,
}

impl LocalFunction {
    pub fn call(&self, args: &[FfiValue]) -> Result<FfiValue, FfiError> {
        (self.invoke)(args)
    }
}

impl fmt::Debug for LocalFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalFunction").field("signature", &self.signature).finish_non_exhaustive()
    }
}

/// Qualified-name-keyed table of locally callable functions. Duplicate
/// registration under the same name is rejected.
#[derive(Default)]
pub struct LocalFunctionRegistry {
    functions: RwLock<HashMap<String, Arc<LocalFunction>>>,
}

impl LocalFunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        name: impl Into<String>,
        signature: FfiSignature,
        invoke: impl Fn(&[FfiValue]) -> Result<FfiValue, FfiError> + Send + Sync + 'static,
    ) -> Result<(), FfiError> {
        let name = name.into();
        let mut functions = self.functions.write();
        if functions.contains_key(&name) {
            return Err(FfiError::DuplicateFunction { name });
        }
        functions.insert(name, Arc::new(LocalFunction { signature, invoke: Box::new(invoke) }));
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<LocalFunction>> {
        self.functions.read().get(name).cloned()
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.functions.write().remove(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polycall_types::ValueTag;

    #[test]
    fn register_then_lookup_and_invoke() {
        let registry = LocalFunctionRegistry::new();
        registry
            .register("math.add", FfiSignature::new(vec![ValueTag::I32, ValueTag::I32], ValueTag::I32, 1), |args| {
                match (&args[0], &args[1]) {
                    (FfiValue::I32(a), FfiValue::I32(b)) => Ok(FfiValue::I32(a + b)),
                    _ => unreachable!(),
                }
            })
            .unwrap();

        let f = registry.lookup("math.add").unwrap();
        let result = f.call(&[FfiValue::I32(2), FfiValue::I32(3)]).unwrap();
        assert_eq!(result, FfiValue::I32(5));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = LocalFunctionRegistry::new();
        let sig = || FfiSignature::new(vec![], ValueTag::Void, 1);
        registry.register("f", sig(), |_| Ok(FfiValue::Void)).unwrap();
        let err = registry.register("f", sig(), |_| Ok(FfiValue::Void)).unwrap_err();
        assert_eq!(err, FfiError::DuplicateFunction { name: "f".into() });
    }

    #[test]
    fn unregister_removes_and_is_idempotent() {
        let registry = LocalFunctionRegistry::new();
        registry.register("f", FfiSignature::new(vec![], ValueTag::Void, 1), |_| Ok(FfiValue::Void)).unwrap();
        assert!(registry.unregister("f"));
        assert!(!registry.unregister("f"));
        assert!(registry.lookup("f").is_none());
    }
}
