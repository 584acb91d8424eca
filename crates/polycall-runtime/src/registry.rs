use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use polycall_memory::{ComponentId, RegionManager};
use polycall_security::IsolationLevel;

use crate::component::{Component, SecurityMode};
use crate::limiter::LimiterConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateName,
    NotFound,
}

/// Name-keyed table of live components; the orchestrator's single point of
/// component creation and teardown (`spec.md` §4.8 "Component lifecycle").
#[derive(Default)]
pub struct ComponentRegistry {
    components: Mutex<HashMap<String, Arc<Component>>>,
    next_id: AtomicU32,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &self,
        name: impl Into<String>,
        isolation: IsolationLevel,
        security_mode: SecurityMode,
        limiter_config: LimiterConfig,
    ) -> Result<Arc<Component>, RegistryError> {
        let name = name.into();
        let mut components = self.components.lock();
        if components.contains_key(&name) {
            return Err(RegistryError::DuplicateName);
        }
        let id: ComponentId = self.next_id.fetch_add(1, Ordering::Relaxed);
        let component = Arc::new(Component::new(id, name.clone(), isolation, security_mode, limiter_config));
        components.insert(name, component.clone());
        Ok(component)
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<Component>> {
        self.components.lock().get(name).cloned()
    }

    /// Removes `name` from the table and releases every region it holds
    /// through `manager`. Idempotent: destroying an unknown name is a
    /// `NotFound` error rather than a panic.
    pub fn destroy(&self, name: &str, manager: &RegionManager) -> Result<(), RegistryError> {
        let component = self.components.lock().remove(name).ok_or(RegistryError::NotFound)?;
        let _ = component.cleanup(manager);
        Ok(())
    }

    /// Names of every live component, for an orchestrator-driven teardown
    /// sweep during shutdown.
    pub fn names(&self) -> Vec<String> {
        self.components.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.components.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_lookup_then_destroy() {
        let registry = ComponentRegistry::new();
        let manager = RegionManager::default();
        registry.create("worker", IsolationLevel::Module, SecurityMode::Enforcing, LimiterConfig::default()).unwrap();

        assert!(registry.lookup("worker").is_some());
        registry.destroy("worker", &manager).unwrap();
        assert!(registry.lookup("worker").is_none());
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let registry = ComponentRegistry::new();
        registry.create("worker", IsolationLevel::None, SecurityMode::Permissive, LimiterConfig::default()).unwrap();
        let err = registry
            .create("worker", IsolationLevel::None, SecurityMode::Permissive, LimiterConfig::default())
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName);
    }

    #[test]
    fn destroying_unknown_name_is_not_found() {
        let registry = ComponentRegistry::new();
        let manager = RegionManager::default();
        let err = registry.destroy("ghost", &manager).unwrap_err();
        assert_eq!(err, RegistryError::NotFound);
    }

    #[test]
    fn assigned_ids_are_unique() {
        let registry = ComponentRegistry::new();
        let a = registry.create("a", IsolationLevel::None, SecurityMode::Enforcing, LimiterConfig::default()).unwrap();
        let b = registry.create("b", IsolationLevel::None, SecurityMode::Enforcing, LimiterConfig::default()).unwrap();
        assert_ne!(a.id, b.id);
    }
}
