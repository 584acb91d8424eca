use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use polycall_memory::{ComponentId, MemoryError, RegionHandle, RegionManager};
use polycall_security::IsolationLevel;

use crate::error::RuntimeError;
use crate::limiter::{LimiterConfig, ResourceLimiter};

/// How strictly a component's own security checks are applied, independent
/// of the isolation level its regions get (`spec.md` §3 "Component":
/// "security mode").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityMode {
    Enforcing,
    Permissive,
    Disabled,
}

/// An isolated execution context: a name, an isolation level, a leased set
/// of `polycall-memory` regions, and a resource limiter (`spec.md` §3
/// "Component", §4.8).
pub struct Component {
    pub id: ComponentId,
    pub name: String,
    pub isolation: IsolationLevel,
    pub security_mode: SecurityMode,
    regions: Mutex<Vec<RegionHandle>>,
    pub limiter: ResourceLimiter,
    active: AtomicBool,
    user_data: Mutex<Option<Vec<u8>>>,
}

impl Component {
    pub fn new(
        id: ComponentId,
        name: impl Into<String>,
        isolation: IsolationLevel,
        security_mode: SecurityMode,
        limiter_config: LimiterConfig,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            isolation,
            security_mode,
            regions: Mutex::new(Vec::new()),
            limiter: ResourceLimiter::new(limiter_config),
            active: AtomicBool::new(true),
            user_data: Mutex::new(None),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn attach_region(&self, handle: RegionHandle) -> Result<(), RuntimeError> {
        if !self.is_active() {
            return Err(RuntimeError::NotActive);
        }
        self.regions.lock().push(handle);
        Ok(())
    }

    pub fn regions(&self) -> Vec<RegionHandle> {
        self.regions.lock().clone()
    }

    pub fn set_user_data(&self, data: Vec<u8>) {
        *self.user_data.lock() = Some(data);
    }

    pub fn user_data(&self) -> Option<Vec<u8>> {
        self.user_data.lock().clone()
    }

    /// Releases every region this component holds through `manager`,
    /// zeroing on release, and marks the component inactive. Release
    /// failures (stale handles) are collected rather than aborting the
    /// walk, matching `spec.md` §4.8: "Cleanup walks the block list, zeros,
    /// and releases."
    pub fn cleanup(&self, manager: &RegionManager) -> Vec<MemoryError> {
        let handles = std::mem::take(&mut *self.regions.lock());
        let mut errors = Vec::new();
        for handle in handles {
            if let Err(err) = manager.release(handle) {
                errors.push(err);
            }
        }
        self.deactivate();
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polycall_memory::Ownership;

    fn component() -> Component {
        Component::new(1, "worker", IsolationLevel::Function, SecurityMode::Enforcing, LimiterConfig::default())
    }

    #[test]
    fn attaches_and_cleans_up_regions() {
        let manager = RegionManager::default();
        let comp = component();
        let handle = manager.allocate(64, Ownership::Exclusive(comp.id)).unwrap();
        comp.attach_region(handle).unwrap();
        assert_eq!(comp.regions().len(), 1);

        let errors = comp.cleanup(&manager);
        assert!(errors.is_empty());
        assert!(!comp.is_active());
        assert!(comp.regions().is_empty());
    }

    #[test]
    fn attaching_to_an_inactive_component_fails() {
        let comp = component();
        comp.deactivate();
        let manager = RegionManager::default();
        let handle = manager.allocate(64, Ownership::Exclusive(comp.id)).unwrap();
        let err = comp.attach_region(handle).unwrap_err();
        assert_eq!(err, RuntimeError::NotActive);
    }

    #[test]
    fn user_data_round_trips() {
        let comp = component();
        assert!(comp.user_data().is_none());
        comp.set_user_data(vec![1, 2, 3]);
        assert_eq!(comp.user_data(), Some(vec![1, 2, 3]));
    }
}
