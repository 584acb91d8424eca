use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use polycall_error::CryptonomicGuid;

use crate::mask::PermissionMask;

/// `spec.md` §4.7 "Audit events".
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub guid: CryptonomicGuid,
    pub timestamp_ns: u64,
    pub source: String,
    pub target: String,
    pub function: String,
    pub action: String,
    pub allowed: bool,
    pub missing_permissions: PermissionMask,
    pub details: String,
}

impl AuditEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        function: impl Into<String>,
        action: impl Into<String>,
        allowed: bool,
        missing_permissions: PermissionMask,
        details: impl Into<String>,
    ) -> Self {
        let source = source.into();
        Self {
            guid: CryptonomicGuid::generate(&source, 0),
            timestamp_ns: now_ns(),
            source,
            target: target.into(),
            function: function.into(),
            action: action.into(),
            allowed,
            missing_permissions,
            details: details.into(),
        }
    }
}

fn now_ns() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0)
}

type AuditCallback = Box<dyn Fn(&AuditEvent) + Send + Sync>;

/// Bounded single-producer-per-subsystem, multi-consumer (callback) ring
/// buffer (`spec.md` §4.7, §5 "Audit and telemetry buffers are
/// single-producer-per-subsystem, multi-consumer").
pub struct AuditBuffer {
    capacity: usize,
    events: Mutex<VecDeque<AuditEvent>>,
    callback: Mutex<Option<AuditCallback>>,
}

impl AuditBuffer {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, events: Mutex::new(VecDeque::with_capacity(capacity)), callback: Mutex::new(None) }
    }

    pub fn set_callback(&self, callback: impl Fn(&AuditEvent) + Send + Sync + 'static) {
        *self.callback.lock() = Some(Box::new(callback));
    }

    pub fn push(&self, event: AuditEvent) {
        if let Some(callback) = self.callback.lock().as_ref() {
            callback(&event);
        }
        let mut events = self.events.lock();
        if events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }
}
