use polycall_state::{ConnectionState, Snapshot};

/// Receives connection-state snapshots published by
/// [`crate::bridge::Bridge::sync_state`] (`spec.md` §4.6: "publishes
/// `polycall-state` snapshots to FFI observers").
pub trait FfiObserver: Send + Sync {
    fn on_state_change(&self, snapshot: Snapshot<ConnectionState>);
}
