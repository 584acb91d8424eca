use polycall_wire::Message;

use crate::error::StreamError;

/// Receives lifecycle notifications from a [`crate::DuplexStream`]
/// (`spec.md` §4.4).
pub trait StreamObserver: Send + Sync {
    fn on_next(&self, message: &Message) {
        let _ = message;
    }
    fn on_error(&self, error: &StreamError) {
        let _ = error;
    }
    fn on_complete(&self) {}
}
