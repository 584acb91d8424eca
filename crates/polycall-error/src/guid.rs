use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static NONCE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A per-event identifier incorporating caller identity, state id, and a
/// time-based nonce (`spec.md` GLOSSARY: "Cryptonomic GUID"), used to
/// correlate audit events and error records across subsystems.
///
/// Hashed with `blake3`, the same hash the teacher codebase uses for its own
/// structural signature hashing — chosen for the same reason (fast,
/// dependency-light, already in the stack) rather than pulling in `uuid`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CryptonomicGuid([u8; 16]);

impl CryptonomicGuid {
    /// Generate a new GUID scoped to a caller identity and a state id.
    ///
    /// The nonce mixes a process-local monotonic counter with wall-clock
    /// time so GUIDs are unique within a process even if the clock hasn't
    /// advanced, and roughly ordered across processes.
    pub fn generate(caller_identity: &str, state_id: u64) -> Self {
        let nonce = NONCE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let now_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);

        let mut hasher = blake3::Hasher::new();
        hasher.update(caller_identity.as_bytes());
        hasher.update(&state_id.to_le_bytes());
        hasher.update(&nonce.to_le_bytes());
        hasher.update(&now_ns.to_le_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest.as_bytes()[..16]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for CryptonomicGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for CryptonomicGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CryptonomicGuid({})", self)
    }
}
