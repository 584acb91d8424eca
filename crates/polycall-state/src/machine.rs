use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use polycall_error::{ErrorKind, PolyError};

/// A state graph a [`Engine`] can drive: which edges are legal out of a
/// given state. Implemented once for [`ConnectionState`] (`spec.md` §4.2)
/// and reused by `polycall-stream`'s own state enum (`spec.md` §4.4: "reuses
/// C4's transition engine") so both subsystems share one optimistic-
/// concurrency state-machine implementation instead of hand-rolling two.
pub trait StateGraph: fmt::Debug + Copy + Eq {
    /// Whether `to` is a legal transition out of `self`. Same-state
    /// transitions are always legal (idempotent) and are checked separately
    /// by [`Engine::request_transition`], so implementations don't need to
    /// special-case `self == to`.
    fn allows(self, to: Self) -> bool;
}

/// Node in the connection lifecycle (`spec.md` §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Init,
    Handshake,
    Auth,
    Ready,
    Active,
    Streaming,
    Closing,
    Closed,
    Error,
}

impl StateGraph for ConnectionState {
    fn allows(self, to: ConnectionState) -> bool {
        use ConnectionState::*;
        if to == Error {
            return true;
        }
        match self {
            Init => to == Handshake,
            Handshake => matches!(to, Auth | Error),
            Auth => matches!(to, Ready | Error),
            Ready => matches!(to, Active | Streaming | Closing),
            Active => matches!(to, Streaming | Closing),
            Streaming => matches!(to, Active | Closing),
            Closing => to == Closed,
            Closed => false,
            Error => to == Init,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError<S: StateGraph> {
    /// `from_expected` no longer matches the current state.
    InvalidTransition { expected: S, actual: S },
    /// `to` is not reachable from the current state at all.
    IllegalEdge { from: S, to: S },
}

impl<S: StateGraph> fmt::Display for StateError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::InvalidTransition { expected, actual } => write!(
                f,
                "expected state {expected:?} but connection is in {actual:?}"
            ),
            StateError::IllegalEdge { from, to } => {
                write!(f, "no transition from {from:?} to {to:?}")
            }
        }
    }
}

impl<S: StateGraph> std::error::Error for StateError<S> {}

impl From<StateError<ConnectionState>> for PolyError {
    #[track_caller]
    fn from(err: StateError<ConnectionState>) -> Self {
        PolyError::new(ErrorKind::InvalidTransition, "polycall-state", err.to_string())
    }
}

/// Atomic view of a state machine's state, sequence and last-transition time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot<S: StateGraph> {
    pub state: S,
    pub sequence: u64,
    pub timestamp_ns: u64,
}

struct Cell<S: StateGraph> {
    state: S,
    sequence: u64,
    timestamp_ns: u64,
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// A single state-holder's transition engine, generic over any
/// [`StateGraph`]. `spec.md` §5: "each may be used from one thread at a
/// time, or protected internally when marked shared" — holds its own lock
/// so a handle can be shared freely.
pub struct Engine<S: StateGraph> {
    cell: Mutex<Cell<S>>,
}

impl<S: StateGraph> Engine<S> {
    pub fn new(initial: S) -> Self {
        Self {
            cell: Mutex::new(Cell { state: initial, sequence: 0, timestamp_ns: now_ns() }),
        }
    }

    pub fn snapshot(&self) -> Snapshot<S> {
        let cell = self.cell.lock();
        Snapshot { state: cell.state, sequence: cell.sequence, timestamp_ns: cell.timestamp_ns }
    }

    /// Requests a transition to `to`, failing unless the machine is
    /// currently in `from_expected` (optimistic concurrency per `spec.md`
    /// §4.2). A request where `to == from_expected == current` is a no-op
    /// that does not bump the sequence counter.
    pub fn request_transition(&self, from_expected: S, to: S) -> Result<Snapshot<S>, StateError<S>> {
        let mut cell = self.cell.lock();

        if cell.state != from_expected {
            return Err(StateError::InvalidTransition { expected: from_expected, actual: cell.state });
        }

        if cell.state == to {
            return Ok(Snapshot { state: cell.state, sequence: cell.sequence, timestamp_ns: cell.timestamp_ns });
        }

        if !cell.state.allows(to) {
            return Err(StateError::IllegalEdge { from: cell.state, to });
        }

        cell.state = to;
        cell.sequence += 1;
        cell.timestamp_ns = now_ns();

        Ok(Snapshot { state: cell.state, sequence: cell.sequence, timestamp_ns: cell.timestamp_ns })
    }
}

/// A connection's state machine, specialized to [`ConnectionState`].
pub type StateMachine = Engine<ConnectionState>;

impl Default for StateMachine {
    fn default() -> Self {
        Engine::new(ConnectionState::Init)
    }
}

impl StateMachine {
    /// Convenience constructor matching the original (pre-generic) API.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionState::*;

    #[test]
    fn happy_path_walks_init_to_ready() {
        let m = StateMachine::new();
        m.request_transition(Init, Handshake).unwrap();
        m.request_transition(Handshake, Auth).unwrap();
        let snap = m.request_transition(Auth, Ready).unwrap();
        assert_eq!(snap.state, Ready);
        assert_eq!(snap.sequence, 3);
    }

    #[test]
    fn stale_expected_state_is_rejected() {
        let m = StateMachine::new();
        m.request_transition(Init, Handshake).unwrap();
        let err = m.request_transition(Init, Auth).unwrap_err();
        assert_eq!(err, StateError::InvalidTransition { expected: Init, actual: Handshake });
    }

    #[test]
    fn illegal_edge_is_rejected() {
        let m = StateMachine::new();
        let err = m.request_transition(Init, Ready).unwrap_err();
        assert!(matches!(err, StateError::IllegalEdge { .. }));
    }

    #[test]
    fn same_state_transition_is_idempotent_and_does_not_bump_sequence() {
        let m = StateMachine::new();
        m.request_transition(Init, Handshake).unwrap();
        let before = m.snapshot();
        let after = m.request_transition(Handshake, Handshake).unwrap();
        assert_eq!(before.sequence, after.sequence);
    }

    #[test]
    fn any_state_can_transition_to_error_and_reset_to_init() {
        let m = StateMachine::new();
        m.request_transition(Init, Handshake).unwrap();
        m.request_transition(Handshake, Error).unwrap();
        let snap = m.request_transition(Error, Init).unwrap();
        assert_eq!(snap.state, Init);
    }

    #[test]
    fn active_and_streaming_can_flip_back_and_forth() {
        let m = StateMachine::new();
        m.request_transition(Init, Handshake).unwrap();
        m.request_transition(Handshake, Auth).unwrap();
        m.request_transition(Auth, Ready).unwrap();
        m.request_transition(Ready, Active).unwrap();
        m.request_transition(Active, Streaming).unwrap();
        let snap = m.request_transition(Streaming, Active).unwrap();
        assert_eq!(snap.state, Active);
    }

    #[test]
    fn closing_only_reaches_closed() {
        let m = StateMachine::new();
        m.request_transition(Init, Handshake).unwrap();
        m.request_transition(Handshake, Auth).unwrap();
        m.request_transition(Auth, Ready).unwrap();
        m.request_transition(Ready, Closing).unwrap();
        let err = m.request_transition(Closing, Active).unwrap_err();
        assert!(matches!(err, StateError::IllegalEdge { .. }));
        let snap = m.request_transition(Closing, Closed).unwrap();
        assert_eq!(snap.state, Closed);
    }
}
