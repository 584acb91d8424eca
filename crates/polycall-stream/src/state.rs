use polycall_state::StateGraph;

/// Stream lifecycle (`spec.md` §4.4): `init → open → active ↔ paused →
/// closing → closed`, plus `error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Init,
    Open,
    Active,
    Paused,
    Closing,
    Closed,
    Error,
}

impl StateGraph for StreamState {
    fn allows(self, to: StreamState) -> bool {
        use StreamState::*;
        if to == Error {
            return true;
        }
        match self {
            Init => to == Open,
            Open => matches!(to, Active | Closing),
            Active => matches!(to, Paused | Closing),
            Paused => matches!(to, Active | Closing),
            Closing => to == Closed,
            Closed => false,
            Error => to == Init,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use StreamState::*;

    #[test]
    fn active_and_paused_flip_both_ways() {
        assert!(Active.allows(Paused));
        assert!(Paused.allows(Active));
    }

    #[test]
    fn closed_is_terminal_except_via_error_reset() {
        assert!(!Closed.allows(Open));
        assert!(Closed.allows(Error));
    }
}
