/// Base delay for the first reconnect attempt.
const BASE_DELAY_MS: u64 = 100;

/// Computes the backoff delay for reconnect `attempt` (0-indexed),
/// doubling each time and capped at `reconnect_timeout_ms` (`spec.md` §4.4:
/// "Auto-reconnect ... retries with exponential backoff bounded by
/// reconnect_timeout_ms.").
pub fn backoff_delay_ms(attempt: u32, reconnect_timeout_ms: u64) -> u64 {
    let uncapped = BASE_DELAY_MS.saturating_mul(1u64.checked_shl(attempt).unwrap_or(u64::MAX));
    uncapped.min(reconnect_timeout_ms)
}
