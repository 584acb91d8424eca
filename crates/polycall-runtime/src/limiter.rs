use parking_lot::Mutex;

use crate::error::RuntimeError;

/// The three quota dimensions a component is bounded by (`spec.md` §3
/// "Resource limiter", §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Memory,
    CpuMs,
    IoOps,
}

const KIND_COUNT: usize = 3;

fn index(kind: ResourceKind) -> usize {
    match kind {
        ResourceKind::Memory => 0,
        ResourceKind::CpuMs => 1,
        ResourceKind::IoOps => 2,
    }
}

/// Per-component quota configuration (`spec.md` §3 "Resource limiter").
#[derive(Debug, Clone, Copy)]
pub struct LimiterConfig {
    pub memory_quota: u64,
    pub cpu_quota_ms: u64,
    pub io_quota_ops: u64,
    /// When false, usage is tracked but never rejected.
    pub enforce: bool,
    /// When false, `alloc`/`free` are no-ops (quotas still configured).
    pub track: bool,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self { memory_quota: u64::MAX, cpu_quota_ms: u64::MAX, io_quota_ops: u64::MAX, enforce: true, track: true }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct KindState {
    current: u64,
    peak: u64,
    allocations: u64,
    frees: u64,
    violations: u64,
}

/// A snapshot of one resource kind's usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceUsage {
    pub current: u64,
    pub peak: u64,
    pub allocations: u64,
    pub frees: u64,
    pub violations: u64,
    pub quota: u64,
}

type ThresholdCallback = Box<dyn Fn(ResourceKind, u64, u64) + Send + Sync>;

struct ThresholdEntry {
    kind: ResourceKind,
    percent: u8,
    fired: bool,
    callback: ThresholdCallback,
}

/// Atomic quota enforcement over memory, CPU-ms and I/O-op budgets
/// (`spec.md` §4.8): `if enforce && current + amount > quota ->
/// QuotaExceeded`, else update `current`/`peak` and run any percentage
/// threshold callback newly crossed.
pub struct ResourceLimiter {
    quotas: [u64; KIND_COUNT],
    enforce: bool,
    track: bool,
    state: [Mutex<KindState>; KIND_COUNT],
    thresholds: Mutex<Vec<ThresholdEntry>>,
}

impl ResourceLimiter {
    pub fn new(config: LimiterConfig) -> Self {
        Self {
            quotas: [config.memory_quota, config.cpu_quota_ms, config.io_quota_ops],
            enforce: config.enforce,
            track: config.track,
            state: [Mutex::new(KindState::default()), Mutex::new(KindState::default()), Mutex::new(KindState::default())],
            thresholds: Mutex::new(Vec::new()),
        }
    }

    pub fn quota(&self, kind: ResourceKind) -> u64 {
        self.quotas[index(kind)]
    }

    /// Registers a callback fired the first time usage crosses `percent`
    /// of `kind`'s quota (1..=100). Re-fires if usage drops back under the
    /// threshold and crosses it again later.
    pub fn register_threshold(
        &self,
        kind: ResourceKind,
        percent: u8,
        callback: impl Fn(ResourceKind, u64, u64) + Send + Sync + 'static,
    ) -> Result<(), RuntimeError> {
        if !(1..=100).contains(&percent) {
            return Err(RuntimeError::InvalidThreshold { percent });
        }
        self.thresholds.lock().push(ThresholdEntry { kind, percent, fired: false, callback: Box::new(callback) });
        Ok(())
    }

    /// Checks and applies an allocation against `kind`'s quota.
    pub fn alloc(&self, kind: ResourceKind, amount: u64) -> Result<(), RuntimeError> {
        if !self.track {
            return Ok(());
        }
        let quota = self.quotas[index(kind)];
        let (current, fire) = {
            let mut state = self.state[index(kind)].lock();
            if self.enforce && state.current.saturating_add(amount) > quota {
                state.violations += 1;
                return Err(RuntimeError::QuotaExceeded { kind, requested: amount, quota });
            }
            state.current += amount;
            if state.current > state.peak {
                state.peak = state.current;
            }
            state.allocations += 1;
            (state.current, true)
        };
        if fire {
            self.fire_thresholds(kind, current, quota);
        }
        Ok(())
    }

    pub fn free(&self, kind: ResourceKind, amount: u64) {
        if !self.track {
            return;
        }
        let mut state = self.state[index(kind)].lock();
        state.current = state.current.saturating_sub(amount);
        state.frees += 1;
    }

    fn fire_thresholds(&self, kind: ResourceKind, current: u64, quota: u64) {
        if quota == 0 {
            return;
        }
        let percent_used = ((current as u128 * 100) / quota as u128) as u64;
        for entry in self.thresholds.lock().iter_mut().filter(|e| e.kind == kind) {
            let crossed = percent_used >= entry.percent as u64;
            if crossed && !entry.fired {
                entry.fired = true;
                (entry.callback)(kind, current, quota);
            } else if !crossed {
                entry.fired = false;
            }
        }
    }

    pub fn usage(&self, kind: ResourceKind) -> ResourceUsage {
        let state = self.state[index(kind)].lock();
        ResourceUsage {
            current: state.current,
            peak: state.peak,
            allocations: state.allocations,
            frees: state.frees,
            violations: state.violations,
            quota: self.quotas[index(kind)],
        }
    }

    /// Zeros current, peak and counters for every kind; quotas and
    /// registered thresholds' percentages are untouched, but their `fired`
    /// latch is cleared so they can fire again (`spec.md` §4.8: "Reset
    /// zeros current, peak, and counters but leaves quotas.").
    pub fn reset(&self) {
        for cell in &self.state {
            *cell.lock() = KindState::default();
        }
        for entry in self.thresholds.lock().iter_mut() {
            entry.fired = false;
        }
    }
}
