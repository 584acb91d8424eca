use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use tracing::debug;

use crate::entry::{EntryState, PoolEntry};
use crate::error::PoolError;
use crate::strategy::PoolStrategy;

pub type Opener = Box<dyn Fn() -> Result<String, PoolError> + Send + Sync>;
pub type Validator = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Bounds and behavior for a [`Pool`] (`spec.md` §4.9).
pub struct PoolConfig {
    pub min: usize,
    pub max: usize,
    pub acquire_timeout_ms: u64,
    pub auto_scale: bool,
    pub cooldown_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { min: 0, max: 8, acquire_timeout_ms: 1_000, auto_scale: true, cooldown_ms: 1_000 }
    }
}

fn now_ns() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0)
}

/// Bounded `[min, max]` pool of named connection endpoints (`spec.md` §4.9).
/// Holds its own lock, like every other subsystem (`spec.md` §5).
pub struct Pool {
    config: PoolConfig,
    strategy: PoolStrategy,
    opener: Opener,
    validator: Option<Validator>,
    entries: Mutex<Vec<PoolEntry>>,
    next_seq: AtomicU64,
}

impl Pool {
    pub fn new(config: PoolConfig, strategy: PoolStrategy, opener: Opener) -> Self {
        Self { config, strategy, opener, validator: None, entries: Mutex::new(Vec::new()), next_seq: AtomicU64::new(0) }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Pre-opens `config.min` connections (`spec.md` §4.9 "Warmup").
    pub fn warmup(&self) -> Result<(), PoolError> {
        let deficit = {
            let entries = self.entries.lock();
            self.config.min.saturating_sub(entries.len())
        };
        for _ in 0..deficit {
            self.open_new_idle()?;
        }
        Ok(())
    }

    fn open_new_idle(&self) -> Result<String, PoolError> {
        let endpoint = (self.opener)()?;
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().push(PoolEntry {
            endpoint: endpoint.clone(),
            state: EntryState::Idle,
            last_activity_ns: now_ns(),
            request_count: 0,
            created_seq: seq,
            cooling_since_ns: None,
        });
        Ok(endpoint)
    }

    /// Promotes any `Cooling` entry whose `cooldown_ms` has elapsed back to
    /// `Idle` (`spec.md` §4.9 "Cooling").
    fn promote_cooled(&self) {
        let now = now_ns();
        let cooldown_ns = self.config.cooldown_ms.saturating_mul(1_000_000);
        for entry in self.entries.lock().iter_mut() {
            if entry.state == EntryState::Cooling {
                if let Some(since) = entry.cooling_since_ns {
                    if now.saturating_sub(since) >= cooldown_ns {
                        entry.state = EntryState::Idle;
                        entry.cooling_since_ns = None;
                    }
                }
            }
        }
    }

    /// Selects an idle entry per the configured strategy, auto-opening a
    /// new one if none is available and `auto_scale` allows growth, else
    /// waiting up to `config.acquire_timeout_ms` before `PoolExhausted`.
    pub fn acquire(&self) -> Result<String, PoolError> {
        let deadline = Instant::now() + Duration::from_millis(self.config.acquire_timeout_ms);
        loop {
            self.promote_cooled();

            {
                let mut entries = self.entries.lock();
                let refs: Vec<&PoolEntry> = entries.iter().filter(|e| e.state == EntryState::Idle).collect();
                let chosen = self.strategy.select(&refs).map(|e| e.endpoint.clone());
                if let Some(endpoint) = chosen {
                    let entry = entries.iter_mut().find(|e| e.endpoint == endpoint).expect("selected entry vanished");
                    entry.state = EntryState::Active;
                    entry.last_activity_ns = now_ns();
                    entry.request_count += 1;
                    return Ok(endpoint);
                }
            }

            let total = self.entries.lock().len();
            if total < self.config.max && self.config.auto_scale {
                let endpoint = self.open_new_idle()?;
                let mut entries = self.entries.lock();
                if let Some(entry) = entries.iter_mut().find(|e| e.endpoint == endpoint) {
                    entry.state = EntryState::Active;
                    entry.request_count += 1;
                }
                return Ok(endpoint);
            }

            if Instant::now() >= deadline {
                return Err(PoolError::PoolExhausted);
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// Returns `endpoint` to the pool. When a validator is configured and
    /// reports the connection unhealthy, the entry is dropped and the pool
    /// shrinks rather than being cycled back to `Idle` (`spec.md` §4.9).
    pub fn release(&self, endpoint: &str) -> Result<(), PoolError> {
        let healthy = self.validator.as_ref().is_none_or(|validate| validate(endpoint));
        let mut entries = self.entries.lock();
        let index = entries.iter().position(|e| e.endpoint == endpoint).ok_or(PoolError::NotFound)?;

        if healthy {
            let entry = &mut entries[index];
            entry.state = EntryState::Idle;
            entry.last_activity_ns = now_ns();
        } else {
            debug!(endpoint, "release validation failed, closing and shrinking pool");
            entries.remove(index);
        }
        Ok(())
    }

    /// Marks `endpoint` as having failed outside the normal release flow
    /// (e.g. a transport error while checked out): it enters `Cooling`
    /// instead of being removed, and becomes selectable again once
    /// `cooldown_ms` elapses (`spec.md` §4.9).
    pub fn mark_error(&self, endpoint: &str) -> Result<(), PoolError> {
        let mut entries = self.entries.lock();
        let entry = entries.iter_mut().find(|e| e.endpoint == endpoint).ok_or(PoolError::NotFound)?;
        entry.state = EntryState::Cooling;
        entry.cooling_since_ns = Some(now_ns());
        Ok(())
    }

    /// Drops every entry regardless of state, for orchestrator shutdown
    /// (`spec.md` §5 "release pool connections"). Idempotent.
    pub fn close_all(&self) {
        self.entries.lock().clear();
    }

    pub fn total(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn idle_count(&self) -> usize {
        self.entries.lock().iter().filter(|e| e.state == EntryState::Idle).count()
    }

    pub fn active_count(&self) -> usize {
        self.entries.lock().iter().filter(|e| e.state == EntryState::Active).count()
    }
}
