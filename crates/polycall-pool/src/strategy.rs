use std::sync::atomic::{AtomicUsize, Ordering};

use crate::entry::PoolEntry;

/// Picks one candidate out of the currently idle entries. Implemented once
/// per strategy and dispatched through [`PoolStrategy`] — one enum, one
/// trait, mirroring the teacher's `Transport` enum-dispatch shape rather
/// than an open-coded vtable.
trait Select: Send + Sync {
    fn select<'a>(&self, idle: &'a [&'a PoolEntry]) -> Option<&'a PoolEntry>;
}

#[derive(Default)]
struct Fifo;
impl Select for Fifo {
    fn select<'a>(&self, idle: &'a [&'a PoolEntry]) -> Option<&'a PoolEntry> {
        idle.iter().min_by_key(|e| e.created_seq).copied()
    }
}

#[derive(Default)]
struct Lifo;
impl Select for Lifo {
    fn select<'a>(&self, idle: &'a [&'a PoolEntry]) -> Option<&'a PoolEntry> {
        idle.iter().max_by_key(|e| e.created_seq).copied()
    }
}

#[derive(Default)]
struct Lru;
impl Select for Lru {
    fn select<'a>(&self, idle: &'a [&'a PoolEntry]) -> Option<&'a PoolEntry> {
        idle.iter().min_by_key(|e| e.last_activity_ns).copied()
    }
}

#[derive(Default)]
struct RoundRobin {
    cursor: AtomicUsize,
}
impl Select for RoundRobin {
    fn select<'a>(&self, idle: &'a [&'a PoolEntry]) -> Option<&'a PoolEntry> {
        if idle.is_empty() {
            return None;
        }
        let i = self.cursor.fetch_add(1, Ordering::Relaxed) % idle.len();
        idle.get(i).copied()
    }
}

/// Acquisition strategy for picking among idle pool entries (`spec.md`
/// §4.9): FIFO (oldest), LIFO (newest), LRU (least-recent activity), or a
/// rotating round-robin index.
pub enum PoolStrategy {
    Fifo(Fifo),
    Lifo(Lifo),
    Lru(Lru),
    RoundRobin(RoundRobin),
}

impl PoolStrategy {
    pub fn fifo() -> Self {
        PoolStrategy::Fifo(Fifo)
    }

    pub fn lifo() -> Self {
        PoolStrategy::Lifo(Lifo)
    }

    pub fn lru() -> Self {
        PoolStrategy::Lru(Lru)
    }

    pub fn round_robin() -> Self {
        PoolStrategy::RoundRobin(RoundRobin::default())
    }

    pub(crate) fn select<'a>(&self, idle: &'a [&'a PoolEntry]) -> Option<&'a PoolEntry> {
        match self {
            PoolStrategy::Fifo(s) => s.select(idle),
            PoolStrategy::Lifo(s) => s.select(idle),
            PoolStrategy::Lru(s) => s.select(idle),
            PoolStrategy::RoundRobin(s) => s.select(idle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(endpoint: &str, created_seq: u64, last_activity_ns: u64) -> PoolEntry {
        PoolEntry {
            endpoint: endpoint.into(),
            state: crate::entry::EntryState::Idle,
            last_activity_ns,
            request_count: 0,
            created_seq,
            cooling_since_ns: None,
        }
    }

    #[test]
    fn fifo_picks_oldest_by_creation() {
        let a = entry("a", 1, 50);
        let b = entry("b", 2, 10);
        let idle = [&a, &b];
        assert_eq!(PoolStrategy::fifo().select(&idle).unwrap().endpoint, "a");
    }

    #[test]
    fn lifo_picks_newest_by_creation() {
        let a = entry("a", 1, 50);
        let b = entry("b", 2, 10);
        let idle = [&a, &b];
        assert_eq!(PoolStrategy::lifo().select(&idle).unwrap().endpoint, "b");
    }

    #[test]
    fn lru_picks_least_recently_active() {
        let a = entry("a", 1, 50);
        let b = entry("b", 2, 10);
        let idle = [&a, &b];
        assert_eq!(PoolStrategy::lru().select(&idle).unwrap().endpoint, "b");
    }

    #[test]
    fn round_robin_rotates_through_candidates() {
        let a = entry("a", 1, 0);
        let b = entry("b", 2, 0);
        let idle = [&a, &b];
        let strategy = PoolStrategy::round_robin();
        let first = strategy.select(&idle).unwrap().endpoint.clone();
        let second = strategy.select(&idle).unwrap().endpoint.clone();
        assert_ne!(first, second);
    }
}
