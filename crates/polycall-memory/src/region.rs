use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::MemoryError;

/// Sentinel stamped into every live block's header; a free that doesn't see
/// this value means the handle is stale or the block was corrupted.
const MAGIC: u32 = 0xC0FF_EE11;

/// Default size classes, in bytes. A request is rounded up to the smallest
/// class that fits it, matching the teacher's hub allocator's "find smallest
/// size class" allocation strategy.
const DEFAULT_SIZE_CLASSES: &[usize] = &[256, 1024, 4096, 16384, 65536, 262144, 1_048_576];

/// Identifies the component that owns (or shares) a region.
pub type ComponentId = u32;

/// Who may access a region: one exclusive owner, or a named set of peers
/// sharing it (`spec.md` §3: "A component exclusively owns its regions;
/// shared regions carry the peer component name.").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ownership {
    Exclusive(ComponentId),
    Shared(Vec<ComponentId>),
}

impl Ownership {
    pub fn owns(&self, component: ComponentId) -> bool {
        match self {
            Ownership::Exclusive(owner) => *owner == component,
            Ownership::Shared(peers) => peers.contains(&component),
        }
    }
}

struct Block {
    magic: u32,
    generation: u32,
    size: usize,
    data: Vec<u8>,
    owner: Option<Ownership>,
    live: bool,
}

struct SizeClass {
    slot_size: usize,
    slots: Vec<Block>,
    free_list: Vec<usize>,
}

impl SizeClass {
    fn new(slot_size: usize) -> Self {
        Self {
            slot_size,
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    fn alloc(&mut self, owner: Ownership) -> (usize, u32) {
        if let Some(index) = self.free_list.pop() {
            let block = &mut self.slots[index];
            block.magic = MAGIC;
            block.live = true;
            block.owner = Some(owner);
            block.data.iter_mut().for_each(|b| *b = 0);
            (index, block.generation)
        } else {
            let index = self.slots.len();
            self.slots.push(Block {
                magic: MAGIC,
                generation: 0,
                size: self.slot_size,
                data: vec![0u8; self.slot_size],
                owner: Some(owner),
                live: true,
            });
            (index, 0)
        }
    }

    fn free(&mut self, index: usize, generation: u32) -> Result<(), MemoryError> {
        let block = self
            .slots
            .get_mut(index)
            .ok_or(MemoryError::InvalidHandle)?;
        if !block.live || block.magic != MAGIC || block.generation != generation {
            return Err(MemoryError::StaleOrWildFree);
        }
        block.data.iter_mut().for_each(|b| *b = 0);
        block.live = false;
        block.owner = None;
        block.generation = block.generation.wrapping_add(1);
        self.free_list.push(index);
        Ok(())
    }
}

/// A handle to an allocated region. Opaque to callers beyond its size;
/// presenting it back to [`RegionManager::release`] is the only valid use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionHandle {
    class: usize,
    index: usize,
    generation: u32,
    size: usize,
}

impl RegionHandle {
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Aggregate counters exposed for leak detection and diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionStats {
    pub allocations: u64,
    pub frees: u64,
    pub live: u64,
}

/// Pooled allocator: one free list per size class, guarded by its own lock
/// (`spec.md` §5: "Subsystems ... each hold their own mutual-exclusion
/// primitive; no global lock.").
pub struct RegionManager {
    classes: Vec<Mutex<SizeClass>>,
    allocations: AtomicU64,
    frees: AtomicU64,
}

impl Default for RegionManager {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE_CLASSES)
    }
}

impl RegionManager {
    pub fn new(size_classes: &[usize]) -> Self {
        let mut classes: Vec<usize> = size_classes.to_vec();
        classes.sort_unstable();
        Self {
            classes: classes.into_iter().map(|s| Mutex::new(SizeClass::new(s))).collect(),
            allocations: AtomicU64::new(0),
            frees: AtomicU64::new(0),
        }
    }

    fn class_for(&self, size: usize) -> Option<usize> {
        self.classes
            .iter()
            .position(|c| c.lock().slot_size >= size)
    }

    /// Allocate a region of at least `size` bytes, tagged with `owner`.
    pub fn allocate(&self, size: usize, owner: Ownership) -> Result<RegionHandle, MemoryError> {
        let class = self.class_for(size).ok_or_else(|| MemoryError::RequestTooLarge {
            requested: size,
            max_class: self.classes.last().map(|c| c.lock().slot_size).unwrap_or(0),
        })?;

        let mut guard = self.classes[class].lock();
        let slot_size = guard.slot_size;
        let (index, generation) = guard.alloc(owner);
        self.allocations.fetch_add(1, Ordering::Relaxed);

        Ok(RegionHandle {
            class,
            index,
            generation,
            size: slot_size,
        })
    }

    /// Release a region, zeroing its backing bytes before it returns to the
    /// free list (`spec.md` §4.8: "Cleanup walks the block list, zeros, and
    /// releases").
    pub fn release(&self, handle: RegionHandle) -> Result<(), MemoryError> {
        let mut guard = self
            .classes
            .get(handle.class)
            .ok_or(MemoryError::InvalidHandle)?
            .lock();
        guard.free(handle.index, handle.generation)?;
        self.frees.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Write bytes into an allocated region. Fails the same way `release`
    /// would if the handle is stale.
    pub fn write(&self, handle: RegionHandle, offset: usize, bytes: &[u8]) -> Result<(), MemoryError> {
        let mut guard = self
            .classes
            .get(handle.class)
            .ok_or(MemoryError::InvalidHandle)?
            .lock();
        let block = guard
            .slots
            .get_mut(handle.index)
            .ok_or(MemoryError::InvalidHandle)?;
        if !block.live || block.generation != handle.generation {
            return Err(MemoryError::StaleOrWildFree);
        }
        let end = offset + bytes.len();
        if end > block.data.len() {
            return Err(MemoryError::RequestTooLarge {
                requested: end,
                max_class: block.data.len(),
            });
        }
        block.data[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    pub fn read(&self, handle: RegionHandle) -> Result<Vec<u8>, MemoryError> {
        let guard = self
            .classes
            .get(handle.class)
            .ok_or(MemoryError::InvalidHandle)?
            .lock();
        let block = guard.slots.get(handle.index).ok_or(MemoryError::InvalidHandle)?;
        if !block.live || block.generation != handle.generation {
            return Err(MemoryError::StaleOrWildFree);
        }
        Ok(block.data.clone())
    }

    /// Current live allocation count, used for leak detection.
    pub fn stats(&self) -> RegionStats {
        let allocations = self.allocations.load(Ordering::Relaxed);
        let frees = self.frees.load(Ordering::Relaxed);
        RegionStats {
            allocations,
            frees,
            live: allocations.saturating_sub(frees),
        }
    }

    /// Walk every size class and report handles still marked live. Intended
    /// for shutdown diagnostics, not the hot path.
    pub fn leaked(&self) -> Vec<RegionHandle> {
        let mut leaks = Vec::new();
        for (class_idx, class) in self.classes.iter().enumerate() {
            let guard = class.lock();
            for (index, block) in guard.slots.iter().enumerate() {
                if block.live {
                    leaks.push(RegionHandle {
                        class: class_idx,
                        index,
                        generation: block.generation,
                        size: block.size,
                    });
                }
            }
        }
        leaks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_rounds_up_to_size_class() {
        let mgr = RegionManager::default();
        let handle = mgr.allocate(10, Ownership::Exclusive(1)).unwrap();
        assert_eq!(handle.size(), 256);
    }

    #[test]
    fn release_zeroes_and_allows_reuse() {
        let mgr = RegionManager::default();
        let handle = mgr.allocate(10, Ownership::Exclusive(1)).unwrap();
        mgr.write(handle, 0, b"hello").unwrap();
        mgr.release(handle).unwrap();

        let handle2 = mgr.allocate(10, Ownership::Exclusive(2)).unwrap();
        let bytes = mgr.read(handle2).unwrap();
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn double_free_is_rejected() {
        let mgr = RegionManager::default();
        let handle = mgr.allocate(10, Ownership::Exclusive(1)).unwrap();
        mgr.release(handle).unwrap();
        let err = mgr.release(handle).unwrap_err();
        assert_eq!(err, MemoryError::StaleOrWildFree);
    }

    #[test]
    fn oversized_request_is_rejected() {
        let mgr = RegionManager::new(&[256, 1024]);
        let err = mgr.allocate(2048, Ownership::Exclusive(1)).unwrap_err();
        assert!(matches!(err, MemoryError::RequestTooLarge { .. }));
    }

    #[test]
    fn leak_detection_reports_unfree_allocations() {
        let mgr = RegionManager::default();
        let _leaked = mgr.allocate(10, Ownership::Exclusive(1)).unwrap();
        let kept = mgr.allocate(10, Ownership::Exclusive(2)).unwrap();
        mgr.release(kept).unwrap();

        assert_eq!(mgr.leaked().len(), 1);
        assert_eq!(mgr.stats().live, 1);
    }

    #[test]
    fn shared_ownership_tracks_all_peers() {
        let shared = Ownership::Shared(vec![1, 2, 3]);
        assert!(shared.owns(2));
        assert!(!shared.owns(4));
    }
}
