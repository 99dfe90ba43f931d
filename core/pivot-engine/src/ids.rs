//! FILENAME: core/pivot-engine/src/ids.rs
//! Identifier allocation for pivot caches within one document.
//!
//! Two independent sequences are handed out:
//! - definition ids, used for part file names and the `rId{n}` reference id
//! - cache ids, the workbook-level number a pivot table uses to name its cache
//!
//! The allocator is owned by the document and passed into every pivot table
//! creation. Atomics let a host share one allocator across threads.

use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug, Default)]
pub struct CacheIdAllocator {
    last_definition_id: AtomicU32,
    last_cache_id: AtomicU32,
}

impl CacheIdAllocator {
    pub fn new() -> Self {
        CacheIdAllocator::default()
    }

    /// Starts numbering after ids that already exist in a loaded document.
    pub fn starting_after(definition_id: u32, cache_id: u32) -> Self {
        CacheIdAllocator {
            last_definition_id: AtomicU32::new(definition_id),
            last_cache_id: AtomicU32::new(cache_id),
        }
    }

    /// Next definition id: 1, 2, 3, ...
    pub fn next_definition_id(&self) -> u32 {
        self.last_definition_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Next cache id, one past the highest cache id seen so far.
    pub fn next_cache_id(&self) -> u32 {
        self.last_cache_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Records a cache id that was assigned elsewhere so it is never handed out again.
    pub fn observe_cache_id(&self, cache_id: u32) {
        self.last_cache_id.fetch_max(cache_id, Ordering::SeqCst);
    }

    pub fn last_cache_id(&self) -> u32 {
        self.last_cache_id.load(Ordering::SeqCst)
    }

    pub fn last_definition_id(&self) -> u32 {
        self.last_definition_id.load(Ordering::SeqCst)
    }
}

/// The relationship id of a cache definition part.
pub fn reference_id(definition_id: u32) -> String {
    format!("rId{}", definition_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_sequences_are_independent() {
        let ids = CacheIdAllocator::new();
        assert_eq!(ids.next_definition_id(), 1);
        assert_eq!(ids.next_definition_id(), 2);
        assert_eq!(ids.next_cache_id(), 1);
        assert_eq!(reference_id(2), "rId2");
    }

    #[test]
    fn test_observed_ids_are_skipped() {
        let ids = CacheIdAllocator::new();
        ids.observe_cache_id(7);
        ids.observe_cache_id(3);
        assert_eq!(ids.next_cache_id(), 8);

        let loaded = CacheIdAllocator::starting_after(4, 10);
        assert_eq!(loaded.next_definition_id(), 5);
        assert_eq!(loaded.next_cache_id(), 11);
    }

    #[test]
    fn test_shared_across_threads() {
        let ids = Arc::new(CacheIdAllocator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                thread::spawn(move || (0..25).map(|_| ids.next_cache_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<u32> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (1..=100).collect::<Vec<_>>());
    }
}
