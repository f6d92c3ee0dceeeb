//! Process-lifetime cached first segment
//!
//! A shared-mode writer takes the cached segment for the duration of one
//! call and parks it again on drop. The segment is never released to a
//! pool. While one writer holds it, other shared-mode writers fall back
//! to renting.

use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

#[derive(Debug)]
enum Slot {
    Empty,
    Parked(Vec<u8>),
    InUse,
}

/// Holder of one reusable segment with single-writer access
#[derive(Debug)]
pub struct SegmentCache {
    slot: Mutex<Slot>,
    segment_size: usize,
}

impl SegmentCache {
    /// Create an empty cache whose segment is allocated on first use
    pub fn new(segment_size: usize) -> Self {
        Self {
            slot: Mutex::new(Slot::Empty),
            segment_size,
        }
    }

    /// Take exclusive ownership of the cached segment.
    ///
    /// Returns `None` when another writer currently holds it.
    pub fn acquire(&self) -> Option<Vec<u8>> {
        let mut slot = self.slot.lock();
        match std::mem::replace(&mut *slot, Slot::InUse) {
            Slot::Empty => Some(vec![0u8; self.segment_size]),
            Slot::Parked(segment) => Some(segment),
            Slot::InUse => None,
        }
    }

    /// Park the segment again after use
    pub fn park(&self, segment: Vec<u8>) {
        *self.slot.lock() = Slot::Parked(segment);
    }

    /// Check whether the cached segment is free to acquire
    pub fn is_available(&self) -> bool {
        !matches!(*self.slot.lock(), Slot::InUse)
    }
}

static GLOBAL_CACHE: OnceLock<Arc<SegmentCache>> = OnceLock::new();

/// Size of the process-wide cached segment.
pub const GLOBAL_CACHE_SEGMENT_SIZE: usize = 64 * 1024;

/// Get the process-wide segment cache
pub fn global_cache() -> Arc<SegmentCache> {
    Arc::clone(
        GLOBAL_CACHE.get_or_init(|| Arc::new(SegmentCache::new(GLOBAL_CACHE_SEGMENT_SIZE))),
    )
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_single_holder() {
        let cache = SegmentCache::new(128);
        let segment = cache.acquire().expect("first acquire succeeds");
        assert_eq!(segment.len(), 128);
        assert!(!cache.is_available());
        assert!(cache.acquire().is_none());

        cache.park(segment);
        assert!(cache.is_available());
    }

    #[test]
    fn test_parked_segment_is_reused() {
        let cache = SegmentCache::new(16);
        let mut segment = cache.acquire().unwrap();
        segment[3] = 7;
        cache.park(segment);

        let segment = cache.acquire().unwrap();
        assert_eq!(segment[3], 7);
    }
}
