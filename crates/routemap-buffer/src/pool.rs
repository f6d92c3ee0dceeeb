//! Segment pool for the buffer writer
//!
//! Segments are rented from a [`SegmentPool`] and handed back when the
//! writer that rented them is released. The default [`SharedPool`] keeps
//! returned segments in three size classes so repeated encodes reuse the
//! same allocations instead of hitting the allocator on every call.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// Allocator capability used by the segment writer.
///
/// `rent` must always satisfy the request; a pool that has nothing cached
/// falls back to a fresh allocation.
pub trait SegmentPool: Send + Sync + fmt::Debug {
    /// Rent a segment whose length is at least `min_len` bytes.
    fn rent(&self, min_len: usize) -> Vec<u8>;

    /// Hand a previously rented segment back to the pool.
    fn release(&self, segment: Vec<u8>);
}

/// Configuration for the shared pool
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of small segments to keep
    pub max_small_segments: usize,
    /// Maximum number of medium segments to keep
    pub max_medium_segments: usize,
    /// Maximum number of large segments to keep
    pub max_large_segments: usize,
    /// Upper bound of the small size class
    pub small_segment_threshold: usize,
    /// Upper bound of the medium size class
    pub medium_segment_threshold: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_small_segments: 32,
            max_medium_segments: 16,
            max_large_segments: 4,
            small_segment_threshold: 64 * 1024,    // 64KB
            medium_segment_threshold: 1024 * 1024, // 1MB
        }
    }
}

/// Thread-safe segment pool with small/medium/large size classes
#[derive(Debug)]
pub struct SharedPool {
    small: Mutex<VecDeque<Vec<u8>>>,
    medium: Mutex<VecDeque<Vec<u8>>>,
    large: Mutex<VecDeque<Vec<u8>>>,
    rented: AtomicUsize,
    released: AtomicUsize,
    config: PoolConfig,
}

impl SharedPool {
    /// Create a pool with default configuration
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create a pool with custom configuration
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            small: Mutex::new(VecDeque::new()),
            medium: Mutex::new(VecDeque::new()),
            large: Mutex::new(VecDeque::new()),
            rented: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
            config,
        }
    }

    fn class_for(&self, size: usize) -> (&Mutex<VecDeque<Vec<u8>>>, usize) {
        if size <= self.config.small_segment_threshold {
            (&self.small, self.config.max_small_segments)
        } else if size <= self.config.medium_segment_threshold {
            (&self.medium, self.config.max_medium_segments)
        } else {
            (&self.large, self.config.max_large_segments)
        }
    }

    /// Get statistics about pool usage
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            small_segments: self.small.lock().len(),
            medium_segments: self.medium.lock().len(),
            large_segments: self.large.lock().len(),
            rented: self.rented.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
        }
    }
}

impl Default for SharedPool {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentPool for SharedPool {
    fn rent(&self, min_len: usize) -> Vec<u8> {
        self.rented.fetch_add(1, Ordering::Relaxed);

        let (class, _) = self.class_for(min_len);
        let reused = {
            let mut segments = class.lock();
            segments
                .iter()
                .position(|s| s.len() >= min_len)
                .and_then(|i| segments.remove(i))
        };
        if let Some(segment) = reused {
            tracing::trace!(len = segment.len(), min_len, "reused pooled segment");
            return segment;
        }

        // Round new allocations up so the segment lands in its class
        let len = if min_len <= self.config.small_segment_threshold {
            min_len.max(1024)
        } else {
            min_len
        };
        tracing::trace!(len, "allocated new segment");
        vec![0u8; len]
    }

    fn release(&self, segment: Vec<u8>) {
        self.released.fetch_add(1, Ordering::Relaxed);

        let (class, max_count) = self.class_for(segment.len());
        let mut segments = class.lock();
        if segments.len() < max_count {
            segments.push_back(segment);
        }
        // Otherwise the segment is dropped
    }
}

/// Statistics about pool usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Pooled small segments
    pub small_segments: usize,
    /// Pooled medium segments
    pub medium_segments: usize,
    /// Pooled large segments
    pub large_segments: usize,
    /// Total `rent` calls served
    pub rented: usize,
    /// Total `release` calls received
    pub released: usize,
}

impl PoolStats {
    /// Total number of pooled segments
    pub fn total_segments(&self) -> usize {
        self.small_segments + self.medium_segments + self.large_segments
    }
}

static GLOBAL_POOL: OnceLock<Arc<SharedPool>> = OnceLock::new();

/// Get the process-wide segment pool
pub fn global_pool() -> Arc<SharedPool> {
    Arc::clone(GLOBAL_POOL.get_or_init(|| Arc::new(SharedPool::new())))
}
