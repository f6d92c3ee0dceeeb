//! Pooled multi-segment byte buffer for route map encoding
//!
//! The [`SegmentWriter`] is an append-only byte store made of independently
//! rented segments with one logical cursor. It supports the backpatch
//! pattern used by the route map encoder: reserve a fixed-width slot,
//! record its position, keep writing, then seek back, overwrite the slot
//! and seek forward again without growing the committed length.
//!
//! # Buffer lifetimes
//!
//! - **Scoped**: the first segment is rented on construction and every
//!   segment is released to the pool when the writer is dropped.
//! - **Shared**: the first segment is the process-lifetime cached segment;
//!   it is parked again on drop and never released to the pool.
//!
//! # Example
//!
//! ```
//! use routemap_buffer::{CancellationToken, SegmentWriter};
//!
//! let mut writer = SegmentWriter::scoped();
//! writer.write_bytes(&[0, 0]).unwrap();       // reserved slot
//! writer.write_bytes(b"payload").unwrap();
//! let end = writer.position();
//!
//! writer.seek_unchecked(0);
//! writer.write_bytes(&7u16.to_le_bytes()).unwrap();
//! writer.seek_unchecked(end);
//!
//! let mut out = Vec::new();
//! writer.copy_to(&mut out, &CancellationToken::new()).unwrap();
//! assert_eq!(&out[..2], &[7, 0]);
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod cache;
mod cancel;
mod config;
mod error;
mod pool;
mod writer;

pub use cache::{GLOBAL_CACHE_SEGMENT_SIZE, SegmentCache, global_cache};
pub use cancel::CancellationToken;
pub use config::{
    BufferConfig, BufferMode, DEFAULT_INITIAL_SEGMENT_SIZE, DEFAULT_MIN_SEGMENT_SIZE,
};
pub use error::{BufferError, BufferResult};
pub use pool::{PoolConfig, PoolStats, SegmentPool, SharedPool, global_pool};
pub use writer::{SeekOrigin, SegmentOrigin, SegmentWriter};
