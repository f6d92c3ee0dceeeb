//! Multi-segment buffer writer
//!
//! The writer keeps an ordered list of segments and a single logical
//! cursor. Bytes before the committed boundary form the output; the
//! cursor may move back inside that region to overwrite a reserved slot
//! and then forward again without changing the committed length:
//!
//! ```text
//! segment 0              segment 1
//! [##########......]     [#####...........]
//!  ^ committed ^boundary  ^start = seg0.committed
//! ```
//!
//! Segments other than the last one are writable only up to their
//! committed length, so a reserved slot never straddles two segments.

use std::io::{self, SeekFrom, Write};
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace, warn};

use crate::cache::{SegmentCache, global_cache};
use crate::cancel::CancellationToken;
use crate::config::{BufferConfig, BufferMode};
use crate::error::{BufferError, BufferResult};
use crate::pool::{SegmentPool, global_pool};

/// Where a segment came from, and so where it goes on release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentOrigin {
    /// Rented from the pool; released back to it
    Rented,
    /// The process-lifetime cached segment; parked again
    Cached,
    /// Supplied by the caller; never released to the pool
    External,
}

/// Seek base for [`SegmentWriter::seek`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOrigin {
    /// From logical position zero
    Begin,
    /// From the cursor
    Current,
    /// From the committed length
    End,
}

#[derive(Debug)]
struct Segment {
    data: Vec<u8>,
    /// Writable limit; equals `committed` for every segment but the last
    boundary: usize,
    committed: usize,
    /// Logical position of `data[0]`
    start: u64,
    origin: SegmentOrigin,
}

impl Segment {
    fn new(data: Vec<u8>, start: u64, origin: SegmentOrigin) -> Self {
        Self {
            boundary: data.len(),
            data,
            committed: 0,
            start,
            origin,
        }
    }

    fn end(&self) -> u64 {
        self.start + self.committed as u64
    }
}

/// Append-only pooled byte buffer with seek/advance and backpatch support
#[derive(Debug)]
pub struct SegmentWriter {
    segments: Vec<Segment>,
    current: usize,
    offset: usize,
    committed: u64,
    pool: Arc<dyn SegmentPool>,
    cache: Option<Arc<SegmentCache>>,
    config: BufferConfig,
}

impl SegmentWriter {
    /// Create a scoped writer on the global pool with default sizing
    pub fn scoped() -> Self {
        Self::new(BufferConfig::default(), global_pool())
    }

    /// Create a shared-mode writer on the global pool and cache
    pub fn shared() -> Self {
        Self::shared_with(BufferConfig::default(), global_pool(), global_cache())
    }

    /// Create a writer for the given mode on the global pool and cache
    pub fn with_mode(mode: BufferMode, config: BufferConfig) -> Self {
        match mode {
            BufferMode::Scoped => Self::new(config, global_pool()),
            BufferMode::Shared => Self::shared_with(config, global_pool(), global_cache()),
        }
    }

    /// Create a scoped writer whose first segment is rented from `pool`
    pub fn new(config: BufferConfig, pool: Arc<dyn SegmentPool>) -> Self {
        let first = pool.rent(config.initial_segment_size);
        trace!(len = first.len(), "rented first segment");
        Self::from_first(first, SegmentOrigin::Rented, config, pool, None)
    }

    /// Create a writer that borrows the cached segment of `cache`.
    ///
    /// Falls back to renting from `pool` while the cached segment is
    /// held by another writer.
    pub fn shared_with(
        config: BufferConfig,
        pool: Arc<dyn SegmentPool>,
        cache: Arc<SegmentCache>,
    ) -> Self {
        match cache.acquire() {
            Some(first) => Self::from_first(first, SegmentOrigin::Cached, config, pool, Some(cache)),
            None => {
                warn!("cached segment is in use, renting first segment instead");
                Self::new(config, pool)
            }
        }
    }

    /// Create a writer over a caller-supplied first segment
    pub fn with_segment(first: Vec<u8>, config: BufferConfig, pool: Arc<dyn SegmentPool>) -> Self {
        Self::from_first(first, SegmentOrigin::External, config, pool, None)
    }

    fn from_first(
        first: Vec<u8>,
        origin: SegmentOrigin,
        config: BufferConfig,
        pool: Arc<dyn SegmentPool>,
        cache: Option<Arc<SegmentCache>>,
    ) -> Self {
        Self {
            segments: vec![Segment::new(first, 0, origin)],
            current: 0,
            offset: 0,
            committed: 0,
            pool,
            cache,
            config,
        }
    }

    /// Logical cursor position
    pub fn position(&self) -> u64 {
        self.segments[self.current].start + self.offset as u64
    }

    /// Total committed (buffered) length
    pub fn committed(&self) -> u64 {
        self.committed
    }

    /// Number of segments currently held
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Origin of the first segment
    pub fn first_segment_origin(&self) -> SegmentOrigin {
        self.segments[0].origin
    }

    /// Get at least `size_hint` contiguous writable bytes at the cursor.
    ///
    /// When the current segment lacks room it is either extended (only
    /// the last segment, within its backing allocation) or a new segment
    /// of `max(2 * size_hint, min_segment_size)` bytes is rented.
    pub fn get_writable(&mut self, size_hint: usize) -> BufferResult<&mut [u8]> {
        if self.offset + size_hint > self.segments[self.current].boundary {
            self.move_next_segment(size_hint)?;
        }
        let segment = &mut self.segments[self.current];
        Ok(&mut segment.data[self.offset..segment.boundary])
    }

    /// Move the cursor forward by `count` bytes.
    ///
    /// The committed length grows only for bytes past the previous
    /// committed boundary, so backpatch writes never inflate it.
    pub fn advance(&mut self, count: usize) {
        let segment = &mut self.segments[self.current];
        let end = self.offset + count;
        debug_assert!(end <= segment.data.len(), "advance past segment end");

        if self.offset == segment.committed {
            segment.committed += count;
            self.committed += count as u64;
        } else if end > segment.committed {
            self.committed += (end - segment.committed) as u64;
            segment.committed = end;
        }
        self.offset = end;
    }

    /// Copy `bytes` at the cursor and advance past them
    pub fn write_bytes(&mut self, bytes: &[u8]) -> BufferResult<()> {
        let target = self.get_writable(bytes.len())?;
        target[..bytes.len()].copy_from_slice(bytes);
        self.advance(bytes.len());
        Ok(())
    }

    /// Seek within the committed region
    pub fn seek(&mut self, position: i64, origin: SeekOrigin) -> BufferResult<u64> {
        let base = match origin {
            SeekOrigin::Begin => 0,
            SeekOrigin::Current => self.position() as i64,
            SeekOrigin::End => self.committed as i64,
        };
        let target = base.checked_add(position).unwrap_or(-1);
        if target < 0 || target as u64 > self.committed {
            return Err(BufferError::InvalidSeek {
                position: target,
                committed: self.committed,
            });
        }
        self.seek_unchecked(target as u64);
        Ok(target as u64)
    }

    /// Seek to an absolute position without the committed-length check.
    ///
    /// The caller guarantees `position` addresses bytes it wrote itself.
    pub fn seek_unchecked(&mut self, position: u64) {
        // Segment ends are non-decreasing, so the first one past `position` holds it
        let last = self.segments.len() - 1;
        let index = self
            .segments
            .partition_point(|s| s.end() <= position)
            .min(last);
        let segment = &self.segments[index];
        debug_assert!(position >= segment.start, "seek before segment start");

        self.current = index;
        self.offset = (position - segment.start) as usize;
        debug_assert!(self.offset <= segment.data.len(), "seek past segment end");
    }

    fn move_next_segment(&mut self, size: usize) -> BufferResult<()> {
        loop {
            let last = self.segments.len() - 1;
            let segment = &mut self.segments[self.current];

            if self.current != last {
                // Non-last segments are closed at their committed length
                if self.offset != segment.committed {
                    return Err(BufferError::WriteOutOfBounds {
                        position: segment.start + self.offset as u64,
                        requested: size,
                        boundary: segment.boundary,
                    });
                }
                self.current += 1;
                self.offset = 0;
                if size <= self.segments[self.current].boundary {
                    return Ok(());
                }
                continue;
            }

            if self.offset + size <= segment.data.len() {
                // Boundary was pulled in by a linearization; reopen it
                segment.boundary = segment.data.len();
                return Ok(());
            }

            if self.offset != segment.committed {
                return Err(BufferError::WriteOutOfBounds {
                    position: segment.start + self.offset as u64,
                    requested: size,
                    boundary: segment.boundary,
                });
            }

            segment.boundary = segment.committed;
            let start = segment.end();
            let data = self.pool.rent(self.config.growth_size(size));
            trace!(len = data.len(), start, "rented overflow segment");

            self.segments
                .push(Segment::new(data, start, SegmentOrigin::Rented));
            self.current = self.segments.len() - 1;
            self.offset = 0;
            return Ok(());
        }
    }

    fn flush_last_boundary(&mut self) {
        if let Some(last) = self.segments.last_mut() {
            last.boundary = last.committed;
        }
    }

    fn committed_slices(&self) -> impl Iterator<Item = &[u8]> {
        self.segments
            .iter()
            .filter(|s| s.committed != 0)
            .map(|s| &s.data[..s.committed])
    }

    /// Concatenate the committed portion of every segment
    pub fn to_contiguous_bytes(&mut self) -> Vec<u8> {
        self.flush_last_boundary();
        let mut output = Vec::with_capacity(self.committed as usize);
        for slice in self.committed_slices() {
            output.extend_from_slice(slice);
        }
        output
    }

    /// Stream the committed bytes into `sink`, one write per segment.
    ///
    /// `cancel` is checked before each segment write. On error the buffer
    /// is left intact and may be linearized again.
    pub fn copy_to<W: Write>(&mut self, sink: &mut W, cancel: &CancellationToken) -> BufferResult<()> {
        if self.committed == 0 {
            return Ok(());
        }
        self.flush_last_boundary();
        for slice in self.committed_slices() {
            if cancel.is_cancelled() {
                return Err(BufferError::Cancelled);
            }
            sink.write_all(slice)?;
        }
        Ok(())
    }

    /// Async variant of [`copy_to`](Self::copy_to)
    pub async fn copy_to_async<W: AsyncWrite + Unpin>(
        &mut self,
        sink: &mut W,
        cancel: &CancellationToken,
    ) -> BufferResult<()> {
        if self.committed == 0 {
            return Ok(());
        }
        self.flush_last_boundary();
        for slice in self.committed_slices() {
            if cancel.is_cancelled() {
                return Err(BufferError::Cancelled);
            }
            sink.write_all(slice).await?;
        }
        Ok(())
    }
}

impl Write for SegmentWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Seek for SegmentWriter {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let result = match pos {
            SeekFrom::Start(p) => {
                let p = i64::try_from(p).map_err(|_| {
                    io::Error::new(io::ErrorKind::InvalidInput, "seek position overflow")
                })?;
                Self::seek(self, p, SeekOrigin::Begin)
            }
            SeekFrom::Current(p) => Self::seek(self, p, SeekOrigin::Current),
            SeekFrom::End(p) => Self::seek(self, p, SeekOrigin::End),
        };
        result.map_err(Into::into)
    }
}

impl Drop for SegmentWriter {
    fn drop(&mut self) {
        let mut released = 0usize;
        for segment in self.segments.drain(..) {
            match segment.origin {
                SegmentOrigin::Rented => {
                    self.pool.release(segment.data);
                    released += 1;
                }
                SegmentOrigin::Cached => {
                    if let Some(cache) = &self.cache {
                        cache.park(segment.data);
                    }
                }
                SegmentOrigin::External => {}
            }
        }
        debug!(released, committed = self.committed, "segment writer released");
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    /// Pool that allocates exactly what is asked and records traffic
    #[derive(Debug, Default)]
    struct CountingPool {
        rents: Mutex<Vec<usize>>,
        releases: Mutex<Vec<usize>>,
    }

    impl SegmentPool for CountingPool {
        fn rent(&self, min_len: usize) -> Vec<u8> {
            self.rents.lock().push(min_len);
            vec![0; min_len]
        }

        fn release(&self, segment: Vec<u8>) {
            self.releases.lock().push(segment.len());
        }
    }

    fn small_config() -> BufferConfig {
        BufferConfig {
            initial_segment_size: 16,
            min_segment_size: 64,
        }
    }

    fn writer_with(pool: &Arc<CountingPool>) -> SegmentWriter {
        SegmentWriter::new(small_config(), Arc::clone(pool) as Arc<dyn SegmentPool>)
    }

    #[test]
    fn test_sequential_writes() {
        let pool = Arc::new(CountingPool::default());
        let mut writer = writer_with(&pool);
        writer.write_bytes(b"hello ").unwrap();
        writer.write_bytes(b"world").unwrap();

        assert_eq!(writer.position(), 11);
        assert_eq!(writer.committed(), 11);
        assert_eq!(writer.to_contiguous_bytes(), b"hello world".to_vec());
    }

    #[test]
    fn test_backpatch_does_not_inflate_committed() {
        let pool = Arc::new(CountingPool::default());
        let mut writer = writer_with(&pool);

        writer.write_bytes(&[0xAA]).unwrap();
        let slot = writer.position();
        writer.write_bytes(&[0, 0]).unwrap();
        writer.write_bytes(&[1, 2, 3]).unwrap();
        let end = writer.position();

        writer.seek_unchecked(slot);
        writer.write_bytes(&0x1234u16.to_le_bytes()).unwrap();
        assert_eq!(writer.committed(), 6);
        writer.seek_unchecked(end);
        assert_eq!(writer.committed(), 6);

        writer.write_bytes(&[9]).unwrap();
        assert_eq!(
            writer.to_contiguous_bytes(),
            vec![0xAA, 0x34, 0x12, 1, 2, 3, 9]
        );
    }

    #[test]
    fn test_seek_is_bounded_by_committed() {
        let pool = Arc::new(CountingPool::default());
        let mut writer = writer_with(&pool);
        writer.write_bytes(&[1, 2, 3, 4]).unwrap();

        assert_eq!(writer.seek(2, SeekOrigin::Begin).unwrap(), 2);
        assert_eq!(writer.seek(-1, SeekOrigin::End).unwrap(), 3);
        assert_eq!(writer.seek(1, SeekOrigin::Current).unwrap(), 4);

        assert!(matches!(
            writer.seek(5, SeekOrigin::Begin),
            Err(BufferError::InvalidSeek { position: 5, committed: 4 })
        ));
        assert!(matches!(
            writer.seek(-1, SeekOrigin::Begin),
            Err(BufferError::InvalidSeek { .. })
        ));
        // Failed seeks leave the cursor alone
        assert_eq!(writer.position(), 4);
    }

    #[test]
    fn test_overflow_rents_one_segment_per_event() {
        let pool = Arc::new(CountingPool::default());
        let mut writer = writer_with(&pool);

        writer.write_bytes(&[1; 10]).unwrap();
        assert_eq!(writer.segment_count(), 1);

        // 10 + 10 > 16: one new segment of max(2 * 10, 64)
        writer.write_bytes(&[2; 10]).unwrap();
        assert_eq!(writer.segment_count(), 2);

        // 10 + 100 > 64: one new segment of 2 * 100
        writer.write_bytes(&[3; 100]).unwrap();
        assert_eq!(writer.segment_count(), 3);

        assert_eq!(*pool.rents.lock(), vec![16, 64, 200]);
        assert_eq!(writer.committed(), 120);

        let mut expected = vec![1; 10];
        expected.extend_from_slice(&[2; 10]);
        expected.extend_from_slice(&[3; 100]);
        assert_eq!(writer.to_contiguous_bytes(), expected);
    }

    #[test]
    fn test_last_segment_reopens_after_linearization() {
        let pool = Arc::new(CountingPool::default());
        let mut writer = writer_with(&pool);
        writer.write_bytes(&[1; 4]).unwrap();
        assert_eq!(writer.to_contiguous_bytes(), vec![1; 4]);

        // Still fits the backing allocation: no new segment
        writer.write_bytes(&[2; 8]).unwrap();
        assert_eq!(writer.segment_count(), 1);
        assert_eq!(writer.to_contiguous_bytes().len(), 12);
    }

    #[test]
    fn test_backpatch_into_earlier_segment() {
        let pool = Arc::new(CountingPool::default());
        let mut writer = writer_with(&pool);

        writer.write_bytes(&[0; 12]).unwrap();
        let slot = writer.position() - 4;
        writer.write_bytes(&[7; 30]).unwrap();
        assert_eq!(writer.segment_count(), 2);
        let end = writer.position();

        writer.seek_unchecked(slot);
        writer.write_bytes(&0xDEAD_BEEFu32.to_le_bytes()).unwrap();
        writer.seek_unchecked(end);

        assert_eq!(writer.segment_count(), 2);
        let bytes = writer.to_contiguous_bytes();
        assert_eq!(bytes.len(), 42);
        assert_eq!(&bytes[8..12], &0xDEAD_BEEFu32.to_le_bytes());
        assert_eq!(&bytes[12..], &[7; 30]);
    }

    #[test]
    fn test_seek_unchecked_lands_in_owning_segment() {
        let pool = Arc::new(CountingPool::default());
        let mut writer = writer_with(&pool);

        // Segments hold [0, 10), [10, 70), [70, 270) and [270, ..)
        writer.write_bytes(&[0; 10]).unwrap();
        writer.write_bytes(&[1; 60]).unwrap();
        writer.write_bytes(&[2; 200]).unwrap();
        writer.write_bytes(&[3; 300]).unwrap();
        assert_eq!(writer.segment_count(), 4);
        let end = writer.position();

        for position in [0u64, 9, 10, 69, 70, 269, 270, 569] {
            writer.seek_unchecked(position);
            assert_eq!(writer.position(), position);
            writer.write_bytes(&[0xEE]).unwrap();
        }
        writer.seek_unchecked(end);
        assert_eq!(writer.position(), end);
        assert_eq!(writer.committed(), 570);

        let bytes = writer.to_contiguous_bytes();
        for position in [0usize, 9, 10, 69, 70, 269, 270, 569] {
            assert_eq!(bytes[position], 0xEE, "byte {position}");
        }
        assert_eq!(bytes[11], 1);
        assert_eq!(bytes[271], 3);
    }

    #[test]
    fn test_write_straddling_closed_segment_is_rejected() {
        let pool = Arc::new(CountingPool::default());
        let mut writer = writer_with(&pool);
        writer.write_bytes(&[0; 12]).unwrap();
        writer.write_bytes(&[0; 30]).unwrap();

        writer.seek(10, SeekOrigin::Begin).unwrap();
        assert!(matches!(
            writer.get_writable(4),
            Err(BufferError::WriteOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_scoped_release_returns_every_segment() {
        let pool = Arc::new(CountingPool::default());
        {
            let mut writer = writer_with(&pool);
            writer.write_bytes(&[0; 100]).unwrap();
            assert_eq!(writer.segment_count(), 2);
        }
        assert_eq!(pool.releases.lock().len(), 2);
    }

    #[test]
    fn test_external_first_segment_is_kept() {
        let pool = Arc::new(CountingPool::default());
        {
            let mut writer = SegmentWriter::with_segment(
                vec![0; 8],
                small_config(),
                Arc::clone(&pool) as Arc<dyn SegmentPool>,
            );
            assert_eq!(writer.first_segment_origin(), SegmentOrigin::External);
            writer.write_bytes(&[1; 50]).unwrap();
            writer.write_bytes(&[1; 80]).unwrap();
            assert_eq!(writer.segment_count(), 3);
        }
        assert_eq!(pool.rents.lock().len(), 2);
        assert_eq!(pool.releases.lock().len(), 2);
    }

    #[test]
    fn test_shared_writer_parks_cached_segment() {
        let pool = Arc::new(CountingPool::default());
        let cache = Arc::new(SegmentCache::new(32));
        {
            let mut writer = SegmentWriter::shared_with(
                small_config(),
                Arc::clone(&pool) as Arc<dyn SegmentPool>,
                Arc::clone(&cache),
            );
            assert_eq!(writer.first_segment_origin(), SegmentOrigin::Cached);
            assert!(!cache.is_available());

            // A second shared writer falls back to renting
            let fallback = SegmentWriter::shared_with(
                small_config(),
                Arc::clone(&pool) as Arc<dyn SegmentPool>,
                Arc::clone(&cache),
            );
            assert_eq!(fallback.first_segment_origin(), SegmentOrigin::Rented);
            drop(fallback);

            writer.write_bytes(&[5; 100]).unwrap();
            assert_eq!(writer.segment_count(), 2);
        }
        assert!(cache.is_available());
        // fallback first segment + one overflow segment; never the cached one
        assert_eq!(*pool.releases.lock(), vec![16, 200]);
    }

    #[test]
    fn test_copy_to_writes_each_segment() {
        let pool = Arc::new(CountingPool::default());
        let mut writer = writer_with(&pool);
        writer.write_bytes(&[1; 10]).unwrap();
        writer.write_bytes(&[2; 40]).unwrap();

        let mut sink = Vec::new();
        writer
            .copy_to(&mut sink, &CancellationToken::new())
            .unwrap();
        assert_eq!(sink, writer.to_contiguous_bytes());
    }

    /// Sink that cancels the token after its first write
    struct CancellingSink {
        token: CancellationToken,
        written: Vec<u8>,
        writes: usize,
    }

    impl Write for CancellingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            self.writes += 1;
            self.token.cancel();
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_cancellation_between_segments() {
        let pool = Arc::new(CountingPool::default());
        let mut writer = writer_with(&pool);
        writer.write_bytes(&[1; 10]).unwrap();
        writer.write_bytes(&[2; 40]).unwrap();

        let token = CancellationToken::new();
        let mut sink = CancellingSink {
            token: token.clone(),
            written: Vec::new(),
            writes: 0,
        };
        let result = writer.copy_to(&mut sink, &token);
        assert!(matches!(result, Err(BufferError::Cancelled)));
        assert_eq!(sink.writes, 1);
        assert_eq!(sink.written, vec![1; 10]);

        // Buffer state survives for a fresh attempt
        let mut full = Vec::new();
        writer.copy_to(&mut full, &CancellationToken::new()).unwrap();
        assert_eq!(full.len(), 50);
    }

    #[test]
    fn test_cancelled_before_start_writes_nothing() {
        let pool = Arc::new(CountingPool::default());
        let mut writer = writer_with(&pool);
        writer.write_bytes(&[1; 4]).unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let mut sink = Vec::new();
        assert!(writer.copy_to(&mut sink, &token).is_err());
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_copy_to_async() {
        let pool = Arc::new(CountingPool::default());
        let mut writer = writer_with(&pool);
        writer.write_bytes(&[3; 20]).unwrap();
        writer.write_bytes(&[4; 70]).unwrap();

        let mut sink: Vec<u8> = Vec::new();
        writer
            .copy_to_async(&mut sink, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(sink.len(), 90);
        assert_eq!(sink, writer.to_contiguous_bytes());
    }

    #[test]
    fn test_io_traits() {
        use std::io::Seek;

        let pool = Arc::new(CountingPool::default());
        let mut writer = writer_with(&pool);
        writer.write_all(b"abcdef").unwrap();
        Seek::seek(&mut writer, SeekFrom::Start(1)).unwrap();
        writer.write_all(b"XY").unwrap();
        assert_eq!(writer.stream_position().unwrap(), 3);
        assert!(Seek::seek(&mut writer, SeekFrom::Start(7)).is_err());

        assert_eq!(writer.to_contiguous_bytes(), b"aXYdef".to_vec());
    }

    proptest! {
        /// Any sequence of writes linearizes to its concatenation
        #[test]
        fn writes_linearize_in_order(chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..90), 0..20)) {
            let pool = Arc::new(CountingPool::default());
            let mut writer = writer_with(&pool);
            let mut expected = Vec::new();
            for chunk in &chunks {
                writer.write_bytes(chunk).unwrap();
                expected.extend_from_slice(chunk);
            }
            prop_assert_eq!(writer.committed(), expected.len() as u64);
            prop_assert_eq!(writer.to_contiguous_bytes(), expected);
        }
    }
}
