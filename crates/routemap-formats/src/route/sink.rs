//! Byte sinks driven by the route traversal
//!
//! The same traversal runs once against a [`SizeCounter`] to predict the
//! route table length and once against a [`BufferSink`] to write it, so
//! the two passes cannot disagree about token choices.

use routemap_buffer::SegmentWriter;

use crate::error::MapResult;

/// Destination of route table bytes with backpatch support.
///
/// Positions are relative to the start of the route table.
pub trait RouteSink {
    /// Current position
    fn position(&self) -> u64;

    /// Append `bytes` at the current position
    fn write(&mut self, bytes: &[u8]) -> MapResult<()>;

    /// Overwrite bytes at an earlier `position`, then return to the
    /// current position
    fn patch(&mut self, position: u64, bytes: &[u8]) -> MapResult<()>;
}

/// Sink that only tracks how many bytes would be written
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SizeCounter {
    position: u64,
    advanced: u64,
}

impl SizeCounter {
    /// Counter at position zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes advanced past, excluding rewrites
    pub fn advanced(&self) -> u64 {
        self.advanced
    }

    fn advance(&mut self, count: u64) {
        let end = self.position + count;
        if self.position == self.advanced {
            self.advanced += count;
        } else if end > self.advanced {
            self.advanced = end;
        }
        self.position = end;
    }
}

impl RouteSink for SizeCounter {
    fn position(&self) -> u64 {
        self.position
    }

    fn write(&mut self, bytes: &[u8]) -> MapResult<()> {
        self.advance(bytes.len() as u64);
        Ok(())
    }

    fn patch(&mut self, position: u64, bytes: &[u8]) -> MapResult<()> {
        let resume = self.position;
        self.position = position;
        self.advance(bytes.len() as u64);
        self.position = resume;
        Ok(())
    }
}

/// Sink writing into a segment writer
#[derive(Debug)]
pub struct BufferSink<'w> {
    writer: &'w mut SegmentWriter,
    base: u64,
}

impl<'w> BufferSink<'w> {
    /// Route table starting at the writer's current position
    pub fn new(writer: &'w mut SegmentWriter) -> Self {
        let base = writer.position();
        Self { writer, base }
    }

    /// Absolute writer position of the route table start
    pub fn base(&self) -> u64 {
        self.base
    }
}

impl RouteSink for BufferSink<'_> {
    fn position(&self) -> u64 {
        self.writer.position() - self.base
    }

    fn write(&mut self, bytes: &[u8]) -> MapResult<()> {
        self.writer.write_bytes(bytes)?;
        Ok(())
    }

    fn patch(&mut self, position: u64, bytes: &[u8]) -> MapResult<()> {
        let resume = self.writer.position();
        self.writer.seek_unchecked(self.base + position);
        self.writer.write_bytes(bytes)?;
        self.writer.seek_unchecked(resume);
        Ok(())
    }
}
