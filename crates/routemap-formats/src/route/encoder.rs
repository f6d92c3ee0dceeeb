//! Route table writer
//!
//! Sibling runs shorter than [`LINEAR_SCAN_LIMIT`] are written as a chain
//! of equal tokens. Longer runs are split in half behind a less-than
//! token whose pivot is the last entry of the left half:
//!
//! ```text
//! less-than(n) | branch | pivot[n] | <left half> | less-else | <right half>
//! ```
//!
//! An equal entry is laid out as
//!
//! ```text
//! equal(kind) | branch | chunk[n] | [tag | value offset] | marker | <children>
//! ```
//!
//! Branch slots are reserved as zeros and backpatched once the subtree
//! they skip is complete.

use super::sink::RouteSink;
use super::{BRANCH_OFFSET_SIZE, LINEAR_SCAN_LIMIT, VALUE_OFFSET_SIZE};
use crate::error::{MapError, MapResult};
use crate::key::{CHUNK_SIZE, KeyEntry, unpack_chunk};
use crate::token::{ChunkKind, RouteToken};

/// A reserved value-offset slot and the value to serialize for it
#[derive(Debug, Clone, Copy)]
pub struct ValueSlot<'v, V> {
    /// Route-relative position of the 4-byte slot
    pub position: u64,
    /// Value that will be written to the data region
    pub value: &'v V,
}

struct RouteEncoder<'s, 'v, S, V> {
    sink: &'s mut S,
    queue: Vec<ValueSlot<'v, V>>,
}

/// Write the route table for `entries` into `sink`.
///
/// Returns the value slots in the order they were reserved, which is the
/// order values have to be written to the data region.
pub fn write_route<'v, S: RouteSink, V>(
    sink: &mut S,
    entries: &[KeyEntry<'v, V>],
) -> MapResult<Vec<ValueSlot<'v, V>>> {
    let mut encoder = RouteEncoder {
        sink,
        queue: Vec::new(),
    };
    encoder.write_window(entries)?;
    Ok(encoder.queue)
}

impl<'v, S: RouteSink, V> RouteEncoder<'_, 'v, S, V> {
    fn write_window(&mut self, entries: &[KeyEntry<'v, V>]) -> MapResult<()> {
        if entries.len() < LINEAR_SCAN_LIMIT {
            for (i, entry) in entries.iter().enumerate() {
                self.write_entry(entry, i + 1 == entries.len())?;
            }
            return Ok(());
        }

        let middle = entries.len() / 2;
        let pivot = &entries[middle - 1];

        self.write_token(RouteToken::LessThan(pivot.byte_count))?;
        let slot = self.reserve_branch()?;
        self.write_chunk(pivot)?;
        self.write_window(&entries[..middle])?;
        self.patch_branch(slot)?;

        self.write_token(RouteToken::LessElse)?;
        self.write_window(&entries[middle..])
    }

    fn write_entry(&mut self, entry: &KeyEntry<'v, V>, last: bool) -> MapResult<()> {
        let kind = if entry.is_key() {
            ChunkKind::Key(entry.byte_count)
        } else if usize::from(entry.byte_count) == CHUNK_SIZE {
            ChunkKind::PassThrough
        } else {
            return Err(MapError::InvalidEntry("pass-through chunk must be full"));
        };
        let token = if last {
            RouteToken::EqualLast(kind)
        } else {
            RouteToken::EqualNext(kind)
        };

        self.write_token(token)?;
        let slot = self.reserve_branch()?;
        self.write_chunk(entry)?;

        if let Some((tag, value)) = entry.value {
            self.sink.write(&tag.to_bytes()[..tag.encoded_len()])?;
            let position = self.sink.position();
            self.sink.write(&[0; VALUE_OFFSET_SIZE])?;
            self.queue.push(ValueSlot { position, value });
        }

        if entry.has_children() {
            self.write_token(RouteToken::HasChildren)?;
            self.write_window(&entry.children)?;
        } else {
            self.write_token(RouteToken::NoChildren)?;
        }

        self.patch_branch(slot)
    }

    fn write_token(&mut self, token: RouteToken) -> MapResult<()> {
        if !token.is_well_formed() {
            return Err(MapError::InvalidEntry("chunk byte count out of range"));
        }
        self.sink.write(&[token.to_byte()])
    }

    fn write_chunk(&mut self, entry: &KeyEntry<'v, V>) -> MapResult<()> {
        let bytes = unpack_chunk(entry.packed);
        self.sink.write(&bytes[..usize::from(entry.byte_count)])
    }

    fn reserve_branch(&mut self) -> MapResult<u64> {
        let slot = self.sink.position();
        self.sink.write(&[0; BRANCH_OFFSET_SIZE])?;
        Ok(slot)
    }

    fn patch_branch(&mut self, slot: u64) -> MapResult<()> {
        let distance = self.sink.position() - (slot + BRANCH_OFFSET_SIZE as u64);
        let offset = u16::try_from(distance).map_err(|_| MapError::FormatCapacityExceeded {
            field: "branch offset",
            value: distance,
            limit: u64::from(u16::MAX),
        })?;
        self.sink.patch(slot, &offset.to_le_bytes())
    }
}

/// Route table length for `entries` without writing anything
pub fn estimate_route_len<V>(entries: &[KeyEntry<'_, V>]) -> MapResult<u64> {
    let mut counter = super::SizeCounter::new();
    write_route(&mut counter, entries)?;
    Ok(counter.advanced())
}
