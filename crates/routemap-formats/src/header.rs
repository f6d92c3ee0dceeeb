//! Route map header
//!
//! Four variable-length integers in the order
//! `DataLength, MetaLength, ElementCount, MaxDepth`. The header precedes
//! the payload and is written once with final values, which is why the
//! route table size has to be predicted before the real write.

use binrw::io::{Read, Seek, Write};
use binrw::{BinRead, BinResult, BinWrite};

use crate::error::{MapError, MapResult};
use crate::varint::{read_varint, read_varint_from, varint_size, write_varint};

/// Map header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapHeader {
    /// Length of the value data region
    pub data_length: u32,
    /// Length of the route table
    pub meta_length: u32,
    /// Number of value-bearing entries
    pub element_count: u32,
    /// Number of chunk levels of the longest key
    pub max_depth: u32,
}

impl MapHeader {
    /// Encoded size of this header
    pub fn encoded_len(&self) -> usize {
        varint_size(self.data_length)
            + varint_size(self.meta_length)
            + varint_size(self.element_count)
            + varint_size(self.max_depth)
    }

    /// Size of route table plus data region
    pub fn payload_len(&self) -> u64 {
        u64::from(self.meta_length) + u64::from(self.data_length)
    }

    /// Append the encoded header to `out`
    pub fn write_to(&self, out: &mut Vec<u8>) {
        write_varint(self.data_length, out);
        write_varint(self.meta_length, out);
        write_varint(self.element_count, out);
        write_varint(self.max_depth, out);
    }

    /// Parse a header from the start of `data`, returning it with its size
    pub fn parse(data: &[u8]) -> MapResult<(Self, usize)> {
        let mut offset = 0;
        let header = Self {
            data_length: read_varint(data, &mut offset)?,
            meta_length: read_varint(data, &mut offset)?,
            element_count: read_varint(data, &mut offset)?,
            max_depth: read_varint(data, &mut offset)?,
        };
        Ok((header, offset))
    }

    /// Check the header against the payload that follows it
    pub fn validate(&self, available: usize) -> MapResult<()> {
        if self.payload_len() > available as u64 {
            return Err(MapError::Truncated {
                offset: 0,
                needed: (self.payload_len() - available as u64) as usize,
            });
        }
        if self.element_count == 0 && (self.meta_length != 0 || self.max_depth != 0) {
            return Err(MapError::malformed(0, "empty map with non-empty route"));
        }
        if self.element_count != 0 && (self.meta_length == 0 || self.max_depth == 0) {
            return Err(MapError::malformed(0, "non-empty map without route"));
        }
        Ok(())
    }
}

impl BinRead for MapHeader {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        _endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        Ok(Self {
            data_length: read_varint_from(reader)?,
            meta_length: read_varint_from(reader)?,
            element_count: read_varint_from(reader)?,
            max_depth: read_varint_from(reader)?,
        })
    }
}

impl BinWrite for MapHeader {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        _endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<()> {
        let mut data = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut data);
        writer.write_all(&data)?;
        Ok(())
    }
}
