//! Variable-length integer primitive
//!
//! LEB128: seven value bits per byte, high bit set on every byte but the
//! last. Used for header fields and length prefixes.

use std::io::Read;

use crate::error::{MapError, MapResult};

/// Largest encoded size of a `u32`
pub const MAX_VARINT_SIZE: usize = 5;

/// Read a variable-length integer from `data` at `offset`
pub fn read_varint(data: &[u8], offset: &mut usize) -> MapResult<u32> {
    let start = *offset;
    let mut result = 0u32;
    let mut shift = 0;

    loop {
        let Some(&byte) = data.get(*offset) else {
            return Err(MapError::VarInt(start));
        };
        *offset += 1;

        let value = u32::from(byte & 0x7F);
        if shift == 28 && value > 0x0F {
            return Err(MapError::VarInt(start));
        }
        result |= value << shift;

        if (byte & 0x80) == 0 {
            return Ok(result);
        }

        shift += 7;
        if shift > 28 {
            return Err(MapError::VarInt(start));
        }
    }
}

/// Read a variable-length integer from a byte stream
pub fn read_varint_from<R: Read>(reader: &mut R) -> std::io::Result<u32> {
    let mut buf = [0u8; MAX_VARINT_SIZE];
    for i in 0..MAX_VARINT_SIZE {
        reader.read_exact(&mut buf[i..=i])?;
        if buf[i] & 0x80 == 0 {
            let mut offset = 0;
            return read_varint(&buf[..=i], &mut offset).map_err(|e| {
                std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
            });
        }
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        "variable integer longer than 5 bytes",
    ))
}

/// Append a variable-length integer to `data`
pub fn write_varint(value: u32, data: &mut Vec<u8>) {
    let mut value = value;

    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;

        if value != 0 {
            byte |= 0x80;
        }

        data.push(byte);

        if value == 0 {
            break;
        }
    }
}

/// Size needed to encode `value`
pub fn varint_size(value: u32) -> usize {
    if value == 0 {
        1
    } else {
        (32 - value.leading_zeros()).div_ceil(7) as usize
    }
}
