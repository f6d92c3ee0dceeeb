//! Codecs for primitive value types

use std::io::Write;

use super::{TypeTag, ValueCodec, builtin, expect_tag, native, take};
use crate::error::{MapError, MapResult};
use crate::varint::{read_varint, varint_size, write_varint};

/// Codec for fixed-width numbers, `bool`, `char`, strings and byte strings
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimitiveCodec;

macro_rules! impl_fixed_codec {
    ($($ty:ty => $tag:expr),* $(,)?) => {
        $(
            impl ValueCodec<$ty> for PrimitiveCodec {
                fn type_tag(&self, _value: &$ty) -> TypeTag {
                    $tag
                }

                fn encoded_len(&self, _value: &$ty) -> usize {
                    std::mem::size_of::<$ty>()
                }

                fn encode(&self, value: &$ty, out: &mut dyn Write) -> MapResult<()> {
                    out.write_all(&value.to_le_bytes())?;
                    Ok(())
                }

                fn decode(&self, tag: TypeTag, data: &[u8]) -> MapResult<$ty> {
                    expect_tag($tag, tag)?;
                    let bytes = take(data, std::mem::size_of::<$ty>())?;
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    buf.copy_from_slice(bytes);
                    Ok(<$ty>::from_le_bytes(buf))
                }
            }
        )*
    };
}

impl_fixed_codec! {
    u8 => TypeTag::BuiltIn(builtin::U8),
    i8 => TypeTag::BuiltIn(builtin::I8),
    u16 => TypeTag::BuiltIn(builtin::U16),
    i16 => TypeTag::BuiltIn(builtin::I16),
    u32 => TypeTag::BuiltIn(builtin::U32),
    i32 => TypeTag::BuiltIn(builtin::I32),
    u64 => TypeTag::BuiltIn(builtin::U64),
    i64 => TypeTag::BuiltIn(builtin::I64),
    f32 => TypeTag::BuiltIn(builtin::F32),
    f64 => TypeTag::BuiltIn(builtin::F64),
    u128 => TypeTag::Native(native::U128),
    i128 => TypeTag::Native(native::I128),
}

impl ValueCodec<bool> for PrimitiveCodec {
    fn type_tag(&self, _value: &bool) -> TypeTag {
        TypeTag::BuiltIn(builtin::BOOL)
    }

    fn encoded_len(&self, _value: &bool) -> usize {
        1
    }

    fn encode(&self, value: &bool, out: &mut dyn Write) -> MapResult<()> {
        out.write_all(&[u8::from(*value)])?;
        Ok(())
    }

    fn decode(&self, tag: TypeTag, data: &[u8]) -> MapResult<bool> {
        expect_tag(TypeTag::BuiltIn(builtin::BOOL), tag)?;
        match take(data, 1)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(MapError::InvalidValue(format!("bool byte {other}"))),
        }
    }
}

impl ValueCodec<char> for PrimitiveCodec {
    fn type_tag(&self, _value: &char) -> TypeTag {
        TypeTag::Native(native::CHAR)
    }

    fn encoded_len(&self, _value: &char) -> usize {
        4
    }

    fn encode(&self, value: &char, out: &mut dyn Write) -> MapResult<()> {
        out.write_all(&u32::from(*value).to_le_bytes())?;
        Ok(())
    }

    fn decode(&self, tag: TypeTag, data: &[u8]) -> MapResult<char> {
        expect_tag(TypeTag::Native(native::CHAR), tag)?;
        let bytes = take(data, 4)?;
        let scalar = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        char::from_u32(scalar)
            .ok_or_else(|| MapError::InvalidValue(format!("invalid char scalar 0x{scalar:X}")))
    }
}

fn prefixed_len(len: usize) -> usize {
    varint_size(u32::try_from(len).unwrap_or(u32::MAX)) + len
}

pub(crate) fn write_prefixed(bytes: &[u8], out: &mut dyn Write) -> MapResult<()> {
    let len = u32::try_from(bytes.len()).map_err(|_| MapError::FormatCapacityExceeded {
        field: "value length",
        value: bytes.len() as u64,
        limit: u64::from(u32::MAX),
    })?;
    let mut prefix = Vec::with_capacity(5);
    write_varint(len, &mut prefix);
    out.write_all(&prefix)?;
    out.write_all(bytes)?;
    Ok(())
}

pub(crate) fn read_prefixed(data: &[u8]) -> MapResult<&[u8]> {
    let mut offset = 0;
    let len = read_varint(data, &mut offset)? as usize;
    take(&data[offset..], len)
}

impl ValueCodec<String> for PrimitiveCodec {
    fn type_tag(&self, _value: &String) -> TypeTag {
        TypeTag::BuiltIn(builtin::STRING)
    }

    fn encoded_len(&self, value: &String) -> usize {
        prefixed_len(value.len())
    }

    fn encode(&self, value: &String, out: &mut dyn Write) -> MapResult<()> {
        write_prefixed(value.as_bytes(), out)
    }

    fn decode(&self, tag: TypeTag, data: &[u8]) -> MapResult<String> {
        expect_tag(TypeTag::BuiltIn(builtin::STRING), tag)?;
        let bytes = read_prefixed(data)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| MapError::InvalidValue(e.to_string()))
    }
}

impl ValueCodec<Vec<u8>> for PrimitiveCodec {
    fn type_tag(&self, _value: &Vec<u8>) -> TypeTag {
        TypeTag::BuiltIn(builtin::BYTES)
    }

    fn encoded_len(&self, value: &Vec<u8>) -> usize {
        prefixed_len(value.len())
    }

    fn encode(&self, value: &Vec<u8>, out: &mut dyn Write) -> MapResult<()> {
        write_prefixed(value, out)
    }

    fn decode(&self, tag: TypeTag, data: &[u8]) -> MapResult<Vec<u8>> {
        expect_tag(TypeTag::BuiltIn(builtin::BYTES), tag)?;
        Ok(read_prefixed(data)?.to_vec())
    }
}
