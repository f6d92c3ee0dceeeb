//! Value codecs and the type-indexed codec registry
//!
//! The route table only stores a type tag and a value offset per key; the
//! bytes at that offset are written and read by a [`ValueCodec`] looked up
//! once per value type from a [`CodecRegistry`].

mod primitive;
mod registry;
mod value;

pub use primitive::PrimitiveCodec;
pub use registry::{
    CodecRegistry, CodecResolver, DynamicResolver, ErasedCodec, PrimitiveResolver, erase,
};
pub use value::{DynamicCodec, Value};

use std::fmt;
use std::io::Write;

use crate::error::{MapError, MapResult};

/// Marker byte that introduces a native type tag
pub const NATIVE_TYPE_MARKER: u8 = 0xFF;

/// Built-in type codes (1-byte tag)
pub mod builtin {
    /// `bool`
    pub const BOOL: u8 = 0x01;
    /// `u8`
    pub const U8: u8 = 0x02;
    /// `i8`
    pub const I8: u8 = 0x03;
    /// `u16`
    pub const U16: u8 = 0x04;
    /// `i16`
    pub const I16: u8 = 0x05;
    /// `u32`
    pub const U32: u8 = 0x06;
    /// `i32`
    pub const I32: u8 = 0x07;
    /// `u64`
    pub const U64: u8 = 0x08;
    /// `i64`
    pub const I64: u8 = 0x09;
    /// `f32`
    pub const F32: u8 = 0x0A;
    /// `f64`
    pub const F64: u8 = 0x0B;
    /// Length-prefixed UTF-8 string
    pub const STRING: u8 = 0x0C;
    /// Length-prefixed byte string
    pub const BYTES: u8 = 0x0D;
    /// Zero-length null
    pub const NULL: u8 = 0x0E;
}

/// Native type codes (2-byte tag)
pub mod native {
    /// `char` as a little-endian `u32`
    pub const CHAR: u8 = 0x01;
    /// `u128`
    pub const U128: u8 = 0x02;
    /// `i128`
    pub const I128: u8 = 0x03;
}

/// Type tag stored with every key-terminal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Built-in type, one byte on the wire
    BuiltIn(u8),
    /// Native type, marker byte plus code on the wire
    Native(u8),
}

impl TypeTag {
    /// Bytes the tag occupies in the route table
    pub fn encoded_len(self) -> usize {
        match self {
            Self::BuiltIn(_) => 1,
            Self::Native(_) => 2,
        }
    }

    /// Encoded tag bytes; only the first `encoded_len()` are meaningful
    pub fn to_bytes(self) -> [u8; 2] {
        match self {
            Self::BuiltIn(code) => [code, 0],
            Self::Native(code) => [NATIVE_TYPE_MARKER, code],
        }
    }

    /// Decode a tag from the start of `data`, read at route `offset`
    pub fn read(data: &[u8], offset: usize) -> MapResult<Self> {
        match data.first() {
            Some(&NATIVE_TYPE_MARKER) => data
                .get(1)
                .map(|&code| Self::Native(code))
                .ok_or(MapError::Truncated { offset, needed: 1 }),
            Some(&code) => Ok(Self::BuiltIn(code)),
            None => Err(MapError::Truncated { offset, needed: 1 }),
        }
    }

    /// Whether the tag can be written unambiguously
    pub fn is_valid(self) -> bool {
        !matches!(self, Self::BuiltIn(NATIVE_TYPE_MARKER))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuiltIn(code) => write!(f, "built-in 0x{code:02X}"),
            Self::Native(code) => write!(f, "native 0x{code:02X}"),
        }
    }
}

/// Encode/decode strategy for one value type
pub trait ValueCodec<T>: Send + Sync {
    /// Tag stored in the route table for `value`
    fn type_tag(&self, value: &T) -> TypeTag;

    /// Exact number of bytes `encode` writes for `value`
    fn encoded_len(&self, value: &T) -> usize;

    /// Write `value` into the data region
    fn encode(&self, value: &T, out: &mut dyn Write) -> MapResult<()>;

    /// Read a value stored under `tag` from the start of `data`
    fn decode(&self, tag: TypeTag, data: &[u8]) -> MapResult<T>;
}

pub(crate) fn expect_tag(expected: TypeTag, found: TypeTag) -> MapResult<()> {
    if expected == found {
        Ok(())
    } else {
        Err(MapError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        })
    }
}

pub(crate) fn take(data: &[u8], len: usize) -> MapResult<&[u8]> {
    data.get(..len).ok_or(MapError::InvalidValue(format!(
        "need {len} bytes, {} available",
        data.len()
    )))
}
