//! Dynamically typed map values
//!
//! [`Value`] lets one map hold entries of different types. Each entry
//! keeps the type tag of its variant, so maps written with concrete
//! types (`u16`, `i32`, `char`, ...) can also be read back as `Value`.

use std::fmt;
use std::io::Write;

use serde::{Deserialize, Serialize};

use super::{PrimitiveCodec, TypeTag, ValueCodec, builtin, native};
use crate::error::{MapError, MapResult};

/// A dynamically typed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// No value
    Null,
    /// Boolean
    Bool(bool),
    /// Unsigned integer
    UInt(u64),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Bytes(Vec<u8>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => {
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::UInt(u64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

/// Codec for [`Value`], dispatching on the variant when writing and on
/// the stored tag when reading
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicCodec;

impl ValueCodec<Value> for DynamicCodec {
    fn type_tag(&self, value: &Value) -> TypeTag {
        let code = match value {
            Value::Null => builtin::NULL,
            Value::Bool(_) => builtin::BOOL,
            Value::UInt(_) => builtin::U64,
            Value::Int(_) => builtin::I64,
            Value::Float(_) => builtin::F64,
            Value::String(_) => builtin::STRING,
            Value::Bytes(_) => builtin::BYTES,
        };
        TypeTag::BuiltIn(code)
    }

    fn encoded_len(&self, value: &Value) -> usize {
        let p = PrimitiveCodec;
        match value {
            Value::Null => 0,
            Value::Bool(v) => p.encoded_len(v),
            Value::UInt(v) => p.encoded_len(v),
            Value::Int(v) => p.encoded_len(v),
            Value::Float(v) => p.encoded_len(v),
            Value::String(v) => p.encoded_len(v),
            Value::Bytes(v) => p.encoded_len(v),
        }
    }

    fn encode(&self, value: &Value, out: &mut dyn Write) -> MapResult<()> {
        let p = PrimitiveCodec;
        match value {
            Value::Null => Ok(()),
            Value::Bool(v) => p.encode(v, out),
            Value::UInt(v) => p.encode(v, out),
            Value::Int(v) => p.encode(v, out),
            Value::Float(v) => p.encode(v, out),
            Value::String(v) => p.encode(v, out),
            Value::Bytes(v) => p.encode(v, out),
        }
    }

    fn decode(&self, tag: TypeTag, data: &[u8]) -> MapResult<Value> {
        let p = PrimitiveCodec;
        let value = match tag {
            TypeTag::BuiltIn(builtin::NULL) => Value::Null,
            TypeTag::BuiltIn(builtin::BOOL) => Value::Bool(p.decode(tag, data)?),
            TypeTag::BuiltIn(builtin::U8) => {
                Value::UInt(u64::from(ValueCodec::<u8>::decode(&p, tag, data)?))
            }
            TypeTag::BuiltIn(builtin::U16) => {
                Value::UInt(u64::from(ValueCodec::<u16>::decode(&p, tag, data)?))
            }
            TypeTag::BuiltIn(builtin::U32) => {
                Value::UInt(u64::from(ValueCodec::<u32>::decode(&p, tag, data)?))
            }
            TypeTag::BuiltIn(builtin::U64) => Value::UInt(p.decode(tag, data)?),
            TypeTag::BuiltIn(builtin::I8) => {
                Value::Int(i64::from(ValueCodec::<i8>::decode(&p, tag, data)?))
            }
            TypeTag::BuiltIn(builtin::I16) => {
                Value::Int(i64::from(ValueCodec::<i16>::decode(&p, tag, data)?))
            }
            TypeTag::BuiltIn(builtin::I32) => {
                Value::Int(i64::from(ValueCodec::<i32>::decode(&p, tag, data)?))
            }
            TypeTag::BuiltIn(builtin::I64) => Value::Int(p.decode(tag, data)?),
            TypeTag::BuiltIn(builtin::F32) => {
                Value::Float(f64::from(ValueCodec::<f32>::decode(&p, tag, data)?))
            }
            TypeTag::BuiltIn(builtin::F64) => Value::Float(p.decode(tag, data)?),
            TypeTag::BuiltIn(builtin::STRING) => Value::String(p.decode(tag, data)?),
            TypeTag::BuiltIn(builtin::BYTES) => Value::Bytes(p.decode(tag, data)?),
            TypeTag::Native(native::CHAR) => {
                let c: char = p.decode(tag, data)?;
                Value::String(c.to_string())
            }
            TypeTag::Native(native::U128) => {
                let v: u128 = p.decode(tag, data)?;
                Value::UInt(u64::try_from(v).map_err(|_| {
                    MapError::InvalidValue(format!("u128 {v} does not fit a dynamic value"))
                })?)
            }
            TypeTag::Native(native::I128) => {
                let v: i128 = p.decode(tag, data)?;
                Value::Int(i64::try_from(v).map_err(|_| {
                    MapError::InvalidValue(format!("i128 {v} does not fit a dynamic value"))
                })?)
            }
            other => {
                return Err(MapError::TypeMismatch {
                    expected: "a dynamic value type".to_string(),
                    found: other.to_string(),
                });
            }
        };
        Ok(value)
    }
}
