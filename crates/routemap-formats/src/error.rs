//! Route map error types

use routemap_buffer::BufferError;
use thiserror::Error;

/// Route map error type
#[derive(Debug, Error)]
pub enum MapError {
    /// A value does not fit the fixed-width slot reserved for it
    #[error("{field} of {value} exceeds format capacity {limit}")]
    FormatCapacityExceeded {
        /// Which slot overflowed
        field: &'static str,
        /// Value that did not fit
        value: u64,
        /// Largest representable value
        limit: u64,
    },

    /// Route bytes do not describe a valid route table
    #[error("malformed route at offset {offset}: {reason}")]
    MalformedRoute {
        /// Offset within the route table
        offset: usize,
        /// What was wrong
        reason: &'static str,
    },

    /// Unrecognized route token byte
    #[error("unknown route token 0x{byte:02X} at offset {offset}")]
    UnknownToken {
        /// Offset within the route table
        offset: usize,
        /// Token byte found
        byte: u8,
    },

    /// Input ended before a field could be read
    #[error("truncated input at offset {offset}: need {needed} more bytes")]
    Truncated {
        /// Offset of the field
        offset: usize,
        /// Bytes missing
        needed: usize,
    },

    /// Variable-length integer could not be decoded
    #[error("variable integer parsing error at offset {0}")]
    VarInt(usize),

    /// Keys must have at least one byte
    #[error("empty key")]
    EmptyKey,

    /// The same key appeared twice in the input
    #[error("duplicate key: {0:02X?}")]
    DuplicateKey(Vec<u8>),

    /// A hand-built route entry violates the table invariants
    #[error("invalid route entry: {0}")]
    InvalidEntry(&'static str),

    /// Estimated and written lengths diverged
    #[error("{region} size mismatch: estimated {estimated}, written {written}")]
    SizeMismatch {
        /// Region that diverged
        region: &'static str,
        /// Length predicted before writing
        estimated: u64,
        /// Length actually written
        written: u64,
    },

    /// No codec is registered for the type
    #[error("no codec registered for type {0}")]
    UnsupportedType(&'static str),

    /// Stored type tag differs from the one the codec reads
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Tag the codec expects
        expected: String,
        /// Tag stored with the value
        found: String,
    },

    /// Value bytes could not be decoded
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Segment buffer error
    #[error("buffer error: {0}")]
    Buffer(#[from] BufferError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

/// Result type for route map operations
pub type MapResult<T> = Result<T, MapError>;

impl MapError {
    pub(crate) fn malformed(offset: usize, reason: &'static str) -> Self {
        Self::MalformedRoute { offset, reason }
    }

    /// Whether this error means the input bytes could not be decoded
    pub fn is_deserialization_failure(&self) -> bool {
        matches!(
            self,
            Self::MalformedRoute { .. }
                | Self::UnknownToken { .. }
                | Self::Truncated { .. }
                | Self::VarInt(_)
                | Self::TypeMismatch { .. }
                | Self::InvalidValue(_)
                | Self::BinRw(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MapError::FormatCapacityExceeded {
            field: "branch offset",
            value: 70000,
            limit: 65535,
        };
        assert_eq!(
            err.to_string(),
            "branch offset of 70000 exceeds format capacity 65535"
        );

        let err = MapError::UnknownToken {
            offset: 3,
            byte: 0xEE,
        };
        assert_eq!(err.to_string(), "unknown route token 0xEE at offset 3");
    }

    #[test]
    fn test_deserialization_classification() {
        assert!(MapError::malformed(0, "x").is_deserialization_failure());
        assert!(!MapError::EmptyKey.is_deserialization_failure());
        assert!(!MapError::Buffer(BufferError::Cancelled).is_deserialization_failure());
    }
}
