//! Buffer error types

use thiserror::Error;

/// Segment buffer error type
#[derive(Debug, Error)]
pub enum BufferError {
    /// Seek target lies outside the committed region
    #[error("invalid seek to {position}: committed length is {committed}")]
    InvalidSeek {
        /// Requested logical position
        position: i64,
        /// Committed length at the time of the seek
        committed: u64,
    },

    /// A write would cross the boundary of a segment that is not the last one
    #[error("write of {requested} bytes at {position} crosses segment boundary {boundary}")]
    WriteOutOfBounds {
        /// Logical cursor position
        position: u64,
        /// Requested contiguous size
        requested: usize,
        /// Boundary of the segment holding the cursor
        boundary: usize,
    },

    /// Cancellation was observed between two segment writes
    #[error("operation cancelled")]
    Cancelled,

    /// I/O error from the output sink
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for buffer operations
pub type BufferResult<T> = Result<T, BufferError>;

impl From<BufferError> for std::io::Error {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::Io(e) => e,
            BufferError::Cancelled => Self::new(std::io::ErrorKind::Interrupted, err),
            other => Self::new(std::io::ErrorKind::InvalidInput, other),
        }
    }
}
