//! Buffer sizing and lifetime configuration

/// Floor for segments rented on overflow.
pub const DEFAULT_MIN_SEGMENT_SIZE: usize = i16::MAX as usize;

/// Size of the first segment rented by a scoped writer.
pub const DEFAULT_INITIAL_SEGMENT_SIZE: usize = 1024;

/// How the writer obtains its first segment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BufferMode {
    /// Rent the first segment and release it when the writer is dropped
    #[default]
    Scoped,
    /// Borrow the process-lifetime cached segment, renting only when it
    /// is already held by another writer
    Shared,
}

impl std::str::FromStr for BufferMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scoped" => Ok(Self::Scoped),
            "shared" => Ok(Self::Shared),
            other => Err(format!("unknown buffer mode: {other}")),
        }
    }
}

/// Segment sizing for the writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    /// Length of the first segment
    pub initial_segment_size: usize,
    /// Minimum length of every segment rented on overflow
    pub min_segment_size: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            initial_segment_size: DEFAULT_INITIAL_SEGMENT_SIZE,
            min_segment_size: DEFAULT_MIN_SEGMENT_SIZE,
        }
    }
}

impl BufferConfig {
    /// Size of the segment rented when `overflow` bytes did not fit
    pub fn growth_size(&self, overflow: usize) -> usize {
        overflow.saturating_mul(2).max(self.min_segment_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_size_is_doubled_or_floored() {
        let config = BufferConfig {
            initial_segment_size: 16,
            min_segment_size: 64,
        };
        assert_eq!(config.growth_size(8), 64);
        assert_eq!(config.growth_size(32), 64);
        assert_eq!(config.growth_size(100), 200);
    }

    #[test]
    fn test_buffer_mode_parse() {
        assert_eq!("scoped".parse::<BufferMode>(), Ok(BufferMode::Scoped));
        assert_eq!("Shared".parse::<BufferMode>(), Ok(BufferMode::Shared));
        assert!("global".parse::<BufferMode>().is_err());
    }
}
