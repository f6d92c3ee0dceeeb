//! Route table tokens
//!
//! Every token is a single byte. Equal-next, equal-last and less-than
//! carry the chunk byte count in the code itself:
//!
//! | Token                 | Code          |
//! |-----------------------|---------------|
//! | equal-next, key (n)   | `n` (1..=8)   |
//! | equal-next, no key    | 9             |
//! | equal-last, key (n)   | `10 + n`      |
//! | equal-last, no key    | 19            |
//! | less-than (n)         | `20 + n`      |
//! | less-else             | 29            |
//! | has-children          | 30            |
//! | no-children           | 31            |

use crate::error::{MapError, MapResult};
use crate::key::CHUNK_SIZE;

const EQUAL_NEXT_BASE: u8 = 0;
const EQUAL_NEXT_NO_KEY: u8 = 9;
const EQUAL_LAST_BASE: u8 = 10;
const EQUAL_LAST_NO_KEY: u8 = 19;
const LESS_THAN_BASE: u8 = 20;
const LESS_ELSE: u8 = 29;
const HAS_CHILDREN: u8 = 30;
const NO_CHILDREN: u8 = 31;

/// What an equal token says about its entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// Key-terminal entry with this many significant chunk bytes
    Key(u8),
    /// Intermediate full chunk without a value
    PassThrough,
}

impl ChunkKind {
    /// Number of chunk bytes stored for the entry
    pub fn byte_count(self) -> u8 {
        match self {
            Self::Key(n) => n,
            Self::PassThrough => CHUNK_SIZE as u8,
        }
    }

    /// Whether the entry carries a value
    pub fn is_key(self) -> bool {
        matches!(self, Self::Key(_))
    }
}

/// Route table token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteToken {
    /// Entry followed by further siblings
    EqualNext(ChunkKind),
    /// Last entry of its sibling run
    EqualLast(ChunkKind),
    /// Binary split on a pivot chunk of this many bytes
    LessThan(u8),
    /// Right half of a binary split
    LessElse,
    /// Entry continues at the next depth
    HasChildren,
    /// Entry ends here
    NoChildren,
}

fn valid_count(n: u8) -> bool {
    (1..=CHUNK_SIZE as u8).contains(&n)
}

impl RouteToken {
    /// Encode to the token byte
    pub fn to_byte(self) -> u8 {
        match self {
            Self::EqualNext(ChunkKind::Key(n)) => EQUAL_NEXT_BASE + n,
            Self::EqualNext(ChunkKind::PassThrough) => EQUAL_NEXT_NO_KEY,
            Self::EqualLast(ChunkKind::Key(n)) => EQUAL_LAST_BASE + n,
            Self::EqualLast(ChunkKind::PassThrough) => EQUAL_LAST_NO_KEY,
            Self::LessThan(n) => LESS_THAN_BASE + n,
            Self::LessElse => LESS_ELSE,
            Self::HasChildren => HAS_CHILDREN,
            Self::NoChildren => NO_CHILDREN,
        }
    }

    /// Decode a token byte read at `offset`
    pub fn from_byte(byte: u8, offset: usize) -> MapResult<Self> {
        let token = match byte {
            EQUAL_NEXT_NO_KEY => Self::EqualNext(ChunkKind::PassThrough),
            EQUAL_LAST_NO_KEY => Self::EqualLast(ChunkKind::PassThrough),
            LESS_ELSE => Self::LessElse,
            HAS_CHILDREN => Self::HasChildren,
            NO_CHILDREN => Self::NoChildren,
            b if valid_count(b - EQUAL_NEXT_BASE) => Self::EqualNext(ChunkKind::Key(b)),
            b if b > EQUAL_LAST_BASE && valid_count(b - EQUAL_LAST_BASE) => {
                Self::EqualLast(ChunkKind::Key(b - EQUAL_LAST_BASE))
            }
            b if b > LESS_THAN_BASE && valid_count(b - LESS_THAN_BASE) => {
                Self::LessThan(b - LESS_THAN_BASE)
            }
            b => return Err(MapError::UnknownToken { offset, byte: b }),
        };
        Ok(token)
    }

    /// Check that the byte count embedded in the token is in range
    pub fn is_well_formed(self) -> bool {
        match self {
            Self::EqualNext(ChunkKind::Key(n))
            | Self::EqualLast(ChunkKind::Key(n))
            | Self::LessThan(n) => valid_count(n),
            _ => true,
        }
    }
}
