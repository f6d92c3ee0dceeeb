//! Embedded route table
//!
//! The route table is a trie over 8-byte key chunks whose sibling runs are
//! laid out either as a linear chain or as a binary split, so a lookup only
//! decodes the tokens on its own path. Writing and size estimation share
//! one traversal ([`write_route`]) over a [`RouteSink`].

mod encoder;
mod reader;
mod sink;

pub use encoder::{ValueSlot, estimate_route_len, write_route};
pub use reader::{RouteHit, RouteReader};
pub use sink::{BufferSink, RouteSink, SizeCounter};

/// Width of a branch-offset slot
pub const BRANCH_OFFSET_SIZE: usize = 2;

/// Width of a value-offset slot
pub const VALUE_OFFSET_SIZE: usize = 4;

/// Sibling runs at least this long are written as a binary split
pub const LINEAR_SCAN_LIMIT: usize = 4;
