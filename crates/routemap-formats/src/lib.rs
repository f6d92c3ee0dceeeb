//! Binary map codec with an embedded route table
//!
#![allow(clippy::cast_possible_truncation)] // Offsets are range-checked before narrowing
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Domain-specific naming patterns
#![allow(clippy::float_cmp)] // Binary format requirements
#![allow(clippy::return_self_not_must_use)] // Builder patterns
#![allow(clippy::use_self)] // Type clarity
//! A route map serializes key/value pairs into
//!
//! ```text
//! header | route table | data
//! ```
//!
//! where the route table is a trie over 8-byte key chunks. Short sibling
//! runs are linear chains, longer ones binary splits, so a reader finds a
//! key by following branch offsets instead of scanning every entry.
//!
//! # Components
//!
//! - **Header**: four variable-length integers (data length, route
//!   length, element count, max depth)
//! - **Route encoder**: one traversal over a [`route::RouteSink`], run
//!   against a size counter to fill in the header and against the segment
//!   buffer to write the table
//! - **Route reader**: lookup and full enumeration with bounds and
//!   branch-offset validation
//! - **Codecs**: per-type value encoding resolved through a
//!   [`codec::CodecRegistry`]
//!
//! # Example
//!
//! ```
//! use routemap_formats::{RouteMap, encode_map, codec::PrimitiveCodec};
//!
//! let pairs = [("a", 1u32), ("ab", 2), ("b", 3)];
//! let bytes = encode_map(&pairs).unwrap();
//!
//! let map = RouteMap::parse(&bytes).unwrap();
//! assert_eq!(map.get::<u32>(b"ab", &PrimitiveCodec).unwrap(), Some(2));
//! assert_eq!(map.get::<u32>(b"c", &PrimitiveCodec).unwrap(), None);
//! ```

#![warn(missing_docs)]

pub mod codec;
pub mod error;
pub mod header;
pub mod key;
pub mod map;
pub mod route;
pub mod token;
pub mod varint;

pub use codec::{CodecRegistry, TypeTag, Value, ValueCodec};
pub use error::{MapError, MapResult};
pub use header::MapHeader;
pub use key::{KeyEntry, RouteTable};
pub use map::{EncoderConfig, MapEncoder, RouteMap, decode_map, encode_map, lookup};
pub use route::{RouteHit, RouteReader};
