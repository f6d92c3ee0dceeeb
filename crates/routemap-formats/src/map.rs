//! Map encoding and decoding
//!
//! Layout: `header | route table | data`. The header states the route and
//! data lengths up front, so encoding runs the route traversal twice: once
//! against a size counter to fill in the header, once for real.

use std::io::Write;
use std::sync::Arc;

use binrw::BinWrite;
use routemap_buffer::{BufferConfig, BufferMode, CancellationToken, SegmentWriter};
use tracing::debug;

use crate::codec::{CodecRegistry, ValueCodec};
use crate::error::{MapError, MapResult};
use crate::header::MapHeader;
use crate::key::RouteTable;
use crate::route::{BufferSink, RouteHit, RouteReader, SizeCounter, write_route};

/// Encoder configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Segment sizing for the output buffer
    pub buffer: BufferConfig,
    /// How the output buffer obtains its first segment
    pub mode: BufferMode,
}

fn to_u32(field: &'static str, value: u64) -> MapResult<u32> {
    u32::try_from(value).map_err(|_| MapError::FormatCapacityExceeded {
        field,
        value,
        limit: u64::from(u32::MAX),
    })
}

/// Encodes key/value pairs into the route map layout
pub struct MapEncoder<V> {
    codec: Arc<dyn ValueCodec<V>>,
    config: EncoderConfig,
}

impl<V: 'static> MapEncoder<V> {
    /// Encoder using the codec the global registry resolves for `V`
    pub fn new() -> MapResult<Self> {
        Self::with_registry(CodecRegistry::global())
    }

    /// Encoder using the codec `registry` resolves for `V`
    pub fn with_registry(registry: &CodecRegistry) -> MapResult<Self> {
        Ok(Self::with_codec(registry.get::<V>()?))
    }
}

impl<V> MapEncoder<V> {
    /// Encoder using `codec` for every value
    pub fn with_codec(codec: Arc<dyn ValueCodec<V>>) -> Self {
        Self {
            codec,
            config: EncoderConfig::default(),
        }
    }

    /// Replace the encoder configuration
    pub fn with_config(mut self, config: EncoderConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Compute the header `pairs` would be encoded with, writing nothing
    pub fn estimate<K: AsRef<[u8]>>(&self, pairs: &[(K, V)]) -> MapResult<MapHeader> {
        let table = RouteTable::build(pairs, self.codec.as_ref())?;
        self.plan(&table)
    }

    fn plan(&self, table: &RouteTable<'_, V>) -> MapResult<MapHeader> {
        let mut counter = SizeCounter::new();
        let slots = write_route(&mut counter, table.entries())?;
        let data: u64 = slots
            .iter()
            .map(|slot| self.codec.encoded_len(slot.value) as u64)
            .sum();

        Ok(MapHeader {
            data_length: to_u32("data length", data)?,
            meta_length: to_u32("route length", counter.advanced())?,
            element_count: to_u32("element count", table.element_count() as u64)?,
            max_depth: to_u32("max depth", table.max_depth() as u64)?,
        })
    }

    /// Encode `pairs` into a new byte vector
    pub fn encode<K: AsRef<[u8]>>(&self, pairs: &[(K, V)]) -> MapResult<Vec<u8>> {
        let mut writer = SegmentWriter::with_mode(self.config.mode, self.config.buffer);
        self.encode_with_writer(pairs, &mut writer)?;
        Ok(writer.to_contiguous_bytes())
    }

    /// Encode `pairs` and stream the result into `sink`
    pub fn encode_to<K: AsRef<[u8]>, W: Write>(
        &self,
        pairs: &[(K, V)],
        sink: &mut W,
        cancel: &CancellationToken,
    ) -> MapResult<MapHeader> {
        let mut writer = SegmentWriter::with_mode(self.config.mode, self.config.buffer);
        let header = self.encode_with_writer(pairs, &mut writer)?;
        writer.copy_to(sink, cancel)?;
        Ok(header)
    }

    /// Encode `pairs` at the current position of `writer`.
    ///
    /// The writer is left positioned after the data region.
    pub fn encode_with_writer<K: AsRef<[u8]>>(
        &self,
        pairs: &[(K, V)],
        writer: &mut SegmentWriter,
    ) -> MapResult<MapHeader> {
        let table = RouteTable::build(pairs, self.codec.as_ref())?;
        let header = self.plan(&table)?;

        header.write_options(writer, binrw::Endian::Little, ())?;

        let mut sink = BufferSink::new(writer);
        let route_base = sink.base();
        let slots = write_route(&mut sink, table.entries())?;

        let data_base = writer.position();
        let route_len = data_base - route_base;
        if route_len != u64::from(header.meta_length) {
            return Err(MapError::SizeMismatch {
                region: "route",
                estimated: u64::from(header.meta_length),
                written: route_len,
            });
        }

        for slot in slots {
            let here = writer.position();
            let value_offset = to_u32("value offset", here - data_base)?;
            writer.seek_unchecked(route_base + slot.position);
            writer.write_bytes(&value_offset.to_le_bytes())?;
            writer.seek_unchecked(here);
            self.codec.encode(slot.value, writer)?;
        }

        let data_len = writer.position() - data_base;
        if data_len != u64::from(header.data_length) {
            return Err(MapError::SizeMismatch {
                region: "data",
                estimated: u64::from(header.data_length),
                written: data_len,
            });
        }

        debug!(
            elements = header.element_count,
            route_len = header.meta_length,
            data_len = header.data_length,
            max_depth = header.max_depth,
            "encoded route map"
        );
        Ok(header)
    }
}

impl<V> std::fmt::Debug for MapEncoder<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapEncoder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Encoded route map borrowed from a byte slice
#[derive(Debug, Clone, Copy)]
pub struct RouteMap<'a> {
    header: MapHeader,
    header_len: usize,
    route: RouteReader<'a>,
    data: &'a [u8],
}

impl<'a> RouteMap<'a> {
    /// Parse the header and split off the route and data regions.
    ///
    /// The route table is not walked; lookups decode only what they touch.
    /// Bytes after the data region are ignored.
    pub fn parse(bytes: &'a [u8]) -> MapResult<Self> {
        let (header, header_len) = MapHeader::parse(bytes)?;
        header.validate(bytes.len() - header_len)?;

        let route_end = header_len + header.meta_length as usize;
        let data_end = route_end + header.data_length as usize;
        Ok(Self {
            header,
            header_len,
            route: RouteReader::new(&bytes[header_len..route_end], header.max_depth as usize),
            data: &bytes[route_end..data_end],
        })
    }

    /// Decoded header
    pub fn header(&self) -> &MapHeader {
        &self.header
    }

    /// Total encoded size, header included
    pub fn encoded_len(&self) -> usize {
        self.header_len + self.header.payload_len() as usize
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.header.element_count as usize
    }

    /// Whether the map holds no keys
    pub fn is_empty(&self) -> bool {
        self.header.element_count == 0
    }

    /// Route table reader
    pub fn route(&self) -> &RouteReader<'a> {
        &self.route
    }

    /// Data region
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Locate `key` in the route table
    pub fn find(&self, key: &[u8]) -> MapResult<Option<RouteHit>> {
        self.route.find(key)
    }

    /// Whether `key` is stored
    pub fn contains_key(&self, key: &[u8]) -> MapResult<bool> {
        Ok(self.find(key)?.is_some())
    }

    /// Decode the value stored under `key`
    pub fn get<V>(&self, key: &[u8], codec: &dyn ValueCodec<V>) -> MapResult<Option<V>> {
        match self.find(key)? {
            Some(hit) => self.value_at(hit, codec).map(Some),
            None => Ok(None),
        }
    }

    /// Decode the value a route hit points at
    pub fn value_at<V>(&self, hit: RouteHit, codec: &dyn ValueCodec<V>) -> MapResult<V> {
        let data = self
            .data
            .get(hit.value_offset as usize..)
            .ok_or(MapError::Truncated {
                offset: hit.value_offset as usize,
                needed: 1,
            })?;
        codec.decode(hit.tag, data)
    }

    /// Every stored key with its route hit, in route order
    pub fn entries(&self) -> MapResult<Vec<(Vec<u8>, RouteHit)>> {
        let entries = self.route.entries()?;
        if entries.len() != self.len() {
            return Err(MapError::malformed(0, "element count does not match route"));
        }
        Ok(entries)
    }

    /// Decode every stored pair, in route order
    pub fn decode_all<V>(&self, codec: &dyn ValueCodec<V>) -> MapResult<Vec<(Vec<u8>, V)>> {
        self.entries()?
            .into_iter()
            .map(|(key, hit)| Ok((key, self.value_at(hit, codec)?)))
            .collect()
    }
}

/// Encode `pairs` with the codec the global registry resolves for `V`
pub fn encode_map<K: AsRef<[u8]>, V: 'static>(pairs: &[(K, V)]) -> MapResult<Vec<u8>> {
    MapEncoder::<V>::new()?.encode(pairs)
}

/// Decode every pair in `bytes` with the global registry's codec for `V`
pub fn decode_map<V: 'static>(bytes: &[u8]) -> MapResult<Vec<(Vec<u8>, V)>> {
    let codec = CodecRegistry::global().get::<V>()?;
    RouteMap::parse(bytes)?.decode_all(codec.as_ref())
}

/// Look up one key in `bytes` with the global registry's codec for `V`
pub fn lookup<V: 'static>(bytes: &[u8], key: &[u8]) -> MapResult<Option<V>> {
    let codec = CodecRegistry::global().get::<V>()?;
    RouteMap::parse(bytes)?.get(key, codec.as_ref())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::{PrimitiveCodec, Value};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scenario_a_ab_b() {
        let pairs = [("a", 1u32), ("ab", 2), ("b", 3)];
        let bytes = encode_map(&pairs).unwrap();

        let map = RouteMap::parse(&bytes).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.header().max_depth, 1);
        assert_eq!(map.header().data_length, 12);
        for (key, value) in pairs {
            assert_eq!(map.get::<u32>(key.as_bytes(), &PrimitiveCodec).unwrap(), Some(value));
        }
        assert_eq!(map.get::<u32>(b"abc", &PrimitiveCodec).unwrap(), None);
        assert!(!map.contains_key(b"c").unwrap());
    }

    #[test]
    fn test_empty_map_is_header_only() {
        let pairs: Vec<(&str, u32)> = Vec::new();
        let bytes = encode_map(&pairs).unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0]);

        let map = RouteMap::parse(&bytes).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.find(b"a").unwrap(), None);
        assert!(decode_map::<u32>(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_header_matches_estimate() {
        let pairs = [("alpha", Value::from("x")), ("beta", Value::UInt(9))];
        let encoder = MapEncoder::<Value>::new().unwrap();
        let estimated = encoder.estimate(&pairs).unwrap();

        let bytes = encoder.encode(&pairs).unwrap();
        let map = RouteMap::parse(&bytes).unwrap();
        assert_eq!(*map.header(), estimated);
        assert_eq!(map.encoded_len(), bytes.len());
    }

    #[test]
    fn test_values_follow_route_order() {
        let pairs = [("k2", 20u16), ("k0", 0), ("k1", 10)];
        let bytes = encode_map(&pairs).unwrap();
        let map = RouteMap::parse(&bytes).unwrap();

        let offsets: Vec<u32> = map
            .entries()
            .unwrap()
            .iter()
            .map(|(_, hit)| hit.value_offset)
            .collect();
        assert_eq!(offsets, vec![0, 2, 4]);
        assert_eq!(
            map.decode_all::<u16>(&PrimitiveCodec).unwrap(),
            vec![
                (b"k0".to_vec(), 0u16),
                (b"k1".to_vec(), 10),
                (b"k2".to_vec(), 20)
            ]
        );
    }

    #[test]
    fn test_encode_to_sink() {
        let pairs = [("key", String::from("value"))];
        let encoder = MapEncoder::<String>::new().unwrap();
        let mut out = Vec::new();
        let header = encoder
            .encode_to(&pairs, &mut out, &CancellationToken::new())
            .unwrap();
        assert_eq!(out, encoder.encode(&pairs).unwrap());
        assert_eq!(header.element_count, 1);
        assert_eq!(lookup::<String>(&out, b"key").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn test_cancelled_sink_write() {
        let pairs = [("key", 1u8)];
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut out = Vec::new();
        let result = MapEncoder::<u8>::new()
            .unwrap()
            .encode_to(&pairs, &mut out, &cancel);
        assert!(matches!(result, Err(MapError::Buffer(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn test_element_count_mismatch() {
        let pairs = [("a", 1u8), ("b", 2)];
        let mut bytes = encode_map(&pairs).unwrap();
        bytes[2] = 3;
        let map = RouteMap::parse(&bytes).unwrap();
        assert!(map.entries().is_err());
    }

    #[test]
    fn test_type_mismatch_on_get() {
        let pairs = [("a", 1u8)];
        let bytes = encode_map(&pairs).unwrap();
        assert!(matches!(
            lookup::<u32>(&bytes, b"a"),
            Err(MapError::TypeMismatch { .. })
        ));
    }
}
