//! Key chunking and route table construction
//!
//! Keys are split into 8-byte chunks, one per trie depth. A chunk is
//! compared as its bytes read little-endian and zero-padded (the packed
//! value) together with its byte count, which keeps `"a"` and `"a\0"`
//! apart. Sibling entries are sorted by that pair.

use std::collections::BTreeMap;

use crate::codec::{TypeTag, ValueCodec};
use crate::error::{MapError, MapResult};

/// Key bytes examined per trie depth
pub const CHUNK_SIZE: usize = 8;

/// Pack up to eight bytes into a comparable integer
pub fn pack_chunk(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= CHUNK_SIZE);
    let mut buf = [0u8; CHUNK_SIZE];
    buf[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

/// Bytes of a packed chunk; only the first `byte_count` are significant
pub fn unpack_chunk(packed: u64) -> [u8; CHUNK_SIZE] {
    packed.to_le_bytes()
}

/// The chunk of `key` examined at `depth`, empty past the end of the key
pub fn key_chunk(key: &[u8], depth: usize) -> &[u8] {
    let start = depth.saturating_mul(CHUNK_SIZE).min(key.len());
    let end = start.saturating_add(CHUNK_SIZE).min(key.len());
    &key[start..end]
}

/// Number of chunk levels `key` spans
pub fn chunk_depth(key: &[u8]) -> usize {
    key.len().div_ceil(CHUNK_SIZE)
}

/// One trie node at a given depth
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEntry<'v, V> {
    /// Significant bytes of this chunk (1..=8)
    pub byte_count: u8,
    /// Chunk bytes read little-endian, zero-padded
    pub packed: u64,
    /// Type tag and value when a key ends at this chunk
    pub value: Option<(TypeTag, &'v V)>,
    /// Entries for the next chunk, sorted; empty when no key continues
    pub children: Vec<KeyEntry<'v, V>>,
}

impl<V> KeyEntry<'_, V> {
    /// Whether a key terminates at this entry
    pub fn is_key(&self) -> bool {
        self.value.is_some()
    }

    /// Whether longer keys continue below this entry
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Significant chunk bytes
    pub fn chunk(&self) -> Vec<u8> {
        unpack_chunk(self.packed)[..usize::from(self.byte_count)].to_vec()
    }

    fn sort_key(&self) -> (u64, u8) {
        (self.packed, self.byte_count)
    }
}

/// Sorted forest of depth-0 entries plus the header counts derived from it
#[derive(Debug, Clone, PartialEq)]
pub struct RouteTable<'v, V> {
    entries: Vec<KeyEntry<'v, V>>,
    element_count: usize,
    max_depth: usize,
}

struct Pending<'v, V> {
    key: &'v [u8],
    value: &'v V,
}

struct Group<'p, 'v, V> {
    terminal: Option<&'p Pending<'v, V>>,
    rest: Vec<&'p Pending<'v, V>>,
}

impl<V> Group<'_, '_, V> {
    fn new() -> Self {
        Self {
            terminal: None,
            rest: Vec::new(),
        }
    }
}

impl<'v, V> RouteTable<'v, V> {
    /// Build the table for `pairs`, tagging values with `codec`
    pub fn build<K: AsRef<[u8]>>(
        pairs: &'v [(K, V)],
        codec: &dyn ValueCodec<V>,
    ) -> MapResult<Self> {
        let mut pending = Vec::with_capacity(pairs.len());
        let mut max_depth = 0;
        for (key, value) in pairs {
            let key = key.as_ref();
            if key.is_empty() {
                return Err(MapError::EmptyKey);
            }
            max_depth = max_depth.max(chunk_depth(key));
            pending.push(Pending { key, value });
        }

        let level: Vec<&Pending<'v, V>> = pending.iter().collect();
        let entries = build_level(&level, 0, codec)?;

        Ok(Self {
            entries,
            element_count: pairs.len(),
            max_depth,
        })
    }

    /// Wrap entries produced elsewhere after checking the table invariants
    pub fn from_entries(entries: Vec<KeyEntry<'v, V>>) -> MapResult<Self> {
        let (element_count, max_depth) = validate_level(&entries)?;
        Ok(Self {
            entries,
            element_count,
            max_depth,
        })
    }

    /// Depth-0 entries
    pub fn entries(&self) -> &[KeyEntry<'v, V>] {
        &self.entries
    }

    /// Number of value-bearing entries
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Chunk levels of the longest key
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

fn build_level<'v, V>(
    level: &[&Pending<'v, V>],
    depth: usize,
    codec: &dyn ValueCodec<V>,
) -> MapResult<Vec<KeyEntry<'v, V>>> {
    let mut groups: BTreeMap<(u64, u8), Group<'_, 'v, V>> = BTreeMap::new();

    for item in level {
        let chunk = key_chunk(item.key, depth);
        let sort_key = (pack_chunk(chunk), chunk.len() as u8);
        let group = groups.entry(sort_key).or_insert_with(Group::new);

        if item.key.len() <= (depth + 1) * CHUNK_SIZE {
            if group.terminal.is_some() {
                return Err(MapError::DuplicateKey(item.key.to_vec()));
            }
            group.terminal = Some(*item);
        } else {
            group.rest.push(*item);
        }
    }

    let mut entries = Vec::with_capacity(groups.len());
    for ((packed, byte_count), group) in groups {
        let value = match group.terminal {
            Some(item) => {
                let tag = codec.type_tag(item.value);
                if !tag.is_valid() {
                    return Err(MapError::InvalidEntry("type tag collides with native marker"));
                }
                Some((tag, item.value))
            }
            None => None,
        };
        let children = if group.rest.is_empty() {
            Vec::new()
        } else {
            build_level(&group.rest, depth + 1, codec)?
        };
        entries.push(KeyEntry {
            byte_count,
            packed,
            value,
            children,
        });
    }
    Ok(entries)
}

fn validate_level<V>(entries: &[KeyEntry<'_, V>]) -> MapResult<(usize, usize)> {
    let mut element_count = 0;
    let mut max_depth = 0;

    for (i, entry) in entries.iter().enumerate() {
        if entry.byte_count == 0 || usize::from(entry.byte_count) > CHUNK_SIZE {
            return Err(MapError::InvalidEntry("byte count out of range"));
        }
        if usize::from(entry.byte_count) < CHUNK_SIZE && entry.packed >> (entry.byte_count * 8) != 0
        {
            return Err(MapError::InvalidEntry("packed value wider than byte count"));
        }
        if i > 0 && entries[i - 1].sort_key() >= entry.sort_key() {
            return Err(MapError::InvalidEntry("entries not strictly ascending"));
        }
        if !entry.is_key() && !entry.has_children() {
            return Err(MapError::InvalidEntry("entry without value must have children"));
        }
        if entry.has_children() && usize::from(entry.byte_count) != CHUNK_SIZE {
            return Err(MapError::InvalidEntry("partial chunk cannot have children"));
        }
        if let Some((tag, _)) = entry.value {
            if !tag.is_valid() {
                return Err(MapError::InvalidEntry("type tag collides with native marker"));
            }
            element_count += 1;
        }

        let (child_count, child_depth) = validate_level(&entry.children)?;
        element_count += child_count;
        max_depth = max_depth.max(child_depth + 1);
    }
    Ok((element_count, max_depth))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::PrimitiveCodec;

    fn table<'v>(pairs: &'v [(&'static str, u32)]) -> RouteTable<'v, u32> {
        RouteTable::build(pairs, &PrimitiveCodec).unwrap()
    }

    #[test]
    fn test_chunk_helpers() {
        assert_eq!(pack_chunk(&[0x61]), 0x61);
        assert_eq!(pack_chunk(&[0x61, 0x62]), 0x6261);
        assert_eq!(&unpack_chunk(0x6261)[..2], b"ab");
        assert_eq!(key_chunk(b"0123456789", 0), b"01234567");
        assert_eq!(key_chunk(b"0123456789", 1), b"89");
        assert_eq!(key_chunk(b"0123456789", 2), b"");
        assert_eq!(chunk_depth(b"01234567"), 1);
        assert_eq!(chunk_depth(b"012345678"), 2);
    }

    #[test]
    fn test_shared_leading_byte() {
        let pairs = [("a", 1), ("ab", 2), ("b", 3)];
        let table = table(&pairs);
        assert_eq!(table.element_count(), 3);
        assert_eq!(table.max_depth(), 1);

        let chunks: Vec<(Vec<u8>, u8)> = table
            .entries()
            .iter()
            .map(|e| (e.chunk(), e.byte_count))
            .collect();
        assert_eq!(
            chunks,
            vec![(b"a".to_vec(), 1), (b"b".to_vec(), 1), (b"ab".to_vec(), 2)]
        );
        assert!(table.entries().iter().all(|e| e.is_key() && !e.has_children()));
    }

    #[test]
    fn test_full_chunk_key_merges_with_longer_key() {
        let pairs = [("abcdefgh", 1), ("abcdefghij", 2), ("abcdefghik", 3)];
        let table = table(&pairs);
        assert_eq!(table.max_depth(), 2);
        assert_eq!(table.entries().len(), 1);

        let entry = &table.entries()[0];
        assert_eq!(entry.byte_count, 8);
        assert!(entry.is_key());
        assert_eq!(entry.children.len(), 2);
    }

    #[test]
    fn test_pass_through_entry() {
        let pairs = [("abcdefghX", 1)];
        let table = table(&pairs);
        let entry = &table.entries()[0];
        assert!(!entry.is_key());
        assert_eq!(entry.children.len(), 1);
        assert_eq!(entry.children[0].chunk(), b"X");
    }

    #[test]
    fn test_rejects_empty_and_duplicate_keys() {
        let pairs = [("", 1u32)];
        assert!(matches!(
            RouteTable::build(&pairs, &PrimitiveCodec),
            Err(MapError::EmptyKey)
        ));

        let pairs = [("abcdefghij", 1u32), ("b", 2), ("abcdefghij", 3)];
        assert!(matches!(
            RouteTable::build(&pairs, &PrimitiveCodec),
            Err(MapError::DuplicateKey(key)) if key == b"abcdefghij"
        ));
    }

    #[test]
    fn test_empty_table() {
        let pairs: [(&str, u32); 0] = [];
        let table = table(&pairs);
        assert_eq!(table.element_count(), 0);
        assert_eq!(table.max_depth(), 0);
        assert!(table.entries().is_empty());
    }

    #[test]
    fn test_from_entries_validation() {
        let value = 7u32;
        let leaf = |packed: u64, byte_count: u8| KeyEntry {
            byte_count,
            packed,
            value: Some((TypeTag::BuiltIn(6), &value)),
            children: Vec::new(),
        };

        let table = RouteTable::from_entries(vec![leaf(1, 1), leaf(2, 1)]).unwrap();
        assert_eq!(table.element_count(), 2);
        assert_eq!(table.max_depth(), 1);

        assert!(RouteTable::from_entries(vec![leaf(2, 1), leaf(1, 1)]).is_err());
        assert!(RouteTable::from_entries(vec![leaf(0x1FF, 1)]).is_err());

        let bare = KeyEntry::<u32> {
            byte_count: 8,
            packed: 0,
            value: None,
            children: Vec::new(),
        };
        assert!(matches!(
            RouteTable::from_entries(vec![bare]),
            Err(MapError::InvalidEntry(_))
        ));

        let partial_parent = KeyEntry {
            byte_count: 3,
            packed: 1,
            value: None,
            children: vec![leaf(1, 1)],
        };
        assert!(RouteTable::from_entries(vec![partial_parent]).is_err());
    }
}
