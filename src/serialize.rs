//! Byte-image serialization of the trie's node topology, per spec §4.6.
//!
//! A trie is split into two parallel blobs:
//! - a pre-order stream of fixed-size node records (`label`, `value_index`,
//!   `child_count`), recovered recursively by reading `child_count` children
//!   after each record;
//! - a dense value table, index `0` reserved as the "no value" sentinel.
//!
//! The tie between a node and its value is positional only: the serializer
//! assigns `value_index` in DFS visitation order as it walks the arena, not
//! by carrying arena indices across the wire.

use crate::error::{TrieError, TrieResult};
use crate::node::Node;
use crate::trie::{Inner, Trie, ROOT};

const RECORD_LABEL_BYTES: usize = 4;
const RECORD_VALUE_INDEX_BYTES: usize = 4;
const RECORD_CHILD_COUNT_BYTES: usize = 1;
const RECORD_BYTES: usize = RECORD_LABEL_BYTES + RECORD_VALUE_INDEX_BYTES + RECORD_CHILD_COUNT_BYTES;

/// A trie flattened to a byte image plus a parallel value table, per spec
/// §4.6. `values[0]` is always a placeholder for the "no value" sentinel and
/// is never a node's actual value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedTrie<V> {
    /// Total number of nodes, including the root.
    pub node_count: usize,
    /// The source trie's `height` at the time of serialization.
    pub height: usize,
    /// The source trie's `mem_usage` at the time of serialization.
    pub mem_usage: usize,
    /// Pre-order node records.
    pub bytes: Vec<u8>,
    /// Value table; index `0` is the null sentinel.
    pub values: Vec<Option<V>>,
}

impl<V: Clone> Trie<V> {
    /// Flattens this trie into a [`SerializedTrie`].
    pub fn serialize(&self) -> SerializedTrie<V> {
        let inner = self.inner.borrow();
        let mut bytes = Vec::with_capacity(self.node_count() * RECORD_BYTES);
        let mut values = vec![None];

        write_node(&inner, ROOT, &mut bytes, &mut values);

        SerializedTrie {
            node_count: self.node_count(),
            height: inner.height,
            mem_usage: inner.mem_usage,
            bytes,
            values,
        }
    }

    /// Rebuilds a trie from a [`SerializedTrie`] produced by [`Trie::serialize`].
    ///
    /// Returns [`TrieError::Serialization`] if the byte stream is truncated,
    /// declares more children than remain in the stream, or references a
    /// `value_index` outside `state.values`.
    pub fn deserialize(state: &SerializedTrie<V>) -> TrieResult<Self> {
        let trie = Self::new();
        let mut cursor = 0usize;
        let mut item_count = 0usize;
        let mut height = 0usize;

        {
            let mut inner = trie.inner.borrow_mut();
            inner.nodes.clear();
            inner.nodes.push(Node::new('\0'));
            read_node(state, &mut cursor, ROOT, &mut inner, 0, &mut item_count, &mut height)?;
        }

        if cursor != state.bytes.len() {
            return Err(TrieError::serialization(format!(
                "{} trailing bytes after decoding the declared node tree",
                state.bytes.len() - cursor
            )));
        }

        {
            let mut inner = trie.inner.borrow_mut();
            inner.item_count = item_count;
            inner.height = height.max(state.height);
            inner.mem_usage = state.mem_usage;
            inner.dirty = true;
        }

        Ok(trie)
    }
}

fn write_node<V: Clone>(
    inner: &Inner<V>,
    node_idx: usize,
    bytes: &mut Vec<u8>,
    values: &mut Vec<Option<V>>,
) {
    let node = &inner.nodes[node_idx];
    let children: Vec<(char, usize)> = node.children.iter().collect();

    let value_index = match &node.value {
        Some(v) => {
            values.push(Some(v.clone()));
            values.len() - 1
        }
        None => 0,
    };

    bytes.extend_from_slice(&(node.label as u32).to_le_bytes());
    bytes.extend_from_slice(&(value_index as u32).to_le_bytes());
    bytes.push(
        u8::try_from(children.len())
            .expect("a node's child count exceeds the distinct Unicode scalar alphabet"),
    );

    for (_, child_idx) in children {
        write_node(inner, child_idx, bytes, values);
    }
}

fn read_node<V: Clone>(
    state: &SerializedTrie<V>,
    cursor: &mut usize,
    node_idx: usize,
    inner: &mut Inner<V>,
    depth: usize,
    item_count: &mut usize,
    height: &mut usize,
) -> TrieResult<()> {
    let record = read_record(state, cursor)?;

    if node_idx != ROOT {
        inner.nodes[node_idx].reset(record.label);
    }

    if record.value_index != 0 {
        let value = state
            .values
            .get(record.value_index)
            .ok_or_else(|| {
                TrieError::serialization(format!(
                    "value_index {} outside the value table of length {}",
                    record.value_index,
                    state.values.len()
                ))
            })?
            .clone();
        inner.nodes[node_idx].value = value;
        if inner.nodes[node_idx].value.is_some() {
            *item_count += 1;
            *height = (*height).max(depth);
        }
    }

    for _ in 0..record.child_count {
        inner.nodes.push(Node::new('\0'));
        let child_idx = inner.nodes.len() - 1;
        read_node(state, cursor, child_idx, inner, depth + 1, item_count, height)?;
        let label = inner.nodes[child_idx].label;
        inner.nodes[node_idx].children.insert(label, child_idx);
    }

    Ok(())
}

struct Record {
    label: char,
    value_index: usize,
    child_count: u8,
}

fn read_record<V>(state: &SerializedTrie<V>, cursor: &mut usize) -> TrieResult<Record> {
    if *cursor + RECORD_BYTES > state.bytes.len() {
        return Err(TrieError::serialization(format!(
            "truncated record at byte offset {}",
            cursor
        )));
    }

    let label_bytes: [u8; 4] = state.bytes[*cursor..*cursor + 4].try_into().unwrap();
    let label_scalar = u32::from_le_bytes(label_bytes);
    let label = char::from_u32(label_scalar).ok_or_else(|| {
        TrieError::serialization(format!("{label_scalar} is not a valid Unicode scalar value"))
    })?;
    *cursor += RECORD_LABEL_BYTES;

    let value_bytes: [u8; 4] = state.bytes[*cursor..*cursor + 4].try_into().unwrap();
    let value_index = u32::from_le_bytes(value_bytes) as usize;
    *cursor += RECORD_VALUE_INDEX_BYTES;

    let child_count = state.bytes[*cursor];
    *cursor += RECORD_CHILD_COUNT_BYTES;

    Ok(Record { label, value_index, child_count })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_key_set_and_values() {
        let trie = Trie::new();
        trie.add("cat", 1);
        trie.add("car", 2);
        trie.add("cart", 3);

        let state = trie.serialize();
        let restored = Trie::deserialize(&state).unwrap();

        assert_eq!(restored.len(), trie.len());
        assert_eq!(restored.search("cat"), Some(1));
        assert_eq!(restored.search("car"), Some(2));
        assert_eq!(restored.search("cart"), Some(3));
        assert_eq!(restored.search("ca"), None);
    }

    #[test]
    fn round_trip_of_an_empty_trie() {
        let trie: Trie<i32> = Trie::new();
        let state = trie.serialize();
        let restored = Trie::deserialize(&state).unwrap();
        assert!(restored.is_empty());
        assert_eq!(restored.node_count(), 1);
    }

    #[test]
    fn null_sentinel_occupies_value_table_index_zero() {
        let trie = Trie::new();
        trie.add("a", 42);
        let state = trie.serialize();
        assert!(state.values[0].is_none());
        assert!(state.values.iter().skip(1).any(|v| *v == Some(42)));
    }

    #[test]
    fn truncated_byte_stream_is_a_serialization_error() {
        let trie = Trie::new();
        trie.add("cat", 1);
        let mut state = trie.serialize();
        state.bytes.truncate(state.bytes.len() - 1);
        let err = Trie::deserialize(&state).unwrap_err();
        assert!(matches!(err, TrieError::Serialization { .. }));
    }

    #[test]
    fn out_of_range_value_index_is_a_serialization_error() {
        let trie = Trie::new();
        trie.add("cat", 1);
        let mut state = trie.serialize();
        // Corrupt the root record's value_index field (bytes 4..8) to point
        // past the value table.
        let bogus = 999u32.to_le_bytes();
        state.bytes[4..8].copy_from_slice(&bogus);
        let err = Trie::deserialize(&state).unwrap_err();
        assert!(matches!(err, TrieError::Serialization { .. }));
    }

    #[test]
    fn restored_trie_is_independent_of_the_source() {
        let trie = Trie::new();
        trie.add("cat", 1);
        let state = trie.serialize();
        let restored = Trie::deserialize(&state).unwrap();
        trie.add("dog", 2);
        assert_eq!(restored.search("dog"), None);
    }
}
