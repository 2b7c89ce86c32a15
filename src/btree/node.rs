use serde::Serialize;

use super::{BTreeError, BTreeResult};
use super::slots::Slots;

/// B-tree node: up to `capacity` ordered entries and, when internal,
/// `size + 1` exclusively owned children.
///
/// - `keys[i]` and `values[i]` form one entry
/// - every key in `children[i]` lies between `keys[i - 1]` and `keys[i]`
/// - a node without children is a leaf
///
/// The node is a plain record; [`BTree`](super::BTree) rewrites its fields
/// during splits.
#[derive(Debug, Clone, Serialize)]
pub struct Node<K, V> {
    pub(super) keys: Slots<K>,
    pub(super) values: Slots<V>,
    #[serde(skip_serializing_if = "is_empty_slots")]
    pub(super) children: Slots<Box<Node<K, V>>>,
}

fn is_empty_slots<T>(slots: &Slots<T>) -> bool {
    slots.is_empty()
}

impl<K, V> Node<K, V> {
    /// Create an empty leaf holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            keys: Slots::with_capacity(capacity),
            values: Slots::with_capacity(capacity),
            children: Slots::with_capacity(capacity + 1),
        }
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.keys.capacity()
    }

    /// Number of populated entries
    pub fn size(&self) -> usize {
        self.keys.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// A full node must be split before another entry is added
    pub fn is_full(&self) -> bool {
        self.keys.is_full()
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn children(&self) -> &[Box<Node<K, V>>] {
        &self.children
    }

    /// Write an entry at `index`, shifting later entries right
    pub(super) fn insert_entry(&mut self, index: usize, key: K, value: V) -> BTreeResult<()> {
        self.keys.insert(index, key)?;
        self.values.insert(index, value)?;
        Ok(())
    }

    /// Split a full node around its median entry.
    ///
    /// `self` keeps the first `size / 2` entries (and `size / 2 + 1`
    /// children if internal). Returns the median entry and a new node
    /// holding everything after it.
    pub(super) fn split(&mut self) -> BTreeResult<(K, V, Node<K, V>)> {
        let mid = self.size() / 2;

        let right_keys = self.keys.split_off(mid + 1)?;
        let right_values = self.values.split_off(mid + 1)?;
        let right_children = if self.is_leaf() {
            Slots::with_capacity(self.children.capacity())
        } else {
            self.children.split_off(mid + 1)?
        };

        let median_key = self.keys.pop();
        let median_value = self.values.pop();
        let (key, value) = match (median_key, median_value) {
            (Some(k), Some(v)) => (k, v),
            _ => {
                return Err(BTreeError::InvalidState(
                    "cannot split an empty node".to_string(),
                ));
            }
        };

        let right = Node {
            keys: right_keys,
            values: right_values,
            children: right_children,
        };

        Ok((key, value, right))
    }
}

impl<K: Ord, V> Node<K, V> {
    /// Index of the first key `>= key`, or `size` if none
    pub fn lower_bound(&self, key: &K) -> usize {
        self.keys.partition_point(|k| k < key)
    }

    /// Index of the first key `> key`, or `size` if none
    pub fn upper_bound(&self, key: &K) -> usize {
        self.keys.partition_point(|k| k <= key)
    }
}

#[cfg(test)]
impl<K, V> Node<K, V> {
    /// Build a node from literal entries and children
    pub(super) fn from_parts(
        capacity: usize,
        entries: Vec<(K, V)>,
        children: Vec<Node<K, V>>,
    ) -> Self {
        let mut node = Node::new(capacity);
        for (key, value) in entries {
            node.keys.push(key).unwrap();
            node.values.push(value).unwrap();
        }
        for child in children {
            node.children.push(Box::new(child)).unwrap();
        }
        node
    }
}
