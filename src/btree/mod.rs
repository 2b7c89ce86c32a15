//! B-tree implementation for in-memory ordered indexing
//!
//! This module provides a classic B-tree where every node stores entries
//! (not only the leaves). It supports:
//! - Duplicate keys (each insert adds an entry)
//! - Point lookup and bounded in-order traversal from any start key
//! - Top-down insertion that splits full nodes before descending into them
//!
//! There is no deletion; the tree only grows, and its height only changes
//! when a full root is split.

mod error;
mod node;
mod slots;

#[cfg(test)]
mod tests;

use std::fmt::{self, Debug, Display, Formatter};

use serde::Serialize;
use tracing::{debug, trace};

pub use error::{BTreeError, BTreeResult};
pub use node::Node;
pub use slots::Slots;

/// Default node capacity (entries per node)
pub const DEFAULT_CAPACITY: usize = 5;

/// B-tree data structure
///
/// Capacity `c` means:
/// - Every node holds at most `c` entries
/// - Internal nodes hold exactly one more child than entries
/// - A node with `c` entries is split before anything is added below it
#[derive(Debug, Clone, Serialize)]
pub struct BTree<K, V> {
    /// Root node (an empty leaf for a new tree)
    root: Node<K, V>,

    /// Total number of entries in the tree
    #[serde(skip)]
    entry_count: usize,
}

impl<K, V> BTree<K, V> {
    /// Create a new empty B-tree with the given node capacity
    ///
    /// # Arguments
    /// * `capacity` - Maximum entries per node (must be >= 1)
    ///
    /// # Returns
    /// * `Ok(BTree)` - A new empty tree
    /// * `Err(BTreeError)` - If capacity is zero
    pub fn new(capacity: usize) -> BTreeResult<Self> {
        if capacity == 0 {
            return Err(BTreeError::InvalidCapacity(capacity));
        }

        Ok(Self {
            root: Node::new(capacity),
            entry_count: 0,
        })
    }

    /// Get the node capacity
    pub fn capacity(&self) -> usize {
        self.root.capacity()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    /// Get number of entries in the tree
    pub fn len(&self) -> usize {
        self.entry_count
    }

    /// Get tree height (1 for a single leaf)
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut current = &self.root;

        while let Some(child) = current.children().first() {
            current = child;
            height += 1;
        }

        height
    }

    /// Get the root node
    pub fn root(&self) -> &Node<K, V> {
        &self.root
    }

    /// Iterate over all entries in key order
    pub fn iter(&self) -> BTreeIter<'_, K, V> {
        BTreeIter::new(self)
    }
}

impl<K, V> Default for BTree<K, V> {
    fn default() -> Self {
        Self {
            root: Node::new(DEFAULT_CAPACITY),
            entry_count: 0,
        }
    }
}

impl<K: Ord, V> BTree<K, V> {
    // ========== Search Operations ==========

    /// Search for a key.
    ///
    /// With duplicate keys this returns the occurrence met first on the way
    /// down from the root: the shallowest node holding the key, leftmost
    /// within that node.
    pub fn find(&self, key: &K) -> Option<&V> {
        let mut current = &self.root;

        loop {
            let i = current.lower_bound(key);
            if i < current.size() && current.keys[i] == *key {
                return Some(&current.values[i]);
            }
            current = current.children.get(i)?;
        }
    }

    /// Collect up to `count` values in key order, starting at the first key
    /// `>= key`. `None` means no limit.
    pub fn traverse(&self, key: &K, count: Option<usize>) -> Vec<&V> {
        self.range_entries(key, count)
            .into_iter()
            .map(|(_, value)| value)
            .collect()
    }

    /// Like [`traverse`](Self::traverse), but yields keys alongside values
    pub fn range_entries(&self, key: &K, count: Option<usize>) -> Vec<(&K, &V)> {
        let mut buffer = Vec::new();
        Self::traverse_node(&self.root, key, count, &mut buffer);
        buffer
    }

    fn traverse_node<'a>(
        node: &'a Node<K, V>,
        key: &K,
        count: Option<usize>,
        buffer: &mut Vec<(&'a K, &'a V)>,
    ) {
        let limit_reached = |len: usize| count.is_some_and(|limit| len >= limit);
        if limit_reached(buffer.len()) {
            return;
        }

        let start = node.lower_bound(key);
        for j in start..node.size() {
            if let Some(child) = node.children.get(j) {
                Self::traverse_node(child, key, count, buffer);
            }
            if limit_reached(buffer.len()) {
                return;
            }
            buffer.push((&node.keys[j], &node.values[j]));
        }

        if let Some(child) = node.children.get(node.size()) {
            Self::traverse_node(child, key, count, buffer);
        }
    }

    // ========== Insert Operations ==========

    /// Insert a key-value pair into the tree
    ///
    /// Existing entries are never overwritten; a duplicate key adds another
    /// entry placed after the existing ones in key order.
    pub fn insert(&mut self, key: K, value: V) -> BTreeResult<()> {
        if self.root.is_full() {
            self.split_root()?;
        }

        Self::insert_with_space(&mut self.root, key, value)?;
        self.entry_count += 1;

        Ok(())
    }

    /// Split the full root, demoting both halves under a new root
    fn split_root(&mut self) -> BTreeResult<()> {
        let (key, value, right) = self.root.split()?;

        let mut root = Node::new(self.capacity());
        root.insert_entry(0, key, value)?;
        root.children.push(Box::new(right))?;

        let left = std::mem::replace(&mut self.root, root);
        self.root.children.insert(0, Box::new(left))?;

        debug!(height = self.height(), "split root");
        Ok(())
    }

    /// Insert into a node that is known to have room for one more entry
    fn insert_with_space(node: &mut Node<K, V>, key: K, value: V) -> BTreeResult<()> {
        let i = node.upper_bound(&key);

        if node.is_leaf() {
            return node.insert_entry(i, key, value);
        }

        let child_is_full = node
            .children
            .get(i)
            .map(|child| child.is_full())
            .ok_or_else(|| missing_child(i, node.size()))?;

        if child_is_full {
            Self::split_child(node, i)?;
            // The promoted median may route the key to the new sibling
            return Self::insert_with_space(node, key, value);
        }

        let size = node.size();
        let child = node
            .children
            .get_mut(i)
            .ok_or_else(|| missing_child(i, size))?;
        Self::insert_with_space(child, key, value)
    }

    /// Split the full child at `index` of a non-full parent.
    ///
    /// The median lands at `parent.keys[index]` and the new right half at
    /// `parent.children[index + 1]`, directly after the truncated child.
    fn split_child(parent: &mut Node<K, V>, index: usize) -> BTreeResult<()> {
        let size = parent.size();
        let left = parent
            .children
            .get_mut(index)
            .ok_or_else(|| missing_child(index, size))?;

        let (key, value, right) = left.split()?;

        parent.insert_entry(index, key, value)?;
        parent.children.insert(index + 1, Box::new(right))?;

        trace!(index, parent_size = parent.size(), "split child");
        Ok(())
    }

    // ========== Validation ==========

    /// Verify the structural invariants of the whole tree
    ///
    /// Checks key ordering within and across nodes, node capacity, child
    /// counts and that every leaf sits at the same depth.
    pub fn check_invariants(&self) -> BTreeResult<()> {
        let mut leaf_depth = None;
        let counted = Self::check_node(&self.root, None, None, 1, &mut leaf_depth)?;

        if counted != self.entry_count {
            return Err(BTreeError::InvalidState(format!(
                "entry count mismatch: tracked {}, found {}",
                self.entry_count, counted
            )));
        }

        Ok(())
    }

    fn check_node(
        node: &Node<K, V>,
        lower: Option<&K>,
        upper: Option<&K>,
        depth: usize,
        leaf_depth: &mut Option<usize>,
    ) -> BTreeResult<usize> {
        let capacity = node.capacity();
        if node.size() > capacity || node.values.len() != node.size() {
            return Err(BTreeError::InvalidState(format!(
                "node at depth {} holds {} keys and {} values (capacity {})",
                depth,
                node.size(),
                node.values.len(),
                capacity
            )));
        }

        if node.keys.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(BTreeError::InvalidState(format!(
                "keys out of order at depth {}",
                depth
            )));
        }

        let below_lower = |k: &K| lower.is_some_and(|bound| k < bound);
        let above_upper = |k: &K| upper.is_some_and(|bound| k > bound);
        if node.keys.iter().any(|k| below_lower(k) || above_upper(k)) {
            return Err(BTreeError::InvalidState(format!(
                "key outside parent separator range at depth {}",
                depth
            )));
        }

        if node.is_leaf() {
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(BTreeError::InvalidState(format!(
                        "leaf at depth {}, expected {}",
                        depth, expected
                    )));
                }
                Some(_) => {}
            }
            return Ok(node.size());
        }

        if node.children.len() != node.size() + 1 {
            return Err(BTreeError::InvalidState(format!(
                "internal node at depth {} has {} keys but {} children",
                depth,
                node.size(),
                node.children.len()
            )));
        }

        let mut total = node.size();
        for (i, child) in node.children.iter().enumerate() {
            let child_lower = if i == 0 { lower } else { Some(&node.keys[i - 1]) };
            let child_upper = node.keys.get(i).or(upper);
            total += Self::check_node(child, child_lower, child_upper, depth + 1, leaf_depth)?;
        }

        Ok(total)
    }
}

fn missing_child(index: usize, size: usize) -> BTreeError {
    BTreeError::InvalidState(format!(
        "internal node with {} keys has no child at index {}",
        size, index
    ))
}

impl<K: Debug, V: Debug> Node<K, V> {
    fn fmt_depth(&self, f: &mut Formatter<'_>, depth: usize) -> fmt::Result {
        let entries: Vec<_> = self.keys.iter().zip(self.values.iter()).collect();
        writeln!(f, "{}{:?}", "  ".repeat(depth), entries)?;

        for child in self.children.iter() {
            child.fmt_depth(f, depth + 1)?;
        }

        Ok(())
    }
}

impl<K: Debug, V: Debug> Display for BTree<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.root.fmt_depth(f, 0)
    }
}

// ========== Iterator ==========

/// In-order iterator over B-tree entries
pub struct BTreeIter<'a, K, V> {
    /// Nodes on the path to the next entry, with the next slot to yield
    stack: Vec<(&'a Node<K, V>, usize)>,
}

impl<'a, K, V> BTreeIter<'a, K, V> {
    fn new(tree: &'a BTree<K, V>) -> Self {
        let mut iter = Self { stack: Vec::new() };
        iter.descend_left(&tree.root);
        iter
    }

    /// Push `node` and its leftmost descendants
    fn descend_left(&mut self, mut node: &'a Node<K, V>) {
        loop {
            self.stack.push((node, 0));
            match node.children.first() {
                Some(child) => node = child,
                None => break,
            }
        }
    }
}

impl<'a, K, V> Iterator for BTreeIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, idx) = self.stack.pop()?;

            if idx < node.size() {
                self.stack.push((node, idx + 1));
                if let Some(child) = node.children.get(idx + 1) {
                    self.descend_left(child);
                }
                return Some((&node.keys[idx], &node.values[idx]));
            }
        }
    }
}

impl<'a, K, V> IntoIterator for &'a BTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = BTreeIter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
