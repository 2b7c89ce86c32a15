use std::ops::{Deref, DerefMut};

use serde::Serialize;

use super::{BTreeError, BTreeResult};

/// Bounded, ordered run of node slots.
///
/// Backs the keys, values and children of a [`Node`](super::Node). The
/// length never exceeds the capacity fixed at construction; inserting into
/// a full run fails with [`BTreeError::SlotsFull`] instead of growing.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Slots<T> {
    items: Vec<T>,
    #[serde(skip)]
    capacity: usize,
}

impl<T> Slots<T> {
    /// Create an empty run holding at most `capacity` items
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Check if no further item fits
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Insert `item` at `index`, shifting everything after it one slot right
    pub fn insert(&mut self, index: usize, item: T) -> BTreeResult<()> {
        if self.is_full() {
            return Err(BTreeError::SlotsFull {
                capacity: self.capacity,
            });
        }
        if index > self.items.len() {
            return Err(BTreeError::InvalidState(format!(
                "slot index {} out of bounds (len {})",
                index,
                self.items.len()
            )));
        }
        self.items.insert(index, item);
        Ok(())
    }

    /// Append `item` after the last populated slot
    pub fn push(&mut self, item: T) -> BTreeResult<()> {
        self.insert(self.items.len(), item)
    }

    /// Remove and return the last item
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Move the items at `at..` into a new run with the same capacity.
    ///
    /// `self` keeps `[0, at)`; the vacated slots are released.
    pub fn split_off(&mut self, at: usize) -> BTreeResult<Self> {
        if at > self.items.len() {
            return Err(BTreeError::InvalidState(format!(
                "split point {} out of bounds (len {})",
                at,
                self.items.len()
            )));
        }
        Ok(Self {
            items: self.items.split_off(at),
            capacity: self.capacity,
        })
    }
}

impl<T> Deref for Slots<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

// Slot contents may be rewritten in place; the length only changes
// through the bounded methods above.
impl<T> DerefMut for Slots<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.items
    }
}
