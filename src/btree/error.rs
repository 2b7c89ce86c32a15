use thiserror::Error;

/// Errors that can occur during B-tree operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BTreeError {
    #[error("Invalid capacity: {0} (must be >= 1)")]
    InvalidCapacity(usize),

    #[error("Node slots are full (capacity {capacity})")]
    SlotsFull { capacity: usize },

    #[error("Invalid tree state: {0}")]
    InvalidState(String),
}

pub type BTreeResult<T> = Result<T, BTreeError>;
