//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Insert or seal attempted on a sealed store.
    #[error("already sealed")]
    AlreadySealed,

    /// Query attempted before sealing.
    #[error("not sealed")]
    NotSealed,

    /// The same record was inserted twice.
    #[error("duplicate item inserted: {timestamp},{id}")]
    DuplicateItem { timestamp: u64, id: String },

    /// Timestamp reserved for the infinity bound.
    #[error("timestamp {0} is reserved")]
    ReservedTimestamp(u64),

    /// An id's width differs from the store's.
    #[error("unexpected id size: expected {expected} bytes, got {got}")]
    IdSizeMismatch { expected: usize, got: usize },

    /// Configured id width out of range.
    #[error("invalid id size {0} (expected 1..=32)")]
    InvalidIdSize(usize),

    /// Range query outside the stored records.
    #[error("bad range {begin}..{end} (size {size})")]
    BadRange { begin: usize, end: usize, size: usize },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
