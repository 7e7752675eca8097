//! Error types for the wire codec and record primitives.

use thiserror::Error;

/// Errors raised while decoding messages or building records.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("parse ends prematurely")]
    Truncated,

    #[error("varint overflows 64 bits")]
    VarIntOverflow,

    #[error("bound key too long: {len} bytes")]
    BoundTooLong { len: u64 },

    #[error("invalid id length: {len} bytes (expected 1..=32)")]
    InvalidIdLength { len: usize },

    #[error("unexpected mode: {0}")]
    UnexpectedMode(u64),

    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, WireError>;
