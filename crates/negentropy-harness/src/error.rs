//! Error types for the harness.

use negentropy_harness_core::WireError;
use negentropy_harness_store::StoreError;
use negentropy_harness_sync::SyncError;
use thiserror::Error;

/// Errors that abort a harness run. None are recoverable.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// First field of an input line is not a known command.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Command line carries the wrong number of fields.
    #[error("{command}: expected {expected} fields, got {got}")]
    WrongFieldCount {
        command: &'static str,
        expected: &'static str,
        got: usize,
    },

    /// `created` field is not a decimal u64.
    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    /// `id` field is not a valid hex id.
    #[error("invalid id {value:?}: {source}")]
    InvalidId {
        value: String,
        #[source]
        source: WireError,
    },

    /// `msg` payload is not valid hex.
    #[error("invalid message payload: {0}")]
    InvalidPayload(#[source] hex::FromHexError),

    /// Loopback record carries a side other than 1, 2 or 3.
    #[error("unexpected mode: {0:?}")]
    InvalidMode(String),

    /// Command not legal before or after `seal`.
    #[error("{command} not allowed {phase}")]
    InvalidPhase {
        command: &'static str,
        phase: &'static str,
    },

    /// Bad configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Reconciliation error.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
