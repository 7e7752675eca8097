//! Error types for the sync module.

use thiserror::Error;

use crate::guard::Step;
use crate::session::SessionState;

/// Errors that can occur while reconciling.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Malformed peer message.
    #[error("malformed message: {0}")]
    Wire(#[from] negentropy_harness_core::WireError),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] negentropy_harness_store::StoreError),

    /// First byte of a message is not a protocol version.
    #[error("invalid negentropy protocol version byte: {0:#04x}")]
    InvalidVersion(u8),

    /// No id width makes the peer's id list parse.
    #[error("cannot determine id width from peer id list")]
    IdSizeUnknown,

    /// Peer speaks a protocol version this engine does not.
    #[error("unsupported negentropy protocol version requested: {0}")]
    UnsupportedVersion(u8),

    /// Engine configured with a frame limit it cannot honor.
    #[error("frame size limit {limit} too small (minimum {minimum})")]
    FrameSizeTooSmall { limit: u64, minimum: u64 },

    /// `initiate` called twice on the same engine.
    #[error("already initiated")]
    AlreadyInitiated,

    /// Initiator-only call on a responder engine, or the reverse.
    #[error("{0}")]
    WrongRole(&'static str),

    /// Outbound message larger than the configured limit.
    #[error("{step} frameSizeLimit exceeded: {len} bytes > {limit}")]
    FrameSizeExceeded { step: Step, len: usize, limit: u64 },

    /// Command not legal in the current session state.
    #[error("{command} not allowed in session state {state:?}")]
    InvalidTransition {
        command: &'static str,
        state: SessionState,
    },

    /// A result drain stopped before the engine finished.
    #[error("result collector failed: {0}")]
    Collector(String),

    /// An id was reported more than once.
    #[error("id reported twice: {0}")]
    DuplicateId(String),
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
