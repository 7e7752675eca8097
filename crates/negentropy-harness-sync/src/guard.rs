//! Frame-size guard for outbound messages.

use std::fmt;

use crate::error::{Result, SyncError};

/// The exchange step that produced an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Initiate,
    Msg,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Initiate => write!(f, "initiate"),
            Step::Msg => write!(f, "msg"),
        }
    }
}

/// Rejects outbound messages longer than a configured byte limit.
///
/// Lengths are measured on the binary message, i.e. half the length of its
/// hex rendering. A limit of zero means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSizeGuard {
    limit: u64,
}

impl FrameSizeGuard {
    pub const fn new(limit: u64) -> Self {
        Self { limit }
    }

    pub const fn unlimited() -> Self {
        Self { limit: 0 }
    }

    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Fail if `message` exceeds the limit.
    pub fn check(&self, step: Step, message: &[u8]) -> Result<()> {
        if self.limit != 0 && message.len() as u64 > self.limit {
            return Err(SyncError::FrameSizeExceeded {
                step,
                len: message.len(),
                limit: self.limit,
            });
        }
        Ok(())
    }
}
