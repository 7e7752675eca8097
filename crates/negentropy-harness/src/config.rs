//! Harness configuration.
//!
//! The binary fills both values from flags or the environment:
//!
//! - `FRAMESIZELIMIT`: maximum outbound message size in bytes. Absent or `0`
//!   means unlimited. A non-numeric value is an error.
//! - `IDSIZE`: fixed id width in bytes (1 to 32). Absent means the width of
//!   the first inserted id, or of the peer's ids when the store stays empty.

use negentropy_harness_core::MAX_ID_SIZE;
use negentropy_harness_store::VectorStore;
use negentropy_harness_sync::{FrameSizeGuard, Negentropy};

use crate::error::{HarnessError, Result};

/// Environment variable holding the frame size limit.
pub const FRAME_SIZE_LIMIT_ENV: &str = "FRAMESIZELIMIT";

/// Environment variable holding the id width.
pub const ID_SIZE_ENV: &str = "IDSIZE";

/// Configuration for one harness run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Maximum outbound message size in bytes; 0 disables the limit.
    pub frame_size_limit: u64,
    /// Fixed id width; `None` infers it from the first record.
    pub id_size: Option<usize>,
}

impl HarnessConfig {
    pub fn with_frame_size_limit(mut self, limit: u64) -> Self {
        self.frame_size_limit = limit;
        self
    }

    pub fn with_id_size(mut self, id_size: usize) -> Self {
        self.id_size = Some(id_size);
        self
    }

    /// Check the id width is one the protocol can carry.
    pub fn validate(&self) -> Result<()> {
        match self.id_size {
            Some(n) if n == 0 || n > MAX_ID_SIZE => Err(HarnessError::Config(format!(
                "id size must be between 1 and {MAX_ID_SIZE}, got {n}"
            ))),
            _ => Ok(()),
        }
    }

    /// An empty store honoring the configured id width.
    pub fn new_store(&self) -> Result<VectorStore> {
        match self.id_size {
            Some(n) => Ok(VectorStore::with_id_size(n)?),
            None => Ok(VectorStore::new()),
        }
    }

    /// Bind an engine to a sealed store.
    pub fn engine(&self, store: VectorStore) -> Result<Negentropy<VectorStore>> {
        Ok(Negentropy::new(store, self.frame_size_limit)?)
    }

    pub fn guard(&self) -> FrameSizeGuard {
        FrameSizeGuard::new(self.frame_size_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use negentropy_harness_store::Storage;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.frame_size_limit, 0);
        assert_eq!(config.id_size, None);
        assert_eq!(config.guard().limit(), 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = HarnessConfig::default()
            .with_frame_size_limit(8192)
            .with_id_size(16);
        assert_eq!(config.frame_size_limit, 8192);
        assert_eq!(config.id_size, Some(16));
        assert_eq!(config.guard().limit(), 8192);
        assert_eq!(config.new_store().unwrap().id_size(), Some(16));
    }

    #[test]
    fn test_id_size_out_of_range() {
        assert!(matches!(
            HarnessConfig::default().with_id_size(0).validate(),
            Err(HarnessError::Config(_))
        ));
        assert!(HarnessConfig::default().with_id_size(33).validate().is_err());
        assert!(HarnessConfig::default().with_id_size(32).validate().is_ok());
    }

    #[test]
    fn test_small_limit_rejected_by_engine() {
        let config = HarnessConfig::default().with_frame_size_limit(100);
        let mut store = config.new_store().unwrap();
        store.seal().unwrap();
        assert!(matches!(config.engine(store), Err(HarnessError::Sync(_))));
    }
}
