//! Storage trait: the read-only interface the reconciliation engine uses.
//!
//! Indices refer to positions in the sealed, sorted record set. Ranges are
//! half-open (`begin..end`).

use negentropy_harness_core::{Bound, Fingerprint, Item};

use crate::error::Result;

/// Read access to a sealed, ordered set of records.
///
/// Implementations can be vector-backed, tree-backed, or views over another
/// store.
pub trait Storage: Send {
    /// Number of records.
    fn size(&self) -> Result<usize>;

    /// Width in bytes of every id held by this store, or `None` while the
    /// store is empty and no width was configured.
    fn id_size(&self) -> Option<usize>;

    /// The record at `index`.
    fn get_item(&self, index: usize) -> Result<Item>;

    /// Visit records in `begin..end` in order.
    ///
    /// The callback receives each record and its index, and returns `false`
    /// to stop early.
    fn iterate(
        &self,
        begin: usize,
        end: usize,
        visit: &mut dyn FnMut(&Item, usize) -> bool,
    ) -> Result<()>;

    /// Index of the first record in `begin..end` that is `>= bound`, or `end`.
    fn find_lower_bound(&self, begin: usize, end: usize, bound: &Bound) -> Result<usize>;

    /// Fingerprint of the records in `begin..end`.
    fn fingerprint(&self, begin: usize, end: usize) -> Result<Fingerprint>;
}
