//! Vector-backed implementation of the Storage trait.
//!
//! Records are appended unsorted while the store is open. Sealing sorts them,
//! rejects duplicates, and unlocks the query methods.

use std::cmp::Ordering;

use negentropy_harness_core::{
    Accumulator, Bound, Fingerprint, Id, Item, MAX_ID_SIZE, MAX_TIMESTAMP,
};

use crate::error::{Result, StoreError};
use crate::traits::Storage;

/// In-memory record store.
#[derive(Debug, Default)]
pub struct VectorStore {
    items: Vec<Item>,
    sealed: bool,
    id_size: Option<usize>,
}

impl VectorStore {
    /// Create an empty store. The id width is taken from the first record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that only accepts ids of `id_size` bytes.
    pub fn with_id_size(id_size: usize) -> Result<Self> {
        if id_size == 0 || id_size > MAX_ID_SIZE {
            return Err(StoreError::InvalidIdSize(id_size));
        }
        Ok(Self {
            items: Vec::new(),
            sealed: false,
            id_size: Some(id_size),
        })
    }

    /// Add a record. Fails once the store is sealed.
    pub fn insert(&mut self, timestamp: u64, id: Id) -> Result<()> {
        if self.sealed {
            return Err(StoreError::AlreadySealed);
        }
        // reserved for the infinity bound; such a record would sort past every range
        if timestamp == MAX_TIMESTAMP {
            return Err(StoreError::ReservedTimestamp(timestamp));
        }

        match self.id_size {
            Some(expected) if expected != id.len() => {
                return Err(StoreError::IdSizeMismatch {
                    expected,
                    got: id.len(),
                });
            }
            Some(_) => {}
            None => self.id_size = Some(id.len()),
        }

        self.items.push(Item::new(timestamp, id));
        Ok(())
    }

    /// Sort the records and freeze the store.
    pub fn seal(&mut self) -> Result<()> {
        if self.sealed {
            return Err(StoreError::AlreadySealed);
        }
        self.sealed = true;

        self.items.sort_unstable();

        if let Some(pair) = self.items.windows(2).find(|w| w[0] == w[1]) {
            return Err(StoreError::DuplicateItem {
                timestamp: pair[0].timestamp,
                id: pair[0].id.to_hex(),
            });
        }

        tracing::debug!(records = self.items.len(), id_size = ?self.id_size, "store sealed");
        Ok(())
    }

    /// Whether `seal` has been called.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Number of records inserted so far.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn check_sealed(&self) -> Result<()> {
        if !self.sealed {
            return Err(StoreError::NotSealed);
        }
        Ok(())
    }

    fn check_range(&self, begin: usize, end: usize) -> Result<()> {
        if begin > end || end > self.items.len() {
            return Err(StoreError::BadRange {
                begin,
                end,
                size: self.items.len(),
            });
        }
        Ok(())
    }
}

impl Storage for VectorStore {
    fn size(&self) -> Result<usize> {
        self.check_sealed()?;
        Ok(self.items.len())
    }

    fn id_size(&self) -> Option<usize> {
        self.id_size
    }

    fn get_item(&self, index: usize) -> Result<Item> {
        self.check_sealed()?;
        self.items.get(index).copied().ok_or(StoreError::BadRange {
            begin: index,
            end: index + 1,
            size: self.items.len(),
        })
    }

    fn iterate(
        &self,
        begin: usize,
        end: usize,
        visit: &mut dyn FnMut(&Item, usize) -> bool,
    ) -> Result<()> {
        self.check_sealed()?;
        self.check_range(begin, end)?;

        for (offset, item) in self.items[begin..end].iter().enumerate() {
            if !visit(item, begin + offset) {
                break;
            }
        }
        Ok(())
    }

    fn find_lower_bound(&self, begin: usize, end: usize, bound: &Bound) -> Result<usize> {
        self.check_sealed()?;
        self.check_range(begin, end)?;

        let offset = self.items[begin..end]
            .partition_point(|item| bound.cmp_item(item) == Ordering::Greater);
        Ok(begin + offset)
    }

    fn fingerprint(&self, begin: usize, end: usize) -> Result<Fingerprint> {
        self.check_sealed()?;
        self.check_range(begin, end)?;

        let mut acc = Accumulator::new();
        for item in &self.items[begin..end] {
            acc.add(&item.id);
        }
        Ok(acc.fingerprint((end - begin) as u64))
    }
}
