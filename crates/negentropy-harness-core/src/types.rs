//! Strong type definitions for records and range bounds.
//!
//! Identifiers are stored in a zero-padded 32-byte buffer so that records
//! and bounds compare the same way regardless of the configured id width.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Result, WireError};

/// Widest identifier the protocol can carry.
pub const MAX_ID_SIZE: usize = 32;

/// Timestamp value reserved for the "infinity" bound.
pub const MAX_TIMESTAMP: u64 = u64::MAX;

/// A record identifier, typically a content hash.
///
/// Ordering compares the zero-padded bytes, so ids of equal width order
/// lexicographically.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id {
    bytes: [u8; MAX_ID_SIZE],
    len: u8,
}

impl Id {
    /// Create an id from raw bytes (1 to 32 bytes).
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        if slice.is_empty() || slice.len() > MAX_ID_SIZE {
            return Err(WireError::InvalidIdLength { len: slice.len() });
        }
        let mut bytes = [0u8; MAX_ID_SIZE];
        bytes[..slice.len()].copy_from_slice(slice);
        Ok(Self {
            bytes,
            len: slice.len() as u8,
        })
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// The id bytes, without padding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// The id bytes, zero-padded to [`MAX_ID_SIZE`].
    pub const fn padded(&self) -> &[u8; MAX_ID_SIZE] {
        &self.bytes
    }

    /// Width of this id in bytes.
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Always false: ids carry at least one byte.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.to_hex())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Id {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl TryFrom<&[u8]> for Id {
    type Error = WireError;

    fn try_from(slice: &[u8]) -> Result<Self> {
        Self::from_slice(slice)
    }
}

/// A record: creation timestamp plus identifier.
///
/// Records order by timestamp first, then by id bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    pub timestamp: u64,
    pub id: Id,
}

impl Item {
    /// Create a new record.
    pub const fn new(timestamp: u64, id: Id) -> Self {
        Self { timestamp, id }
    }
}

/// A range boundary: a timestamp and an id prefix of up to 32 bytes.
///
/// A bound `b` splits the ordered record set into records `< b` and `>= b`.
#[derive(Clone, Copy)]
pub struct Bound {
    pub timestamp: u64,
    prefix: [u8; MAX_ID_SIZE],
    prefix_len: u8,
}

impl Bound {
    /// Bound with an empty id prefix.
    pub const fn new(timestamp: u64) -> Self {
        Self {
            timestamp,
            prefix: [0u8; MAX_ID_SIZE],
            prefix_len: 0,
        }
    }

    /// Bound with an explicit id prefix.
    pub fn with_prefix(timestamp: u64, prefix: &[u8]) -> Result<Self> {
        if prefix.len() > MAX_ID_SIZE {
            return Err(WireError::BoundTooLong {
                len: prefix.len() as u64,
            });
        }
        let mut buf = [0u8; MAX_ID_SIZE];
        buf[..prefix.len()].copy_from_slice(prefix);
        Ok(Self {
            timestamp,
            prefix: buf,
            prefix_len: prefix.len() as u8,
        })
    }

    /// The bound that sits exactly at `item`.
    pub fn from_item(item: &Item) -> Self {
        Self {
            timestamp: item.timestamp,
            prefix: *item.id.padded(),
            prefix_len: item.id.len() as u8,
        }
    }

    /// The lowest possible bound.
    pub const fn zero() -> Self {
        Self::new(0)
    }

    /// The bound above every record.
    pub const fn infinity() -> Self {
        Self::new(MAX_TIMESTAMP)
    }

    /// The id prefix carried on the wire.
    pub fn prefix(&self) -> &[u8] {
        &self.prefix[..self.prefix_len as usize]
    }

    /// Compare this bound against a record.
    pub fn cmp_item(&self, item: &Item) -> Ordering {
        self.timestamp
            .cmp(&item.timestamp)
            .then_with(|| self.prefix.cmp(item.id.padded()))
    }

    /// The shortest bound that separates `prev` from `curr` (`prev < curr`).
    ///
    /// The result is greater than `prev` and less than or equal to `curr`.
    pub fn minimal(prev: &Item, curr: &Item) -> Self {
        if curr.timestamp != prev.timestamp {
            return Self::new(curr.timestamp);
        }

        let shared = curr
            .id
            .padded()
            .iter()
            .zip(prev.id.padded())
            .take_while(|(a, b)| a == b)
            .count();
        let len = (shared + 1).min(MAX_ID_SIZE);

        let mut prefix = [0u8; MAX_ID_SIZE];
        prefix[..len].copy_from_slice(&curr.id.padded()[..len]);
        Self {
            timestamp: curr.timestamp,
            prefix,
            prefix_len: len as u8,
        }
    }
}

impl PartialEq for Bound {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Bound {}

impl PartialOrd for Bound {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Bound {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.prefix.cmp(&other.prefix))
    }
}

impl fmt::Debug for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.timestamp == MAX_TIMESTAMP {
            write!(f, "Bound(inf)")
        } else {
            write!(f, "Bound({}, {})", self.timestamp, hex::encode(self.prefix()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(ts: u64, id: &str) -> Item {
        Item::new(ts, Id::from_hex(id).unwrap())
    }

    #[test]
    fn test_id_hex_roundtrip() {
        let id = Id::from_slice(&[0x42; 32]).unwrap();
        let recovered = Id::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, recovered);
        assert_eq!(recovered.len(), 32);
    }

    #[test]
    fn test_id_keeps_short_width() {
        let id = Id::from_hex("aa").unwrap();
        assert_eq!(id.as_bytes(), &[0xaa]);
        assert_eq!(id.to_hex(), "aa");
        assert_eq!(id.padded()[1..], [0u8; 31]);
    }

    #[test]
    fn test_id_rejects_bad_lengths() {
        assert!(matches!(
            Id::from_slice(&[]),
            Err(WireError::InvalidIdLength { len: 0 })
        ));
        assert!(matches!(
            Id::from_slice(&[0u8; 33]),
            Err(WireError::InvalidIdLength { len: 33 })
        ));
        assert!(matches!(Id::from_hex("zz"), Err(WireError::InvalidHex(_))));
    }

    #[test]
    fn test_item_orders_by_timestamp_then_id() {
        let a = item(100, "bb");
        let b = item(200, "aa");
        let c = item(200, "ab");
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_bound_against_item() {
        let it = item(100, "aabb");
        assert_eq!(Bound::from_item(&it).cmp_item(&it), Ordering::Equal);
        assert_eq!(Bound::new(100).cmp_item(&it), Ordering::Less);
        assert_eq!(Bound::infinity().cmp_item(&it), Ordering::Greater);

        let prefix = Bound::with_prefix(100, &[0xaa]).unwrap();
        assert_eq!(prefix.cmp_item(&it), Ordering::Less);
        let above = Bound::with_prefix(100, &[0xab]).unwrap();
        assert_eq!(above.cmp_item(&it), Ordering::Greater);
    }

    #[test]
    fn test_minimal_bound_different_timestamps() {
        let b = Bound::minimal(&item(100, "ffff"), &item(101, "0000"));
        assert_eq!(b.timestamp, 101);
        assert!(b.prefix().is_empty());
    }

    #[test]
    fn test_minimal_bound_shared_prefix() {
        let prev = item(100, "aabbcc");
        let curr = item(100, "aabbdd");
        let b = Bound::minimal(&prev, &curr);
        assert_eq!(b.prefix(), &[0xaa, 0xbb, 0xdd]);
        assert_eq!(b.cmp_item(&prev), Ordering::Greater);
        assert_ne!(b.cmp_item(&curr), Ordering::Greater);
    }

    #[test]
    fn test_bound_debug() {
        assert_eq!(format!("{:?}", Bound::infinity()), "Bound(inf)");
        let b = Bound::with_prefix(7, &[0x01]).unwrap();
        assert_eq!(format!("{:?}", b), "Bound(7, 01)");
    }
}
