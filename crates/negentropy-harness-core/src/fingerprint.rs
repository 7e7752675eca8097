//! Range fingerprints.
//!
//! A fingerprint summarizes a range of records so two parties can tell
//! whether their ranges match without sending the ids:
//!
//! ```text
//! sum         = (id_0 + id_1 + ... + id_n) mod 2^256   (little-endian, zero-padded)
//! fingerprint = SHA-256(sum || varint(n))[..16]
//! ```
//!
//! Addition is order-independent, so insertion order never matters.

use sha2::{Digest, Sha256};
use std::fmt;

use crate::types::{Id, MAX_ID_SIZE};
use crate::wire::encode_varint;

/// Size of a fingerprint on the wire.
pub const FINGERPRINT_SIZE: usize = 16;

/// A 16-byte range fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub [u8; FINGERPRINT_SIZE]);

impl Fingerprint {
    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; FINGERPRINT_SIZE] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl AsRef<[u8]> for Fingerprint {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Running 256-bit sum of ids.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Accumulator {
    buf: [u8; MAX_ID_SIZE],
}

impl Accumulator {
    /// A zeroed accumulator.
    pub const fn new() -> Self {
        Self {
            buf: [0u8; MAX_ID_SIZE],
        }
    }

    /// Add one id.
    pub fn add(&mut self, id: &Id) {
        self.add_bytes(id.padded());
    }

    fn add_bytes(&mut self, other: &[u8; MAX_ID_SIZE]) {
        let mut carry = false;
        for limb in 0..MAX_ID_SIZE / 8 {
            let range = limb * 8..limb * 8 + 8;
            let ours = read_limb(&self.buf[range.clone()]);
            let theirs = read_limb(&other[range.clone()]);

            let (partial, c1) = ours.overflowing_add(theirs);
            let (next, c2) = partial.overflowing_add(u64::from(carry));
            carry = c1 || c2;

            self.buf[range].copy_from_slice(&next.to_le_bytes());
        }
    }

    /// The raw sum.
    pub const fn sum(&self) -> &[u8; MAX_ID_SIZE] {
        &self.buf
    }

    /// Finalize into a fingerprint over `count` records.
    pub fn fingerprint(&self, count: u64) -> Fingerprint {
        let mut input = Vec::with_capacity(MAX_ID_SIZE + 10);
        input.extend_from_slice(&self.buf);
        encode_varint(count, &mut input);

        let digest = Sha256::digest(&input);
        let mut out = [0u8; FINGERPRINT_SIZE];
        out.copy_from_slice(&digest[..FINGERPRINT_SIZE]);
        Fingerprint(out)
    }
}

fn read_limb(bytes: &[u8]) -> u64 {
    let mut limb = [0u8; 8];
    limb.copy_from_slice(bytes);
    u64::from_le_bytes(limb)
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Accumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Accumulator({})", hex::encode(self.buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(bytes: &[u8]) -> Id {
        Id::from_slice(bytes).unwrap()
    }

    #[test]
    fn test_add_carries_across_limbs() {
        let mut acc = Accumulator::new();
        let mut ones = [0u8; 32];
        ones[..8].copy_from_slice(&[0xff; 8]);
        acc.add(&id(&ones));
        acc.add(&id(&[0x01]));

        let mut expected = [0u8; 32];
        expected[8] = 1;
        assert_eq!(acc.sum(), &expected);
    }

    #[test]
    fn test_sum_wraps_at_256_bits() {
        let mut acc = Accumulator::new();
        acc.add(&id(&[0xff; 32]));
        acc.add(&id(&[0x01]));
        assert_eq!(acc.sum(), &[0u8; 32]);
    }

    #[test]
    fn test_empty_fingerprint_matches_sha256_of_zero_sum() {
        let mut input = vec![0u8; 32];
        input.push(0);
        let digest = Sha256::digest(&input);
        assert_eq!(Accumulator::new().fingerprint(0).0, digest[..16]);
    }

    #[test]
    fn test_count_changes_fingerprint() {
        let acc = Accumulator::new();
        assert_ne!(acc.fingerprint(1), acc.fingerprint(2));
    }

    proptest! {
        #[test]
        fn fingerprint_is_order_independent(ids in prop::collection::vec(any::<[u8; 32]>(), 0..20)) {
            let mut forward = Accumulator::new();
            for bytes in &ids {
                forward.add(&id(bytes));
            }

            let mut backward = Accumulator::new();
            for bytes in ids.iter().rev() {
                backward.add(&id(bytes));
            }

            let n = ids.len() as u64;
            prop_assert_eq!(forward.fingerprint(n), backward.fingerprint(n));
        }
    }
}
