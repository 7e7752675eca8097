//! Wire codec for reconciliation messages.
//!
//! A message is a protocol version byte followed by zero or more ranges.
//! Each range is `bound || mode || payload`:
//!
//! - Varints are big-endian base-128, high bit set on every byte but the last.
//! - Timestamps are delta-encoded against the previous bound in the same
//!   message, offset by one. `0` encodes infinity.
//! - A bound is `timestamp || varint(prefix_len) || prefix`.
//!
//! **CRITICAL**: This format is shared with every other implementation of the
//! protocol. Changes break interoperability.

use crate::error::{Result, WireError};
use crate::types::{Bound, MAX_ID_SIZE, MAX_TIMESTAMP};

/// Protocol version 1.
pub const PROTOCOL_VERSION: u8 = 0x61;

/// Range modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum Mode {
    /// The range needs no further work.
    Skip = 0,
    /// The payload is the sender's fingerprint of the range.
    Fingerprint = 1,
    /// The payload is the full list of ids the sender holds in the range.
    IdList = 2,
}

impl TryFrom<u64> for Mode {
    type Error = WireError;

    fn try_from(value: u64) -> Result<Self> {
        match value {
            0 => Ok(Mode::Skip),
            1 => Ok(Mode::Fingerprint),
            2 => Ok(Mode::IdList),
            other => Err(WireError::UnexpectedMode(other)),
        }
    }
}

/// Append `n` as a varint.
pub fn encode_varint(n: u64, out: &mut Vec<u8>) {
    if n == 0 {
        out.push(0);
        return;
    }

    let mut groups = Vec::with_capacity(10);
    let mut rest = n;
    while rest != 0 {
        groups.push((rest & 0x7f) as u8);
        rest >>= 7;
    }

    let last = groups.len() - 1;
    for (i, group) in groups.iter().rev().enumerate() {
        if i == last {
            out.push(*group);
        } else {
            out.push(group | 0x80);
        }
    }
}

/// Cursor over an inbound message.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    /// Wrap a message.
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Whether every byte has been consumed.
    pub const fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes not yet consumed.
    pub const fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        let (first, rest) = self.buf.split_first().ok_or(WireError::Truncated)?;
        self.buf = rest;
        Ok(*first)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.buf.len() < n {
            return Err(WireError::Truncated);
        }
        let (head, rest) = self.buf.split_at(n);
        self.buf = rest;
        Ok(head)
    }

    pub fn read_varint(&mut self) -> Result<u64> {
        let mut res: u64 = 0;
        loop {
            let byte = self.read_byte()?;
            if res > (u64::MAX >> 7) {
                return Err(WireError::VarIntOverflow);
            }
            res = (res << 7) | u64::from(byte & 0x7f);
            if byte & 0x80 == 0 {
                return Ok(res);
            }
        }
    }

    pub fn read_mode(&mut self) -> Result<Mode> {
        Mode::try_from(self.read_varint()?)
    }
}

/// Outbound bound encoder. One per message: timestamps are deltas against
/// the previous bound written by the same encoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoundEncoder {
    last_timestamp: u64,
}

impl BoundEncoder {
    pub const fn new() -> Self {
        Self { last_timestamp: 0 }
    }

    fn encode_timestamp(&mut self, timestamp: u64, out: &mut Vec<u8>) {
        if timestamp == MAX_TIMESTAMP {
            self.last_timestamp = MAX_TIMESTAMP;
            encode_varint(0, out);
            return;
        }

        let delta = timestamp.wrapping_sub(self.last_timestamp);
        self.last_timestamp = timestamp;
        encode_varint(delta.wrapping_add(1), out);
    }

    /// Append `bound` to `out`.
    pub fn encode_bound(&mut self, bound: &Bound, out: &mut Vec<u8>) {
        self.encode_timestamp(bound.timestamp, out);
        encode_varint(bound.prefix().len() as u64, out);
        out.extend_from_slice(bound.prefix());
    }
}

/// Inbound bound decoder, the mirror of [`BoundEncoder`].
#[derive(Debug, Default, Clone)]
pub struct BoundDecoder {
    last_timestamp: u64,
}

impl BoundDecoder {
    pub const fn new() -> Self {
        Self { last_timestamp: 0 }
    }

    fn decode_timestamp(&mut self, reader: &mut Reader<'_>) -> Result<u64> {
        let raw = reader.read_varint()?;
        let timestamp = if raw == 0 {
            MAX_TIMESTAMP
        } else {
            // saturate
            (raw - 1).saturating_add(self.last_timestamp)
        };
        self.last_timestamp = timestamp;
        Ok(timestamp)
    }

    pub fn decode_bound(&mut self, reader: &mut Reader<'_>) -> Result<Bound> {
        let timestamp = self.decode_timestamp(reader)?;
        let len = reader.read_varint()?;
        if len > MAX_ID_SIZE as u64 {
            return Err(WireError::BoundTooLong { len });
        }
        let prefix = reader.read_bytes(len as usize)?;
        Bound::with_prefix(timestamp, prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varint(n: u64) -> Vec<u8> {
        let mut out = Vec::new();
        encode_varint(n, &mut out);
        out
    }

    #[test]
    fn test_varint_known_encodings() {
        assert_eq!(varint(0), vec![0x00]);
        assert_eq!(varint(1), vec![0x01]);
        assert_eq!(varint(127), vec![0x7f]);
        assert_eq!(varint(128), vec![0x81, 0x00]);
        assert_eq!(varint(300), vec![0x82, 0x2c]);
    }

    #[test]
    fn test_varint_max_roundtrip() {
        let bytes = varint(u64::MAX);
        assert_eq!(bytes.len(), 10);
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.read_varint().unwrap(), u64::MAX);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_varint_overflow_rejected() {
        let bytes = [0xffu8; 11];
        let mut reader = Reader::new(&bytes);
        assert!(matches!(reader.read_varint(), Err(WireError::VarIntOverflow)));
    }

    #[test]
    fn test_varint_truncated() {
        let mut reader = Reader::new(&[0x81]);
        assert!(matches!(reader.read_varint(), Err(WireError::Truncated)));
    }

    #[test]
    fn test_mode_decoding() {
        let mut reader = Reader::new(&[0x00, 0x01, 0x02, 0x03]);
        assert_eq!(reader.read_mode().unwrap(), Mode::Skip);
        assert_eq!(reader.read_mode().unwrap(), Mode::Fingerprint);
        assert_eq!(reader.read_mode().unwrap(), Mode::IdList);
        assert!(matches!(reader.read_mode(), Err(WireError::UnexpectedMode(3))));
    }

    #[test]
    fn test_bounds_are_delta_encoded() {
        let mut out = Vec::new();
        let mut enc = BoundEncoder::new();
        enc.encode_bound(&Bound::new(100), &mut out);
        enc.encode_bound(&Bound::with_prefix(150, &[0xab]).unwrap(), &mut out);
        enc.encode_bound(&Bound::infinity(), &mut out);

        // 100 -> 101; 150 - 100 -> 51; infinity -> 0
        assert_eq!(out, vec![101, 0, 51, 1, 0xab, 0, 0]);

        let mut reader = Reader::new(&out);
        let mut dec = BoundDecoder::new();
        assert_eq!(dec.decode_bound(&mut reader).unwrap(), Bound::new(100));
        let second = dec.decode_bound(&mut reader).unwrap();
        assert_eq!(second.timestamp, 150);
        assert_eq!(second.prefix(), &[0xab]);
        assert_eq!(dec.decode_bound(&mut reader).unwrap().timestamp, MAX_TIMESTAMP);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_bound_prefix_too_long() {
        let mut bytes = vec![1, 33];
        bytes.extend_from_slice(&[0u8; 33]);
        let mut reader = Reader::new(&bytes);
        assert!(matches!(
            BoundDecoder::new().decode_bound(&mut reader),
            Err(WireError::BoundTooLong { len: 33 })
        ));
    }
}
