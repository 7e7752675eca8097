//! # Negentropy Harness Core
//!
//! Pure primitives for range-based set reconciliation: records, bounds,
//! the varint/bound wire codec, and range fingerprints.
//!
//! This crate contains no I/O, no storage, no async. It is pure computation
//! over byte strings.
//!
//! ## Key Types
//!
//! - [`Id`] - Fixed-width record identifier (up to 32 bytes)
//! - [`Item`] - A `(timestamp, id)` record, ordered by timestamp then id
//! - [`Bound`] - A range boundary: timestamp plus an id prefix
//! - [`Fingerprint`] - 16-byte digest of a range of records
//!
//! ## Wire Format
//!
//! Messages are a protocol version byte followed by a sequence of
//! `(bound, mode, payload)` ranges. See the [`wire`] module.

pub mod error;
pub mod fingerprint;
pub mod types;
pub mod wire;

pub use error::{Result, WireError};
pub use fingerprint::{Accumulator, Fingerprint, FINGERPRINT_SIZE};
pub use types::{Bound, Id, Item, MAX_ID_SIZE, MAX_TIMESTAMP};
pub use wire::{
    encode_varint, BoundDecoder, BoundEncoder, Mode, Reader, PROTOCOL_VERSION,
};
