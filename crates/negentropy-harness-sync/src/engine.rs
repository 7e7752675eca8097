//! Negentropy protocol version 1.
//!
//! Both parties walk the ordered record set range by range. For each range
//! in an inbound message:
//!
//! - `Skip`: nothing to do.
//! - `Fingerprint`: compare with ours; on mismatch split the range into 16
//!   fingerprinted buckets, or send the full id list if it is small.
//! - `IdList`: the initiator diffs the list against its own ids and records
//!   have/need; the responder answers with its own id list.
//!
//! Consecutive matched ranges are coalesced into a single `Skip`. A message
//! holding nothing but the version byte means the initiator is done.

use std::collections::HashSet;

use negentropy_harness_core::{
    encode_varint, Bound, BoundDecoder, BoundEncoder, Id, Mode, Reader, WireError,
    FINGERPRINT_SIZE, MAX_ID_SIZE, PROTOCOL_VERSION,
};
use negentropy_harness_store::Storage;

use crate::error::{Result, SyncError};
use crate::reconciler::{IdSink, Reconciler};

/// Smallest nonzero frame size limit the engine can honor.
pub const MIN_FRAME_SIZE: u64 = 4096;

/// Buckets per split range.
const BUCKETS: usize = 16;

/// Bytes kept free under the frame limit for the closing fingerprint.
const FRAME_HEADROOM: u64 = 200;

/// Discards ids. Used on the responder path, which never reports sets.
struct DiscardSink;

impl IdSink for DiscardSink {
    fn have(&mut self, _id: Id) -> Result<()> {
        Ok(())
    }

    fn need(&mut self, _id: Id) -> Result<()> {
        Ok(())
    }
}

/// Reconciliation engine over a sealed store.
pub struct Negentropy<S: Storage> {
    storage: S,
    frame_size_limit: u64,
    is_initiator: bool,
    /// Id width for this exchange. Taken from the store, or from the first
    /// non-empty id list the peer sends when the store has none.
    id_size: Option<usize>,
}

impl<S: Storage> Negentropy<S> {
    /// Bind an engine to a sealed store.
    ///
    /// `frame_size_limit` of zero means unlimited; otherwise it must be at
    /// least [`MIN_FRAME_SIZE`].
    pub fn new(storage: S, frame_size_limit: u64) -> Result<Self> {
        if frame_size_limit != 0 && frame_size_limit < MIN_FRAME_SIZE {
            return Err(SyncError::FrameSizeTooSmall {
                limit: frame_size_limit,
                minimum: MIN_FRAME_SIZE,
            });
        }
        storage.size()?;
        let id_size = storage.id_size();

        Ok(Self {
            storage,
            frame_size_limit,
            is_initiator: false,
            id_size,
        })
    }

    fn over_limit(&self, len: usize) -> bool {
        self.frame_size_limit != 0 && len as u64 > self.frame_size_limit - FRAME_HEADROOM
    }

    fn reconcile_aux(&mut self, query: &[u8], sink: &mut dyn IdSink) -> Result<Vec<u8>> {
        let mut full = vec![PROTOCOL_VERSION];
        let mut reader = Reader::new(query);

        let version = reader.read_byte()?;
        if !(0x60..=0x6f).contains(&version) {
            return Err(SyncError::InvalidVersion(version));
        }
        if version != PROTOCOL_VERSION {
            if self.is_initiator {
                return Err(SyncError::UnsupportedVersion(version - 0x60));
            }
            return Ok(full);
        }

        let size = self.storage.size()?;
        let is_initiator = self.is_initiator;

        let mut decoder = BoundDecoder::new();
        let mut encoder = BoundEncoder::new();

        let mut prev_bound = Bound::zero();
        let mut prev_index = 0;
        // Index covered by the last range actually written to `full`.
        let mut flushed_index = 0;
        let mut skip = false;

        while !reader.is_empty() {
            let mut o = Vec::new();
            let checkpoint = encoder;

            let curr_bound = decoder.decode_bound(&mut reader)?;
            let mode = reader.read_mode()?;

            let lower = prev_index;
            let mut upper = self.storage.find_lower_bound(prev_index, size, &curr_bound)?;

            match mode {
                Mode::Skip => skip = true,

                Mode::Fingerprint => {
                    let theirs = reader.read_bytes(FINGERPRINT_SIZE)?;
                    let ours = self.storage.fingerprint(lower, upper)?;

                    if theirs != ours.as_bytes() {
                        flush_skip(&mut skip, &prev_bound, &mut encoder, &mut o);
                        self.split_range(lower, upper, &curr_bound, &mut encoder, &mut o)?;
                    } else {
                        skip = true;
                    }
                }

                Mode::IdList => {
                    let count = reader.read_varint()?;
                    let id_size = match self.id_size {
                        Some(width) => width,
                        None if count == 0 => 0,
                        None => {
                            let width = infer_id_size(&reader, &decoder, count)?;
                            tracing::debug!(id_size = width, "id width taken from peer");
                            self.id_size = Some(width);
                            width
                        }
                    };

                    let mut their_ids = Vec::new();
                    for _ in 0..count {
                        their_ids.push(Id::from_slice(reader.read_bytes(id_size)?)?);
                    }
                    let mut unmatched: HashSet<Id> = their_ids.iter().copied().collect();

                    let mut haves = Vec::new();
                    self.storage.iterate(lower, upper, &mut |item, _| {
                        if !unmatched.remove(&item.id) {
                            haves.push(item.id);
                        }
                        true
                    })?;

                    if is_initiator {
                        skip = true;

                        for id in haves {
                            sink.have(id)?;
                        }
                        for id in their_ids {
                            if unmatched.remove(&id) {
                                sink.need(id)?;
                            }
                        }
                    } else {
                        flush_skip(&mut skip, &prev_bound, &mut encoder, &mut o);

                        let limit = self.frame_size_limit;
                        let base = full.len() + o.len();
                        let range_end = upper;
                        let mut response = Vec::new();
                        let mut response_count = 0u64;
                        let mut end_bound = curr_bound;

                        self.storage.iterate(lower, range_end, &mut |item, index| {
                            if limit != 0
                                && (base + response.len()) as u64 > limit - FRAME_HEADROOM
                            {
                                end_bound = Bound::from_item(item);
                                // remaining range keeps a correct fingerprint
                                upper = index;
                                return false;
                            }
                            response.extend_from_slice(item.id.as_bytes());
                            response_count += 1;
                            true
                        })?;

                        encoder.encode_bound(&end_bound, &mut o);
                        encode_varint(Mode::IdList as u64, &mut o);
                        encode_varint(response_count, &mut o);
                        o.extend_from_slice(&response);

                        full.append(&mut o);
                        flushed_index = upper;
                    }
                }
            }

            if self.over_limit(full.len() + o.len()) {
                if !o.is_empty() {
                    encoder = checkpoint;
                }
                // Every range below `lower` is settled: the initiator already
                // recorded its ids or the fingerprints matched. Skip up to
                // there and fingerprint only what follows, so no id is
                // reported twice. Peers see ordinary Skip and Fingerprint
                // ranges.
                if lower > flushed_index {
                    encoder.encode_bound(&prev_bound, &mut full);
                    encode_varint(Mode::Skip as u64, &mut full);
                    flushed_index = lower;
                }

                let remaining = self.storage.fingerprint(flushed_index, size)?;
                encoder.encode_bound(&Bound::infinity(), &mut full);
                encode_varint(Mode::Fingerprint as u64, &mut full);
                full.extend_from_slice(remaining.as_bytes());
                tracing::debug!(
                    limit = self.frame_size_limit,
                    remaining = size - flushed_index,
                    "frame size limit reached, deferring remaining range"
                );
                break;
            }

            if !o.is_empty() {
                full.append(&mut o);
                flushed_index = upper;
            }

            prev_index = upper;
            prev_bound = curr_bound;
        }

        Ok(full)
    }

    fn split_range(
        &self,
        lower: usize,
        upper: usize,
        upper_bound: &Bound,
        encoder: &mut BoundEncoder,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        let num_elems = upper - lower;

        if num_elems < BUCKETS * 2 {
            encoder.encode_bound(upper_bound, out);
            encode_varint(Mode::IdList as u64, out);
            encode_varint(num_elems as u64, out);
            self.storage.iterate(lower, upper, &mut |item, _| {
                out.extend_from_slice(item.id.as_bytes());
                true
            })?;
            return Ok(());
        }

        let per_bucket = num_elems / BUCKETS;
        let with_extra = num_elems % BUCKETS;
        let mut curr = lower;

        for i in 0..BUCKETS {
            let bucket_size = per_bucket + usize::from(i < with_extra);
            let fingerprint = self.storage.fingerprint(curr, curr + bucket_size)?;
            curr += bucket_size;

            let next_bound = if curr == upper {
                *upper_bound
            } else {
                Bound::minimal(
                    &self.storage.get_item(curr - 1)?,
                    &self.storage.get_item(curr)?,
                )
            };

            encoder.encode_bound(&next_bound, out);
            encode_varint(Mode::Fingerprint as u64, out);
            out.extend_from_slice(fingerprint.as_bytes());
        }

        Ok(())
    }
}

/// Work out the width of a peer id list of `count` ids at the reader's
/// position. A list that fills the rest of the message fixes the width
/// exactly. Otherwise the list is followed by more ranges, and the widest
/// width that lets them parse wins.
fn infer_id_size(reader: &Reader<'_>, decoder: &BoundDecoder, count: u64) -> Result<usize> {
    let rest = reader.remaining() as u64;
    if rest % count == 0 && (1..=MAX_ID_SIZE as u64).contains(&(rest / count)) {
        return Ok((rest / count) as usize);
    }

    (1..=MAX_ID_SIZE)
        .rev()
        .find(|&width| parses_with_width(reader.clone(), decoder.clone(), count, width).is_ok())
        .ok_or(SyncError::IdSizeUnknown)
}

fn parses_with_width(
    mut reader: Reader<'_>,
    mut decoder: BoundDecoder,
    mut count: u64,
    width: usize,
) -> std::result::Result<(), WireError> {
    loop {
        let len = usize::try_from(count)
            .ok()
            .and_then(|n| n.checked_mul(width))
            .ok_or(WireError::Truncated)?;
        reader.read_bytes(len)?;
        count = 0;

        while count == 0 {
            if reader.is_empty() {
                return Ok(());
            }
            let bound = decoder.decode_bound(&mut reader)?;
            if bound.prefix().len() > width {
                return Err(WireError::BoundTooLong {
                    len: bound.prefix().len() as u64,
                });
            }
            match reader.read_mode()? {
                Mode::Skip => {}
                Mode::Fingerprint => {
                    reader.read_bytes(FINGERPRINT_SIZE)?;
                }
                Mode::IdList => count = reader.read_varint()?,
            }
        }
    }
}

fn flush_skip(skip: &mut bool, prev_bound: &Bound, encoder: &mut BoundEncoder, out: &mut Vec<u8>) {
    if !*skip {
        return;
    }
    *skip = false;
    encoder.encode_bound(prev_bound, out);
    encode_varint(Mode::Skip as u64, out);
}

impl<S: Storage> Reconciler for Negentropy<S> {
    fn initiate(&mut self) -> Result<Vec<u8>> {
        if self.is_initiator {
            return Err(SyncError::AlreadyInitiated);
        }
        self.is_initiator = true;

        let mut out = vec![PROTOCOL_VERSION];
        let mut encoder = BoundEncoder::new();
        let size = self.storage.size()?;
        self.split_range(0, size, &Bound::infinity(), &mut encoder, &mut out)?;
        Ok(out)
    }

    fn respond(&mut self, query: &[u8]) -> Result<Vec<u8>> {
        if self.is_initiator {
            return Err(SyncError::WrongRole("initiator not asking for have/need IDs"));
        }
        if query.is_empty() {
            return Ok(vec![PROTOCOL_VERSION]);
        }
        self.reconcile_aux(query, &mut DiscardSink)
    }

    fn reconcile(&mut self, query: &[u8], sink: &mut dyn IdSink) -> Result<Option<Vec<u8>>> {
        if !self.is_initiator {
            return Err(SyncError::WrongRole("non-initiator asking for have/need IDs"));
        }

        let output = self.reconcile_aux(query, sink)?;
        if output.len() == 1 {
            return Ok(None);
        }
        Ok(Some(output))
    }
}
