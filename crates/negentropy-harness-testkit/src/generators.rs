//! Proptest generators for property-based testing.

use std::collections::BTreeSet;

use proptest::prelude::*;

use negentropy_harness_core::Id;

/// Generate an id of exactly `width` bytes.
pub fn id(width: usize) -> impl Strategy<Value = Id> {
    prop::collection::vec(any::<u8>(), width)
        .prop_filter_map("id width must be 1..=32", |bytes| Id::from_slice(&bytes).ok())
}

/// Generate a timestamp from a narrow range, so records often collide on
/// timestamp and bounds need id prefixes.
pub fn timestamp() -> impl Strategy<Value = u64> {
    prop_oneof![
        4 => 1_000u64..1_050,
        1 => any::<u64>().prop_map(|t| t / 2),
    ]
}

/// Where a generated record lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    ClientOnly,
    ServerOnly,
    Shared,
}

fn placement() -> impl Strategy<Value = Placement> {
    prop_oneof![
        Just(Placement::ClientOnly),
        Just(Placement::ServerOnly),
        Just(Placement::Shared),
    ]
}

/// Two record sets drawn from one pool of distinct records.
#[derive(Debug, Clone)]
pub struct SetPair {
    pub client: Vec<(u64, Id)>,
    pub server: Vec<(u64, Id)>,
}

impl SetPair {
    /// Ids only the client holds, hex-encoded and sorted.
    pub fn expected_have(&self) -> Vec<String> {
        difference(&self.client, &self.server)
    }

    /// Ids only the server holds, hex-encoded and sorted.
    pub fn expected_need(&self) -> Vec<String> {
        difference(&self.server, &self.client)
    }
}

fn difference(ours: &[(u64, Id)], theirs: &[(u64, Id)]) -> Vec<String> {
    let theirs: BTreeSet<Id> = theirs.iter().map(|(_, id)| *id).collect();
    let mut out: Vec<String> = ours
        .iter()
        .filter(|(_, id)| !theirs.contains(id))
        .map(|(_, id)| id.to_hex())
        .collect();
    out.sort();
    out
}

/// Generate a pair of sets with up to `max_records` distinct records of
/// `width`-byte ids.
pub fn set_pair(width: usize, max_records: usize) -> impl Strategy<Value = SetPair> {
    prop::collection::btree_map(id(width), (timestamp(), placement()), 0..=max_records).prop_map(
        |records| {
            let mut pair = SetPair {
                client: Vec::new(),
                server: Vec::new(),
            };
            for (id, (ts, place)) in records {
                if place != Placement::ServerOnly {
                    pair.client.push((ts, id));
                }
                if place != Placement::ClientOnly {
                    pair.server.push((ts, id));
                }
            }
            pair
        },
    )
}

/// Generate one set and use it for both parties.
pub fn identical_pair(width: usize, max_records: usize) -> impl Strategy<Value = SetPair> {
    prop::collection::btree_map(id(width), timestamp(), 0..=max_records).prop_map(|records| {
        let set: Vec<(u64, Id)> = records.into_iter().map(|(id, ts)| (ts, id)).collect();
        SetPair {
            client: set.clone(),
            server: set,
        }
    })
}
