//! Result collection for the initiator.
//!
//! Discovered ids are pushed onto two unbounded channels, each drained by its
//! own task. The channels are closed and both drains awaited when the
//! exchange converges, so every id is reported exactly once and nothing is
//! lost in flight.

use std::collections::HashSet;

use negentropy_harness_core::Id;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{Result, SyncError};
use crate::reconciler::IdSink;

/// Sending half of the collector, handed to the engine as its [`IdSink`].
#[derive(Debug, Clone)]
pub struct ResultSinks {
    have: mpsc::UnboundedSender<Id>,
    need: mpsc::UnboundedSender<Id>,
}

impl IdSink for ResultSinks {
    fn have(&mut self, id: Id) -> Result<()> {
        self.have
            .send(id)
            .map_err(|_| SyncError::Collector("have channel closed".into()))
    }

    fn need(&mut self, id: Id) -> Result<()> {
        self.need
            .send(id)
            .map_err(|_| SyncError::Collector("need channel closed".into()))
    }
}

/// The two ordered id sets gathered by a session.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectedIds {
    /// Ids held locally but not by the peer, in discovery order.
    pub have: Vec<Id>,
    /// Ids held by the peer but not locally, in discovery order.
    pub need: Vec<Id>,
}

impl CollectedIds {
    /// Total number of ids across both sets.
    pub fn len(&self) -> usize {
        self.have.len() + self.need.len()
    }

    pub fn is_empty(&self) -> bool {
        self.have.is_empty() && self.need.is_empty()
    }

    /// Fail if any id appears twice, within a set or across the two.
    pub fn verify(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.len());
        for id in self.have.iter().chain(&self.need) {
            if !seen.insert(*id) {
                return Err(SyncError::DuplicateId(id.to_hex()));
            }
        }
        Ok(())
    }
}

/// Receiving half: two drain tasks appending into vectors.
#[derive(Debug)]
pub struct ResultCollector {
    have: JoinHandle<Vec<Id>>,
    need: JoinHandle<Vec<Id>>,
}

impl ResultCollector {
    /// Start both drains. Must be called within a tokio runtime.
    pub fn spawn() -> (ResultSinks, ResultCollector) {
        let (have_tx, have_rx) = mpsc::unbounded_channel();
        let (need_tx, need_rx) = mpsc::unbounded_channel();

        let collector = ResultCollector {
            have: tokio::spawn(drain(have_rx)),
            need: tokio::spawn(drain(need_rx)),
        };
        let sinks = ResultSinks {
            have: have_tx,
            need: need_tx,
        };
        (sinks, collector)
    }

    /// Close the channels and wait for both drains to finish.
    ///
    /// Taking `sinks` by value guarantees this handle's senders are gone
    /// before waiting. Clones held elsewhere would keep a drain alive.
    pub async fn join(self, sinks: ResultSinks) -> Result<CollectedIds> {
        drop(sinks);

        let have = self
            .have
            .await
            .map_err(|e| SyncError::Collector(format!("have drain failed: {e}")))?;
        let need = self
            .need
            .await
            .map_err(|e| SyncError::Collector(format!("need drain failed: {e}")))?;

        tracing::debug!(have = have.len(), need = need.len(), "result collector joined");
        Ok(CollectedIds { have, need })
    }
}

async fn drain(mut rx: mpsc::UnboundedReceiver<Id>) -> Vec<Id> {
    let mut ids = Vec::new();
    while let Some(id) = rx.recv().await {
        ids.push(id);
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(byte: u8) -> Id {
        Id::from_slice(&[byte]).unwrap()
    }

    #[tokio::test]
    async fn test_join_preserves_order() {
        let (mut sinks, collector) = ResultCollector::spawn();
        for b in [3, 1, 2] {
            sinks.have(id(b)).unwrap();
        }
        sinks.need(id(9)).unwrap();

        let ids = collector.join(sinks).await.unwrap();
        assert_eq!(ids.have, vec![id(3), id(1), id(2)]);
        assert_eq!(ids.need, vec![id(9)]);
        assert_eq!(ids.len(), 4);
    }

    #[tokio::test]
    async fn test_join_empty() {
        let (sinks, collector) = ResultCollector::spawn();
        let ids = collector.join(sinks).await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_many_ids_none_lost() {
        let (mut sinks, collector) = ResultCollector::spawn();
        for i in 0..10_000u32 {
            let bytes = i.to_be_bytes();
            sinks.need(Id::from_slice(&bytes).unwrap()).unwrap();
        }
        let ids = collector.join(sinks).await.unwrap();
        assert_eq!(ids.need.len(), 10_000);
        assert!(ids.verify().is_ok());
    }

    #[test]
    fn test_verify_catches_duplicates() {
        let within = CollectedIds {
            have: vec![id(1), id(1)],
            need: vec![],
        };
        assert!(matches!(within.verify(), Err(SyncError::DuplicateId(_))));

        let across = CollectedIds {
            have: vec![id(1)],
            need: vec![id(1)],
        };
        assert!(matches!(across.verify(), Err(SyncError::DuplicateId(h)) if h == "01"));
    }
}
