//! Reconciliation session: one engine, one role, one result collector.
//!
//! ```text
//!                  initiate
//! Uninitialized ───────────▶ Initiator ──(converged)──▶ Done
//!       │
//!       └──────── msg ─────▶ Responder
//! ```
//!
//! The role is fixed by the first exchange command. Any other transition is
//! an error.

use crate::collector::{CollectedIds, ResultCollector, ResultSinks};
use crate::error::{Result, SyncError};
use crate::guard::{FrameSizeGuard, Step};
use crate::reconciler::Reconciler;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Sealed, no exchange command seen yet.
    Uninitialized,
    /// `initiate` was called; awaiting replies.
    Initiator,
    /// First command was a peer message; answers every message.
    Responder,
    /// The initiator converged and reported its results.
    Done,
}

/// Result of feeding a peer message to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Send this message to the peer.
    Message(Vec<u8>),
    /// The exchange is over. Only the initiator reaches this.
    Converged(CollectedIds),
}

/// Drives a [`Reconciler`] through one exchange.
pub struct Session<R: Reconciler> {
    reconciler: R,
    guard: FrameSizeGuard,
    state: SessionState,
    collector: Option<(ResultSinks, ResultCollector)>,
    round: u64,
}

impl<R: Reconciler> Session<R> {
    /// Wrap an engine and start the result collector.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(reconciler: R, guard: FrameSizeGuard) -> Self {
        Self {
            reconciler,
            guard,
            state: SessionState::Uninitialized,
            collector: Some(ResultCollector::spawn()),
            round: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Start the exchange as initiator and return the first message.
    pub fn initiate(&mut self) -> Result<Vec<u8>> {
        if self.state != SessionState::Uninitialized {
            return Err(SyncError::InvalidTransition {
                command: "initiate",
                state: self.state,
            });
        }

        let msg = self.reconciler.initiate()?;
        self.guard.check(Step::Initiate, &msg)?;
        self.state = SessionState::Initiator;
        self.log_outbound(&msg);
        Ok(msg)
    }

    /// Feed a peer message.
    ///
    /// The first call on a fresh session makes it the responder.
    pub async fn receive(&mut self, payload: &[u8]) -> Result<Outcome> {
        match self.state {
            SessionState::Uninitialized => {
                self.state = SessionState::Responder;
                self.respond(payload)
            }
            SessionState::Responder => self.respond(payload),
            SessionState::Initiator => self.reconcile(payload).await,
            SessionState::Done => Err(SyncError::InvalidTransition {
                command: "msg",
                state: self.state,
            }),
        }
    }

    /// Close the result channels and return whatever was collected.
    ///
    /// A converged session has already been drained and yields empty sets.
    pub async fn finish(mut self) -> Result<CollectedIds> {
        self.join().await
    }

    fn respond(&mut self, payload: &[u8]) -> Result<Outcome> {
        tracing::debug!(round = self.round, bytes = payload.len(), "responder received");
        let reply = self.reconciler.respond(payload)?;
        self.guard.check(Step::Msg, &reply)?;
        self.log_outbound(&reply);
        Ok(Outcome::Message(reply))
    }

    async fn reconcile(&mut self, payload: &[u8]) -> Result<Outcome> {
        tracing::debug!(round = self.round, bytes = payload.len(), "initiator received");

        let next = match self.collector.as_mut() {
            Some((sinks, _)) => self.reconciler.reconcile(payload, sinks)?,
            None => return Err(SyncError::Collector("collector already joined".into())),
        };

        match next {
            Some(msg) => {
                self.guard.check(Step::Msg, &msg)?;
                self.log_outbound(&msg);
                Ok(Outcome::Message(msg))
            }
            None => {
                let ids = self.join().await?;
                ids.verify()?;
                self.state = SessionState::Done;
                tracing::info!(
                    rounds = self.round,
                    have = ids.have.len(),
                    need = ids.need.len(),
                    "reconciliation converged"
                );
                Ok(Outcome::Converged(ids))
            }
        }
    }

    async fn join(&mut self) -> Result<CollectedIds> {
        match self.collector.take() {
            Some((sinks, collector)) => collector.join(sinks).await,
            None => Ok(CollectedIds::default()),
        }
    }

    fn log_outbound(&mut self, msg: &[u8]) {
        self.round += 1;
        let role = match self.state {
            SessionState::Initiator => "client",
            _ => "server",
        };
        tracing::debug!(round = self.round, role, bytes = msg.len(), "sending message");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Negentropy;
    use negentropy_harness_core::Id;
    use negentropy_harness_store::VectorStore;

    fn engine(records: &[(u64, u8)]) -> Negentropy<VectorStore> {
        let mut store = VectorStore::new();
        for (ts, b) in records {
            store.insert(*ts, Id::from_slice(&[*b]).unwrap()).unwrap();
        }
        store.seal().unwrap();
        Negentropy::new(store, 0).unwrap()
    }

    fn session(records: &[(u64, u8)]) -> Session<Negentropy<VectorStore>> {
        Session::new(engine(records), FrameSizeGuard::unlimited())
    }

    #[tokio::test]
    async fn test_scenario_converges() {
        let mut client = session(&[(100, 0xaa)]);
        let mut server = session(&[(100, 0xaa), (200, 0xbb)]);

        let x = client.initiate().unwrap();
        assert_eq!(client.state(), SessionState::Initiator);

        let y = match server.receive(&x).await.unwrap() {
            Outcome::Message(y) => y,
            other => panic!("unexpected outcome {other:?}"),
        };
        assert_eq!(server.state(), SessionState::Responder);

        match client.receive(&y).await.unwrap() {
            Outcome::Converged(ids) => {
                assert!(ids.have.is_empty());
                assert_eq!(ids.need, vec![Id::from_slice(&[0xbb]).unwrap()]);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(client.state(), SessionState::Done);

        assert!(server.finish().await.unwrap().is_empty());
        assert!(client.finish().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_initiate_twice_rejected() {
        let mut s = session(&[]);
        s.initiate().unwrap();
        assert!(matches!(
            s.initiate(),
            Err(SyncError::InvalidTransition {
                command: "initiate",
                state: SessionState::Initiator
            })
        ));
    }

    #[tokio::test]
    async fn test_initiate_after_msg_rejected() {
        let mut s = session(&[]);
        s.receive(&[0x61]).await.unwrap();
        assert!(matches!(
            s.initiate(),
            Err(SyncError::InvalidTransition {
                state: SessionState::Responder,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_msg_after_done_rejected() {
        let mut client = session(&[]);
        let mut server = session(&[]);
        let x = client.initiate().unwrap();
        let Outcome::Message(y) = server.receive(&x).await.unwrap() else {
            panic!("responder must reply");
        };
        assert!(matches!(client.receive(&y).await.unwrap(), Outcome::Converged(_)));
        assert!(matches!(
            client.receive(&y).await,
            Err(SyncError::InvalidTransition {
                command: "msg",
                state: SessionState::Done
            })
        ));
    }

    #[tokio::test]
    async fn test_responder_answers_empty_payload() {
        let mut s = session(&[(1, 0xaa)]);
        assert_eq!(s.receive(&[]).await.unwrap(), Outcome::Message(vec![0x61]));
    }

    #[tokio::test]
    async fn test_initiator_rejects_empty_payload() {
        let mut s = session(&[(1, 0xaa)]);
        s.initiate().unwrap();
        assert!(matches!(s.receive(&[]).await, Err(SyncError::Wire(_))));
    }

    #[tokio::test]
    async fn test_guard_rejects_oversize_initiate() {
        let records: Vec<_> = (0..20u8).map(|b| (u64::from(b), b)).collect();
        let mut s = Session::new(engine(&records), FrameSizeGuard::new(10));
        assert!(matches!(
            s.initiate(),
            Err(SyncError::FrameSizeExceeded {
                step: Step::Initiate,
                ..
            })
        ));
        assert_eq!(s.state(), SessionState::Uninitialized);
    }
}
