//! Reconciler abstraction: the seam between the harness and the engine.
//!
//! The harness drives any engine that can start an exchange, answer a
//! message, and report discovered ids. [`crate::Negentropy`] is the
//! reference implementation.

use negentropy_harness_core::Id;

use crate::error::Result;

/// Receiver for ids discovered while reconciling.
pub trait IdSink {
    /// An id held locally but not by the peer.
    fn have(&mut self, id: Id) -> Result<()>;

    /// An id held by the peer but not locally.
    fn need(&mut self, id: Id) -> Result<()>;
}

/// Collects ids into two vectors, for driving an engine directly.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VecSink {
    pub have: Vec<Id>,
    pub need: Vec<Id>,
}

impl IdSink for VecSink {
    fn have(&mut self, id: Id) -> Result<()> {
        self.have.push(id);
        Ok(())
    }

    fn need(&mut self, id: Id) -> Result<()> {
        self.need.push(id);
        Ok(())
    }
}

/// A two-party range reconciliation engine bound to one sealed store.
///
/// Role is fixed by the first call: `initiate` makes the engine the
/// initiator, `respond` the responder.
pub trait Reconciler: Send {
    /// Produce the first message of an exchange.
    fn initiate(&mut self) -> Result<Vec<u8>>;

    /// Answer a peer message as the responder. Always produces a reply.
    fn respond(&mut self, query: &[u8]) -> Result<Vec<u8>>;

    /// Process a responder's reply as the initiator.
    ///
    /// Returns the next message, or `None` once the sets have converged.
    fn reconcile(&mut self, query: &[u8], sink: &mut dyn IdSink) -> Result<Option<Vec<u8>>>;
}
