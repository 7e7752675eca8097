//! # Negentropy Harness Sync
//!
//! Range-based set reconciliation between two parties.
//!
//! ## Overview
//!
//! A [`Session`] wraps one [`Reconciler`] bound to a sealed store. The
//! initiator calls [`Session::initiate`] and then feeds every reply to
//! [`Session::receive`] until it yields [`Outcome::Converged`] with the
//! `have` and `need` sets. The responder just feeds every message to
//! [`Session::receive`] and forwards the reply.
//!
//! Discovered ids flow through a [`ResultCollector`]: two unbounded tokio
//! channels, each drained by its own task, joined once at convergence.
//!
//! ## Message Flow
//!
//! ```text
//! Initiator                           Responder
//!   |-------- initiate --------------->|
//!   |<------- reply -------------------|
//!   |-------- msg -------------------->|   (repeat until the
//!   |<------- reply -------------------|    initiator converges)
//!   |                                  |
//!  have / need / done
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use negentropy_harness_core::Id;
//! use negentropy_harness_store::VectorStore;
//! use negentropy_harness_sync::{FrameSizeGuard, Negentropy, Outcome, Session};
//!
//! async fn example() -> negentropy_harness_sync::Result<()> {
//!     let mut store = VectorStore::new();
//!     store.insert(100, Id::from_hex("aa")?)?;
//!     store.seal()?;
//!
//!     let engine = Negentropy::new(store, 0)?;
//!     let mut session = Session::new(engine, FrameSizeGuard::unlimited());
//!     let _first = session.initiate()?;
//!     // send `_first` to the peer, feed its reply to `session.receive`
//!     Ok(())
//! }
//! ```

pub mod collector;
pub mod engine;
pub mod error;
pub mod guard;
pub mod reconciler;
pub mod session;

pub use collector::{CollectedIds, ResultCollector, ResultSinks};
pub use engine::{Negentropy, MIN_FRAME_SIZE};
pub use error::{Result, SyncError};
pub use guard::{FrameSizeGuard, Step};
pub use reconciler::{IdSink, Reconciler, VecSink};
pub use session::{Outcome, Session, SessionState};
