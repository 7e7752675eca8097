//! # Negentropy Harness Testkit
//!
//! Testing utilities for the Negentropy harness.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden transcripts**: exact message bytes for small exchanges
//! - **Generators**: Proptest strategies for pairs of record sets
//! - **Fixtures**: an in-process orchestrator that pipes `msg` lines between
//!   a client and a server interpreter
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use negentropy_harness_testkit::{generators::set_pair, fixtures::reconcile_direct};
//!
//! proptest! {
//!     #[test]
//!     fn sets_converge(pair in set_pair(32, 200)) {
//!         let (ids, _) = reconcile_direct(&pair.client, &pair.server, 0).unwrap();
//!         prop_assert_eq!(ids.need.len(), pair.expected_need().len());
//!     }
//! }
//! ```
//!
//! ## Two-Party Fixture
//!
//! ```rust,ignore
//! use negentropy_harness::HarnessConfig;
//! use negentropy_harness_core::Id;
//! use negentropy_harness_testkit::TwoPartyFixture;
//!
//! let transcript = TwoPartyFixture::new(HarnessConfig::default())
//!     .shared_item(100, Id::from_hex("aa")?)
//!     .server_item(200, Id::from_hex("bb")?)
//!     .run()
//!     .await?;
//! assert_eq!(transcript.need, vec!["bb"]);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{reconcile_direct, Transcript, TwoPartyFixture};
pub use generators::SetPair;
pub use vectors::{all_transcripts, GoldenTranscript};
