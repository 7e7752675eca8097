//! # Negentropy Harness Store
//!
//! Storage abstraction for reconciliation. Provides a trait-based interface
//! over a sealed, ordered set of records, and a vector-backed implementation.
//!
//! ## Key Types
//!
//! - [`Storage`] - Read-only queries the reconciliation engine needs
//! - [`VectorStore`] - In-memory store: insert, then seal, then query
//!
//! ## Usage
//!
//! ```rust
//! use negentropy_harness_core::Id;
//! use negentropy_harness_store::{Storage, VectorStore};
//!
//! let mut store = VectorStore::new();
//! store.insert(200, Id::from_hex("bb").unwrap()).unwrap();
//! store.insert(100, Id::from_hex("aa").unwrap()).unwrap();
//! store.seal().unwrap();
//!
//! assert_eq!(store.size().unwrap(), 2);
//! assert_eq!(store.get_item(0).unwrap().timestamp, 100);
//! ```
//!
//! ## Design Notes
//!
//! - **Insert-until-sealed**: inserting after `seal` fails with `AlreadySealed`
//! - **Queries require sealing**: every [`Storage`] method fails with `NotSealed` before
//! - **No duplicates**: sealing a store holding the same record twice fails
//! - **Single width**: every id in a store has the same length

pub mod error;
pub mod traits;
pub mod vector;

pub use error::{Result, StoreError};
pub use traits::Storage;
pub use vector::VectorStore;
