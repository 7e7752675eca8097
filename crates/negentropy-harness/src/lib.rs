//! # Negentropy Harness
//!
//! Conformance harness for Negentropy range-based set reconciliation.
//!
//! ## Line Protocol
//!
//! The harness reads comma-separated commands, one per line, and writes
//! protocol lines back:
//!
//! | input                  | output                          |
//! |------------------------|---------------------------------|
//! | `item,<created>,<id>`  |                                 |
//! | `seal`                 |                                 |
//! | `initiate`             | `msg,<hex>`                     |
//! | `msg,<hex>`            | `msg,<hex>` or `have`/`need`/`done` |
//!
//! An external orchestrator runs two harnesses and pipes each `msg` line
//! from one into the other until the initiator prints `done`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use negentropy_harness::{HarnessConfig, Interpreter};
//!
//! async fn example() -> negentropy_harness::Result<()> {
//!     let config = HarnessConfig::default().with_frame_size_limit(8192);
//!     let input = tokio::io::BufReader::new(tokio::io::stdin());
//!     let interpreter = Interpreter::new(config, tokio::io::stdout())?;
//!     interpreter.run(input).await?;
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod loopback;

pub use command::Command;
pub use config::{HarnessConfig, FRAME_SIZE_LIMIT_ENV, ID_SIZE_ENV};
pub use error::{HarnessError, Result};
pub use interpreter::Interpreter;
pub use loopback::{run_loopback, LoopbackRecord, Side};
