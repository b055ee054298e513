//! Core types shared by the Lume scratch-memory crates.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the strongly-typed identifiers, diagnostic/reuse mode switches, and
//! configuration error type used throughout the Lume workspace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod mode;

pub use error::ConfigError;
pub use id::{ArenaId, OwnerId};
pub use mode::{ParseModeError, ReuseMode, StatsMode};
