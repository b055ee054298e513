//! Raw scratch arenas with liveness-driven reclamation for Lume.
//!
//! Rendering contexts keep a few large byte regions alive across many
//! paths. This crate provides them as [`ScratchArena`]s with manual
//! allocate/resize/free, plus an [`ArenaReclaimer`] that releases any
//! arena whose handle leaked once its [`Owner`] goes away. This crate
//! is the only one in the workspace that may contain `unsafe` code, and
//! that code is confined to the private `raw` module.
//!
//! # Architecture
//!
//! ```text
//! ArenaReclaimer (one per process / renderer)
//! ├── Registry: Mutex<IndexMap<ArenaId, Entry>> + lifetime counters
//! └── watcher thread ◄── crossbeam channel ◄── Owner::drop (OwnerGone)
//!
//! ScratchArena (per use)
//! └── Arc<Block> ── Mutex<Option<RawRegion>> (shared with the registry)
//! ```
//!
//! # Release paths
//!
//! - **Handle:** [`ScratchArena::free`] or drop. Immediate and
//!   deterministic; the normal case.
//! - **Watcher:** on `OwnerGone`, every still-registered arena of that
//!   owner is released. Catches handles leaked with `mem::forget`,
//!   reference cycles, or ownership handed to foreign code.
//!
//! Either way a region is released exactly once.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
mod raw;
pub mod reclaim;
pub mod scratch;

pub use config::ReclaimerConfig;
pub use error::ArenaError;
pub use reclaim::{ArenaReclaimer, Owner, ReclaimReport, RETRY_INTERVAL};
pub use scratch::{ArenaBytes, ScratchArena};
