//! Lume: scratch-memory reuse and path pre-filtering for software rasterizers.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Lume sub-crates. For most users, adding `lume` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use lume::prelude::*;
//!
//! // Per-context buffer pool and a shape's growable edge list.
//! let pool = IntPool::new(PoolConfig::default()).unwrap();
//! let mut edges = pool.create_reference(256);
//! let mut buf = edges.take_initial().unwrap();
//! buf = edges.widen_array(buf, 0, 10_000);
//! buf[..10_000].fill(7);
//! let buf = edges.put_array(buf, 0, 10_000).unwrap();
//! assert!(edges.is_initial(&buf));
//!
//! // Raw arena with leak reclamation.
//! let reclaimer = ArenaReclaimer::start(ReclaimerConfig::default()).unwrap();
//! let owner = reclaimer.owner();
//! let mut arena = ScratchArena::allocate(&owner, 4096).unwrap();
//! arena.fill(0xFF).unwrap();
//! arena.resize(8192).unwrap();
//! assert_eq!(arena.bytes().unwrap()[4095], 0xFF);
//!
//! // Collinear segment merging in front of a sink.
//! let mut simplifier = PathSimplifier::new(Vec::new());
//! simplifier.move_to(0.0, 0.0);
//! simplifier.line_to(1.0, 1.0);
//! simplifier.line_to(2.0, 2.0);
//! simplifier.path_done();
//! assert_eq!(simplifier.stats().lines_out, 1);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `lume-core` | Ids, mode switches, `ConfigError` |
//! | [`pool`] | `lume-pool` | Size-classed buffer pools, `Reference`, statistics |
//! | [`arena`] | `lume-arena` | Scratch arenas and the reclaimer |
//! | [`path`] | `lume-path` | `PathSink`, `PathEvent`, `PathSimplifier` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Ids, mode switches and configuration errors (`lume-core`).
pub use lume_core as types;

/// Size-classed scratch buffer pools (`lume-pool`).
///
/// [`pool::SizeClassPool`] owns the buckets; [`pool::Reference`] is the
/// per-use handle with `get_array` / `widen_array` / `put_array`.
pub use lume_pool as pool;

/// Raw scratch arenas and leak reclamation (`lume-arena`).
///
/// [`arena::ScratchArena`] is freed on drop; [`arena::ArenaReclaimer`]
/// frees arenas whose handle leaked once their [`arena::Owner`] drops.
pub use lume_arena as arena;

/// Path event interface and filters (`lume-path`).
pub use lume_path as path;

/// Common imports for typical Lume usage.
///
/// ```rust
/// use lume::prelude::*;
/// ```
pub mod prelude {
    // Core
    pub use lume_core::{ArenaId, ConfigError, OwnerId, ReuseMode, StatsMode};

    // Pools
    pub use lume_pool::{
        BytePool, DoublePool, FloatPool, GrowthPolicy, IntPool, PoolConfig, PoolStats, Reference,
        SizeClassPool, SizeClasses,
    };

    // Arenas
    pub use lume_arena::{
        ArenaError, ArenaReclaimer, Owner, ReclaimReport, ReclaimerConfig, ScratchArena,
    };

    // Paths
    pub use lume_path::{PathEvent, PathSimplifier, PathSink, SimplifierStats};
}
