//! Size-classed scratch buffer pools for Lume.
//!
//! A rasterizer needs large, short-lived working arrays (edge lists,
//! coverage rows, crossing buffers) on every path it fills. Allocating
//! them per path is slow, so each rendering context owns a
//! [`SizeClassPool`] per element type and draws buffers from it.
//!
//! # Architecture
//!
//! ```text
//! SizeClassPool<T> (shared handle, one per context)
//! ├── PoolConfig (size classes, bucket capacity, reuse, growth, stats)
//! ├── Bucket<T> × N (lazily built, trimmable; LIFO of same-length buffers)
//! └── CacheStats (optional counters, snapshotted as PoolStats)
//!
//! Reference<T> (per use; owns one never-pooled initial buffer)
//! ```
//!
//! # Reuse modes
//!
//! - **Clean:** returned buffers are zero-filled over their used range,
//!   so callers may rely on fresh buffers being all-default.
//! - **Dirty:** returned buffers keep their contents; callers overwrite
//!   before reading.
//!
//! Pools are single-threaded: they use `Rc`/`RefCell` internally and are
//! neither `Send` nor `Sync`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

use std::fmt;

pub mod bucket;
pub mod config;
pub mod pool;
pub mod reference;
pub mod stats;

pub use bucket::{Bucket, PutOutcome};
pub use config::{default_growth, GrowthPolicy, PoolConfig, SizeClasses};
pub use pool::SizeClassPool;
pub use reference::Reference;
pub use stats::{BucketCounters, PoolStats};

/// Element types a pool can hold.
///
/// `Default` is the "clean" value written over returned ranges.
pub trait PoolElement: Copy + Default + PartialEq + fmt::Debug + 'static {}

impl<T: Copy + Default + PartialEq + fmt::Debug + 'static> PoolElement for T {}

/// Pool of byte buffers.
pub type BytePool = SizeClassPool<u8>;

/// Pool of `i32` buffers (edge and crossing lists).
pub type IntPool = SizeClassPool<i32>;

/// Pool of `f32` buffers.
pub type FloatPool = SizeClassPool<f32>;

/// Pool of `f64` buffers.
pub type DoublePool = SizeClassPool<f64>;
