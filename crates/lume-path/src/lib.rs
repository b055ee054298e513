//! Streaming path filters for Lume.
//!
//! Geometry reaches the rasterizer as a stream of path-construction
//! events delivered to a [`PathSink`]. Filters are sinks that wrap a
//! downstream sink, so a pipeline is built by nesting:
//!
//! ```text
//! producer ──► PathSimplifier<S> ──► S (rasterizer edge builder)
//! ```
//!
//! [`PathSimplifier`] drops redundant vertices from runs of collinear
//! line segments, reducing the edge count the scan-converter sees.
//! [`PathEvent`] records and replays event streams.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod simplifier;
pub mod sink;

pub use simplifier::{PathSimplifier, SimplifierState, SimplifierStats, EPS};
pub use sink::{PathEvent, PathSink};
