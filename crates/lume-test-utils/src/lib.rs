//! Test utilities and fixtures for Lume development.
//!
//! Provides a [`RecordingSink`] for asserting on path output, small
//! pool/reclaimer setups, and the path fixtures in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use lume_arena::{ArenaReclaimer, ReclaimerConfig};
use lume_core::{ReuseMode, StatsMode};
use lume_path::{PathEvent, PathSink};
use lume_pool::{PoolConfig, SizeClassPool, SizeClasses};

/// A [`PathSink`] that records every event it receives.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordingSink {
    pub events: Vec<PathEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `line_to` events received.
    pub fn line_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, PathEvent::LineTo { .. }))
            .count()
    }

    /// End points of the `line_to` events, in order.
    pub fn line_points(&self) -> Vec<(f32, f32)> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                PathEvent::LineTo { x, y } => Some((x, y)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl PathSink for RecordingSink {
    fn move_to(&mut self, x: f32, y: f32) {
        self.events.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.events.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.events.quad_to(x1, y1, x2, y2);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32) {
        self.events.curve_to(x1, y1, x2, y2, x3, y3);
    }

    fn close_path(&mut self) {
        self.events.close_path();
    }

    fn path_done(&mut self) {
        self.events.path_done();
    }
}

/// Size classes small enough to exercise every bucket in a unit test.
pub const SMALL_CLASSES: [usize; 4] = [16, 64, 256, 1024];

/// A pool config over [`SMALL_CLASSES`] with stats and debug checks on.
pub fn small_pool_config(reuse: ReuseMode) -> PoolConfig {
    PoolConfig {
        size_classes: SizeClasses::from_lengths(SMALL_CLASSES.to_vec())
            .expect("SMALL_CLASSES is ascending"),
        bucket_capacity: 4,
        stats: StatsMode::Enabled,
        debug_checks: true,
        ..PoolConfig::new(reuse)
    }
}

/// A pool built from [`small_pool_config`].
pub fn small_pool<T: lume_pool::PoolElement>(reuse: ReuseMode) -> SizeClassPool<T> {
    SizeClassPool::new(small_pool_config(reuse)).expect("small pool config is valid")
}

/// A reclaimer with a test thread name and malloc logging on.
pub fn test_reclaimer() -> ArenaReclaimer {
    ArenaReclaimer::start(ReclaimerConfig {
        thread_name: "lume-test-reclaimer".into(),
        log_malloc: true,
    })
    .expect("reclaimer starts")
}
