//! Benchmark workloads for the Lume scratch-memory crates.
//!
//! - [`buffer_demands`]: a deterministic stream of per-shape buffer sizes
//!   shaped like a rasterizer's edge-list needs.
//! - [`jagged_outline`]: a long polyline with collinear runs broken by
//!   turns, for simplifier throughput.
//! - [`Lcg`]: the seeded generator behind both.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use lume_path::PathEvent;

/// Minimal 64-bit linear congruential generator for reproducible
/// workloads.
#[derive(Clone, Debug)]
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed.wrapping_add(1442695040888963407))
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 11
    }

    /// Uniform in `[0, bound)`. `bound` must be non-zero.
    pub fn below(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound
    }
}

/// One shape's scratch needs: the initial estimate and the final size
/// the edge list grows to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Demand {
    pub initial: usize,
    pub peak: usize,
}

/// `shapes` demands: mostly small (a few hundred edges), with one in
/// sixteen large enough to hit the upper size classes and one in
/// sixty-four past the largest.
pub fn buffer_demands(seed: u64, shapes: usize, max_class: usize) -> Vec<Demand> {
    let mut rng = Lcg::new(seed);
    (0..shapes)
        .map(|_| {
            let roll = rng.below(64);
            let peak = match roll {
                0 => max_class + 1 + rng.below(max_class as u64) as usize,
                1..=4 => max_class / 4 + rng.below((max_class / 2) as u64) as usize,
                _ => 64 + rng.below(512) as usize,
            };
            Demand {
                initial: 256.min(peak),
                peak,
            }
        })
        .collect()
}

/// A closed outline of `segments` line steps: runs of 2 to 9 collinear
/// steps separated by turns, with sub-epsilon jitter on some runs.
pub fn jagged_outline(seed: u64, segments: usize) -> Vec<PathEvent> {
    let mut rng = Lcg::new(seed);
    let mut events = Vec::with_capacity(segments + 3);
    let (mut x, mut y) = (0.0f32, 0.0f32);
    events.push(PathEvent::MoveTo { x, y });

    let mut emitted = 0;
    while emitted < segments {
        let dx = rng.below(7) as f32 - 3.0;
        let dy = rng.below(7) as f32 - 3.0;
        let run = 2 + rng.below(8) as usize;
        let jitter = rng.below(4) == 0;
        for step in 0..run.min(segments - emitted) {
            x += dx;
            y += dy;
            let nudge = if jitter && step % 2 == 1 { 1e-6 } else { 0.0 };
            events.push(PathEvent::LineTo { x: x + nudge, y });
            emitted += 1;
        }
    }
    events.push(PathEvent::ClosePath);
    events.push(PathEvent::PathDone);
    events
}
