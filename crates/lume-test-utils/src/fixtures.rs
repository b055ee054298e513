//! Reusable path fixtures.
//!
//! - [`diagonal_turn`]: a collinear run followed by a turn.
//! - [`line_then_quad`]: a pending line flushed by a curve.
//! - [`collinear_run`]: `n` equal steps along one direction.
//! - [`staircase`]: alternating horizontal/vertical steps (nothing merges).
//! - [`polygon`]: a closed regular polygon.

use std::f32::consts::TAU;

use lume_path::PathEvent;

fn mv(x: f32, y: f32) -> PathEvent {
    PathEvent::MoveTo { x, y }
}

fn ln(x: f32, y: f32) -> PathEvent {
    PathEvent::LineTo { x, y }
}

/// `(0,0) → (1,1) → (2,2) → (2,5)`, then done.
pub fn diagonal_turn() -> Vec<PathEvent> {
    vec![mv(0.0, 0.0), ln(1.0, 1.0), ln(2.0, 2.0), ln(2.0, 5.0), PathEvent::PathDone]
}

/// The simplified form of [`diagonal_turn`].
pub fn diagonal_turn_simplified() -> Vec<PathEvent> {
    vec![mv(0.0, 0.0), ln(2.0, 2.0), ln(2.0, 5.0), PathEvent::PathDone]
}

/// `(0,0) → (1,1)`, quad through `(2,2)` to `(3,3)`, then done. The
/// simplifier must leave it unchanged.
pub fn line_then_quad() -> Vec<PathEvent> {
    vec![
        mv(0.0, 0.0),
        ln(1.0, 1.0),
        PathEvent::QuadTo {
            x1: 2.0,
            y1: 2.0,
            x2: 3.0,
            y2: 3.0,
        },
        PathEvent::PathDone,
    ]
}

/// `n` steps of `(dx, dy)` from the origin, then done.
pub fn collinear_run(n: usize, dx: f32, dy: f32) -> Vec<PathEvent> {
    let mut events = Vec::with_capacity(n + 2);
    events.push(mv(0.0, 0.0));
    for i in 1..=n {
        events.push(ln(dx * i as f32, dy * i as f32));
    }
    events.push(PathEvent::PathDone);
    events
}

/// `n` alternating right/down unit steps, then done.
pub fn staircase(n: usize) -> Vec<PathEvent> {
    let mut events = Vec::with_capacity(n + 2);
    events.push(mv(0.0, 0.0));
    let (mut x, mut y) = (0.0f32, 0.0f32);
    for i in 0..n {
        if i % 2 == 0 {
            x += 1.0;
        } else {
            y += 1.0;
        }
        events.push(ln(x, y));
    }
    events.push(PathEvent::PathDone);
    events
}

/// A closed regular polygon with `sides` vertices, then done.
pub fn polygon(sides: usize, cx: f32, cy: f32, radius: f32) -> Vec<PathEvent> {
    let mut events = Vec::with_capacity(sides + 3);
    events.push(mv(cx + radius, cy));
    for i in 1..sides {
        let angle = TAU * i as f32 / sides as f32;
        events.push(ln(cx + radius * angle.cos(), cy + radius * angle.sin()));
    }
    events.push(PathEvent::ClosePath);
    events.push(PathEvent::PathDone);
    events
}
