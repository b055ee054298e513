//! Streaming merge of consecutive collinear line segments.

use crate::sink::PathSink;

/// Two slopes closer than this are treated as collinear.
pub const EPS: f32 = 1e-4;

/// Observable phase of a [`PathSimplifier`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimplifierState {
    /// No current point: before the first event, or after a subpath ended.
    Empty,
    /// A current point is known; no segment is buffered.
    PendingPoint,
    /// One (possibly merged) line segment is buffered, not yet forwarded.
    PendingLine,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum State {
    Empty,
    PendingPoint { x: f32, y: f32 },
    PendingLine { x: f32, y: f32, slope: f32 },
}

/// Counts of line segments through a [`PathSimplifier`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimplifierStats {
    /// `line_to` events received.
    pub lines_in: u64,
    /// `line_to` events forwarded downstream.
    pub lines_out: u64,
}

impl SimplifierStats {
    /// Segments absorbed by merging.
    pub fn merged(&self) -> u64 {
        self.lines_in.saturating_sub(self.lines_out)
    }
}

/// A [`PathSink`] filter that merges runs of near-collinear `line_to`
/// segments before they reach the downstream sink.
///
/// At most one line segment is held back. It is extended while each new
/// segment's slope (`dx / dy`) equals the buffered slope or differs by
/// less than [`EPS`], and forwarded as soon as a segment turns, a curve
/// or `move_to` arrives, or the subpath ends. Every other event passes
/// through unchanged and in order.
///
/// Horizontal segments have slope `+inf` (pointing right) or `-inf`
/// (pointing left), so horizontal runs merge only when they keep the
/// same direction. Slopes are compared for exact equality first, which
/// is what lets two infinite slopes match.
///
/// Instances are reusable: [`reset`](PathSimplifier::reset) between
/// paths, or [`replace_sink`](PathSimplifier::replace_sink) to re-target.
#[derive(Debug)]
pub struct PathSimplifier<S> {
    sink: S,
    state: State,
    stats: SimplifierStats,
}

impl<S: PathSink> PathSimplifier<S> {
    /// Wrap `sink` in a fresh simplifier.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            state: State::Empty,
            stats: SimplifierStats::default(),
        }
    }

    /// Discard any buffered segment and counts, returning to `Empty`.
    ///
    /// A buffered segment is dropped, not forwarded: call after a path
    /// has been completed (or abandoned).
    pub fn reset(&mut self) {
        self.state = State::Empty;
        self.stats = SimplifierStats::default();
    }

    /// Re-target to `sink`, resetting, and hand back the previous sink.
    pub fn replace_sink(&mut self, sink: S) -> S {
        self.reset();
        std::mem::replace(&mut self.sink, sink)
    }

    /// The downstream sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The downstream sink, mutably.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Unwrap the downstream sink. A buffered segment is dropped.
    pub fn into_inner(self) -> S {
        self.sink
    }

    /// Current phase.
    pub fn state(&self) -> SimplifierState {
        match self.state {
            State::Empty => SimplifierState::Empty,
            State::PendingPoint { .. } => SimplifierState::PendingPoint,
            State::PendingLine { .. } => SimplifierState::PendingLine,
        }
    }

    /// Segment counts since construction or the last reset.
    pub fn stats(&self) -> SimplifierStats {
        self.stats
    }

    fn emit_line(&mut self, x: f32, y: f32) {
        self.stats.lines_out += 1;
        self.sink.line_to(x, y);
    }

    fn flush(&mut self) {
        if let State::PendingLine { x, y, .. } = self.state {
            self.emit_line(x, y);
        }
    }
}

impl<S: PathSink> PathSink for PathSimplifier<S> {
    fn move_to(&mut self, x: f32, y: f32) {
        self.flush();
        self.sink.move_to(x, y);
        self.state = State::PendingPoint { x, y };
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.stats.lines_in += 1;
        let state = self.state;
        self.state = match state {
            State::PendingLine {
                x: px,
                y: py,
                slope: pslope,
            } => {
                let slope = slope(px, py, x, y);
                if slope == pslope || (pslope - slope).abs() < EPS {
                    State::PendingLine {
                        x,
                        y,
                        slope: pslope,
                    }
                } else {
                    self.emit_line(px, py);
                    State::PendingLine { x, y, slope }
                }
            }
            State::PendingPoint { x: px, y: py } => State::PendingLine {
                x,
                y,
                slope: slope(px, py, x, y),
            },
            State::Empty => {
                self.emit_line(x, y);
                State::PendingPoint { x, y }
            }
        };
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.flush();
        self.sink.quad_to(x1, y1, x2, y2);
        self.state = State::PendingPoint { x: x2, y: y2 };
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32) {
        self.flush();
        self.sink.curve_to(x1, y1, x2, y2, x3, y3);
        self.state = State::PendingPoint { x: x3, y: y3 };
    }

    fn close_path(&mut self) {
        self.flush();
        self.state = State::Empty;
        self.sink.close_path();
    }

    fn path_done(&mut self) {
        self.flush();
        self.state = State::Empty;
        tracing::trace!(
            lines_in = self.stats.lines_in,
            lines_out = self.stats.lines_out,
            "path simplified"
        );
        self.sink.path_done();
    }
}

/// `dx / dy`, or `±inf` for a horizontal step (`+inf` when moving right).
fn slope(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let dy = y2 - y1;
    if dy == 0.0 {
        if x2 > x1 {
            f32::INFINITY
        } else {
            f32::NEG_INFINITY
        }
    } else {
        (x2 - x1) / dy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::PathEvent;
    use PathEvent::*;

    fn run(events: &[PathEvent]) -> (Vec<PathEvent>, SimplifierStats) {
        let mut simplifier = PathSimplifier::new(Vec::new());
        PathEvent::replay(events, &mut simplifier);
        let stats = simplifier.stats();
        (simplifier.into_inner(), stats)
    }

    fn mv(x: f32, y: f32) -> PathEvent {
        MoveTo { x, y }
    }

    fn ln(x: f32, y: f32) -> PathEvent {
        LineTo { x, y }
    }

    #[test]
    fn diagonal_run_merges_until_turn() {
        let (out, stats) = run(&[mv(0.0, 0.0), ln(1.0, 1.0), ln(2.0, 2.0), ln(2.0, 5.0), PathDone]);
        assert_eq!(out, vec![mv(0.0, 0.0), ln(2.0, 2.0), ln(2.0, 5.0), PathDone]);
        assert_eq!(stats.lines_in, 3);
        assert_eq!(stats.lines_out, 2);
        assert_eq!(stats.merged(), 1);
    }

    #[test]
    fn curve_flushes_pending_line() {
        let quad = QuadTo {
            x1: 2.0,
            y1: 2.0,
            x2: 3.0,
            y2: 3.0,
        };
        let (out, _) = run(&[mv(0.0, 0.0), ln(1.0, 1.0), quad, PathDone]);
        assert_eq!(out, vec![mv(0.0, 0.0), ln(1.0, 1.0), quad, PathDone]);
    }

    #[test]
    fn horizontal_runs_merge_in_same_direction() {
        let (out, _) = run(&[mv(0.0, 0.0), ln(1.0, 0.0), ln(3.0, 0.0), PathDone]);
        assert_eq!(out, vec![mv(0.0, 0.0), ln(3.0, 0.0), PathDone]);
    }

    #[test]
    fn horizontal_reversal_is_kept() {
        let (out, _) = run(&[mv(0.0, 0.0), ln(2.0, 0.0), ln(1.0, 0.0), PathDone]);
        assert_eq!(out, vec![mv(0.0, 0.0), ln(2.0, 0.0), ln(1.0, 0.0), PathDone]);
    }

    #[test]
    fn vertical_steps_share_zero_slope() {
        // dx/dy is zero either way, so a vertical back-track folds in.
        let (out, _) = run(&[mv(0.0, 0.0), ln(0.0, 5.0), ln(0.0, 2.0), PathDone]);
        assert_eq!(out, vec![mv(0.0, 0.0), ln(0.0, 2.0), PathDone]);
    }

    #[test]
    fn near_collinear_within_eps_merges() {
        let (out, _) = run(&[mv(0.0, 0.0), ln(1.0, 1.0), ln(2.00005, 2.0), PathDone]);
        assert_eq!(out, vec![mv(0.0, 0.0), ln(2.00005, 2.0), PathDone]);

        let (out, _) = run(&[mv(0.0, 0.0), ln(1.0, 1.0), ln(2.01, 2.0), PathDone]);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn line_without_move_is_forwarded_immediately() {
        let mut simplifier = PathSimplifier::new(Vec::new());
        simplifier.line_to(4.0, 4.0);
        assert_eq!(simplifier.sink(), &vec![ln(4.0, 4.0)]);
        assert_eq!(simplifier.state(), SimplifierState::PendingPoint);
        simplifier.line_to(5.0, 5.0);
        assert_eq!(simplifier.state(), SimplifierState::PendingLine);
        assert_eq!(simplifier.sink().len(), 1);
    }

    #[test]
    fn close_path_flushes_and_empties() {
        let (out, _) = run(&[mv(0.0, 0.0), ln(1.0, 1.0), ln(2.0, 2.0), ClosePath, ln(9.0, 9.0)]);
        assert_eq!(out, vec![mv(0.0, 0.0), ln(2.0, 2.0), ClosePath, ln(9.0, 9.0)]);
    }

    #[test]
    fn move_to_flushes_previous_subpath() {
        let (out, _) = run(&[mv(0.0, 0.0), ln(1.0, 2.0), mv(5.0, 5.0), ln(6.0, 6.0), PathDone]);
        assert_eq!(
            out,
            vec![mv(0.0, 0.0), ln(1.0, 2.0), mv(5.0, 5.0), ln(6.0, 6.0), PathDone]
        );
    }

    #[test]
    fn curve_end_point_seeds_next_slope() {
        let curve = CurveTo {
            x1: 0.0,
            y1: 1.0,
            x2: 1.0,
            y2: 1.0,
            x3: 1.0,
            y3: 1.0,
        };
        let (out, _) = run(&[mv(0.0, 0.0), curve, ln(2.0, 2.0), ln(3.0, 3.0), PathDone]);
        assert_eq!(out, vec![mv(0.0, 0.0), curve, ln(3.0, 3.0), PathDone]);
    }

    #[test]
    fn reset_drops_buffered_segment() {
        let mut simplifier = PathSimplifier::new(Vec::new());
        simplifier.move_to(0.0, 0.0);
        simplifier.line_to(1.0, 1.0);
        simplifier.reset();
        assert_eq!(simplifier.state(), SimplifierState::Empty);
        assert_eq!(simplifier.stats(), SimplifierStats::default());
        simplifier.path_done();
        assert_eq!(simplifier.sink(), &vec![mv(0.0, 0.0), PathDone]);
    }

    #[test]
    fn replace_sink_returns_previous_output() {
        let mut simplifier = PathSimplifier::new(Vec::new());
        simplifier.move_to(1.0, 1.0);
        simplifier.path_done();
        let first = simplifier.replace_sink(Vec::new());
        assert_eq!(first, vec![mv(1.0, 1.0), PathDone]);
        assert!(simplifier.sink().is_empty());
        simplifier.sink_mut().push(PathDone);
        assert_eq!(simplifier.into_inner(), vec![PathDone]);
    }

    #[test]
    fn chains_through_mut_ref() {
        let mut out = Vec::new();
        {
            let mut simplifier = PathSimplifier::new(&mut out);
            simplifier.move_to(0.0, 0.0);
            simplifier.line_to(1.0, 1.0);
            simplifier.path_done();
        }
        assert_eq!(out, vec![mv(0.0, 0.0), ln(1.0, 1.0), PathDone]);
    }

    #[test]
    fn slope_signs() {
        assert_eq!(slope(0.0, 0.0, 1.0, 0.0), f32::INFINITY);
        assert_eq!(slope(0.0, 0.0, -1.0, 0.0), f32::NEG_INFINITY);
        assert_eq!(slope(0.0, 0.0, 0.0, 0.0), f32::NEG_INFINITY);
        assert_eq!(slope(0.0, 0.0, 2.0, 4.0), 0.5);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn event() -> impl Strategy<Value = PathEvent> {
            let coord = -100i16..100;
            prop_oneof![
                (coord.clone(), coord.clone()).prop_map(|(x, y)| mv(x as f32, y as f32)),
                (coord.clone(), coord.clone()).prop_map(|(x, y)| ln(x as f32, y as f32)),
                (coord.clone(), coord.clone()).prop_map(|(x, y)| ln(x as f32, y as f32)),
                (coord.clone(), coord.clone(), coord.clone(), coord.clone()).prop_map(
                    |(a, b, c, d)| QuadTo {
                        x1: a as f32,
                        y1: b as f32,
                        x2: c as f32,
                        y2: d as f32,
                    }
                ),
                Just(ClosePath),
            ]
        }

        proptest! {
            #[test]
            fn non_line_events_pass_through_in_order(
                events in proptest::collection::vec(event(), 0..40),
            ) {
                let mut input = events.clone();
                input.push(PathDone);
                let (out, stats) = run(&input);

                let keep = |e: &&PathEvent| !matches!(e, LineTo { .. });
                let expected: Vec<_> = input.iter().filter(keep).collect();
                let actual: Vec<_> = out.iter().filter(keep).collect();
                prop_assert_eq!(expected, actual);

                let lines_out = out.iter().filter(|e| matches!(e, LineTo { .. })).count();
                prop_assert_eq!(stats.lines_out as usize, lines_out);
                prop_assert!(stats.lines_out <= stats.lines_in);
            }

            #[test]
            fn every_subpath_ends_where_the_input_does(
                events in proptest::collection::vec(event(), 0..40),
            ) {
                let mut input = events.clone();
                input.push(PathDone);
                let (out, _) = run(&input);
                let last = |seq: &[PathEvent]| seq.iter().rev().find_map(PathEvent::end_point);
                prop_assert_eq!(last(&input), last(&out));
            }
        }
    }
}
