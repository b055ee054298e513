//! The path-construction event interface.

/// Receiver of path-construction events.
///
/// Coordinates are in device space. Filters such as
/// [`PathSimplifier`](crate::PathSimplifier) implement this trait and
/// forward to a downstream sink, so stages chain by value or by `&mut`.
pub trait PathSink {
    /// Start a new subpath at `(x, y)`.
    fn move_to(&mut self, x: f32, y: f32);

    /// Straight segment from the current point to `(x, y)`.
    fn line_to(&mut self, x: f32, y: f32);

    /// Quadratic Bézier with control point `(x1, y1)` ending at `(x2, y2)`.
    fn quad_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32);

    /// Cubic Bézier with control points `(x1, y1)`, `(x2, y2)` ending at
    /// `(x3, y3)`.
    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32);

    /// Close the current subpath.
    fn close_path(&mut self);

    /// The path is complete.
    fn path_done(&mut self);
}

impl<S: PathSink + ?Sized> PathSink for &mut S {
    fn move_to(&mut self, x: f32, y: f32) {
        (**self).move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        (**self).line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        (**self).quad_to(x1, y1, x2, y2);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32) {
        (**self).curve_to(x1, y1, x2, y2, x3, y3);
    }

    fn close_path(&mut self) {
        (**self).close_path();
    }

    fn path_done(&mut self) {
        (**self).path_done();
    }
}

/// One recorded path-construction event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathEvent {
    /// See [`PathSink::move_to`].
    MoveTo {
        /// Target x.
        x: f32,
        /// Target y.
        y: f32,
    },
    /// See [`PathSink::line_to`].
    LineTo {
        /// Target x.
        x: f32,
        /// Target y.
        y: f32,
    },
    /// See [`PathSink::quad_to`].
    QuadTo {
        /// Control point x.
        x1: f32,
        /// Control point y.
        y1: f32,
        /// End point x.
        x2: f32,
        /// End point y.
        y2: f32,
    },
    /// See [`PathSink::curve_to`].
    CurveTo {
        /// First control point x.
        x1: f32,
        /// First control point y.
        y1: f32,
        /// Second control point x.
        x2: f32,
        /// Second control point y.
        y2: f32,
        /// End point x.
        x3: f32,
        /// End point y.
        y3: f32,
    },
    /// See [`PathSink::close_path`].
    ClosePath,
    /// See [`PathSink::path_done`].
    PathDone,
}

impl PathEvent {
    /// Deliver this event to `sink`.
    pub fn send_to<S: PathSink + ?Sized>(&self, sink: &mut S) {
        match *self {
            Self::MoveTo { x, y } => sink.move_to(x, y),
            Self::LineTo { x, y } => sink.line_to(x, y),
            Self::QuadTo { x1, y1, x2, y2 } => sink.quad_to(x1, y1, x2, y2),
            Self::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x3,
                y3,
            } => sink.curve_to(x1, y1, x2, y2, x3, y3),
            Self::ClosePath => sink.close_path(),
            Self::PathDone => sink.path_done(),
        }
    }

    /// Feed a recorded event sequence into `sink`.
    pub fn replay<'a, S, I>(events: I, sink: &mut S)
    where
        S: PathSink + ?Sized,
        I: IntoIterator<Item = &'a PathEvent>,
    {
        for event in events {
            event.send_to(sink);
        }
    }

    /// The point this event leaves the pen at, if any.
    pub fn end_point(&self) -> Option<(f32, f32)> {
        match *self {
            Self::MoveTo { x, y } | Self::LineTo { x, y } => Some((x, y)),
            Self::QuadTo { x2, y2, .. } => Some((x2, y2)),
            Self::CurveTo { x3, y3, .. } => Some((x3, y3)),
            Self::ClosePath | Self::PathDone => None,
        }
    }
}

/// Recording sink: appends every event.
impl PathSink for Vec<PathEvent> {
    fn move_to(&mut self, x: f32, y: f32) {
        self.push(PathEvent::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.push(PathEvent::LineTo { x, y });
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.push(PathEvent::QuadTo { x1, y1, x2, y2 });
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32) {
        self.push(PathEvent::CurveTo {
            x1,
            y1,
            x2,
            y2,
            x3,
            y3,
        });
    }

    fn close_path(&mut self) {
        self.push(PathEvent::ClosePath);
    }

    fn path_done(&mut self) {
        self.push(PathEvent::PathDone);
    }
}
