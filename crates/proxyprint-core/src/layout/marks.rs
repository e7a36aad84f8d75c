//! Registration marks and their expansion into stroked line segments.
//!
//! A mark is a pair of perpendicular arms meeting at a point. Each arm is
//! stroked twice with a `[1, 1]` dash: once white at phase 0 and once black
//! at phase 1, so the mark stays visible on both light and dark card art.

/// Full cross arm length in points.
pub const CROSS_ARM: f64 = 6.0;

/// Stroke width of every mark, in points.
pub const MARK_LINE_WIDTH: f64 = 1.0;

/// Dash pattern shared by every mark: one point on, one point off.
pub const MARK_DASH: [f64; 2] = [1.0, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeColor {
    White,
    Black,
}

impl StrokeColor {
    /// RGB components in `0.0..=1.0`.
    pub fn rgb(self) -> [f64; 3] {
        match self {
            StrokeColor::White => [1.0, 1.0, 1.0],
            StrokeColor::Black => [0.0, 0.0, 0.0],
        }
    }
}

/// One dashed line as handed to a page canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub color: StrokeColor,
    pub dash: [f64; 2],
    pub phase: f64,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mark {
    /// Arms of length `arm` extending both ways from `(x, y)`.
    Cross { x: f64, y: f64, arm: f64 },
    /// Arms of length `arm` extending from `(x, y)` only towards `dx` and
    /// `dy` (each `1.0` or `-1.0`).
    HalfCross {
        x: f64,
        y: f64,
        arm: f64,
        dx: f64,
        dy: f64,
    },
}

impl Mark {
    pub fn cross(x: f64, y: f64) -> Self {
        Mark::Cross {
            x,
            y,
            arm: CROSS_ARM,
        }
    }

    /// The four outward-facing half crosses at the corners of a rectangle.
    pub fn corner_marks(left: f64, bottom: f64, right: f64, top: f64, arm: f64) -> [Mark; 4] {
        [
            Mark::HalfCross {
                x: left,
                y: bottom,
                arm,
                dx: -1.0,
                dy: -1.0,
            },
            Mark::HalfCross {
                x: right,
                y: bottom,
                arm,
                dx: 1.0,
                dy: -1.0,
            },
            Mark::HalfCross {
                x: left,
                y: top,
                arm,
                dx: -1.0,
                dy: 1.0,
            },
            Mark::HalfCross {
                x: right,
                y: top,
                arm,
                dx: 1.0,
                dy: 1.0,
            },
        ]
    }

    /// `(horizontal, vertical)` arms as `(x0, y0, x1, y1)`.
    fn arms(&self) -> ([f64; 4], [f64; 4]) {
        match *self {
            Mark::Cross { x, y, arm } => (
                [x - arm, y, x + arm, y],
                [x, y - arm, x, y + arm],
            ),
            Mark::HalfCross { x, y, arm, dx, dy } => (
                [x, y, x + dx * arm, y],
                [x, y, x, y + dy * arm],
            ),
        }
    }

    /// Stroke order: vertical white, horizontal black at phase 0, then
    /// horizontal white, vertical black at phase 1.
    pub fn segments(&self) -> [LineSegment; 4] {
        let (horizontal, vertical) = self.arms();
        let stroke = |[x0, y0, x1, y1]: [f64; 4], color, phase| LineSegment {
            x0,
            y0,
            x1,
            y1,
            color,
            dash: MARK_DASH,
            phase,
            width: MARK_LINE_WIDTH,
        };
        [
            stroke(vertical, StrokeColor::White, 0.0),
            stroke(horizontal, StrokeColor::Black, 0.0),
            stroke(horizontal, StrokeColor::White, MARK_LINE_WIDTH),
            stroke(vertical, StrokeColor::Black, MARK_LINE_WIDTH),
        ]
    }
}
