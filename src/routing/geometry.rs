use serde::{Deserialize, Serialize};

pub type Point = (f32, f32);

const EPSILON: f32 = 1e-6;
/// Relative tolerance for treating three points as one straight run.
const COLLINEAR_TOLERANCE: f32 = 1e-4;

/// Axis-aligned rectangle, always normalised so `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }

    /// Closed containment: points on the border count as inside.
    pub fn contains(&self, point: Point) -> bool {
        point.0 >= self.x0 && point.0 <= self.x1 && point.1 >= self.y0 && point.1 <= self.y1
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x0 >= self.x0 && other.x1 <= self.x1 && other.y0 >= self.y0 && other.y1 <= self.y1
    }

    pub fn outset(&self, left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self::new(self.x0 - left, self.y0 - top, self.x1 + right, self.y1 + bottom)
    }
}

/// Outcome of clipping a segment against a rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Clip {
    Outside,
    /// The part of the segment inside the rectangle, ordered like the input.
    Inside { start: Point, end: Point },
}

impl Clip {
    pub fn is_inside(&self) -> bool {
        matches!(self, Clip::Inside { .. })
    }

    pub fn length(&self) -> f32 {
        match self {
            Clip::Outside => 0.0,
            Clip::Inside { start, end } => distance(*start, *end),
        }
    }
}

/// Liang–Barsky clipping of segment `a → b` against the closed rectangle.
///
/// A zero-length segment is inside iff the point lies within the rectangle,
/// which is what catches wire endpoints sitting inside an obstacle.
pub fn clip_segment(a: Point, b: Point, rect: &Rect) -> Clip {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    if dx.abs() < EPSILON && dy.abs() < EPSILON {
        return if rect.contains(a) {
            Clip::Inside { start: a, end: a }
        } else {
            Clip::Outside
        };
    }

    let mut t_enter = 0.0f32;
    let mut t_leave = 1.0f32;
    let edges = [
        (-dx, a.0 - rect.x0),
        (dx, rect.x1 - a.0),
        (-dy, a.1 - rect.y0),
        (dy, rect.y1 - a.1),
    ];
    for (p, q) in edges {
        if p.abs() < EPSILON {
            // Parallel to this edge: reject when entirely on its outer side.
            if q < 0.0 {
                return Clip::Outside;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > t_leave {
                return Clip::Outside;
            }
            t_enter = t_enter.max(t);
        } else {
            if t < t_enter {
                return Clip::Outside;
            }
            t_leave = t_leave.min(t);
        }
    }

    Clip::Inside {
        start: (a.0 + t_enter * dx, a.1 + t_enter * dy),
        end: (a.0 + t_leave * dx, a.1 + t_leave * dy),
    }
}

/// True when some segment of the path runs through the rectangle for a
/// positive length. Grazing a corner or a single touching point does not count.
pub fn path_enters(points: &[Point], rect: &Rect) -> bool {
    points
        .windows(2)
        .any(|segment| clip_segment(segment[0], segment[1], rect).length() > 1e-3)
}

pub fn distance(a: Point, b: Point) -> f32 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    (dx * dx + dy * dy).sqrt()
}

pub(crate) fn same_point(a: Point, b: Point) -> bool {
    (a.0 - b.0).abs() <= 1e-4 && (a.1 - b.1).abs() <= 1e-4
}

fn runs_straight_through(prev: Point, curr: Point, next: Point) -> bool {
    let d1 = (curr.0 - prev.0, curr.1 - prev.1);
    let d2 = (next.0 - curr.0, next.1 - curr.1);
    let len = distance(prev, curr) * distance(curr, next);
    if len <= EPSILON {
        return false;
    }
    let cross = d1.0 * d2.1 - d1.1 * d2.0;
    let dot = d1.0 * d2.0 + d1.1 * d2.1;
    (cross / len).abs() <= COLLINEAR_TOLERANCE && dot > 0.0
}

/// Drop repeated points and interior points that continue a straight run.
/// Never shrinks a non-empty path below two points.
pub fn compress_path(points: &[Point]) -> Vec<Point> {
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &point in points {
        if out.last().is_some_and(|&prev| same_point(prev, point)) {
            continue;
        }
        while out.len() >= 2 && runs_straight_through(out[out.len() - 2], out[out.len() - 1], point) {
            out.pop();
        }
        out.push(point);
    }
    if out.len() < 2 {
        return vec![first, last];
    }
    out
}

pub fn path_length(points: &[Point]) -> f32 {
    points
        .windows(2)
        .map(|segment| distance(segment[0], segment[1]))
        .sum()
}

/// Interior points where the direction changes. Zero-length segments are
/// ignored, so a repeated point is not a bend.
pub fn path_bend_count(points: &[Point]) -> usize {
    points
        .windows(3)
        .filter(|w| {
            let inbound = (w[1].0 - w[0].0, w[1].1 - w[0].1);
            let outbound = (w[2].0 - w[1].0, w[2].1 - w[1].1);
            let stalled = |d: (f32, f32)| d.0.abs() <= 1e-4 && d.1.abs() <= 1e-4;
            !stalled(inbound)
                && !stalled(outbound)
                && (inbound.0 * outbound.1 - inbound.1 * outbound.0).abs() > 1e-4
        })
        .count()
}
