//! Geometry kernel: segment/rectangle intersection, polyline splitting and polygon clipping.

mod intersect;
mod polygon;
mod polyline;

pub use intersect::{Intersection, compute_intersections};
pub use polygon::{
    ClipEdge, clip_polygon_edge, clip_polygon_inside, clip_polygon_outside,
    ensure_closed_polygon, get_inside_polygon, polygon_area,
};
pub use polyline::{get_inside_segments, get_outside_segments};

pub use kurbo::{Point, Vec2};

use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Tolerance used for parameter deduplication and ring closure.
pub const EPSILON: f64 = 1e-6;

/// An axis-aligned selection rectangle with non-negative dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SelectionRect {
    /// Create a rectangle; negative dimensions are clamped to zero.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Create a rectangle from two drag corners in any order.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        Self::new(
            p1.x.min(p2.x),
            p1.y.min(p2.y),
            (p2.x - p1.x).abs(),
            (p2.y - p1.y).abs(),
        )
    }

    pub fn min_x(&self) -> f64 {
        self.x
    }

    pub fn min_y(&self) -> f64 {
        self.y
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Area of the rectangle.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// A rectangle with no area selects nothing.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Boundary-inclusive containment test.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x()
            && point.x <= self.max_x()
            && point.y >= self.min_y()
            && point.y <= self.max_y()
    }

    /// Corners in clockwise order starting at the top-left (y grows downwards).
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x(), self.min_y()),
            Point::new(self.max_x(), self.min_y()),
            Point::new(self.max_x(), self.max_y()),
            Point::new(self.min_x(), self.max_y()),
        ]
    }

    /// Convert to a kurbo rectangle.
    pub fn as_rect(&self) -> Rect {
        Rect::new(self.min_x(), self.min_y(), self.max_x(), self.max_y())
    }
}

impl From<Rect> for SelectionRect {
    fn from(rect: Rect) -> Self {
        let rect = rect.abs();
        Self::new(rect.x0, rect.y0, rect.width(), rect.height())
    }
}

/// Approximate point equality within [`EPSILON`] on both axes.
pub fn points_coincide(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() <= EPSILON && (a.y - b.y).abs() <= EPSILON
}
