//! Committed shape geometry.

use super::{Outline, bounds_of};
use crate::geometry::{Point, Vec2};
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_3, TAU};

/// Geometry of a committed shape, one variant per shape kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeGeometry {
    Circle { center: Point, radius: f64 },
    Rectangle { origin: Point, width: f64, height: f64 },
    /// Regular hexagon with a vertex at angle zero.
    Hexagon { center: Point, radius: f64 },
    Line { start: Point, end: Point },
    /// Arbitrary, possibly non-convex ring (also the result of clipping).
    Polygon { points: Vec<Point> },
}

impl ShapeGeometry {
    /// Create a rectangle from two corner points.
    pub fn rectangle_from_corners(p1: Point, p2: Point) -> Self {
        ShapeGeometry::Rectangle {
            origin: Point::new(p1.x.min(p2.x), p1.y.min(p2.y)),
            width: (p2.x - p1.x).abs(),
            height: (p2.y - p1.y).abs(),
        }
    }

    /// Whether the shape is convex by construction.
    pub fn is_convex(&self) -> bool {
        matches!(
            self,
            ShapeGeometry::Circle { .. } | ShapeGeometry::Rectangle { .. } | ShapeGeometry::Hexagon { .. }
        )
    }

    /// Polyline/polygon approximation. Circles use `circle_segments` vertices.
    pub fn outline(&self, circle_segments: usize) -> Outline {
        match self {
            ShapeGeometry::Circle { center, radius } => {
                Outline::Closed(regular_polygon(*center, *radius, circle_segments.max(3)))
            }
            ShapeGeometry::Hexagon { center, radius } => Outline::Closed(regular_polygon(*center, *radius, 6)),
            ShapeGeometry::Rectangle { origin, width, height } => Outline::Closed(vec![
                *origin,
                Point::new(origin.x + width, origin.y),
                Point::new(origin.x + width, origin.y + height),
                Point::new(origin.x, origin.y + height),
            ]),
            ShapeGeometry::Line { start, end } => Outline::Open(vec![*start, *end]),
            ShapeGeometry::Polygon { points } => Outline::Closed(points.clone()),
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            ShapeGeometry::Circle { center, radius } | ShapeGeometry::Hexagon { center, radius } => {
                Rect::new(center.x - radius, center.y - radius, center.x + radius, center.y + radius)
            }
            ShapeGeometry::Rectangle { origin, width, height } => {
                Rect::new(origin.x, origin.y, origin.x + width, origin.y + height)
            }
            ShapeGeometry::Line { start, end } => Rect::from_points(*start, *end),
            ShapeGeometry::Polygon { points } => bounds_of(points).unwrap_or(Rect::ZERO),
        }
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        match self {
            ShapeGeometry::Circle { center, radius } => ShapeGeometry::Circle {
                center: *center + offset,
                radius: *radius,
            },
            ShapeGeometry::Rectangle { origin, width, height } => ShapeGeometry::Rectangle {
                origin: *origin + offset,
                width: *width,
                height: *height,
            },
            ShapeGeometry::Hexagon { center, radius } => ShapeGeometry::Hexagon {
                center: *center + offset,
                radius: *radius,
            },
            ShapeGeometry::Line { start, end } => ShapeGeometry::Line {
                start: *start + offset,
                end: *end + offset,
            },
            ShapeGeometry::Polygon { points } => ShapeGeometry::Polygon {
                points: points.iter().map(|p| *p + offset).collect(),
            },
        }
    }
}

fn regular_polygon(center: Point, radius: f64, sides: usize) -> Vec<Point> {
    let step = if sides == 6 { FRAC_PI_3 } else { TAU / sides as f64 };
    (0..sides)
        .map(|i| {
            let angle = step * i as f64;
            Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect()
}
