//! Polygon clipping against a rectangle.
//!
//! Convex rings are clipped with Sutherland–Hodgman, one half-plane per pass. The
//! outside of a rectangle is not convex, so the difference (and the intersection of
//! possibly non-convex rings) goes through `geo`'s boolean operations.

use super::{EPSILON, SelectionRect, points_coincide};
use geo::{Area, BooleanOps, Coord, LineString, Polygon};
use kurbo::Point;

/// A single half-plane bounding the selection rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipEdge {
    Left,
    Right,
    Top,
    Bottom,
}

impl ClipEdge {
    /// The order in which [`get_inside_polygon`] applies the passes.
    pub const ALL: [ClipEdge; 4] = [ClipEdge::Left, ClipEdge::Right, ClipEdge::Top, ClipEdge::Bottom];

    fn keeps(self, point: Point, rect: &SelectionRect) -> bool {
        match self {
            ClipEdge::Left => point.x >= rect.min_x(),
            ClipEdge::Right => point.x <= rect.max_x(),
            ClipEdge::Top => point.y >= rect.min_y(),
            ClipEdge::Bottom => point.y <= rect.max_y(),
        }
    }

    fn crossing(self, a: Point, b: Point, rect: &SelectionRect) -> Point {
        match self {
            ClipEdge::Left | ClipEdge::Right => {
                let x = if self == ClipEdge::Left { rect.min_x() } else { rect.max_x() };
                let t = (x - a.x) / (b.x - a.x);
                Point::new(x, a.y + t * (b.y - a.y))
            }
            ClipEdge::Top | ClipEdge::Bottom => {
                let y = if self == ClipEdge::Top { rect.min_y() } else { rect.max_y() };
                let t = (y - a.y) / (b.y - a.y);
                Point::new(a.x + t * (b.x - a.x), y)
            }
        }
    }
}

/// Close the ring by appending its first point when the ends differ.
pub fn ensure_closed_polygon(points: &[Point]) -> Vec<Point> {
    let mut ring = points.to_vec();
    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        if !points_coincide(first, last) {
            ring.push(first);
        }
    }
    ring
}

/// One Sutherland–Hodgman pass of `polygon` against a single edge of `rect`.
///
/// The input may be open or closed; the output is an open ring.
pub fn clip_polygon_edge(polygon: &[Point], rect: &SelectionRect, edge: ClipEdge) -> Vec<Point> {
    let ring = open_ring(polygon);
    let mut output = Vec::with_capacity(ring.len() + 2);
    let Some(&last) = ring.last() else {
        return output;
    };

    let mut previous = last;
    for &current in ring {
        let current_in = edge.keeps(current, rect);
        let previous_in = edge.keeps(previous, rect);
        if current_in {
            if !previous_in {
                output.push(edge.crossing(previous, current, rect));
            }
            output.push(current);
        } else if previous_in {
            output.push(edge.crossing(previous, current, rect));
        }
        previous = current;
    }
    output
}

/// Intersection of a convex ring with `rect`, as a closed ring.
///
/// Returns an empty ring when fewer than three distinct points survive.
pub fn get_inside_polygon(polygon: &[Point], rect: &SelectionRect) -> Vec<Point> {
    if rect.is_degenerate() {
        return Vec::new();
    }
    let mut clipped = open_ring(polygon).to_vec();
    for edge in ClipEdge::ALL {
        if clipped.is_empty() {
            break;
        }
        clipped = clip_polygon_edge(&clipped, rect, edge);
    }
    finish_ring(clipped).unwrap_or_default()
}

/// Pieces of `polygon` inside `rect`, from a general boolean intersection.
pub fn clip_polygon_inside(polygon: &[Point], rect: &SelectionRect) -> Vec<Vec<Point>> {
    if rect.is_degenerate() {
        return Vec::new();
    }
    let subject = to_geo(polygon);
    let clip = rect_to_geo(rect);
    from_geo(subject.intersection(&clip))
}

/// Pieces of `polygon` outside `rect`, from a general boolean difference.
pub fn clip_polygon_outside(polygon: &[Point], rect: &SelectionRect) -> Vec<Vec<Point>> {
    if rect.is_degenerate() {
        return finish_ring(open_ring(polygon).to_vec()).into_iter().collect();
    }
    let subject = to_geo(polygon);
    let clip = rect_to_geo(rect);
    from_geo(subject.difference(&clip))
}

/// Absolute (shoelace) area of a ring, open or closed.
pub fn polygon_area(points: &[Point]) -> f64 {
    let ring = open_ring(points);
    if ring.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for (i, a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        twice_area += a.x * b.y - b.x * a.y;
    }
    (twice_area / 2.0).abs()
}

fn open_ring(points: &[Point]) -> &[Point] {
    match (points.first(), points.last()) {
        (Some(&first), Some(&last)) if points.len() > 1 && points_coincide(first, last) => {
            &points[..points.len() - 1]
        }
        _ => points,
    }
}

/// Drop consecutive duplicates and close the ring; `None` if it has no area left.
fn finish_ring(points: Vec<Point>) -> Option<Vec<Point>> {
    let mut ring: Vec<Point> = Vec::with_capacity(points.len() + 1);
    for point in points {
        if ring.last().is_none_or(|&prev| !points_coincide(prev, point)) {
            ring.push(point);
        }
    }
    let distinct = open_ring(&ring).len();
    if distinct < 3 || polygon_area(&ring) < EPSILON {
        return None;
    }
    Some(ensure_closed_polygon(&ring))
}

fn to_geo(points: &[Point]) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = ensure_closed_polygon(points)
        .into_iter()
        .map(|p| Coord { x: p.x, y: p.y })
        .collect();
    Polygon::new(LineString::new(coords), Vec::new())
}

fn rect_to_geo(rect: &SelectionRect) -> Polygon<f64> {
    let corners: Vec<Point> = rect.corners().to_vec();
    to_geo(&corners)
}

fn from_geo(pieces: geo::MultiPolygon<f64>) -> Vec<Vec<Point>> {
    pieces
        .into_iter()
        .filter(|piece| piece.unsigned_area() >= EPSILON)
        .filter_map(|piece| {
            if !piece.interiors().is_empty() {
                log::debug!("dropping {} interior ring(s) of clipped piece", piece.interiors().len());
            }
            let ring: Vec<Point> = piece
                .exterior()
                .coords()
                .map(|c| Point::new(c.x, c.y))
                .collect();
            finish_ring(ring)
        })
        .collect()
}
