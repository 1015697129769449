//! Segment against rectangle boundary crossings.

use super::{EPSILON, SelectionRect};
use kurbo::Point;

/// A crossing of a segment with a rectangle edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Parameter along the segment, in `[0, 1]`.
    pub t: f64,
    /// Crossing point.
    pub point: Point,
}

/// Compute where the segment `p1 -> p2` crosses the edges of `rect`.
///
/// Results are sorted by `t` and crossings closer than [`EPSILON`] in `t` are merged,
/// so a segment passing exactly through a corner yields one crossing there.
pub fn compute_intersections(p1: Point, p2: Point, rect: &SelectionRect) -> Vec<Intersection> {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let mut hits = Vec::with_capacity(4);

    if dx.abs() > f64::EPSILON {
        for edge_x in [rect.min_x(), rect.max_x()] {
            let t = (edge_x - p1.x) / dx;
            if (0.0..=1.0).contains(&t) {
                let y = p1.y + t * dy;
                if y >= rect.min_y() && y <= rect.max_y() {
                    hits.push(Intersection {
                        t,
                        point: Point::new(edge_x, y),
                    });
                }
            }
        }
    }

    if dy.abs() > f64::EPSILON {
        for edge_y in [rect.min_y(), rect.max_y()] {
            let t = (edge_y - p1.y) / dy;
            if (0.0..=1.0).contains(&t) {
                let x = p1.x + t * dx;
                if x >= rect.min_x() && x <= rect.max_x() {
                    hits.push(Intersection {
                        t,
                        point: Point::new(x, edge_y),
                    });
                }
            }
        }
    }

    hits.sort_by(|a, b| a.t.total_cmp(&b.t));
    hits.dedup_by(|later, earlier| (later.t - earlier.t).abs() < EPSILON);
    hits
}
