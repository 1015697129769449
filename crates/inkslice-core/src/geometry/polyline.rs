//! Splitting open polylines against a rectangle.

use super::{EPSILON, SelectionRect, compute_intersections, points_coincide};
use kurbo::Point;

/// Runs of the polyline lying outside `rect`, split at the boundary crossings.
pub fn get_outside_segments(points: &[Point], rect: &SelectionRect) -> Vec<Vec<Point>> {
    split_polyline(points, rect)
        .into_iter()
        .filter(|(inside, _)| !inside)
        .map(|(_, run)| run)
        .collect()
}

/// Runs of the polyline lying inside `rect` (boundary inclusive), split at the crossings.
pub fn get_inside_segments(points: &[Point], rect: &SelectionRect) -> Vec<Vec<Point>> {
    split_polyline(points, rect)
        .into_iter()
        .filter(|(inside, _)| *inside)
        .map(|(_, run)| run)
        .collect()
}

/// Walk the polyline, cutting every segment at its crossings and classifying each
/// piece by its midpoint. Consecutive pieces on the same side are merged into a run.
fn split_polyline(points: &[Point], rect: &SelectionRect) -> Vec<(bool, Vec<Point>)> {
    let mut runs = Vec::new();
    if points.len() < 2 {
        return runs;
    }
    if rect.is_degenerate() {
        runs.push((false, points.to_vec()));
        return runs;
    }

    let mut current: Vec<Point> = Vec::new();
    let mut current_inside: Option<bool> = None;

    for window in points.windows(2) {
        let (start, end) = (window[0], window[1]);

        let mut stops = Vec::with_capacity(4);
        stops.push(start);
        stops.extend(
            compute_intersections(start, end, rect)
                .into_iter()
                .filter(|hit| hit.t > EPSILON && hit.t < 1.0 - EPSILON)
                .map(|hit| hit.point),
        );
        stops.push(end);

        for piece in stops.windows(2) {
            let (a, b) = (piece[0], piece[1]);
            if points_coincide(a, b) {
                // Repeated samples still belong to the run they sit in.
                if !current.is_empty() {
                    current.push(b);
                }
                continue;
            }

            let inside = rect.contains(a.midpoint(b));
            if current_inside != Some(inside) {
                flush_run(&mut runs, current_inside, &mut current);
                current_inside = Some(inside);
                current.push(a);
            }
            current.push(b);
        }
    }
    flush_run(&mut runs, current_inside, &mut current);

    runs
}

fn flush_run(runs: &mut Vec<(bool, Vec<Point>)>, inside: Option<bool>, current: &mut Vec<Point>) {
    let run = std::mem::take(current);
    if let Some(inside) = inside {
        if run.len() >= 2 {
            runs.push((inside, run));
        }
    }
}
