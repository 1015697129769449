//! Cutting strokes against a selection rectangle.

use crate::config::EngineConfig;
use crate::geometry::{
    Point, SelectionRect, clip_polygon_inside, clip_polygon_outside, ensure_closed_polygon,
    get_inside_polygon, get_inside_segments, get_outside_segments, points_coincide, polygon_area,
};
use crate::stroke::{
    BrushStyle, Outline, PathData, ShapeGeometry, Stroke, StrokeId, StrokeStore, now_millis,
};
use std::collections::HashMap;
use uuid::Uuid;

/// Everything a single cut produces.
#[derive(Debug, Clone, Default)]
pub struct CutOutcome {
    /// The working set after the cut, minus the cut record and erase strokes.
    pub surviving_strokes: Vec<Stroke>,
    /// Clipboard candidates: every inside run of an open path, the largest inside piece
    /// of a closed shape.
    pub inside_strokes: Vec<Stroke>,
    /// Background strokes covering the inside footprint of every affected stroke.
    pub erase_strokes: Vec<Stroke>,
    /// Marker recording the rect and every affected id; `None` when nothing was cut.
    pub cut_record: Option<Stroke>,
    /// The untouched originals, for restoration on undo.
    pub affected_originals: Vec<Stroke>,
    /// Outside pieces replacing each affected original.
    pub replacement_segments: HashMap<StrokeId, Vec<Stroke>>,
}

impl CutOutcome {
    /// True when the cut touched nothing.
    pub fn is_empty(&self) -> bool {
        self.affected_originals.is_empty()
    }

    /// Replacement strokes in paint order of their originals.
    pub fn replacements(&self) -> impl Iterator<Item = &Stroke> {
        self.affected_originals
            .iter()
            .filter_map(|original| self.replacement_segments.get(&original.id))
            .flatten()
    }

    /// Number of remote appends needed to persist this cut.
    pub fn remote_append_count(&self) -> usize {
        match self.cut_record {
            Some(_) => 1 + self.erase_strokes.len(),
            None => 0,
        }
    }
}

/// How one affected stroke comes apart.
#[derive(Debug, Default)]
struct StrokeSplit {
    outside: Vec<Stroke>,
    inside: Vec<Stroke>,
    erase: Vec<Stroke>,
}

/// Cut every stroke in `store` against `rect`.
///
/// The store itself is not modified; the caller applies the outcome.
pub fn cut(store: &StrokeStore, rect: SelectionRect, author_id: &str, config: &EngineConfig) -> CutOutcome {
    let strokes = store.all();
    let mut outcome = CutOutcome::default();

    if rect.is_degenerate() {
        outcome.surviving_strokes = strokes.into_iter().cloned().collect();
        return outcome;
    }

    let cut_id = Uuid::new_v4();
    let mut erase = Vec::new();

    for stroke in strokes {
        let Some(split) = split_stroke(stroke, &rect, cut_id, author_id, config) else {
            outcome.surviving_strokes.push(stroke.clone());
            continue;
        };

        outcome.surviving_strokes.extend(split.outside.iter().cloned());
        outcome.replacement_segments.insert(stroke.id, split.outside);
        outcome.inside_strokes.extend(split.inside);
        erase.extend(split.erase);
        outcome.affected_originals.push(stroke.clone());
    }

    if outcome.affected_originals.is_empty() {
        return outcome;
    }

    let base_order = store.next_order();
    let record = Stroke {
        id: cut_id,
        order: base_order,
        ..Stroke::new(
            author_id,
            PathData::Cut {
                rect,
                original_stroke_ids: outcome.affected_originals.iter().map(|s| s.id).collect(),
            },
        )
    };
    outcome.erase_strokes = erase
        .into_iter()
        .enumerate()
        .map(|(i, stroke)| stroke.with_order(base_order + 1 + i as u64))
        .collect();

    log::debug!(
        "cut {} affected {} stroke(s), {} erase stroke(s)",
        cut_id,
        outcome.affected_originals.len(),
        outcome.erase_strokes.len()
    );
    outcome.cut_record = Some(record);
    outcome
}

/// Re-apply a cut record to the strokes still in `store`.
///
/// Replacement ids derive from the record id, so replaying the remote log reproduces
/// the ids the original cut produced. Returns the number of strokes replaced.
pub fn replay_cut(store: &mut StrokeStore, record: &Stroke, config: &EngineConfig) -> usize {
    let PathData::Cut { rect, original_stroke_ids } = &record.path_data else {
        return 0;
    };

    let mut replaced = 0;
    for id in original_stroke_ids {
        let Some(original) = store.get(*id).cloned() else {
            continue;
        };
        if let Some(split) = split_stroke(&original, rect, record.id, &record.author_id, config) {
            store.remove_by_id(original.id);
            for piece in split.outside {
                store.add(piece);
            }
            replaced += 1;
        }
    }
    store.add(record.clone());
    replaced
}

fn split_stroke(
    stroke: &Stroke,
    rect: &SelectionRect,
    cut_id: Uuid,
    author_id: &str,
    config: &EngineConfig,
) -> Option<StrokeSplit> {
    if stroke.is_eraser() {
        return None;
    }
    let outline = stroke.outline(config.circle_segments)?;
    // Strokes enclosing the rect without a vertex inside it are not detected.
    if !outline.points().iter().any(|p| rect.contains(*p)) {
        return None;
    }

    let split = match outline {
        Outline::Open(points) => split_open(stroke, &points, rect, cut_id, author_id, config),
        Outline::Closed(ring) => split_closed(stroke, &ring, rect, cut_id, author_id, config),
    };
    Some(split)
}

fn split_open(
    stroke: &Stroke,
    points: &[Point],
    rect: &SelectionRect,
    cut_id: Uuid,
    author_id: &str,
    config: &EngineConfig,
) -> StrokeSplit {
    // A dot has no segment to split; the caller already found it inside.
    if points.iter().all(|p| points_coincide(*p, points[0])) {
        return StrokeSplit {
            outside: Vec::new(),
            inside: vec![clipboard_stroke(stroke, stroke.path_data.clone(), author_id)],
            erase: vec![erase_stroke(
                author_id,
                PathData::Freehand { points: points.to_vec() },
                stroke.line_width + config.erase_padding,
                config,
            )],
        };
    }

    let outside = get_outside_segments(points, rect)
        .into_iter()
        .enumerate()
        .map(|(i, run)| replacement(stroke, open_path(stroke, run), cut_id, i))
        .collect();

    let inside_runs = get_inside_segments(points, rect);
    let erase = inside_runs
        .iter()
        .map(|run| {
            erase_stroke(
                author_id,
                PathData::Freehand { points: run.clone() },
                stroke.line_width + config.erase_padding,
                config,
            )
        })
        .collect();
    let inside = inside_runs
        .into_iter()
        .map(|run| clipboard_stroke(stroke, open_path(stroke, run), author_id))
        .collect();

    StrokeSplit { outside, inside, erase }
}

fn split_closed(
    stroke: &Stroke,
    ring: &[Point],
    rect: &SelectionRect,
    cut_id: Uuid,
    author_id: &str,
    config: &EngineConfig,
) -> StrokeSplit {
    let PathData::Shape { geometry, fill } = &stroke.path_data else {
        return StrokeSplit::default();
    };
    let ring = ensure_closed_polygon(ring);

    if ring.iter().all(|p| rect.contains(*p)) {
        // Wholly selected: keep the exact geometry instead of its approximation.
        return StrokeSplit {
            outside: Vec::new(),
            inside: vec![clipboard_stroke(stroke, stroke.path_data.clone(), author_id)],
            erase: vec![shape_erase(stroke, geometry.clone(), fill.is_some(), author_id, config)],
        };
    }

    let inside_pieces = if geometry.is_convex() {
        let piece = get_inside_polygon(&ring, rect);
        if piece.is_empty() { Vec::new() } else { vec![piece] }
    } else {
        clip_polygon_inside(&ring, rect)
    };
    let outside_pieces = clip_polygon_outside(&ring, rect);

    let outside = outside_pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| {
            let path = PathData::Shape {
                geometry: ShapeGeometry::Polygon { points: piece },
                fill: *fill,
            };
            replacement(stroke, path, cut_id, i)
        })
        .collect();

    let erase = inside_pieces
        .iter()
        .map(|piece| {
            shape_erase(
                stroke,
                ShapeGeometry::Polygon { points: piece.clone() },
                fill.is_some(),
                author_id,
                config,
            )
        })
        .collect();

    // Largest piece wins; the first one found wins a tie.
    let inside = inside_pieces
        .into_iter()
        .fold(None::<(f64, Vec<Point>)>, |best, piece| {
            let area = polygon_area(&piece);
            match best {
                Some((best_area, _)) if best_area >= area => best,
                _ => Some((area, piece)),
            }
        })
        .map(|(_, piece)| {
            let path = PathData::Shape {
                geometry: ShapeGeometry::Polygon { points: piece },
                fill: *fill,
            };
            clipboard_stroke(stroke, path, author_id)
        })
        .into_iter()
        .collect();

    StrokeSplit { outside, inside, erase }
}

/// Lines stay lines when a piece is a single segment.
fn open_path(stroke: &Stroke, run: Vec<Point>) -> PathData {
    match (&stroke.path_data, run.as_slice()) {
        (PathData::Shape { fill, .. }, &[start, end]) => PathData::Shape {
            geometry: ShapeGeometry::Line { start, end },
            fill: *fill,
        },
        _ => PathData::Freehand { points: run },
    }
}

/// An outside piece standing in for `original`, keeping its style, author and order.
fn replacement(original: &Stroke, path_data: PathData, cut_id: Uuid, index: usize) -> Stroke {
    let name = format!("{}:{}", original.id, index);
    Stroke {
        id: Uuid::new_v5(&cut_id, name.as_bytes()),
        path_data,
        ..original.clone()
    }
}

fn clipboard_stroke(original: &Stroke, path_data: PathData, author_id: &str) -> Stroke {
    Stroke {
        id: Uuid::new_v4(),
        path_data,
        created_at: now_millis(),
        author_id: author_id.to_string(),
        ..original.clone()
    }
}

fn shape_erase(
    original: &Stroke,
    geometry: ShapeGeometry,
    filled: bool,
    author_id: &str,
    config: &EngineConfig,
) -> Stroke {
    let fill = filled.then_some(config.background_color);
    erase_stroke(author_id, PathData::Shape { geometry, fill }, original.line_width, config)
}

fn erase_stroke(author_id: &str, path_data: PathData, line_width: f64, config: &EngineConfig) -> Stroke {
    Stroke::new(author_id, path_data)
        .with_color(config.background_color)
        .with_line_width(line_width)
        .with_brush(BrushStyle::Eraser)
}
