//! Clipboard and paste placement.

use crate::error::{EngineError, EngineResult};
use crate::geometry::Point;
use crate::stroke::{Stroke, now_millis};
use uuid::Uuid;

/// Strokes lifted by the last cut, ready to be pasted.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    strokes: Vec<Stroke>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the clipboard contents.
    pub fn set(&mut self, strokes: Vec<Stroke>) {
        self.strokes = strokes;
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
    }
}

/// Place a copy of `clipboard` with its top-left corner at `drop_point`.
///
/// Every pasted stroke gets a fresh id, the pasting author, a new timestamp and a
/// consecutive paint order starting at `base_order`.
pub fn paste(
    clipboard: &[Stroke],
    drop_point: Point,
    author_id: &str,
    base_order: u64,
) -> EngineResult<Vec<Stroke>> {
    let drawable: Vec<&Stroke> = clipboard.iter().filter(|s| s.is_drawable()).collect();

    let min = drawable
        .iter()
        .filter_map(|s| s.bounds())
        .map(|b| Point::new(b.x0, b.y0))
        .reduce(|a, b| Point::new(a.x.min(b.x), a.y.min(b.y)))
        .ok_or(EngineError::InvalidPasteTarget)?;

    let offset = drop_point - min;
    let created_at = now_millis();

    Ok(drawable
        .into_iter()
        .enumerate()
        .map(|(i, source)| Stroke {
            id: Uuid::new_v4(),
            path_data: source.translated_path(offset),
            created_at,
            author_id: author_id.to_string(),
            order: base_order + i as u64,
            ..source.clone()
        })
        .collect())
}
