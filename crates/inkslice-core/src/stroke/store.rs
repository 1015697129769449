//! The active working set of strokes.

use super::{Stroke, StrokeId};
use std::collections::HashMap;

/// Strokes currently on the canvas, keyed by id.
///
/// There is no in-place update: replacing a stroke is always a remove followed by an
/// add. Paint order comes from [`Stroke::order`], then `created_at`, then id.
#[derive(Debug, Clone, Default)]
pub struct StrokeStore {
    strokes: HashMap<StrokeId, Stroke>,
}

impl StrokeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a stroke. A stroke with the same id is replaced wholesale.
    pub fn add(&mut self, stroke: Stroke) {
        self.strokes.insert(stroke.id, stroke);
    }

    /// Remove a stroke by id.
    pub fn remove_by_id(&mut self, id: StrokeId) -> Option<Stroke> {
        self.strokes.remove(&id)
    }

    /// All strokes in paint order.
    pub fn all(&self) -> Vec<&Stroke> {
        let mut strokes: Vec<&Stroke> = self.strokes.values().collect();
        strokes.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        strokes
    }

    /// Ids in paint order.
    pub fn ids(&self) -> Vec<StrokeId> {
        self.all().into_iter().map(|s| s.id).collect()
    }

    pub fn get(&self, id: StrokeId) -> Option<&Stroke> {
        self.strokes.get(&id)
    }

    pub fn contains(&self, id: StrokeId) -> bool {
        self.strokes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
    }

    /// One past the highest paint order in the store.
    pub fn next_order(&self) -> u64 {
        self.strokes
            .values()
            .map(|s| s.order + 1)
            .max()
            .unwrap_or(0)
    }
}
