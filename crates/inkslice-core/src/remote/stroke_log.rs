//! Append-only stroke log with per-author single-step undo/redo.

use crate::error::{GatewayError, GatewayResult};
use crate::stroke::{Stroke, StrokeId};
use std::collections::HashMap;

/// One appended stroke. Its owner is tracked by the author chains.
#[derive(Debug, Clone, PartialEq)]
struct LogEntry {
    stroke: Stroke,
    /// Undone entries stay in the log but are hidden from listings.
    undone: bool,
}

/// An ordered, append-only stroke log.
///
/// Entries are never removed except by [`StrokeLog::clear`]. Undo hides an entry and
/// redo shows it again; each author has an independent LIFO chain, and a new append
/// by an author discards that author's redo chain.
#[derive(Debug, Clone, Default)]
pub struct StrokeLog {
    entries: Vec<LogEntry>,
    by_id: HashMap<StrokeId, usize>,
    undo_chains: HashMap<String, Vec<usize>>,
    redo_chains: HashMap<String, Vec<usize>>,
}

impl StrokeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stroke. Returns `false` when an entry with the same id already exists,
    /// in which case the log is left unchanged.
    pub fn append(&mut self, stroke: Stroke, author_id: &str) -> bool {
        if self.by_id.contains_key(&stroke.id) {
            return false;
        }
        let index = self.entries.len();
        self.by_id.insert(stroke.id, index);
        self.entries.push(LogEntry {
            stroke,
            undone: false,
        });
        self.undo_chains
            .entry(author_id.to_string())
            .or_default()
            .push(index);
        if let Some(redo) = self.redo_chains.get_mut(author_id) {
            redo.clear();
        }
        true
    }

    /// Active strokes in log order, skipping the first `since_count`.
    pub fn list(&self, since_count: usize) -> Vec<Stroke> {
        self.entries
            .iter()
            .filter(|entry| !entry.undone)
            .skip(since_count)
            .map(|entry| entry.stroke.clone())
            .collect()
    }

    /// Hide the author's most recent active append.
    pub fn undo_last(&mut self, author_id: &str) -> GatewayResult<StrokeId> {
        let index = self
            .undo_chains
            .get_mut(author_id)
            .and_then(Vec::pop)
            .ok_or(GatewayError::NothingToUndo)?;
        let entry = &mut self.entries[index];
        entry.undone = true;
        self.redo_chains
            .entry(author_id.to_string())
            .or_default()
            .push(index);
        Ok(entry.stroke.id)
    }

    /// Show the author's most recently undone entry again.
    pub fn redo_last(&mut self, author_id: &str) -> GatewayResult<StrokeId> {
        let index = self
            .redo_chains
            .get_mut(author_id)
            .and_then(Vec::pop)
            .ok_or(GatewayError::NothingToRedo)?;
        let entry = &mut self.entries[index];
        entry.undone = false;
        self.undo_chains
            .entry(author_id.to_string())
            .or_default()
            .push(index);
        Ok(entry.stroke.id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_id.clear();
        self.undo_chains.clear();
        self.redo_chains.clear();
    }

    /// Number of entries, including undone ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries currently visible.
    pub fn active_len(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.undone).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn stroke(author: &str) -> Stroke {
        Stroke::freehand(author, vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)])
    }

    #[test]
    fn test_append_and_list() {
        let mut log = StrokeLog::new();
        let a = stroke("alice");
        let b = stroke("alice");
        log.append(a.clone(), "alice");
        log.append(b.clone(), "alice");
        assert_eq!(log.list(0), vec![a, b.clone()]);
        assert_eq!(log.list(1), vec![b]);
    }

    #[test]
    fn test_duplicate_append_is_acknowledged_once() {
        let mut log = StrokeLog::new();
        let a = stroke("alice");
        assert!(log.append(a.clone(), "alice"));
        assert!(!log.append(a, "alice"));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_undo_is_lifo_per_author() {
        let mut log = StrokeLog::new();
        let a1 = stroke("alice");
        let b1 = stroke("bob");
        let a2 = stroke("alice");
        log.append(a1.clone(), "alice");
        log.append(b1.clone(), "bob");
        log.append(a2.clone(), "alice");

        assert_eq!(log.undo_last("alice").unwrap(), a2.id);
        assert_eq!(log.undo_last("alice").unwrap(), a1.id);
        assert_eq!(log.undo_last("alice"), Err(GatewayError::NothingToUndo));
        assert_eq!(log.list(0), vec![b1]);
    }

    #[test]
    fn test_redo_restores_and_new_append_clears_redo() {
        let mut log = StrokeLog::new();
        let a1 = stroke("alice");
        log.append(a1.clone(), "alice");
        log.undo_last("alice").unwrap();
        assert_eq!(log.active_len(), 0);

        assert_eq!(log.redo_last("alice").unwrap(), a1.id);
        assert_eq!(log.active_len(), 1);

        log.undo_last("alice").unwrap();
        log.append(stroke("alice"), "alice");
        assert_eq!(log.redo_last("alice"), Err(GatewayError::NothingToRedo));
    }

    #[test]
    fn test_clear() {
        let mut log = StrokeLog::new();
        log.append(stroke("alice"), "alice");
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.undo_last("alice"), Err(GatewayError::NothingToUndo));
    }
}
