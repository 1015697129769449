//! Undo-log entries.

use crate::edit::CutOutcome;
use crate::stroke::{Stroke, StrokeId, StrokeStore};
use std::collections::HashMap;

/// One user-visible step, possibly spanning several remote log entries.
#[derive(Debug, Clone)]
pub enum CompositeAction {
    /// A single drawn stroke or shape.
    Atomic { stroke: Stroke },
    /// A cut: one cut record plus one remote entry per erase stroke.
    Cut {
        cut_record: Stroke,
        erase_strokes: Vec<Stroke>,
        affected_originals: Vec<Stroke>,
        replacement_segments: HashMap<StrokeId, Vec<Stroke>>,
        remote_step_count: usize,
    },
    /// A paste: one remote entry per pasted stroke.
    Paste {
        pasted_strokes: Vec<Stroke>,
        remote_step_count: usize,
    },
}

impl CompositeAction {
    /// Build the cut entry from an applied outcome. `None` when the cut touched nothing.
    pub fn from_cut(outcome: &CutOutcome, remote_step_count: usize) -> Option<Self> {
        let cut_record = outcome.cut_record.clone()?;
        Some(CompositeAction::Cut {
            cut_record,
            erase_strokes: outcome.erase_strokes.clone(),
            affected_originals: outcome.affected_originals.clone(),
            replacement_segments: outcome.replacement_segments.clone(),
            remote_step_count,
        })
    }

    /// Number of single-step remote undo/redo calls this entry maps to.
    pub fn remote_step_count(&self) -> usize {
        match self {
            CompositeAction::Atomic { .. } => 1,
            CompositeAction::Cut { remote_step_count, .. } => *remote_step_count,
            CompositeAction::Paste { remote_step_count, .. } => *remote_step_count,
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CompositeAction::Atomic { .. } => "stroke",
            CompositeAction::Cut { .. } => "cut",
            CompositeAction::Paste { .. } => "paste",
        }
    }

    /// Apply the forward effect to the working set.
    pub fn apply(&self, store: &mut StrokeStore) {
        match self {
            CompositeAction::Atomic { stroke } => store.add(stroke.clone()),
            CompositeAction::Cut {
                cut_record,
                erase_strokes,
                affected_originals,
                replacement_segments,
                ..
            } => {
                for original in affected_originals {
                    store.remove_by_id(original.id);
                }
                for piece in replacement_segments.values().flatten() {
                    store.add(piece.clone());
                }
                store.add(cut_record.clone());
                for erase in erase_strokes {
                    store.add(erase.clone());
                }
            }
            CompositeAction::Paste { pasted_strokes, .. } => {
                for stroke in pasted_strokes {
                    store.add(stroke.clone());
                }
            }
        }
    }

    /// Apply the inverse effect to the working set.
    pub fn revert(&self, store: &mut StrokeStore) {
        match self {
            CompositeAction::Atomic { stroke } => {
                store.remove_by_id(stroke.id);
            }
            CompositeAction::Cut {
                cut_record,
                erase_strokes,
                affected_originals,
                replacement_segments,
                ..
            } => {
                store.remove_by_id(cut_record.id);
                for erase in erase_strokes {
                    store.remove_by_id(erase.id);
                }
                for piece in replacement_segments.values().flatten() {
                    store.remove_by_id(piece.id);
                }
                for original in affected_originals {
                    store.add(original.clone());
                }
            }
            CompositeAction::Paste { pasted_strokes, .. } => {
                for stroke in pasted_strokes {
                    store.remove_by_id(stroke.id);
                }
            }
        }
    }
}
