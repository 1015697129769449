//! Cut/paste engine.

mod cut;
mod paste;

pub use cut::{CutOutcome, cut, replay_cut};
pub use paste::{Clipboard, paste};

use crate::config::EngineConfig;
use crate::stroke::{Stroke, StrokeStore};

/// Rebuild the working set from the remote log, in log order.
///
/// Cut records re-apply their cut to the strokes listed before them; every other
/// entry is added as is.
pub fn replay_log(store: &mut StrokeStore, strokes: Vec<Stroke>, config: &EngineConfig) {
    store.clear();
    for stroke in strokes {
        if stroke.is_cut_record() {
            replay_cut(store, &stroke, config);
        } else {
            store.add(stroke);
        }
    }
}
