//! Engine configuration.

use crate::error::EngineResult;
use crate::stroke::SerializableColor;
use serde::{Deserialize, Serialize};

/// Default number of vertices used to approximate a circle.
pub const DEFAULT_CIRCLE_SEGMENTS: usize = 30;

/// Default extra width added to erase strokes over freehand pieces.
pub const DEFAULT_ERASE_PADDING: f64 = 4.0;

/// Maximum number of undo entries kept by default.
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Tunables for the cut engine and action log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Canvas background; erase strokes are painted in this color.
    pub background_color: SerializableColor,
    /// Vertex count used when a circle is approximated by a polygon.
    pub circle_segments: usize,
    /// Width added to an erase stroke over an open path so it fully covers the original.
    pub erase_padding: f64,
    /// Undo entries kept before the oldest is dropped.
    pub max_history: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            background_color: SerializableColor::white(),
            circle_segments: DEFAULT_CIRCLE_SEGMENTS,
            erase_padding: DEFAULT_ERASE_PADDING,
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
