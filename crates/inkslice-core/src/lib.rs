//! InkSlice Core Library
//!
//! Vector stroke editing engine: the stroke model, selection cut/paste geometry, and a
//! per-user undo/redo log kept consistent with a remote append-only stroke log.

pub mod config;
pub mod edit;
pub mod error;
pub mod geometry;
pub mod history;
pub mod remote;
pub mod session;
pub mod stroke;

pub use config::EngineConfig;
pub use edit::{Clipboard, CutOutcome};
pub use error::{EngineError, EngineResult, GatewayError, GatewayResult};
pub use geometry::{Point, SelectionRect, Vec2};
pub use history::{ActionLog, CompositeAction};
pub use remote::{BoxFuture, MemoryGateway, StrokeGateway, StrokeLog};
pub use session::{EditorSession, PenSettings};
pub use stroke::{
    BrushStyle, PathData, SerializableColor, ShapeGeometry, Stroke, StrokeId, StrokeStore,
};
