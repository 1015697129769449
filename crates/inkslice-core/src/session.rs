//! Editor session: the single owner of one user's editing state.

use crate::config::EngineConfig;
use crate::edit::{Clipboard, CutOutcome, paste};
use crate::error::EngineResult;
use crate::geometry::{Point, SelectionRect};
use crate::history::ActionLog;
use crate::remote::StrokeGateway;
use crate::stroke::{BrushStyle, SerializableColor, ShapeGeometry, Stroke, StrokeId, StrokeStore};
use std::sync::Arc;

/// Current pen applied to newly drawn strokes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenSettings {
    pub color: SerializableColor,
    pub line_width: f64,
    pub brush_style: BrushStyle,
}

impl Default for PenSettings {
    fn default() -> Self {
        Self {
            color: SerializableColor::black(),
            line_width: Stroke::DEFAULT_LINE_WIDTH,
            brush_style: BrushStyle::Solid,
        }
    }
}

/// Working set, clipboard, pen and undo history for one author.
pub struct EditorSession<G: StrokeGateway> {
    store: StrokeStore,
    history: ActionLog<G>,
    clipboard: Clipboard,
    pen: PenSettings,
}

impl<G: StrokeGateway> EditorSession<G> {
    pub fn new(gateway: Arc<G>, author_id: impl Into<String>, config: EngineConfig) -> Self {
        Self {
            store: StrokeStore::new(),
            history: ActionLog::new(gateway, author_id, config),
            clipboard: Clipboard::new(),
            pen: PenSettings::default(),
        }
    }

    pub fn author_id(&self) -> &str {
        self.history.author_id()
    }

    pub fn config(&self) -> &EngineConfig {
        self.history.config()
    }

    /// Visible strokes in paint order.
    pub fn strokes(&self) -> Vec<&Stroke> {
        self.store.all()
    }

    pub fn store(&self) -> &StrokeStore {
        &self.store
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn history(&self) -> &ActionLog<G> {
        &self.history
    }

    pub fn pen(&self) -> PenSettings {
        self.pen
    }

    pub fn set_pen(&mut self, pen: PenSettings) {
        self.pen = pen;
    }

    /// Cycle the brush style, as a toolbar toggle would.
    pub fn cycle_brush(&mut self) {
        self.pen.brush_style = self.pen.brush_style.next();
    }

    /// Build a freehand stroke with the current pen, ordered above everything drawn so far.
    pub fn new_freehand(&self, points: Vec<Point>) -> Stroke {
        self.styled(Stroke::freehand(self.author_id(), points))
    }

    /// Build a shape stroke with the current pen.
    pub fn new_shape(&self, geometry: ShapeGeometry, fill: Option<SerializableColor>) -> Stroke {
        let stroke = self.styled(Stroke::shape(self.author_id(), geometry));
        match fill {
            Some(color) => stroke.with_fill(color),
            None => stroke,
        }
    }

    /// Persist a completed gesture. Returns the new stroke's id.
    pub async fn commit(&mut self, stroke: Stroke) -> EngineResult<StrokeId> {
        let id = stroke.id;
        self.history.commit_stroke(&mut self.store, stroke).await?;
        Ok(id)
    }

    /// Cut the selection out of the canvas and lift its contents onto the clipboard.
    ///
    /// A selection that touches nothing leaves the clipboard as it was.
    pub async fn cut(&mut self, rect: SelectionRect) -> EngineResult<CutOutcome> {
        let outcome = self.history.commit_cut(&mut self.store, rect).await?;
        if !outcome.is_empty() {
            self.clipboard.set(outcome.inside_strokes.clone());
        }
        Ok(outcome)
    }

    /// Paste the clipboard with its top-left corner at `drop_point`.
    pub async fn paste(&mut self, drop_point: Point) -> EngineResult<Vec<StrokeId>> {
        let strokes = paste(
            self.clipboard.strokes(),
            drop_point,
            self.author_id(),
            self.store.next_order(),
        )?;
        let ids = strokes.iter().map(|s| s.id).collect();
        self.history.commit_paste(&mut self.store, strokes).await?;
        Ok(ids)
    }

    pub async fn undo(&mut self) -> EngineResult<bool> {
        self.history.undo(&mut self.store).await
    }

    pub async fn redo(&mut self) -> EngineResult<bool> {
        self.history.redo(&mut self.store).await
    }

    /// Pull the remote log and rebuild the canvas, picking up other users' strokes.
    pub async fn refresh(&mut self) -> EngineResult<()> {
        self.history.resync(&mut self.store).await
    }

    /// Wipe the shared canvas.
    pub async fn clear_all(&mut self) -> EngineResult<()> {
        self.history.clear_all(&mut self.store).await?;
        self.clipboard.clear();
        Ok(())
    }

    fn styled(&self, stroke: Stroke) -> Stroke {
        stroke
            .with_color(self.pen.color)
            .with_line_width(self.pen.line_width)
            .with_brush(self.pen.brush_style)
            .with_order(self.store.next_order())
    }
}
