//! Stroke definitions and the working-set store.

mod image;
mod shape;
mod store;

pub use image::{ImageFormat, ImagePlacement};
pub use shape::ShapeGeometry;
pub use store::StrokeStore;

use crate::geometry::{Point, SelectionRect, Vec2};
use kurbo::Rect;
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for strokes.
pub type StrokeId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }
}

impl Default for SerializableColor {
    fn default() -> Self {
        Self::black()
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// How the stroke's line is laid down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrushStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    /// Wide, translucent highlighter.
    Marker,
    /// Background-colored cover laid over the footprint of a cut.
    Eraser,
}

impl BrushStyle {
    /// Cycle to the next brush style.
    pub fn next(self) -> Self {
        match self {
            BrushStyle::Solid => BrushStyle::Dashed,
            BrushStyle::Dashed => BrushStyle::Dotted,
            BrushStyle::Dotted => BrushStyle::Marker,
            BrushStyle::Marker => BrushStyle::Solid,
            BrushStyle::Eraser => BrushStyle::Eraser,
        }
    }
}

/// Geometry payload of a stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum PathData {
    /// Pointer-drawn open polyline.
    Freehand { points: Vec<Point> },
    /// A committed shape.
    Shape {
        geometry: ShapeGeometry,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<SerializableColor>,
    },
    /// Marker recording a cut: never painted.
    Cut {
        rect: SelectionRect,
        original_stroke_ids: Vec<StrokeId>,
    },
    /// A placed raster image.
    Image(ImagePlacement),
}

/// Polyline/polygon representation used for intersection and clipping.
#[derive(Debug, Clone, PartialEq)]
pub enum Outline {
    /// Open polyline (freehand paths and lines).
    Open(Vec<Point>),
    /// Closed ring (area shapes), without the repeated first point.
    Closed(Vec<Point>),
}

impl Outline {
    pub fn points(&self) -> &[Point] {
        match self {
            Outline::Open(points) | Outline::Closed(points) => points,
        }
    }
}

/// One discrete drawing action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub id: StrokeId,
    pub color: SerializableColor,
    pub line_width: f64,
    pub path_data: PathData,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub author_id: String,
    #[serde(default)]
    pub brush_style: BrushStyle,
    /// Paint order; lower orders are painted first.
    pub order: u64,
}

impl Stroke {
    /// Default line width for new strokes.
    pub const DEFAULT_LINE_WIDTH: f64 = 2.0;

    /// Create a stroke with a fresh id and the current timestamp.
    pub fn new(author_id: impl Into<String>, path_data: PathData) -> Self {
        Self {
            id: Uuid::new_v4(),
            color: SerializableColor::black(),
            line_width: Self::DEFAULT_LINE_WIDTH,
            path_data,
            created_at: now_millis(),
            author_id: author_id.into(),
            brush_style: BrushStyle::default(),
            order: 0,
        }
    }

    /// Create a freehand stroke.
    pub fn freehand(author_id: impl Into<String>, points: Vec<Point>) -> Self {
        Self::new(author_id, PathData::Freehand { points })
    }

    /// Create an unfilled shape stroke.
    pub fn shape(author_id: impl Into<String>, geometry: ShapeGeometry) -> Self {
        Self::new(author_id, PathData::Shape { geometry, fill: None })
    }

    pub fn with_color(mut self, color: SerializableColor) -> Self {
        self.color = color;
        self
    }

    pub fn with_line_width(mut self, line_width: f64) -> Self {
        self.line_width = line_width;
        self
    }

    pub fn with_brush(mut self, brush_style: BrushStyle) -> Self {
        self.brush_style = brush_style;
        self
    }

    pub fn with_order(mut self, order: u64) -> Self {
        self.order = order;
        self
    }

    /// Set the fill of a shape stroke; no effect on other kinds.
    pub fn with_fill(mut self, color: SerializableColor) -> Self {
        if let PathData::Shape { fill, .. } = &mut self.path_data {
            *fill = Some(color);
        }
        self
    }

    /// Whether this stroke leaves pixels on the canvas.
    pub fn is_drawable(&self) -> bool {
        match &self.path_data {
            PathData::Freehand { points } => !points.is_empty(),
            PathData::Shape { .. } | PathData::Image(_) => true,
            PathData::Cut { .. } => false,
        }
    }

    /// Whether this stroke covers a cut footprint.
    pub fn is_eraser(&self) -> bool {
        self.brush_style == BrushStyle::Eraser
    }

    /// Whether this is a cut marker.
    pub fn is_cut_record(&self) -> bool {
        matches!(self.path_data, PathData::Cut { .. })
    }

    /// Resolve the polyline/polygon representation used by the cut engine.
    pub fn outline(&self, circle_segments: usize) -> Option<Outline> {
        match &self.path_data {
            PathData::Freehand { points } if !points.is_empty() => Some(Outline::Open(points.clone())),
            PathData::Freehand { .. } => None,
            PathData::Shape { geometry, .. } => Some(geometry.outline(circle_segments)),
            PathData::Cut { .. } | PathData::Image(_) => None,
        }
    }

    /// Bounding box of the stroke's geometry (line width not included).
    pub fn bounds(&self) -> Option<Rect> {
        match &self.path_data {
            PathData::Freehand { points } => bounds_of(points),
            PathData::Shape { geometry, .. } => Some(geometry.bounds()),
            PathData::Image(image) => Some(image.bounds()),
            PathData::Cut { .. } => None,
        }
    }

    /// A copy of this stroke's geometry moved by `offset`.
    pub fn translated_path(&self, offset: Vec2) -> PathData {
        match &self.path_data {
            PathData::Freehand { points } => PathData::Freehand {
                points: points.iter().map(|p| *p + offset).collect(),
            },
            PathData::Shape { geometry, fill } => PathData::Shape {
                geometry: geometry.translated(offset),
                fill: *fill,
            },
            PathData::Image(image) => PathData::Image(image.translated(offset)),
            PathData::Cut { .. } => self.path_data.clone(),
        }
    }
}

/// Current wall-clock time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Axis-aligned bounds of a point set.
pub(crate) fn bounds_of(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let mut rect = Rect::from_points(*first, *first);
    for point in &points[1..] {
        rect = rect.union_pt(*point);
    }
    Some(rect)
}
