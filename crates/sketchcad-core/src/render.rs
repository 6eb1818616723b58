//! Drawing callback used by commands and the snap engine.
//!
//! The core never renders by itself. Commands describe the dynamic layer
//! (working shapes, handles, snap hints) through a [`Painter`] supplied by the
//! host, which maps it onto whatever back end it uses.

use crate::shapes::LineStyle;
use kurbo::{BezPath, Point, Rect};
use peniko::Color;

/// Pen used for hint geometry.
#[derive(Debug, Clone, Copy)]
pub struct HintPen {
    pub color: Color,
    /// Width in model units; zero draws a hairline.
    pub width: f64,
    pub line_style: LineStyle,
    pub fill: Option<Color>,
}

impl HintPen {
    pub fn new(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            line_style: LineStyle::Solid,
            fill: None,
        }
    }

    pub fn dashed(mut self) -> Self {
        self.line_style = LineStyle::Dash;
        self
    }

    pub fn filled(mut self, fill: Color) -> Self {
        self.fill = Some(fill);
        self
    }
}

/// Handle marker styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleMark {
    Vertex,
    ActiveVertex,
    Rotate,
    /// Snapped point marker.
    Snap,
    /// Tap target that finishes the shape in progress.
    Accept,
}

/// Host-side drawing target. All coordinates are model units.
pub trait Painter {
    fn draw_path(&mut self, path: &BezPath, pen: &HintPen);

    fn draw_line(&mut self, from: Point, to: Point, pen: &HintPen);

    fn draw_circle(&mut self, center: Point, radius: f64, pen: &HintPen);

    fn draw_rect(&mut self, rect: Rect, pen: &HintPen);

    fn draw_handle(&mut self, pt: Point, mark: HandleMark);
}

/// Painter that records calls. Used by hosts for hit previews and by tests.
#[derive(Debug, Default)]
pub struct RecordingPainter {
    pub paths: usize,
    pub lines: Vec<(Point, Point)>,
    pub circles: Vec<(Point, f64)>,
    pub rects: Vec<Rect>,
    pub handles: Vec<(Point, HandleMark)>,
}

impl Painter for RecordingPainter {
    fn draw_path(&mut self, _path: &BezPath, _pen: &HintPen) {
        self.paths += 1;
    }

    fn draw_line(&mut self, from: Point, to: Point, _pen: &HintPen) {
        self.lines.push((from, to));
    }

    fn draw_circle(&mut self, center: Point, radius: f64, _pen: &HintPen) {
        self.circles.push((center, radius));
    }

    fn draw_rect(&mut self, rect: Rect, _pen: &HintPen) {
        self.rects.push(rect);
    }

    fn draw_handle(&mut self, pt: Point, mark: HandleMark) {
        self.handles.push((pt, mark));
    }
}
