//! Coordinate service: display pixels to model units and back.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Tolerances are scaled down by this factor for stylus input.
pub const STYLUS_FACTOR: f64 = 0.7;

/// Explicit coordinate configuration handed to a view at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Finger input uses full-size tolerances; stylus input uses [`STYLUS_FACTOR`].
    pub use_finger: bool,
    /// Display resolution in pixels per inch.
    pub dpi: f64,
    /// Model-to-display zoom (1.0 shows one model unit per display millimetre).
    pub zoom: f64,
    /// Display position of the model origin, in pixels.
    pub offset: Vec2,
    /// Window size in pixels.
    pub size: Size,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            use_finger: true,
            dpi: 96.0,
            zoom: 1.0,
            offset: Vec2::ZERO,
            size: Size::new(1024.0, 768.0),
        }
    }
}

/// View transform between display pixels and model units.
///
/// Model units are millimetres at zoom 1; the display scale is
/// `zoom * dpi / 25.4` pixels per model unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewTransform {
    config: ViewConfig,
    /// Minimum allowed zoom level
    pub min_zoom: f64,
    /// Maximum allowed zoom level
    pub max_zoom: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::new(ViewConfig::default())
    }
}

impl ViewTransform {
    pub fn new(config: ViewConfig) -> Self {
        Self {
            config,
            min_zoom: 0.01,
            max_zoom: 100.0,
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn use_finger(&self) -> bool {
        self.config.use_finger
    }

    pub fn set_use_finger(&mut self, use_finger: bool) {
        self.config.use_finger = use_finger;
    }

    pub fn zoom(&self) -> f64 {
        self.config.zoom
    }

    pub fn set_size(&mut self, size: Size) {
        self.config.size = size;
    }

    /// Display pixels per millimetre.
    pub fn px_per_mm(&self) -> f64 {
        self.config.dpi / 25.4
    }

    fn scale(&self) -> f64 {
        self.config.zoom * self.px_per_mm()
    }

    /// Model to display transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.config.offset) * Affine::scale(self.scale())
    }

    /// Display to model transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale()) * Affine::translate(-self.config.offset)
    }

    pub fn display_to_model(&self, pt: Point) -> Point {
        self.inverse_transform() * pt
    }

    pub fn model_to_display(&self, pt: Point) -> Point {
        self.transform() * pt
    }

    /// Convert a display length in pixels to model units.
    pub fn display_to_model_len(&self, px: f64) -> f64 {
        px / self.scale()
    }

    /// Convert a physical display length in millimetres to model units,
    /// shrinking it for stylus input.
    pub fn display_mm_to_model(&self, mm: f64) -> f64 {
        let factor = if self.config.use_finger { 1.0 } else { STYLUS_FACTOR };
        self.display_to_model_len(mm * self.px_per_mm()) * factor
    }

    /// The visible window in model units.
    pub fn wnd_rect_model(&self) -> Rect {
        let size = self.config.size;
        let a = self.display_to_model(Point::ZERO);
        let b = self.display_to_model(Point::new(size.width, size.height));
        Rect::from_points(a, b)
    }

    /// Convert a model rect to a display rect.
    pub fn model_to_display_rect(&self, rect: Rect) -> Rect {
        Rect::from_points(self.model_to_display(rect.origin()), self.model_to_display(Point::new(rect.x1, rect.y1)))
    }

    /// Pan by a delta in display pixels.
    pub fn pan(&mut self, delta: Vec2) {
        self.config.offset += delta;
    }

    /// Zoom, keeping the given display point fixed.
    pub fn zoom_at(&mut self, display_point: Point, factor: f64) {
        let new_zoom = (self.config.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.config.zoom).abs() < f64::EPSILON {
            return;
        }
        let model_point = self.display_to_model(display_point);
        self.config.zoom = new_zoom;
        let moved = self.model_to_display(model_point);
        self.config.offset += display_point - moved;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mm_view() -> ViewTransform {
        ViewTransform::new(ViewConfig {
            dpi: 25.4,
            ..ViewConfig::default()
        })
    }

    #[test]
    fn test_mm_to_model_identity_at_unit_scale() {
        let view = mm_view();
        assert!((view.display_mm_to_model(4.0) - 4.0).abs() < 1e-12);
        assert!((view.display_to_model_len(2.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_stylus_shrinks_tolerance() {
        let mut view = mm_view();
        view.set_use_finger(false);
        assert!((view.display_mm_to_model(10.0) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut view = ViewTransform::new(ViewConfig {
            zoom: 1.5,
            offset: Vec2::new(30.0, -20.0),
            ..ViewConfig::default()
        });
        view.pan(Vec2::new(5.0, 5.0));
        let original = Point::new(123.0, 456.0);
        let back = view.model_to_display(view.display_to_model(original));
        assert!((back - original).hypot() < 1e-9);
    }

    #[test]
    fn test_zoom_at_keeps_point_fixed() {
        let mut view = mm_view();
        let anchor = Point::new(100.0, 50.0);
        let before = view.display_to_model(anchor);
        view.zoom_at(anchor, 2.0);
        let after = view.display_to_model(anchor);
        assert!((before - after).hypot() < 1e-9);
        assert!((view.display_mm_to_model(4.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_window_rect() {
        let view = mm_view();
        assert_eq!(view.wnd_rect_model(), Rect::new(0.0, 0.0, 1024.0, 768.0));
    }
}
