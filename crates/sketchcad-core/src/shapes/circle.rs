//! Circle shape.

use super::{HandleType, HitResult, ShapeFlags, ShapeId, ShapeStyle, ShapeTrait};
use crate::geom;
use kurbo::{Affine, BezPath, Circle as KurboCircle, Point, Rect, Shape as _, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// A full circle.
///
/// Handles: 0-3 are the quadrant points (0°, 90°, 180°, 270°), 4 is the center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub(crate) id: ShapeId,
    pub center: Point,
    pub radius: f64,
    #[serde(default)]
    pub flags: ShapeFlags,
    pub style: ShapeStyle,
}

impl Circle {
    pub fn new(center: Point, radius: f64) -> Self {
        Self {
            id: 0,
            center,
            radius,
            flags: ShapeFlags::empty(),
            style: ShapeStyle::default(),
        }
    }

    fn quadrant(&self, index: usize) -> Point {
        geom::polar_point(self.center, index as f64 * FRAC_PI_2, self.radius)
    }
}

impl ShapeTrait for Circle {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn flags(&self) -> ShapeFlags {
        self.flags
    }

    fn flags_mut(&mut self) -> &mut ShapeFlags {
        &mut self.flags
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn points(&self) -> Vec<Point> {
        (0..4).map(|i| self.quadrant(i)).collect()
    }

    fn handle_count(&self) -> usize {
        5
    }

    fn handle_point(&self, index: usize) -> Point {
        if index < 4 { self.quadrant(index) } else { self.center }
    }

    fn handle_type(&self, index: usize) -> HandleType {
        if index < 4 {
            HandleType::Quadrant
        } else {
            HandleType::Center
        }
    }

    fn set_handle_point(&mut self, index: usize, pt: Point, _tol: f64) -> bool {
        if index >= 4 || self.flags.contains(ShapeFlags::FIXED_SIZE) {
            let delta = pt - self.handle_point(index);
            self.center += delta;
            return true;
        }
        let radius = pt.distance(self.center);
        if radius < geom::ZERO_TOL {
            return false;
        }
        self.radius = radius;
        true
    }

    fn bounds(&self) -> Rect {
        Rect::from_center_size(self.center, (self.radius * 2.0, self.radius * 2.0))
    }

    fn hit_test(&self, pt: Point, _tol: f64) -> HitResult {
        let d = pt.distance(self.center);
        HitResult {
            dist: (d - self.radius).abs(),
            nearpt: geom::ruler_point(self.center, pt, self.radius),
            segment: Some(0),
            inside: d < self.radius,
        }
    }

    fn to_path(&self) -> BezPath {
        KurboCircle::new(self.center, self.radius).to_path((self.radius * 1e-3).max(1e-6))
    }

    fn transform(&mut self, affine: Affine) {
        self.center = affine * self.center;
        self.radius *= affine.determinant().abs().sqrt();
    }

    fn offset(&mut self, vec: Vec2, _segment: Option<usize>) {
        self.center += vec;
    }

    fn is_closed(&self) -> bool {
        true
    }

    fn is_curve(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_handles() {
        let c = Circle::new(Point::new(10.0, 10.0), 5.0);
        assert!(c.handle_point(0).distance(Point::new(15.0, 10.0)) < 1e-9);
        assert!(c.handle_point(1).distance(Point::new(10.0, 15.0)) < 1e-9);
        assert_eq!(c.handle_point(4), Point::new(10.0, 10.0));
        assert_eq!(c.handle_type(4), HandleType::Center);
    }

    #[test]
    fn test_circle_hit_test() {
        let c = Circle::new(Point::ZERO, 5.0);
        let res = c.hit_test(Point::new(7.0, 0.0), 1.0);
        assert!((res.dist - 2.0).abs() < 1e-9);
        assert!(res.nearpt.distance(Point::new(5.0, 0.0)) < 1e-9);
        assert!(c.hit_test(Point::new(1.0, 0.0), 1.0).inside);
    }

    #[test]
    fn test_circle_scale_transform() {
        let mut c = Circle::new(Point::new(1.0, 0.0), 2.0);
        c.transform(Affine::scale(3.0));
        assert!((c.radius - 6.0).abs() < 1e-9);
        assert_eq!(c.center, Point::new(3.0, 0.0));
    }
}
