//! Dot shape.

use super::{HandleType, HitResult, ShapeFlags, ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{Affine, BezPath, Point, Rect};
use serde::{Deserialize, Serialize};

/// A single marked point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dot {
    pub(crate) id: ShapeId,
    pub point: Point,
    #[serde(default)]
    pub flags: ShapeFlags,
    pub style: ShapeStyle,
}

impl Dot {
    /// Create a new dot.
    pub fn new(point: Point) -> Self {
        Self {
            id: 0,
            point,
            flags: ShapeFlags::empty(),
            style: ShapeStyle::default(),
        }
    }
}

impl ShapeTrait for Dot {
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
        vec![self.point]
    }

    fn handle_count(&self) -> usize {
        1
    }

    fn handle_point(&self, _index: usize) -> Point {
        self.point
    }

    fn handle_type(&self, _index: usize) -> HandleType {
        HandleType::Vertex
    }

    fn set_handle_point(&mut self, _index: usize, pt: Point, _tol: f64) -> bool {
        self.point = pt;
        true
    }

    fn bounds(&self) -> Rect {
        Rect::from_points(self.point, self.point)
    }

    fn hit_test(&self, pt: Point, _tol: f64) -> HitResult {
        HitResult {
            dist: pt.distance(self.point),
            nearpt: self.point,
            segment: None,
            inside: false,
        }
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.point);
        path.line_to(self.point);
        path
    }

    fn transform(&mut self, affine: Affine) {
        self.point = affine * self.point;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_hit_and_move() {
        let mut dot = Dot::new(Point::new(3.0, 4.0));
        assert!((dot.hit_test(Point::ZERO, 1.0).dist - 5.0).abs() < f64::EPSILON);
        dot.transform(Affine::translate((1.0, 1.0)));
        assert_eq!(dot.point, Point::new(4.0, 5.0));
        assert_eq!(dot.handle_count(), 1);
    }
}
