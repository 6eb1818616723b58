//! Line segment shape.

use super::{HandleType, HitResult, ShapeFlags, ShapeId, ShapeStyle, ShapeTrait};
use crate::geom;
use kurbo::{Affine, BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A straight segment from `start` to `end`.
///
/// Handles: 0 = start, 1 = end, 2 = midpoint (fixed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub(crate) id: ShapeId,
    /// Start point.
    pub start: Point,
    /// End point.
    pub end: Point,
    #[serde(default)]
    pub flags: ShapeFlags,
    /// Style properties.
    pub style: ShapeStyle,
}

impl Line {
    /// Create a new line.
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            id: 0,
            start,
            end,
            flags: ShapeFlags::empty(),
            style: ShapeStyle::default(),
        }
    }

    /// Get the length of the line.
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Direction angle of `start → end` in radians.
    pub fn angle(&self) -> f64 {
        (self.end - self.start).atan2()
    }

    /// Get the midpoint of the line.
    pub fn midpoint(&self) -> Point {
        self.start.midpoint(self.end)
    }
}

impl ShapeTrait for Line {
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
        vec![self.start, self.end]
    }

    fn handle_count(&self) -> usize {
        3
    }

    fn handle_point(&self, index: usize) -> Point {
        match index {
            0 => self.start,
            1 => self.end,
            _ => self.midpoint(),
        }
    }

    fn handle_type(&self, index: usize) -> HandleType {
        if index < 2 {
            HandleType::Vertex
        } else {
            HandleType::MidPoint
        }
    }

    fn is_handle_fixed(&self, index: usize) -> bool {
        index >= 2
    }

    fn set_handle_point(&mut self, index: usize, pt: Point, _tol: f64) -> bool {
        let fixed_length = self.flags.contains(ShapeFlags::FIXED_LENGTH);
        match index {
            0 | 1 => {
                let (moving, other) = if index == 0 {
                    (&mut self.start, self.end)
                } else {
                    (&mut self.end, self.start)
                };
                if fixed_length {
                    let len = moving.distance(other);
                    *moving = geom::ruler_point(other, pt, len);
                } else {
                    *moving = pt;
                }
            }
            _ => {
                let delta = pt - self.midpoint();
                self.start += delta;
                self.end += delta;
            }
        }
        true
    }

    fn edges(&self) -> Vec<(Point, Point)> {
        vec![(self.start, self.end)]
    }

    fn bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    fn hit_test(&self, pt: Point, _tol: f64) -> HitResult {
        let (dist, nearpt) = geom::point_to_segment(pt, self.start, self.end);
        HitResult {
            dist,
            nearpt,
            segment: Some(0),
            inside: false,
        }
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.start);
        path.line_to(self.end);
        path
    }

    fn transform(&mut self, affine: Affine) {
        self.start = affine * self.start;
        self.end = affine * self.end;
    }

    fn offset(&mut self, vec: Vec2, _segment: Option<usize>) {
        self.start += vec;
        self.end += vec;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_handles() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert_eq!(line.handle_count(), 3);
        assert_eq!(line.handle_point(2), Point::new(5.0, 0.0));
        assert_eq!(line.handle_type(2), HandleType::MidPoint);
        assert!(line.is_handle_fixed(2));
        assert!(!line.is_handle_fixed(0));
    }

    #[test]
    fn test_fixed_length_handle_drag_keeps_length() {
        let mut line = Line::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        line.flags.insert(ShapeFlags::FIXED_LENGTH);
        line.set_handle_point(1, Point::new(0.0, 3.0), 0.1);
        assert!((line.length() - 10.0).abs() < 1e-9);
        assert!((line.end.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_line_hit_test() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let res = line.hit_test(Point::new(4.0, 2.0), 1.0);
        assert!((res.dist - 2.0).abs() < f64::EPSILON);
        assert_eq!(res.nearpt, Point::new(4.0, 0.0));
    }
}
