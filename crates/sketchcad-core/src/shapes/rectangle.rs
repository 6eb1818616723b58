//! Rectangle shape.

use super::{
    HandleType, HitResult, ShapeFlags, ShapeId, ShapeStyle, ShapeTrait, hit_test_edges, points_bounds,
    polygon_contains,
};
use kurbo::{Affine, BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A rectangle stored as four corners so that rotations stay exact.
///
/// Handles: 0-3 are the corners, 4-7 the edge midpoints (edge `i` runs from
/// corner `i` to corner `i + 1`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub(crate) id: ShapeId,
    pub corners: [Point; 4],
    #[serde(default)]
    pub flags: ShapeFlags,
    pub style: ShapeStyle,
}

impl Rectangle {
    /// Create an axis-aligned rectangle from a rect.
    pub fn new(rect: Rect) -> Self {
        Self {
            id: 0,
            corners: [
                Point::new(rect.x0, rect.y0),
                Point::new(rect.x1, rect.y0),
                Point::new(rect.x1, rect.y1),
                Point::new(rect.x0, rect.y1),
            ],
            flags: ShapeFlags::empty(),
            style: ShapeStyle::default(),
        }
    }

    /// Create an axis-aligned rectangle spanning two opposite corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(Rect::from_points(a, b))
    }

    /// Reset to the axis-aligned rectangle spanning two opposite corners.
    pub fn set_corners(&mut self, a: Point, b: Point) {
        self.corners = Self::from_corners(a, b).corners;
    }

    pub fn width(&self) -> f64 {
        self.corners[0].distance(self.corners[1])
    }

    pub fn height(&self) -> f64 {
        self.corners[1].distance(self.corners[2])
    }

    pub fn center(&self) -> Point {
        self.corners[0].midpoint(self.corners[2])
    }

    /// Transform from the rectangle's own frame (corner 0 at the origin, edge 0
    /// along +x) to model space.
    fn frame(&self) -> Affine {
        let angle = (self.corners[1] - self.corners[0]).atan2();
        Affine::translate(self.corners[0].to_vec2()) * Affine::rotate(angle)
    }
}

impl ShapeTrait for Rectangle {
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
        self.corners.to_vec()
    }

    fn handle_count(&self) -> usize {
        8
    }

    fn handle_point(&self, index: usize) -> Point {
        match index {
            0..4 => self.corners[index],
            _ => {
                let edge = index % 4;
                self.corners[edge].midpoint(self.corners[(edge + 1) % 4])
            }
        }
    }

    fn handle_type(&self, index: usize) -> HandleType {
        if index < 4 {
            HandleType::Vertex
        } else {
            HandleType::MidPoint
        }
    }

    fn set_handle_point(&mut self, index: usize, pt: Point, _tol: f64) -> bool {
        if index >= 8 {
            return false;
        }
        if self.flags.contains(ShapeFlags::FIXED_SIZE) {
            let delta = pt - self.handle_point(index);
            self.offset(delta, None);
            return true;
        }

        let frame = self.frame();
        let inv = frame.inverse();
        let local = self.corners.map(|p| inv * p);
        let (mut x0, mut y0) = (local[0].x, local[0].y);
        let (mut x1, mut y1) = (local[2].x, local[2].y);
        let p = inv * pt;

        match index {
            0 => (x0, y0) = (p.x, p.y),
            1 => (x1, y0) = (p.x, p.y),
            2 => (x1, y1) = (p.x, p.y),
            3 => (x0, y1) = (p.x, p.y),
            4 => y0 = p.y,
            5 => x1 = p.x,
            6 => y1 = p.y,
            _ => x0 = p.x,
        }
        self.corners = [
            frame * Point::new(x0, y0),
            frame * Point::new(x1, y0),
            frame * Point::new(x1, y1),
            frame * Point::new(x0, y1),
        ];
        true
    }

    fn edges(&self) -> Vec<(Point, Point)> {
        (0..4).map(|i| (self.corners[i], self.corners[(i + 1) % 4])).collect()
    }

    fn bounds(&self) -> Rect {
        points_bounds(&self.corners)
    }

    fn hit_test(&self, pt: Point, _tol: f64) -> HitResult {
        let mut res = hit_test_edges(&self.edges(), pt, None);
        res.inside = polygon_contains(&self.corners, pt);
        res
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.corners[0]);
        for p in &self.corners[1..] {
            path.line_to(*p);
        }
        path.close_path();
        path
    }

    fn transform(&mut self, affine: Affine) {
        for p in &mut self.corners {
            *p = affine * *p;
        }
    }

    fn offset(&mut self, vec: Vec2, _segment: Option<usize>) {
        for p in &mut self.corners {
            *p += vec;
        }
    }

    fn is_closed(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_rectangle_handles() {
        let rect = Rectangle::from_corners(Point::new(10.0, 10.0), Point::new(0.0, 0.0));
        assert_eq!(rect.handle_point(0), Point::new(0.0, 0.0));
        assert_eq!(rect.handle_point(2), Point::new(10.0, 10.0));
        assert_eq!(rect.handle_point(4), Point::new(5.0, 0.0));
        assert_eq!(rect.handle_type(7), HandleType::MidPoint);
        assert!((rect.width() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_drag_corner_keeps_opposite() {
        let mut rect = Rectangle::from_corners(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        rect.set_handle_point(2, Point::new(20.0, 5.0), 0.1);
        assert!(rect.corners[0].distance(Point::new(0.0, 0.0)) < 1e-9);
        assert!(rect.corners[2].distance(Point::new(20.0, 5.0)) < 1e-9);
        assert!((rect.height() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_drag_edge_of_rotated_rect() {
        let mut rect = Rectangle::from_corners(Point::new(0.0, 0.0), Point::new(10.0, 4.0));
        rect.transform(Affine::rotate(FRAC_PI_2));
        // Edge 1 now lies on y = 10; pull it out to y = 12.
        rect.set_handle_point(5, Point::new(-2.0, 12.0), 0.1);
        assert!((rect.width() - 12.0).abs() < 1e-9);
        assert!((rect.height() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_size_drag_translates() {
        let mut rect = Rectangle::from_corners(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        rect.flags.insert(ShapeFlags::FIXED_SIZE);
        rect.set_handle_point(0, Point::new(1.0, 1.0), 0.1);
        assert_eq!(rect.corners[2], Point::new(11.0, 11.0));
    }
}
