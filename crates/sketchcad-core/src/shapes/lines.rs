//! Polyline and polygon shape.

use super::{
    HandleType, HitResult, ShapeFlags, ShapeId, ShapeStyle, ShapeTrait, hit_test_edges, points_bounds,
    polygon_contains,
};
use kurbo::{Affine, BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A chain of straight edges through `points`, optionally closed.
///
/// Handles: one per vertex, followed by one fixed midpoint per edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lines {
    pub(crate) id: ShapeId,
    pub points: Vec<Point>,
    pub closed: bool,
    #[serde(default)]
    pub flags: ShapeFlags,
    pub style: ShapeStyle,
}

impl Lines {
    pub fn new(points: Vec<Point>, closed: bool) -> Self {
        Self {
            id: 0,
            points,
            closed,
            flags: ShapeFlags::empty(),
            style: ShapeStyle::default(),
        }
    }

    fn edge_count(&self) -> usize {
        match self.points.len() {
            0 | 1 => 0,
            n if self.closed => n,
            n => n - 1,
        }
    }

    /// Insert a vertex after edge `segment`'s start point.
    pub fn insert_point(&mut self, segment: usize, pt: Point) -> bool {
        if segment >= self.edge_count() {
            return false;
        }
        self.points.insert(segment + 1, pt);
        true
    }

    /// Remove vertex `index`, keeping at least two vertices (three when closed).
    pub fn remove_point(&mut self, index: usize) -> bool {
        let min = if self.closed { 3 } else { 2 };
        if index >= self.points.len() || self.points.len() <= min {
            return false;
        }
        self.points.remove(index);
        true
    }

    pub fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
    }
}

impl ShapeTrait for Lines {
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
        self.points.clone()
    }

    fn handle_count(&self) -> usize {
        self.points.len() + self.edge_count()
    }

    fn handle_point(&self, index: usize) -> Point {
        let n = self.points.len();
        if index < n {
            return self.points[index];
        }
        let edge = index - n;
        match (self.points.get(edge), self.points.get((edge + 1) % n.max(1))) {
            (Some(a), Some(b)) => a.midpoint(*b),
            _ => Point::ZERO,
        }
    }

    fn handle_type(&self, index: usize) -> HandleType {
        if index < self.points.len() {
            HandleType::Vertex
        } else {
            HandleType::MidPoint
        }
    }

    fn is_handle_fixed(&self, index: usize) -> bool {
        index >= self.points.len()
    }

    fn set_handle_point(&mut self, index: usize, pt: Point, _tol: f64) -> bool {
        match self.points.get_mut(index) {
            Some(p) => {
                *p = pt;
                true
            }
            None => false,
        }
    }

    fn edges(&self) -> Vec<(Point, Point)> {
        let n = self.points.len();
        (0..self.edge_count())
            .map(|i| (self.points[i], self.points[(i + 1) % n]))
            .collect()
    }

    fn bounds(&self) -> Rect {
        points_bounds(&self.points)
    }

    fn hit_test(&self, pt: Point, _tol: f64) -> HitResult {
        let mut res = hit_test_edges(&self.edges(), pt, None);
        if res.segment.is_none() {
            if let Some(first) = self.points.first() {
                res.dist = pt.distance(*first);
                res.nearpt = *first;
            }
        }
        res.inside = self.closed && polygon_contains(&self.points, pt);
        res
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let mut iter = self.points.iter();
        if let Some(first) = iter.next() {
            path.move_to(*first);
            for p in iter {
                path.line_to(*p);
            }
            if self.closed {
                path.close_path();
            }
        }
        path
    }

    fn transform(&mut self, affine: Affine) {
        for p in &mut self.points {
            *p = affine * *p;
        }
    }

    fn offset(&mut self, vec: Vec2, segment: Option<usize>) {
        let n = self.points.len();
        match segment {
            Some(seg) if seg < self.edge_count() && !self.flags.intersects(ShapeFlags::FIXED_LENGTH | ShapeFlags::FIXED_SIZE) => {
                self.points[seg] += vec;
                self.points[(seg + 1) % n] += vec;
            }
            _ => {
                for p in &mut self.points {
                    *p += vec;
                }
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Lines {
        Lines::new(
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(0.0, 10.0)],
            true,
        )
    }

    #[test]
    fn test_handles_include_edge_midpoints() {
        let tri = triangle();
        assert_eq!(tri.handle_count(), 6);
        assert_eq!(tri.handle_point(3), Point::new(5.0, 0.0));
        assert_eq!(tri.handle_point(5), Point::new(0.0, 5.0));
        assert!(tri.is_handle_fixed(4));

        let open = Lines::new(tri.points.clone(), false);
        assert_eq!(open.handle_count(), 5);
    }

    #[test]
    fn test_insert_and_remove_point() {
        let mut tri = triangle();
        assert!(tri.insert_point(0, Point::new(5.0, 0.0)));
        assert_eq!(tri.points.len(), 4);
        assert!(tri.remove_point(1));
        assert!(!tri.remove_point(0));
        assert!(!tri.insert_point(9, Point::ZERO));
    }

    #[test]
    fn test_offset_single_segment() {
        let mut tri = triangle();
        tri.offset(Vec2::new(0.0, -1.0), Some(0));
        assert_eq!(tri.points[0], Point::new(0.0, -1.0));
        assert_eq!(tri.points[1], Point::new(10.0, -1.0));
        assert_eq!(tri.points[2], Point::new(0.0, 10.0));

        tri.flags.insert(ShapeFlags::FIXED_SIZE);
        tri.offset(Vec2::new(1.0, 0.0), Some(0));
        assert_eq!(tri.points[2], Point::new(1.0, 10.0));
    }

    #[test]
    fn test_hit_inside_closed() {
        let tri = triangle();
        let res = tri.hit_test(Point::new(2.0, 2.0), 0.5);
        assert!(res.inside);
        assert!((res.dist - 2.0).abs() < 1e-9);
    }
}
