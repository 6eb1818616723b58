//! Snap grid shape.

use super::{HandleType, HitResult, ShapeFlags, ShapeId, ShapeStyle, ShapeTrait, hit_test_edges};
use crate::geom;
use kurbo::{Affine, BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// An axis-aligned grid of reference lines used as a snap target.
///
/// Handles: 0-3 corners, 4-7 edge midpoints and, unless the grid is locked or
/// has a fixed length, 8 is the cell-size handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub(crate) id: ShapeId,
    pub rect: Rect,
    /// Cell size; zero means a quarter of the grid in each direction.
    pub cell: Vec2,
    #[serde(default)]
    pub flags: ShapeFlags,
    pub style: ShapeStyle,
}

impl Grid {
    pub fn new(rect: Rect, cell: Vec2) -> Self {
        Self {
            id: 0,
            rect: rect.abs(),
            cell,
            flags: ShapeFlags::ROTATE_DISABLED,
            style: ShapeStyle::default(),
        }
    }

    fn origin(&self) -> Point {
        Point::new(self.rect.x0, self.rect.y0)
    }

    fn effective_cell(&self) -> Vec2 {
        if self.cell == Vec2::ZERO {
            Vec2::new(self.rect.width() / 4.0, self.rect.height() / 4.0)
        } else {
            self.cell
        }
    }

    pub fn is_valid(&self, tol: f64) -> bool {
        self.cell.x > tol && self.cell.y > tol && self.cell.x < self.rect.width() && self.cell.y < self.rect.height()
    }

    /// Snap `pnt` to the nearest interior grid line on each axis.
    ///
    /// `dists` carries the current best distances per axis; an axis only snaps
    /// when a line is closer than three times that distance. Returns bit 1 if
    /// x snapped and bit 2 if y snapped, with the snapped point and the
    /// updated distances.
    pub fn snap(&self, pnt: Point, dists: Vec2) -> (u8, Point, Vec2) {
        let cell = if self.cell == Vec2::ZERO {
            Vec2::new(self.rect.width() / 4.0, self.rect.height() / 4.0)
        } else {
            self.cell / 2.0
        };
        let mut bits = 0;
        if cell.x < geom::ZERO_TOL || cell.y < geom::ZERO_TOL {
            return (bits, pnt, dists);
        }

        let org = self.origin();
        let mut newpt = pnt;
        let mut dist = dists * 3.0;

        let mut x = cell.x;
        while x < self.rect.width() - geom::ZERO_TOL {
            let d = (pnt.x - (org.x + x)).abs();
            if dist.x > d {
                newpt.x = org.x + x;
                dist.x = d;
                bits |= 1;
            }
            x += cell.x;
        }
        let mut y = cell.y;
        while y < self.rect.height() - geom::ZERO_TOL {
            let d = (pnt.y - (org.y + y)).abs();
            if dist.y > d {
                newpt.y = org.y + y;
                dist.y = d;
                bits |= 2;
            }
            y += cell.y;
        }

        if bits & 1 == 0 {
            dist.x /= 3.0;
        }
        if bits & 2 == 0 {
            dist.y /= 3.0;
        }
        (bits, newpt, dist)
    }

    fn corners(&self) -> [Point; 4] {
        let r = self.rect;
        [
            Point::new(r.x0, r.y0),
            Point::new(r.x1, r.y0),
            Point::new(r.x1, r.y1),
            Point::new(r.x0, r.y1),
        ]
    }
}

impl ShapeTrait for Grid {
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
        self.corners().to_vec()
    }

    fn handle_count(&self) -> usize {
        if self.flags.intersects(ShapeFlags::FIXED_LENGTH | ShapeFlags::LOCKED) {
            8
        } else {
            9
        }
    }

    fn handle_point(&self, index: usize) -> Point {
        let c = self.corners();
        match index {
            0..4 => c[index],
            4..8 => c[index - 4].midpoint(c[(index - 3) % 4]),
            _ => self.origin() + self.effective_cell(),
        }
    }

    fn handle_type(&self, index: usize) -> HandleType {
        match index {
            0..4 => HandleType::Vertex,
            4..8 => HandleType::MidPoint,
            _ => HandleType::NoSnap,
        }
    }

    fn set_handle_point(&mut self, index: usize, pt: Point, tol: f64) -> bool {
        let r = &mut self.rect;
        match index {
            0 => (r.x0, r.y0) = (pt.x, pt.y),
            1 => (r.x1, r.y0) = (pt.x, pt.y),
            2 => (r.x1, r.y1) = (pt.x, pt.y),
            3 => (r.x0, r.y1) = (pt.x, pt.y),
            4 => r.y0 = pt.y,
            5 => r.x1 = pt.x,
            6 => r.y1 = pt.y,
            7 => r.x0 = pt.x,
            _ => {
                let org = self.origin();
                let clamp = |v: f64| if v.abs() < geom::ZERO_TOL { v } else { v.max(tol / 3.0) };
                let cx = clamp((pt.x - org.x).abs());
                let cy = clamp((pt.y - org.y).abs());
                let size = geom::round_to(cx.max(cy), 1);
                self.cell = Vec2::new(size, size);
                return true;
            }
        }
        self.rect = self.rect.abs();
        true
    }

    fn edges(&self) -> Vec<(Point, Point)> {
        let c = self.corners();
        (0..4).map(|i| (c[i], c[(i + 1) % 4])).collect()
    }

    fn bounds(&self) -> Rect {
        self.rect
    }

    fn hit_test(&self, pt: Point, _tol: f64) -> HitResult {
        let mut res = hit_test_edges(&self.edges(), pt, None);
        res.inside = self.rect.contains(pt);
        res
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let c = self.corners();
        path.move_to(c[0]);
        for p in &c[1..] {
            path.line_to(*p);
        }
        path.close_path();

        let cell = self.effective_cell();
        let r = self.rect;
        if cell.x > geom::ZERO_TOL {
            let mut x = r.x0 + cell.x;
            while x < r.x1 - geom::ZERO_TOL {
                path.move_to((x, r.y0));
                path.line_to((x, r.y1));
                x += cell.x;
            }
        }
        if cell.y > geom::ZERO_TOL {
            let mut y = r.y0 + cell.y;
            while y < r.y1 - geom::ZERO_TOL {
                path.move_to((r.x0, y));
                path.line_to((r.x1, y));
                y += cell.y;
            }
        }
        path
    }

    fn transform(&mut self, affine: Affine) {
        let corners = self.corners().map(|p| affine * p);
        self.rect = super::points_bounds(&corners);
        let scaled = (affine * self.cell.to_point()) - (affine * Point::ZERO);
        self.cell = Vec2::new(scaled.x.abs(), scaled.y.abs());
    }

    fn offset(&mut self, vec: Vec2, _segment: Option<usize>) {
        self.rect = self.rect + vec;
    }

    fn is_closed(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_to_default_lines() {
        // No cell set: lines every quarter of the grid.
        let grid = Grid::new(Rect::new(0.0, 0.0, 40.0, 40.0), Vec2::ZERO);
        let (bits, pt, dists) = grid.snap(Point::new(10.5, 29.0), Vec2::new(1.0, 1.0));
        assert_eq!(bits, 3);
        assert_eq!(pt, Point::new(10.0, 30.0));
        assert!((dists.x - 0.5).abs() < 1e-9);
        assert!((dists.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_snap_misses_far_axis() {
        let grid = Grid::new(Rect::new(0.0, 0.0, 40.0, 40.0), Vec2::ZERO);
        let (bits, pt, dists) = grid.snap(Point::new(15.0, 10.2), Vec2::new(1.0, 1.0));
        assert_eq!(bits, 2);
        assert_eq!(pt.x, 15.0);
        assert!((dists.x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cell_handle_sets_square_cell() {
        let mut grid = Grid::new(Rect::new(0.0, 0.0, 40.0, 40.0), Vec2::new(5.0, 5.0));
        assert_eq!(grid.handle_count(), 9);
        assert_eq!(grid.handle_point(8), Point::new(5.0, 5.0));
        grid.set_handle_point(8, Point::new(8.04, 3.0), 1.0);
        assert_eq!(grid.cell, Vec2::new(8.0, 8.0));
        assert!(grid.is_valid(1.0));

        grid.flags.insert(ShapeFlags::LOCKED);
        assert_eq!(grid.handle_count(), 8);
    }
}
