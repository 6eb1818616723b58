//! Circular arc and sector shape.

use super::{HandleType, HitResult, ShapeFlags, ShapeId, ShapeStyle, ShapeTrait};
use crate::geom;
use kurbo::{Affine, Arc as KurboArc, BezPath, Point, Rect, Shape as _, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// A circular arc from `start_angle` sweeping `sweep` radians
/// (positive = counter-clockwise in model coordinates).
///
/// Handles: 0 = center, 1 = start point, 2 = end point, 3 = arc midpoint (fixed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub(crate) id: ShapeId,
    pub center: Point,
    pub radius: f64,
    pub start_angle: f64,
    pub sweep: f64,
    /// Draw the two radii as well, closing the outline.
    #[serde(default)]
    pub sector: bool,
    #[serde(default)]
    pub flags: ShapeFlags,
    pub style: ShapeStyle,
}

impl Arc {
    pub fn new(center: Point, radius: f64, start_angle: f64, sweep: f64) -> Self {
        Self {
            id: 0,
            center,
            radius,
            start_angle,
            sweep: sweep.clamp(-TAU, TAU),
            sector: false,
            flags: ShapeFlags::empty(),
            style: ShapeStyle::default(),
        }
    }

    /// A sector (pie slice) instead of an open arc.
    pub fn new_sector(center: Point, radius: f64, start_angle: f64, sweep: f64) -> Self {
        Self {
            sector: true,
            ..Self::new(center, radius, start_angle, sweep)
        }
    }

    pub fn set_center_radius(&mut self, center: Point, radius: f64, start_angle: f64, sweep: f64) {
        self.center = center;
        self.radius = radius;
        self.start_angle = start_angle;
        self.sweep = sweep.clamp(-TAU, TAU);
    }

    pub fn start_point(&self) -> Point {
        geom::polar_point(self.center, self.start_angle, self.radius)
    }

    pub fn end_point(&self) -> Point {
        geom::polar_point(self.center, self.start_angle + self.sweep, self.radius)
    }

    pub fn mid_point(&self) -> Point {
        geom::polar_point(self.center, self.start_angle + self.sweep / 2.0, self.radius)
    }

    /// Fit the arc through three points. Returns false for collinear input,
    /// leaving the arc unchanged.
    pub fn set_start_mid_end(&mut self, start: Point, mid: Point, end: Point) -> bool {
        let Some((center, radius)) = geom::circle_through(start, mid, end) else {
            return false;
        };
        let a_start = (start - center).atan2();
        let ccw_end = geom::to_range((end - center).atan2() - a_start, 0.0, TAU);
        let ccw_mid = geom::to_range((mid - center).atan2() - a_start, 0.0, TAU);
        let sweep = if ccw_mid <= ccw_end { ccw_end } else { ccw_end - TAU };
        self.set_center_radius(center, radius, a_start, sweep);
        true
    }

    /// Arc with a fixed center from `start` towards `end`. `last_sweep` is the
    /// sweep of the previous update, used to keep the direction stable while
    /// the end point travels across the start angle.
    pub fn set_center_start_end(&mut self, center: Point, start: Point, end: Point, last_sweep: f64) -> bool {
        let radius = start.distance(center);
        if radius < geom::ZERO_TOL || end.distance(center) < geom::ZERO_TOL {
            return false;
        }
        let a_start = (start - center).atan2();
        let a_end = (end - center).atan2();
        let mut sweep = geom::to_range(a_end - a_start, -TAU, TAU);

        if (sweep - last_sweep).abs() > PI {
            sweep += if sweep > 0.0 { -TAU } else { TAU };
        }
        if sweep.abs() < 5f64.to_radians() && last_sweep.abs() > 1.5 * PI {
            sweep = if last_sweep > 0.0 { TAU } else { -TAU };
        }
        self.set_center_radius(center, radius, a_start, sweep);
        true
    }

    fn in_sweep(&self, angle: f64) -> bool {
        if self.sweep >= 0.0 {
            geom::to_range(angle - self.start_angle, 0.0, TAU) <= self.sweep + geom::ZERO_TOL
        } else {
            geom::to_range(self.start_angle - angle, 0.0, TAU) <= -self.sweep + geom::ZERO_TOL
        }
    }

    fn kurbo_arc(&self) -> KurboArc {
        KurboArc::new(
            self.center,
            Vec2::new(self.radius, self.radius),
            self.start_angle,
            self.sweep,
            0.0,
        )
    }
}

impl ShapeTrait for Arc {
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
        vec![self.center, self.start_point(), self.end_point(), self.mid_point()]
    }

    fn handle_count(&self) -> usize {
        4
    }

    fn handle_point(&self, index: usize) -> Point {
        match index {
            0 => self.center,
            1 => self.start_point(),
            2 => self.end_point(),
            _ => self.mid_point(),
        }
    }

    fn handle_type(&self, index: usize) -> HandleType {
        match index {
            0 => HandleType::Center,
            1 | 2 => HandleType::Vertex,
            _ => HandleType::MidPoint,
        }
    }

    fn is_handle_fixed(&self, index: usize) -> bool {
        index > 2
    }

    fn set_handle_point(&mut self, index: usize, pt: Point, _tol: f64) -> bool {
        let (start, mid, end) = (self.start_point(), self.mid_point(), self.end_point());
        match index {
            0 => {
                self.center = pt;
                true
            }
            1 => self.set_start_mid_end(pt, mid, end),
            2 => self.set_start_mid_end(start, mid, pt),
            _ => self.set_start_mid_end(start, pt, end),
        }
    }

    fn edges(&self) -> Vec<(Point, Point)> {
        if self.sector {
            vec![(self.center, self.start_point()), (self.end_point(), self.center)]
        } else {
            Vec::new()
        }
    }

    fn bounds(&self) -> Rect {
        self.to_path().bounding_box()
    }

    fn hit_test(&self, pt: Point, _tol: f64) -> HitResult {
        let mut res = HitResult::miss(pt);
        if self.in_sweep((pt - self.center).atan2()) {
            res.dist = (pt.distance(self.center) - self.radius).abs();
            res.nearpt = geom::ruler_point(self.center, pt, self.radius);
            res.segment = Some(0);
        } else {
            for p in [self.start_point(), self.end_point()] {
                let d = pt.distance(p);
                if d < res.dist {
                    res.dist = d;
                    res.nearpt = p;
                    res.segment = Some(0);
                }
            }
        }
        if self.sector {
            for (i, (a, b)) in self.edges().into_iter().enumerate() {
                let (d, near) = geom::point_to_segment(pt, a, b);
                if d < res.dist {
                    res.dist = d;
                    res.nearpt = near;
                    res.segment = Some(i + 1);
                }
            }
            res.inside = pt.distance(self.center) < self.radius && self.in_sweep((pt - self.center).atan2());
        }
        res
    }

    fn to_path(&self) -> BezPath {
        let tolerance = (self.radius * 1e-3).max(1e-6);
        if !self.sector {
            return self.kurbo_arc().to_path(tolerance);
        }
        let mut path = BezPath::new();
        path.move_to(self.center);
        path.line_to(self.start_point());
        for el in self.kurbo_arc().append_iter(tolerance) {
            path.push(el);
        }
        path.close_path();
        path
    }

    fn transform(&mut self, affine: Affine) {
        let (start, mid, end) = (self.start_point(), self.mid_point(), self.end_point());
        if !self.set_start_mid_end(affine * start, affine * mid, affine * end) {
            self.center = affine * self.center;
            self.radius *= affine.determinant().abs().sqrt();
        }
    }

    fn offset(&mut self, vec: Vec2, _segment: Option<usize>) {
        self.center += vec;
    }

    fn is_closed(&self) -> bool {
        self.sector
    }

    fn is_curve(&self) -> bool {
        true
    }
}
