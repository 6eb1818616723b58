//! CAD point snapping.
//!
//! [`SnapEngine::snap_point`] corrects a raw model point to the most
//! significant feature near it: handles of other shapes, perpendicular feet,
//! intersections, parallels, tangents, nearest outline points, extensions and
//! grid lines. Three candidate slots are tracked per query: a combined XY slot
//! and one slot per axis for "same X" / "same Y" alignment. The winning
//! classification stays on the engine until the next query so the dynamic
//! layer can draw hints for it.

use crate::document::ShapeDocument;
use crate::geom::{self, ZERO_TOL};
use crate::motion::Motion;
use crate::options::Options;
use crate::render::{HandleMark, HintPen, Painter};
use crate::shapes::{HandleType, Shape, ShapeFlags, ShapeId};
use crate::view::ViewTransform;
use bitflags::bitflags;
use kurbo::{BezPath, Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Closest-outline points on a curve are accepted within this distance.
const ON_OUTLINE_TOL: f64 = 1e-4;

/// Classification of a snapped point.
///
/// The order matters: everything from [`SnapType::Point`] on is a point snap
/// that replaces both coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum SnapType {
    #[default]
    None,
    SameX,
    SameY,
    GridX,
    GridY,
    Grid,
    /// Vertex handle.
    Point,
    Center,
    MidPoint,
    Quadrant,
    OutPoint,
    Tangent,
    Intersect,
    Parallel,
    Perp,
    /// Perpendicular clipped by a crossing shape.
    PerpNear,
    NearPt,
    ExtendPt,
}

impl SnapType {
    fn from_handle(handle_type: HandleType) -> Self {
        match handle_type {
            HandleType::Vertex => SnapType::Point,
            HandleType::Center => SnapType::Center,
            HandleType::MidPoint => SnapType::MidPoint,
            HandleType::Quadrant => SnapType::Quadrant,
            HandleType::Outside | HandleType::NoSnap => SnapType::OutPoint,
        }
    }

    /// Whether both coordinates were replaced.
    pub fn is_point(self) -> bool {
        self >= SnapType::Point
    }
}

bitflags! {
    /// Snap switches, stored in the option store under one key each.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct SnapOptions: u32 {
        const GRID = 1 << 0;
        const START_MUST_VERTEX = 1 << 1;
        const VERTEX = 1 << 2;
        const CENTER = 1 << 3;
        const MIDPOINT = 1 << 4;
        const QUADRANT = 1 << 5;
        const CROSS = 1 << 6;
        const PARALLEL = 1 << 7;
        const PERP = 1 << 8;
        const PERP_OUT = 1 << 9;
        const TANGENT = 1 << 10;
        const NEAR = 1 << 11;
        const EXTEND = 1 << 12;
    }
}

const OPTION_KEYS: [(SnapOptions, &str, bool); 13] = [
    (SnapOptions::GRID, "snapGrid", true),
    (SnapOptions::START_MUST_VERTEX, "startMustVertex", false),
    (SnapOptions::VERTEX, "snapVertex", true),
    (SnapOptions::CENTER, "snapCenter", true),
    (SnapOptions::MIDPOINT, "snapMidPoint", true),
    (SnapOptions::QUADRANT, "snapQuadrant", true),
    (SnapOptions::CROSS, "snapCross", true),
    (SnapOptions::PARALLEL, "snapParallel", true),
    (SnapOptions::PERP, "snapPerp", true),
    (SnapOptions::PERP_OUT, "perpOut", false),
    (SnapOptions::TANGENT, "snapTangent", true),
    (SnapOptions::NEAR, "snapNear", true),
    (SnapOptions::EXTEND, "snapExtend", false),
];

impl SnapOptions {
    const HANDLES: SnapOptions = SnapOptions::VERTEX
        .union(SnapOptions::CENTER)
        .union(SnapOptions::MIDPOINT)
        .union(SnapOptions::QUADRANT);

    /// Read the switches from the option store. Empty when `snapEnabled` is off.
    pub fn from_options(options: &Options) -> Self {
        if !options.get_bool("snapEnabled", true) {
            return Self::empty();
        }
        OPTION_KEYS
            .iter()
            .filter(|(_, key, default)| options.get_bool(key, *default))
            .fold(Self::empty(), |bits, (flag, ..)| bits | *flag)
    }

    /// Write the switches back. An empty set only turns `snapEnabled` off.
    pub fn apply_to(self, options: &mut Options) {
        options.set_bool("snapEnabled", !self.is_empty());
        if !self.is_empty() {
            for (flag, key, _) in OPTION_KEYS {
                options.set_bool(key, self.contains(flag));
            }
        }
    }

    fn for_handle(handle_type: HandleType) -> Self {
        match handle_type {
            HandleType::Vertex => SnapOptions::VERTEX,
            HandleType::Center => SnapOptions::CENTER,
            HandleType::MidPoint => SnapOptions::MIDPOINT,
            HandleType::Quadrant => SnapOptions::QUADRANT,
            HandleType::Outside | HandleType::NoSnap => SnapOptions::empty(),
        }
    }
}

/// Read-only inputs of a snap query.
#[derive(Debug, Clone, Copy)]
pub struct SnapContext<'a> {
    pub doc: &'a ShapeDocument,
    pub options: &'a Options,
    pub xform: &'a ViewTransform,
}

/// What is being positioned by a snap query.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapRequest<'a> {
    /// Shape being drawn (id 0) or moved. `None` while placing the first point.
    pub shape: Option<&'a Shape>,
    /// Handle under the finger. Drawing commands pass their step index here.
    pub hot_handle: Option<usize>,
    /// Handle excluded from whole-shape matching.
    pub ignore_handle: Option<usize>,
    /// Shapes never used as targets. Defaults to the id of `shape`.
    pub ignore_ids: &'a [ShapeId],
}

#[derive(Debug, Clone, Copy)]
struct SnapItem {
    pt: Point,
    base: Point,
    startpt: Point,
    guide: Point,
    maxdist: f64,
    dist: f64,
    kind: SnapType,
    shape_id: ShapeId,
    /// Handle on the target; the edge for perpendiculars and near points,
    /// the second shape id for intersections.
    handle: i32,
    /// Handle of the positioned shape matched to `handle`.
    handle_src: i32,
}

impl SnapItem {
    fn new(pt: Point, maxdist: f64) -> Self {
        Self {
            pt,
            base: pt,
            startpt: pt,
            guide: pt,
            maxdist,
            dist: maxdist,
            kind: SnapType::None,
            shape_id: 0,
            handle: -1,
            handle_src: -1,
        }
    }

    fn accept(&mut self, kind: SnapType, dist: f64, base: Point, pt: Point) -> &mut Self {
        self.kind = kind;
        self.dist = dist;
        self.base = base;
        self.pt = pt;
        self
    }

    fn on(&mut self, shape_id: ShapeId, handle: i32, handle_src: i32) -> &mut Self {
        self.shape_id = shape_id;
        self.handle = handle;
        self.handle_src = handle_src;
        self
    }
}

fn index(handle: Option<usize>) -> i32 {
    handle.map_or(-1, |h| h as i32)
}

fn nearest(points: &[Point], to: Point) -> Option<Point> {
    points
        .iter()
        .copied()
        .min_by(|a, b| a.distance(to).total_cmp(&b.distance(to)))
}

fn on_outline(shape: &Shape, pt: Point) -> bool {
    shape.hit_test(pt, ON_OUTLINE_TOL).dist < ON_OUTLINE_TOL
}

/// Crossings of a circle or arc with a line-like shape, or with another
/// circle. `None` when neither shape is round and a generic path crossing is needed.
fn closed_form_crossings(a: &Shape, b: &Shape) -> Option<Vec<Point>> {
    let roots = match (a.circle_geometry(), b.circle_geometry()) {
        (Some((c1, r1)), Some((c2, r2))) => geom::cross_two_circles(c1, r1, c2, r2),
        (Some((c, r)), None) if b.is_line() || b.is_base_lines() => edge_circle_crossings(b, c, r),
        (None, Some((c, r))) if a.is_line() || a.is_base_lines() => edge_circle_crossings(a, c, r),
        _ => return None,
    };
    Some(roots.into_iter().filter(|p| on_outline(a, *p) && on_outline(b, *p)).collect())
}

fn edge_circle_crossings(shape: &Shape, center: Point, radius: f64) -> Vec<Point> {
    shape
        .edges()
        .into_iter()
        .flat_map(|(a, b)| geom::cross_line_circle(a, b, center, radius))
        .collect()
}

/// Align `new_pt` horizontally or vertically with `base_pt`.
fn snap_hv(base_pt: Point, new_pt: &mut Point, items: &mut [SnapItem; 3]) {
    let dx = (new_pt.x - base_pt.x).abs();
    let d = items[1].dist - dx;
    if d > ZERO_TOL || (d > -ZERO_TOL && (new_pt.y - base_pt.y).abs() < (new_pt.y - items[1].base.y).abs()) {
        new_pt.x = base_pt.x;
        items[1].accept(SnapType::SameX, dx, base_pt, *new_pt);
    }
    let dy = (new_pt.y - base_pt.y).abs();
    let d = items[2].dist - dy;
    if d > ZERO_TOL || (d > -ZERO_TOL && (new_pt.x - base_pt.x).abs() < (new_pt.x - items[2].base.x).abs()) {
        new_pt.y = base_pt.y;
        items[2].accept(SnapType::SameY, dy, base_pt, *new_pt);
    }
}

/// State of one snap query.
struct Query<'a> {
    doc: &'a ShapeDocument,
    orgpt: Point,
    shape: Option<&'a Shape>,
    ignore_hd: Option<usize>,
    ignore_ids: &'a [ShapeId],
    ignore_start: Option<Point>,
    opts: SnapOptions,
    handle_mask: SnapOptions,
    /// Every handle of `shape` is tried as the anchor.
    match_mode: bool,
    matchpt: Option<Point>,
    items: [SnapItem; 3],
    mid_bias: f64,
    near_bonus: f64,
    tol_near: f64,
    tol_perp: f64,
    min_len: f64,
    min_box: f64,
    snap_box: Rect,
    wnd_box: Rect,
    near_box: Rect,
}

impl Query<'_> {
    fn skip(&self, sp: &Shape) -> bool {
        sp.has_flag(ShapeFlags::NO_SNAP) || !sp.is_visible() || self.ignore_ids.contains(&sp.id())
    }

    fn is_moving(&self, sp: &Shape) -> bool {
        self.shape.is_some_and(|s| s.id() != 0 && s.id() == sp.id())
    }

    /// Handles of the moved shape usable as anchors, last first. With
    /// `with_touch` the touch point is appended as anchor `None`.
    fn anchors(&self, with_touch: bool) -> Vec<(Option<usize>, Point)> {
        let mut anchors = Vec::new();
        if let Some(shape) = self.shape.filter(|_| self.match_mode) {
            for d in (0..shape.handle_count()).rev() {
                if Some(d) != self.ignore_hd && !shape.is_handle_fixed(d) {
                    anchors.push((Some(d), shape.handle_point(d)));
                }
            }
        }
        if with_touch {
            anchors.push((None, self.orgpt));
        }
        anchors
    }

    fn run(&mut self) {
        if self.opts.is_empty()
            || self
                .shape
                .zip(self.ignore_hd)
                .is_some_and(|(s, hd)| s.handle_type(hd) > HandleType::Outside)
        {
            return;
        }
        let doc = self.doc;
        for target in doc.iter() {
            self.snap_shape(target);
        }
    }

    fn snap_shape(&mut self, target: &Shape) {
        if self.skip(target) || self.is_moving(target) {
            return;
        }
        let extent = target.bounds();
        if target.point_count() > 1 && extent.width() < self.min_box && extent.height() < self.min_box {
            return;
        }

        let opts = self.opts;
        let mut hit = false;
        if geom::rects_touch(extent, self.wnd_box) {
            hit = (!self.handle_mask.is_empty() && self.snap_handle(target))
                || (opts.contains(SnapOptions::PERP) && self.snap_perp(target))
                || (opts.contains(SnapOptions::CROSS) && self.snap_cross(target))
                || (opts.contains(SnapOptions::PARALLEL) && self.snap_parallel(target))
                || (opts.contains(SnapOptions::TANGENT) && self.snap_tangent(target));
            if !hit && opts.contains(SnapOptions::NEAR) {
                self.snap_near(target);
            }
            if !hit && opts.contains(SnapOptions::EXTEND) {
                self.snap_extend(target);
            }
        }
        if !hit && opts.contains(SnapOptions::GRID) && geom::rects_touch(extent, self.snap_box) {
            self.snap_grid(target);
        }
    }

    fn snap_handle(&mut self, sp: &Shape) -> bool {
        if matches!(sp, Shape::Arc(_)) {
            return false;
        }
        let n = sp.handle_count();
        let orgpt = self.orgpt;
        let drag_handle = match self.shape {
            None => true,
            Some(s) => {
                s.id() == 0 || self.ignore_hd.is_some_and(|hd| s.handle_point(hd) == orgpt) || n == 1
            }
        };
        // The first point of a line being drawn never snaps onto itself.
        let new_start = self
            .shape
            .filter(|s| s.id() == 0 && s.point_count() > 1)
            .map(|s| s.handle_point(0));
        let anchors = self.anchors(false);
        let mut found = false;

        for i in 0..n {
            let handle_type = sp.handle_type(i);
            let flag = SnapOptions::for_handle(handle_type);
            if flag.is_empty() || !self.handle_mask.contains(flag) {
                continue;
            }
            let pnt = sp.handle_point(i);
            let bias = if handle_type == HandleType::MidPoint { self.mid_bias } else { 0.0 };
            let kind = SnapType::from_handle(handle_type);

            let dist = pnt.distance(orgpt) + bias;
            let arr0 = &mut self.items[0];
            if drag_handle
                && dist < arr0.maxdist
                && arr0.dist > dist - ZERO_TOL
                && !new_start.is_some_and(|p| geom::same_point(p, pnt, ZERO_TOL))
            {
                arr0.accept(kind, dist, orgpt, pnt)
                    .on(sp.id(), i as i32, index(self.ignore_hd));
                found = true;
            }

            for &(d, ptd) in &anchors {
                let dist = pnt.distance(ptd) + bias;
                let arr0 = &mut self.items[0];
                if dist < arr0.maxdist && arr0.dist > dist - ZERO_TOL {
                    arr0.accept(kind, dist, ptd, pnt).on(sp.id(), i as i32, index(d));
                    self.matchpt = Some(orgpt + (pnt - ptd));
                    found = true;
                }
            }
        }
        found
    }

    fn snap_perp(&mut self, sp: &Shape) -> bool {
        let Some(shape) = self.shape.filter(|s| s.id() == 0) else {
            return false;
        };
        let Some((start, _)) = shape.as_segment() else {
            return false;
        };
        if sp.is_curve() {
            return false;
        }

        let orgpt = self.orgpt;
        let perp_out = self.opts.contains(SnapOptions::PERP_OUT);
        let mut found = false;

        for (i, (pt1, pt2)) in sp.edges().into_iter().enumerate() {
            let (d2, perp2) = geom::point_to_beeline(pt1, pt2, orgpt);
            let arr0 = self.items[0];

            if geom::is_colinear(pt1, pt2, start, self.tol_perp) {
                // The line starts on this edge: keep it perpendicular to it.
                let dist = perp2.distance(start) * 2.0;
                if d2 > 2.0 * arr0.maxdist
                    && dist < arr0.maxdist
                    && arr0.dist > dist
                    && (perp_out || geom::is_project_between(pt1, pt2, perp2))
                {
                    let item = &mut self.items[0];
                    item.accept(SnapType::Perp, dist, start, orgpt + (start - perp2))
                        .on(sp.id(), i as i32, -1);
                    item.startpt = start;
                    found = true;
                    self.clip_perp(sp, start);
                }
            } else if d2 < arr0.maxdist {
                // The end is near this edge: drop the foot from the start point.
                let (_, perp1) = geom::point_to_beeline(pt1, pt2, start);
                let dist = perp1.distance(orgpt);
                if dist < arr0.maxdist
                    && arr0.dist > dist
                    && (perp_out || geom::is_project_between(pt1, pt2, perp1))
                {
                    let item = &mut self.items[0];
                    item.accept(SnapType::Perp, dist, perp1, perp1)
                        .on(sp.id(), i as i32, sp.id() as i32);
                    item.startpt = start;
                    found = true;
                }
            }
        }
        found
    }

    /// Stop a perpendicular at the shape crossing it near the touch point.
    fn clip_perp(&mut self, sp: &Shape, start: Point) {
        if !self.opts.contains(SnapOptions::NEAR) {
            return;
        }
        let Some((id2, _)) = self.doc.hit_test(self.near_box, self.near_box.width() / 2.0) else {
            return;
        };
        let Some(sp2) = self.doc.find_shape(id2).filter(|s| s.id() != sp.id() && !self.is_moving(s)) else {
            return;
        };

        let orgpt = self.orgpt;
        let pt2 = self.items[0].pt;
        let clipped = if let Some((center, radius)) = sp2.circle_geometry() {
            nearest(&geom::cross_line_circle(start, pt2, center, radius), orgpt)
        } else {
            let mut path = BezPath::new();
            path.move_to(start);
            path.line_to(start + (pt2 - start) * 2.0);
            geom::path_crossing(&path, &sp2.to_path(), geom::box_around(orgpt, 1e10))
        };

        let item = &mut self.items[0];
        if let Some(pt) = clipped {
            item.pt = pt;
        }
        item.kind = SnapType::PerpNear;
        item.handle_src = sp2.id() as i32;
    }

    fn snap_cross(&mut self, sp1: &Shape) -> bool {
        let snap_box = geom::box_around(self.orgpt, self.items[0].maxdist);
        if sp1.point_count() < 2 || !sp1.hit_test_box(snap_box) {
            return false;
        }

        let doc = self.doc;
        let path1 = sp1.to_path();
        let mut found = false;

        for (d, ptd) in self.anchors(true) {
            for sp2 in doc.iter() {
                if self.skip(sp2)
                    || self.is_moving(sp2)
                    || sp2.id() == sp1.id()
                    || sp2.point_count() < 2
                    || !sp2.hit_test_box(snap_box)
                {
                    continue;
                }
                let cross = match closed_form_crossings(sp1, sp2) {
                    Some(roots) => nearest(&roots, ptd).filter(|p| snap_box.contains(*p)),
                    None => geom::path_crossing(&path1, &sp2.to_path(), snap_box),
                };
                let Some(ptcross) = cross else {
                    continue;
                };

                // Intersections win ties against vertices.
                let dist = ptcross.distance(ptd) - ZERO_TOL;
                let arr0 = &mut self.items[0];
                if dist < arr0.maxdist && arr0.dist > dist {
                    arr0.accept(SnapType::Intersect, dist, ptd, ptcross)
                        .on(sp1.id(), sp2.id() as i32, index(d));
                    if self.match_mode {
                        self.matchpt = Some(self.orgpt + (ptcross - ptd));
                    }
                    found = true;
                }
            }
        }
        found
    }

    fn snap_parallel(&mut self, sp1: &Shape) -> bool {
        let kind = self.items[0].kind;
        let Some(shape) = self.shape.filter(|s| s.id() == 0) else {
            return false;
        };
        if kind == SnapType::NearPt || kind == SnapType::ExtendPt {
            return false;
        }
        let (Some((start, _)), Some((a, b))) = (shape.as_segment(), sp1.as_segment()) else {
            return false;
        };

        let orgpt = self.orgpt;
        let angle2 = (b - a).atan2();
        let diff = geom::angle_diff(angle2, (orgpt - start).atan2()).abs();
        let step = 3f64.to_radians();
        let angle1 = if diff < step {
            angle2
        } else if (diff - PI).abs() < step {
            angle2 + PI
        } else {
            return false;
        };

        let len = orgpt.distance(start);
        if len < self.min_len || a.distance(b) < self.min_len {
            return false;
        }
        let to = geom::polar_point(start, angle1, len);
        let dist = orgpt.distance(to);
        let arr0 = &mut self.items[0];
        if dist < arr0.maxdist && arr0.dist > dist {
            arr0.accept(SnapType::Parallel, dist, orgpt, to).on(sp1.id(), -1, 1);
            return true;
        }
        false
    }

    fn snap_tangent(&mut self, target: &Shape) -> bool {
        let Some(mover) = self.shape else {
            return false;
        };
        let c1 = target.as_circle().is_some();
        let c2 = mover.as_circle().is_some();
        let l1 = target.is_line();
        let l2 = mover.is_line();
        if !((c1 || c2) && (c1 || l1) && (c2 || l2)) || (c1 && c2) {
            return false;
        }

        let (circle, line) = if c2 { (mover, target) } else { (target, mover) };
        let (Some((mut cen, mut r)), Some((la, lb))) = (circle.as_circle(), line.as_segment()) else {
            return false;
        };
        let orgpt = self.orgpt;
        let hd = self.ignore_hd;
        let moved_type = hd.filter(|_| c2).map(|h| circle.handle_type(h));

        if moved_type == Some(HandleType::Center) {
            cen = orgpt;
        } else if moved_type.is_some() {
            r = cen.distance(orgpt);
        }
        if r < ZERO_TOL {
            return false;
        }

        // Fixed end and moving end of the line.
        let (pt1, pt2) = match hd {
            Some(h) if !c2 && h < 2 => (if h == 0 { lb } else { la }, orgpt),
            Some(_) if !c2 => return false,
            _ => (la, lb),
        };
        let (dist, perp) = geom::point_to_beeline(pt1, pt2, cen);
        let arr0 = self.items[0];
        if (dist - r).abs() >= arr0.dist || !geom::is_project_between(pt1, pt2, perp) {
            return false;
        }
        let on_circle = geom::ruler_point(cen, perp, r);

        if c2 && hd.is_some() && (mover.id() == 0 || moved_type == Some(HandleType::Quadrant)) {
            // Resizing a circle until it touches the line.
            let item = &mut self.items[0];
            item.accept(SnapType::Tangent, (dist - r).abs(), on_circle, perp)
                .on(line.id(), -2, -1);
            item.startpt = perp;
            item.guide = on_circle;
            if self.match_mode {
                self.matchpt = Some(orgpt + (perp - on_circle));
            }
            true
        } else if self.match_mode || hd.is_none() || moved_type == Some(HandleType::Center) {
            // Translating the circle or the line until they touch.
            let (base, pt) = if c2 { (on_circle, perp) } else { (perp, on_circle) };
            let touched = if c2 { line.id() } else { circle.id() };
            self.items[0]
                .accept(SnapType::Tangent, (dist - r).abs(), base, pt)
                .on(touched, if c2 { 0 } else { -1 }, -1);
            if self.match_mode {
                self.matchpt = Some(orgpt + (pt - base));
            }
            true
        } else if !c2 {
            // Rotating the line about its fixed end until it touches the circle.
            let solved = if (pt1.distance(cen) - r).abs() < r * 1e-4 {
                let radial = cen - pt1;
                let (d, foot) = geom::point_to_beeline(pt1, pt1 + Vec2::new(-radial.y, radial.x), orgpt);
                Some((pt1, d, foot))
            } else {
                let roots = geom::cross_two_circles(pt1.midpoint(cen), pt1.distance(cen) / 2.0, cen, r);
                nearest(&roots, perp).map(|tanpt| {
                    let (d, foot) = geom::point_to_beeline(pt1, tanpt, orgpt);
                    (tanpt, d, foot)
                })
            };
            let Some((tanpt, dist, foot)) = solved else {
                return false;
            };
            if arr0.dist > dist {
                let item = &mut self.items[0];
                item.accept(SnapType::Tangent, dist, tanpt, foot).on(circle.id(), -1, index(hd));
                item.startpt = pt1;
                item.guide = cen;
                return true;
            }
            false
        } else {
            false
        }
    }

    fn snap_near(&mut self, sp: &Shape) {
        let kind = self.items[0].kind;
        if (kind >= SnapType::Grid && kind < SnapType::NearPt && kind != SnapType::Parallel) || sp.point_count() < 2 {
            return;
        }
        let mut min_dist = if kind >= SnapType::NearPt {
            self.items[0].dist - self.near_bonus
        } else {
            self.tol_near
        };
        let ignore = self
            .ignore_start
            .filter(|p| (0..sp.handle_count()).any(|i| geom::same_point(sp.handle_point(i), *p, ZERO_TOL)));

        for (d, ptd) in self.anchors(true) {
            let res = sp.hit_test_ignoring(ptd, self.tol_near, ignore);
            if min_dist > res.dist {
                min_dist = res.dist;
                self.items[0]
                    .accept(SnapType::NearPt, res.dist + self.near_bonus, ptd, res.nearpt)
                    .on(sp.id(), index(res.segment), index(d));
                if self.match_mode {
                    self.matchpt = Some(self.orgpt + (res.nearpt - ptd));
                }
            }
        }
    }

    fn snap_extend(&mut self, sp: &Shape) {
        let kind = self.items[0].kind;
        let n = sp.point_count();
        let (Some(shape), Some(start)) = (self.shape, self.ignore_start) else {
            return;
        };
        if (kind >= SnapType::Grid && kind < SnapType::NearPt && kind != SnapType::Parallel)
            || sp.is_curve()
            || !shape.is_line()
            || !(2..=6).contains(&n)
            || self.match_mode
        {
            return;
        }
        let points = sp.points();
        let Some(ih) = points.iter().position(|p| geom::same_point(*p, start, ZERO_TOL)) else {
            return;
        };

        let closed = sp.is_closed();
        let mut min_dist = if kind >= SnapType::NearPt {
            self.items[0].dist - self.near_bonus
        } else {
            self.tol_near
        };
        for (i, &pt2) in points.iter().enumerate() {
            let adjacent = i.abs_diff(ih) == 1 || (closed && i.abs_diff(ih) == n - 1);
            if !adjacent {
                continue;
            }
            let (dist, near) = geom::point_to_beeline(start, pt2, self.orgpt);
            if min_dist > dist && geom::project_scale(start, pt2, near) < -ZERO_TOL {
                min_dist = dist;
                let edge = if i.abs_diff(ih) == 1 { i.min(ih) } else { n - 1 };
                let item = &mut self.items[0];
                item.accept(SnapType::ExtendPt, dist + self.near_bonus, self.orgpt, near)
                    .on(sp.id(), edge as i32, -1);
                item.guide = pt2;
                item.startpt = start;
            }
        }
    }

    fn snap_grid(&mut self, sp: &Shape) {
        let Some(grid) = sp.as_grid() else {
            return;
        };
        let (bits, newpt, dists) = grid.snap(self.orgpt, Vec2::new(self.items[1].dist, self.items[2].dist));
        if bits & 1 != 0 {
            self.items[1].accept(SnapType::GridX, dists.x, newpt, newpt);
        }
        if bits & 2 != 0 {
            self.items[2].accept(SnapType::GridY, dists.y, newpt, newpt);
        }

        for (d, ptd) in self.anchors(false) {
            let arr0 = self.items[0].dist;
            let limits = Vec2::new(arr0.min(self.items[1].dist), arr0.min(self.items[2].dist));
            let (bits, newpt, _) = grid.snap(ptd, limits);
            let dist = newpt.distance(ptd);
            if bits & 3 == 3 && arr0 > dist - ZERO_TOL {
                self.items[0]
                    .accept(SnapType::Grid, dist, ptd, newpt)
                    .on(sp.id(), -1, index(d));
                self.matchpt = Some(self.orgpt + (newpt - ptd));
            }
        }
    }
}

/// Snap engine with the result of the last query.
#[derive(Debug, Clone)]
pub struct SnapEngine {
    pt: Point,
    base: [Point; 2],
    startpt: Point,
    guide: Point,
    types: [SnapType; 2],
    shape_id: ShapeId,
    handle: i32,
    handle_src: i32,
    ignore_start: Option<Point>,
}

impl Default for SnapEngine {
    fn default() -> Self {
        Self {
            pt: Point::ZERO,
            base: [Point::ZERO; 2],
            startpt: Point::ZERO,
            guide: Point::ZERO,
            types: [SnapType::None; 2],
            shape_id: 0,
            handle: -1,
            handle_src: -1,
            ignore_start: None,
        }
    }
}

impl SnapEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Correct `orgpt` against the document and return the snapped point.
    ///
    /// When an existing shape is moved as a whole, the returned point is the
    /// touch point shifted by the vector that lands the matched handle on
    /// its target, so applying it moves the shape rigidly.
    pub fn snap_point(&mut self, ctx: &SnapContext<'_>, orgpt: Point, req: SnapRequest<'_>) -> Point {
        let opts = SnapOptions::from_options(ctx.options);
        let mm = |key: &str, default: f64| ctx.xform.display_mm_to_model(ctx.options.get_float(key, default));

        let start_must_vertex = req.shape.is_none()
            && req.hot_handle == Some(1)
            && req.ignore_handle.is_none()
            && opts.contains(SnapOptions::START_MUST_VERTEX);
        let own_id = [req.shape.map_or(0, Shape::id)];
        let ignore_ids = if req.ignore_ids.is_empty() { &own_id[..] } else { req.ignore_ids };
        let count = req.shape.map_or(0, Shape::handle_count);
        let hot = req.hot_handle.filter(|&h| h < count);
        let ignore_hd = req.ignore_handle.filter(|&h| h < count);
        self.pt = orgpt;

        let xytol = if start_must_vertex { 1e5 } else { mm("snapPointTol", 4.0) };
        let xtol = mm("snapXTol", 1.0);
        let mut items = [
            SnapItem::new(orgpt, xytol),
            SnapItem::new(orgpt, xtol),
            SnapItem::new(orgpt, xtol),
        ];

        if let (Some(shape), Some(h)) = (req.shape, hot) {
            let straight = !shape.is_curve() && !matches!(shape, Shape::Rectangle(_) | Shape::Grid(_));
            if shape.id() == 0 && h > 0 && straight {
                let mut pt = orgpt;
                snap_hv(shape.handle_point(h - 1), &mut pt, &mut items);
            }
        }

        let match_mode = req.shape.is_some_and(|s| {
            s.id() != 0
                && (hot.is_none()
                    || ignore_hd.is_some_and(|i| Some(i) != hot)
                    || hot.is_some_and(|h| s.handle_type(h) == HandleType::Center))
        });

        let tol_near = mm("snapNearTol", 3.0);
        let mut wnd_box = ctx.xform.wnd_rect_model();
        if let Some(shape) = req.shape {
            wnd_box = wnd_box.union(shape.bounds().inflate(xytol, xytol));
        }
        let near_half = if opts.contains(SnapOptions::NEAR) { tol_near / 2.0 } else { 0.0 };

        let mut query = Query {
            doc: ctx.doc,
            orgpt,
            shape: req.shape,
            ignore_hd: ignore_hd.or(hot),
            ignore_ids,
            ignore_start: self.ignore_start,
            opts,
            handle_mask: if start_must_vertex {
                SnapOptions::VERTEX
            } else {
                opts & SnapOptions::HANDLES
            },
            match_mode,
            matchpt: None,
            items,
            mid_bias: mm("snapMidPointBias", 0.5),
            near_bonus: ctx.xform.display_mm_to_model(4.0),
            tol_near,
            tol_perp: ctx.xform.display_mm_to_model(1.0),
            min_len: ctx.xform.display_mm_to_model(5.0),
            min_box: ctx.xform.display_to_model_len(2.0),
            snap_box: geom::box_around(orgpt, xytol),
            wnd_box,
            near_box: geom::box_around(orgpt, near_half),
        };
        query.run();
        self.check_result(&query.items, hot);

        let mut pnt = match query.matchpt {
            Some(pt) if match_mode => pt,
            _ => self.pt,
        };
        if query.items.iter().all(|item| item.kind == SnapType::None) {
            let decimal = ctx.options.get_int("snapRoundCell", 1) as i32;
            let unit = ctx.xform.display_mm_to_model(1.0);
            pnt.x = geom::round_to(pnt.x / unit, decimal) * unit;
            pnt.y = geom::round_to(pnt.y / unit, decimal) * unit;
        }
        pnt
    }

    fn check_result(&mut self, items: &[SnapItem; 3], hot: Option<usize>) {
        let arr0 = &items[0];
        if arr0.kind != SnapType::None {
            self.pt = arr0.pt;
            self.base[0] = arr0.base;
            self.types = [arr0.kind, SnapType::None];
            self.shape_id = arr0.shape_id;
            self.handle = arr0.handle;
            self.handle_src = arr0.handle_src;
            self.startpt = arr0.startpt;
            self.guide = arr0.guide;
            if self.handle_src < 0
                && matches!(arr0.kind, SnapType::NearPt | SnapType::ExtendPt | SnapType::Point)
            {
                self.handle_src = index(hot);
            }
        } else {
            self.shape_id = 0;
            self.handle = -1;
            self.handle_src = -1;
            self.types = [items[1].kind, items[2].kind];
            if items[1].kind != SnapType::None {
                self.pt.x = items[1].pt.x;
                self.base[0] = items[1].base;
            }
            if items[2].kind != SnapType::None {
                self.pt.y = items[2].pt.y;
                self.base[1] = items[2].base;
            }
        }
    }

    /// Classification of the last query: a point type, `Grid` when both grid
    /// axes matched, or `None`.
    pub fn snapped_type(&self) -> SnapType {
        if self.types[0].is_point() {
            self.types[0]
        } else if self.types == [SnapType::GridX, SnapType::GridY] {
            SnapType::Grid
        } else {
            SnapType::None
        }
    }

    /// Reference point and snapped point of the last query.
    pub fn snapped_point(&self) -> (Point, Point) {
        (self.base[0], self.pt)
    }

    /// Auxiliary points for hints: perpendicular start and guide point.
    pub fn snapped_aux(&self) -> (Point, Point) {
        (self.startpt, self.guide)
    }

    /// Target shape, its matched handle and the matched handle of the
    /// positioned shape. The shape id is 0 when nothing was hit.
    pub fn snapped_handle(&self) -> (ShapeId, i32, i32) {
        (self.shape_id, self.handle, self.handle_src)
    }

    /// Exclude edges meeting at `pt` from near-point snapping, and use it as
    /// the origin of extension snapping.
    pub fn set_ignore_start_point(&mut self, pt: Point) {
        self.ignore_start = Some(pt);
    }

    /// Forget the last result. Returns true if hints were visible.
    pub fn clear_snap(&mut self) -> bool {
        self.ignore_start = None;
        let visible = self.types != [SnapType::None; 2];
        self.types = [SnapType::None; 2];
        visible
    }

    /// Draw hints for the last result. Only while dragging, or always for
    /// stylus input.
    pub fn draw_snap(&self, doc: &ShapeDocument, xform: &ViewTransform, motion: &Motion, painter: &mut dyn Painter) -> bool {
        if !motion.dragging() && xform.use_finger() {
            return false;
        }
        let mm = |v: f64| xform.display_mm_to_model(v);
        let kind = self.types[0];

        if kind >= SnapType::Grid {
            let small = kind >= SnapType::NearPt || kind < SnapType::Point;
            let r = mm(if small { 3.0 } else { 8.0 });
            let pen = HintPen::new(Color::from_rgba8(0, 255, 0, 200), 0.0)
                .dashed()
                .filled(Color::from_rgba8(0, 200, 200, 32));

            match kind {
                SnapType::Perp | SnapType::PerpNear => {
                    painter.draw_circle(self.base[0], r, &pen);
                    self.draw_perp_mark(doc, xform, painter);
                }
                SnapType::Tangent if self.handle_src >= 0 => {
                    painter.draw_circle(self.base[0], r, &pen);
                    let guide_pen = HintPen::new(Color::from_rgba8(0, 255, 0, 200), 0.0).dashed();
                    painter.draw_line(self.base[0], self.guide, &guide_pen);
                    perp_mark(painter, self.startpt, self.pt, self.base[0], self.guide, mm(2.4));
                    painter.draw_handle(self.base[0], HandleMark::Snap);
                }
                _ => {
                    if kind == SnapType::Parallel {
                        if let Some((a, b)) = doc.find_shape(self.shape_id).and_then(Shape::as_segment) {
                            let aux = HintPen { width: 0.0, ..pen };
                            painter.draw_line(a, b, &aux);
                            painter.draw_handle(a.midpoint(b), HandleMark::Snap);
                        }
                    }
                    painter.draw_circle(self.pt, r, &pen);
                    painter.draw_handle(self.pt, HandleMark::Snap);
                    if kind == SnapType::ExtendPt {
                        let ray = HintPen::new(Color::from_rgba8(0, 255, 0, 172), 0.0).dashed();
                        let reach = xform.wnd_rect_model().size().to_vec2().hypot();
                        let end = geom::ruler_point(self.startpt, self.startpt + (self.startpt - self.guide), reach);
                        painter.draw_line(self.startpt, end, &ray);
                    }
                }
            }
            true
        } else {
            let pen = HintPen::new(Color::from_rgba8(0, 255, 0, 200), 0.0)
                .dashed()
                .filled(Color::from_rgba8(0, 255, 0, 64));
            let cross = HintPen::new(Color::from_rgba8(0, 255, 0, 200), 0.0);
            let mut drawn = false;

            for (axis, (kind, grid_kind)) in [(self.types[0], SnapType::GridX), (self.types[1], SnapType::GridY)]
                .into_iter()
                .enumerate()
            {
                if kind == SnapType::None {
                    continue;
                }
                let base = self.base[axis];
                if base == self.pt {
                    if kind == grid_kind {
                        let half = mm(12.0);
                        let vec = if axis == 0 { Vec2::new(0.0, half) } else { Vec2::new(half, 0.0) };
                        painter.draw_line(self.pt - vec, self.pt + vec, &cross);
                        painter.draw_circle(base, mm(4.0), &pen);
                        drawn = true;
                    }
                } else {
                    painter.draw_line(base, self.pt, &pen);
                    painter.draw_circle(base, mm(2.5), &pen);
                    drawn = true;
                }
            }
            drawn
        }
    }

    fn draw_perp_mark(&self, doc: &ShapeDocument, xform: &ViewTransform, painter: &mut dyn Painter) {
        let Some(sp) = doc.find_shape(self.shape_id) else {
            return;
        };
        let Some((pt1, pt2)) = usize::try_from(self.handle).ok().and_then(|i| sp.edges().get(i).copied()) else {
            return;
        };
        let r = xform.display_mm_to_model(1.2);
        let pen = HintPen::new(Color::from_rgba8(0, 255, 0, 200), 0.0);

        if self.types[0] == SnapType::PerpNear {
            painter.draw_circle(self.pt, xform.display_mm_to_model(4.0), &pen);
            painter.draw_handle(self.pt, HandleMark::Snap);
        }
        let far = if self.pt == self.base[0] { self.startpt } else { self.pt };
        perp_mark(painter, pt1, pt2, self.base[0], far, 2.0 * r);
        painter.draw_line(pt1, pt2, &pen);

        let dot = pen.filled(Color::from_rgba8(0, 255, 0, 64));
        for end in [pt1, pt2] {
            if end.distance(self.base[0]) > r {
                painter.draw_circle(end, r, &dot);
            }
        }
    }
}

/// Right-angle mark at `perp` between the line `a`-`b` and the direction to `c`.
fn perp_mark(painter: &mut dyn Painter, a: Point, b: Point, perp: Point, c: Point, len: f64) {
    let pen = HintPen::new(Color::from_rgba8(255, 255, 0, 200), 0.0);
    let toward = if a.distance(perp) > b.distance(perp) { a } else { b };
    let m1 = geom::ruler_point(perp, toward, len);
    let m3 = geom::ruler_point(perp, c, len);
    let corner = m1 + (m3 - perp);
    painter.draw_line(m1, corner, &pen);
    painter.draw_line(corner, m3, &pen);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingPainter;
    use crate::shapes::{Circle, Grid, Line, Lines};
    use crate::view::ViewConfig;
    use crate::motion::GestureState;

    const EPS: f64 = 1e-9;

    struct Fixture {
        doc: ShapeDocument,
        options: Options,
        xform: ViewTransform,
        engine: SnapEngine,
    }

    impl Fixture {
        fn new() -> Self {
            // One model unit per display millimetre, origin mid-window.
            let xform = ViewTransform::new(ViewConfig {
                dpi: 25.4,
                offset: Vec2::new(500.0, 400.0),
                ..ViewConfig::default()
            });
            Self {
                doc: ShapeDocument::new(),
                options: Options::new(),
                xform,
                engine: SnapEngine::new(),
            }
        }

        fn add(&mut self, shape: Shape) -> ShapeId {
            self.doc.add_shape(shape)
        }

        fn snap(&mut self, pt: Point, req: SnapRequest<'_>) -> Point {
            let ctx = SnapContext {
                doc: &self.doc,
                options: &self.options,
                xform: &self.xform,
            };
            self.engine.snap_point(&ctx, pt, req)
        }
    }

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> Shape {
        Shape::Line(Line::new(Point::new(x0, y0), Point::new(x1, y1)))
    }

    fn assert_near(a: Point, b: Point) {
        assert!(a.distance(b) < 1e-6, "{a:?} != {b:?}");
    }

    #[test]
    fn test_vertex_snap_at_shared_corner() {
        let mut fx = Fixture::new();
        fx.add(line(0.0, 0.0, 10.0, 0.0));
        fx.add(line(0.0, 0.0, 0.0, 10.0));

        let pt = fx.snap(Point::new(0.05, 0.05), SnapRequest::default());
        assert_near(pt, Point::ZERO);
        assert_eq!(fx.engine.snapped_type(), SnapType::Point);
        let (id, handle, _) = fx.engine.snapped_handle();
        assert_ne!(id, 0);
        assert_eq!(handle, 0);
    }

    #[test]
    fn test_quadrant_snap_on_circle_by_default() {
        let mut fx = Fixture::new();
        fx.add(Shape::Circle(Circle::new(Point::new(10.0, 10.0), 5.0)));

        let pt = fx.snap(Point::new(15.3, 10.2), SnapRequest::default());
        assert_near(pt, Point::new(15.0, 10.0));
        assert_eq!(fx.engine.snapped_type(), SnapType::Quadrant);

        fx.options.set_bool("snapQuadrant", false);
        let pt = fx.snap(Point::new(15.3, 10.2), SnapRequest::default());
        assert_eq!(fx.engine.snapped_type(), SnapType::NearPt);
        assert!((pt.distance(Point::new(10.0, 10.0)) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_near_point_on_circle_outline() {
        let mut fx = Fixture::new();
        fx.add(Shape::Circle(Circle::new(Point::new(10.0, 10.0), 5.0)));
        fx.options.set_bool("snapQuadrant", false);

        let dir = Vec2::from_angle(PI / 4.0);
        let pt = fx.snap(Point::new(10.0, 10.0) + dir * 5.5, SnapRequest::default());
        assert_eq!(fx.engine.snapped_type(), SnapType::NearPt);
        assert!((pt.distance(Point::new(10.0, 10.0)) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_perpendicular_foot_from_line_start() {
        let mut fx = Fixture::new();
        fx.add(line(0.0, 0.0, 20.0, 0.0));
        let drawing = line(6.0, -8.0, 6.5, 0.8);

        let pt = fx.snap(
            Point::new(6.5, 0.8),
            SnapRequest {
                shape: Some(&drawing),
                hot_handle: Some(1),
                ..Default::default()
            },
        );
        assert_near(pt, Point::new(6.0, 0.0));
        assert_eq!(fx.engine.snapped_type(), SnapType::Perp);
        let (from, to) = fx.engine.snapped_point();
        assert_near(from, to);
    }

    #[test]
    fn test_perpendicular_outside_segment_needs_perp_out() {
        let mut fx = Fixture::new();
        fx.add(line(0.0, 0.0, 20.0, 0.0));
        let drawing = line(30.0, -8.0, 30.5, 0.8);
        let req = SnapRequest {
            shape: Some(&drawing),
            hot_handle: Some(1),
            ..Default::default()
        };

        fx.snap(Point::new(30.5, 0.8), req);
        assert_ne!(fx.engine.snapped_type(), SnapType::Perp);

        fx.options.set_bool("perpOut", true);
        let pt = fx.snap(Point::new(30.5, 0.8), req);
        assert_eq!(fx.engine.snapped_type(), SnapType::Perp);
        assert_near(pt, Point::new(30.0, 0.0));
    }

    #[test]
    fn test_perpendicular_foot_on_open_polyline() {
        let mut fx = Fixture::new();
        let mut corner = Lines::new(vec![Point::ZERO, Point::new(20.0, 0.0), Point::new(20.0, 20.0)], false);
        fx.add(Shape::Lines(corner.clone()));

        let drawing = line(6.0, -8.0, 6.5, 0.8);
        let pt = fx.snap(
            Point::new(6.5, 0.8),
            SnapRequest {
                shape: Some(&drawing),
                hot_handle: Some(1),
                ..Default::default()
            },
        );
        assert_near(pt, Point::new(6.0, 0.0));
        assert_eq!(fx.engine.snapped_type(), SnapType::Perp);

        // No closing edge from (20,20) back to the origin while open.
        let diagonal = line(0.0, 10.0, 5.3, 5.4);
        let req = SnapRequest {
            shape: Some(&diagonal),
            hot_handle: Some(1),
            ..Default::default()
        };
        fx.snap(Point::new(5.3, 5.4), req);
        assert_ne!(fx.engine.snapped_type(), SnapType::Perp);

        let mut closed = Fixture::new();
        corner.set_closed(true);
        closed.add(Shape::Lines(corner));
        let pt = closed.snap(Point::new(5.3, 5.4), req);
        assert_eq!(closed.engine.snapped_type(), SnapType::Perp);
        assert_near(pt, Point::new(5.0, 5.0));
    }

    #[test]
    fn test_parallel_to_line() {
        let mut fx = Fixture::new();
        let id = fx.add(line(0.0, 0.0, 20.0, 0.0));
        let drawing = line(5.0, 10.0, 15.0, 10.25);

        let pt = fx.snap(
            Point::new(15.0, 10.25),
            SnapRequest {
                shape: Some(&drawing),
                hot_handle: Some(1),
                ..Default::default()
            },
        );
        assert_eq!(fx.engine.snapped_type(), SnapType::Parallel);
        assert_eq!(fx.engine.snapped_handle().0, id);
        // Same length as the drawn segment, turned onto the target direction.
        assert_near(pt, Point::new(5.0 + 100.0625f64.sqrt(), 10.0));
    }

    #[test]
    fn test_tangent_from_line_start_to_circle() {
        let mut fx = Fixture::new();
        let id = fx.add(Shape::Circle(Circle::new(Point::ZERO, 5.0)));
        let start = Point::new(0.0, 10.0);
        let drawing = Shape::Line(Line::new(start, Point::new(5.3, 1.1)));

        let pt = fx.snap(
            Point::new(5.3, 1.1),
            SnapRequest {
                shape: Some(&drawing),
                hot_handle: Some(1),
                ..Default::default()
            },
        );
        assert_eq!(fx.engine.snapped_type(), SnapType::Tangent);
        assert_eq!(fx.engine.snapped_handle().0, id);
        let (dist, _) = geom::point_to_beeline(start, pt, Point::ZERO);
        assert!((dist - 5.0).abs() < 1e-6);
        assert!(pt.distance(Point::new(5.178813, 1.030089)) < 1e-4);
        let (tangent_pt, _) = fx.engine.snapped_point();
        assert_near(tangent_pt, Point::new(2.5 * 3f64.sqrt(), 2.5));
    }

    #[test]
    fn test_intersection_of_two_lines() {
        let mut fx = Fixture::new();
        fx.add(line(0.0, 0.0, 30.0, 30.0));
        fx.add(line(0.0, 20.0, 40.0, -20.0));

        let pt = fx.snap(Point::new(10.6, 10.3), SnapRequest::default());
        assert_eq!(fx.engine.snapped_type(), SnapType::Intersect);
        assert_near(pt, Point::new(10.0, 10.0));
    }

    #[test]
    fn test_line_crossing_circle() {
        let mut fx = Fixture::new();
        fx.add(Shape::Circle(Circle::new(Point::ZERO, 10.0)));
        fx.add(line(-20.0, 3.0, 20.0, 3.0));

        let pt = fx.snap(Point::new(9.0, 3.5), SnapRequest::default());
        assert_eq!(fx.engine.snapped_type(), SnapType::Intersect);
        assert_near(pt, Point::new(91f64.sqrt(), 3.0));
    }

    #[test]
    fn test_grid_lines_snap_per_axis() {
        let mut fx = Fixture::new();
        fx.add(Shape::Grid(Grid::new(
            Rect::new(0.0, 0.0, 40.0, 40.0),
            Vec2::new(10.0, 10.0),
        )));

        let pt = fx.snap(Point::new(12.6, 17.7), SnapRequest::default());
        assert_near(pt, Point::new(15.0, 20.0));
        assert_eq!(fx.engine.snapped_type(), SnapType::Grid);
    }

    #[test]
    fn test_rounds_when_nothing_snaps() {
        let mut fx = Fixture::new();
        let pt = fx.snap(Point::new(1.234, 5.678), SnapRequest::default());
        assert!((pt.x - 1.2).abs() < EPS);
        assert!((pt.y - 5.7).abs() < EPS);
        assert_eq!(fx.engine.snapped_type(), SnapType::None);
        assert_eq!(fx.engine.snapped_handle().0, 0);
    }

    #[test]
    fn test_disabled_snap_ignores_shapes() {
        let mut fx = Fixture::new();
        fx.add(line(0.0, 0.0, 10.0, 0.0));
        SnapOptions::empty().apply_to(&mut fx.options);

        let pt = fx.snap(Point::new(0.3, 0.3), SnapRequest::default());
        assert_near(pt, Point::new(0.3, 0.3));
        assert_eq!(fx.engine.snapped_type(), SnapType::None);
    }

    #[test]
    fn test_ignored_ids_are_not_targets() {
        let mut fx = Fixture::new();
        let id = fx.add(line(0.0, 0.0, 10.0, 0.0));

        fx.snap(
            Point::new(0.2, 0.2),
            SnapRequest {
                ignore_ids: &[id],
                ..Default::default()
            },
        );
        assert_eq!(fx.engine.snapped_type(), SnapType::None);
    }

    #[test]
    fn test_snap_is_idempotent() {
        let mut fx = Fixture::new();
        fx.add(line(0.0, 0.0, 10.0, 0.0));
        fx.add(Shape::Circle(Circle::new(Point::new(12.0, 3.0), 4.0)));

        let query = Point::new(9.1, 1.2);
        let first = fx.snap(query, SnapRequest::default());
        let first_state = (fx.engine.snapped_type(), fx.engine.snapped_handle());
        let second = fx.snap(query, SnapRequest::default());
        assert_eq!(first, second);
        assert_eq!(first_state, (fx.engine.snapped_type(), fx.engine.snapped_handle()));
    }

    #[test]
    fn test_whole_shape_drag_matches_vertex() {
        let mut fx = Fixture::new();
        fx.add(line(0.0, 0.0, 0.0, 10.0));
        let moved_id = fx.add(line(30.0, 30.0, 40.0, 30.0));

        let mut clone = fx.doc.find_shape(moved_id).cloned().unwrap();
        clone.offset(Vec2::new(-29.0, -29.5), None);

        let pt = fx.snap(
            Point::new(20.0, 20.0),
            SnapRequest {
                shape: Some(&clone),
                ..Default::default()
            },
        );
        assert_near(pt, Point::new(19.0, 19.5));
        assert_eq!(fx.engine.snapped_type(), SnapType::Point);
        assert_eq!(fx.engine.snapped_handle().2, 0);
    }

    #[test]
    fn test_start_must_vertex_reaches_far_vertex() {
        let mut fx = Fixture::new();
        fx.add(line(0.0, 0.0, 100.0, 0.0));
        fx.options.set_bool("startMustVertex", true);

        let pt = fx.snap(
            Point::new(20.0, 30.0),
            SnapRequest {
                hot_handle: Some(1),
                ..Default::default()
            },
        );
        assert_near(pt, Point::ZERO);
    }

    #[test]
    fn test_same_x_against_previous_point() {
        let mut fx = Fixture::new();
        let drawing = line(5.0, 5.0, 5.4, 30.0);

        let pt = fx.snap(
            Point::new(5.4, 30.0),
            SnapRequest {
                shape: Some(&drawing),
                hot_handle: Some(1),
                ..Default::default()
            },
        );
        assert!((pt.x - 5.0).abs() < EPS);
        assert!((pt.y - 30.0).abs() < EPS);
        assert_eq!(fx.engine.snapped_type(), SnapType::None);
        assert_eq!(fx.engine.snapped_point().0, Point::new(5.0, 5.0));
    }

    #[test]
    fn test_draw_snap_hints() {
        let mut fx = Fixture::new();
        fx.add(line(0.0, 0.0, 10.0, 0.0));
        fx.snap(Point::new(0.1, 0.1), SnapRequest::default());

        let mut motion = Motion::new();
        let mut painter = RecordingPainter::default();
        assert!(!fx.engine.draw_snap(&fx.doc, &fx.xform, &motion, &mut painter));

        motion.gesture_state = GestureState::Moved;
        assert!(fx.engine.draw_snap(&fx.doc, &fx.xform, &motion, &mut painter));
        assert_eq!(painter.circles.len(), 1);
        assert_eq!(painter.handles, vec![(Point::ZERO, HandleMark::Snap)]);

        assert!(fx.engine.clear_snap());
        assert!(!fx.engine.clear_snap());
    }

    #[test]
    fn test_snap_options_roundtrip() {
        let mut options = Options::new();
        let defaults = SnapOptions::from_options(&options);
        assert!(defaults.contains(SnapOptions::VERTEX | SnapOptions::GRID | SnapOptions::NEAR | SnapOptions::QUADRANT));
        assert!(!defaults.intersects(SnapOptions::PERP_OUT | SnapOptions::EXTEND));

        let bits = SnapOptions::VERTEX | SnapOptions::QUADRANT;
        bits.apply_to(&mut options);
        assert_eq!(SnapOptions::from_options(&options), bits);
        assert!(!options.get_bool("snapGrid", true));
    }
}
