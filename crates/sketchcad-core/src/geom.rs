//! Geometric helpers shared by shapes and the snap engine.
//!
//! Everything here is a pure function over kurbo value types. Degenerate input
//! (zero-length directions, collinear triples) yields `None` or an empty result
//! instead of a panic, so callers can simply skip the test that needed it.

use kurbo::{BezPath, PathEl, Point, Rect, Vec2};
use std::f64::consts::PI;

/// Values below this are treated as zero.
pub const ZERO_TOL: f64 = 1e-7;

/// Distance from `pt` to the infinite line through `a` and `b`, together with
/// the foot of the perpendicular.
pub fn point_to_beeline(a: Point, b: Point, pt: Point) -> (f64, Point) {
    let dir = b - a;
    let len2 = dir.hypot2();
    if len2 < ZERO_TOL * ZERO_TOL {
        return (pt.distance(a), a);
    }
    let t = (pt - a).dot(dir) / len2;
    let foot = a + dir * t;
    (pt.distance(foot), foot)
}

/// Parameter of the projection of `pt` onto `a → b` (0 at `a`, 1 at `b`).
pub fn project_scale(a: Point, b: Point, pt: Point) -> f64 {
    let dir = b - a;
    let len2 = dir.hypot2();
    if len2 < ZERO_TOL * ZERO_TOL {
        return 0.0;
    }
    (pt - a).dot(dir) / len2
}

/// Whether the projection of `pt` onto the line `a → b` falls inside the segment.
pub fn is_project_between(a: Point, b: Point, pt: Point) -> bool {
    let t = project_scale(a, b, pt);
    (-ZERO_TOL..=1.0 + ZERO_TOL).contains(&t)
}

/// Whether `pt` lies on the infinite line through `a` and `b` within `tol`.
pub fn is_colinear(a: Point, b: Point, pt: Point, tol: f64) -> bool {
    point_to_beeline(a, b, pt).0 <= tol
}

/// Distance from `pt` to the segment `a → b` and the nearest point on it.
pub fn point_to_segment(pt: Point, a: Point, b: Point) -> (f64, Point) {
    let t = project_scale(a, b, pt).clamp(0.0, 1.0);
    let near = a.lerp(b, t);
    (pt.distance(near), near)
}

/// Intersection points of two circles.
pub fn cross_two_circles(c1: Point, r1: f64, c2: Point, r2: f64) -> Vec<Point> {
    let d = c1.distance(c2);
    if d < ZERO_TOL || d > r1 + r2 + ZERO_TOL || d < (r1 - r2).abs() - ZERO_TOL {
        return Vec::new();
    }
    let a = (r1 * r1 - r2 * r2 + d * d) / (2.0 * d);
    let h2 = r1 * r1 - a * a;
    let dir = (c2 - c1) / d;
    let mid = c1 + dir * a;
    if h2 <= ZERO_TOL {
        return vec![mid];
    }
    let h = h2.sqrt();
    let normal = Vec2::new(-dir.y, dir.x) * h;
    vec![mid + normal, mid - normal]
}

/// Intersection points of the infinite line `a → b` with a circle.
pub fn cross_line_circle(a: Point, b: Point, center: Point, radius: f64) -> Vec<Point> {
    let (dist, foot) = point_to_beeline(a, b, center);
    let dir = b - a;
    let len = dir.hypot();
    if len < ZERO_TOL || dist > radius + ZERO_TOL {
        return Vec::new();
    }
    let half = (radius * radius - dist * dist).max(0.0).sqrt();
    if half < ZERO_TOL {
        return vec![foot];
    }
    let unit = dir / len;
    vec![foot + unit * half, foot - unit * half]
}

/// Center and radius of the circle through three points.
pub fn circle_through(p1: Point, p2: Point, p3: Point) -> Option<(Point, f64)> {
    let a = p2 - p1;
    let b = p3 - p1;
    let det = 2.0 * a.cross(b);
    if det.abs() < ZERO_TOL {
        return None;
    }
    let a2 = a.hypot2();
    let b2 = b.hypot2();
    let center = p1 + Vec2::new((b.y * a2 - a.y * b2) / det, (a.x * b2 - b.x * a2) / det);
    Some((center, center.distance(p1)))
}

/// Crossing point of the segments `a → b` and `c → d`.
pub fn segment_cross(a: Point, b: Point, c: Point, d: Point) -> Option<Point> {
    let r = b - a;
    let s = d - c;
    let denom = r.cross(s);
    if denom.abs() < ZERO_TOL {
        return None;
    }
    let t = (c - a).cross(s) / denom;
    let u = (c - a).cross(r) / denom;
    let range = -ZERO_TOL..=1.0 + ZERO_TOL;
    (range.contains(&t) && range.contains(&u)).then(|| a + r * t)
}

/// Flatten a path into polylines, one per subpath.
pub fn flatten(path: &BezPath, tolerance: f64) -> Vec<Vec<Point>> {
    let mut polylines: Vec<Vec<Point>> = Vec::new();
    let mut start = Point::ZERO;
    kurbo::flatten(path.iter(), tolerance.max(ZERO_TOL), |el| match el {
        PathEl::MoveTo(p) => {
            start = p;
            polylines.push(vec![p]);
        }
        PathEl::LineTo(p) => {
            if let Some(line) = polylines.last_mut() {
                line.push(p);
            }
        }
        PathEl::ClosePath => {
            if let Some(line) = polylines.last_mut() {
                line.push(start);
            }
        }
        _ => {}
    });
    polylines
}

/// Crossing point of two paths that lies inside `within`, nearest to its center.
pub fn path_crossing(first: &BezPath, second: &BezPath, within: Rect) -> Option<Point> {
    let tolerance = (within.width().max(within.height()) * 1e-3).max(ZERO_TOL);
    let lines1 = flatten(first, tolerance);
    let lines2 = flatten(second, tolerance);
    let center = within.center();
    let mut best: Option<(f64, Point)> = None;

    for seg1 in lines1.iter().flat_map(|l| l.windows(2)) {
        if !segment_touches(seg1[0], seg1[1], within) {
            continue;
        }
        for seg2 in lines2.iter().flat_map(|l| l.windows(2)) {
            if let Some(pt) = segment_cross(seg1[0], seg1[1], seg2[0], seg2[1]) {
                let dist = pt.distance(center);
                if within.contains(pt) && best.is_none_or(|(d, _)| dist < d) {
                    best = Some((dist, pt));
                }
            }
        }
    }
    best.map(|(_, pt)| pt)
}

fn segment_touches(a: Point, b: Point, rect: Rect) -> bool {
    let bounds = Rect::from_points(a, b);
    bounds.x0 <= rect.x1 && bounds.x1 >= rect.x0 && bounds.y0 <= rect.y1 && bounds.y1 >= rect.y0
}

/// Whether two rectangles overlap, counting touching edges and degenerate boxes.
pub fn rects_touch(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && a.x1 >= b.x0 && a.y0 <= b.y1 && a.y1 >= b.y0
}

/// Square box of half-size `half` around `center`.
pub fn box_around(center: Point, half: f64) -> Rect {
    Rect::new(center.x - half, center.y - half, center.x + half, center.y + half)
}

/// Signed difference `to - from`, wrapped into (-π, π].
pub fn angle_diff(from: f64, to: f64) -> f64 {
    to_range(to - from, -PI, PI)
}

/// Wrap an angle into `[min, max)` by whole turns.
pub fn to_range(mut angle: f64, min: f64, max: f64) -> f64 {
    while angle < min {
        angle += 2.0 * PI;
    }
    while angle >= max {
        angle -= 2.0 * PI;
    }
    angle
}

/// Round `value` to `decimal` fractional digits.
pub fn round_to(value: f64, decimal: i32) -> f64 {
    let scale = 10f64.powi(decimal);
    (value * scale).round() / scale
}

/// Point at `dist` from `from` along the direction to `toward`.
pub fn ruler_point(from: Point, toward: Point, dist: f64) -> Point {
    let dir = toward - from;
    let len = dir.hypot();
    if len < ZERO_TOL {
        return from;
    }
    from + dir * (dist / len)
}

/// Point at `len` from `from` in direction `angle`.
pub fn polar_point(from: Point, angle: f64, len: f64) -> Point {
    from + Vec2::from_angle(angle) * len
}

/// Whether two points coincide within `tol`.
pub fn same_point(a: Point, b: Point, tol: f64) -> bool {
    a.distance(b) <= tol
}
