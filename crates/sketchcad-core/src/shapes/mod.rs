//! Shape definitions for the drawing document.
//!
//! Shapes are a closed set of kinds wrapped in [`Shape`]. Every kind implements
//! [`ShapeTrait`], the capability interface the commands and the snap engine
//! rely on: handle enumeration, hit-testing, path export and transforms.

mod arc;
mod circle;
mod dot;
mod grid;
mod line;
mod lines;
mod rectangle;

pub use arc::Arc;
pub use circle::Circle;
pub use dot::Dot;
pub use grid::Grid;
pub use line::Line;
pub use lines::Lines;
pub use rectangle::Rectangle;

use crate::geom;
use bitflags::bitflags;
use kurbo::{Affine, BezPath, Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Identifier of a shape inside a [`ShapeDocument`](crate::document::ShapeDocument).
///
/// Zero means "no shape": working shapes of drawing commands carry id 0 until
/// they are added to the document.
pub type ShapeId = u32;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    /// Build from a packed `0xAARRGGBB` value.
    pub fn from_argb(argb: u32) -> Self {
        Self::new(
            (argb >> 16) as u8,
            (argb >> 8) as u8,
            argb as u8,
            (argb >> 24) as u8,
        )
    }

    /// Build from a packed `0xRRGGBB` value, keeping the given alpha.
    pub fn from_rgb(rgb: u32, alpha: u8) -> Self {
        Self::from_argb((rgb & 0x00FF_FFFF) | ((alpha as u32) << 24))
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Pen dash style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineStyle {
    #[default]
    Solid,
    Dash,
    Dot,
    DashDot,
    /// Invisible pen (fill only).
    Null,
}

impl LineStyle {
    /// Map the integer code used by command parameters.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => LineStyle::Dash,
            2 => LineStyle::Dot,
            3 => LineStyle::DashDot,
            5 => LineStyle::Null,
            _ => LineStyle::Solid,
        }
    }

    /// Cycle to the next line style.
    pub fn next(self) -> Self {
        match self {
            LineStyle::Solid => LineStyle::Dash,
            LineStyle::Dash => LineStyle::Dot,
            LineStyle::Dot => LineStyle::DashDot,
            LineStyle::DashDot => LineStyle::Null,
            LineStyle::Null => LineStyle::Solid,
        }
    }
}

/// Pen and fill properties of a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Pen color.
    pub stroke_color: SerializableColor,
    /// Pen width in model units; zero draws a hairline.
    pub stroke_width: f64,
    /// Pen dash style.
    #[serde(default)]
    pub line_style: LineStyle,
    /// Fill color (None = no fill).
    pub fill_color: Option<SerializableColor>,
    /// Arrowhead id at the start of open shapes (0 = none).
    #[serde(default)]
    pub start_arrowhead: u8,
    /// Arrowhead id at the end of open shapes (0 = none).
    #[serde(default)]
    pub end_arrowhead: u8,
}

impl ShapeStyle {
    /// Get the stroke color as a peniko Color.
    pub fn stroke(&self) -> Color {
        self.stroke_color.into()
    }

    /// Get the fill color as a peniko Color.
    pub fn fill(&self) -> Option<Color> {
        self.fill_color.map(|c| c.into())
    }

    /// Set the stroke color from a peniko Color.
    pub fn set_stroke(&mut self, color: Color) {
        self.stroke_color = color.into();
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            stroke_width: 0.0,
            line_style: LineStyle::Solid,
            fill_color: None,
            start_arrowhead: 0,
            end_arrowhead: 0,
        }
    }
}

bitflags! {
    /// Per-shape behavior flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ShapeFlags: u16 {
        /// Cannot be moved, edited or erased.
        const LOCKED = 1 << 0;
        /// Edge lengths are preserved while dragging handles.
        const FIXED_LENGTH = 1 << 1;
        /// Size is preserved; only translation and rotation apply.
        const FIXED_SIZE = 1 << 2;
        /// Not drawn and ignored by hit-testing and snapping.
        const HIDDEN = 1 << 3;
        /// Never used as a snap target.
        const NO_SNAP = 1 << 4;
        /// Cannot be deleted.
        const NO_DEL = 1 << 5;
        /// Cannot be cloned.
        const NO_CLONE = 1 << 6;
        /// No context actions are shown for it.
        const NO_ACTION = 1 << 7;
        const ROTATE_DISABLED = 1 << 8;
        /// Vertices may be inserted by dragging an edge.
        const CAN_ADD_VERTEX = 1 << 9;
    }
}

impl Default for ShapeFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Classification of a shape handle.
///
/// The order matters: snapping only considers handle types before `Outside`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HandleType {
    Vertex,
    Center,
    MidPoint,
    Quadrant,
    Outside,
    NoSnap,
}

/// Result of hit-testing a point against a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResult {
    /// Distance from the query point to the shape outline.
    pub dist: f64,
    /// Nearest point on the outline.
    pub nearpt: Point,
    /// Index of the edge that holds `nearpt`, if the shape has edges.
    pub segment: Option<usize>,
    /// Whether the query point is inside a closed shape.
    pub inside: bool,
}

impl HitResult {
    /// A result that hits nothing.
    pub fn miss(pt: Point) -> Self {
        Self {
            dist: f64::MAX,
            nearpt: pt,
            segment: None,
            inside: false,
        }
    }
}

impl Default for HitResult {
    fn default() -> Self {
        Self::miss(Point::ZERO)
    }
}

/// Kind tag for shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Dot,
    Line,
    Lines,
    Rectangle,
    Circle,
    Arc,
    Grid,
}

/// Common capability interface for all shapes.
pub trait ShapeTrait {
    /// Get the identifier (0 while the shape is not in a document).
    fn id(&self) -> ShapeId;

    fn flags(&self) -> ShapeFlags;

    fn flags_mut(&mut self) -> &mut ShapeFlags;

    /// Get the style.
    fn style(&self) -> &ShapeStyle;

    /// Get mutable style.
    fn style_mut(&mut self) -> &mut ShapeStyle;

    /// The defining points of the shape.
    fn points(&self) -> Vec<Point>;

    /// Number of editable handles.
    fn handle_count(&self) -> usize;

    /// Position of handle `index`.
    fn handle_point(&self, index: usize) -> Point;

    /// Classification of handle `index`.
    fn handle_type(&self, index: usize) -> HandleType;

    /// Whether handle `index` is derived from other handles and cannot be dragged.
    fn is_handle_fixed(&self, _index: usize) -> bool {
        false
    }

    /// Move handle `index` to `pt`. Returns false if the shape refused the edit.
    fn set_handle_point(&mut self, index: usize, pt: Point, tol: f64) -> bool;

    /// Straight edges of the outline, in segment order.
    fn edges(&self) -> Vec<(Point, Point)> {
        Vec::new()
    }

    /// Get the bounding box in model coordinates.
    fn bounds(&self) -> Rect;

    /// Hit-test `pt` against the outline.
    fn hit_test(&self, pt: Point, tol: f64) -> HitResult;

    /// Get the path representation for rendering and crossing tests.
    fn to_path(&self) -> BezPath;

    /// Apply a transform to this shape.
    fn transform(&mut self, affine: Affine);

    /// Translate the shape, or only one edge when `segment` is given and the
    /// shape supports edge dragging.
    fn offset(&mut self, vec: Vec2, _segment: Option<usize>) {
        self.transform(Affine::translate(vec));
    }

    fn is_closed(&self) -> bool {
        false
    }

    /// Whether the outline is curved (circles and arcs).
    fn is_curve(&self) -> bool {
        false
    }
}

/// Hit-test against a list of straight edges, skipping those that touch the
/// vertex `ignore`.
pub(crate) fn hit_test_edges(edges: &[(Point, Point)], pt: Point, ignore: Option<Point>) -> HitResult {
    let mut res = HitResult::miss(pt);
    for (i, &(a, b)) in edges.iter().enumerate() {
        if ignore.is_some_and(|v| geom::same_point(a, v, geom::ZERO_TOL) || geom::same_point(b, v, geom::ZERO_TOL)) {
            continue;
        }
        let (dist, near) = geom::point_to_segment(pt, a, b);
        if dist < res.dist {
            res.dist = dist;
            res.nearpt = near;
            res.segment = Some(i);
        }
    }
    res
}

/// Even-odd containment test for a closed polygon.
pub(crate) fn polygon_contains(points: &[Point], pt: Point) -> bool {
    let mut inside = false;
    let n = points.len();
    for i in 0..n {
        let a = points[i];
        let b = points[(i + n - 1) % n];
        if (a.y > pt.y) != (b.y > pt.y) && pt.x < (b.x - a.x) * (pt.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
    }
    inside
}

/// Bounding box of a point list.
pub(crate) fn points_bounds(points: &[Point]) -> Rect {
    let mut iter = points.iter();
    let Some(first) = iter.next() else {
        return Rect::ZERO;
    };
    iter.fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p))
}

/// Enum wrapper for all shape kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Dot(Dot),
    Line(Line),
    Lines(Lines),
    Rectangle(Rectangle),
    Circle(Circle),
    Arc(Arc),
    Grid(Grid),
}

impl Shape {
    fn inner(&self) -> &dyn ShapeTrait {
        match self {
            Shape::Dot(s) => s,
            Shape::Line(s) => s,
            Shape::Lines(s) => s,
            Shape::Rectangle(s) => s,
            Shape::Circle(s) => s,
            Shape::Arc(s) => s,
            Shape::Grid(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ShapeTrait {
        match self {
            Shape::Dot(s) => s,
            Shape::Line(s) => s,
            Shape::Lines(s) => s,
            Shape::Rectangle(s) => s,
            Shape::Circle(s) => s,
            Shape::Arc(s) => s,
            Shape::Grid(s) => s,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Dot(_) => ShapeKind::Dot,
            Shape::Line(_) => ShapeKind::Line,
            Shape::Lines(_) => ShapeKind::Lines,
            Shape::Rectangle(_) => ShapeKind::Rectangle,
            Shape::Circle(_) => ShapeKind::Circle,
            Shape::Arc(_) => ShapeKind::Arc,
            Shape::Grid(_) => ShapeKind::Grid,
        }
    }

    pub fn id(&self) -> ShapeId {
        self.inner().id()
    }

    /// Assign a new id. Only the document hands out ids.
    pub(crate) fn set_id(&mut self, id: ShapeId) {
        match self {
            Shape::Dot(s) => s.id = id,
            Shape::Line(s) => s.id = id,
            Shape::Lines(s) => s.id = id,
            Shape::Rectangle(s) => s.id = id,
            Shape::Circle(s) => s.id = id,
            Shape::Arc(s) => s.id = id,
            Shape::Grid(s) => s.id = id,
        }
    }

    pub fn flags(&self) -> ShapeFlags {
        self.inner().flags()
    }

    pub fn has_flag(&self, flag: ShapeFlags) -> bool {
        self.inner().flags().contains(flag)
    }

    pub fn set_flag(&mut self, flag: ShapeFlags, on: bool) {
        self.inner_mut().flags_mut().set(flag, on);
    }

    pub fn is_locked(&self) -> bool {
        self.has_flag(ShapeFlags::LOCKED)
    }

    pub fn is_visible(&self) -> bool {
        !self.has_flag(ShapeFlags::HIDDEN)
    }

    pub fn style(&self) -> &ShapeStyle {
        self.inner().style()
    }

    pub fn style_mut(&mut self) -> &mut ShapeStyle {
        self.inner_mut().style_mut()
    }

    pub fn points(&self) -> Vec<Point> {
        self.inner().points()
    }

    pub fn point_count(&self) -> usize {
        self.inner().points().len()
    }

    pub fn handle_count(&self) -> usize {
        self.inner().handle_count()
    }

    pub fn handle_point(&self, index: usize) -> Point {
        self.inner().handle_point(index)
    }

    pub fn handle_type(&self, index: usize) -> HandleType {
        self.inner().handle_type(index)
    }

    pub fn is_handle_fixed(&self, index: usize) -> bool {
        self.inner().is_handle_fixed(index)
    }

    pub fn set_handle_point(&mut self, index: usize, pt: Point, tol: f64) -> bool {
        self.inner_mut().set_handle_point(index, pt, tol)
    }

    pub fn edges(&self) -> Vec<(Point, Point)> {
        self.inner().edges()
    }

    pub fn bounds(&self) -> Rect {
        self.inner().bounds()
    }

    pub fn hit_test(&self, pt: Point, tol: f64) -> HitResult {
        self.inner().hit_test(pt, tol)
    }

    /// Hit-test the outline while ignoring the edges that meet at vertex
    /// `ignore`. Curved shapes fall back to a plain hit-test.
    pub fn hit_test_ignoring(&self, pt: Point, tol: f64, ignore: Option<Point>) -> HitResult {
        if ignore.is_none() || self.is_curve() {
            return self.hit_test(pt, tol);
        }
        hit_test_edges(&self.edges(), pt, ignore)
    }

    /// Whether the outline crosses or lies inside `rect`.
    pub fn hit_test_box(&self, rect: Rect) -> bool {
        let bounds = self.bounds();
        if !geom::rects_touch(bounds, rect) {
            return false;
        }
        if rect.contains(Point::new(bounds.x0, bounds.y0)) && rect.contains(Point::new(bounds.x1, bounds.y1)) {
            return true;
        }
        let tolerance = (rect.width().max(rect.height()) * 1e-3).max(geom::ZERO_TOL);
        geom::flatten(&self.to_path(), tolerance)
            .iter()
            .flat_map(|line| line.windows(2))
            .any(|seg| segment_hits_rect(seg[0], seg[1], rect))
    }

    pub fn to_path(&self) -> BezPath {
        self.inner().to_path()
    }

    pub fn transform(&mut self, affine: Affine) {
        self.inner_mut().transform(affine)
    }

    pub fn offset(&mut self, vec: Vec2, segment: Option<usize>) {
        self.inner_mut().offset(vec, segment)
    }

    pub fn is_closed(&self) -> bool {
        self.inner().is_closed()
    }

    pub fn is_curve(&self) -> bool {
        self.inner().is_curve()
    }

    /// Whether this shape is a plain two-point line.
    pub fn is_line(&self) -> bool {
        matches!(self, Shape::Line(_))
    }

    /// Whether this shape is built from vertices that can be inserted or removed.
    pub fn is_base_lines(&self) -> bool {
        matches!(self, Shape::Lines(_))
    }

    /// Center and radius when the shape is a full circle.
    pub fn as_circle(&self) -> Option<(Point, f64)> {
        match self {
            Shape::Circle(c) => Some((c.center, c.radius)),
            _ => None,
        }
    }

    /// Center and radius for circles and arcs.
    pub fn circle_geometry(&self) -> Option<(Point, f64)> {
        match self {
            Shape::Circle(c) => Some((c.center, c.radius)),
            Shape::Arc(a) => Some((a.center, a.radius)),
            _ => None,
        }
    }

    /// Segment endpoints when the shape is a plain line.
    pub fn as_segment(&self) -> Option<(Point, Point)> {
        match self {
            Shape::Line(l) => Some((l.start, l.end)),
            _ => None,
        }
    }

    pub fn as_lines_mut(&mut self) -> Option<&mut Lines> {
        match self {
            Shape::Lines(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_grid(&self) -> Option<&Grid> {
        match self {
            Shape::Grid(g) => Some(g),
            _ => None,
        }
    }
}

fn segment_hits_rect(a: Point, b: Point, rect: Rect) -> bool {
    if rect.contains(a) || rect.contains(b) {
        return true;
    }
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    (0..4).any(|i| geom::segment_cross(a, b, corners[i], corners[(i + 1) % 4]).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_argb() {
        let c = SerializableColor::from_argb(0x80FF_0010);
        assert_eq!(c, SerializableColor::new(255, 0, 16, 128));
        let c = SerializableColor::from_rgb(0x00_00FF, 255);
        assert_eq!(c, SerializableColor::new(0, 0, 255, 255));
    }

    #[test]
    fn test_line_style_cycle() {
        let mut style = LineStyle::Solid;
        for _ in 0..5 {
            style = style.next();
        }
        assert_eq!(style, LineStyle::Solid);
        assert_eq!(LineStyle::from_code(2), LineStyle::Dot);
    }

    #[test]
    fn test_handle_type_order() {
        assert!(HandleType::Quadrant < HandleType::Outside);
        assert!(HandleType::NoSnap > HandleType::Outside);
    }

    #[test]
    fn test_hit_test_box() {
        let line = Shape::Line(Line::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0)));
        assert!(line.hit_test_box(Rect::new(4.0, 4.0, 6.0, 6.0)));
        assert!(!line.hit_test_box(Rect::new(6.0, 0.0, 10.0, 3.0)));
        assert!(line.hit_test_box(Rect::new(-1.0, -1.0, 11.0, 11.0)));
    }

    #[test]
    fn test_hit_test_ignoring_adjacent_edges() {
        let lines = Shape::Lines(Lines::new(
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)],
            false,
        ));
        let res = lines.hit_test_ignoring(Point::new(9.0, 0.5), 1.0, Some(Point::new(10.0, 0.0)));
        assert_eq!(res.segment, None);
        let res = lines.hit_test_ignoring(Point::new(9.0, 0.5), 1.0, None);
        assert_eq!(res.segment, Some(0));
    }

    #[test]
    fn test_polygon_contains() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ];
        assert!(polygon_contains(&square, Point::new(2.0, 2.0)));
        assert!(!polygon_contains(&square, Point::new(5.0, 2.0)));
    }
}
