//! Selection and drag editing.
//!
//! The select command keeps the selected ids and, while a finger is down,
//! one working copy ("clone") per selected shape. Every move event rebuilds
//! each clone from the stored original and applies the whole gesture from
//! the press point, so repeated moves never accumulate rounding drift. On
//! release the clones that differ from their originals are written back.
//!
//! Dragging does one of the following, checked in order:
//! - rotate around a pinned handle,
//! - move one vertex (edit mode),
//! - scale or rotate through the transform box around the selection,
//! - move the whole selection rigidly.

use crate::actions::SelState;
use crate::command::{CmdView, Command, Selection};
use crate::geom;
use crate::motion::GestureState;
use crate::render::{HandleMark, HintPen, Painter};
use crate::shapes::{HitResult, Shape, ShapeFlags, ShapeId};
use crate::snap::{SnapRequest, SnapType};
use kurbo::{Affine, Point, Rect, Vec2};
use peniko::Color;
use serde::Deserialize;
use serde_json::Value;

/// No transform-box handle under the finger.
const NO_BOX_HANDLE: usize = 99;

/// Two-finger drags closer than this to an axis scale per axis.
const AXIS_SCALE_TOL_DEG: f64 = 17.0;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SelectParams {
    id: Option<ShapeId>,
    handle_index: Option<usize>,
    rotate_handle: Option<usize>,
    edit_mode: Option<bool>,
}

fn about(center: Point, xf: Affine) -> Affine {
    Affine::translate(center.to_vec2()) * xf * Affine::translate(-center.to_vec2())
}

/// Signed angle turning `from` onto `to`.
fn angle_between(from: Vec2, to: Vec2) -> f64 {
    from.cross(to).atan2(from.dot(to))
}

/// Handle `index` of a box: corners 0-3, then edge midpoints 4-7.
fn rect_handle(rect: Rect, index: usize) -> Point {
    let c = rect.center();
    match index {
        0 => Point::new(rect.x0, rect.y0),
        1 => Point::new(rect.x1, rect.y0),
        2 => Point::new(rect.x1, rect.y1),
        3 => Point::new(rect.x0, rect.y1),
        4 => Point::new(c.x, rect.y0),
        5 => Point::new(rect.x1, c.y),
        6 => Point::new(c.x, rect.y1),
        _ => Point::new(rect.x0, c.y),
    }
}

fn move_rect_handle(rect: Rect, index: usize, pt: Point) -> Rect {
    let mut r = rect;
    match index {
        0 => (r.x0, r.y0) = (pt.x, pt.y),
        1 => (r.x1, r.y0) = (pt.x, pt.y),
        2 => (r.x1, r.y1) = (pt.x, pt.y),
        3 => (r.x0, r.y1) = (pt.x, pt.y),
        4 => r.y0 = pt.y,
        5 => r.x1 = pt.x,
        6 => r.y1 = pt.y,
        _ => r.x0 = pt.x,
    }
    r.abs()
}

fn rect_contains(outer: Rect, inner: Rect) -> bool {
    inner.x0 >= outer.x0 && inner.y0 >= outer.y0 && inner.x1 <= outer.x1 && inner.y1 <= outer.y1
}

/// Whether the press is closer to the midpoint of a two-point shape than to its ends.
fn is_drag_mid_point(shape: &Shape, view: &CmdView) -> bool {
    if shape.handle_count() < 3 {
        return false;
    }
    let start = view.motion.start_pt_m;
    let d1 = start.distance(shape.handle_point(0));
    let d2 = start.distance(shape.handle_point(1));
    let d3 = start.distance(shape.handle_point(2));
    d3 < d1 && d3 < d2 && d3 < view.mm(5.0)
}

fn lock_option(view: &CmdView, key: &str, default: usize) -> usize {
    usize::try_from(view.options.get_int(key, 0))
        .ok()
        .filter(|&v| v != 0)
        .unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct SelectCommand {
    sel_ids: Vec<ShapeId>,
    /// Primary selected shape.
    id: ShapeId,
    clones: Vec<Shape>,
    hit: HitResult,
    /// 1-based handle of the primary shape, 0 for none.
    handle_index: usize,
    /// 1-based handle the shape rotates around, 0 for none.
    rotate_handle: usize,
    box_handle: usize,
    edit_mode: bool,
    boxsel: bool,
    insert_pt: bool,
    dragging: bool,
    can_rotate_handle: bool,
    rotate_angle: f64,
    pt_start: Point,
    pt_snap: Point,
}

impl Default for SelectCommand {
    fn default() -> Self {
        Self {
            sel_ids: Vec::new(),
            id: 0,
            clones: Vec::new(),
            hit: HitResult::default(),
            handle_index: 0,
            rotate_handle: 0,
            box_handle: NO_BOX_HANDLE,
            edit_mode: false,
            boxsel: false,
            insert_pt: false,
            dragging: false,
            can_rotate_handle: true,
            rotate_angle: 0.0,
            pt_start: Point::ZERO,
            pt_snap: Point::ZERO,
        }
    }
}

impl SelectCommand {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_sel_shape(view: &CmdView) -> ShapeId {
        ShapeId::try_from(view.options.get_int("lockSelShape", 0)).unwrap_or(0)
    }

    fn lock_sel_handle(view: &CmdView, default: usize) -> usize {
        lock_option(view, "lockSelHandle", default)
    }

    fn selection_changed(&self, view: &mut CmdView) {
        log::debug!(
            "Selection changed: {} shapes, id={}, segment={:?}",
            self.sel_ids.len(),
            self.id,
            self.hit.segment
        );
        view.selection_changed();
    }

    /// The primary selected shape, falling back to the first selected one.
    fn selected_shape(&self, view: &CmdView) -> Option<Shape> {
        view.doc
            .find_shape(self.id)
            .or_else(|| self.sel_ids.first().and_then(|&id| view.doc.find_shape(id)))
            .cloned()
    }

    fn hit_test_all(view: &CmdView) -> Option<(ShapeId, HitResult)> {
        let limits = view
            .motion
            .display_mm_to_model_box(view.options.get_float("hitTestTol", 10.0));
        view.doc.hit_test(limits, limits.width() / 2.0)
    }

    fn can_transform(view: &CmdView, shape: &Shape) -> bool {
        !shape.is_locked() && view.shape_can_transform(shape)
    }

    fn can_rotate(view: &CmdView, shape: &Shape) -> bool {
        !shape.has_flag(ShapeFlags::ROTATE_DISABLED) && !shape.is_locked() && view.shape_can_rotate(shape)
    }

    /// Whether the press still lands on `shape`. Updates the hit record.
    fn can_select(&mut self, shape: &Shape, view: &CmdView) -> bool {
        let half = view.mm(view.options.get_float("hitTestTol", 10.0)) / 2.0;
        let start = view.motion.start_pt_m;
        if shape.id() != 0 && shape.id() == Self::lock_sel_shape(view) {
            return true;
        }
        self.hit = shape.hit_test(start, half);
        if self.hit.inside && shape.style().fill_color.is_some() {
            return true;
        }
        let mut d = self.hit.dist;
        if d > half && self.is_edit_mode(view) {
            for i in (0..shape.handle_count()).rev() {
                d = shape.handle_point(i).distance(start);
                if d <= half {
                    break;
                }
            }
        }
        d <= half
    }

    /// Nearest draggable handle within `tolmm`, 1-based. Flags a vertex
    /// insertion when the drag starts on an edge far from every vertex.
    fn hit_test_handles(&mut self, shape: &Shape, pt: Point, view: &CmdView, tolmm: f64) -> usize {
        if shape.has_flag(ShapeFlags::FIXED_SIZE) {
            return 0;
        }
        let mut min_dist = view.mm(tolmm);
        let mut index = 0;
        for i in 0..shape.handle_count() {
            let d = pt.distance(shape.handle_point(i));
            if min_dist > d && !shape.is_handle_fixed(i) {
                min_dist = d;
                index = i + 1;
            }
        }

        let near_dist = self.hit.nearpt.distance(pt);
        if view.motion.dragging()
            && near_dist < min_dist / 3.0
            && min_dist > view.mm(8.0)
            && shape.has_flag(ShapeFlags::CAN_ADD_VERTEX)
            && shape.is_base_lines()
        {
            self.insert_pt = true;
        }
        Self::lock_sel_handle(view, index)
    }

    fn snap_point(&self, view: &mut CmdView, shape: &Shape) -> Point {
        let ignore_ids: Vec<ShapeId> = self.clones.iter().map(Shape::id).collect();
        let hot = self.handle_index.checked_sub(1);
        let mut org = view.motion.point_m;
        if let Some(h) = hot.filter(|&h| h < shape.handle_count()) {
            if shape.handle_point(h).distance(org) < view.mm(2.0) {
                org = shape.handle_point(h);
            }
        }
        let pt = view.snap_point(
            org,
            SnapRequest {
                shape: Some(shape),
                hot_handle: hot,
                ignore_handle: self.rotate_handle.checked_sub(1),
                ignore_ids: &ignore_ids,
            },
        );
        if !view.motion.dragging() && view.snap.snapped_type().is_point() {
            view.subject.on_point_snapped(&view.motion, Some(shape));
        }
        pt
    }

    fn raw_bounding_box(&self, view: &CmdView) -> Option<Rect> {
        self.sel_ids
            .iter()
            .filter_map(|&id| view.doc.find_shape(id))
            .map(Shape::bounds)
            .reduce(|a, b| a.union(b))
    }

    fn rotate_handle_point(view: &CmdView, selbox: Rect, j: usize) -> Point {
        let pnt = rect_handle(selbox, if j == 0 { 7 } else { 5 });
        geom::ruler_point(pnt, selbox.center(), -view.mm(10.0))
    }

    fn clone_shapes(&mut self, view: &CmdView) {
        self.clones = self
            .sel_ids
            .iter()
            .filter_map(|&id| view.doc.find_shape(id))
            .cloned()
            .collect();
    }

    /// Write changed clones back, or add them as new shapes. Returns true
    /// when something changed or clones were dropped.
    fn apply_clone_shapes(&mut self, view: &mut CmdView, apply: bool, add_new: bool) -> bool {
        let cloned = !self.clones.is_empty();
        let clones = std::mem::take(&mut self.clones);
        let apply = apply
            && clones
                .iter()
                .any(|c| view.doc.find_shape(c.id()).is_some_and(|old| old != c));
        let mut changed = false;

        if apply {
            if add_new {
                self.sel_ids.clear();
                self.id = 0;
            }
            for clone in clones {
                if add_new {
                    if let Some(id) = view.add_shape(clone) {
                        self.sel_ids.push(id);
                        self.id = id;
                        changed = true;
                    }
                    continue;
                }
                let bounds = clone.bounds();
                let degenerate = bounds.width() < 1e-4 && bounds.height() < 1e-4 && clone.point_count() > 0;
                if !degenerate && view.update_shape(clone) {
                    changed = true;
                }
            }
        }

        if changed {
            view.regen();
            if add_new {
                self.selection_changed(view);
                self.boxsel = false;
            }
        } else {
            view.redraw();
        }
        changed || cloned
    }

    /// Pick the transform-box handle under the press and build the matrix
    /// for dragging it to the current point.
    fn is_drag_rect_corner(&mut self, view: &CmdView) -> Option<Affine> {
        self.box_handle = NO_BOX_HANDLE;
        self.pt_snap = view.motion.point_m;

        let fixed_size = self
            .clones
            .first()
            .is_some_and(|s| s.has_flag(ShapeFlags::FIXED_SIZE));
        if self.is_edit_mode(view) || self.sel_ids.is_empty() || self.boxsel || fixed_size {
            return None;
        }
        let selbox = self.bounding_box(view);
        if selbox.width() <= 0.0 || selbox.height() <= 0.0 {
            return None;
        }

        let first = view.doc.find_shape(self.sel_ids[0]);
        let start = view.motion.start_pt_m;
        let mut min_dist = view.mm(5.0);

        if first.is_some_and(|s| Self::can_transform(view, s)) {
            for i in (0..8).rev() {
                let addlen = if i < 4 { 0.0 } else { view.mm(1.0) };
                let d = start.distance(rect_handle(selbox, i)) - addlen;
                if min_dist > d {
                    min_dist = d;
                    self.box_handle = i;
                }
            }
        }
        if first.is_some_and(|s| Self::can_rotate(view, s)) {
            for j in (0..2).rev() {
                let d = start.distance(Self::rotate_handle_point(view, selbox, j));
                if min_dist > d {
                    min_dist = d;
                    self.box_handle = 8 + j;
                }
            }
        }

        let point = view.motion.point_m;
        if self.box_handle < 8 {
            let newbox = move_rect_handle(selbox, self.box_handle, point);
            if newbox.width() > 0.0 && newbox.height() > 0.0 {
                let origin = selbox.origin();
                let scale = Affine::scale_non_uniform(
                    newbox.width() / selbox.width(),
                    newbox.height() / selbox.height(),
                );
                return Some(Affine::translate(newbox.origin() - origin) * about(origin, scale));
            }
            return Some(Affine::IDENTITY);
        }
        if self.box_handle < 10 {
            let center = selbox.center();
            let pnt = Self::rotate_handle_point(view, selbox, self.box_handle - 8);
            let mut angle = angle_between(pnt - center, point - center);
            if self.box_handle == 8 {
                let deg = angle.to_degrees().round();
                angle = ((deg / 15.0).trunc() * 15.0).to_radians();
            }
            self.pt_snap = geom::polar_point(center, angle + (pnt - center).atan2(), point.distance(center));
            return Some(about(center, Affine::rotate(angle)));
        }
        None
    }

    fn is_clone_drag(&self, view: &CmdView) -> bool {
        let dist = view.motion.point_m.distance(view.motion.start_pt_m);
        !self.is_edit_mode(view)
            && self.box_handle > 16
            && view.motion.press_drag
            && dist > view.mm(5.0)
    }

    /// Rotate `shape` around `center` by the drag angle, in steps of the
    /// `rotateStepAngle` option unless a snap refines it.
    fn rotate_around(&mut self, view: &mut CmdView, shape: &mut Shape, center: Point, point: Point) {
        self.rotate_angle = angle_between(self.pt_start - center, point - center);
        let step = view.options.get_float("rotateStepAngle", 1.0);
        if view.snap.snapped_type() == SnapType::None && step > 0.0 {
            self.rotate_angle = ((self.rotate_angle.to_degrees() / step).round() * step).to_radians();
        }
        shape.transform(about(center, Affine::rotate(self.rotate_angle)));

        self.snap_point(view, shape);
        if view.snap.snapped_type() >= SnapType::Grid {
            let (from, to) = view.snap.snapped_point();
            let fix = angle_between(from - center, to - center);
            shape.transform(about(center, Affine::rotate(fix)));
            self.rotate_angle += fix;
        }
    }

    /// Rebuild clone `i` from its original for the current drag.
    /// Returns the snap offset found for it, if any.
    fn drag_clone(&mut self, view: &mut CmdView, i: usize, point: Point, corner: Option<Affine>, snap_pass: bool) -> Option<Vec2> {
        let base = view.doc.find_shape(self.clones[i].id()).cloned()?;
        if !Self::can_transform(view, &base) {
            return None;
        }
        let edit = self.is_edit_mode(view);
        let mut shape = base.clone();
        if !edit {
            shape.set_flag(ShapeFlags::FIXED_LENGTH, true);
            shape.set_flag(ShapeFlags::FIXED_SIZE, true);
        }
        if self.insert_pt {
            if let (Some(seg), Some(lines)) = (self.hit.segment, shape.as_lines_mut()) {
                lines.insert_point(seg, self.hit.nearpt);
            }
        }

        let mut found = None;
        if self.rotate_handle > 0 && Self::can_rotate(view, &base) {
            let center = base.handle_point(self.rotate_handle - 1);
            if center != self.pt_start && self.handle_index != self.rotate_handle {
                self.rotate_around(view, &mut shape, center, point);
            }
        } else if self.handle_index > 0 && edit && !shape.has_flag(ShapeFlags::FIXED_SIZE) {
            let h = self.handle_index - 1;
            if view.shape_can_move_handle(&shape, h) {
                let tol = view.mm(3.0);
                shape.set_handle_point(h, point, tol);
                let pt = self.snap_point(view, &shape);
                shape.set_handle_point(h, pt, tol);
            } else if shape.point_count() == 2
                && shape.has_flag(ShapeFlags::FIXED_LENGTH)
                && Self::can_rotate(view, &base)
                && !is_drag_mid_point(&base, view)
            {
                let center = base.handle_point(1 - h.min(1));
                self.rotate_around(view, &mut shape, center, point);
            }
        } else if let Some(mat) = corner.filter(|_| !shape.has_flag(ShapeFlags::FIXED_SIZE)) {
            shape.transform(mat);
        } else {
            let segment = if edit { self.hit.segment } else { None };
            shape.offset(point - self.pt_start, segment);
            if snap_pass {
                let snapvec = self.snap_point(view, &shape) - point;
                shape.offset(snapvec, segment);
                if snapvec.hypot() > geom::ZERO_TOL {
                    found = Some(snapvec);
                }
            }
        }

        if !edit {
            shape.set_flag(ShapeFlags::FIXED_LENGTH, base.has_flag(ShapeFlags::FIXED_LENGTH));
            shape.set_flag(ShapeFlags::FIXED_SIZE, base.has_flag(ShapeFlags::FIXED_SIZE));
        }
        self.clones[i] = shape;
        found
    }

    fn box_select(&mut self, view: &mut CmdView) {
        let rect = Rect::from_points(view.motion.start_pt_m, view.motion.point_m);
        let center = rect.center();
        let mut min_dist = f64::MAX;

        self.sel_ids.clear();
        self.id = 0;
        self.hit.segment = None;
        for shape in view.doc.iter() {
            if !shape.is_visible() || !shape.hit_test_box(rect) {
                continue;
            }
            let dist = shape.hit_test(center, min_dist).dist;
            if min_dist > dist - geom::ZERO_TOL
                || (min_dist < dist + geom::ZERO_TOL && rect_contains(rect, shape.bounds()))
            {
                min_dist = dist;
                self.id = shape.id();
                self.sel_ids.insert(0, shape.id());
            } else {
                self.sel_ids.push(shape.id());
            }
        }
        view.redraw();
    }

    /// Drop ids whose shapes are gone.
    fn prune_selection(&mut self, view: &mut CmdView) {
        let before = self.sel_ids.len();
        self.sel_ids.retain(|&id| view.doc.contains(id));
        if self.sel_ids.len() != before {
            log::warn!("Dropped {} stale ids from the selection", before - self.sel_ids.len());
            if !self.sel_ids.contains(&self.id) {
                self.id = self.sel_ids.first().copied().unwrap_or(0);
                self.handle_index = 0;
                self.rotate_handle = 0;
            }
            self.selection_changed(view);
        }
    }

    fn zoom_shape_enabled(view: &CmdView) -> bool {
        view.options.get_bool("zoomShapeEnabled", true)
            && view.options.get_int("lockSelHandle", 0) == 0
            && view.options.get_int("lockRotateHandle", 0) == 0
    }

    /// Update each clone from the two finger positions.
    fn two_fingers_transform(&mut self, view: &mut CmdView) {
        let m = view.motion.clone();
        let dist0 = m.start_distance_m();
        let a0 = (m.start_pt2_m - m.start_pt_m).atan2();

        for i in 0..self.clones.len() {
            let Some(base) = view.doc.find_shape(self.clones[i].id()).cloned() else {
                continue;
            };
            if !Self::can_transform(view, &base) {
                continue;
            }
            let mut shape = base.clone();
            let can_rotate = Self::can_rotate(view, &base);
            let mut mat = Affine::translate(m.point_m - m.start_pt_m);

            if self.edit_mode
                && !shape.has_flag(ShapeFlags::FIXED_LENGTH)
                && !shape.has_flag(ShapeFlags::FIXED_SIZE)
            {
                let a = a0.abs() / std::f64::consts::FRAC_PI_2;
                if !can_rotate && (a - a.round()).abs() < AXIS_SCALE_TOL_DEG / 90.0 {
                    let d0 = m.start_pt_m - m.start_pt2_m;
                    let d1 = m.point_m - m.point2_m;
                    let vert = a.round() as i64 % 2 == 1;
                    let ratio = |from: f64, to: f64| {
                        if from.abs() < geom::ZERO_TOL || to.abs() < geom::ZERO_TOL {
                            1.0
                        } else {
                            to.abs() / from.abs()
                        }
                    };
                    let sx = if vert { 1.0 } else { ratio(d0.x, d1.x) };
                    let sy = if vert { ratio(d0.y, d1.y) } else { 1.0 };
                    mat = about(m.start_center_m(), Affine::scale_non_uniform(sx, sy));
                } else if dist0 > geom::ZERO_TOL {
                    mat = about(m.point_m, Affine::scale(m.distance_m() / dist0)) * mat;
                }
            }
            if can_rotate {
                let turn = ((m.point2_m - m.point_m).atan2() - a0).to_degrees().round();
                mat = about(m.point_m, Affine::rotate(turn.to_radians())) * mat;
            }
            shape.transform(mat);

            if self.clones.len() == 1 {
                let snapvec = self.snap_point(view, &shape) - m.point_m;
                shape.offset(snapvec, None);
            }
            self.clones[i] = shape;
        }
        view.redraw();
    }

    fn update_each(&mut self, view: &mut CmdView, mut edit: impl FnMut(&CmdView, &mut Shape) -> bool) -> usize {
        let mut count = 0;
        for &id in &self.sel_ids {
            let Some(mut shape) = view.doc.find_shape(id).cloned() else {
                continue;
            };
            if edit(&*view, &mut shape) && view.update_shape(shape) {
                count += 1;
            }
        }
        if count > 0 {
            view.regen();
        }
        count
    }

    /// Apply `edit` to the primary shape when it is a polyline.
    fn edit_lines(&mut self, view: &mut CmdView, edit: impl FnOnce(&mut crate::shapes::Lines) -> bool) -> Option<Shape> {
        let mut shape = view.doc.find_shape(self.id).cloned()?;
        let lines = shape.as_lines_mut()?;
        if !edit(lines) || !view.update_shape(shape.clone()) {
            return None;
        }
        view.regen();
        Some(shape)
    }
}

impl Command for SelectCommand {
    fn name(&self) -> &str {
        "select"
    }

    fn initialize_with_selection(&mut self, view: &mut CmdView, selection: &[ShapeId], params: Option<&Value>) -> bool {
        *self = Self::default();
        self.id = Self::lock_sel_shape(view);
        self.handle_index = Self::lock_sel_handle(view, 0);
        self.rotate_handle = lock_option(view, "lockRotateHandle", 0);

        let params = match params.map(SelectParams::deserialize) {
            Some(Ok(params)) => Some(params),
            Some(Err(err)) => {
                log::warn!("Ignoring select parameters: {err}");
                None
            }
            None => None,
        };
        let handle_given = params.as_ref().and_then(|p| p.handle_index).unwrap_or(0) > 0;
        if let Some(p) = &params {
            self.id = p.id.unwrap_or(self.id);
            self.handle_index = p.handle_index.unwrap_or(self.handle_index);
            self.rotate_handle = p.rotate_handle.unwrap_or(self.rotate_handle);
            self.edit_mode = p.edit_mode.unwrap_or(false);
        }

        if self.id != 0 {
            self.sel_ids.push(self.id);
        } else {
            self.sel_ids = selection.to_vec();
            self.id = self.sel_ids.first().copied().unwrap_or(0);
        }
        self.can_rotate_handle = view.options.get_bool("canRotateHandle", true);
        self.edit_mode = (self.edit_mode || self.handle_index > 0) && self.rotate_handle == 0;
        view.subject.on_enter_select_command(&view.motion);

        let wanted = if self.id == 0 { view.new_shape_id } else { self.id };
        if let Some(shape) = view.doc.find_shape(wanted).cloned() {
            if self.id == 0 {
                self.sel_ids.push(shape.id());
                self.id = shape.id();
            }
            self.selection_changed(view);
            view.redraw();
            if !handle_given {
                self.long_press(view);
            }
        }
        true
    }

    fn cancel(&mut self, view: &mut CmdView) -> bool {
        let mut ret = self.back_step(view);
        ret = self.back_step(view) || ret;
        self.back_step(view) || ret
    }

    fn back_step(&mut self, view: &mut CmdView) -> bool {
        self.boxsel = false;
        self.box_handle = NO_BOX_HANDLE;

        if !self.clones.is_empty() {
            self.clones.clear();
            self.insert_pt = false;
            view.redraw();
            return true;
        }
        if !self.sel_ids.is_empty() {
            self.id = 0;
            self.hit.segment = None;
            self.handle_index = 0;
            self.rotate_handle = 0;
            self.sel_ids.clear();
            view.redraw();
            self.selection_changed(view);
            return true;
        }
        false
    }

    fn draw(&mut self, view: &mut CmdView, painter: &mut dyn Painter) -> bool {
        self.prune_selection(view);
        let edit = self.is_edit_mode(view);
        let selection: Vec<Shape> = self
            .sel_ids
            .iter()
            .filter_map(|&id| view.doc.find_shape(id))
            .cloned()
            .collect();
        let shapes = if self.clones.is_empty() { &selection } else { &self.clones };

        if self.clones.is_empty() {
            let blue = HintPen::new(Color::from_rgba8(0, 0, 255, 48), view.mm(0.5));
            for shape in shapes {
                painter.draw_path(&shape.to_path(), &blue);
            }
        } else {
            for shape in shapes {
                let style = shape.style();
                painter.draw_path(&shape.to_path(), &HintPen::new(style.stroke(), style.stroke_width));
            }
        }

        if self.boxsel {
            let pen = HintPen::new(Color::from_rgba8(0, 0, 255, 80), 0.0)
                .dashed()
                .filled(Color::from_rgba8(0, 0, 255, 24));
            painter.draw_rect(Rect::from_points(view.motion.start_pt_m, view.motion.point_m), &pen);
        } else if !selection.is_empty() && (selection.len() > 1 || !edit) {
            let selbox = self.bounding_box(view);
            if selbox.width() > 0.0 && selbox.height() > 0.0 {
                let pen = HintPen::new(Color::from_rgba8(0, 0, 255, 48), 0.0).dashed();
                painter.draw_rect(selbox, &pen);
            }
            if self.clones.is_empty() {
                let first = &shapes[0];
                if Self::can_transform(view, first) {
                    for i in (0..8).rev() {
                        painter.draw_handle(rect_handle(selbox, i), HandleMark::Vertex);
                    }
                }
                if Self::can_rotate(view, first) {
                    for j in 0..2 {
                        painter.draw_handle(Self::rotate_handle_point(view, selbox, j), HandleMark::Rotate);
                    }
                }
            } else if (8..10).contains(&self.box_handle) {
                let guide = HintPen::new(Color::from_rgba8(0, 0, 255, 128), 0.0).dashed();
                painter.draw_handle(selbox.center(), HandleMark::Vertex);
                painter.draw_line(selbox.center(), self.pt_snap, &guide);
            }
        }

        if shapes.len() == 1 && (edit || self.handle_index > 0 || self.rotate_handle > 0) {
            let shape = &shapes[0];
            let locked_handles = Self::lock_sel_handle(view, 0) > 0 || lock_option(view, "lockRotateHandle", 0) > 0;
            let mut n = if locked_handles { 0 } else { shape.handle_count() };
            if shape.has_flag(ShapeFlags::FIXED_SIZE) {
                n = n.min(shape.point_count());
            }
            if edit && !view.motion.dragging() {
                for i in 0..n {
                    if i + 1 == self.handle_index || i + 1 == self.rotate_handle || shape.is_handle_fixed(i) {
                        continue;
                    }
                    painter.draw_handle(shape.handle_point(i), HandleMark::Vertex);
                }
            }
            if let Some(active) = self.rotate_handle.checked_sub(1).or(self.handle_index.checked_sub(1)) {
                if active < shape.handle_count() {
                    let mark = if self.rotate_handle > 0 {
                        HandleMark::Rotate
                    } else {
                        HandleMark::ActiveVertex
                    };
                    painter.draw_handle(shape.handle_point(active), mark);
                }
            }
            if self.insert_pt && !self.clones.is_empty() {
                painter.draw_handle(self.hit.nearpt, HandleMark::ActiveVertex);
            }
        }

        view.draw_snap(painter);
        true
    }

    fn click(&mut self, view: &mut CmdView) -> bool {
        self.box_handle = NO_BOX_HANDLE;
        self.rotate_handle = 0;
        if view.motion.press_drag {
            return false;
        }
        self.apply_clone_shapes(view, false, false);
        self.insert_pt = false;

        let mut shape = self.selected_shape(view);
        let can_sel_again = self.sel_ids.len() == 1 && shape.as_ref().is_some_and(|s| self.can_select(s, view));
        let point = view.motion.point_m;

        if !can_sel_again {
            let hit = Self::hit_test_all(view);
            let new_id = hit.map_or(0, |(id, _)| id);
            let changed = self.sel_ids.len() != usize::from(new_id != 0) || (new_id != 0 && new_id != self.id);

            self.sel_ids.clear();
            if new_id != 0 {
                self.sel_ids.push(new_id);
            }
            self.id = new_id;
            self.hit = hit.map_or(HitResult::miss(point), |(_, res)| res);
            self.handle_index = 0;
            shape = view.doc.find_shape(new_id).cloned();

            if changed {
                self.selection_changed(view);
            } else if let Some(s) = &shape {
                let bounds = s.bounds();
                let small = bounds.width() < view.mm(5.0) && bounds.height() < view.mm(5.0);
                if self.is_edit_mode(view) || !small {
                    self.handle_index = self.hit_test_handles(s, point, view, 10.0);
                }
            }
        } else if Self::lock_sel_handle(view, 0) == 0 {
            self.handle_index = 0;
            if let Some(s) = &shape {
                if self.is_edit_mode(view) || Self::can_rotate(view, s) {
                    self.handle_index = self.hit_test_handles(s, point, view, 10.0);
                }
            }
            log::debug!("Select tap: id={}, segment={:?}", self.id, self.hit.segment);
        }

        if self.can_rotate_handle
            && !self.is_edit_mode(view)
            && shape.as_ref().is_some_and(|s| Self::can_rotate(view, s))
        {
            self.rotate_handle = self.handle_index;
        }
        view.new_shape_id = self.id;
        view.redraw();

        if self.is_edit_mode(view) || self.handle_index == 0 {
            let state = self.select_state(view);
            let selbox = self.bounding_box(view);
            view.show_in_select(state, shape.as_ref(), selbox);
            return true;
        }
        self.id != 0
    }

    fn double_click(&mut self, view: &mut CmdView) -> bool {
        let Some(shape) = self.selected_shape(view) else {
            return false;
        };
        if Self::lock_sel_handle(view, 0) == 0 {
            let edit = self.is_edit_mode(view);
            return self.set_edit_mode(view, !edit);
        }
        let state = self.select_state(view);
        let selbox = self.bounding_box(view);
        view.show_in_select(state, Some(&shape), selbox)
    }

    fn long_press(&mut self, view: &mut CmdView) -> bool {
        let mut ret = false;
        if self.sel_ids.is_empty() {
            ret = self.click(view);
        }

        let shape = self.selected_shape(view);
        let state = self.select_state(view);
        if let Some(s) = &shape {
            if self.handle_index > 0 && Self::lock_sel_handle(view, 0) == 0 {
                self.handle_index = self.hit_test_handles(s, view.motion.point_m, view, 10.0);
                view.redraw();
            }
        }
        let selbox = self.bounding_box(view);
        view.show_in_select(state, shape.as_ref(), selbox) || ret
    }

    fn touch_began(&mut self, view: &mut CmdView) -> bool {
        if !view.motion.switch_gesture {
            if let Some((new_id, res)) = Self::hit_test_all(view) {
                let old = self.selected_shape(view);
                if new_id != self.id && !old.as_ref().is_some_and(|s| self.can_select(s, view)) {
                    self.hit = res;
                    self.id = new_id;
                    self.sel_ids = vec![new_id];
                    self.handle_index = 0;
                    self.rotate_handle = 0;
                    self.selection_changed(view);
                }
            }
        }

        self.clone_shapes(view);
        self.dragging = false;
        self.insert_pt = false;
        let start = view.motion.start_pt_m;

        match self.clones.len() {
            1 => {
                let shape = self.clones[0].clone();
                self.can_select(&shape, view);
            }
            0 => {}
            _ => self.hit = HitResult::miss(start),
        }

        self.handle_index = match self.clones.first().cloned() {
            Some(s) if self.clones.len() == 1 && (self.handle_index > 0 || self.is_edit_mode(view)) => {
                self.hit_test_handles(&s, view.motion.point_m, view, 10.0)
            }
            _ => 0,
        };

        if self.insert_pt {
            let (segment, nearpt) = (self.hit.segment, self.hit.nearpt);
            if let (Some(seg), Some(lines)) = (segment, self.clones.first_mut().and_then(Shape::as_lines_mut)) {
                lines.insert_point(seg, nearpt);
            }
            if let Some(s) = self.clones.first().cloned() {
                self.handle_index = self.hit_test_handles(&s, nearpt, view, 10.0);
            }
        }

        if self.clones.is_empty() && view.options.get_bool("canBoxSel", true) {
            self.boxsel = true;
        }
        self.box_handle = NO_BOX_HANDLE;

        let primary = self.clones.first().cloned();
        let tmp = primary
            .as_ref()
            .map_or(0, |s| self.hit_test_handles(s, start, view, 5.0));
        self.pt_start = match primary {
            Some(s) if tmp > 0 => s.handle_point(tmp - 1),
            _ if start.distance(self.hit.nearpt) < view.mm(3.0) => self.hit.nearpt,
            _ => start,
        };

        view.redraw();
        true
    }

    fn touch_moved(&mut self, view: &mut CmdView) -> bool {
        let mut point = view.motion.point_m;
        let corner = self.is_drag_rect_corner(view);

        if self.insert_pt && point.distance(self.hit.nearpt) < view.mm(5.0) {
            point = self.hit.nearpt;
        }
        if !self.dragging {
            self.dragging = view.motion.point_m.distance(view.motion.start_pt_m) > view.mm(2.0);
            if !self.dragging {
                view.redraw();
                return true;
            }
        }
        self.rotate_angle = 0.0;

        // Several shapes move in two passes: the first finds the shortest snap
        // offset over all of them, the second applies that one offset to each.
        let multi = self.clones.len() > 1 && corner.is_none();
        let mut min_snap: Option<(Vec2, usize)> = None;
        if multi {
            for i in 0..self.clones.len() {
                if let Some(v) = self.drag_clone(view, i, point, corner, true) {
                    if min_snap.is_none_or(|(m, _)| m.hypot() > v.hypot()) {
                        min_snap = Some((v, i));
                    }
                }
            }
        }
        let single = self.clones.len() == 1;
        for i in 0..self.clones.len() {
            self.drag_clone(view, i, point, corner, single);
        }
        if let Some((v, index)) = min_snap {
            let segment = if self.is_edit_mode(view) { self.hit.segment } else { None };
            let snapped = self.clones[index].clone();
            self.snap_point(view, &snapped);
            for clone in &mut self.clones {
                let movable = view
                    .doc
                    .find_shape(clone.id())
                    .is_some_and(|s| Self::can_transform(view, s));
                if movable {
                    clone.offset(v, segment);
                }
            }
        }
        if !self.clones.is_empty() {
            view.redraw();
        }

        if self.clones.is_empty() && self.boxsel {
            self.box_select(view);
        }
        true
    }

    fn touch_ended(&mut self, view: &mut CmdView) -> bool {
        if self.insert_pt
            && self.clones.len() == 1
            && view.motion.point_m.distance(self.hit.nearpt) < view.mm(5.0)
        {
            self.clones.clear();
        }

        let clone_drag = self.is_clone_drag(view);
        self.apply_clone_shapes(view, true, clone_drag);
        view.clear_snap();

        self.insert_pt = false;
        self.hit.nearpt = view.motion.point_m;
        self.box_handle = NO_BOX_HANDLE;
        self.rotate_angle = 0.0;

        if self.is_edit_mode(view) && self.handle_index > 0 && Self::lock_sel_handle(view, 0) == 0 {
            if let Some(shape) = self.sel_ids.first().and_then(|&id| view.doc.find_shape(id)).cloned() {
                self.handle_index = self.hit_test_handles(&shape, view.motion.point_m, view, 10.0);
            }
            view.redraw();
        }
        if self.boxsel {
            self.boxsel = false;
            if !self.sel_ids.is_empty() {
                self.selection_changed(view);
            }
        }
        if !self.sel_ids.is_empty() {
            view.subject.on_select_touch_ended(&view.motion, &self.sel_ids);
        }
        if !view.motion.switch_gesture {
            self.long_press(view);
        }
        true
    }

    fn two_fingers_move(&mut self, view: &mut CmdView) -> bool {
        let nonzero = view.motion.distance_m() > geom::ZERO_TOL;
        match view.motion.gesture_state {
            GestureState::Possible => !self.sel_ids.is_empty() && nonzero && Self::zoom_shape_enabled(view),
            GestureState::Began => {
                if self.sel_ids.is_empty() || !Self::zoom_shape_enabled(view) {
                    return false;
                }
                self.clone_shapes(view);
                self.clones.len() == self.sel_ids.len() && nonzero
            }
            GestureState::Moved if nonzero => {
                self.two_fingers_transform(view);
                true
            }
            GestureState::Moved => true,
            state => {
                self.apply_clone_shapes(view, state == GestureState::Ended, false);
                if !view.motion.switch_gesture {
                    self.long_press(view);
                }
                true
            }
        }
    }

    fn as_selection(&mut self) -> Option<&mut dyn Selection> {
        Some(self)
    }
}

impl Selection for SelectCommand {
    fn selected_ids(&self, view: &CmdView) -> Vec<ShapeId> {
        let lock = Self::lock_sel_shape(view);
        if self.sel_ids.is_empty() && lock != 0 && view.doc.contains(lock) {
            return vec![lock];
        }
        self.sel_ids
            .iter()
            .copied()
            .filter(|&id| view.doc.contains(id))
            .collect()
    }

    fn select_state(&self, view: &CmdView) -> SelState {
        if self.is_edit_mode(view) {
            let on_vertex = self.handle_index > 0
                && view.doc.find_shape(self.id).is_some_and(Shape::is_base_lines);
            if on_vertex { SelState::Vertex } else { SelState::Vertexes }
        } else if self.sel_ids.len() > 1 {
            SelState::MultiShapes
        } else if self.sel_ids.len() == 1 {
            SelState::OneShape
        } else {
            SelState::None
        }
    }

    fn bounding_box(&self, view: &CmdView) -> Rect {
        let Some(mut selbox) = self.raw_bounding_box(view) else {
            return Rect::ZERO;
        };
        let min_dist = view.xform.display_to_model_len(8.0);
        if selbox.width() < min_dist {
            selbox = selbox.inflate(min_dist / 2.0, 0.0);
        }
        if selbox.height() < min_dist {
            selbox = selbox.inflate(0.0, min_dist / 2.0);
        }
        selbox = selbox.inflate(min_dist / 8.0, min_dist / 8.0);

        let inset = view.mm(1.0);
        let rcview = view.xform.wnd_rect_model().inflate(-inset, -inset);
        let selbox = selbox.intersect(rcview);
        let inner = view.mm(12.0);
        let selbox2 = selbox.intersect(rcview.inflate(-inner, -inner));
        let tol = view.mm(5.0);
        if selbox2.width() < tol || selbox2.height() < tol {
            selbox
        } else {
            selbox2
        }
    }

    fn select_all(&mut self, view: &mut CmdView) -> bool {
        let old = self.sel_ids.len();
        self.sel_ids = view.doc.ids().to_vec();
        self.id = self.sel_ids.last().copied().unwrap_or(0);
        self.handle_index = 0;
        self.rotate_handle = 0;
        self.insert_pt = false;
        self.boxsel = false;
        self.hit.segment = None;
        view.redraw();

        if old != self.sel_ids.len() || !self.sel_ids.is_empty() {
            self.selection_changed(view);
        }
        self.long_press(view);
        old != self.sel_ids.len()
    }

    fn reset_selection(&mut self, view: &mut CmdView) {
        let had = !self.sel_ids.is_empty();
        self.apply_clone_shapes(view, false, false);
        self.sel_ids.clear();
        self.id = 0;
        self.handle_index = 0;
        self.rotate_handle = 0;
        if had {
            self.selection_changed(view);
        }
    }

    fn add_selection(&mut self, view: &mut CmdView, id: ShapeId) -> bool {
        if !view.doc.contains(id) {
            return false;
        }
        if !self.sel_ids.contains(&id) {
            self.sel_ids.push(id);
            self.id = id;
            self.hit.segment = None;
            view.redraw();
            self.selection_changed(view);
        }
        true
    }

    fn delete_selection(&mut self, view: &mut CmdView) -> bool {
        let allowed = self
            .sel_ids
            .first()
            .and_then(|&id| view.doc.find_shape(id))
            .is_some_and(|shape| view.shape_will_delete(shape));
        let mut count = 0;

        if allowed {
            self.apply_clone_shapes(view, false, false);
            for id in std::mem::take(&mut self.sel_ids) {
                let deletable = view
                    .doc
                    .find_shape(id)
                    .is_some_and(|s| !s.is_locked() && !s.has_flag(ShapeFlags::NO_DEL));
                if deletable && view.remove_shape(id) {
                    count += 1;
                }
            }
            self.id = 0;
            self.handle_index = 0;
            self.rotate_handle = 0;
        }

        if count > 0 {
            view.regen();
            self.selection_changed(view);
            if count == 1 {
                view.message("@shape1_deleted");
            } else {
                view.message(format!("@shape_n_deleted {count}"));
            }
        }
        count > 0
    }

    fn clone_selection(&mut self, view: &mut CmdView) -> bool {
        self.clone_shapes(view);
        self.clones.retain(|s| !s.has_flag(ShapeFlags::NO_CLONE));
        if !self.clones.is_empty() {
            let dist = view.options.get_float("cloneOffset", 10.0);
            let vec = Vec2::new(
                view.mm(view.options.get_float("cloneOffsetX", dist)),
                view.mm(view.options.get_float("cloneOffsetY", dist)),
            );
            for clone in &mut self.clones {
                clone.offset(vec, None);
            }
        }
        self.apply_clone_shapes(view, true, true) && self.long_press(view)
    }

    fn is_fixed_length(&self, view: &CmdView) -> bool {
        view.doc
            .find_shape(self.id)
            .is_some_and(|s| s.has_flag(ShapeFlags::FIXED_LENGTH))
    }

    fn set_fixed_length(&mut self, view: &mut CmdView, fixed: bool) -> bool {
        let count = self.update_each(view, |_, shape| {
            let differs = shape.has_flag(ShapeFlags::FIXED_LENGTH) != fixed;
            shape.set_flag(ShapeFlags::FIXED_LENGTH, fixed);
            differs
        });
        if count > 0 {
            self.long_press(view);
        }
        count > 0
    }

    fn is_locked(&self, view: &CmdView) -> bool {
        view.doc.find_shape(self.id).is_some_and(Shape::is_locked)
    }

    fn set_locked(&mut self, view: &mut CmdView, locked: bool) -> bool {
        let count = self.update_each(view, |view, shape| {
            if shape.is_locked() == locked || !(locked || view.shape_can_unlock(shape)) {
                return false;
            }
            shape.set_flag(ShapeFlags::LOCKED, locked);
            true
        });
        if count > 0 {
            self.long_press(view);
        }
        count > 0
    }

    fn is_edit_mode(&self, view: &CmdView) -> bool {
        self.edit_mode
            && self.sel_ids.len() == 1
            && view.doc.find_shape(self.id).is_some_and(|s| !s.is_locked())
    }

    fn set_edit_mode(&mut self, view: &mut CmdView, edit: bool) -> bool {
        self.edit_mode = edit;
        self.handle_index = Self::lock_sel_handle(view, 0);
        self.rotate_handle = 0;
        view.redraw();
        self.long_press(view);
        true
    }

    fn insert_vertex(&mut self, view: &mut CmdView) -> bool {
        let mut ret = false;
        if self.is_edit_mode(view) {
            let (segment, nearpt) = (self.hit.segment, self.hit.nearpt);
            let min = view.mm(1.0);
            let edited = self.edit_lines(view, |lines| {
                segment.is_some_and(|seg| {
                    lines.points.get(seg).is_some_and(|p| p.distance(nearpt) > min)
                        && lines.insert_point(seg, nearpt)
                })
            });
            if let Some(shape) = edited {
                self.handle_index = self.hit_test_handles(&shape, nearpt, view, 10.0);
                ret = true;
            }
        }
        self.insert_pt = false;
        self.long_press(view);
        ret
    }

    fn delete_vertex(&mut self, view: &mut CmdView) -> bool {
        let mut ret = false;
        if let Some(index) = self.handle_index.checked_sub(1) {
            let nearpt = self.hit.nearpt;
            if let Some(shape) = self.edit_lines(view, |lines| lines.remove_point(index)) {
                self.handle_index = self.hit_test_handles(&shape, nearpt, view, 10.0);
                ret = true;
            }
        }
        self.insert_pt = false;
        self.long_press(view);
        ret
    }

    fn switch_closed(&mut self, view: &mut CmdView) -> bool {
        let ret = self
            .edit_lines(view, |lines| {
                let closed = lines.closed;
                lines.set_closed(!closed);
                true
            })
            .is_some();
        if ret {
            self.long_press(view);
        }
        ret
    }

    fn overturn(&mut self, view: &mut CmdView) -> bool {
        let Some(bbox) = self.raw_bounding_box(view) else {
            return false;
        };
        let rect = view.xform.wnd_rect_model().intersect(bbox);
        if rect.width() <= 0.0 && rect.height() <= 0.0 {
            return false;
        }
        let cy = rect.center().y;
        let mirror = Affine::new([1.0, 0.0, 0.0, -1.0, 0.0, 2.0 * cy]);
        self.apply_transform(view, mirror)
    }

    fn apply_transform(&mut self, view: &mut CmdView, affine: Affine) -> bool {
        let count = self.update_each(view, |view, shape| {
            if !Self::can_transform(view, shape) {
                return false;
            }
            shape.transform(affine);
            true
        });
        if count > 0 {
            self.long_press(view);
        }
        count > 0
    }
}
