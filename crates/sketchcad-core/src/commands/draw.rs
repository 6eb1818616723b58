//! Shared state for drawing commands.
//!
//! [`DrawBase`] owns the working shape (id 0, never in the document until it
//! is committed), the step counter and the last good snap. Simple commands
//! such as `line` and `rect` drive it directly from their gesture handlers.
//! Multi-step commands implement [`StepDraw`] and get the generic
//! began/moved/ended step logic.

use crate::command::{CmdView, Command};
use crate::error::{CommandError, CommandResult};
use crate::motion::GestureState;
use crate::render::{HintPen, Painter};
use crate::shapes::{LineStyle, SerializableColor, Shape, ShapeFlags, ShapeId, ShapeKind};
use crate::snap::SnapRequest;
use kurbo::Point;
use serde::Deserialize;
use serde_json::Value;

/// Most points replayed from a parameter block.
const MAX_REPLAY_POINTS: usize = 20;

/// Parameter block accepted by drawing commands.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DrawParams {
    pub fixedlen: bool,
    pub fixedsize: bool,
    pub locked: bool,
    pub hiden: bool,
    pub line_width: Option<f64>,
    pub line_style: Option<i64>,
    pub line_alpha: Option<i64>,
    #[serde(rename = "lineRGB")]
    pub line_rgb: Option<u32>,
    #[serde(rename = "lineARGB")]
    pub line_argb: Option<u32>,
    pub start_array_head: Option<i64>,
    pub end_array_head: Option<i64>,
    /// Flat `[x0, y0, x1, y1, ...]` model coordinates to draw without gestures.
    pub points: Vec<f64>,
    /// Replay the points as one drag instead of one drag per pair.
    pub multi_moved: bool,
}

fn small_int(name: &str, value: i64) -> CommandResult<u8> {
    u8::try_from(value).map_err(|_| CommandError::BadParam { name: name.to_string() })
}

impl DrawParams {
    pub fn from_value(value: &Value) -> CommandResult<Self> {
        Ok(Self::deserialize(value)?)
    }

    /// Apply flags and pen settings to a working shape.
    pub fn apply_to(&self, shape: &mut Shape) -> CommandResult<()> {
        shape.set_flag(ShapeFlags::FIXED_LENGTH, self.fixedlen);
        shape.set_flag(ShapeFlags::FIXED_SIZE, self.fixedsize);
        shape.set_flag(ShapeFlags::LOCKED, self.locked);
        shape.set_flag(ShapeFlags::HIDDEN, self.hiden);

        let style = shape.style_mut();
        if let Some(width) = self.line_width {
            style.stroke_width = width;
        }
        if let Some(code) = self.line_style {
            style.line_style = LineStyle::from_code(code);
        }
        if let Some(alpha) = self.line_alpha {
            style.stroke_color.a = small_int("lineAlpha", alpha)?;
        }
        if let Some(rgb) = self.line_rgb.filter(|&v| v != 0) {
            style.stroke_color = SerializableColor::from_rgb(rgb, style.stroke_color.a);
        }
        if let Some(argb) = self.line_argb.filter(|&v| v != 0) {
            style.stroke_color = SerializableColor::from_argb(argb);
        }
        if let Some(head) = self.start_array_head {
            style.start_arrowhead = small_int("startArrayHead", head)?;
        }
        if let Some(head) = self.end_array_head {
            style.end_arrowhead = small_int("endArrayHead", head)?;
        }
        Ok(())
    }

    /// Points to replay, if the block carries at least one.
    pub fn replay(&self) -> CommandResult<Option<Replay>> {
        if self.points.len() < 2 {
            return Ok(None);
        }
        if self.points.len() % 2 != 0 {
            return Err(CommandError::BadPoints(format!(
                "{} coordinates, expected pairs",
                self.points.len()
            )));
        }
        let points = self
            .points
            .chunks_exact(2)
            .take(MAX_REPLAY_POINTS)
            .map(|xy| Point::new(xy[0], xy[1]))
            .collect();
        Ok(Some(Replay {
            points,
            multi_moved: self.multi_moved,
        }))
    }
}

/// Scripted gesture sequence for building a shape from a parameter block.
#[derive(Debug, Clone, PartialEq)]
pub struct Replay {
    pub points: Vec<Point>,
    pub multi_moved: bool,
}

impl Replay {
    /// Feed the points to `cmd` as synthetic touches with snapping off, then
    /// cancel whatever is left in progress.
    pub fn run(&self, cmd: &mut dyn Command, view: &mut CmdView) {
        let saved_motion = view.motion.clone();
        let snap_enabled = view.options.get_bool("snapEnabled", true);
        view.options.set_bool("snapEnabled", false);

        if self.multi_moved {
            if let Some((&first, rest)) = self.points.split_first() {
                set_touch(view, GestureState::Began, first, first);
                cmd.touch_began(view);
                for &pt in rest {
                    set_touch(view, GestureState::Moved, first, pt);
                    cmd.touch_moved(view);
                    view.motion.last_pt_m = pt;
                }
                view.motion.gesture_state = GestureState::Ended;
                cmd.touch_ended(view);
            }
        } else {
            for pair in self.points.chunks(2) {
                let start = pair[0];
                let end = pair.get(1).copied().unwrap_or(start);
                set_touch(view, GestureState::Began, start, start);
                cmd.touch_began(view);
                set_touch(view, GestureState::Moved, start, end);
                cmd.touch_moved(view);
                view.motion.gesture_state = GestureState::Ended;
                cmd.touch_ended(view);
            }
        }

        cmd.cancel(view);
        view.options.set_bool("snapEnabled", snap_enabled);
        view.motion = saved_motion;
    }
}

fn set_touch(view: &mut CmdView, state: GestureState, start: Point, pt: Point) {
    let m = &mut view.motion;
    m.gesture_state = state;
    if state == GestureState::Began {
        m.start_pt_m = start;
        m.start_pt = view.xform.model_to_display(start);
        m.last_pt_m = start;
        m.last_pt = m.start_pt;
    }
    m.point_m = pt;
    m.point = view.xform.model_to_display(pt);
}

/// Working shape and step state shared by the drawing commands.
#[derive(Debug, Clone)]
pub struct DrawBase {
    kind: ShapeKind,
    make: fn() -> Shape,
    /// Initialized shape that the working shape resets to.
    template: Shape,
    /// Shape under construction, id 0.
    pub shape: Shape,
    /// Number of points placed so far.
    pub step: usize,
    last_snapped: Option<(Point, Point)>,
    draw_one_shape: bool,
}

impl DrawBase {
    pub fn new(kind: ShapeKind, make: fn() -> Shape) -> Self {
        let shape = make();
        Self {
            kind,
            make,
            template: shape.clone(),
            shape,
            step: 0,
            last_snapped: None,
            draw_one_shape: false,
        }
    }

    /// Reset for a fresh activation. Returns the points to replay, if any.
    pub fn initialize(&mut self, view: &mut CmdView, params: Option<&Value>) -> Option<Replay> {
        let mut shape = view.create_shape(self.kind, self.make);
        view.new_shape_id = 0;
        self.step = 0;
        self.last_snapped = None;
        self.draw_one_shape = view.options.get_bool("drawOneShape", false);
        view.clear_snap();

        let replay = match params.map(|value| Self::parse_params(value, &mut shape)) {
            Some(Ok(replay)) => replay,
            Some(Err(err)) => {
                log::warn!("Ignoring {:?} parameters: {err}", self.kind);
                None
            }
            None => None,
        };
        self.template = shape.clone();
        self.shape = shape;
        replay
    }

    fn parse_params(value: &Value, shape: &mut Shape) -> CommandResult<Option<Replay>> {
        let params = DrawParams::from_value(value)?;
        params.apply_to(shape)?;
        params.replay()
    }

    /// Discard the working shape.
    pub fn clear(&mut self) {
        self.shape = self.template.clone();
    }

    pub fn last_snapped(&self) -> Option<(Point, Point)> {
        self.last_snapped
    }

    /// Snap the current touch. The first step snaps the press position and
    /// does not treat the working shape as a snap source.
    pub fn snap_point(&mut self, view: &mut CmdView, first_step: bool) -> Point {
        let org = if first_step {
            view.motion.start_pt_m
        } else {
            view.motion.point_m
        };
        self.snap_point_at(view, org, first_step, self.step)
    }

    pub fn snap_point_at(&mut self, view: &mut CmdView, org: Point, first_step: bool, handle: usize) -> Point {
        let pt = view.snap_point(
            org,
            SnapRequest {
                shape: (!first_step).then_some(&self.shape),
                hot_handle: Some(handle),
                ..SnapRequest::default()
            },
        );
        let snapped = view.snap.snapped_type().is_point();

        if (first_step || !view.motion.dragging()) && snapped {
            view.subject.on_point_snapped(&view.motion, Some(&self.shape));
        }
        if first_step || snapped {
            self.last_snapped = Some((pt, view.motion.point_m));
        }
        pt
    }

    /// Exclude edges at handle `handle` of the working shape from near snaps.
    pub fn ignore_start_point(&self, view: &mut CmdView, handle: usize) {
        if handle < self.shape.handle_count() {
            view.snap.set_ignore_start_point(self.shape.handle_point(handle));
        }
    }

    /// Commit the working shape. Applies the `newShape*` options, asks the
    /// observers and resets the working shape.
    pub fn add_shape(&mut self, view: &mut CmdView) -> Option<ShapeId> {
        let mut shape = std::mem::replace(&mut self.shape, self.template.clone());
        for (key, flag) in [
            ("newShapeFixedlen", ShapeFlags::FIXED_LENGTH),
            ("newShapeFixedsize", ShapeFlags::FIXED_SIZE),
            ("newShapeLocked", ShapeFlags::LOCKED),
            ("newShapeHiden", ShapeFlags::HIDDEN),
        ] {
            if view.options.get_bool(key, false) {
                shape.set_flag(flag, true);
            }
        }

        let id = view.add_shape(shape);
        if let Some(id) = id {
            view.new_shape_id = id;
        }
        if self.draw_one_shape {
            view.request_command("select", None);
        }
        id
    }

    pub fn cancel(&mut self, view: &mut CmdView) -> bool {
        if self.step == 0 {
            return false;
        }
        self.step = 0;
        self.clear();
        view.clear_snap();
        view.redraw();
        true
    }

    pub fn back_step(&mut self, view: &mut CmdView) -> bool {
        if self.step > 1 {
            self.step -= 1;
            view.redraw();
            return true;
        }
        false
    }

    pub fn draw(&self, view: &CmdView, painter: &mut dyn Painter) -> bool {
        let drawn = self.step > 0;
        if drawn {
            let style = self.shape.style();
            let mut pen = HintPen::new(style.stroke(), style.stroke_width);
            pen.line_style = style.line_style;
            painter.draw_path(&self.shape.to_path(), &pen);
        }
        view.draw_snap(painter) || drawn
    }

    /// Tap before the first point: select the shape under the finger.
    pub fn click_idle(&mut self, view: &mut CmdView) -> bool {
        if view.options.get_bool("notClickSelectInDrawCmd", false) {
            return true;
        }
        let tol = view.options.get_float("hitTestTol", 10.0);
        let limits = view.motion.display_mm_to_model_box(tol);
        let hit = view.doc.hit_test(limits, limits.width() / 2.0).map(|(id, _)| id);

        if let Some(id) = hit {
            view.new_shape_id = id;
            view.request_command("select", None);
            log::debug!("{:?} drawing left after shape {id} was tapped", self.kind);
        }
        hit.is_some() || (view.use_finger() && self.long_press(view))
    }

    pub fn long_press(&self, view: &mut CmdView) -> bool {
        view.show_in_drawing()
    }

    pub fn began(&self, view: &mut CmdView) -> bool {
        view.redraw();
        true
    }

    pub fn moved(&self, view: &mut CmdView) -> bool {
        view.redraw();
        true
    }

    pub fn ended(&self, view: &mut CmdView) -> bool {
        view.clear_snap();
        view.redraw();
        true
    }

    /// Whether `pt` is far enough from the previous step point to advance.
    pub fn is_step_point_accepted(&self, view: &CmdView, prev: Point, pt: Point) -> bool {
        prev.distance(pt) > view.mm(2.0)
    }
}

/// Commands that place a fixed number of points one step at a time.
pub trait StepDraw {
    fn base(&self) -> &DrawBase;

    fn base_mut(&mut self) -> &mut DrawBase;

    /// Steps needed to complete the shape.
    fn max_step(&self) -> usize;

    /// Update the working geometry for the point placed at `step`.
    fn set_step_point(&mut self, step: usize, pt: Point);

    /// Point captured at `step`.
    fn step_point(&self, step: usize) -> Point;

    /// Whether the working geometry is a real shape of its kind.
    fn is_shape_valid(&self) -> bool {
        true
    }

    fn touch_began_step(&mut self, view: &mut CmdView) -> bool {
        if self.base().step == 0 {
            self.base_mut().step = 1;
            let pt = self.base_mut().snap_point(view, true);
            self.set_step_point(0, pt);
        } else {
            let step = self.base().step;
            let pt = self.base_mut().snap_point(view, false);
            self.set_step_point(step, pt);
        }
        self.base().began(view)
    }

    fn touch_moved_step(&mut self, view: &mut CmdView) -> bool {
        if view.motion.dragging() {
            let step = self.base().step;
            let pt = self.base_mut().snap_point(view, false);
            self.set_step_point(step, pt);
        }
        self.base().moved(view)
    }

    fn touch_ended_step(&mut self, view: &mut CmdView) -> bool {
        let step = self.base().step;
        let pt = self.base_mut().snap_point(view, false);
        self.set_step_point(step, pt);

        if step > 0 && self.base().is_step_point_accepted(view, self.step_point(step - 1), pt) {
            let next = step + 1;
            self.base_mut().step = next;
            if next >= self.max_step() {
                self.base_mut().step = 0;
                let tol = view.mm(2.0);
                let bounds = self.base().shape.bounds();
                if self.is_shape_valid() && (bounds.width() >= tol || bounds.height() >= tol) {
                    self.base_mut().add_shape(view);
                } else {
                    self.base_mut().clear();
                    view.message("@shape_too_small");
                }
            }
        }
        self.base().ended(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Line;
    use serde_json::json;

    fn line_shape() -> Shape {
        Shape::Line(Line::new(Point::ZERO, Point::ZERO))
    }

    #[test]
    fn test_params_apply_style_and_flags() {
        let params = DrawParams::from_value(&json!({
            "fixedlen": true,
            "lineWidth": 2.5,
            "lineStyle": 1,
            "lineARGB": 0x80FF0000u32,
            "endArrayHead": 3,
        }))
        .unwrap();
        let mut shape = line_shape();
        params.apply_to(&mut shape).unwrap();

        assert!(shape.has_flag(ShapeFlags::FIXED_LENGTH));
        assert!(!shape.is_locked());
        let style = shape.style();
        assert_eq!(style.stroke_width, 2.5);
        assert_eq!(style.line_style, LineStyle::Dash);
        assert_eq!(style.stroke_color, SerializableColor::new(255, 0, 0, 0x80));
        assert_eq!(style.end_arrowhead, 3);
    }

    #[test]
    fn test_params_reject_bad_values() {
        assert!(matches!(
            DrawParams::from_value(&json!({ "locked": "yes" })),
            Err(CommandError::Params(_))
        ));

        let params = DrawParams::from_value(&json!({ "lineAlpha": 300 })).unwrap();
        let err = params.apply_to(&mut line_shape()).unwrap_err();
        assert!(matches!(err, CommandError::BadParam { name } if name == "lineAlpha"));

        let params = DrawParams::from_value(&json!({ "points": [0.0, 1.0, 2.0] })).unwrap();
        assert!(matches!(params.replay(), Err(CommandError::BadPoints(_))));
    }

    #[test]
    fn test_replay_pairs_points() {
        let params = DrawParams::from_value(&json!({
            "points": [0, 0, 10, 0, 10, 10, 0, 10],
            "multiMoved": true,
        }))
        .unwrap();
        let replay = params.replay().unwrap().unwrap();
        assert!(replay.multi_moved);
        assert_eq!(replay.points.len(), 4);
        assert_eq!(replay.points[2], Point::new(10.0, 10.0));
        assert!(DrawParams::default().replay().unwrap().is_none());
    }
}
