//! Two-point line command.

use super::draw::DrawBase;
use crate::command::{CmdView, Command};
use crate::render::Painter;
use crate::shapes::{Line, Shape, ShapeId, ShapeKind};
use kurbo::Point;
use serde_json::Value;

fn new_line() -> Shape {
    Shape::Line(Line::new(Point::ZERO, Point::ZERO))
}

/// Draws one line per drag, from the press point to the release point.
#[derive(Debug, Clone)]
pub struct DrawLine {
    base: DrawBase,
}

impl Default for DrawLine {
    fn default() -> Self {
        Self {
            base: DrawBase::new(ShapeKind::Line, new_line),
        }
    }
}

impl DrawLine {
    pub fn new() -> Self {
        Self::default()
    }

    fn line_mut(&mut self) -> Option<&mut Line> {
        match &mut self.base.shape {
            Shape::Line(line) => Some(line),
            _ => None,
        }
    }
}

impl Command for DrawLine {
    fn name(&self) -> &str {
        "line"
    }

    fn is_drawing_command(&self) -> bool {
        true
    }

    fn initialize_with_selection(&mut self, view: &mut CmdView, _selection: &[ShapeId], params: Option<&Value>) -> bool {
        if let Some(replay) = self.base.initialize(view, params) {
            replay.run(self, view);
        }
        true
    }

    fn cancel(&mut self, view: &mut CmdView) -> bool {
        self.base.cancel(view)
    }

    fn back_step(&mut self, view: &mut CmdView) -> bool {
        self.base.back_step(view)
    }

    fn draw(&mut self, view: &mut CmdView, painter: &mut dyn Painter) -> bool {
        self.base.draw(view, painter)
    }

    fn click(&mut self, view: &mut CmdView) -> bool {
        if self.base.step == 0 {
            self.base.click_idle(view)
        } else {
            self.touch_began(view) && self.touch_ended(view)
        }
    }

    fn long_press(&mut self, view: &mut CmdView) -> bool {
        self.base.long_press(view)
    }

    fn touch_began(&mut self, view: &mut CmdView) -> bool {
        self.base.step = 1;
        let pt = self.base.snap_point(view, true);
        if let Some(line) = self.line_mut() {
            line.start = pt;
            line.end = pt;
        }
        self.base.began(view)
    }

    fn touch_moved(&mut self, view: &mut CmdView) -> bool {
        self.base.ignore_start_point(view, 0);
        let pt = self.base.snap_point(view, false);
        if let Some(line) = self.line_mut() {
            line.end = pt;
        }
        self.base.moved(view)
    }

    fn touch_ended(&mut self, view: &mut CmdView) -> bool {
        let long_enough = self
            .base
            .shape
            .as_segment()
            .is_some_and(|(a, b)| a.distance(b) > view.mm(2.0));
        if long_enough {
            self.base.add_shape(view);
        } else {
            self.base.clear();
            view.message("@shape_too_small");
        }
        self.base.step = 0;
        self.base.ended(view)
    }

    fn last_snapped(&self) -> Option<(Point, Point)> {
        self.base.last_snapped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{drag, mm_view, press, release};
    use crate::events::ViewEvent;
    use serde_json::json;

    fn run_drag(cmd: &mut DrawLine, view: &mut CmdView, from: Point, to: Point) {
        press(view, from);
        cmd.touch_began(view);
        drag(view, to);
        cmd.touch_moved(view);
        release(view, to);
        cmd.touch_moved(view);
        cmd.touch_ended(view);
    }

    #[test]
    fn test_short_drag_is_not_committed() {
        let mut view = mm_view();
        let mut cmd = DrawLine::new();
        assert!(cmd.initialize_with_selection(&mut view, &[], None));

        run_drag(&mut cmd, &mut view, Point::ZERO, Point::new(1.0, 0.0));
        assert!(view.doc.is_empty());
        assert!(view.events.iter().any(|e| *e == ViewEvent::Message("@shape_too_small".into())));
    }

    #[test]
    fn test_long_drag_adds_one_line() {
        let mut view = mm_view();
        let mut cmd = DrawLine::new();
        cmd.initialize_with_selection(&mut view, &[], None);

        run_drag(&mut cmd, &mut view, Point::ZERO, Point::new(10.0, 0.0));
        assert_eq!(view.doc.len(), 1);
        let id = view.new_shape_id;
        assert_eq!(id, 1);
        let (a, b) = view.doc.find_shape(id).and_then(Shape::as_segment).unwrap();
        assert!(a.distance(Point::ZERO) < 1e-9);
        assert!(b.distance(Point::new(10.0, 0.0)) < 1e-9);
        assert!(view.events.iter().any(|e| *e == ViewEvent::ShapeAdded(id)));
        assert_eq!(cmd.base.step, 0);
    }

    #[test]
    fn test_end_snaps_to_existing_vertex() {
        let mut view = mm_view();
        view.doc.add_shape(new_line_at(Point::new(20.0, 20.0), Point::new(30.0, 20.0)));
        let mut cmd = DrawLine::new();
        cmd.initialize_with_selection(&mut view, &[], None);

        run_drag(&mut cmd, &mut view, Point::ZERO, Point::new(20.5, 19.6));
        let (_, end) = view.doc.find_shape(2).and_then(Shape::as_segment).unwrap();
        assert!(end.distance(Point::new(20.0, 20.0)) < 1e-9);
    }

    #[test]
    fn test_points_param_draws_without_gestures() {
        let mut view = mm_view();
        let mut cmd = DrawLine::new();
        let params = json!({ "points": [0, 0, 10, 5, 20, 0, 20, 20], "lineWidth": 1.5 });
        assert!(cmd.initialize_with_selection(&mut view, &[], Some(&params)));

        assert_eq!(view.doc.len(), 2);
        assert!(view.doc.iter().all(|s| s.style().stroke_width == 1.5));
        assert_eq!(cmd.base.step, 0);
        assert!(view.options.get_bool("snapEnabled", true));
    }

    #[test]
    fn test_tap_on_shape_switches_to_select() {
        let mut view = mm_view();
        let id = view.doc.add_shape(new_line_at(Point::ZERO, Point::new(30.0, 0.0)));
        let mut cmd = DrawLine::new();
        cmd.initialize_with_selection(&mut view, &[], None);

        press(&mut view, Point::new(15.0, 1.0));
        assert!(cmd.click(&mut view));
        assert_eq!(view.new_shape_id, id);
        assert_eq!(view.take_request().map(|r| r.name), Some("select".to_string()));
    }

    fn new_line_at(a: Point, b: Point) -> Shape {
        Shape::Line(Line::new(a, b))
    }
}
