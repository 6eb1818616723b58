//! Polyline command: one vertex per tap or drag, open or closed.

use super::draw::DrawBase;
use crate::command::{CmdView, Command};
use crate::render::{HandleMark, Painter};
use crate::shapes::{Lines, Shape, ShapeId, ShapeKind};
use kurbo::Point;
use serde_json::Value;

/// Polyline built one vertex at a time.
///
/// `base.step` is the index of the vertex being placed. A release close to
/// the first vertex closes the polyline and commits it. A double tap, or a
/// tap on the accept mark, commits an open one.
#[derive(Debug, Clone)]
pub struct DrawLines {
    base: DrawBase,
}

impl Default for DrawLines {
    fn default() -> Self {
        Self {
            base: DrawBase::new(ShapeKind::Lines, || Shape::Lines(Lines::new(Vec::new(), false))),
        }
    }
}

impl DrawLines {
    pub fn new() -> Self {
        Self::default()
    }

    fn points(&self) -> &[Point] {
        match &self.base.shape {
            Shape::Lines(lines) => &lines.points,
            _ => &[],
        }
    }

    fn is_closed(&self) -> bool {
        matches!(&self.base.shape, Shape::Lines(lines) if lines.closed)
    }

    fn set_point(&mut self, index: usize, pt: Point) {
        if let Some(lines) = self.base.shape.as_lines_mut() {
            if let Some(p) = lines.points.get_mut(index) {
                *p = pt;
            }
        }
    }

    /// Drop the vertex under the finger that has not been accepted yet.
    fn drop_pending(&mut self) {
        let step = self.base.step;
        if let Some(lines) = self.base.shape.as_lines_mut() {
            lines.points.truncate(step.max(1));
        }
    }

    /// Close the outline while `pt` sits on the first vertex.
    fn check_closed(&mut self, view: &CmdView, pt: Point) -> bool {
        let step = self.base.step;
        let near = view.mm(2.0);
        let closed = step > 2 && self.points().first().is_some_and(|first| first.distance(pt) < near);
        if let Some(lines) = self.base.shape.as_lines_mut() {
            lines.set_closed(closed);
        }
        closed
    }

    fn can_add_point(&self, view: &CmdView, pt: Point) -> bool {
        let step = self.base.step;
        step > 0 && self.points().get(step - 1).is_some_and(|prev| prev.distance(pt) >= view.mm(3.0))
    }

    fn accept_mark(&self, view: &CmdView) -> Option<Point> {
        let min_step = if self.is_closed() { 3 } else { 2 };
        (self.base.step > min_step && !view.motion.dragging()).then(|| self.base.shape.bounds().center())
    }

    fn commit(&mut self, view: &mut CmdView) {
        self.base.add_shape(view);
        self.base.step = 0;
        view.clear_snap();
        view.redraw();
    }
}

impl Command for DrawLines {
    fn name(&self) -> &str {
        "lines"
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

    /// Commits the polyline when it already has three vertices.
    fn cancel(&mut self, view: &mut CmdView) -> bool {
        let min_step = if self.is_closed() { 2 } else { 1 };
        if self.base.step > min_step {
            self.drop_pending();
            if self.points().len() > 2 {
                self.commit(view);
                return true;
            }
        }
        self.base.cancel(view)
    }

    fn back_step(&mut self, view: &mut CmdView) -> bool {
        if self.base.step > 2 {
            self.drop_pending();
            if let Some(lines) = self.base.shape.as_lines_mut() {
                lines.points.pop();
            }
        }
        self.base.back_step(view)
    }

    fn draw(&mut self, view: &mut CmdView, painter: &mut dyn Painter) -> bool {
        if let Some(center) = self.accept_mark(view) {
            painter.draw_handle(center, HandleMark::Accept);
        }
        self.base.draw(view, painter)
    }

    fn click(&mut self, view: &mut CmdView) -> bool {
        if self.base.step == 0 {
            return self.base.click_idle(view);
        }
        if self
            .accept_mark(view)
            .is_some_and(|center| center.distance(view.motion.point_m) < view.mm(5.0))
        {
            return self.cancel(view);
        }
        self.touch_began(view) && self.touch_ended(view)
    }

    fn double_click(&mut self, view: &mut CmdView) -> bool {
        if self.base.step > 1 {
            self.drop_pending();
            if self.points().len() > 1 {
                self.commit(view);
            } else {
                self.base.cancel(view);
            }
        }
        true
    }

    fn long_press(&mut self, view: &mut CmdView) -> bool {
        self.base.long_press(view)
    }

    fn touch_began(&mut self, view: &mut CmdView) -> bool {
        let pt = self.base.snap_point(view, true);
        if self.base.step == 0 {
            self.base.step = 1;
            if let Some(lines) = self.base.shape.as_lines_mut() {
                lines.points = vec![pt, pt];
                lines.set_closed(false);
            }
        } else {
            let step = self.base.step;
            if let Some(lines) = self.base.shape.as_lines_mut() {
                if lines.points.len() <= step {
                    lines.points.push(pt);
                }
            }
            self.set_point(step, pt);
        }
        self.base.began(view)
    }

    fn touch_moved(&mut self, view: &mut CmdView) -> bool {
        let step = self.base.step;
        self.base.ignore_start_point(view, step.saturating_sub(1));
        let pt = self.base.snap_point(view, false);
        self.set_point(step, pt);
        self.check_closed(view, pt);
        self.base.moved(view)
    }

    fn touch_ended(&mut self, view: &mut CmdView) -> bool {
        let step = self.base.step;
        let pt = self.base.snap_point(view, false);
        self.set_point(step, pt);
        let closed = self.check_closed(view, pt);

        if self.can_add_point(view, pt) {
            if closed {
                if let Some(lines) = self.base.shape.as_lines_mut() {
                    lines.points.pop();
                }
                self.commit(view);
                return true;
            }
            self.base.step += 1;
        } else if step > 1 {
            self.drop_pending();
        }
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
    use crate::render::RecordingPainter;
    use serde_json::json;

    fn first_drag(cmd: &mut DrawLines, view: &mut CmdView, from: Point, to: Point) {
        press(view, from);
        cmd.touch_began(view);
        drag(view, to);
        cmd.touch_moved(view);
        release(view, to);
        cmd.touch_ended(view);
    }

    fn tap(cmd: &mut DrawLines, view: &mut CmdView, pt: Point) -> bool {
        press(view, pt);
        release(view, pt);
        cmd.click(view)
    }

    fn only_lines(view: &CmdView) -> Lines {
        assert_eq!(view.doc.len(), 1);
        match view.doc.iter().next() {
            Some(Shape::Lines(lines)) => lines.clone(),
            other => panic!("expected a polyline, got {other:?}"),
        }
    }

    #[test]
    fn test_taps_add_vertices_until_double_tap() {
        let mut view = mm_view();
        let mut cmd = DrawLines::new();
        cmd.initialize_with_selection(&mut view, &[], None);

        first_drag(&mut cmd, &mut view, Point::ZERO, Point::new(20.0, 0.0));
        assert_eq!(cmd.base.step, 2);
        assert!(tap(&mut cmd, &mut view, Point::new(20.0, 20.0)));
        assert!(tap(&mut cmd, &mut view, Point::new(40.0, 20.0)));
        assert_eq!(cmd.base.step, 4);
        assert!(view.doc.is_empty());

        assert!(cmd.double_click(&mut view));
        let lines = only_lines(&view);
        assert!(!lines.closed);
        assert_eq!(
            lines.points,
            vec![Point::ZERO, Point::new(20.0, 0.0), Point::new(20.0, 20.0), Point::new(40.0, 20.0)]
        );
        assert_eq!(cmd.base.step, 0);
    }

    #[test]
    fn test_vertex_too_close_is_dropped() {
        let mut view = mm_view();
        let mut cmd = DrawLines::new();
        cmd.initialize_with_selection(&mut view, &[], None);

        first_drag(&mut cmd, &mut view, Point::ZERO, Point::new(20.0, 0.0));
        tap(&mut cmd, &mut view, Point::new(21.0, 1.0));
        assert_eq!(cmd.base.step, 2);
        assert_eq!(cmd.points().len(), 2);
    }

    #[test]
    fn test_release_on_first_vertex_closes() {
        let mut view = mm_view();
        let mut cmd = DrawLines::new();
        cmd.initialize_with_selection(&mut view, &[], None);

        first_drag(&mut cmd, &mut view, Point::ZERO, Point::new(20.0, 0.0));
        tap(&mut cmd, &mut view, Point::new(20.0, 20.0));
        tap(&mut cmd, &mut view, Point::new(0.5, 0.5));

        let lines = only_lines(&view);
        assert!(lines.closed);
        assert_eq!(lines.points.len(), 3);
        assert_eq!(cmd.base.step, 0);
    }

    #[test]
    fn test_cancel_commits_only_with_three_vertices() {
        let mut view = mm_view();
        let mut cmd = DrawLines::new();
        cmd.initialize_with_selection(&mut view, &[], None);

        first_drag(&mut cmd, &mut view, Point::ZERO, Point::new(20.0, 0.0));
        assert!(cmd.cancel(&mut view));
        assert!(view.doc.is_empty());

        first_drag(&mut cmd, &mut view, Point::ZERO, Point::new(20.0, 0.0));
        tap(&mut cmd, &mut view, Point::new(20.0, 20.0));
        assert!(cmd.cancel(&mut view));
        assert_eq!(only_lines(&view).points.len(), 3);
    }

    #[test]
    fn test_accept_mark_after_three_vertices() {
        let mut view = mm_view();
        let mut cmd = DrawLines::new();
        cmd.initialize_with_selection(&mut view, &[], None);
        first_drag(&mut cmd, &mut view, Point::ZERO, Point::new(20.0, 0.0));
        tap(&mut cmd, &mut view, Point::new(20.0, 20.0));

        let mut painter = RecordingPainter::default();
        cmd.draw(&mut view, &mut painter);
        assert!(painter.handles.contains(&(Point::new(10.0, 10.0), HandleMark::Accept)));

        assert!(tap(&mut cmd, &mut view, Point::new(11.0, 9.0)));
        assert_eq!(only_lines(&view).points.len(), 3);
    }

    #[test]
    fn test_points_param_replays_vertices() {
        let mut view = mm_view();
        let mut cmd = DrawLines::new();
        let params = json!({ "points": [0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 20.0, 10.0] });
        cmd.initialize_with_selection(&mut view, &[], Some(&params));

        assert_eq!(only_lines(&view).points.len(), 3);
        assert_eq!(cmd.base.step, 0);
    }
}
