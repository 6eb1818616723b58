//! Arc commands: three points on the arc, or center, start and end.

use super::draw::{DrawBase, StepDraw};
use crate::command::{CmdView, Command};
use crate::render::{HandleMark, HintPen, Painter};
use crate::shapes::{Arc, Shape, ShapeId, ShapeKind};
use kurbo::Point;
use peniko::Color;
use serde_json::Value;

const GUIDE_COLOR: Color = Color::from_rgba8(0, 126, 0, 32);

fn guide_pen() -> HintPen {
    HintPen::new(GUIDE_COLOR, 0.0).dashed()
}

/// Arc through a start point, a point on the arc and an end point.
///
/// The first drag places the start and the middle point, the next tap or
/// drag places the end.
#[derive(Debug, Clone)]
pub struct DrawArc3P {
    base: DrawBase,
    points: [Point; 3],
    /// The three points span a circle.
    valid: bool,
}

impl Default for DrawArc3P {
    fn default() -> Self {
        Self {
            base: DrawBase::new(ShapeKind::Arc, || Shape::Arc(Arc::new(Point::ZERO, 0.0, 0.0, 0.0))),
            points: [Point::ZERO; 3],
            valid: false,
        }
    }
}

impl DrawArc3P {
    pub fn new() -> Self {
        Self::default()
    }

    fn arc_mut(&mut self) -> Option<&mut Arc> {
        match &mut self.base.shape {
            Shape::Arc(arc) => Some(arc),
            _ => None,
        }
    }
}

impl StepDraw for DrawArc3P {
    fn base(&self) -> &DrawBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawBase {
        &mut self.base
    }

    fn max_step(&self) -> usize {
        3
    }

    fn set_step_point(&mut self, step: usize, pt: Point) {
        let [p0, p1, _] = self.points;
        match step {
            0 => {
                self.points[0] = pt;
                self.valid = false;
                if let Some(arc) = self.arc_mut() {
                    arc.set_center_radius(pt, 0.0, 0.0, 0.0);
                }
            }
            1 => {
                self.points[1] = pt;
                self.points[2] = pt;
                self.valid = false;
                if let Some(arc) = self.arc_mut() {
                    arc.set_start_mid_end(p0, pt, pt);
                }
            }
            _ => {
                self.points[2] = pt;
                self.valid = self.arc_mut().is_some_and(|arc| arc.set_start_mid_end(p0, p1, pt));
            }
        }
    }

    fn is_shape_valid(&self) -> bool {
        self.valid
    }

    fn step_point(&self, step: usize) -> Point {
        self.points[step.min(2)]
    }
}

impl Command for DrawArc3P {
    fn name(&self) -> &str {
        "arc3p"
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
        if self.base.step == 2 {
            painter.draw_line(self.points[0], self.points[1], &guide_pen());
            if let Some((center, radius)) = self.base.shape.circle_geometry() {
                painter.draw_circle(center, radius, &guide_pen());
            }
        }
        self.base.draw(view, painter)
    }

    fn click(&mut self, view: &mut CmdView) -> bool {
        if self.base.step == 0 {
            self.base.click_idle(view)
        } else {
            self.touch_began_step(view) && self.touch_ended_step(view)
        }
    }

    fn long_press(&mut self, view: &mut CmdView) -> bool {
        self.base.long_press(view)
    }

    fn touch_began(&mut self, view: &mut CmdView) -> bool {
        self.touch_began_step(view)
    }

    fn touch_moved(&mut self, view: &mut CmdView) -> bool {
        self.touch_moved_step(view)
    }

    fn touch_ended(&mut self, view: &mut CmdView) -> bool {
        self.touch_ended_step(view)
    }

    fn last_snapped(&self) -> Option<(Point, Point)> {
        self.base.last_snapped()
    }
}

/// Arc (or sector) from its center, a start point fixing the radius and an
/// end point fixing the sweep.
#[derive(Debug, Clone)]
pub struct DrawArcCse {
    name: &'static str,
    base: DrawBase,
    points: [Point; 3],
}

impl Default for DrawArcCse {
    fn default() -> Self {
        Self {
            name: "arc_cse",
            base: DrawBase::new(ShapeKind::Arc, || Shape::Arc(Arc::new(Point::ZERO, 0.0, 0.0, 0.0))),
            points: [Point::ZERO; 3],
        }
    }
}

impl DrawArcCse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same steps, but the result is a closed pie slice.
    pub fn sector() -> Self {
        Self {
            name: "sector",
            base: DrawBase::new(ShapeKind::Arc, || {
                Shape::Arc(Arc::new_sector(Point::ZERO, 0.0, 0.0, 0.0))
            }),
            points: [Point::ZERO; 3],
        }
    }

    fn arc_mut(&mut self) -> Option<&mut Arc> {
        match &mut self.base.shape {
            Shape::Arc(arc) => Some(arc),
            _ => None,
        }
    }
}

impl StepDraw for DrawArcCse {
    fn base(&self) -> &DrawBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawBase {
        &mut self.base
    }

    fn max_step(&self) -> usize {
        3
    }

    fn set_step_point(&mut self, step: usize, pt: Point) {
        let [center, start, _] = self.points;
        match step {
            0 => {
                self.points[0] = pt;
                if let Some(arc) = self.arc_mut() {
                    arc.set_center_radius(pt, 0.0, 0.0, 0.0);
                }
            }
            1 => {
                self.points[1] = pt;
                self.points[2] = pt;
                if let Some(arc) = self.arc_mut() {
                    arc.set_center_radius(center, center.distance(pt), (pt - center).atan2(), 0.0);
                }
            }
            _ => {
                self.points[2] = pt;
                if let Some(arc) = self.arc_mut() {
                    let last_sweep = arc.sweep;
                    arc.set_center_start_end(center, start, pt, last_sweep);
                }
            }
        }
    }

    fn step_point(&self, step: usize) -> Point {
        self.points[step.min(2)]
    }
}

impl Command for DrawArcCse {
    fn name(&self) -> &str {
        self.name
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
        if self.base.step > 0 {
            let center = self.points[0];
            painter.draw_handle(center, HandleMark::Vertex);
            if self.base.step > 1 {
                painter.draw_circle(center, center.distance(self.points[1]), &guide_pen());
            }
        }
        self.base.draw(view, painter)
    }

    fn click(&mut self, view: &mut CmdView) -> bool {
        if self.base.step == 0 {
            self.base.click_idle(view)
        } else {
            self.touch_began_step(view) && self.touch_ended_step(view)
        }
    }

    fn long_press(&mut self, view: &mut CmdView) -> bool {
        self.base.long_press(view)
    }

    fn touch_began(&mut self, view: &mut CmdView) -> bool {
        self.touch_began_step(view)
    }

    fn touch_moved(&mut self, view: &mut CmdView) -> bool {
        self.touch_moved_step(view)
    }

    fn touch_ended(&mut self, view: &mut CmdView) -> bool {
        self.touch_ended_step(view)
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
    use crate::render::RecordingPainter;
    use std::f64::consts::FRAC_PI_2;

    fn first_drag(cmd: &mut dyn Command, view: &mut CmdView, from: Point, to: Point) {
        press(view, from);
        cmd.touch_began(view);
        drag(view, to);
        cmd.touch_moved(view);
        release(view, to);
        cmd.touch_ended(view);
    }

    fn only_arc(view: &CmdView) -> Arc {
        assert_eq!(view.doc.len(), 1);
        match view.doc.iter().next() {
            Some(Shape::Arc(arc)) => arc.clone(),
            other => panic!("expected an arc, got {other:?}"),
        }
    }

    #[test]
    fn test_arc_through_three_points() {
        let mut view = mm_view();
        let mut cmd = DrawArc3P::new();
        cmd.initialize_with_selection(&mut view, &[], None);

        first_drag(&mut cmd, &mut view, Point::new(-10.0, 0.0), Point::new(0.0, 10.0));
        assert_eq!(cmd.base.step, 2);
        assert!(view.doc.is_empty());

        press(&mut view, Point::new(10.0, 0.0));
        assert!(cmd.click(&mut view));

        let arc = only_arc(&view);
        assert!(arc.center.distance(Point::ZERO) < 1e-6);
        assert!((arc.radius - 10.0).abs() < 1e-6);
        assert!(arc.mid_point().distance(Point::new(0.0, 10.0)) < 1e-6);
        assert_eq!(cmd.base.step, 0);
    }

    #[test]
    fn test_arc_guides_while_placing_end() {
        let mut view = mm_view();
        let mut cmd = DrawArc3P::new();
        cmd.initialize_with_selection(&mut view, &[], None);
        first_drag(&mut cmd, &mut view, Point::new(-10.0, 0.0), Point::new(0.0, 10.0));

        let mut painter = RecordingPainter::default();
        assert!(cmd.draw(&mut view, &mut painter));
        assert_eq!(painter.lines, vec![(Point::new(-10.0, 0.0), Point::new(0.0, 10.0))]);
    }

    #[test]
    fn test_collinear_points_make_no_arc() {
        let mut view = mm_view();
        let mut cmd = DrawArc3P::new();
        cmd.initialize_with_selection(&mut view, &[], None);
        first_drag(&mut cmd, &mut view, Point::new(-10.0, 0.0), Point::new(0.0, 10.0));

        // A real arc first, then the end slides onto the chord line.
        drag(&mut view, Point::new(10.0, 0.0));
        cmd.touch_moved(&mut view);
        press(&mut view, Point::new(10.0, 20.0));
        assert!(cmd.click(&mut view));

        assert!(view.doc.is_empty());
        assert_eq!(cmd.base.step, 0);
        assert!(view.events.iter().any(|e| *e == ViewEvent::Message("@shape_too_small".into())));
    }

    #[test]
    fn test_center_start_end_arc() {
        let mut view = mm_view();
        let mut cmd = DrawArcCse::new();
        cmd.initialize_with_selection(&mut view, &[], None);

        first_drag(&mut cmd, &mut view, Point::ZERO, Point::new(10.0, 0.0));
        press(&mut view, Point::new(0.0, 10.0));
        cmd.click(&mut view);

        let arc = only_arc(&view);
        assert!(!arc.sector);
        assert!((arc.radius - 10.0).abs() < 1e-9);
        assert!((arc.sweep - FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_sector_command_makes_sectors() {
        let mut view = mm_view();
        let mut cmd = DrawArcCse::sector();
        assert_eq!(cmd.name(), "sector");
        cmd.initialize_with_selection(&mut view, &[], None);

        first_drag(&mut cmd, &mut view, Point::ZERO, Point::new(0.0, 8.0));
        press(&mut view, Point::new(-8.0, 0.0));
        cmd.click(&mut view);

        assert!(only_arc(&view).sector);
    }

    #[test]
    fn test_cancel_drops_partial_arc() {
        let mut view = mm_view();
        let mut cmd = DrawArcCse::new();
        cmd.initialize_with_selection(&mut view, &[], None);
        first_drag(&mut cmd, &mut view, Point::ZERO, Point::new(10.0, 0.0));

        assert!(cmd.cancel(&mut view));
        assert_eq!(cmd.base.step, 0);
        assert!(!cmd.cancel(&mut view));
        assert!(view.doc.is_empty());
    }
}
