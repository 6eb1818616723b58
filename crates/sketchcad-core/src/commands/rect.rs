//! Rectangle and circle commands, both defined by one drag.

use super::draw::DrawBase;
use crate::command::{CmdView, Command};
use crate::render::Painter;
use crate::shapes::{Circle, Rectangle, Shape, ShapeId, ShapeKind};
use kurbo::Point;
use serde_json::Value;

/// Axis-aligned rectangle from the press corner to the release corner.
#[derive(Debug, Clone)]
pub struct DrawRect {
    base: DrawBase,
    start: Point,
}

impl Default for DrawRect {
    fn default() -> Self {
        Self {
            base: DrawBase::new(ShapeKind::Rectangle, || {
                Shape::Rectangle(Rectangle::from_corners(Point::ZERO, Point::ZERO))
            }),
            start: Point::ZERO,
        }
    }
}

impl DrawRect {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_corners(&mut self, a: Point, b: Point) {
        if let Shape::Rectangle(rect) = &mut self.base.shape {
            rect.set_corners(a, b);
        }
    }

    fn is_big_enough(&self, view: &CmdView) -> bool {
        let min = view.mm(2.0);
        match &self.base.shape {
            Shape::Rectangle(rect) => {
                rect.width() > min && rect.height() > min && rect.corners[0].distance(rect.corners[2]) > 2.0 * min
            }
            _ => false,
        }
    }
}

/// Commit a one-drag shape, or treat a drag shorter than two pixels as a tap.
fn finish_drag(base: &mut DrawBase, view: &mut CmdView, big_enough: bool) -> bool {
    if big_enough {
        base.add_shape(view);
        base.step = 0;
    } else if view.motion.point.distance(view.motion.start_pt) < 2.0 {
        base.step = 0;
        base.clear();
        return base.click_idle(view);
    } else {
        base.clear();
        base.step = 0;
        view.message("@shape_too_small");
    }
    base.ended(view)
}

impl Command for DrawRect {
    fn name(&self) -> &str {
        "rect"
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
        self.base.click_idle(view)
    }

    fn long_press(&mut self, view: &mut CmdView) -> bool {
        self.base.long_press(view)
    }

    fn touch_began(&mut self, view: &mut CmdView) -> bool {
        self.base.step = 1;
        self.start = self.base.snap_point(view, true);
        self.set_corners(self.start, self.start);
        self.base.began(view)
    }

    fn touch_moved(&mut self, view: &mut CmdView) -> bool {
        let pt = self.base.snap_point(view, false);
        self.set_corners(self.start, pt);
        self.base.moved(view)
    }

    fn touch_ended(&mut self, view: &mut CmdView) -> bool {
        let big_enough = self.is_big_enough(view);
        finish_drag(&mut self.base, view, big_enough)
    }

    fn last_snapped(&self) -> Option<(Point, Point)> {
        self.base.last_snapped()
    }
}

/// Circle from the press point (center) to the release point (on the rim).
#[derive(Debug, Clone)]
pub struct DrawCircle {
    base: DrawBase,
}

impl Default for DrawCircle {
    fn default() -> Self {
        Self {
            base: DrawBase::new(ShapeKind::Circle, || Shape::Circle(Circle::new(Point::ZERO, 0.0))),
        }
    }
}

impl DrawCircle {
    pub fn new() -> Self {
        Self::default()
    }

    fn circle_mut(&mut self) -> Option<&mut Circle> {
        match &mut self.base.shape {
            Shape::Circle(circle) => Some(circle),
            _ => None,
        }
    }
}

impl Command for DrawCircle {
    fn name(&self) -> &str {
        "circle"
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

    fn draw(&mut self, view: &mut CmdView, painter: &mut dyn Painter) -> bool {
        self.base.draw(view, painter)
    }

    fn click(&mut self, view: &mut CmdView) -> bool {
        self.base.click_idle(view)
    }

    fn long_press(&mut self, view: &mut CmdView) -> bool {
        self.base.long_press(view)
    }

    fn touch_began(&mut self, view: &mut CmdView) -> bool {
        self.base.step = 1;
        let center = self.base.snap_point(view, true);
        if let Some(circle) = self.circle_mut() {
            circle.center = center;
            circle.radius = 0.0;
        }
        self.base.began(view)
    }

    fn touch_moved(&mut self, view: &mut CmdView) -> bool {
        let pt = self.base.snap_point(view, false);
        if let Some(circle) = self.circle_mut() {
            circle.radius = circle.center.distance(pt);
        }
        self.base.moved(view)
    }

    fn touch_ended(&mut self, view: &mut CmdView) -> bool {
        let min = view.mm(2.0);
        let big_enough = self.base.shape.as_circle().is_some_and(|(_, r)| r > min);
        finish_drag(&mut self.base, view, big_enough)
    }

    fn last_snapped(&self) -> Option<(Point, Point)> {
        self.base.last_snapped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{drag, mm_view, press, release};

    fn gesture(cmd: &mut dyn Command, view: &mut CmdView, from: Point, to: Point) {
        press(view, from);
        cmd.touch_began(view);
        drag(view, to);
        cmd.touch_moved(view);
        release(view, to);
        cmd.touch_moved(view);
        cmd.touch_ended(view);
    }

    #[test]
    fn test_rect_from_two_corners() {
        let mut view = mm_view();
        let mut cmd = DrawRect::new();
        cmd.initialize_with_selection(&mut view, &[], None);
        gesture(&mut cmd, &mut view, Point::new(-10.0, -5.0), Point::new(20.0, 15.0));

        let bounds = view.doc.find_shape(1).map(Shape::bounds).unwrap();
        assert!((bounds.width() - 30.0).abs() < 1e-9);
        assert!((bounds.height() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_rect_is_rejected() {
        let mut view = mm_view();
        let mut cmd = DrawRect::new();
        cmd.initialize_with_selection(&mut view, &[], None);
        gesture(&mut cmd, &mut view, Point::ZERO, Point::new(30.0, 1.0));
        assert!(view.doc.is_empty());
    }

    #[test]
    fn test_circle_from_center_to_rim() {
        let mut view = mm_view();
        let mut cmd = DrawCircle::new();
        cmd.initialize_with_selection(&mut view, &[], None);
        gesture(&mut cmd, &mut view, Point::new(5.0, 5.0), Point::new(5.0, 17.0));

        let (center, radius) = view.doc.find_shape(1).and_then(Shape::as_circle).unwrap();
        assert!(center.distance(Point::new(5.0, 5.0)) < 1e-9);
        assert!((radius - 12.0).abs() < 1e-9);
    }
}
