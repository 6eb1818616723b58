//! Point marker command.

use super::draw::DrawBase;
use crate::command::{CmdView, Command};
use crate::render::Painter;
use crate::shapes::{Dot, Shape, ShapeId, ShapeKind};
use kurbo::Point;
use serde_json::Value;

/// Places a dot on every tap or at the end of every drag.
#[derive(Debug, Clone)]
pub struct DrawDot {
    base: DrawBase,
}

impl Default for DrawDot {
    fn default() -> Self {
        Self {
            base: DrawBase::new(ShapeKind::Dot, || Shape::Dot(Dot::new(Point::ZERO))),
        }
    }
}

impl DrawDot {
    pub fn new() -> Self {
        Self::default()
    }

    fn place(&mut self, pt: Point) {
        if let Shape::Dot(dot) = &mut self.base.shape {
            dot.point = pt;
        }
    }
}

impl Command for DrawDot {
    fn name(&self) -> &str {
        "dot"
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
        self.touch_began(view) && self.touch_ended(view)
    }

    fn long_press(&mut self, view: &mut CmdView) -> bool {
        self.base.long_press(view)
    }

    fn touch_began(&mut self, view: &mut CmdView) -> bool {
        self.base.step = 1;
        let pt = self.base.snap_point(view, true);
        self.place(pt);
        self.base.began(view)
    }

    fn touch_moved(&mut self, view: &mut CmdView) -> bool {
        let pt = self.base.snap_point(view, false);
        self.place(pt);
        self.base.moved(view)
    }

    fn touch_ended(&mut self, view: &mut CmdView) -> bool {
        self.base.add_shape(view);
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
    use crate::commands::testing::{mm_view, press};

    #[test]
    fn test_every_tap_adds_a_dot() {
        let mut view = mm_view();
        let mut cmd = DrawDot::new();
        cmd.initialize_with_selection(&mut view, &[], None);

        press(&mut view, Point::new(3.0, 4.0));
        assert!(cmd.click(&mut view));
        press(&mut view, Point::new(40.0, 4.0));
        assert!(cmd.click(&mut view));

        assert_eq!(view.doc.len(), 2);
        let Some(Shape::Dot(dot)) = view.doc.find_shape(1) else {
            panic!("expected a dot");
        };
        assert!(dot.point.distance(Point::new(3.0, 4.0)) < 1e-9);
    }
}
