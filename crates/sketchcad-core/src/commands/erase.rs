//! Eraser: tap a shape or drag a box to delete shapes.

use crate::actions::SelState;
use crate::command::{CmdView, Command};
use crate::render::{HintPen, Painter};
use crate::shapes::{Shape, ShapeId};
use kurbo::Rect;
use peniko::Color;

#[derive(Debug, Clone, Default)]
pub struct EraseCommand {
    boxsel: bool,
    del_ids: Vec<ShapeId>,
}

impl EraseCommand {
    pub fn new() -> Self {
        Self::default()
    }

    fn drag_rect(view: &CmdView) -> Rect {
        Rect::from_points(view.motion.start_pt_m, view.motion.point_m)
    }

    fn is_erasable(shape: &Shape) -> bool {
        shape.is_visible() && !shape.is_locked()
    }

    /// Remove `ids` once the observers accept the first of them.
    fn delete_shapes(view: &mut CmdView, ids: &[ShapeId]) -> usize {
        let allowed = ids
            .first()
            .and_then(|&id| view.doc.find_shape(id))
            .is_some_and(|shape| view.shape_will_delete(shape));
        if !allowed {
            return 0;
        }
        let count = ids.iter().filter(|&&id| view.remove_shape(id)).count();
        if count > 0 {
            view.regen();
        }
        count
    }
}

impl Command for EraseCommand {
    fn name(&self) -> &str {
        "erase"
    }

    fn cancel(&mut self, view: &mut CmdView) -> bool {
        self.boxsel = false;
        let mut changed = false;
        for _ in 0..3 {
            changed |= self.back_step(view);
        }
        changed
    }

    fn back_step(&mut self, view: &mut CmdView) -> bool {
        if self.del_ids.pop().is_some() {
            view.redraw();
            return true;
        }
        if self.boxsel {
            self.boxsel = false;
            view.redraw();
            return true;
        }
        false
    }

    fn draw(&mut self, view: &mut CmdView, painter: &mut dyn Painter) -> bool {
        if self.boxsel {
            let pen = HintPen::new(Color::from_rgba8(0, 0, 255, 80), 0.0)
                .dashed()
                .filled(Color::from_rgba8(0, 0, 255, 24));
            painter.draw_rect(Self::drag_rect(view), &pen);
        }
        let grey = HintPen::new(Color::from_rgba8(64, 64, 64, 128), view.mm(0.5));
        for shape in self.del_ids.iter().filter_map(|&id| view.doc.find_shape(id)) {
            painter.draw_path(&shape.to_path(), &grey);
        }
        self.boxsel || !self.del_ids.is_empty()
    }

    fn click(&mut self, view: &mut CmdView) -> bool {
        let limits = view.motion.display_mm_to_model_box(6.0);
        let hit = view
            .doc
            .hit_test(limits, limits.width() / 2.0)
            .map(|(id, _)| id)
            .filter(|&id| view.doc.find_shape(id).is_some_and(Self::is_erasable));

        if let Some(id) = hit {
            Self::delete_shapes(view, &[id]);
        }
        true
    }

    fn long_press(&mut self, view: &mut CmdView) -> bool {
        view.show_in_select(SelState::None, None, Rect::ZERO)
    }

    fn touch_began(&mut self, view: &mut CmdView) -> bool {
        self.boxsel = true;
        self.del_ids.clear();
        view.redraw();
        true
    }

    fn touch_moved(&mut self, view: &mut CmdView) -> bool {
        let rect = Self::drag_rect(view);
        self.del_ids = view
            .doc
            .iter()
            .filter(|shape| Self::is_erasable(shape) && shape.hit_test_box(rect))
            .map(Shape::id)
            .collect();
        view.redraw();
        true
    }

    fn touch_ended(&mut self, view: &mut CmdView) -> bool {
        let ids = std::mem::take(&mut self.del_ids);
        let count = Self::delete_shapes(view, &ids);
        if count > 0 {
            log::debug!("Erased {count} shapes");
            view.message(format!("@shape_n_deleted {count}"));
        }
        self.boxsel = false;
        view.redraw();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{drag, mm_view, press, release};
    use crate::events::ViewEvent;
    use crate::shapes::{Circle, Line, ShapeFlags};
    use kurbo::Point;

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> Shape {
        Shape::Line(Line::new(Point::new(x0, y0), Point::new(x1, y1)))
    }

    #[test]
    fn test_tap_erases_shape_under_finger() {
        let mut view = mm_view();
        let id = view.doc.add_shape(line(0.0, 0.0, 20.0, 0.0));
        let mut cmd = EraseCommand::new();

        press(&mut view, Point::new(40.0, 40.0));
        cmd.click(&mut view);
        assert!(view.doc.contains(id));

        press(&mut view, Point::new(10.0, 1.0));
        cmd.click(&mut view);
        assert!(view.doc.is_empty());
        assert!(view.events.iter().any(|e| *e == ViewEvent::ShapeDeleted(id)));
    }

    #[test]
    fn test_box_erase_skips_locked_shapes() {
        let mut view = mm_view();
        let a = view.doc.add_shape(line(0.0, 0.0, 10.0, 0.0));
        let b = view.doc.add_shape(Shape::Circle(Circle::new(Point::new(5.0, 5.0), 2.0)));
        let mut locked = line(0.0, 8.0, 10.0, 8.0);
        locked.set_flag(ShapeFlags::LOCKED, true);
        let c = view.doc.add_shape(locked);
        let far = view.doc.add_shape(line(50.0, 50.0, 60.0, 50.0));
        let mut cmd = EraseCommand::new();

        press(&mut view, Point::new(-5.0, -5.0));
        cmd.touch_began(&mut view);
        drag(&mut view, Point::new(15.0, 15.0));
        cmd.touch_moved(&mut view);
        assert_eq!(cmd.del_ids, vec![a, b]);

        release(&mut view, Point::new(15.0, 15.0));
        cmd.touch_ended(&mut view);
        assert_eq!(view.doc.ids(), &[c, far]);
        assert!(view.events.iter().any(|e| *e == ViewEvent::Message("@shape_n_deleted 2".into())));
    }

    #[test]
    fn test_back_step_shrinks_pending_set() {
        let mut view = mm_view();
        view.doc.add_shape(line(0.0, 0.0, 10.0, 0.0));
        view.doc.add_shape(line(0.0, 5.0, 10.0, 5.0));
        let mut cmd = EraseCommand::new();

        press(&mut view, Point::new(-1.0, -1.0));
        cmd.touch_began(&mut view);
        drag(&mut view, Point::new(11.0, 6.0));
        cmd.touch_moved(&mut view);

        assert!(cmd.back_step(&mut view));
        assert_eq!(cmd.del_ids.len(), 1);
        assert!(cmd.cancel(&mut view));
        assert!(cmd.del_ids.is_empty());
        assert!(!cmd.boxsel);
        assert_eq!(view.doc.len(), 2);
    }
}
