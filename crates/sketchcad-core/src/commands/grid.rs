//! Grid command: drag the frame, then drag the cell size.

use super::draw::DrawBase;
use crate::command::{CmdView, Command};
use crate::render::{HandleMark, Painter};
use crate::shapes::{Grid, Shape, ShapeId, ShapeKind};
use kurbo::{Point, Rect, Vec2};
use serde_json::Value;

/// Handle of the grid that sets the cell size.
const CELL_HANDLE: usize = 8;

/// Snap grid drawn in two drags.
///
/// Step 1 drags the frame. At step 2 the cell handle waits for a second drag
/// (step 3 while it moves). A valid grid is committed and the command hands
/// over to `select`.
#[derive(Debug, Clone)]
pub struct DrawGrid {
    base: DrawBase,
    start: Point,
}

impl Default for DrawGrid {
    fn default() -> Self {
        Self {
            base: DrawBase::new(ShapeKind::Grid, || Shape::Grid(Grid::new(Rect::ZERO, Vec2::ZERO))),
            start: Point::ZERO,
        }
    }
}

impl DrawGrid {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_frame(&mut self, a: Point, b: Point) {
        if let Shape::Grid(grid) = &mut self.base.shape {
            grid.rect = Rect::from_points(a, b);
        }
    }

    fn place_cell(&mut self, view: &mut CmdView) {
        let org = view.motion.point_m;
        let pt = self.base.snap_point_at(view, org, false, CELL_HANDLE);
        self.base.shape.set_handle_point(CELL_HANDLE, pt, 0.0);
    }

    fn finish_frame(&mut self, view: &mut CmdView) -> bool {
        let min = view.mm(2.0);
        let bounds = self.base.shape.bounds();
        if bounds.width() > min && bounds.height() > min {
            self.base.step = 2;
            view.clear_snap();
            view.redraw();
            return true;
        }
        self.base.step = 0;
        self.base.clear();
        if view.motion.point.distance(view.motion.start_pt) < 2.0 {
            return self.base.click_idle(view);
        }
        view.message("@shape_too_small");
        self.base.ended(view)
    }

    fn finish_cell(&mut self, view: &mut CmdView) -> bool {
        let valid = self.base.shape.as_grid().is_some_and(|grid| grid.is_valid(view.mm(1.0)));
        if valid {
            self.base.add_shape(view);
            self.base.step = 0;
            view.request_command("select", None);
        } else {
            let corner = self.base.shape.handle_point(3);
            self.base.shape.set_handle_point(CELL_HANDLE, corner, 0.0);
            self.base.step = 2;
            view.message("@invalid_gridcell");
        }
        self.base.ended(view)
    }
}

impl Command for DrawGrid {
    fn name(&self) -> &str {
        "grid"
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

    /// Back from the cell drag drops the frame too.
    fn back_step(&mut self, view: &mut CmdView) -> bool {
        self.base.cancel(view)
    }

    fn draw(&mut self, view: &mut CmdView, painter: &mut dyn Painter) -> bool {
        if self.base.step == 2 {
            painter.draw_handle(self.base.shape.handle_point(CELL_HANDLE), HandleMark::Vertex);
        }
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
        if self.base.step == 0 {
            self.base.step = 1;
            self.start = self.base.snap_point(view, true);
            self.set_frame(self.start, self.start);
        } else {
            self.base.step = 3;
        }
        self.base.began(view)
    }

    fn touch_moved(&mut self, view: &mut CmdView) -> bool {
        if self.base.step == 1 {
            let pt = self.base.snap_point(view, false);
            self.set_frame(self.start, pt);
        } else {
            self.place_cell(view);
        }
        self.base.moved(view)
    }

    fn touch_ended(&mut self, view: &mut CmdView) -> bool {
        if self.base.step == 1 {
            let pt = self.base.snap_point(view, false);
            self.set_frame(self.start, pt);
            return self.finish_frame(view);
        }
        self.place_cell(view);
        self.finish_cell(view)
    }

    fn last_snapped(&self) -> Option<(Point, Point)> {
        self.base.last_snapped()
    }
}
