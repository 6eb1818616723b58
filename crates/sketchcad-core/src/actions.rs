//! Context actions shown next to the selection or the drawing point.

use crate::command::CmdView;
use crate::shapes::{Shape, ShapeFlags};
use crate::events::ViewEvent;
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Context action identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextAction {
    SelAll,
    SelReset,
    Draw,
    Cancel,
    Delete,
    Clone,
    FixedLength,
    FreeLength,
    Locked,
    Unlocked,
    EditVertex,
    HideVertex,
    Closed,
    Opened,
    AddVertex,
    DelVertex,
    Group,
    Ungroup,
    Overturn,
    /// Host or plugin defined action, id 100 and above.
    Customized(u32),
}

impl ContextAction {
    /// First id available to customized actions.
    pub const CUSTOMIZED_BASE: u32 = 100;

    pub fn id(self) -> u32 {
        match self {
            ContextAction::SelAll => 1,
            ContextAction::SelReset => 2,
            ContextAction::Draw => 3,
            ContextAction::Cancel => 4,
            ContextAction::Delete => 5,
            ContextAction::Clone => 6,
            ContextAction::FixedLength => 7,
            ContextAction::FreeLength => 8,
            ContextAction::Locked => 9,
            ContextAction::Unlocked => 10,
            ContextAction::EditVertex => 11,
            ContextAction::HideVertex => 12,
            ContextAction::Closed => 13,
            ContextAction::Opened => 14,
            ContextAction::AddVertex => 15,
            ContextAction::DelVertex => 16,
            ContextAction::Group => 17,
            ContextAction::Ungroup => 18,
            ContextAction::Overturn => 19,
            ContextAction::Customized(id) => id,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        Some(match id {
            1 => ContextAction::SelAll,
            2 => ContextAction::SelReset,
            3 => ContextAction::Draw,
            4 => ContextAction::Cancel,
            5 => ContextAction::Delete,
            6 => ContextAction::Clone,
            7 => ContextAction::FixedLength,
            8 => ContextAction::FreeLength,
            9 => ContextAction::Locked,
            10 => ContextAction::Unlocked,
            11 => ContextAction::EditVertex,
            12 => ContextAction::HideVertex,
            13 => ContextAction::Closed,
            14 => ContextAction::Opened,
            15 => ContextAction::AddVertex,
            16 => ContextAction::DelVertex,
            17 => ContextAction::Group,
            18 => ContextAction::Ungroup,
            19 => ContextAction::Overturn,
            id if id >= Self::CUSTOMIZED_BASE => ContextAction::Customized(id),
            _ => return None,
        })
    }
}

/// What the current selection looks like, for choosing context actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum SelState {
    #[default]
    None,
    MultiShapes,
    OneShape,
    /// Vertex editing without an active vertex.
    Vertexes,
    /// Vertex editing with an active vertex.
    Vertex,
    /// Inside a drawing command.
    Draw,
}

fn length_action(shape: &Shape) -> Option<ContextAction> {
    (shape.is_line() && !shape.is_locked()).then(|| {
        if shape.has_flag(ShapeFlags::FIXED_LENGTH) {
            ContextAction::FreeLength
        } else {
            ContextAction::FixedLength
        }
    })
}

/// Built-in actions for a selection state. `shape` is the primary selected shape.
pub fn select_actions(sel_state: SelState, shape: Option<&Shape>) -> Vec<ContextAction> {
    let mut actions = Vec::new();
    let Some(shape) = shape else {
        return actions;
    };
    let locked = shape.is_locked();
    let open_lines = shape.is_base_lines() && !shape.is_closed();

    match sel_state {
        SelState::MultiShapes | SelState::OneShape => {
            if !locked && !shape.has_flag(ShapeFlags::NO_DEL) {
                actions.push(ContextAction::Delete);
            }
            if !shape.has_flag(ShapeFlags::NO_CLONE) {
                actions.push(ContextAction::Clone);
            }
            actions.extend(length_action(shape));
            actions.push(if locked {
                ContextAction::Unlocked
            } else {
                ContextAction::Locked
            });
            if sel_state == SelState::OneShape && !locked {
                actions.push(ContextAction::EditVertex);
                if shape.is_closed()
                    && !shape.has_flag(ShapeFlags::ROTATE_DISABLED)
                    && matches!(shape, Shape::Lines(_) | Shape::Rectangle(_))
                {
                    actions.push(ContextAction::Overturn);
                }
            }
        }
        SelState::Vertexes => {
            if open_lines && !locked && shape.has_flag(ShapeFlags::CAN_ADD_VERTEX) {
                actions.push(ContextAction::AddVertex);
            }
            actions.extend(length_action(shape));
            actions.push(ContextAction::HideVertex);
        }
        SelState::Vertex => {
            if open_lines && !locked && shape.point_count() > 3 {
                actions.push(ContextAction::DelVertex);
            }
            actions.extend(length_action(shape));
            actions.push(ContextAction::HideVertex);
        }
        SelState::None | SelState::Draw => {}
    }
    actions
}

impl CmdView {
    /// Ask the host to show context actions for the selection.
    ///
    /// `selbox` is in model units; an empty box shows the actions at the
    /// current touch point. Returns false when an observer hides the actions.
    pub fn show_in_select(&mut self, sel_state: SelState, shape: Option<&Shape>, selbox: Rect) -> bool {
        if self.subject.select_actions_need_hidden(&self.motion) {
            return false;
        }
        let mut actions = select_actions(sel_state, shape);
        if let Some(shape) = shape.filter(|_| sel_state > SelState::None && sel_state <= SelState::Vertex) {
            self.subject.add_shape_actions(&self.motion, &mut actions, shape);
        }

        let rect = if selbox.width() > 0.0 || selbox.height() > 0.0 {
            self.events.push(ViewEvent::Redraw);
            self.xform.model_to_display_rect(selbox)
        } else {
            let pt = self.xform.model_to_display(self.motion.point_m);
            Rect::from_points(pt, pt)
        };
        self.events.push(ViewEvent::ContextActions {
            sel_state,
            actions,
            rect,
        });
        true
    }

    /// Show the drawing context actions at the current touch point.
    pub fn show_in_drawing(&mut self) -> bool {
        self.show_in_select(SelState::Draw, None, Rect::ZERO)
    }

    pub fn hide_context_actions(&mut self) {
        self.events.push(ViewEvent::HideContextActions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Line, Lines, Rectangle};
    use kurbo::Point;

    #[test]
    fn test_action_ids_roundtrip() {
        for id in 1..=19 {
            assert_eq!(ContextAction::from_id(id).map(ContextAction::id), Some(id));
        }
        assert_eq!(ContextAction::from_id(0), None);
        assert_eq!(ContextAction::from_id(50), None);
        assert_eq!(ContextAction::from_id(120), Some(ContextAction::Customized(120)));
    }

    #[test]
    fn test_one_line_actions() {
        let line = Shape::Line(Line::new(Point::ZERO, Point::new(10.0, 0.0)));
        let actions = select_actions(SelState::OneShape, Some(&line));
        assert_eq!(
            actions,
            vec![
                ContextAction::Delete,
                ContextAction::Clone,
                ContextAction::FixedLength,
                ContextAction::Locked,
                ContextAction::EditVertex,
            ]
        );
    }

    #[test]
    fn test_locked_shape_actions() {
        let mut rect = Shape::Rectangle(Rectangle::from_corners(Point::ZERO, Point::new(5.0, 5.0)));
        assert!(select_actions(SelState::OneShape, Some(&rect)).contains(&ContextAction::Overturn));
        rect.set_flag(ShapeFlags::LOCKED, true);
        let actions = select_actions(SelState::MultiShapes, Some(&rect));
        assert_eq!(actions, vec![ContextAction::Clone, ContextAction::Unlocked]);
    }

    #[test]
    fn test_vertex_actions() {
        let mut lines = Lines::new(
            vec![Point::ZERO, Point::new(1.0, 0.0), Point::new(2.0, 1.0), Point::new(3.0, 0.0)],
            false,
        );
        lines.flags.insert(ShapeFlags::CAN_ADD_VERTEX);
        let shape = Shape::Lines(lines);
        assert_eq!(
            select_actions(SelState::Vertexes, Some(&shape)),
            vec![ContextAction::AddVertex, ContextAction::HideVertex]
        );
        assert_eq!(
            select_actions(SelState::Vertex, Some(&shape)),
            vec![ContextAction::DelVertex, ContextAction::HideVertex]
        );
        assert!(select_actions(SelState::Draw, Some(&shape)).is_empty());
    }
}
