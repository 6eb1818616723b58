//! Built-in commands.

mod arc;
mod dot;
mod draw;
mod erase;
mod grid;
mod line;
mod lines;
mod rect;
mod select;

pub use arc::{DrawArc3P, DrawArcCse};
pub use dot::DrawDot;
pub use draw::{DrawBase, DrawParams, Replay, StepDraw};
pub use erase::EraseCommand;
pub use grid::DrawGrid;
pub use line::DrawLine;
pub use lines::DrawLines;
pub use rect::{DrawCircle, DrawRect};
pub use select::SelectCommand;

use crate::command::Command;

/// Creates a fresh command instance.
pub type CommandFactory = fn() -> Box<dyn Command>;

/// Name and factory of every built-in command, in switching order.
pub fn builtin_commands() -> Vec<(&'static str, CommandFactory)> {
    let commands: [(&'static str, CommandFactory); 11] = [
        ("select", || Box::new(SelectCommand::new())),
        ("erase", || Box::new(EraseCommand::new())),
        ("line", || Box::new(DrawLine::new())),
        ("lines", || Box::new(DrawLines::new())),
        ("dot", || Box::new(DrawDot::new())),
        ("rect", || Box::new(DrawRect::new())),
        ("grid", || Box::new(DrawGrid::new())),
        ("circle", || Box::new(DrawCircle::new())),
        ("arc3p", || Box::new(DrawArc3P::new())),
        ("arc_cse", || Box::new(DrawArcCse::new())),
        ("sector", || Box::new(DrawArcCse::sector())),
    ];
    commands.to_vec()
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_names_match_commands() {
        let builtins = builtin_commands();
        let names: HashSet<_> = builtins.iter().map(|(name, _)| *name).collect();
        assert_eq!(names.len(), builtins.len());
        for (name, factory) in builtins {
            assert_eq!(factory().name(), name);
        }
    }

    #[test]
    fn test_only_shape_commands_draw() {
        let drawing: Vec<_> = builtin_commands()
            .into_iter()
            .filter(|(_, factory)| factory().is_drawing_command())
            .map(|(name, _)| name)
            .collect();
        assert_eq!(drawing, vec!["line", "lines", "dot", "rect", "grid", "circle", "arc3p", "arc_cse", "sector"]);
    }
}
