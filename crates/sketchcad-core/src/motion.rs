//! Gesture motion record shared by the manager and commands.

use crate::geom;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Gesture kinds reported by the platform layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GestureType {
    /// One-finger drag.
    #[default]
    Pan,
    Tap,
    DoubleTap,
    /// Long press.
    Press,
    TwoFingersMove,
}

/// Gesture phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum GestureState {
    /// Not yet recognized; the command may veto it.
    #[default]
    Possible,
    Began,
    Moved,
    Ended,
    Cancel,
}

/// Pointer positions and gesture phase for the event being processed.
///
/// Rebuilt from every platform event; `d2m` caches the millimetre to model
/// factor of the view at that time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Motion {
    pub gesture_type: GestureType,
    pub gesture_state: GestureState,
    /// Dragging after a long press, until that press gesture ends.
    pub press_drag: bool,
    /// Between a one-finger and a two-finger gesture.
    pub switch_gesture: bool,
    /// Pointer velocity in display pixels per second.
    pub velocity: Vec2,
    /// Press position in display pixels.
    pub start_pt: Point,
    pub start_pt_m: Point,
    /// Previous position of the current drag, display pixels.
    pub last_pt: Point,
    pub last_pt_m: Point,
    /// Current position, display pixels.
    pub point: Point,
    pub point_m: Point,
    /// Second finger press position, display pixels.
    pub start_pt2: Point,
    pub start_pt2_m: Point,
    /// Second finger current position, display pixels.
    pub point2: Point,
    pub point2_m: Point,
    /// Model units per display millimetre.
    pub d2m: f64,
}

impl Motion {
    pub fn new() -> Self {
        Self {
            d2m: 1.0,
            ..Self::default()
        }
    }

    /// Whether a finger is down and moving.
    pub fn dragging(&self) -> bool {
        matches!(self.gesture_state, GestureState::Began | GestureState::Moved)
    }

    pub fn display_mm_to_model(&self, mm: f64) -> f64 {
        self.d2m * mm
    }

    /// Square box `mm` display millimetres wide around the current point.
    pub fn display_mm_to_model_box(&self, mm: f64) -> Rect {
        geom::box_around(self.point_m, self.display_mm_to_model(mm) / 2.0)
    }

    /// Two-finger start center in model units.
    pub fn start_center_m(&self) -> Point {
        self.start_pt_m.midpoint(self.start_pt2_m)
    }

    /// Two-finger current center in model units.
    pub fn center_m(&self) -> Point {
        self.point_m.midpoint(self.point2_m)
    }

    pub fn start_distance_m(&self) -> f64 {
        self.start_pt_m.distance(self.start_pt2_m)
    }

    pub fn distance_m(&self) -> f64 {
        self.point_m.distance(self.point2_m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dragging_phases() {
        let mut motion = Motion::new();
        assert!(!motion.dragging());
        motion.gesture_state = GestureState::Moved;
        assert!(motion.dragging());
        motion.gesture_state = GestureState::Ended;
        assert!(!motion.dragging());
    }

    #[test]
    fn test_two_finger_helpers() {
        let mut motion = Motion::new();
        motion.start_pt_m = Point::new(0.0, 0.0);
        motion.start_pt2_m = Point::new(4.0, 0.0);
        motion.point_m = Point::new(0.0, 0.0);
        motion.point2_m = Point::new(0.0, 8.0);
        assert_eq!(motion.start_center_m(), Point::new(2.0, 0.0));
        assert_eq!(motion.center_m(), Point::new(0.0, 4.0));
        assert!((motion.distance_m() / motion.start_distance_m() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_mm_box() {
        let mut motion = Motion::new();
        motion.d2m = 2.0;
        motion.point_m = Point::new(10.0, 10.0);
        assert_eq!(motion.display_mm_to_model_box(2.0), Rect::new(8.0, 8.0, 12.0, 12.0));
    }
}
