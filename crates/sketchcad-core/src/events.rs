//! Notifications produced for the host.

use crate::actions::{ContextAction, SelState};
use crate::shapes::ShapeId;
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Something the host should react to (repaint, refresh a toolbar, show a menu).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViewEvent {
    ShapeAdded(ShapeId),
    ShapeChanged(ShapeId),
    ShapeDeleted(ShapeId),
    SelectionChanged,
    CommandChanged(String),
    /// Repaint the dynamic layer only.
    Redraw,
    /// Rebuild the display of committed shapes.
    Regen,
    /// Show context actions near `rect` (display pixels).
    ContextActions {
        sel_state: SelState,
        actions: Vec<ContextAction>,
        rect: Rect,
    },
    HideContextActions,
    /// Localizable message key, for example `@shape_n_deleted`.
    Message(String),
}

/// FIFO of pending view events.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<ViewEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: ViewEvent) {
        self.events.push_back(event);
    }

    /// Take every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<ViewEvent> {
        self.events.drain(..).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViewEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
