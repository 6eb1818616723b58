//! Command interface and the view context every command works against.
//!
//! A command never owns the document. Each handler receives a [`CmdView`]
//! holding the document, the current [`Motion`], the snap engine, the observer
//! subject and the outgoing event queue. Edits go through the view so observers
//! get their veto and the host gets its notifications.

use crate::actions::{ContextAction, SelState};
use crate::document::ShapeDocument;
use crate::events::{EventQueue, ViewEvent};
use crate::motion::Motion;
use crate::options::Options;
use crate::render::Painter;
use crate::shapes::{Shape, ShapeId, ShapeKind};
use crate::snap::{SnapContext, SnapEngine, SnapOptions, SnapRequest};
use crate::subject::CmdSubject;
use crate::view::{ViewConfig, ViewTransform};
use kurbo::{Affine, Point, Rect};
use serde_json::Value;

/// A command switch requested from inside a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    pub name: String,
    pub params: Option<Value>,
}

/// Shared state handed to every command handler.
#[derive(Debug)]
pub struct CmdView {
    pub motion: Motion,
    pub doc: ShapeDocument,
    pub xform: ViewTransform,
    pub options: Options,
    pub snap: SnapEngine,
    pub subject: CmdSubject,
    pub events: EventQueue,
    /// Id of the newest shape added by a drawing command.
    pub new_shape_id: ShapeId,
    /// Points closer than this are equal. Zero until the first command switch.
    pub equal_tol: f64,
    request: Option<CommandRequest>,
}

impl CmdView {
    pub fn new(config: ViewConfig) -> Self {
        Self::with_document(config, ShapeDocument::new())
    }

    pub fn with_document(config: ViewConfig, doc: ShapeDocument) -> Self {
        let xform = ViewTransform::new(config);
        let mut motion = Motion::new();
        motion.d2m = xform.display_mm_to_model(1.0);
        Self {
            motion,
            doc,
            xform,
            options: Options::new(),
            snap: SnapEngine::new(),
            subject: CmdSubject::new(),
            events: EventQueue::new(),
            new_shape_id: 0,
            equal_tol: 0.0,
            request: None,
        }
    }

    /// Display millimetres to model units.
    pub fn mm(&self, mm: f64) -> f64 {
        self.xform.display_mm_to_model(mm)
    }

    pub fn use_finger(&self) -> bool {
        self.xform.use_finger()
    }

    // Snapping

    /// Snap `pt` against the document.
    ///
    /// Ignored ids default to the positioned shape; observers may add more.
    pub fn snap_point(&mut self, pt: Point, req: SnapRequest<'_>) -> Point {
        let mut ignore_ids = if req.ignore_ids.is_empty() {
            vec![req.shape.map_or(0, Shape::id)]
        } else {
            req.ignore_ids.to_vec()
        };
        self.subject.on_gather_snap_ignored_ids(&self.motion, &mut ignore_ids);

        let ctx = SnapContext {
            doc: &self.doc,
            options: &self.options,
            xform: &self.xform,
        };
        self.snap.snap_point(
            &ctx,
            pt,
            SnapRequest {
                ignore_ids: &ignore_ids,
                ..req
            },
        )
    }

    pub fn clear_snap(&mut self) -> bool {
        self.snap.clear_snap()
    }

    pub fn draw_snap(&self, painter: &mut dyn Painter) -> bool {
        self.snap.draw_snap(&self.doc, &self.xform, &self.motion, painter)
    }

    pub fn snap_options(&self) -> SnapOptions {
        SnapOptions::from_options(&self.options)
    }

    pub fn set_snap_options(&mut self, bits: SnapOptions) {
        bits.apply_to(&mut self.options);
    }

    // Observer queries

    /// Working shape of `kind`, provided by an observer or by `fallback`.
    pub fn create_shape(&self, kind: ShapeKind, fallback: impl FnOnce() -> Shape) -> Shape {
        self.subject
            .create_shape(&self.motion, kind)
            .filter(|shape| shape.kind() == kind)
            .unwrap_or_else(fallback)
    }

    pub fn shape_will_add(&self, shape: &Shape) -> bool {
        self.subject.on_shape_will_add(&self.motion, shape)
    }

    pub fn shape_will_delete(&self, shape: &Shape) -> bool {
        self.subject.on_shape_will_delete(&self.motion, shape)
    }

    pub fn shape_can_rotate(&self, shape: &Shape) -> bool {
        self.subject.on_shape_can_rotate(&self.motion, shape)
    }

    pub fn shape_can_transform(&self, shape: &Shape) -> bool {
        self.subject.on_shape_can_transform(&self.motion, shape)
    }

    pub fn shape_can_unlock(&self, shape: &Shape) -> bool {
        self.subject.on_shape_can_unlock(&self.motion, shape)
    }

    pub fn shape_can_move_handle(&self, shape: &Shape, handle: usize) -> bool {
        self.subject.on_shape_can_move_handle(&self.motion, shape, handle)
    }

    // Document edits

    /// Add a shape after the observers agree. Returns the new id.
    pub fn add_shape(&mut self, shape: Shape) -> Option<ShapeId> {
        if !self.shape_will_add(&shape) {
            log::debug!("Observer refused to add a {:?}", shape.kind());
            return None;
        }
        let id = self.doc.add_shape(shape);
        if let Some(shape) = self.doc.find_shape(id) {
            self.subject.on_shape_added(&self.motion, shape);
        }
        self.events.push(ViewEvent::ShapeAdded(id));
        Some(id)
    }

    /// Replace the stored shape with the same id. Unchanged or vetoed
    /// replacements return false.
    pub fn update_shape(&mut self, shape: Shape) -> bool {
        let id = shape.id();
        let Some(old) = self.doc.find_shape(id) else {
            return false;
        };
        if *old == shape || !self.subject.on_shape_will_change(&self.motion, &shape, old) {
            return false;
        }
        if !self.doc.update_shape(shape) {
            log::warn!("Shape {id} changed kind, edit dropped");
            return false;
        }
        if let Some(shape) = self.doc.find_shape(id) {
            self.subject.on_shape_changed(&self.motion, shape);
        }
        self.events.push(ViewEvent::ShapeChanged(id));
        true
    }

    /// Remove a shape without asking observers. Callers check
    /// [`CmdView::shape_will_delete`] first.
    pub fn remove_shape(&mut self, id: ShapeId) -> bool {
        let Some(shape) = self.doc.remove_shape(id) else {
            return false;
        };
        self.subject.on_shape_deleted(&self.motion, &shape);
        self.events.push(ViewEvent::ShapeDeleted(id));
        true
    }

    // Notifications

    pub fn redraw(&mut self) {
        self.events.push(ViewEvent::Redraw);
    }

    pub fn regen(&mut self) {
        self.events.push(ViewEvent::Regen);
    }

    pub fn selection_changed(&mut self) {
        self.subject.on_selection_changed(&self.motion);
        self.events.push(ViewEvent::SelectionChanged);
    }

    pub fn message(&mut self, text: impl Into<String>) {
        self.events.push(ViewEvent::Message(text.into()));
    }

    /// Ask the manager to switch commands once the current handler returns.
    pub fn request_command(&mut self, name: &str, params: Option<Value>) {
        self.request = Some(CommandRequest {
            name: name.to_string(),
            params,
        });
    }

    pub(crate) fn take_request(&mut self) -> Option<CommandRequest> {
        self.request.take()
    }
}

/// An interactive command driven by gestures.
///
/// Handlers return true when they consumed the gesture. Every method except
/// [`Command::name`] has a do-nothing default.
#[allow(unused_variables)]
pub trait Command {
    fn name(&self) -> &str;

    /// Drawing commands get the gesture-end re-snap and the `@draw` alias.
    fn is_drawing_command(&self) -> bool {
        false
    }

    /// Activate with the ids selected before the switch. Returning false makes
    /// the manager fall back to `select`.
    fn initialize_with_selection(&mut self, view: &mut CmdView, selection: &[ShapeId], params: Option<&Value>) -> bool {
        true
    }

    /// Drop all in-progress state.
    fn cancel(&mut self, view: &mut CmdView) -> bool {
        false
    }

    /// Undo one step of in-progress state.
    fn back_step(&mut self, view: &mut CmdView) -> bool {
        false
    }

    /// Draw the dynamic layer.
    fn draw(&mut self, view: &mut CmdView, painter: &mut dyn Painter) -> bool {
        false
    }

    fn click(&mut self, view: &mut CmdView) -> bool {
        false
    }

    fn double_click(&mut self, view: &mut CmdView) -> bool {
        false
    }

    fn long_press(&mut self, view: &mut CmdView) -> bool {
        false
    }

    fn touch_began(&mut self, view: &mut CmdView) -> bool {
        false
    }

    fn touch_moved(&mut self, view: &mut CmdView) -> bool {
        false
    }

    fn touch_ended(&mut self, view: &mut CmdView) -> bool {
        false
    }

    fn two_fingers_move(&mut self, view: &mut CmdView) -> bool {
        false
    }

    /// Last good `(snapped, raw)` pair of the current gesture.
    fn last_snapped(&self) -> Option<(Point, Point)> {
        None
    }

    /// Handle an action the built-in dispatch does not know.
    fn do_context_action(&mut self, view: &mut CmdView, action: ContextAction) -> bool {
        false
    }

    /// The selection capability, for commands that keep a selection.
    fn as_selection(&mut self) -> Option<&mut dyn Selection> {
        None
    }
}

/// Selection operations offered by the select command.
pub trait Selection {
    /// Selected ids still present in the document.
    fn selected_ids(&self, view: &CmdView) -> Vec<ShapeId>;

    fn select_state(&self, view: &CmdView) -> SelState;

    /// Model-space box around the selection, clipped to the window.
    fn bounding_box(&self, view: &CmdView) -> Rect;

    fn select_all(&mut self, view: &mut CmdView) -> bool;

    fn reset_selection(&mut self, view: &mut CmdView);

    fn add_selection(&mut self, view: &mut CmdView, id: ShapeId) -> bool;

    fn delete_selection(&mut self, view: &mut CmdView) -> bool;

    fn clone_selection(&mut self, view: &mut CmdView) -> bool;

    fn is_fixed_length(&self, view: &CmdView) -> bool;

    fn set_fixed_length(&mut self, view: &mut CmdView, fixed: bool) -> bool;

    fn is_locked(&self, view: &CmdView) -> bool;

    fn set_locked(&mut self, view: &mut CmdView, locked: bool) -> bool;

    fn is_edit_mode(&self, view: &CmdView) -> bool;

    fn set_edit_mode(&mut self, view: &mut CmdView, edit: bool) -> bool;

    fn insert_vertex(&mut self, view: &mut CmdView) -> bool;

    fn delete_vertex(&mut self, view: &mut CmdView) -> bool;

    fn switch_closed(&mut self, view: &mut CmdView) -> bool;

    fn overturn(&mut self, view: &mut CmdView) -> bool;

    /// Transform every selected shape that allows it.
    fn apply_transform(&mut self, view: &mut CmdView, affine: Affine) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Circle, Line};
    use crate::snap::SnapType;
    use crate::subject::CmdObserver;
    use kurbo::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Gate {
        refuse_add: bool,
        extra_ignored: Vec<ShapeId>,
        changed: usize,
    }

    impl CmdObserver for Gate {
        fn on_shape_will_add(&mut self, _motion: &Motion, _shape: &Shape) -> bool {
            !self.refuse_add
        }

        fn on_shape_changed(&mut self, _motion: &Motion, _shape: &Shape) {
            self.changed += 1;
        }

        fn on_gather_snap_ignored_ids(&mut self, _motion: &Motion, ids: &mut Vec<ShapeId>) {
            ids.extend_from_slice(&self.extra_ignored);
        }
    }

    fn mm_view() -> CmdView {
        CmdView::new(ViewConfig {
            dpi: 25.4,
            offset: Vec2::new(500.0, 400.0),
            ..ViewConfig::default()
        })
    }

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> Shape {
        Shape::Line(Line::new(Point::new(x0, y0), Point::new(x1, y1)))
    }

    #[test]
    fn test_add_shape_notifies_and_respects_veto() {
        let mut view = mm_view();
        let gate = Rc::new(RefCell::new(Gate::default()));
        view.subject.register_observer(gate.clone(), Some("gate"));

        assert_eq!(view.add_shape(line(0.0, 0.0, 10.0, 0.0)), Some(1));
        assert_eq!(view.events.drain(), vec![ViewEvent::ShapeAdded(1)]);

        gate.borrow_mut().refuse_add = true;
        assert_eq!(view.add_shape(line(0.0, 0.0, 5.0, 5.0)), None);
        assert_eq!(view.doc.len(), 1);
        assert!(view.events.is_empty());
    }

    #[test]
    fn test_update_shape_skips_unchanged() {
        let mut view = mm_view();
        let gate = Rc::new(RefCell::new(Gate::default()));
        view.subject.register_observer(gate.clone(), None);
        let id = view.doc.add_shape(line(0.0, 0.0, 10.0, 0.0));

        let same = view.doc.find_shape(id).cloned().unwrap();
        assert!(!view.update_shape(same.clone()));

        let mut moved = same;
        moved.offset(Vec2::new(1.0, 0.0), None);
        assert!(view.update_shape(moved));
        assert_eq!(gate.borrow().changed, 1);
        assert_eq!(view.events.drain(), vec![ViewEvent::ShapeChanged(id)]);
    }

    #[test]
    fn test_update_shape_rejects_kind_change() {
        let mut view = mm_view();
        let id = view.doc.add_shape(line(0.0, 0.0, 10.0, 0.0));
        let mut circle = Shape::Circle(Circle::new(Point::ZERO, 3.0));
        circle.set_id(id);
        assert!(!view.update_shape(circle));
        assert!(view.doc.find_shape(id).is_some_and(Shape::is_line));
    }

    #[test]
    fn test_remove_shape_emits_event() {
        let mut view = mm_view();
        let id = view.doc.add_shape(line(0.0, 0.0, 10.0, 0.0));
        assert!(view.remove_shape(id));
        assert!(!view.remove_shape(id));
        assert_eq!(view.events.drain(), vec![ViewEvent::ShapeDeleted(id)]);
    }

    #[test]
    fn test_snap_point_uses_observer_ignored_ids() {
        let mut view = mm_view();
        let id = view.doc.add_shape(line(0.0, 0.0, 20.0, 0.0));
        let target = Point::new(0.3, 0.2);

        let snapped = view.snap_point(target, SnapRequest::default());
        assert!(snapped.distance(Point::ZERO) < 1e-9);
        assert_eq!(view.snap.snapped_type(), SnapType::Point);

        let gate = Rc::new(RefCell::new(Gate {
            extra_ignored: vec![id],
            ..Default::default()
        }));
        view.subject.register_observer(gate, None);
        view.snap_point(target, SnapRequest::default());
        assert_eq!(view.snap.snapped_type(), SnapType::None);
    }

    #[test]
    fn test_request_is_taken_once() {
        let mut view = mm_view();
        view.request_command("select", None);
        assert_eq!(view.take_request().map(|r| r.name), Some("select".to_string()));
        assert!(view.take_request().is_none());
    }
}
