//! Observer fan-out for plugins that extend the commands.
//!
//! A [`CmdObserver`] can veto document edits, contribute context actions,
//! provide commands or shapes, and watch lifecycle notifications. Every hook
//! has a neutral default so observers only implement what they need.

use crate::actions::ContextAction;
use crate::command::Command;
use crate::motion::Motion;
use crate::shapes::{Shape, ShapeId, ShapeKind};
use std::cell::RefCell;
use std::rc::Rc;

/// Command extension hooks. All methods are optional.
#[allow(unused_variables)]
pub trait CmdObserver {
    // Notifications

    fn on_enter_select_command(&mut self, motion: &Motion) {}

    fn on_unload_commands(&mut self) {}

    fn on_selection_changed(&mut self, motion: &Motion) {}

    fn on_select_touch_ended(&mut self, motion: &Motion, ids: &[ShapeId]) {}

    fn on_shape_added(&mut self, motion: &Motion, shape: &Shape) {}

    fn on_shape_deleted(&mut self, motion: &Motion, shape: &Shape) {}

    fn on_shape_changed(&mut self, motion: &Motion, shape: &Shape) {}

    fn on_post_gesture(&mut self, motion: &Motion) {}

    fn on_point_snapped(&mut self, motion: &Motion, shape: Option<&Shape>) {}

    // Vetoes: every observer must agree.

    fn on_shape_will_add(&mut self, motion: &Motion, shape: &Shape) -> bool {
        true
    }

    fn on_shape_will_delete(&mut self, motion: &Motion, shape: &Shape) -> bool {
        true
    }

    fn on_shape_can_rotate(&mut self, motion: &Motion, shape: &Shape) -> bool {
        true
    }

    fn on_shape_can_transform(&mut self, motion: &Motion, shape: &Shape) -> bool {
        true
    }

    fn on_shape_can_unlock(&mut self, motion: &Motion, shape: &Shape) -> bool {
        true
    }

    fn on_shape_can_ungroup(&mut self, motion: &Motion, shape: &Shape) -> bool {
        true
    }

    fn on_shape_can_move_handle(&mut self, motion: &Motion, shape: &Shape, handle: usize) -> bool {
        true
    }

    fn on_shape_will_change(&mut self, motion: &Motion, shape: &Shape, old: &Shape) -> bool {
        true
    }

    /// Return false to take over the gesture that is about to begin.
    fn on_pre_gesture(&mut self, motion: &Motion) -> bool {
        true
    }

    // First non-null wins.

    fn create_shape(&mut self, motion: &Motion, kind: ShapeKind) -> Option<Shape> {
        None
    }

    fn create_command(&mut self, motion: &Motion, name: &str) -> Option<Box<dyn Command>> {
        None
    }

    // Any observer may claim these.

    fn do_action(&mut self, motion: &Motion, action: ContextAction) -> bool {
        false
    }

    fn select_actions_need_hidden(&mut self, motion: &Motion) -> bool {
        false
    }

    // Additive.

    fn on_gather_snap_ignored_ids(&mut self, motion: &Motion, ids: &mut Vec<ShapeId>) {}

    fn add_shape_actions(&mut self, motion: &Motion, actions: &mut Vec<ContextAction>, shape: &Shape) {}
}

/// Shared handle to a registered observer. Hosts keep a clone to read the
/// observer's state back.
pub type ObserverRef = Rc<RefCell<dyn CmdObserver>>;

/// Registry of observers, optionally named.
#[derive(Default)]
pub struct CmdSubject {
    observers: Vec<(ObserverRef, Option<String>)>,
}

impl std::fmt::Debug for CmdSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmdSubject")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl CmdSubject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. A named observer replaces one registered under
    /// the same name; registering the same handle twice moves it to the end.
    pub fn register_observer(&mut self, observer: ObserverRef, name: Option<&str>) {
        self.observers.retain(|(o, n)| {
            !Rc::ptr_eq(o, &observer) && (name.is_none() || n.as_deref() != name)
        });
        self.observers.push((observer, name.map(str::to_string)));
    }

    /// Remove the observer registered under `name`.
    pub fn unregister_observer(&mut self, name: &str) -> Option<ObserverRef> {
        let index = self.observers.iter().position(|(_, n)| n.as_deref() == Some(name))?;
        Some(self.observers.remove(index).0)
    }

    pub fn find_observer(&self, name: &str) -> Option<ObserverRef> {
        self.observers
            .iter()
            .find(|(_, n)| n.as_deref() == Some(name))
            .map(|(o, _)| o.clone())
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    fn each(&self, mut f: impl FnMut(&mut dyn CmdObserver)) {
        for (observer, _) in &self.observers {
            f(&mut *observer.borrow_mut());
        }
    }

    fn all(&self, mut f: impl FnMut(&mut dyn CmdObserver) -> bool) -> bool {
        self.observers.iter().all(|(o, _)| f(&mut *o.borrow_mut()))
    }

    fn any(&self, mut f: impl FnMut(&mut dyn CmdObserver) -> bool) -> bool {
        self.observers.iter().any(|(o, _)| f(&mut *o.borrow_mut()))
    }

    fn first<T>(&self, mut f: impl FnMut(&mut dyn CmdObserver) -> Option<T>) -> Option<T> {
        self.observers.iter().find_map(|(o, _)| f(&mut *o.borrow_mut()))
    }

    pub fn on_enter_select_command(&self, motion: &Motion) {
        self.each(|o| o.on_enter_select_command(motion));
    }

    /// Detach every observer, then notify the detached snapshot.
    pub fn on_unload_commands(&mut self) {
        let snapshot = std::mem::take(&mut self.observers);
        for (observer, _) in &snapshot {
            observer.borrow_mut().on_unload_commands();
        }
    }

    pub fn on_selection_changed(&self, motion: &Motion) {
        self.each(|o| o.on_selection_changed(motion));
    }

    pub fn on_select_touch_ended(&self, motion: &Motion, ids: &[ShapeId]) {
        self.each(|o| o.on_select_touch_ended(motion, ids));
    }

    pub fn on_shape_added(&self, motion: &Motion, shape: &Shape) {
        self.each(|o| o.on_shape_added(motion, shape));
    }

    pub fn on_shape_deleted(&self, motion: &Motion, shape: &Shape) {
        self.each(|o| o.on_shape_deleted(motion, shape));
    }

    pub fn on_shape_changed(&self, motion: &Motion, shape: &Shape) {
        self.each(|o| o.on_shape_changed(motion, shape));
    }

    pub fn on_post_gesture(&self, motion: &Motion) {
        self.each(|o| o.on_post_gesture(motion));
    }

    pub fn on_point_snapped(&self, motion: &Motion, shape: Option<&Shape>) {
        self.each(|o| o.on_point_snapped(motion, shape));
    }

    pub fn on_shape_will_add(&self, motion: &Motion, shape: &Shape) -> bool {
        self.all(|o| o.on_shape_will_add(motion, shape))
    }

    pub fn on_shape_will_delete(&self, motion: &Motion, shape: &Shape) -> bool {
        self.all(|o| o.on_shape_will_delete(motion, shape))
    }

    pub fn on_shape_can_rotate(&self, motion: &Motion, shape: &Shape) -> bool {
        self.all(|o| o.on_shape_can_rotate(motion, shape))
    }

    pub fn on_shape_can_transform(&self, motion: &Motion, shape: &Shape) -> bool {
        self.all(|o| o.on_shape_can_transform(motion, shape))
    }

    pub fn on_shape_can_unlock(&self, motion: &Motion, shape: &Shape) -> bool {
        self.all(|o| o.on_shape_can_unlock(motion, shape))
    }

    pub fn on_shape_can_ungroup(&self, motion: &Motion, shape: &Shape) -> bool {
        self.all(|o| o.on_shape_can_ungroup(motion, shape))
    }

    pub fn on_shape_can_move_handle(&self, motion: &Motion, shape: &Shape, handle: usize) -> bool {
        self.all(|o| o.on_shape_can_move_handle(motion, shape, handle))
    }

    pub fn on_shape_will_change(&self, motion: &Motion, shape: &Shape, old: &Shape) -> bool {
        self.all(|o| o.on_shape_will_change(motion, shape, old))
    }

    pub fn on_pre_gesture(&self, motion: &Motion) -> bool {
        self.all(|o| o.on_pre_gesture(motion))
    }

    pub fn create_shape(&self, motion: &Motion, kind: ShapeKind) -> Option<Shape> {
        self.first(|o| o.create_shape(motion, kind))
    }

    pub fn create_command(&self, motion: &Motion, name: &str) -> Option<Box<dyn Command>> {
        self.first(|o| o.create_command(motion, name))
    }

    pub fn do_action(&self, motion: &Motion, action: ContextAction) -> bool {
        self.any(|o| o.do_action(motion, action))
    }

    pub fn select_actions_need_hidden(&self, motion: &Motion) -> bool {
        self.any(|o| o.select_actions_need_hidden(motion))
    }

    pub fn on_gather_snap_ignored_ids(&self, motion: &Motion, ids: &mut Vec<ShapeId>) {
        self.each(|o| o.on_gather_snap_ignored_ids(motion, ids));
    }

    pub fn add_shape_actions(&self, motion: &Motion, actions: &mut Vec<ContextAction>, shape: &Shape) {
        self.each(|o| o.add_shape_actions(motion, actions, shape));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Line;
    use kurbo::Point;

    #[derive(Default)]
    struct Recorder {
        added: usize,
        unloaded: usize,
        allow_add: bool,
    }

    impl CmdObserver for Recorder {
        fn on_shape_added(&mut self, _motion: &Motion, _shape: &Shape) {
            self.added += 1;
        }

        fn on_unload_commands(&mut self) {
            self.unloaded += 1;
        }

        fn on_shape_will_add(&mut self, _motion: &Motion, _shape: &Shape) -> bool {
            self.allow_add
        }
    }

    fn line() -> Shape {
        Shape::Line(Line::new(Point::ZERO, Point::new(1.0, 0.0)))
    }

    #[test]
    fn test_all_must_agree() {
        let mut subject = CmdSubject::new();
        let motion = Motion::new();
        assert!(subject.on_shape_will_add(&motion, &line()));

        let yes = Rc::new(RefCell::new(Recorder { allow_add: true, ..Default::default() }));
        let no = Rc::new(RefCell::new(Recorder::default()));
        subject.register_observer(yes.clone(), Some("yes"));
        assert!(subject.on_shape_will_add(&motion, &line()));
        subject.register_observer(no.clone(), None);
        assert!(!subject.on_shape_will_add(&motion, &line()));

        subject.on_shape_added(&motion, &line());
        assert_eq!(yes.borrow().added, 1);
        assert_eq!(no.borrow().added, 1);
    }

    #[test]
    fn test_named_observer_is_replaced() {
        let mut subject = CmdSubject::new();
        let first = Rc::new(RefCell::new(Recorder::default()));
        let second = Rc::new(RefCell::new(Recorder::default()));
        subject.register_observer(first, Some("plugin"));
        subject.register_observer(second.clone(), Some("plugin"));
        assert_eq!(subject.len(), 1);

        let found = subject.find_observer("plugin").unwrap();
        let second_dyn: ObserverRef = second;
        assert!(Rc::ptr_eq(&found, &second_dyn));
        assert!(subject.unregister_observer("plugin").is_some());
        assert!(subject.is_empty());
    }

    #[test]
    fn test_unload_notifies_snapshot_and_clears() {
        let mut subject = CmdSubject::new();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        subject.register_observer(recorder.clone(), None);
        subject.on_unload_commands();
        assert!(subject.is_empty());
        assert_eq!(recorder.borrow().unloaded, 1);
    }
}
