//! Command registry and gesture dispatch.
//!
//! The [`CommandManager`] owns the view context and at most one active
//! command. Command instances are created on first use and kept alive across
//! activations. Context actions are routed here too, after the observers had
//! their chance to claim them.

use crate::actions::ContextAction;
use crate::command::{CmdView, Command, Selection};
use crate::commands::{CommandFactory, builtin_commands};
use crate::events::ViewEvent;
use crate::motion::{GestureState, GestureType, Motion};
use crate::render::Painter;
use crate::shapes::{Shape, ShapeFlags, ShapeId};
use crate::view::ViewConfig;
use kurbo::{Affine, Point, Rect, Vec2};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Most selected ids handed over on a command switch.
const MAX_HANDOVER_IDS: usize = 100;

/// Pending command switches applied after one handler returns.
const MAX_CHAINED_REQUESTS: usize = 4;

const DEFAULT_DRAW_COMMAND: &str = "line";

/// Parameters of the `transform` pseudo-command. The angle is in degrees.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct TransformParams {
    sx: f64,
    sy: f64,
    angle: f64,
    dx: f64,
    dy: f64,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            sx: 1.0,
            sy: 1.0,
            angle: 0.0,
            dx: 0.0,
            dy: 0.0,
        }
    }
}

impl TransformParams {
    /// The transform about `center`: scale, then rotate, then move.
    fn to_affine(&self, center: Point) -> Affine {
        let c = center.to_vec2();
        Affine::translate(Vec2::new(self.dx, self.dy))
            * Affine::translate(c)
            * Affine::rotate(self.angle.to_radians())
            * Affine::scale_non_uniform(self.sx, self.sy)
            * Affine::translate(-c)
    }
}

/// Owns the view context and routes gestures to the active command.
pub struct CommandManager {
    pub view: CmdView,
    /// Registered factories in switching order.
    factories: Vec<(String, CommandFactory)>,
    commands: HashMap<String, Box<dyn Command>>,
    cmd_name: String,
    draw_cmd: String,
    /// Set when an observer took over the gesture that began last.
    gesture_dropped: bool,
}

impl std::fmt::Debug for CommandManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandManager")
            .field("command", &self.cmd_name)
            .field("draw_command", &self.draw_cmd)
            .field("registered", &self.factories.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("view", &self.view)
            .finish()
    }
}

impl CommandManager {
    /// Manager with the built-in commands registered and none active.
    pub fn new(config: ViewConfig) -> Self {
        Self::with_view(CmdView::new(config))
    }

    pub fn with_view(view: CmdView) -> Self {
        let mut manager = Self {
            view,
            factories: Vec::new(),
            commands: HashMap::new(),
            cmd_name: String::new(),
            draw_cmd: String::new(),
            gesture_dropped: false,
        };
        for (name, factory) in builtin_commands() {
            manager.register_command(name, Some(factory));
        }
        manager
    }

    // Registry

    /// Register `factory` under `name`, or unregister with `None`.
    /// Returns false when nothing changed.
    pub fn register_command(&mut self, name: &str, factory: Option<CommandFactory>) -> bool {
        let index = self.factories.iter().position(|(n, _)| n == name);
        match (index, factory) {
            (Some(i), Some(factory)) => {
                if std::ptr::fn_addr_eq(self.factories[i].1, factory) {
                    return false;
                }
                self.factories[i].1 = factory;
            }
            (None, Some(factory)) => self.factories.push((name.to_string(), factory)),
            (Some(i), None) => {
                self.factories.remove(i);
            }
            (None, None) => return false,
        }

        if self.cmd_name == name {
            self.cancel();
            self.cmd_name.clear();
        }
        self.commands.remove(name);
        log::debug!("Command '{name}' {}", if factory.is_some() { "registered" } else { "unregistered" });
        true
    }

    /// The command registered or provided under `name`, created on first use.
    pub fn find_command(&mut self, name: &str) -> Option<&mut dyn Command> {
        if !self.commands.contains_key(name) {
            let created = match self.factories.iter().find(|(n, _)| n == name) {
                Some((_, factory)) => Some(factory()),
                None => self.view.subject.create_command(&self.view.motion, name),
            }?;
            self.commands.insert(name.to_string(), created);
        }
        let cmd = self.commands.get_mut(name)?;
        Some(cmd.as_mut())
    }

    /// Name of the active command, empty when none is active.
    pub fn command_name(&self) -> &str {
        &self.cmd_name
    }

    /// Registered command name at `index`.
    pub fn command_name_at(&self, index: usize) -> Option<&str> {
        self.factories.get(index).map(|(n, _)| n.as_str())
    }

    /// The selection capability of the active command.
    pub fn selection(&mut self) -> Option<(&mut dyn Selection, &mut CmdView)> {
        let sel = self.commands.get_mut(&self.cmd_name)?.as_selection()?;
        Some((sel, &mut self.view))
    }

    // Switching

    /// Activate `name`, resolving `@draw` and `@last`, then apply any
    /// switch the new command requested.
    ///
    /// Returns false when `name` did not become the active command: it fell
    /// back to `select`, or `erase` deleted the selection instead.
    pub fn set_command(&mut self, name: &str, params: Option<&Value>) -> bool {
        let ret = self.activate(name, params);
        self.apply_requests();
        ret
    }

    fn activate(&mut self, name: &str, params: Option<&Value>) -> bool {
        let name = match name {
            "@draw" if self.draw_cmd.is_empty() => DEFAULT_DRAW_COMMAND.to_string(),
            "@draw" => self.draw_cmd.clone(),
            "@last" => self.cmd_name.clone(),
            _ => name.to_string(),
        };
        match name.as_str() {
            "erasewnd" => return self.erase_in_window(),
            "transform" => return self.transform_selection(params),
            _ => {}
        }

        if self.view.equal_tol <= 0.0 {
            self.view.equal_tol = self.view.xform.display_to_model_len(1.0).max(1e-6);
        }

        let mut selection = self
            .selection()
            .map(|(sel, view)| sel.selected_ids(view))
            .unwrap_or_default();
        selection.truncate(MAX_HANDOVER_IDS);

        if name == "erase" && !selection.is_empty() {
            if let Some((sel, view)) = self.selection() {
                sel.delete_selection(view);
                return false;
            }
        }

        self.cancel();
        if name.is_empty() {
            self.cmd_name.clear();
            self.view.events.push(ViewEvent::CommandChanged(String::new()));
            return false;
        }

        let mut name = name;
        let mut fell_back = false;
        if self.find_command(&name).is_none() {
            log::warn!("Unknown command '{name}', falling back to select");
            name = "select".to_string();
            fell_back = true;
        }
        if self.find_command(&name).is_none() {
            self.cmd_name.clear();
            return false;
        }
        let Some(cmd) = self.commands.get_mut(&name) else {
            self.cmd_name.clear();
            return false;
        };

        if !cmd.initialize_with_selection(&mut self.view, &selection, params) && name != "select" {
            log::debug!("Command '{name}' refused to start, using select");
            name = "select".to_string();
            fell_back = true;
            let started = self.find_command(&name).is_some()
                && self
                    .commands
                    .get_mut(&name)
                    .is_some_and(|select| select.initialize_with_selection(&mut self.view, &selection, None));
            if !started {
                self.cmd_name.clear();
                return false;
            }
        }

        if self.commands.get(&name).is_some_and(|cmd| cmd.is_drawing_command()) {
            self.draw_cmd = name.clone();
        }
        log::debug!("Command switched to '{name}'");
        self.view.events.push(ViewEvent::CommandChanged(name.clone()));
        self.cmd_name = name;
        !fell_back
    }

    /// Activate the registered command after the current one, wrapping around.
    pub fn switch_command(&mut self) -> bool {
        if self.factories.is_empty() {
            return false;
        }
        let next = self
            .factories
            .iter()
            .position(|(n, _)| *n == self.cmd_name)
            .map_or(0, |i| (i + 1) % self.factories.len());
        let name = self.factories[next].0.clone();
        self.set_command(&name, None)
    }

    fn apply_requests(&mut self) {
        for _ in 0..MAX_CHAINED_REQUESTS {
            let Some(request) = self.view.take_request() else {
                return;
            };
            self.activate(&request.name, request.params.as_ref());
        }
        if self.view.take_request().is_some() {
            log::warn!("Dropped a command switch requested in a loop");
        }
    }

    /// Cancel the active command and forget the snap state.
    pub fn cancel(&mut self) -> bool {
        let ret = match self.commands.get_mut(&self.cmd_name) {
            Some(cmd) => cmd.cancel(&mut self.view),
            None => false,
        };
        self.view.clear_snap();
        ret
    }

    /// Drop every command instance. Observers are told first.
    pub fn unload_commands(&mut self) {
        self.cancel();
        self.view.subject.on_unload_commands();
        self.commands.clear();
        self.cmd_name.clear();
    }

    // Pseudo-commands

    /// Delete every visible, deletable shape crossing the window.
    fn erase_in_window(&mut self) -> bool {
        let view = &mut self.view;
        let window = view.xform.wnd_rect_model();
        let ids: Vec<ShapeId> = view
            .doc
            .iter()
            .filter(|s| s.is_visible() && !s.is_locked() && !s.has_flag(ShapeFlags::NO_DEL))
            .filter(|s| s.hit_test_box(window))
            .map(Shape::id)
            .collect();

        let allowed = ids
            .first()
            .and_then(|&id| view.doc.find_shape(id))
            .is_some_and(|shape| view.shape_will_delete(shape));
        if !allowed {
            return false;
        }
        let count = ids.into_iter().filter(|&id| view.remove_shape(id)).count();
        if count > 0 {
            view.regen();
            view.message(format!("@shape_n_deleted {count}"));
        }
        count > 0
    }

    fn transform_selection(&mut self, params: Option<&Value>) -> bool {
        let params = match params.map(TransformParams::deserialize) {
            Some(Ok(params)) => params,
            Some(Err(err)) => {
                log::warn!("Ignoring transform parameters: {err}");
                return false;
            }
            None => return false,
        };
        let Some((sel, view)) = self.selection() else {
            return false;
        };
        let Some(bounds) = sel
            .selected_ids(view)
            .iter()
            .filter_map(|&id| view.doc.find_shape(id))
            .map(Shape::bounds)
            .reduce(|a: Rect, b| a.union(b))
        else {
            return false;
        };
        sel.apply_transform(view, params.to_affine(bounds.center()))
    }

    // Gestures

    /// Route one gesture event to the active command.
    pub fn on_gesture(&mut self, motion: Motion) -> bool {
        self.view.motion = motion;
        self.view.motion.d2m = self.view.mm(1.0);
        let ret = self.dispatch();
        self.view.subject.on_post_gesture(&self.view.motion);
        self.apply_requests();
        ret
    }

    fn dispatch(&mut self) -> bool {
        let state = self.view.motion.gesture_state;
        let gesture = self.view.motion.gesture_type;
        let Some(cmd) = self.commands.get_mut(&self.cmd_name) else {
            return false;
        };
        let view = &mut self.view;

        if state == GestureState::Cancel {
            let ret = cmd.cancel(view);
            view.clear_snap();
            self.gesture_dropped = false;
            return ret;
        }
        if state == GestureState::Possible && gesture != GestureType::TwoFingersMove {
            return true;
        }
        let continuous = matches!(gesture, GestureType::Pan | GestureType::TwoFingersMove);
        if !continuous || state <= GestureState::Began {
            self.gesture_dropped = !view.subject.on_pre_gesture(&view.motion);
            if self.gesture_dropped {
                log::debug!("Observer took over a {gesture:?} gesture");
            }
        }
        if self.gesture_dropped {
            return false;
        }

        let ret = match gesture {
            GestureType::TwoFingersMove => cmd.two_fingers_move(view),
            GestureType::Tap => cmd.click(view),
            GestureType::DoubleTap => cmd.double_click(view),
            GestureType::Press => state > GestureState::Began || cmd.long_press(view),
            GestureType::Pan => match state {
                GestureState::Began => cmd.touch_began(view),
                GestureState::Moved => cmd.touch_moved(view),
                _ => {
                    if cmd.is_drawing_command() {
                        // Keep the last good snap when the finger slips back on release.
                        if let Some((_, raw)) = cmd.last_snapped() {
                            if view.motion.point_m.distance(raw) < view.mm(2.0) {
                                view.motion.point_m = raw;
                                view.motion.point = view.xform.model_to_display(raw);
                            }
                        }
                    }
                    cmd.touch_moved(view) && cmd.touch_ended(view)
                }
            },
        };
        if !ret && !cmd.is_drawing_command() {
            log::debug!("Gesture {gesture:?} ({state:?}) not supported by '{}'", cmd.name());
        }
        ret
    }

    /// Draw the active command's dynamic layer.
    pub fn draw(&mut self, painter: &mut dyn Painter) -> bool {
        match self.commands.get_mut(&self.cmd_name) {
            Some(cmd) => cmd.draw(&mut self.view, painter),
            None => false,
        }
    }

    // Context actions

    /// Run a context action. Observers may claim it first.
    pub fn do_context_action(&mut self, action: ContextAction) -> bool {
        if self.view.subject.do_action(&self.view.motion, action) {
            return true;
        }
        match action {
            ContextAction::Draw => return self.set_command("@draw", None),
            ContextAction::Cancel => {
                self.cancel();
                return self.set_command("select", None);
            }
            _ => {}
        }

        if let Some((sel, view)) = self.selection() {
            let handled = match action {
                ContextAction::SelAll => Some(sel.select_all(view)),
                ContextAction::SelReset => {
                    sel.reset_selection(view);
                    Some(true)
                }
                ContextAction::Delete => Some(sel.delete_selection(view)),
                ContextAction::Clone => Some(sel.clone_selection(view)),
                ContextAction::FixedLength => Some(sel.set_fixed_length(view, true)),
                ContextAction::FreeLength => Some(sel.set_fixed_length(view, false)),
                ContextAction::Locked => Some(sel.set_locked(view, true)),
                ContextAction::Unlocked => Some(sel.set_locked(view, false)),
                ContextAction::EditVertex => Some(sel.set_edit_mode(view, true)),
                ContextAction::HideVertex => Some(sel.set_edit_mode(view, false)),
                ContextAction::Closed | ContextAction::Opened => Some(sel.switch_closed(view)),
                ContextAction::AddVertex => Some(sel.insert_vertex(view)),
                ContextAction::DelVertex => Some(sel.delete_vertex(view)),
                ContextAction::Overturn => Some(sel.overturn(view)),
                _ => None,
            };
            if let Some(ret) = handled {
                self.apply_requests();
                return ret;
            }
        }

        let ret = match self.commands.get_mut(&self.cmd_name) {
            Some(cmd) => cmd.do_context_action(&mut self.view, action),
            None => false,
        };
        self.apply_requests();
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::DrawDot;
    use crate::shapes::Line;
    use crate::subject::CmdObserver;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn manager() -> CommandManager {
        CommandManager::new(ViewConfig {
            dpi: 25.4,
            offset: Vec2::new(500.0, 400.0),
            ..ViewConfig::default()
        })
    }

    fn motion(mgr: &CommandManager, gesture_type: GestureType, state: GestureState, start: Point, pt: Point) -> Motion {
        let xform = &mgr.view.xform;
        Motion {
            gesture_type,
            gesture_state: state,
            start_pt: xform.model_to_display(start),
            start_pt_m: start,
            last_pt: xform.model_to_display(start),
            last_pt_m: start,
            point: xform.model_to_display(pt),
            point_m: pt,
            ..Motion::new()
        }
    }

    fn pan(mgr: &mut CommandManager, from: Point, to: Point) {
        for (state, pt) in [
            (GestureState::Began, from),
            (GestureState::Moved, to),
            (GestureState::Ended, to),
        ] {
            let m = motion(mgr, GestureType::Pan, state, from, pt);
            mgr.on_gesture(m);
        }
    }

    fn tap(mgr: &mut CommandManager, pt: Point) -> bool {
        let m = motion(mgr, GestureType::Tap, GestureState::Ended, pt, pt);
        mgr.on_gesture(m)
    }

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> Shape {
        Shape::Line(Line::new(Point::new(x0, y0), Point::new(x1, y1)))
    }

    #[derive(Default)]
    struct Plugin {
        veto_gestures: bool,
        claim_delete: bool,
        post_gestures: usize,
    }

    impl CmdObserver for Plugin {
        fn on_pre_gesture(&mut self, _motion: &Motion) -> bool {
            !self.veto_gestures
        }

        fn on_post_gesture(&mut self, _motion: &Motion) {
            self.post_gestures += 1;
        }

        fn do_action(&mut self, _motion: &Motion, action: ContextAction) -> bool {
            self.claim_delete && action == ContextAction::Delete
        }
    }

    #[test]
    fn test_set_command_name_roundtrip() {
        let mut mgr = manager();
        for (name, _) in builtin_commands() {
            assert!(mgr.set_command(name, None), "{name} did not start");
            assert_eq!(mgr.command_name(), name);
        }
        assert!(mgr.view.events.iter().any(|e| *e == ViewEvent::CommandChanged("arc3p".into())));
    }

    #[test]
    fn test_draw_and_last_aliases() {
        let mut mgr = manager();
        mgr.set_command("@draw", None);
        assert_eq!(mgr.command_name(), "line");

        mgr.set_command("rect", None);
        mgr.set_command("select", None);
        mgr.set_command("@draw", None);
        assert_eq!(mgr.command_name(), "rect");
        mgr.set_command("@last", None);
        assert_eq!(mgr.command_name(), "rect");
    }

    #[test]
    fn test_unknown_name_falls_back_to_select() {
        let mut mgr = manager();
        assert!(!mgr.set_command("spline", None));
        assert_eq!(mgr.command_name(), "select");
        assert!(mgr.find_command("select").is_some());
        assert!(mgr.view.events.iter().any(|e| *e == ViewEvent::CommandChanged("select".into())));
        assert!(mgr.set_command("select", None));

        assert!(!mgr.set_command("", None));
        assert_eq!(mgr.command_name(), "");
        assert!(!tap(&mut mgr, Point::ZERO));
    }

    #[test]
    fn test_short_drag_is_not_committed() {
        let mut mgr = manager();
        mgr.set_command("line", None);
        pan(&mut mgr, Point::ZERO, Point::new(1.0, 0.0));
        assert!(mgr.view.doc.is_empty());
    }

    #[test]
    fn test_long_drag_commits_one_line() {
        let mut mgr = manager();
        mgr.set_command("line", None);
        pan(&mut mgr, Point::ZERO, Point::new(10.0, 0.0));
        assert_eq!(mgr.view.doc.len(), 1);
        assert_eq!(mgr.view.new_shape_id, 1);
        assert!(mgr.view.events.iter().any(|e| *e == ViewEvent::ShapeAdded(1)));
    }

    #[test]
    fn test_tap_in_drawing_command_selects_shape() {
        let mut mgr = manager();
        let id = mgr.view.doc.add_shape(line(0.0, 0.0, 30.0, 0.0));
        mgr.set_command("line", None);

        assert!(tap(&mut mgr, Point::new(15.0, 1.0)));
        assert_eq!(mgr.command_name(), "select");
        let (sel, view) = mgr.selection().unwrap();
        assert_eq!(sel.selected_ids(view), vec![id]);
    }

    #[test]
    fn test_pre_gesture_veto_drops_until_next_began() {
        let mut mgr = manager();
        let plugin = Rc::new(RefCell::new(Plugin {
            veto_gestures: true,
            ..Plugin::default()
        }));
        mgr.view.subject.register_observer(plugin.clone(), Some("plugin"));
        mgr.set_command("line", None);

        pan(&mut mgr, Point::ZERO, Point::new(10.0, 0.0));
        assert!(mgr.view.doc.is_empty());
        assert_eq!(plugin.borrow().post_gestures, 3);

        plugin.borrow_mut().veto_gestures = false;
        pan(&mut mgr, Point::ZERO, Point::new(10.0, 0.0));
        assert_eq!(mgr.view.doc.len(), 1);
    }

    /// Counts release events and refuses drags.
    struct StubbornCommand;

    impl Command for StubbornCommand {
        fn name(&self) -> &str {
            "stubborn"
        }

        fn touch_began(&mut self, _view: &mut CmdView) -> bool {
            true
        }

        fn touch_ended(&mut self, view: &mut CmdView) -> bool {
            view.message("ended");
            true
        }
    }

    #[test]
    fn test_press_shows_actions_once() {
        let mut mgr = manager();
        mgr.set_command("line", None);
        for state in [GestureState::Began, GestureState::Moved, GestureState::Ended] {
            let m = motion(&mgr, GestureType::Press, state, Point::ZERO, Point::ZERO);
            assert!(mgr.on_gesture(m));
        }
        let shown = mgr
            .view
            .events
            .iter()
            .filter(|e| matches!(e, ViewEvent::ContextActions { .. }))
            .count();
        assert_eq!(shown, 1);
    }

    #[test]
    fn test_possible_phase_is_not_dispatched() {
        let mut mgr = manager();
        let id = mgr.view.doc.add_shape(line(0.0, 0.0, 30.0, 0.0));
        mgr.set_command("select", Some(&json!({ "id": id })));

        let m = motion(&mgr, GestureType::Tap, GestureState::Possible, Point::new(0.0, 50.0), Point::new(0.0, 50.0));
        assert!(mgr.on_gesture(m));
        let (sel, view) = mgr.selection().unwrap();
        assert_eq!(sel.selected_ids(view), vec![id]);

        mgr.set_command("line", None);
        let m = motion(&mgr, GestureType::Pan, GestureState::Possible, Point::ZERO, Point::new(10.0, 0.0));
        assert!(mgr.on_gesture(m));
        assert_eq!(mgr.view.doc.len(), 1);
    }

    #[test]
    fn test_pan_end_needs_accepted_move() {
        let mut mgr = manager();
        let factory: CommandFactory = || Box::new(StubbornCommand);
        assert!(mgr.register_command("stubborn", Some(factory)));
        mgr.set_command("stubborn", None);

        pan(&mut mgr, Point::ZERO, Point::new(10.0, 0.0));
        assert!(!mgr.view.events.iter().any(|e| *e == ViewEvent::Message("ended".into())));
    }

    #[test]
    fn test_cancel_gesture_drops_partial_shape() {
        let mut mgr = manager();
        mgr.set_command("line", None);
        let began = motion(&mgr, GestureType::Pan, GestureState::Began, Point::ZERO, Point::ZERO);
        mgr.on_gesture(began);
        let cancel = motion(&mgr, GestureType::Pan, GestureState::Cancel, Point::ZERO, Point::ZERO);
        assert!(mgr.on_gesture(cancel));
        assert!(mgr.view.doc.is_empty());
        assert!(!mgr.draw(&mut crate::render::RecordingPainter::default()));
    }

    #[test]
    fn test_erase_with_selection_deletes_it() {
        let mut mgr = manager();
        let a = mgr.view.doc.add_shape(line(0.0, 0.0, 30.0, 0.0));
        let b = mgr.view.doc.add_shape(line(0.0, 40.0, 30.0, 40.0));
        mgr.set_command("select", None);
        tap(&mut mgr, Point::new(15.0, 1.0));

        assert!(!mgr.set_command("erase", None));
        assert_eq!(mgr.command_name(), "select");
        assert!(!mgr.view.doc.contains(a));
        assert!(mgr.view.doc.contains(b));

        assert!(mgr.set_command("erase", None));
        assert_eq!(mgr.command_name(), "erase");
    }

    #[test]
    fn test_erasewnd_spares_locked_and_offscreen() {
        let mut mgr = manager();
        mgr.view.doc.add_shape(line(0.0, 0.0, 30.0, 0.0));
        mgr.view.doc.add_shape(line(0.0, 10.0, 30.0, 10.0));
        let mut locked = line(0.0, 20.0, 30.0, 20.0);
        locked.set_flag(ShapeFlags::LOCKED, true);
        let locked = mgr.view.doc.add_shape(locked);
        let far = mgr.view.doc.add_shape(line(5000.0, 0.0, 5030.0, 0.0));

        assert!(mgr.set_command("erasewnd", None));
        assert_eq!(mgr.view.doc.ids(), &[locked, far]);
        assert!(mgr.view.events.iter().any(|e| *e == ViewEvent::Message("@shape_n_deleted 2".into())));
    }

    #[test]
    fn test_transform_rotates_about_selection_center() {
        let mut mgr = manager();
        let id = mgr.view.doc.add_shape(line(0.0, 0.0, 10.0, 0.0));
        mgr.set_command("select", Some(&json!({ "id": id })));

        assert!(mgr.set_command("transform", Some(&json!({ "angle": 90.0, "dx": 1.0 }))));
        let (start, end) = mgr.view.doc.find_shape(id).and_then(Shape::as_segment).unwrap();
        assert!(start.distance(Point::new(6.0, -5.0)) < 1e-9);
        assert!(end.distance(Point::new(6.0, 5.0)) < 1e-9);
        assert_eq!(mgr.command_name(), "select");
    }

    #[test]
    fn test_observer_claims_action_first() {
        let mut mgr = manager();
        let id = mgr.view.doc.add_shape(line(0.0, 0.0, 10.0, 0.0));
        mgr.set_command("select", Some(&json!({ "id": id })));
        let plugin = Rc::new(RefCell::new(Plugin {
            claim_delete: true,
            ..Plugin::default()
        }));
        mgr.view.subject.register_observer(plugin.clone(), Some("plugin"));

        assert!(mgr.do_context_action(ContextAction::Delete));
        assert!(mgr.view.doc.contains(id));

        plugin.borrow_mut().claim_delete = false;
        assert!(mgr.do_context_action(ContextAction::Delete));
        assert!(mgr.view.doc.is_empty());
    }

    #[test]
    fn test_draw_action_and_switch_wraps() {
        let mut mgr = manager();
        mgr.set_command("sector", None);
        assert!(mgr.switch_command());
        assert_eq!(mgr.command_name(), "select");
        assert!(mgr.switch_command());
        assert_eq!(mgr.command_name(), "erase");

        assert!(mgr.do_context_action(ContextAction::Draw));
        assert_eq!(mgr.command_name(), "sector");
        assert_eq!(mgr.command_name_at(0), Some("select"));
        assert_eq!(mgr.command_name_at(99), None);
    }

    #[test]
    fn test_register_and_unregister() {
        let mut mgr = manager();
        let factory: CommandFactory = || Box::new(DrawDot::new());
        assert!(mgr.register_command("stamp", Some(factory)));
        assert!(!mgr.register_command("stamp", Some(factory)));
        assert!(mgr.set_command("stamp", None));
        assert_eq!(mgr.command_name(), "stamp");
        assert!(mgr.find_command("stamp").is_some());

        assert!(mgr.register_command("stamp", None));
        assert!(!mgr.register_command("stamp", None));
        assert_eq!(mgr.command_name(), "");
        assert!(mgr.find_command("stamp").is_none());
    }

    #[test]
    fn test_unload_commands_clears_active() {
        let mut mgr = manager();
        mgr.set_command("select", None);
        mgr.unload_commands();
        assert_eq!(mgr.command_name(), "");
        assert!(!mgr.draw(&mut crate::render::RecordingPainter::default()));
    }
}
