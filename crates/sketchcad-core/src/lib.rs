//! SketchCAD Core Library
//!
//! Gesture-driven commands and CAD point snapping for a touch 2D drawing engine.
//!
//! The host feeds platform gestures to a [`CommandManager`], which routes them
//! to the active [`Command`]. Commands snap points through the [`SnapEngine`],
//! edit the [`ShapeDocument`] and queue [`ViewEvent`]s for the host to drain.
//! Plugins hook in through [`CmdObserver`].

pub mod actions;
pub mod command;
pub mod commands;
pub mod document;
pub mod error;
pub mod events;
pub mod geom;
pub mod manager;
pub mod motion;
pub mod options;
pub mod render;
pub mod shapes;
pub mod snap;
pub mod subject;
pub mod view;

pub use actions::{ContextAction, SelState};
pub use command::{CmdView, Command, CommandRequest, Selection};
pub use document::ShapeDocument;
pub use error::{CommandError, ConfigError};
pub use events::{EventQueue, ViewEvent};
pub use manager::CommandManager;
pub use motion::{GestureState, GestureType, Motion};
pub use options::{OptionValue, Options};
pub use render::{HandleMark, HintPen, Painter};
pub use shapes::{HandleType, HitResult, Shape, ShapeFlags, ShapeId, ShapeKind, ShapeStyle, ShapeTrait};
pub use snap::{SnapEngine, SnapOptions, SnapRequest, SnapType};
pub use subject::{CmdObserver, CmdSubject, ObserverRef};
pub use view::{ViewConfig, ViewTransform};
