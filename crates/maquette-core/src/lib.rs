//! Maquette Core Library
//!
//! The geometric editing engine of the Maquette wireframe editor: the
//! immutable diagram model with undo/redo, the gesture state machine for
//! move/resize/rotate with snapping, and the alignment and ordering engines.
//! Rendering, widgets and persistence live in other crates and consume this
//! one through read-only geometry, actions and effects.

pub mod actions;
pub mod alignment;
pub mod diagram;
pub mod editor;
pub mod geometry;
pub mod history;
pub mod interaction;
pub mod item;
pub mod ordering;
pub mod snap;
pub mod snapshot;

pub use actions::{reduce, EditorAction};
pub use alignment::{align_items, AlignmentMode};
pub use diagram::{Diagram, DiagramId};
pub use editor::EditorState;
pub use geometry::{angle_between, rotate_about, Rotation, Transform};
pub use history::UndoableState;
pub use interaction::{
    ArrowKey, CancelToken, Effect, GestureState, Handled, InputEvent, InteractionHandler,
    InteractionService, ManualScheduler, Modifiers, Scheduler, TransformController,
};
pub use item::{AppearanceValue, DiagramItem, ItemId, Rgba, SizeConstraint};
pub use ordering::{order_items, OrderMode};
pub use snap::{SnapManager, SnapMode, SnapResult};
pub use snapshot::SnapshotError;
