//! Interaction layer: input events, the handler chain and the transform
//! controller driving move/resize/rotate gestures.

mod controller;
mod handles;
mod timer;

pub use controller::{GestureState, ManipulationMode, TransformController};
pub use handles::{hit_test_handles, resize_offsets, HandleKind, HANDLE_SIZE, ROTATE_HANDLE_OFFSET};
pub use timer::{CancelToken, ManualScheduler, Scheduler};

use crate::diagram::DiagramId;
use crate::geometry::Transform;
use crate::item::{DiagramItem, ItemId};
use crate::snap::SnapMode;
use kurbo::{Point, Vec2};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Modifier key state carried with pointer events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

/// The snap mode a gesture uses under the given modifiers.
pub fn snap_mode_for(modifiers: Modifiers) -> SnapMode {
    if modifiers.shift {
        SnapMode::Grid
    } else if modifiers.ctrl {
        SnapMode::None
    } else {
        SnapMode::Shapes
    }
}

/// Arrow keys driving the keyboard move gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKey {
    Left,
    Right,
    Up,
    Down,
}

impl ArrowKey {
    /// Unit step in world coordinates.
    pub fn direction(self) -> Vec2 {
        match self {
            ArrowKey::Left => Vec2::new(-1.0, 0.0),
            ArrowKey::Right => Vec2::new(1.0, 0.0),
            ArrowKey::Up => Vec2::new(0.0, -1.0),
            ArrowKey::Down => Vec2::new(0.0, 1.0),
        }
    }
}

/// Input events consumed by the handler chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { position: Point, modifiers: Modifiers },
    PointerDrag { position: Point, modifiers: Modifiers },
    PointerUp { position: Point },
    KeyDown { key: ArrowKey },
    KeyUp { key: ArrowKey },
    FocusLost,
}

/// Whether a handler consumed an event. Declining must not consume it; the
/// dispatcher passes declined events on to the next handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Yes,
    No,
}

/// Side effects a handler requests. The host forwards the preview effects
/// to its renderer (they bypass the history-tracked store) and turns the
/// commit into a `TransformItems` action.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// A gesture began; the renderer may switch to preview drawing.
    PreviewStart,
    /// Live transforms for the items under manipulation.
    PreviewUpdate {
        items: HashMap<ItemId, DiagramItem>,
    },
    /// The gesture ended; preview state should be dropped.
    PreviewEnd,
    /// Commit a finished gesture through the reducer.
    TransformItems {
        diagram_id: DiagramId,
        item_ids: Vec<ItemId>,
        old_bounds: Transform,
        new_bounds: Transform,
    },
}

/// One link in the input handler chain.
pub trait InteractionHandler {
    fn on_event(&mut self, event: &InputEvent, effects: &mut Vec<Effect>) -> Handled;
}

/// Ordered chain of input handlers. Handlers are tried in registration
/// order until one consumes the event.
#[derive(Default)]
pub struct InteractionService {
    handlers: Vec<Rc<RefCell<dyn InteractionHandler>>>,
}

impl InteractionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler(&mut self, handler: Rc<RefCell<dyn InteractionHandler>>) {
        self.handlers.push(handler);
    }

    /// Dispatch an event through the chain, collecting requested effects.
    pub fn dispatch(&mut self, event: &InputEvent) -> Vec<Effect> {
        let mut effects = Vec::new();
        for handler in &self.handlers {
            if handler.borrow_mut().on_event(event, &mut effects) == Handled::Yes {
                break;
            }
        }
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        handled: bool,
        seen: usize,
    }

    impl InteractionHandler for Recorder {
        fn on_event(&mut self, _event: &InputEvent, _effects: &mut Vec<Effect>) -> Handled {
            self.seen += 1;
            if self.handled {
                Handled::Yes
            } else {
                Handled::No
            }
        }
    }

    #[test]
    fn declined_events_reach_the_next_handler() {
        let first = Rc::new(RefCell::new(Recorder {
            handled: false,
            seen: 0,
        }));
        let second = Rc::new(RefCell::new(Recorder {
            handled: true,
            seen: 0,
        }));
        let third = Rc::new(RefCell::new(Recorder {
            handled: true,
            seen: 0,
        }));

        let mut service = InteractionService::new();
        service.add_handler(first.clone());
        service.add_handler(second.clone());
        service.add_handler(third.clone());

        service.dispatch(&InputEvent::FocusLost);

        assert_eq!(first.borrow().seen, 1);
        assert_eq!(second.borrow().seen, 1);
        assert_eq!(third.borrow().seen, 0, "consumed events stop the chain");
    }

    #[test]
    fn modifier_keys_select_the_snap_mode() {
        assert_eq!(snap_mode_for(Modifiers::default()), SnapMode::Shapes);
        assert_eq!(
            snap_mode_for(Modifiers {
                shift: true,
                ..Default::default()
            }),
            SnapMode::Grid
        );
        assert_eq!(
            snap_mode_for(Modifiers {
                ctrl: true,
                ..Default::default()
            }),
            SnapMode::None
        );
    }
}
