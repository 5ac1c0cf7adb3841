//! The transform controller: a finite-state machine turning pointer and
//! keyboard input into move/resize/rotate gestures over the current
//! selection.
//!
//! The controller never touches the editor state. It reads an immutable
//! selection snapshot, publishes previews and the final commit as [`Effect`]
//! values, and leaves dispatching them to the host. Its only mutable state
//! is the transient gesture below, private to one controller instance.

use super::handles::{hit_test_handles, HandleKind};
use super::timer::{CancelToken, Scheduler};
use super::{snap_mode_for, ArrowKey, Effect, Handled, InputEvent, InteractionHandler, Modifiers};
use crate::diagram::Diagram;
use crate::geometry::{angle_between, rotate_about, Rotation, Transform};
use crate::item::{DiagramItem, ItemId};
use crate::snap::{SnapManager, SnapMode};
use kurbo::{Point, Vec2};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Delay before the keyboard auto-repeat starts.
const KEY_REPEAT_DELAY: Duration = Duration::from_millis(1000);
/// Interval between auto-repeat steps.
const KEY_REPEAT_INTERVAL: Duration = Duration::from_millis(200);

/// What a running gesture manipulates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ManipulationMode {
    Move,
    Resize {
        offset: Vec2,
    },
    Rotate,
    /// Arrow-key move: the step grows by one per auto-repeat tick.
    KeyboardMove {
        direction: Vec2,
        counter: u32,
    },
}

/// The explicit gesture state. `changed` guards the commit: a gesture that
/// never produced a non-zero delta ends silently.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    Idle,
    Manipulating {
        mode: ManipulationMode,
        start_position: Point,
        start_transform: Transform,
        changed: bool,
    },
}

pub struct TransformController {
    weak_self: Weak<RefCell<TransformController>>,
    scheduler: Rc<RefCell<dyn Scheduler>>,
    snap: SnapManager,
    diagram: Option<Diagram>,
    selection: Vec<DiagramItem>,
    /// Live bounding transform of the selection (the preview geometry).
    transform: Transform,
    /// Rotation carried across gestures for multi-selections; reset when
    /// the selection changes.
    rotation: Rotation,
    can_resize_x: bool,
    can_resize_y: bool,
    state: GestureState,
    move_timer: Option<CancelToken>,
    out: Vec<Effect>,
}

impl TransformController {
    /// Controllers live behind `Rc<RefCell<_>>` so the repeat timer can
    /// re-enter them; the engine is single-threaded, so plain `Rc` suffices.
    pub fn new(scheduler: Rc<RefCell<dyn Scheduler>>) -> Rc<RefCell<Self>> {
        let controller = Rc::new(RefCell::new(Self {
            weak_self: Weak::new(),
            scheduler,
            snap: SnapManager::new(),
            diagram: None,
            selection: Vec::new(),
            transform: Transform::ZERO,
            rotation: Rotation::ZERO,
            can_resize_x: false,
            can_resize_y: false,
            state: GestureState::Idle,
            move_timer: None,
            out: Vec::new(),
        }));
        controller.borrow_mut().weak_self = Rc::downgrade(&controller);
        controller
    }

    /// Update the selection snapshot. Recomputes the bounding transform and
    /// the resize permissions, aborts any running gesture and re-prepares
    /// the snap guides against the remaining siblings.
    pub fn set_selection(&mut self, diagram: &Diagram, item_ids: &[ItemId]) {
        self.cancel_timer();
        self.state = GestureState::Idle;

        let previous: Vec<ItemId> = self.selection.iter().map(DiagramItem::id).collect();
        if previous != item_ids {
            self.rotation = Rotation::ZERO;
        }

        self.selection = item_ids
            .iter()
            .filter_map(|id| diagram.item(*id).cloned())
            .collect();

        // Any item free on an axis enables that axis for the whole selection.
        self.can_resize_x = self.selection.iter().any(DiagramItem::resizable_x);
        self.can_resize_y = self.selection.iter().any(DiagramItem::resizable_y);

        let bounds: Vec<Transform> = item_ids
            .iter()
            .filter_map(|id| diagram.bounds_of(*id))
            .collect();
        self.transform = match bounds.as_slice() {
            [] => Transform::ZERO,
            [single] => *single,
            many => Transform::from_transforms_and_rotation(many, self.rotation),
        };

        self.snap.prepare(diagram, item_ids);
        self.diagram = Some(diagram.clone());
    }

    /// The live selection bounds, for adorner rendering.
    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Drain effects produced outside a dispatched event (timer ticks).
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.out)
    }

    fn pointer_down(&mut self, position: Point, modifiers: Modifiers) -> Handled {
        if modifiers.ctrl
            || self.move_timer.is_some()
            || self.state != GestureState::Idle
            || self.selection.is_empty()
        {
            return Handled::No;
        }

        let Some(kind) = hit_test_handles(
            &self.transform,
            position,
            self.can_resize_x,
            self.can_resize_y,
        ) else {
            return Handled::No;
        };

        let mode = match kind {
            HandleKind::Move => ManipulationMode::Move,
            HandleKind::Resize(offset) => ManipulationMode::Resize { offset },
            HandleKind::Rotate => ManipulationMode::Rotate,
        };
        log::debug!("gesture start: {mode:?}");

        self.cancel_timer();
        self.out.push(Effect::PreviewStart);
        self.state = GestureState::Manipulating {
            mode,
            start_position: position,
            start_transform: self.transform,
            changed: false,
        };
        Handled::Yes
    }

    fn pointer_drag(&mut self, position: Point, modifiers: Modifiers) -> Handled {
        let GestureState::Manipulating {
            mode,
            start_position,
            start_transform,
            ..
        } = self.state
        else {
            return Handled::No;
        };
        if matches!(mode, ManipulationMode::KeyboardMove { .. }) {
            return Handled::No;
        }

        let delta = position - start_position;
        if delta.hypot2() == 0.0 {
            return Handled::Yes;
        }

        let snap_mode = snap_mode_for(modifiers);
        self.transform = match mode {
            ManipulationMode::Move => self.moved(start_transform, delta, snap_mode),
            ManipulationMode::Rotate => {
                self.rotated(start_transform, start_position, position, snap_mode)
            }
            ManipulationMode::Resize { offset } => {
                self.resized(start_transform, delta, offset, snap_mode)
            }
            ManipulationMode::KeyboardMove { .. } => unreachable!(),
        };
        self.state = GestureState::Manipulating {
            mode,
            start_position,
            start_transform,
            changed: true,
        };
        self.publish_preview(start_transform);
        Handled::Yes
    }

    fn pointer_up(&mut self) -> Handled {
        let GestureState::Manipulating {
            mode,
            start_transform,
            changed,
            ..
        } = self.state
        else {
            return Handled::No;
        };
        if matches!(mode, ManipulationMode::KeyboardMove { .. }) {
            return Handled::No;
        }

        self.finish_gesture(changed, start_transform);
        Handled::Yes
    }

    fn key_down(&mut self, key: ArrowKey) -> Handled {
        if self.selection.is_empty()
            || self.state != GestureState::Idle
            || self.move_timer.is_some()
        {
            return Handled::No;
        }

        self.out.push(Effect::PreviewStart);
        self.state = GestureState::Manipulating {
            mode: ManipulationMode::KeyboardMove {
                direction: key.direction(),
                counter: 1,
            },
            start_position: self.transform.position(),
            start_transform: self.transform,
            changed: false,
        };

        // Immediate first step, then auto-repeat after the longer delay.
        self.keyboard_step();

        let weak = self.weak_self.clone();
        let token = self.scheduler.borrow_mut().schedule(
            Box::new(move || {
                if let Some(controller) = weak.upgrade() {
                    controller.borrow_mut().keyboard_step();
                }
            }),
            KEY_REPEAT_DELAY,
            KEY_REPEAT_INTERVAL,
        );
        self.move_timer = Some(token);
        Handled::Yes
    }

    /// One keyboard step: the delta is recomputed from the start transform
    /// with a growing multiplier, so every tick moves one unit further.
    fn keyboard_step(&mut self) {
        let GestureState::Manipulating {
            mode:
                ManipulationMode::KeyboardMove {
                    direction,
                    counter,
                },
            start_position,
            start_transform,
            ..
        } = self.state
        else {
            return;
        };

        let delta = Vec2::new(
            direction.x * counter as f64,
            direction.y * counter as f64,
        );
        self.transform = self.moved(start_transform, delta, SnapMode::None);
        self.state = GestureState::Manipulating {
            mode: ManipulationMode::KeyboardMove {
                direction,
                counter: counter + 1,
            },
            start_position,
            start_transform,
            changed: true,
        };
        self.publish_preview(start_transform);
    }

    fn key_up(&mut self) -> Handled {
        if self.move_timer.is_none() {
            return Handled::No;
        }
        match self.state {
            GestureState::Manipulating {
                changed,
                start_transform,
                ..
            } => self.finish_gesture(changed, start_transform),
            GestureState::Idle => self.stop_gesture(),
        }
        Handled::Yes
    }

    fn focus_lost(&mut self) -> Handled {
        if self.state == GestureState::Idle && self.move_timer.is_none() {
            return Handled::No;
        }
        match self.state {
            GestureState::Manipulating {
                changed,
                start_transform,
                ..
            } => self.finish_gesture(changed, start_transform),
            GestureState::Idle => self.stop_gesture(),
        }
        Handled::Yes
    }

    /// End the gesture; commit only when something actually changed.
    fn finish_gesture(&mut self, changed: bool, start_transform: Transform) {
        if changed {
            self.rotation = self.transform.rotation();
            if let Some(diagram) = &self.diagram {
                log::debug!("gesture commit: {:?} -> {:?}", start_transform, self.transform);
                self.out.push(Effect::TransformItems {
                    diagram_id: diagram.id(),
                    item_ids: self.selection.iter().map(DiagramItem::id).collect(),
                    old_bounds: start_transform,
                    new_bounds: self.transform,
                });
            }
        }
        self.stop_gesture();
    }

    fn stop_gesture(&mut self) {
        self.out.push(Effect::PreviewEnd);
        self.cancel_timer();
        self.state = GestureState::Idle;
    }

    fn cancel_timer(&mut self) {
        if let Some(token) = self.move_timer.take() {
            token.cancel();
        }
    }

    fn moved(&self, start: Transform, delta: Vec2, mode: SnapMode) -> Transform {
        let result = self.snap.snap_moving(&start, delta, mode);
        start.move_by(result.delta)
    }

    fn rotated(
        &self,
        start: Transform,
        start_position: Point,
        position: Point,
        mode: SnapMode,
    ) -> Transform {
        let center = start.position();
        let raw = angle_between(start_position - center, position - center);
        let snapped = self.snap.snap_rotating(&start, raw, mode);
        start.rotate_by(Rotation::from_degrees(snapped))
    }

    fn resized(&self, start: Transform, delta: Vec2, offset: Vec2, mode: SnapMode) -> Transform {
        let rotation = start.rotation();

        // Raw pointer delta, doubled and taken into the shape's local frame;
        // the handle offset selects and signs the affected axes.
        let local = rotate_vec(delta * 2.0, rotation.negate());
        let delta_size = Vec2::new(local.x * offset.x, local.y * offset.y);
        let snapped = self
            .snap
            .snap_resizing(&start, delta_size, mode, offset.x, offset.y);
        let delta_size = snapped.delta;

        // Edges move independently: the center shifts by half the size
        // delta per axis, rotated back into world space.
        let cos = rotation.cos();
        let sin = rotation.sin();
        let mut shift = Vec2::ZERO;
        if offset.y != 0.0 {
            shift.y += offset.y * delta_size.y * cos;
            shift.x -= offset.y * delta_size.y * sin;
        }
        if offset.x != 0.0 {
            shift.y += offset.x * delta_size.x * sin;
            shift.x += offset.x * delta_size.x * cos;
        }

        start.resize_and_move_by(delta_size, shift)
    }

    /// Publish the transformed leaf shapes on the preview channel.
    fn publish_preview(&mut self, start_transform: Transform) {
        let Some(diagram) = &self.diagram else {
            return;
        };
        let mut items: HashMap<ItemId, DiagramItem> = HashMap::new();
        for item in &self.selection {
            for leaf_id in diagram.leaf_items(item.id()) {
                if let Some(leaf) = diagram.item(leaf_id) {
                    let updated = leaf.transform_with(|t| {
                        t.transform_by_bounds(&start_transform, &self.transform)
                    });
                    items.insert(leaf_id, updated);
                }
            }
        }
        self.out.push(Effect::PreviewUpdate { items });
    }
}

impl InteractionHandler for TransformController {
    fn on_event(&mut self, event: &InputEvent, effects: &mut Vec<Effect>) -> Handled {
        let handled = match event {
            InputEvent::PointerDown {
                position,
                modifiers,
            } => self.pointer_down(*position, *modifiers),
            InputEvent::PointerDrag {
                position,
                modifiers,
            } => self.pointer_drag(*position, *modifiers),
            InputEvent::PointerUp { .. } => self.pointer_up(),
            InputEvent::KeyDown { key } => self.key_down(*key),
            InputEvent::KeyUp { .. } => self.key_up(),
            InputEvent::FocusLost => self.focus_lost(),
        };
        effects.append(&mut self.out);
        handled
    }
}

fn rotate_vec(v: Vec2, rotation: Rotation) -> Vec2 {
    rotate_about(Point::new(v.x, v.y), Point::ZERO, rotation).to_vec2()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::timer::ManualScheduler;
    use crate::item::SizeConstraint;
    use uuid::Uuid;

    const SNAP_NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: true,
        alt: false,
    };

    fn id(n: u128) -> ItemId {
        Uuid::from_u128(n)
    }

    fn diagram() -> Diagram {
        Diagram::new(Uuid::from_u128(100))
            .add_visual(
                DiagramItem::create_shape(id(1), "Button", 80.0, 40.0)
                    .transform_with(|t| t.move_to(Point::new(100.0, 100.0))),
            )
            .unwrap()
    }

    #[allow(clippy::type_complexity)]
    fn make_controller(
        diagram: &Diagram,
        selection: &[ItemId],
    ) -> (
        Rc<RefCell<TransformController>>,
        Rc<RefCell<ManualScheduler>>,
    ) {
        let scheduler = Rc::new(RefCell::new(ManualScheduler::new()));
        let controller = TransformController::new(scheduler.clone());
        controller.borrow_mut().set_selection(diagram, selection);
        (controller, scheduler)
    }

    fn send(
        controller: &Rc<RefCell<TransformController>>,
        event: InputEvent,
    ) -> (Handled, Vec<Effect>) {
        let mut effects = Vec::new();
        let handled = controller.borrow_mut().on_event(&event, &mut effects);
        (handled, effects)
    }

    fn commit_of(effects: &[Effect]) -> Option<(Transform, Transform)> {
        effects.iter().find_map(|effect| match effect {
            Effect::TransformItems {
                old_bounds,
                new_bounds,
                ..
            } => Some((*old_bounds, *new_bounds)),
            _ => None,
        })
    }

    #[test]
    fn zero_delta_gesture_commits_nothing() {
        let diagram = diagram();
        let (controller, _) = make_controller(&diagram, &[id(1)]);

        let (handled, effects) = send(
            &controller,
            InputEvent::PointerDown {
                position: Point::new(100.0, 100.0),
                modifiers: Modifiers::default(),
            },
        );
        assert_eq!(handled, Handled::Yes);
        assert_eq!(effects, vec![Effect::PreviewStart]);

        let (_, effects) = send(
            &controller,
            InputEvent::PointerUp {
                position: Point::new(100.0, 100.0),
            },
        );
        assert_eq!(effects, vec![Effect::PreviewEnd]);
        assert_eq!(controller.borrow().state(), GestureState::Idle);
    }

    #[test]
    fn move_gesture_commits_the_snapped_delta() {
        let diagram = diagram();
        let (controller, _) = make_controller(&diagram, &[id(1)]);

        send(
            &controller,
            InputEvent::PointerDown {
                position: Point::new(100.0, 100.0),
                modifiers: Modifiers::default(),
            },
        );
        let (_, effects) = send(
            &controller,
            InputEvent::PointerDrag {
                position: Point::new(110.0, 105.0),
                modifiers: SNAP_NONE,
            },
        );
        assert!(matches!(effects[0], Effect::PreviewUpdate { .. }));

        let (_, effects) = send(
            &controller,
            InputEvent::PointerUp {
                position: Point::new(110.0, 105.0),
            },
        );
        let (old_bounds, new_bounds) = commit_of(&effects).expect("commit");
        assert_eq!(old_bounds.position(), Point::new(100.0, 100.0));
        assert_eq!(new_bounds.position(), Point::new(110.0, 105.0));
    }

    #[test]
    fn resize_gesture_grows_the_selection() {
        let diagram = diagram();
        let (controller, _) = make_controller(&diagram, &[id(1)]);

        // Grab the right-edge handle and pull it 10 to the right.
        send(
            &controller,
            InputEvent::PointerDown {
                position: Point::new(140.0, 100.0),
                modifiers: Modifiers::default(),
            },
        );
        send(
            &controller,
            InputEvent::PointerDrag {
                position: Point::new(150.0, 100.0),
                modifiers: SNAP_NONE,
            },
        );
        let (_, effects) = send(
            &controller,
            InputEvent::PointerUp {
                position: Point::new(150.0, 100.0),
            },
        );

        let (_, new_bounds) = commit_of(&effects).expect("commit");
        assert_eq!(new_bounds.size(), Vec2::new(90.0, 40.0));
        // The right edge moved; the center follows by half the size delta.
        assert_eq!(new_bounds.position(), Point::new(105.0, 100.0));
    }

    #[test]
    fn rotate_gesture_commits_the_angle() {
        let diagram = diagram();
        let (controller, _) = make_controller(&diagram, &[id(1)]);

        // Grab the rotate knob straight above the center, then drag to the
        // right of the center: a 90° turn.
        send(
            &controller,
            InputEvent::PointerDown {
                position: Point::new(100.0, 50.0),
                modifiers: Modifiers::default(),
            },
        );
        send(
            &controller,
            InputEvent::PointerDrag {
                position: Point::new(150.0, 100.0),
                modifiers: SNAP_NONE,
            },
        );
        let (_, effects) = send(
            &controller,
            InputEvent::PointerUp {
                position: Point::new(150.0, 100.0),
            },
        );

        let (_, new_bounds) = commit_of(&effects).expect("commit");
        assert!((new_bounds.rotation().degrees() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn ctrl_pointer_down_is_declined() {
        let diagram = diagram();
        let (controller, _) = make_controller(&diagram, &[id(1)]);

        let (handled, effects) = send(
            &controller,
            InputEvent::PointerDown {
                position: Point::new(100.0, 100.0),
                modifiers: SNAP_NONE,
            },
        );
        assert_eq!(handled, Handled::No);
        assert!(effects.is_empty());
    }

    #[test]
    fn misses_are_declined() {
        let diagram = diagram();
        let (controller, _) = make_controller(&diagram, &[id(1)]);

        let (handled, _) = send(
            &controller,
            InputEvent::PointerDown {
                position: Point::new(400.0, 400.0),
                modifiers: Modifiers::default(),
            },
        );
        assert_eq!(handled, Handled::No);
    }

    #[test]
    fn keyboard_move_repeats_with_a_growing_step() {
        let diagram = diagram();
        let (controller, scheduler) = make_controller(&diagram, &[id(1)]);

        let (handled, effects) = send(&controller, InputEvent::KeyDown { key: ArrowKey::Right });
        assert_eq!(handled, Handled::Yes);
        // Immediate first step of one unit.
        assert!(matches!(effects[1], Effect::PreviewUpdate { .. }));
        assert_eq!(
            controller.borrow().transform().position(),
            Point::new(101.0, 100.0)
        );
        assert_eq!(
            scheduler.borrow().last_schedule(),
            Some((KEY_REPEAT_DELAY, KEY_REPEAT_INTERVAL))
        );

        // Two auto-repeat ticks: the delta is recomputed from the start
        // transform with the grown multiplier.
        scheduler.borrow_mut().tick();
        scheduler.borrow_mut().tick();
        assert_eq!(
            controller.borrow().transform().position(),
            Point::new(103.0, 100.0)
        );

        let (_, effects) = send(&controller, InputEvent::KeyUp { key: ArrowKey::Right });
        let (old_bounds, new_bounds) = commit_of(&effects).expect("commit");
        assert_eq!(old_bounds.position(), Point::new(100.0, 100.0));
        assert_eq!(new_bounds.position(), Point::new(103.0, 100.0));
        assert_eq!(scheduler.borrow().live_count(), 0, "timer cancelled on key up");
    }

    #[test]
    fn second_key_down_during_a_repeat_is_declined() {
        let diagram = diagram();
        let (controller, _) = make_controller(&diagram, &[id(1)]);

        send(&controller, InputEvent::KeyDown { key: ArrowKey::Right });
        let (handled, _) = send(&controller, InputEvent::KeyDown { key: ArrowKey::Down });
        assert_eq!(handled, Handled::No);
    }

    #[test]
    fn focus_loss_commits_a_changed_gesture() {
        let diagram = diagram();
        let (controller, scheduler) = make_controller(&diagram, &[id(1)]);

        send(&controller, InputEvent::KeyDown { key: ArrowKey::Down });
        let (_, effects) = send(&controller, InputEvent::FocusLost);

        let (_, new_bounds) = commit_of(&effects).expect("commit");
        assert_eq!(new_bounds.position(), Point::new(100.0, 101.0));
        assert_eq!(scheduler.borrow().live_count(), 0, "timer cancelled on blur");
    }

    #[test]
    fn focus_loss_without_change_discards_silently() {
        let diagram = diagram();
        let (controller, _) = make_controller(&diagram, &[id(1)]);

        send(
            &controller,
            InputEvent::PointerDown {
                position: Point::new(100.0, 100.0),
                modifiers: Modifiers::default(),
            },
        );
        let (_, effects) = send(&controller, InputEvent::FocusLost);
        assert_eq!(effects, vec![Effect::PreviewEnd]);
    }

    #[test]
    fn resize_permissions_union_across_the_selection() {
        let fixed = DiagramItem::create_shape(id(2), "Label", 40.0, 20.0)
            .with_constraint(SizeConstraint::fixed())
            .transform_with(|t| t.move_to(Point::new(100.0, 100.0)));
        let diagram = Diagram::new(Uuid::from_u128(100))
            .add_visual(fixed)
            .unwrap();

        // Alone, the fixed item offers no resize handles at all.
        let (controller, _) = make_controller(&diagram, &[id(2)]);
        let (handled, _) = send(
            &controller,
            InputEvent::PointerDown {
                position: Point::new(123.0, 100.0),
                modifiers: Modifiers::default(),
            },
        );
        assert_eq!(handled, Handled::No);

        // With a free sibling selected too, the union enables the handles.
        let both = diagram
            .add_visual(
                DiagramItem::create_shape(id(3), "Button", 40.0, 20.0)
                    .transform_with(|t| t.move_to(Point::new(100.0, 100.0))),
            )
            .unwrap();
        let (controller, _) = make_controller(&both, &[id(2), id(3)]);
        let (handled, _) = send(
            &controller,
            InputEvent::PointerDown {
                position: Point::new(123.0, 100.0),
                modifiers: Modifiers::default(),
            },
        );
        assert_eq!(handled, Handled::Yes);
        assert!(matches!(
            controller.borrow().state(),
            GestureState::Manipulating {
                mode: ManipulationMode::Resize { .. },
                ..
            }
        ));
    }
}
