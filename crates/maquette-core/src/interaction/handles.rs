//! Manipulation handles and their hit testing.
//!
//! Handles are typed descriptors; the resize offset is a vector whose
//! components are each in {-0.5, 0, +0.5}, 0 meaning the axis is untouched
//! by that handle. All boxes live in the un-rotated local frame of the
//! selection transform, so hit testing un-rotates the pointer first.

use crate::geometry::{rotate_about, Transform};
use kurbo::{Point, Rect, Vec2};

/// Side length of the square handle boxes.
pub const HANDLE_SIZE: f64 = 12.0;
/// Distance between the selection's top edge and the rotate handle.
pub const ROTATE_HANDLE_OFFSET: f64 = 30.0;

/// Which handle a pointer grabbed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandleKind {
    /// The selection body; dragging it moves the whole selection.
    Move,
    /// One of the eight resize handles, identified by its offset.
    Resize(Vec2),
    /// The rotate knob above the selection.
    Rotate,
}

/// The eight resize handle offsets, corners first rows then edges, matching
/// the adorner layout top-left to bottom-right.
pub fn resize_offsets() -> [Vec2; 8] {
    [
        Vec2::new(-0.5, -0.5),
        Vec2::new(0.0, -0.5),
        Vec2::new(0.5, -0.5),
        Vec2::new(-0.5, 0.0),
        Vec2::new(0.5, 0.0),
        Vec2::new(-0.5, 0.5),
        Vec2::new(0.0, 0.5),
        Vec2::new(0.5, 0.5),
    ]
}

fn resize_box(transform: &Transform, offset: Vec2) -> Rect {
    let half = HANDLE_SIZE / 2.0;
    let position = transform.position();
    let size = transform.size();
    let x = position.x - half + offset.x * (size.x + half);
    let y = position.y - half + offset.y * (size.y + half);
    Rect::new(x, y, x + HANDLE_SIZE, y + HANDLE_SIZE)
}

fn move_box(transform: &Transform) -> Rect {
    let position = transform.position();
    let size = transform.size();
    Rect::new(
        position.x - size.x / 2.0,
        position.y - size.y / 2.0,
        position.x + size.x / 2.0,
        position.y + size.y / 2.0,
    )
}

fn rotate_box(transform: &Transform) -> Rect {
    let half = HANDLE_SIZE / 2.0;
    let position = transform.position();
    let size = transform.size();
    let x = position.x - half;
    let y = position.y - half - size.y / 2.0 - ROTATE_HANDLE_OFFSET;
    Rect::new(x, y, x + HANDLE_SIZE, y + HANDLE_SIZE)
}

/// Find the handle under `point`. Resize boxes are tested first (they
/// straddle the body's edges), then the move body, then the rotate knob;
/// the first match wins. Resize handles on a constrained axis are not
/// offered and therefore cannot match.
pub fn hit_test_handles(
    transform: &Transform,
    point: Point,
    can_resize_x: bool,
    can_resize_y: bool,
) -> Option<HandleKind> {
    let local = rotate_about(point, transform.position(), transform.rotation().negate());

    for offset in resize_offsets() {
        let enabled = (offset.x == 0.0 || can_resize_x) && (offset.y == 0.0 || can_resize_y);
        if enabled && resize_box(transform, offset).contains(local) {
            return Some(HandleKind::Resize(offset));
        }
    }
    if move_box(transform).contains(local) {
        return Some(HandleKind::Move);
    }
    if rotate_box(transform).contains(local) {
        return Some(HandleKind::Rotate);
    }
    None
}
