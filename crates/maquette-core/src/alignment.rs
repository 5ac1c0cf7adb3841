//! Alignment engine: edge/center alignment and distribution of items.
//!
//! Alignment operates on each item's axis-aligned bounding box; rotation
//! only contributes through the aabb. Only the aligned axis changes.

use crate::diagram::Diagram;
use crate::item::ItemId;
use kurbo::{Rect, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignmentMode {
    HorizontalLeft,
    HorizontalCenter,
    HorizontalRight,
    VerticalTop,
    VerticalCenter,
    VerticalBottom,
    DistributeHorizontal,
    DistributeVertical,
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

/// Align or distribute the given items. Returns `None` when nothing moves
/// (empty or dangling target list, single-item distribution, or the items
/// already sit where the mode would put them).
pub fn align_items(diagram: &Diagram, mode: AlignmentMode, ids: &[ItemId]) -> Option<Diagram> {
    let targets: Vec<(ItemId, Rect)> = ids
        .iter()
        .filter_map(|id| diagram.bounds_of(*id).map(|bounds| (*id, bounds.aabb())))
        .collect();
    if targets.is_empty() {
        return None;
    }

    let shifts = match mode {
        AlignmentMode::HorizontalLeft => align_edges(&targets, Axis::X, Anchor::Min),
        AlignmentMode::HorizontalCenter => align_edges(&targets, Axis::X, Anchor::Center),
        AlignmentMode::HorizontalRight => align_edges(&targets, Axis::X, Anchor::Max),
        AlignmentMode::VerticalTop => align_edges(&targets, Axis::Y, Anchor::Min),
        AlignmentMode::VerticalCenter => align_edges(&targets, Axis::Y, Anchor::Center),
        AlignmentMode::VerticalBottom => align_edges(&targets, Axis::Y, Anchor::Max),
        AlignmentMode::DistributeHorizontal => distribute(&targets, Axis::X),
        AlignmentMode::DistributeVertical => distribute(&targets, Axis::Y),
    };

    apply_shifts(diagram, &shifts)
}

#[derive(Clone, Copy)]
enum Anchor {
    Min,
    Center,
    Max,
}

fn extent(rect: &Rect, axis: Axis) -> (f64, f64) {
    match axis {
        Axis::X => (rect.x0, rect.x1),
        Axis::Y => (rect.y0, rect.y1),
    }
}

/// Shift every item so its leading edge, center or trailing edge on `axis`
/// meets the group-wide extreme (or midpoint, for centering).
fn align_edges(targets: &[(ItemId, Rect)], axis: Axis, anchor: Anchor) -> Vec<(ItemId, Vec2)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for (_, rect) in targets {
        let (lo, hi) = extent(rect, axis);
        min = min.min(lo);
        max = max.max(hi);
    }

    targets
        .iter()
        .map(|(id, rect)| {
            let (lo, hi) = extent(rect, axis);
            let shift = match anchor {
                Anchor::Min => min - lo,
                Anchor::Max => max - hi,
                Anchor::Center => (min + max) / 2.0 - (lo + hi) / 2.0,
            };
            (*id, axis_delta(axis, shift))
        })
        .collect()
}

/// Even out the gaps between items on `axis`. The first and last item (by
/// current position) stay where they are.
fn distribute(targets: &[(ItemId, Rect)], axis: Axis) -> Vec<(ItemId, Vec2)> {
    if targets.len() < 2 {
        return Vec::new();
    }

    let mut sorted: Vec<&(ItemId, Rect)> = targets.iter().collect();
    sorted.sort_by(|a, b| {
        let ca = (extent(&a.1, axis).0 + extent(&a.1, axis).1) / 2.0;
        let cb = (extent(&b.1, axis).0 + extent(&b.1, axis).1) / 2.0;
        ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
    });

    let (first_lo, _) = extent(&sorted[0].1, axis);
    let (_, last_hi) = extent(&sorted[sorted.len() - 1].1, axis);
    let outer = last_hi - first_lo;
    let total: f64 = sorted
        .iter()
        .map(|(_, rect)| {
            let (lo, hi) = extent(rect, axis);
            hi - lo
        })
        .sum();
    let gap = (outer - total) / (sorted.len() - 1) as f64;

    let mut cursor = first_lo;
    let mut shifts = Vec::with_capacity(sorted.len());
    for (id, rect) in sorted {
        let (lo, hi) = extent(rect, axis);
        shifts.push((*id, axis_delta(axis, cursor - lo)));
        cursor += (hi - lo) + gap;
    }
    shifts
}

fn axis_delta(axis: Axis, shift: f64) -> Vec2 {
    match axis {
        Axis::X => Vec2::new(shift, 0.0),
        Axis::Y => Vec2::new(0.0, shift),
    }
}

/// Move every leaf shape under each shifted item. Zero shifts are skipped so
/// already-aligned selections leave the diagram untouched.
fn apply_shifts(diagram: &Diagram, shifts: &[(ItemId, Vec2)]) -> Option<Diagram> {
    let mut current = diagram.clone();
    let mut changed = false;
    for (id, delta) in shifts {
        if delta.x == 0.0 && delta.y == 0.0 {
            continue;
        }
        for leaf in diagram.leaf_items(*id) {
            if let Some(next) =
                current.update_item(leaf, |item| item.transform_with(|t| t.move_by(*delta)))
            {
                current = next;
                changed = true;
            }
        }
    }
    changed.then_some(current)
}
