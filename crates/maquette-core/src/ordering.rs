//! Ordering engine: z-order changes for selections of items.

use crate::diagram::Diagram;
use crate::item::ItemId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderMode {
    BringForwards,
    BringToFront,
    SendBackwards,
    SendToBack,
}

/// Reorder the given items. The moved block keeps its internal order; the
/// target index is derived from the backmost moved item (one past it for
/// forwards, one before it for backwards) or the ends of the sequence.
/// Returns `None` when nothing is moved or the order is unchanged.
pub fn order_items(diagram: &Diagram, mode: OrderMode, ids: &[ItemId]) -> Option<Diagram> {
    let first_index = diagram.item_ids().iter().position(|id| ids.contains(id))?;

    let target_index = match mode {
        OrderMode::BringToFront => diagram.item_ids().len(),
        OrderMode::SendToBack => 0,
        OrderMode::BringForwards => first_index + 1,
        OrderMode::SendBackwards => first_index.saturating_sub(1),
    };

    diagram.move_items(ids, target_index)
}
