//! Editor actions and the reducer.
//!
//! `reduce` is a total function: an action that does not apply (dangling
//! diagram/item reference, no actual change) returns the identical
//! `Arc<EditorState>`, never an equal copy. The history layer relies on that
//! reference identity to decide whether a transition happened at all.

use crate::alignment::{align_items, AlignmentMode};
use crate::diagram::{Diagram, DiagramId};
use crate::editor::EditorState;
use crate::geometry::Transform;
use crate::item::{AppearanceValue, DiagramItem, ItemId, Rgba};
use crate::ordering::{order_items, OrderMode};
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditorAction {
    AddDiagram {
        diagram_id: DiagramId,
    },
    SelectDiagram {
        diagram_id: DiagramId,
    },
    RemoveDiagram {
        diagram_id: DiagramId,
    },
    RenameDiagram {
        diagram_id: DiagramId,
        title: String,
    },
    SetMaster {
        diagram_id: DiagramId,
        master: Option<DiagramId>,
    },
    ChangeSize {
        width: f64,
        height: f64,
    },
    ChangeColor {
        color: Rgba,
    },
    AddShape {
        diagram_id: DiagramId,
        shape_id: ItemId,
        renderer: String,
        width: f64,
        height: f64,
        position: Point,
    },
    SelectItems {
        diagram_id: DiagramId,
        user_id: String,
        item_ids: Vec<ItemId>,
    },
    RemoveItems {
        diagram_id: DiagramId,
        item_ids: Vec<ItemId>,
    },
    LockItems {
        diagram_id: DiagramId,
        item_ids: Vec<ItemId>,
    },
    UnlockItems {
        diagram_id: DiagramId,
        item_ids: Vec<ItemId>,
    },
    ChangeItemsAppearance {
        diagram_id: DiagramId,
        item_ids: Vec<ItemId>,
        key: String,
        value: AppearanceValue,
    },
    /// The commit an interaction gesture produces: map every targeted leaf
    /// shape from the old selection bounds into the new ones.
    TransformItems {
        diagram_id: DiagramId,
        item_ids: Vec<ItemId>,
        old_bounds: Transform,
        new_bounds: Transform,
    },
    AlignItems {
        mode: AlignmentMode,
        diagram_id: DiagramId,
        item_ids: Vec<ItemId>,
    },
    OrderItems {
        mode: OrderMode,
        diagram_id: DiagramId,
        item_ids: Vec<ItemId>,
    },
    MoveItems {
        diagram_id: DiagramId,
        item_ids: Vec<ItemId>,
        index: usize,
    },
    GroupItems {
        diagram_id: DiagramId,
        group_id: ItemId,
        item_ids: Vec<ItemId>,
    },
    UngroupItems {
        diagram_id: DiagramId,
        group_ids: Vec<ItemId>,
    },
}

impl EditorAction {
    /// An `AddDiagram` action, generating a fresh id when none is given.
    pub fn add_diagram(diagram_id: Option<DiagramId>) -> Self {
        Self::AddDiagram {
            diagram_id: diagram_id.unwrap_or_else(Uuid::new_v4),
        }
    }

    /// An `AddShape` action, generating a fresh shape id.
    pub fn add_shape(
        diagram_id: DiagramId,
        renderer: impl Into<String>,
        width: f64,
        height: f64,
        position: Point,
    ) -> Self {
        Self::AddShape {
            diagram_id,
            shape_id: Uuid::new_v4(),
            renderer: renderer.into(),
            width,
            height,
            position,
        }
    }
}

/// Apply `action` to `state`. Returns the identical `Arc` when the action
/// does not apply.
pub fn reduce(state: &Arc<EditorState>, action: &EditorAction) -> Arc<EditorState> {
    let next = apply(state, action);
    match next {
        Some(next) => Arc::new(next),
        None => {
            log::trace!("action did not apply: {action:?}");
            Arc::clone(state)
        }
    }
}

fn apply(state: &EditorState, action: &EditorAction) -> Option<EditorState> {
    match action {
        EditorAction::AddDiagram { diagram_id } => {
            let added = state.add_diagram(Diagram::new(*diagram_id))?;
            // The first diagram becomes the active one right away.
            if added.diagrams().len() == 1 {
                Some(added.select_diagram(*diagram_id).unwrap_or(added))
            } else {
                Some(added)
            }
        }
        EditorAction::SelectDiagram { diagram_id } => state.select_diagram(*diagram_id),
        EditorAction::RemoveDiagram { diagram_id } => state.remove_diagram(*diagram_id),
        EditorAction::RenameDiagram { diagram_id, title } => {
            state.update_diagram(*diagram_id, |diagram| diagram.rename(title))
        }
        EditorAction::SetMaster { diagram_id, master } => {
            state.update_diagram(*diagram_id, |diagram| diagram.set_master(*master))
        }
        EditorAction::ChangeSize { width, height } => state.change_size(Size::new(*width, *height)),
        EditorAction::ChangeColor { color } => state.change_color(*color),
        EditorAction::AddShape {
            diagram_id,
            shape_id,
            renderer,
            width,
            height,
            position,
        } => state.update_diagram(*diagram_id, |diagram| {
            let shape = DiagramItem::create_shape(*shape_id, renderer.clone(), *width, *height)
                .transform_with(|t| t.move_to(*position));
            diagram.add_visual(shape)
        }),
        EditorAction::SelectItems {
            diagram_id,
            user_id,
            item_ids,
        } => state.update_diagram(*diagram_id, |diagram| diagram.select_items(user_id, item_ids)),
        EditorAction::RemoveItems {
            diagram_id,
            item_ids,
        } => state.update_diagram(*diagram_id, |diagram| diagram.remove_items(item_ids)),
        EditorAction::LockItems {
            diagram_id,
            item_ids,
        } => state.update_diagram(*diagram_id, |diagram| {
            diagram.update_items(item_ids, |item| item.set_locked(true))
        }),
        EditorAction::UnlockItems {
            diagram_id,
            item_ids,
        } => state.update_diagram(*diagram_id, |diagram| {
            diagram.update_items(item_ids, |item| item.set_locked(false))
        }),
        EditorAction::ChangeItemsAppearance {
            diagram_id,
            item_ids,
            key,
            value,
        } => state.update_diagram(*diagram_id, |diagram| {
            diagram.update_items(item_ids, |item| item.set_appearance(key.clone(), value.clone()))
        }),
        EditorAction::TransformItems {
            diagram_id,
            item_ids,
            old_bounds,
            new_bounds,
        } => state.update_diagram(*diagram_id, |diagram| {
            let leaves: Vec<ItemId> = item_ids
                .iter()
                .filter(|id| diagram.item(**id).is_some_and(|item| !item.is_locked()))
                .flat_map(|id| diagram.leaf_items(*id))
                .collect();
            diagram.update_items(&leaves, |item| {
                item.transform_with(|t| t.transform_by_bounds(old_bounds, new_bounds))
            })
        }),
        EditorAction::AlignItems {
            mode,
            diagram_id,
            item_ids,
        } => state.update_diagram(*diagram_id, |diagram| align_items(diagram, *mode, item_ids)),
        EditorAction::OrderItems {
            mode,
            diagram_id,
            item_ids,
        } => state.update_diagram(*diagram_id, |diagram| order_items(diagram, *mode, item_ids)),
        EditorAction::MoveItems {
            diagram_id,
            item_ids,
            index,
        } => state.update_diagram(*diagram_id, |diagram| diagram.move_items(item_ids, *index)),
        EditorAction::GroupItems {
            diagram_id,
            group_id,
            item_ids,
        } => state.update_diagram(*diagram_id, |diagram| diagram.group(*group_id, item_ids)),
        EditorAction::UngroupItems {
            diagram_id,
            group_ids,
        } => state.update_diagram(*diagram_id, |diagram| {
            let mut current = diagram.clone();
            let mut changed = false;
            for id in group_ids {
                if let Some(next) = current.ungroup(*id) {
                    current = next;
                    changed = true;
                }
            }
            changed.then_some(current)
        }),
    }
}
