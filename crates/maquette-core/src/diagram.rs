//! Diagram: an immutable tree of items plus the ordered z-sequence.
//!
//! Every mutating operation is copy-on-write and returns `Option<Diagram>`:
//! `None` means the operation did not apply (dangling id, no actual change)
//! and the caller keeps its existing reference. The persistent `im`
//! collections make the copies share storage with their predecessors.

use crate::geometry::{Rotation, Transform};
use crate::item::{DiagramItem, ItemId};
use im::{HashMap, HashSet, Vector};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for diagrams.
pub type DiagramId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    id: DiagramId,
    title: Option<String>,
    /// All items, including group children, keyed by id.
    items: HashMap<ItemId, DiagramItem>,
    /// Root-level z-order, back to front.
    item_ids: Vector<ItemId>,
    /// Diagram whose content is shown as a background layer.
    master: Option<DiagramId>,
    /// Selected item ids, per user.
    selected_ids: HashMap<String, HashSet<ItemId>>,
}

impl Diagram {
    pub fn new(id: DiagramId) -> Self {
        Self {
            id,
            title: None,
            items: HashMap::new(),
            item_ids: Vector::new(),
            master: None,
            selected_ids: HashMap::new(),
        }
    }

    pub fn id(&self) -> DiagramId {
        self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn master(&self) -> Option<DiagramId> {
        self.master
    }

    pub fn items(&self) -> &HashMap<ItemId, DiagramItem> {
        &self.items
    }

    /// Root-level paint/hit-test order, back to front.
    pub fn item_ids(&self) -> &Vector<ItemId> {
        &self.item_ids
    }

    pub fn item(&self, id: ItemId) -> Option<&DiagramItem> {
        self.items.get(&id)
    }

    /// Root items in z-order.
    pub fn root_items(&self) -> impl Iterator<Item = &DiagramItem> {
        self.item_ids.iter().filter_map(|id| self.items.get(id))
    }

    /// The selected ids of `user`, empty when the user has no selection.
    pub fn selected_ids(&self, user: &str) -> HashSet<ItemId> {
        self.selected_ids.get(user).cloned().unwrap_or_default()
    }

    pub fn rename(&self, title: &str) -> Option<Self> {
        if self.title.as_deref() == Some(title) {
            return None;
        }
        Some(Self {
            title: Some(title.to_string()),
            ..self.clone()
        })
    }

    pub fn set_master(&self, master: Option<DiagramId>) -> Option<Self> {
        if self.master == master {
            return None;
        }
        Some(Self {
            master,
            ..self.clone()
        })
    }

    /// Add a visual item, appending its id to the end of the z-order.
    /// Adding an id that already exists does not apply.
    pub fn add_visual(&self, item: DiagramItem) -> Option<Self> {
        let id = item.id();
        if self.items.contains_key(&id) {
            return None;
        }
        let mut next = self.clone();
        next.items.insert(id, item);
        next.item_ids.push_back(id);
        Some(next)
    }

    /// Replace `user`'s selection with the existing, unlocked subset of `ids`.
    pub fn select_items(&self, user: &str, ids: &[ItemId]) -> Option<Self> {
        let selection: HashSet<ItemId> = ids
            .iter()
            .copied()
            .filter(|id| self.items.get(id).is_some_and(|item| !item.is_locked()))
            .collect();

        if self.selected_ids(user) == selection {
            return None;
        }

        let mut next = self.clone();
        next.selected_ids.insert(user.to_string(), selection);
        Some(next)
    }

    /// Apply `f` to one item. Does not apply when the id is dangling or the
    /// result compares equal to the current item.
    pub fn update_item(&self, id: ItemId, f: impl FnOnce(&DiagramItem) -> DiagramItem) -> Option<Self> {
        let item = self.items.get(&id)?;
        let updated = f(item);
        if updated == *item {
            return None;
        }
        let mut next = self.clone();
        next.items.insert(id, updated);
        Some(next)
    }

    /// Apply `f` to every listed item that exists. Does not apply when no
    /// item actually changed.
    pub fn update_items(&self, ids: &[ItemId], f: impl Fn(&DiagramItem) -> DiagramItem) -> Option<Self> {
        let mut current = self.clone();
        let mut changed = false;
        for &id in ids {
            if let Some(next) = current.update_item(id, &f) {
                current = next;
                changed = true;
            }
        }
        changed.then_some(current)
    }

    /// Remove the given unlocked root items together with all their
    /// descendants, from the item mapping, the z-order and every selection.
    /// Group children cannot be removed directly; they go with their group
    /// or after an ungroup.
    pub fn remove_items(&self, ids: &[ItemId]) -> Option<Self> {
        let mut doomed: Vec<ItemId> = Vec::new();
        for &id in ids {
            if !self.item_ids.contains(&id) {
                continue;
            }
            if self.items.get(&id).is_some_and(|item| !item.is_locked()) {
                for descendant in self.descendants(id) {
                    if !doomed.contains(&descendant) {
                        doomed.push(descendant);
                    }
                }
            }
        }
        if doomed.is_empty() {
            return None;
        }

        let mut next = self.clone();
        for id in &doomed {
            next.items.remove(id);
        }
        next.item_ids = next
            .item_ids
            .iter()
            .copied()
            .filter(|id| !doomed.contains(id))
            .collect();
        next.selected_ids = next
            .selected_ids
            .iter()
            .map(|(user, ids)| {
                let remaining: HashSet<ItemId> =
                    ids.iter().copied().filter(|id| !doomed.contains(id)).collect();
                (user.clone(), remaining)
            })
            .collect();
        Some(next)
    }

    /// Move the listed root items, keeping their relative order, so that the
    /// block starts at `target_index` of the sequence without them.
    pub fn move_items(&self, ids: &[ItemId], target_index: usize) -> Option<Self> {
        let moved: Vec<ItemId> = self
            .item_ids
            .iter()
            .copied()
            .filter(|id| ids.contains(id))
            .collect();
        if moved.is_empty() {
            return None;
        }

        let mut reordered: Vector<ItemId> = self
            .item_ids
            .iter()
            .copied()
            .filter(|id| !ids.contains(id))
            .collect();
        let index = target_index.min(reordered.len());
        for (offset, id) in moved.iter().enumerate() {
            reordered.insert(index + offset, *id);
        }

        if reordered == self.item_ids {
            return None;
        }
        Some(Self {
            item_ids: reordered,
            ..self.clone()
        })
    }

    /// Group at least two root items under a new group id. The children keep
    /// their z-order among themselves; the group takes the z-position of the
    /// frontmost member.
    pub fn group(&self, group_id: ItemId, ids: &[ItemId]) -> Option<Self> {
        if self.items.contains_key(&group_id) {
            return None;
        }
        let members: Vector<ItemId> = self
            .item_ids
            .iter()
            .copied()
            .filter(|id| ids.contains(id))
            .collect();
        if members.len() < 2 {
            return None;
        }

        let front_index = self
            .item_ids
            .iter()
            .rposition(|id| members.contains(id))
            .unwrap_or(0);

        let mut reordered: Vector<ItemId> = self
            .item_ids
            .iter()
            .copied()
            .filter(|id| !members.contains(id))
            .collect();
        let insert_at = front_index
            .saturating_sub(members.len() - 1)
            .min(reordered.len());
        reordered.insert(insert_at, group_id);

        let mut next = self.clone();
        next.items.insert(group_id, DiagramItem::create_group(group_id, members));
        next.item_ids = reordered;
        Some(next)
    }

    /// Dissolve a group, reinserting its children at the group's z-position.
    pub fn ungroup(&self, group_id: ItemId) -> Option<Self> {
        let child_ids = self.items.get(&group_id)?.child_ids()?.clone();
        let position = self.item_ids.index_of(&group_id)?;

        let mut next = self.clone();
        next.items.remove(&group_id);
        next.item_ids.remove(position);
        for (offset, child_id) in child_ids.iter().enumerate() {
            next.item_ids.insert(position + offset, *child_id);
        }
        next.selected_ids = next
            .selected_ids
            .iter()
            .map(|(user, ids)| (user.clone(), ids.without(&group_id)))
            .collect();
        Some(next)
    }

    /// World bounds of an item. Shape bounds are their own transform; group
    /// bounds are recomputed from the children on every read.
    pub fn bounds_of(&self, id: ItemId) -> Option<Transform> {
        let item = self.items.get(&id)?;
        match item.shape_transform() {
            Some(transform) => Some(transform),
            None => {
                let child_bounds: Vec<Transform> = item
                    .child_ids()?
                    .iter()
                    .filter_map(|child| self.bounds_of(*child))
                    .collect();
                Some(Transform::from_transforms_and_rotation(
                    &child_bounds,
                    Rotation::ZERO,
                ))
            }
        }
    }

    /// The leaf shape ids under an item: the item itself for shapes, all
    /// transitive shape children for groups.
    pub fn leaf_items(&self, id: ItemId) -> Vec<ItemId> {
        match self.items.get(&id) {
            None => Vec::new(),
            Some(item) => match item.child_ids() {
                None => vec![id],
                Some(children) => children
                    .iter()
                    .flat_map(|child| self.leaf_items(*child))
                    .collect(),
            },
        }
    }

    /// The item and all its transitive children.
    fn descendants(&self, id: ItemId) -> Vec<ItemId> {
        let mut result = vec![id];
        if let Some(children) = self.items.get(&id).and_then(|item| item.child_ids()) {
            for child in children {
                result.extend(self.descendants(*child));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    fn id(n: u128) -> ItemId {
        Uuid::from_u128(n)
    }

    fn shape(n: u128, size: f64, x: f64, y: f64) -> DiagramItem {
        DiagramItem::create_shape(id(n), "Button", size, size)
            .transform_with(|t| t.move_to(Point::new(x, y)))
    }

    fn diagram_of_three() -> Diagram {
        Diagram::new(Uuid::from_u128(100))
            .add_visual(shape(1, 20.0, 100.0, 100.0))
            .unwrap()
            .add_visual(shape(2, 40.0, 200.0, 200.0))
            .unwrap()
            .add_visual(shape(3, 80.0, 300.0, 300.0))
            .unwrap()
    }

    #[test]
    fn add_visual_appends_to_z_order() {
        let diagram = diagram_of_three();
        assert_eq!(
            diagram.item_ids().iter().copied().collect::<Vec<_>>(),
            vec![id(1), id(2), id(3)]
        );
        assert_eq!(diagram.items().len(), 3);
    }

    #[test]
    fn add_visual_with_duplicate_id_does_not_apply() {
        let diagram = diagram_of_three();
        assert!(diagram.add_visual(shape(1, 10.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn update_item_with_dangling_id_does_not_apply() {
        let diagram = diagram_of_three();
        assert!(diagram
            .update_item(id(99), |item| item.set_locked(true))
            .is_none());
    }

    #[test]
    fn update_item_without_change_does_not_apply() {
        let diagram = diagram_of_three();
        assert!(diagram.update_item(id(1), |item| item.clone()).is_none());
    }

    #[test]
    fn move_items_reinserts_at_target_index() {
        let diagram = diagram_of_three();
        let moved = diagram.move_items(&[id(1)], 1).unwrap();
        assert_eq!(
            moved.item_ids().iter().copied().collect::<Vec<_>>(),
            vec![id(2), id(1), id(3)]
        );
    }

    #[test]
    fn move_items_without_effect_does_not_apply() {
        let diagram = diagram_of_three();
        assert!(diagram.move_items(&[id(3)], 5).is_none());
        assert!(diagram.move_items(&[id(99)], 0).is_none());
    }

    #[test]
    fn remove_items_drops_ids_and_selection_entries() {
        let diagram = diagram_of_three()
            .select_items("alice", &[id(1), id(2)])
            .unwrap();
        let removed = diagram.remove_items(&[id(1)]).unwrap();

        assert!(removed.item(id(1)).is_none());
        assert_eq!(removed.item_ids().len(), 2);
        assert!(!removed.selected_ids("alice").contains(&id(1)));
        assert!(removed.selected_ids("alice").contains(&id(2)));
    }

    #[test]
    fn remove_items_skips_locked_items() {
        let diagram = diagram_of_three()
            .update_item(id(1), |item| item.set_locked(true))
            .unwrap();
        assert!(diagram.remove_items(&[id(1)]).is_none());
    }

    #[test]
    fn select_items_drops_dangling_and_locked_ids() {
        let diagram = diagram_of_three()
            .update_item(id(2), |item| item.set_locked(true))
            .unwrap();
        let selected = diagram
            .select_items("alice", &[id(1), id(2), id(99)])
            .unwrap();

        let ids = selected.selected_ids("alice");
        assert!(ids.contains(&id(1)));
        assert!(!ids.contains(&id(2)));
        assert!(!ids.contains(&id(99)));
    }

    #[test]
    fn group_takes_frontmost_position_and_keeps_child_order() {
        let diagram = diagram_of_three();
        let grouped = diagram.group(id(10), &[id(1), id(3)]).unwrap();

        assert_eq!(
            grouped.item_ids().iter().copied().collect::<Vec<_>>(),
            vec![id(2), id(10)]
        );
        let group = grouped.item(id(10)).unwrap();
        assert_eq!(
            group.child_ids().unwrap().iter().copied().collect::<Vec<_>>(),
            vec![id(1), id(3)]
        );
        // Children stay resolvable through the mapping.
        assert!(grouped.item(id(1)).is_some());
    }

    #[test]
    fn group_requires_two_members() {
        let diagram = diagram_of_three();
        assert!(diagram.group(id(10), &[id(1)]).is_none());
        assert!(diagram.group(id(10), &[id(99)]).is_none());
    }

    #[test]
    fn ungroup_restores_children_at_group_position() {
        let diagram = diagram_of_three();
        let grouped = diagram.group(id(10), &[id(1), id(2)]).unwrap();
        let ungrouped = grouped.ungroup(id(10)).unwrap();

        assert_eq!(
            ungrouped.item_ids().iter().copied().collect::<Vec<_>>(),
            vec![id(1), id(2), id(3)]
        );
        assert!(ungrouped.item(id(10)).is_none());
    }

    #[test]
    fn group_bounds_are_computed_from_children() {
        let diagram = diagram_of_three();
        let grouped = diagram.group(id(10), &[id(1), id(2)]).unwrap();

        let bounds = grouped.bounds_of(id(10)).unwrap();
        let aabb = bounds.aabb();
        // Shape 1: 20x20 at (100, 100); shape 2: 40x40 at (200, 200).
        assert_eq!(aabb.x0, 90.0);
        assert_eq!(aabb.y0, 90.0);
        assert_eq!(aabb.x1, 220.0);
        assert_eq!(aabb.y1, 220.0);
    }

    #[test]
    fn leaf_items_descend_groups() {
        let diagram = diagram_of_three();
        let grouped = diagram.group(id(10), &[id(1), id(2)]).unwrap();

        assert_eq!(grouped.leaf_items(id(10)), vec![id(1), id(2)]);
        assert_eq!(grouped.leaf_items(id(3)), vec![id(3)]);
        assert!(grouped.leaf_items(id(99)).is_empty());
    }
}
