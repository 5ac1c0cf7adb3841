//! Editor state: the collection of diagrams plus global canvas settings.

use crate::diagram::{Diagram, DiagramId};
use crate::item::Rgba;
use im::HashMap;
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Default canvas size of a new editor.
pub const DEFAULT_CANVAS_SIZE: Size = Size::new(1000.0, 1000.0);

/// The whole editable state. A value: every operation returns a new state,
/// or `None` when it does not apply, in which case callers keep their
/// existing reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorState {
    diagrams: HashMap<DiagramId, Diagram>,
    selected_diagram_id: Option<DiagramId>,
    size: Size,
    color: Rgba,
}

impl EditorState {
    pub fn empty() -> Self {
        Self {
            diagrams: HashMap::new(),
            selected_diagram_id: None,
            size: DEFAULT_CANVAS_SIZE,
            color: Rgba::white(),
        }
    }

    pub fn diagrams(&self) -> &HashMap<DiagramId, Diagram> {
        &self.diagrams
    }

    pub fn diagram(&self, id: DiagramId) -> Option<&Diagram> {
        self.diagrams.get(&id)
    }

    pub fn selected_diagram_id(&self) -> Option<DiagramId> {
        self.selected_diagram_id
    }

    pub fn selected_diagram(&self) -> Option<&Diagram> {
        self.selected_diagram_id.and_then(|id| self.diagrams.get(&id))
    }

    /// Canvas size.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Canvas background color.
    pub fn color(&self) -> Rgba {
        self.color
    }

    /// Add a diagram. Does not apply when the id is already taken.
    pub fn add_diagram(&self, diagram: Diagram) -> Option<Self> {
        if self.diagrams.contains_key(&diagram.id()) {
            return None;
        }
        let mut next = self.clone();
        next.diagrams.insert(diagram.id(), diagram);
        Some(next)
    }

    /// Make a diagram the active one. Does not apply when the id is dangling
    /// or the diagram is already active.
    pub fn select_diagram(&self, id: DiagramId) -> Option<Self> {
        if !self.diagrams.contains_key(&id) || self.selected_diagram_id == Some(id) {
            return None;
        }
        Some(Self {
            selected_diagram_id: Some(id),
            ..self.clone()
        })
    }

    /// Remove a diagram; clears the active reference when it pointed at it.
    pub fn remove_diagram(&self, id: DiagramId) -> Option<Self> {
        if !self.diagrams.contains_key(&id) {
            return None;
        }
        let mut next = self.clone();
        next.diagrams.remove(&id);
        if next.selected_diagram_id == Some(id) {
            next.selected_diagram_id = None;
        }
        Some(next)
    }

    /// Resolve a diagram and replace it with `f`'s result. Does not apply
    /// when the id is dangling or `f` itself does not apply.
    pub fn update_diagram(
        &self,
        id: DiagramId,
        f: impl FnOnce(&Diagram) -> Option<Diagram>,
    ) -> Option<Self> {
        let diagram = self.diagrams.get(&id)?;
        let updated = f(diagram)?;
        let mut next = self.clone();
        next.diagrams.insert(id, updated);
        Some(next)
    }

    pub fn change_size(&self, size: Size) -> Option<Self> {
        if self.size == size {
            return None;
        }
        Some(Self {
            size,
            ..self.clone()
        })
    }

    pub fn change_color(&self, color: Rgba) -> Option<Self> {
        if self.color == color {
            return None;
        }
        Some(Self {
            color,
            ..self.clone()
        })
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::empty()
    }
}
