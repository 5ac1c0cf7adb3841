//! Diagram items: shapes, groups, appearance and size constraints.

use crate::geometry::Transform;
use im::{HashMap, Vector};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for items within a diagram.
pub type ItemId = Uuid;

/// Appearance key for the item label text.
pub const APPEARANCE_TEXT: &str = "TEXT";
/// Appearance key for the label font size.
pub const APPEARANCE_FONT_SIZE: &str = "FONT_SIZE";
/// Appearance key for the foreground color.
pub const APPEARANCE_FOREGROUND: &str = "FOREGROUND_COLOR";
/// Appearance key for the background color.
pub const APPEARANCE_BACKGROUND: &str = "BACKGROUND_COLOR";
/// Appearance key for the stroke thickness.
pub const APPEARANCE_STROKE_THICKNESS: &str = "STROKE_THICKNESS";

/// Serializable RGBA8 color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// A single appearance property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AppearanceValue {
    Bool(bool),
    Number(f64),
    Color(Rgba),
    Text(String),
}

impl From<bool> for AppearanceValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for AppearanceValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Rgba> for AppearanceValue {
    fn from(value: Rgba) -> Self {
        Self::Color(value)
    }
}

impl From<&str> for AppearanceValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Appearance mapping: property key to value.
pub type Appearance = HashMap<String, AppearanceValue>;

/// Per-axis resize permission. A fixed axis keeps its size through resize
/// gestures; the corresponding handles are not offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SizeConstraint {
    pub fixed_x: bool,
    pub fixed_y: bool,
}

impl SizeConstraint {
    pub fn fixed() -> Self {
        Self {
            fixed_x: true,
            fixed_y: true,
        }
    }

    pub fn fixed_width() -> Self {
        Self {
            fixed_x: true,
            fixed_y: false,
        }
    }

    pub fn fixed_height() -> Self {
        Self {
            fixed_x: false,
            fixed_y: true,
        }
    }
}

/// What an item is: a rendered shape with its own bounds, or a group whose
/// bounds are computed from its children on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemBody {
    Shape {
        /// Renderer key, resolved by the (external) shape plugin registry.
        renderer: String,
        transform: Transform,
    },
    Group {
        /// Child item ids, back to front.
        child_ids: Vector<ItemId>,
    },
}

/// One item of a diagram. Items are values: every mutation returns a new
/// item, and items are referenced only by id from their owning diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramItem {
    id: ItemId,
    body: ItemBody,
    appearance: Appearance,
    constraint: Option<SizeConstraint>,
    locked: bool,
}

impl DiagramItem {
    /// Create a shape item of the given renderer and size, centered at the
    /// origin.
    pub fn create_shape(id: ItemId, renderer: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id,
            body: ItemBody::Shape {
                renderer: renderer.into(),
                transform: Transform::with_size(width, height),
            },
            appearance: Appearance::new(),
            constraint: None,
            locked: false,
        }
    }

    /// Create a group item over the given children.
    pub fn create_group(id: ItemId, child_ids: Vector<ItemId>) -> Self {
        Self {
            id,
            body: ItemBody::Group { child_ids },
            appearance: Appearance::new(),
            constraint: None,
            locked: false,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn body(&self) -> &ItemBody {
        &self.body
    }

    pub fn is_group(&self) -> bool {
        matches!(self.body, ItemBody::Group { .. })
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Renderer key, for shape items.
    pub fn renderer(&self) -> Option<&str> {
        match &self.body {
            ItemBody::Shape { renderer, .. } => Some(renderer),
            ItemBody::Group { .. } => None,
        }
    }

    /// Child ids, for group items.
    pub fn child_ids(&self) -> Option<&Vector<ItemId>> {
        match &self.body {
            ItemBody::Group { child_ids } => Some(child_ids),
            ItemBody::Shape { .. } => None,
        }
    }

    /// Own transform, for shape items. Group bounds are computed from their
    /// children by the owning diagram.
    pub fn shape_transform(&self) -> Option<Transform> {
        match &self.body {
            ItemBody::Shape { transform, .. } => Some(*transform),
            ItemBody::Group { .. } => None,
        }
    }

    pub fn appearance(&self) -> &Appearance {
        &self.appearance
    }

    pub fn constraint(&self) -> Option<SizeConstraint> {
        self.constraint
    }

    /// Whether resize handles along the x axis apply to this item.
    pub fn resizable_x(&self) -> bool {
        self.constraint.map(|c| !c.fixed_x).unwrap_or(true)
    }

    /// Whether resize handles along the y axis apply to this item.
    pub fn resizable_y(&self) -> bool {
        self.constraint.map(|c| !c.fixed_y).unwrap_or(true)
    }

    pub fn with_constraint(self, constraint: SizeConstraint) -> Self {
        Self {
            constraint: Some(constraint),
            ..self
        }
    }

    pub fn set_locked(&self, locked: bool) -> Self {
        Self {
            locked,
            ..self.clone()
        }
    }

    /// Set one appearance key, returning the updated item.
    pub fn set_appearance(&self, key: impl Into<String>, value: impl Into<AppearanceValue>) -> Self {
        Self {
            appearance: self.appearance.update(key.into(), value.into()),
            ..self.clone()
        }
    }

    /// Apply `f` to the shape transform, returning the updated item.
    /// Groups are returned unchanged; their bounds follow their children.
    pub fn transform_with(&self, f: impl FnOnce(Transform) -> Transform) -> Self {
        match &self.body {
            ItemBody::Shape { renderer, transform } => Self {
                body: ItemBody::Shape {
                    renderer: renderer.clone(),
                    transform: f(*transform),
                },
                ..self.clone()
            },
            ItemBody::Group { .. } => self.clone(),
        }
    }
}
