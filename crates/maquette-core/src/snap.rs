//! Snap manager: quantizes gesture deltas against the grid and the edges
//! and centers of sibling items.
//!
//! Matching is independent per axis: x and y may snap to different guides,
//! or not snap at all.

use crate::diagram::Diagram;
use crate::geometry::Transform;
use crate::item::ItemId;
use kurbo::Vec2;
use serde::{Deserialize, Serialize};

/// Grid cell size for `SnapMode::Grid`.
pub const GRID_SIZE: f64 = 20.0;
/// Distance within which a moving edge locks onto a sibling guide.
pub const SNAP_THRESHOLD: f64 = 10.0;
/// Rotation snap increment in degrees.
pub const ROTATION_INCREMENT: f64 = 15.0;

/// Which candidate source a gesture snaps against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SnapMode {
    /// Pass the raw delta through unchanged.
    None,
    /// Quantize to the fixed grid / angle increment.
    Grid,
    /// Search sibling edges and centers within the tolerance.
    #[default]
    Shapes,
}

/// What a single axis snapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapKind {
    #[default]
    None,
    Grid,
    /// A sibling's left (x) or top (y) edge.
    LeftTop,
    /// A sibling's center.
    Center,
    /// A sibling's right (x) or bottom (y) edge.
    RightBottom,
}

/// Quantized delta plus the per-axis guides that produced it. The values
/// are the guide coordinates, for overlay rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SnapResult {
    pub delta: Vec2,
    pub snap_x: SnapKind,
    pub snap_y: SnapKind,
    pub value_x: Option<f64>,
    pub value_y: Option<f64>,
}

impl SnapResult {
    fn raw(delta: Vec2) -> Self {
        Self {
            delta,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct GuideLine {
    value: f64,
    kind: SnapKind,
}

/// Snap candidate source for one diagram, prepared once per gesture.
#[derive(Debug, Clone)]
pub struct SnapManager {
    grid_size: f64,
    x_lines: Vec<GuideLine>,
    y_lines: Vec<GuideLine>,
}

impl Default for SnapManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapManager {
    pub fn new() -> Self {
        Self {
            grid_size: GRID_SIZE,
            x_lines: Vec::new(),
            y_lines: Vec::new(),
        }
    }

    /// Collect guide lines from every root item not in `excluded` (the items
    /// being manipulated must not snap against themselves).
    pub fn prepare(&mut self, diagram: &Diagram, excluded: &[ItemId]) {
        self.x_lines.clear();
        self.y_lines.clear();

        for id in diagram.item_ids() {
            if excluded.contains(id) {
                continue;
            }
            let Some(bounds) = diagram.bounds_of(*id) else {
                continue;
            };
            let aabb = bounds.aabb();
            self.x_lines.push(GuideLine {
                value: aabb.x0,
                kind: SnapKind::LeftTop,
            });
            self.x_lines.push(GuideLine {
                value: aabb.center().x,
                kind: SnapKind::Center,
            });
            self.x_lines.push(GuideLine {
                value: aabb.x1,
                kind: SnapKind::RightBottom,
            });
            self.y_lines.push(GuideLine {
                value: aabb.y0,
                kind: SnapKind::LeftTop,
            });
            self.y_lines.push(GuideLine {
                value: aabb.center().y,
                kind: SnapKind::Center,
            });
            self.y_lines.push(GuideLine {
                value: aabb.y1,
                kind: SnapKind::RightBottom,
            });
        }
    }

    /// Snap a move delta.
    pub fn snap_moving(&self, start: &Transform, delta: Vec2, mode: SnapMode) -> SnapResult {
        let aabb = start.aabb();
        match mode {
            SnapMode::None => SnapResult::raw(delta),
            SnapMode::Grid => {
                let left = round_to(aabb.x0 + delta.x, self.grid_size);
                let top = round_to(aabb.y0 + delta.y, self.grid_size);
                SnapResult {
                    delta: Vec2::new(left - aabb.x0, top - aabb.y0),
                    snap_x: SnapKind::Grid,
                    snap_y: SnapKind::Grid,
                    value_x: Some(left),
                    value_y: Some(top),
                }
            }
            SnapMode::Shapes => {
                let center = aabb.center();
                let x = best_match(
                    &self.x_lines,
                    &[aabb.x0 + delta.x, center.x + delta.x, aabb.x1 + delta.x],
                );
                let y = best_match(
                    &self.y_lines,
                    &[aabb.y0 + delta.y, center.y + delta.y, aabb.y1 + delta.y],
                );
                SnapResult {
                    delta: Vec2::new(delta.x + x.adjust, delta.y + y.adjust),
                    snap_x: x.kind,
                    snap_y: y.kind,
                    value_x: x.value,
                    value_y: y.value,
                }
            }
        }
    }

    /// Snap a resize delta (a size delta in the shape's local frame). The
    /// handle offsets say which edges are moving; an axis with offset 0 is
    /// untouched. Sibling matching is only meaningful for unrotated shapes;
    /// rotated ones fall back to the raw delta in `Shapes` mode.
    pub fn snap_resizing(
        &self,
        start: &Transform,
        delta: Vec2,
        mode: SnapMode,
        offset_x: f64,
        offset_y: f64,
    ) -> SnapResult {
        match mode {
            SnapMode::None => SnapResult::raw(delta),
            SnapMode::Grid => {
                let size = start.size();
                let mut result = SnapResult::raw(delta);
                if offset_x != 0.0 {
                    let snapped = round_to(size.x + delta.x, self.grid_size);
                    result.delta.x = snapped - size.x;
                    result.snap_x = SnapKind::Grid;
                }
                if offset_y != 0.0 {
                    let snapped = round_to(size.y + delta.y, self.grid_size);
                    result.delta.y = snapped - size.y;
                    result.snap_y = SnapKind::Grid;
                }
                result
            }
            SnapMode::Shapes => {
                if start.rotation().degrees() != 0.0 {
                    return SnapResult::raw(delta);
                }
                let aabb = start.aabb();
                let mut result = SnapResult::raw(delta);
                if offset_x != 0.0 {
                    // The moving vertical edge: right for positive offsets,
                    // left for negative ones (where growth moves it left).
                    let edge = if offset_x > 0.0 {
                        aabb.x1 + delta.x
                    } else {
                        aabb.x0 - delta.x
                    };
                    let snap = best_match(&self.x_lines, &[edge]);
                    if snap.kind != SnapKind::None {
                        result.delta.x += if offset_x > 0.0 { snap.adjust } else { -snap.adjust };
                        result.snap_x = snap.kind;
                        result.value_x = snap.value;
                    }
                }
                if offset_y != 0.0 {
                    let edge = if offset_y > 0.0 {
                        aabb.y1 + delta.y
                    } else {
                        aabb.y0 - delta.y
                    };
                    let snap = best_match(&self.y_lines, &[edge]);
                    if snap.kind != SnapKind::None {
                        result.delta.y += if offset_y > 0.0 { snap.adjust } else { -snap.adjust };
                        result.snap_y = snap.kind;
                        result.value_y = snap.value;
                    }
                }
                result
            }
        }
    }

    /// Snap a rotation delta in degrees.
    pub fn snap_rotating(&self, _start: &Transform, delta: f64, mode: SnapMode) -> f64 {
        match mode {
            SnapMode::None => delta,
            // Sibling edges carry no angle information; both snapping modes
            // round to the fixed increment.
            SnapMode::Grid | SnapMode::Shapes => round_to(delta, ROTATION_INCREMENT),
        }
    }
}

fn round_to(value: f64, step: f64) -> f64 {
    (value / step).round() * step
}

struct AxisMatch {
    adjust: f64,
    kind: SnapKind,
    value: Option<f64>,
}

/// The nearest guide within the threshold over all (guide, own edge) pairs.
fn best_match(lines: &[GuideLine], own: &[f64]) -> AxisMatch {
    let mut best = AxisMatch {
        adjust: 0.0,
        kind: SnapKind::None,
        value: None,
    };
    let mut best_distance = SNAP_THRESHOLD;

    for line in lines {
        for &edge in own {
            let distance = (line.value - edge).abs();
            if distance < best_distance {
                best_distance = distance;
                best = AxisMatch {
                    adjust: line.value - edge,
                    kind: line.kind,
                    value: Some(line.value),
                };
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::DiagramItem;
    use kurbo::Point;
    use uuid::Uuid;

    fn id(n: u128) -> ItemId {
        Uuid::from_u128(n)
    }

    /// A 40x40 sibling at (200, 200) next to the 20x20 shape being moved.
    fn prepared() -> (SnapManager, Transform) {
        let diagram = Diagram::new(Uuid::from_u128(100))
            .add_visual(
                DiagramItem::create_shape(id(1), "Button", 20.0, 20.0)
                    .transform_with(|t| t.move_to(Point::new(100.0, 100.0))),
            )
            .unwrap()
            .add_visual(
                DiagramItem::create_shape(id(2), "Button", 40.0, 40.0)
                    .transform_with(|t| t.move_to(Point::new(200.0, 200.0))),
            )
            .unwrap();

        let mut snap = SnapManager::new();
        snap.prepare(&diagram, &[id(1)]);
        let moving = diagram.bounds_of(id(1)).unwrap();
        (snap, moving)
    }

    #[test]
    fn none_passes_the_raw_delta_through() {
        let (snap, moving) = prepared();
        let result = snap.snap_moving(&moving, Vec2::new(3.0, 7.0), SnapMode::None);
        assert_eq!(result.delta, Vec2::new(3.0, 7.0));
        assert_eq!(result.snap_x, SnapKind::None);
        assert_eq!(result.snap_y, SnapKind::None);
    }

    #[test]
    fn grid_quantizes_the_moved_corner() {
        let (snap, moving) = prepared();
        // Left edge starts at 90; a delta of 3 puts it at 93, which rounds
        // to the grid line at 100.
        let result = snap.snap_moving(&moving, Vec2::new(3.0, 3.0), SnapMode::Grid);
        assert_eq!(result.delta, Vec2::new(10.0, 10.0));
        assert_eq!(result.snap_x, SnapKind::Grid);
        assert_eq!(result.value_x, Some(100.0));
    }

    #[test]
    fn shapes_snap_matches_axes_independently() {
        let (snap, moving) = prepared();
        // Moving right by 74 puts the moving right edge at 184, within
        // tolerance of the sibling's left edge at 180. The y delta of 40
        // leaves every y edge more than the threshold away from a guide.
        let result = snap.snap_moving(&moving, Vec2::new(74.0, 40.0), SnapMode::Shapes);
        assert_eq!(result.delta.x, 70.0);
        assert_eq!(result.snap_x, SnapKind::LeftTop);
        assert_eq!(result.value_x, Some(180.0));
        assert_eq!(result.delta.y, 40.0);
        assert_eq!(result.snap_y, SnapKind::None);
    }

    #[test]
    fn shapes_snap_prefers_the_nearest_guide() {
        let (snap, moving) = prepared();
        // Moving right by 96 puts the moving center at 196, close to the
        // sibling center at 200; the snapped center wins over farther edges.
        let result = snap.snap_moving(&moving, Vec2::new(96.0, 0.0), SnapMode::Shapes);
        assert_eq!(result.snap_x, SnapKind::Center);
        assert_eq!(result.value_x, Some(200.0));
        assert_eq!(result.delta.x, 100.0);
    }

    #[test]
    fn grid_resize_quantizes_the_size() {
        let (snap, moving) = prepared();
        // Width 20 plus a delta of 7 rounds to 20; plus 13 rounds to 40.
        let result = snap.snap_resizing(&moving, Vec2::new(7.0, 0.0), SnapMode::Grid, 0.5, 0.0);
        assert_eq!(result.delta.x, 0.0);
        assert_eq!(result.delta.y, 0.0);

        let result = snap.snap_resizing(&moving, Vec2::new(13.0, 0.0), SnapMode::Grid, 0.5, 0.0);
        assert_eq!(result.delta.x, 20.0);
        assert_eq!(result.snap_x, SnapKind::Grid);
    }

    #[test]
    fn shapes_resize_lands_the_moving_edge_on_a_guide() {
        let (snap, moving) = prepared();
        // Growing right by 68 puts the right edge at 178, within tolerance
        // of the sibling's left edge at 180.
        let result = snap.snap_resizing(&moving, Vec2::new(68.0, 0.0), SnapMode::Shapes, 0.5, 0.0);
        assert_eq!(result.delta.x, 70.0);
        assert_eq!(result.snap_x, SnapKind::LeftTop);
        assert_eq!(result.value_x, Some(180.0));
    }

    #[test]
    fn rotation_snaps_to_the_increment() {
        let (snap, moving) = prepared();
        assert_eq!(snap.snap_rotating(&moving, 22.0, SnapMode::None), 22.0);
        assert_eq!(snap.snap_rotating(&moving, 22.0, SnapMode::Grid), 15.0);
        assert_eq!(snap.snap_rotating(&moving, 23.0, SnapMode::Shapes), 30.0);
        assert_eq!(snap.snap_rotating(&moving, -7.0, SnapMode::Grid), 0.0);
    }
}
