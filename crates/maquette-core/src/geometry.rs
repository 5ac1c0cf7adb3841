//! Geometry kernel: rotations and oriented bounding transforms.
//!
//! Pure value math on top of [`kurbo`] primitives. Nothing in here holds
//! state; every operation returns a new value.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A rotation angle, normalized to `[0°, 360°)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    degrees: f64,
}

impl Rotation {
    /// The identity rotation.
    pub const ZERO: Rotation = Rotation { degrees: 0.0 };

    /// Create a rotation from degrees, normalized into `[0, 360)`.
    pub fn from_degrees(degrees: f64) -> Self {
        Self {
            degrees: degrees.rem_euclid(360.0),
        }
    }

    /// Create a rotation from radians.
    pub fn from_radians(radians: f64) -> Self {
        Self::from_degrees(radians.to_degrees())
    }

    /// The angle in degrees, in `[0, 360)`.
    pub fn degrees(self) -> f64 {
        self.degrees
    }

    /// The angle in radians.
    pub fn radians(self) -> f64 {
        self.degrees.to_radians()
    }

    pub fn cos(self) -> f64 {
        self.radians().cos()
    }

    pub fn sin(self) -> f64 {
        self.radians().sin()
    }

    /// The inverse rotation.
    pub fn negate(self) -> Self {
        Self::from_degrees(-self.degrees)
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::ZERO
    }
}

impl std::ops::Add for Rotation {
    type Output = Rotation;

    fn add(self, rhs: Rotation) -> Rotation {
        Rotation::from_degrees(self.degrees + rhs.degrees)
    }
}

impl std::ops::Sub for Rotation {
    type Output = Rotation;

    fn sub(self, rhs: Rotation) -> Rotation {
        Rotation::from_degrees(self.degrees - rhs.degrees)
    }
}

/// Rotate `point` around `center` by `rotation`.
pub fn rotate_about(point: Point, center: Point, rotation: Rotation) -> Point {
    let cos = rotation.cos();
    let sin = rotation.sin();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    Point::new(center.x + dx * cos - dy * sin, center.y + dx * sin + dy * cos)
}

/// Signed angle from `a` to `b` in degrees, in `(-180, 180]`.
/// Positive values rotate counter-clockwise in a y-down coordinate system.
pub fn angle_between(a: Vec2, b: Vec2) -> f64 {
    a.cross(b).atan2(a.dot(b)).to_degrees()
}

/// An oriented bounding box: center position, size and rotation.
///
/// Size components are never negative; operations that would produce a
/// negative extent clamp it to zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    position: Point,
    size: Vec2,
    rotation: Rotation,
}

impl Transform {
    pub const ZERO: Transform = Transform {
        position: Point::ZERO,
        size: Vec2::ZERO,
        rotation: Rotation::ZERO,
    };

    pub fn new(position: Point, size: Vec2, rotation: Rotation) -> Self {
        Self {
            position,
            size: Vec2::new(size.x.max(0.0), size.y.max(0.0)),
            rotation,
        }
    }

    /// An unrotated transform covering `rect`.
    pub fn from_rect(rect: Rect) -> Self {
        Self::new(
            rect.center(),
            Vec2::new(rect.width(), rect.height()),
            Rotation::ZERO,
        )
    }

    /// An unrotated transform of the given size, centered at the origin.
    pub fn with_size(width: f64, height: f64) -> Self {
        Self::new(Point::ZERO, Vec2::new(width, height), Rotation::ZERO)
    }

    /// Center position.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Width and height.
    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn move_to(self, position: Point) -> Self {
        Self { position, ..self }
    }

    pub fn move_by(self, delta: Vec2) -> Self {
        Self {
            position: self.position + delta,
            ..self
        }
    }

    pub fn resize_to(self, size: Vec2) -> Self {
        Self::new(self.position, size, self.rotation)
    }

    /// Grow by `delta_size` and shift the center by `delta_position` in one
    /// step. Resizing from an edge handle is a combination of both.
    pub fn resize_and_move_by(self, delta_size: Vec2, delta_position: Vec2) -> Self {
        Self::new(
            self.position + delta_position,
            self.size + delta_size,
            self.rotation,
        )
    }

    /// Rotate by `delta`; the result stays normalized to `[0, 360)`.
    pub fn rotate_by(self, delta: Rotation) -> Self {
        Self {
            rotation: self.rotation + delta,
            ..self
        }
    }

    /// The four corners in world coordinates, clockwise from top-left.
    pub fn corners(&self) -> [Point; 4] {
        let hw = self.size.x / 2.0;
        let hh = self.size.y / 2.0;
        [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)].map(|(dx, dy)| {
            rotate_about(
                Point::new(self.position.x + dx, self.position.y + dy),
                self.position,
                self.rotation,
            )
        })
    }

    /// Axis-aligned bounding box of the rotated rectangle.
    pub fn aabb(&self) -> Rect {
        let corners = self.corners();
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for p in corners {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Rect::new(min_x, min_y, max_x, max_y)
    }

    /// The minimal transform at `rotation` enclosing all of `transforms`.
    ///
    /// Every corner of every input is projected into the target-rotation
    /// frame, the extent is taken per axis in that frame, and the center is
    /// converted back to world coordinates. With a single input at its own
    /// rotation this returns that transform unchanged; with unrotated inputs
    /// at `Rotation::ZERO` it equals their common axis-aligned bounding box.
    pub fn from_transforms_and_rotation(transforms: &[Transform], rotation: Rotation) -> Self {
        if transforms.is_empty() {
            return Self::ZERO;
        }

        let negated = rotation.negate();
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for transform in transforms {
            for corner in transform.corners() {
                let p = rotate_about(corner, Point::ZERO, negated);
                min_x = min_x.min(p.x);
                min_y = min_y.min(p.y);
                max_x = max_x.max(p.x);
                max_y = max_y.max(p.y);
            }
        }

        let size = Vec2::new(max_x - min_x, max_y - min_y);
        let center = rotate_about(
            Point::new(min_x + size.x / 2.0, min_y + size.y / 2.0),
            Point::ZERO,
            rotation,
        );

        Self::new(center, size, rotation)
    }

    /// Map this transform from the frame of `old_bounds` into `new_bounds`.
    ///
    /// Used to carry every item of a multi-selection along when the
    /// selection's bounding transform is moved, resized or rotated. Exact
    /// whenever the per-axis size ratio is 1 (moves and rotations) or the
    /// item is axis-aligned relative to the bounds; in between, the two axis
    /// ratios are blended by the squared cosine/sine of the relative angle.
    pub fn transform_by_bounds(&self, old_bounds: &Transform, new_bounds: &Transform) -> Self {
        let ratio_x = if old_bounds.size.x.abs() < f64::EPSILON {
            1.0
        } else {
            new_bounds.size.x / old_bounds.size.x
        };
        let ratio_y = if old_bounds.size.y.abs() < f64::EPSILON {
            1.0
        } else {
            new_bounds.size.y / old_bounds.size.y
        };

        let local = rotate_about(self.position, old_bounds.position, old_bounds.rotation.negate());
        let scaled = Point::new(
            new_bounds.position.x + (local.x - old_bounds.position.x) * ratio_x,
            new_bounds.position.y + (local.y - old_bounds.position.y) * ratio_y,
        );
        let position = rotate_about(scaled, new_bounds.position, new_bounds.rotation);

        let relative = self.rotation - old_bounds.rotation;
        let c2 = relative.cos().powi(2);
        let s2 = relative.sin().powi(2);
        let size = Vec2::new(
            self.size.x * (c2 * ratio_x + s2 * ratio_y),
            self.size.y * (s2 * ratio_x + c2 * ratio_y),
        );

        let rotation = self.rotation + (new_bounds.rotation - old_bounds.rotation);

        Self::new(position, size, rotation)
    }
}
