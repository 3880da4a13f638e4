//! Core geometric types shared by the session format and the scene adapter
//!
//! Session records store positions and rotations as plain four-component
//! float tuples so they round-trip through JSON without engine types.
//! `glam` types are used at the edges for the small amount of geometry the
//! recorder needs (distance and view angle from a camera to an avatar).

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Suffixes for the eight scalar components of a transform, in feature order
pub const TRANSFORM_COMPONENTS: [&str; 8] = [
    ".position.x",
    ".position.y",
    ".position.z",
    ".position.w",
    ".rotation.x",
    ".rotation.y",
    ".rotation.z",
    ".rotation.w",
];

/// Squared magnitude below which a direction is treated as zero
const DEGENERATE_SQR_MAGNITUDE: f32 = 1e-15;

/// Serializable four-component vector
///
/// Holds either a position (`w` unused, always 0) or a unit quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SVector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default)]
    pub w: f32,
}

impl SVector {
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn to_quat(self) -> Quat {
        Quat::from_xyzw(self.x, self.y, self.z, self.w)
    }
}

impl From<Vec3> for SVector {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z, 0.0)
    }
}

impl From<Quat> for SVector {
    fn from(q: Quat) -> Self {
        Self::new(q.x, q.y, q.z, q.w)
    }
}

/// Serializable position + rotation pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct STransform {
    pub position: SVector,
    pub rotation: SVector,
}

impl Default for STransform {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

impl STransform {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self {
            position: position.into(),
            rotation: rotation.into(),
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    pub fn position(&self) -> Vec3 {
        self.position.to_vec3()
    }

    pub fn rotation(&self) -> Quat {
        self.rotation.to_quat()
    }

    /// Forward (+Z) direction of this transform in world space
    pub fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::Z
    }

    /// The eight scalar components in [`TRANSFORM_COMPONENTS`] order
    pub fn components(&self) -> [f32; 8] {
        let p = self.position;
        let r = self.rotation;
        [p.x, p.y, p.z, p.w, r.x, r.y, r.z, r.w]
    }

    /// Distance and view angle (degrees) from this transform to `target`
    pub fn sight_to(&self, target: Vec3) -> SightLine {
        let direction = target - self.position();
        let distance = direction.length();
        let angle_degrees = if direction.length_squared() < DEGENERATE_SQR_MAGNITUDE {
            0.0
        } else {
            direction.angle_between(self.forward()).to_degrees()
        };
        SightLine {
            distance,
            angle_degrees,
        }
    }
}

/// Geometry between a camera and a point it may be looking at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SightLine {
    pub distance: f32,
    pub angle_degrees: f32,
}
