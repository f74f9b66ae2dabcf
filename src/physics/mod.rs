//! Rigid-body capability, collision groups and the backends behind it.
//!
//! The scene never talks to a physics engine directly. It describes bodies
//! with [`RigidBodyDesc`], drives them through [`PhysicsBackend`] and reacts
//! to the [`ContactForceEvent`]s a step produces.
//!
//! # Collision layers
//!
//! | Group | Member of | Collides with |
//! |-------|-----------|---------------|
//! | [`InteractionGroups::ROCKET`] | rocket | rocks |
//! | [`InteractionGroups::ROCKS`] | rocks | rocket, rocks, bounds |
//! | [`InteractionGroups::BOUNDS`] | bounds | rocks |
//!
//! The rocket flies through the arena walls; rocks bounce off them.
//!
//! # Backends
//!
//! - [`HeadlessPhysics`]: ballistic motion and caller-queued contacts, for
//!   tests and engine-free runs
//! - `RapierPhysics` (feature `rapier`): full dynamics on `rapier3d`

use crate::geometry::ConvexHull;
use glam::{BVec3, Quat, Vec3};
use std::f32::consts::PI;
use std::fmt;
use std::sync::Arc;

mod headless;
#[cfg(feature = "rapier")]
mod rapier;

pub use headless::HeadlessPhysics;
#[cfg(feature = "rapier")]
pub use rapier::RapierPhysics;

/// Stable identity of a body across the physics and render sides.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
pub struct BodyKey(String);

impl BodyKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of a fragment: this key with `suffix` appended.
    pub fn child(&self, suffix: &str) -> Self {
        Self(format!("{}{}", self.0, suffix))
    }
}

impl fmt::Display for BodyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BodyKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for BodyKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ========== Collision groups ==========

pub const LAYER_ROCKET: u32 = 1 << 0;
pub const LAYER_ROCKS: u32 = 1 << 1;
pub const LAYER_BOUNDS: u32 = 1 << 2;

/// Membership and filter bit masks of a collider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InteractionGroups {
    pub memberships: u32,
    pub filter: u32,
}

impl InteractionGroups {
    pub const ALL: Self = Self::new(u32::MAX, u32::MAX);
    pub const NONE: Self = Self::new(0, 0);
    pub const ROCKET: Self = Self::new(LAYER_ROCKET, LAYER_ROCKS);
    pub const ROCKS: Self = Self::new(LAYER_ROCKS, LAYER_ROCKET | LAYER_ROCKS | LAYER_BOUNDS);
    pub const BOUNDS: Self = Self::new(LAYER_BOUNDS, LAYER_ROCKS);

    pub const fn new(memberships: u32, filter: u32) -> Self {
        Self { memberships, filter }
    }

    /// Two colliders interact only if each one is a member of a layer the
    /// other one filters for.
    pub const fn interacts_with(self, other: Self) -> bool {
        (self.memberships & other.filter) != 0 && (other.memberships & self.filter) != 0
    }
}

impl Default for InteractionGroups {
    fn default() -> Self {
        Self::ALL
    }
}

// ========== Body descriptions ==========

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BodyKind {
    #[default]
    Dynamic,
    Fixed,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ColliderShape {
    /// Hull geometry, uniformly scaled.
    ConvexHull { hull: Arc<ConvexHull>, scale: f32 },
    Cuboid { half_extents: Vec3 },
    /// Y-aligned capsule.
    Capsule { half_height: f32, radius: f32 },
    /// Y-aligned cone with rounded edges.
    RoundCone { half_height: f32, radius: f32, border_radius: f32 },
}

impl ColliderShape {
    /// Enclosed volume, used to derive mass from density.
    pub fn volume(&self) -> f32 {
        match self {
            ColliderShape::ConvexHull { hull, scale } => hull.volume() * scale.powi(3),
            ColliderShape::Cuboid { half_extents } => 8.0 * half_extents.x * half_extents.y * half_extents.z,
            ColliderShape::Capsule { half_height, radius } => {
                PI * radius * radius * (2.0 * half_height) + 4.0 / 3.0 * PI * radius.powi(3)
            }
            ColliderShape::RoundCone { half_height, radius, border_radius } => {
                let r = radius + border_radius;
                PI * r * r * (2.0 * half_height + 2.0 * border_radius) / 3.0
            }
        }
    }

    /// Center of the shape's volume in its local frame.
    pub(crate) fn local_centroid(&self) -> Vec3 {
        match self {
            ColliderShape::ConvexHull { hull, scale } => hull.centroid() * *scale,
            _ => Vec3::ZERO,
        }
    }
}

/// A shape attached to a body at a local offset.
#[derive(Clone, Debug, PartialEq)]
pub struct Collider {
    pub shape: ColliderShape,
    pub offset: Vec3,
}

impl Collider {
    pub fn new(shape: ColliderShape) -> Self {
        Self { shape, offset: Vec3::ZERO }
    }

    pub fn hull(hull: Arc<ConvexHull>, scale: f32) -> Self {
        Self::new(ColliderShape::ConvexHull { hull, scale })
    }

    pub fn cuboid(half_extents: Vec3) -> Self {
        Self::new(ColliderShape::Cuboid { half_extents })
    }

    pub fn capsule(half_height: f32, radius: f32) -> Self {
        Self::new(ColliderShape::Capsule { half_height, radius })
    }

    pub fn round_cone(half_height: f32, radius: f32, border_radius: f32) -> Self {
        Self::new(ColliderShape::RoundCone {
            half_height,
            radius,
            border_radius,
        })
    }

    pub fn offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }
}

/// Everything a backend needs to create a body.
#[derive(Clone, Debug, PartialEq)]
pub struct RigidBodyDesc {
    pub kind: BodyKind,
    pub position: Vec3,
    pub rotation: Quat,
    pub linvel: Vec3,
    pub angvel: Vec3,
    pub groups: InteractionGroups,
    pub density: f32,
    pub restitution: f32,
    pub friction: f32,
    pub gravity_scale: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub enabled_translations: BVec3,
    pub enabled_rotations: BVec3,
    pub colliders: Vec<Collider>,
}

impl Default for RigidBodyDesc {
    fn default() -> Self {
        Self {
            kind: BodyKind::Dynamic,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            linvel: Vec3::ZERO,
            angvel: Vec3::ZERO,
            groups: InteractionGroups::ALL,
            density: 1.0,
            restitution: 0.0,
            friction: 0.5,
            gravity_scale: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            enabled_translations: BVec3::TRUE,
            enabled_rotations: BVec3::TRUE,
            colliders: Vec::new(),
        }
    }
}

impl RigidBodyDesc {
    pub fn dynamic() -> Self {
        Self::default()
    }

    pub fn fixed() -> Self {
        Self {
            kind: BodyKind::Fixed,
            ..Self::default()
        }
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn linvel(mut self, v: Vec3) -> Self {
        self.linvel = v;
        self
    }

    pub fn angvel(mut self, w: Vec3) -> Self {
        self.angvel = w;
        self
    }

    pub fn groups(mut self, groups: InteractionGroups) -> Self {
        self.groups = groups;
        self
    }

    pub fn density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn enabled_translations(mut self, x: bool, y: bool, z: bool) -> Self {
        self.enabled_translations = BVec3::new(x, y, z);
        self
    }

    pub fn enabled_rotations(mut self, x: bool, y: bool, z: bool) -> Self {
        self.enabled_rotations = BVec3::new(x, y, z);
        self
    }

    pub fn collider(mut self, collider: Collider) -> Self {
        self.colliders.push(collider);
        self
    }

    /// Sum of collider volumes times density.
    pub fn mass(&self) -> f32 {
        self.colliders.iter().map(|c| c.shape.volume()).sum::<f32>() * self.density
    }

    /// Volume-weighted center of the colliders in the body frame.
    pub fn local_center_of_mass(&self) -> Vec3 {
        let mut weighted = Vec3::ZERO;
        let mut total = 0.0f32;
        for c in &self.colliders {
            let v = c.shape.volume();
            weighted += (c.offset + c.shape.local_centroid()) * v;
            total += v;
        }
        if total > 0.0 {
            weighted / total
        } else {
            Vec3::ZERO
        }
    }
}

/// Contact force reported for `body` after a step.
///
/// Forces are raw engine units; see `ImpactScaling` in the rocks module for
/// how they are mapped to split decisions.
#[derive(Clone, Debug, PartialEq)]
pub struct ContactForceEvent {
    /// Body the force acts on.
    pub body: BodyKey,
    /// Body it collided with.
    pub other: BodyKey,
    pub total_force: Vec3,
    pub total_force_magnitude: f32,
    /// World center of mass of `body` at contact time, if the engine knows it.
    pub body_center_of_mass: Option<Vec3>,
    pub other_center_of_mass: Option<Vec3>,
}

/// What the scene needs from a rigid-body engine.
pub trait PhysicsBackend {
    /// Create `key`, replacing any existing body with the same key.
    fn register_body(&mut self, key: &BodyKey, desc: &RigidBodyDesc);

    /// Remove `key`. Returns whether it existed.
    fn remove_body(&mut self, key: &BodyKey) -> bool;

    fn contains(&self, key: &BodyKey) -> bool;

    fn translation(&self, key: &BodyKey) -> Option<Vec3>;

    fn rotation(&self, key: &BodyKey) -> Option<Quat>;

    fn set_rotation(&mut self, key: &BodyKey, rotation: Quat);

    fn apply_impulse(&mut self, key: &BodyKey, impulse: Vec3);

    /// World-space center of mass.
    fn center_of_mass(&self, key: &BodyKey) -> Option<Vec3>;

    /// Advance by `delta` seconds, appending contact force events to `events`.
    fn step(&mut self, delta: f32, events: &mut Vec<ContactForceEvent>);
}

// ========== Arena ==========

/// Visible extent of the scene in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// NDC (`[-1, 1]` on both axes) to world coordinates on the z = 0 plane.
    pub fn ndc_to_world(&self, ndc: glam::Vec2) -> glam::Vec2 {
        glam::Vec2::new(ndc.x * self.width / 2.0, ndc.y * self.height / 2.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1600.0, 900.0)
    }
}

/// The four fixed walls just outside `viewport` that keep rocks on screen.
///
/// Keys are `bounds_top`, `bounds_bottom`, `bounds_left` and `bounds_right`.
pub fn arena_bounds(viewport: Viewport) -> Vec<(BodyKey, RigidBodyDesc)> {
    let (w, h) = (viewport.width, viewport.height);
    let wall = |position: Vec3, half_extents: Vec3| {
        RigidBodyDesc::fixed()
            .position(position)
            .groups(InteractionGroups::BOUNDS)
            .restitution(1.0)
            .friction(0.0)
            .collider(Collider::cuboid(half_extents))
    };

    vec![
        (BodyKey::new("bounds_top"), wall(Vec3::new(0.0, h / 2.0 + 1.0, 0.0), Vec3::new(w, 1.0, 1.0))),
        (BodyKey::new("bounds_bottom"), wall(Vec3::new(0.0, -h / 2.0 - 1.0, 0.0), Vec3::new(w, 1.0, 1.0))),
        (BodyKey::new("bounds_left"), wall(Vec3::new(-w / 2.0 - 1.0, 0.0, 0.0), Vec3::new(1.0, h, 1.0))),
        (BodyKey::new("bounds_right"), wall(Vec3::new(w / 2.0 + 1.0, 0.0, 0.0), Vec3::new(1.0, h, 1.0))),
    ]
}
