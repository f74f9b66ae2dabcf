//! Minimal backend for tests and engine-free runs.
//!
//! Bodies move ballistically under their own velocity, damping and axis
//! locks. There is no collision detection. Contacts are whatever the caller
//! queues with [`HeadlessPhysics::push_contact`], reported by the next step.

use super::{BodyKey, BodyKind, ContactForceEvent, PhysicsBackend, RigidBodyDesc};
use glam::{BVec3, Quat, Vec3};
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
struct Body {
    kind: BodyKind,
    position: Vec3,
    rotation: Quat,
    linvel: Vec3,
    angvel: Vec3,
    inv_mass: f32,
    linear_damping: f32,
    angular_damping: f32,
    translation_mask: Vec3,
    rotation_mask: Vec3,
    local_com: Vec3,
}

impl Body {
    fn from_desc(desc: &RigidBodyDesc) -> Self {
        let mask = |b: BVec3| Vec3::select(b, Vec3::ONE, Vec3::ZERO);

        let mass = desc.mass();
        let inv_mass = if desc.kind == BodyKind::Dynamic && mass > 0.0 {
            1.0 / mass
        } else {
            0.0
        };

        Self {
            kind: desc.kind,
            position: desc.position,
            rotation: desc.rotation,
            linvel: desc.linvel,
            angvel: desc.angvel,
            inv_mass,
            linear_damping: desc.linear_damping,
            angular_damping: desc.angular_damping,
            translation_mask: mask(desc.enabled_translations),
            rotation_mask: mask(desc.enabled_rotations),
            local_com: desc.local_center_of_mass(),
        }
    }

    fn world_com(&self) -> Vec3 {
        self.position + self.rotation * self.local_com
    }
}

/// Deterministic stand-in for a rigid-body engine.
#[derive(Debug, Default)]
pub struct HeadlessPhysics {
    bodies: BTreeMap<BodyKey, Body>,
    queued: Vec<ContactForceEvent>,
}

impl HeadlessPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn linvel(&self, key: &BodyKey) -> Option<Vec3> {
        self.bodies.get(key).map(|b| b.linvel)
    }

    /// Queue an event to be reported by the next [`step`](PhysicsBackend::step).
    pub fn push_contact(&mut self, event: ContactForceEvent) {
        self.queued.push(event);
    }
}

impl PhysicsBackend for HeadlessPhysics {
    fn register_body(&mut self, key: &BodyKey, desc: &RigidBodyDesc) {
        log::debug!("register body {} ({:?}) at {}", key, desc.kind, desc.position);
        self.bodies.insert(key.clone(), Body::from_desc(desc));
    }

    fn remove_body(&mut self, key: &BodyKey) -> bool {
        self.bodies.remove(key).is_some()
    }

    fn contains(&self, key: &BodyKey) -> bool {
        self.bodies.contains_key(key)
    }

    fn translation(&self, key: &BodyKey) -> Option<Vec3> {
        self.bodies.get(key).map(|b| b.position)
    }

    fn rotation(&self, key: &BodyKey) -> Option<Quat> {
        self.bodies.get(key).map(|b| b.rotation)
    }

    fn set_rotation(&mut self, key: &BodyKey, rotation: Quat) {
        if let Some(body) = self.bodies.get_mut(key) {
            body.rotation = rotation.normalize();
        }
    }

    fn apply_impulse(&mut self, key: &BodyKey, impulse: Vec3) {
        if let Some(body) = self.bodies.get_mut(key) {
            body.linvel += impulse * body.inv_mass * body.translation_mask;
        }
    }

    fn center_of_mass(&self, key: &BodyKey) -> Option<Vec3> {
        self.bodies.get(key).map(Body::world_com)
    }

    fn step(&mut self, delta: f32, events: &mut Vec<ContactForceEvent>) {
        for body in self.bodies.values_mut().filter(|b| b.kind == BodyKind::Dynamic) {
            body.linvel *= 1.0 / (1.0 + delta * body.linear_damping);
            body.angvel *= 1.0 / (1.0 + delta * body.angular_damping);
            body.linvel *= body.translation_mask;
            body.angvel *= body.rotation_mask;

            body.position += body.linvel * delta;
            body.rotation = (Quat::from_scaled_axis(body.angvel * delta) * body.rotation).normalize();
        }
        events.append(&mut self.queued);
    }
}
