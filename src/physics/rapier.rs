//! [`PhysicsBackend`] on top of `rapier3d`.
//!
//! Every collider is created with contact force events enabled and a zero
//! threshold; the per-step [`ForceCollector`] turns rapier's
//! `ContactForceEvent`s into one event per dynamic body of the pair.

use super::{BodyKey, BodyKind, ColliderShape, ContactForceEvent, InteractionGroups, PhysicsBackend, RigidBodyDesc};
use glam::{Quat, Vec3};
use rapier3d::na::{Isometry3, Point3, Quaternion, Translation3, UnitQuaternion, Vector3};
use rapier3d::prelude as rp;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

fn to_vector(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

fn from_vector(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_rotation(q: Quat) -> UnitQuaternion<f32> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

fn from_rotation(r: &UnitQuaternion<f32>) -> Quat {
    let q = r.into_inner();
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

fn to_groups(groups: InteractionGroups) -> rp::InteractionGroups {
    rp::InteractionGroups::new(
        rp::Group::from_bits_truncate(groups.memberships),
        rp::Group::from_bits_truncate(groups.filter),
    )
}

fn collider_builder(shape: &ColliderShape) -> rp::ColliderBuilder {
    match shape {
        ColliderShape::ConvexHull { hull, scale } => {
            let points: Vec<Point3<f32>> = hull
                .positions()
                .iter()
                .map(|p| Point3::new(p.x * scale, p.y * scale, p.z * scale))
                .collect();
            rp::ColliderBuilder::convex_hull(&points).unwrap_or_else(|| {
                log::warn!("hull collider rejected, using a ball instead");
                rp::ColliderBuilder::ball((hull.bounding_radius() * scale).max(f32::EPSILON))
            })
        }
        ColliderShape::Cuboid { half_extents } => {
            rp::ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
        ColliderShape::Capsule { half_height, radius } => rp::ColliderBuilder::capsule_y(*half_height, *radius),
        ColliderShape::RoundCone {
            half_height,
            radius,
            border_radius,
        } => rp::ColliderBuilder::round_cone(*half_height, *radius, *border_radius),
    }
}

/// Raw pair as reported by rapier, resolved after the step.
struct RawForce {
    collider1: rp::ColliderHandle,
    collider2: rp::ColliderHandle,
    total_force: Vec3,
    total_force_magnitude: f32,
}

#[derive(Default)]
struct ForceCollector {
    forces: Mutex<Vec<RawForce>>,
}

impl rp::EventHandler for ForceCollector {
    fn handle_collision_event(
        &self,
        _bodies: &rp::RigidBodySet,
        _colliders: &rp::ColliderSet,
        _event: rp::CollisionEvent,
        _contact_pair: Option<&rp::ContactPair>,
    ) {
    }

    fn handle_contact_force_event(
        &self,
        dt: f32,
        _bodies: &rp::RigidBodySet,
        _colliders: &rp::ColliderSet,
        contact_pair: &rp::ContactPair,
        total_force_magnitude: f32,
    ) {
        let event = rp::ContactForceEvent::from_contact_pair(dt, contact_pair, total_force_magnitude);
        if let Ok(mut forces) = self.forces.lock() {
            forces.push(RawForce {
                collider1: event.collider1,
                collider2: event.collider2,
                total_force: from_vector(&event.total_force),
                total_force_magnitude: event.total_force_magnitude,
            });
        }
    }
}

/// Rigid-body world backed by rapier, with zero gravity by default.
pub struct RapierPhysics {
    gravity: Vector3<f32>,
    params: rp::IntegrationParameters,
    pipeline: rp::PhysicsPipeline,
    islands: rp::IslandManager,
    broad_phase: rp::DefaultBroadPhase,
    narrow_phase: rp::NarrowPhase,
    bodies: rp::RigidBodySet,
    colliders: rp::ColliderSet,
    impulse_joints: rp::ImpulseJointSet,
    multibody_joints: rp::MultibodyJointSet,
    ccd: rp::CCDSolver,
    handles: HashMap<BodyKey, rp::RigidBodyHandle>,
    keys: HashMap<rp::RigidBodyHandle, BodyKey>,
}

impl Default for RapierPhysics {
    fn default() -> Self {
        Self {
            gravity: Vector3::zeros(),
            params: rp::IntegrationParameters::default(),
            pipeline: rp::PhysicsPipeline::new(),
            islands: rp::IslandManager::new(),
            broad_phase: rp::DefaultBroadPhase::new(),
            narrow_phase: rp::NarrowPhase::new(),
            bodies: rp::RigidBodySet::new(),
            colliders: rp::ColliderSet::new(),
            impulse_joints: rp::ImpulseJointSet::new(),
            multibody_joints: rp::MultibodyJointSet::new(),
            ccd: rp::CCDSolver::new(),
            handles: HashMap::new(),
            keys: HashMap::new(),
        }
    }
}

impl fmt::Debug for RapierPhysics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RapierPhysics")
            .field("gravity", &from_vector(&self.gravity))
            .field("bodies", &self.bodies.len())
            .field("colliders", &self.colliders.len())
            .finish()
    }
}

impl RapierPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    fn body(&self, key: &BodyKey) -> Option<&rp::RigidBody> {
        self.handles.get(key).and_then(|h| self.bodies.get(*h))
    }

    fn body_mut(&mut self, key: &BodyKey) -> Option<&mut rp::RigidBody> {
        let handle = *self.handles.get(key)?;
        self.bodies.get_mut(handle)
    }

    /// Key and world center of mass of the dynamic body owning `collider`.
    fn dynamic_owner(&self, collider: rp::ColliderHandle) -> Option<(BodyKey, Vec3)> {
        let handle = self.colliders.get(collider)?.parent()?;
        let body = self.bodies.get(handle)?;
        if !body.is_dynamic() {
            return None;
        }
        let key = self.keys.get(&handle)?.clone();
        Some((key, from_vector(&body.center_of_mass().coords)))
    }

    fn other_key(&self, collider: rp::ColliderHandle) -> Option<(BodyKey, Option<Vec3>)> {
        let handle = self.colliders.get(collider)?.parent()?;
        let key = self.keys.get(&handle)?.clone();
        let com = self
            .bodies
            .get(handle)
            .map(|b| from_vector(&b.center_of_mass().coords));
        Some((key, com))
    }

    fn translate(&self, raw: &RawForce, events: &mut Vec<ContactForceEvent>) {
        let sides = [
            (raw.collider1, raw.collider2, -raw.total_force),
            (raw.collider2, raw.collider1, raw.total_force),
        ];
        for (this, that, force) in sides {
            let Some((body, com)) = self.dynamic_owner(this) else {
                continue;
            };
            let Some((other, other_com)) = self.other_key(that) else {
                continue;
            };
            events.push(ContactForceEvent {
                body,
                other,
                total_force: force,
                total_force_magnitude: raw.total_force_magnitude,
                body_center_of_mass: Some(com),
                other_center_of_mass: other_com,
            });
        }
    }
}

impl PhysicsBackend for RapierPhysics {
    fn register_body(&mut self, key: &BodyKey, desc: &RigidBodyDesc) {
        self.remove_body(key);

        let builder = match desc.kind {
            BodyKind::Dynamic => rp::RigidBodyBuilder::dynamic(),
            BodyKind::Fixed => rp::RigidBodyBuilder::fixed(),
        };
        let t = desc.enabled_translations;
        let r = desc.enabled_rotations;
        let body = builder
            .position(Isometry3::from_parts(
                Translation3::from(to_vector(desc.position)),
                to_rotation(desc.rotation),
            ))
            .linvel(to_vector(desc.linvel))
            .angvel(to_vector(desc.angvel))
            .gravity_scale(desc.gravity_scale)
            .linear_damping(desc.linear_damping)
            .angular_damping(desc.angular_damping)
            .enabled_translations(t.x, t.y, t.z)
            .enabled_rotations(r.x, r.y, r.z)
            .build();
        let handle = self.bodies.insert(body);

        for collider in &desc.colliders {
            let built = collider_builder(&collider.shape)
                .translation(to_vector(collider.offset))
                .density(desc.density)
                .restitution(desc.restitution)
                .friction(desc.friction)
                .collision_groups(to_groups(desc.groups))
                .active_events(rp::ActiveEvents::CONTACT_FORCE_EVENTS)
                .contact_force_event_threshold(0.0)
                .build();
            self.colliders.insert_with_parent(built, handle, &mut self.bodies);
        }

        log::debug!("register body {} ({:?}) at {}", key, desc.kind, desc.position);
        self.handles.insert(key.clone(), handle);
        self.keys.insert(handle, key.clone());
    }

    fn remove_body(&mut self, key: &BodyKey) -> bool {
        let Some(handle) = self.handles.remove(key) else {
            return false;
        };
        self.keys.remove(&handle);
        self.bodies
            .remove(
                handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    fn contains(&self, key: &BodyKey) -> bool {
        self.handles.contains_key(key)
    }

    fn translation(&self, key: &BodyKey) -> Option<Vec3> {
        self.body(key).map(|b| from_vector(b.translation()))
    }

    fn rotation(&self, key: &BodyKey) -> Option<Quat> {
        self.body(key).map(|b| from_rotation(b.rotation()))
    }

    fn set_rotation(&mut self, key: &BodyKey, rotation: Quat) {
        if let Some(body) = self.body_mut(key) {
            body.set_rotation(to_rotation(rotation), true);
        }
    }

    fn apply_impulse(&mut self, key: &BodyKey, impulse: Vec3) {
        if let Some(body) = self.body_mut(key) {
            body.apply_impulse(to_vector(impulse), true);
        }
    }

    fn center_of_mass(&self, key: &BodyKey) -> Option<Vec3> {
        self.body(key).map(|b| from_vector(&b.center_of_mass().coords))
    }

    fn step(&mut self, delta: f32, events: &mut Vec<ContactForceEvent>) {
        if !(delta.is_finite() && delta > 0.0) {
            return;
        }
        self.params.dt = delta;

        let collector = ForceCollector::default();
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &collector,
        );

        let raw = collector.forces.into_inner().unwrap_or_else(|e| e.into_inner());
        for force in &raw {
            self.translate(force, events);
        }
    }
}
