//! Pointer-following rocket.
//!
//! Each frame the rocket body gets an impulse towards the pointer that grows
//! with the distance to it, and turns its nose (+Y) towards the pointer. The
//! body's heavy damping keeps the motion smooth.

use crate::emitter::EmitterConfig;
use crate::physics::{BodyKey, Collider, InteractionGroups, PhysicsBackend, RigidBodyDesc, Viewport};
use glam::{Quat, Vec2, Vec3};
use std::f32::consts::FRAC_PI_2;

/// Rocket body, steering and exhaust parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RocketConfig {
    pub start: Vec3,
    /// Impulse per second per unit of distance to the pointer.
    pub follow_gain: f32,
    /// Fraction of the remaining turn taken each frame.
    pub turn_rate: f32,
    /// Visual spin about the rocket's own Y axis, radians per second.
    pub spin_speed: f32,
    /// Visual scale while hovered.
    pub hover_scale: f32,
    /// Approach rate of the visual scale, per second.
    pub hover_rate: f32,
    /// Nozzle position in the rocket's frame.
    pub exhaust_offset: Vec3,
    pub density: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub exhaust: EmitterConfig,
}

impl Default for RocketConfig {
    fn default() -> Self {
        Self {
            start: Vec3::new(-400.0, 0.0, 0.0),
            follow_gain: 1000.0,
            turn_rate: 0.08,
            spin_speed: 0.5,
            hover_scale: 1.1,
            hover_rate: 5.0,
            exhaust_offset: Vec3::new(0.0, -80.0, 0.0),
            density: 0.001,
            linear_damping: 0.99,
            angular_damping: 0.99,
            exhaust: EmitterConfig::rocket_exhaust(),
        }
    }
}

impl RocketConfig {
    pub fn start(mut self, start: Vec3) -> Self {
        self.start = start;
        self
    }

    pub fn follow_gain(mut self, gain: f32) -> Self {
        self.follow_gain = gain;
        self
    }

    pub fn exhaust(mut self, exhaust: EmitterConfig) -> Self {
        self.exhaust = exhaust;
        self
    }
}

/// Per-frame input to the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInput {
    /// Pointer in normalized device coordinates, `[-1, 1]` on both axes.
    pub pointer_ndc: Vec2,
    pub viewport: Viewport,
    /// Whether the pointer is over the rocket.
    pub hovered: bool,
    pub device_pixel_ratio: f32,
    /// Camera zoom, forwarded to sprite materials.
    pub zoom: f32,
}

impl Default for FrameInput {
    fn default() -> Self {
        Self::new(Vec2::ZERO, Viewport::default())
    }
}

impl FrameInput {
    pub fn new(pointer_ndc: Vec2, viewport: Viewport) -> Self {
        Self {
            pointer_ndc,
            viewport,
            hovered: false,
            device_pixel_ratio: 1.0,
            zoom: 1.0,
        }
    }

    pub fn hovered(mut self, hovered: bool) -> Self {
        self.hovered = hovered;
        self
    }

    pub fn display(mut self, device_pixel_ratio: f32, zoom: f32) -> Self {
        self.device_pixel_ratio = device_pixel_ratio;
        self.zoom = zoom;
        self
    }
}

/// Drives the rocket body and tracks its visual-only state.
#[derive(Clone, Debug)]
pub struct RocketController {
    key: BodyKey,
    config: RocketConfig,
    spin: f32,
    scale: f32,
}

impl RocketController {
    pub fn new(config: RocketConfig) -> Self {
        Self {
            key: BodyKey::new("rocket"),
            config,
            spin: 0.0,
            scale: 1.0,
        }
    }

    pub fn key(&self) -> &BodyKey {
        &self.key
    }

    pub fn config(&self) -> &RocketConfig {
        &self.config
    }

    /// Accumulated visual spin about Y, radians.
    pub fn spin(&self) -> f32 {
        self.spin
    }

    /// Current visual scale.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Capsule hull with a rounded cone nose, free in XY, turning about Z only.
    pub fn body_desc(&self) -> RigidBodyDesc {
        RigidBodyDesc::dynamic()
            .position(self.config.start)
            .groups(InteractionGroups::ROCKET)
            .density(self.config.density)
            .damping(self.config.linear_damping, self.config.angular_damping)
            .gravity_scale(0.0)
            .enabled_translations(true, true, false)
            .enabled_rotations(false, false, true)
            .collider(Collider::capsule(20.0, 50.0).offset(Vec3::new(0.0, 10.0, 0.0)))
            .collider(Collider::round_cone(30.0, 32.0, 15.0).offset(Vec3::new(0.0, 90.0, 0.0)))
    }

    pub fn register(&self, physics: &mut dyn PhysicsBackend) {
        physics.register_body(&self.key, &self.body_desc());
    }

    /// Steer one frame. Returns the impulse applied, or `None` when the
    /// body does not exist.
    pub fn steer(&mut self, delta: f32, input: &FrameInput, physics: &mut dyn PhysicsBackend) -> Option<Vec3> {
        self.spin += delta * self.config.spin_speed;

        let current = physics.translation(&self.key)?;

        let target_scale = if input.hovered { self.config.hover_scale } else { 1.0 };
        let t = (delta * self.config.hover_rate).clamp(0.0, 1.0);
        self.scale += (target_scale - self.scale) * t;

        let target = input.viewport.ndc_to_world(input.pointer_ndc).extend(current.z);
        let offset = target - current;
        let impulse = offset.normalize_or_zero() * delta * self.config.follow_gain * offset.length();
        physics.apply_impulse(&self.key, impulse);

        let heading = Quat::from_rotation_z(offset.y.atan2(offset.x) - FRAC_PI_2);
        let rotation = physics.rotation(&self.key).unwrap_or(Quat::IDENTITY);
        physics.set_rotation(&self.key, rotation.slerp(heading, self.config.turn_rate));

        Some(impulse)
    }

    /// World position of the nozzle, if the body exists.
    pub fn exhaust_anchor(&self, physics: &dyn PhysicsBackend) -> Option<Vec3> {
        let translation = physics.translation(&self.key)?;
        let rotation = physics.rotation(&self.key).unwrap_or(Quat::IDENTITY);
        Some(translation + rotation * self.config.exhaust_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::HeadlessPhysics;

    fn setup() -> (RocketController, HeadlessPhysics) {
        let rocket = RocketController::new(RocketConfig::default());
        let mut physics = HeadlessPhysics::new();
        rocket.register(&mut physics);
        (rocket, physics)
    }

    #[test]
    fn test_body_desc() {
        let desc = RocketController::new(RocketConfig::default()).body_desc();
        assert_eq!(desc.position, Vec3::new(-400.0, 0.0, 0.0));
        assert_eq!(desc.groups, InteractionGroups::ROCKET);
        assert_eq!(desc.linear_damping, 0.99);
        assert_eq!(desc.colliders.len(), 2);
        assert!(!desc.enabled_translations.z);
        assert!(desc.enabled_rotations.z && !desc.enabled_rotations.x);
    }

    #[test]
    fn test_impulse_points_at_pointer() {
        let (mut rocket, mut physics) = setup();
        // (0, 0) in NDC is the world origin, 400 units to the right.
        let input = FrameInput::new(Vec2::ZERO, Viewport::new(1280.0, 720.0));
        let impulse = rocket.steer(0.016, &input, &mut physics).unwrap();

        assert!(impulse.x > 0.0);
        assert_eq!(impulse.y, 0.0);
        assert!((impulse.x - 0.016 * 1000.0 * 400.0).abs() < 1e-2);
        assert!(physics.linvel(rocket.key()).unwrap().x > 0.0);
    }

    #[test]
    fn test_pointer_on_rocket_is_finite() {
        let (mut rocket, mut physics) = setup();
        let input = FrameInput::new(Vec2::new(-400.0 / 640.0, 0.0), Viewport::new(1280.0, 720.0));

        for _ in 0..10 {
            let impulse = rocket.steer(0.016, &input, &mut physics).unwrap();
            assert!(impulse.is_finite());
            physics.step(0.016, &mut Vec::new());
        }
        assert!(physics.translation(rocket.key()).unwrap().is_finite());
        assert!(physics.rotation(rocket.key()).unwrap().is_finite());
    }

    #[test]
    fn test_turns_towards_pointer() {
        let (mut rocket, mut physics) = setup();
        // Pointer straight above: heading angle 0.
        let input = FrameInput::new(Vec2::new(-400.0 / 640.0, 1.0), Viewport::new(1280.0, 720.0));
        physics.set_rotation(rocket.key(), Quat::from_rotation_z(1.0));

        rocket.steer(0.016, &input, &mut physics);
        let (_, angle) = physics.rotation(rocket.key()).unwrap().to_axis_angle();
        assert!((angle - 0.92).abs() < 1e-3);
    }

    #[test]
    fn test_hover_scale_and_spin() {
        let (mut rocket, mut physics) = setup();
        let input = FrameInput::new(Vec2::ZERO, Viewport::default()).hovered(true);

        for _ in 0..200 {
            rocket.steer(0.016, &input, &mut physics);
        }
        assert!((rocket.scale() - 1.1).abs() < 1e-3);
        assert!((rocket.spin() - 200.0 * 0.016 * 0.5).abs() < 1e-3);

        let input = input.hovered(false);
        for _ in 0..200 {
            rocket.steer(0.016, &input, &mut physics);
        }
        assert!((rocket.scale() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_exhaust_anchor() {
        let (rocket, mut physics) = setup();
        let anchor = rocket.exhaust_anchor(&physics).unwrap();
        assert!((anchor - Vec3::new(-400.0, -80.0, 0.0)).length() < 1e-4);

        physics.set_rotation(rocket.key(), Quat::from_rotation_z(FRAC_PI_2));
        let anchor = rocket.exhaust_anchor(&physics).unwrap();
        assert!((anchor - Vec3::new(-320.0, 0.0, 0.0)).length() < 1e-3);

        physics.remove_body(rocket.key());
        assert_eq!(rocket.exhaust_anchor(&physics), None);
    }

    #[test]
    fn test_steer_without_body() {
        let mut rocket = RocketController::new(RocketConfig::default());
        let mut physics = HeadlessPhysics::new();
        assert_eq!(rocket.steer(0.016, &FrameInput::default(), &mut physics), None);
        assert!(rocket.spin() > 0.0);
    }
}
