//! Fixed-size particle pool driven by an [`EmitterConfig`].
//!
//! Slots are never created or destroyed after construction: a particle
//! whose age reaches `1.0` is immediately respawned at the anchor. Ages
//! below zero mean "not yet born" and count up towards zero.
//!
//! # Per-tick update
//!
//! 1. `delta * emission_rate` is added to a credit counter and its integer
//!    part is spent this tick. The fractional part carries over, so the
//!    long-run rate matches the configured one regardless of frame timing.
//! 2. Slots are visited in index order. An unborn slot is respawned early
//!    while credit remains; every other slot is aged, and live slots also
//!    integrate gravity, turbulence and velocity.
//! 3. Position and age buffers are flagged for re-upload.

use crate::emitter::EmitterConfig;
use crate::error::ConfigError;
use crate::render::{DirtyBuffers, PointSpriteUniforms, PointVertex};
use crate::spawn::SpawnRng;
use glam::Vec3;

/// Something the emitter can be attached to.
///
/// `None` means the anchor is not available this frame (e.g. the node is
/// not mounted yet); the emitter then uses the world origin.
pub trait Anchor {
    /// Current world-space position, if known.
    fn world_position(&self) -> Option<Vec3>;
}

impl Anchor for Vec3 {
    fn world_position(&self) -> Option<Vec3> {
        Some(*self)
    }
}

impl Anchor for Option<Vec3> {
    fn world_position(&self) -> Option<Vec3> {
        *self
    }
}

/// Outcome of a single [`ParticleEmitter::update`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Whole credits granted by the emission counter this tick.
    pub credited: u32,
    /// Unborn slots respawned early by spending credit.
    pub emitted: u32,
    /// Live slots that reached the end of their life and respawned.
    pub expired: u32,
}

/// Totals since the emitter was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmitterStats {
    pub ticks: u64,
    pub credited: u64,
    pub emitted: u64,
    pub expired: u64,
}

/// A pool of point particles following an anchor.
#[derive(Clone, Debug)]
pub struct ParticleEmitter {
    config: EmitterConfig,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    ages: Vec<f32>,
    sizes: Vec<f32>,
    credit: f64,
    dirty: DirtyBuffers,
    stats: EmitterStats,
    rng: SpawnRng,
}

impl ParticleEmitter {
    /// Create a pool at `anchor` with a clock-seeded random source.
    pub fn new(config: EmitterConfig, anchor: impl Anchor) -> Result<Self, ConfigError> {
        Self::with_rng(config, anchor, SpawnRng::from_clock(0x5EED))
    }

    /// Create a pool with a deterministic random source.
    pub fn seeded(config: EmitterConfig, anchor: impl Anchor, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, anchor, SpawnRng::seeded(seed))
    }

    /// Create a pool drawing from `rng`.
    pub fn with_rng(config: EmitterConfig, anchor: impl Anchor, mut rng: SpawnRng) -> Result<Self, ConfigError> {
        config.validate()?;

        let origin = anchor.world_position().unwrap_or(Vec3::ZERO);
        let n = config.max_particles;

        let positions = vec![origin; n];
        let velocities = (0..n).map(|_| rng.velocity(config.initial_velocity)).collect();
        let ages = (0..n).map(|i| config.stagger_age(i)).collect();
        let sizes = (0..n)
            .map(|_| config.size + config.size_variance * (rng.random() - 0.5) * 2.0)
            .collect();

        log::debug!(
            "particle pool created: {} slots, {:.1}/s, lifetime {:.2}s",
            n,
            config.emission_rate,
            config.lifetime
        );

        Ok(Self {
            config,
            positions,
            velocities,
            ages,
            sizes,
            credit: 0.0,
            dirty: DirtyBuffers::ALL,
            stats: EmitterStats::default(),
            rng,
        })
    }

    /// Advance the pool by `delta` seconds.
    ///
    /// A negative or non-finite `delta` counts as zero, so one bad frame
    /// time cannot poison the credit counter or the ages.
    pub fn update(&mut self, delta: f32, anchor: &impl Anchor) -> TickReport {
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        let origin = anchor.world_position().unwrap_or(Vec3::ZERO);

        self.credit += f64::from(delta) * f64::from(self.config.emission_rate);
        let whole = self.credit.floor();
        self.credit -= whole;

        let credited = whole as u32;
        let mut report = TickReport {
            credited,
            ..TickReport::default()
        };
        let mut remaining = credited;

        for i in 0..self.ages.len() {
            if remaining > 0 && self.ages[i] < 0.0 {
                self.respawn(i, origin);
                remaining -= 1;
                report.emitted += 1;
            } else if self.advance(i, delta, origin) {
                report.expired += 1;
            }
        }

        self.dirty = DirtyBuffers::ALL;
        self.stats.ticks += 1;
        self.stats.credited += u64::from(report.credited);
        self.stats.emitted += u64::from(report.emitted);
        self.stats.expired += u64::from(report.expired);

        report
    }

    /// Age one slot. Returns `true` if it expired and was respawned.
    fn advance(&mut self, i: usize, delta: f32, origin: Vec3) -> bool {
        let step = delta / self.config.lifetime;

        if self.ages[i] < 0.0 {
            self.ages[i] += step;
            return false;
        }

        self.ages[i] += step;

        let turbulence = self.rng.centered_vec3(Vec3::splat(self.config.turbulence));
        let velocity = &mut self.velocities[i];
        velocity.y -= self.config.gravity_modifier * delta;
        *velocity += turbulence;
        self.positions[i] += *velocity * delta;

        if self.ages[i] >= 1.0 {
            self.respawn(i, origin);
            return true;
        }
        false
    }

    fn respawn(&mut self, i: usize, origin: Vec3) {
        let offset = match self.config.box_size {
            Some(size) => self.rng.centered_vec3(size),
            None => Vec3::ZERO,
        };
        self.positions[i] = origin + offset;
        self.velocities[i] = self.rng.velocity(self.config.initial_velocity);
        self.ages[i] = 0.0;
    }

    // ========== Accessors ==========

    /// Pool capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ages.len()
    }

    /// Number of slots currently alive (age in `[0, 1)`).
    pub fn alive(&self) -> usize {
        self.ages.iter().filter(|&&a| a >= 0.0).count()
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn ages(&self) -> &[f32] {
        &self.ages
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    /// Fractional emission credit carried into the next tick.
    #[inline]
    pub fn pending_credit(&self) -> f64 {
        self.credit
    }

    pub fn stats(&self) -> EmitterStats {
        self.stats
    }

    // ========== Render views ==========

    /// Raw position buffer (`vec3<f32>` per slot).
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Raw age buffer (`f32` per slot).
    pub fn age_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.ages)
    }

    /// Raw size buffer (`f32` per slot). Never changes after construction.
    pub fn size_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.sizes)
    }

    /// Interleaved vertices for point sprite rendering.
    pub fn vertices(&self) -> Vec<PointVertex> {
        self.positions
            .iter()
            .zip(&self.ages)
            .zip(&self.sizes)
            .map(|((p, &age), &size)| PointVertex {
                position: p.to_array(),
                age,
                size,
            })
            .collect()
    }

    /// Material uniforms for this pool's sprites.
    pub fn uniforms(&self, device_pixel_ratio: f32, zoom: f32) -> PointSpriteUniforms {
        PointSpriteUniforms::new(
            self.config.color,
            self.config.size,
            self.config.opacity,
            device_pixel_ratio,
            zoom,
        )
    }

    /// Take and clear the pending re-upload flags.
    pub fn take_dirty(&mut self) -> DirtyBuffers {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet(n: usize, rate: f32, lifetime: f32) -> EmitterConfig {
        EmitterConfig::new()
            .max_particles(n)
            .emission_rate(rate)
            .lifetime(lifetime)
            .initial_velocity(0.0)
            .turbulence(0.0)
            .gravity(0.0)
            .size(1.0, 0.0)
            .point_source()
    }

    #[test]
    fn test_initial_stagger() {
        let e = ParticleEmitter::seeded(quiet(4, 2.0, 1.0), Vec3::ZERO, 1).unwrap();
        assert_eq!(e.ages(), &[0.0, -0.5, -1.0, -1.5]);
        assert_eq!(e.alive(), 1);
    }

    #[test]
    fn test_staggered_birth_scenario() {
        let mut e = ParticleEmitter::seeded(quiet(4, 2.0, 1.0), Vec3::ZERO, 1).unwrap();
        let report = e.update(0.5, &Vec3::ZERO);

        assert_eq!(report.credited, 1);
        assert_eq!(report.emitted, 1);
        assert_eq!(e.ages(), &[0.5, 0.0, -0.5, -1.0]);
    }

    #[test]
    fn test_expiry_respawns_to_zero() {
        let mut e = ParticleEmitter::seeded(quiet(1, 1.0, 1.0), Vec3::ZERO, 1).unwrap();
        e.update(0.6, &Vec3::ZERO);
        assert!((e.ages()[0] - 0.6).abs() < 1e-6);

        let report = e.update(0.6, &Vec3::new(3.0, 4.0, 5.0));
        assert_eq!(report.expired, 1);
        assert_eq!(e.ages()[0], 0.0);
        assert_eq!(e.positions()[0], Vec3::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn test_missing_anchor_uses_origin() {
        let mut e = ParticleEmitter::seeded(quiet(2, 1.0, 0.1), None::<Vec3>, 1).unwrap();
        e.update(0.2, &None::<Vec3>);
        assert_eq!(e.positions()[0], Vec3::ZERO);
    }

    #[test]
    fn test_gravity_pulls_live_particles_down() {
        let config = quiet(1, 0.001, 10.0).gravity(9.8);
        let mut e = ParticleEmitter::seeded(config, Vec3::ZERO, 1).unwrap();
        e.update(0.1, &Vec3::ZERO);
        assert!((e.velocities()[0].y + 0.98).abs() < 1e-5);
        assert!(e.positions()[0].y < 0.0);
    }

    #[test]
    fn test_unborn_slots_do_not_move() {
        let config = quiet(3, 0.01, 1.0).gravity(9.8).initial_velocity(5.0);
        let mut e = ParticleEmitter::seeded(config, Vec3::ZERO, 4).unwrap();
        e.update(0.1, &Vec3::ZERO);
        assert_eq!(e.positions()[1], Vec3::ZERO);
        assert_eq!(e.positions()[2], Vec3::ZERO);
    }

    #[test]
    fn test_excess_credit_is_dropped() {
        // Only slot 1 is unborn; five credits are granted.
        let mut e = ParticleEmitter::seeded(quiet(2, 1.0, 100.0), Vec3::ZERO, 1).unwrap();
        let report = e.update(5.0, &Vec3::ZERO);
        assert_eq!(report.credited, 5);
        assert_eq!(report.emitted, 1);
        assert_eq!(e.ages()[1], 0.0);
    }

    #[test]
    fn test_dirty_flags() {
        let mut e = ParticleEmitter::seeded(quiet(2, 1.0, 1.0), Vec3::ZERO, 1).unwrap();
        assert!(e.take_dirty().any());
        assert!(!e.take_dirty().any());
        e.update(0.016, &Vec3::ZERO);
        assert_eq!(e.take_dirty(), DirtyBuffers::ALL);
    }

    #[test]
    fn test_sizes_within_variance() {
        let config = quiet(200, 10.0, 1.0).size(5.0, 2.5);
        let e = ParticleEmitter::seeded(config, Vec3::ZERO, 8).unwrap();
        for &s in e.sizes() {
            assert!((2.5..=7.5).contains(&s));
        }
    }

    #[test]
    fn test_buffer_views() {
        let e = ParticleEmitter::seeded(quiet(8, 1.0, 1.0), Vec3::ONE, 1).unwrap();
        assert_eq!(e.position_bytes().len(), 8 * 12);
        assert_eq!(e.age_bytes().len(), 8 * 4);
        assert_eq!(e.size_bytes().len(), 8 * 4);
        let verts = e.vertices();
        assert_eq!(verts.len(), 8);
        assert_eq!(verts[0].position, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_bad_delta_is_ignored() {
        let mut e = ParticleEmitter::seeded(quiet(8, 4.0, 1.0), Vec3::ZERO, 1).unwrap();
        let before = e.ages().to_vec();

        for delta in [f32::NAN, f32::INFINITY, -0.3] {
            let report = e.update(delta, &Vec3::ZERO);
            assert_eq!(report.credited, 0);
            assert_eq!(e.ages(), before.as_slice());
            assert_eq!(e.pending_credit(), 0.0);
        }

        e.update(0.5, &Vec3::ZERO);
        assert_eq!(e.stats().credited, 2);
        assert!(e.ages().iter().all(|a| a.is_finite()));
    }

    #[test]
    fn test_uniforms_carry_material() {
        let config = quiet(2, 1.0, 1.0).color(Vec3::new(1.0, 0.5, 0.0)).opacity(0.4).size(6.0, 0.0);
        let e = ParticleEmitter::seeded(config, Vec3::ZERO, 1).unwrap();
        let u = e.uniforms(2.0, 0.5);
        assert_eq!(u.color, [1.0, 0.5, 0.0]);
        assert_eq!(u.point_size, 6.0);
        assert_eq!(u.opacity, 0.4);
        assert_eq!(u.device_pixel_ratio, 2.0);
        assert_eq!(u.zoom, 0.5);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = ParticleEmitter::seeded(quiet(0, 1.0, 1.0), Vec3::ZERO, 1);
        assert_eq!(result.err(), Some(ConfigError::ZeroCapacity));
    }
}
