//! Particle emitter configuration.
//!
//! An [`EmitterConfig`] describes a fixed-size pool of short-lived point
//! particles attached to a moving anchor. The pool itself lives in
//! [`ParticleEmitter`](crate::particles::ParticleEmitter).
//!
//! # Quick Start
//!
//! ```ignore
//! let config = EmitterConfig::new()
//!     .max_particles(200)
//!     .lifetime(1.5)
//!     .emission_rate(40.0)
//!     .gravity(9.8)
//!     .box_size(Vec3::new(2.0, 0.0, 2.0));
//! ```
//!
//! # Presets
//!
//! ```ignore
//! EmitterConfig::rocket_exhaust()   // the hero rocket's exhaust trail
//! EmitterConfig::dust(Vec3::splat(50.0))
//! ```

use crate::error::ConfigError;
use glam::Vec3;

/// Configuration of a particle emitter.
///
/// All time values are seconds. Ages are normalized by `lifetime`, so a
/// particle dies when its age reaches `1.0`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EmitterConfig {
    /// Pool capacity. Fixed for the lifetime of the emitter.
    pub max_particles: usize,
    /// Point sprite color (RGB, 0.0-1.0). Render uniform only.
    pub color: Vec3,
    /// Speed range of a freshly spawned particle; each velocity component
    /// lies in `[-v/2, v/2)`.
    pub initial_velocity: f32,
    /// Base render size.
    pub size: f32,
    /// Random size jitter, `size ± size_variance`.
    pub size_variance: f32,
    /// Sprite opacity. Render uniform only.
    pub opacity: f32,
    /// Seconds a particle lives.
    pub lifetime: f32,
    /// Particles per second.
    pub emission_rate: f32,
    /// Per-tick random velocity perturbation, per axis in `[-t/2, t/2)`.
    pub turbulence: f32,
    /// Downward acceleration applied to live particles.
    pub gravity_modifier: f32,
    /// Respawn volume around the anchor. `None` respawns exactly at the anchor.
    pub box_size: Option<Vec3>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            max_particles: 100,
            color: Vec3::ONE,
            initial_velocity: 1.0,
            size: 1.0,
            size_variance: 0.0,
            opacity: 1.0,
            lifetime: 1.0,
            emission_rate: 50.0,
            turbulence: 0.0,
            gravity_modifier: 0.0,
            box_size: None,
        }
    }
}

impl EmitterConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // PRESETS
    // =========================================================================

    /// Exhaust trail of the hero rocket.
    ///
    /// White puffs spawned across a flat 30x30 patch under the nozzle,
    /// short-lived and heavily jittered.
    pub fn rocket_exhaust() -> Self {
        Self {
            max_particles: 60,
            color: Vec3::ONE,
            initial_velocity: 10.0,
            size: 5.0,
            size_variance: 2.5,
            opacity: 1.0,
            lifetime: 0.5,
            emission_rate: 10.0,
            turbulence: 10.0,
            gravity_modifier: 0.0,
            box_size: Some(Vec3::new(30.0, 0.0, 30.0)),
        }
    }

    /// Slow drifting dust spread through a box around the anchor.
    pub fn dust(region: Vec3) -> Self {
        Self {
            max_particles: 200,
            color: Vec3::new(0.7, 0.75, 0.8),
            initial_velocity: 0.5,
            size: 1.5,
            size_variance: 0.5,
            opacity: 0.6,
            lifetime: 6.0,
            emission_rate: 30.0,
            turbulence: 0.2,
            gravity_modifier: 0.0,
            box_size: Some(region),
        }
    }

    // =========================================================================
    // BUILDER
    // =========================================================================

    /// Set the pool capacity.
    pub fn max_particles(mut self, n: usize) -> Self {
        self.max_particles = n;
        self
    }

    /// Set the sprite color.
    pub fn color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    /// Set the launch speed range.
    pub fn initial_velocity(mut self, v: f32) -> Self {
        self.initial_velocity = v;
        self
    }

    /// Set base size and size jitter.
    pub fn size(mut self, size: f32, variance: f32) -> Self {
        self.size = size;
        self.size_variance = variance;
        self
    }

    /// Set sprite opacity.
    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Set particle lifetime in seconds.
    pub fn lifetime(mut self, seconds: f32) -> Self {
        self.lifetime = seconds;
        self
    }

    /// Set particles emitted per second.
    pub fn emission_rate(mut self, rate: f32) -> Self {
        self.emission_rate = rate;
        self
    }

    /// Set per-tick velocity jitter.
    pub fn turbulence(mut self, t: f32) -> Self {
        self.turbulence = t;
        self
    }

    /// Set downward acceleration.
    pub fn gravity(mut self, g: f32) -> Self {
        self.gravity_modifier = g;
        self
    }

    /// Respawn inside a box of this size centered on the anchor.
    pub fn box_size(mut self, size: Vec3) -> Self {
        self.box_size = Some(size);
        self
    }

    /// Respawn exactly at the anchor.
    pub fn point_source(mut self) -> Self {
        self.box_size = None;
        self
    }

    // =========================================================================
    // DERIVED VALUES
    // =========================================================================

    /// Check that the configuration describes a usable pool.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_particles == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if !(self.lifetime.is_finite() && self.lifetime > 0.0) {
            return Err(ConfigError::InvalidLifetime(self.lifetime));
        }
        if !(self.emission_rate.is_finite() && self.emission_rate > 0.0) {
            return Err(ConfigError::InvalidEmissionRate(self.emission_rate));
        }
        if let Some(b) = self.box_size {
            if b.min_element() < 0.0 {
                return Err(ConfigError::NegativeBoxSize(b));
            }
        }
        if self.size_variance < 0.0 {
            return Err(ConfigError::NegativeSizeVariance(self.size_variance));
        }
        Ok(())
    }

    /// Initial age of pool slot `index`.
    ///
    /// Slot 0 is born immediately, the rest follow at `1 / emission_rate`
    /// intervals.
    #[inline]
    pub fn stagger_age(&self, index: usize) -> f32 {
        -(index as f32) / self.emission_rate
    }
}
