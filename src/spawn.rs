//! Random helpers for spawning particles, rocks and stars.
//!
//! Every random decision in the crate goes through a [`SpawnRng`], so a
//! scene built from a fixed seed replays identically.

use crate::Vec3;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Seedable random source with helpers for common spawn patterns.
///
/// ```ignore
/// let mut rng = SpawnRng::seeded(7);
/// let jitter = rng.centered_vec3(Vec3::splat(30.0)); // each axis in [-15, 15)
/// ```
#[derive(Clone, Debug)]
pub struct SpawnRng {
    rng: SmallRng,
}

impl SpawnRng {
    /// Deterministic generator for tests and replays.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Generator seeded from the wall clock, mixed with `salt` so two
    /// generators created in the same instant still differ.
    pub fn from_clock(salt: u64) -> Self {
        let seed = salt.wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ (std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(42));

        Self::seeded(seed)
    }

    /// Seeded when `seed` is given, clock-seeded otherwise.
    pub fn new(seed: Option<u64>, salt: u64) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed ^ salt),
            None => Self::from_clock(salt),
        }
    }

    // ========== Random primitives ==========

    /// Random f32 in `[0, 1)`.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in `[min, max)`. Returns `min` for an empty range.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    /// Random f32 in `[-extent/2, extent/2)`.
    ///
    /// A zero extent always yields zero.
    #[inline]
    pub fn centered(&mut self, extent: f32) -> f32 {
        (self.random() - 0.5) * extent
    }

    // ========== Vector helpers ==========

    /// Per-axis [`centered`](Self::centered): a point inside an
    /// axis-aligned box of size `extent` centered on the origin.
    pub fn centered_vec3(&mut self, extent: Vec3) -> Vec3 {
        Vec3::new(
            self.centered(extent.x),
            self.centered(extent.y),
            self.centered(extent.z),
        )
    }

    /// Random velocity with every component in `[-speed/2, speed/2)`.
    pub fn velocity(&mut self, speed: f32) -> Vec3 {
        self.centered_vec3(Vec3::splat(speed))
    }

    /// Random point in a vertical (Y-axis) cylinder shell.
    ///
    /// The angle is uniform, the radius is uniform in
    /// `[inner_padding, radius)` and the height is uniform in
    /// `[-height/2, height/2)`.
    pub fn in_cylinder(&mut self, radius: f32, height: f32, inner_padding: f32) -> Vec3 {
        let angle = self.random() * TAU;
        let r = inner_padding + self.random() * (radius - inner_padding);
        Vec3::new(r * angle.cos(), self.centered(height), r * angle.sin())
    }

    /// Fisher-Yates shuffle in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}
