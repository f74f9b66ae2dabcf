//! Slowly turning backdrop of stars and planets.
//!
//! Both live in a hollow vertical cylinder around the camera, so nothing
//! ever sits between the camera and the play area. Stars sit in an outer
//! shell, planets closer in. The whole backdrop turns about Y and fades in
//! while visible.

use crate::render::{PointSpriteUniforms, StarVertex};
use crate::spawn::SpawnRng;
use glam::{Quat, Vec3};

/// Planet tints, cycled by planet index.
pub const PLANET_PALETTE: [&str; 9] = [
    "#FF00FF", "#00FFFF", "#FF6FFF", "#6FFFE5", "#FF99FF", "#66FFFF", "#CC33FF", "#99FFFF", "#FF66CC",
];

/// `#RRGGBB` to linear-ish RGB in `[0, 1]`. `None` for anything else.
pub fn hex_color(hex: &str) -> Option<Vec3> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| {
        digits
            .get(i..i + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .map(|v| v as f32 / 255.0)
    };
    Some(Vec3::new(channel(0)?, channel(2)?, channel(4)?))
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StarfieldConfig {
    pub star_count: usize,
    pub planet_count: usize,
    /// Outer radius of the planet shell.
    pub radius: f32,
    /// Inner radius of the planet shell.
    pub inner_padding: f32,
    /// Stars sit this much further out than planets.
    pub star_margin: f32,
    /// Cylinder height, normally the viewport height.
    pub height: f32,
    /// Planet scale is uniform in `[0, max_planet_scale)`.
    pub max_planet_scale: f32,
    /// Radians per second about Y.
    pub rotation_speed: f32,
    /// Opacity gained per second while visible.
    pub fade_speed: f32,
    /// Star sprite size before device pixel ratio.
    pub star_size: f32,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            star_count: 2000,
            planet_count: 20,
            radius: 2000.0,
            inner_padding: 1500.0,
            star_margin: 1000.0,
            height: 900.0,
            max_planet_scale: 100.0,
            rotation_speed: 0.015,
            fade_speed: 0.5,
            star_size: 2.0,
        }
    }
}

impl StarfieldConfig {
    pub fn height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    pub fn counts(mut self, stars: usize, planets: usize) -> Self {
        self.star_count = stars;
        self.planet_count = planets;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Planet {
    pub position: Vec3,
    pub scale: f32,
    pub color: Vec3,
}

#[derive(Clone, Debug)]
pub struct Starfield {
    config: StarfieldConfig,
    stars: Vec<Vec3>,
    planets: Vec<Planet>,
    rotation: f32,
    elapsed: f32,
    star_opacity: f32,
    planet_opacity: f32,
}

impl Starfield {
    /// Scatter stars and planets. Everything starts fully transparent.
    pub fn new(config: StarfieldConfig, rng: &mut SpawnRng) -> Self {
        let mut field = Self {
            config,
            stars: Vec::new(),
            planets: Vec::new(),
            rotation: 0.0,
            elapsed: 0.0,
            star_opacity: 0.0,
            planet_opacity: 0.0,
        };
        field.scatter(rng);
        field
    }

    fn scatter(&mut self, rng: &mut SpawnRng) {
        let c = &self.config;

        self.stars = (0..c.star_count)
            .map(|_| rng.in_cylinder(c.radius + c.star_margin, c.height, c.inner_padding + c.star_margin))
            .collect();

        let palette: Vec<Vec3> = PLANET_PALETTE.iter().filter_map(|h| hex_color(h)).collect();
        self.planets = (0..c.planet_count)
            .map(|i| Planet {
                position: rng.in_cylinder(c.radius, c.height, c.inner_padding),
                scale: rng.random() * c.max_planet_scale,
                color: palette.get(i % palette.len().max(1)).copied().unwrap_or(Vec3::ONE),
            })
            .collect();

        log::debug!("starfield: {} stars, {} planets, height {}", self.stars.len(), self.planets.len(), c.height);
    }

    /// Re-scatter for a new cylinder height. A no-op when it is unchanged.
    pub fn resize(&mut self, height: f32, rng: &mut SpawnRng) {
        if height == self.config.height {
            return;
        }
        self.config.height = height;
        self.scatter(rng);
    }

    /// Turn, advance time and fade.
    ///
    /// While hidden both opacities are forced to zero, so showing the
    /// backdrop again fades it in from nothing.
    pub fn tick(&mut self, delta: f32, visible: bool) {
        self.rotation += delta * self.config.rotation_speed;
        self.elapsed += delta;

        if visible {
            let step = delta * self.config.fade_speed;
            self.star_opacity = (self.star_opacity + step).min(1.0);
            self.planet_opacity = (self.planet_opacity + step).min(1.0);
        } else {
            self.star_opacity = 0.0;
            self.planet_opacity = 0.0;
        }
    }

    pub fn config(&self) -> &StarfieldConfig {
        &self.config
    }

    pub fn stars(&self) -> &[Vec3] {
        &self.stars
    }

    pub fn planets(&self) -> &[Planet] {
        &self.planets
    }

    /// Accumulated turn about Y, radians.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Backdrop orientation.
    pub fn orientation(&self) -> Quat {
        Quat::from_rotation_y(self.rotation)
    }

    /// Seconds since creation; drives star twinkle.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn star_opacity(&self) -> f32 {
        self.star_opacity
    }

    pub fn planet_opacity(&self) -> f32 {
        self.planet_opacity
    }

    pub fn star_vertices(&self) -> Vec<StarVertex> {
        self.stars
            .iter()
            .map(|p| StarVertex { position: p.to_array() })
            .collect()
    }

    /// Raw star position buffer (`vec3<f32>` per star).
    pub fn star_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.stars)
    }

    /// White star sprites at the current opacity.
    pub fn star_uniforms(&self, device_pixel_ratio: f32, zoom: f32) -> PointSpriteUniforms {
        PointSpriteUniforms::new(Vec3::ONE, self.config.star_size, self.star_opacity, device_pixel_ratio, zoom)
    }
}
