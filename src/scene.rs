//! The whole hero scene: rocket, exhaust, rocks, arena walls and backdrop.
//!
//! A [`Scene`] owns all simulation state. The physics and render backends
//! are borrowed per call, so the caller decides what drives the frame loop.
//!
//! # Frame order
//!
//! 1. Rocket steering (impulse and turn)
//! 2. Physics step
//! 3. Contact handling, which may split rocks
//! 4. Exhaust update at the nozzle, then dirty buffer notification and
//!    sprite uniforms
//! 5. Backdrop tick and star uniforms
//!
//! ```ignore
//! let mut physics = HeadlessPhysics::new();
//! let mut render = NullRenderer::default();
//! let mut scene = Scene::mount(SceneConfig::default().seed(7), &mut physics, &mut render)?;
//!
//! let input = FrameInput::new(Vec2::new(0.3, -0.2), Viewport::default());
//! let report = scene.frame(1.0 / 60.0, &input, &mut physics, &mut render);
//! ```

use crate::error::{ConfigError, SceneError};
use crate::mode::{ModeMachine, RocketMode};
use crate::particles::{ParticleEmitter, TickReport};
use crate::physics::{arena_bounds, BodyKey, ContactForceEvent, PhysicsBackend, Viewport};
use crate::render::{RenderBackend, SpriteLayer};
use crate::rocket::{FrameInput, RocketConfig, RocketController};
use crate::rocks::{RockField, RockFieldConfig, SplitOutcome};
use crate::spawn::SpawnRng;
use crate::starfield::{Starfield, StarfieldConfig};
use glam::Vec3;
use std::time::{SystemTime, UNIX_EPOCH};

/// Everything needed to mount a [`Scene`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SceneConfig {
    pub viewport: Viewport,
    pub rocks: RockFieldConfig,
    pub rocket: RocketConfig,
    pub starfield: StarfieldConfig,
    /// Fixed seed for every random source. Clock-seeded when `None`.
    pub seed: Option<u64>,
    /// Prefix of initial rock keys. Mount time in epoch milliseconds when `None`.
    pub id_prefix: Option<String>,
    pub backdrop_visible: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            rocks: RockFieldConfig::default(),
            rocket: RocketConfig::default(),
            starfield: StarfieldConfig::default(),
            seed: None,
            id_prefix: None,
            backdrop_visible: true,
        }
    }
}

impl SceneConfig {
    pub fn viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn rocks(mut self, rocks: RockFieldConfig) -> Self {
        self.rocks = rocks;
        self
    }

    pub fn rocket(mut self, rocket: RocketConfig) -> Self {
        self.rocket = rocket;
        self
    }

    pub fn starfield(mut self, starfield: StarfieldConfig) -> Self {
        self.starfield = starfield;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = Some(prefix.into());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rocks.validate()?;
        self.rocket.exhaust.validate()
    }
}

/// What happened during one [`Scene::frame`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// Impulse applied to the rocket, if it exists.
    pub impulse: Option<Vec3>,
    /// Contact force events reported by the step.
    pub contacts: usize,
    /// Rocks split this frame.
    pub splits: Vec<SplitOutcome>,
    pub particles: TickReport,
    /// Rocks alive after the frame.
    pub rocks: usize,
}

/// The mounted scene.
#[derive(Debug)]
pub struct Scene {
    config: SceneConfig,
    viewport: Viewport,
    rng: SpawnRng,
    rocks: RockField,
    bounds: Vec<BodyKey>,
    rocket: RocketController,
    exhaust: ParticleEmitter,
    starfield: Starfield,
    modes: ModeMachine<RocketMode>,
    events: Vec<ContactForceEvent>,
    frames: u64,
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

impl Scene {
    /// Mount with an idle rocket and no mode hooks.
    pub fn mount<P: PhysicsBackend, R: RenderBackend>(
        config: SceneConfig,
        physics: &mut P,
        render: &mut R,
    ) -> Result<Self, SceneError> {
        Self::mount_with_modes(config, ModeMachine::new(RocketMode::Idle), physics, render)
    }

    /// Mount with a caller-built mode machine. Its initial enter hook runs
    /// once everything is registered.
    pub fn mount_with_modes<P: PhysicsBackend, R: RenderBackend>(
        config: SceneConfig,
        mut modes: ModeMachine<RocketMode>,
        physics: &mut P,
        render: &mut R,
    ) -> Result<Self, SceneError> {
        config.validate()?;

        let mut rng = SpawnRng::new(config.seed, 0x0C0C);
        let prefix = config
            .id_prefix
            .clone()
            .unwrap_or_else(|| epoch_millis().to_string());

        let rocks = RockField::spawn(config.rocks.clone(), &mut rng, &prefix)?;
        rocks.register_all(physics, render);

        let bounds = Self::register_bounds(config.viewport, physics);

        let rocket = RocketController::new(config.rocket.clone());
        rocket.register(physics);

        let exhaust = ParticleEmitter::with_rng(
            config.rocket.exhaust.clone(),
            rocket.exhaust_anchor(physics),
            SpawnRng::new(config.seed, 0xE5),
        )?;

        let starfield = Starfield::new(config.starfield.clone().height(config.viewport.height), &mut rng);

        modes.start(&mut ());

        log::info!(
            "scene mounted: {} rocks (prefix {}), {}x{} viewport, {} exhaust slots",
            rocks.len(),
            prefix,
            config.viewport.width,
            config.viewport.height,
            exhaust.capacity()
        );

        Ok(Self {
            viewport: config.viewport,
            config,
            rng,
            rocks,
            bounds,
            rocket,
            exhaust,
            starfield,
            modes,
            events: Vec::new(),
            frames: 0,
        })
    }

    fn register_bounds(viewport: Viewport, physics: &mut dyn PhysicsBackend) -> Vec<BodyKey> {
        arena_bounds(viewport)
            .into_iter()
            .map(|(key, desc)| {
                physics.register_body(&key, &desc);
                key
            })
            .collect()
    }

    /// Advance everything by `delta` seconds.
    pub fn frame<P: PhysicsBackend, R: RenderBackend>(
        &mut self,
        delta: f32,
        input: &FrameInput,
        physics: &mut P,
        render: &mut R,
    ) -> FrameReport {
        let impulse = self.rocket.steer(delta, input, physics);

        self.events.clear();
        physics.step(delta, &mut self.events);

        let mut splits = Vec::new();
        for event in &self.events {
            let outcome = self.rocks.handle_contact(event, physics, render);
            if outcome.is_split() {
                splits.push(outcome);
            }
        }

        let anchor = self.rocket.exhaust_anchor(physics);
        let particles = self.exhaust.update(delta, &anchor);
        self.exhaust.take_dirty().notify(render);
        render.set_sprite_uniforms(
            SpriteLayer::Exhaust,
            &self.exhaust.uniforms(input.device_pixel_ratio, input.zoom),
        );

        self.starfield.tick(delta, self.config.backdrop_visible);
        render.set_sprite_uniforms(
            SpriteLayer::Stars,
            &self.starfield.star_uniforms(input.device_pixel_ratio, input.zoom),
        );
        self.frames += 1;

        log::trace!(
            "frame {}: {} contacts, {} splits, {} particles alive",
            self.frames,
            self.events.len(),
            splits.len(),
            self.exhaust.alive()
        );

        FrameReport {
            impulse,
            contacts: self.events.len(),
            splits,
            particles,
            rocks: self.rocks.len(),
        }
    }

    /// Rebuild the arena walls and backdrop for a new viewport.
    pub fn resize<P: PhysicsBackend>(&mut self, viewport: Viewport, physics: &mut P) {
        for key in self.bounds.drain(..) {
            physics.remove_body(&key);
        }
        self.bounds = Self::register_bounds(viewport, physics);
        self.starfield.resize(viewport.height, &mut self.rng);
        self.viewport = viewport;
        log::debug!("scene resized to {}x{}", viewport.width, viewport.height);
    }

    /// Move the rocket's mode machine to `mode`.
    pub fn transition_rocket(&mut self, mode: RocketMode) {
        self.modes.transition_to(mode, &mut ());
    }

    pub fn set_backdrop_visible(&mut self, visible: bool) {
        self.config.backdrop_visible = visible;
    }

    /// Remove every body and release every mesh the scene created.
    pub fn unmount<P: PhysicsBackend, R: RenderBackend>(self, physics: &mut P, render: &mut R) {
        self.rocks.release_all(physics, render);
        for key in &self.bounds {
            physics.remove_body(key);
        }
        physics.remove_body(self.rocket.key());
        log::info!("scene unmounted after {} frames, {} splits", self.frames, self.rocks.splits());
    }

    pub fn rocks(&self) -> &RockField {
        &self.rocks
    }

    pub fn rocks_mut(&mut self) -> &mut RockField {
        &mut self.rocks
    }

    pub fn rocket(&self) -> &RocketController {
        &self.rocket
    }

    pub fn exhaust(&self) -> &ParticleEmitter {
        &self.exhaust
    }

    pub fn starfield(&self) -> &Starfield {
        &self.starfield
    }

    pub fn mode(&self) -> RocketMode {
        self.modes.value()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn bounds(&self) -> &[BodyKey] {
        &self.bounds
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
