//! # spacefx - Space Scene Effects
//!
//! Simulation core of a decorative 3D hero scene: a rocket that chases the
//! pointer trailing exhaust particles, and a field of convex rocks that
//! break in two when hit hard.
//!
//! Rendering is not part of this crate. The scene talks to the renderer and
//! the rigid-body engine through [`RenderBackend`] and [`PhysicsBackend`].
//! [`NullRenderer`] and [`HeadlessPhysics`] let everything run without a GPU
//! or an engine; the `rapier` feature adds a `RapierPhysics` backend on
//! `rapier3d`.
//!
//! ## Quick Start
//!
//! ```ignore
//! use spacefx::prelude::*;
//!
//! fn main() -> Result<(), SceneError> {
//!     let mut physics = HeadlessPhysics::new();
//!     let mut render = NullRenderer::default();
//!     let mut scene = Scene::mount(SceneConfig::default().seed(1), &mut physics, &mut render)?;
//!
//!     let input = FrameInput::new(Vec2::new(0.5, 0.5), Viewport::default());
//!     for _ in 0..600 {
//!         scene.frame(1.0 / 60.0, &input, &mut physics, &mut render);
//!     }
//!     scene.unmount(&mut physics, &mut render);
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Particle emitters
//!
//! An [`EmitterConfig`] describes a fixed pool of point particles;
//! [`ParticleEmitter`] owns the pool and advances it once per frame,
//! respawning expired particles at a moving [`Anchor`]. Emission is
//! credit-based, so the average rate is independent of frame timing.
//!
//! ### Rocks
//!
//! A [`RockField`] holds convex rocks keyed by [`BodyKey`]. When a contact
//! force above the threshold hits a rock that can still split, its hull is
//! cut by a plane into two fragments that fly apart. Readers see either the
//! rock or both fragments, never a mix.
//!
//! ### Rocket modes
//!
//! Fieldless enums derive [`Mode`] and drive a [`ModeMachine`] with
//! per-mode enter and leave hooks:
//!
//! ```ignore
//! #[derive(Mode, Clone, Copy, Debug, PartialEq, Eq)]
//! enum Door {
//!     Open,
//!     Closed,
//! }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`emitter`], [`particles`] | emitter config and particle pool |
//! | [`geometry`] | planes, convex hulls, plane cuts |
//! | [`rocks`] | rock field and split rules |
//! | [`physics`] | physics capability, collision groups, headless backend |
//! | [`render`] | render capability, GPU vertex layouts |
//! | [`rocket`], [`mode`] | pointer steering, mode machine |
//! | [`starfield`] | backdrop |
//! | [`scene`] | orchestration |

extern crate self as spacefx;

pub mod emitter;
pub mod error;
pub mod geometry;
pub mod mode;
pub mod particles;
pub mod physics;
pub mod render;
pub mod rocket;
pub mod rocks;
pub mod scene;
pub mod spawn;
pub mod starfield;

pub use bytemuck;
pub use emitter::EmitterConfig;
pub use error::{ConfigError, SceneError};
pub use geometry::{split_hull, ConvexHull, CutPlane, Plane};
pub use glam::{Quat, Vec2, Vec3};
pub use mode::{Mode, ModeMachine, RocketMode};
pub use particles::{Anchor, ParticleEmitter, TickReport};
pub use physics::{BodyKey, ContactForceEvent, HeadlessPhysics, InteractionGroups, PhysicsBackend, RigidBodyDesc, Viewport};
#[cfg(feature = "rapier")]
pub use physics::RapierPhysics;
pub use render::{NullRenderer, RenderBackend, SpriteLayer};
pub use rocket::{FrameInput, RocketConfig, RocketController};
pub use rocks::{ImpactScaling, Rock, RockField, RockFieldConfig, SplitOutcome};
pub use scene::{FrameReport, Scene, SceneConfig};
pub use spawn::SpawnRng;
pub use starfield::{Starfield, StarfieldConfig};

/// Convenient imports for driving a scene.
///
/// This imports:
/// - [`Scene`], [`SceneConfig`], [`FrameInput`] - the scene and its inputs
/// - [`EmitterConfig`], [`ParticleEmitter`] - particle emitters
/// - [`RockField`], [`RockFieldConfig`] - splittable rocks
/// - [`HeadlessPhysics`], [`NullRenderer`] - backends for headless runs
/// - `RapierPhysics` - rapier3d backend (feature `rapier`)
/// - [`Mode`] - trait and derive macro for mode enums
/// - [`Vec2`], [`Vec3`], [`Quat`] - glam types
pub mod prelude {
    pub use crate::emitter::EmitterConfig;
    pub use crate::error::{ConfigError, SceneError};
    pub use crate::geometry::{ConvexHull, CutPlane, Plane};
    pub use crate::mode::{Mode, ModeMachine, RocketMode};
    pub use crate::particles::{Anchor, ParticleEmitter};
    pub use crate::physics::{BodyKey, HeadlessPhysics, PhysicsBackend, Viewport};
    #[cfg(feature = "rapier")]
    pub use crate::physics::RapierPhysics;
    pub use crate::render::{NullRenderer, RenderBackend, SpriteLayer};
    pub use crate::rocket::{FrameInput, RocketConfig};
    pub use crate::rocks::{ImpactScaling, RockField, RockFieldConfig, SplitOutcome};
    pub use crate::scene::{FrameReport, Scene, SceneConfig};
    pub use crate::spawn::SpawnRng;
    pub use crate::starfield::StarfieldConfig;
    pub use crate::{Quat, Vec2, Vec3};
}
