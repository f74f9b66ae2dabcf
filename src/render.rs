//! Rendering capability and GPU-ready vertex layouts.
//!
//! The rasterizer is an external collaborator. The simulation only needs to
//! hand it hull geometry for each rock and tell it when particle buffers
//! must be re-uploaded.
//!
//! # GPU Layouts
//!
//! | Type | Size | Used for |
//! |------|------|----------|
//! | [`PointVertex`] | 20 bytes | exhaust point sprites |
//! | [`StarVertex`] | 12 bytes | starfield points |
//! | [`PointSpriteUniforms`] | 32 bytes | point sprite material |

use crate::geometry::ConvexHull;
use crate::physics::BodyKey;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Particle attribute buffers that can change between frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParticleBuffer {
    /// `vec3` positions.
    Position,
    /// `f32` normalized ages.
    Age,
}

/// Point sprite materials the scene draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpriteLayer {
    Exhaust,
    Stars,
}

/// Pending re-upload flags for a particle pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirtyBuffers {
    pub position: bool,
    pub age: bool,
}

impl DirtyBuffers {
    /// Both buffers flagged.
    pub const ALL: Self = Self { position: true, age: true };

    /// Whether any buffer needs uploading.
    pub fn any(&self) -> bool {
        self.position || self.age
    }

    /// Forward each set flag to a renderer.
    pub fn notify(&self, render: &mut dyn RenderBackend) {
        if self.position {
            render.mark_dirty(ParticleBuffer::Position);
        }
        if self.age {
            render.mark_dirty(ParticleBuffer::Age);
        }
    }
}

/// What the scene needs from a renderer.
pub trait RenderBackend {
    /// Create or replace the mesh drawn for `key`.
    fn upload_hull(&mut self, key: &BodyKey, hull: &ConvexHull, scale: f32);

    /// Drop the mesh drawn for `key`. Unknown keys are ignored.
    fn release(&mut self, key: &BodyKey);

    /// Re-upload a particle attribute buffer before the next draw.
    fn mark_dirty(&mut self, buffer: ParticleBuffer);

    /// Material uniforms for a sprite layer, pushed every frame.
    fn set_sprite_uniforms(&mut self, layer: SpriteLayer, uniforms: &PointSpriteUniforms);
}

/// Renderer that draws nothing. Used by the headless demo.
#[derive(Debug, Default)]
pub struct NullRenderer {
    /// Number of hull uploads seen.
    pub uploads: usize,
    /// Number of releases seen.
    pub releases: usize,
    /// Number of dirty notifications seen.
    pub dirty_marks: usize,
    /// Last exhaust material pushed.
    pub exhaust_uniforms: Option<PointSpriteUniforms>,
    /// Last star material pushed.
    pub star_uniforms: Option<PointSpriteUniforms>,
}

impl RenderBackend for NullRenderer {
    fn upload_hull(&mut self, _key: &BodyKey, _hull: &ConvexHull, _scale: f32) {
        self.uploads += 1;
    }

    fn release(&mut self, _key: &BodyKey) {
        self.releases += 1;
    }

    fn mark_dirty(&mut self, _buffer: ParticleBuffer) {
        self.dirty_marks += 1;
    }

    fn set_sprite_uniforms(&mut self, layer: SpriteLayer, uniforms: &PointSpriteUniforms) {
        match layer {
            SpriteLayer::Exhaust => self.exhaust_uniforms = Some(*uniforms),
            SpriteLayer::Stars => self.star_uniforms = Some(*uniforms),
        }
    }
}

/// Interleaved point sprite vertex.
///
/// The fragment stage fades a sprite with `1 - age`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
    pub age: f32,
    pub size: f32,
}

/// Starfield point.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct StarVertex {
    pub position: [f32; 3],
}

/// Uniform block for the point sprite material.
///
/// Padded to 16-byte alignment.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PointSpriteUniforms {
    pub color: [f32; 3],
    pub point_size: f32,
    pub device_pixel_ratio: f32,
    pub zoom: f32,
    pub opacity: f32,
    pub _pad: f32,
}

impl PointSpriteUniforms {
    /// Uniforms for an emitter's material.
    pub fn new(color: Vec3, point_size: f32, opacity: f32, device_pixel_ratio: f32, zoom: f32) -> Self {
        Self {
            color: color.to_array(),
            point_size,
            device_pixel_ratio,
            zoom,
            opacity,
            _pad: 0.0,
        }
    }
}
