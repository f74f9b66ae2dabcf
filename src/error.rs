//! Error types for spacefx.
//!
//! Only configuration can fail. Degenerate geometry and missing engine
//! collaborators are absorbed by the simulation (empty hulls, origin
//! anchors) and never surface here.

use glam::Vec3;
use std::fmt;

/// Errors raised when validating a scene or component configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// An emitter was configured with `max_particles == 0`.
    ZeroCapacity,
    /// Particle lifetime must be finite and greater than zero.
    InvalidLifetime(f32),
    /// Emission rate must be finite and greater than zero.
    InvalidEmissionRate(f32),
    /// Respawn box extents must not be negative.
    NegativeBoxSize(Vec3),
    /// Size variance must not be negative.
    NegativeSizeVariance(f32),
    /// The placement grid has fewer cells than rocks to place.
    GridTooSmall {
        /// Number of cells in the grid.
        cells: usize,
        /// Number of rocks requested.
        rocks: usize,
    },
    /// Grid cell size must be finite and greater than zero.
    InvalidCellSize(f32),
    /// Rock scale range is empty or not positive.
    InvalidScaleRange {
        /// Lower bound (inclusive).
        min: f32,
        /// Upper bound (exclusive).
        max: f32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroCapacity => write!(f, "Emitter capacity must be at least one particle"),
            ConfigError::InvalidLifetime(v) => write!(f, "Particle lifetime must be a positive number of seconds, got {}", v),
            ConfigError::InvalidEmissionRate(v) => write!(f, "Emission rate must be a positive number of particles per second, got {}", v),
            ConfigError::NegativeBoxSize(v) => write!(f, "Respawn box size must not be negative, got ({}, {}, {})", v.x, v.y, v.z),
            ConfigError::NegativeSizeVariance(v) => write!(f, "Particle size variance must not be negative, got {}", v),
            ConfigError::GridTooSmall { cells, rocks } => {
                write!(f, "Placement grid has {} cells but {} rocks were requested", cells, rocks)
            }
            ConfigError::InvalidCellSize(v) => write!(f, "Grid cell size must be a positive number, got {}", v),
            ConfigError::InvalidScaleRange { min, max } => {
                write!(f, "Rock scale range must be positive and non-empty, got {}..{}", min, max)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors that can occur when mounting a scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneError {
    /// One of the component configurations was rejected.
    Config(ConfigError),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::Config(e) => write!(f, "Invalid scene configuration: {}", e),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::Config(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SceneError {
    fn from(e: ConfigError) -> Self {
        SceneError::Config(e)
    }
}
