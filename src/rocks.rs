//! The rock field: convex rocks drifting in the plane that break in two
//! when something hits them hard enough.
//!
//! Rocks live in a [`RockMap`] behind an `Arc`. Readers take a
//! [`snapshot`](RockField::snapshot) and keep a consistent view for as long
//! as they hold it; a split swaps in a new map with the parent removed and
//! both fragments inserted in the same step.
//!
//! ```ignore
//! let mut field = RockField::spawn(RockFieldConfig::default(), &mut rng, "1700000000000")?;
//! field.register_all(&mut physics, &mut render);
//!
//! for event in &events {
//!     if let SplitOutcome::Split { parent, children } = field.handle_contact(event, &mut physics, &mut render) {
//!         println!("{} -> {} + {}", parent, children[0], children[1]);
//!     }
//! }
//! ```

use crate::error::ConfigError;
use crate::geometry::{split_hull, ConvexHull, CutPlane};
use crate::physics::{BodyKey, Collider, ContactForceEvent, InteractionGroups, PhysicsBackend, RigidBodyDesc};
use crate::render::RenderBackend;
use crate::spawn::SpawnRng;
use glam::{Quat, Vec3};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One rock.
///
/// `position`, `velocity` and `angular_velocity` are the values the body was
/// created with; the live state belongs to the physics backend.
#[derive(Clone, Debug, PartialEq)]
pub struct Rock {
    /// Hull in the rock's local frame, shared between snapshots.
    pub geometry: Arc<ConvexHull>,
    pub position: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Uniform render and collider scale.
    pub scale: f32,
    /// Fragments of a split are final.
    pub can_split: bool,
}

/// Snapshot of every rock by key.
pub type RockMap = BTreeMap<BodyKey, Rock>;

/// Maps raw engine contact forces to split decisions.
///
/// The defaults bring the engine's large force values into a range where
/// `threshold` is meaningful, and keep the fragment kick in the XY plane.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImpactScaling {
    /// Raw magnitude is divided by this before comparing to `threshold`.
    pub descale: f32,
    /// Raw force vector is divided by this to get the fragment kick.
    pub force_divisor: f32,
    /// Minimum descaled magnitude that splits a rock.
    pub threshold: f32,
    /// Drop the Z component of the kick.
    pub planar: bool,
}

impl Default for ImpactScaling {
    fn default() -> Self {
        Self {
            descale: 100_000.0,
            force_divisor: 100_000.0 / 3.0,
            threshold: 80.0,
            planar: true,
        }
    }
}

impl ImpactScaling {
    /// No rescaling: forces and magnitudes are used as reported.
    pub fn unscaled(threshold: f32) -> Self {
        Self {
            descale: 1.0,
            force_divisor: 1.0,
            threshold,
            planar: false,
        }
    }

    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    #[inline]
    pub fn magnitude(&self, raw: f32) -> f32 {
        raw / self.descale
    }

    pub fn force(&self, raw: Vec3) -> Vec3 {
        let raw = if self.planar { raw.truncate().extend(0.0) } else { raw };
        raw / self.force_divisor
    }
}

/// Parameters of the initial rock field.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RockFieldConfig {
    /// Number of rocks placed on mount.
    pub count: usize,
    pub grid_width: f32,
    pub grid_height: f32,
    /// Side of a placement cell; at most one rock per cell.
    pub cell_size: f32,
    /// Random points fed to the hull of each rock.
    pub hull_points: usize,
    /// Points are drawn in `[-hull_extent, hull_extent]^3`.
    pub hull_extent: f32,
    /// Scale baked into the hull geometry.
    pub hull_scale: f32,
    /// Per-rock scale is uniform in `[scale_min, scale_max)`.
    pub scale_min: f32,
    pub scale_max: f32,
    /// Velocity components are in `[-max_speed/2, max_speed/2)`.
    pub max_speed: f32,
    /// Angular velocity components are in `[-max_spin/2, max_spin/2)`.
    pub max_spin: f32,
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
    pub impact: ImpactScaling,
    pub cut_plane: CutPlane,
}

impl Default for RockFieldConfig {
    fn default() -> Self {
        Self {
            count: 10,
            grid_width: 800.0,
            grid_height: 800.0,
            cell_size: 100.0,
            hull_points: 50,
            hull_extent: 1.5,
            hull_scale: 5.0,
            scale_min: 3.0,
            scale_max: 7.0,
            max_speed: 10.0,
            max_spin: 0.1,
            restitution: 0.9,
            friction: 0.1,
            density: 0.001,
            impact: ImpactScaling::default(),
            cut_plane: CutPlane::default(),
        }
    }
}

impl RockFieldConfig {
    pub fn count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn grid(mut self, width: f32, height: f32, cell_size: f32) -> Self {
        self.grid_width = width;
        self.grid_height = height;
        self.cell_size = cell_size;
        self
    }

    pub fn scale_range(mut self, min: f32, max: f32) -> Self {
        self.scale_min = min;
        self.scale_max = max;
        self
    }

    pub fn impact(mut self, impact: ImpactScaling) -> Self {
        self.impact = impact;
        self
    }

    pub fn cut_plane(mut self, cut_plane: CutPlane) -> Self {
        self.cut_plane = cut_plane;
        self
    }

    /// Number of placement cells in the grid.
    pub fn cells(&self) -> usize {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return 0;
        }
        let x = (self.grid_width / self.cell_size).floor().max(0.0) as usize;
        let y = (self.grid_height / self.cell_size).floor().max(0.0) as usize;
        x * y
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::InvalidCellSize(self.cell_size));
        }
        if !(self.scale_min > 0.0 && self.scale_max >= self.scale_min) {
            return Err(ConfigError::InvalidScaleRange {
                min: self.scale_min,
                max: self.scale_max,
            });
        }
        let cells = self.cells();
        if self.count > cells {
            return Err(ConfigError::GridTooSmall {
                cells,
                rocks: self.count,
            });
        }
        Ok(())
    }

    /// Every cell corner, row by row.
    fn grid_cells(&self) -> Vec<Vec3> {
        let cells_x = (self.grid_width / self.cell_size).floor() as usize;
        let cells_y = (self.grid_height / self.cell_size).floor() as usize;

        let mut cells = Vec::with_capacity(cells_x * cells_y);
        for x in 0..cells_x {
            for y in 0..cells_y {
                cells.push(Vec3::new(
                    x as f32 * self.cell_size - self.grid_width / 2.0,
                    y as f32 * self.cell_size - self.grid_height / 2.0,
                    0.0,
                ));
            }
        }
        cells
    }

    /// Random rock-shaped hull with normals, `hull_scale` baked in.
    pub fn generate_geometry(&self, rng: &mut SpawnRng) -> ConvexHull {
        let points: Vec<Vec3> = (0..self.hull_points)
            .map(|_| rng.centered_vec3(Vec3::splat(self.hull_extent * 2.0)))
            .collect();
        ConvexHull::from_points(&points).with_normals().scaled(self.hull_scale)
    }

    /// Body for `rock`: dynamic, weightless, confined to the XY plane.
    pub fn body_desc(&self, rock: &Rock) -> RigidBodyDesc {
        RigidBodyDesc::dynamic()
            .position(rock.position)
            .linvel(rock.velocity)
            .angvel(rock.angular_velocity)
            .groups(InteractionGroups::ROCKS)
            .enabled_translations(true, true, false)
            .restitution(self.restitution)
            .friction(self.friction)
            .density(self.density)
            .gravity_scale(0.0)
            .collider(Collider::hull(rock.geometry.clone(), rock.scale))
    }
}

/// Why a contact did not split anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The body is not a rock, or was already split this frame.
    UnknownRock,
    /// The rock is a fragment.
    NotSplittable,
    /// The descaled force is under the threshold.
    BelowThreshold,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SplitOutcome {
    Split { parent: BodyKey, children: [BodyKey; 2] },
    Ignored(IgnoreReason),
}

impl SplitOutcome {
    pub fn is_split(&self) -> bool {
        matches!(self, SplitOutcome::Split { .. })
    }
}

/// Keyed rock collection with copy-on-write snapshots.
#[derive(Clone, Debug)]
pub struct RockField {
    config: RockFieldConfig,
    rocks: Arc<RockMap>,
    splits: usize,
}

impl RockField {
    /// Place `config.count` rocks in distinct random grid cells.
    ///
    /// Keys are `{prefix}_rock_{n}` with `n` counting from 1.
    pub fn spawn(config: RockFieldConfig, rng: &mut SpawnRng, prefix: &str) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut cells = config.grid_cells();
        rng.shuffle(&mut cells);

        let mut rocks = RockMap::new();
        for (i, &position) in cells.iter().take(config.count).enumerate() {
            let key = BodyKey::new(format!("{}_rock_{}", prefix, i + 1));
            let scale = rng.random_range(config.scale_min, config.scale_max);
            let velocity = rng.centered_vec3(Vec3::new(config.max_speed, config.max_speed, 0.0));
            let angular_velocity = rng.centered_vec3(Vec3::splat(config.max_spin));
            let geometry = Arc::new(config.generate_geometry(rng));

            log::debug!("spawn {} at {} (scale {:.2}, {} faces)", key, position, scale, geometry.triangle_count());
            rocks.insert(
                key,
                Rock {
                    geometry,
                    position,
                    velocity,
                    angular_velocity,
                    scale,
                    can_split: true,
                },
            );
        }

        Ok(Self::from_rocks(config, rocks))
    }

    /// Field over an explicit set of rocks.
    pub fn from_rocks(config: RockFieldConfig, rocks: RockMap) -> Self {
        Self {
            config,
            rocks: Arc::new(rocks),
            splits: 0,
        }
    }

    pub fn config(&self) -> &RockFieldConfig {
        &self.config
    }

    /// Cheap, consistent view of the current rocks.
    pub fn snapshot(&self) -> Arc<RockMap> {
        Arc::clone(&self.rocks)
    }

    pub fn get(&self, key: &BodyKey) -> Option<&Rock> {
        self.rocks.get(key)
    }

    pub fn contains(&self, key: &BodyKey) -> bool {
        self.rocks.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.rocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rocks.is_empty()
    }

    /// Number of splits performed so far.
    pub fn splits(&self) -> usize {
        self.splits
    }

    /// Create a body and a mesh for every rock.
    pub fn register_all(&self, physics: &mut dyn PhysicsBackend, render: &mut dyn RenderBackend) {
        for (key, rock) in self.rocks.iter() {
            physics.register_body(key, &self.config.body_desc(rock));
            render.upload_hull(key, &rock.geometry, rock.scale);
        }
    }

    /// Remove every body and mesh this field created.
    pub fn release_all(&self, physics: &mut dyn PhysicsBackend, render: &mut dyn RenderBackend) {
        for key in self.rocks.keys() {
            physics.remove_body(key);
            render.release(key);
        }
    }

    /// React to a contact force reported for `event.body`.
    ///
    /// Splits the rock when it is known, splittable and hit hard enough,
    /// then swaps the parent's body and mesh for the fragments'.
    pub fn handle_contact(
        &mut self,
        event: &ContactForceEvent,
        physics: &mut dyn PhysicsBackend,
        render: &mut dyn RenderBackend,
    ) -> SplitOutcome {
        let Some(rock) = self.rocks.get(&event.body) else {
            return SplitOutcome::Ignored(IgnoreReason::UnknownRock);
        };
        if !rock.can_split {
            return SplitOutcome::Ignored(IgnoreReason::NotSplittable);
        }

        let impact = self.config.impact;
        let magnitude = impact.magnitude(event.total_force_magnitude);
        if magnitude < impact.threshold {
            log::trace!("{} hit with {:.1}, below {:.1}", event.body, magnitude, impact.threshold);
            return SplitOutcome::Ignored(IgnoreReason::BelowThreshold);
        }

        let center_of_mass = event
            .body_center_of_mass
            .or_else(|| physics.center_of_mass(&event.body))
            .unwrap_or(rock.position);
        let force = impact.force(event.total_force);
        let orientation = physics.rotation(&event.body).unwrap_or(Quat::IDENTITY);

        let Some(children) = self.split_oriented(&event.body, force, center_of_mass, orientation) else {
            return SplitOutcome::Ignored(IgnoreReason::UnknownRock);
        };

        physics.remove_body(&event.body);
        render.release(&event.body);
        for key in &children {
            if let Some(rock) = self.rocks.get(key) {
                physics.register_body(key, &self.config.body_desc(rock));
                render.upload_hull(key, &rock.geometry, rock.scale);
            }
        }

        log::info!(
            "{} split at {} (impact {:.1}) -> {}, {}",
            event.body,
            center_of_mass,
            magnitude,
            children[0],
            children[1]
        );

        SplitOutcome::Split {
            parent: event.body.clone(),
            children,
        }
    }

    /// Replace `key` with two fragments at `center_of_mass`.
    ///
    /// Fragment `A` moves with `velocity + force`, fragment `B` with
    /// `velocity - force`. Neither can split again. Returns `None` when
    /// `key` is not in the field. Only the map is touched; no backend sees
    /// the change.
    pub fn split(&mut self, key: &BodyKey, force: Vec3, center_of_mass: Vec3) -> Option<[BodyKey; 2]> {
        self.split_oriented(key, force, center_of_mass, Quat::IDENTITY)
    }

    /// [`split`](Self::split) for a rock whose body is turned by
    /// `orientation`, which places an impact-aligned cut in the hull's frame.
    pub fn split_oriented(
        &mut self,
        key: &BodyKey,
        force: Vec3,
        center_of_mass: Vec3,
        orientation: Quat,
    ) -> Option<[BodyKey; 2]> {
        let parent = self.rocks.get(key)?.clone();

        let plane = self.config.cut_plane.resolve(force, orientation);
        let [positive, negative] = split_hull(&parent.geometry, &plane);
        for (side, hull) in [("A", &positive), ("B", &negative)] {
            if hull.is_empty() {
                log::warn!("fragment {}{} of {} has no volume", key, side, key);
            }
        }

        let fragment = |geometry: ConvexHull, velocity: Vec3| Rock {
            geometry: Arc::new(geometry),
            position: center_of_mass,
            velocity,
            angular_velocity: parent.angular_velocity,
            scale: parent.scale,
            can_split: false,
        };

        let children = [key.child("A"), key.child("B")];
        let rocks = Arc::make_mut(&mut self.rocks);
        rocks.remove(key);
        rocks.insert(children[0].clone(), fragment(positive, parent.velocity + force));
        rocks.insert(children[1].clone(), fragment(negative, parent.velocity - force));
        self.splits += 1;

        Some(children)
    }
}
