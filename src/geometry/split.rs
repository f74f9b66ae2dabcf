//! Cutting a convex hull in two along a plane.
//!
//! Every face is classified against the plane. Faces entirely on one side
//! contribute their vertices to that side. Faces that straddle the plane
//! also contribute their edge crossings to *both* sides, and those crossings
//! are collected as the seam. The seam is appended to both sides once more
//! at the end so each fragment is closed along the cut, then each side is
//! re-hulled independently.

use super::{ConvexHull, Plane};
use glam::{Quat, Vec3};

/// How the cutting plane of a rock split is chosen.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CutPlane {
    /// Always cut along this plane, in the rock's local frame.
    Fixed(Plane),
    /// Cut through the local origin with the normal along the impact force,
    /// so the fragments separate in the direction they are pushed.
    AlongImpact,
}

impl Default for CutPlane {
    fn default() -> Self {
        CutPlane::Fixed(Plane::YZ)
    }
}

impl CutPlane {
    /// Concrete plane, in the rock's local frame, for a world-space impact
    /// `impact` on a rock turned by `orientation`.
    ///
    /// A zero impact falls back to the YZ plane.
    pub fn resolve(&self, impact: Vec3, orientation: Quat) -> Plane {
        match self {
            CutPlane::Fixed(plane) => *plane,
            CutPlane::AlongImpact => {
                let local = orientation.inverse() * impact;
                Plane::new(local.normalize_or(Vec3::X), 0.0)
            }
        }
    }
}

/// Vertex accumulators produced by [`split_points`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HullSplit {
    /// Vertices on or in front of the plane, plus seam points.
    pub positive: Vec<Vec3>,
    /// Vertices behind the plane, plus seam points.
    pub negative: Vec<Vec3>,
    /// Edge/plane crossings of straddling faces.
    pub seam: Vec<Vec3>,
}

impl HullSplit {
    /// Re-hull both sides, with normals. Either side may come back empty
    /// when the plane misses the hull.
    pub fn into_hulls(self) -> [ConvexHull; 2] {
        [
            ConvexHull::from_points(&self.positive).with_normals(),
            ConvexHull::from_points(&self.negative).with_normals(),
        ]
    }
}

/// Partition the faces of `hull` against `plane`.
pub fn split_points(hull: &ConvexHull, plane: &Plane) -> HullSplit {
    let mut split = HullSplit::default();

    for triangle in hull.triangles() {
        let mut positive = Vec::with_capacity(5);
        let mut negative = Vec::with_capacity(5);

        for &v in &triangle {
            if plane.distance_to_point(v) >= 0.0 {
                positive.push(v);
            } else {
                negative.push(v);
            }
        }

        if !positive.is_empty() && !negative.is_empty() {
            for j in 0..3 {
                let Some(crossing) = plane.intersect_segment(triangle[j], triangle[(j + 1) % 3]) else {
                    continue;
                };
                positive.push(crossing);
                negative.push(crossing);
                split.seam.push(crossing);
            }
        }

        split.positive.extend(positive);
        split.negative.extend(negative);
    }

    split.positive.extend_from_slice(&split.seam);
    split.negative.extend_from_slice(&split.seam);
    split
}

/// Cut `hull` along `plane` into a `[positive, negative]` pair of hulls.
pub fn split_hull(hull: &ConvexHull, plane: &Plane) -> [ConvexHull; 2] {
    split_points(hull, plane).into_hulls()
}
