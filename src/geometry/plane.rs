//! Infinite planes in Hessian normal form.

use glam::Vec3;

/// Plane `normal · p + constant = 0`.
///
/// `normal` is expected to be unit length; signed distances are only
/// metric when it is.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plane {
    pub normal: Vec3,
    pub constant: f32,
}

impl Plane {
    /// The YZ plane; positive side is +X.
    pub const YZ: Self = Self::new(Vec3::X, 0.0);
    /// The XZ plane; positive side is +Y.
    pub const XZ: Self = Self::new(Vec3::Y, 0.0);
    /// The XY plane; positive side is +Z.
    pub const XY: Self = Self::new(Vec3::Z, 0.0);

    pub const fn new(normal: Vec3, constant: f32) -> Self {
        Self { normal, constant }
    }

    /// Plane through `point` facing `normal` (normalized here).
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        let normal = normal.normalize_or(Vec3::X);
        Self::new(normal, -normal.dot(point))
    }

    /// Signed distance; non-negative on the side `normal` points to.
    #[inline]
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.constant
    }

    /// Intersection of segment `start..=end` with the plane.
    ///
    /// Returns `None` when the segment is exactly parallel to the plane or
    /// the crossing lies outside the segment.
    pub fn intersect_segment(&self, start: Vec3, end: Vec3) -> Option<Vec3> {
        let direction = end - start;
        let denominator = self.normal.dot(direction);
        if denominator == 0.0 {
            return None;
        }

        let t = -self.distance_to_point(start) / denominator;
        if (0.0..=1.0).contains(&t) {
            Some(start + direction * t)
        } else {
            None
        }
    }
}
