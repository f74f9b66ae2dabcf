//! Convex hulls of 3D point clouds.
//!
//! Hulls are stored as non-indexed triangle soups, three vertices per face
//! with outward counter-clockwise winding, which is what both the collider
//! builder and the mesh uploader consume.
//!
//! Construction goes through `parry3d`. Split seams feed every cut point in
//! more than once, and parry merges those duplicates. Input that spans no
//! volume comes back as an empty hull.

use glam::Vec3;
use parry3d::na::Point3;
use parry3d::transformation::try_convex_hull;

/// Hulls enclosing less than this fraction of their bounding box are flat.
const MIN_VOLUME_FRACTION: f32 = 1e-6;

/// A convex polyhedron as a triangle soup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConvexHull {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
}

impl ConvexHull {
    /// A hull with no faces.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the hull of `points`.
    ///
    /// Degenerate input (fewer than four distinct points, or all points on
    /// a line or plane) yields an empty hull. Non-finite points are ignored.
    /// Normals are not computed; see [`compute_vertex_normals`](Self::compute_vertex_normals).
    pub fn from_points(points: &[Vec3]) -> Self {
        let cloud: Vec<Point3<f32>> = points
            .iter()
            .filter(|p| p.is_finite())
            .map(|p| Point3::new(p.x, p.y, p.z))
            .collect();
        if cloud.len() < 4 {
            return Self::empty();
        }

        let (vertices, indices) = match try_convex_hull(&cloud) {
            Ok(hull) => hull,
            Err(err) => {
                log::debug!("convex hull of {} points failed: {:?}", cloud.len(), err);
                return Self::empty();
            }
        };
        let vertices: Vec<Vec3> = vertices.iter().map(|p| Vec3::new(p.x, p.y, p.z)).collect();
        if vertices.len() < 4 || indices.is_empty() {
            return Self::empty();
        }

        // The vertex mean of a convex hull is inside it.
        let interior = vertices.iter().copied().sum::<Vec3>() / vertices.len() as f32;
        let mut positions = Vec::with_capacity(indices.len() * 3);
        for [a, b, c] in indices {
            let (pa, pb, pc) = (vertices[a as usize], vertices[b as usize], vertices[c as usize]);
            if (pb - pa).cross(pc - pa).dot(interior - pa) > 0.0 {
                positions.extend([pa, pc, pb]);
            } else {
                positions.extend([pa, pb, pc]);
            }
        }

        let hull = Self {
            positions,
            normals: Vec::new(),
        };

        let (lo, hi) = vertices
            .iter()
            .fold((Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        let bounds = (hi - lo).x * (hi - lo).y * (hi - lo).z;
        if !(hull.volume() > bounds * MIN_VOLUME_FRACTION) {
            return Self::empty();
        }
        hull
    }

    /// Fill one flat normal per vertex from its face.
    pub fn compute_vertex_normals(&mut self) {
        self.normals = self
            .positions
            .chunks_exact(3)
            .flat_map(|t| {
                let n = (t[1] - t[0]).cross(t[2] - t[0]).normalize_or_zero();
                [n, n, n]
            })
            .collect();
    }

    /// Builder form of [`compute_vertex_normals`](Self::compute_vertex_normals).
    pub fn with_normals(mut self) -> Self {
        self.compute_vertex_normals();
        self
    }

    /// Uniformly scaled copy about the origin.
    pub fn scaled(&self, factor: f32) -> Self {
        let mut hull = Self {
            positions: self.positions.iter().map(|p| *p * factor).collect(),
            normals: Vec::new(),
        };
        if !self.normals.is_empty() {
            hull.compute_vertex_normals();
        }
        hull
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Triangle soup vertices, three per face.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Per-vertex normals, empty until computed.
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.positions.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Enclosed volume.
    pub fn volume(&self) -> f32 {
        self.triangles()
            .map(|[a, b, c]| a.dot(b.cross(c)) / 6.0)
            .sum()
    }

    /// Center of the enclosed volume, or the origin for an empty hull.
    pub fn centroid(&self) -> Vec3 {
        let mut weighted = Vec3::ZERO;
        let mut volume = 0.0f32;
        for [a, b, c] in self.triangles() {
            let v = a.dot(b.cross(c)) / 6.0;
            weighted += (a + b + c) * (v / 4.0);
            volume += v;
        }

        if volume.abs() > f32::EPSILON {
            weighted / volume
        } else if self.is_empty() {
            Vec3::ZERO
        } else {
            self.positions.iter().copied().sum::<Vec3>() / self.positions.len() as f32
        }
    }

    /// Distance of the farthest vertex from the origin.
    pub fn bounding_radius(&self) -> f32 {
        self.positions.iter().map(|p| p.length()).fold(0.0, f32::max)
    }

    /// Whether `point` is inside or within `tolerance` of the surface.
    pub fn contains_point(&self, point: Vec3, tolerance: f32) -> bool {
        !self.is_empty()
            && self.triangles().all(|[a, b, c]| {
                let n = (b - a).cross(c - a).normalize_or_zero();
                n.dot(point - a) <= tolerance
            })
    }

    /// Raw position buffer (`vec3<f32>` per vertex).
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Raw normal buffer (`vec3<f32>` per vertex).
    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }
}
