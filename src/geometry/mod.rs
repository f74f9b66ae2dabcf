//! Geometry used by the rock splitter: planes, convex hulls and plane cuts.

mod hull;
mod plane;
mod split;

pub use hull::ConvexHull;
pub use plane::Plane;
pub use split::{split_hull, split_points, CutPlane, HullSplit};
