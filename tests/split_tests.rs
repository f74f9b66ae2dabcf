//! Integration tests for convex hulls and plane splits.
//!
//! Hulls are built from seeded random clouds shaped like the scene's rocks
//! and cut by a spread of planes.

use spacefx::geometry::{split_hull, split_points, ConvexHull, CutPlane, Plane};
use spacefx::{Quat, RockFieldConfig, SpawnRng, Vec3};

fn rock(seed: u64) -> ConvexHull {
    RockFieldConfig::default().generate_geometry(&mut SpawnRng::seeded(seed))
}

fn planes() -> Vec<Plane> {
    vec![
        Plane::YZ,
        Plane::XZ,
        Plane::XY,
        Plane::from_normal_and_point(Vec3::new(1.0, 1.0, 0.0), Vec3::new(1.5, 0.0, 0.0)),
        Plane::from_normal_and_point(Vec3::new(-0.3, 0.8, 0.5), Vec3::new(0.0, -2.0, 1.0)),
        // Misses every rock: points are within 7.5 of the origin per axis.
        Plane::from_normal_and_point(Vec3::X, Vec3::new(50.0, 0.0, 0.0)),
    ]
}

// ============================================================================
// Hulls
// ============================================================================

#[test]
fn test_hull_contains_its_input() {
    let mut rng = SpawnRng::seeded(21);
    let points: Vec<Vec3> = (0..200).map(|_| rng.centered_vec3(Vec3::new(4.0, 2.0, 6.0))).collect();
    let hull = ConvexHull::from_points(&points);

    assert!(!hull.is_empty());
    for p in &points {
        assert!(hull.contains_point(*p, 1e-3), "{} outside hull", p);
    }
}

#[test]
fn test_hull_normals_face_outward() {
    for seed in 0..10 {
        let hull = rock(seed);
        let center = hull.centroid();
        assert_eq!(hull.normals().len(), hull.positions().len());

        for (tri, normals) in hull.positions().chunks_exact(3).zip(hull.normals().chunks_exact(3)) {
            assert!(normals[0].dot(center - tri[0]) < 0.0);
        }
    }
}

#[test]
fn test_rock_geometry_scaled() {
    let hull = rock(3);
    let extent = hull
        .positions()
        .iter()
        .fold(Vec3::ZERO, |acc, p| acc.max(p.abs()));
    assert!(extent.max_element() <= 7.5 + 1e-4);
    assert!(extent.max_element() > 3.0);
    assert!(hull.volume() > 0.0);
}

// ============================================================================
// Splits
// ============================================================================

#[test]
fn test_split_vertex_accounting() {
    for seed in 0..5 {
        let hull = rock(seed);
        for plane in planes() {
            let split = split_points(&hull, &plane);
            assert_eq!(
                split.positive.len() + split.negative.len(),
                3 * hull.triangle_count() + 4 * split.seam.len()
            );
        }
    }
}

#[test]
fn test_split_sides_respect_plane() {
    let hull = rock(8);
    for plane in planes() {
        let split = split_points(&hull, &plane);
        for p in &split.positive {
            assert!(plane.distance_to_point(*p) >= -1e-4);
        }
        for p in &split.negative {
            assert!(plane.distance_to_point(*p) <= 1e-4);
        }
        for p in &split.seam {
            assert!(plane.distance_to_point(*p).abs() <= 1e-4);
        }
    }
}

#[test]
fn test_split_preserves_volume() {
    for seed in 0..5 {
        let hull = rock(seed);
        let whole = hull.volume();
        for plane in planes() {
            let [a, b] = split_hull(&hull, &plane);
            let parts = a.volume() + b.volume();
            assert!((parts - whole).abs() <= whole * 1e-2, "seed {}: {} vs {}", seed, parts, whole);
        }
    }
}

#[test]
fn test_plane_missing_rock_leaves_one_side_empty() {
    let hull = rock(2);
    let far = Plane::from_normal_and_point(Vec3::X, Vec3::new(50.0, 0.0, 0.0));
    let split = split_points(&hull, &far);

    assert!(split.positive.is_empty());
    assert_eq!(split.negative.len(), hull.positions().len());
    assert!(split.seam.is_empty());

    let [a, b] = split.into_hulls();
    assert!(a.is_empty());
    assert!((b.volume() - hull.volume()).abs() < 1e-2);
}

#[test]
fn test_fragments_are_convex_hulls() {
    let hull = rock(4);
    let [a, b] = split_hull(&hull, &CutPlane::default().resolve(Vec3::ZERO, Quat::IDENTITY));
    for part in [&a, &b] {
        assert!(!part.is_empty());
        assert_eq!(part.normals().len(), part.positions().len());
        for p in part.positions() {
            assert!(part.contains_point(*p, 1e-3));
        }
    }
    assert!(a.centroid().x > 0.0);
    assert!(b.centroid().x < 0.0);
}

#[test]
fn test_random_cuts_rebuild_around_their_points() {
    let mut rng = SpawnRng::seeded(0x5EED);
    let mut fragments = 0;

    for seed in 0..300 {
        let hull = rock(seed);
        let normal = rng.centered_vec3(Vec3::ONE).normalize_or(Vec3::X);
        let point = rng.centered_vec3(Vec3::splat(3.0));
        let plane = Plane::from_normal_and_point(normal, point);

        let split = split_points(&hull, &plane);
        for side in [&split.positive, &split.negative] {
            if side.is_empty() {
                continue;
            }
            let part = ConvexHull::from_points(side);
            if part.is_empty() {
                // Sliver too thin to span a volume.
                continue;
            }
            fragments += 1;
            for p in side.iter() {
                assert!(part.contains_point(*p, 1e-2), "seed {}: {} outside fragment", seed, p);
            }
        }
    }

    assert!(fragments >= 300, "only {} fragments rebuilt", fragments);
}
