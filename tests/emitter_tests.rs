//! Integration tests for the particle emitter.
//!
//! These drive a pool through many ticks and check the properties that
//! must hold regardless of frame timing: the long-run emission rate, where
//! particles respawn, and the range of normalized ages.

use spacefx::{EmitterConfig, ParticleEmitter, SpawnRng, Vec3};

fn still(n: usize, rate: f32, lifetime: f32) -> EmitterConfig {
    EmitterConfig::new()
        .max_particles(n)
        .emission_rate(rate)
        .lifetime(lifetime)
        .initial_velocity(0.0)
        .turbulence(0.0)
        .point_source()
}

/// Deterministic but uneven frame times in `[min, max)`.
fn jittered_deltas(seed: u64, count: usize, min: f32, max: f32) -> Vec<f32> {
    let mut rng = SpawnRng::seeded(seed);
    (0..count).map(|_| rng.random_range(min, max)).collect()
}

// ============================================================================
// Emission rate
// ============================================================================

#[test]
fn test_credit_matches_rate_over_time() {
    let rate = 37.0;
    let mut e = ParticleEmitter::seeded(still(5000, rate, 1000.0), Vec3::ZERO, 1).unwrap();

    let deltas = jittered_deltas(9, 600, 0.004, 0.04);
    let total: f64 = deltas.iter().map(|&d| f64::from(d)).sum();
    for d in &deltas {
        e.update(*d, &Vec3::ZERO);
    }

    let expected = total * f64::from(rate);
    let credited = e.stats().credited as f64;
    assert!(
        (credited - expected).abs() <= 1.0,
        "credited {} vs expected {}",
        credited,
        expected
    );
    assert!(e.pending_credit() >= 0.0 && e.pending_credit() < 1.0);
}

#[test]
fn test_rate_independent_of_subdivision() {
    let rate = 12.5;
    let mut coarse = ParticleEmitter::seeded(still(1000, rate, 1000.0), Vec3::ZERO, 1).unwrap();
    let mut fine = ParticleEmitter::seeded(still(1000, rate, 1000.0), Vec3::ZERO, 1).unwrap();

    for _ in 0..8 {
        coarse.update(0.5, &Vec3::ZERO);
    }
    for _ in 0..400 {
        fine.update(0.01, &Vec3::ZERO);
    }

    let a = coarse.stats().credited as i64;
    let b = fine.stats().credited as i64;
    assert!((a - b).abs() <= 1, "coarse {} fine {}", a, b);
}

#[test]
fn test_broken_frame_times_do_not_poison_the_pool() {
    let rate = 20.0;
    let mut e = ParticleEmitter::seeded(still(500, rate, 2.0), Vec3::ZERO, 3).unwrap();

    let mut total = 0.0f64;
    for (i, d) in jittered_deltas(11, 300, 0.004, 0.04).into_iter().enumerate() {
        let d = match i % 10 {
            3 => f32::NAN,
            6 => -d,
            9 => f32::NEG_INFINITY,
            _ => d,
        };
        if d.is_finite() && d > 0.0 {
            total += f64::from(d);
        }
        e.update(d, &Vec3::ZERO);

        assert!(e.pending_credit().is_finite());
        assert!(e.ages().iter().all(|a| a.is_finite() && *a < 1.0));
    }

    let credited = e.stats().credited as f64;
    assert!((credited - total * f64::from(rate)).abs() <= 1.0);
}

#[test]
fn test_no_slot_respawned_twice_per_tick() {
    let mut e = ParticleEmitter::seeded(still(10, 1000.0, 1.0), Vec3::ZERO, 3).unwrap();
    let report = e.update(0.5, &Vec3::ZERO);
    // 500 credits, but only nine unborn slots to spend them on.
    assert_eq!(report.credited, 500);
    assert!(report.emitted <= 9);
    assert_eq!(e.capacity(), 10);
}

// ============================================================================
// Placement
// ============================================================================

#[test]
fn test_respawn_at_anchor_without_box() {
    let anchor = Vec3::new(-400.0, -80.0, 0.0);
    let mut e = ParticleEmitter::seeded(still(20, 40.0, 0.25).initial_velocity(3.0), anchor, 5).unwrap();

    for _ in 0..30 {
        e.update(0.02, &anchor);
        for (age, pos) in e.ages().iter().zip(e.positions()) {
            if *age == 0.0 {
                assert_eq!(*pos, anchor);
            }
        }
    }
}

#[test]
fn test_respawn_inside_box() {
    let config = still(60, 30.0, 0.5).box_size(Vec3::new(30.0, 0.0, 30.0));
    let anchor = Vec3::new(10.0, 20.0, 30.0);
    let mut e = ParticleEmitter::seeded(config, anchor, 6).unwrap();

    let mut seen = 0;
    for _ in 0..100 {
        e.update(0.016, &anchor);
        for (age, pos) in e.ages().iter().zip(e.positions()) {
            if *age == 0.0 {
                let offset = *pos - anchor;
                assert!(offset.x >= -15.0 && offset.x < 15.0);
                assert!(offset.z >= -15.0 && offset.z < 15.0);
                assert_eq!(offset.y, 0.0);
                seen += 1;
            }
        }
    }
    assert!(seen > 0);
}

#[test]
fn test_anchor_follows_moving_target() {
    let mut e = ParticleEmitter::seeded(still(4, 100.0, 0.05), Vec3::ZERO, 2).unwrap();
    let mut anchor = Vec3::ZERO;
    for _ in 0..20 {
        anchor += Vec3::new(5.0, 0.0, 0.0);
        e.update(0.016, &anchor);
    }
    // Short lifetime: everything alive now was born recently, near the anchor.
    for (age, pos) in e.ages().iter().zip(e.positions()) {
        if *age >= 0.0 {
            assert!(pos.distance(anchor) <= 20.0);
        }
    }
}

// ============================================================================
// Ages
// ============================================================================

#[test]
fn test_age_bounds_under_jitter() {
    let config = EmitterConfig::rocket_exhaust();
    let lifetime = config.lifetime;
    let mut e = ParticleEmitter::seeded(config.clone(), Vec3::ZERO, 7).unwrap();
    let floors: Vec<f32> = (0..e.capacity()).map(|i| config.stagger_age(i)).collect();

    for d in jittered_deltas(4, 2000, 0.001, lifetime) {
        let before = e.ages().to_vec();
        e.update(d, &Vec3::new(0.0, -80.0, 0.0));

        for (i, &age) in e.ages().iter().enumerate() {
            assert!(age < 1.0, "slot {} age {}", i, age);
            assert!(age >= floors[i]);
            if before[i] < 0.0 && age < 0.0 {
                assert!(age > before[i]);
            }
        }
    }
}

#[test]
fn test_exhaust_preset_stagger() {
    let e = ParticleEmitter::seeded(EmitterConfig::rocket_exhaust(), Vec3::ZERO, 1).unwrap();
    assert_eq!(e.capacity(), 60);
    assert_eq!(e.ages()[0], 0.0);
    assert!((e.ages()[10] + 1.0).abs() < 1e-6);
    assert!((e.ages()[59] + 5.9).abs() < 1e-5);
}

#[test]
fn test_vertices_mirror_pool() {
    let mut e = ParticleEmitter::seeded(EmitterConfig::rocket_exhaust(), Vec3::ONE, 8).unwrap();
    e.update(0.1, &Vec3::ONE);

    let verts = e.vertices();
    assert_eq!(verts.len(), e.capacity());
    for (i, v) in verts.iter().enumerate() {
        assert_eq!(v.position, e.positions()[i].to_array());
        assert_eq!(v.age, e.ages()[i]);
        assert_eq!(v.size, e.sizes()[i]);
    }
}
