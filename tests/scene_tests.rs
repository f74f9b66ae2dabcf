//! Integration tests for the mounted scene.
//!
//! Every scene here runs against `HeadlessPhysics` with a fixed seed and
//! key prefix so runs are reproducible.

use spacefx::physics::ContactForceEvent;
use spacefx::prelude::*;
use spacefx::rocks::RockMap;
use std::cell::RefCell;
use std::rc::Rc;

fn config() -> SceneConfig {
    SceneConfig::default().seed(99).id_prefix("t")
}

fn mount() -> (Scene, HeadlessPhysics, NullRenderer) {
    let mut physics = HeadlessPhysics::new();
    let mut render = NullRenderer::default();
    let scene = Scene::mount(config(), &mut physics, &mut render).unwrap();
    (scene, physics, render)
}

/// Pointer resting on the rocket's start position.
fn resting_input() -> FrameInput {
    let viewport = Viewport::default();
    FrameInput::new(Vec2::new(-400.0 / (viewport.width / 2.0), 0.0), viewport)
}

fn hard_hit(key: &BodyKey) -> ContactForceEvent {
    ContactForceEvent {
        body: key.clone(),
        other: BodyKey::new("rocket"),
        total_force: Vec3::new(0.0, 2.0e7, 0.0),
        total_force_magnitude: 2.0e7,
        body_center_of_mass: None,
        other_center_of_mass: None,
    }
}

/// No key is present together with one of its fragments, and fragments
/// always come in pairs.
fn assert_consistent(rocks: &RockMap) {
    for key in rocks.keys() {
        assert!(!rocks.contains_key(&key.child("A")), "{} present with its fragment", key);
        let name = key.as_str();
        if let Some(stem) = name.strip_suffix('A') {
            assert!(rocks.contains_key(&BodyKey::new(format!("{}B", stem))));
        }
        if let Some(stem) = name.strip_suffix('B') {
            assert!(rocks.contains_key(&BodyKey::new(format!("{}A", stem))));
        }
    }
}

// ============================================================================
// Mount / unmount
// ============================================================================

#[test]
fn test_mount_registers_everything() {
    let (scene, physics, render) = mount();

    assert_eq!(scene.rocks().len(), 10);
    for n in 1..=10 {
        let key = BodyKey::new(format!("t_rock_{}", n));
        assert!(scene.rocks().contains(&key));
        assert!(physics.contains(&key));
    }
    assert!(physics.contains(scene.rocket().key()));
    assert_eq!(scene.bounds().len(), 4);
    assert_eq!(physics.len(), 10 + 4 + 1);
    assert_eq!(render.uploads, 10);
    assert_eq!(scene.mode(), RocketMode::Idle);
}

#[test]
fn test_mount_rejects_bad_config() {
    let mut physics = HeadlessPhysics::new();
    let mut render = NullRenderer::default();

    let crowded = config().rocks(RockFieldConfig::default().count(100));
    let err = Scene::mount(crowded, &mut physics, &mut render).unwrap_err();
    assert_eq!(err, SceneError::Config(ConfigError::GridTooSmall { cells: 64, rocks: 100 }));

    let rocket = RocketConfig::default().exhaust(EmitterConfig::rocket_exhaust().lifetime(0.0));
    let err = Scene::mount(config().rocket(rocket), &mut physics, &mut render).unwrap_err();
    assert_eq!(err, SceneError::Config(ConfigError::InvalidLifetime(0.0)));
    assert!(physics.is_empty());
}

#[test]
fn test_seeded_scenes_match() {
    let (a, _, _) = mount();
    let (b, _, _) = mount();
    assert_eq!(*a.rocks().snapshot(), *b.rocks().snapshot());
}

#[test]
fn test_unmount_releases_everything() {
    let (mut scene, mut physics, mut render) = mount();
    scene.frame(0.016, &resting_input(), &mut physics, &mut render);
    let rocks = scene.rocks().len();

    scene.unmount(&mut physics, &mut render);
    assert!(physics.is_empty());
    assert!(render.releases >= rocks);
}

// ============================================================================
// Frames
// ============================================================================

#[test]
fn test_contact_splits_rock() {
    let (mut scene, mut physics, mut render) = mount();
    let parent = BodyKey::new("t_rock_3");
    let before = scene.rocks().snapshot();

    physics.push_contact(hard_hit(&parent));
    let report = scene.frame(0.016, &resting_input(), &mut physics, &mut render);

    assert!(report.splits.iter().any(|s| matches!(s, SplitOutcome::Split { parent: p, .. } if *p == parent)));
    assert!(!scene.rocks().contains(&parent));
    assert!(!physics.contains(&parent));
    for child in [parent.child("A"), parent.child("B")] {
        assert!(scene.rocks().contains(&child));
        assert!(physics.contains(&child));
    }
    assert!(render.releases >= 1);

    // The snapshot from before the frame still has the parent and no fragments.
    assert!(before.contains_key(&parent));
    assert!(!before.contains_key(&parent.child("A")));
}

#[test]
fn test_fragments_do_not_split_again() {
    let (mut scene, mut physics, mut render) = mount();
    let parent = BodyKey::new("t_rock_1");

    physics.push_contact(hard_hit(&parent));
    scene.frame(0.016, &resting_input(), &mut physics, &mut render);
    let count = scene.rocks().len();

    physics.push_contact(hard_hit(&parent.child("A")));
    physics.push_contact(hard_hit(&parent));
    scene.frame(0.016, &resting_input(), &mut physics, &mut render);

    assert!(scene.rocks().contains(&parent.child("A")));
    assert!(!scene.rocks().contains(&parent.child("A").child("A")));
    assert!(scene.rocks().len() >= count);
}

#[test]
fn test_snapshots_stay_consistent() {
    let (mut scene, mut physics, mut render) = mount();
    let viewport = Viewport::default();
    let mut held = Vec::new();

    for frame in 0..240u32 {
        let t = frame as f32 / 60.0;
        let input = FrameInput::new(Vec2::new(t.sin() * 0.7, (t * 1.3).cos() * 0.7), viewport);
        if frame % 20 == 0 {
            let n = frame / 20 % 10 + 1;
            physics.push_contact(hard_hit(&BodyKey::new(format!("t_rock_{}", n))));
        }

        let report = scene.frame(1.0 / 60.0, &input, &mut physics, &mut render);
        assert!(report.impulse.is_some_and(|i| i.is_finite()));
        assert_eq!(report.rocks, scene.rocks().len());

        let snapshot = scene.rocks().snapshot();
        assert_consistent(&snapshot);
        held.push(snapshot);
    }

    // Old snapshots were never mutated under their holders.
    for snapshot in &held {
        assert_consistent(snapshot);
    }
    assert!(scene.rocks().splits() >= 10);
}

#[test]
fn test_exhaust_follows_rocket() {
    let (mut scene, mut physics, mut render) = mount();
    let input = FrameInput::new(Vec2::new(0.5, 0.5), Viewport::default());

    // Long enough for every slot to have expired at least once.
    for _ in 0..240 {
        scene.frame(1.0 / 60.0, &input, &mut physics, &mut render);
    }

    let nozzle = scene.rocket().exhaust_anchor(&physics).unwrap();
    let fresh: Vec<Vec3> = scene
        .exhaust()
        .ages()
        .iter()
        .zip(scene.exhaust().positions())
        .filter(|(age, _)| **age == 0.0)
        .map(|(_, p)| *p)
        .collect();
    for p in fresh {
        assert!(p.distance(nozzle) <= 30.0, "{} far from nozzle {}", p, nozzle);
    }
    assert!(render.dirty_marks >= 480);
}

#[test]
fn test_frame_pushes_sprite_uniforms() {
    let (mut scene, mut physics, mut render) = mount();
    let input = resting_input().display(2.0, 0.75);
    scene.frame(1.0 / 60.0, &input, &mut physics, &mut render);

    let config = scene.exhaust().config();
    let exhaust = render.exhaust_uniforms.expect("exhaust uniforms pushed");
    assert_eq!(exhaust.color, config.color.to_array());
    assert_eq!(exhaust.point_size, config.size);
    assert_eq!(exhaust.opacity, config.opacity);
    assert_eq!(exhaust.device_pixel_ratio, 2.0);
    assert_eq!(exhaust.zoom, 0.75);

    let stars = render.star_uniforms.expect("star uniforms pushed");
    assert_eq!(stars.opacity, scene.starfield().star_opacity());
    assert_eq!(stars.device_pixel_ratio, 2.0);
}

#[test]
fn test_backdrop_fades_in_and_hides() {
    let (mut scene, mut physics, mut render) = mount();
    for _ in 0..60 {
        scene.frame(1.0 / 60.0, &resting_input(), &mut physics, &mut render);
    }
    assert!((scene.starfield().star_opacity() - 0.5).abs() < 1e-3);

    scene.set_backdrop_visible(false);
    scene.frame(1.0 / 60.0, &resting_input(), &mut physics, &mut render);
    assert_eq!(scene.starfield().star_opacity(), 0.0);
}

#[test]
fn test_resize_moves_walls() {
    let (mut scene, mut physics, _) = mount();
    let top = BodyKey::new("bounds_top");
    assert_eq!(physics.translation(&top), Some(Vec3::new(0.0, 451.0, 0.0)));

    scene.resize(Viewport::new(2000.0, 1200.0), &mut physics);
    assert_eq!(physics.translation(&top), Some(Vec3::new(0.0, 601.0, 0.0)));
    assert_eq!(scene.viewport(), Viewport::new(2000.0, 1200.0));
    assert_eq!(scene.starfield().config().height, 1200.0);
    assert_eq!(physics.len(), 15);
}

// ============================================================================
// Modes
// ============================================================================

#[test]
fn test_mode_hooks_run_through_scene() {
    let trace = Rc::new(RefCell::new(Vec::new()));
    let (enter, leave) = (Rc::clone(&trace), Rc::clone(&trace));

    let modes = ModeMachine::new(RocketMode::Idle)
        .on_enter(RocketMode::Idle, {
            let t = Rc::clone(&trace);
            move |_: &mut ()| t.borrow_mut().push("enter idle")
        })
        .on_enter(RocketMode::Launching, move |_: &mut ()| enter.borrow_mut().push("enter launching"))
        .on_leave(RocketMode::Idle, move |_: &mut ()| leave.borrow_mut().push("leave idle"));

    let mut physics = HeadlessPhysics::new();
    let mut render = NullRenderer::default();
    let mut scene = Scene::mount_with_modes(config(), modes, &mut physics, &mut render).unwrap();
    assert_eq!(*trace.borrow(), ["enter idle"]);

    scene.transition_rocket(RocketMode::Launching);
    assert_eq!(*trace.borrow(), ["enter idle", "leave idle", "enter launching"]);
    assert_eq!(scene.mode(), RocketMode::Launching);
}
