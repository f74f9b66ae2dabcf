//! Offscreen run of the hero scene.
//!
//! Mounts the scene, sweeps the pointer around the arena for N frames and
//! logs what happened. Built with `--features rapier` the run uses full rigid
//! body dynamics; otherwise the ballistic backend, which never reports
//! contacts. `RUST_LOG=debug` shows spawns and registrations.

use clap::Parser;
use spacefx::prelude::*;
use std::error::Error;

const FRAME_DELTA: f32 = 1.0 / 60.0;

#[derive(Parser)]
#[command(name = "spacefx")]
#[command(about = "Run the rocket and rock field scene without a window")]
struct Cli {
    /// Number of frames to simulate
    #[arg(default_value_t = 600)]
    frames: u64,

    /// Fixed seed for rock layout and particle jitter
    #[arg(long)]
    seed: Option<u64>,
}

fn run<P: PhysicsBackend>(cli: &Cli, physics: &mut P) -> Result<(), Box<dyn Error>> {
    let viewport = Viewport::default();
    let mut render = NullRenderer::default();

    let mut config = SceneConfig::default().viewport(viewport);
    if let Some(seed) = cli.seed {
        config = config.seed(seed);
    }

    let modes = ModeMachine::new(RocketMode::Idle)
        .on_enter(RocketMode::Following, |_: &mut ()| log::debug!("rocket locked on pointer"));
    let mut scene = Scene::mount_with_modes(config, modes, physics, &mut render)?;
    scene.transition_rocket(RocketMode::Launching);
    scene.transition_rocket(RocketMode::Following);

    let mut splits = 0;
    let mut contacts = 0;
    for frame in 0..cli.frames {
        // Lissajous sweep over most of the screen.
        let t = frame as f32 * FRAME_DELTA;
        let pointer = Vec2::new((t * 0.7).sin() * 0.8, (t * 1.1).cos() * 0.8);
        let input = FrameInput::new(pointer, viewport);

        let report = scene.frame(FRAME_DELTA, &input, physics, &mut render);
        splits += report.splits.len();
        contacts += report.contacts;
    }

    let stats = scene.exhaust().stats();
    log::info!(
        "{} frames: {} contacts, {} splits, {} rocks left",
        cli.frames,
        contacts,
        splits,
        scene.rocks().len()
    );
    log::info!(
        "exhaust: {} emitted early, {} recycled, {} alive of {}",
        stats.emitted,
        stats.expired,
        scene.exhaust().alive(),
        scene.exhaust().capacity()
    );
    log::info!(
        "render: {} hull uploads, {} releases, {} buffer refreshes",
        render.uploads,
        render.releases,
        render.dirty_marks
    );

    scene.transition_rocket(RocketMode::Resetting);
    scene.unmount(physics, &mut render);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    #[cfg(feature = "rapier")]
    let mut physics = RapierPhysics::new();
    #[cfg(not(feature = "rapier"))]
    let mut physics = HeadlessPhysics::new();

    run(&cli, &mut physics)
}
