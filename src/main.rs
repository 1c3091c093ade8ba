//! Headless demo entry point
//!
//! Builds a world against the in-memory engine, scatters a few obstacles,
//! and drives the frame loop for a few simulated laps, logging events.

use toro_drive::consts::SIM_DT;
use toro_drive::engine::{BodyParams, HeadlessEngine};
use toro_drive::placement::{PlacementOptions, PlacementRequest, SpawnDescriptor, ThrustSpec};
use toro_drive::sim::{TickInput, World, WorldConfig};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut engine = HeadlessEngine::new();
    engine.load_latency = 3;
    engine.register_asset("cube", "assets/cube.glb");
    engine.register_asset("ring", "assets/ring.glb");

    let config = WorldConfig {
        seed: 42,
        ..Default::default()
    };
    let mut world = match World::new(engine, &config) {
        Ok(world) => world,
        Err(err) => {
            log::error!("world setup failed: {err}");
            std::process::exit(1);
        }
    };

    world
        .place(
            &SpawnDescriptor::new("obstacle", "cube"),
            &PlacementOptions {
                request: PlacementRequest::Random(8),
                body: Some(BodyParams::default()),
                thrust: Some(ThrustSpec {
                    impulse: glam::Vec3::new(0.0, 3.0, 0.0),
                    secs: 0.5,
                }),
                retire_secs: Some(20.0),
                ..Default::default()
            },
        )
        .expect("obstacle placement");
    world
        .place(
            &SpawnDescriptor::new("portal", "ring"),
            &PlacementOptions {
                request: PlacementRequest::AngleDeg(180.0),
                ..Default::default()
            },
        )
        .expect("portal placement");

    let input = TickInput {
        throttle: 0.1, // one lap every ten seconds
        ..Default::default()
    };

    // Thirty simulated seconds at a fixed timestep
    for _ in 0..(30.0 / SIM_DT) as u32 {
        world.tick(&input, SIM_DT);
        world.engine_mut().step(SIM_DT);
        for event in world.drain_events() {
            log::info!("event: {event:?}");
        }
    }

    log::info!(
        "done: progress {:.3}, {} live instance(s)",
        world.progress(),
        world.placement().instance_count()
    );
    world.dispose();
}
