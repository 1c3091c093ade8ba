//! Full world lifecycle against the headless engine

use glam::Vec3;
use toro_drive::consts::SIM_DT;
use toro_drive::engine::{BodyParams, HeadlessEngine};
use toro_drive::placement::{PlacementOptions, PlacementRequest, SpawnDescriptor};
use toro_drive::sim::{TickInput, World, WorldConfig, WorldEvent};
use toro_drive::track::position_at;

fn world_with(engine: HeadlessEngine) -> World<HeadlessEngine> {
    World::new(engine, &WorldConfig::default()).unwrap()
}

#[test]
fn spawn_drive_retire_teardown() {
    let mut engine = HeadlessEngine::new();
    engine.load_latency = 2;
    let mut world = world_with(engine);

    // Five auto-retiring obstacles, placement deferred behind the load
    let ids = world
        .place(
            &SpawnDescriptor::new("obstacle", "cube"),
            &PlacementOptions {
                request: PlacementRequest::Random(5),
                body: Some(BodyParams::default()),
                retire_secs: Some(1.0),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(ids.len(), 5);
    assert_eq!(world.placement().pending_count(), 5);

    // Drive until the template resolves and the instances materialize
    let input = TickInput {
        throttle: 0.05,
        ..Default::default()
    };
    for _ in 0..3 {
        world.tick(&input, SIM_DT);
    }
    assert_eq!(world.placement().pending_count(), 0);
    assert_eq!(world.placement().instance_count(), 5);
    assert_eq!(world.placement().templates().ref_count("cube"), 5);
    assert_eq!(world.engine().loads_begun, 1);

    // Advance past the retirement deadline with no manual disposal
    let ticks = (1.001 / SIM_DT).ceil() as u32;
    for _ in 0..ticks {
        world.tick(&input, SIM_DT);
        world.engine_mut().step(SIM_DT);
    }
    assert_eq!(world.placement().instance_count(), 0);
    assert_eq!(world.placement().templates().ref_count("cube"), 0);
    assert_eq!(world.engine().live_instance_count(), 1); // only the vehicle

    world.dispose();
    assert_eq!(world.engine().live_instance_count(), 0);
}

#[test]
fn laps_accumulate_and_progress_stays_bounded() {
    let mut world = world_with(HeadlessEngine::new());
    let input = TickInput {
        throttle: 0.25,
        ..Default::default()
    };
    let mut laps = 0;
    for _ in 0..(12.5 / SIM_DT) as u32 {
        world.tick(&input, SIM_DT);
        assert!((0.0..1.0).contains(&world.progress()));
        for event in world.drain_events() {
            if let WorldEvent::RevolutionCompleted { laps: n } = event {
                laps = n;
            }
        }
    }
    // 12.5 seconds at a quarter lap per second
    assert_eq!(laps, 3);
}

#[test]
fn exposed_path_matches_sampling() {
    let world = world_with(HeadlessEngine::new());
    let path = world.path();
    assert_eq!(path.len(), 360);
    assert!((position_at(path, 0.0) - path.point(0)).length() < 1e-3);
    // Loop closure: the end of the loop is the start
    assert!((position_at(path, 1.0) - path.point(0)).length() < 1e-3);
}

#[test]
fn viewpoint_never_leaves_the_tube() {
    let mut world = world_with(HeadlessEngine::new());
    let input = TickInput {
        throttle: 0.2,
        ..Default::default()
    };
    for _ in 0..(5.0 / SIM_DT) as u32 {
        world.tick(&input, SIM_DT);
        world.engine_mut().step(SIM_DT);

        let geometry = world.context().geometry;
        let vp = world.viewpoint().position();
        let radial = geometry.radial_distance(vp);
        let max_offset = geometry.tube_radius; // margin shrinks this further
        assert!((radial - geometry.main_radius).abs() <= max_offset + 1e-3);
        assert!((vp.y - geometry.center.y).abs() <= max_offset + 1e-3);
    }
}

#[test]
fn load_failure_degrades_without_aborting() {
    let mut engine = HeadlessEngine::new();
    engine.failing_urls.insert("headless://missing".to_string());
    let mut world = world_with(engine);

    let ids = world
        .place(
            &SpawnDescriptor::new("obstacle", "missing"),
            &PlacementOptions::default(),
        )
        .unwrap();
    assert_eq!(ids.len(), 1);

    // The failed load drops the deferred instance; the loop keeps running
    for _ in 0..5 {
        world.tick(&TickInput::default(), SIM_DT);
    }
    assert_eq!(world.placement().instance_count(), 0);
    assert!(!world.is_disposed());

    // And a healthy placement still works afterwards
    world
        .place(
            &SpawnDescriptor::new("obstacle", "cube"),
            &PlacementOptions::default(),
        )
        .unwrap();
    world.tick(&TickInput::default(), SIM_DT);
    assert_eq!(world.placement().instance_count(), 1);
}

#[test]
fn nearest_index_round_trip_through_placement() {
    let world = world_with(HeadlessEngine::new());
    let path = world.path();
    let probe = path.point(42) + Vec3::new(0.01, 0.0, 0.0);
    assert_eq!(toro_drive::track::nearest_index(path, probe), 42);
}
