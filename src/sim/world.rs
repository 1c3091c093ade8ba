//! World assembly and the frame loop entry point
//!
//! One `World` per play session: it owns the engine facade, the path and
//! progress bookkeeping, both controllers, the placement service, and the
//! seeded RNG. The host drives it with `tick` at a fixed timestep and
//! drains events after each frame.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::engine::{BodyId, BodyParams, Engine, NodeId};
use crate::error::ConfigError;
use crate::placement::{InstanceId, PlacementOptions, PlacementService, SpawnDescriptor};
use crate::track::{PathParams, TorusGeometry, TrackPath};

use super::nav::{NavConfig, NavigationController};
use super::state::{TickInput, WorldContext, WorldEvent};
use super::viewpoint::{ViewpointConfig, ViewpointController};

/// Complete world definition, loadable from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    pub center: Vec3,
    pub main_radius: f32,
    pub tube_radius: f32,
    pub path: PathParams,
    pub nav: NavConfig,
    pub viewpoint: ViewpointConfig,
    pub vehicle_body: BodyParams,
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            main_radius: 80.0,
            tube_radius: 30.0,
            path: PathParams::default(),
            nav: NavConfig::default(),
            viewpoint: ViewpointConfig::default(),
            vehicle_body: BodyParams::default(),
            seed: 0,
        }
    }
}

impl WorldConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))
    }
}

/// A running world instance
pub struct World<E: Engine> {
    engine: E,
    ctx: WorldContext,
    nav: NavigationController,
    viewpoint: ViewpointController,
    placement: PlacementService,
    rng: Pcg32,
    events: Vec<WorldEvent>,
    vehicle_node: NodeId,
    vehicle_body: BodyId,
    disposed: bool,
}

impl<E: Engine> World<E> {
    /// Build geometry, generate the path, and spawn the vehicle. All
    /// configuration mistakes surface here, before the frame loop starts.
    pub fn new(mut engine: E, config: &WorldConfig) -> Result<Self, ConfigError> {
        let geometry = TorusGeometry::new(config.center, config.main_radius, config.tube_radius)?;
        let path = TrackPath::generate(&geometry, &config.path)?;
        let start = path.point(0);

        let vehicle_node = engine.create_node("vehicle");
        let vehicle_body = engine
            .attach_body(vehicle_node, &config.vehicle_body)
            .map_err(|err| ConfigError::VehicleSetup(err.to_string()))?;

        let ctx = WorldContext::new(geometry, path);
        let nav = NavigationController::new(config.nav, vehicle_body);
        let viewpoint = ViewpointController::new(config.viewpoint, start);
        log::info!(
            "world ready: {} path points, main radius {}, tube radius {}",
            ctx.path.len(),
            geometry.main_radius,
            geometry.tube_radius
        );

        Ok(Self {
            engine,
            ctx,
            nav,
            viewpoint,
            placement: PlacementService::new(),
            rng: Pcg32::seed_from_u64(config.seed),
            events: Vec::new(),
            vehicle_node,
            vehicle_body,
            disposed: false,
        })
    }

    /// Advance one fixed timestep: progress bookkeeping, vehicle tracking,
    /// viewpoint smoothing, deferred placements, timers.
    pub fn tick(&mut self, input: &TickInput, dt: f32) {
        if self.disposed {
            return;
        }

        if let Some(event) = self.ctx.advance(input.throttle * dt) {
            self.events.push(event);
        }

        self.nav.tick(&self.ctx, &mut self.engine, input);

        match self.engine.body_position(self.vehicle_body) {
            Ok(vehicle_position) => {
                self.viewpoint.tick(&self.ctx, vehicle_position, dt);
            }
            Err(err) => log::debug!("viewpoint tick skipped: {err}"),
        }

        self.placement.update(&mut self.engine, dt);
    }

    /// Sole placement entry point
    pub fn place(
        &mut self,
        descriptor: &SpawnDescriptor,
        options: &PlacementOptions,
    ) -> Result<Vec<InstanceId>, ConfigError> {
        self.placement.place(
            &self.ctx.path,
            &mut self.engine,
            &mut self.rng,
            descriptor,
            options,
        )
    }

    /// Forward an engine-reported collision by node name. Only names owned
    /// by the placement service produce events; portal instances map to
    /// `PortalEntered`.
    pub fn report_collision(&mut self, node_name: &str) {
        if self.disposed {
            return;
        }
        let Some(instance) = self.placement.match_collision(node_name) else {
            return;
        };
        let event = if instance.kind == "portal" {
            WorldEvent::PortalEntered
        } else {
            WorldEvent::Collision { instance: instance.id }
        };
        self.events.push(event);
    }

    /// Take the events fired since the last drain
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    /// Tear everything down: placement registry, templates, vehicle.
    /// Idempotent; ticks after disposal are no-ops.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.placement.teardown(&mut self.engine);
        self.engine.remove_body(self.vehicle_body);
        self.engine.dispose_node(self.vehicle_node);
        self.events.clear();
        log::info!("world disposed after {} lap(s)", self.ctx.laps);
    }

    pub fn context(&self) -> &WorldContext {
        &self.ctx
    }

    /// Read-only path for minimaps and debug rendering
    pub fn path(&self) -> &TrackPath {
        &self.ctx.path
    }

    pub fn progress(&self) -> f32 {
        self.ctx.progress
    }

    /// External progress reset (e.g. respawn)
    pub fn set_progress(&mut self, progress: f32) {
        self.ctx.set_progress(progress);
    }

    pub fn vehicle_position(&self) -> Option<Vec3> {
        self.engine.body_position(self.vehicle_body).ok()
    }

    pub fn viewpoint(&self) -> &ViewpointController {
        &self.viewpoint
    }

    pub fn placement(&self) -> &PlacementService {
        &self.placement
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl<E: Engine> Drop for World<E> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::engine::{HeadlessEngine, SceneApi};
    use crate::track::position_at as sample_position;

    fn world() -> World<HeadlessEngine> {
        World::new(HeadlessEngine::new(), &WorldConfig::default()).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let config = WorldConfig {
            tube_radius: -1.0,
            ..Default::default()
        };
        assert!(World::new(HeadlessEngine::new(), &config).is_err());

        let config = WorldConfig {
            path: PathParams {
                point_count: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(World::new(HeadlessEngine::new(), &config).is_err());
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = WorldConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(WorldConfig::from_json(&json).unwrap(), config);
        assert!(WorldConfig::from_json("{not json").is_err());
    }

    #[test]
    fn test_revolution_event_fires_on_wrap() {
        let mut world = world();
        let input = TickInput {
            throttle: 0.6,
            ..Default::default()
        };
        world.tick(&input, 1.0);
        assert!(world.drain_events().is_empty());
        world.tick(&input, 1.0);
        let events = world.drain_events();
        assert_eq!(events, vec![WorldEvent::RevolutionCompleted { laps: 1 }]);
        // Drained means gone
        assert!(world.drain_events().is_empty());
    }

    #[test]
    fn test_vehicle_tracks_path_over_time() {
        let mut world = world();
        let input = TickInput {
            throttle: 0.05,
            ..Default::default()
        };
        for _ in 0..600 {
            world.tick(&input, SIM_DT);
            world.engine_mut().step(SIM_DT);
        }
        let target = sample_position(world.path(), world.progress());
        let vehicle = world.vehicle_position().unwrap();
        // After ten simulated seconds the vehicle rides close to the path
        assert!(vehicle.distance(target) < 10.0);
    }

    #[test]
    fn test_collision_events_filter_by_tracked_names() {
        let mut world = world();
        let obstacle = SpawnDescriptor::new("obstacle", "cube");
        let portal = SpawnDescriptor::new("portal", "ring");
        let obstacle_ids = world.place(&obstacle, &PlacementOptions::default()).unwrap();
        world.place(&portal, &PlacementOptions::default()).unwrap();
        world.tick(&TickInput::default(), SIM_DT);

        let obstacle_name = world
            .placement()
            .instance(obstacle_ids[0])
            .unwrap()
            .name
            .clone();
        world.report_collision(&obstacle_name);
        world.report_collision("portal#2");
        world.report_collision("somebody-elses-node");

        let events = world.drain_events();
        assert_eq!(
            events,
            vec![
                WorldEvent::Collision {
                    instance: obstacle_ids[0]
                },
                WorldEvent::PortalEntered,
            ]
        );
    }

    #[test]
    fn test_dispose_is_idempotent_and_stops_ticks() {
        let mut world = world();
        world
            .place(&SpawnDescriptor::new("obstacle", "cube"), &PlacementOptions::default())
            .unwrap();
        world.tick(&TickInput::default(), SIM_DT);
        world.dispose();
        assert!(world.is_disposed());
        assert_eq!(world.placement().instance_count(), 0);
        assert_eq!(world.engine().live_instance_count(), 0);

        world.dispose();
        let progress = world.progress();
        world.tick(
            &TickInput {
                throttle: 1.0,
                ..Default::default()
            },
            1.0,
        );
        assert_eq!(world.progress(), progress);
    }

    #[test]
    fn test_deterministic_random_placement_per_seed() {
        let mut a = world();
        let mut b = world();
        let descriptor = SpawnDescriptor::new("obstacle", "cube");
        let options = PlacementOptions {
            request: crate::placement::PlacementRequest::Random(8),
            ..Default::default()
        };
        let ids_a = a.place(&descriptor, &options).unwrap();
        let ids_b = b.place(&descriptor, &options).unwrap();
        a.tick(&TickInput::default(), SIM_DT);
        b.tick(&TickInput::default(), SIM_DT);
        let pos = |w: &World<HeadlessEngine>, ids: &[InstanceId]| -> Vec<Vec3> {
            ids.iter()
                .map(|&id| {
                    let node = w.placement().instance(id).unwrap().node.unwrap();
                    w.engine().node_position(node).unwrap()
                })
                .collect()
        };
        assert_eq!(pos(&a, &ids_a), pos(&b, &ids_b));
    }
}
