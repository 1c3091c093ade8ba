//! Instance lifecycle orchestration
//!
//! `place` resolves indices, acquires templates, spawns instances through
//! the fastest available strategy, and wires up optional physics, thrust
//! windows, and auto-retirement. Placements whose template is still loading
//! return immediately as deferred instances and materialize when the load
//! resolves. Everything acquired here registers exactly one cleanup action.

use std::collections::BTreeMap;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::{BodyId, BodyParams, Engine, NodeId, Transform};
use crate::error::ConfigError;
use crate::track::TrackPath;

use super::cleanup::{CleanupAction, CleanupRegistry};
use super::geometry::pose_at_index;
use super::resolver::{PlacementRequest, resolve};
use super::templates::{Acquire, LoadOutcome, TemplateCache};

/// Opaque handle to a placed instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

/// Handle to a scheduled simulation-time callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// What kind of thing to place, and which asset it instantiates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnDescriptor {
    /// Category prefix used in node names and collision filtering
    /// (e.g. "obstacle", "coin", "portal")
    pub kind: String,
    pub asset_id: String,
}

impl SpawnDescriptor {
    pub fn new(kind: &str, asset_id: &str) -> Self {
        Self {
            kind: kind.to_string(),
            asset_id: asset_id.to_string(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.kind.is_empty() {
            return Err(ConfigError::BadDescriptor("a kind"));
        }
        if self.asset_id.is_empty() {
            return Err(ConfigError::BadDescriptor("an asset id"));
        }
        Ok(())
    }
}

/// A time-boxed launch impulse: applied on spawn, zeroed at `secs`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrustSpec {
    pub impulse: Vec3,
    pub secs: f32,
}

/// Placement options. Defaults place one instance at index 0, unscaled,
/// without physics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementOptions {
    pub request: PlacementRequest,
    pub vertical_offset: f32,
    pub lateral_offset: f32,
    pub scale: Vec3,
    /// Attach a rigid body with these parameters
    pub body: Option<BodyParams>,
    /// Launch impulse window (requires a body)
    pub thrust: Option<ThrustSpec>,
    /// Dispose the instance and release its template after this delay
    pub retire_secs: Option<f32>,
}

impl Default for PlacementOptions {
    fn default() -> Self {
        Self {
            request: PlacementRequest::Default,
            vertical_offset: 0.0,
            lateral_offset: 0.0,
            scale: Vec3::ONE,
            body: None,
            thrust: None,
            retire_secs: None,
        }
    }
}

/// A tracked spawned entity
#[derive(Debug)]
pub struct Instance {
    pub id: InstanceId,
    pub kind: String,
    pub asset_id: String,
    /// Node name, used for collision-event filtering
    pub name: String,
    /// `None` while the template is still loading
    pub node: Option<NodeId>,
    pub body: Option<BodyId>,
}

/// Spawn work parked until its template load resolves
#[derive(Debug, Clone)]
struct PendingSpawn {
    instance: InstanceId,
    asset_id: String,
    transform: Transform,
    body: Option<BodyParams>,
    thrust: Option<ThrustSpec>,
    retire_secs: Option<f32>,
}

#[derive(Debug, Clone, Copy)]
enum TimerAction {
    /// Zero the body's velocity at the end of a thrust window
    EndThrust(InstanceId),
    /// Dispose the instance and release its template reference
    Retire(InstanceId),
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    deadline: f32,
    action: TimerAction,
}

/// Stateful placement orchestrator. Geometry is pure and lives in
/// [`super::geometry`]; this type only manages lifecycle.
#[derive(Debug, Default)]
pub struct PlacementService {
    instances: BTreeMap<InstanceId, Instance>,
    pending: Vec<PendingSpawn>,
    timers: BTreeMap<TimerId, Timer>,
    templates: TemplateCache,
    cleanup: CleanupRegistry,
    next_instance: u64,
    next_timer: u64,
    /// Simulation clock, seconds
    clock: f32,
    disposed: bool,
}

impl PlacementService {
    pub fn new() -> Self {
        Self {
            next_instance: 1,
            next_timer: 1,
            ..Default::default()
        }
    }

    /// Place one instance per resolved index. Deferred instances (template
    /// still loading) are returned immediately and materialize later; an
    /// index whose spawn fails outright is consumed without an instance.
    pub fn place<E: Engine + ?Sized, R: Rng>(
        &mut self,
        path: &TrackPath,
        engine: &mut E,
        rng: &mut R,
        descriptor: &SpawnDescriptor,
        options: &PlacementOptions,
    ) -> Result<Vec<InstanceId>, ConfigError> {
        descriptor.validate()?;
        if path.is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        if self.disposed {
            log::warn!("place called after teardown, ignoring");
            return Ok(Vec::new());
        }

        let indices = resolve(&options.request, path.len(), rng);
        let mut placed = Vec::with_capacity(indices.len());

        for index in indices {
            let id = InstanceId(self.next_instance);
            self.next_instance += 1;

            let transform = pose_at_index(
                path,
                index,
                options.vertical_offset,
                options.lateral_offset,
                options.scale,
            );
            let spawn = PendingSpawn {
                instance: id,
                asset_id: descriptor.asset_id.clone(),
                transform,
                body: options.body,
                thrust: options.thrust,
                retire_secs: options.retire_secs,
            };
            self.instances.insert(
                id,
                Instance {
                    id,
                    kind: descriptor.kind.clone(),
                    asset_id: descriptor.asset_id.clone(),
                    name: format!("{}#{}", descriptor.kind, id.0),
                    node: None,
                    body: None,
                },
            );
            self.cleanup.register(CleanupAction::ReleaseTemplate {
                asset_id: descriptor.asset_id.clone(),
                instance: id,
            });
            self.cleanup.register(CleanupAction::DisposeInstance(id));

            match self.templates.acquire(&descriptor.asset_id, engine) {
                Acquire::Ready(template_node) => {
                    let instancing = self
                        .templates
                        .template(&descriptor.asset_id)
                        .map(|t| t.instancing)
                        .unwrap_or(false);
                    if self.materialize(engine, &spawn, template_node, instancing) {
                        placed.push(id);
                    }
                }
                Acquire::Pending => {
                    self.pending.push(spawn);
                    placed.push(id);
                }
            }
        }
        Ok(placed)
    }

    /// Turn a parked spawn into a live instance. Returns false (and unwinds
    /// the instance) when every spawn strategy fails.
    fn materialize<E: Engine + ?Sized>(
        &mut self,
        engine: &mut E,
        spawn: &PendingSpawn,
        template_node: NodeId,
        instancing: bool,
    ) -> bool {
        let Some(name) = self.instances.get(&spawn.instance).map(|i| i.name.clone()) else {
            return false;
        };

        // Fastest strategy first: instancing > cloning > reassembly
        let node = instancing
            .then(|| engine.instantiate(template_node, &name).ok())
            .flatten()
            .or_else(|| {
                engine
                    .clone_node(template_node, &name)
                    .map_err(|err| log::debug!("{name}: clone failed: {err}"))
                    .ok()
            })
            .or_else(|| {
                engine
                    .reassemble(template_node, &name)
                    .map_err(|err| log::debug!("{name}: reassembly failed: {err}"))
                    .ok()
            });
        let Some(node) = node else {
            log::warn!("{name}: every spawn strategy failed, skipping placement");
            self.templates.release(&spawn.asset_id, engine);
            self.instances.remove(&spawn.instance);
            self.cleanup.forget_instance(spawn.instance);
            return false;
        };

        if let Err(err) = engine.set_transform(node, &spawn.transform) {
            log::warn!("{name}: transform rejected: {err}");
        }
        engine.set_visible(node, true);

        let mut body_id = None;
        if let Some(params) = &spawn.body {
            match engine.attach_body(node, params) {
                Ok(body) => {
                    body_id = Some(body);
                    if let Some(thrust) = &spawn.thrust {
                        if let Err(err) = engine.apply_impulse(body, thrust.impulse) {
                            log::warn!("{name}: thrust impulse failed: {err}");
                        } else {
                            self.schedule(thrust.secs, TimerAction::EndThrust(spawn.instance));
                        }
                    }
                }
                Err(err) => {
                    // Degraded but non-fatal: keep the visual instance
                    log::warn!("{name}: physics attach failed, visual only: {err}");
                }
            }
        }

        if let Some(secs) = spawn.retire_secs {
            self.schedule(secs, TimerAction::Retire(spawn.instance));
        }

        if let Some(instance) = self.instances.get_mut(&spawn.instance) {
            instance.node = Some(node);
            instance.body = body_id;
        }
        true
    }

    fn schedule(&mut self, secs: f32, action: TimerAction) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        self.timers.insert(
            id,
            Timer {
                deadline: self.clock + secs.max(0.0),
                action,
            },
        );
        self.cleanup.register(CleanupAction::CancelTimer(id));
        id
    }

    /// Per-tick bookkeeping: advance the clock, poll template loads,
    /// materialize deferred spawns, and fire due timers.
    pub fn update<E: Engine + ?Sized>(&mut self, engine: &mut E, dt: f32) {
        if self.disposed {
            return;
        }
        self.clock += dt;

        for outcome in self.templates.update(engine) {
            match outcome {
                LoadOutcome::Ready { asset_id, node } => {
                    let instancing = self
                        .templates
                        .template(&asset_id)
                        .map(|t| t.instancing)
                        .unwrap_or(false);
                    let due: Vec<PendingSpawn> = {
                        let (due, rest) = std::mem::take(&mut self.pending)
                            .into_iter()
                            .partition(|p| p.asset_id == asset_id);
                        self.pending = rest;
                        due
                    };
                    for spawn in due {
                        self.materialize(engine, &spawn, node, instancing);
                    }
                }
                LoadOutcome::Failed { asset_id, error } => {
                    let (failed, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
                        .into_iter()
                        .partition(|p| p.asset_id == asset_id);
                    self.pending = rest;
                    for spawn in failed {
                        log::warn!("deferred placement dropped: {error}");
                        self.instances.remove(&spawn.instance);
                        self.cleanup.forget_instance(spawn.instance);
                    }
                }
            }
        }

        let due: Vec<(TimerId, Timer)> = self
            .timers
            .iter()
            .filter(|(_, t)| t.deadline <= self.clock)
            .map(|(&id, &t)| (id, t))
            .collect();
        for (id, timer) in due {
            self.timers.remove(&id);
            self.cleanup.forget_timer(id);
            match timer.action {
                TimerAction::EndThrust(instance) => {
                    if let Some(body) = self.instances.get(&instance).and_then(|i| i.body) {
                        if let Err(err) = engine.set_linear_velocity(body, Vec3::ZERO) {
                            log::debug!("thrust end skipped: {err}");
                        }
                    }
                }
                TimerAction::Retire(instance) => {
                    self.dispose_instance(engine, instance);
                }
            }
        }
    }

    /// Dispose one instance: node, body, template reference, its timers,
    /// and its cleanup entries. Idempotent.
    pub fn dispose_instance<E: Engine + ?Sized>(&mut self, engine: &mut E, id: InstanceId) {
        let Some(instance) = self.instances.remove(&id) else {
            return;
        };
        let stale: Vec<TimerId> = self
            .timers
            .iter()
            .filter(|(_, t)| match t.action {
                TimerAction::EndThrust(i) | TimerAction::Retire(i) => i == id,
            })
            .map(|(&tid, _)| tid)
            .collect();
        for tid in stale {
            self.timers.remove(&tid);
            self.cleanup.forget_timer(tid);
        }
        self.pending.retain(|p| p.instance != id);
        if let Some(body) = instance.body {
            engine.remove_body(body);
        }
        if let Some(node) = instance.node {
            engine.dispose_node(node);
        }
        self.templates.release(&instance.asset_id, engine);
        self.cleanup.forget_instance(id);
        log::debug!("{}: disposed", instance.name);
    }

    /// World teardown: run every registered cleanup action in reverse
    /// registration order, then force-dispose the template cache. Safe to
    /// call twice.
    pub fn teardown<E: Engine + ?Sized>(&mut self, engine: &mut E) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        for action in self.cleanup.drain() {
            match action {
                CleanupAction::CancelTimer(id) => {
                    self.timers.remove(&id);
                }
                CleanupAction::ReleaseTemplate { asset_id, .. } => {
                    self.templates.release(&asset_id, engine);
                }
                CleanupAction::DisposeInstance(id) => {
                    if let Some(instance) = self.instances.remove(&id) {
                        if let Some(body) = instance.body {
                            engine.remove_body(body);
                        }
                        if let Some(node) = instance.node {
                            engine.dispose_node(node);
                        }
                    }
                }
            }
        }
        self.templates.release_all(engine);
        self.pending.clear();
        self.timers.clear();
        self.instances.clear();
        log::info!("placement service torn down");
    }

    /// Match an externally-reported collision by node name. Only names this
    /// service created are reported.
    pub fn match_collision(&self, node_name: &str) -> Option<&Instance> {
        self.instances.values().find(|i| i.name == node_name)
    }

    pub fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(&id)
    }

    /// Live instances, deferred ones included
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Placements still waiting on a template load
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    pub fn cleanup_len(&self) -> usize {
        self.cleanup.len()
    }

    pub fn templates(&self) -> &TemplateCache {
        &self.templates
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}
