//! In-memory engine implementation
//!
//! Backs the tests and the headless demo binary: nodes and bodies are plain
//! records, loads resolve after a configurable number of polls, and both the
//! instancing capability and load failures are injectable.

use std::collections::{HashMap, HashSet};

use glam::{Quat, Vec3};

use crate::error::{PhysicsError, SceneError};

use super::{
    AssetResolver, BodyId, BodyParams, LoadHandle, LoadState, NodeId, PhysicsApi, SceneApi,
    Transform,
};

#[derive(Debug, Clone)]
struct NodeRecord {
    #[allow(dead_code)]
    name: String,
    transform: Transform,
    visible: bool,
    is_template: bool,
}

#[derive(Debug, Clone)]
struct BodyRecord {
    node: NodeId,
    #[allow(dead_code)]
    params: BodyParams,
    velocity: Vec3,
    orientation: Quat,
}

#[derive(Debug, Clone)]
struct LoadRecord {
    url: String,
    polls_left: u32,
    result: Option<LoadState>,
}

/// Headless engine with injectable capabilities and failure modes
#[derive(Debug)]
pub struct HeadlessEngine {
    nodes: HashMap<NodeId, NodeRecord>,
    bodies: HashMap<BodyId, BodyRecord>,
    loads: HashMap<LoadHandle, LoadRecord>,
    asset_urls: HashMap<String, String>,
    next_node: u64,
    next_body: u64,
    next_load: u64,

    /// Polls before a load resolves (0 = resolves on first poll)
    pub load_latency: u32,
    /// URLs that fail to load
    pub failing_urls: HashSet<String>,
    /// Whether templates support fast instancing
    pub instancing_enabled: bool,
    /// Whether deep cloning works (off forces the reassembly fallback)
    pub cloning_enabled: bool,
    /// Whether body creation works (off degrades placements to visual-only)
    pub physics_enabled: bool,

    /// Loads started, for duplicate-load assertions
    pub loads_begun: u32,
    /// Instances created per strategy
    pub instantiate_count: u32,
    pub clone_count: u32,
    pub reassemble_count: u32,
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            bodies: HashMap::new(),
            loads: HashMap::new(),
            asset_urls: HashMap::new(),
            next_node: 1,
            next_body: 1,
            next_load: 1,
            load_latency: 0,
            failing_urls: HashSet::new(),
            instancing_enabled: true,
            cloning_enabled: true,
            physics_enabled: true,
            loads_begun: 0,
            instantiate_count: 0,
            clone_count: 0,
            reassemble_count: 0,
        }
    }

    /// Register an asset-id -> URL mapping
    pub fn register_asset(&mut self, id: &str, url: &str) {
        self.asset_urls.insert(id.to_string(), url.to_string());
    }

    /// Integrate body velocities into node positions
    pub fn step(&mut self, dt: f32) {
        for body in self.bodies.values() {
            if let Some(node) = self.nodes.get_mut(&body.node) {
                node.transform.position += body.velocity * dt;
            }
        }
    }

    /// Number of live non-template nodes
    pub fn live_instance_count(&self) -> usize {
        self.nodes.values().filter(|n| !n.is_template).count()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn node_visible(&self, node: NodeId) -> Option<bool> {
        self.nodes.get(&node).map(|n| n.visible)
    }

    fn spawn_from(&mut self, template: NodeId, name: &str) -> Result<NodeId, SceneError> {
        let record = self
            .nodes
            .get(&template)
            .ok_or(SceneError::MissingNode(template))?;
        let fresh = NodeRecord {
            name: name.to_string(),
            transform: record.transform,
            visible: true,
            is_template: false,
        };
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(id, fresh);
        Ok(id)
    }
}

impl SceneApi for HeadlessEngine {
    fn create_node(&mut self, name: &str) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(
            id,
            NodeRecord {
                name: name.to_string(),
                transform: Transform::default(),
                visible: true,
                is_template: false,
            },
        );
        id
    }

    fn begin_load(&mut self, url: &str) -> LoadHandle {
        let handle = LoadHandle(self.next_load);
        self.next_load += 1;
        self.loads_begun += 1;
        self.loads.insert(
            handle,
            LoadRecord {
                url: url.to_string(),
                polls_left: self.load_latency,
                result: None,
            },
        );
        handle
    }

    fn poll_load(&mut self, handle: LoadHandle) -> LoadState {
        let url = match self.loads.get_mut(&handle) {
            None => return LoadState::Failed,
            Some(record) => {
                if let Some(result) = &record.result {
                    return result.clone();
                }
                if record.polls_left > 0 {
                    record.polls_left -= 1;
                    return LoadState::Pending;
                }
                record.url.clone()
            }
        };
        let state = if self.failing_urls.contains(&url) {
            LoadState::Failed
        } else {
            let id = NodeId(self.next_node);
            self.next_node += 1;
            self.nodes.insert(
                id,
                NodeRecord {
                    name: format!("template:{url}"),
                    transform: Transform::default(),
                    visible: false,
                    is_template: true,
                },
            );
            LoadState::Ready(id)
        };
        if let Some(record) = self.loads.get_mut(&handle) {
            record.result = Some(state.clone());
        }
        state
    }

    fn instantiate(&mut self, template: NodeId, name: &str) -> Result<NodeId, SceneError> {
        if !self.instancing_enabled {
            return Err(SceneError::InstancingUnsupported(template));
        }
        let id = self.spawn_from(template, name)?;
        self.instantiate_count += 1;
        Ok(id)
    }

    fn supports_instancing(&self, _template: NodeId) -> bool {
        self.instancing_enabled
    }

    fn clone_node(&mut self, template: NodeId, name: &str) -> Result<NodeId, SceneError> {
        if !self.cloning_enabled {
            return Err(SceneError::CloneFailed(template));
        }
        let id = self.spawn_from(template, name)?;
        self.clone_count += 1;
        Ok(id)
    }

    fn reassemble(&mut self, template: NodeId, name: &str) -> Result<NodeId, SceneError> {
        let id = self.spawn_from(template, name)?;
        self.reassemble_count += 1;
        Ok(id)
    }

    fn set_transform(&mut self, node: NodeId, transform: &Transform) -> Result<(), SceneError> {
        let record = self.nodes.get_mut(&node).ok_or(SceneError::MissingNode(node))?;
        record.transform = *transform;
        Ok(())
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(record) = self.nodes.get_mut(&node) {
            record.visible = visible;
        }
    }

    fn node_position(&self, node: NodeId) -> Option<Vec3> {
        self.nodes.get(&node).map(|n| n.transform.position)
    }

    fn dispose_node(&mut self, node: NodeId) {
        self.nodes.remove(&node);
        self.bodies.retain(|_, b| b.node != node);
    }
}

impl PhysicsApi for HeadlessEngine {
    fn attach_body(&mut self, node: NodeId, params: &BodyParams) -> Result<BodyId, PhysicsError> {
        if !self.physics_enabled || !self.nodes.contains_key(&node) {
            return Err(PhysicsError::BodyRejected(node));
        }
        let id = BodyId(self.next_body);
        self.next_body += 1;
        self.bodies.insert(
            id,
            BodyRecord {
                node,
                params: *params,
                velocity: Vec3::ZERO,
                orientation: Quat::IDENTITY,
            },
        );
        Ok(id)
    }

    fn set_linear_velocity(&mut self, body: BodyId, velocity: Vec3) -> Result<(), PhysicsError> {
        let record = self
            .bodies
            .get_mut(&body)
            .ok_or(PhysicsError::MissingBody(body))?;
        record.velocity = velocity;
        Ok(())
    }

    fn linear_velocity(&self, body: BodyId) -> Result<Vec3, PhysicsError> {
        self.bodies
            .get(&body)
            .map(|b| b.velocity)
            .ok_or(PhysicsError::MissingBody(body))
    }

    fn apply_impulse(&mut self, body: BodyId, impulse: Vec3) -> Result<(), PhysicsError> {
        let record = self
            .bodies
            .get_mut(&body)
            .ok_or(PhysicsError::MissingBody(body))?;
        // Unit-mass approximation is fine for a headless backend
        record.velocity += impulse;
        Ok(())
    }

    fn set_orientation(&mut self, body: BodyId, rotation: Quat) -> Result<(), PhysicsError> {
        let record = self
            .bodies
            .get_mut(&body)
            .ok_or(PhysicsError::MissingBody(body))?;
        record.orientation = rotation;
        Ok(())
    }

    fn body_position(&self, body: BodyId) -> Result<Vec3, PhysicsError> {
        let record = self.bodies.get(&body).ok_or(PhysicsError::MissingBody(body))?;
        self.nodes
            .get(&record.node)
            .map(|n| n.transform.position)
            .ok_or(PhysicsError::MissingBody(body))
    }

    fn remove_body(&mut self, body: BodyId) {
        self.bodies.remove(&body);
    }
}

impl AssetResolver for HeadlessEngine {
    fn resolve_url(&self, asset_id: &str) -> String {
        self.asset_urls
            .get(asset_id)
            .cloned()
            .unwrap_or_else(|| format!("headless://{asset_id}"))
    }
}
