//! Narrow trait facade over the external rendering/physics engine
//!
//! The core never talks to an engine directly; everything goes through
//! these traits so failures surface as `Result`s instead of swallowed
//! exceptions, and so tests can run against [`HeadlessEngine`].

pub mod headless;

pub use headless::HeadlessEngine;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, SceneError};

/// Opaque scene-node handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Opaque physics-body handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u64);

/// Handle to an in-flight asset load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadHandle(pub u64);

/// State of an in-flight load, polled once per tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    /// Loaded into a hidden, inert template node
    Ready(NodeId),
    Failed,
}

/// Node placement in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Rigid-body creation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyParams {
    pub mass: f32,
    pub restitution: f32,
    pub friction: f32,
}

impl Default for BodyParams {
    fn default() -> Self {
        Self {
            mass: 1.0,
            restitution: 0.3,
            friction: 0.5,
        }
    }
}

/// Scene-graph side of the engine: node lifecycle and asset loading
pub trait SceneApi {
    /// Create a bare primitive node (used for the vehicle root)
    fn create_node(&mut self, name: &str) -> NodeId;

    /// Start loading an asset; never blocks
    fn begin_load(&mut self, url: &str) -> LoadHandle;
    /// Poll an in-flight load. Returning `Ready` repeatedly is allowed.
    fn poll_load(&mut self, handle: LoadHandle) -> LoadState;

    /// Fast GPU instancing from a template. Not all templates support it.
    fn instantiate(&mut self, template: NodeId, name: &str) -> Result<NodeId, SceneError>;
    /// Whether `instantiate` can succeed for this template
    fn supports_instancing(&self, template: NodeId) -> bool;
    /// Deep clone of a template node
    fn clone_node(&mut self, template: NodeId, name: &str) -> Result<NodeId, SceneError>;
    /// Manual child-by-child reassembly, the slowest fallback
    fn reassemble(&mut self, template: NodeId, name: &str) -> Result<NodeId, SceneError>;

    fn set_transform(&mut self, node: NodeId, transform: &Transform) -> Result<(), SceneError>;
    fn set_visible(&mut self, node: NodeId, visible: bool);
    fn node_position(&self, node: NodeId) -> Option<Vec3>;
    /// Disposing an unknown node is a no-op
    fn dispose_node(&mut self, node: NodeId);
}

/// Physics side of the engine. Every call can fail if the handle went stale
/// mid-frame; callers log and skip the tick.
pub trait PhysicsApi {
    fn attach_body(&mut self, node: NodeId, params: &BodyParams) -> Result<BodyId, PhysicsError>;
    fn set_linear_velocity(&mut self, body: BodyId, velocity: Vec3) -> Result<(), PhysicsError>;
    fn linear_velocity(&self, body: BodyId) -> Result<Vec3, PhysicsError>;
    fn apply_impulse(&mut self, body: BodyId, impulse: Vec3) -> Result<(), PhysicsError>;
    fn set_orientation(&mut self, body: BodyId, rotation: Quat) -> Result<(), PhysicsError>;
    fn body_position(&self, body: BodyId) -> Result<Vec3, PhysicsError>;
    /// Removing an unknown body is a no-op
    fn remove_body(&mut self, body: BodyId);
}

/// Asset-id to URL resolution. Returns a fallback URL on miss, never fails.
pub trait AssetResolver {
    fn resolve_url(&self, asset_id: &str) -> String;
}

/// Everything the world needs from its engine collaborator
pub trait Engine: SceneApi + PhysicsApi + AssetResolver {}

impl<T: SceneApi + PhysicsApi + AssetResolver> Engine for T {}
