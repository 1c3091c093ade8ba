//! Error taxonomy
//!
//! Three failure classes with distinct propagation rules:
//! - [`ConfigError`]: setup mistakes, raised synchronously before the frame
//!   loop starts; retryable with corrected input
//! - [`SceneError`] / [`LoadError`]: resource problems, degraded gracefully
//!   (warn + fallback), never abort the frame loop
//! - [`PhysicsError`]: per-tick handle failures, skipped for that tick only

use thiserror::Error;

use crate::engine::{BodyId, NodeId};

/// Invalid setup input. Fatal to the call that triggered it, never corrupts
/// shared state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("path needs at least 2 points, got {0}")]
    TooFewPoints(usize),
    #[error("torus radii must be positive (main {main}, tube {tube})")]
    BadRadii { main: f32, tube: f32 },
    #[error("shrink must be in (0, 1], got {0}")]
    BadShrink(f32),
    #[error("bounding box has non-positive extent {0:?}")]
    BadBounds(glam::Vec3),
    #[error("placement descriptor is missing {0}")]
    BadDescriptor(&'static str),
    #[error("cannot place on an empty path")]
    EmptyPath,
    #[error("vehicle setup failed: {0}")]
    VehicleSetup(String),
    #[error("invalid world config: {0}")]
    Parse(String),
}

/// A physics-facade call failed. Callers log and skip the tick; the next
/// tick retries naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PhysicsError {
    #[error("physics body {0:?} no longer exists")]
    MissingBody(BodyId),
    #[error("node {0:?} cannot carry a physics body")]
    BodyRejected(NodeId),
}

/// A scene-graph call failed. Placement falls through its instancing chain
/// or skips the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("node {0:?} no longer exists")]
    MissingNode(NodeId),
    #[error("engine does not support fast instancing for {0:?}")]
    InstancingUnsupported(NodeId),
    #[error("cloning failed for {0:?}")]
    CloneFailed(NodeId),
    #[error("reassembly failed for {0:?}")]
    ReassemblyFailed(NodeId),
}

/// An asset template failed to load. The cache clears its in-flight marker
/// so a later acquire can retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("asset `{id}` failed to load from {url}")]
    Failed { id: String, url: String },
}
