//! Placement: index resolution, pose math, instance lifecycle
//!
//! All placement call sites share one resolver, one template cache, and one
//! cleanup registry:
//! - `resolver`: heterogeneous requests -> normalized loop indices
//! - `geometry`: pure spawn-pose math (no lifecycle state)
//! - `templates`: reference-counted asset template cache
//! - `cleanup`: ordered, exactly-once teardown actions
//! - `service`: stateful orchestration of spawned instances and timers

pub mod cleanup;
pub mod geometry;
pub mod resolver;
pub mod service;
pub mod templates;

pub use cleanup::{CleanupAction, CleanupRegistry};
pub use resolver::{PlacementRequest, normalize_index, resolve};
pub use service::{InstanceId, PlacementOptions, PlacementService, SpawnDescriptor, ThrustSpec};
pub use templates::TemplateCache;
