//! Per-tick simulation
//!
//! All frame-loop logic lives here. This module must stay single-threaded
//! and deterministic:
//! - Fixed timestep, driven externally through `World::tick`
//! - Seeded RNG only
//! - No rendering or platform dependencies; the engine is a trait object
//!   of narrow facades

pub mod nav;
pub mod state;
pub mod viewpoint;
pub mod world;

pub use nav::{NavConfig, NavigationController};
pub use state::{TickInput, WorldContext, WorldEvent};
pub use viewpoint::{ViewpointConfig, ViewpointController};
pub use world::{World, WorldConfig};
