//! Toro Drive - simulation core for a torus-track driving game
//!
//! Core modules:
//! - `track`: toroidal geometry, spiral path generation, progress sampling
//! - `sim`: per-tick controllers (vehicle tracking, trailing viewpoint) and
//!   the world frame loop
//! - `placement`: index resolution, instance lifecycle, template cache,
//!   cleanup registry
//! - `engine`: narrow trait facade over the external rendering/physics
//!   engine, plus a headless in-memory implementation for tests and demos
//!
//! Everything runs single-threaded inside one externally-driven tick; the
//! only asynchronous boundary is template loading, which is polled, never
//! blocked on.

pub mod engine;
pub mod error;
pub mod placement;
pub mod sim;
pub mod track;

pub use error::{ConfigError, LoadError, PhysicsError, SceneError};
pub use sim::{TickInput, World, WorldConfig, WorldContext, WorldEvent};
pub use track::{TorusGeometry, TrackPath};

/// Simulation tuning constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Default number of path sample points
    pub const DEFAULT_POINT_COUNT: usize = 360;
    /// Default fraction of the tube radius the spiral is shrunk into,
    /// keeping the whole path strictly inside the tube
    pub const DEFAULT_SHRINK: f32 = 0.8;

    /// Progress lookahead used for direction sampling
    pub const DIRECTION_EPS: f32 = 0.01;
}

/// Wrap fractional progress into [0, 1). Returns the wrapped value and
/// whether a full revolution boundary was crossed.
#[inline]
pub fn wrap_progress(progress: f32) -> (f32, bool) {
    if progress >= 1.0 {
        (progress.fract(), true)
    } else if progress < 0.0 {
        (progress.rem_euclid(1.0), false)
    } else {
        (progress, false)
    }
}

/// Yaw/pitch (radians) that point a +Z-forward frame at `dir`.
/// Returns `None` for a zero direction.
#[inline]
pub fn yaw_pitch_toward(dir: glam::Vec3) -> Option<(f32, f32)> {
    if dir.length_squared() < 1e-12 {
        return None;
    }
    let yaw = dir.x.atan2(dir.z);
    let horizontal = (dir.x * dir.x + dir.z * dir.z).sqrt();
    let pitch = (-dir.y).atan2(horizontal);
    Some((yaw, pitch))
}
