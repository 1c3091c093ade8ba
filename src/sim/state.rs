//! Shared per-world simulation state
//!
//! One [`WorldContext`] per world instead of globally shared path state, so
//! multiple worlds (and tests) can coexist. The context owns the path,
//! geometry, and progress bookkeeping; controllers borrow it per tick.

use serde::{Deserialize, Serialize};

use crate::placement::InstanceId;
use crate::track::{TorusGeometry, TrackPath};
use crate::wrap_progress;

/// Read side of the world shared by every controller
#[derive(Debug, Clone)]
pub struct WorldContext {
    pub geometry: TorusGeometry,
    pub path: TrackPath,
    /// Fractional position along the path, [0, 1)
    pub progress: f32,
    /// Completed revolutions
    pub laps: u32,
}

impl WorldContext {
    pub fn new(geometry: TorusGeometry, path: TrackPath) -> Self {
        Self {
            geometry,
            path,
            progress: 0.0,
            laps: 0,
        }
    }

    /// Advance progress, wrapping at the loop seam. Returns the event for a
    /// completed revolution.
    pub fn advance(&mut self, delta: f32) -> Option<WorldEvent> {
        let (wrapped, lapped) = wrap_progress(self.progress + delta);
        self.progress = wrapped;
        if lapped {
            self.laps += 1;
            Some(WorldEvent::RevolutionCompleted { laps: self.laps })
        } else {
            None
        }
    }

    /// External reset (e.g. respawn); does not count as a revolution
    pub fn set_progress(&mut self, progress: f32) {
        self.progress = wrap_progress(progress).0;
    }
}

/// Events surfaced to the host, drained once per frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldEvent {
    /// The vehicle hit a tracked instance
    Collision { instance: InstanceId },
    /// The vehicle hit a tracked portal instance
    PortalEntered,
    /// Progress wrapped past the loop seam
    RevolutionCompleted { laps: u32 },
}

/// Input state for a single tick. `throttle` is the externally-owned
/// progress/speed control, read each tick but never mutated here.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TickInput {
    pub steer_left: bool,
    pub steer_right: bool,
    /// Progress per second
    pub throttle: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::PathParams;
    use glam::Vec3;

    fn ctx() -> WorldContext {
        let geometry = TorusGeometry::new(Vec3::ZERO, 80.0, 30.0).unwrap();
        let path = TrackPath::generate(&geometry, &PathParams::default()).unwrap();
        WorldContext::new(geometry, path)
    }

    #[test]
    fn test_advance_wraps_and_counts_laps() {
        let mut ctx = ctx();
        assert!(ctx.advance(0.6).is_none());
        let event = ctx.advance(0.6).unwrap();
        assert_eq!(event, WorldEvent::RevolutionCompleted { laps: 1 });
        assert!((ctx.progress - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_set_progress_does_not_lap() {
        let mut ctx = ctx();
        ctx.set_progress(2.75);
        assert!((ctx.progress - 0.75).abs() < 1e-5);
        assert_eq!(ctx.laps, 0);
    }
}
