//! Vehicle tracking controller
//!
//! One continuous control law with two effective regimes: tracking while
//! the body is away from its path target, settled (velocity held at zero)
//! once it is within `settle_eps`. The distance-scaled boost grows the
//! snap-back with drift, so the body cannot diverge from the path
//! permanently under disturbance.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::engine::{BodyId, PhysicsApi};
use crate::track::position_at;
use crate::yaw_pitch_toward;

use super::state::{TickInput, WorldContext};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavConfig {
    /// Speed cap, units per second
    pub max_speed: f32,
    /// Base pull toward the path target per unit distance
    pub follow_strength: f32,
    /// Extra pull per unit of drift distance
    pub boost_per_unit: f32,
    /// Cap on the drift boost multiplier
    pub boost_cap: f32,
    /// Velocity damping factor, (0, 1]
    pub damping: f32,
    /// Distance below which the body counts as settled
    pub settle_eps: f32,
    /// Impulse magnitude per steer flag
    pub lateral_impulse: f32,
    /// Reduction applied to steer impulses to limit drift contribution
    pub lateral_factor: f32,
    /// Pinned pitch, radians
    pub pitch: f32,
    /// Pinned roll, radians
    pub roll: f32,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            max_speed: 60.0,
            follow_strength: 4.0,
            boost_per_unit: 0.15,
            boost_cap: 3.0,
            damping: 0.9,
            settle_eps: 0.05,
            lateral_impulse: 8.0,
            lateral_factor: 0.35,
            pitch: 0.0,
            roll: 0.0,
        }
    }
}

/// Drives one physics body along the path
#[derive(Debug)]
pub struct NavigationController {
    config: NavConfig,
    body: BodyId,
}

impl NavigationController {
    pub fn new(config: NavConfig, body: BodyId) -> Self {
        Self { config, body }
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    /// One control step. Physics-call failures are transient: logged,
    /// skipped for this tick, retried naturally next tick.
    pub fn tick<E: PhysicsApi + ?Sized>(&self, ctx: &WorldContext, engine: &mut E, input: &TickInput) {
        let position = match engine.body_position(self.body) {
            Ok(p) => p,
            Err(err) => {
                log::debug!("nav tick skipped: {err}");
                return;
            }
        };

        let target = position_at(&ctx.path, ctx.progress);
        let to_target = target - position;
        let distance = to_target.length();

        let velocity = if distance <= self.config.settle_eps {
            Vec3::ZERO
        } else {
            let boost = (1.0 + distance * self.config.boost_per_unit).min(self.config.boost_cap);
            let speed = (distance * self.config.follow_strength * boost).min(self.config.max_speed);
            to_target / distance * speed * self.config.damping
        };
        if let Err(err) = engine.set_linear_velocity(self.body, velocity) {
            log::debug!("nav velocity set failed: {err}");
            return;
        }

        // Discrete steer flags become damped side impulses
        let lateral = velocity
            .cross(Vec3::Y)
            .try_normalize()
            .unwrap_or(Vec3::X);
        let strength = self.config.lateral_impulse * self.config.lateral_factor;
        if input.steer_left {
            if let Err(err) = engine.apply_impulse(self.body, -lateral * strength) {
                log::debug!("steer impulse failed: {err}");
            }
        }
        if input.steer_right {
            if let Err(err) = engine.apply_impulse(self.body, lateral * strength) {
                log::debug!("steer impulse failed: {err}");
            }
        }

        // Pin pitch/roll; yaw follows the velocity direction. A settled
        // body keeps its last heading.
        if let Some((yaw, _)) = yaw_pitch_toward(velocity) {
            let rotation =
                Quat::from_euler(glam::EulerRot::YXZ, yaw, self.config.pitch, self.config.roll);
            if let Err(err) = engine.set_orientation(self.body, rotation) {
                log::debug!("orientation pin failed: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BodyParams, HeadlessEngine, SceneApi};
    use crate::track::{PathParams, TorusGeometry, TrackPath};

    fn setup() -> (WorldContext, HeadlessEngine, NavigationController) {
        let geometry = TorusGeometry::new(Vec3::ZERO, 80.0, 30.0).unwrap();
        let path = TrackPath::generate(&geometry, &PathParams::default()).unwrap();
        let ctx = WorldContext::new(geometry, path);
        let mut engine = HeadlessEngine::new();
        let node = engine.create_node("vehicle");
        let body = engine.attach_body(node, &BodyParams::default()).unwrap();
        let nav = NavigationController::new(NavConfig::default(), body);
        (ctx, engine, nav)
    }

    #[test]
    fn test_pulls_toward_target() {
        let (ctx, mut engine, nav) = setup();
        // Body starts at the origin, far off the path
        nav.tick(&ctx, &mut engine, &TickInput::default());
        let velocity = engine.linear_velocity(nav.body()).unwrap();
        let target = position_at(&ctx.path, 0.0);
        // Velocity points at the target
        assert!(velocity.dot(target.normalize()) > 0.0);
        assert!(velocity.length() <= NavConfig::default().max_speed + 1e-3);
    }

    #[test]
    fn test_settles_at_target() {
        let (ctx, mut engine, nav) = setup();
        let target = position_at(&ctx.path, 0.0);
        // Drive the vehicle node exactly onto the target
        engine.set_linear_velocity(nav.body(), target / 0.5).unwrap();
        engine.step(0.5);
        nav.tick(&ctx, &mut engine, &TickInput::default());
        assert_eq!(engine.linear_velocity(nav.body()).unwrap(), Vec3::ZERO);
    }

    #[test]
    fn test_snapback_grows_with_distance_up_to_cap() {
        let (mut ctx, mut engine, nav) = setup();
        ctx.progress = 0.25;
        // From the origin the vehicle is a full main-radius away: capped pull
        nav.tick(&ctx, &mut engine, &TickInput::default());
        let far_speed = engine.linear_velocity(nav.body()).unwrap().length();

        // From just off the target the pull is much weaker
        let target = position_at(&ctx.path, 0.25);
        engine.set_linear_velocity(nav.body(), target * 0.99).unwrap();
        engine.step(1.0);
        nav.tick(&ctx, &mut engine, &TickInput::default());
        let near_speed = engine.linear_velocity(nav.body()).unwrap().length();
        assert!(near_speed < far_speed);
    }

    #[test]
    fn test_steer_flags_add_lateral_velocity() {
        let (ctx, mut engine, nav) = setup();
        nav.tick(&ctx, &mut engine, &TickInput::default());
        let base = engine.linear_velocity(nav.body()).unwrap();

        // Same control state, steer flag set: the impulse shows up on top
        // of the recomputed tracking velocity
        nav.tick(
            &ctx,
            &mut engine,
            &TickInput {
                steer_right: true,
                ..Default::default()
            },
        );
        let steered = engine.linear_velocity(nav.body()).unwrap();
        assert!((steered - base).length() > 1e-3);
    }

    #[test]
    fn test_missing_body_is_non_fatal() {
        let (ctx, mut engine, nav) = setup();
        engine.remove_body(nav.body());
        // Must not panic; the tick is simply skipped
        nav.tick(&ctx, &mut engine, &TickInput::default());
    }
}
