//! Trailing viewpoint controller
//!
//! Smooths a chase viewpoint toward a point behind and above the vehicle,
//! aims it at a look-ahead sample of the path, and clamps the result so it
//! can never leave the torus tube, however hard the smoothing lags.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::track::{direction_at, position_at};
use crate::yaw_pitch_toward;

use super::state::WorldContext;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewpointConfig {
    /// Distance behind the vehicle
    pub follow_distance: f32,
    /// Height above the vehicle
    pub follow_height: f32,
    /// Progress lookahead for the aim target
    pub look_ahead: f32,
    /// Position smoothing rate, per second
    pub pos_smooth: f32,
    /// Orientation smoothing rate, per second
    pub rot_smooth: f32,
    /// Kept distance from the tube wall
    pub margin: f32,
}

impl Default for ViewpointConfig {
    fn default() -> Self {
        Self {
            follow_distance: 12.0,
            follow_height: 4.0,
            look_ahead: 0.02,
            pos_smooth: 6.0,
            rot_smooth: 8.0,
            margin: 2.0,
        }
    }
}

/// Smoothed trailing viewpoint, bounded inside the tube
#[derive(Debug)]
pub struct ViewpointController {
    config: ViewpointConfig,
    position: Vec3,
    rotation: Quat,
}

impl ViewpointController {
    pub fn new(config: ViewpointConfig, start: Vec3) -> Self {
        Self {
            config,
            position: start,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// One smoothing step. A degenerate forward direction (exactly at the
    /// loop seam) skips the tick without touching state.
    pub fn tick(&mut self, ctx: &WorldContext, vehicle_position: Vec3, dt: f32) {
        let Some(forward) = direction_at(&ctx.path, ctx.progress) else {
            return;
        };

        let desired = vehicle_position - forward * self.config.follow_distance
            + Vec3::Y * self.config.follow_height;
        // Exponential smoothing: rate-based, stable for any dt
        let pos_t = 1.0 - (-self.config.pos_smooth * dt).exp();
        let position = self.position.lerp(desired, pos_t);

        let look_target = position_at(&ctx.path, (ctx.progress + self.config.look_ahead).min(1.0));
        let Some((yaw, pitch)) = yaw_pitch_toward(look_target - position) else {
            return;
        };
        let desired_rotation = Quat::from_euler(glam::EulerRot::YXZ, yaw, pitch, 0.0);
        let rot_t = 1.0 - (-self.config.rot_smooth * dt).exp();

        self.position = self.clamp_to_tube(ctx, position);
        self.rotation = self.rotation.slerp(desired_rotation, rot_t);
    }

    /// Keep the viewpoint's horizontal distance from the torus center in
    /// `[main - max_offset, main + max_offset]` and its height within
    /// `±max_offset`, with `max_offset = tube_radius - margin`.
    fn clamp_to_tube(&self, ctx: &WorldContext, position: Vec3) -> Vec3 {
        let geo = &ctx.geometry;
        let max_offset = (geo.tube_radius - self.config.margin).max(0.0);

        let offset = position - geo.center;
        let horizontal = Vec3::new(offset.x, 0.0, offset.z);
        let radius = horizontal.length();
        let clamped_radius = radius.clamp(geo.main_radius - max_offset, geo.main_radius + max_offset);

        let radial = if radius > 1e-6 {
            horizontal / radius
        } else {
            // Degenerate: directly over the center; push along +X
            Vec3::X
        };
        let height = offset.y.clamp(-max_offset, max_offset);
        geo.center + radial * clamped_radius + Vec3::Y * height
    }
}
