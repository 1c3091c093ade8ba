//! Closed spiral path generation
//!
//! One ordered, fixed-length point sequence per world. The parameter runs
//! over `i / (point_count - 1)` so the last point coincides with the first
//! for whole-number `turns`, closing the loop exactly.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_POINT_COUNT, DEFAULT_SHRINK};
use crate::error::ConfigError;

use super::geometry::TorusGeometry;

/// Path generation parameters, independent of any rendering tessellation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathParams {
    /// Revolutions around the main ring
    pub turns: f32,
    /// Revolutions around the tube per full path
    pub spiral_turns: f32,
    /// Number of sample points (>= 2)
    pub point_count: usize,
    /// Fraction of the tube radius the spiral uses
    pub shrink: f32,
}

impl Default for PathParams {
    fn default() -> Self {
        Self {
            turns: 1.0,
            spiral_turns: 3.0,
            point_count: DEFAULT_POINT_COUNT,
            shrink: DEFAULT_SHRINK,
        }
    }
}

/// Ordered, closed sequence of 3D points. Only constructible through
/// [`TrackPath::generate`], which guarantees at least 2 points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackPath {
    points: Vec<Vec3>,
}

impl TrackPath {
    /// Build the spiral: for each sample, a point on the main ring plus a
    /// tube offset rotated around the local radial/vertical basis.
    pub fn generate(geometry: &TorusGeometry, params: &PathParams) -> Result<Self, ConfigError> {
        if params.point_count < 2 {
            return Err(ConfigError::TooFewPoints(params.point_count));
        }
        // Anything above 1 would push points outside the tube
        if !(params.shrink > 0.0 && params.shrink <= 1.0) {
            return Err(ConfigError::BadShrink(params.shrink));
        }

        let tube = geometry.tube_radius * params.shrink;
        let steps = (params.point_count - 1) as f32;

        let points = (0..params.point_count)
            .map(|i| {
                let t = i as f32 / steps;
                let theta_main = t * std::f32::consts::TAU * params.turns;
                let theta_tube = t * std::f32::consts::TAU * params.spiral_turns;

                // Local basis on the ring: radial (outward) and vertical
                let radial = Vec3::new(theta_main.cos(), 0.0, theta_main.sin());
                let offset = (radial * theta_tube.cos() + Vec3::Y * theta_tube.sin()) * tube;

                geometry.center + radial * geometry.main_radius + offset
            })
            .collect();

        Ok(Self { points })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn point(&self, index: usize) -> Vec3 {
        self.points[index]
    }

    /// Read-only view of the point sequence (for minimaps/debug rendering)
    #[inline]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }
}
