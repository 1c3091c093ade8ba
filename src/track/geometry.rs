//! Toroidal volume the track is embedded in
//!
//! Immutable after construction. Derived from the rendered volume's bounding
//! box where possible, so logical and visual geometry cannot drift apart.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A donut-shaped volume: center, distance from center to the tube
/// centerline (main radius), and tube radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorusGeometry {
    pub center: Vec3,
    /// Distance from center to the tube centerline
    pub main_radius: f32,
    /// Radius of the tube around the centerline
    pub tube_radius: f32,
    /// Vertical extent of the volume (tube diameter)
    pub height: f32,
}

impl TorusGeometry {
    pub fn new(center: Vec3, main_radius: f32, tube_radius: f32) -> Result<Self, ConfigError> {
        if main_radius <= 0.0 || tube_radius <= 0.0 {
            return Err(ConfigError::BadRadii {
                main: main_radius,
                tube: tube_radius,
            });
        }
        Ok(Self {
            center,
            main_radius,
            tube_radius,
            height: tube_radius * 2.0,
        })
    }

    /// Derive the geometry from an axis-aligned bounding box of a rendered
    /// torus (Y-up). The vertical extent gives the tube diameter; the
    /// horizontal extent gives main + tube radius.
    pub fn from_bounds(min: Vec3, max: Vec3) -> Result<Self, ConfigError> {
        let extent = max - min;
        if extent.x <= 0.0 || extent.y <= 0.0 || extent.z <= 0.0 {
            return Err(ConfigError::BadBounds(extent));
        }
        let tube_radius = extent.y / 2.0;
        let main_radius = extent.x / 2.0 - tube_radius;
        Self::new((min + max) / 2.0, main_radius, tube_radius)
    }

    /// Horizontal distance from the torus center to a point
    #[inline]
    pub fn radial_distance(&self, point: Vec3) -> f32 {
        let offset = point - self.center;
        (offset.x * offset.x + offset.z * offset.z).sqrt()
    }

    /// Point on the main ring at the given angle (radians, in the XZ plane)
    #[inline]
    pub fn ring_point(&self, angle: f32) -> Vec3 {
        self.center + Vec3::new(angle.cos(), 0.0, angle.sin()) * self.main_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_bad_radii() {
        assert!(TorusGeometry::new(Vec3::ZERO, 0.0, 30.0).is_err());
        assert!(TorusGeometry::new(Vec3::ZERO, 80.0, -1.0).is_err());
        assert!(TorusGeometry::new(Vec3::ZERO, 80.0, 30.0).is_ok());
    }

    #[test]
    fn test_from_bounds() {
        // Torus with main radius 80, tube radius 30: box is 220 x 60 x 220
        let geo = TorusGeometry::from_bounds(
            Vec3::new(-110.0, -30.0, -110.0),
            Vec3::new(110.0, 30.0, 110.0),
        )
        .unwrap();
        assert!((geo.main_radius - 80.0).abs() < 1e-4);
        assert!((geo.tube_radius - 30.0).abs() < 1e-4);
        assert_eq!(geo.center, Vec3::ZERO);
    }

    #[test]
    fn test_ring_point_stays_on_ring() {
        let geo = TorusGeometry::new(Vec3::new(5.0, 2.0, -3.0), 80.0, 30.0).unwrap();
        for i in 0..8 {
            let angle = i as f32 * std::f32::consts::FRAC_PI_4;
            let p = geo.ring_point(angle);
            assert!((geo.radial_distance(p) - 80.0).abs() < 1e-3);
            assert!((p.y - geo.center.y).abs() < 1e-6);
        }
    }
}
