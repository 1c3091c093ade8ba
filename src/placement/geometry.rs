//! Pure spawn-pose math
//!
//! No lifecycle state lives here: these functions map a path index (or a
//! direct forward offset of the vehicle) plus offsets/scale to a transform.

use glam::{Quat, Vec3};

use crate::engine::Transform;
use crate::track::TrackPath;

/// Tangent direction at a path index, from the segment leaving it. Falls
/// back to the incoming segment at the end of the sequence.
fn tangent_at(path: &TrackPath, index: usize) -> Vec3 {
    let last = path.len() - 1;
    let dir = if index < last {
        path.point(index + 1) - path.point(index)
    } else {
        path.point(last) - path.point(last - 1)
    };
    dir.try_normalize().unwrap_or(Vec3::Z)
}

/// Spawn pose at a path index: path position plus vertical and lateral
/// offsets, oriented along the local tangent.
pub fn pose_at_index(
    path: &TrackPath,
    index: usize,
    vertical_offset: f32,
    lateral_offset: f32,
    scale: Vec3,
) -> Transform {
    let index = index.min(path.len() - 1);
    let tangent = tangent_at(path, index);
    let lateral = Vec3::Y.cross(tangent).try_normalize().unwrap_or(Vec3::X);

    Transform {
        position: path.point(index) + Vec3::Y * vertical_offset + lateral * lateral_offset,
        rotation: Quat::from_rotation_arc(Vec3::Z, tangent),
        scale,
    }
}

/// Spawn pose a fixed distance in front of the vehicle
pub fn pose_ahead_of(
    vehicle_position: Vec3,
    forward: Vec3,
    distance: f32,
    vertical_offset: f32,
    scale: Vec3,
) -> Transform {
    let forward = forward.try_normalize().unwrap_or(Vec3::Z);
    Transform {
        position: vehicle_position + forward * distance + Vec3::Y * vertical_offset,
        rotation: Quat::from_rotation_arc(Vec3::Z, forward),
        scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{PathParams, TorusGeometry, TrackPath};

    fn test_path() -> TrackPath {
        let geo = TorusGeometry::new(Vec3::ZERO, 80.0, 30.0).unwrap();
        TrackPath::generate(&geo, &PathParams::default()).unwrap()
    }

    #[test]
    fn test_pose_sits_on_path_without_offsets() {
        let path = test_path();
        let pose = pose_at_index(&path, 42, 0.0, 0.0, Vec3::ONE);
        assert!((pose.position - path.point(42)).length() < 1e-5);
    }

    #[test]
    fn test_vertical_offset_is_vertical() {
        let path = test_path();
        let base = pose_at_index(&path, 10, 0.0, 0.0, Vec3::ONE);
        let lifted = pose_at_index(&path, 10, 3.0, 0.0, Vec3::ONE);
        let delta = lifted.position - base.position;
        assert!((delta - Vec3::Y * 3.0).length() < 1e-5);
    }

    #[test]
    fn test_lateral_offset_is_perpendicular_to_tangent() {
        let path = test_path();
        let base = pose_at_index(&path, 10, 0.0, 0.0, Vec3::ONE);
        let side = pose_at_index(&path, 10, 0.0, 2.0, Vec3::ONE);
        let delta = side.position - base.position;
        let tangent = base.rotation * Vec3::Z;
        assert!(delta.dot(tangent).abs() < 1e-3);
        assert!((delta.length() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_pose_ahead_of() {
        let pose = pose_ahead_of(Vec3::new(1.0, 2.0, 3.0), Vec3::X, 5.0, 1.0, Vec3::ONE);
        assert!((pose.position - Vec3::new(6.0, 3.0, 3.0)).length() < 1e-5);
        // Rotation turns +Z onto the forward axis
        assert!(((pose.rotation * Vec3::Z) - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn test_end_index_clamped() {
        let path = test_path();
        let pose = pose_at_index(&path, path.len() + 5, 0.0, 0.0, Vec3::ONE);
        assert!((pose.position - path.point(path.len() - 1)).length() < 1e-5);
    }
}
