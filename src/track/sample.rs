//! Pure progress -> position/direction/index sampling
//!
//! All functions take the path by reference and never mutate it.

use glam::Vec3;

use crate::consts::DIRECTION_EPS;

use super::path::TrackPath;

/// Position at fractional progress, clamped to [0, 1]. Linear interpolation
/// between the two bracketing sample points. O(1).
pub fn position_at(path: &TrackPath, progress: f32) -> Vec3 {
    let last = path.len() - 1;
    let idx = progress.clamp(0.0, 1.0) * last as f32;
    let lo = idx.floor() as usize;
    let hi = (lo + 1).min(last);
    let frac = idx - lo as f32;
    path.point(lo).lerp(path.point(hi), frac)
}

/// Normalized travel direction at fractional progress, sampled as the
/// difference to a slightly-ahead position.
///
/// Seam policy: the lookahead CLAMPS at 1.0 rather than wrapping, so there
/// is no direction discontinuity approaching the seam; at exactly 1.0 the
/// two samples coincide and `None` is returned. Callers that cross the seam
/// wrap progress before sampling.
pub fn direction_at(path: &TrackPath, progress: f32) -> Option<Vec3> {
    let here = position_at(path, progress);
    let ahead = position_at(path, (progress + DIRECTION_EPS).min(1.0));
    (ahead - here).try_normalize()
}

/// Index of the path point closest to a world point. Linear scan, O(n);
/// called at most once per placement request.
pub fn nearest_index(path: &TrackPath, world_point: Vec3) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (i, &p) in path.points().iter().enumerate() {
        let dist = p.distance_squared(world_point);
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best
}
