//! Heterogeneous placement requests -> normalized loop indices
//!
//! Priority when several interpretations could apply is fixed by the enum:
//! explicit list > single index > fractional progress > angle > random >
//! default. Every resolved index passes through [`normalize_index`].

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Where along the loop an instance should go
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum PlacementRequest {
    /// Explicit list of indices, possibly negative or out of range
    Indices(Vec<i64>),
    /// Single explicit index
    Index(i64),
    /// Fractional progress in [0, 1]
    Progress(f32),
    /// Angle around the main ring, degrees
    AngleDeg(f32),
    /// N independently random indices
    Random(usize),
    /// Index 0
    #[default]
    Default,
}

/// Map any integer into [0, len). Negative and far-out-of-range input both
/// land on a valid index; an empty path maps everything to 0.
#[inline]
pub fn normalize_index(index: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let len = len as i64;
    (((index % len) + len) % len) as usize
}

/// Resolve a request against a path of `len` points. Always returns at
/// least one index, except for `Random(0)`.
pub fn resolve<R: Rng>(request: &PlacementRequest, len: usize, rng: &mut R) -> Vec<usize> {
    let last = len.saturating_sub(1) as f32;
    match request {
        PlacementRequest::Indices(list) => {
            list.iter().map(|&i| normalize_index(i, len)).collect()
        }
        PlacementRequest::Index(i) => vec![normalize_index(*i, len)],
        PlacementRequest::Progress(p) => {
            vec![normalize_index((p.clamp(0.0, 1.0) * last).round() as i64, len)]
        }
        PlacementRequest::AngleDeg(deg) => {
            let frac = deg.rem_euclid(360.0) / 360.0;
            vec![normalize_index((frac * last).round() as i64, len)]
        }
        PlacementRequest::Random(count) => {
            if len == 0 {
                return vec![0; *count];
            }
            (0..*count).map(|_| rng.random_range(0..len)).collect()
        }
        PlacementRequest::Default => vec![0],
    }
}
