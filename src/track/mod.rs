//! Track geometry and sampling
//!
//! The track is a closed spiral confined to a torus's tube. Everything here
//! is deterministic and read-only after world setup:
//! - `geometry`: the toroidal volume the path is embedded in
//! - `path`: one-shot generation of the ordered point sequence
//! - `sample`: pure progress -> position/direction/index lookups

pub mod geometry;
pub mod path;
pub mod sample;

pub use geometry::TorusGeometry;
pub use path::{PathParams, TrackPath};
pub use sample::{direction_at, nearest_index, position_at};
