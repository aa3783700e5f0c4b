//! Scene data: the cube mesh and GPU texture wrappers.
//!
//! - `cube` holds the static box geometry and its face-to-atlas-slot mapping
//! - `texture` contains the GPU texture wrapper and atlas/depth creation utilities

pub mod cube;
pub mod texture;
