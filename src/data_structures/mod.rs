//! Engine data structures: everything the renderer reads each frame.
//!
//! - `transform` holds position, Euler rotation and scale plus derived directions
//! - `light` contains the directional, point and spot light records
//! - `texture` contains decoded images and their GPU counterparts
//! - `material` groups texture maps with shading scalars
//! - `mesh` contains vertex/index data with a local transform and material slot
//! - `model` is an ordered set of meshes with a world transform and material table

pub mod light;
pub mod material;
pub mod mesh;
pub mod model;
pub mod texture;
pub mod transform;
