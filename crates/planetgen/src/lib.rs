//! Procedural planet meshes: layered noise elevation, cube-face and octahedron
//! tessellation, and biome colour data for shading.

pub mod color;
pub mod config;
pub mod displace;
pub mod elevation;
pub mod error;
pub mod mesh;
pub mod noise_filter;
pub mod planet;
pub mod shape;
pub mod sphere_mesh;
pub mod terrain_face;

pub use color::*;
pub use config::*;
pub use displace::*;
pub use elevation::*;
pub use error::*;
pub use mesh::*;
pub use noise_filter::*;
pub use planet::*;
pub use shape::*;
pub use sphere_mesh::*;
pub use terrain_face::*;
