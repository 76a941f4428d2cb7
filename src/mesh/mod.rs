//! Mesh assembly: vertices, raw primitive shapes, and the sub-mesh
//! builder that partitions geometry by material (spec §3, §4.4).

mod builder;
mod vertex;

pub use builder::{MeshBuilder, SubMesh};
pub use vertex::{Primitive, Vertex};
