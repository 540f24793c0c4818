//! CPU terrain mesher: regular height grids with normals, UVs, and tangents.
#![forbid(unsafe_code)]

mod chunk;
mod grid;
mod shading;

pub use chunk::ChunkMeshCPU;
pub use grid::{build_chunk_mesh, grid_indices, retain_valid_triangles};
pub use shading::{compute_tangents, compute_vertex_normals};
