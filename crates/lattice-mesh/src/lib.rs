//! Greedy meshing of voxel chunks: packed quad records, per-chunk face
//! extraction, and a background meshing pipeline.

pub mod async_mesh;
pub mod chunk_mesh;
pub mod face_direction;
pub mod greedy;
pub mod invalidation;
pub mod quad;

pub use async_mesh::{MeshingPipeline, MeshingResult, MeshingTask};
pub use chunk_mesh::{ChunkMesh, MeshOptions, QuadBatch, mesh_chunk, mesh_faces};
pub use face_direction::FaceDirection;
pub use greedy::{greedy_mesh, greedy_mesh_into};
pub use invalidation::ChunkMeshState;
pub use quad::PackedQuad;
