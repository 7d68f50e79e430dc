//! Voxel storage for 32×32×32 chunks: palette-compressed block ids, the block
//! type registry, and bit-packed occupancy bitmaps with axis transposes.

pub mod bitmap;
pub mod chunk;
pub mod chunk_api;
pub mod palette_table;
pub mod registry;

pub use bitmap::{Axis, AxisOrder, BITMAP_WORDS, VoxelBitmap};
pub use chunk::{CHUNK_SIZE, CHUNK_VOLUME, ChunkError, ChunkStore, PALETTE_CAPACITY, Packing};
pub use chunk_api::{Chunk, MESH_DIRTY};
pub use palette_table::{PaletteError, PaletteTable};
pub use registry::{RegistryError, Transparency, VoxelTypeDef, VoxelTypeId, VoxelTypeRegistry};
