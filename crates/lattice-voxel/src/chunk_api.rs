//! Chunk wrapper with bounds-checked voxel access, dirty flags, and versioning.
//!
//! [`Chunk`] wraps [`ChunkStore`] with `u8` coordinates in `[0, 32)`.
//! Out-of-bounds access is handled without panics; palette exhaustion is
//! propagated to the caller.

use crate::chunk::{CHUNK_SIZE, ChunkError, ChunkStore, Packing};
use crate::registry::VoxelTypeId;

/// Dirty-flag bit: chunk mesh needs rebuilding.
pub const MESH_DIRTY: u8 = 0b0000_0001;

/// A voxel chunk with bounds-checked access, dirty tracking, and versioning.
#[derive(Clone, Debug)]
pub struct Chunk {
    store: ChunkStore,
    dirty: u8,
    /// Incremented on every successful mutation.
    version: u64,
}

impl Chunk {
    /// Creates an 8-bit chunk filled with air.
    pub fn new() -> Self {
        Self::from_store(ChunkStore::new_air())
    }

    /// Creates a chunk filled with `voxel` using the given packing.
    pub fn new_filled(packing: Packing, voxel: VoxelTypeId) -> Self {
        Self::from_store(ChunkStore::new(packing, voxel))
    }

    /// Wraps an existing store. The chunk starts clean at version 0.
    pub fn from_store(store: ChunkStore) -> Self {
        Self {
            store,
            dirty: 0,
            version: 0,
        }
    }

    /// Returns the voxel type at `(x, y, z)`, or air if out of bounds.
    pub fn get(&self, x: u8, y: u8, z: u8) -> VoxelTypeId {
        if !Self::in_bounds(x, y, z) {
            tracing::warn!("Chunk::get out of bounds: ({}, {}, {})", x, y, z);
            return VoxelTypeId::AIR;
        }
        self.store.get_block(x as usize, y as usize, z as usize)
    }

    /// Sets the voxel type at `(x, y, z)` and returns the type it replaced.
    ///
    /// Out-of-bounds writes are ignored with a warning and return `Ok(AIR)`.
    /// Writing the type already present does not bump the version.
    ///
    /// # Errors
    ///
    /// Propagates [`ChunkError::PaletteFull`]; the chunk is unchanged and its
    /// flags and version are left alone.
    pub fn set(&mut self, x: u8, y: u8, z: u8, voxel: VoxelTypeId) -> Result<VoxelTypeId, ChunkError> {
        if !Self::in_bounds(x, y, z) {
            tracing::warn!("Chunk::set out of bounds: ({}, {}, {})", x, y, z);
            return Ok(VoxelTypeId::AIR);
        }
        let old = self
            .store
            .set_block(x as usize, y as usize, z as usize, voxel)?;
        if old != voxel {
            self.touch();
        }
        Ok(old)
    }

    /// Fills every voxel with `voxel`.
    pub fn fill(&mut self, voxel: VoxelTypeId) {
        self.store.fill(voxel);
        self.touch();
    }

    /// Returns the current dirty flags.
    pub fn dirty_flags(&self) -> u8 {
        self.dirty
    }

    /// Returns `true` if every bit of `flag` is set.
    pub fn is_dirty(&self, flag: u8) -> bool {
        self.dirty & flag == flag
    }

    /// Clears the specified dirty flag bits.
    pub fn clear_dirty(&mut self, flags: u8) {
        self.dirty &= !flags;
    }

    /// Returns the current version counter.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    fn touch(&mut self) {
        self.dirty |= MESH_DIRTY;
        self.version += 1;
    }

    fn in_bounds(x: u8, y: u8, z: u8) -> bool {
        let size = CHUNK_SIZE as u8;
        x < size && y < size && z < size
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
