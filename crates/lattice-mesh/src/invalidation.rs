//! Mesh cache invalidation: compares a chunk's data version with the version
//! its current mesh was built from.

/// Metadata for a chunk's mesh cache state.
#[derive(Clone, Debug, Default)]
pub struct ChunkMeshState {
    /// Version of the voxel data when the current mesh was generated.
    pub meshed_version: u64,
    /// Whether a remesh task is already in flight for this chunk.
    pub remesh_pending: bool,
}

impl ChunkMeshState {
    /// Creates a state with no mesh generated yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the mesh was built from an older data version.
    pub fn is_stale(&self, current_data_version: u64) -> bool {
        self.meshed_version != current_data_version
    }

    /// Returns `true` if a remesh task should be submitted.
    pub fn needs_remesh(&self, current_data_version: u64) -> bool {
        self.is_stale(current_data_version) && !self.remesh_pending
    }

    /// Records that a remesh task was submitted.
    pub fn mark_pending(&mut self) {
        self.remesh_pending = true;
    }

    /// Records a finished mesh built from `data_version`.
    ///
    /// Returns `false`, leaving the state untouched apart from clearing the
    /// pending flag, when the result is older than the mesh already held.
    pub fn complete(&mut self, data_version: u64) -> bool {
        self.remesh_pending = false;
        if data_version < self.meshed_version {
            return false;
        }
        self.meshed_version = data_version;
        true
    }
}
