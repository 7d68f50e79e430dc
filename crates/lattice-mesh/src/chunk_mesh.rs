//! Whole-chunk meshing: one predicate bitmap per resident block type, culled
//! and greedy-meshed in all six face directions.

use lattice_voxel::{Axis, AxisOrder, ChunkStore, VoxelBitmap, VoxelTypeId, VoxelTypeRegistry};

use crate::face_direction::FaceDirection;
use crate::greedy::greedy_mesh_into;
use crate::quad::PackedQuad;

/// Meshing switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshOptions {
    /// Hide faces of every type against opaque neighbours as well as against
    /// voxels of the same type. When off, each type is culled only against
    /// itself.
    pub cull_against_opaque: bool,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            cull_against_opaque: true,
        }
    }
}

/// Quads of one block type facing one direction, all in one axis order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuadBatch {
    /// Block type the faces belong to.
    pub voxel_type: VoxelTypeId,
    /// Direction the faces point.
    pub face: FaceDirection,
    /// Orientation the quad coordinates are expressed in.
    pub axis_order: AxisOrder,
    /// Packed quads.
    pub quads: Vec<PackedQuad>,
}

impl QuadBatch {
    /// The quads as raw bytes for upload.
    pub fn quad_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.quads)
    }
}

/// Mesh output of a chunk: one [`QuadBatch`] per non-empty (type, face) pair.
#[derive(Clone, Debug, Default)]
pub struct ChunkMesh {
    batches: Vec<QuadBatch>,
}

impl ChunkMesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// All batches, grouped by type then by face.
    pub fn batches(&self) -> &[QuadBatch] {
        &self.batches
    }

    /// Appends a batch; empty batches are dropped.
    pub fn push_batch(&mut self, batch: QuadBatch) {
        if !batch.quads.is_empty() {
            self.batches.push(batch);
        }
    }

    /// Total number of quads.
    pub fn quad_count(&self) -> usize {
        self.batches.iter().map(|b| b.quads.len()).sum()
    }

    /// Number of quads facing `face`.
    pub fn count_quads_for_direction(&self, face: FaceDirection) -> usize {
        self.batches
            .iter()
            .filter(|b| b.face == face)
            .map(|b| b.quads.len())
            .sum()
    }

    /// Returns `true` if no quads were produced.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

/// Meshes every visible block type resident in `store`.
///
/// Faces of a type are hidden by neighbours of the same type and, with
/// [`MeshOptions::cull_against_opaque`], by any opaque neighbour. The space
/// outside the chunk counts as empty, so faces on the chunk boundary are kept.
pub fn mesh_chunk(
    store: &ChunkStore,
    registry: &VoxelTypeRegistry,
    options: MeshOptions,
) -> ChunkMesh {
    let opaque = options
        .cull_against_opaque
        .then(|| store.build_bitmap_where(|voxel| registry.is_opaque(voxel)));

    let mut mesh = ChunkMesh::new();
    for voxel in store.resident_types() {
        if !registry.is_visible(voxel) {
            continue;
        }
        let bitmap = store.build_predicate_bitmap(voxel, false);
        let occluder = opaque.as_ref().map(|opaque| {
            let mut occluder = opaque.copy();
            occluder.or_assign(&bitmap);
            occluder
        });
        for batch in mesh_faces(&bitmap, occluder.as_ref(), voxel) {
            mesh.push_batch(batch);
        }
    }

    tracing::debug!(
        "meshed chunk: {} resident types, {} batches, {} quads",
        store.palette_len(),
        mesh.batches.len(),
        mesh.quad_count()
    );
    mesh
}

/// Meshes the faces of `bitmap` in all six directions.
///
/// `occluder` decides which neighbours hide a face; `None` means `bitmap`
/// itself. Both bitmaps must share an orientation. Returns six batches in
/// [`FaceDirection::ALL`] order, some possibly empty.
pub fn mesh_faces(
    bitmap: &VoxelBitmap,
    occluder: Option<&VoxelBitmap>,
    voxel_type: VoxelTypeId,
) -> Vec<QuadBatch> {
    let mut batches = Vec::with_capacity(FaceDirection::ALL.len());
    for axis in [Axis::X, Axis::Y, Axis::Z] {
        let mut faces = bitmap.copy();
        faces.orient_inner(axis);
        let occluder = occluder.map(|occluder| {
            let mut occluder = occluder.copy();
            occluder.orient_inner(axis);
            occluder
        });

        for positive in [true, false] {
            let face = FaceDirection::from_axis(axis, positive);
            let mut culled = faces.copy();
            match (&occluder, positive) {
                (Some(occluder), true) => culled.cull_back_against(occluder),
                (Some(occluder), false) => culled.cull_front_against(occluder),
                (None, true) => culled.cull_back_bits(),
                (None, false) => culled.cull_front_bits(),
            }
            culled.swap_outer_inner_axes();
            debug_assert_eq!(culled.axis_order().outer_a(), axis);

            let axis_order = culled.axis_order();
            let mut quads = Vec::new();
            greedy_mesh_into(&mut culled, &mut quads);
            tracing::trace!("{:?} {:?}: {} quads", voxel_type, face, quads.len());
            batches.push(QuadBatch {
                voxel_type,
                face,
                axis_order,
                quads,
            });
        }
    }
    batches
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
