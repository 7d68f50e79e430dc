//! Block type registry: maps compact [`VoxelTypeId`] values to [`VoxelTypeDef`]
//! metadata.
//!
//! Chunk stores treat ids as opaque integers. The registry is what the mesher
//! consults to decide which resident types produce geometry and which ones hide
//! their neighbours' faces. Air is always id 0.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Block type identifier stored (through the palette) in every voxel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoxelTypeId(pub u16);

impl VoxelTypeId {
    /// The empty block type every chunk starts filled with.
    pub const AIR: Self = Self(0);
}

/// Transparency mode for a block type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transparency {
    /// Fully blocks visibility; hides neighbouring faces.
    Opaque,
    /// Rendered, but does not hide faces of other types (water, glass).
    SemiTransparent,
    /// Never rendered (air).
    FullyTransparent,
}

/// Descriptor for a block type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoxelTypeDef {
    /// Human-readable name (e.g. "stone").
    pub name: String,
    /// Whether entities collide with this block.
    pub solid: bool,
    /// Transparency mode.
    pub transparency: Transparency,
    /// Index into the renderer's material table.
    pub material_index: u16,
}

/// Errors that can occur during block type registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A type with the same name has already been registered.
    #[error("duplicate voxel type name: {0}")]
    DuplicateName(String),
    /// Every `u16` id has been handed out.
    #[error("voxel type registry is full (max 65536 types)")]
    RegistryFull,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps [`VoxelTypeId`] → [`VoxelTypeDef`] with O(1) lookup by id and by name.
#[derive(Clone, Debug)]
pub struct VoxelTypeRegistry {
    /// Dense array where `index == VoxelTypeId.0`.
    types: Vec<VoxelTypeDef>,
    name_to_id: FxHashMap<String, VoxelTypeId>,
}

impl VoxelTypeRegistry {
    /// Creates a registry with air pre-registered as id 0.
    pub fn new() -> Self {
        let air = VoxelTypeDef {
            name: "air".to_string(),
            solid: false,
            transparency: Transparency::FullyTransparent,
            material_index: 0,
        };

        let mut name_to_id = FxHashMap::default();
        name_to_id.insert(air.name.clone(), VoxelTypeId::AIR);

        Self {
            types: vec![air],
            name_to_id,
        }
    }

    /// Registers a new block type and returns its id. Ids are sequential from 1.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if the name is taken, or
    /// [`RegistryError::RegistryFull`] once all 65 536 ids are used.
    pub fn register(&mut self, def: VoxelTypeDef) -> Result<VoxelTypeId, RegistryError> {
        if self.name_to_id.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name));
        }
        if self.types.len() > u16::MAX as usize {
            return Err(RegistryError::RegistryFull);
        }

        let id = VoxelTypeId(self.types.len() as u16);
        self.name_to_id.insert(def.name.clone(), id);
        self.types.push(def);
        Ok(id)
    }

    /// Returns the definition for `id`, or `None` if it was never registered.
    pub fn get(&self, id: VoxelTypeId) -> Option<&VoxelTypeDef> {
        self.types.get(id.0 as usize)
    }

    /// Returns the id for a named block type.
    pub fn lookup_by_name(&self, name: &str) -> Option<VoxelTypeId> {
        self.name_to_id.get(name).copied()
    }

    /// Total number of registered types, air included.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if only air is registered.
    pub fn is_empty(&self) -> bool {
        self.types.len() <= 1
    }

    /// Returns `true` for id 0.
    pub fn is_air(&self, id: VoxelTypeId) -> bool {
        id == VoxelTypeId::AIR
    }

    /// Returns `true` if the type hides the faces of its neighbours.
    /// Unknown ids are treated like air.
    pub fn is_opaque(&self, id: VoxelTypeId) -> bool {
        self.get(id)
            .is_some_and(|def| def.transparency == Transparency::Opaque)
    }

    /// Returns `true` if the type produces geometry at all.
    /// Unknown ids are treated like air.
    pub fn is_visible(&self, id: VoxelTypeId) -> bool {
        self.get(id)
            .is_some_and(|def| def.transparency != Transparency::FullyTransparent)
    }
}

impl Default for VoxelTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
