//! The six directions a voxel face can point.

use lattice_voxel::Axis;

/// One of the six cardinal directions a voxel face can point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum FaceDirection {
    /// +X direction.
    PosX = 0,
    /// −X direction.
    NegX = 1,
    /// +Y direction.
    PosY = 2,
    /// −Y direction.
    NegY = 3,
    /// +Z direction.
    PosZ = 4,
    /// −Z direction.
    NegZ = 5,
}

impl FaceDirection {
    /// All six directions in order.
    pub const ALL: [FaceDirection; 6] = [
        Self::PosX,
        Self::NegX,
        Self::PosY,
        Self::NegY,
        Self::PosZ,
        Self::NegZ,
    ];

    /// Direction along `axis`, toward higher coordinates when `positive`.
    pub const fn from_axis(axis: Axis, positive: bool) -> Self {
        match (axis, positive) {
            (Axis::X, true) => Self::PosX,
            (Axis::X, false) => Self::NegX,
            (Axis::Y, true) => Self::PosY,
            (Axis::Y, false) => Self::NegY,
            (Axis::Z, true) => Self::PosZ,
            (Axis::Z, false) => Self::NegZ,
        }
    }

    /// Axis the face normal runs along.
    pub const fn normal_axis(self) -> Axis {
        match self {
            Self::PosX | Self::NegX => Axis::X,
            Self::PosY | Self::NegY => Axis::Y,
            Self::PosZ | Self::NegZ => Axis::Z,
        }
    }

    /// Returns `true` if the normal points toward higher coordinates.
    pub const fn is_positive(self) -> bool {
        matches!(self, Self::PosX | Self::PosY | Self::PosZ)
    }

    /// Unit normal as integer components.
    pub fn normal(self) -> [i32; 3] {
        let mut normal = [0; 3];
        normal[self.normal_axis().index()] = if self.is_positive() { 1 } else { -1 };
        normal
    }

    /// Returns the opposite face direction.
    pub fn opposite(self) -> Self {
        Self::from_axis(self.normal_axis(), !self.is_positive())
    }

    /// Returns the direction index (0–5).
    pub fn index(self) -> usize {
        self as usize
    }
}
