//! Packed greedy-mesh quad record.
//!
//! A [`PackedQuad`] is one `u32` so batches can be uploaded as-is:
//!
//! | bits    | field              |
//! |---------|--------------------|
//! | `20..25`| `height - 1`       |
//! | `15..20`| `width - 1`        |
//! | `10..15`| outer-A coordinate |
//! | `5..10` | outer-B coordinate |
//! | `0..5`  | inner start        |
//!
//! Coordinates are in the bitmap orientation the quad was produced under;
//! the [`AxisOrder`] travels alongside in the batch, not in the word.

use std::fmt;

use lattice_voxel::AxisOrder;

const FIELD_BITS: u32 = 5;
const FIELD_MASK: u32 = (1 << FIELD_BITS) - 1;

const INNER_SHIFT: u32 = 0;
const OUTER_B_SHIFT: u32 = 5;
const OUTER_A_SHIFT: u32 = 10;
const WIDTH_SHIFT: u32 = 15;
const HEIGHT_SHIFT: u32 = 20;

/// A merged rectangle of voxel faces packed into 25 bits of a `u32`.
///
/// The rectangle lies in the outer-A layer `outer_a`, spans `width` words
/// along outer-B from `outer_b`, and `height` bits along the inner axis from
/// `inner_start`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PackedQuad(u32);

static_assertions::assert_eq_size!(PackedQuad, u32);

impl PackedQuad {
    /// Packs a quad. Coordinates must be below 32 and extents in `1..=32`.
    pub fn new(outer_a: u8, outer_b: u8, inner_start: u8, width: u8, height: u8) -> Self {
        debug_assert!(outer_a < 32 && outer_b < 32 && inner_start < 32);
        debug_assert!((1..=32).contains(&width) && (1..=32).contains(&height));
        debug_assert!(u32::from(outer_b) + u32::from(width) <= 32);
        debug_assert!(u32::from(inner_start) + u32::from(height) <= 32);
        Self(
            (u32::from(height - 1) << HEIGHT_SHIFT)
                | (u32::from(width - 1) << WIDTH_SHIFT)
                | (u32::from(outer_a) << OUTER_A_SHIFT)
                | (u32::from(outer_b) << OUTER_B_SHIFT)
                | (u32::from(inner_start) << INNER_SHIFT),
        )
    }

    /// Reinterprets a raw word.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The packed word.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Outer-A coordinate (the layer holding the quad).
    pub const fn outer_a(self) -> u8 {
        self.field(OUTER_A_SHIFT)
    }

    /// First outer-B coordinate covered.
    pub const fn outer_b(self) -> u8 {
        self.field(OUTER_B_SHIFT)
    }

    /// First inner coordinate covered.
    pub const fn inner_start(self) -> u8 {
        self.field(INNER_SHIFT)
    }

    /// Extent along outer-B (`1..=32`).
    pub const fn width(self) -> u8 {
        self.field(WIDTH_SHIFT) + 1
    }

    /// Extent along the inner axis (`1..=32`).
    pub const fn height(self) -> u8 {
        self.field(HEIGHT_SHIFT) + 1
    }

    /// Unswizzles the quad into chunk space: the `[x, y, z]` of its minimum
    /// voxel and its `[x, y, z]` extent in voxels (1 along outer-A).
    pub fn voxel_rect(self, axis_order: AxisOrder) -> ([u8; 3], [u8; 3]) {
        let origin = axis_order.to_xyz(
            usize::from(self.outer_a()),
            usize::from(self.outer_b()),
            usize::from(self.inner_start()),
        );
        let extent = axis_order.to_xyz(1, usize::from(self.width()), usize::from(self.height()));
        (origin.map(|v| v as u8), extent.map(|v| v as u8))
    }

    /// Number of voxel faces covered.
    pub fn area(self) -> u32 {
        u32::from(self.width()) * u32::from(self.height())
    }

    const fn field(self, shift: u32) -> u8 {
        ((self.0 >> shift) & FIELD_MASK) as u8
    }
}

impl fmt::Debug for PackedQuad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackedQuad")
            .field("outer_a", &self.outer_a())
            .field("outer_b", &self.outer_b())
            .field("inner_start", &self.inner_start())
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}
