//! Bit-packed 32×32×32 occupancy cube for one predicate.
//!
//! Word `(a << 5) | b` holds the 32 voxels along the inner axis at outer
//! coordinates `(a, b)`; bit 31 is inner coordinate 0 and bit 0 is inner
//! coordinate 31. Which chunk axes `a`, `b` and the inner axis are is recorded
//! in the bitmap's [`AxisOrder`].
//!
//! Transposes and face culls mutate in place. Clone first when the original
//! orientation is still needed.

mod axis;
pub mod transpose;

use std::fmt;

pub use axis::{Axis, AxisOrder};

/// Number of `u32` words in a bitmap (32 × 32).
pub const BITMAP_WORDS: usize = 1024;

/// Bit mask for inner coordinate `c`.
#[inline(always)]
const fn inner_bit(c: usize) -> u32 {
    0x8000_0000 >> c
}

/// One bit per voxel of a chunk, in a tracked axis orientation.
#[derive(Clone, PartialEq, Eq)]
pub struct VoxelBitmap {
    words: [u32; BITMAP_WORDS],
    axis_order: AxisOrder,
}

impl VoxelBitmap {
    /// Creates an empty bitmap in canonical [`AxisOrder::Xyz`].
    pub fn new() -> Self {
        Self::from_words([0; BITMAP_WORDS], AxisOrder::Xyz)
    }

    /// Creates a bitmap with every voxel set, in canonical order.
    pub fn full() -> Self {
        Self::from_words([u32::MAX; BITMAP_WORDS], AxisOrder::Xyz)
    }

    /// Wraps raw words laid out in `axis_order`.
    pub fn from_words(words: [u32; BITMAP_WORDS], axis_order: AxisOrder) -> Self {
        Self { words, axis_order }
    }

    /// Independent copy to run destructive operators on.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Current orientation.
    pub fn axis_order(&self) -> AxisOrder {
        self.axis_order
    }

    /// Raw words in the current orientation.
    pub fn words(&self) -> &[u32; BITMAP_WORDS] {
        &self.words
    }

    /// Mutable raw words in the current orientation.
    pub fn words_mut(&mut self) -> &mut [u32; BITMAP_WORDS] {
        &mut self.words
    }

    /// Word at outer coordinates `(a, b)`.
    pub fn word(&self, a: usize, b: usize) -> u32 {
        debug_assert!(a < 32 && b < 32);
        self.words[(a << 5) | b]
    }

    /// Returns whether the voxel at chunk coordinates `(x, y, z)` is set,
    /// whatever the current orientation.
    pub fn get(&self, x: usize, y: usize, z: usize) -> bool {
        let (word, mask) = self.locate(x, y, z);
        self.words[word] & mask != 0
    }

    /// Sets the voxel at chunk coordinates `(x, y, z)`.
    pub fn set(&mut self, x: usize, y: usize, z: usize) {
        let (word, mask) = self.locate(x, y, z);
        self.words[word] |= mask;
    }

    /// Clears the voxel at chunk coordinates `(x, y, z)`.
    pub fn clear(&mut self, x: usize, y: usize, z: usize) {
        let (word, mask) = self.locate(x, y, z);
        self.words[word] &= !mask;
    }

    /// Number of set voxels.
    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Returns `true` if no voxel is set.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Complements every bit.
    pub fn invert(&mut self) {
        for word in &mut self.words {
            *word = !*word;
        }
    }

    /// Sets every voxel that is set in `other`. Both bitmaps must share an
    /// orientation.
    pub fn or_assign(&mut self, other: &VoxelBitmap) {
        debug_assert_eq!(self.axis_order, other.axis_order);
        for (dst, src) in self.words.iter_mut().zip(other.words.iter()) {
            *dst |= *src;
        }
    }

    /// Iterates over the chunk coordinates `[x, y, z]` of every set voxel.
    pub fn iter_set(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        let order = self.axis_order;
        self.words.iter().enumerate().flat_map(move |(index, &word)| {
            let (a, b) = (index >> 5, index & 31);
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let c = bits.leading_zeros() as usize;
                bits &= !inner_bit(c);
                Some(order.to_xyz(a, b, c))
            })
        })
    }

    // -----------------------------------------------------------------------
    // Transposes
    // -----------------------------------------------------------------------

    /// Swaps the two outer axes (word `(a, b)` ↔ word `(b, a)`).
    pub fn outer_transpose(&mut self) {
        transpose::outer_transpose(&mut self.words);
        self.axis_order = self.axis_order.outer_transposed();
    }

    /// Swaps outer-B with the inner axis (32×32 bit transpose per outer-A layer).
    pub fn inner_transpose(&mut self) {
        transpose::inner_transpose(&mut self.words);
        self.axis_order = self.axis_order.inner_transposed();
    }

    /// Inner transpose followed by outer transpose: the current inner axis
    /// becomes outer-A.
    pub fn swap_outer_inner_axes(&mut self) {
        self.inner_transpose();
        self.outer_transpose();
    }

    /// Transposes until `axis` is the inner (bit) axis. At most two transposes.
    pub fn orient_inner(&mut self, axis: Axis) {
        if self.axis_order.inner() == axis {
            return;
        }
        if self.axis_order.outer_a() == axis {
            self.outer_transpose();
        }
        self.inner_transpose();
        debug_assert_eq!(self.axis_order.inner(), axis);
    }

    // -----------------------------------------------------------------------
    // Face culling
    // -----------------------------------------------------------------------

    /// Keeps set voxels whose neighbour at inner coordinate `c - 1` is clear:
    /// the faces pointing toward the negative inner direction. Coordinate 0
    /// always counts as exposed.
    pub fn cull_front_bits(&mut self) {
        for word in &mut self.words {
            *word &= !(*word >> 1);
        }
    }

    /// Keeps set voxels whose neighbour at inner coordinate `c + 1` is clear:
    /// the faces pointing toward the positive inner direction. Coordinate 31
    /// always counts as exposed.
    pub fn cull_back_bits(&mut self) {
        for word in &mut self.words {
            *word &= !(*word << 1);
        }
    }

    /// Like [`cull_front_bits`](Self::cull_front_bits), but a face is hidden
    /// when `occluder` is set at the neighbour rather than `self`.
    pub fn cull_front_against(&mut self, occluder: &VoxelBitmap) {
        debug_assert_eq!(self.axis_order, occluder.axis_order);
        for (word, occ) in self.words.iter_mut().zip(occluder.words.iter()) {
            *word &= !(*occ >> 1);
        }
    }

    /// Like [`cull_back_bits`](Self::cull_back_bits), but a face is hidden when
    /// `occluder` is set at the neighbour rather than `self`.
    pub fn cull_back_against(&mut self, occluder: &VoxelBitmap) {
        debug_assert_eq!(self.axis_order, occluder.axis_order);
        for (word, occ) in self.words.iter_mut().zip(occluder.words.iter()) {
            *word &= !(*occ << 1);
        }
    }

    /// Word index and bit mask for chunk coordinates in the current order.
    fn locate(&self, x: usize, y: usize, z: usize) -> (usize, u32) {
        debug_assert!(x < 32 && y < 32 && z < 32, "({x}, {y}, {z}) out of range");
        let [a, b, c] = self.axis_order.from_xyz([x, y, z]);
        ((a << 5) | b, inner_bit(c))
    }
}

impl Default for VoxelBitmap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for VoxelBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoxelBitmap")
            .field("axis_order", &self.axis_order)
            .field("set", &self.count_ones())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn random_bitmap(seed: u64, density: f64) -> VoxelBitmap {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut bitmap = VoxelBitmap::new();
        for x in 0..32 {
            for y in 0..32 {
                for z in 0..32 {
                    if rng.random_bool(density) {
                        bitmap.set(x, y, z);
                    }
                }
            }
        }
        bitmap
    }

    fn set_voxels(bitmap: &VoxelBitmap) -> Vec<[usize; 3]> {
        let mut voxels: Vec<_> = bitmap.iter_set().collect();
        voxels.sort_unstable();
        voxels
    }

    #[test]
    fn test_canonical_layout_matches_linear_index() {
        let mut bitmap = VoxelBitmap::new();
        bitmap.set(1, 2, 0);
        bitmap.set(1, 2, 31);
        assert_eq!(bitmap.words()[(1 << 5) | 2], 0x8000_0001);
        assert!(bitmap.get(1, 2, 0));
        assert!(!bitmap.get(2, 1, 0));
    }

    #[test]
    fn test_set_clear_get() {
        let mut bitmap = VoxelBitmap::new();
        assert!(bitmap.is_empty());
        bitmap.set(4, 5, 6);
        assert!(bitmap.get(4, 5, 6));
        assert_eq!(bitmap.count_ones(), 1);
        bitmap.clear(4, 5, 6);
        assert!(bitmap.is_empty());
    }

    #[test]
    fn test_transposes_preserve_voxel_set() {
        let original = random_bitmap(11, 0.3);
        let expected = set_voxels(&original);
        let mut bitmap = original.clone();
        for step in 0..12 {
            if step % 3 == 0 {
                bitmap.outer_transpose();
            } else {
                bitmap.inner_transpose();
            }
            assert_eq!(set_voxels(&bitmap), expected, "after step {step}");
        }
    }

    #[test]
    fn test_outer_transpose_twice_is_identity() {
        let original = random_bitmap(3, 0.5);
        let mut bitmap = original.clone();
        bitmap.outer_transpose();
        assert_eq!(bitmap.axis_order(), AxisOrder::Yxz);
        bitmap.outer_transpose();
        assert_eq!(bitmap, original);
    }

    #[test]
    fn test_inner_transpose_twice_is_identity() {
        let original = random_bitmap(4, 0.5);
        let mut bitmap = original.clone();
        bitmap.inner_transpose();
        assert_eq!(bitmap.axis_order(), AxisOrder::Xzy);
        bitmap.inner_transpose();
        assert_eq!(bitmap, original);
    }

    #[test]
    fn test_swap_outer_inner_three_times_is_identity() {
        let original = random_bitmap(5, 0.2);
        let mut bitmap = original.clone();
        bitmap.swap_outer_inner_axes();
        assert_eq!(bitmap.axis_order(), AxisOrder::Zxy);
        bitmap.swap_outer_inner_axes();
        bitmap.swap_outer_inner_axes();
        assert_eq!(bitmap, original);
    }

    #[test]
    fn test_orient_inner_reaches_each_axis() {
        let original = random_bitmap(6, 0.1);
        for start in [AxisOrder::Xyz, AxisOrder::Yzx, AxisOrder::Zxy] {
            let mut from = original.clone();
            while from.axis_order() != start {
                from.swap_outer_inner_axes();
            }
            for axis in Axis::ALL {
                let mut bitmap = from.clone();
                bitmap.orient_inner(axis);
                assert_eq!(bitmap.axis_order().inner(), axis);
                assert_eq!(set_voxels(&bitmap), set_voxels(&original));
            }
        }
    }

    #[test]
    fn test_cull_front_keeps_low_boundary_of_runs() {
        let mut bitmap = VoxelBitmap::new();
        for z in 4..9 {
            bitmap.set(0, 0, z);
        }
        let mut front = bitmap.clone();
        front.cull_front_bits();
        assert_eq!(set_voxels(&front), vec![[0, 0, 4]]);

        let mut back = bitmap;
        back.cull_back_bits();
        assert_eq!(set_voxels(&back), vec![[0, 0, 8]]);
    }

    #[test]
    fn test_cull_full_bitmap_leaves_chunk_boundary() {
        let mut front = VoxelBitmap::full();
        front.cull_front_bits();
        assert!(front.words().iter().all(|&w| w == 0x8000_0000));

        let mut back = VoxelBitmap::full();
        back.cull_back_bits();
        assert!(back.words().iter().all(|&w| w == 1));
    }

    #[test]
    fn test_cull_empty_bitmap_is_empty() {
        let mut bitmap = VoxelBitmap::new();
        bitmap.cull_front_bits();
        assert!(bitmap.is_empty());
        bitmap.cull_back_bits();
        assert!(bitmap.is_empty());
    }

    #[test]
    fn test_cull_against_occluder() {
        // Column of one type at z=10..12 sitting on an occluder at z=9.
        let mut faces = VoxelBitmap::new();
        let mut occluder = VoxelBitmap::new();
        for z in 10..12 {
            faces.set(2, 3, z);
            occluder.set(2, 3, z);
        }
        occluder.set(2, 3, 9);

        let mut front = faces.clone();
        front.cull_front_against(&occluder);
        assert!(front.is_empty(), "face at z=10 is covered by z=9");

        let mut back = faces;
        back.cull_back_against(&occluder);
        assert_eq!(set_voxels(&back), vec![[2, 3, 11]]);
    }

    #[test]
    fn test_cull_matches_per_voxel_neighbour_test() {
        let bitmap = random_bitmap(21, 0.4);
        for axis in Axis::ALL {
            let mut oriented = bitmap.clone();
            oriented.orient_inner(axis);
            let mut front = oriented.clone();
            front.cull_front_bits();
            let mut back = oriented;
            back.cull_back_bits();

            for xyz in bitmap.iter_set() {
                let i = axis.index();
                let mut below = xyz;
                let mut above = xyz;
                let exposed_below = xyz[i] == 0 || {
                    below[i] -= 1;
                    !bitmap.get(below[0], below[1], below[2])
                };
                let exposed_above = xyz[i] == 31 || {
                    above[i] += 1;
                    !bitmap.get(above[0], above[1], above[2])
                };
                assert_eq!(front.get(xyz[0], xyz[1], xyz[2]), exposed_below);
                assert_eq!(back.get(xyz[0], xyz[1], xyz[2]), exposed_above);
            }
        }
    }

    #[test]
    fn test_or_assign_and_invert() {
        let mut a = VoxelBitmap::new();
        let mut b = VoxelBitmap::new();
        a.set(0, 0, 0);
        b.set(31, 31, 31);
        a.or_assign(&b);
        assert_eq!(a.count_ones(), 2);
        a.invert();
        assert_eq!(a.count_ones(), 32 * 32 * 32 - 2);
        assert!(!a.get(0, 0, 0));
    }
}
