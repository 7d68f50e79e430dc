//! Palette-compressed chunk storage for 32×32×32 voxel volumes.
//!
//! Each voxel stores a palette *slot*, not a block type. The palette maps up
//! to [`PALETTE_CAPACITY`] slots to [`VoxelTypeId`] values and every slot
//! carries a reference count of the voxels using it, so a type's slot is freed
//! the moment its last voxel is overwritten. The palette never grows past its
//! capacity and the index width is fixed at construction: exceeding the
//! palette is reported as [`ChunkError::PaletteFull`], never repacked.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bitmap::{AxisOrder, BITMAP_WORDS, VoxelBitmap};
use crate::palette_table::{PaletteError, PaletteTable};
use crate::registry::VoxelTypeId;

/// Side length of a chunk in voxels.
pub const CHUNK_SIZE: usize = 32;

/// Total number of voxels in a chunk (32³).
pub const CHUNK_VOLUME: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;

/// Maximum number of distinct block types resident in one chunk.
pub const PALETTE_CAPACITY: usize = 64;

/// Bytes per `u64` index word with 8-bit packing.
const BYTES_PER_WORD: usize = 8;

/// Broadcasts a byte into every lane of a `u64`.
const LANE_ONES: u64 = 0x0101_0101_0101_0101;
const LANE_LOW7: u64 = 0x7F7F_7F7F_7F7F_7F7F;
const LANE_HIGH: u64 = 0x8080_8080_8080_8080;
/// Gathers bit `8j` of a word into bit `56 + j` when multiplied.
const LANE_GATHER: u64 = 0x0102_0408_1020_4080;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by [`ChunkStore`] construction and edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ChunkError {
    /// The requested index width has no implementation (only 1 and 8 do).
    #[error("voxel packing of {bits} bits per index is not implemented")]
    PackingNotImplemented {
        /// Requested bits per voxel index.
        bits: u8,
    },
    /// Every palette slot is held by a live block type.
    #[error("chunk palette full ({capacity} distinct block types resident)")]
    PaletteFull {
        /// Palette capacity of the chunk's packing.
        capacity: usize,
    },
}

impl From<PaletteError> for ChunkError {
    fn from(err: PaletteError) -> Self {
        match err {
            PaletteError::CapacityExceeded { capacity } => Self::PaletteFull { capacity },
        }
    }
}

// ---------------------------------------------------------------------------
// Packing
// ---------------------------------------------------------------------------

/// Bits per voxel used to store palette slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Packing {
    /// One bit per voxel; at most two resident types.
    Bits1,
    /// One byte per voxel; up to [`PALETTE_CAPACITY`] resident types.
    Bits8,
}

impl Packing {
    /// Resolves a bit width.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::PackingNotImplemented`] for any width other than
    /// 1 or 8.
    pub fn from_bits(bits: u8) -> Result<Self, ChunkError> {
        match bits {
            1 => Ok(Self::Bits1),
            8 => Ok(Self::Bits8),
            _ => Err(ChunkError::PackingNotImplemented { bits }),
        }
    }

    /// Bits per voxel.
    pub const fn bits(self) -> u8 {
        match self {
            Self::Bits1 => 1,
            Self::Bits8 => 8,
        }
    }

    /// Number of palette slots addressable with this width.
    pub const fn palette_capacity(self) -> usize {
        match self {
            Self::Bits1 => 2,
            Self::Bits8 => PALETTE_CAPACITY,
        }
    }
}

/// Per-voxel slot storage.
///
/// `Bits1` uses the canonical bitmap layout directly (word `idx >> 5`, bit
/// `31 - (idx & 31)`), so slot 1's bitmap is a plain copy. `Bits8` packs eight
/// slots per `u64`, voxel `idx` in byte `idx & 7` of word `idx >> 3`.
#[derive(Clone, Debug)]
enum IndexStorage {
    Bits1(Box<[u32]>),
    Bits8(Box<[u64]>),
}

impl IndexStorage {
    fn new(packing: Packing) -> Self {
        match packing {
            Packing::Bits1 => Self::Bits1(vec![0; CHUNK_VOLUME / 32].into_boxed_slice()),
            Packing::Bits8 => {
                Self::Bits8(vec![0; CHUNK_VOLUME / BYTES_PER_WORD].into_boxed_slice())
            }
        }
    }

    #[inline]
    fn get(&self, index: usize) -> u8 {
        match self {
            Self::Bits1(words) => ((words[index >> 5] >> (31 - (index & 31))) & 1) as u8,
            Self::Bits8(words) => (words[index >> 3] >> ((index & 7) * 8)) as u8,
        }
    }

    #[inline]
    fn set(&mut self, index: usize, slot: u8) {
        match self {
            Self::Bits1(words) => {
                debug_assert!(slot < 2, "slot {slot} does not fit in one bit");
                let mask = 0x8000_0000 >> (index & 31);
                if slot == 0 {
                    words[index >> 5] &= !mask;
                } else {
                    words[index >> 5] |= mask;
                }
            }
            Self::Bits8(words) => {
                let shift = (index & 7) * 8;
                let word = &mut words[index >> 3];
                *word = (*word & !(0xFF << shift)) | (u64::from(slot) << shift);
            }
        }
    }

    fn clear(&mut self) {
        match self {
            Self::Bits1(words) => words.fill(0),
            Self::Bits8(words) => words.fill(0),
        }
    }

    /// Bitmap words, canonical order, with bit set where the voxel holds `slot`.
    fn slot_words(&self, slot: u8) -> [u32; BITMAP_WORDS] {
        let mut out = [0u32; BITMAP_WORDS];
        match self {
            Self::Bits1(words) => {
                for (dst, &src) in out.iter_mut().zip(words.iter()) {
                    *dst = if slot == 0 { !src } else { src };
                }
            }
            Self::Bits8(words) => {
                let pattern = u64::from(slot).wrapping_mul(LANE_ONES);
                for (dst, lanes) in out.iter_mut().zip(words.chunks_exact(4)) {
                    // z = 8k + j lives in byte j of lanes[k]; gather into bit z.
                    let mut row = 0u32;
                    for (k, &lane) in lanes.iter().enumerate() {
                        row |= u32::from(equal_bytes(lane, pattern)) << (k * 8);
                    }
                    // Bit z -> bit 31 - z.
                    *dst = row.reverse_bits();
                }
            }
        }
        out
    }
}

/// Bit `j` of the result is set when byte `j` of `word` equals byte `j` of
/// `pattern`.
#[inline(always)]
fn equal_bytes(word: u64, pattern: u64) -> u8 {
    let v = word ^ pattern;
    let nonzero = (((v & LANE_LOW7) + LANE_LOW7) | v) & LANE_HIGH;
    let equal = !nonzero & LANE_HIGH;
    ((equal >> 7).wrapping_mul(LANE_GATHER) >> 56) as u8
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Palette-compressed voxel storage for a 32×32×32 chunk.
///
/// Invariants kept by every public method:
///
/// - the reference counts of live slots sum to [`CHUNK_VOLUME`];
/// - a slot is live exactly when its count is non-zero;
/// - `slot_of_type` holds exactly the live `(type, slot)` pairs.
#[derive(Clone, Debug)]
pub struct ChunkStore {
    packing: Packing,
    /// Slot → block type.
    palette: PaletteTable<VoxelTypeId, PALETTE_CAPACITY>,
    /// Block type → slot, for resident types only.
    slot_of_type: FxHashMap<VoxelTypeId, u8>,
    /// Voxels holding each slot.
    ref_counts: [u16; PALETTE_CAPACITY],
    storage: IndexStorage,
}

impl ChunkStore {
    /// Creates a store with every voxel set to `fill`.
    pub fn new(packing: Packing, fill: VoxelTypeId) -> Self {
        let mut store = Self {
            packing,
            palette: PaletteTable::new(),
            slot_of_type: FxHashMap::default(),
            ref_counts: [0; PALETTE_CAPACITY],
            storage: IndexStorage::new(packing),
        };
        store.fill(fill);
        store
    }

    /// Creates a store from a bit width.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::PackingNotImplemented`] for widths other than 1
    /// and 8.
    pub fn with_bits(bits: u8, fill: VoxelTypeId) -> Result<Self, ChunkError> {
        Ok(Self::new(Packing::from_bits(bits)?, fill))
    }

    /// Creates an 8-bit store filled with air.
    pub fn new_air() -> Self {
        Self::new(Packing::Bits8, VoxelTypeId::AIR)
    }

    /// Returns the block type at `(x, y, z)`. Each coordinate must be in `0..32`.
    pub fn get_block(&self, x: usize, y: usize, z: usize) -> VoxelTypeId {
        let slot = self.storage.get(Self::linear_index(x, y, z));
        self.palette[usize::from(slot)]
    }

    /// Writes `voxel` at `(x, y, z)` and returns the type it replaced.
    ///
    /// The replaced type's slot is released first when this was its last
    /// voxel, so a chunk at full palette can still swap one type for another.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::PaletteFull`] when `voxel` is not resident and no
    /// slot can be freed for it. The store is left unchanged.
    pub fn set_block(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        voxel: VoxelTypeId,
    ) -> Result<VoxelTypeId, ChunkError> {
        let index = Self::linear_index(x, y, z);
        let old_slot = self.storage.get(index);
        let old = self.palette[usize::from(old_slot)];
        if old == voxel {
            return Ok(old);
        }

        let capacity = self.packing.palette_capacity();
        let frees_slot = self.ref_counts[usize::from(old_slot)] == 1;
        if !self.slot_of_type.contains_key(&voxel) && !frees_slot && self.palette.len() >= capacity
        {
            return Err(ChunkError::PaletteFull { capacity });
        }

        self.release(old_slot, old);
        let new_slot = self.acquire(voxel)?;
        self.ref_counts[usize::from(new_slot)] += 1;
        self.storage.set(index, new_slot);
        Ok(old)
    }

    /// Sets every voxel to `voxel`, dropping all other palette entries.
    pub fn fill(&mut self, voxel: VoxelTypeId) {
        self.palette = PaletteTable::new();
        self.slot_of_type.clear();
        self.ref_counts = [0; PALETTE_CAPACITY];
        self.storage.clear();
        // An empty table always has room.
        let slot = match self.palette.insert(voxel) {
            Ok(slot) => slot,
            Err(_) => unreachable!("empty palette rejected an insert"),
        };
        debug_assert_eq!(slot, 0);
        self.slot_of_type.insert(voxel, 0);
        self.ref_counts[0] = CHUNK_VOLUME as u16;
    }

    /// Number of distinct block types resident.
    pub fn palette_len(&self) -> usize {
        self.palette.len()
    }

    /// Index width this store was created with.
    pub fn packing(&self) -> Packing {
        self.packing
    }

    /// Number of voxels holding `voxel` (0 if not resident).
    pub fn ref_count(&self, voxel: VoxelTypeId) -> usize {
        self.slot_of_type
            .get(&voxel)
            .map_or(0, |&slot| usize::from(self.ref_counts[usize::from(slot)]))
    }

    /// Iterates over the resident block types in slot order.
    pub fn resident_types(&self) -> impl Iterator<Item = VoxelTypeId> + '_ {
        self.palette.iter().map(|(_, &voxel)| voxel)
    }

    /// Returns `true` if `voxel` occupies at least one voxel.
    pub fn contains_type(&self, voxel: VoxelTypeId) -> bool {
        self.slot_of_type.contains_key(&voxel)
    }

    /// Builds the canonical-order bitmap of voxels whose type equals `voxel`,
    /// or of all other voxels when `invert` is set.
    ///
    /// Works a word of packed slots at a time; a type that is not resident
    /// yields an empty bitmap (full when inverted).
    pub fn build_predicate_bitmap(&self, voxel: VoxelTypeId, invert: bool) -> VoxelBitmap {
        let words = match self.slot_of_type.get(&voxel) {
            Some(&slot) => self.storage.slot_words(slot),
            None => [0; BITMAP_WORDS],
        };
        let mut bitmap = VoxelBitmap::from_words(words, AxisOrder::Xyz);
        if invert {
            bitmap.invert();
        }
        bitmap
    }

    /// Builds the canonical-order bitmap of voxels whose type satisfies
    /// `predicate`. The predicate is evaluated once per resident type.
    pub fn build_bitmap_where(&self, mut predicate: impl FnMut(VoxelTypeId) -> bool) -> VoxelBitmap {
        let mut bitmap = VoxelBitmap::new();
        for (slot, &voxel) in self.palette.iter() {
            if predicate(voxel) {
                let words = self.storage.slot_words(slot as u8);
                bitmap.or_assign(&VoxelBitmap::from_words(words, AxisOrder::Xyz));
            }
        }
        bitmap
    }

    /// Decrements the count of `slot`, freeing it when no voxel uses it any more.
    fn release(&mut self, slot: u8, voxel: VoxelTypeId) {
        let count = &mut self.ref_counts[usize::from(slot)];
        debug_assert!(*count > 0, "release of empty slot {slot}");
        *count -= 1;
        if *count == 0 {
            self.palette.delete(usize::from(slot));
            self.slot_of_type.remove(&voxel);
        }
    }

    /// Returns the slot for `voxel`, inserting it into the palette if needed.
    fn acquire(&mut self, voxel: VoxelTypeId) -> Result<u8, ChunkError> {
        if let Some(&slot) = self.slot_of_type.get(&voxel) {
            return Ok(slot);
        }
        let slot = self.palette.insert(voxel)? as u8;
        self.slot_of_type.insert(voxel, slot);
        Ok(slot)
    }

    /// Converts `(x, y, z)` to a linear index: `x * 1024 + y * 32 + z`.
    #[inline]
    fn linear_index(x: usize, y: usize, z: usize) -> usize {
        debug_assert!(
            x < CHUNK_SIZE && y < CHUNK_SIZE && z < CHUNK_SIZE,
            "({x}, {y}, {z}) out of range"
        );
        (x << 10) | (y << 5) | z
    }
}

impl Default for ChunkStore {
    fn default() -> Self {
        Self::new_air()
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

    fn total_refs(store: &ChunkStore) -> usize {
        store.resident_types().map(|t| store.ref_count(t)).sum()
    }

    /// Places types 1..=63 at one voxel each, so air plus 63 types fill the palette.
    fn fill_palette(store: &mut ChunkStore) {
        for i in 1..64u16 {
            let i_usize = usize::from(i);
            store.set_block(i_usize / 32, i_usize % 32, 0, VoxelTypeId(i)).unwrap();
        }
    }

    #[test]
    fn test_new_store_is_uniform() {
        let store = ChunkStore::new_air();
        assert_eq!(store.palette_len(), 1);
        assert_eq!(store.ref_count(VoxelTypeId::AIR), CHUNK_VOLUME);
        assert_eq!(store.get_block(31, 0, 17), VoxelTypeId::AIR);
    }

    #[test]
    fn test_set_returns_old_and_get_reads_back() {
        let mut store = ChunkStore::new_air();
        let old = store.set_block(1, 2, 3, VoxelTypeId(5)).unwrap();
        assert_eq!(old, VoxelTypeId::AIR);
        assert_eq!(store.get_block(1, 2, 3), VoxelTypeId(5));
        assert_eq!(store.set_block(1, 2, 3, VoxelTypeId(6)).unwrap(), VoxelTypeId(5));
        assert_eq!(store.ref_count(VoxelTypeId(5)), 0, "last voxel gone");
        assert_eq!(store.palette_len(), 2);
    }

    #[test]
    fn test_same_type_write_is_noop() {
        let mut store = ChunkStore::new_air();
        store.set_block(0, 0, 0, VoxelTypeId(9)).unwrap();
        store.set_block(0, 0, 0, VoxelTypeId(9)).unwrap();
        assert_eq!(store.ref_count(VoxelTypeId(9)), 1);
        assert_eq!(total_refs(&store), CHUNK_VOLUME);
    }

    #[test]
    fn test_conservation_under_random_edits() {
        let mut rng = ChaCha8Rng::seed_from_u64(0xC0FFEE);
        let mut store = ChunkStore::new_air();
        for _ in 0..4000 {
            let (x, y, z) = (
                rng.random_range(0..32),
                rng.random_range(0..32),
                rng.random_range(0..32),
            );
            let voxel = VoxelTypeId(rng.random_range(0..40));
            store.set_block(x, y, z, voxel).unwrap();
            assert_eq!(store.get_block(x, y, z), voxel);
            assert_eq!(total_refs(&store), CHUNK_VOLUME);
            assert!(store.resident_types().all(|t| store.ref_count(t) > 0));
        }
    }

    #[test]
    fn test_palette_exhaustion_leaves_state_unchanged() {
        let mut store = ChunkStore::new_air();
        fill_palette(&mut store);
        assert_eq!(store.palette_len(), 64);

        let before: Vec<_> = store.resident_types().collect();
        let err = store.set_block(20, 20, 20, VoxelTypeId(1000)).unwrap_err();
        assert_eq!(err, ChunkError::PaletteFull { capacity: 64 });
        assert_eq!(store.get_block(20, 20, 20), VoxelTypeId::AIR);
        assert_eq!(store.resident_types().collect::<Vec<_>>(), before);
        assert_eq!(total_refs(&store), CHUNK_VOLUME);
    }

    #[test]
    fn test_full_palette_reuses_slot_freed_by_same_write() {
        let mut store = ChunkStore::new_air();
        fill_palette(&mut store);
        assert_eq!(store.palette_len(), 64);
        let lone = store.get_block(0, 5, 0);
        assert_eq!(store.ref_count(lone), 1);

        let old = store.set_block(0, 5, 0, VoxelTypeId(500)).unwrap();
        assert_eq!(old, lone);
        assert_eq!(store.ref_count(lone), 0);
        assert_eq!(store.ref_count(VoxelTypeId(500)), 1);
        assert_eq!(store.palette_len(), 64);
    }

    #[test]
    fn test_unimplemented_packing_rejected() {
        for bits in [0u8, 2, 4, 16] {
            assert_eq!(
                ChunkStore::with_bits(bits, VoxelTypeId::AIR).unwrap_err(),
                ChunkError::PackingNotImplemented { bits }
            );
        }
        assert!(ChunkStore::with_bits(1, VoxelTypeId::AIR).is_ok());
    }

    #[test]
    fn test_one_bit_packing_holds_two_types() {
        let mut store = ChunkStore::new(Packing::Bits1, VoxelTypeId::AIR);
        store.set_block(3, 4, 5, VoxelTypeId(7)).unwrap();
        assert_eq!(store.get_block(3, 4, 5), VoxelTypeId(7));
        assert_eq!(
            store.set_block(0, 0, 0, VoxelTypeId(8)),
            Err(ChunkError::PaletteFull { capacity: 2 })
        );
        // Replacing the only voxel of type 7 frees its slot.
        store.set_block(3, 4, 5, VoxelTypeId(8)).unwrap();
        assert_eq!(store.get_block(3, 4, 5), VoxelTypeId(8));
        assert_eq!(store.palette_len(), 2);
    }

    #[test]
    fn test_fill_resets_palette() {
        let mut store = ChunkStore::new_air();
        store.set_block(0, 0, 0, VoxelTypeId(2)).unwrap();
        store.set_block(0, 0, 1, VoxelTypeId(3)).unwrap();
        store.fill(VoxelTypeId(4));
        assert_eq!(store.palette_len(), 1);
        assert_eq!(store.get_block(0, 0, 1), VoxelTypeId(4));
        assert_eq!(store.ref_count(VoxelTypeId(4)), CHUNK_VOLUME);
    }

    #[test]
    fn test_equal_bytes_matches_lanes() {
        let word = 0x0300_0503_0003_FF03u64;
        assert_eq!(equal_bytes(word, 3 * LANE_ONES), 0b1001_0101);
        assert_eq!(equal_bytes(word, 0), 0b0100_1000);
        assert_eq!(equal_bytes(0, 0), 0xFF);
    }

    #[test]
    fn test_predicate_bitmap_matches_per_voxel_scan() {
        let mut rng = ChaCha8Rng::seed_from_u64(77);
        for packing in [Packing::Bits1, Packing::Bits8] {
            let types = packing.palette_capacity().min(6) as u16;
            let mut store = ChunkStore::new(packing, VoxelTypeId::AIR);
            for _ in 0..3000 {
                let voxel = VoxelTypeId(rng.random_range(0..types));
                store
                    .set_block(
                        rng.random_range(0..32),
                        rng.random_range(0..32),
                        rng.random_range(0..32),
                        voxel,
                    )
                    .unwrap();
            }
            for t in 0..types {
                let voxel = VoxelTypeId(t);
                let bitmap = store.build_predicate_bitmap(voxel, false);
                let inverted = store.build_predicate_bitmap(voxel, true);
                assert_eq!(bitmap.axis_order(), AxisOrder::Xyz);
                for x in 0..32 {
                    for y in 0..32 {
                        for z in 0..32 {
                            let hit = store.get_block(x, y, z) == voxel;
                            assert_eq!(bitmap.get(x, y, z), hit, "{packing:?} {t} ({x},{y},{z})");
                            assert_eq!(inverted.get(x, y, z), !hit);
                        }
                    }
                }
                assert_eq!(bitmap.count_ones() as usize, store.ref_count(voxel));
            }
        }
    }

    #[test]
    fn test_predicate_bitmap_of_absent_type() {
        let store = ChunkStore::new_air();
        assert!(store.build_predicate_bitmap(VoxelTypeId(12), false).is_empty());
        assert_eq!(
            store.build_predicate_bitmap(VoxelTypeId(12), true).count_ones() as usize,
            CHUNK_VOLUME
        );
    }

    #[test]
    fn test_air_bitmap_of_empty_chunk_is_full() {
        let store = ChunkStore::new_air();
        let air = store.build_predicate_bitmap(VoxelTypeId::AIR, false);
        assert_eq!(air, VoxelBitmap::full());
    }

    #[test]
    fn test_bitmap_where_unions_types() {
        let mut store = ChunkStore::new_air();
        store.set_block(0, 0, 0, VoxelTypeId(1)).unwrap();
        store.set_block(5, 5, 5, VoxelTypeId(2)).unwrap();
        store.set_block(9, 9, 9, VoxelTypeId(3)).unwrap();
        let bitmap = store.build_bitmap_where(|t| t == VoxelTypeId(1) || t == VoxelTypeId(3));
        assert_eq!(bitmap.count_ones(), 2);
        assert!(bitmap.get(0, 0, 0));
        assert!(bitmap.get(9, 9, 9));
        assert!(!bitmap.get(5, 5, 5));
    }
}
