//! Binary greedy meshing over a culled [`VoxelBitmap`].
//!
//! The bitmap must already be culled to one face direction and oriented so
//! the face normal is outer-A. Within each outer-A layer the mesher takes the
//! lowest run of set bits in a word (the quad's height along the inner axis),
//! then widens it across following outer-B words for as long as they contain
//! the same run. Matched bits are XOR-cleared as they are consumed, so every
//! set bit ends up in exactly one quad.
//!
//! Empty words are never visited: a per-layer summary of non-zero words and a
//! summary of non-empty layers are walked with `trailing_zeros`.

use lattice_voxel::{BITMAP_WORDS, VoxelBitmap};

use crate::quad::PackedQuad;

const LAYER: usize = 32;

/// Meshes a copy of `bitmap` and returns the quads.
pub fn greedy_mesh(bitmap: &VoxelBitmap) -> Vec<PackedQuad> {
    let mut quads = Vec::new();
    let mut words = *bitmap.words();
    greedy_mesh_words(&mut words, &mut quads);
    quads
}

/// Meshes `bitmap` in place, appending quads to `quads`. The bitmap is empty
/// afterwards.
pub fn greedy_mesh_into(bitmap: &mut VoxelBitmap, quads: &mut Vec<PackedQuad>) {
    greedy_mesh_words(bitmap.words_mut(), quads);
}

/// Per-layer bitmask of non-zero words, and a bitmask of non-empty layers.
fn summarize(words: &[u32; BITMAP_WORDS]) -> ([u32; LAYER], u32) {
    let mut active_rows = [0u32; LAYER];
    for (row, layer) in active_rows.iter_mut().zip(words.chunks_exact(LAYER)) {
        *row = layer
            .iter()
            .enumerate()
            .fold(0, |mask, (b, &word)| mask | (u32::from(word != 0) << b));
    }
    let active_slices = active_rows
        .iter()
        .enumerate()
        .fold(0, |mask, (a, &row)| mask | (u32::from(row != 0) << a));
    (active_rows, active_slices)
}

fn greedy_mesh_words(words: &mut [u32; BITMAP_WORDS], quads: &mut Vec<PackedQuad>) {
    let (mut active_rows, mut active_slices) = summarize(words);

    while active_slices != 0 {
        let a = active_slices.trailing_zeros() as usize;
        let base = a << 5;

        while active_rows[a] != 0 {
            let b = active_rows[a].trailing_zeros() as usize;

            while words[base | b] != 0 {
                let bits = words[base | b];
                let bottom = bits.trailing_zeros();
                let height = (bits >> bottom).trailing_ones();
                let mask = (u32::MAX >> (32 - height)) << bottom;
                words[base | b] ^= mask;

                let mut width = 1;
                while b + width < LAYER && words[base | (b + width)] & mask == mask {
                    words[base | (b + width)] ^= mask;
                    width += 1;
                }

                // Bit 31 is inner coordinate 0, so the run's low end in bit
                // order is its high end in coordinates.
                let inner_start = 32 - bottom - height;
                quads.push(PackedQuad::new(
                    a as u8,
                    b as u8,
                    inner_start as u8,
                    width as u8,
                    height as u8,
                ));
            }

            active_rows[a] &= active_rows[a] - 1;
        }

        active_slices &= active_slices - 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
