//! Word- and bit-level transposes over the 1024-word bitmap layout.
//!
//! Layout reminder: word `(a << 5) | b`, bit `31 - c`. The outer transpose is
//! a pure word permutation. The inner transpose is a 32×32 bit-matrix
//! transpose per outer-A layer, done as a five stage butterfly of delta swaps
//! (field widths 16, 8, 4, 2, 1).
//!
//! Three implementations of the inner transpose exist and must agree bit for
//! bit: the triple-loop reference, the portable butterfly, and on x86_64 an
//! SSE2 butterfly that runs the wide stages four lanes at a time.

use super::BITMAP_WORDS;

/// Words per outer-A layer.
const LAYER: usize = 32;

/// `(field width, low-field mask)` for each butterfly stage, widest first.
const BUTTERFLY_STAGES: [(usize, u32); 5] = [
    (16, 0x0000_FFFF),
    (8, 0x00FF_00FF),
    (4, 0x0F0F_0F0F),
    (2, 0x3333_3333),
    (1, 0x5555_5555),
];

/// Swaps the masked low fields of `lo` with the matching fields of `hi`
/// shifted down by `shift`.
#[inline(always)]
fn delta_swap(lo: u32, hi: u32, shift: u32, mask: u32) -> (u32, u32) {
    let t = ((hi >> shift) ^ lo) & mask;
    (lo ^ t, hi ^ (t << shift))
}

/// Swaps word `(a, b)` with word `(b, a)` for every `a < b`.
pub fn outer_transpose(words: &mut [u32; BITMAP_WORDS]) {
    for a in 0..LAYER {
        for b in (a + 1)..LAYER {
            words.swap((a << 5) | b, (b << 5) | a);
        }
    }
}

/// Transposes the bit matrix of every outer-A layer, using the fastest path
/// available on this target.
pub fn inner_transpose(words: &mut [u32; BITMAP_WORDS]) {
    for layer in words.chunks_exact_mut(LAYER) {
        let rows: &mut [u32; LAYER] = layer
            .try_into()
            .unwrap_or_else(|_| unreachable!("chunks_exact_mut yields {LAYER} words"));
        transpose32(rows);
    }
}

/// Transposes one 32×32 bit matrix (row `i` = word `i`, column `j` = bit `31 - j`).
#[inline]
pub fn transpose32(rows: &mut [u32; LAYER]) {
    #[cfg(target_arch = "x86_64")]
    {
        sse2::transpose32(rows);
    }

    #[cfg(not(target_arch = "x86_64"))]
    {
        transpose32_butterfly(rows);
    }
}

/// Portable butterfly transpose: one delta swap per word pair per stage.
pub fn transpose32_butterfly(rows: &mut [u32; LAYER]) {
    for (width, mask) in BUTTERFLY_STAGES {
        butterfly_stage(rows, width, mask);
    }
}

#[inline(always)]
fn butterfly_stage(rows: &mut [u32; LAYER], width: usize, mask: u32) {
    let mut block = 0;
    while block < LAYER {
        for lo in block..block + width {
            let hi = lo + width;
            (rows[lo], rows[hi]) = delta_swap(rows[lo], rows[hi], width as u32, mask);
        }
        block += 2 * width;
    }
}

#[cfg(target_arch = "x86_64")]
mod sse2 {
    use std::arch::x86_64::{
        __m128i, _mm_and_si128, _mm_cvtsi32_si128, _mm_loadu_si128, _mm_set1_epi32,
        _mm_sll_epi32, _mm_srl_epi32, _mm_storeu_si128, _mm_xor_si128,
    };

    use super::{BUTTERFLY_STAGES, LAYER, butterfly_stage};

    /// Lanes per 128-bit register.
    const LANES: usize = 4;

    /// Butterfly transpose with every stage whose field width is at least
    /// [`LANES`] executed on whole registers; narrower stages pair words
    /// inside one register and fall back to the scalar delta swap.
    pub(super) fn transpose32(rows: &mut [u32; LAYER]) {
        for (width, mask) in BUTTERFLY_STAGES {
            if width >= LANES {
                // SAFETY: SSE2 is part of the x86_64 baseline.
                unsafe { stage(rows, width, mask) };
            } else {
                butterfly_stage(rows, width, mask);
            }
        }
    }

    /// # Safety
    ///
    /// Requires SSE2 and `width` to be a multiple of [`LANES`] no larger than 16.
    #[target_feature(enable = "sse2")]
    unsafe fn stage(rows: &mut [u32; LAYER], width: usize, mask: u32) {
        let base = rows.as_mut_ptr();
        // SAFETY: each load/store touches `lo..lo + LANES` and
        // `lo + width..lo + width + LANES`; `lo` steps by LANES below
        // `block + width` and `block + 2 * width <= LAYER`, so both ranges stay
        // inside `rows`.
        unsafe {
            let mask_v = _mm_set1_epi32(mask as i32);
            let count = _mm_cvtsi32_si128(width as i32);
            let mut block = 0;
            while block < LAYER {
                let mut lo = block;
                while lo < block + width {
                    let lo_ptr = base.add(lo) as *mut __m128i;
                    let hi_ptr = base.add(lo + width) as *mut __m128i;
                    let lo_v = _mm_loadu_si128(lo_ptr);
                    let hi_v = _mm_loadu_si128(hi_ptr);
                    let t = _mm_and_si128(_mm_xor_si128(_mm_srl_epi32(hi_v, count), lo_v), mask_v);
                    _mm_storeu_si128(lo_ptr, _mm_xor_si128(lo_v, t));
                    _mm_storeu_si128(hi_ptr, _mm_xor_si128(hi_v, _mm_sll_epi32(t, count)));
                    lo += LANES;
                }
                block += 2 * width;
            }
        }
    }
}

/// Reference implementations: one bit at a time, straight from the layout
/// definition. Slow, obviously correct, and the oracle the fast paths are
/// tested against.
pub mod reference {
    use super::{BITMAP_WORDS, LAYER};

    fn bit(words: &[u32; BITMAP_WORDS], a: usize, b: usize, c: usize) -> bool {
        words[(a << 5) | b] & (0x8000_0000 >> c) != 0
    }

    /// Outer transpose: `dst(a, b, c) = src(b, a, c)`.
    pub fn outer_transpose(words: &mut [u32; BITMAP_WORDS]) {
        let src = *words;
        words.fill(0);
        for a in 0..LAYER {
            for b in 0..LAYER {
                for c in 0..LAYER {
                    if bit(&src, b, a, c) {
                        words[(a << 5) | b] |= 0x8000_0000 >> c;
                    }
                }
            }
        }
    }

    /// Inner transpose: `dst(a, b, c) = src(a, c, b)`.
    pub fn inner_transpose(words: &mut [u32; BITMAP_WORDS]) {
        let src = *words;
        words.fill(0);
        for a in 0..LAYER {
            for b in 0..LAYER {
                for c in 0..LAYER {
                    if bit(&src, a, c, b) {
                        words[(a << 5) | b] |= 0x8000_0000 >> c;
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
