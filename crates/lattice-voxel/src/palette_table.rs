//! Dense, fixed-capacity table mapping small integer indices to values.
//!
//! Deleted indices are kept in a free set and handed out again, lowest first,
//! by the next [`PaletteTable::insert`]. The backing storage never shrinks, so
//! an index stays stable for as long as its entry is live.

use thiserror::Error;

/// Errors returned by [`PaletteTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PaletteError {
    /// Every slot is live and no freed index is available.
    #[error("palette table capacity exceeded ({capacity} live entries)")]
    CapacityExceeded {
        /// Maximum number of live entries.
        capacity: usize,
    },
}

/// Free-list backed dense array holding at most `N` live entries.
///
/// Indices are valid between the [`insert`](Self::insert) that returned them
/// and the matching [`delete`](Self::delete). The table does not detect double
/// deletes; owners are expected to track liveness themselves (the chunk store
/// does so through reference counts).
#[derive(Clone, Debug)]
pub struct PaletteTable<V, const N: usize> {
    /// Backing slots, live or free. Length only grows.
    slots: Vec<V>,
    /// Bitset of free slot indices (bit `i % 64` of word `i / 64`).
    free: Vec<u64>,
    /// Number of set bits in `free`.
    free_count: usize,
}

impl<V, const N: usize> PaletteTable<V, N> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: vec![0; N.div_ceil(64)],
            free_count: 0,
        }
    }

    /// Stores `value` and returns its index.
    ///
    /// Reuses the lowest freed index when one exists, otherwise appends.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::CapacityExceeded`] when `N` entries are live.
    pub fn insert(&mut self, value: V) -> Result<usize, PaletteError> {
        if let Some(index) = self.take_lowest_free() {
            self.slots[index] = value;
            return Ok(index);
        }
        if self.slots.len() >= N {
            return Err(PaletteError::CapacityExceeded { capacity: N });
        }
        self.slots.push(value);
        Ok(self.slots.len() - 1)
    }

    /// Marks `index` as reusable. The stored value is left in place until the
    /// slot is handed out again.
    ///
    /// `index` must have been returned by [`insert`](Self::insert) and not
    /// deleted since.
    pub fn delete(&mut self, index: usize) {
        debug_assert!(index < self.slots.len(), "delete of unallocated index {index}");
        debug_assert!(!self.is_free(index), "double delete of index {index}");
        self.free[index / 64] |= 1 << (index % 64);
        self.free_count += 1;
    }

    /// Returns the value at `index` if the index is live.
    pub fn get(&self, index: usize) -> Option<&V> {
        if index < self.slots.len() && !self.is_free(index) {
            self.slots.get(index)
        } else {
            None
        }
    }

    /// Returns `true` if `index` refers to a live entry.
    pub fn is_live(&self, index: usize) -> bool {
        index < self.slots.len() && !self.is_free(index)
    }

    /// Number of live entries (total slots minus free slots).
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_count
    }

    /// Returns `true` if there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if no freed slot is available and the backing storage
    /// has reached `N` slots, i.e. the next insert will fail.
    pub fn is_full(&self) -> bool {
        self.free_count == 0 && self.slots.len() >= N
    }

    /// Maximum number of live entries.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of backing slots ever allocated, live or free.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Iterates over `(index, value)` for every live entry in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &V)> {
        self.slots
            .iter()
            .enumerate()
            .filter(move |(index, _)| !self.is_free(*index))
    }

    fn is_free(&self, index: usize) -> bool {
        self.free[index / 64] & (1 << (index % 64)) != 0
    }

    fn take_lowest_free(&mut self) -> Option<usize> {
        if self.free_count == 0 {
            return None;
        }
        let (word_index, word) = self
            .free
            .iter_mut()
            .enumerate()
            .find(|(_, word)| **word != 0)?;
        let bit = word.trailing_zeros() as usize;
        *word &= *word - 1;
        self.free_count -= 1;
        Some(word_index * 64 + bit)
    }
}

impl<V, const N: usize> Default for PaletteTable<V, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, const N: usize> std::ops::Index<usize> for PaletteTable<V, N> {
    type Output = V;

    /// Unchecked-liveness lookup for hot paths; the caller guarantees `index`
    /// is live.
    fn index(&self, index: usize) -> &V {
        debug_assert!(self.is_live(index), "lookup of dead index {index}");
        &self.slots[index]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
