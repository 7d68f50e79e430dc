//! Axis orientation of a [`super::VoxelBitmap`].
//!
//! A bitmap word is addressed by two *outer* axes `(a, b)` and its 32 bits run
//! along the *inner* axis. [`AxisOrder`] names which chunk axis plays which
//! role, listed as `outer_a, outer_b, inner`. Transposes move between the six
//! orders through fixed lookup tables; every order is reachable and none is
//! invalid.

/// One of the three chunk axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Axis {
    /// X axis.
    X = 0,
    /// Y axis.
    Y = 1,
    /// Z axis.
    Z = 2,
}

impl Axis {
    /// All three axes in order.
    pub const ALL: [Axis; 3] = [Self::X, Self::Y, Self::Z];

    /// Returns the axis index (0–2), usable to index `[x, y, z]` arrays.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Permutation of `(X, Y, Z)` as `(outer_a, outer_b, inner)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum AxisOrder {
    /// Words indexed by `(x, y)`, bits run along z. Canonical order.
    #[default]
    Xyz = 0,
    /// Words indexed by `(x, z)`, bits run along y.
    Xzy = 1,
    /// Words indexed by `(y, x)`, bits run along z.
    Yxz = 2,
    /// Words indexed by `(y, z)`, bits run along x.
    Yzx = 3,
    /// Words indexed by `(z, x)`, bits run along y.
    Zxy = 4,
    /// Words indexed by `(z, y)`, bits run along x.
    Zyx = 5,
}

/// Order reached by swapping the two outer axes, indexed by current order.
const OUTER_TRANSPOSE: [AxisOrder; 6] = [
    AxisOrder::Yxz, // Xyz
    AxisOrder::Zxy, // Xzy
    AxisOrder::Xyz, // Yxz
    AxisOrder::Zyx, // Yzx
    AxisOrder::Xzy, // Zxy
    AxisOrder::Yzx, // Zyx
];

/// Order reached by swapping outer-B with the inner axis, indexed by current order.
const INNER_TRANSPOSE: [AxisOrder; 6] = [
    AxisOrder::Xzy, // Xyz
    AxisOrder::Xyz, // Xzy
    AxisOrder::Yzx, // Yxz
    AxisOrder::Yxz, // Yzx
    AxisOrder::Zyx, // Zxy
    AxisOrder::Zxy, // Zyx
];

const AXES: [[Axis; 3]; 6] = [
    [Axis::X, Axis::Y, Axis::Z],
    [Axis::X, Axis::Z, Axis::Y],
    [Axis::Y, Axis::X, Axis::Z],
    [Axis::Y, Axis::Z, Axis::X],
    [Axis::Z, Axis::X, Axis::Y],
    [Axis::Z, Axis::Y, Axis::X],
];

impl AxisOrder {
    /// All six orders.
    pub const ALL: [AxisOrder; 6] = [
        Self::Xyz,
        Self::Xzy,
        Self::Yxz,
        Self::Yzx,
        Self::Zxy,
        Self::Zyx,
    ];

    /// Returns the order index (0–5).
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns `[outer_a, outer_b, inner]`.
    pub const fn axes(self) -> [Axis; 3] {
        AXES[self as usize]
    }

    /// Axis addressed by the high five bits of the word index.
    pub const fn outer_a(self) -> Axis {
        self.axes()[0]
    }

    /// Axis addressed by the low five bits of the word index.
    pub const fn outer_b(self) -> Axis {
        self.axes()[1]
    }

    /// Axis addressed by bit position within a word.
    pub const fn inner(self) -> Axis {
        self.axes()[2]
    }

    /// Order after an outer transpose.
    pub const fn outer_transposed(self) -> Self {
        OUTER_TRANSPOSE[self as usize]
    }

    /// Order after an inner transpose.
    pub const fn inner_transposed(self) -> Self {
        INNER_TRANSPOSE[self as usize]
    }

    /// Order after an inner transpose followed by an outer transpose, which
    /// moves the current inner axis to outer-A.
    pub const fn outer_inner_swapped(self) -> Self {
        self.inner_transposed().outer_transposed()
    }

    /// Maps `(a, b, c)` in this order back to chunk `[x, y, z]`.
    pub fn to_xyz(self, a: usize, b: usize, c: usize) -> [usize; 3] {
        let [axis_a, axis_b, axis_c] = self.axes();
        let mut xyz = [0; 3];
        xyz[axis_a.index()] = a;
        xyz[axis_b.index()] = b;
        xyz[axis_c.index()] = c;
        xyz
    }

    /// Maps chunk `[x, y, z]` to `[a, b, c]` in this order.
    pub fn from_xyz(self, xyz: [usize; 3]) -> [usize; 3] {
        let [axis_a, axis_b, axis_c] = self.axes();
        [xyz[axis_a.index()], xyz[axis_b.index()], xyz[axis_c.index()]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_cycles() {
        assert_eq!(AxisOrder::Xyz.outer_transposed(), AxisOrder::Yxz);
        assert_eq!(AxisOrder::Yxz.outer_transposed(), AxisOrder::Xyz);
        assert_eq!(AxisOrder::Xyz.inner_transposed(), AxisOrder::Xzy);
        assert_eq!(AxisOrder::Xzy.inner_transposed(), AxisOrder::Xyz);
    }

    #[test]
    fn test_transposes_are_involutions() {
        for order in AxisOrder::ALL {
            assert_eq!(order.outer_transposed().outer_transposed(), order);
            assert_eq!(order.inner_transposed().inner_transposed(), order);
        }
    }

    #[test]
    fn test_tables_agree_with_axis_swaps() {
        for order in AxisOrder::ALL {
            let [a, b, c] = order.axes();
            assert_eq!(order.outer_transposed().axes(), [b, a, c], "{order:?}");
            assert_eq!(order.inner_transposed().axes(), [a, c, b], "{order:?}");
        }
    }

    #[test]
    fn test_swap_moves_inner_to_outer_a() {
        for order in AxisOrder::ALL {
            assert_eq!(order.outer_inner_swapped().outer_a(), order.inner());
        }
        // Xyz -> Xzy -> Zxy
        assert_eq!(AxisOrder::Xyz.outer_inner_swapped(), AxisOrder::Zxy);
    }

    #[test]
    fn test_swap_is_three_cycle() {
        for order in AxisOrder::ALL {
            let once = order.outer_inner_swapped();
            assert_ne!(once, order);
            assert_eq!(once.outer_inner_swapped().outer_inner_swapped(), order);
        }
    }

    #[test]
    fn test_xyz_mapping_roundtrip() {
        for order in AxisOrder::ALL {
            let abc = order.from_xyz([3, 17, 29]);
            assert_eq!(order.to_xyz(abc[0], abc[1], abc[2]), [3, 17, 29]);
        }
        assert_eq!(AxisOrder::Zxy.from_xyz([1, 2, 3]), [3, 1, 2]);
    }

    #[test]
    fn test_all_orders_distinct() {
        for (i, a) in AxisOrder::ALL.iter().enumerate() {
            assert_eq!(a.index(), i);
            for b in &AxisOrder::ALL[i + 1..] {
                assert_ne!(a.axes(), b.axes());
            }
        }
    }
}
