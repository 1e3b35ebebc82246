use enumset::EnumSet;

use super::DType;

impl DType {
    const fn promotion_lattice(self) -> &'static [Self] {
        use DType::*;
        match self {
            Bool => &[Int8, UInt8],
            Int8 => &[Int16],
            Int16 => &[Int32],
            Int32 => &[Int64],
            Int64 => &[Float32],
            UInt8 => &[Int16, UInt16],
            UInt16 => &[Int32, UInt32],
            UInt32 => &[Int64, UInt64],
            UInt64 => &[Float32],
            Float32 => &[Float64, Complex64],
            Float64 => &[Complex128],
            Complex64 => &[Complex128],
            Complex128 => &[],
        }
    }

    fn get_recursive_parents(self) -> EnumSet<Self> {
        self.promotion_lattice()
            .iter()
            .fold(EnumSet::only(self), |dtypes, &parent| dtypes.union(parent.get_recursive_parents()))
    }

    /// True iff a value of `self` can be represented as `to` without loss,
    /// i.e. `to` is reachable from `self` in the promotion lattice.
    pub fn promotes_to(self, to: Self) -> bool {
        self.get_recursive_parents().contains(to)
    }

    /// Find the least upper bound type for a set of dtypes.
    ///
    /// Returns the smallest type every input can be promoted to. Every
    /// supported type promotes to Complex128, so the result is `Some` for
    /// any non-empty input.
    pub fn least_upper_dtype(dtypes: &[Self]) -> Option<Self> {
        dtypes
            .iter()
            .map(|dtype| dtype.get_recursive_parents())
            .reduce(|lhs, rhs| lhs.intersection(rhs))?
            .iter()
            .min() // min by discriminant (= priority: lower = more specific)
    }
}
