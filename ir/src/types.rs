//! Tensor types: element dtype plus shape.

use std::fmt;

use tensora_dtype::DType;

/// A single mode extent: a fixed size or a symbolic dimension.
///
/// Two dimensions agree iff both are variable or both are fixed with the
/// same extent; fixed-vs-variable is a mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Fixed(u64),
    Variable,
}

impl Dimension {
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }

    pub fn size(&self) -> Option<u64> {
        match self {
            Self::Fixed(size) => Some(*size),
            Self::Variable => None,
        }
    }
}

impl From<u64> for Dimension {
    fn from(size: u64) -> Self {
        Self::Fixed(size)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(size) => write!(f, "{size}"),
            Self::Variable => f.write_str("?"),
        }
    }
}

/// Ordered sequence of dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Shape {
    dims: Vec<Dimension>,
}

impl Shape {
    pub fn new(dims: Vec<Dimension>) -> Self {
        Self { dims }
    }

    /// The order-zero shape.
    pub fn scalar() -> Self {
        Self { dims: Vec::new() }
    }

    /// Shape with the given fixed extents.
    pub fn fixed(extents: &[u64]) -> Self {
        Self { dims: extents.iter().map(|&size| Dimension::Fixed(size)).collect() }
    }

    pub fn order(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    pub fn dimension(&self, mode: usize) -> Option<Dimension> {
        self.dims.get(mode).copied()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, dim) in self.dims.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{dim}")?;
        }
        f.write_str("]")
    }
}

/// Element data type plus shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorType {
    dtype: DType,
    shape: Shape,
}

impl TensorType {
    pub fn new(dtype: DType, shape: Shape) -> Self {
        Self { dtype, shape }
    }

    pub fn scalar(dtype: DType) -> Self {
        Self { dtype, shape: Shape::scalar() }
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn order(&self) -> usize {
        self.shape.order()
    }
}

impl fmt::Display for TensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.dtype, self.shape)
    }
}
