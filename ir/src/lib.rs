//! Index-expression algebra for tensor compilation.
//!
//! Expressions name tensors, index them with identity-based index
//! variables, combine them with arithmetic and reductions, and are bound
//! (possibly with accumulation) to a result tensor under a chosen free
//! index set. This crate covers the expression layer only: node
//! construction, traversal and rewriting, variable and dimension analyses,
//! einsum normalization, zero-propagation simplification, and the
//! assignment protocol. Lowering to loops and code generation consume the
//! bound expressions through the accessors defined here.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use num_complex::Complex64;
use parking_lot::Mutex;
use smallvec::SmallVec;

use tensora_dtype::{DType, HasDType};

pub mod analysis;
pub mod error;
pub mod format;
pub mod ops;
pub mod printer;
pub mod rewrite;
pub mod schedule;
pub mod transform;
pub mod types;
pub mod vars;
pub mod visit;

#[cfg(test)]
pub mod test;

pub use analysis::{
    DimensionConflict, contains_distribution, contains_transpose, dimension_conflicts,
    dimensions_typecheck, einsum_applies, equals, index_var_ranges, index_vars, index_vars_of,
    vars_without_reduction, verify, verify_tensor,
};
pub use error::{Error, Result};
pub use format::{Format, ModeFormat};
pub use ops::{max_over, min_over, product, sqrt, sum};
pub use rewrite::ExprRewriter;
pub use schedule::{OperatorSplit, Schedule};
pub use transform::{einsum, einsum_tensor, simplify};
pub use types::{Dimension, Shape, TensorType};
pub use vars::{Access, Assignment, IndexVar, TensorVar};
pub use visit::{ExprVisitor, for_each_access};

// Process-wide counter backing handle and node identities.
//
// Monotonic and never reused. Atomic rather than thread-local: handles are
// Send, and identifier creation must stay safe under concurrent
// construction.
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

pub(crate) fn next_id() -> u64 {
    ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

// Per-prefix counters backing auto-generated display names.
static NAME_COUNTERS: Mutex<BTreeMap<char, u64>> = Mutex::new(BTreeMap::new());

/// Mint a display name `"<prefix><n>"`, n monotonic per prefix for the
/// lifetime of the process.
///
/// Collisions with client-supplied names are not prevented; identity never
/// depends on names.
pub fn unique_name(prefix: char) -> String {
    let mut counters = NAME_COUNTERS.lock();
    let n = counters.entry(prefix).or_insert(0);
    let name = format!("{prefix}{n}");
    *n += 1;
    name
}

/// Unary operation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Negation: -x
    Neg,
    /// Square root: √x
    Sqrt,
}

/// Binary operation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Addition: a + b
    Add,
    /// Subtraction: a - b
    Sub,
    /// Multiplication: a * b
    Mul,
    /// Division: a / b
    Div,
}

impl BinaryOp {
    /// Additive operations tolerate a missing operand under
    /// zero-propagation (the missing side is the zero element).
    pub fn is_additive(self) -> bool {
        matches!(self, Self::Add | Self::Sub)
    }

    /// Multiplicative operations propagate a missing operand.
    pub fn is_multiplicative(self) -> bool {
        matches!(self, Self::Mul | Self::Div)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

/// Reduction operator applied along a bound index variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReduceOp {
    Sum,
    Prod,
    Min,
    Max,
}

impl ReduceOp {
    pub fn name(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Prod => "product",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

/// Immediate payload stored on a leaf node.
#[derive(Debug, Clone, Copy)]
pub enum ImmValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Complex(Complex64),
}

impl ImmValue {
    pub fn dtype(&self) -> DType {
        match self {
            Self::Int(_) => i64::DTYPE,
            Self::UInt(_) => u64::DTYPE,
            Self::Float(_) => f64::DTYPE,
            Self::Complex(_) => Complex64::DTYPE,
        }
    }
}

// Immediate equality is bitwise on float payloads, so structural equality
// stays reflexive for NaN and distinguishes -0.0 from 0.0.
impl PartialEq for ImmValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::UInt(a), Self::UInt(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Complex(a), Self::Complex(b)) => {
                a.re.to_bits() == b.re.to_bits() && a.im.to_bits() == b.im.to_bits()
            }
            _ => false,
        }
    }
}

impl Eq for ImmValue {}

/// Expression node variants.
///
/// Children are always defined expressions; the undefined sentinel appears
/// only on the `IndexExpr` surface (rewrite results), never inside a node.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Tensor access `A(i, j, ...)`. The index list length equals the
    /// tensor's order.
    Access {
        tensor: vars::TensorVar,
        indices: SmallVec<[vars::IndexVar; 4]>,
    },
    Unary(UnaryOp, IndexExpr),
    Binary(BinaryOp, IndexExpr, IndexExpr),
    /// Reduces `body` along `var` with the reduction operator.
    Reduction {
        op: ReduceOp,
        var: vars::IndexVar,
        body: IndexExpr,
    },
    Imm(ImmValue),
}

impl Expr {
    /// Child expressions in evaluation order.
    pub fn children(&self) -> SmallVec<[&IndexExpr; 2]> {
        match self {
            Self::Access { .. } | Self::Imm(_) => SmallVec::new(),
            Self::Unary(_, a) => smallvec::smallvec![a],
            Self::Binary(_, a, b) => smallvec::smallvec![a, b],
            Self::Reduction { body, .. } => smallvec::smallvec![body],
        }
    }
}

/// A node in an expression tree.
///
/// Nodes are immutable except for the operator-split list, which clients
/// append to through any alias of the node; the mutex provides the
/// exclusive access that mutation requires.
#[derive(Debug)]
pub struct ExprNode {
    id: u64,
    dtype: DType,
    expr: Expr,
    splits: Mutex<Vec<OperatorSplit>>,
}

impl ExprNode {
    fn new(expr: Expr, dtype: DType) -> Arc<Self> {
        Arc::new(Self { id: next_id(), dtype, expr, splits: Mutex::new(Vec::new()) })
    }

    /// Stable identity of this node. Monotonic, never reused.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Snapshot of the operator splits recorded on this node.
    pub fn operator_splits(&self) -> Vec<OperatorSplit> {
        self.splits.lock().clone()
    }

    /// Append an operator split. All aliases of the node observe it.
    pub fn split_operator(&self, old: vars::IndexVar, left: vars::IndexVar, right: vars::IndexVar) {
        self.splits.lock().push(OperatorSplit { old, left, right });
    }
}

/// Shared-ownership handle to an immutable expression node.
///
/// A handle is either *defined* (points to a node) or *undefined* (the
/// sentinel). `simplify` and `einsum` return undefined to signal "nothing
/// remains" or "not applicable"; callers check `defined()`.
#[derive(Debug, Clone, Default)]
pub struct IndexExpr {
    node: Option<Arc<ExprNode>>,
}

impl IndexExpr {
    /// The undefined sentinel.
    pub fn undefined() -> Self {
        Self { node: None }
    }

    pub fn defined(&self) -> bool {
        self.node.is_some()
    }

    pub fn node(&self) -> Option<&Arc<ExprNode>> {
        self.node.as_ref()
    }

    pub(crate) fn from_node(node: Arc<ExprNode>) -> Self {
        Self { node: Some(node) }
    }

    fn new(expr: Expr, dtype: DType) -> Self {
        Self::from_node(ExprNode::new(expr, dtype))
    }

    /// Element data type; `None` for the undefined sentinel.
    pub fn dtype(&self) -> Option<DType> {
        self.node.as_deref().map(ExprNode::dtype)
    }

    /// Identity comparison: same node, or both undefined.
    pub fn same(a: &Self, b: &Self) -> bool {
        match (&a.node, &b.node) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Build a unary node over a defined operand.
    ///
    /// # Panics
    /// Panics if `a` is undefined; that is an IR invariant breach, not a
    /// user error.
    pub fn unary(op: UnaryOp, a: IndexExpr) -> Self {
        let dtype = a.dtype().expect("unary operand must be a defined expression");
        Self::new(Expr::Unary(op, a), dtype)
    }

    /// Build a binary node; the result type is the promoted type of the
    /// children.
    ///
    /// # Panics
    /// Panics if either operand is undefined.
    pub fn binary(op: BinaryOp, a: IndexExpr, b: IndexExpr) -> Self {
        let at = a.dtype().expect("binary operand must be a defined expression");
        let bt = b.dtype().expect("binary operand must be a defined expression");
        let dtype = DType::least_upper_dtype(&[at, bt])
            .expect("arithmetic promotion is total over supported dtypes");
        Self::new(Expr::Binary(op, a, b), dtype)
    }

    /// Build a reduction of `body` along `var`.
    ///
    /// # Panics
    /// Panics if `body` is undefined.
    pub fn reduction(op: ReduceOp, var: vars::IndexVar, body: IndexExpr) -> Self {
        let dtype = body.dtype().expect("reduction body must be a defined expression");
        Self::new(Expr::Reduction { op, var, body }, dtype)
    }

    pub(crate) fn access(
        tensor: vars::TensorVar,
        indices: SmallVec<[vars::IndexVar; 4]>,
    ) -> Self {
        let dtype = tensor.ty().dtype();
        Self::new(Expr::Access { tensor, indices }, dtype)
    }

    /// Append an operator split to the underlying node; every alias of the
    /// node observes the annotation.
    ///
    /// # Panics
    /// Panics on an undefined expression.
    pub fn split_operator(&self, old: vars::IndexVar, left: vars::IndexVar, right: vars::IndexVar) {
        self.node
            .as_deref()
            .expect("cannot split an operator on an undefined expression")
            .split_operator(old, left, right);
    }

    /// Snapshot of the operator splits on the underlying node; empty for
    /// the undefined sentinel.
    pub fn operator_splits(&self) -> Vec<OperatorSplit> {
        self.node.as_deref().map(ExprNode::operator_splits).unwrap_or_default()
    }
}

macro_rules! imm_from {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$ty> for IndexExpr {
                fn from(value: $ty) -> Self {
                    let imm = ImmValue::$variant(value);
                    Self::new(Expr::Imm(imm), imm.dtype())
                }
            }
        )+
    };
}

imm_from! {
    i64 => Int,
    u64 => UInt,
    f64 => Float,
    Complex64 => Complex,
}
