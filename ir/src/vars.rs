//! Identity-based index and tensor variables.
//!
//! Handles share an inner content block; equality, ordering and hashing go
//! through a minted id, never the display name. Two distinct variables may
//! carry the same name and remain distinct.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;
use snafu::ensure;

use crate::error::{
    AccessAritySnafu, AccumulationUnsupportedSnafu, DimensionMismatchSnafu, DistributionSnafu,
    IllFormedSnafu, ReassignmentSnafu, Result, ScalarAssignmentSnafu, TranspositionSnafu,
};
use crate::format::Format;
use crate::printer::render_assignment;
use crate::schedule::Schedule;
use crate::types::TensorType;
use crate::{Expr, ExprNode, IndexExpr, analysis, next_id, unique_name};

#[derive(Debug)]
struct IndexVarContent {
    id: u64,
    name: String,
}

/// A named label denoting a loop or summation dimension.
///
/// Two handles compare equal iff they denote the same underlying binding,
/// irrespective of display name.
#[derive(Clone)]
pub struct IndexVar {
    content: Arc<IndexVarContent>,
}

impl IndexVar {
    /// Fresh variable with an auto-generated name from the `i` prefix.
    pub fn new() -> Self {
        Self::named(unique_name('i'))
    }

    /// Fresh variable with a client-supplied display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self { content: Arc::new(IndexVarContent { id: next_id(), name: name.into() }) }
    }

    pub fn name(&self) -> &str {
        &self.content.name
    }

    pub(crate) fn id(&self) -> u64 {
        self.content.id
    }
}

impl Default for IndexVar {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for IndexVar {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for IndexVar {}

impl PartialOrd for IndexVar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexVar {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id().cmp(&other.id())
    }
}

impl Hash for IndexVar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for IndexVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IndexVar({})", self.name())
    }
}

impl fmt::Display for IndexVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A recorded binding of an expression to a result tensor.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub free: Vec<IndexVar>,
    pub expr: IndexExpr,
    pub accumulate: bool,
}

#[derive(Debug)]
struct TensorVarContent {
    id: u64,
    name: Mutex<String>,
    ty: TensorType,
    format: Format,
    assignment: Mutex<Option<Assignment>>,
    schedule: Mutex<Schedule>,
}

/// A named, typed, formatted tensor handle, optionally carrying an
/// assignment.
///
/// Identity and ordering are by minted id, as for [`IndexVar`]. A tensor
/// is single-assignment in the IR: rebinding is a user error.
#[derive(Clone)]
pub struct TensorVar {
    content: Arc<TensorVarContent>,
}

impl TensorVar {
    pub fn new(name: impl Into<String>, ty: TensorType, format: Format) -> Self {
        debug_assert_eq!(ty.order(), format.order());
        Self {
            content: Arc::new(TensorVarContent {
                id: next_id(),
                name: Mutex::new(name.into()),
                ty,
                format,
                assignment: Mutex::new(None),
                schedule: Mutex::new(Schedule::default()),
            }),
        }
    }

    /// Named tensor with the all-dense default format.
    pub fn named(name: impl Into<String>, ty: TensorType) -> Self {
        let format = Format::dense(ty.order());
        Self::new(name, ty, format)
    }

    /// Auto-named tensor (from the `A` prefix) with the all-dense format.
    pub fn with_type(ty: TensorType) -> Self {
        Self::named(unique_name('A'), ty)
    }

    pub fn name(&self) -> String {
        self.content.name.lock().clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.content.name.lock() = name.into();
    }

    pub fn ty(&self) -> &TensorType {
        &self.content.ty
    }

    pub fn order(&self) -> usize {
        self.content.ty.order()
    }

    pub fn format(&self) -> &Format {
        &self.content.format
    }

    pub(crate) fn id(&self) -> u64 {
        self.content.id
    }

    /// The free variables of the recorded assignment; empty when unbound.
    pub fn free_vars(&self) -> Vec<IndexVar> {
        self.content.assignment.lock().as_ref().map(|a| a.free.clone()).unwrap_or_default()
    }

    /// The bound expression; undefined when unbound.
    pub fn index_expr(&self) -> IndexExpr {
        self.content.assignment.lock().as_ref().map(|a| a.expr.clone()).unwrap_or_default()
    }

    pub fn is_accumulating(&self) -> bool {
        self.content.assignment.lock().as_ref().map(|a| a.accumulate).unwrap_or(false)
    }

    pub fn assignment(&self) -> Option<Assignment> {
        self.content.assignment.lock().clone()
    }

    /// Index this tensor: `A.index([i, j])` is the expression `A(i,j)` and
    /// the left-hand side of the assignment protocol.
    ///
    /// # Errors
    /// The number of index variables must equal the tensor's order.
    pub fn index(&self, indices: impl IntoIterator<Item = IndexVar>) -> Result<Access> {
        let indices: SmallVec<[IndexVar; 4]> = indices.into_iter().collect();
        ensure!(
            indices.len() == self.order(),
            AccessAritySnafu {
                tensor: self.name(),
                order: self.order(),
                indices: indices.iter().map(IndexVar::name).collect::<Vec<_>>().join(","),
            }
        );
        let expr = IndexExpr::access(self.clone(), indices);
        let node = expr.node().expect("access construction yields a defined expression").clone();
        Ok(Access { node })
    }

    /// Bind `expr` to this scalar tensor (`result = expr`).
    ///
    /// # Errors
    /// Only order-zero tensors accept an assignment without index
    /// variables; all protocol checks of [`Access::assign`] apply.
    pub fn assign(&self, expr: impl Into<IndexExpr>) -> Result<()> {
        ensure!(
            self.order() == 0,
            ScalarAssignmentSnafu { tensor: self.name(), order: self.order() }
        );
        self.bind(Vec::new(), expr.into(), false)
    }

    /// Accumulate `expr` into this scalar tensor (`result += expr`).
    pub fn accumulate(&self, expr: impl Into<IndexExpr>) -> Result<()> {
        ensure!(
            self.order() == 0,
            ScalarAssignmentSnafu { tensor: self.name(), order: self.order() }
        );
        self.bind(Vec::new(), expr.into(), true)
    }

    /// Rebuild the schedule from the bound expression: the cached schedule
    /// is cleared and the operator splits of every binary node collected
    /// in traversal order.
    pub fn schedule(&self) -> Schedule {
        let mut schedule = self.content.schedule.lock();
        schedule.clear();
        schedule.collect(&self.index_expr());
        schedule.clone()
    }

    /// The assignment protocol. Every check precedes the store, so a
    /// failed bind mutates nothing.
    pub(crate) fn bind(
        &self,
        free: Vec<IndexVar>,
        expr: IndexExpr,
        accumulate: bool,
    ) -> Result<()> {
        ensure!(self.assignment().is_none(), ReassignmentSnafu { tensor: self.name() });

        let conflicts = analysis::dimension_conflicts(&free, &expr, self.ty().shape());
        ensure!(
            conflicts.is_empty(),
            DimensionMismatchSnafu {
                tensor: self.name(),
                conflicts: analysis::render_conflicts(&conflicts),
            }
        );

        if !analysis::verify(&expr, &free) {
            let free_set: std::collections::BTreeSet<_> = free.iter().cloned().collect();
            let missing = analysis::vars_without_reduction(&expr)
                .into_iter()
                .filter(|var| !free_set.contains(var))
                .map(|var| var.name().to_owned())
                .collect::<Vec<_>>()
                .join(", ");
            return IllFormedSnafu {
                assignment: render_assignment(&self.name(), &free, accumulate, &expr),
                missing,
            }
            .fail();
        }

        ensure!(
            !analysis::contains_transpose(self.format(), &free, &expr),
            TranspositionSnafu { tensor: self.name() }
        );
        let distributed = analysis::distributed_vars(&free, &expr);
        ensure!(
            distributed.is_empty(),
            DistributionSnafu {
                tensor: self.name(),
                vars: distributed.iter().map(IndexVar::name).collect::<Vec<_>>().join(", "),
            }
        );

        if accumulate {
            ensure!(
                self.format().admits_accumulation(),
                AccumulationUnsupportedSnafu {
                    tensor: self.name(),
                    format: self.format().to_string(),
                }
            );
        }

        tracing::debug!(
            tensor = %self.name(),
            accumulate,
            expr = %expr,
            "recorded assignment"
        );
        *self.content.assignment.lock() = Some(Assignment { free, expr, accumulate });
        Ok(())
    }
}

impl PartialEq for TensorVar {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for TensorVar {}

impl PartialOrd for TensorVar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TensorVar {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id().cmp(&other.id())
    }
}

impl Hash for TensorVar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for TensorVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TensorVar({} : {})", self.name(), self.ty())
    }
}

impl fmt::Display for TensorVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// An access expression `A(i, j, ...)`: usable as an operand and as the
/// left-hand side of the assignment protocol.
///
/// Equality and hashing are by node identity, the semantics `simplify`'s
/// zeroed set relies on. Structural comparison is `analysis::equals`.
#[derive(Debug, Clone)]
pub struct Access {
    node: Arc<ExprNode>,
}

impl Access {
    pub(crate) fn from_node(node: Arc<ExprNode>) -> Self {
        debug_assert!(matches!(node.expr(), Expr::Access { .. }));
        Self { node }
    }

    pub fn tensor(&self) -> &TensorVar {
        match self.node.expr() {
            Expr::Access { tensor, .. } => tensor,
            _ => unreachable!("access handle over a non-access node"),
        }
    }

    pub fn index_vars(&self) -> &[IndexVar] {
        match self.node.expr() {
            Expr::Access { indices, .. } => indices,
            _ => unreachable!("access handle over a non-access node"),
        }
    }

    /// This access as an expression, sharing the same node.
    pub fn expr(&self) -> IndexExpr {
        IndexExpr::from_node(self.node.clone())
    }

    pub(crate) fn node_id(&self) -> u64 {
        self.node.id()
    }

    /// Bind `expr` to the accessed tensor with this access's variables as
    /// the free set (`result(free...) = expr`).
    ///
    /// Eligible right-hand sides follow the Einstein convention: their
    /// variables outside the free set are bound by explicit `sum`
    /// reductions before the bind, so `C(i,k) = A(i,j)*B(j,k)` records
    /// `sum(j)(A(i,j)*B(j,k))`. Scalar assignment through
    /// [`TensorVar::assign`] binds the expression as written.
    ///
    /// # Errors
    /// Any assignment-protocol violation: reassignment, dimension
    /// mismatch, ill-formedness, transposition or distribution.
    pub fn assign(&self, expr: impl Into<IndexExpr>) -> Result<()> {
        let expr = self.apply_einsum_convention(expr.into());
        self.tensor().bind(self.index_vars().to_vec(), expr, false)
    }

    /// Accumulating bind (`result(free...) += expr`); additionally
    /// requires a result format that admits in-place accumulation.
    pub fn accumulate(&self, expr: impl Into<IndexExpr>) -> Result<()> {
        let expr = self.apply_einsum_convention(expr.into());
        self.tensor().bind(self.index_vars().to_vec(), expr, true)
    }

    fn apply_einsum_convention(&self, expr: IndexExpr) -> IndexExpr {
        if analysis::einsum_applies(&expr) {
            crate::transform::einsum(&expr, self.index_vars())
        } else {
            expr
        }
    }
}

impl PartialEq for Access {
    fn eq(&self, other: &Self) -> bool {
        self.node_id() == other.node_id()
    }
}

impl Eq for Access {}

impl Hash for Access {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node_id().hash(state);
    }
}

impl From<Access> for IndexExpr {
    fn from(access: Access) -> Self {
        access.expr()
    }
}

impl From<&Access> for IndexExpr {
    fn from(access: &Access) -> Self {
        access.expr()
    }
}
