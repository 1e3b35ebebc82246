//! Zero-propagation simplification and einsum normalization.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::analysis::{einsum_applies, index_vars};
use crate::ops::sum;
use crate::rewrite::ExprRewriter;
use crate::vars::{Access, IndexVar, TensorVar};
use crate::{BinaryOp, Expr, ExprNode, IndexExpr, ReduceOp, UnaryOp};

struct Simplify<'a> {
    zeroed: &'a HashSet<Access>,
}

impl ExprRewriter for Simplify<'_> {
    fn rewrite_access(&mut self, node: &Arc<ExprNode>) -> IndexExpr {
        if self.zeroed.contains(&Access::from_node(node.clone())) {
            IndexExpr::undefined()
        } else {
            IndexExpr::from_node(node.clone())
        }
    }

    fn rewrite_unary(&mut self, node: &Arc<ExprNode>, op: UnaryOp, a: &IndexExpr) -> IndexExpr {
        let rewritten = self.rewrite(a);
        if !rewritten.defined() {
            IndexExpr::undefined()
        } else if IndexExpr::same(&rewritten, a) {
            IndexExpr::from_node(node.clone())
        } else {
            IndexExpr::unary(op, rewritten)
        }
    }

    // Additive operations tolerate a missing term (the zero element);
    // multiplicative ones propagate it.
    fn rewrite_binary(
        &mut self,
        node: &Arc<ExprNode>,
        op: BinaryOp,
        a: &IndexExpr,
        b: &IndexExpr,
    ) -> IndexExpr {
        let ra = self.rewrite(a);
        let rb = self.rewrite(b);
        if op.is_additive() {
            match (ra.defined(), rb.defined()) {
                (false, false) => IndexExpr::undefined(),
                (false, true) => rb,
                (true, false) => ra,
                (true, true) => {
                    if IndexExpr::same(&ra, a) && IndexExpr::same(&rb, b) {
                        IndexExpr::from_node(node.clone())
                    } else {
                        IndexExpr::binary(op, ra, rb)
                    }
                }
            }
        } else if !ra.defined() || !rb.defined() {
            IndexExpr::undefined()
        } else if IndexExpr::same(&ra, a) && IndexExpr::same(&rb, b) {
            IndexExpr::from_node(node.clone())
        } else {
            IndexExpr::binary(op, ra, rb)
        }
    }

    fn rewrite_reduction(
        &mut self,
        node: &Arc<ExprNode>,
        op: ReduceOp,
        var: &IndexVar,
        body: &IndexExpr,
    ) -> IndexExpr {
        let rewritten = self.rewrite(body);
        if !rewritten.defined() {
            IndexExpr::undefined()
        } else if IndexExpr::same(&rewritten, body) {
            IndexExpr::from_node(node.clone())
        } else {
            IndexExpr::reduction(op, var.clone(), rewritten)
        }
    }
}

/// Rewrite `expr` with every access in `zeroed` (matched by node identity)
/// replaced by the undefined expression, propagating it through the tree.
/// Immediates are never zeroed. Subtrees the rewrite does not touch keep
/// their node identities; an empty `zeroed` set returns `expr` itself.
///
/// An undefined result means nothing remains of the expression.
pub fn simplify(expr: &IndexExpr, zeroed: &HashSet<Access>) -> IndexExpr {
    let result = Simplify { zeroed }.rewrite(expr);
    tracing::trace!(
        zeroed = zeroed.len(),
        collapsed = !result.defined(),
        "zero-propagation simplify"
    );
    result
}

struct Einsum {
    free: BTreeSet<IndexVar>,
    only_one_term: bool,
}

impl Einsum {
    /// Wrap `expr` in a reduction over each of its non-free variables.
    /// Successive wraps move outward through the occurrence order, so the
    /// outermost reduction binds the last-occurring variable.
    fn add_reductions(&self, expr: IndexExpr) -> IndexExpr {
        let mut expr = expr;
        for var in index_vars(&expr) {
            if !self.free.contains(&var) {
                expr = sum(var, expr);
            }
        }
        expr
    }

    /// A term is wrapped wholesale unless it is itself a sum or
    /// difference, in which case the wrapping pushes further down.
    fn wrap_term(&mut self, expr: &IndexExpr) -> IndexExpr {
        if let Some(node) = expr.node()
            && let Expr::Binary(BinaryOp::Add | BinaryOp::Sub, ..) = node.expr()
        {
            self.rewrite(expr)
        } else {
            self.add_reductions(expr.clone())
        }
    }
}

impl ExprRewriter for Einsum {
    // Summation binds per term: each side of a sum or difference is
    // wrapped independently rather than wrapping the whole sum once.
    fn rewrite_binary(
        &mut self,
        node: &Arc<ExprNode>,
        op: BinaryOp,
        a: &IndexExpr,
        b: &IndexExpr,
    ) -> IndexExpr {
        match op {
            BinaryOp::Add | BinaryOp::Sub => {
                self.only_one_term = false;
                let ra = self.wrap_term(a);
                let rb = self.wrap_term(b);
                if IndexExpr::same(&ra, a) && IndexExpr::same(&rb, b) {
                    IndexExpr::from_node(node.clone())
                } else {
                    IndexExpr::binary(op, ra, rb)
                }
            }
            // Products are single terms; the caller wraps them.
            _ => IndexExpr::from_node(node.clone()),
        }
    }
}

/// Normalize an einsum-eligible expression by making the implicit
/// reductions explicit: every variable not in `free` ends up bound by a
/// `sum` reduction in the term that uses it.
///
/// Returns undefined if the expression is not einsum-eligible.
pub fn einsum(expr: &IndexExpr, free: &[IndexVar]) -> IndexExpr {
    if !einsum_applies(expr) {
        return IndexExpr::undefined();
    }

    let mut pass = Einsum { free: free.iter().cloned().collect(), only_one_term: true };
    let result = pass.rewrite(expr);
    let result =
        if pass.only_one_term { pass.add_reductions(result) } else { result };
    tracing::trace!(
        free = free.len(),
        changed = !IndexExpr::same(&result, expr),
        "einsum normalization"
    );
    result
}

/// Einsum normalization of a tensor's recorded assignment.
pub fn einsum_tensor(tensor: &TensorVar) -> IndexExpr {
    einsum(&tensor.index_expr(), &tensor.free_vars())
}
