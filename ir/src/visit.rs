//! Depth-first traversal over expression nodes.
//!
//! Analyses that must handle every variant dispatch with an exhaustive
//! `match` on [`Expr`]; the compiler enforces totality, which is the
//! strict-visitor contract. [`ExprVisitor`] is the non-strict companion:
//! per-variant hooks default to child recursion, so a visitor overrides
//! only the variants it cares about. Traversal is pre-order.

use std::sync::Arc;

use crate::vars::{IndexVar, TensorVar};
use crate::{BinaryOp, Expr, ExprNode, ImmValue, IndexExpr, ReduceOp, UnaryOp};

pub trait ExprVisitor {
    /// Entry point. Undefined expressions are skipped.
    fn visit(&mut self, expr: &IndexExpr) {
        if let Some(node) = expr.node() {
            self.visit_node(node);
        }
    }

    /// Dispatch on the variant. Override the per-variant hooks instead.
    fn visit_node(&mut self, node: &Arc<ExprNode>) {
        match node.expr() {
            Expr::Access { tensor, indices } => self.visit_access(node, tensor, indices),
            Expr::Unary(op, a) => self.visit_unary(node, *op, a),
            Expr::Binary(op, a, b) => self.visit_binary(node, *op, a, b),
            Expr::Reduction { op, var, body } => self.visit_reduction(node, *op, var, body),
            Expr::Imm(imm) => self.visit_imm(node, *imm),
        }
    }

    fn visit_access(&mut self, _node: &Arc<ExprNode>, _tensor: &TensorVar, _indices: &[IndexVar]) {}

    fn visit_unary(&mut self, _node: &Arc<ExprNode>, _op: UnaryOp, a: &IndexExpr) {
        self.visit(a);
    }

    fn visit_binary(&mut self, _node: &Arc<ExprNode>, _op: BinaryOp, a: &IndexExpr, b: &IndexExpr) {
        self.visit(a);
        self.visit(b);
    }

    fn visit_reduction(
        &mut self,
        _node: &Arc<ExprNode>,
        _op: ReduceOp,
        _var: &IndexVar,
        body: &IndexExpr,
    ) {
        self.visit(body);
    }

    fn visit_imm(&mut self, _node: &Arc<ExprNode>, _imm: ImmValue) {}
}

/// Call `f` on every access in `expr`, pre-order.
pub fn for_each_access(expr: &IndexExpr, f: impl FnMut(&TensorVar, &[IndexVar])) {
    struct Accesses<F> {
        f: F,
    }

    impl<F: FnMut(&TensorVar, &[IndexVar])> ExprVisitor for Accesses<F> {
        fn visit_access(&mut self, _node: &Arc<ExprNode>, tensor: &TensorVar, indices: &[IndexVar]) {
            (self.f)(tensor, indices);
        }
    }

    Accesses { f }.visit(expr);
}
