//! Post-order expression rewriting.

use std::sync::Arc;

use crate::vars::IndexVar;
use crate::{BinaryOp, Expr, ExprNode, ImmValue, IndexExpr, ReduceOp, UnaryOp};

/// A rewriter producing a replacement expression for each node.
///
/// Defaults rebuild bottom-up and reuse the original node whenever every
/// rewritten child is identical by node identity, so unmodified subtrees
/// keep their identities; downstream hash-consing and simplification
/// depend on that. Rewriting an undefined expression yields undefined.
///
/// The default rebuild assumes rewritten children stay defined; a rewriter
/// that introduces the undefined sentinel must override the affected hooks
/// and decide how it propagates (see `transform::simplify`).
pub trait ExprRewriter {
    fn rewrite(&mut self, expr: &IndexExpr) -> IndexExpr {
        match expr.node() {
            Some(node) => self.rewrite_node(node),
            None => IndexExpr::undefined(),
        }
    }

    /// Dispatch on the variant. Override the per-variant hooks instead.
    fn rewrite_node(&mut self, node: &Arc<ExprNode>) -> IndexExpr {
        match node.expr() {
            Expr::Access { .. } => self.rewrite_access(node),
            Expr::Unary(op, a) => self.rewrite_unary(node, *op, a),
            Expr::Binary(op, a, b) => self.rewrite_binary(node, *op, a, b),
            Expr::Reduction { op, var, body } => self.rewrite_reduction(node, *op, var, body),
            Expr::Imm(imm) => self.rewrite_imm(node, *imm),
        }
    }

    fn rewrite_access(&mut self, node: &Arc<ExprNode>) -> IndexExpr {
        IndexExpr::from_node(node.clone())
    }

    fn rewrite_unary(&mut self, node: &Arc<ExprNode>, op: UnaryOp, a: &IndexExpr) -> IndexExpr {
        let rewritten = self.rewrite(a);
        if IndexExpr::same(&rewritten, a) {
            IndexExpr::from_node(node.clone())
        } else {
            IndexExpr::unary(op, rewritten)
        }
    }

    fn rewrite_binary(
        &mut self,
        node: &Arc<ExprNode>,
        op: BinaryOp,
        a: &IndexExpr,
        b: &IndexExpr,
    ) -> IndexExpr {
        let ra = self.rewrite(a);
        let rb = self.rewrite(b);
        if IndexExpr::same(&ra, a) && IndexExpr::same(&rb, b) {
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
        if IndexExpr::same(&rewritten, body) {
            IndexExpr::from_node(node.clone())
        } else {
            IndexExpr::reduction(op, var.clone(), rewritten)
        }
    }

    fn rewrite_imm(&mut self, node: &Arc<ExprNode>, _imm: ImmValue) -> IndexExpr {
        IndexExpr::from_node(node.clone())
    }
}
