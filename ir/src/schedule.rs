//! Operator-split annotations and their collection into a schedule.

use std::sync::Arc;

use crate::vars::IndexVar;
use crate::visit::ExprVisitor;
use crate::{BinaryOp, ExprNode, IndexExpr};

/// A client annotation splitting `old` into `(left, right)` on a binary
/// node, consumed by later loop lowering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorSplit {
    pub old: IndexVar,
    pub left: IndexVar,
    pub right: IndexVar,
}

/// The operator splits gathered from a bound expression, in pre-order
/// traversal order of the binary nodes that carry them.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    splits: Vec<OperatorSplit>,
}

impl Schedule {
    pub fn operator_splits(&self) -> &[OperatorSplit] {
        &self.splits
    }

    pub(crate) fn clear(&mut self) {
        self.splits.clear();
    }

    /// Walk `expr` and append every binary node's splits.
    pub(crate) fn collect(&mut self, expr: &IndexExpr) {
        struct CollectSplits<'a> {
            schedule: &'a mut Schedule,
        }

        impl ExprVisitor for CollectSplits<'_> {
            fn visit_binary(
                &mut self,
                node: &Arc<ExprNode>,
                _op: BinaryOp,
                a: &IndexExpr,
                b: &IndexExpr,
            ) {
                self.schedule.splits.extend(node.operator_splits());
                self.visit(a);
                self.visit(b);
            }
        }

        CollectSplits { schedule: self }.visit(expr);
    }
}
