//! Infix rendering for diagnostics and tests.
//!
//! Deterministic; not a stable interchange format.

use std::fmt;

use crate::vars::IndexVar;
use crate::{Expr, ExprNode, ImmValue, IndexExpr, UnaryOp};

// Precedence groups. Parentheses are emitted when a child's precedence is
// numerically greater than its parent's.
const PREC_ATOM: u8 = 2; // access, function application, reduction
const PREC_NEG: u8 = 3;
const PREC_MUL: u8 = 5; // mul, div
const PREC_ADD: u8 = 6; // add, sub
const PREC_TOP: u8 = 20;

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Access { .. } | Expr::Imm(_) | Expr::Reduction { .. } => PREC_ATOM,
        Expr::Unary(UnaryOp::Neg, _) => PREC_NEG,
        Expr::Unary(UnaryOp::Sqrt, _) => PREC_ATOM,
        Expr::Binary(op, ..) if op.is_multiplicative() => PREC_MUL,
        Expr::Binary(..) => PREC_ADD,
    }
}

fn fmt_expr(expr: &IndexExpr, parent: u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let Some(node) = expr.node() else {
        return f.write_str("IndexExpr()");
    };
    fmt_node(node, parent, f)
}

fn fmt_node(node: &ExprNode, parent: u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let prec = precedence(node.expr());
    let parens = prec > parent;
    if parens {
        f.write_str("(")?;
    }
    match node.expr() {
        Expr::Access { tensor, indices } => {
            write!(f, "{}({})", tensor, join_vars(indices))?;
        }
        Expr::Unary(UnaryOp::Neg, a) => {
            f.write_str("-")?;
            fmt_expr(a, prec, f)?;
        }
        Expr::Unary(UnaryOp::Sqrt, a) => {
            f.write_str("sqrt(")?;
            fmt_expr(a, PREC_TOP, f)?;
            f.write_str(")")?;
        }
        Expr::Binary(op, a, b) => {
            fmt_expr(a, prec, f)?;
            write!(f, " {} ", op.symbol())?;
            fmt_expr(b, prec, f)?;
        }
        Expr::Reduction { op, var, body } => {
            write!(f, "{}({})(", op.name(), var)?;
            fmt_expr(body, PREC_TOP, f)?;
            f.write_str(")")?;
        }
        Expr::Imm(imm) => match imm {
            ImmValue::Int(value) => write!(f, "{value}")?,
            ImmValue::UInt(value) => write!(f, "{value}")?,
            ImmValue::Float(value) => write!(f, "{value}")?,
            ImmValue::Complex(value) => write!(f, "{value}")?,
        },
    }
    if parens {
        f.write_str(")")?;
    }
    Ok(())
}

fn join_vars(vars: &[IndexVar]) -> String {
    vars.iter().map(IndexVar::name).collect::<Vec<_>>().join(",")
}

impl fmt::Display for IndexExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_expr(self, PREC_TOP, f)
    }
}

/// Render an assignment the way diagnostics show it:
/// `name(i,j) = expr` or `name(i,j) += expr`.
pub(crate) fn render_assignment(
    name: &str,
    free: &[IndexVar],
    accumulate: bool,
    expr: &IndexExpr,
) -> String {
    let op = if accumulate { "+=" } else { "=" };
    format!("{}({}) {} {}", name, join_vars(free), op, expr)
}
