//! The operator surface: arithmetic overloads, literal lifting, reduction
//! builders.

use std::ops::{Add, Div, Mul, Neg, Sub};

use num_complex::Complex64;

use crate::vars::{Access, IndexVar};
use crate::{BinaryOp, IndexExpr, ReduceOp, UnaryOp};

impl From<&IndexExpr> for IndexExpr {
    fn from(expr: &IndexExpr) -> Self {
        expr.clone()
    }
}

impl IndexExpr {
    /// Square root of this expression.
    pub fn sqrt(&self) -> IndexExpr {
        IndexExpr::unary(UnaryOp::Sqrt, self.clone())
    }
}

/// Square root of an expression.
pub fn sqrt(expr: impl Into<IndexExpr>) -> IndexExpr {
    IndexExpr::unary(UnaryOp::Sqrt, expr.into())
}

macro_rules! neg_operators {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Neg for $ty {
                type Output = IndexExpr;

                fn neg(self) -> IndexExpr {
                    IndexExpr::unary(UnaryOp::Neg, self.into())
                }
            }
        )+
    };
}

neg_operators! { IndexExpr, Access, &Access }

macro_rules! binary_operators {
    ($($trait:ident :: $method:ident => $op:ident),+ $(,)?) => {
        $(
            impl<R: Into<IndexExpr>> $trait<R> for IndexExpr {
                type Output = IndexExpr;

                fn $method(self, rhs: R) -> IndexExpr {
                    IndexExpr::binary(BinaryOp::$op, self, rhs.into())
                }
            }

            impl<R: Into<IndexExpr>> $trait<R> for Access {
                type Output = IndexExpr;

                fn $method(self, rhs: R) -> IndexExpr {
                    IndexExpr::binary(BinaryOp::$op, self.expr(), rhs.into())
                }
            }

            impl<R: Into<IndexExpr>> $trait<R> for &Access {
                type Output = IndexExpr;

                fn $method(self, rhs: R) -> IndexExpr {
                    IndexExpr::binary(BinaryOp::$op, self.expr(), rhs.into())
                }
            }
        )+
    };
}

binary_operators! {
    Add::add => Add,
    Sub::sub => Sub,
    Mul::mul => Mul,
    Div::div => Div,
}

// Native literals on the left-hand side: `2.0 * x(i)`.
macro_rules! scalar_lhs_operators {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Add<IndexExpr> for $ty {
                type Output = IndexExpr;

                fn add(self, rhs: IndexExpr) -> IndexExpr {
                    IndexExpr::binary(BinaryOp::Add, self.into(), rhs)
                }
            }

            impl Sub<IndexExpr> for $ty {
                type Output = IndexExpr;

                fn sub(self, rhs: IndexExpr) -> IndexExpr {
                    IndexExpr::binary(BinaryOp::Sub, self.into(), rhs)
                }
            }

            impl Mul<IndexExpr> for $ty {
                type Output = IndexExpr;

                fn mul(self, rhs: IndexExpr) -> IndexExpr {
                    IndexExpr::binary(BinaryOp::Mul, self.into(), rhs)
                }
            }

            impl Div<IndexExpr> for $ty {
                type Output = IndexExpr;

                fn div(self, rhs: IndexExpr) -> IndexExpr {
                    IndexExpr::binary(BinaryOp::Div, self.into(), rhs)
                }
            }

            impl Add<Access> for $ty {
                type Output = IndexExpr;

                fn add(self, rhs: Access) -> IndexExpr {
                    self + rhs.expr()
                }
            }

            impl Sub<Access> for $ty {
                type Output = IndexExpr;

                fn sub(self, rhs: Access) -> IndexExpr {
                    self - rhs.expr()
                }
            }

            impl Mul<Access> for $ty {
                type Output = IndexExpr;

                fn mul(self, rhs: Access) -> IndexExpr {
                    self * rhs.expr()
                }
            }

            impl Div<Access> for $ty {
                type Output = IndexExpr;

                fn div(self, rhs: Access) -> IndexExpr {
                    self / rhs.expr()
                }
            }
        )+
    };
}

scalar_lhs_operators! { i64, u64, f64, Complex64 }

/// Sum `expr` over `var`.
pub fn sum(var: IndexVar, expr: impl Into<IndexExpr>) -> IndexExpr {
    IndexExpr::reduction(ReduceOp::Sum, var, expr.into())
}

/// Multiply `expr` over `var`.
pub fn product(var: IndexVar, expr: impl Into<IndexExpr>) -> IndexExpr {
    IndexExpr::reduction(ReduceOp::Prod, var, expr.into())
}

/// Minimum of `expr` over `var`.
pub fn min_over(var: IndexVar, expr: impl Into<IndexExpr>) -> IndexExpr {
    IndexExpr::reduction(ReduceOp::Min, var, expr.into())
}

/// Maximum of `expr` over `var`.
pub fn max_over(var: IndexVar, expr: impl Into<IndexExpr>) -> IndexExpr {
    IndexExpr::reduction(ReduceOp::Max, var, expr.into())
}
