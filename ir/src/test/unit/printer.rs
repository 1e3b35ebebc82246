use num_complex::Complex64;

use crate::ops::{max_over, sum};
use crate::test::helpers::{matrix, vector};
use crate::vars::IndexVar;
use crate::IndexExpr;

#[test]
fn accesses_print_name_and_vars() {
    let a = matrix("A", 3, 3);
    let i = IndexVar::named("i");
    let j = IndexVar::named("j");
    assert_eq!(a.index([i, j]).unwrap().expr().to_string(), "A(i,j)");
}

#[test]
fn binary_operators_print_infix() {
    let a = matrix("A", 2, 3);
    let b = matrix("B", 3, 4);
    let c = matrix("C", 2, 4);
    let i = IndexVar::named("i");
    let j = IndexVar::named("j");
    let k = IndexVar::named("k");

    let e = a.index([i.clone(), j.clone()]).unwrap() * b.index([j, k.clone()]).unwrap()
        + c.index([i, k]).unwrap();
    assert_eq!(e.to_string(), "A(i,j) * B(j,k) + C(i,k)");
}

#[test]
fn parentheses_follow_precedence() {
    let a = matrix("A", 3, 3);
    let b = matrix("B", 3, 3);
    let c = matrix("C", 3, 3);
    let i = IndexVar::named("i");
    let j = IndexVar::named("j");

    let aij = a.index([i.clone(), j.clone()]).unwrap();
    let bij = b.index([i.clone(), j.clone()]).unwrap();
    let cij = c.index([i, j]).unwrap();

    assert_eq!(((&aij + &bij) * &cij).to_string(), "(A(i,j) + B(i,j)) * C(i,j)");
    assert_eq!((&aij + &bij * &cij).to_string(), "A(i,j) + B(i,j) * C(i,j)");
    assert_eq!((-(&aij + &bij)).to_string(), "-(A(i,j) + B(i,j))");
    assert_eq!((-&aij).to_string(), "-A(i,j)");
}

#[test]
fn functions_and_reductions_print_tightly() {
    let a = matrix("A", 2, 3);
    let b = matrix("B", 3, 4);
    let x = vector("x", 4);
    let i = IndexVar::named("i");
    let j = IndexVar::named("j");
    let k = IndexVar::named("k");

    let e = sum(j.clone(), a.index([i, j.clone()]).unwrap() * b.index([j, k]).unwrap());
    assert_eq!(e.to_string(), "sum(j)(A(i,j) * B(j,k))");

    let m = IndexVar::named("m");
    assert_eq!(max_over(m.clone(), x.index([m]).unwrap().expr()).to_string(), "max(m)(x(m))");

    let xi = x.index([IndexVar::named("i")]).unwrap();
    assert_eq!(xi.expr().sqrt().to_string(), "sqrt(x(i))");
}

#[test]
fn immediates_print_their_literal_value() {
    assert_eq!(IndexExpr::from(2i64).to_string(), "2");
    assert_eq!(IndexExpr::from(2.5f64).to_string(), "2.5");
    assert_eq!(IndexExpr::from(2.0f64).to_string(), "2");
    assert_eq!(IndexExpr::from(Complex64::new(1.0, 2.0)).to_string(), "1+2i");

    let x = vector("x", 4);
    let i = IndexVar::named("i");
    assert_eq!((2.0f64 * x.index([i]).unwrap()).to_string(), "2 * x(i)");
}

#[test]
fn undefined_prints_the_sentinel() {
    assert_eq!(IndexExpr::undefined().to_string(), "IndexExpr()");
}
