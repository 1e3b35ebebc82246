use std::collections::BTreeSet;

use crate::analysis::{
    contains_distribution, contains_transpose, dimension_conflicts, dimensions_typecheck,
    einsum_applies, index_var_ranges, index_vars, index_vars_of, vars_without_reduction, verify,
    verify_tensor,
};
use crate::format::{Format, ModeFormat};
use crate::ops::sum;
use crate::test::helpers::{matrix, vector};
use crate::types::{Dimension, Shape};
use crate::vars::IndexVar;
use crate::IndexExpr;

#[test]
fn index_vars_in_order_of_first_occurrence() {
    let a = matrix("A", 2, 3);
    let b = matrix("B", 3, 4);
    let i = IndexVar::named("i");
    let j = IndexVar::named("j");
    let k = IndexVar::named("k");

    let e = a.index([i.clone(), j.clone()]).unwrap() * b.index([j.clone(), k.clone()]).unwrap();
    assert_eq!(index_vars(&e), vec![i, j, k]);
    assert!(index_vars(&IndexExpr::undefined()).is_empty());
}

#[test]
fn free_vars_exclude_reduction_bindings() {
    let a = matrix("A", 2, 3);
    let i = IndexVar::named("i");
    let j = IndexVar::named("j");

    let e = sum(j.clone(), a.index([i.clone(), j.clone()]).unwrap().expr());
    assert_eq!(vars_without_reduction(&e), BTreeSet::from([i]));
}

#[test]
fn var_used_both_inside_and_outside_a_reduction_stays_free() {
    let x = vector("x", 4);
    let y = vector("y", 4);
    let i = IndexVar::named("i");

    // x(i) + sum(i)(y(i)): the inner binding must not hide the outer use.
    let e = x.index([i.clone()]).unwrap() + sum(i.clone(), y.index([i.clone()]).unwrap().expr());
    assert_eq!(vars_without_reduction(&e), BTreeSet::from([i]));
}

#[test]
fn nested_reductions_bind_everything() {
    let a = matrix("A", 2, 3);
    let i = IndexVar::named("i");
    let j = IndexVar::named("j");

    let e = sum(i, sum(j.clone(), a.index([IndexVar::named("i2"), j]).unwrap().expr()));
    // The inner access uses a distinct var also named "i2"; only that one
    // stays free.
    assert_eq!(vars_without_reduction(&e).len(), 1);
}

#[test]
fn verify_requires_free_cover() {
    let a = matrix("A", 2, 3);
    let b = matrix("B", 3, 4);
    let i = IndexVar::named("i");
    let j = IndexVar::named("j");
    let k = IndexVar::named("k");

    let e = a.index([i.clone(), j.clone()]).unwrap() * b.index([j.clone(), k.clone()]).unwrap();
    assert!(verify(&e, &[i.clone(), j.clone(), k.clone()]));
    assert!(!verify(&e, &[i.clone(), k.clone()]), "j is unbound");
    assert!(verify(&sum(j, e), &[i, k]));
}

#[test]
fn ranges_map_vars_to_their_dimensions() {
    let a = matrix("A", 2, 3);
    let b = matrix("B", 3, 4);
    let c = matrix("C", 2, 4);
    let i = IndexVar::named("i");
    let j = IndexVar::named("j");
    let k = IndexVar::named("k");

    let lhs = c.index([i.clone(), k.clone()]).unwrap();
    lhs.assign(a.index([i.clone(), j.clone()]).unwrap() * b.index([j.clone(), k.clone()]).unwrap())
        .unwrap();

    let ranges = index_var_ranges(&c);
    assert_eq!(ranges[&i], Dimension::Fixed(2));
    assert_eq!(ranges[&j], Dimension::Fixed(3));
    assert_eq!(ranges[&k], Dimension::Fixed(4));
    assert!(verify_tensor(&c));
    assert_eq!(index_vars_of(&c), BTreeSet::from([i, j, k]));
}

#[test]
fn ranges_of_an_unbound_tensor_are_empty() {
    assert!(index_var_ranges(&matrix("A", 2, 3)).is_empty());
}

#[test]
fn dimension_conflicts_name_the_offending_vars() {
    let a = matrix("A", 2, 3);
    let b = matrix("B", 5, 4); // j is 3 in A but 5 in B
    let i = IndexVar::named("i");
    let j = IndexVar::named("j");
    let k = IndexVar::named("k");

    let e = a.index([i.clone(), j.clone()]).unwrap() * b.index([j.clone(), k.clone()]).unwrap();
    let free = [i.clone(), k.clone()];
    let shape = Shape::fixed(&[2, 4]);

    let conflicts = dimension_conflicts(&free, &e, &shape);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].var, j);
    assert_eq!(conflicts[0].first, Dimension::Fixed(3));
    assert_eq!(conflicts[0].second, Dimension::Fixed(5));
    assert!(!dimensions_typecheck(&free, &e, &shape));
}

#[test]
fn result_dimensions_participate_in_the_typecheck() {
    let a = matrix("A", 2, 3);
    let i = IndexVar::named("i");
    let j = IndexVar::named("j");

    let e = a.index([i.clone(), j.clone()]).unwrap().expr();
    // Result claims i has extent 9; the access says 2.
    let conflicts = dimension_conflicts(&[i.clone(), j], &e, &Shape::fixed(&[9, 3]));
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].var, i);
}

#[test]
fn symbolic_dimensions_mismatch_fixed_ones() {
    let a = matrix("A", 2, 3);
    let i = IndexVar::named("i");
    let j = IndexVar::named("j");

    let e = a.index([i.clone(), j.clone()]).unwrap().expr();
    let shape = Shape::new(vec![Dimension::Variable, Dimension::Fixed(3)]);
    let conflicts = dimension_conflicts(&[i, j], &e, &shape);
    assert_eq!(conflicts.len(), 1, "fixed-vs-variable is a mismatch");
}

#[test]
fn transpose_detection() {
    let a = matrix("A", 3, 3);
    let b = matrix("B", 3, 3);
    let i = IndexVar::named("i");
    let j = IndexVar::named("j");

    let e = a.index([i.clone(), j.clone()]).unwrap().expr();
    // B(j,i) = A(i,j) with both row-major dense: transposed.
    assert!(contains_transpose(b.format(), &[j.clone(), i.clone()], &e));
    // B(i,j) = A(i,j): mode orders agree.
    assert!(!contains_transpose(b.format(), &[i.clone(), j.clone()], &e));

    // A column-major result makes the same free order a transposition.
    let col_major = Format::with_mode_order(
        vec![ModeFormat::Dense, ModeFormat::Dense],
        vec![1, 0],
    );
    assert!(contains_transpose(&col_major, &[i, j], &e));
}

#[test]
fn matmul_is_not_a_transposition() {
    let a = matrix("A", 2, 3);
    let b = matrix("B", 3, 4);
    let c = matrix("C", 2, 4);
    let i = IndexVar::named("i");
    let j = IndexVar::named("j");
    let k = IndexVar::named("k");

    let e = a.index([i.clone(), j.clone()]).unwrap() * b.index([j, k.clone()]).unwrap();
    assert!(!contains_transpose(c.format(), &[i, k], &e));
}

#[test]
fn distribution_detection() {
    let x = vector("x", 2);
    let i = IndexVar::named("i");
    let k = IndexVar::named("k");

    let e = x.index([i.clone()]).unwrap().expr();
    assert!(contains_distribution(&[i.clone(), k], &e), "k indexes no operand");
    assert!(!contains_distribution(&[i], &e));
}

#[test]
fn einsum_eligibility() {
    let a = matrix("A", 3, 3);
    let b = matrix("B", 3, 3);
    let i = IndexVar::named("i");
    let j = IndexVar::named("j");

    let aij = a.index([i.clone(), j.clone()]).unwrap();
    let bij = b.index([i, j.clone()]).unwrap();

    assert!(einsum_applies(&(&aij * &bij)));
    assert!(einsum_applies(&(&aij * &bij + &aij)));
    assert!(einsum_applies(&(2.0f64 * (&aij * &bij))));
    assert!(einsum_applies(&(&aij - &bij)));

    assert!(!einsum_applies(&((&aij + &bij) * &bij)), "no sum beneath a product");
    assert!(!einsum_applies(&(&aij / &bij)));
    assert!(!einsum_applies(&(-&aij)));
    assert!(!einsum_applies(&aij.expr().sqrt()));
    assert!(!einsum_applies(&sum(j, aij.expr())));
    assert!(!einsum_applies(&IndexExpr::undefined()));
}
