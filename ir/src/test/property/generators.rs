//! Expression generators over a shared universe of variables and square
//! tensors, so independently generated expressions can collide and
//! accesses always typecheck against each other.

use std::sync::OnceLock;

use proptest::prelude::*;
use tensora_dtype::DType;

use crate::ops::sum;
use crate::types::{Shape, TensorType};
use crate::vars::{IndexVar, TensorVar};
use crate::IndexExpr;

fn universe() -> &'static (Vec<IndexVar>, Vec<TensorVar>) {
    static UNIVERSE: OnceLock<(Vec<IndexVar>, Vec<TensorVar>)> = OnceLock::new();
    UNIVERSE.get_or_init(|| {
        let vars = ["i", "j", "k", "l"].into_iter().map(IndexVar::named).collect();
        let tensors = ["A", "B", "C"]
            .into_iter()
            .map(|name| {
                TensorVar::named(name, TensorType::new(DType::Float64, Shape::fixed(&[4, 4])))
            })
            .collect();
        (vars, tensors)
    })
}

fn arb_access(
    vars: &'static [IndexVar],
    tensors: &'static [TensorVar],
) -> impl Strategy<Value = IndexExpr> + Clone {
    (0..tensors.len(), 0..vars.len(), 0..vars.len()).prop_map(move |(tensor, row, col)| {
        tensors[tensor]
            .index([vars[row].clone(), vars[col].clone()])
            .expect("universe tensors are square matrices")
            .expr()
    })
}

/// Arbitrary expressions over every node variant.
pub fn arb_expr() -> impl Strategy<Value = IndexExpr> {
    let (vars, tensors) = universe();
    let leaf = prop_oneof![
        4 => arb_access(vars, tensors),
        1 => any::<i64>().prop_map(IndexExpr::from),
        1 => any::<f64>().prop_map(IndexExpr::from),
    ];
    leaf.prop_recursive(3, 24, 2, |inner| {
        let (vars, _) = universe();
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a + b),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a - b),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a * b),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a / b),
            inner.clone().prop_map(|a| -a),
            inner.clone().prop_map(|a| a.sqrt()),
            (0..vars.len(), inner).prop_map(|(var, a)| sum(universe().0[var].clone(), a)),
        ]
    })
}

/// Expressions whose leaves are all accesses (no immediates), so zeroing
/// every access must collapse the whole tree.
pub fn arb_access_only_expr() -> impl Strategy<Value = IndexExpr> {
    let (vars, tensors) = universe();
    let leaf = arb_access(vars, tensors);
    leaf.prop_recursive(3, 16, 2, |inner| {
        let (vars, _) = universe();
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a + b),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a - b),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a * b),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a / b),
            inner.clone().prop_map(|a| -a),
            (0..vars.len(), inner).prop_map(|(var, a)| sum(universe().0[var].clone(), a)),
        ]
    })
}

/// Einsum-eligible expressions: sums of products of accesses.
pub fn arb_einsum_expr() -> impl Strategy<Value = IndexExpr> {
    let (vars, tensors) = universe();
    let term = prop::collection::vec(arb_access(vars, tensors), 1..4).prop_map(|factors| {
        factors.into_iter().reduce(|a, b| a * b).expect("at least one factor")
    });
    prop::collection::vec(term, 1..4)
        .prop_map(|terms| terms.into_iter().reduce(|a, b| a + b).expect("at least one term"))
}

/// A deliberately tiny space (one tensor, two vars, two operators) so that
/// independently generated expressions collide often enough to exercise
/// transitivity.
pub fn arb_tiny_expr() -> impl Strategy<Value = IndexExpr> {
    fn tiny_universe() -> &'static (Vec<IndexVar>, Vec<TensorVar>) {
        static UNIVERSE: OnceLock<(Vec<IndexVar>, Vec<TensorVar>)> = OnceLock::new();
        UNIVERSE.get_or_init(|| {
            let vars = ["i", "j"].into_iter().map(IndexVar::named).collect();
            let tensor =
                TensorVar::named("T", TensorType::new(DType::Float64, Shape::fixed(&[4, 4])));
            (vars, vec![tensor])
        })
    }

    let (vars, tensors) = tiny_universe();
    let leaf = arb_access(vars, tensors);
    prop_oneof![
        leaf.clone(),
        (leaf.clone(), leaf.clone()).prop_map(|(a, b)| a + b),
        (leaf.clone(), leaf).prop_map(|(a, b)| a * b),
    ]
}
