//! Structural analyses over index expressions.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::format::Format;
use crate::types::{Dimension, Shape};
use crate::vars::{IndexVar, TensorVar};
use crate::visit::for_each_access;
use crate::{BinaryOp, Expr, IndexExpr};

/// Structural equality of two expressions.
///
/// Equality is by structure and identity, not mathematical value:
/// `a + b` differs from `b + a`, and two distinct variables with the same
/// display name differ. Both undefined compares true, exactly one
/// undefined false. Immediate payloads compare bitwise.
pub fn equals(a: &IndexExpr, b: &IndexExpr) -> bool {
    match (a.node(), b.node()) {
        (None, None) => true,
        (Some(_), None) | (None, Some(_)) => false,
        (Some(a), Some(b)) => match (a.expr(), b.expr()) {
            (
                Expr::Access { tensor: at, indices: ai },
                Expr::Access { tensor: bt, indices: bi },
            ) => at == bt && ai.len() == bi.len() && ai.iter().zip(bi).all(|(x, y)| x == y),
            (Expr::Unary(ao, aa), Expr::Unary(bo, ba)) => ao == bo && equals(aa, ba),
            (Expr::Binary(ao, aa, ab), Expr::Binary(bo, ba, bb)) => {
                ao == bo && equals(aa, ba) && equals(ab, bb)
            }
            (
                Expr::Reduction { op: ao, var: av, body: ab },
                Expr::Reduction { op: bo, var: bv, body: bb },
            ) => ao == bo && av == bv && equals(ab, bb),
            (Expr::Imm(ai), Expr::Imm(bi)) => ai == bi,
            _ => false,
        },
    }
}

/// The index variables occurring in any access of `expr`, in order of
/// first occurrence, de-duplicated.
pub fn index_vars(expr: &IndexExpr) -> Vec<IndexVar> {
    let mut seen = HashSet::new();
    let mut vars = Vec::new();
    for_each_access(expr, |_, indices| {
        for var in indices {
            if seen.insert(var.clone()) {
                vars.push(var.clone());
            }
        }
    });
    vars
}

/// Every variable mentioned by a tensor's assignment: the free variables
/// plus the variables of the bound expression.
pub fn index_vars_of(tensor: &TensorVar) -> BTreeSet<IndexVar> {
    let mut vars: BTreeSet<_> = tensor.free_vars().into_iter().collect();
    vars.extend(index_vars(&tensor.index_expr()));
    vars
}

/// The variables that appear in an access of `expr` without being bound by
/// an enclosing reduction.
///
/// The set minus is applied per subtree, `free(sum(v)(body)) =
/// free(body) \ {v}`, so a variable accessed both under and outside a
/// reduction stays free: in `A(i) + sum(i)(B(i))`, `i` is free.
pub fn vars_without_reduction(expr: &IndexExpr) -> BTreeSet<IndexVar> {
    let Some(node) = expr.node() else {
        return BTreeSet::new();
    };
    match node.expr() {
        Expr::Access { indices, .. } => indices.iter().cloned().collect(),
        Expr::Unary(_, a) => vars_without_reduction(a),
        Expr::Binary(_, a, b) => {
            let mut vars = vars_without_reduction(a);
            vars.extend(vars_without_reduction(b));
            vars
        }
        Expr::Reduction { var, body, .. } => {
            let mut vars = vars_without_reduction(body);
            vars.remove(var);
            vars
        }
        Expr::Imm(_) => BTreeSet::new(),
    }
}

/// Well-formedness: every variable used outside a reduction belongs to the
/// free set.
pub fn verify(expr: &IndexExpr, free: &[IndexVar]) -> bool {
    let free: BTreeSet<_> = free.iter().cloned().collect();
    vars_without_reduction(expr).is_subset(&free)
}

/// Well-formedness of a tensor's recorded assignment.
pub fn verify_tensor(tensor: &TensorVar) -> bool {
    verify(&tensor.index_expr(), &tensor.free_vars())
}

/// Map each variable of a tensor's assignment to the dimension it indexes:
/// the i-th result dimension for the i-th free variable, the i-th operand
/// dimension for position i of each access. First insertion wins;
/// conflicts are the dimensional typecheck's concern, not detected here.
pub fn index_var_ranges(tensor: &TensorVar) -> BTreeMap<IndexVar, Dimension> {
    let mut ranges = BTreeMap::new();
    for (mode, var) in tensor.free_vars().iter().enumerate() {
        if let Some(dim) = tensor.ty().shape().dimension(mode) {
            ranges.entry(var.clone()).or_insert(dim);
        }
    }
    for_each_access(&tensor.index_expr(), |operand, indices| {
        for (mode, var) in indices.iter().enumerate() {
            if let Some(dim) = operand.ty().shape().dimension(mode) {
                ranges.entry(var.clone()).or_insert(dim);
            }
        }
    });
    ranges
}

/// A variable assigned two disagreeing dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionConflict {
    pub var: IndexVar,
    pub first: Dimension,
    pub second: Dimension,
}

fn record_dimension(
    assigned: &mut BTreeMap<IndexVar, Dimension>,
    conflicts: &mut Vec<DimensionConflict>,
    var: &IndexVar,
    dim: Dimension,
) {
    match assigned.get(var) {
        None => {
            assigned.insert(var.clone(), dim);
        }
        Some(first) if *first != dim => {
            conflicts.push(DimensionConflict { var: var.clone(), first: *first, second: dim });
        }
        Some(_) => {}
    }
}

/// The dimension conflicts of a candidate assignment: each variable must
/// index the same dimension at every occurrence in the result and the
/// expression.
pub fn dimension_conflicts(
    free: &[IndexVar],
    expr: &IndexExpr,
    result_shape: &Shape,
) -> Vec<DimensionConflict> {
    let mut assigned = BTreeMap::new();
    let mut conflicts = Vec::new();
    for (mode, var) in free.iter().enumerate() {
        if let Some(dim) = result_shape.dimension(mode) {
            record_dimension(&mut assigned, &mut conflicts, var, dim);
        }
    }
    for_each_access(expr, |operand, indices| {
        for (mode, var) in indices.iter().enumerate() {
            if let Some(dim) = operand.ty().shape().dimension(mode) {
                record_dimension(&mut assigned, &mut conflicts, var, dim);
            }
        }
    });
    conflicts
}

/// The dimensional typecheck consumed by the assignment protocol.
pub fn dimensions_typecheck(free: &[IndexVar], expr: &IndexExpr, result_shape: &Shape) -> bool {
    dimension_conflicts(free, expr, result_shape).is_empty()
}

pub(crate) fn render_conflicts(conflicts: &[DimensionConflict]) -> String {
    conflicts
        .iter()
        .map(|c| format!("{} has dimensions {} and {}", c.var, c.first, c.second))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Transposition detection: order the result's free variables by the
/// result format's mode order and each access's variables by its format's
/// mode order; the shared variables must appear in the same relative
/// order, otherwise the lowering would have to transpose an operand.
pub fn contains_transpose(format: &Format, free: &[IndexVar], expr: &IndexExpr) -> bool {
    // Keep first occurrences only; a repeated variable (a diagonal access)
    // is not a transposition.
    fn storage_order(mode_order: &[usize], vars: &[IndexVar]) -> Vec<IndexVar> {
        let mut seen = HashSet::new();
        mode_order
            .iter()
            .filter_map(|&mode| vars.get(mode).cloned())
            .filter(|var| seen.insert(var.clone()))
            .collect()
    }

    let result_order = storage_order(format.mode_order(), free);
    let mut found = false;
    for_each_access(expr, |operand, indices| {
        if found {
            return;
        }
        let access_order = storage_order(operand.format().mode_order(), indices);
        let shared_in_result: Vec<&IndexVar> =
            result_order.iter().filter(|var| access_order.contains(var)).collect();
        let shared_in_access: Vec<&IndexVar> =
            access_order.iter().filter(|var| result_order.contains(var)).collect();
        if shared_in_result != shared_in_access {
            found = true;
        }
    });
    found
}

/// The free variables that index no operand of `expr`. A non-empty result
/// means the assignment distributes (broadcasts) over those variables.
pub(crate) fn distributed_vars(free: &[IndexVar], expr: &IndexExpr) -> Vec<IndexVar> {
    let used: HashSet<IndexVar> = index_vars(expr).into_iter().collect();
    free.iter().filter(|var| !used.contains(var)).cloned().collect()
}

/// Distribution detection for the assignment protocol.
pub fn contains_distribution(free: &[IndexVar], expr: &IndexExpr) -> bool {
    !distributed_vars(free, expr).is_empty()
}

/// Einsum eligibility: only `Add`, `Sub` and `Mul` over accesses and
/// immediates, with no `Add` or `Sub` beneath a `Mul` (a sum of products,
/// never a product of sums). Any other variant disqualifies.
pub fn einsum_applies(expr: &IndexExpr) -> bool {
    fn check(expr: &IndexExpr, under_mul: bool) -> bool {
        let Some(node) = expr.node() else {
            return false;
        };
        match node.expr() {
            Expr::Access { .. } | Expr::Imm(_) => true,
            Expr::Binary(BinaryOp::Add | BinaryOp::Sub, a, b) => {
                !under_mul && check(a, false) && check(b, false)
            }
            Expr::Binary(BinaryOp::Mul, a, b) => check(a, true) && check(b, true),
            _ => false,
        }
    }
    check(expr, false)
}
