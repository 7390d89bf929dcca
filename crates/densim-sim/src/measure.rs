//! Outcome probabilities and projective collapse.

use densim_dd::{Edge, NodeId, Package, approx_zero};
use num_complex::Complex64;
use rustc_hash::FxHashMap;

use crate::operator::make_projector;

/// Tolerance for the consistency checks on real-valued quantities.
pub(crate) const CHECK_TOLERANCE: f64 = 1e-8;

/// Probability that measuring qubit `index` of the density matrix `edge`
/// yields 0, scaled by `path_prob`.
///
/// Sums the trace of the `ρ00` block at level `index` over every diagonal
/// path above it.
pub fn prob_for_index_to_be_zero(
    package: &mut Package,
    edge: Edge,
    index: u32,
    path_prob: f64,
) -> f64 {
    let mut memo = FxHashMap::default();
    let mass = zero_mass(package, edge, index, &mut memo);
    debug_assert!(
        mass.im.abs() < CHECK_TOLERANCE,
        "probability has imaginary part {}",
        mass.im
    );
    path_prob * mass.re
}

fn zero_mass(
    package: &mut Package,
    edge: Edge,
    index: u32,
    memo: &mut FxHashMap<NodeId, Complex64>,
) -> Complex64 {
    let zero = Complex64::new(0.0, 0.0);
    if approx_zero(edge.weight) {
        return zero;
    }
    if edge.is_terminal() {
        return edge.weight;
    }
    if let Some(&mass) = memo.get(&edge.node) {
        return edge.weight * mass;
    }

    let aligned = package.align(Edge::new(Complex64::new(1.0, 0.0), edge.node));
    let level = package.node(aligned.node).level();
    let children = *package.node(aligned.node).stored_children();
    let below = if level == index {
        if approx_zero(children[0].weight) {
            zero
        } else {
            package.trace(children[0])
        }
    } else {
        zero_mass(package, children[0], index, memo) + zero_mass(package, children[3], index, memo)
    };
    let mass = aligned.weight * below;
    memo.insert(edge.node, mass);
    edge.weight * mass
}

/// Project qubit `index` of `root` onto `outcome` and renormalize.
///
/// Returns the new root, which the caller must reference in place of the old
/// one.
pub fn collapse(package: &mut Package, root: Edge, index: u32, outcome: bool) -> Edge {
    let num_qubits = package.num_qubits();
    let f = make_projector(package, num_qubits, index, outcome);
    let f_dag = package.conjugate_transpose(f);
    let left = package.multiply(f, root);
    let projected = package.multiply(left, f_dag);

    let trace = package.trace(projected);
    debug_assert!(
        trace.im.abs() < CHECK_TOLERANCE,
        "trace after projection has imaginary part {}",
        trace.im
    );
    if approx_zero(trace) {
        return projected;
    }
    let weight = package.lookup(projected.weight / trace.re);
    projected.with_weight(weight)
}
