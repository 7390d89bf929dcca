//! Reading basis-state probabilities off the final density matrix.

use std::collections::BTreeMap;

use densim_dd::{Edge, Package};

use crate::config::ReportConfig;
use crate::measure::CHECK_TOLERANCE;

/// Probabilities of the computational basis states above the reporting
/// threshold, keyed by bit string with qubit `n-1` first.
///
/// States are examined in order from `|0…0⟩`, up to `report.max_states` of
/// them unless `report.full_state` is set.
pub fn analyse_state(
    package: &mut Package,
    root: Edge,
    num_qubits: u32,
    report: &ReportConfig,
) -> BTreeMap<String, f64> {
    let total = 1u128.checked_shl(num_qubits).unwrap_or(u128::MAX);
    let limit = if report.full_state {
        total
    } else {
        total.min(report.max_states as u128)
    };
    let width = num_qubits as usize;

    let root = package.align(root);
    let mut results = BTreeMap::new();
    for m in 0..limit {
        let p = diagonal_entry(package, root, m);
        if p > report.threshold {
            results.insert(basis_label(m, width), p);
        }
    }
    results
}

/// `m` as a `width`-digit bit string; the single state of zero qubits is `""`.
fn basis_label(m: u128, width: usize) -> String {
    if width == 0 {
        String::new()
    } else {
        format!("{m:0width$b}")
    }
}

/// `ρ[m][m]`, following child 0 or 3 at each level by the bits of `m`.
fn diagonal_entry(package: &Package, root: Edge, m: u128) -> f64 {
    let mut value = root.weight;
    let mut current = root;
    while !current.is_terminal() {
        let node = package.node(current.node);
        // Diagonal blocks are stored verbatim in marked and plain nodes alike.
        let children = node.stored_children();
        debug_assert!(
            (children[0].weight.im + children[3].weight.im).abs() < CHECK_TOLERANCE,
            "diagonal blocks of node {} carry imaginary weight",
            current.node
        );
        current = if (m >> node.level()) & 1 == 1 {
            children[3]
        } else {
            children[0]
        };
        if current.is_zero() {
            return 0.0;
        }
        value *= current.weight;
    }
    debug_assert!(
        value.im.abs() < CHECK_TOLERANCE,
        "diagonal entry {m} is not real: {value}"
    );
    value.re
}
