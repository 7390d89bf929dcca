//! Memoized matrix arithmetic on decision diagrams.
//!
//! All operands of a binary operation must describe matrices over the same
//! qubits, so their top nodes sit at the same level. Memo entries store the
//! unit-weight result of the node pair; callers scale by the edge weights.

use num_complex::Complex64;
use rustc_hash::FxHashMap;

use crate::edge::{Edge, NodeId};
use crate::package::Package;

/// Compute tables for the arithmetic operations.
#[derive(Debug, Default)]
pub(crate) struct ComputeTables {
    multiply: FxHashMap<(NodeId, NodeId), Edge>,
    add: FxHashMap<(NodeId, NodeId, u64, u64), Edge>,
    conjugate_transpose: FxHashMap<NodeId, Edge>,
    trace: FxHashMap<NodeId, Complex64>,
}

impl ComputeTables {
    pub(crate) fn clear(&mut self) {
        self.multiply.clear();
        self.add.clear();
        self.conjugate_transpose.clear();
        self.trace.clear();
    }
}

impl Package {
    /// Matrix product `a · b`.
    pub fn multiply(&mut self, a: Edge, b: Edge) -> Edge {
        if a.is_zero() || b.is_zero() {
            return Edge::ZERO;
        }
        let factor = a.weight * b.weight;
        if a.is_terminal() || b.is_terminal() {
            debug_assert!(
                a.is_terminal() && b.is_terminal(),
                "multiply operands at different levels"
            );
            let node = if a.is_terminal() { b.node } else { a.node };
            return Edge::new(factor, node);
        }
        debug_assert_eq!(self.level(a), self.level(b), "multiply operands at different levels");

        self.stats.compute_lookups += 1;
        if let Some(&unit) = self.compute.multiply.get(&(a.node, b.node)) {
            self.stats.compute_hits += 1;
            return unit.scaled(factor);
        }

        let level = self.node(a.node).level();
        let ca = self.children(a.node);
        let cb = self.children(b.node);
        let mut blocks = [Edge::ZERO; 4];
        for i in 0..2 {
            for j in 0..2 {
                let left = self.multiply(ca[i * 2], cb[j]);
                let right = self.multiply(ca[i * 2 + 1], cb[2 + j]);
                blocks[i * 2 + j] = self.add(left, right);
            }
        }
        let unit = self.make_node(level, blocks);
        self.compute.multiply.insert((a.node, b.node), unit);
        unit.scaled(factor)
    }

    /// Matrix sum `a + b`.
    pub fn add(&mut self, a: Edge, b: Edge) -> Edge {
        if a.is_zero() {
            return b;
        }
        if b.is_zero() {
            return a;
        }
        if a.node == b.node {
            return Edge::new(a.weight + b.weight, a.node);
        }
        if a.is_terminal() || b.is_terminal() {
            debug_assert!(
                a.is_terminal() == b.is_terminal(),
                "add operands at different levels"
            );
            return a;
        }
        debug_assert_eq!(self.level(a), self.level(b), "add operands at different levels");

        let ratio = self.complex.lookup(b.weight / a.weight);
        let key = (a.node, b.node, ratio.re.to_bits(), ratio.im.to_bits());
        self.stats.compute_lookups += 1;
        if let Some(&unit) = self.compute.add.get(&key) {
            self.stats.compute_hits += 1;
            return unit.scaled(a.weight);
        }

        let level = self.node(a.node).level();
        let ca = self.children(a.node);
        let cb = self.children(b.node);
        let mut blocks = [Edge::ZERO; 4];
        for k in 0..4 {
            blocks[k] = self.add(ca[k], cb[k].scaled(ratio));
        }
        let unit = self.make_node(level, blocks);
        self.compute.add.insert(key, unit);
        unit.scaled(a.weight)
    }

    /// Conjugate transpose `e†`.
    ///
    /// A density-marked node stays marked: its mirrored off-diagonal block
    /// is kept and only the diagonal blocks are transposed.
    pub fn conjugate_transpose(&mut self, edge: Edge) -> Edge {
        if edge.is_zero() {
            return Edge::ZERO;
        }
        let factor = edge.weight.conj();
        if edge.is_terminal() {
            return Edge::terminal(factor);
        }

        self.stats.compute_lookups += 1;
        if let Some(&unit) = self.compute.conjugate_transpose.get(&edge.node) {
            self.stats.compute_hits += 1;
            return unit.scaled(factor);
        }

        let (level, stored, density) = {
            let node = self.node(edge.node);
            (node.level(), *node.stored_children(), node.is_density())
        };
        let unit = if density {
            let c0 = self.conjugate_transpose(stored[0]);
            let c3 = self.conjugate_transpose(stored[3]);
            self.make_density_node(level, [c0, stored[1], stored[1], c3])
        } else {
            let c0 = self.conjugate_transpose(stored[0]);
            let c1 = self.conjugate_transpose(stored[2]);
            let c2 = self.conjugate_transpose(stored[1]);
            let c3 = self.conjugate_transpose(stored[3]);
            self.make_node(level, [c0, c1, c2, c3])
        };
        self.compute.conjugate_transpose.insert(edge.node, unit);
        unit.scaled(factor)
    }

    /// Matrix trace.
    pub fn trace(&mut self, edge: Edge) -> Complex64 {
        if edge.is_zero() {
            return Complex64::new(0.0, 0.0);
        }
        if edge.is_terminal() {
            return edge.weight;
        }

        self.stats.compute_lookups += 1;
        if let Some(&t) = self.compute.trace.get(&edge.node) {
            self.stats.compute_hits += 1;
            return edge.weight * t;
        }

        let stored = *self.node(edge.node).stored_children();
        let t = self.trace(stored[0]) + self.trace(stored[3]);
        self.compute.trace.insert(edge.node, t);
        edge.weight * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn matrix2(pkg: &mut Package, m: [Complex64; 4]) -> Edge {
        pkg.make_node(0, m.map(Edge::terminal))
    }

    fn entries(pkg: &mut Package, e: Edge, dim: usize) -> Vec<Complex64> {
        let mut out = Vec::new();
        for r in 0..dim {
            for col in 0..dim {
                out.push(pkg.get_entry(e, r, col));
            }
        }
        out
    }

    fn assert_close(a: &[Complex64], b: &[Complex64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).norm() < 1e-10, "{x} != {y}");
        }
    }

    #[test]
    fn test_multiply_2x2() {
        let mut pkg = Package::new(1);
        let a = matrix2(&mut pkg, [c(1.0, 0.0), c(2.0, 0.0), c(0.0, 1.0), c(-1.0, 0.0)]);
        let b = matrix2(&mut pkg, [c(0.5, 0.0), c(0.0, 0.0), c(1.0, 0.0), c(3.0, 0.0)]);
        let p = pkg.multiply(a, b);
        let got = entries(&mut pkg, p, 2);
        // [[1*0.5 + 2*1, 2*3], [i*0.5 - 1, -3]]
        assert_close(&got, &[c(2.5, 0.0), c(6.0, 0.0), c(-1.0, 0.5), c(-3.0, 0.0)]);
    }

    #[test]
    fn test_add_and_cancel() {
        let mut pkg = Package::new(1);
        let a = matrix2(&mut pkg, [c(1.0, 0.0), c(2.0, 0.0), c(3.0, 0.0), c(4.0, 0.0)]);
        let b = matrix2(&mut pkg, [c(-1.0, 0.0), c(0.0, 0.0), c(1.0, 0.0), c(0.0, 1.0)]);
        let s = pkg.add(a, b);
        let got = entries(&mut pkg, s, 2);
        assert_close(&got, &[c(0.0, 0.0), c(2.0, 0.0), c(4.0, 0.0), c(4.0, 1.0)]);

        let neg = a.scaled(c(-1.0, 0.0));
        assert_eq!(pkg.add(a, neg), Edge::ZERO);
    }

    #[test]
    fn test_conjugate_transpose() {
        let mut pkg = Package::new(1);
        let a = matrix2(&mut pkg, [c(1.0, 1.0), c(2.0, 0.0), c(0.0, 3.0), c(4.0, 0.0)]);
        let t = pkg.conjugate_transpose(a);
        let got = entries(&mut pkg, t, 2);
        assert_close(&got, &[c(1.0, -1.0), c(0.0, -3.0), c(2.0, 0.0), c(4.0, 0.0)]);
    }

    #[test]
    fn test_trace_two_levels() {
        let mut pkg = Package::new(2);
        let low = matrix2(&mut pkg, [c(0.25, 0.0), c(5.0, 0.0), c(5.0, 0.0), c(0.5, 0.0)]);
        let top = pkg.make_node(1, [low, low, Edge::ZERO, low.scaled(c(2.0, 0.0))]);
        // tr(low) + 2 tr(low) = 3 * 0.75
        assert!((pkg.trace(top) - c(2.25, 0.0)).norm() < 1e-12);
        assert_eq!(pkg.trace(Edge::ZERO), c(0.0, 0.0));
    }

    #[test]
    fn test_memo_hits_recorded() {
        let mut pkg = Package::new(1);
        let a = matrix2(&mut pkg, [c(1.0, 0.0), c(1.0, 0.0), c(1.0, 0.0), c(-1.0, 0.0)]);
        pkg.multiply(a, a);
        let before = pkg.statistics().compute_hits;
        let again = pkg.multiply(a.scaled(c(2.0, 0.0)), a);
        assert!(pkg.statistics().compute_hits > before);
        let got = entries(&mut pkg, again, 2);
        assert_close(&got, &[c(4.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(4.0, 0.0)]);
    }

    #[test]
    fn test_marked_node_arithmetic_matches_aligned() {
        let mut pkg = Package::new(2);
        let a = matrix2(&mut pkg, [c(0.3, 0.0), c(0.1, 0.2), c(0.1, -0.2), c(0.2, 0.0)]);
        let b = matrix2(&mut pkg, [c(0.1, 0.0), c(0.0, 0.05), c(0.0, -0.05), c(0.4, 0.0)]);
        let off = matrix2(&mut pkg, [c(0.05, 0.01), c(0.0, 0.0), c(0.02, 0.0), c(0.03, -0.02)]);
        let off_dag = pkg.conjugate_transpose(off);
        let rho = pkg.make_node(1, [a, off, off_dag, b]);
        let marked = pkg.set_density_marker(rho);

        let plain = entries(&mut pkg, rho, 4);
        assert_close(&entries(&mut pkg, marked, 4), &plain);

        let ct = pkg.conjugate_transpose(marked);
        assert!(pkg.is_density(ct));
        assert_close(&entries(&mut pkg, ct, 4), &plain);

        let sq_marked = pkg.multiply(marked, marked);
        let sq_plain = pkg.multiply(rho, rho);
        let lhs = entries(&mut pkg, sq_marked, 4);
        assert_close(&lhs, &entries(&mut pkg, sq_plain, 4));
        assert!((pkg.trace(marked) - pkg.trace(rho)).norm() < 1e-12);
    }
}
