//! Compiling explicit gate matrices into operator diagrams.

use densim_ir::{Control, Polarity, QubitId};
use num_complex::Complex64;
use tracing::trace;

use crate::edge::Edge;
use crate::error::{DdError, DdResult};
use crate::package::Package;

/// Validated description of one operation being compiled.
struct OperationSpec<'a> {
    matrix: &'a [Complex64],
    dim: usize,
    /// For each level, the role it plays in the operation.
    roles: Vec<Role>,
}

#[derive(Debug, Clone, Copy)]
enum Role {
    /// Bit `j` of the matrix index.
    Target(usize),
    Control(Polarity),
    Idle,
}

impl Package {
    /// Identity over the lowest `levels` qubits (the scalar one for 0).
    pub fn make_ident(&mut self, levels: u32) -> Edge {
        while self.ident.len() <= levels as usize {
            let level = (self.ident.len() - 1) as u32;
            let below = self.ident[level as usize];
            let next = self.make_node(level, [below, Edge::ZERO, Edge::ZERO, below]);
            self.ident.push(next);
        }
        self.ident[levels as usize]
    }

    /// Operator diagram of a single-qubit matrix (row-major 2×2) applied to
    /// `target`, over all qubits of the package. The matrix need not be
    /// unitary.
    pub fn make_gate_dd(&mut self, matrix: &[Complex64; 4], target: QubitId) -> DdResult<Edge> {
        self.make_operation_dd(matrix, &[target], &[])
    }

    /// Operator diagram of a `2^k × 2^k` row-major matrix on `targets`, with
    /// `controls`, over all qubits of the package. Bit `j` of the matrix
    /// index belongs to `targets[j]`.
    pub fn make_operation_dd(
        &mut self,
        matrix: &[Complex64],
        targets: &[QubitId],
        controls: &[Control],
    ) -> DdResult<Edge> {
        let spec = self.operation_spec(matrix, targets, controls)?;
        trace!(
            targets = targets.len(),
            controls = controls.len(),
            "compiling operation"
        );
        Ok(self.build_operation(&spec, self.num_qubits(), 0, 0))
    }

    fn operation_spec<'a>(
        &self,
        matrix: &'a [Complex64],
        targets: &[QubitId],
        controls: &[Control],
    ) -> DdResult<OperationSpec<'a>> {
        let dim = 1usize << targets.len();
        if matrix.len() != dim * dim {
            return Err(DdError::MatrixShape {
                expected: dim * dim,
                got: matrix.len(),
            });
        }

        let num_qubits = self.num_qubits();
        let mut roles = vec![Role::Idle; num_qubits as usize];
        let mut place = |qubit: QubitId, role: Role| -> DdResult<()> {
            let slot = roles
                .get_mut(qubit.index() as usize)
                .ok_or(DdError::QubitOutOfRange {
                    qubit: qubit.index(),
                    num_qubits,
                })?;
            if !matches!(slot, Role::Idle) {
                return Err(DdError::DuplicateQubit(qubit.index()));
            }
            *slot = role;
            Ok(())
        };
        for (j, &target) in targets.iter().enumerate() {
            place(target, Role::Target(j))?;
        }
        for control in controls {
            place(control.qubit, Role::Control(control.polarity))?;
        }

        Ok(OperationSpec { matrix, dim, roles })
    }

    /// Build the operator restricted to the lowest `remaining` levels, with
    /// the target bits of the levels above already fixed in `row` and `col`.
    fn build_operation(
        &mut self,
        spec: &OperationSpec<'_>,
        remaining: u32,
        row: usize,
        col: usize,
    ) -> Edge {
        if remaining == 0 {
            return Edge::terminal(spec.matrix[row * spec.dim + col]);
        }
        let level = remaining - 1;
        match spec.roles[level as usize] {
            Role::Target(j) => {
                let mut blocks = [Edge::ZERO; 4];
                for (k, block) in blocks.iter_mut().enumerate() {
                    let r = row | ((k >> 1) << j);
                    let c = col | ((k & 1) << j);
                    *block = self.build_operation(spec, level, r, c);
                }
                self.make_node(level, blocks)
            }
            Role::Control(polarity) => {
                let active = self.build_operation(spec, level, row, col);
                let inactive = if row == col {
                    self.make_ident(level)
                } else {
                    Edge::ZERO
                };
                let blocks = match polarity {
                    Polarity::Positive => [inactive, Edge::ZERO, Edge::ZERO, active],
                    Polarity::Negative => [active, Edge::ZERO, Edge::ZERO, inactive],
                };
                self.make_node(level, blocks)
            }
            Role::Idle => {
                let below = self.build_operation(spec, level, row, col);
                self.make_node(level, [below, Edge::ZERO, Edge::ZERO, below])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use densim_ir::StandardGate;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn dense(pkg: &mut Package, e: Edge) -> Vec<Complex64> {
        let dim = 1usize << pkg.num_qubits();
        let mut out = Vec::with_capacity(dim * dim);
        for r in 0..dim {
            for col in 0..dim {
                out.push(pkg.get_entry(e, r, col));
            }
        }
        out
    }

    fn assert_close(a: &[Complex64], b: &[Complex64]) {
        for (i, (x, y)) in a.iter().zip(b).enumerate() {
            assert!((x - y).norm() < 1e-12, "entry {i}: {x} != {y}");
        }
    }

    #[test]
    fn test_ident() {
        let mut pkg = Package::new(3);
        let id = pkg.make_ident(3);
        let m = dense(&mut pkg, id);
        for r in 0..8 {
            for col in 0..8 {
                let expected = if r == col { 1.0 } else { 0.0 };
                assert!((m[r * 8 + col] - c(expected, 0.0)).norm() < 1e-12);
            }
        }
        assert_eq!(pkg.make_ident(0), Edge::ONE);
        assert_eq!(pkg.make_ident(3), id);
    }

    #[test]
    fn test_single_qubit_gate_on_upper_qubit() {
        let mut pkg = Package::new(2);
        let x: [Complex64; 4] = [c(0.0, 0.0), c(1.0, 0.0), c(1.0, 0.0), c(0.0, 0.0)];
        let op = pkg.make_gate_dd(&x, QubitId(1)).unwrap();
        let m = dense(&mut pkg, op);
        // X on qubit 1 maps |00> (0) to |10> (2).
        assert!((m[2 * 4] - c(1.0, 0.0)).norm() < 1e-12);
        assert!((m[3 * 4 + 1] - c(1.0, 0.0)).norm() < 1e-12);
        assert!(m[0].norm() < 1e-12);
    }

    #[test]
    fn test_cnot_control_below_target() {
        let mut pkg = Package::new(2);
        let x = StandardGate::X.matrix();
        let op = pkg
            .make_operation_dd(&x, &[QubitId(1)], &[Control::positive(QubitId(0))])
            .unwrap();
        let m = dense(&mut pkg, op);
        let one = c(1.0, 0.0);
        let zero = c(0.0, 0.0);
        // Basis index = 2*q1 + q0; flips q1 when q0 = 1: swaps 1 <-> 3.
        #[rustfmt::skip]
        let expected = [
            one, zero, zero, zero,
            zero, zero, zero, one,
            zero, zero, one, zero,
            zero, one, zero, zero,
        ];
        assert_close(&m, &expected);
    }

    #[test]
    fn test_negative_control() {
        let mut pkg = Package::new(2);
        let x = StandardGate::X.matrix();
        let op = pkg
            .make_operation_dd(&x, &[QubitId(0)], &[Control::negative(QubitId(1))])
            .unwrap();
        let m = dense(&mut pkg, op);
        let one = c(1.0, 0.0);
        let zero = c(0.0, 0.0);
        // Flips q0 when q1 = 0: swaps 0 <-> 1.
        #[rustfmt::skip]
        let expected = [
            zero, one, zero, zero,
            one, zero, zero, zero,
            zero, zero, one, zero,
            zero, zero, zero, one,
        ];
        assert_close(&m, &expected);
    }

    #[test]
    fn test_two_target_matrix_order() {
        let mut pkg = Package::new(2);
        // Matrix index bit 0 is targets[0] = q1, bit 1 is targets[1] = q0.
        let mut matrix = vec![c(0.0, 0.0); 16];
        // |t0=1, t1=0> (index 1) -> |t0=0, t1=1> (index 2); identity elsewhere.
        matrix[0] = c(1.0, 0.0);
        matrix[2 * 4 + 1] = c(1.0, 0.0);
        matrix[4 + 2] = c(1.0, 0.0);
        matrix[15] = c(1.0, 0.0);
        let op = pkg
            .make_operation_dd(&matrix, &[QubitId(1), QubitId(0)], &[])
            .unwrap();
        let m = dense(&mut pkg, op);
        // Basis index 2 (q1=1, q0=0) -> basis index 1 (q1=0, q0=1).
        assert!((m[4 + 2] - c(1.0, 0.0)).norm() < 1e-12);
        assert!((m[2 * 4 + 1] - c(1.0, 0.0)).norm() < 1e-12);
        assert!(m[2 * 4 + 2].norm() < 1e-12);
    }

    #[test]
    fn test_toffoli_on_three_qubits() {
        let mut pkg = Package::new(3);
        let x = StandardGate::X.matrix();
        let op = pkg
            .make_operation_dd(
                &x,
                &[QubitId(1)],
                &[Control::positive(QubitId(0)), Control::positive(QubitId(2))],
            )
            .unwrap();
        let m = dense(&mut pkg, op);
        for r in 0..8usize {
            let expected_col = if r & 0b101 == 0b101 { r ^ 0b010 } else { r };
            for col in 0..8 {
                let expected = if col == expected_col { 1.0 } else { 0.0 };
                assert!((m[r * 8 + col] - c(expected, 0.0)).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn test_operation_errors() {
        let mut pkg = Package::new(2);
        let x = StandardGate::X.matrix();
        assert!(matches!(
            pkg.make_operation_dd(&x, &[QubitId(0), QubitId(1)], &[]),
            Err(DdError::MatrixShape {
                expected: 16,
                got: 4
            })
        ));
        assert!(matches!(
            pkg.make_operation_dd(&x, &[QubitId(2)], &[]),
            Err(DdError::QubitOutOfRange {
                qubit: 2,
                num_qubits: 2
            })
        ));
        assert!(matches!(
            pkg.make_operation_dd(&x, &[QubitId(1)], &[Control::positive(QubitId(1))]),
            Err(DdError::DuplicateQubit(1))
        ));
    }
}
