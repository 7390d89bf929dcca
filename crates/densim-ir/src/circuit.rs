//! High-level circuit builder API.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::error::{IrError, IrResult};
use crate::gate::{Gate, StandardGate};
use crate::operation::{Control, Operation};
use crate::qubit::{ClbitId, QubitId};

/// A quantum circuit: a fixed qubit and classical-bit count plus an ordered
/// list of operations.
///
/// Builder methods validate operands before appending, so a circuit built
/// through them only references existing qubits and bits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Number of qubits.
    num_qubits: u32,
    /// Number of classical bits.
    num_clbits: u32,
    /// Operations in program order.
    operations: Vec<Operation>,
}

impl Circuit {
    /// Create a new empty circuit without qubits.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_size(name, 0, 0)
    }

    /// Create a circuit with a given number of qubits and classical bits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            num_clbits,
            operations: vec![],
        }
    }

    /// Assemble a circuit from already-built operations without validating
    /// them. Consumers must still check operand shapes.
    pub fn from_parts(
        name: impl Into<String>,
        num_qubits: u32,
        num_clbits: u32,
        operations: Vec<Operation>,
    ) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            num_clbits,
            operations,
        }
    }

    /// Add a qubit, returning its id.
    pub fn add_qubit(&mut self) -> QubitId {
        let id = QubitId(self.num_qubits);
        self.num_qubits += 1;
        id
    }

    /// Add a classical bit, returning its id.
    pub fn add_clbit(&mut self) -> ClbitId {
        let id = ClbitId(self.num_clbits);
        self.num_clbits += 1;
        id
    }

    /// Validate and append an operation.
    pub fn apply(&mut self, operation: Operation) -> IrResult<&mut Self> {
        self.validate(&operation)?;
        self.operations.push(operation);
        Ok(self)
    }

    fn validate(&self, operation: &Operation) -> IrResult<()> {
        let gate_name = || Some(operation.name().to_string());

        let mut seen = Vec::new();
        for qubit in operation
            .targets()
            .iter()
            .copied()
            .chain(operation.controls().iter().map(|c| c.qubit))
        {
            if qubit.0 >= self.num_qubits {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: gate_name(),
                });
            }
            if seen.contains(&qubit) && !matches!(operation, Operation::Barrier { .. }) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    gate_name: gate_name(),
                });
            }
            seen.push(qubit);
        }

        match operation {
            Operation::Unitary { gate, targets, .. } => {
                if gate.num_qubits() as usize != targets.len() {
                    return Err(IrError::QubitCountMismatch {
                        gate_name: gate.name().to_string(),
                        expected: gate.num_qubits(),
                        got: targets.len() as u32,
                    });
                }
            }
            Operation::Measure { qubits, clbits } => {
                if qubits.len() != clbits.len() {
                    return Err(IrError::QubitCountMismatch {
                        gate_name: "measure".into(),
                        expected: clbits.len() as u32,
                        got: qubits.len() as u32,
                    });
                }
                for &clbit in clbits {
                    if clbit.0 >= self.num_clbits {
                        return Err(IrError::ClbitNotFound {
                            clbit,
                            gate_name: gate_name(),
                        });
                    }
                }
            }
            Operation::Reset { .. } | Operation::Barrier { .. } => {}
            Operation::ClassicControlled {
                operation,
                register,
                ..
            } => {
                if register.start >= register.end {
                    return Err(IrError::InvalidCondition(format!(
                        "empty register range {}..{}",
                        register.start, register.end
                    )));
                }
                if register.end - register.start > 64 {
                    return Err(IrError::InvalidCondition(format!(
                        "register range {}..{} is wider than 64 bits",
                        register.start, register.end
                    )));
                }
                if register.end > self.num_clbits {
                    return Err(IrError::ClbitNotFound {
                        clbit: ClbitId(register.end - 1),
                        gate_name: gate_name(),
                    });
                }
                self.validate(operation)?;
            }
        }
        Ok(())
    }

    fn single(&mut self, gate: StandardGate, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Operation::unitary(gate, [qubit], []))
    }

    fn controlled(
        &mut self,
        gate: StandardGate,
        control: QubitId,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply(Operation::unitary(gate, [target], [Control::positive(control)]))
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::H, qubit)
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::X, qubit)
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::Y, qubit)
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::Z, qubit)
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::S, qubit)
    }

    /// Apply S-dagger gate.
    pub fn sdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::Sdg, qubit)
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::T, qubit)
    }

    /// Apply T-dagger gate.
    pub fn tdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::Tdg, qubit)
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::SX, qubit)
    }

    /// Apply sqrt(X)-dagger gate.
    pub fn sxdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::SXdg, qubit)
    }

    /// Apply RX rotation.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::Rx(theta), qubit)
    }

    /// Apply RY rotation.
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::Ry(theta), qubit)
    }

    /// Apply RZ rotation.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::Rz(theta), qubit)
    }

    /// Apply phase gate.
    pub fn p(&mut self, lambda: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::P(lambda), qubit)
    }

    /// Apply U gate.
    pub fn u(&mut self, theta: f64, phi: f64, lambda: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::U(theta, phi, lambda), qubit)
    }

    /// Apply phased RX gate.
    pub fn prx(&mut self, theta: f64, phi: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::PRX(theta, phi), qubit)
    }

    // =========================================================================
    // Controlled and two-qubit gates
    // =========================================================================

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.controlled(StandardGate::X, control, target)
    }

    /// Apply CY gate.
    pub fn cy(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.controlled(StandardGate::Y, control, target)
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.controlled(StandardGate::Z, control, target)
    }

    /// Apply controlled-Hadamard gate.
    pub fn ch(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.controlled(StandardGate::H, control, target)
    }

    /// Apply controlled RX.
    pub fn crx(&mut self, theta: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.controlled(StandardGate::Rx(theta), control, target)
    }

    /// Apply controlled RY.
    pub fn cry(&mut self, theta: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.controlled(StandardGate::Ry(theta), control, target)
    }

    /// Apply controlled RZ.
    pub fn crz(&mut self, theta: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.controlled(StandardGate::Rz(theta), control, target)
    }

    /// Apply controlled phase.
    pub fn cp(&mut self, lambda: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.controlled(StandardGate::P(lambda), control, target)
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.apply(Operation::unitary(StandardGate::Swap, [q1, q2], []))
    }

    /// Apply iSWAP gate.
    pub fn iswap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.apply(Operation::unitary(StandardGate::ISwap, [q1, q2], []))
    }

    /// Apply RXX gate.
    pub fn rxx(&mut self, theta: f64, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.apply(Operation::unitary(StandardGate::RXX(theta), [q1, q2], []))
    }

    /// Apply RYY gate.
    pub fn ryy(&mut self, theta: f64, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.apply(Operation::unitary(StandardGate::RYY(theta), [q1, q2], []))
    }

    /// Apply RZZ gate.
    pub fn rzz(&mut self, theta: f64, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.apply(Operation::unitary(StandardGate::RZZ(theta), [q1, q2], []))
    }

    // =========================================================================
    // Multi-controlled gates
    // =========================================================================

    /// Apply Toffoli gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.mcx(&[c1, c2], target)
    }

    /// Apply Fredkin gate.
    pub fn cswap(&mut self, control: QubitId, t1: QubitId, t2: QubitId) -> IrResult<&mut Self> {
        self.apply(Operation::unitary(
            StandardGate::Swap,
            [t1, t2],
            [Control::positive(control)],
        ))
    }

    /// Apply X controlled on every qubit in `controls`.
    pub fn mcx(&mut self, controls: &[QubitId], target: QubitId) -> IrResult<&mut Self> {
        self.apply(Operation::unitary(
            StandardGate::X,
            [target],
            controls.iter().copied().map(Control::positive),
        ))
    }

    /// Apply an arbitrary gate with explicit controls.
    pub fn gate(
        &mut self,
        gate: impl Into<Gate>,
        targets: impl IntoIterator<Item = QubitId>,
        controls: impl IntoIterator<Item = Control>,
    ) -> IrResult<&mut Self> {
        self.apply(Operation::unitary(gate, targets, controls))
    }

    // =========================================================================
    // Non-unitary operations
    // =========================================================================

    /// Measure a qubit into a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.apply(Operation::measure(qubit, clbit))
    }

    /// Measure every qubit `i` into classical bit `i`, adding bits as needed.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        while self.num_clbits < self.num_qubits {
            self.add_clbit();
        }
        let qubits: Vec<QubitId> = (0..self.num_qubits).map(QubitId).collect();
        let clbits: Vec<ClbitId> = (0..self.num_qubits).map(ClbitId).collect();
        self.apply(Operation::Measure { qubits, clbits })
    }

    /// Reset a qubit to |0⟩.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Operation::reset([qubit]))
    }

    /// Add a barrier on the given qubits.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.apply(Operation::barrier(qubits))
    }

    /// Add a barrier on all qubits.
    pub fn barrier_all(&mut self) -> IrResult<&mut Self> {
        let qubits: Vec<QubitId> = (0..self.num_qubits).map(QubitId).collect();
        self.barrier(qubits)
    }

    /// Append `operation`, executed only if classical bits `register` hold
    /// `expected` (bit `register.start` is the least significant).
    pub fn c_if(
        &mut self,
        register: Range<u32>,
        expected: u64,
        operation: Operation,
    ) -> IrResult<&mut Self> {
        self.apply(Operation::classic_controlled(operation, register, expected))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> u32 {
        self.num_clbits
    }

    /// Operations in program order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if the circuit has no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Serialize the circuit to JSON.
    pub fn to_json(&self) -> IrResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize a circuit from JSON. Operands are not validated.
    pub fn from_json(json: &str) -> IrResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// Create a Bell state circuit.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::with_size("bell", 2, 2);
        circuit
            .h(QubitId(0))?
            .cx(QubitId(0), QubitId(1))?
            .measure(QubitId(0), ClbitId(0))?
            .measure(QubitId(1), ClbitId(1))?;
        Ok(circuit)
    }

    /// Create a GHZ state circuit without measurements.
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut circuit = Self::with_size("ghz", n, n);
        if n == 0 {
            return Ok(circuit);
        }
        circuit.h(QubitId(0))?;
        for i in 0..n - 1 {
            circuit.cx(QubitId(i), QubitId(i + 1))?;
        }
        Ok(circuit)
    }

    /// Create a QFT circuit (without measurements).
    pub fn qft(n: u32) -> IrResult<Self> {
        use std::f64::consts::PI;

        let mut circuit = Self::with_size("qft", n, 0);
        for i in 0..n {
            circuit.h(QubitId(i))?;
            for j in (i + 1)..n {
                let angle = PI / f64::from(1u32 << (j - i));
                circuit.cp(angle, QubitId(j), QubitId(i))?;
            }
        }
        for i in 0..n / 2 {
            circuit.swap(QubitId(i), QubitId(n - 1 - i))?;
        }
        Ok(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Polarity;
    use std::f64::consts::PI;

    #[test]
    fn test_new_circuit() {
        let circuit = Circuit::new("test");
        assert_eq!(circuit.name(), "test");
        assert_eq!(circuit.num_qubits(), 0);
        assert_eq!(circuit.num_clbits(), 0);
        assert!(circuit.is_empty());
    }

    #[test]
    fn test_bell_state() {
        let circuit = Circuit::bell().unwrap();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.num_clbits(), 2);
        assert_eq!(circuit.len(), 4);

        let cx = &circuit.operations()[1];
        assert_eq!(cx.name(), "x");
        assert_eq!(cx.controls()[0].qubit, QubitId(0));
        assert_eq!(cx.controls()[0].polarity, Polarity::Positive);
    }

    #[test]
    fn test_ghz_state() {
        let circuit = Circuit::ghz(5).unwrap();
        assert_eq!(circuit.num_qubits(), 5);
        assert_eq!(circuit.len(), 5);
        assert!(Circuit::ghz(0).unwrap().is_empty());
    }

    #[test]
    fn test_qft_gate_count() {
        let circuit = Circuit::qft(4).unwrap();
        // 4 H, 6 CP, 2 SWAP
        assert_eq!(circuit.len(), 12);
    }

    #[test]
    fn test_fluent_api() {
        let mut circuit = Circuit::with_size("test", 2, 2);
        circuit
            .h(QubitId(0))
            .unwrap()
            .rx(PI / 2.0, QubitId(1))
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap()
            .measure(QubitId(0), ClbitId(0))
            .unwrap();
        assert_eq!(circuit.len(), 4);
    }

    #[test]
    fn test_rejects_unknown_qubit() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        let err = circuit.h(QubitId(2)).unwrap_err();
        assert!(matches!(err, IrError::QubitNotFound { qubit: QubitId(2), .. }));
    }

    #[test]
    fn test_rejects_duplicate_qubit() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        let err = circuit.cx(QubitId(1), QubitId(1)).unwrap_err();
        assert!(matches!(err, IrError::DuplicateQubit { .. }));
    }

    #[test]
    fn test_rejects_wrong_arity() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        let err = circuit
            .gate(StandardGate::Swap, [QubitId(0)], [])
            .unwrap_err();
        assert!(matches!(
            err,
            IrError::QubitCountMismatch {
                expected: 2,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_unknown_clbit() {
        let mut circuit = Circuit::with_size("test", 1, 1);
        let err = circuit.measure(QubitId(0), ClbitId(1)).unwrap_err();
        assert!(matches!(err, IrError::ClbitNotFound { .. }));
    }

    #[test]
    fn test_classic_condition_validation() {
        let mut circuit = Circuit::with_size("test", 2, 2);
        let x1 = Operation::unitary(StandardGate::X, [QubitId(1)], []);
        assert!(circuit.c_if(0..1, 1, x1.clone()).is_ok());
        assert!(matches!(
            circuit.c_if(1..1, 0, x1.clone()),
            Err(IrError::InvalidCondition(_))
        ));
        assert!(matches!(
            circuit.c_if(0..3, 0, x1),
            Err(IrError::ClbitNotFound { .. })
        ));
    }

    #[test]
    fn test_measure_all_adds_clbits() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        circuit.measure_all().unwrap();
        assert_eq!(circuit.num_clbits(), 3);
        assert_eq!(circuit.operations()[0].clbits().len(), 3);
    }

    #[test]
    fn test_barrier_all() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        circuit.barrier_all().unwrap();
        assert_eq!(circuit.operations()[0].targets().len(), 3);
    }

    #[test]
    fn test_json_roundtrip() {
        let circuit = Circuit::bell().unwrap();
        let json = circuit.to_json().unwrap();
        let back = Circuit::from_json(&json).unwrap();
        assert_eq!(back, circuit);
    }
}
