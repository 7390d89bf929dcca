//! Circuit operations combining gates with operands.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::gate::Gate;
use crate::qubit::{ClbitId, QubitId};

/// Which basis state of a control qubit activates the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    /// Active when the control is |1⟩.
    Positive,
    /// Active when the control is |0⟩.
    Negative,
}

/// A control qubit of a unitary operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Control {
    /// The controlling qubit.
    pub qubit: QubitId,
    /// Activation polarity.
    pub polarity: Polarity,
}

impl Control {
    /// A control that activates on |1⟩.
    pub fn positive(qubit: impl Into<QubitId>) -> Self {
        Self {
            qubit: qubit.into(),
            polarity: Polarity::Positive,
        }
    }

    /// A control that activates on |0⟩.
    pub fn negative(qubit: impl Into<QubitId>) -> Self {
        Self {
            qubit: qubit.into(),
            polarity: Polarity::Negative,
        }
    }
}

/// A single step of a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// A (possibly controlled) unitary gate.
    Unitary {
        /// The gate applied to the targets.
        gate: Gate,
        /// Target qubits; `targets[j]` is bit `j` of the gate matrix index.
        targets: Vec<QubitId>,
        /// Control qubits.
        controls: Vec<Control>,
    },
    /// Measure each qubit into the classical bit at the same position.
    Measure {
        /// Measured qubits.
        qubits: Vec<QubitId>,
        /// Destination bits.
        clbits: Vec<ClbitId>,
    },
    /// Reset qubits to |0⟩.
    Reset {
        /// Qubits to reset.
        qubits: Vec<QubitId>,
    },
    /// Barrier (synchronization point).
    Barrier {
        /// Qubits spanned by the barrier.
        qubits: Vec<QubitId>,
    },
    /// An operation executed only if a range of classical bits holds a value.
    ClassicControlled {
        /// The conditioned operation.
        operation: Box<Operation>,
        /// Classical bits `[start, end)`; `start` is the least significant.
        register: Range<u32>,
        /// Value the register must hold.
        expected: u64,
    },
}

impl Operation {
    /// Create a unitary operation.
    pub fn unitary(
        gate: impl Into<Gate>,
        targets: impl IntoIterator<Item = QubitId>,
        controls: impl IntoIterator<Item = Control>,
    ) -> Self {
        Operation::Unitary {
            gate: gate.into(),
            targets: targets.into_iter().collect(),
            controls: controls.into_iter().collect(),
        }
    }

    /// Create a measurement of one qubit.
    pub fn measure(qubit: QubitId, clbit: ClbitId) -> Self {
        Operation::Measure {
            qubits: vec![qubit],
            clbits: vec![clbit],
        }
    }

    /// Create a reset operation.
    pub fn reset(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Operation::Reset {
            qubits: qubits.into_iter().collect(),
        }
    }

    /// Create a barrier operation.
    pub fn barrier(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Operation::Barrier {
            qubits: qubits.into_iter().collect(),
        }
    }

    /// Wrap an operation in a classical condition.
    pub fn classic_controlled(operation: Operation, register: Range<u32>, expected: u64) -> Self {
        Operation::ClassicControlled {
            operation: Box::new(operation),
            register,
            expected,
        }
    }

    /// Get the name of this operation.
    pub fn name(&self) -> &str {
        match self {
            Operation::Unitary { gate, .. } => gate.name(),
            Operation::Measure { .. } => "measure",
            Operation::Reset { .. } => "reset",
            Operation::Barrier { .. } => "barrier",
            Operation::ClassicControlled { operation, .. } => operation.name(),
        }
    }

    /// Check if this is an unconditioned unitary.
    pub fn is_unitary(&self) -> bool {
        matches!(self, Operation::Unitary { .. })
    }

    /// Check if this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self, Operation::Measure { .. })
    }

    /// Check if this is classically controlled.
    pub fn is_classic_controlled(&self) -> bool {
        matches!(self, Operation::ClassicControlled { .. })
    }

    /// Target qubits (measured, reset or spanned qubits for non-unitaries).
    pub fn targets(&self) -> &[QubitId] {
        match self {
            Operation::Unitary { targets, .. } => targets,
            Operation::Measure { qubits, .. }
            | Operation::Reset { qubits }
            | Operation::Barrier { qubits } => qubits,
            Operation::ClassicControlled { operation, .. } => operation.targets(),
        }
    }

    /// Control qubits.
    pub fn controls(&self) -> &[Control] {
        match self {
            Operation::Unitary { controls, .. } => controls,
            Operation::ClassicControlled { operation, .. } => operation.controls(),
            _ => &[],
        }
    }

    /// Classical bits written by this operation.
    pub fn clbits(&self) -> &[ClbitId] {
        match self {
            Operation::Measure { clbits, .. } => clbits,
            Operation::ClassicControlled { operation, .. } => operation.clbits(),
            _ => &[],
        }
    }

    /// All qubits touched, sorted and deduplicated.
    pub fn used_qubits(&self) -> Vec<QubitId> {
        let mut used: Vec<QubitId> = self
            .targets()
            .iter()
            .copied()
            .chain(self.controls().iter().map(|c| c.qubit))
            .collect();
        used.sort_unstable();
        used.dedup();
        used
    }

    /// Check if this operation touches a qubit.
    pub fn acts_on(&self, qubit: QubitId) -> bool {
        self.targets().contains(&qubit) || self.controls().iter().any(|c| c.qubit == qubit)
    }
}
