//! Error types for the decision-diagram crate.

use thiserror::Error;

/// Errors produced while compiling operators into decision diagrams.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DdError {
    /// The gate matrix does not have `4^k` entries for `k` targets.
    #[error("Gate matrix has {got} entries, expected {expected}")]
    MatrixShape {
        /// Expected number of entries.
        expected: usize,
        /// Actual number of entries.
        got: usize,
    },

    /// A target or control lies outside the package's qubit range.
    #[error("Qubit {qubit} is out of range for a {num_qubits}-qubit package")]
    QubitOutOfRange {
        /// The offending qubit index.
        qubit: u32,
        /// Number of qubits the package was created with.
        num_qubits: u32,
    },

    /// A qubit appears more than once among targets and controls.
    #[error("Qubit {0} is used more than once in the same operation")]
    DuplicateQubit(u32),
}

/// Result type for decision-diagram operations.
pub type DdResult<T> = Result<T, DdError>;
