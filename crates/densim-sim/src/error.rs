//! Error types for the sim crate.

use thiserror::Error;

/// Errors produced while configuring or running a simulation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimError {
    /// The circuit contains an operation the simulator cannot execute.
    #[error("Unsupported operation: {name}")]
    UnsupportedOperation {
        /// Name of the rejected operation.
        name: String,
    },

    /// A measurement lists a different number of qubits and classical bits.
    #[error("Measurement shape mismatch: {qubits} qubits but {clbits} classical bits")]
    ShapeMismatch {
        /// Number of measured qubits.
        qubits: usize,
        /// Number of classical bits receiving outcomes.
        clbits: usize,
    },

    /// An operation references a qubit outside the circuit.
    #[error("Operation references qubit {qubit} but circuit only has {num_qubits} qubits")]
    QubitOutOfRange {
        /// The offending qubit index.
        qubit: u32,
        /// Number of qubits in the circuit.
        num_qubits: u32,
    },

    /// Noise probability outside `[0, 1]`, or too large for amplitude damping.
    #[error("Invalid noise probability: {0}")]
    InvalidNoiseProbability(f64),

    /// Circuit IR error.
    #[error("Circuit IR error: {0}")]
    Ir(#[from] densim_ir::IrError),

    /// Decision-diagram engine error.
    #[error("Decision diagram error: {0}")]
    Dd(#[from] densim_dd::DdError),

    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
