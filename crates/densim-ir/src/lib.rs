//! Circuit Intermediate Representation for densim
//!
//! This crate provides the data structures the density-matrix simulator
//! consumes: a flat, validated list of operations over a fixed number of
//! qubits and classical bits.
//!
//! # Core Components
//!
//! - **Qubits and Classical Bits**: [`QubitId`], [`ClbitId`] for addressing
//!   quantum and classical registers
//! - **Gates**: [`StandardGate`] for built-in gates with their unitary
//!   matrices and [`CustomGate`] for explicit user matrices
//! - **Operations**: [`Operation`], a closed enum of unitaries (with
//!   [`Control`]s), measurements, resets, barriers and classically controlled
//!   operations
//! - **Noise**: [`NoiseChannel`] descriptors and the ordered
//!   [`NoiseChannels`] set
//! - **Circuit**: [`Circuit`] high-level builder API
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use densim_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell_state", 2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure_all().unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.len(), 3);
//! ```
//!
//! # Example: Classical Feed-Forward
//!
//! ```rust
//! use densim_ir::{Circuit, ClbitId, Operation, QubitId, StandardGate};
//!
//! let mut circuit = Circuit::with_size("feed_forward", 2, 1);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.measure(QubitId(0), ClbitId(0)).unwrap();
//! circuit
//!     .c_if(0..1, 1, Operation::unitary(StandardGate::X, [QubitId(1)], []))
//!     .unwrap();
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `H` | 1 | Hadamard gate |
//! | `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `S`, `Sdg`, `T`, `Tdg` | 1 | Phase gates |
//! | `SX`, `SXdg` | 1 | sqrt(X) and its inverse |
//! | `Rx`, `Ry`, `Rz`, `P` | 1 | Rotation and phase gates |
//! | `U`, `PRX` | 1 | Universal and phased-RX gates |
//! | `Swap`, `ISwap` | 2 | Swap gates |
//! | `RXX`, `RYY`, `RZZ` | 2 | Ising coupling gates |
//!
//! Any gate may carry positive or negative controls, so CX, CCX, CSWAP and
//! multi-controlled X are expressed as controlled base gates.

pub mod circuit;
pub mod error;
pub mod gate;
pub mod noise;
pub mod operation;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::{CustomGate, Gate, StandardGate};
pub use noise::{NoiseChannel, NoiseChannels};
pub use operation::{Control, Operation, Polarity};
pub use qubit::{ClbitId, QubitId};
