//! Weighted decision diagrams for density matrices
//!
//! A matrix over `n` qubits is stored as a DAG of nodes, one level per
//! qubit. A node at level `q` splits its matrix into four blocks
//! `[[e0, e1], [e2, e3]]` over qubits `0..q`, each an [`Edge`]: a complex
//! weight times a child node. Qubit 0 is the lowest level; the terminal node
//! is the scalar 1. Every nonzero child of a level-`q` node sits at level
//! `q - 1`, and a zero block is the weight-0 terminal edge.
//!
//! # Canonical form
//!
//! - Children are divided so the largest magnitude becomes 1; the divisor
//!   moves to the incoming edge. Its phase is that of the first diagonal
//!   child (then off-diagonal) of non-negligible size, so blocks of a
//!   density matrix carry real, positive weights. Density-marked nodes
//!   always divide by the real magnitude.
//! - Child weights are snapped through a [`ComplexTable`] so equal values
//!   within [`TOLERANCE`] hash identically.
//! - A unique table hash-conses nodes, so equal subgraphs share one node.
//!
//! # Density marker
//!
//! Nodes of Hermitian matrices may carry a density marker. A marked node
//! stores its lower-left block as a verbatim copy of the upper-right one;
//! [`Package::children`] reconstructs the real block as its conjugate
//! transpose, and [`Package::align`] yields an unmarked equivalent.
//!
//! # Example
//!
//! ```rust
//! use densim_dd::{Edge, Package};
//! use densim_ir::{QubitId, StandardGate};
//! use num_complex::Complex64;
//!
//! let mut pkg = Package::new(1);
//! // |0><0|
//! let rho = pkg.make_node(0, [Edge::ONE, Edge::ZERO, Edge::ZERO, Edge::ZERO]);
//! let h = StandardGate::H.matrix();
//! let h = pkg.make_operation_dd(&h, &[QubitId(0)], &[]).unwrap();
//! let h_dag = pkg.conjugate_transpose(h);
//! let tmp = pkg.multiply(h, rho);
//! let plus = pkg.multiply(tmp, h_dag);
//!
//! assert!((pkg.trace(plus) - Complex64::new(1.0, 0.0)).norm() < 1e-12);
//! assert!((pkg.get_entry(plus, 0, 1) - Complex64::new(0.5, 0.0)).norm() < 1e-12);
//! ```

pub mod complex;
pub mod edge;
pub mod error;
pub mod gate;
pub mod noise_table;
pub mod ops;
pub mod package;

pub use complex::{ComplexCache, ComplexTable, Scratch, approx_eq, approx_zero};
pub use edge::{Edge, Node, NodeId};
pub use error::{DdError, DdResult};
pub use noise_table::{NoiseKey, NoiseTable};
pub use package::{INITIAL_GC_LIMIT, Package, Statistics};

/// Absolute tolerance for approximate comparisons of complex components.
pub const TOLERANCE: f64 = 1e-13;
