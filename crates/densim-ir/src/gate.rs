//! Quantum gate types and their unitary matrices.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_1_SQRT_2, PI};

use crate::error::{IrError, IrResult};

#[inline]
fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

/// Base gates with known semantics.
///
/// Controlled variants are not separate gates: a controlled X is an
/// [`Operation::Unitary`](crate::Operation::Unitary) with `StandardGate::X`
/// and one positive control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    // Single-qubit Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,

    // Single-qubit Clifford gates
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,

    // Single-qubit rotation gates
    /// Rotation around X axis.
    Rx(f64),
    /// Rotation around Y axis.
    Ry(f64),
    /// Rotation around Z axis.
    Rz(f64),
    /// Phase gate.
    P(f64),
    /// Universal single-qubit gate U(θ, φ, λ).
    U(f64, f64, f64),
    /// Phased RX gate: PRX(θ, φ) = RZ(φ) · RX(θ) · RZ(-φ).
    PRX(f64, f64),

    // Two-qubit gates
    /// SWAP gate.
    Swap,
    /// iSWAP gate.
    ISwap,
    /// XX rotation gate.
    RXX(f64),
    /// YY rotation gate.
    RYY(f64),
    /// ZZ rotation gate.
    RZZ(f64),
}

impl StandardGate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::SXdg => "sxdg",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::P(_) => "p",
            StandardGate::U(_, _, _) => "u",
            StandardGate::PRX(_, _) => "prx",
            StandardGate::Swap => "swap",
            StandardGate::ISwap => "iswap",
            StandardGate::RXX(_) => "rxx",
            StandardGate::RYY(_) => "ryy",
            StandardGate::RZZ(_) => "rzz",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::Swap
            | StandardGate::ISwap
            | StandardGate::RXX(_)
            | StandardGate::RYY(_)
            | StandardGate::RZZ(_) => 2,
            _ => 1,
        }
    }

    /// Get parameters of this gate.
    pub fn parameters(&self) -> Vec<f64> {
        match self {
            StandardGate::Rx(p)
            | StandardGate::Ry(p)
            | StandardGate::Rz(p)
            | StandardGate::P(p)
            | StandardGate::RXX(p)
            | StandardGate::RYY(p)
            | StandardGate::RZZ(p) => vec![*p],
            StandardGate::U(a, b, l) => vec![*a, *b, *l],
            StandardGate::PRX(theta, phi) => vec![*theta, *phi],
            _ => vec![],
        }
    }

    /// The unitary matrix of this gate, row-major, `2^k × 2^k`.
    ///
    /// For two-qubit gates bit `j` of the row/column index belongs to the
    /// `j`-th target.
    pub fn matrix(&self) -> Vec<Complex64> {
        let zero = c(0.0, 0.0);
        let one = c(1.0, 0.0);
        match *self {
            StandardGate::I => vec![one, zero, zero, one],
            StandardGate::X => vec![zero, one, one, zero],
            StandardGate::Y => vec![zero, c(0.0, -1.0), c(0.0, 1.0), zero],
            StandardGate::Z => vec![one, zero, zero, -one],
            StandardGate::H => {
                let s = c(FRAC_1_SQRT_2, 0.0);
                vec![s, s, s, -s]
            }
            StandardGate::S => vec![one, zero, zero, c(0.0, 1.0)],
            StandardGate::Sdg => vec![one, zero, zero, c(0.0, -1.0)],
            StandardGate::T => vec![one, zero, zero, Complex64::from_polar(1.0, PI / 4.0)],
            StandardGate::Tdg => vec![one, zero, zero, Complex64::from_polar(1.0, -PI / 4.0)],
            StandardGate::SX => vec![c(0.5, 0.5), c(0.5, -0.5), c(0.5, -0.5), c(0.5, 0.5)],
            StandardGate::SXdg => vec![c(0.5, -0.5), c(0.5, 0.5), c(0.5, 0.5), c(0.5, -0.5)],
            StandardGate::Rx(theta) => {
                let (s, co) = (theta / 2.0).sin_cos();
                vec![c(co, 0.0), c(0.0, -s), c(0.0, -s), c(co, 0.0)]
            }
            StandardGate::Ry(theta) => {
                let (s, co) = (theta / 2.0).sin_cos();
                vec![c(co, 0.0), c(-s, 0.0), c(s, 0.0), c(co, 0.0)]
            }
            StandardGate::Rz(theta) => vec![
                Complex64::from_polar(1.0, -theta / 2.0),
                zero,
                zero,
                Complex64::from_polar(1.0, theta / 2.0),
            ],
            StandardGate::P(lambda) => vec![one, zero, zero, Complex64::from_polar(1.0, lambda)],
            StandardGate::U(theta, phi, lambda) => {
                let (s, co) = (theta / 2.0).sin_cos();
                vec![
                    c(co, 0.0),
                    -Complex64::from_polar(s, lambda),
                    Complex64::from_polar(s, phi),
                    Complex64::from_polar(co, phi + lambda),
                ]
            }
            StandardGate::PRX(theta, phi) => {
                let (s, co) = (theta / 2.0).sin_cos();
                let minus_i = c(0.0, -1.0);
                vec![
                    c(co, 0.0),
                    minus_i * Complex64::from_polar(s, -phi),
                    minus_i * Complex64::from_polar(s, phi),
                    c(co, 0.0),
                ]
            }
            StandardGate::Swap => {
                let mut m = vec![zero; 16];
                m[0] = one;
                m[6] = one;
                m[9] = one;
                m[15] = one;
                m
            }
            StandardGate::ISwap => {
                let mut m = vec![zero; 16];
                m[0] = one;
                m[6] = c(0.0, 1.0);
                m[9] = c(0.0, 1.0);
                m[15] = one;
                m
            }
            StandardGate::RXX(theta) => {
                let (s, co) = (theta / 2.0).sin_cos();
                let mut m = vec![zero; 16];
                for i in 0..4 {
                    m[i * 4 + i] = c(co, 0.0);
                    m[i * 4 + (3 - i)] = c(0.0, -s);
                }
                m
            }
            StandardGate::RYY(theta) => {
                let (s, co) = (theta / 2.0).sin_cos();
                let mut m = vec![zero; 16];
                for i in 0..4 {
                    m[i * 4 + i] = c(co, 0.0);
                }
                m[3] = c(0.0, s);
                m[6] = c(0.0, -s);
                m[9] = c(0.0, -s);
                m[12] = c(0.0, s);
                m
            }
            StandardGate::RZZ(theta) => {
                let even = Complex64::from_polar(1.0, -theta / 2.0);
                let odd = Complex64::from_polar(1.0, theta / 2.0);
                let mut m = vec![zero; 16];
                m[0] = even;
                m[5] = odd;
                m[10] = odd;
                m[15] = even;
                m
            }
        }
    }
}

/// A user-defined gate given by its unitary matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomGate {
    /// The name of the gate.
    pub name: String,
    /// The number of qubits it operates on.
    pub num_qubits: u32,
    /// Unitary matrix (row-major, 2^n × 2^n).
    pub matrix: Vec<Complex64>,
}

impl CustomGate {
    /// Create a new custom gate, checking the matrix size.
    pub fn new(name: impl Into<String>, num_qubits: u32, matrix: Vec<Complex64>) -> IrResult<Self> {
        let name = name.into();
        let dim = 1usize << num_qubits;
        if matrix.len() != dim * dim {
            return Err(IrError::MatrixShape {
                gate_name: name,
                expected: dim * dim,
                got: matrix.len(),
            });
        }
        Ok(Self {
            name,
            num_qubits,
            matrix,
        })
    }
}

/// A quantum gate, either standard or custom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    /// A standard gate with known semantics.
    Standard(StandardGate),
    /// A custom user-defined gate.
    Custom(CustomGate),
}

impl Gate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            Gate::Standard(g) => g.name(),
            Gate::Custom(g) => &g.name,
        }
    }

    /// Get the number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            Gate::Standard(g) => g.num_qubits(),
            Gate::Custom(g) => g.num_qubits,
        }
    }

    /// The unitary matrix of this gate.
    pub fn matrix(&self) -> Vec<Complex64> {
        match self {
            Gate::Standard(g) => g.matrix(),
            Gate::Custom(g) => g.matrix.clone(),
        }
    }
}

impl From<StandardGate> for Gate {
    fn from(gate: StandardGate) -> Self {
        Gate::Standard(gate)
    }
}

impl From<CustomGate> for Gate {
    fn from(gate: CustomGate) -> Self {
        Gate::Custom(gate)
    }
}
