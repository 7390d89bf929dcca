//! Deterministic noise simulation of density matrices.
//!
//! The state is a density matrix stored as a decision diagram
//! ([`densim_dd`]). Gates evolve it as `U ρ U†`; after every gate the
//! configured noise channels are applied exactly to each touched qubit, so
//! a single run yields the noisy output distribution without sampling
//! trajectories. Measurements collapse the state with one random draw each.
//!
//! Supported channels, all sharing one probability `p`:
//!
//! | Letter | Channel            | Effect on a qubit                         |
//! |--------|--------------------|-------------------------------------------|
//! | `A`    | amplitude damping  | relaxes 1 to 0 at rate `γ = 2p`           |
//! | `P`    | phase flip         | coherences scaled by `1 − 2p`             |
//! | `D`    | depolarization     | mixes towards `I/2` with weight `p`       |
//!
//! # Quick start
//!
//! ```rust
//! use densim_ir::{Circuit, QubitId};
//! use densim_sim::{DeterministicNoiseSimulator, SimulatorConfig};
//!
//! let mut circuit = Circuit::with_size("bell", 2, 0);
//! circuit.h(QubitId(0)).unwrap().cx(QubitId(0), QubitId(1)).unwrap();
//!
//! let config = SimulatorConfig::default().with_noise_probability(0.01);
//! let sim = DeterministicNoiseSimulator::new(config).unwrap();
//! let probabilities = sim.simulate(&circuit).unwrap();
//!
//! let total: f64 = probabilities.values().sum();
//! assert!(probabilities["00"] > 0.45 && probabilities["11"] > 0.45);
//! assert!(total <= 1.0 + 1e-9);
//! ```

pub mod analysis;
mod channels;
pub mod config;
pub mod error;
pub mod measure;
pub mod noise;
pub mod operator;
pub mod simulator;

pub use analysis::analyse_state;
pub use config::{NoiseApplication, NoiseConfig, ReportConfig, SimulatorConfig};
pub use error::{SimError, SimResult};
pub use measure::{collapse, prob_for_index_to_be_zero};
pub use noise::{NoiseEngine, apply_noise_sequential};
pub use operator::{kraus_operators, make_projector, make_zero_density_operator};
pub use simulator::{DeterministicNoiseSimulator, Session};
