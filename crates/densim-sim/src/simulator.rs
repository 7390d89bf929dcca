//! Simulation driver.
//!
//! [`DeterministicNoiseSimulator`] holds the configuration; each call to
//! [`simulate`](DeterministicNoiseSimulator::simulate) runs a fresh
//! [`Session`] that owns the diagram package, the root density matrix, the
//! classical register and the measurement RNG.

use std::collections::BTreeMap;
use std::ops::Range;
use std::time::Instant;

use densim_dd::{Edge, Package, Statistics, TOLERANCE};
use densim_ir::{Circuit, Control, Gate, IrError, Operation, QubitId};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument, trace};

use crate::analysis::analyse_state;
use crate::config::{NoiseApplication, SimulatorConfig};
use crate::error::{SimError, SimResult};
use crate::measure::{collapse, prob_for_index_to_be_zero};
use crate::noise::{NoiseEngine, apply_noise_sequential};
use crate::operator::make_zero_density_operator;

/// Density-matrix simulator with deterministic noise.
///
/// Noise is applied exactly, as a channel on the density matrix, after every
/// gate; only measurements draw random numbers.
#[derive(Debug, Clone, Default)]
pub struct DeterministicNoiseSimulator {
    config: SimulatorConfig,
}

impl DeterministicNoiseSimulator {
    /// Create a simulator, validating the configuration.
    pub fn new(config: SimulatorConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Start a session over `num_qubits` qubits in `|0…0⟩`.
    pub fn session(&self, num_qubits: u32) -> Session {
        Session::new(self.config.clone(), num_qubits)
    }

    /// Run `circuit` and return the probabilities of the basis states above
    /// the reporting threshold.
    #[instrument(skip(self, circuit), fields(circuit = circuit.name()))]
    pub fn simulate(&self, circuit: &Circuit) -> SimResult<BTreeMap<String, f64>> {
        let start = Instant::now();
        debug!(
            "Starting simulation: {} qubits, {} operations, p = {}",
            circuit.num_qubits(),
            circuit.len(),
            self.config.noise.probability
        );

        let mut session = self.session(circuit.num_qubits());
        session.run(circuit)?;
        let results = session.finish();

        debug!("Simulation completed in {:?}", start.elapsed());
        Ok(results)
    }
}

/// State of one simulation run.
pub struct Session {
    config: SimulatorConfig,
    package: Package,
    root: Edge,
    classical: BTreeMap<u32, bool>,
    rng: StdRng,
}

impl Session {
    /// Create a session in `|0…0⟩` with an empty classical register.
    pub fn new(config: SimulatorConfig, num_qubits: u32) -> Self {
        let mut package = Package::new(num_qubits);
        let root = make_zero_density_operator(&mut package, num_qubits);
        package.inc_ref(root);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            package,
            root,
            classical: BTreeMap::new(),
            rng,
        }
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.package.num_qubits()
    }

    /// The current density matrix.
    pub fn root(&self) -> Edge {
        self.root
    }

    /// The diagram package holding the state.
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Mutable access to the package, e.g. to read matrix entries.
    pub fn package_mut(&mut self) -> &mut Package {
        &mut self.package
    }

    /// Trace of the current density matrix.
    pub fn trace(&mut self) -> Complex64 {
        self.package.trace(self.root)
    }

    /// Classical bits written so far.
    pub fn classical_bits(&self) -> &BTreeMap<u32, bool> {
        &self.classical
    }

    /// Number of scratch complex values currently checked out.
    pub fn occupancy(&self) -> usize {
        self.package.occupancy()
    }

    /// Package statistics.
    pub fn statistics(&self) -> Statistics {
        self.package.statistics()
    }

    /// Apply every operation of `circuit` in order.
    pub fn run(&mut self, circuit: &Circuit) -> SimResult<()> {
        for operation in circuit.operations() {
            self.apply(operation)?;
        }
        Ok(())
    }

    /// Apply one operation.
    pub fn apply(&mut self, operation: &Operation) -> SimResult<()> {
        self.package.garbage_collect(false);
        debug!(operation = operation.name(), "applying operation");

        match operation {
            Operation::Unitary {
                gate,
                targets,
                controls,
            } => self.apply_unitary(gate, targets, controls),
            Operation::Measure { qubits, clbits } => {
                if qubits.len() != clbits.len() {
                    return Err(SimError::ShapeMismatch {
                        qubits: qubits.len(),
                        clbits: clbits.len(),
                    });
                }
                for (qubit, clbit) in qubits.iter().zip(clbits) {
                    let outcome = self.measure_one_collapsing(qubit.index())?;
                    self.classical.insert(clbit.index(), outcome == '1');
                }
                Ok(())
            }
            Operation::Barrier { .. } => Ok(()),
            Operation::Reset { .. } => Err(SimError::UnsupportedOperation {
                name: operation.name().to_string(),
            }),
            Operation::ClassicControlled {
                operation: inner,
                register,
                expected,
            } => {
                let Operation::Unitary {
                    gate,
                    targets,
                    controls,
                } = &**inner
                else {
                    return Err(SimError::UnsupportedOperation {
                        name: format!("c_if({})", inner.name()),
                    });
                };
                if self.register_value(register)? != *expected {
                    trace!(gate = gate.name(), "condition false, skipping");
                    return Ok(());
                }
                self.apply_unitary(gate, targets, controls)
            }
        }
    }

    /// Measure qubit `index`, collapse the state onto the outcome and return
    /// it as `'0'` or `'1'`.
    pub fn measure_one_collapsing(&mut self, index: u32) -> SimResult<char> {
        self.check_qubit(index)?;
        let u: f64 = self.rng.gen_range(0.0..1.0);
        let p0 = prob_for_index_to_be_zero(&mut self.package, self.root, index, 1.0);

        // Never pick an outcome with zero probability.
        let zero = if p0 <= TOLERANCE {
            false
        } else if p0 >= 1.0 - TOLERANCE {
            true
        } else {
            p0 >= u
        };
        let outcome = !zero;
        trace!(qubit = index, p0, u, outcome, "measured");

        let collapsed = collapse(&mut self.package, self.root, index, outcome);
        let collapsed = self.mark(collapsed);
        self.replace_root(collapsed);
        Ok(if outcome { '1' } else { '0' })
    }

    /// Probability that measuring qubit `index` now yields 0.
    pub fn probability_of_zero(&mut self, index: u32) -> SimResult<f64> {
        self.check_qubit(index)?;
        Ok(prob_for_index_to_be_zero(
            &mut self.package,
            self.root,
            index,
            1.0,
        ))
    }

    /// Collect garbage, log statistics and read off the result.
    pub fn finish(mut self) -> BTreeMap<String, f64> {
        self.package.garbage_collect(true);
        let stats = self.package.statistics();
        debug!(
            live_nodes = stats.live_nodes,
            peak_nodes = stats.peak_nodes,
            unique_hits = stats.unique_hits,
            unique_lookups = stats.unique_lookups,
            compute_hits = stats.compute_hits,
            compute_lookups = stats.compute_lookups,
            noise_hits = stats.noise_hits,
            noise_lookups = stats.noise_lookups,
            gc_runs = stats.gc_runs,
            "package statistics"
        );
        let num_qubits = self.num_qubits();
        analyse_state(&mut self.package, self.root, num_qubits, &self.config.report)
    }

    fn apply_unitary(
        &mut self,
        gate: &Gate,
        targets: &[QubitId],
        controls: &[Control],
    ) -> SimResult<()> {
        for qubit in targets.iter().chain(controls.iter().map(|c| &c.qubit)) {
            self.check_qubit(qubit.index())?;
        }

        let matrix = gate.matrix();
        let u = self.package.make_operation_dd(&matrix, targets, controls)?;
        let u_dag = self.package.conjugate_transpose(u);
        let left = self.package.multiply(u, self.root);
        let evolved = self.package.multiply(left, u_dag);
        let evolved = self.mark(evolved);
        self.replace_root(evolved);
        trace!(gate = gate.name(), "applied gate");

        let noise = &self.config.noise;
        if noise.probability > 0.0 && !noise.channels.is_empty() {
            let touched: Vec<QubitId> = targets
                .iter()
                .copied()
                .chain(controls.iter().map(|c| c.qubit))
                .collect();
            let before = self.package.occupancy();
            let noisy = match noise.application {
                NoiseApplication::Direct => {
                    let result = NoiseEngine::new(
                        &mut self.package,
                        noise.channels.as_slice(),
                        noise.probability,
                        &touched,
                    )
                    .with_memoize(noise.memoize)
                    .with_density_marker(self.config.use_density_marker)
                    .apply(self.root);
                    let weight = self.package.lookup(result.weight);
                    result.with_weight(weight)
                }
                NoiseApplication::Sequential => {
                    let result = apply_noise_sequential(
                        &mut self.package,
                        self.root,
                        &touched,
                        noise.channels.as_slice(),
                        noise.probability,
                    )?;
                    self.mark(result)
                }
            };
            debug_assert_eq!(
                self.package.occupancy(),
                before,
                "scratch values leaked by noise application"
            );
            self.replace_root(noisy);
        }
        Ok(())
    }

    fn mark(&mut self, edge: Edge) -> Edge {
        if self.config.use_density_marker {
            self.package.set_density_marker(edge)
        } else {
            edge
        }
    }

    /// Install `edge` as the root, moving the session's reference onto it.
    fn replace_root(&mut self, edge: Edge) {
        self.package.inc_ref(edge);
        self.package.dec_ref(self.root);
        self.root = edge;
    }

    fn register_value(&self, register: &Range<u32>) -> SimResult<u64> {
        if register.len() > 64 {
            return Err(IrError::InvalidCondition(format!(
                "register c[{}..{}] is wider than 64 bits",
                register.start, register.end
            ))
            .into());
        }
        Ok(register
            .clone()
            .enumerate()
            .filter(|(_, bit)| self.classical.get(bit).copied().unwrap_or(false))
            .fold(0u64, |acc, (i, _)| acc | (1u64 << i)))
    }

    fn check_qubit(&self, qubit: u32) -> SimResult<()> {
        let num_qubits = self.num_qubits();
        if qubit >= num_qubits {
            return Err(SimError::QubitOutOfRange { qubit, num_qubits });
        }
        Ok(())
    }
}
