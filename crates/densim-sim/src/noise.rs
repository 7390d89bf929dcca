//! Noise propagation after a gate.
//!
//! Two strategies apply the configured channels to every qubit a gate
//! touched:
//!
//! - [`NoiseEngine`] walks the density matrix once and rewrites the blocks of
//!   each touched level in closed form. Results are memoized per
//!   node under the touched-qubit set, channels and probability, so shared
//!   subgraphs are processed once.
//! - [`apply_noise_sequential`] builds the Kraus operators of each channel
//!   and sums `K ρ K†` with full diagram multiplications.
//!
//! Both produce the same state.

use densim_dd::{DdResult, Edge, NoiseKey, Package};
use densim_ir::{NoiseChannel, QubitId};
use num_complex::Complex64;
use tracing::trace;

use crate::channels::apply_channel;
use crate::operator::kraus_operators;

/// Single-traversal noise application.
pub struct NoiseEngine<'a> {
    package: &'a mut Package,
    channels: &'a [NoiseChannel],
    probability: f64,
    /// Memo key: sorted touched levels, channels and probability.
    key: NoiseKey,
    memoize: bool,
    use_density_marker: bool,
}

impl<'a> NoiseEngine<'a> {
    /// Prepare to apply `channels` at `probability` to `qubits`.
    pub fn new(
        package: &'a mut Package,
        channels: &'a [NoiseChannel],
        probability: f64,
        qubits: &[QubitId],
    ) -> Self {
        let mut qubits: Vec<u32> = qubits.iter().map(|q| q.index()).collect();
        qubits.sort_unstable();
        qubits.dedup();
        Self {
            package,
            channels,
            probability,
            key: NoiseKey::new(qubits, channels, probability),
            memoize: true,
            use_density_marker: true,
        }
    }

    /// Enable or disable the noise memo table.
    #[must_use]
    pub fn with_memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    /// Enable or disable marking density-path nodes.
    #[must_use]
    pub fn with_density_marker(mut self, enabled: bool) -> Self {
        self.use_density_marker = enabled;
        self
    }

    /// Apply the channels to the density matrix `root`.
    pub fn apply(&mut self, root: Edge) -> Edge {
        let Some(&min_level) = self.key.qubits().first() else {
            return root;
        };
        trace!(
            qubits = ?self.key.qubits(),
            channels = self.channels.len(),
            p = self.probability,
            "applying noise"
        );
        self.apply_noise_effects(root, min_level, true)
    }

    /// Noisy copy of `edge`. Nothing at or below a level under `min_level`
    /// is touched, so such subgraphs are returned as they are.
    fn apply_noise_effects(&mut self, edge: Edge, min_level: u32, density_path: bool) -> Edge {
        let level = match self.package.level(edge) {
            Some(level) if level >= min_level => level,
            _ => return edge,
        };

        let aligned = self.package.align(edge);
        let children = *self.package.node(aligned.node).stored_children();
        let mark = self.use_density_marker && density_path;

        let mut blocks = [Edge::ZERO; 4];
        for (k, block) in blocks.iter_mut().enumerate() {
            // A marked node rebuilds its lower-left block from the upper-right one.
            if mark && k == 2 {
                continue;
            }
            let on_path = density_path && (k == 0 || k == 3);
            *block = self.noisy_child(children[k], min_level, on_path);
        }
        if mark {
            blocks[2] = blocks[1];
        }

        if self.key.qubits().binary_search(&level).is_ok() {
            for &channel in self.channels {
                apply_channel(self.package, channel, self.probability, &mut blocks);
            }
        }

        let rebuilt = if mark {
            self.package.make_density_node(level, blocks)
        } else {
            self.package.make_node(level, blocks)
        };
        rebuilt.scaled(aligned.weight)
    }

    fn noisy_child(&mut self, child: Edge, min_level: u32, density_path: bool) -> Edge {
        if child.is_zero() {
            return Edge::ZERO;
        }
        if !self.memoize {
            return self.apply_noise_effects(child, min_level, density_path);
        }
        if let Some(unit) = self.package.noise_table().lookup(child.node, &self.key) {
            return unit.scaled(child.weight);
        }
        let unit = self.apply_noise_effects(
            Edge::new(Complex64::new(1.0, 0.0), child.node),
            min_level,
            density_path,
        );
        self.package
            .noise_table()
            .insert(child.node, &self.key, unit);
        unit.scaled(child.weight)
    }
}

/// Apply each channel to each of `qubits`, in order, as `Σ K ρ K†`.
pub fn apply_noise_sequential(
    package: &mut Package,
    root: Edge,
    qubits: &[QubitId],
    channels: &[NoiseChannel],
    probability: f64,
) -> DdResult<Edge> {
    let mut rho = root;
    for &qubit in qubits {
        for &channel in channels {
            let mut sum = Edge::ZERO;
            for kraus in kraus_operators(channel, probability) {
                let k = package.make_gate_dd(&kraus, qubit)?;
                let k_dag = package.conjugate_transpose(k);
                let left = package.multiply(k, rho);
                let term = package.multiply(left, k_dag);
                sum = package.add(sum, term);
            }
            rho = sum;
        }
    }
    trace!(qubits = qubits.len(), channels = channels.len(), "applied sequential noise");
    Ok(rho)
}
