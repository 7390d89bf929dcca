//! Fixed operators the simulator builds directly: the initial state, the
//! measurement projectors, and the Kraus operators of each noise channel.

use densim_dd::{Edge, Package};
use densim_ir::NoiseChannel;
use num_complex::Complex64;

/// `|0…0⟩⟨0…0|` over the lowest `num_qubits` levels.
pub fn make_zero_density_operator(package: &mut Package, num_qubits: u32) -> Edge {
    let mut edge = Edge::ONE;
    for level in 0..num_qubits {
        edge = package.make_node(level, [edge, Edge::ZERO, Edge::ZERO, Edge::ZERO]);
    }
    edge
}

/// Projector onto `outcome` for qubit `index`, identity on every other qubit.
pub fn make_projector(package: &mut Package, num_qubits: u32, index: u32, outcome: bool) -> Edge {
    let mut f = Edge::ONE;
    for level in 0..num_qubits {
        let blocks = if level != index {
            [f, Edge::ZERO, Edge::ZERO, f]
        } else if outcome {
            [Edge::ZERO, Edge::ZERO, Edge::ZERO, f]
        } else {
            [f, Edge::ZERO, Edge::ZERO, Edge::ZERO]
        };
        f = package.make_node(level, blocks);
    }
    f
}

/// Kraus operators (row-major 2×2) of a channel at probability `p`.
///
/// Amplitude damping uses the decay rate `γ = 2p`, so `p` must not exceed
/// one half for it.
pub fn kraus_operators(channel: NoiseChannel, p: f64) -> Vec<[Complex64; 4]> {
    let r = |x: f64| Complex64::new(x, 0.0);
    let zero = r(0.0);
    match channel {
        NoiseChannel::PhaseFlip => {
            let a = (1.0 - p).sqrt();
            let b = p.sqrt();
            vec![[r(a), zero, zero, r(a)], [r(b), zero, zero, r(-b)]]
        }
        NoiseChannel::AmplitudeDamping => {
            let gamma = 2.0 * p;
            vec![
                [r(1.0), zero, zero, r((1.0 - gamma).sqrt())],
                [zero, r(gamma.sqrt()), zero, zero],
            ]
        }
        NoiseChannel::Depolarization => {
            let a = (1.0 - 0.75 * p).sqrt();
            let b = (0.25 * p).sqrt();
            let i = Complex64::new(0.0, b);
            vec![
                [r(a), zero, zero, r(a)],
                [zero, r(b), r(b), zero],
                [r(b), zero, zero, r(-b)],
                [zero, -i, i, zero],
            ]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn test_zero_density_operator() {
        let mut pkg = Package::new(3);
        let rho = make_zero_density_operator(&mut pkg, 3);
        assert_eq!(pkg.level(rho), Some(2));
        assert_eq!(pkg.live_nodes(), 3);
        assert!((pkg.get_entry(rho, 0, 0) - c(1.0, 0.0)).norm() < 1e-15);
        for r in 0..8 {
            for col in 0..8 {
                if (r, col) != (0, 0) {
                    assert_eq!(pkg.get_entry(rho, r, col), c(0.0, 0.0));
                }
            }
        }
        assert_eq!(make_zero_density_operator(&mut pkg, 0), Edge::ONE);
    }

    #[test]
    fn test_projector() {
        let mut pkg = Package::new(2);
        let p1 = make_projector(&mut pkg, 2, 1, true);
        // Diagonal 1 on basis states with q1 = 1 (indices 2 and 3).
        let diag: Vec<f64> = (0..4).map(|i| pkg.get_entry(p1, i, i).re).collect();
        assert_eq!(diag, vec![0.0, 0.0, 1.0, 1.0]);

        let p0 = make_projector(&mut pkg, 2, 0, false);
        let diag: Vec<f64> = (0..4).map(|i| pkg.get_entry(p0, i, i).re).collect();
        assert_eq!(diag, vec![1.0, 0.0, 1.0, 0.0]);
        assert_eq!(pkg.get_entry(p0, 0, 2), c(0.0, 0.0));
    }

    #[test]
    fn test_kraus_completeness() {
        let channels = [
            NoiseChannel::PhaseFlip,
            NoiseChannel::AmplitudeDamping,
            NoiseChannel::Depolarization,
        ];
        for channel in channels {
            for p in [0.0, 0.05, 0.3, 0.5] {
                // Σ K†K = I
                let mut sum = [c(0.0, 0.0); 4];
                for k in kraus_operators(channel, p) {
                    for i in 0..2 {
                        for j in 0..2 {
                            for m in 0..2 {
                                sum[i * 2 + j] += k[m * 2 + i].conj() * k[m * 2 + j];
                            }
                        }
                    }
                }
                let id = [c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(1.0, 0.0)];
                for (s, e) in sum.iter().zip(id) {
                    assert!((s - e).norm() < 1e-12, "{channel} at p={p}: {sum:?}");
                }
            }
        }
    }

    #[test]
    fn test_kraus_counts() {
        assert_eq!(kraus_operators(NoiseChannel::PhaseFlip, 0.1).len(), 2);
        assert_eq!(kraus_operators(NoiseChannel::AmplitudeDamping, 0.1).len(), 2);
        assert_eq!(kraus_operators(NoiseChannel::Depolarization, 0.1).len(), 4);
    }
}
