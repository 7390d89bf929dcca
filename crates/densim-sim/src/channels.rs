//! Closed-form channel updates on the four blocks of one level.
//!
//! A node at the level of a noisy qubit splits the density matrix into
//! `[[ρ00, ρ01], [ρ10, ρ11]]`. Each single-qubit channel maps those blocks to
//! linear combinations of themselves, so it can be applied without
//! multiplying full operators.

use densim_dd::{Edge, Package};
use densim_ir::NoiseChannel;
use num_complex::Complex64;

/// Rewrite `blocks` in place with `channel` at probability `p`.
pub(crate) fn apply_channel(
    package: &mut Package,
    channel: NoiseChannel,
    p: f64,
    blocks: &mut [Edge; 4],
) {
    match channel {
        NoiseChannel::PhaseFlip => {
            let keep = package.scratch(real(1.0 - 2.0 * p));
            blocks[1] = blocks[1].scaled(*keep);
            blocks[2] = blocks[2].scaled(*keep);
        }
        NoiseChannel::AmplitudeDamping => {
            let gamma = 2.0 * p;
            let decay = package.scratch(real(gamma));
            let coherence = package.scratch(real((1.0 - gamma).sqrt()));
            let survive = package.scratch(real(1.0 - gamma));
            let [e0, e1, e2, e3] = *blocks;
            *blocks = [
                combine(package, e0, real(1.0), e3, *decay),
                e1.scaled(*coherence),
                e2.scaled(*coherence),
                e3.scaled(*survive),
            ];
        }
        NoiseChannel::Depolarization => {
            let stay = package.scratch(real((2.0 - p) / 2.0));
            let mix = package.scratch(real(p / 2.0));
            let coherence = package.scratch(real(1.0 - p));
            let [a, e1, e2, d] = *blocks;
            *blocks = [
                combine(package, a, *stay, d, *mix),
                e1.scaled(*coherence),
                e2.scaled(*coherence),
                combine(package, a, *mix, d, *stay),
            ];
        }
    }
}

#[inline]
fn real(x: f64) -> Complex64 {
    Complex64::new(x, 0.0)
}

/// `fx·x + fy·y`, skipping zero terms.
fn combine(package: &mut Package, x: Edge, fx: Complex64, y: Edge, fy: Complex64) -> Edge {
    let x = x.scaled(fx);
    let y = y.scaled(fy);
    match (x.is_zero(), y.is_zero()) {
        (true, _) => y,
        (_, true) => x,
        _ => package.add(x, y),
    }
}
