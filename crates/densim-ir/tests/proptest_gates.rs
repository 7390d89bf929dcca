//! Property-based checks on gate matrices and noise channel strings.

use densim_ir::{NoiseChannels, StandardGate};
use num_complex::Complex64;
use proptest::prelude::*;

fn is_unitary(matrix: &[Complex64]) -> bool {
    let dim = (matrix.len() as f64).sqrt() as usize;
    (0..dim).all(|r| {
        (0..dim).all(|c| {
            let dot: Complex64 = (0..dim)
                .map(|k| matrix[r * dim + k] * matrix[c * dim + k].conj())
                .sum();
            let expected = if r == c { 1.0 } else { 0.0 };
            (dot - Complex64::new(expected, 0.0)).norm() < 1e-12
        })
    })
}

fn arb_angle() -> impl Strategy<Value = f64> {
    -10.0..10.0_f64
}

fn arb_parameterized_gate() -> impl Strategy<Value = StandardGate> {
    prop_oneof![
        arb_angle().prop_map(StandardGate::Rx),
        arb_angle().prop_map(StandardGate::Ry),
        arb_angle().prop_map(StandardGate::Rz),
        arb_angle().prop_map(StandardGate::P),
        (arb_angle(), arb_angle(), arb_angle()).prop_map(|(a, b, c)| StandardGate::U(a, b, c)),
        (arb_angle(), arb_angle()).prop_map(|(a, b)| StandardGate::PRX(a, b)),
        arb_angle().prop_map(StandardGate::RXX),
        arb_angle().prop_map(StandardGate::RYY),
        arb_angle().prop_map(StandardGate::RZZ),
    ]
}

proptest! {
    #[test]
    fn parameterized_gates_are_unitary(gate in arb_parameterized_gate()) {
        let matrix = gate.matrix();
        prop_assert_eq!(matrix.len(), 1 << (2 * gate.num_qubits()));
        prop_assert!(is_unitary(&matrix), "{} is not unitary", gate.name());
    }

    #[test]
    fn channel_strings_roundtrip(letters in "[APD]{0,6}") {
        let channels: NoiseChannels = letters.parse().unwrap();
        prop_assert_eq!(channels.to_string(), letters);
    }

    #[test]
    fn unknown_letters_are_rejected(letters in "[APD]{0,3}[BCE-OQ-Z][APD]{0,3}") {
        prop_assert!(letters.parse::<NoiseChannels>().is_err());
    }
}

#[test]
fn fixed_gates_are_unitary() {
    for gate in [
        StandardGate::I,
        StandardGate::X,
        StandardGate::Y,
        StandardGate::Z,
        StandardGate::H,
        StandardGate::S,
        StandardGate::Sdg,
        StandardGate::T,
        StandardGate::Tdg,
        StandardGate::SX,
        StandardGate::SXdg,
        StandardGate::Swap,
        StandardGate::ISwap,
    ] {
        assert!(is_unitary(&gate.matrix()), "{}", gate.name());
    }
}
