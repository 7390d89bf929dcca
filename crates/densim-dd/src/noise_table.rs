//! Memo table for noise propagation results.

use densim_ir::NoiseChannel;
use rustc_hash::FxHashMap;

use crate::edge::{Edge, NodeId};

/// Everything a noise result depends on besides the node: the sorted
/// touched-qubit set, the channel sequence and the probability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NoiseKey {
    qubits: Vec<u32>,
    channels: Vec<NoiseChannel>,
    probability_bits: u64,
}

impl NoiseKey {
    /// Create a key. `qubits` must already be sorted and deduplicated.
    pub fn new(qubits: Vec<u32>, channels: &[NoiseChannel], probability: f64) -> Self {
        debug_assert!(qubits.windows(2).all(|w| w[0] < w[1]), "qubits not sorted");
        Self {
            qubits,
            channels: channels.to_vec(),
            // -0.0 and 0.0 describe the same channel.
            probability_bits: (probability + 0.0).to_bits(),
        }
    }

    /// The touched qubits, ascending.
    pub fn qubits(&self) -> &[u32] {
        &self.qubits
    }

    /// The channels, in application order.
    pub fn channels(&self) -> &[NoiseChannel] {
        &self.channels
    }

    /// The shared channel probability.
    pub fn probability(&self) -> f64 {
        f64::from_bits(self.probability_bits)
    }
}

/// Results of noise propagation keyed by node and [`NoiseKey`].
///
/// Entries hold unit-weight results; callers scale them by the incoming
/// edge weight. Node handles are only stable until the next garbage
/// collection, which clears the table.
#[derive(Debug, Clone, Default)]
pub struct NoiseTable {
    entries: FxHashMap<NoiseKey, FxHashMap<NodeId, Edge>>,
    hits: u64,
    lookups: u64,
}

impl NoiseTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the cached result for `node` under `key`.
    pub fn lookup(&mut self, node: NodeId, key: &NoiseKey) -> Option<Edge> {
        self.lookups += 1;
        let found = self.entries.get(key).and_then(|m| m.get(&node)).copied();
        if found.is_some() {
            self.hits += 1;
        }
        found
    }

    /// Cache the unit-weight result for `node` under `key`.
    pub fn insert(&mut self, node: NodeId, key: &NoiseKey, result: Edge) {
        if let Some(per_key) = self.entries.get_mut(key) {
            per_key.insert(node, result);
        } else {
            let mut per_key = FxHashMap::default();
            per_key.insert(node, result);
            self.entries.insert(key.clone(), per_key);
        }
    }

    /// Number of cached results.
    pub fn len(&self) -> usize {
        self.entries.values().map(FxHashMap::len).sum()
    }

    /// Check if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// (hits, lookups) since construction.
    pub fn hit_counts(&self) -> (u64, u64) {
        (self.hits, self.lookups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    const AD: [NoiseChannel; 1] = [NoiseChannel::AmplitudeDamping];

    #[test]
    fn test_keyed_by_qubit_set() {
        let mut table = NoiseTable::new();
        let key = NoiseKey::new(vec![0, 2], &AD, 0.1);
        let result = Edge::new(Complex64::new(0.5, 0.0), NodeId(3));
        table.insert(NodeId(1), &key, result);

        assert_eq!(table.lookup(NodeId(1), &key), Some(result));
        assert_eq!(table.lookup(NodeId(1), &NoiseKey::new(vec![0], &AD, 0.1)), None);
        assert_eq!(table.lookup(NodeId(2), &key), None);
        assert_eq!(table.hit_counts(), (1, 3));
        assert_eq!(table.len(), 1);

        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.lookup(NodeId(1), &key), None);
    }

    #[test]
    fn test_keyed_by_channels_and_probability() {
        let mut table = NoiseTable::new();
        let key = NoiseKey::new(vec![0], &[NoiseChannel::PhaseFlip], 0.1);
        table.insert(NodeId(1), &key, Edge::ONE);

        let other_channel = NoiseKey::new(vec![0], &[NoiseChannel::Depolarization], 0.1);
        let other_p = NoiseKey::new(vec![0], &[NoiseChannel::PhaseFlip], 0.3);
        let reordered = NoiseKey::new(
            vec![0],
            &[NoiseChannel::PhaseFlip, NoiseChannel::Depolarization],
            0.1,
        );
        assert_eq!(table.lookup(NodeId(1), &other_channel), None);
        assert_eq!(table.lookup(NodeId(1), &other_p), None);
        assert_eq!(table.lookup(NodeId(1), &reordered), None);
        assert_eq!(table.lookup(NodeId(1), &key), Some(Edge::ONE));
        assert_eq!(key.probability(), 0.1);
        assert_eq!(key.qubits(), &[0]);
    }
}
