//! Node handles, weighted edges and diagram nodes.

use num_complex::Complex64;
use std::fmt;

use crate::complex::approx_zero;

/// Opaque handle to a node in a [`Package`](crate::Package) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The terminal node, representing the scalar 1.
    pub const TERMINAL: NodeId = NodeId(u32::MAX);

    /// Check if this is the terminal.
    #[inline]
    pub fn is_terminal(self) -> bool {
        self == Self::TERMINAL
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_terminal() {
            f.write_str("T")
        } else {
            write!(f, "n{}", self.0)
        }
    }
}

/// A weighted pointer to a node: the matrix it denotes is `weight` times
/// the node's matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// Complex scale factor.
    pub weight: Complex64,
    /// Target node.
    pub node: NodeId,
}

impl Edge {
    /// The zero matrix of any size.
    pub const ZERO: Edge = Edge {
        weight: Complex64::new(0.0, 0.0),
        node: NodeId::TERMINAL,
    };

    /// The scalar one.
    pub const ONE: Edge = Edge {
        weight: Complex64::new(1.0, 0.0),
        node: NodeId::TERMINAL,
    };

    /// Create an edge, collapsing near-zero weights to [`Edge::ZERO`].
    #[inline]
    pub fn new(weight: Complex64, node: NodeId) -> Self {
        if approx_zero(weight) {
            Self::ZERO
        } else {
            Self { weight, node }
        }
    }

    /// A terminal edge carrying `weight`.
    #[inline]
    pub fn terminal(weight: Complex64) -> Self {
        Self::new(weight, NodeId::TERMINAL)
    }

    /// Check if the weight is zero within tolerance.
    #[inline]
    pub fn is_zero(&self) -> bool {
        approx_zero(self.weight)
    }

    /// Check if the edge points at the terminal.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.node.is_terminal()
    }

    /// The same node with the weight multiplied by `factor`.
    #[inline]
    #[must_use]
    pub fn scaled(self, factor: Complex64) -> Self {
        Self::new(self.weight * factor, self.node)
    }

    /// The same node with weight `weight`.
    #[inline]
    #[must_use]
    pub fn with_weight(self, weight: Complex64) -> Self {
        Self::new(weight, self.node)
    }
}

/// A stored diagram node: the 2×2 block split `[[e0, e1], [e2, e3]]` of a
/// matrix over qubits `0..=level`.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) level: u32,
    pub(crate) children: [Edge; 4],
    pub(crate) density: bool,
    pub(crate) ref_count: u32,
    pub(crate) alive: bool,
}

impl Node {
    /// Qubit level of this node.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Stored children. For density-marked nodes child 2 mirrors child 1.
    pub fn stored_children(&self) -> &[Edge; 4] {
        &self.children
    }

    /// Check if this node carries the density marker.
    pub fn is_density(&self) -> bool {
        self.density
    }

    /// Number of references held on this node.
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }
}
