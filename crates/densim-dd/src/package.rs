//! The node arena, unique table and reference-counted garbage collector.

use num_complex::Complex64;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::debug;

use crate::complex::{ComplexCache, ComplexTable, Scratch};
use crate::edge::{Edge, Node, NodeId};
use crate::noise_table::NoiseTable;
use crate::ops::ComputeTables;

/// Live-node count that triggers the first collection.
pub const INITIAL_GC_LIMIT: usize = 131_072;

/// Children whose phase may become the node's phase, in priority order:
/// diagonal blocks first, so positive semidefinite blocks keep real weights.
const LEAD_ORDER: [usize; 4] = [0, 3, 1, 2];

/// Smallest magnitude, relative to the largest child, a lead child may have.
const LEAD_RATIO: f64 = 1e-6;

/// Hash key of a canonical node: level, marker and the exact bits of the
/// (already canonicalized) child weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeKey {
    level: u32,
    density: bool,
    children: [(u64, u64, NodeId); 4],
}

impl NodeKey {
    fn new(level: u32, density: bool, children: &[Edge; 4]) -> Self {
        Self {
            level,
            density,
            children: children.map(|e| (e.weight.re.to_bits(), e.weight.im.to_bits(), e.node)),
        }
    }
}

/// Counters describing the package's tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Statistics {
    /// Nodes currently allocated.
    pub live_nodes: usize,
    /// Highest number of nodes allocated at once.
    pub peak_nodes: usize,
    /// Unique-table lookups that found an existing node.
    pub unique_hits: u64,
    /// Unique-table lookups.
    pub unique_lookups: u64,
    /// Compute-table lookups that found a result.
    pub compute_hits: u64,
    /// Compute-table lookups.
    pub compute_lookups: u64,
    /// Noise-table lookups that found a result.
    pub noise_hits: u64,
    /// Noise-table lookups.
    pub noise_lookups: u64,
    /// Distinct real components in the complex table.
    pub complex_values: usize,
    /// Completed garbage collections.
    pub gc_runs: u64,
    /// Nodes released by garbage collection.
    pub nodes_freed: u64,
}

/// Owner of every node of one simulation.
///
/// Nodes are hash-consed: building a node whose normalized children match an
/// existing node returns that node. A node stays allocated until a
/// collection finds it unreferenced; [`Edge`]s handed out by the package are
/// only valid until then unless a reference is held via [`Package::inc_ref`].
#[derive(Debug)]
pub struct Package {
    num_qubits: u32,
    pub(crate) nodes: Vec<Node>,
    free: Vec<u32>,
    unique: FxHashMap<NodeKey, NodeId>,
    pub(crate) complex: ComplexTable,
    cache: ComplexCache,
    pub(crate) compute: ComputeTables,
    pub(crate) ident: Vec<Edge>,
    noise: NoiseTable,
    gc_limit: usize,
    pub(crate) stats: Statistics,
}

impl Package {
    /// Create a package for `num_qubits` qubits.
    pub fn new(num_qubits: u32) -> Self {
        Self::with_gc_limit(num_qubits, INITIAL_GC_LIMIT)
    }

    /// Create a package with a custom initial collection threshold.
    pub fn with_gc_limit(num_qubits: u32, gc_limit: usize) -> Self {
        Self {
            num_qubits,
            nodes: Vec::new(),
            free: Vec::new(),
            unique: FxHashMap::default(),
            complex: ComplexTable::new(),
            cache: ComplexCache::new(),
            compute: ComputeTables::default(),
            ident: vec![Edge::ONE],
            noise: NoiseTable::new(),
            gc_limit: gc_limit.max(1),
            stats: Statistics::default(),
        }
    }

    /// Number of qubits this package builds operators for.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Number of allocated nodes.
    pub fn live_nodes(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Current collection threshold.
    pub fn gc_limit(&self) -> usize {
        self.gc_limit
    }

    /// Access a node by handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` is the terminal or was never allocated.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Level of the node an edge points to, `None` for terminal edges.
    pub fn level(&self, edge: Edge) -> Option<u32> {
        if edge.is_terminal() {
            None
        } else {
            Some(self.nodes[edge.node.index()].level)
        }
    }

    // =========================================================================
    // Node construction
    // =========================================================================

    /// Build (or find) the canonical node with the given children.
    ///
    /// Children are divided by their largest magnitude, which becomes the
    /// returned edge's weight. Returns [`Edge::ZERO`] if every child is zero.
    pub fn make_node(&mut self, level: u32, children: [Edge; 4]) -> Edge {
        self.build(level, children, false)
    }

    /// Build a density-marked node. Child 2 is replaced by a verbatim copy of
    /// child 1; readers reconstruct the lower-left block as its conjugate
    /// transpose.
    pub fn make_density_node(&mut self, level: u32, children: [Edge; 4]) -> Edge {
        self.build(level, children, true)
    }

    fn build(&mut self, level: u32, mut children: [Edge; 4], density: bool) -> Edge {
        if density {
            children[2] = children[1];
        }
        for child in &mut children {
            if child.is_zero() {
                *child = Edge::ZERO;
            }
        }
        if children.iter().all(Edge::is_zero) {
            return Edge::ZERO;
        }
        debug_assert!(
            children
                .iter()
                .all(|c| c.is_zero() || self.level(*c) == level.checked_sub(1)),
            "children of a level-{level} node must sit at level {}",
            level.wrapping_sub(1)
        );

        let magnitude = children
            .iter()
            .map(|c| c.weight.norm())
            .fold(0.0_f64, f64::max);
        let divisor = if density {
            Complex64::new(magnitude, 0.0)
        } else {
            let lead = LEAD_ORDER
                .iter()
                .map(|&k| children[k].weight)
                .find(|w| w.norm() >= magnitude * LEAD_RATIO)
                .unwrap_or(Complex64::new(magnitude, 0.0));
            lead / lead.norm() * magnitude
        };
        let inv = divisor.inv();
        for child in &mut children {
            if !child.is_zero() {
                let weight = self.complex.lookup(child.weight * inv);
                *child = Edge::new(weight, child.node);
            }
        }

        let key = NodeKey::new(level, density, &children);
        self.stats.unique_lookups += 1;
        let id = match self.unique.get(&key) {
            Some(&id) => {
                self.stats.unique_hits += 1;
                id
            }
            None => {
                let id = self.allocate(Node {
                    level,
                    children,
                    density,
                    ref_count: 0,
                    alive: true,
                });
                self.unique.insert(key, id);
                id
            }
        };
        Edge {
            weight: divisor,
            node: id,
        }
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        let id = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx as usize] = node;
                NodeId(idx)
            }
            None => {
                debug_assert!(self.nodes.len() < u32::MAX as usize, "node arena exhausted");
                self.nodes.push(node);
                NodeId((self.nodes.len() - 1) as u32)
            }
        };
        self.stats.peak_nodes = self.stats.peak_nodes.max(self.live_nodes());
        id
    }

    /// The four blocks of a node's matrix with the lower-left block made
    /// explicit for density-marked nodes.
    pub fn children(&mut self, id: NodeId) -> [Edge; 4] {
        let (mut children, density) = {
            let node = &self.nodes[id.index()];
            (node.children, node.density)
        };
        if density {
            children[2] = self.conjugate_transpose(children[1]);
        }
        children
    }

    // =========================================================================
    // Density marker
    // =========================================================================

    /// Check if the edge's node carries the density marker.
    pub fn is_density(&self, edge: Edge) -> bool {
        !edge.is_terminal() && self.nodes[edge.node.index()].density
    }

    /// Return an equivalent edge whose top node is unmarked.
    ///
    /// The shared marked node is left untouched. Unmarked and terminal edges
    /// are returned unchanged, so aligning twice is the same as aligning once.
    pub fn align(&mut self, edge: Edge) -> Edge {
        if !self.is_density(edge) {
            return edge;
        }
        let level = self.nodes[edge.node.index()].level;
        let children = self.children(edge.node);
        self.make_node(level, children).scaled(edge.weight)
    }

    /// Mark the top node of a Hermitian matrix, dropping its explicit
    /// lower-left block in favour of the mirrored upper-right one.
    ///
    /// The edge value must be Hermitian; its node alone need not be, since
    /// the edge weight may carry a phase.
    pub fn set_density_marker(&mut self, edge: Edge) -> Edge {
        if edge.is_terminal() || self.is_density(edge) {
            return edge;
        }
        let (level, children) = {
            let node = &self.nodes[edge.node.index()];
            (node.level, node.children)
        };
        let blocks = children.map(|c| c.scaled(edge.weight));
        self.make_density_node(level, blocks)
    }

    // =========================================================================
    // Reference counting and garbage collection
    // =========================================================================

    /// Take a reference on the edge's node. The first reference on a node
    /// also references its children.
    pub fn inc_ref(&mut self, edge: Edge) {
        if edge.is_terminal() {
            return;
        }
        let node = &mut self.nodes[edge.node.index()];
        node.ref_count = node.ref_count.saturating_add(1);
        if node.ref_count == 1 {
            let children = node.children;
            for child in children {
                self.inc_ref(child);
            }
        }
    }

    /// Release a reference taken with [`Package::inc_ref`].
    pub fn dec_ref(&mut self, edge: Edge) {
        if edge.is_terminal() {
            return;
        }
        let node = &mut self.nodes[edge.node.index()];
        debug_assert!(node.ref_count > 0, "dec_ref on unreferenced node {}", edge.node);
        if node.ref_count == 0 {
            return;
        }
        node.ref_count -= 1;
        if node.ref_count == 0 {
            let children = node.children;
            for child in children {
                self.dec_ref(child);
            }
        }
    }

    /// Free every unreferenced node once the live-node count has reached the
    /// collection threshold (always when `force` is set). Clears every memo
    /// table and rebuilds the complex table. Returns the number of freed
    /// nodes.
    pub fn garbage_collect(&mut self, force: bool) -> usize {
        let live = self.live_nodes();
        if !force && live < self.gc_limit {
            return 0;
        }

        let mut freed = 0;
        for idx in 0..self.nodes.len() {
            let node = &self.nodes[idx];
            if node.alive && node.ref_count == 0 {
                let key = NodeKey::new(node.level, node.density, &node.children);
                self.unique.remove(&key);
                self.nodes[idx].alive = false;
                self.free.push(idx as u32);
                freed += 1;
            }
        }

        self.compute.clear();
        self.ident.truncate(1);
        self.noise.clear();
        self.complex.rebuild(
            self.nodes
                .iter()
                .filter(|n| n.alive)
                .flat_map(|n| n.children.iter().map(|c| c.weight)),
        );

        let remaining = self.live_nodes();
        if remaining * 2 > self.gc_limit {
            self.gc_limit *= 2;
        }
        self.stats.gc_runs += 1;
        self.stats.nodes_freed += freed as u64;
        debug!(
            freed,
            remaining,
            limit = self.gc_limit,
            force,
            "garbage collection"
        );
        freed
    }

    // =========================================================================
    // Complex values
    // =========================================================================

    /// Canonicalize a complex value through the complex table.
    pub fn lookup(&mut self, value: Complex64) -> Complex64 {
        self.complex.lookup(value)
    }

    /// Check out a scoped temporary from the scratch cache.
    pub fn scratch(&self, value: Complex64) -> Scratch {
        self.cache.scratch(value)
    }

    /// Number of scratch values currently checked out.
    pub fn occupancy(&self) -> usize {
        self.cache.occupancy()
    }

    /// The scratch cache itself.
    pub fn cache(&self) -> &ComplexCache {
        &self.cache
    }

    /// The noise memo table.
    pub fn noise_table(&mut self) -> &mut NoiseTable {
        &mut self.noise
    }

    /// Snapshot of table counters.
    pub fn statistics(&self) -> Statistics {
        let (noise_hits, noise_lookups) = self.noise.hit_counts();
        Statistics {
            live_nodes: self.live_nodes(),
            complex_values: self.complex.len(),
            noise_hits,
            noise_lookups,
            ..self.stats
        }
    }

    /// Read the matrix entry at (`row`, `col`). Bit `q` of each index selects
    /// the block at level `q`.
    pub fn get_entry(&mut self, edge: Edge, row: usize, col: usize) -> Complex64 {
        let mut value = edge.weight;
        let mut current = edge;
        while !current.is_terminal() {
            let level = self.nodes[current.node.index()].level;
            let children = self.children(current.node);
            let i = (row >> level) & 1;
            let j = (col >> level) & 1;
            current = children[i * 2 + j];
            value *= current.weight;
        }
        value
    }
}
