use crate::logic::types::VertexState;
use ahash::RandomState;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap};

pub type FastHasher = RandomState;
/// FastHashMap using ahash
pub type FastHashMap<K, V> = HashMap<K, V, FastHasher>;

/// Directed graph of vertex states. Edges carry no data, prices are looked up at valuation time.
#[derive(Debug, Clone, Default)]
pub struct ArbitrageGraph {
    pub graph: DiGraph<VertexState, (), usize>,
    // vertex key -> node index
    pub vertex_index: FastHashMap<String, NodeIndex<usize>>,
}

impl ArbitrageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_or_get_vertex(&mut self, vertex: VertexState) -> NodeIndex<usize> {
        if let Some(&idx) = self.vertex_index.get(vertex.key()) {
            return idx;
        }
        let key = vertex.key().to_string();
        let idx = self.graph.add_node(vertex);
        self.vertex_index.insert(key, idx);
        idx
    }

    /// Adds `from -> to` once. Both vertices are created on demand.
    pub fn add_edge(&mut self, from: VertexState, to: VertexState) {
        let from_idx = self.add_or_get_vertex(from);
        let to_idx = self.add_or_get_vertex(to);
        self.graph.update_edge(from_idx, to_idx, ());
    }

    pub fn vertex(&self, idx: NodeIndex<usize>) -> Option<&VertexState> {
        self.graph.node_weight(idx)
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_vertex(&self, key: &str) -> bool {
        self.vertex_index.contains_key(key)
    }

    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        match (self.vertex_index.get(from), self.vertex_index.get(to)) {
            (Some(&from), Some(&to)) => self.graph.contains_edge(from, to),
            _ => false,
        }
    }

    /// All edges as `(from_key, to_key)`, independent of insertion order.
    pub fn edge_set(&self) -> BTreeSet<(String, String)> {
        self.graph
            .edge_indices()
            .filter_map(|edge| self.graph.edge_endpoints(edge))
            .map(|(from, to)| (self.graph[from].key().to_string(), self.graph[to].key().to_string()))
            .collect()
    }
}
