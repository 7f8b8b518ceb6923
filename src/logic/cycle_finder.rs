use super::graph::{ArbitrageGraph, FastHashMap};
use super::types::{Cycle, ScanError, VertexState};
use crate::utils::CancelToken;
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Shortest route the finder reports. Two step round trips are not arbitrage cycles.
pub const MIN_CYCLE_LENGTH: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct CycleSearch {
    /// Sorted by vertex key sequence.
    pub cycles: Vec<Cycle>,
    /// The search stopped at `max_cycles`.
    pub truncated: bool,
}

/// Bounded length simple cycle enumeration.
///
/// Every cycle is found exactly once, from its vertex with the smallest key: the DFS from a start
/// vertex only steps onto vertices ranked above it. Vertices in different strongly connected
/// components can never share a cycle, so the search never crosses components.
pub struct CycleFinder {
    max_length: usize,
    max_cycles: usize,
}

impl CycleFinder {
    pub fn new(max_length: usize, max_cycles: usize) -> Self {
        Self { max_length, max_cycles }
    }

    pub fn find_cycles(&self, graph: &ArbitrageGraph, cancel: Option<&CancelToken>) -> Result<CycleSearch, ScanError> {
        let mut search = CycleSearch::default();
        if self.max_length < MIN_CYCLE_LENGTH || graph.vertex_count() < MIN_CYCLE_LENGTH {
            return Ok(search);
        }

        let mut order: Vec<NodeIndex<usize>> = graph.graph.node_indices().collect();
        order.sort_by(|a, b| graph.graph[*a].key().cmp(graph.graph[*b].key()));
        let rank: FastHashMap<NodeIndex<usize>, usize> = order.iter().enumerate().map(|(r, idx)| (*idx, r)).collect();

        let mut component: HashMap<NodeIndex<usize>, usize> = HashMap::with_capacity(order.len());
        for (id, members) in tarjan_scc(&graph.graph).into_iter().enumerate() {
            for idx in members {
                component.insert(idx, id);
            }
        }

        let mut path = Vec::with_capacity(self.max_length);
        let mut on_path = vec![false; graph.graph.node_count()];
        for start in &order {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return Err(ScanError::Cancelled);
            }
            path.clear();
            path.push(*start);
            on_path[start.index()] = true;
            let ctx = SearchContext { graph, rank: &rank, component: &component, start: *start };
            let complete = self.extend(&ctx, &mut path, &mut on_path, &mut search.cycles);
            on_path[start.index()] = false;
            if !complete {
                search.truncated = true;
                warn!(limit = self.max_cycles, "Cycle limit exceeded, stopping enumeration");
                break;
            }
        }

        search.cycles.sort();
        search.cycles.truncate(self.max_cycles);
        debug!(cycles = search.cycles.len(), max_length = self.max_length, "Cycle enumeration complete");
        Ok(search)
    }

    /// Returns false once more than `max_cycles` cycles exist.
    fn extend(&self, ctx: &SearchContext<'_>, path: &mut Vec<NodeIndex<usize>>, on_path: &mut [bool], cycles: &mut Vec<Cycle>) -> bool {
        let Some(&current) = path.last() else {
            return true;
        };
        let start_rank = ctx.rank[&ctx.start];
        let start_component = ctx.component.get(&ctx.start);

        for next in ctx.graph.graph.neighbors(current) {
            if next == ctx.start {
                if path.len() >= MIN_CYCLE_LENGTH {
                    let vertices: Vec<VertexState> = path.iter().map(|idx| ctx.graph.graph[*idx].clone()).collect();
                    cycles.push(Cycle::new(vertices));
                    if cycles.len() > self.max_cycles {
                        return false;
                    }
                }
                continue;
            }
            if on_path[next.index()] || ctx.rank[&next] < start_rank || ctx.component.get(&next) != start_component {
                continue;
            }
            if path.len() >= self.max_length {
                continue;
            }
            path.push(next);
            on_path[next.index()] = true;
            let complete = self.extend(ctx, path, on_path, cycles);
            on_path[next.index()] = false;
            path.pop();
            if !complete {
                return false;
            }
        }
        true
    }
}

struct SearchContext<'a> {
    graph: &'a ArbitrageGraph,
    rank: &'a FastHashMap<NodeIndex<usize>, usize>,
    component: &'a HashMap<NodeIndex<usize>, usize>,
    start: NodeIndex<usize>,
}

/// All simple cycles of length 3 to `max_length`, sorted by vertex key sequence.
pub fn find_cycles(graph: &ArbitrageGraph, max_length: usize) -> Vec<Cycle> {
    CycleFinder::new(max_length, usize::MAX).find_cycles(graph, None).map(|search| search.cycles).unwrap_or_default()
}
