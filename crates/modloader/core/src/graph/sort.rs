// Modloader
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::VecDeque;
use thiserror::Error;

use super::DependencyGraph;

/// The graph has no total order.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("circular dependency among modules: {}", .remaining.join(", "))]
pub struct CycleError {
    /// Every module left unordered, in discovery order
    pub remaining: Vec<String>,
    /// Strongly connected components responsible for the cycle
    pub cycles: Vec<Vec<String>>,
}

/// Kahn's algorithm over `graph`.
///
/// Nodes released in the same step enter the queue in discovery order, so the
/// result only depends on insertion order, never on hashing.
pub fn topological_sort(graph: &DependencyGraph) -> Result<Vec<String>, CycleError> {
    let inner = graph.inner();
    let mut in_degree: Vec<usize> = inner.node_indices().map(|n| inner.edges_directed(n, Direction::Incoming).count()).collect();
    let mut queue: VecDeque<NodeIndex> = inner.node_indices().filter(|n| in_degree[n.index()] == 0).collect();
    let mut order = Vec::with_capacity(inner.node_count());

    while let Some(node) = queue.pop_front() {
        order.push(inner[node].clone());

        let mut released: Vec<NodeIndex> = Vec::new();
        for edge in inner.edges_directed(node, Direction::Outgoing) {
            let target = edge.target();
            in_degree[target.index()] -= 1;
            if in_degree[target.index()] == 0 {
                released.push(target);
            }
        }
        released.sort();
        queue.extend(released);
    }

    if order.len() == inner.node_count() {
        return Ok(order);
    }

    let remaining = inner.node_indices().filter(|n| in_degree[n.index()] > 0).map(|n| inner[n].clone()).collect();

    let mut components: Vec<Vec<NodeIndex>> = tarjan_scc(inner).into_iter().filter(|scc| scc.len() > 1).collect();
    for component in &mut components {
        component.sort();
    }
    components.sort();
    let cycles = components.into_iter().map(|scc| scc.into_iter().map(|n| inner[n].clone()).collect()).collect();

    Err(CycleError { remaining, cycles })
}
