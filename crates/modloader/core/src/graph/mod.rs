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

//! Module dependency graph.
//!
//! Edges point from prerequisite to dependent, so the outgoing neighbours of
//! a module are the modules that must load after it. Node indices follow
//! discovery order and are never removed, which the sorter relies on for its
//! tie-break.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::HashMap;

pub mod fallback;
pub mod sort;

pub use fallback::{PrefixTierPolicy, Tier, TierPolicy, priority_sort};
pub use sort::{CycleError, topological_sort};

/// Where a dependency edge was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EdgeSource {
    Import,
    ComponentReference,
}

/// "`prerequisite` loads before `dependent`"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    pub prerequisite: String,
    pub dependent: String,
    pub source: EdgeSource,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, EdgeSource>,
    node_indices: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph containing every module as a node, in the given order.
    pub fn from_modules<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut graph = Self::new();
        for module in modules {
            graph.add_module(module.as_ref());
        }
        graph
    }

    /// Adds a module if not present and returns its node.
    pub fn add_module(&mut self, module: &str) -> NodeIndex {
        if let Some(&index) = self.node_indices.get(module) {
            return index;
        }

        let index = self.graph.add_node(module.to_string());
        self.node_indices.insert(module.to_string(), index);
        index
    }

    pub fn contains(&self, module: &str) -> bool {
        self.node_indices.contains_key(module)
    }

    /// Records that `dependent` must load after `prerequisite`.
    ///
    /// Returns `false` and leaves the graph untouched when either endpoint is
    /// unknown, when both are the same module, or when the edge already exists.
    pub fn add_dependency(&mut self, prerequisite: &str, dependent: &str, source: EdgeSource) -> bool {
        let (Some(&from), Some(&to)) = (self.node_indices.get(prerequisite), self.node_indices.get(dependent)) else {
            return false;
        };
        if from == to || self.graph.find_edge(from, to).is_some() {
            return false;
        }

        self.graph.add_edge(from, to, source);
        true
    }

    pub fn module_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Modules in discovery order.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.graph.node_indices().map(|index| self.graph[index].as_str())
    }

    /// Modules that must load before `module`.
    pub fn dependencies(&self, module: &str) -> Vec<String> {
        self.neighbors(module, Direction::Incoming)
    }

    /// Modules that must load after `module`.
    pub fn dependents(&self, module: &str) -> Vec<String> {
        self.neighbors(module, Direction::Outgoing)
    }

    pub fn edges(&self) -> Vec<DependencyEdge> {
        self.graph
            .edge_references()
            .map(|edge| DependencyEdge {
                prerequisite: self.graph[edge.source()].clone(),
                dependent: self.graph[edge.target()].clone(),
                source: *edge.weight(),
            })
            .collect()
    }

    pub(crate) fn inner(&self) -> &DiGraph<String, EdgeSource> {
        &self.graph
    }

    fn neighbors(&self, module: &str, direction: Direction) -> Vec<String> {
        let Some(&index) = self.node_indices.get(module) else {
            return Vec::new();
        };
        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors_directed(index, direction).collect();
        neighbors.sort();
        neighbors.into_iter().map(|n| self.graph[n].clone()).collect()
    }
}
