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

use tracing::{info, warn};

use crate::analysis::{DependencyResolver, SourceIndex};
use crate::config::{LoaderConfig, short_name};
use crate::discovery::{ModuleDescriptor, ModuleDiscoverer};
use crate::error::ConfigError;
use crate::graph::{CycleError, DependencyGraph, TierPolicy, priority_sort, topological_sort};

/// Discovery, analysis and sorting, without importing anything.
#[derive(Debug, Clone)]
pub struct LoadPlan {
    pub package_id: String,
    pub descriptors: Vec<ModuleDescriptor>,
    pub index: SourceIndex,
    pub graph: DependencyGraph,
    /// Total over `descriptors`
    pub order: Vec<String>,
    /// Present when `order` is the tier fallback
    pub cycle: Option<CycleError>,
}

impl LoadPlan {
    pub fn prepare(config: &LoaderConfig, resolver: &DependencyResolver, policy: &dyn TierPolicy) -> Result<Self, ConfigError> {
        config.validate()?;
        let package_id = config.resolve_package_id()?;
        let patterns = config.compile_patterns(&package_id)?;

        info!(category = "init", "Initializing {}", package_id);
        info!(category = "init", "Patterns: {:?}", patterns.as_strs());

        let descriptors = ModuleDiscoverer::new(&config.root, &patterns, &config.source_extension).discover();
        info!(category = "discover", "Found {} modules", descriptors.len());

        let index = SourceIndex::build(&descriptors);
        let graph = resolver.resolve(&index);
        info!(category = "analyze", "{} dependency edges", graph.edge_count());

        let (order, cycle) = match topological_sort(&graph) {
            Ok(order) => (order, None),
            Err(cycle) => {
                let members: Vec<&str> = cycle.remaining.iter().map(|m| short_name(&package_id, m)).collect();
                warn!(category = "sort", "Circular dependency: {}; falling back to layer priority", members.join(", "));
                let discovered: Vec<String> = descriptors.iter().map(|d| d.name.clone()).collect();
                (priority_sort(&discovered, &package_id, policy), Some(cycle))
            }
        };

        Ok(Self {
            package_id,
            descriptors,
            index,
            graph,
            order,
            cycle,
        })
    }

    pub fn short_name<'a>(&self, module: &'a str) -> &'a str {
        short_name(&self.package_id, module)
    }
}
