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

use super::{DependencyDetectionStrategy, SourceIndex};
use crate::graph::{DependencyGraph, EdgeSource};

/// Edges from imports that run at load time.
pub struct ImportDetectionStrategy;

impl DependencyDetectionStrategy for ImportDetectionStrategy {
    fn name(&self) -> &'static str {
        "import"
    }

    fn detect_dependencies(&self, index: &SourceIndex, graph: &mut DependencyGraph) -> usize {
        let mut added = 0;
        for source in index.sources() {
            for target in source.load_dependencies() {
                if graph.add_dependency(target, &source.name, EdgeSource::Import) {
                    added += 1;
                }
            }
        }
        added
    }
}

/// Edges from component link fields pointing into other modules.
pub struct ComponentReferenceStrategy;

impl DependencyDetectionStrategy for ComponentReferenceStrategy {
    fn name(&self) -> &'static str {
        "component reference"
    }

    fn detect_dependencies(&self, index: &SourceIndex, graph: &mut DependencyGraph) -> usize {
        let mut added = 0;
        for source in index.sources() {
            for component in &source.components {
                for owner in component.foreign_modules() {
                    if graph.add_dependency(owner, &source.name, EdgeSource::ComponentReference) {
                        added += 1;
                    }
                }
            }
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_strategy_skips_deferred_imports() {
        let index = SourceIndex::from_sources([
            ("pkg.x", false, "import pkg.y;"),
            ("pkg.y", false, ""),
            ("pkg.z", false, "fn f() { import pkg.y; }\nif type_checking { import pkg.x; }"),
        ]);
        let mut graph = DependencyGraph::from_modules(index.modules());

        assert_eq!(ImportDetectionStrategy.detect_dependencies(&index, &mut graph), 1);
        assert_eq!(graph.dependents("pkg.y"), vec!["pkg.x"]);
        assert!(graph.dependencies("pkg.z").is_empty());
    }

    #[test]
    fn test_component_strategy_ignores_same_module_links() {
        let index = SourceIndex::from_sources([
            ("pkg.a", false, "component Leaf { }\ncomponent Tree { leaves: collection<Leaf>; }"),
            ("pkg.b", false, "from pkg.a import Tree;\ncomponent Forest { trees: collection<Tree>; root: pointer<Tree>; }"),
        ]);
        let mut graph = DependencyGraph::from_modules(index.modules());

        assert_eq!(ComponentReferenceStrategy.detect_dependencies(&index, &mut graph), 1);
        assert_eq!(graph.dependencies("pkg.b"), vec!["pkg.a"]);
        assert!(graph.dependencies("pkg.a").is_empty());
    }
}
