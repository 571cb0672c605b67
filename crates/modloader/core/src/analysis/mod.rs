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

//! Static analysis of discovered modules.
//!
//! Every module source is parsed exactly once into a [`SourceIndex`]. The
//! index carries the imports and component declarations of each module and
//! feeds the detection strategies that populate the [`DependencyGraph`].

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

use crate::component::ComponentDeclaration;
use crate::discovery::ModuleDescriptor;
use crate::graph::DependencyGraph;
use crate::report::{Failure, Stage};
use crate::source::{ParseError, SourceFile, parse_source};

pub mod components;
pub mod imports;
pub mod strategies;

pub use components::{ModuleScope, TypeResolver, collect_declarations};
pub use imports::{Deferral, ImportRef, ImportScanner, resolve_module_path};
pub use strategies::{ComponentReferenceStrategy, ImportDetectionStrategy};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// What static analysis learned about one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSource {
    pub name: String,
    pub is_package: bool,
    /// Imports of other known modules, deferred ones included
    pub imports: Vec<ImportRef>,
    pub components: Vec<ComponentDeclaration>,
}

impl ModuleSource {
    /// Modules this one must load after, as far as imports tell.
    pub fn load_dependencies(&self) -> impl Iterator<Item = &str> {
        self.imports.iter().filter(|i| i.constrains_load_order()).map(|i| i.target.as_str())
    }
}

/// Parsed view of every discovered module.
#[derive(Debug, Clone, Default)]
pub struct SourceIndex {
    modules: Vec<String>,
    sources: HashMap<String, ModuleSource>,
    failures: Vec<Failure>,
}

impl SourceIndex {
    /// Reads and analyzes each descriptor's source file.
    ///
    /// Unreadable or unparsable modules are recorded as failures and stay in
    /// the index without a source, which makes them leaves in the graph.
    pub fn build(descriptors: &[ModuleDescriptor]) -> Self {
        let inputs = descriptors.iter().map(|descriptor| {
            let parsed = std::fs::read_to_string(&descriptor.path)
                .map_err(|source| SourceError::Io {
                    path: descriptor.path.clone(),
                    source,
                })
                .and_then(|text| parse_source(&text).map_err(SourceError::from));
            (descriptor.name.clone(), descriptor.is_package, parsed)
        });
        Self::analyze(inputs.collect())
    }

    /// Analyzes in-memory sources given as `(name, is_package, text)`.
    pub fn from_sources<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = (S, bool, S)>,
        S: AsRef<str>,
    {
        let inputs = sources
            .into_iter()
            .map(|(name, is_package, text)| (name.as_ref().to_string(), is_package, parse_source(text.as_ref()).map_err(SourceError::from)))
            .collect();
        Self::analyze(inputs)
    }

    fn analyze(inputs: Vec<(String, bool, Result<SourceFile, SourceError>)>) -> Self {
        let modules: Vec<String> = inputs.iter().map(|(name, _, _)| name.clone()).collect();
        let known: HashSet<String> = modules.iter().cloned().collect();

        let mut failures = Vec::new();
        let mut parsed = Vec::new();
        for (name, is_package, result) in inputs {
            match result {
                Ok(file) => parsed.push((name, is_package, file)),
                Err(err) => {
                    warn!(category = "analyze", "Cannot analyze {}: {}", name, err);
                    failures.push(Failure::new(name, Stage::Parse, err));
                }
            }
        }

        let scopes: HashMap<String, ModuleScope> = parsed.iter().map(|(name, is_package, file)| (name.clone(), ModuleScope::collect(name, *is_package, file))).collect();
        let resolver = TypeResolver::new(&scopes, &known);

        let mut sources = HashMap::with_capacity(parsed.len());
        for (name, is_package, file) in &parsed {
            let imports = ImportScanner::new(name, *is_package, &known).scan(file);
            let components = collect_declarations(name, file, &resolver);
            debug!(category = "analyze", "{}: {} imports, {} components", name, imports.len(), components.len());

            sources.insert(
                name.clone(),
                ModuleSource {
                    name: name.clone(),
                    is_package: *is_package,
                    imports,
                    components,
                },
            );
        }

        Self { modules, sources, failures }
    }

    /// Every analyzed module name, parsed or not, in discovery order.
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    pub fn get(&self, module: &str) -> Option<&ModuleSource> {
        self.sources.get(module)
    }

    /// Successfully parsed modules in discovery order.
    pub fn sources(&self) -> impl Iterator<Item = &ModuleSource> {
        self.modules.iter().filter_map(|name| self.sources.get(name))
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }
}

/// Adds one kind of dependency edge to the module graph.
pub trait DependencyDetectionStrategy {
    fn name(&self) -> &'static str;

    /// Adds detected edges to `graph` and returns how many were new.
    fn detect_dependencies(&self, index: &SourceIndex, graph: &mut DependencyGraph) -> usize;
}

/// Runs every detection strategy over a [`SourceIndex`].
pub struct DependencyResolver {
    detection_strategies: Vec<Box<dyn DependencyDetectionStrategy>>,
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyResolver {
    /// Resolver with import and component reference detection.
    pub fn new() -> Self {
        let mut resolver = Self::empty();
        resolver.add_strategy(Box::new(ImportDetectionStrategy));
        resolver.add_strategy(Box::new(ComponentReferenceStrategy));
        resolver
    }

    pub fn empty() -> Self {
        Self { detection_strategies: Vec::new() }
    }

    pub fn add_strategy(&mut self, strategy: Box<dyn DependencyDetectionStrategy>) {
        self.detection_strategies.push(strategy);
    }

    /// Graph with every indexed module as a node and every detected edge.
    pub fn resolve(&self, index: &SourceIndex) -> DependencyGraph {
        let mut graph = DependencyGraph::from_modules(index.modules());

        for strategy in &self.detection_strategies {
            let added = strategy.detect_dependencies(index, &mut graph);
            debug!(category = "analyze", "{} strategy added {} edges", strategy.name(), added);
        }

        graph
    }
}
