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

//! The loader context.
//!
//! [`Loader`] owns everything one package load needs: configuration,
//! discovered descriptors, parsed sources, the load order, the loaded module
//! instances and the cached registration order. Independent loaders never
//! share state.

use tracing::{debug, info};

use crate::analysis::{DependencyResolver, SourceIndex};
use crate::component::ComponentDeclaration;
use crate::config::{LoaderConfig, Version, short_name};
use crate::discovery::ModuleDescriptor;
use crate::error::LoaderError;
use crate::graph::{DependencyGraph, PrefixTierPolicy, TierPolicy};
use crate::host::ComponentHost;
use crate::module::{Module, ModuleImporter};
use crate::orchestration::{LoadOrchestrator, LoadPlan, RegistrationOrchestrator};
use crate::report::{InitReport, RegistrationReport, ReloadReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    Uninitialized,
    /// Modules are loaded, nothing is registered
    Ready,
    /// Components and module hooks are registered with a host
    Registered,
}

pub struct Loader {
    config: LoaderConfig,
    tier_policy: Box<dyn TierPolicy>,
    resolver: DependencyResolver,
    state: LoaderState,
    descriptors: Vec<ModuleDescriptor>,
    index: SourceIndex,
    graph: DependencyGraph,
    modules: LoadOrchestrator,
    registration: RegistrationOrchestrator,
    report: Option<InitReport>,
}

impl Loader {
    pub fn new(config: LoaderConfig) -> Self {
        let tier_policy = Box::new(PrefixTierPolicy::new(&config.tiers));
        Self {
            config,
            tier_policy,
            resolver: DependencyResolver::new(),
            state: LoaderState::Uninitialized,
            descriptors: Vec::new(),
            index: SourceIndex::default(),
            graph: DependencyGraph::new(),
            modules: LoadOrchestrator::new(String::new()),
            registration: RegistrationOrchestrator::new(),
            report: None,
        }
    }

    /// Replaces the cycle fallback policy.
    pub fn with_tier_policy(mut self, policy: impl TierPolicy + 'static) -> Self {
        self.tier_policy = Box::new(policy);
        self
    }

    pub fn with_resolver(mut self, resolver: DependencyResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Discovers, analyzes, sorts and imports the package.
    ///
    /// Runs once: while the loader is initialized further calls return the
    /// cached report without touching the filesystem or the importer.
    pub fn init(&mut self, importer: &mut dyn ModuleImporter) -> Result<InitReport, LoaderError> {
        if let (LoaderState::Ready | LoaderState::Registered, Some(report)) = (self.state, &self.report) {
            debug!(category = "init", "Already initialized, reusing cached load order");
            return Ok(report.clone());
        }
        self.run_init(importer, self.config.reload)
    }

    fn run_init(&mut self, importer: &mut dyn ModuleImporter, reload: bool) -> Result<InitReport, LoaderError> {
        let plan = LoadPlan::prepare(&self.config, &self.resolver, self.tier_policy.as_ref())?;
        let LoadPlan {
            package_id,
            mut descriptors,
            index,
            graph,
            order,
            cycle,
        } = plan;

        if self.modules.is_empty() {
            self.modules = LoadOrchestrator::new(package_id.as_str());
        }
        let load = self.modules.load(&order, &mut descriptors, &index, importer, reload);
        self.registration.invalidate();

        info!(category = "init", "Load order: {} modules", order.len());
        if self.config.debug_loader_enabled() {
            for (position, module) in order.iter().enumerate() {
                info!(category = "init", "{:2}. {}", position + 1, short_name(&package_id, module));
            }
        }

        let report = InitReport {
            package_id,
            version: self.config.version,
            modules_found: descriptors.len(),
            order,
            edges: graph.edges(),
            cycle,
            parse_failures: index.failures().to_vec(),
            load,
        };

        self.descriptors = descriptors;
        self.index = index;
        self.graph = graph;
        self.report = Some(report.clone());
        self.state = LoaderState::Ready;
        Ok(report)
    }

    /// Registers components in dependency order, then runs module
    /// `register` hooks in load order.
    pub fn register(&mut self, host: &mut dyn ComponentHost) -> Result<RegistrationReport, LoaderError> {
        match self.state {
            LoaderState::Uninitialized => return Err(LoaderError::NotInitialized),
            LoaderState::Registered => {
                debug!(category = "register", "Already registered");
                return Ok(RegistrationReport::default());
            }
            LoaderState::Ready => {}
        }
        if host.is_headless() {
            info!(category = "register", "Headless host, skipping registration");
            return Ok(RegistrationReport::headless());
        }

        info!(category = "register", "Starting registration...");
        let declarations = self.modules.components();
        self.registration.prepare(&declarations)?;

        let mut report = self.registration.register_all(host);
        let hooks = self.modules.register_hooks();
        report.hooks = hooks.ran.len();
        report.failures.extend(hooks.failures);

        self.state = LoaderState::Registered;
        Ok(report)
    }

    /// Runs module `unregister` hooks in reverse load order, then
    /// unregisters components in reverse registration order.
    pub fn unregister(&mut self, host: &mut dyn ComponentHost) -> RegistrationReport {
        if self.state != LoaderState::Registered {
            return RegistrationReport::default();
        }
        if host.is_headless() {
            return RegistrationReport::headless();
        }

        info!(category = "unregister", "Starting unregistration...");
        let hooks = self.modules.unload();
        let mut report = self.registration.unregister_all(host);
        report.hooks = hooks.ran.len();
        let mut failures = hooks.failures;
        failures.append(&mut report.failures);
        report.failures = failures;

        self.state = LoaderState::Ready;
        report
    }

    /// Unregisters if needed and resets the loader.
    pub fn teardown(&mut self, host: &mut dyn ComponentHost) -> RegistrationReport {
        let report = self.unregister(host);
        self.reset();
        report
    }

    /// Re-runs discovery and analysis, reloading loaded modules in place.
    ///
    /// Existing registrations are removed first and re-created after the
    /// reload.
    pub fn reload(&mut self, importer: &mut dyn ModuleImporter, host: &mut dyn ComponentHost) -> Result<ReloadReport, LoaderError> {
        let unregistered = (self.state == LoaderState::Registered).then(|| self.unregister(host));

        info!(category = "reload", "Reloading {}", self.package_id().unwrap_or("package"));
        self.invalidate()?;
        let init = self.run_init(importer, true)?;

        let registered = match unregistered {
            Some(_) => Some(self.register(host)?),
            None => None,
        };
        Ok(ReloadReport { init, unregistered, registered })
    }

    /// Forgets the load order and analysis but keeps module instances, so the
    /// next `init` re-imports or reloads them according to the `reload` flag.
    pub fn invalidate(&mut self) -> Result<(), LoaderError> {
        if self.state == LoaderState::Registered {
            return Err(LoaderError::StillRegistered);
        }
        self.registration.invalidate();
        self.report = None;
        self.state = LoaderState::Uninitialized;
        Ok(())
    }

    /// Drops every module instance and cached result.
    pub fn reset(&mut self) {
        self.descriptors.clear();
        self.index = SourceIndex::default();
        self.graph = DependencyGraph::new();
        self.modules.clear();
        self.registration = RegistrationOrchestrator::new();
        self.report = None;
        self.state = LoaderState::Uninitialized;
    }

    pub fn state(&self) -> LoaderState {
        self.state
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn version(&self) -> Option<Version> {
        self.config.version
    }

    pub fn package_id(&self) -> Option<&str> {
        self.report.as_ref().map(|r| r.package_id.as_str())
    }

    pub fn report(&self) -> Option<&InitReport> {
        self.report.as_ref()
    }

    /// Total load order, empty before `init`.
    pub fn load_order(&self) -> &[String] {
        self.report.as_ref().map(|r| r.order.as_slice()).unwrap_or_default()
    }

    /// Modules that actually loaded, in load order.
    pub fn loaded_modules(&self) -> &[String] {
        self.modules.ordered_modules()
    }

    pub fn module(&self, name: &str) -> Option<&dyn Module> {
        self.modules.module(name)
    }

    pub fn descriptors(&self) -> &[ModuleDescriptor] {
        &self.descriptors
    }

    pub fn index(&self) -> &SourceIndex {
        &self.index
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn registered_components(&self) -> &[ComponentDeclaration] {
        self.registration.registered()
    }
}
