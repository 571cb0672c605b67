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

use std::collections::HashMap;
use tracing::{debug, error, info, warn};

use crate::analysis::SourceIndex;
use crate::component::ComponentDeclaration;
use crate::config::short_name;
use crate::discovery::{ModuleDescriptor, ModuleState};
use crate::module::{ImportRequest, Module, ModuleImporter, ReloadError};
use crate::report::{Failure, LoadReport, Stage};

/// Outcome of running one kind of module hook across the load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookReport {
    /// Modules whose hook ran successfully, in call order
    pub ran: Vec<String>,
    pub failures: Vec<Failure>,
}

/// Imports modules in load order and owns the loaded instances.
pub struct LoadOrchestrator {
    package_id: String,
    order: Vec<String>,
    instances: HashMap<String, Box<dyn Module>>,
}

impl LoadOrchestrator {
    pub fn new(package_id: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            order: Vec::new(),
            instances: HashMap::new(),
        }
    }

    /// Imports every module of `order`.
    ///
    /// With `reload` set, a module loaded by a previous call is handed back to
    /// the importer for in-place replacement; when that fails the previous
    /// instance stays loaded. Without `reload` the previous instance is kept
    /// as is. A failing module is recorded and skipped.
    /// Instances of modules missing from `order` are dropped.
    pub fn load(&mut self, order: &[String], descriptors: &mut [ModuleDescriptor], index: &SourceIndex, importer: &mut dyn ModuleImporter, reload: bool) -> LoadReport {
        let mut report = LoadReport::default();
        let mut previous = std::mem::take(&mut self.instances);
        self.order.clear();

        for name in order {
            let Some(descriptor) = descriptors.iter_mut().find(|d| &d.name == name) else {
                continue;
            };
            let short = short_name(&self.package_id, name);

            let request = ImportRequest {
                descriptor: &*descriptor,
                source: index.get(name),
                reload,
            };
            let mut retained = None;
            let (stage, outcome) = match previous.remove(name) {
                Some(instance) if reload => {
                    let outcome = importer.reload(&request, instance).map_err(|ReloadError { error, previous: kept }| {
                        retained = Some(kept);
                        error
                    });
                    (Stage::Reload, outcome)
                }
                Some(instance) => (Stage::Import, Ok(instance)),
                None => (Stage::Import, importer.import(&request)),
            };

            match outcome {
                Ok(instance) => {
                    if stage == Stage::Reload {
                        debug!(category = "reload", "{}", short);
                        report.reloaded.push(name.clone());
                    } else {
                        debug!(category = "import", "{}", short);
                        report.loaded.push(name.clone());
                    }
                    descriptor.state = ModuleState::Imported;
                    self.order.push(name.clone());
                    self.instances.insert(name.clone(), instance);
                }
                Err(err) => match retained {
                    Some(instance) => {
                        error!(category = "reload", "Failed to reload {}, keeping the loaded module: {}", short, err);
                        report.failures.push(Failure::new(name.as_str(), stage, err));
                        descriptor.state = ModuleState::Imported;
                        self.order.push(name.clone());
                        self.instances.insert(name.clone(), instance);
                    }
                    None => {
                        error!(category = "import", "Failed to load {}: {}", short, err);
                        report.failures.push(Failure::new(name.as_str(), stage, err));
                        descriptor.state = ModuleState::Failed;
                    }
                },
            }
        }

        for name in previous.keys() {
            debug!(category = "reload", "Dropping {}, no longer discovered", short_name(&self.package_id, name));
        }

        if report.failed() > 0 {
            warn!(category = "import", "{} modules failed to load", report.failed());
        }
        info!(category = "import", "Loaded {} modules", report.succeeded());
        report
    }

    /// Runs `register` hooks in load order.
    pub fn register_hooks(&mut self) -> HookReport {
        let mut report = HookReport::default();
        for name in &self.order {
            let Some(module) = self.instances.get_mut(name) else {
                continue;
            };
            if !module.has_register() {
                continue;
            }
            match module.register() {
                Ok(()) => report.ran.push(name.clone()),
                Err(err) => {
                    error!(category = "register", "Module {}: {}", short_name(&self.package_id, name), err);
                    report.failures.push(Failure::new(name.as_str(), Stage::RegisterHook, err));
                }
            }
        }
        info!(category = "register", "Initialized {} modules", report.ran.len());
        report
    }

    /// Runs `unregister` hooks in reverse load order.
    pub fn unload(&mut self) -> HookReport {
        let mut report = HookReport::default();
        for name in self.order.iter().rev() {
            let Some(module) = self.instances.get_mut(name) else {
                continue;
            };
            if !module.has_unregister() {
                continue;
            }
            match module.unregister() {
                Ok(()) => report.ran.push(name.clone()),
                Err(err) => {
                    error!(category = "unregister", "Module {}: {}", short_name(&self.package_id, name), err);
                    report.failures.push(Failure::new(name.as_str(), Stage::UnregisterHook, err));
                }
            }
        }
        info!(category = "unregister", "Uninitialized {} modules", report.ran.len());
        report
    }

    /// Successfully loaded modules in load order.
    pub fn ordered_modules(&self) -> &[String] {
        &self.order
    }

    pub fn module(&self, name: &str) -> Option<&dyn Module> {
        self.instances.get(name).map(|m| m.as_ref())
    }

    /// Components of every loaded module, in load order.
    pub fn components(&self) -> Vec<ComponentDeclaration> {
        self.order.iter().filter_map(|name| self.instances.get(name)).flat_map(|m| m.components()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.instances.clear();
    }
}
