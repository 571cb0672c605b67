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

//! Module contract and importers.
//!
//! A loaded module is a boxed [`Module`]. Lifecycle hooks are optional and
//! advertised through capability queries, so the orchestrators never call a
//! hook a module did not declare.

use std::collections::HashMap;
use std::fmt;

use crate::analysis::ModuleSource;
use crate::component::ComponentDeclaration;
use crate::discovery::ModuleDescriptor;
use crate::error::{HookError, ImportError};

/// Everything an importer gets to materialise one module.
#[derive(Debug, Clone, Copy)]
pub struct ImportRequest<'a> {
    pub descriptor: &'a ModuleDescriptor,
    /// Static analysis result; `None` when the source failed to parse
    pub source: Option<&'a ModuleSource>,
    /// The module is being re-executed in place
    pub reload: bool,
}

impl ImportRequest<'_> {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

pub trait Module {
    fn name(&self) -> &str;

    fn has_register(&self) -> bool {
        false
    }

    fn has_unregister(&self) -> bool {
        false
    }

    fn register(&mut self) -> Result<(), HookError> {
        Ok(())
    }

    fn unregister(&mut self) -> Result<(), HookError> {
        Ok(())
    }

    /// Host-registrable components owned by this module.
    fn components(&self) -> Vec<ComponentDeclaration> {
        Vec::new()
    }
}

pub trait ModuleImporter {
    fn import(&mut self, request: &ImportRequest<'_>) -> Result<Box<dyn Module>, ImportError>;

    /// Replaces a loaded module. On failure the previous instance must be
    /// handed back so the module stays loaded.
    fn reload(&mut self, request: &ImportRequest<'_>, previous: Box<dyn Module>) -> Result<Box<dyn Module>, ReloadError> {
        match self.import(request) {
            Ok(module) => Ok(module),
            Err(error) => Err(ReloadError { error, previous }),
        }
    }
}

/// A failed reload, carrying the instance that stays in place.
pub struct ReloadError {
    pub error: ImportError,
    pub previous: Box<dyn Module>,
}

impl fmt::Debug for ReloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReloadError").field("error", &self.error).field("previous", &self.previous.name()).finish()
    }
}

/// Module materialised from its parsed script. Exposes no hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptModule {
    name: String,
    components: Vec<ComponentDeclaration>,
}

impl ScriptModule {
    pub fn from_source(source: &ModuleSource) -> Self {
        Self {
            name: source.name.clone(),
            components: source.components.clone(),
        }
    }
}

impl Module for ScriptModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn components(&self) -> Vec<ComponentDeclaration> {
        self.components.clone()
    }
}

pub type ModuleFactory = Box<dyn FnMut(&ImportRequest<'_>) -> Result<Box<dyn Module>, ImportError>>;

/// Default importer: native factories by dotted name, scripts for the rest.
pub struct ModuleCatalog {
    factories: HashMap<String, ModuleFactory>,
    script_fallback: bool,
}

impl Default for ModuleCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            script_fallback: true,
        }
    }

    /// Catalog that fails every module without a registered factory.
    pub fn native_only() -> Self {
        Self {
            factories: HashMap::new(),
            script_fallback: false,
        }
    }

    pub fn provide<F>(&mut self, module: impl Into<String>, factory: F) -> &mut Self
    where
        F: FnMut(&ImportRequest<'_>) -> Result<Box<dyn Module>, ImportError> + 'static,
    {
        self.factories.insert(module.into(), Box::new(factory));
        self
    }

    pub fn with_module<F>(mut self, module: impl Into<String>, factory: F) -> Self
    where
        F: FnMut(&ImportRequest<'_>) -> Result<Box<dyn Module>, ImportError> + 'static,
    {
        self.provide(module, factory);
        self
    }

    pub fn provides(&self, module: &str) -> bool {
        self.factories.contains_key(module)
    }
}

impl ModuleImporter for ModuleCatalog {
    fn import(&mut self, request: &ImportRequest<'_>) -> Result<Box<dyn Module>, ImportError> {
        if let Some(factory) = self.factories.get_mut(request.name()) {
            return factory(request);
        }
        if !self.script_fallback {
            return Err(ImportError::NotProvided {
                module: request.name().to_string(),
            });
        }

        match request.source {
            Some(source) => Ok(Box::new(ScriptModule::from_source(source))),
            None => Err(ImportError::MissingSource {
                module: request.name().to_string(),
            }),
        }
    }
}
