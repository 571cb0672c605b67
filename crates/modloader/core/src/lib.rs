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

//! Dependency-aware plugin module loader.
//!
//! The loader discovers module scripts under a package root, derives a load
//! order from their imports and component links, imports every module in
//! that order and registers the declared components with a host runtime.
//!
//! ```text
//! discovery -> analysis (imports + components) -> sort -> load -> register
//! ```
//!
//! Teardown runs the last two steps in reverse.

pub mod analysis;
pub mod component;
pub mod config;
pub mod discovery;
pub mod error;
pub mod graph;
pub mod host;
pub mod loader;
pub mod module;
pub mod orchestration;
pub mod report;
pub mod source;

pub use component::{ComponentCycleError, ComponentDeclaration, ComponentId, ComponentReference, LinkKind, RegistrationOrder};
pub use config::{LoaderConfig, ModulePatterns, TierConfig, Version};
pub use discovery::{ModuleDescriptor, ModuleState};
pub use error::{ConfigError, HookError, HostError, ImportError, LoaderError};
pub use graph::{CycleError, DependencyEdge, DependencyGraph, EdgeSource, PrefixTierPolicy, Tier, TierPolicy};
pub use host::{ComponentHost, HeadlessHost};
pub use loader::{Loader, LoaderState};
pub use module::{ImportRequest, Module, ModuleCatalog, ModuleImporter, ReloadError, ScriptModule};
pub use orchestration::LoadPlan;
pub use report::{Failure, InitReport, LoadReport, RegistrationReport, ReloadReport, Stage};
