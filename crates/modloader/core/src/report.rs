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

//! Outcome records returned by the lifecycle entry points.

use serde::Serialize;
use std::fmt;

use crate::config::Version;
use crate::graph::{CycleError, DependencyEdge};

/// Lifecycle step at which a per-item failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Parse,
    Import,
    Reload,
    RegisterComponent,
    UnregisterComponent,
    RegisterHook,
    UnregisterHook,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Parse => "parse",
            Stage::Import => "import",
            Stage::Reload => "reload",
            Stage::RegisterComponent => "register component",
            Stage::UnregisterComponent => "unregister component",
            Stage::RegisterHook => "register hook",
            Stage::UnregisterHook => "unregister hook",
        };
        f.write_str(name)
    }
}

/// One isolated failure; never aborts the surrounding sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// Module or component the failure is about
    pub subject: String,
    pub stage: Stage,
    pub message: String,
}

impl Failure {
    pub fn new(subject: impl Into<String>, stage: Stage, message: impl ToString) -> Self {
        Self {
            subject: subject.into(),
            stage,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} failed: {}", self.stage, self.subject, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Freshly imported modules, in load order
    pub loaded: Vec<String>,
    /// Modules re-executed in place
    pub reloaded: Vec<String>,
    pub failures: Vec<Failure>,
}

impl LoadReport {
    pub fn succeeded(&self) -> usize {
        self.loaded.len() + self.reloaded.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InitReport {
    pub package_id: String,
    pub version: Option<Version>,
    pub modules_found: usize,
    /// Final load order
    pub order: Vec<String>,
    pub edges: Vec<DependencyEdge>,
    /// Set when the graph had a cycle; `order` is then the tier fallback
    pub cycle: Option<CycleError>,
    pub parse_failures: Vec<Failure>,
    pub load: LoadReport,
}

impl InitReport {
    pub fn used_fallback(&self) -> bool {
        self.cycle.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationReport {
    /// Components the host accepted (or released, when unregistering)
    pub components: usize,
    /// Module hooks that ran successfully
    pub hooks: usize,
    pub failures: Vec<Failure>,
    /// The host was headless and nothing was attempted
    pub skipped_headless: bool,
}

impl RegistrationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn headless() -> Self {
        Self {
            skipped_headless: true,
            ..Self::default()
        }
    }
}

/// Outcome of a hot reload. The registration reports are present only when
/// the package was registered before the reload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReloadReport {
    pub init: InitReport,
    pub unregistered: Option<RegistrationReport>,
    pub registered: Option<RegistrationReport>,
}

impl ReloadReport {
    /// Isolated failures across the whole reload.
    pub fn failed(&self) -> usize {
        let registration = self.unregistered.iter().chain(&self.registered).map(|r| r.failures.len()).sum::<usize>();
        self.init.load.failed() + registration
    }
}
