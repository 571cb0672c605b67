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

use crate::component::ComponentDeclaration;
use crate::error::HostError;

/// Runtime that components are registered with.
#[cfg_attr(test, mockall::automock)]
pub trait ComponentHost {
    fn register_component(&mut self, component: &ComponentDeclaration) -> Result<(), HostError>;

    fn unregister_component(&mut self, component: &ComponentDeclaration) -> Result<(), HostError>;

    /// A headless host runs without registration; the loader skips both
    /// registration and unregistration.
    fn is_headless(&self) -> bool {
        false
    }
}

/// Host for background runs: accepts nothing and is never called.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessHost;

impl ComponentHost for HeadlessHost {
    fn register_component(&mut self, _component: &ComponentDeclaration) -> Result<(), HostError> {
        Ok(())
    }

    fn unregister_component(&mut self, _component: &ComponentDeclaration) -> Result<(), HostError> {
        Ok(())
    }

    fn is_headless(&self) -> bool {
        true
    }
}
