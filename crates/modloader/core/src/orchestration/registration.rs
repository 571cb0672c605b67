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

use tracing::{error, info};

use crate::component::{ComponentCycleError, ComponentDeclaration, RegistrationOrder};
use crate::host::ComponentHost;
use crate::report::{Failure, RegistrationReport, Stage};

/// Registers components with a host in dependency order.
///
/// The order is computed on first use and cached until [`invalidate`].
/// Only components the host accepted are remembered, and only those are
/// unregistered later.
///
/// [`invalidate`]: RegistrationOrchestrator::invalidate
#[derive(Debug, Default)]
pub struct RegistrationOrchestrator {
    cached: Option<RegistrationOrder>,
    registered: Vec<ComponentDeclaration>,
}

impl RegistrationOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached registration order, computed from `declarations` when absent.
    pub fn prepare(&mut self, declarations: &[ComponentDeclaration]) -> Result<&RegistrationOrder, ComponentCycleError> {
        let order = match self.cached.take() {
            Some(order) => order,
            None => RegistrationOrder::build(declarations).inspect_err(|err| error!(category = "register", "{}", err))?,
        };
        Ok(&*self.cached.insert(order))
    }

    pub fn cached_order(&self) -> Option<&RegistrationOrder> {
        self.cached.as_ref()
    }

    /// Registers every component of the cached order. Per-component host
    /// errors are recorded and registration moves on.
    pub fn register_all(&mut self, host: &mut dyn ComponentHost) -> RegistrationReport {
        let mut report = RegistrationReport::default();
        let Some(order) = &self.cached else {
            return report;
        };

        for component in order.iter() {
            if self.registered.iter().any(|r| r.id == component.id) {
                continue;
            }
            match host.register_component(component) {
                Ok(()) => {
                    report.components += 1;
                    self.registered.push(component.clone());
                }
                Err(err) => {
                    error!(category = "register", "Component {}: {}", component.id, err);
                    report.failures.push(Failure::new(component.id.to_string(), Stage::RegisterComponent, err));
                }
            }
        }

        info!(category = "register", "Registered {} components", report.components);
        report
    }

    /// Unregisters in exact reverse of registration.
    pub fn unregister_all(&mut self, host: &mut dyn ComponentHost) -> RegistrationReport {
        let mut report = RegistrationReport::default();

        for component in self.registered.drain(..).rev() {
            match host.unregister_component(&component) {
                Ok(()) => report.components += 1,
                Err(err) => {
                    error!(category = "unregister", "Component {}: {}", component.id, err);
                    report.failures.push(Failure::new(component.id.to_string(), Stage::UnregisterComponent, err));
                }
            }
        }

        info!(category = "unregister", "Unregistered {} components", report.components);
        report
    }

    pub fn registered(&self) -> &[ComponentDeclaration] {
        &self.registered
    }

    /// Drops the cached order. Registered components are kept.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentId, LinkKind};
    use crate::error::HostError;
    use crate::host::MockComponentHost;
    use mockall::Sequence;

    fn declarations() -> Vec<ComponentDeclaration> {
        vec![
            ComponentDeclaration::new(ComponentId::new("pkg.ui", "Panel")).with_reference("theme", ComponentId::new("pkg.core", "Theme"), LinkKind::Pointer),
            ComponentDeclaration::new(ComponentId::new("pkg.core", "Theme")),
            ComponentDeclaration::new(ComponentId::new("pkg.core", "Item")),
        ]
    }

    fn named(name: &'static str) -> impl Fn(&ComponentDeclaration) -> bool {
        move |c: &ComponentDeclaration| c.id.name == name
    }

    #[test]
    fn test_register_in_order_and_unregister_in_reverse() {
        let mut host = MockComponentHost::new();
        let mut seq = Sequence::new();
        for name in ["Theme", "Panel", "Item"] {
            host.expect_register_component().withf(named(name)).times(1).in_sequence(&mut seq).returning(|_| Ok(()));
        }
        for name in ["Item", "Panel", "Theme"] {
            host.expect_unregister_component().withf(named(name)).times(1).in_sequence(&mut seq).returning(|_| Ok(()));
        }

        let mut orchestrator = RegistrationOrchestrator::new();
        orchestrator.prepare(&declarations()).unwrap();

        assert_eq!(orchestrator.register_all(&mut host).components, 3);
        assert_eq!(orchestrator.unregister_all(&mut host).components, 3);
        assert!(orchestrator.registered().is_empty());
    }

    #[test]
    fn test_failed_component_is_isolated_and_not_unregistered() {
        let mut host = MockComponentHost::new();
        host.expect_register_component().withf(named("Panel")).returning(|_| Err(HostError::new("rejected")));
        host.expect_register_component().returning(|_| Ok(()));
        host.expect_unregister_component().withf(named("Panel")).never();
        host.expect_unregister_component().times(2).returning(|_| Ok(()));

        let mut orchestrator = RegistrationOrchestrator::new();
        orchestrator.prepare(&declarations()).unwrap();

        let report = orchestrator.register_all(&mut host);
        assert_eq!(report.components, 2);
        assert_eq!(report.failures[0].subject, "pkg.ui.Panel");
        assert_eq!(report.failures[0].stage, Stage::RegisterComponent);

        assert_eq!(orchestrator.unregister_all(&mut host).components, 2);
    }

    #[test]
    fn test_order_is_cached_until_invalidated() {
        let mut orchestrator = RegistrationOrchestrator::new();
        orchestrator.prepare(&declarations()).unwrap();

        assert_eq!(orchestrator.prepare(&[]).unwrap().len(), 3);

        orchestrator.invalidate();
        assert!(orchestrator.prepare(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_cycle_is_reported_before_registration() {
        let cyclic = vec![
            ComponentDeclaration::new(ComponentId::new("m", "A")).with_reference("b", ComponentId::new("m", "B"), LinkKind::Pointer),
            ComponentDeclaration::new(ComponentId::new("m", "B")).with_reference("a", ComponentId::new("m", "A"), LinkKind::Pointer),
        ];
        let mut host = MockComponentHost::new();
        host.expect_register_component().never();

        let mut orchestrator = RegistrationOrchestrator::new();
        let err = orchestrator.prepare(&cyclic).unwrap_err();

        assert_eq!(err.chain.first(), err.chain.last());
        assert!(orchestrator.cached_order().is_none());
        assert_eq!(orchestrator.register_all(&mut host).components, 0);
    }
}
