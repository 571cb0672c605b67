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

//! Load command: a full lifecycle run against a host that only logs.

use anyhow::Result;
use clap::Args;
use modloader_core::{ComponentDeclaration, ComponentHost, HeadlessHost, HostError, Loader, ModuleCatalog};
use tracing::info;

use super::LoaderArgs;
use crate::config::resolve_config;

#[derive(Args, Debug)]
pub struct LoadArgs {
    #[command(flatten)]
    pub loader: LoaderArgs,

    /// Skip component registration, as a background run would
    #[arg(long)]
    pub headless: bool,
}

/// Host that accepts every component and logs the call.
#[derive(Debug, Default)]
pub struct LoggingHost {
    pub registered: Vec<String>,
    /// Register and unregister calls received
    pub calls: usize,
}

impl ComponentHost for LoggingHost {
    fn register_component(&mut self, component: &ComponentDeclaration) -> Result<(), HostError> {
        info!(category = "host", "register {}", component.id);
        self.calls += 1;
        self.registered.push(component.id.to_string());
        Ok(())
    }

    fn unregister_component(&mut self, component: &ComponentDeclaration) -> Result<(), HostError> {
        info!(category = "host", "unregister {}", component.id);
        self.calls += 1;
        self.registered.retain(|id| *id != component.id.to_string());
        Ok(())
    }
}

pub fn run_load(args: LoadArgs) -> Result<()> {
    let config = resolve_config(&args.loader)?;
    let mut loader = Loader::new(config);
    let mut host = LoggingHost::default();
    let headless = args.headless;

    let failures = load_cycle(&mut loader, &mut host, headless)?;
    if failures > 0 {
        anyhow::bail!("{} failures during the load cycle", failures);
    }
    Ok(())
}

/// Runs init, registration and teardown. Returns the number of isolated
/// failures seen along the way.
pub fn load_cycle(loader: &mut Loader, host: &mut LoggingHost, headless: bool) -> Result<usize> {
    let init = loader.init(&mut ModuleCatalog::new())?;
    info!(category = "load", "{} modules loaded, {} failed", init.load.succeeded(), init.load.failed());
    let mut failures = init.parse_failures.len() + init.load.failed();
    for failure in init.load.failures.iter().chain(&init.parse_failures) {
        info!(category = "load", "{}", failure);
    }

    let registration = if headless { loader.register(&mut HeadlessHost)? } else { loader.register(host)? };
    info!(category = "load", "{} components and {} hooks registered", registration.components, registration.hooks);
    failures += registration.failures.len();

    let teardown = if headless { loader.teardown(&mut HeadlessHost) } else { loader.teardown(host) };
    failures += teardown.failures.len();
    Ok(failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use modloader_core::LoaderConfig;
    use std::fs;

    #[test]
    fn test_cycle_registers_and_releases() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.plug"), "component A { }").unwrap();
        fs::write(dir.path().join("b.plug"), "from .a import A;\ncomponent B { a: pointer<A>; }").unwrap();
        let mut loader = Loader::new(LoaderConfig::new(dir.path()).with_package_id("addon").with_patterns(["*"]));
        let mut host = LoggingHost::default();

        let failures = load_cycle(&mut loader, &mut host, false).unwrap();

        assert_eq!(failures, 0);
        assert_eq!(host.calls, 4);
        assert!(host.registered.is_empty());
        assert!(loader.loaded_modules().is_empty());
    }

    #[test]
    fn test_headless_cycle_leaves_host_untouched() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.plug"), "component A { }").unwrap();
        let mut loader = Loader::new(LoaderConfig::new(dir.path()).with_package_id("addon").with_patterns(["*"]));
        let mut host = LoggingHost::default();

        load_cycle(&mut loader, &mut host, true).unwrap();

        assert_eq!(host.calls, 0);
    }

    #[test]
    fn test_unparsable_module_counts_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.plug"), "import").unwrap();
        let mut loader = Loader::new(LoaderConfig::new(dir.path()).with_package_id("addon").with_patterns(["*"]));

        let failures = load_cycle(&mut loader, &mut LoggingHost::default(), false).unwrap();

        assert_eq!(failures, 2);
    }
}
