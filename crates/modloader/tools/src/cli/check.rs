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

//! Check command: parses every discovered module source.

use anyhow::{Result, bail};
use clap::Args;
use modloader_core::analysis::DependencyResolver;
use modloader_core::{Failure, LoadPlan, PrefixTierPolicy};
use tracing::{info, warn};

use super::LoaderArgs;
use crate::config::resolve_config;

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub loader: LoaderArgs,

    /// Treat a dependency cycle as an error
    #[arg(long)]
    pub deny_cycles: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSummary {
    pub modules: usize,
    pub failures: Vec<Failure>,
    pub cycle_members: Vec<String>,
}

impl CheckSummary {
    pub fn passed(&self, deny_cycles: bool) -> bool {
        self.failures.is_empty() && (!deny_cycles || self.cycle_members.is_empty())
    }
}

pub fn check_plan(plan: &LoadPlan) -> CheckSummary {
    CheckSummary {
        modules: plan.descriptors.len(),
        failures: plan.index.failures().to_vec(),
        cycle_members: plan.cycle.as_ref().map(|c| c.cycles.concat()).unwrap_or_default(),
    }
}

pub fn run_check(args: CheckArgs) -> Result<()> {
    let config = resolve_config(&args.loader)?;
    let plan = LoadPlan::prepare(&config, &DependencyResolver::new(), &PrefixTierPolicy::new(&config.tiers))?;
    let summary = check_plan(&plan);

    for failure in &summary.failures {
        warn!(category = "check", "{}", failure);
    }
    if !summary.cycle_members.is_empty() {
        warn!(category = "check", "Modules in a dependency cycle: {}", summary.cycle_members.join(", "));
    }

    if !summary.failures.is_empty() {
        bail!("{} of {} modules failed to parse", summary.failures.len(), summary.modules);
    }
    if !summary.passed(args.deny_cycles) {
        bail!("dependency cycle among {} modules", summary.cycle_members.len());
    }
    info!(category = "check", "{} modules OK", summary.modules);
    Ok(())
}
