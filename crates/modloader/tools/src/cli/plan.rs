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

//! Plan command: discovery, analysis and sorting without importing.

use anyhow::Result;
use clap::Args;
use modloader_core::analysis::DependencyResolver;
use modloader_core::{CycleError, DependencyEdge, Failure, LoadPlan, PrefixTierPolicy};
use serde::Serialize;

use super::LoaderArgs;
use crate::config::resolve_config;

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub loader: LoaderArgs,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,

    /// List dependency edges
    #[arg(short, long)]
    pub edges: bool,
}

/// Serializable view of a [`LoadPlan`].
#[derive(Debug, Serialize)]
pub struct PlanSummary {
    pub package_id: String,
    pub order: Vec<String>,
    pub edges: Vec<DependencyEdge>,
    pub cycle: Option<CycleError>,
    pub parse_failures: Vec<Failure>,
}

impl From<&LoadPlan> for PlanSummary {
    fn from(plan: &LoadPlan) -> Self {
        Self {
            package_id: plan.package_id.clone(),
            order: plan.order.clone(),
            edges: plan.graph.edges(),
            cycle: plan.cycle.clone(),
            parse_failures: plan.index.failures().to_vec(),
        }
    }
}

pub fn run_plan(args: PlanArgs) -> Result<()> {
    let config = resolve_config(&args.loader)?;
    let plan = LoadPlan::prepare(&config, &DependencyResolver::new(), &PrefixTierPolicy::new(&config.tiers))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&PlanSummary::from(&plan))?);
    } else {
        print!("{}", render_plan(&plan, args.edges));
    }
    Ok(())
}

/// Human-readable plan: the numbered order, optionally the edges, and any
/// cycle that forced the tier fallback.
pub fn render_plan(plan: &LoadPlan, with_edges: bool) -> String {
    let mut lines = vec![format!("Package {} ({} modules)", plan.package_id, plan.order.len())];
    lines.extend(plan.order.iter().enumerate().map(|(position, module)| format!("{:2}. {}", position + 1, plan.short_name(module))));

    if with_edges {
        lines.push("Edges:".to_string());
        lines.extend(
            plan.graph
                .edges()
                .iter()
                .map(|edge| format!("  {} -> {} ({:?})", plan.short_name(&edge.prerequisite), plan.short_name(&edge.dependent), edge.source)),
        );
    }

    if let Some(cycle) = &plan.cycle {
        lines.push("Cycle detected, order uses layer priority:".to_string());
        for members in &cycle.cycles {
            let names: Vec<&str> = members.iter().map(|m| plan.short_name(m)).collect();
            lines.push(format!("  {}", names.join(" <-> ")));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
