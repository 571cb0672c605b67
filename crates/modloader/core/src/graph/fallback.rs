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

//! Layer-priority ordering used when the dependency graph has a cycle.

use serde::Serialize;

use crate::config::{TierConfig, short_name};

/// Structural role of a module. Variants are declared in load priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Tier {
    Foundational,
    Feature,
    Integration,
    Presentation,
    Unclassified,
}

/// Assigns a tier from a package-relative module name.
pub trait TierPolicy {
    fn tier(&self, short_name: &str) -> Tier;
}

impl<F> TierPolicy for F
where
    F: Fn(&str) -> Tier,
{
    fn tier(&self, short_name: &str) -> Tier {
        self(short_name)
    }
}

/// Matches leading name segments against configured prefixes.
///
/// A prefix `core` claims `core` and `core.anything`, but not `corelib`.
/// Tiers are tried from foundational to presentation; the first hit wins.
#[derive(Debug, Clone)]
pub struct PrefixTierPolicy {
    prefixes: Vec<(String, Tier)>,
}

impl PrefixTierPolicy {
    pub fn new(config: &TierConfig) -> Self {
        let tiers = [
            (&config.foundational, Tier::Foundational),
            (&config.feature, Tier::Feature),
            (&config.integration, Tier::Integration),
            (&config.presentation, Tier::Presentation),
        ];

        let prefixes = tiers
            .into_iter()
            .flat_map(|(prefixes, tier)| prefixes.iter().map(move |p| (p.trim_end_matches('.').to_string(), tier)))
            .filter(|(prefix, _)| !prefix.is_empty())
            .collect();

        Self { prefixes }
    }
}

impl Default for PrefixTierPolicy {
    fn default() -> Self {
        Self::new(&TierConfig::default())
    }
}

impl TierPolicy for PrefixTierPolicy {
    fn tier(&self, short_name: &str) -> Tier {
        self.prefixes
            .iter()
            .find(|(prefix, _)| short_name.strip_prefix(prefix.as_str()).is_some_and(|rest| rest.is_empty() || rest.starts_with('.')))
            .map(|(_, tier)| *tier)
            .unwrap_or(Tier::Unclassified)
    }
}

/// Stable sort of `modules` by tier only; modules in the same tier keep
/// their relative order.
pub fn priority_sort(modules: &[String], package_id: &str, policy: &dyn TierPolicy) -> Vec<String> {
    let mut sorted = modules.to_vec();
    sorted.sort_by_key(|module| policy.tier(short_name(package_id, module)));
    sorted
}
