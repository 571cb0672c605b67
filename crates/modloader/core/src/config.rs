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

//! Loader configuration.
//!
//! A [`LoaderConfig`] is handed to [`crate::Loader`] once and stays fixed
//! until the next `init` after a reset.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Environment switch that turns on the numbered load-order listing.
pub const DEBUG_LOADER_ENV: &str = "MODLOADER_DEBUG_LOADER";

pub const DEFAULT_SOURCE_EXTENSION: &str = "plug";

/// Optional version tag carried by the loaded package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version(pub u32, pub u32, pub u32);

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0, self.1, self.2)
    }
}

/// Layer prefixes used by the cycle fallback ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierConfig {
    pub foundational: Vec<String>,
    pub feature: Vec<String>,
    pub integration: Vec<String>,
    pub presentation: Vec<String>,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            foundational: vec!["core".to_string()],
            feature: vec!["menus".to_string()],
            integration: vec!["infra".to_string()],
            presentation: vec!["ui".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Directory of the package to scan
    pub root: PathBuf,
    /// Dotted prefix of every module name; defaults to the root directory name
    pub package_id: Option<String>,
    /// Glob-style patterns relative to the package, e.g. `core.*`
    pub patterns: Vec<String>,
    /// Re-import already loaded modules in place
    pub reload: bool,
    pub version: Option<Version>,
    /// Extension of module script files, without the dot
    pub source_extension: String,
    /// Log the numbered load order after init
    pub debug_loader: bool,
    pub tiers: TierConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            package_id: None,
            patterns: Vec::new(),
            reload: false,
            version: None,
            source_extension: DEFAULT_SOURCE_EXTENSION.to_string(),
            debug_loader: false,
            tiers: TierConfig::default(),
        }
    }
}

impl LoaderConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_package_id(mut self, package_id: impl Into<String>) -> Self {
        self.package_id = Some(package_id.into());
        self
    }

    pub fn with_reload(mut self, reload: bool) -> Self {
        self.reload = reload;
        self
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_tiers(mut self, tiers: TierConfig) -> Self {
        self.tiers = tiers;
        self
    }

    /// The explicit package id, or the name of the root directory.
    pub fn resolve_package_id(&self) -> Result<String, ConfigError> {
        let package_id = match &self.package_id {
            Some(id) => id.clone(),
            None => {
                let root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());
                root.file_name()
                    .and_then(|name| name.to_str())
                    .map(str::to_string)
                    .ok_or_else(|| ConfigError::MissingPackageId { root: self.root.clone() })?
            }
        };

        if package_id.is_empty() || package_id.starts_with('.') || package_id.ends_with('.') || package_id.contains("..") {
            return Err(ConfigError::InvalidPackageId(package_id));
        }
        Ok(package_id)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_extension.is_empty() || self.source_extension.contains('.') {
            return Err(ConfigError::Validation(format!("source extension '{}' must be a bare extension", self.source_extension)));
        }
        if let Some(pattern) = self.patterns.iter().find(|p| p.trim().is_empty()) {
            return Err(ConfigError::Validation(format!("empty module pattern '{}'", pattern)));
        }
        Ok(())
    }

    pub fn compile_patterns(&self, package_id: &str) -> Result<ModulePatterns, ConfigError> {
        ModulePatterns::new(package_id, &self.patterns)
    }

    pub fn debug_loader_enabled(&self) -> bool {
        self.debug_loader || std::env::var(DEBUG_LOADER_ENV).map(|v| v == "1").unwrap_or(false)
    }
}

/// Compiled module patterns anchored at the package id.
///
/// `core.*` becomes `^<package>\.core\..*$`, so a wildcard may span several
/// dotted segments.
#[derive(Debug, Clone)]
pub struct ModulePatterns {
    package_id: String,
    patterns: Vec<Regex>,
}

impl ModulePatterns {
    pub fn new(package_id: &str, patterns: &[String]) -> Result<Self, ConfigError> {
        let compiled = patterns
            .iter()
            .map(|pattern| {
                let body = pattern.split('*').map(regex::escape).collect::<Vec<_>>().join(".*");
                Regex::new(&format!("^{}\\.{}$", regex::escape(package_id), body)).map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            package_id: package_id.to_string(),
            patterns: compiled,
        })
    }

    pub fn is_match(&self, module_name: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(module_name))
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    pub fn as_strs(&self) -> Vec<&str> {
        self.patterns.iter().map(Regex::as_str).collect()
    }
}

/// Strips the package prefix from a dotted module name.
pub fn short_name<'a>(package_id: &str, module_name: &'a str) -> &'a str {
    module_name
        .strip_prefix(package_id)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(module_name)
}
