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

//! Configuration resolution for the CLI.
//!
//! Precedence, highest first: command-line flags, `$MODLOADER_ROOT` for the
//! root, a config file from `--config` or `$MODLOADER_CONFIG`, then defaults.

use anyhow::{Context, Result};
use modloader_core::LoaderConfig;
use std::path::{Path, PathBuf};

use crate::cli::LoaderArgs;

pub const CONFIG_ENV: &str = "MODLOADER_CONFIG";
pub const ROOT_ENV: &str = "MODLOADER_ROOT";

/// Reads a TOML loader configuration. Missing keys take their defaults.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<LoaderConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    let config: LoaderConfig = toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

pub fn save_to_file(config: &LoaderConfig, path: impl AsRef<Path>) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn resolve_config(args: &LoaderArgs) -> Result<LoaderConfig> {
    let mut config = if let Some(config_path) = &args.config {
        load_from_file(config_path)?
    } else if let Ok(env_config) = std::env::var(CONFIG_ENV) {
        load_from_file(env_config)?
    } else {
        LoaderConfig::default()
    };

    if let Some(root) = &args.root {
        config.root = root.clone();
    } else if let Ok(env_root) = std::env::var(ROOT_ENV) {
        config.root = PathBuf::from(env_root);
    }

    if !args.patterns.is_empty() {
        config.patterns = args.patterns.clone();
    }
    if args.package_id.is_some() {
        config.package_id = args.package_id.clone();
    }
    if let Some(extension) = &args.extension {
        config.source_extension = extension.clone();
    }
    if args.debug_loader {
        config.debug_loader = true;
    }

    if config.patterns.is_empty() {
        config.patterns.push("*".to_string());
    }
    Ok(config)
}
