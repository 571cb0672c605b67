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

//! Subcommands of the `modloader` binary.

pub mod check;
pub mod load;
pub mod plan;

use clap::Args;
use std::path::PathBuf;

/// Package selection shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct LoaderArgs {
    /// Loader configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Package root directory
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Module pattern relative to the package, e.g. `core.*` (repeatable)
    #[arg(short, long = "pattern", value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Package id; defaults to the root directory name
    #[arg(long)]
    pub package_id: Option<String>,

    /// Module source file extension
    #[arg(long, value_name = "EXT")]
    pub extension: Option<String>,

    /// Log the numbered load order
    #[arg(long)]
    pub debug_loader: bool,
}
