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

//! Modloader CLI
//!
//! Main entry point for the `modloader` command-line interface.

use clap::{ArgAction, Parser, Subcommand};
use modloader_tools::cli::check::{CheckArgs, run_check};
use modloader_tools::cli::load::{LoadArgs, run_load};
use modloader_tools::cli::plan::{PlanArgs, run_plan};
use tracing::Level;

#[derive(Parser)]
#[command(name = "modloader")]
#[command(about = "Modloader - dependency-aware plugin module loader")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the load order derived for a package
    Plan(PlanArgs),
    /// Parse every module source and report failures
    Check(CheckArgs),
    /// Load, register and tear down a package against a logging host
    Load(LoadArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();

    match cli.command {
        Commands::Plan(args) => run_plan(args),
        Commands::Check(args) => run_check(args),
        Commands::Load(args) => run_load(args),
    }
}
