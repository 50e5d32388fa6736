//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Sediment - versioned schema migrations for DuckDB
#[derive(Parser, Debug)]
#[command(name = "sediment")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Log every executed statement with its timing
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: PathBuf,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the database path from the config
    #[arg(short, long, global = true, env = "SEDIMENT_DATABASE")]
    pub database: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply or revert migrations to reach a target version
    Migrate(MigrateArgs),

    /// Show which migrations are applied, pending, or missing
    Status(StatusArgs),

    /// Exit non-zero if any migration is pending
    Check,

    /// Create a new migration file
    New(NewArgs),
}

/// Arguments for the migrate command
#[derive(Args, Debug, Default)]
pub struct MigrateArgs {
    /// Target version ("latest", "initial", a version, or 0/negative for initial)
    #[arg(short, long, allow_hyphen_values = true, conflicts_with = "relative")]
    pub target: Option<String>,

    /// Move this many migrations forward (positive) or back (negative)
    #[arg(short, long, allow_hyphen_values = true)]
    pub relative: Option<i64>,

    /// Print the plan without running it
    #[arg(long)]
    pub dry_run: bool,

    /// Tolerate applied migrations whose files are gone
    #[arg(long)]
    pub allow_missing: bool,

    /// Do not wrap each migration in a transaction
    #[arg(long)]
    pub no_transaction: bool,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: StatusOutput,
}

/// Status output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutput {
    /// Table format
    Table,
    /// JSON output
    Json,
}

/// Arguments for the new command
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Short description, used in the filename
    pub description: String,

    /// Use a YYYYMMDDHHMMSS prefix instead of the next sequence number
    #[arg(long)]
    pub timestamp: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
