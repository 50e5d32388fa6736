//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use sd_core::Config;
use sd_db::{Database, DuckDbBackend};
use sd_migrate::{MigrateOptions, MigrationLoader, MigrationSet, Migrator};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main prints nothing for it.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// A loaded project: its root directory and parsed configuration.
#[derive(Debug, Clone)]
pub(crate) struct Project {
    pub root: PathBuf,
    pub config: Config,
}

impl Project {
    pub fn migrations_dir(&self) -> PathBuf {
        self.config.migrations_path_absolute(&self.root)
    }
}

/// Load the project config from `--config` or the project directory.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let config = match &global.config {
        Some(path) => Config::load(path),
        None => Config::load_from_dir(&global.project_dir),
    }
    .context("Failed to load project")?;
    Ok(Project {
        root: global.project_dir.clone(),
        config,
    })
}

/// Open the project database, honoring `--database`.
pub(crate) fn create_database_connection(
    project: &Project,
    global: &GlobalArgs,
) -> Result<Arc<dyn Database>> {
    let path = match &global.database {
        Some(path) => path.clone(),
        None => project.config.database_path(&project.root),
    };
    log::debug!("Opening database {}", path);
    let db: Arc<dyn Database> =
        Arc::new(DuckDbBackend::new(&path).context("Failed to connect to database")?);
    Ok(db)
}

/// Read the project's migrations directory.
pub(crate) fn load_migrations(project: &Project) -> Result<MigrationSet> {
    let strategy = project.config.strategy.map(Into::into);
    let set = MigrationLoader::new(project.migrations_dir())
        .with_strategy(strategy)
        .load()
        .context("Failed to load migrations")?;
    Ok(set)
}

/// Build a migrator from the project configuration.
pub(crate) fn create_migrator(project: &Project, db: Arc<dyn Database>) -> Migrator {
    Migrator::from_options(db, &MigrateOptions::from_config(&project.config))
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
