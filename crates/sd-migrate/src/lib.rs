//! Migration engine for Sediment.
//!
//! Loads ordered migration units from a directory, compares them with the
//! applied state recorded in the target database, and runs the steps needed
//! to reach a target version. See [`migrate`] for the one-call entry point
//! and [`Migrator`] for finer control.

pub mod error;
pub mod ledger;
pub mod loader;
pub mod options;
pub mod plan;
pub mod runner;
pub mod strategy;
pub mod unit;

pub use error::{LoadError, LoadResult, MigrateError, MigrateResult, PlanningError};
pub use ledger::{AppliedState, IntegerLedger, Ledger, TimestampLedger};
pub use loader::{MigrationLoader, MigrationSet};
pub use options::MigrateOptions;
pub use plan::{build_plan, Direction, Plan, PlanStep, Target};
pub use runner::{MigrationReport, MigrationStatus, Migrator, RunState, UnitState};
pub use strategy::{MigrationKey, Strategy};
pub use unit::{Migration, MigrationBody, SqlBody};

use sd_db::Database;
use std::path::Path;
use std::sync::Arc;

/// Load `dir` and move `db` to `options.target`.
///
/// Loading and planning errors are returned before any migration runs.
pub async fn migrate(
    db: Arc<dyn Database>,
    dir: &Path,
    options: MigrateOptions,
) -> MigrateResult<MigrationReport> {
    let set = MigrationLoader::new(dir)
        .with_strategy(options.strategy)
        .load()?;
    let mut migrator = Migrator::from_options(db, &options);
    migrator.run(&set, options.target).await
}
