//! Plan execution.
//!
//! [`Migrator`] reads the ledger, computes a plan and runs it one unit at a
//! time. Each unit and its ledger write share a transaction when the
//! database can roll back DDL. The first failure stops the run; units that
//! completed before it stay applied and recorded.

use crate::error::{MigrateError, MigrateResult};
use crate::ledger::{AppliedState, Ledger};
use crate::loader::MigrationSet;
use crate::options::MigrateOptions;
use crate::plan::{build_plan, Direction, Plan, PlanStep, Target};
use crate::strategy::MigrationKey;
use sd_db::{Database, Executor, LogQueryLogger, QueryLogger};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Where a [`Migrator`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Planning,
    /// Running the step at this index
    Executing(usize),
    Done,
    /// Stopped at the step at this index
    Failed(usize),
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub before: AppliedState,
    pub after: AppliedState,
    /// Names applied, in execution order
    pub applied: Vec<String>,
    /// Names reverted, in execution order
    pub reverted: Vec<String>,
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

impl MigrationReport {
    /// True when the run had nothing to do
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty() && self.reverted.is_empty()
    }
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Whether a unit is recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitState {
    Applied,
    Pending,
    /// In the ledger but not on disk
    Missing,
}

/// One row of `status` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub version: u64,
    pub name: String,
    pub state: UnitState,
}

/// Runs migration plans against one database.
pub struct Migrator {
    db: Arc<dyn Database>,
    logger: Arc<dyn QueryLogger>,
    table: Option<String>,
    column: Option<String>,
    allow_missing: bool,
    use_transactions: Option<bool>,
    state: RunState,
}

impl Migrator {
    /// Create a migrator reporting to the `log` facade
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            db,
            logger: Arc::new(LogQueryLogger),
            table: None,
            column: None,
            allow_missing: false,
            use_transactions: None,
            state: RunState::Idle,
        }
    }

    /// Create a migrator configured from [`MigrateOptions`]
    pub fn from_options(db: Arc<dyn Database>, options: &MigrateOptions) -> Self {
        Self::new(db)
            .with_logger(options.logger.clone())
            .with_table(options.table.clone())
            .with_column(options.column.clone())
            .with_allow_missing(options.allow_missing)
            .with_use_transactions(options.use_transactions)
    }

    /// Report statements and progress to `logger` instead
    pub fn with_logger(mut self, logger: Arc<dyn QueryLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Override the ledger table name
    pub fn with_table(mut self, table: Option<String>) -> Self {
        self.table = table;
        self
    }

    /// Override the ledger column name
    pub fn with_column(mut self, column: Option<String>) -> Self {
        self.column = column;
        self
    }

    /// Tolerate ledger entries whose migrations are gone from disk
    pub fn with_allow_missing(mut self, allow_missing: bool) -> Self {
        self.allow_missing = allow_missing;
        self
    }

    /// Force per-unit transactions on or off; `None` asks the database
    pub fn with_use_transactions(mut self, use_transactions: Option<bool>) -> Self {
        self.use_transactions = use_transactions;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn ledger(&self, set: &MigrationSet) -> Ledger {
        Ledger::new(set.strategy(), self.table.as_deref(), self.column.as_deref())
    }

    fn executor(&self) -> Executor<'_> {
        Executor::new(self.db.as_ref(), self.logger.as_ref())
    }

    fn transactions_enabled(&self) -> bool {
        self.use_transactions
            .unwrap_or_else(|| self.db.supports_transactional_ddl())
    }

    /// Read the ledger, creating it if needed
    pub async fn applied_state(&self, set: &MigrationSet) -> MigrateResult<AppliedState> {
        let ledger = self.ledger(set);
        ledger
            .state(&self.executor())
            .await
            .map_err(|source| MigrateError::Ledger {
                table: ledger.table().to_string(),
                source,
            })
    }

    /// Compute the plan for `target` without running it
    pub async fn plan<'a>(&self, set: &'a MigrationSet, target: Target) -> MigrateResult<Plan<'a>> {
        let state = self.applied_state(set).await?;
        Ok(build_plan(set, &state, target, self.allow_missing)?)
    }

    /// Move the database to `target`.
    pub async fn run(&mut self, set: &MigrationSet, target: Target) -> MigrateResult<MigrationReport> {
        let start = Instant::now();
        self.state = RunState::Planning;

        let ledger = self.ledger(set);
        let before = match self.applied_state(set).await {
            Ok(state) => state,
            Err(e) => {
                self.state = RunState::Idle;
                return Err(e);
            }
        };
        let plan = match build_plan(set, &before, target, self.allow_missing) {
            Ok(plan) => plan,
            Err(e) => {
                self.state = RunState::Idle;
                return Err(e.into());
            }
        };

        if plan.is_empty() {
            log::debug!("Nothing to migrate; already at {}", target);
        } else {
            log::debug!(
                "Migrating to {} in {} step(s): {}",
                target,
                plan.len(),
                plan.describe().join(", ")
            );
        }

        let use_transactions = self.transactions_enabled();
        let exec = Executor::new(self.db.as_ref(), self.logger.as_ref());
        let mut applied = Vec::new();
        let mut reverted = Vec::new();

        for (idx, step) in plan.steps().iter().enumerate() {
            self.state = RunState::Executing(idx);
            let transactional = use_transactions && step.migration.is_transactional();
            if let Err(e) = run_step(&exec, &ledger, step, transactional).await {
                self.state = RunState::Failed(idx);
                return Err(e);
            }
            let name = step.migration.name().to_string();
            match step.direction {
                Direction::Up => applied.push(name),
                Direction::Down => reverted.push(name),
            }
        }

        let after = match ledger.state(&exec).await {
            Ok(state) => state,
            Err(source) => {
                self.state = RunState::Failed(plan.len());
                return Err(MigrateError::Ledger {
                    table: ledger.table().to_string(),
                    source,
                });
            }
        };
        self.state = RunState::Done;

        Ok(MigrationReport {
            before,
            after,
            applied,
            reverted,
            elapsed: start.elapsed(),
        })
    }

    /// Every loaded unit with its applied flag, plus ledger entries that no
    /// longer exist on disk
    pub async fn status(&self, set: &MigrationSet) -> MigrateResult<Vec<MigrationStatus>> {
        let state = self.applied_state(set).await?;
        let mut rows: Vec<MigrationStatus> = set
            .units()
            .iter()
            .map(|m| {
                let is_applied = match &state {
                    AppliedState::Version(v) => m.version() <= *v,
                    AppliedState::Filenames(names) => names.contains(m.name()),
                };
                MigrationStatus {
                    version: m.version(),
                    name: m.name().to_string(),
                    state: if is_applied {
                        UnitState::Applied
                    } else {
                        UnitState::Pending
                    },
                }
            })
            .collect();

        match &state {
            AppliedState::Filenames(names) => {
                for name in names.iter().filter(|n| set.find_name(n).is_none()) {
                    let version = MigrationKey::parse(name)
                        .map(|k| k.version)
                        .unwrap_or(0);
                    rows.push(MigrationStatus {
                        version,
                        name: name.clone(),
                        state: UnitState::Missing,
                    });
                }
                rows.sort_by(|a, b| a.name.cmp(&b.name));
            }
            AppliedState::Version(v) => {
                let highest = set.latest().map(|m| m.version()).unwrap_or(0);
                if *v > highest {
                    rows.push(MigrationStatus {
                        version: *v,
                        name: format!("version {v}"),
                        state: UnitState::Missing,
                    });
                }
            }
        }
        Ok(rows)
    }

    /// Whether running to latest would do nothing
    pub async fn is_current(&self, set: &MigrationSet) -> MigrateResult<bool> {
        Ok(self.plan(set, Target::Latest).await?.is_empty())
    }

    /// Fail with the pending names unless the database is current
    pub async fn check_current(&self, set: &MigrationSet) -> MigrateResult<()> {
        let plan = self.plan(set, Target::Latest).await?;
        if plan.is_empty() {
            return Ok(());
        }
        Err(MigrateError::NotCurrent {
            pending: plan
                .steps()
                .iter()
                .map(|s| s.migration.name().to_string())
                .collect(),
        })
    }
}

impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator")
            .field("db", &self.db.db_type())
            .field("table", &self.table)
            .field("column", &self.column)
            .field("allow_missing", &self.allow_missing)
            .field("use_transactions", &self.use_transactions)
            .field("state", &self.state)
            .finish()
    }
}

/// Run one step, wrapping it and its ledger write in a transaction when asked.
async fn run_step(
    exec: &Executor<'_>,
    ledger: &Ledger,
    step: &PlanStep<'_>,
    transactional: bool,
) -> MigrateResult<()> {
    let migration = step.migration;
    let name = migration.name();
    exec.info(&format!(
        "Begin applying migration {}, direction: {}",
        name, step.direction
    ));
    let start = Instant::now();

    if transactional {
        exec.execute_batch("BEGIN TRANSACTION")
            .await
            .map_err(|source| MigrateError::Transaction {
                migration: name.to_string(),
                source,
            })?;
    }

    let result = apply_and_record(exec, ledger, step).await;

    match result {
        Ok(()) => {
            if transactional {
                if let Err(source) = exec.execute_batch("COMMIT").await {
                    rollback(exec, name).await;
                    return Err(MigrateError::Transaction {
                        migration: name.to_string(),
                        source,
                    });
                }
            }
        }
        Err(e) => {
            if transactional {
                rollback(exec, name).await;
            }
            return Err(e);
        }
    }

    exec.info(&format!(
        "Finished applying migration {}, direction: {}, took {:.6} seconds",
        name,
        step.direction,
        start.elapsed().as_secs_f64()
    ));
    Ok(())
}

async fn apply_and_record(
    exec: &Executor<'_>,
    ledger: &Ledger,
    step: &PlanStep<'_>,
) -> MigrateResult<()> {
    let migration = step.migration;
    let body = migration.body();
    let ran = match step.direction {
        Direction::Up => body.up(exec).await,
        Direction::Down => body.down(exec).await,
    };
    ran.map_err(|source| MigrateError::UnitFailed {
        migration: migration.name().to_string(),
        direction: step.direction,
        source,
    })?;

    let recorded = match step.direction {
        Direction::Up => ledger.record_applied(exec, migration).await,
        Direction::Down => {
            ledger
                .record_reverted(exec, migration, step.resulting_version)
                .await
        }
    };
    recorded.map_err(|source| MigrateError::LedgerWrite {
        migration: migration.name().to_string(),
        direction: step.direction,
        source,
    })
}

async fn rollback(exec: &Executor<'_>, name: &str) {
    if let Err(e) = exec.execute_batch("ROLLBACK").await {
        log::warn!("ROLLBACK after migration '{}' failed: {}", name, e);
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
