//! Error types for the migration engine.

use crate::plan::Direction;
use sd_db::DbError;
use thiserror::Error;

/// Errors raised while reading a migrations directory.
///
/// All of these surface before any database I/O.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Migrations directory missing (L001).
    #[error("[L001] Migrations directory not found: {path}")]
    DirectoryNotFound { path: String },

    /// Directory or file could not be read (L002).
    #[error("[L002] Failed to read '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// A `.sql` file whose name has no usable ordering key (L003).
    #[error("[L003] Invalid migration filename '{file}': {reason}")]
    InvalidFilename { file: String, reason: String },

    /// Two migrations share an ordering key (L004).
    #[error("[L004] Duplicate migration key {key}: '{first}' and '{second}'")]
    DuplicateKey {
        key: String,
        first: String,
        second: String,
    },

    /// Sequence-numbered and timestamped files in one directory (L005).
    #[error("[L005] Directory mixes integer ('{integer}') and timestamp ('{timestamp}') migrations")]
    MixedStrategies { integer: String, timestamp: String },

    /// Migration file contents could not be split into up/down (L006).
    #[error("[L006] Malformed migration '{file}': {reason}")]
    MalformedUnit { file: String, reason: String },

    /// One half of an `.up.sql` / `.down.sql` pair is missing (L007).
    #[error("[L007] Migration '{name}' is missing its {missing} file")]
    MissingHalf { name: String, missing: String },
}

/// Result type alias for [`LoadError`].
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors raised while computing a plan from ledger state and target.
#[derive(Error, Debug)]
pub enum PlanningError {
    /// Target does not correspond to a loaded migration (P001).
    #[error("[P001] Invalid target {target}: {reason}")]
    UnknownTarget { target: String, reason: String },

    /// The ledger records migrations that are no longer on disk (P002).
    #[error("[P002] Applied migrations not found on disk: {}", .names.join(", "))]
    MissingAppliedMigrations { names: Vec<String> },

    /// A revert would pass through a migration with no down step (P003).
    #[error("[P003] Migration '{migration}' is irreversible and cannot be reverted")]
    Irreversible { migration: String },
}

/// Top-level error returned by [`crate::migrate`] and [`crate::Migrator`].
#[derive(Error, Debug)]
pub enum MigrateError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Planning(#[from] PlanningError),

    /// Reading or creating the ledger table failed (R001).
    #[error("[R001] Ledger table '{table}' could not be read: {source}")]
    Ledger {
        table: String,
        #[source]
        source: DbError,
    },

    /// A migration's own statements failed (R002).
    #[error("[R002] Migration '{migration}' failed ({direction}): {source}")]
    UnitFailed {
        migration: String,
        direction: Direction,
        #[source]
        source: DbError,
    },

    /// The migration ran but its ledger row could not be written (R003).
    #[error("[R003] Migration '{migration}' ran ({direction}) but the ledger update failed: {source}")]
    LedgerWrite {
        migration: String,
        direction: Direction,
        #[source]
        source: DbError,
    },

    /// BEGIN or COMMIT around a migration failed (R004).
    #[error("[R004] Transaction around migration '{migration}' failed: {source}")]
    Transaction {
        migration: String,
        #[source]
        source: DbError,
    },

    /// Pending migrations exist where none were expected (R005).
    #[error("[R005] Database is not current, pending: {}", .pending.join(", "))]
    NotCurrent { pending: Vec<String> },
}

impl MigrateError {
    /// Name of the migration this error is attributed to, if any
    pub fn migration(&self) -> Option<&str> {
        match self {
            MigrateError::UnitFailed { migration, .. }
            | MigrateError::LedgerWrite { migration, .. }
            | MigrateError::Transaction { migration, .. } => Some(migration),
            MigrateError::Planning(PlanningError::Irreversible { migration }) => Some(migration),
            _ => None,
        }
    }
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;
