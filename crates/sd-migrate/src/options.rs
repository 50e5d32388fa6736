//! Options for the [`crate::migrate`] entry point.

use crate::plan::Target;
use crate::strategy::Strategy;
use sd_core::Config;
use sd_db::{LogQueryLogger, QueryLogger};
use std::fmt;
use std::sync::Arc;

/// Everything a single `migrate` call can be told.
#[derive(Clone)]
pub struct MigrateOptions {
    /// Where to leave the database
    pub target: Target,
    /// Force a strategy instead of detecting it from filenames
    pub strategy: Option<Strategy>,
    /// Ledger table override
    pub table: Option<String>,
    /// Ledger column override
    pub column: Option<String>,
    /// Accept ledger entries with no matching file
    pub allow_missing: bool,
    /// Per-unit transactions; `None` follows the database's DDL support
    pub use_transactions: Option<bool>,
    /// Receiver for statements and progress messages
    pub logger: Arc<dyn QueryLogger>,
}

impl Default for MigrateOptions {
    fn default() -> Self {
        Self {
            target: Target::Latest,
            strategy: None,
            table: None,
            column: None,
            allow_missing: false,
            use_transactions: None,
            logger: Arc::new(LogQueryLogger),
        }
    }
}

impl MigrateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options carrying the project configuration's ledger and strategy settings
    pub fn from_config(config: &Config) -> Self {
        Self {
            strategy: config.strategy.map(Strategy::from),
            table: config.ledger.table.clone(),
            column: config.ledger.column.clone(),
            allow_missing: config.allow_missing,
            use_transactions: config.use_transactions,
            ..Self::default()
        }
    }

    pub fn target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn allow_missing(mut self, allow_missing: bool) -> Self {
        self.allow_missing = allow_missing;
        self
    }

    pub fn use_transactions(mut self, use_transactions: bool) -> Self {
        self.use_transactions = Some(use_transactions);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn QueryLogger>) -> Self {
        self.logger = logger;
        self
    }
}

impl fmt::Debug for MigrateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrateOptions")
            .field("target", &self.target)
            .field("strategy", &self.strategy)
            .field("table", &self.table)
            .field("column", &self.column)
            .field("allow_missing", &self.allow_missing)
            .field("use_transactions", &self.use_transactions)
            .finish_non_exhaustive()
    }
}
