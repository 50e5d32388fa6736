//! Applied-state ledger kept inside the target database.
//!
//! The integer strategy stores one row holding the current version; the
//! timestamp strategy stores one row per applied migration name. The table is
//! created on first read. Each recorded step is a single write, issued by the
//! runner right after the migration's own statements succeed.

use crate::strategy::Strategy;
use crate::unit::Migration;
use sd_core::sql::{quote_ident, quote_qualified, schema_of, string_literal};
use sd_db::{DbResult, Executor};
use serde::Serialize;
use std::collections::BTreeSet;

/// Persisted progress, as read from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AppliedState {
    /// Every unit with key ≤ this version is applied
    Version(u64),
    /// Names of applied units
    Filenames(BTreeSet<String>),
}

impl AppliedState {
    /// Whether nothing has been applied
    pub fn is_initial(&self) -> bool {
        match self {
            AppliedState::Version(v) => *v == 0,
            AppliedState::Filenames(names) => names.is_empty(),
        }
    }
}

impl std::fmt::Display for AppliedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppliedState::Version(v) => write!(f, "version {v}"),
            AppliedState::Filenames(names) => write!(f, "{} applied", names.len()),
        }
    }
}

/// Ledger for the integer strategy: one row, one version column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegerLedger {
    table: String,
    column: String,
}

impl IntegerLedger {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }

    async fn ensure(&self, exec: &Executor<'_>) -> DbResult<()> {
        let table = quote_qualified(&self.table);
        if !exec.relation_exists(&self.table).await? {
            create_schema_for(exec, &self.table).await?;
            exec.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table} ({} BIGINT NOT NULL)",
                quote_ident(&self.column)
            ))
            .await?;
        }
        let rows = exec
            .query_i64(&format!("SELECT COUNT(*) FROM {table}"))
            .await?
            .unwrap_or(0);
        if rows == 0 {
            exec.execute(&format!(
                "INSERT INTO {table} ({}) VALUES (0)",
                quote_ident(&self.column)
            ))
            .await?;
        }
        Ok(())
    }

    async fn current_version(&self, exec: &Executor<'_>) -> DbResult<u64> {
        let version = exec
            .query_i64(&format!(
                "SELECT CAST(MAX({}) AS BIGINT) FROM {}",
                quote_ident(&self.column),
                quote_qualified(&self.table)
            ))
            .await?
            .unwrap_or(0);
        // Negative versions never come from this engine; treat as nothing applied.
        Ok(u64::try_from(version).unwrap_or(0))
    }

    async fn set_version(&self, exec: &Executor<'_>, version: u64) -> DbResult<()> {
        exec.execute(&format!(
            "UPDATE {} SET {} = {version}",
            quote_qualified(&self.table),
            quote_ident(&self.column)
        ))
        .await?;
        Ok(())
    }
}

/// Ledger for the timestamp strategy: one row per applied name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampLedger {
    table: String,
    column: String,
}

impl TimestampLedger {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }

    async fn ensure(&self, exec: &Executor<'_>) -> DbResult<()> {
        if exec.relation_exists(&self.table).await? {
            return Ok(());
        }
        create_schema_for(exec, &self.table).await?;
        exec.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} ({} VARCHAR PRIMARY KEY)",
            quote_qualified(&self.table),
            quote_ident(&self.column)
        ))
        .await
    }

    async fn applied(&self, exec: &Executor<'_>) -> DbResult<BTreeSet<String>> {
        let column = quote_ident(&self.column);
        let names = exec
            .query_strings(&format!(
                "SELECT {column} FROM {} ORDER BY {column}",
                quote_qualified(&self.table)
            ))
            .await?;
        Ok(names.into_iter().collect())
    }

    async fn insert(&self, exec: &Executor<'_>, name: &str) -> DbResult<()> {
        exec.execute(&format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_qualified(&self.table),
            quote_ident(&self.column),
            string_literal(name)
        ))
        .await?;
        Ok(())
    }

    async fn delete(&self, exec: &Executor<'_>, name: &str) -> DbResult<()> {
        exec.execute(&format!(
            "DELETE FROM {} WHERE {} = {}",
            quote_qualified(&self.table),
            quote_ident(&self.column),
            string_literal(name)
        ))
        .await?;
        Ok(())
    }
}

async fn create_schema_for(exec: &Executor<'_>, table: &str) -> DbResult<()> {
    if let Some(schema) = schema_of(table) {
        exec.execute_batch(&format!(
            "CREATE SCHEMA IF NOT EXISTS {}",
            quote_qualified(schema)
        ))
        .await?;
    }
    Ok(())
}

/// The ledger matching a strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ledger {
    Integer(IntegerLedger),
    Timestamp(TimestampLedger),
}

impl Ledger {
    /// Ledger for `strategy`, falling back to the strategy's default
    /// table and column names.
    pub fn new(strategy: Strategy, table: Option<&str>, column: Option<&str>) -> Self {
        let table = table.unwrap_or(strategy.default_table());
        let column = column.unwrap_or(strategy.default_column());
        match strategy {
            Strategy::Integer => Ledger::Integer(IntegerLedger::new(table, column)),
            Strategy::Timestamp => Ledger::Timestamp(TimestampLedger::new(table, column)),
        }
    }

    pub fn table(&self) -> &str {
        match self {
            Ledger::Integer(l) => &l.table,
            Ledger::Timestamp(l) => &l.table,
        }
    }

    /// Create the ledger table (and its schema) if absent
    pub async fn ensure(&self, exec: &Executor<'_>) -> DbResult<()> {
        match self {
            Ledger::Integer(l) => l.ensure(exec).await,
            Ledger::Timestamp(l) => l.ensure(exec).await,
        }
    }

    /// Read the persisted state, creating the table with its default first
    pub async fn state(&self, exec: &Executor<'_>) -> DbResult<AppliedState> {
        self.ensure(exec).await?;
        match self {
            Ledger::Integer(l) => Ok(AppliedState::Version(l.current_version(exec).await?)),
            Ledger::Timestamp(l) => Ok(AppliedState::Filenames(l.applied(exec).await?)),
        }
    }

    /// Applied names in ascending order, for display.
    ///
    /// Integer ledgers have no names; they return an empty list.
    pub async fn applied_filenames(&self, exec: &Executor<'_>) -> DbResult<Vec<String>> {
        match self {
            Ledger::Integer(_) => Ok(Vec::new()),
            Ledger::Timestamp(l) => {
                l.ensure(exec).await?;
                Ok(l.applied(exec).await?.into_iter().collect())
            }
        }
    }

    /// Record that `migration` was applied
    pub async fn record_applied(&self, exec: &Executor<'_>, migration: &Migration) -> DbResult<()> {
        match self {
            Ledger::Integer(l) => l.set_version(exec, migration.version()).await,
            Ledger::Timestamp(l) => l.insert(exec, migration.name()).await,
        }
    }

    /// Record that `migration` was reverted.
    ///
    /// `previous_version` is the version the integer ledger falls back to:
    /// the key of the next lower loaded migration, or 0.
    pub async fn record_reverted(
        &self,
        exec: &Executor<'_>,
        migration: &Migration,
        previous_version: u64,
    ) -> DbResult<()> {
        match self {
            Ledger::Integer(l) => l.set_version(exec, previous_version).await,
            Ledger::Timestamp(l) => l.delete(exec, migration.name()).await,
        }
    }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
