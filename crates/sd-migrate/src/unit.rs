//! Migration units: one ordered schema change with an `up` and a `down`.
//!
//! Units on disk come in two encodings, a single file with
//! `-- migrate:up` / `-- migrate:down` sections or an `.up.sql` / `.down.sql`
//! pair. Both are normalized into a [`SqlBody`]. Units defined in code
//! implement [`MigrationBody`] directly.

use crate::strategy::MigrationKey;
use async_trait::async_trait;
use regex::Regex;
use sd_db::{DbError, DbResult, Executor};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// The operations a migration unit exposes.
#[async_trait]
pub trait MigrationBody: Send + Sync {
    /// Apply the change
    async fn up(&self, exec: &Executor<'_>) -> DbResult<()>;

    /// Undo the change
    async fn down(&self, exec: &Executor<'_>) -> DbResult<()>;

    /// Whether `down` can be run. Irreversible units block any plan that
    /// would revert them.
    fn is_reversible(&self) -> bool {
        true
    }

    /// Whether the runner may wrap this unit in a transaction
    fn is_transactional(&self) -> bool {
        true
    }
}

/// A migration whose steps are SQL scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlBody {
    up: String,
    down: Option<String>,
    transactional: bool,
}

impl SqlBody {
    pub fn new(up: impl Into<String>, down: Option<String>) -> Self {
        Self {
            up: up.into(),
            down,
            transactional: true,
        }
    }

    /// Opt out of the per-migration transaction
    pub fn without_transaction(mut self) -> Self {
        self.transactional = false;
        self
    }

    pub fn up_sql(&self) -> &str {
        &self.up
    }

    pub fn down_sql(&self) -> Option<&str> {
        self.down.as_deref()
    }

    /// Parse the single-file encoding.
    ///
    /// Only blank lines and `--` comments may precede `-- migrate:up`;
    /// `-- migrate:no-transaction` is accepted there too. `-- migrate:down` is
    /// optional and must follow the up section.
    pub fn parse(source: &str) -> Result<Self, String> {
        let mut header_no_tx = false;
        let mut up: Option<Vec<&str>> = None;
        let mut down: Option<Vec<&str>> = None;

        for (idx, line) in source.lines().enumerate() {
            let line_no = idx + 1;
            match marker(line) {
                Some(Marker::Up) => {
                    if up.is_some() {
                        return Err(format!("line {line_no}: duplicate '-- migrate:up'"));
                    }
                    up = Some(Vec::new());
                }
                Some(Marker::Down) => {
                    if up.is_none() {
                        return Err(format!(
                            "line {line_no}: '-- migrate:down' before '-- migrate:up'"
                        ));
                    }
                    if down.is_some() {
                        return Err(format!("line {line_no}: duplicate '-- migrate:down'"));
                    }
                    down = Some(Vec::new());
                }
                Some(Marker::NoTransaction) => {
                    if up.is_some() {
                        return Err(format!(
                            "line {line_no}: '-- migrate:no-transaction' must precede '-- migrate:up'"
                        ));
                    }
                    header_no_tx = true;
                }
                None => {
                    if let Some(section) = down.as_mut() {
                        section.push(line);
                    } else if let Some(section) = up.as_mut() {
                        section.push(line);
                    } else if !is_comment_or_blank(line) {
                        return Err(format!(
                            "line {line_no}: SQL found before '-- migrate:up'"
                        ));
                    }
                }
            }
        }

        let up = up.ok_or_else(|| "missing '-- migrate:up' marker".to_string())?;
        let body = SqlBody::new(join_section(&up), down.map(|d| join_section(&d)));
        Ok(if header_no_tx {
            body.without_transaction()
        } else {
            body
        })
    }
}

#[async_trait]
impl MigrationBody for SqlBody {
    async fn up(&self, exec: &Executor<'_>) -> DbResult<()> {
        run_script(exec, &self.up).await
    }

    async fn down(&self, exec: &Executor<'_>) -> DbResult<()> {
        match &self.down {
            Some(sql) => run_script(exec, sql).await,
            None => Err(DbError::Query {
                sql: "-- migrate:down".to_string(),
                message: "migration has no down section".to_string(),
                detail: None,
            }),
        }
    }

    fn is_reversible(&self) -> bool {
        self.down.is_some()
    }

    fn is_transactional(&self) -> bool {
        self.transactional
    }
}

async fn run_script(exec: &Executor<'_>, sql: &str) -> DbResult<()> {
    if sql.lines().all(is_comment_or_blank) {
        return Ok(());
    }
    exec.execute_batch(sql).await
}

enum Marker {
    Up,
    Down,
    NoTransaction,
}

fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*--\s*migrate:(up|down|no-transaction)\s*$").expect("valid regex literal")
    })
}

fn marker(line: &str) -> Option<Marker> {
    let caps = marker_pattern().captures(line)?;
    match &caps[1] {
        "up" => Some(Marker::Up),
        "down" => Some(Marker::Down),
        _ => Some(Marker::NoTransaction),
    }
}

fn is_comment_or_blank(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with("--")
}

fn join_section(lines: &[&str]) -> String {
    lines.join("\n").trim().to_string()
}

/// One loaded migration: its key plus the operations behind it.
pub struct Migration {
    key: MigrationKey,
    body: Box<dyn MigrationBody>,
    source: Option<PathBuf>,
}

impl Migration {
    pub fn new(key: MigrationKey, body: impl MigrationBody + 'static) -> Self {
        Self {
            key,
            body: Box::new(body),
            source: None,
        }
    }

    /// Record the file this migration was read from
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    pub fn key(&self) -> &MigrationKey {
        &self.key
    }

    pub fn version(&self) -> u64 {
        self.key.version
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn body(&self) -> &dyn MigrationBody {
        self.body.as_ref()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn is_reversible(&self) -> bool {
        self.body.is_reversible()
    }

    pub fn is_transactional(&self) -> bool {
        self.body.is_transactional()
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("key", &self.key)
            .field("source", &self.source)
            .field("reversible", &self.is_reversible())
            .finish()
    }
}

#[cfg(test)]
#[path = "unit_test.rs"]
mod tests;
