//! Ordering-key strategies and migration filename parsing.
//!
//! Every migration filename starts with a run of digits followed by `_`.
//! Whether those digits are a sequence number or a timestamp decides how the
//! whole directory is ordered and how the ledger records progress; that
//! decision is made once, when the directory is loaded.

use crate::error::{LoadError, LoadResult};
use regex::Regex;
use sd_core::StrategyKind;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

/// Numeric prefixes above this value are read as `YYYYMMDD...` timestamps.
pub const TIMESTAMP_THRESHOLD: u64 = 20_000_101;

/// How migrations are ordered and how applied state is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Sequence numbers; the ledger stores a single current version.
    Integer,
    /// Timestamped names; the ledger stores every applied filename.
    Timestamp,
}

impl Strategy {
    /// Strategy implied by a single numeric prefix
    pub fn for_version(version: u64) -> Self {
        if version > TIMESTAMP_THRESHOLD {
            Strategy::Timestamp
        } else {
            Strategy::Integer
        }
    }

    /// Pick the strategy for a directory from its keys.
    ///
    /// An empty directory is `Integer`. Keys of both kinds are an error.
    pub fn detect<'a, I>(keys: I) -> LoadResult<Self>
    where
        I: IntoIterator<Item = &'a MigrationKey>,
    {
        let mut integer: Option<&MigrationKey> = None;
        let mut timestamp: Option<&MigrationKey> = None;
        for key in keys {
            match Strategy::for_version(key.version) {
                Strategy::Integer => integer = integer.or(Some(key)),
                Strategy::Timestamp => timestamp = timestamp.or(Some(key)),
            }
        }
        match (integer, timestamp) {
            (Some(i), Some(t)) => Err(LoadError::MixedStrategies {
                integer: i.name.clone(),
                timestamp: t.name.clone(),
            }),
            (None, Some(_)) => Ok(Strategy::Timestamp),
            _ => Ok(Strategy::Integer),
        }
    }

    /// Sort order of two keys under this strategy
    pub fn compare(&self, a: &MigrationKey, b: &MigrationKey) -> Ordering {
        match self {
            Strategy::Integer => a.version.cmp(&b.version).then_with(|| a.name.cmp(&b.name)),
            Strategy::Timestamp => a.name.cmp(&b.name),
        }
    }

    /// Whether two keys collide under this strategy
    pub fn conflicts(&self, a: &MigrationKey, b: &MigrationKey) -> bool {
        match self {
            Strategy::Integer => a.version == b.version,
            Strategy::Timestamp => a.name == b.name,
        }
    }

    /// Printable form of the part of a key that must be unique
    pub fn describe_key(&self, key: &MigrationKey) -> String {
        match self {
            Strategy::Integer => key.version.to_string(),
            Strategy::Timestamp => key.name.clone(),
        }
    }

    /// Ledger table used when none is configured
    pub fn default_table(&self) -> &'static str {
        match self {
            Strategy::Integer => "schema_info",
            Strategy::Timestamp => "schema_migrations",
        }
    }

    /// Ledger column used when none is configured
    pub fn default_column(&self) -> &'static str {
        match self {
            Strategy::Integer => "version",
            Strategy::Timestamp => "filename",
        }
    }
}

impl From<StrategyKind> for Strategy {
    fn from(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Integer => Strategy::Integer,
            StrategyKind::Timestamp => Strategy::Timestamp,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Integer => write!(f, "integer"),
            Strategy::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// Ordering key of one migration: its numeric prefix and its filename stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MigrationKey {
    /// Leading digits of the filename
    pub version: u64,
    /// Filename without `.sql` / `.up.sql` / `.down.sql`, e.g. `001_create_class`
    pub name: String,
}

impl MigrationKey {
    pub fn new(version: u64, name: impl Into<String>) -> Self {
        Self {
            version,
            name: name.into(),
        }
    }

    /// Build a key from a name like `003_join_table`
    pub fn parse(name: &str) -> LoadResult<Self> {
        let digits: &str = name
            .split_once('_')
            .map(|(prefix, _)| prefix)
            .filter(|prefix| !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| LoadError::InvalidFilename {
                file: name.to_string(),
                reason: "expected a numeric prefix followed by '_'".to_string(),
            })?;
        let version = parse_version(name, digits)?;
        Ok(Self::new(version, name))
    }
}

impl fmt::Display for MigrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Which part of a migration a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileRole {
    /// `NNN_name.sql` with both sections
    Single,
    /// `NNN_name.up.sql`
    Up,
    /// `NNN_name.down.sql`
    Down,
}

/// A migration filename split into key and role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedFilename {
    pub key: MigrationKey,
    pub role: FileRole,
}

fn filename_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<digits>\d+)_(?P<desc>.+?)(?P<role>\.up|\.down)?\.sql$")
            .expect("valid regex literal")
    })
}

fn parse_version(file: &str, digits: &str) -> LoadResult<u64> {
    digits.parse::<u64>().map_err(|e| LoadError::InvalidFilename {
        file: file.to_string(),
        reason: format!("numeric prefix '{digits}' is not a valid version: {e}"),
    })
}

/// Parse a directory entry name.
///
/// Returns `Ok(None)` for files that are not migrations at all (no `.sql`
/// extension, hidden files) and an error for `.sql` files whose name does not
/// carry an ordering key.
pub(crate) fn parse_filename(file_name: &str) -> LoadResult<Option<ParsedFilename>> {
    if file_name.starts_with('.') || !file_name.ends_with(".sql") {
        return Ok(None);
    }

    let caps = filename_pattern()
        .captures(file_name)
        .ok_or_else(|| LoadError::InvalidFilename {
            file: file_name.to_string(),
            reason: "expected '<digits>_<description>.sql'".to_string(),
        })?;

    let digits = &caps["digits"];
    let version = parse_version(file_name, digits)?;
    let role = match caps.name("role").map(|m| m.as_str()) {
        Some(".up") => FileRole::Up,
        Some(".down") => FileRole::Down,
        _ => FileRole::Single,
    };
    let name = format!("{}_{}", digits, &caps["desc"]);

    Ok(Some(ParsedFilename {
        key: MigrationKey::new(version, name),
        role,
    }))
}

#[cfg(test)]
#[path = "strategy_test.rs"]
mod tests;
