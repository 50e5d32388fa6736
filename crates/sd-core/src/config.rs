//! Configuration types and parsing for sediment.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration from sediment.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Directory holding the migration files, relative to the project root
    #[serde(default = "default_migrations_path")]
    pub migrations_path: String,

    /// Force an ordering-key strategy instead of detecting it from filenames
    #[serde(default)]
    pub strategy: Option<StrategyKind>,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Ledger table overrides
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Wrap each migration in its own transaction.
    ///
    /// Unset means "when the backend supports transactional DDL".
    #[serde(default)]
    pub use_transactions: Option<bool>,

    /// Tolerate ledger entries whose migration file is gone
    #[serde(default)]
    pub allow_missing: bool,
}

/// Ordering-key strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Sequential integer prefixes (`001_create_users.sql`)
    Integer,
    /// Timestamp prefixes (`20240131120000_create_users.sql`)
    Timestamp,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::Integer => write!(f, "integer"),
            StrategyKind::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database path (DuckDB file or :memory:)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Ledger table and column overrides.
///
/// Defaults depend on the strategy and are filled in by the migration engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// Ledger table name, optionally schema-qualified
    #[serde(default)]
    pub table: Option<String>,

    /// Ledger column name
    #[serde(default)]
    pub column: Option<String>,
}

const DEFAULT_DB_PATH: &str = ":memory:";

const DEFAULT_MIGRATIONS_PATH: &str = "migrations";

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_migrations_path() -> String {
    DEFAULT_MIGRATIONS_PATH.to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        log::debug!("Loaded config '{}' from {}", config.name, path.display());
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for sediment.yml or sediment.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("sediment.yml");
        let yaml_path = dir.join("sediment.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }

        if self.migrations_path.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "migrations_path cannot be empty".to_string(),
            });
        }

        for (field, value) in [("table", &self.ledger.table), ("column", &self.ledger.column)] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(CoreError::ConfigInvalid {
                    message: format!("ledger.{field} cannot be empty when set"),
                });
            }
        }

        Ok(())
    }

    /// Absolute migrations directory for a project root
    pub fn migrations_path_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.migrations_path)
    }

    /// Database path, resolving relative file paths against the project root
    pub fn database_path(&self, root: &Path) -> String {
        let path = &self.database.path;
        if path == DEFAULT_DB_PATH || Path::new(path).is_absolute() {
            path.clone()
        } else {
            root.join(path).display().to_string()
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
