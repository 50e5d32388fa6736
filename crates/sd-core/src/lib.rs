//! sd-core - Core library for Sediment
//!
//! Shared project configuration (`sediment.yml`) and SQL quoting helpers
//! used by the database layer, the migration engine, and the CLI.

pub mod config;
pub mod error;
pub mod sql;

pub use config::{Config, DatabaseConfig, LedgerConfig, StrategyKind};
pub use error::{CoreError, CoreResult};
