//! sd-db - Database layer for Sediment
//!
//! This crate provides the `Database` trait, its DuckDB implementation, and
//! the `Executor` that times every statement and reports it to a
//! `QueryLogger`.

pub mod duckdb;
pub mod error;
pub mod executor;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use executor::{Executor, LogEvent, LogQueryLogger, QueryLogger, RecordingLogger};
pub use traits::Database;
