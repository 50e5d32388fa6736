//! Timed statement execution.
//!
//! Every statement the migration engine issues goes through an [`Executor`],
//! which measures it and reports it to a [`QueryLogger`]. The logger is an
//! explicit dependency so that independent runs (and tests) each observe
//! only their own statements.

use crate::error::{DbError, DbResult};
use crate::traits::Database;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Receiver for statement timings and engine progress messages.
pub trait QueryLogger: Send + Sync {
    /// A statement completed successfully
    fn log_query(&self, sql: &str, elapsed: Duration);

    /// A statement failed
    fn log_error(&self, sql: &str, elapsed: Duration, error: &DbError);

    /// A progress message that is not a statement
    fn log_info(&self, message: &str);
}

/// [`QueryLogger`] that forwards to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogQueryLogger;

impl QueryLogger for LogQueryLogger {
    fn log_query(&self, sql: &str, elapsed: Duration) {
        log::info!("({:.6}s) {}", elapsed.as_secs_f64(), sql);
    }

    fn log_error(&self, sql: &str, elapsed: Duration, error: &DbError) {
        log::error!("({:.6}s) {}: {}", elapsed.as_secs_f64(), sql, error);
    }

    fn log_info(&self, message: &str) {
        log::info!("{}", message);
    }
}

/// One entry captured by a [`RecordingLogger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    Query(String),
    Error(String),
    Info(String),
}

/// [`QueryLogger`] that keeps every event in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: LogEvent) {
        // A poisoned lock only means another thread panicked mid-push.
        let mut events = match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push(event);
    }

    /// All captured events
    pub fn events(&self) -> Vec<LogEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Successfully executed statements, in execution order
    pub fn queries(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                LogEvent::Query(sql) => Some(sql),
                _ => None,
            })
            .collect()
    }

    /// Info messages, in order
    pub fn messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                LogEvent::Info(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    /// Drop everything captured so far
    pub fn clear(&self) {
        match self.events.lock() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl QueryLogger for RecordingLogger {
    fn log_query(&self, sql: &str, _elapsed: Duration) {
        self.push(LogEvent::Query(sql.to_string()));
    }

    fn log_error(&self, sql: &str, _elapsed: Duration, _error: &DbError) {
        self.push(LogEvent::Error(sql.to_string()));
    }

    fn log_info(&self, message: &str) {
        self.push(LogEvent::Info(message.to_string()));
    }
}

/// A database handle paired with the logger that observes it.
#[derive(Clone, Copy)]
pub struct Executor<'a> {
    db: &'a dyn Database,
    logger: &'a dyn QueryLogger,
}

impl<'a> Executor<'a> {
    pub fn new(db: &'a dyn Database, logger: &'a dyn QueryLogger) -> Self {
        Self { db, logger }
    }

    /// Report a progress message to the logger
    pub fn info(&self, message: &str) {
        self.logger.log_info(message);
    }

    fn observe<T>(&self, sql: &str, start: Instant, result: DbResult<T>) -> DbResult<T> {
        let elapsed = start.elapsed();
        match &result {
            Ok(_) => self.logger.log_query(sql, elapsed),
            Err(e) => self.logger.log_error(sql, elapsed, e),
        }
        result
    }

    /// Execute a single statement
    pub async fn execute(&self, sql: &str) -> DbResult<usize> {
        let start = Instant::now();
        let result = self.db.execute(sql).await;
        self.observe(sql, start, result)
    }

    /// Execute a multi-statement script
    pub async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        let start = Instant::now();
        let result = self.db.execute_batch(sql).await;
        self.observe(sql, start, result)
    }

    /// Read one integer
    pub async fn query_i64(&self, sql: &str) -> DbResult<Option<i64>> {
        let start = Instant::now();
        let result = self.db.query_i64(sql).await;
        self.observe(sql, start, result)
    }

    /// Read one string column
    pub async fn query_strings(&self, sql: &str) -> DbResult<Vec<String>> {
        let start = Instant::now();
        let result = self.db.query_strings(sql).await;
        self.observe(sql, start, result)
    }

    /// Check whether a table or view exists
    pub async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        let sql = self.db.relation_exists_sql(name);
        Ok(self.query_i64(&sql).await?.unwrap_or(0) > 0)
    }
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;
