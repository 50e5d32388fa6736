//! Error types for sd-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Statement execution error carrying the offending SQL (D002)
    #[error("[D002] SQL execution failed: {message}{}\n  SQL: {sql}", detail_suffix(.detail))]
    Query {
        sql: String,
        message: String,
        detail: Option<String>,
    },

    /// Mutex poisoned (D003)
    #[error("[D003] Database mutex poisoned: {0}")]
    MutexPoisoned(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!("\n  {}", d.replace('\n', "\n  ")),
        None => String::new(),
    }
}

impl DbError {
    /// Build a query error from a driver error.
    ///
    /// DuckDB reports the headline on the first line and any hints or the
    /// `LINE n:` caret on the following lines; the latter becomes `detail`.
    pub fn query(sql: &str, err: impl std::fmt::Display) -> Self {
        let text = err.to_string();
        let (message, detail) = match text.split_once('\n') {
            Some((head, rest)) if !rest.trim().is_empty() => {
                (head.trim().to_string(), Some(rest.trim().to_string()))
            }
            _ => (text.trim().to_string(), None),
        };
        DbError::Query {
            sql: sql.to_string(),
            message,
            detail,
        }
    }

    /// The SQL that failed, if this is a query error
    pub fn sql(&self) -> Option<&str> {
        match self {
            DbError::Query { sql, .. } => Some(sql),
            _ => None,
        }
    }
}
