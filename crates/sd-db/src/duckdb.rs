//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::Database;
use async_trait::async_trait;
use duckdb::Connection;
use sd_core::sql::{split_qualified, string_literal};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn execute_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        conn.execute(sql, []).map_err(|e| DbError::query(sql, e))
    }

    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(|e| DbError::query(sql, e))
    }

    fn query_i64_sync(&self, sql: &str) -> DbResult<Option<i64>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql).map_err(|e| DbError::query(sql, e))?;
        let mut rows = stmt.query([]).map_err(|e| DbError::query(sql, e))?;
        match rows.next().map_err(|e| DbError::query(sql, e))? {
            Some(row) => row
                .get::<_, Option<i64>>(0)
                .map_err(|e| DbError::query(sql, e)),
            None => Ok(None),
        }
    }

    fn query_strings_sync(&self, sql: &str) -> DbResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql).map_err(|e| DbError::query(sql, e))?;
        let values = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| DbError::query(sql, e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DbError::query(sql, e))?;
        Ok(values)
    }
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.execute_sync(sql)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    fn relation_exists_sql(&self, name: &str) -> String {
        let (schema, table) = split_qualified(name);
        format!(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = {} AND table_name = {}",
            string_literal(schema),
            string_literal(table)
        )
    }

    async fn query_i64(&self, sql: &str) -> DbResult<Option<i64>> {
        self.query_i64_sync(sql)
    }

    async fn query_strings(&self, sql: &str) -> DbResult<Vec<String>> {
        self.query_strings_sync(sql)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }

    fn supports_transactional_ddl(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
