//! Database trait definition

use crate::error::DbResult;
use async_trait::async_trait;

/// Database abstraction trait for Sediment
///
/// Implementations must be Send + Sync for async operation. All statements
/// issued through one instance run on the same session, so `BEGIN` /
/// `COMMIT` issued with [`Database::execute_batch`] span the statements in
/// between.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute a single statement, returns affected rows
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute multiple semicolon-separated statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Query counting the tables or views named `name`
    fn relation_exists_sql(&self, name: &str) -> String;

    /// Check if a table or view exists
    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        let sql = self.relation_exists_sql(name);
        Ok(self.query_i64(&sql).await?.unwrap_or(0) > 0)
    }

    /// First column of the first row as an integer, `None` for no rows or NULL
    async fn query_i64(&self, sql: &str) -> DbResult<Option<i64>>;

    /// First column of every row as a string
    async fn query_strings(&self, sql: &str) -> DbResult<Vec<String>>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;

    /// Whether DDL can be rolled back inside a transaction
    fn supports_transactional_ddl(&self) -> bool {
        false
    }
}
