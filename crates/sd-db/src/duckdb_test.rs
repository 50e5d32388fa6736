use super::*;

#[tokio::test]
async fn test_in_memory() {
    let db = DuckDbBackend::in_memory().unwrap();
    assert_eq!(db.db_type(), "duckdb");
    assert!(db.supports_transactional_ddl());
}

#[tokio::test]
async fn test_new_handles_memory_path() {
    let db = DuckDbBackend::new(":memory:").unwrap();
    db.execute_batch("CREATE TABLE t (id INT)").await.unwrap();
    assert!(db.relation_exists("t").await.unwrap());
}

#[tokio::test]
async fn test_from_path_persists_between_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("school.duckdb");
    {
        let db = DuckDbBackend::from_path(&path).unwrap();
        db.execute_batch("CREATE TABLE classes (id INT)").await.unwrap();
    }
    let db = DuckDbBackend::from_path(&path).unwrap();
    assert!(db.relation_exists("classes").await.unwrap());
}

#[tokio::test]
async fn test_execute_batch_multiple_statements() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE t1 (id INT); CREATE TABLE t2 (id INT); INSERT INTO t1 VALUES (1);",
    )
    .await
    .unwrap();

    assert!(db.relation_exists("t1").await.unwrap());
    assert!(db.relation_exists("t2").await.unwrap());
}

#[tokio::test]
async fn test_execute_returns_affected_rows() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE t (id INT)").await.unwrap();
    let inserted = db
        .execute("INSERT INTO t VALUES (1), (2), (3)")
        .await
        .unwrap();
    assert_eq!(inserted, 3);
}

#[tokio::test]
async fn test_relation_exists_schema_qualified() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE SCHEMA ops; CREATE TABLE ops.ledger (v INT)")
        .await
        .unwrap();

    assert!(db.relation_exists("ops.ledger").await.unwrap());
    assert!(!db.relation_exists("ledger").await.unwrap());
}

#[tokio::test]
async fn test_relation_not_exists() {
    let db = DuckDbBackend::in_memory().unwrap();
    assert!(!db.relation_exists("nonexistent").await.unwrap());
}

#[tokio::test]
async fn test_query_i64() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE t (v BIGINT); INSERT INTO t VALUES (7)")
        .await
        .unwrap();

    assert_eq!(db.query_i64("SELECT v FROM t").await.unwrap(), Some(7));
    assert_eq!(
        db.query_i64("SELECT v FROM t WHERE v > 100").await.unwrap(),
        None
    );
    assert_eq!(
        db.query_i64("SELECT CAST(NULL AS BIGINT)").await.unwrap(),
        None
    );
}

#[tokio::test]
async fn test_query_strings_preserves_order() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE f (name VARCHAR); INSERT INTO f VALUES ('b'), ('a'), ('c');",
    )
    .await
    .unwrap();

    let names = db
        .query_strings("SELECT name FROM f ORDER BY name")
        .await
        .unwrap();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_failed_statement_carries_sql() {
    let db = DuckDbBackend::in_memory().unwrap();
    let err = db
        .execute_batch("DROP TABLE missing_table")
        .await
        .unwrap_err();

    assert_eq!(err.sql(), Some("DROP TABLE missing_table"));
    let text = err.to_string();
    assert!(text.starts_with("[D002]"));
    assert!(text.contains("missing_table"));
}

#[tokio::test]
async fn test_transaction_rolls_back_ddl() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("BEGIN TRANSACTION").await.unwrap();
    db.execute_batch("CREATE TABLE temp_t (id INT)").await.unwrap();
    db.execute_batch("ROLLBACK").await.unwrap();

    assert!(!db.relation_exists("temp_t").await.unwrap());
}
