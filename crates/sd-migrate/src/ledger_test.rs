use super::*;
use crate::strategy::MigrationKey;
use crate::unit::SqlBody;
use sd_db::{Database, DuckDbBackend, RecordingLogger};

fn unit(version: u64, name: &str) -> Migration {
    Migration::new(MigrationKey::new(version, name), SqlBody::new("SELECT 1", None))
}

#[test]
fn test_default_names_follow_strategy() {
    let integer = Ledger::new(Strategy::Integer, None, None);
    assert_eq!(integer.table(), "schema_info");
    assert_eq!(
        integer,
        Ledger::Integer(IntegerLedger::new("schema_info", "version"))
    );

    let timestamp = Ledger::new(Strategy::Timestamp, Some("ops.applied"), Some("name"));
    assert_eq!(timestamp.table(), "ops.applied");
    assert_eq!(
        timestamp,
        Ledger::Timestamp(TimestampLedger::new("ops.applied", "name"))
    );
}

#[tokio::test]
async fn test_integer_ledger_created_at_zero() {
    let db = DuckDbBackend::in_memory().unwrap();
    let logger = RecordingLogger::new();
    let exec = Executor::new(&db, &logger);
    let ledger = Ledger::new(Strategy::Integer, None, None);

    assert_eq!(ledger.state(&exec).await.unwrap(), AppliedState::Version(0));
    assert!(db.relation_exists("schema_info").await.unwrap());

    // A second read must not add another row.
    ledger.state(&exec).await.unwrap();
    let rows = db
        .query_i64("SELECT COUNT(*) FROM schema_info")
        .await
        .unwrap();
    assert_eq!(rows, Some(1));
}

#[tokio::test]
async fn test_integer_ledger_records_versions() {
    let db = DuckDbBackend::in_memory().unwrap();
    let logger = RecordingLogger::new();
    let exec = Executor::new(&db, &logger);
    let ledger = Ledger::new(Strategy::Integer, None, None);
    ledger.ensure(&exec).await.unwrap();

    ledger.record_applied(&exec, &unit(3, "003_c")).await.unwrap();
    assert_eq!(ledger.state(&exec).await.unwrap(), AppliedState::Version(3));

    ledger
        .record_reverted(&exec, &unit(3, "003_c"), 1)
        .await
        .unwrap();
    assert_eq!(ledger.state(&exec).await.unwrap(), AppliedState::Version(1));
    assert!(ledger.applied_filenames(&exec).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_integer_ledger_reads_existing_table() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE schema_info (version BIGINT); INSERT INTO schema_info VALUES (7);")
        .await
        .unwrap();
    let logger = RecordingLogger::new();
    let exec = Executor::new(&db, &logger);

    let ledger = Ledger::new(Strategy::Integer, None, None);
    assert_eq!(ledger.state(&exec).await.unwrap(), AppliedState::Version(7));
}

#[tokio::test]
async fn test_timestamp_ledger_tracks_names() {
    let db = DuckDbBackend::in_memory().unwrap();
    let logger = RecordingLogger::new();
    let exec = Executor::new(&db, &logger);
    let ledger = Ledger::new(Strategy::Timestamp, None, None);

    assert!(ledger.state(&exec).await.unwrap().is_initial());

    let b = unit(20190102, "20190102_b");
    let a = unit(20190101, "20190101_a");
    ledger.record_applied(&exec, &b).await.unwrap();
    ledger.record_applied(&exec, &a).await.unwrap();

    assert_eq!(
        ledger.applied_filenames(&exec).await.unwrap(),
        vec!["20190101_a", "20190102_b"]
    );

    ledger.record_reverted(&exec, &b, 0).await.unwrap();
    let expected: BTreeSet<String> = ["20190101_a".to_string()].into_iter().collect();
    assert_eq!(
        ledger.state(&exec).await.unwrap(),
        AppliedState::Filenames(expected)
    );
}

#[tokio::test]
async fn test_timestamp_ledger_quotes_names() {
    let db = DuckDbBackend::in_memory().unwrap();
    let logger = RecordingLogger::new();
    let exec = Executor::new(&db, &logger);
    let ledger = Ledger::new(Strategy::Timestamp, None, None);
    ledger.ensure(&exec).await.unwrap();

    let odd = unit(20190101, "20190101_it's");
    ledger.record_applied(&exec, &odd).await.unwrap();
    assert_eq!(
        ledger.applied_filenames(&exec).await.unwrap(),
        vec!["20190101_it's"]
    );
}

#[tokio::test]
async fn test_qualified_ledger_creates_schema() {
    let db = DuckDbBackend::in_memory().unwrap();
    let logger = RecordingLogger::new();
    let exec = Executor::new(&db, &logger);
    let ledger = Ledger::new(Strategy::Integer, Some("ops.schema_info"), None);

    assert_eq!(ledger.state(&exec).await.unwrap(), AppliedState::Version(0));
    assert!(db.relation_exists("ops.schema_info").await.unwrap());
    assert!(logger
        .queries()
        .iter()
        .any(|q| q.starts_with("CREATE SCHEMA IF NOT EXISTS \"ops\"")));
}
