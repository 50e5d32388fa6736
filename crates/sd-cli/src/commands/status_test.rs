use super::*;
use std::fs;
use tempfile::tempdir;

fn row(version: u64, name: &str, state: UnitState) -> MigrationStatus {
    MigrationStatus {
        version,
        name: name.to_string(),
        state,
    }
}

#[test]
fn test_format_table() {
    let rows = vec![
        row(1, "001_create_class", UnitState::Applied),
        row(2, "002_create_student", UnitState::Pending),
    ];
    let table = format_table(&rows);
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines[0].trim_end(), "STATE     NAME");
    assert_eq!(lines[1].trim_end(), "applied   001_create_class");
    assert_eq!(lines[2].trim_end(), "pending   002_create_student");
    assert_eq!(lines[4], "1 applied, 1 pending");
}

#[test]
fn test_format_table_mentions_missing() {
    let rows = vec![row(20180101, "20180101_gone", UnitState::Missing)];
    assert!(format_table(&rows).contains("1 missing from disk"));
}

#[test]
fn test_format_empty() {
    assert_eq!(format_table(&[]), "No migrations found.\n");
}

#[tokio::test]
async fn test_status_runs_against_project() {
    let temp_dir = tempdir().unwrap();
    fs::write(temp_dir.path().join("sediment.yml"), "name: school\n").unwrap();
    fs::create_dir_all(temp_dir.path().join("migrations")).unwrap();
    fs::write(
        temp_dir.path().join("migrations/001_a.sql"),
        "-- migrate:up\nSELECT 1;\n",
    )
    .unwrap();

    let global = GlobalArgs {
        verbose: false,
        project_dir: temp_dir.path().to_path_buf(),
        config: None,
        database: None,
    };
    let args = StatusArgs {
        output: StatusOutput::Json,
    };
    execute(&args, &global).await.unwrap();
}
