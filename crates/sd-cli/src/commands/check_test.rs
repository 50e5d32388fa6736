use super::*;
use crate::cli::MigrateArgs;
use crate::commands::migrate;
use std::fs;
use tempfile::tempdir;

#[tokio::test]
async fn test_check_fails_until_migrated() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    fs::write(
        root.join("sediment.yml"),
        "name: school\ndatabase:\n  path: school.duckdb\n",
    )
    .unwrap();
    fs::create_dir_all(root.join("migrations")).unwrap();
    fs::write(
        root.join("migrations/001_create_class.sql"),
        "-- migrate:up\nCREATE TABLE class (id INTEGER);\n",
    )
    .unwrap();

    let global = GlobalArgs {
        verbose: false,
        project_dir: root.to_path_buf(),
        config: None,
        database: None,
    };

    let err = execute(&global).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<ExitCode>(), Some(ExitCode(1))));

    migrate::execute(&MigrateArgs::default(), &global)
        .await
        .unwrap();
    execute(&global).await.unwrap();
}
