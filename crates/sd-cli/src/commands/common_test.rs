use super::*;
use std::fs;
use tempfile::tempdir;

fn global_for(dir: &std::path::Path) -> GlobalArgs {
    GlobalArgs {
        verbose: false,
        project_dir: dir.to_path_buf(),
        config: None,
        database: None,
    }
}

#[test]
fn test_load_project_from_directory() {
    let temp_dir = tempdir().unwrap();
    fs::write(
        temp_dir.path().join("sediment.yml"),
        "name: school\nmigrations_path: db/migrations\n",
    )
    .unwrap();

    let project = load_project(&global_for(temp_dir.path())).unwrap();
    assert_eq!(project.config.name, "school");
    assert_eq!(
        project.migrations_dir(),
        temp_dir.path().join("db/migrations")
    );
}

#[test]
fn test_load_project_with_explicit_config() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("other.yml");
    fs::write(&config_path, "name: elsewhere\n").unwrap();

    let mut global = global_for(temp_dir.path());
    global.config = Some(config_path);
    let project = load_project(&global).unwrap();
    assert_eq!(project.config.name, "elsewhere");
}

#[test]
fn test_load_project_without_config_fails() {
    let temp_dir = tempdir().unwrap();
    let err = load_project(&global_for(temp_dir.path())).unwrap_err();
    assert!(format!("{err:#}").contains("[C001]"));
}

#[tokio::test]
async fn test_database_override() {
    let temp_dir = tempdir().unwrap();
    fs::write(
        temp_dir.path().join("sediment.yml"),
        "name: school\ndatabase:\n  path: school.duckdb\n",
    )
    .unwrap();
    let mut global = global_for(temp_dir.path());
    let project = load_project(&global).unwrap();

    global.database = Some(":memory:".to_string());
    let db = create_database_connection(&project, &global).unwrap();
    db.execute_batch("CREATE TABLE t (id INTEGER)").await.unwrap();
    assert!(!temp_dir.path().join("school.duckdb").exists());
}

#[test]
fn test_exit_code_has_empty_display() {
    assert_eq!(ExitCode(2).to_string(), "");
}
