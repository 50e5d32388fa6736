use super::*;
use tempfile::tempdir;

#[test]
fn test_slugify() {
    assert_eq!(slugify("Create Users"), "create_users");
    assert_eq!(slugify("  add index: users(email)! "), "add_index_users_email");
    assert_eq!(slugify("***"), "");
}

#[test]
fn test_first_integer_migration() {
    let temp_dir = tempdir().unwrap();
    let dir = temp_dir.path().join("migrations");

    let path = create_migration(&dir, "create class", false).unwrap();
    assert_eq!(path.file_name().unwrap(), "001_create_class.sql");
    assert_eq!(fs::read_to_string(&path).unwrap(), TEMPLATE);
}

#[test]
fn test_next_integer_follows_highest() {
    let temp_dir = tempdir().unwrap();
    let dir = temp_dir.path();
    fs::write(dir.join("001_a.sql"), TEMPLATE).unwrap();
    fs::write(dir.join("007_b.sql"), TEMPLATE).unwrap();

    let path = create_migration(dir, "c", false).unwrap();
    assert_eq!(path.file_name().unwrap(), "008_c.sql");

    // The skeleton must load as a valid migration.
    let set = MigrationLoader::new(dir).load().unwrap();
    assert_eq!(set.len(), 3);
}

#[test]
fn test_timestamp_prefix() {
    let temp_dir = tempdir().unwrap();
    let path = create_migration(temp_dir.path(), "add users", true).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    let (prefix, rest) = name.split_once('_').unwrap();
    assert_eq!(prefix.len(), 14);
    assert!(prefix.bytes().all(|b| b.is_ascii_digit()));
    assert_eq!(rest, "add_users.sql");
}

#[test]
fn test_timestamp_directory_keeps_timestamps() {
    let temp_dir = tempdir().unwrap();
    fs::write(temp_dir.path().join("20190101_a.sql"), TEMPLATE).unwrap();

    let path = create_migration(temp_dir.path(), "b", false).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.len() > "20190101_b.sql".len());
    assert!(name.ends_with("_b.sql"));
}

#[test]
fn test_empty_description_rejected() {
    let temp_dir = tempdir().unwrap();
    assert!(create_migration(temp_dir.path(), "!!!", false).is_err());
}
