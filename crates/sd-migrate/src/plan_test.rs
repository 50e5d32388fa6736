use super::*;
use crate::strategy::{MigrationKey, Strategy};
use crate::unit::SqlBody;

fn reversible(version: u64, name: &str) -> Migration {
    Migration::new(
        MigrationKey::new(version, name),
        SqlBody::new("SELECT 1", Some("SELECT 2".to_string())),
    )
}

fn irreversible(version: u64, name: &str) -> Migration {
    Migration::new(MigrationKey::new(version, name), SqlBody::new("SELECT 1", None))
}

fn integer_set() -> MigrationSet {
    MigrationSet::new(
        Strategy::Integer,
        vec![
            reversible(1, "001_create_class"),
            reversible(2, "002_create_student"),
            reversible(3, "003_join_table"),
        ],
    )
    .unwrap()
}

fn timestamp_set() -> MigrationSet {
    MigrationSet::new(
        Strategy::Timestamp,
        vec![
            reversible(20190101, "20190101_a"),
            reversible(20190102, "20190102_b"),
            reversible(20190103, "20190103_c"),
        ],
    )
    .unwrap()
}

fn applied(names: &[&str]) -> AppliedState {
    AppliedState::Filenames(names.iter().map(|n| n.to_string()).collect())
}

fn steps(plan: &Plan<'_>) -> Vec<(String, Direction, u64)> {
    plan.steps()
        .iter()
        .map(|s| {
            (
                s.migration.name().to_string(),
                s.direction,
                s.resulting_version,
            )
        })
        .collect()
}

#[test]
fn test_target_from_i64() {
    assert_eq!(Target::from_i64(0), Target::Initial);
    assert_eq!(Target::from_i64(-1), Target::Initial);
    assert_eq!(Target::from_i64(4), Target::Version(4));
}

#[test]
fn test_target_from_str() {
    assert_eq!("latest".parse::<Target>().unwrap(), Target::Latest);
    assert_eq!("initial".parse::<Target>().unwrap(), Target::Initial);
    assert_eq!("-1".parse::<Target>().unwrap(), Target::Initial);
    assert_eq!("20190102".parse::<Target>().unwrap(), Target::Version(20190102));
    assert!(matches!(
        "tomorrow".parse::<Target>(),
        Err(PlanningError::UnknownTarget { .. })
    ));
    assert_eq!(Target::Relative(-2).to_string(), "-2");
    assert_eq!(Target::Relative(3).to_string(), "+3");
}

#[test]
fn test_integer_latest_from_empty() {
    let set = integer_set();
    let plan = build_plan(&set, &AppliedState::Version(0), Target::Latest, false).unwrap();
    assert_eq!(
        steps(&plan),
        vec![
            ("001_create_class".to_string(), Direction::Up, 1),
            ("002_create_student".to_string(), Direction::Up, 2),
            ("003_join_table".to_string(), Direction::Up, 3),
        ]
    );
}

#[test]
fn test_integer_converged_plan_is_empty() {
    let set = integer_set();
    let plan = build_plan(&set, &AppliedState::Version(3), Target::Latest, false).unwrap();
    assert!(plan.is_empty());
}

#[test]
fn test_integer_initial_reverts_descending() {
    let set = integer_set();
    let plan = build_plan(&set, &AppliedState::Version(3), Target::Initial, false).unwrap();
    assert_eq!(
        steps(&plan),
        vec![
            ("003_join_table".to_string(), Direction::Down, 2),
            ("002_create_student".to_string(), Direction::Down, 1),
            ("001_create_class".to_string(), Direction::Down, 0),
        ]
    );
}

#[test]
fn test_integer_version_target_with_gaps() {
    let set = MigrationSet::new(
        Strategy::Integer,
        vec![reversible(1, "001_a"), reversible(5, "005_e")],
    )
    .unwrap();

    // A version between two loaded keys is a valid target.
    let plan = build_plan(&set, &AppliedState::Version(5), Target::Version(3), false).unwrap();
    assert_eq!(steps(&plan), vec![("005_e".to_string(), Direction::Down, 1)]);

    let plan = build_plan(&set, &AppliedState::Version(0), Target::Version(3), false).unwrap();
    assert_eq!(plan.describe(), vec!["001_a (up)"]);
}

#[test]
fn test_integer_target_above_newest_rejected() {
    let set = integer_set();
    let err = build_plan(&set, &AppliedState::Version(0), Target::Version(9), false).unwrap_err();
    assert!(matches!(err, PlanningError::UnknownTarget { .. }));
}

#[test]
fn test_integer_relative_steps() {
    let set = integer_set();

    let plan = build_plan(&set, &AppliedState::Version(1), Target::Relative(1), false).unwrap();
    assert_eq!(plan.describe(), vec!["002_create_student (up)"]);

    let plan = build_plan(&set, &AppliedState::Version(1), Target::Relative(10), false).unwrap();
    assert_eq!(plan.len(), 2);

    let plan = build_plan(&set, &AppliedState::Version(3), Target::Relative(-2), false).unwrap();
    assert_eq!(
        plan.describe(),
        vec!["003_join_table (down)", "002_create_student (down)"]
    );

    let plan = build_plan(&set, &AppliedState::Version(3), Target::Relative(-10), false).unwrap();
    assert_eq!(plan.len(), 3);

    let plan = build_plan(&set, &AppliedState::Version(0), Target::Relative(-1), false).unwrap();
    assert!(plan.is_empty());
}

#[test]
fn test_integer_ledger_ahead_of_directory() {
    let set = integer_set();
    let err = build_plan(&set, &AppliedState::Version(7), Target::Latest, false).unwrap_err();
    assert!(matches!(err, PlanningError::MissingAppliedMigrations { .. }));

    let plan = build_plan(&set, &AppliedState::Version(7), Target::Latest, true).unwrap();
    assert!(plan.is_empty());

    let plan = build_plan(&set, &AppliedState::Version(7), Target::Version(2), true).unwrap();
    assert_eq!(plan.describe(), vec!["003_join_table (down)"]);
}

#[test]
fn test_integer_irreversible_blocks_revert() {
    let set = MigrationSet::new(
        Strategy::Integer,
        vec![irreversible(1, "001_a"), reversible(2, "002_b")],
    )
    .unwrap();

    let plan = build_plan(&set, &AppliedState::Version(2), Target::Version(1), false).unwrap();
    assert_eq!(plan.describe(), vec!["002_b (down)"]);

    match build_plan(&set, &AppliedState::Version(2), Target::Initial, false).unwrap_err() {
        PlanningError::Irreversible { migration } => assert_eq!(migration, "001_a"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_timestamp_latest_applies_unapplied() {
    let set = timestamp_set();
    let plan = build_plan(&set, &applied(&["20190102_b"]), Target::Latest, false).unwrap();
    assert_eq!(plan.describe(), vec!["20190101_a (up)", "20190103_c (up)"]);
}

#[test]
fn test_timestamp_initial_reverts_descending() {
    let set = timestamp_set();
    let state = applied(&["20190101_a", "20190102_b"]);
    let plan = build_plan(&set, &state, Target::Initial, false).unwrap();
    assert_eq!(plan.describe(), vec!["20190102_b (down)", "20190101_a (down)"]);
}

#[test]
fn test_timestamp_version_target() {
    let set = timestamp_set();
    let state = applied(&["20190101_a", "20190103_c"]);
    let plan = build_plan(&set, &state, Target::Version(20190102), false).unwrap();
    assert_eq!(plan.describe(), vec!["20190103_c (down)", "20190102_b (up)"]);
}

#[test]
fn test_timestamp_version_must_match() {
    let set = timestamp_set();
    let err = build_plan(&set, &applied(&[]), Target::Version(20190105), false).unwrap_err();
    assert!(matches!(err, PlanningError::UnknownTarget { .. }));
}

#[test]
fn test_timestamp_relative() {
    let set = timestamp_set();
    let state = applied(&["20190101_a"]);

    let plan = build_plan(&set, &state, Target::Relative(1), false).unwrap();
    assert_eq!(plan.describe(), vec!["20190102_b (up)"]);

    let plan = build_plan(&set, &state, Target::Relative(-1), false).unwrap();
    assert_eq!(plan.describe(), vec!["20190101_a (down)"]);
}

#[test]
fn test_timestamp_missing_applied() {
    let set = timestamp_set();
    let state = applied(&["20181231_gone", "20190101_a"]);

    match build_plan(&set, &state, Target::Latest, false).unwrap_err() {
        PlanningError::MissingAppliedMigrations { names } => {
            assert_eq!(names, vec!["20181231_gone"])
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let plan = build_plan(&set, &state, Target::Initial, true).unwrap();
    assert_eq!(plan.describe(), vec!["20190101_a (down)"]);
}
