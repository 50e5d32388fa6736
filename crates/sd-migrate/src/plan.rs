//! Plan computation.
//!
//! A plan is the ordered list of steps that moves the database from its
//! ledger state to a target. Building one is pure: it reads the loaded set
//! and the applied state and never touches the database, so every planning
//! error surfaces before the first statement runs.

use crate::error::PlanningError;
use crate::ledger::AppliedState;
use crate::loader::MigrationSet;
use crate::unit::Migration;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Where a run should leave the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    /// Everything loaded is applied
    #[default]
    Latest,
    /// Nothing is applied
    Initial,
    /// A specific ordering key
    Version(u64),
    /// A number of units forward (positive) or back (negative)
    Relative(i64),
}

impl Target {
    /// Interpret a signed version; zero and negatives mean [`Target::Initial`]
    pub fn from_i64(value: i64) -> Self {
        match u64::try_from(value) {
            Ok(0) | Err(_) => Target::Initial,
            Ok(v) => Target::Version(v),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Latest => write!(f, "latest"),
            Target::Initial => write!(f, "initial"),
            Target::Version(v) => write!(f, "{v}"),
            Target::Relative(n) => write!(f, "{n:+}"),
        }
    }
}

impl FromStr for Target {
    type Err = PlanningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "latest" => Ok(Target::Latest),
            "initial" => Ok(Target::Initial),
            other => other
                .parse::<i64>()
                .map(Target::from_i64)
                .map_err(|_| PlanningError::UnknownTarget {
                    target: other.to_string(),
                    reason: "expected 'latest', 'initial' or a version number".to_string(),
                }),
        }
    }
}

/// Which way a step moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// One unit run in one direction.
#[derive(Debug, Clone, Copy)]
pub struct PlanStep<'a> {
    pub migration: &'a Migration,
    pub direction: Direction,
    /// Version an integer ledger holds once this step completes
    pub resulting_version: u64,
}

impl<'a> PlanStep<'a> {
    fn up(migration: &'a Migration) -> Self {
        Self {
            migration,
            direction: Direction::Up,
            resulting_version: migration.version(),
        }
    }

    fn down(migration: &'a Migration, resulting_version: u64) -> Self {
        Self {
            migration,
            direction: Direction::Down,
            resulting_version,
        }
    }
}

/// Ordered steps from the current state to a target.
#[derive(Debug, Clone)]
pub struct Plan<'a> {
    target: Target,
    steps: Vec<PlanStep<'a>>,
}

impl<'a> Plan<'a> {
    pub fn target(&self) -> Target {
        self.target
    }

    pub fn steps(&self) -> &[PlanStep<'a>] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when the database is already at the target
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// `name (direction)` for each step, in order
    pub fn describe(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|s| format!("{} ({})", s.migration.name(), s.direction))
            .collect()
    }
}

/// Compute the steps that move `state` to `target`.
pub fn build_plan<'a>(
    set: &'a MigrationSet,
    state: &AppliedState,
    target: Target,
    allow_missing: bool,
) -> Result<Plan<'a>, PlanningError> {
    let steps = match state {
        AppliedState::Version(current) => plan_integer(set, *current, target, allow_missing)?,
        AppliedState::Filenames(applied) => plan_timestamp(set, applied, target, allow_missing)?,
    };

    if let Some(step) = steps
        .iter()
        .find(|s| s.direction == Direction::Down && !s.migration.is_reversible())
    {
        return Err(PlanningError::Irreversible {
            migration: step.migration.name().to_string(),
        });
    }

    Ok(Plan { target, steps })
}

fn plan_integer(
    set: &MigrationSet,
    current: u64,
    target: Target,
    allow_missing: bool,
) -> Result<Vec<PlanStep<'_>>, PlanningError> {
    let units = set.units();
    let highest = set.latest().map(|m| m.version()).unwrap_or(0);

    if current > highest && !allow_missing {
        return Err(PlanningError::MissingAppliedMigrations {
            names: vec![format!("version {current}")],
        });
    }

    let target_version = match target {
        // Past the newest file with missing ones allowed, latest is "stay put".
        Target::Latest => highest.max(current),
        Target::Initial => 0,
        Target::Version(v) => {
            if v > highest {
                return Err(PlanningError::UnknownTarget {
                    target: v.to_string(),
                    reason: format!("newest loaded migration is {highest}"),
                });
            }
            v
        }
        Target::Relative(n) if n >= 0 => units
            .iter()
            .filter(|m| m.version() > current)
            .take(n.unsigned_abs() as usize)
            .last()
            .map(|m| m.version())
            .unwrap_or(current),
        Target::Relative(n) => units
            .iter()
            .rev()
            .filter(|m| m.version() <= current)
            .nth(n.unsigned_abs() as usize)
            .map(|m| m.version())
            .unwrap_or(0),
    };

    let steps = if target_version > current {
        units
            .iter()
            .filter(|m| m.version() > current && m.version() <= target_version)
            .map(PlanStep::up)
            .collect()
    } else if target_version < current {
        let below: Vec<&Migration> = units
            .iter()
            .filter(|m| m.version() <= current)
            .collect();
        below
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, m)| m.version() > target_version)
            .map(|(idx, m)| {
                let previous = idx.checked_sub(1).map(|p| below[p].version()).unwrap_or(0);
                PlanStep::down(*m, previous)
            })
            .collect()
    } else {
        Vec::new()
    };
    Ok(steps)
}

fn plan_timestamp<'a>(
    set: &'a MigrationSet,
    applied: &BTreeSet<String>,
    target: Target,
    allow_missing: bool,
) -> Result<Vec<PlanStep<'a>>, PlanningError> {
    let missing: Vec<String> = applied
        .iter()
        .filter(|name| set.find_name(name).is_none())
        .cloned()
        .collect();
    if !missing.is_empty() && !allow_missing {
        return Err(PlanningError::MissingAppliedMigrations { names: missing });
    }

    let units = set.units();
    let is_applied = |m: &&Migration| applied.contains(m.name());

    let steps = match target {
        Target::Latest => units
            .iter()
            .filter(|m| !is_applied(m))
            .map(PlanStep::up)
            .collect(),
        Target::Initial => units
            .iter()
            .rev()
            .filter(is_applied)
            .map(|m| PlanStep::down(m, 0))
            .collect(),
        Target::Version(v) => {
            if set.find_version(v).is_none() {
                return Err(PlanningError::UnknownTarget {
                    target: v.to_string(),
                    reason: "no migration has that timestamp".to_string(),
                });
            }
            let reverts = units
                .iter()
                .rev()
                .filter(|m| m.version() > v && is_applied(m))
                .map(|m| PlanStep::down(m, 0));
            let applies = units
                .iter()
                .filter(|m| m.version() <= v && !is_applied(m))
                .map(PlanStep::up);
            reverts.chain(applies).collect()
        }
        Target::Relative(n) if n >= 0 => units
            .iter()
            .filter(|m| !is_applied(m))
            .take(n.unsigned_abs() as usize)
            .map(PlanStep::up)
            .collect(),
        Target::Relative(n) => units
            .iter()
            .rev()
            .filter(is_applied)
            .take(n.unsigned_abs() as usize)
            .map(|m| PlanStep::down(m, 0))
            .collect(),
    };
    Ok(steps)
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
