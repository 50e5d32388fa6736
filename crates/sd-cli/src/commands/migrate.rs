//! Migrate command implementation

use anyhow::Result;
use sd_migrate::{MigrationReport, Plan, Target};

use crate::cli::{GlobalArgs, MigrateArgs};
use crate::commands::common::{
    create_database_connection, create_migrator, load_migrations, load_project,
};

/// Execute the migrate command
pub async fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let set = load_migrations(&project)?;
    let target = resolve_target(args)?;

    let db = create_database_connection(&project, global)?;
    let mut migrator = create_migrator(&project, db);
    if args.allow_missing {
        migrator = migrator.with_allow_missing(true);
    }
    if args.no_transaction {
        migrator = migrator.with_use_transactions(Some(false));
    }

    if global.verbose {
        println!(
            "Project '{}': {} {} migration(s) in {}",
            project.config.name,
            set.len(),
            set.strategy(),
            project.migrations_dir().display()
        );
    }

    if args.dry_run {
        let plan = migrator.plan(&set, target).await?;
        print!("{}", format_plan(&plan));
        return Ok(());
    }

    let report = migrator.run(&set, target).await?;
    print!("{}", format_report(&report, target));
    Ok(())
}

/// Turn `--target` / `--relative` into a [`Target`].
pub(crate) fn resolve_target(args: &MigrateArgs) -> Result<Target> {
    if let Some(n) = args.relative {
        return Ok(Target::Relative(n));
    }
    match &args.target {
        Some(raw) => Ok(raw.parse::<Target>()?),
        None => Ok(Target::Latest),
    }
}

pub(crate) fn format_plan(plan: &Plan<'_>) -> String {
    if plan.is_empty() {
        return format!("Dry run - already at {}, nothing to do\n", plan.target());
    }
    let mut out = format!(
        "Dry run - would run {} migration(s) to reach {}:\n",
        plan.len(),
        plan.target()
    );
    for step in plan.steps() {
        out.push_str(&format!(
            "  {:<4} {}\n",
            step.direction.to_string(),
            step.migration.name()
        ));
    }
    out
}

pub(crate) fn format_report(report: &MigrationReport, target: Target) -> String {
    if report.is_noop() {
        return format!("Already at {}, nothing to do ({})\n", target, report.after);
    }
    let mut out = String::new();
    for name in &report.reverted {
        out.push_str(&format!("  Reverted: {name}\n"));
    }
    for name in &report.applied {
        out.push_str(&format!("  Applied:  {name}\n"));
    }
    out.push_str(&format!(
        "\nMigrated from {} to {} in {:.2}s\n",
        report.before,
        report.after,
        report.elapsed.as_secs_f64()
    ));
    out
}

#[cfg(test)]
#[path = "migrate_test.rs"]
mod tests;
