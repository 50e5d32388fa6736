//! Status command implementation

use anyhow::Result;
use sd_migrate::{MigrationStatus, UnitState};

use crate::cli::{GlobalArgs, StatusArgs, StatusOutput};
use crate::commands::common::{
    create_database_connection, create_migrator, load_migrations, load_project,
};

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let set = load_migrations(&project)?;
    let db = create_database_connection(&project, global)?;
    let migrator = create_migrator(&project, db);

    let rows = migrator.status(&set).await?;
    match args.output {
        StatusOutput::Table => print!("{}", format_table(&rows)),
        StatusOutput::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
    }
    Ok(())
}

fn state_label(state: UnitState) -> &'static str {
    match state {
        UnitState::Applied => "applied",
        UnitState::Pending => "pending",
        UnitState::Missing => "missing",
    }
}

pub(crate) fn format_table(rows: &[MigrationStatus]) -> String {
    if rows.is_empty() {
        return "No migrations found.\n".to_string();
    }

    let name_width = rows
        .iter()
        .map(|r| r.name.len())
        .chain(std::iter::once("NAME".len()))
        .max()
        .unwrap_or(4);

    let mut out = format!("{:<8}  {:<name_width$}\n", "STATE", "NAME");
    for row in rows {
        out.push_str(&format!(
            "{:<8}  {:<name_width$}\n",
            state_label(row.state),
            row.name
        ));
    }

    let count = |s: UnitState| rows.iter().filter(|r| r.state == s).count();
    out.push_str(&format!(
        "\n{} applied, {} pending",
        count(UnitState::Applied),
        count(UnitState::Pending)
    ));
    let missing = count(UnitState::Missing);
    if missing > 0 {
        out.push_str(&format!(", {missing} missing from disk"));
    }
    out.push('\n');
    out
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
