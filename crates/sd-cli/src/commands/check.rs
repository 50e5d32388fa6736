//! Check command implementation

use anyhow::Result;
use sd_migrate::MigrateError;

use crate::cli::GlobalArgs;
use crate::commands::common::{
    create_database_connection, create_migrator, load_migrations, load_project, ExitCode,
};

/// Execute the check command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let set = load_migrations(&project)?;
    let db = create_database_connection(&project, global)?;
    let migrator = create_migrator(&project, db);

    match migrator.check_current(&set).await {
        Ok(()) => {
            println!("Database is current");
            Ok(())
        }
        Err(MigrateError::NotCurrent { pending }) => {
            println!("{} pending migration(s):", pending.len());
            for name in &pending {
                println!("  {name}");
            }
            Err(ExitCode(1).into())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[path = "check_test.rs"]
mod tests;
