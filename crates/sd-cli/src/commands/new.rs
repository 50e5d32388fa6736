//! New command implementation

use anyhow::{bail, Context, Result};
use chrono::Utc;
use sd_core::StrategyKind;
use sd_migrate::{MigrationLoader, Strategy};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{GlobalArgs, NewArgs};
use crate::commands::common::load_project;

const TEMPLATE: &str = "-- migrate:up\n\n\n-- migrate:down\n\n";

/// Execute the new command
pub async fn execute(args: &NewArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let dir = project.migrations_dir();
    let timestamp = args.timestamp || project.config.strategy == Some(StrategyKind::Timestamp);

    let path = create_migration(&dir, &args.description, timestamp)?;
    println!("Created {}", path.display());
    Ok(())
}

/// Write an empty migration into `dir` and return its path.
pub(crate) fn create_migration(dir: &Path, description: &str, timestamp: bool) -> Result<PathBuf> {
    let slug = slugify(description);
    if slug.is_empty() {
        bail!("Migration description '{description}' has no usable characters");
    }

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let existing = MigrationLoader::new(dir)
        .load()
        .context("Failed to read existing migrations")?;
    let prefix = if timestamp || existing.strategy() == Strategy::Timestamp {
        Utc::now().format("%Y%m%d%H%M%S").to_string()
    } else {
        let next = existing.latest().map(|m| m.version()).unwrap_or(0) + 1;
        format!("{next:03}")
    };

    let path = dir.join(format!("{prefix}_{slug}.sql"));
    if path.exists() {
        bail!("Migration already exists: {}", path.display());
    }
    fs::write(&path, TEMPLATE)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Lowercase, with runs of anything but ASCII letters and digits collapsed to `_`.
pub(crate) fn slugify(description: &str) -> String {
    let mut slug = String::with_capacity(description.len());
    for c in description.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_end_matches('_').to_string()
}

#[cfg(test)]
#[path = "new_test.rs"]
mod tests;
