//! Migration discovery.
//!
//! [`MigrationLoader`] turns a directory into a [`MigrationSet`]: every unit
//! parsed, the strategy fixed, keys checked for uniqueness, units sorted.
//! Nothing here touches the database.

use crate::error::{LoadError, LoadResult};
use crate::strategy::{parse_filename, FileRole, MigrationKey, Strategy};
use crate::unit::{Migration, SqlBody};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Loaded migrations, sorted by ordering key under one strategy.
#[derive(Debug)]
pub struct MigrationSet {
    strategy: Strategy,
    units: Vec<Migration>,
}

impl MigrationSet {
    /// Build a set from migrations defined in code.
    ///
    /// Applies the same key rules as loading from disk.
    pub fn new(strategy: Strategy, mut units: Vec<Migration>) -> LoadResult<Self> {
        // The integer ledger stores 0 for "nothing applied".
        if strategy == Strategy::Integer {
            if let Some(zero) = units.iter().find(|m| m.version() == 0) {
                return Err(LoadError::InvalidFilename {
                    file: display_origin(zero),
                    reason: "integer keys start at 1".to_string(),
                });
            }
        }

        units.sort_by(|a, b| strategy.compare(a.key(), b.key()));
        for pair in units.windows(2) {
            if strategy.conflicts(pair[0].key(), pair[1].key()) {
                return Err(LoadError::DuplicateKey {
                    key: strategy.describe_key(pair[0].key()),
                    first: display_origin(&pair[0]),
                    second: display_origin(&pair[1]),
                });
            }
        }
        Ok(Self { strategy, units })
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Units in ascending order
    pub fn units(&self) -> &[Migration] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Highest unit, if any
    pub fn latest(&self) -> Option<&Migration> {
        self.units.last()
    }

    /// Unit whose numeric prefix equals `version`
    pub fn find_version(&self, version: u64) -> Option<&Migration> {
        self.units.iter().find(|m| m.version() == version)
    }

    /// Unit with the given name
    pub fn find_name(&self, name: &str) -> Option<&Migration> {
        self.units.iter().find(|m| m.name() == name)
    }

    /// Names in ascending order
    pub fn names(&self) -> Vec<&str> {
        self.units.iter().map(|m| m.name()).collect()
    }
}

fn display_origin(migration: &Migration) -> String {
    match migration.source() {
        Some(path) => file_label(path),
        None => migration.name().to_string(),
    }
}

/// Files found on disk for one migration name.
#[derive(Default)]
struct UnitFiles {
    version: u64,
    single: Option<PathBuf>,
    up: Option<PathBuf>,
    down: Option<PathBuf>,
}

/// Reads migration units from a directory.
#[derive(Debug, Clone)]
pub struct MigrationLoader {
    dir: PathBuf,
    strategy: Option<Strategy>,
}

impl MigrationLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            strategy: None,
        }
    }

    /// Force a strategy instead of detecting one from the filenames
    pub fn with_strategy(mut self, strategy: Option<Strategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Scan the directory and build the ordered set.
    pub fn load(&self) -> LoadResult<MigrationSet> {
        if !self.dir.is_dir() {
            return Err(LoadError::DirectoryNotFound {
                path: self.dir.display().to_string(),
            });
        }

        let files = self.collect_files()?;

        let strategy = match self.strategy {
            Some(strategy) => strategy,
            None => {
                let keys: Vec<MigrationKey> = files
                    .iter()
                    .map(|(name, f)| MigrationKey::new(f.version, name.clone()))
                    .collect();
                Strategy::detect(&keys)?
            }
        };

        let mut units = Vec::with_capacity(files.len());
        for (name, unit_files) in files {
            units.push(build_unit(name, unit_files)?);
        }

        let set = MigrationSet::new(strategy, units)?;
        log::debug!(
            "Loaded {} {} migration(s) from {}",
            set.len(),
            strategy,
            self.dir.display()
        );
        Ok(set)
    }

    /// Group directory entries by migration name.
    fn collect_files(&self) -> LoadResult<BTreeMap<String, UnitFiles>> {
        let io_err = |source| LoadError::Io {
            path: self.dir.display().to_string(),
            source,
        };

        let mut entries: Vec<PathBuf> = std::fs::read_dir(&self.dir)
            .map_err(io_err)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<_, _>>()
            .map_err(io_err)?;
        entries.sort();

        let mut files: BTreeMap<String, UnitFiles> = BTreeMap::new();
        for path in entries {
            if path.is_dir() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|f| f.to_str()) else {
                continue;
            };
            let Some(parsed) = parse_filename(file_name)? else {
                log::debug!("Skipping non-migration file {}", path.display());
                continue;
            };

            let slot = files.entry(parsed.key.name.clone()).or_default();
            slot.version = parsed.key.version;
            match parsed.role {
                FileRole::Single => slot.single = Some(path),
                FileRole::Up => slot.up = Some(path),
                FileRole::Down => slot.down = Some(path),
            }
        }
        Ok(files)
    }
}

fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn build_unit(name: String, files: UnitFiles) -> LoadResult<Migration> {
    let key = MigrationKey::new(files.version, name);
    match (files.single, files.up, files.down) {
        (Some(single), None, None) => {
            let source = read_file(&single)?;
            let body = SqlBody::parse(&source).map_err(|reason| LoadError::MalformedUnit {
                file: file_label(&single),
                reason,
            })?;
            Ok(Migration::new(key, body).with_source(single))
        }
        (Some(single), Some(other), _) | (Some(single), None, Some(other)) => {
            Err(LoadError::DuplicateKey {
                key: key.name,
                first: file_label(&single),
                second: file_label(&other),
            })
        }
        (None, Some(up), Some(down)) => {
            let up_sql = read_file(&up)?;
            let down_sql = read_file(&down)?;
            let body = SqlBody::new(up_sql.trim(), Some(down_sql.trim().to_string()));
            Ok(Migration::new(key, body).with_source(up))
        }
        (None, Some(_), None) => Err(LoadError::MissingHalf {
            missing: format!("{}.down.sql", key.name),
            name: key.name,
        }),
        (None, None, Some(_)) => Err(LoadError::MissingHalf {
            missing: format!("{}.up.sql", key.name),
            name: key.name,
        }),
        (None, None, None) => Err(LoadError::MalformedUnit {
            file: key.name,
            reason: "no files".to_string(),
        }),
    }
}

#[cfg(test)]
#[path = "loader_test.rs"]
mod tests;
