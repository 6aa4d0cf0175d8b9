//! Writing reconciliation migrations

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use convert_case::{Case, Casing};
use itertools::Itertools;
use tempfile::NamedTempFile;
use tripwire_triggers::Trigger;

use super::{EmitError, EmitResult, migration_base_name, unique_migration_name};
use crate::{DOWN_MARKER, MigrationRecord, TriggerDiff, UP_MARKER};

const HEADER: &str = "\
-- This migration was generated by `tripwire generate`.
-- While you can edit this file, any changes you make to the definitions here
-- will be undone by the next generated trigger migration.";

/// A migration file written by [`MigrationEmitter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMigration {
    pub path: PathBuf,
    pub name: String,
    pub version: u64,
}

/// Writes migrations reconciling history with the declared triggers
#[derive(Debug, Clone)]
pub struct MigrationEmitter {
    dir: PathBuf,
    extension: String,
    timestamped: bool,
    now: Option<DateTime<Utc>>,
}

impl MigrationEmitter {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
            timestamped: true,
            now: None,
        }
    }

    /// Use UTC timestamps (default) or sequential integers as versions
    pub fn with_timestamped_versions(mut self, timestamped: bool) -> Self {
        self.timestamped = timestamped;
        self
    }

    /// Fixes the time used for timestamp versions
    pub fn with_timestamp(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Version for the next migration, always above every existing version
    pub fn next_version(&self, existing: &[MigrationRecord]) -> u64 {
        let sequential = existing
            .iter()
            .map(|m| m.version)
            .max()
            .map_or(1, |max| max.saturating_add(1));
        if !self.timestamped {
            return sequential;
        }
        self.now
            .unwrap_or_else(Utc::now)
            .format("%Y%m%d%H%M%S")
            .to_string()
            .parse::<u64>()
            .map_or(sequential, |timestamp| timestamp.max(sequential))
    }

    /// Writes the migration for `diff`
    ///
    /// Returns `None` without touching the filesystem when there is nothing
    /// to migrate.
    pub fn emit(
        &self,
        diff: &TriggerDiff,
        existing: &[MigrationRecord],
    ) -> EmitResult<Option<GeneratedMigration>> {
        if diff.up_drops.is_empty() && diff.up_creates.is_empty() {
            return Ok(None);
        }

        let base = migration_base_name(diff);
        let name = unique_migration_name(&base, existing.iter().map(|m| m.name.as_str()));
        let version = self.next_version(existing);
        let path = self.dir.join(format!(
            "{version}_{}.{}",
            name.to_case(Case::Snake),
            self.extension
        ));

        self.write_atomic(&path, &render_migration(diff))?;
        tracing::info!(path = %path.display(), name = %name, version, "Generated trigger migration");

        Ok(Some(GeneratedMigration {
            path,
            name,
            version,
        }))
    }

    fn write_atomic(&self, path: &Path, contents: &str) -> EmitResult<()> {
        let write_err = |source| EmitError::Write {
            path: path.to_path_buf(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(write_err)?;
        let mut file = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        file.write_all(contents.as_bytes()).map_err(write_err)?;
        file.flush().map_err(write_err)?;
        file.persist_noclobber(path)
            .map_err(|source| EmitError::Persist {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(())
    }
}

/// Migration file text: header, then the up and down steps
pub fn render_migration(diff: &TriggerDiff) -> String {
    format!(
        "{HEADER}\n\n{UP_MARKER}\n{}\n\n{DOWN_MARKER}\n{}\n",
        render_steps(diff.up_steps()),
        render_steps(diff.down_steps())
    )
}

fn render_steps<'a>(steps: impl Iterator<Item = &'a Trigger>) -> String {
    steps
        .map(|trigger| {
            let mut trigger = trigger.clone();
            trigger.mark_generated();
            trigger.to_source("")
        })
        .join("\n\n")
}
