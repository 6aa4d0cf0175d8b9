//! Folding migration history into the effective trigger set

use std::path::PathBuf;

use serde::Serialize;
use tripwire_core::Dialect;
use tripwire_triggers::{TemplateVars, Trigger};

use super::{HistoryError, HistoryResult, MigrationSource, SchemaSnapshot};
use crate::DeclarationExtractor;

/// Label used for the schema snapshot in error messages
const SNAPSHOT_LABEL: &str = "schema snapshot";

/// Where the baseline declarations come from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Baseline {
    /// The configured schema snapshot file, if it exists
    #[default]
    FromFile,
    /// Snapshot text supplied by the caller
    Text(String),
    /// No baseline
    Disabled,
}

/// Replay settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Also pick up triggers created with raw SQL
    pub include_manual_triggers: bool,
    /// Replay the baseline before every migration, whatever its version
    pub schema_first: bool,
    /// Only replay migrations that have been applied
    pub skip_pending_migrations: bool,
    pub baseline: Baseline,
}

impl ReplayOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings for dumping the schema of the database as migrated
    ///
    /// The previous snapshot is replayed first, then every applied migration
    /// in order, including ones older than the snapshot. This reproduces the
    /// state after migrating down below the snapshot's version.
    pub fn for_schema_dump() -> Self {
        Self {
            include_manual_triggers: true,
            schema_first: true,
            skip_pending_migrations: true,
            baseline: Baseline::FromFile,
        }
    }

    pub fn with_manual_triggers(mut self, include: bool) -> Self {
        self.include_manual_triggers = include;
        self
    }

    pub fn with_schema_first(mut self, schema_first: bool) -> Self {
        self.schema_first = schema_first;
        self
    }

    pub fn with_skip_pending_migrations(mut self, skip: bool) -> Self {
        self.skip_pending_migrations = skip;
        self
    }

    pub fn with_baseline(mut self, baseline: Baseline) -> Self {
        self.baseline = baseline;
        self
    }
}

/// A trigger in the replayed set and the migration that declared it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayedTrigger {
    /// `None` for triggers from the schema snapshot
    pub migration_name: Option<String>,
    pub trigger: Trigger,
}

/// Triggers of one migration (or the baseline), in declaration order
struct ReplayStep {
    version: u64,
    migration_name: Option<String>,
    triggers: Vec<Trigger>,
}

/// Replays migration history into the set of triggers it leaves behind
///
/// Later declarations supersede earlier ones with the same identity; drop
/// directives remove the trigger and leave nothing in its place.
#[derive(Debug, Clone)]
pub struct MigrationReplayer {
    dialect: Dialect,
    vars: TemplateVars,
    schema_path: Option<PathBuf>,
}

impl MigrationReplayer {
    pub fn new(dialect: Dialect, vars: TemplateVars) -> Self {
        Self {
            dialect,
            vars,
            schema_path: None,
        }
    }

    /// Schema snapshot read for [`Baseline::FromFile`]
    pub fn with_schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_path = Some(path.into());
        self
    }

    pub fn replay(
        &self,
        source: &dyn MigrationSource,
        options: &ReplayOptions,
    ) -> HistoryResult<Vec<ReplayedTrigger>> {
        let extractor = DeclarationExtractor::new(self.dialect)
            .with_manual_triggers(options.include_manual_triggers);

        let applied = if options.skip_pending_migrations {
            Some(source.applied_versions().unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Treating every migration as pending");
                Default::default()
            }))
        } else {
            None
        };

        let mut steps = Vec::new();
        for migration in source.migrations()? {
            if applied
                .as_ref()
                .is_some_and(|applied| !applied.contains(&migration.version))
            {
                tracing::debug!(version = migration.version, "Skipping pending migration");
                continue;
            }
            let triggers = extractor
                .extract(migration.up_section())
                .map_err(|source| HistoryError::Extract {
                    migration: migration.name.clone(),
                    source,
                })?;
            if !triggers.is_empty() {
                steps.push(ReplayStep {
                    version: migration.version,
                    migration_name: Some(migration.name),
                    triggers,
                });
            }
        }

        if let Some(snapshot) = self.baseline(&options.baseline)? {
            let triggers = extractor
                .extract(&snapshot.text)
                .map_err(|source| HistoryError::Extract {
                    migration: SNAPSHOT_LABEL.to_string(),
                    source,
                })?;
            if !triggers.is_empty() {
                steps.insert(
                    0,
                    ReplayStep {
                        version: snapshot.version,
                        migration_name: None,
                        triggers,
                    },
                );
            }
        }

        if !options.schema_first {
            steps.sort_by_key(|step| step.version);
        }

        let mut replayed: Vec<ReplayedTrigger> = Vec::new();
        for step in steps {
            for mut trigger in step.triggers {
                trigger.prepare(&self.vars)?;
                replayed.retain(|existing| existing.trigger.identity() != trigger.identity());
                if !trigger.is_drop() {
                    replayed.push(ReplayedTrigger {
                        migration_name: step.migration_name.clone(),
                        trigger,
                    });
                }
            }
        }

        tracing::debug!(count = replayed.len(), "Replayed migration history");
        Ok(replayed)
    }

    fn baseline(&self, baseline: &Baseline) -> HistoryResult<Option<SchemaSnapshot>> {
        match baseline {
            Baseline::Disabled => Ok(None),
            Baseline::Text(text) => Ok(Some(SchemaSnapshot::from_text(text.clone()))),
            Baseline::FromFile => match &self.schema_path {
                Some(path) => SchemaSnapshot::read(path),
                None => Ok(None),
            },
        }
    }
}
