use std::path::{Path, PathBuf};

use tripwire_core::TripwireConfig;
use tripwire_triggers::{DialectRenderer, TemplateVars, Trigger};

use super::ProjectResult;
use crate::{
    DeclarationCollector, DirectoryMigrationSource, GeneratedMigration, MigrationEmitter,
    MigrationReplayer, MigrationSource, Reconciler, ReplayOptions, ReplayedTrigger, SqlMigration,
    SqliteVersionStore, TriggerDiff,
};

/// A project root and its configuration
///
/// All paths in the configuration are resolved against the root when the
/// project is opened.
///
/// # Examples
///
/// ```no_run
/// use tripwire_core::TripwireConfig;
/// use tripwire_migrations::Project;
///
/// let project = Project::open(".", TripwireConfig::new());
/// if !project.migrations_current()? {
///     if let Some(migration) = project.generate_migration()? {
///         println!("wrote {}", migration.path.display());
///     }
/// }
/// # Ok::<(), tripwire_migrations::ProjectError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    config: TripwireConfig,
    vars: TemplateVars,
}

impl Project {
    pub fn open(root: impl Into<PathBuf>, config: TripwireConfig) -> Self {
        let root = root.into();
        let config = config.resolved(&root);
        let vars = TemplateVars::new(config.variables.clone());
        Self { root, config, vars }
    }

    /// Opens `root` with its `tripwire.toml`, or defaults when there is none
    pub fn discover(root: impl Into<PathBuf>) -> ProjectResult<Self> {
        let root = root.into();
        let config = TripwireConfig::discover(&root)?;
        Ok(Self::open(root, config))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configuration with resolved paths
    pub fn config(&self) -> &TripwireConfig {
        &self.config
    }

    pub fn migration_source(&self) -> DirectoryMigrationSource {
        let source =
            DirectoryMigrationSource::new(&self.config.migration_path, &self.config.extension);
        match &self.config.applied_versions_db {
            Some(db) => source.with_version_store(SqliteVersionStore::with_path(db)),
            None => source,
        }
    }

    pub fn collector(&self) -> DeclarationCollector {
        DeclarationCollector::new(
            &self.config.model_path,
            &self.config.extension,
            self.config.dialect,
            self.vars.clone(),
        )
    }

    pub fn replayer(&self) -> MigrationReplayer {
        MigrationReplayer::new(self.config.dialect, self.vars.clone())
            .with_schema_path(&self.config.schema_path)
    }

    pub fn emitter(&self) -> MigrationEmitter {
        MigrationEmitter::new(&self.config.migration_path, &self.config.extension)
            .with_timestamped_versions(self.config.timestamped_migrations)
    }

    /// The declared trigger set
    pub fn current_triggers(&self) -> ProjectResult<Vec<Trigger>> {
        Ok(self.collector().collect()?)
    }

    /// The trigger set migration history leaves behind
    pub fn current_migrations(
        &self,
        options: &ReplayOptions,
    ) -> ProjectResult<Vec<ReplayedTrigger>> {
        Ok(self.replayer().replay(&self.migration_source(), options)?)
    }

    /// Returns true if migration history matches the declared triggers
    pub fn migrations_current(&self) -> ProjectResult<bool> {
        let canonical = self.current_triggers()?;
        let existing = self.existing_triggers()?;
        Ok(Reconciler::new().is_current(&canonical, &existing))
    }

    /// The changes a generated migration would make
    pub fn pending_diff(&self) -> ProjectResult<TriggerDiff> {
        let canonical = self.current_triggers()?;
        let existing = self.existing_triggers()?;
        Ok(Reconciler::new().diff(&canonical, &existing))
    }

    /// SQL for `diff` in the project's dialect
    pub fn render_sql(&self, diff: &TriggerDiff) -> ProjectResult<SqlMigration> {
        let renderer = DialectRenderer::new(self.config.dialect);
        Ok(SqlMigration::from_diff(diff, &renderer)?)
    }

    /// Writes a migration reconciling history with the declared triggers
    ///
    /// Returns `None` when history is already current.
    pub fn generate_migration(&self) -> ProjectResult<Option<GeneratedMigration>> {
        let diff = self.pending_diff()?;
        let migrations = self.migration_source().migrations()?;
        Ok(self.emitter().emit(&diff, &migrations)?)
    }

    fn existing_triggers(&self) -> ProjectResult<Vec<Trigger>> {
        Ok(self
            .current_migrations(&ReplayOptions::new())?
            .into_iter()
            .map(|replayed| replayed.trigger)
            .collect())
    }
}
