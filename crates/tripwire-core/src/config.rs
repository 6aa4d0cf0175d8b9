//! Project configuration
//!
//! Configuration is read from `tripwire.toml` at the project root. Every
//! field has a default, so an absent file or an empty table yields a usable
//! configuration. Relative paths are resolved against the project root with
//! [`TripwireConfig::resolved`].
//!
//! ```toml
//! dialect = "postgres"
//! model_path = "app/triggers"
//! migration_path = "db/migrate"
//! schema_path = "db/schema.tw"
//! applied_versions_db = "db/development.sqlite3"
//!
//! [variables]
//! table_prefix = "app_"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult, Dialect};


/// Name of the configuration file looked up at the project root
pub const CONFIG_FILE_NAME: &str = "tripwire.toml";

/// Configuration shared by every tripwire operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TripwireConfig {
    /// Database dialect triggers are built and rendered for
    pub dialect: Dialect,
    /// Directory holding model trigger declarations
    pub model_path: PathBuf,
    /// Directory holding migrations
    pub migration_path: PathBuf,
    /// Schema snapshot file used as the replay baseline
    pub schema_path: PathBuf,
    /// File extension (without dot) of declaration and migration files
    pub extension: String,
    /// Whether new migrations get timestamp versions (otherwise max + 1)
    pub timestamped_migrations: bool,
    /// SQLite database holding the `schema_migrations` table, if any
    pub applied_versions_db: Option<PathBuf>,
    /// Variables interpolated into trigger name templates
    pub variables: BTreeMap<String, String>,
}

impl Default for TripwireConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            model_path: PathBuf::from("app/triggers"),
            migration_path: PathBuf::from("db/migrate"),
            schema_path: PathBuf::from("db/schema.tw"),
            extension: "tw".to_string(),
            timestamped_migrations: true,
            applied_versions_db: None,
            variables: BTreeMap::new(),
        }
    }
}

impl TripwireConfig {
    /// Creates a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a config from TOML text
    ///
    /// `origin` is only used for error reporting.
    pub fn from_toml_str(text: &str, origin: &Path) -> ConfigResult<Self> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Loads a config file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text, path)?;
        tracing::debug!(path = %path.display(), dialect = %config.dialect, "Loaded config");
        Ok(config)
    }

    /// Loads `tripwire.toml` from `root`, falling back to defaults when absent
    pub fn discover(root: &Path) -> ConfigResult<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            tracing::debug!(root = %root.display(), "No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Returns a copy with every relative path joined onto `root`
    pub fn resolved(&self, root: &Path) -> Self {
        let resolve = |path: &Path| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                root.join(path)
            }
        };

        Self {
            model_path: resolve(&self.model_path),
            migration_path: resolve(&self.migration_path),
            schema_path: resolve(&self.schema_path),
            applied_versions_db: self.applied_versions_db.as_deref().map(resolve),
            ..self.clone()
        }
    }

    /// Sets the dialect
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Sets the model declaration directory
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    /// Sets the migration directory
    pub fn with_migration_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.migration_path = path.into();
        self
    }

    /// Sets the schema snapshot path
    pub fn with_schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_path = path.into();
        self
    }

    /// Chooses between timestamp and sequential migration versions
    pub fn with_timestamped_migrations(mut self, timestamped: bool) -> Self {
        self.timestamped_migrations = timestamped;
        self
    }

    /// Sets the applied-versions database
    pub fn with_applied_versions_db(mut self, path: impl Into<PathBuf>) -> Self {
        self.applied_versions_db = Some(path.into());
        self
    }

    /// Adds a template variable
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }
}
