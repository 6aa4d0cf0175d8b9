//! Migration files and the schema snapshot

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use convert_case::{Case, Casing};
use regex::Regex;

use super::{HistoryError, HistoryResult, SqliteVersionStore};

/// Line opening the up step of a migration
pub const UP_MARKER: &str = "-- tripwire:up";
/// Line opening the down step of a migration
pub const DOWN_MARKER: &str = "-- tripwire:down";

static MIGRATION_STEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<version>\d+)_(?P<name>\w+)$").expect("valid regex"));

static SCHEMA_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*--[ \t]*tripwire:schema[ \t]+version=(?P<version>\d+)")
        .expect("valid regex")
});

/// One migration: its version, name and text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    pub version: u64,
    /// PascalCase name, e.g. `CreateTriggerUsersInsert`
    pub name: String,
    pub path: PathBuf,
    pub body: String,
}

impl MigrationRecord {
    pub fn new(version: u64, name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            version,
            name: name.into(),
            path: PathBuf::new(),
            body: body.into(),
        }
    }

    /// Text of the up step
    ///
    /// Runs from the up marker to the down marker. Without markers the whole
    /// body is the up step.
    pub fn up_section(&self) -> &str {
        let body = self.body.as_str();
        let up = find_marker(body, UP_MARKER);
        let down = find_marker(body, DOWN_MARKER);

        match (up, down) {
            (Some((_, up_end)), Some((down_start, _))) if down_start >= up_end => {
                &body[up_end..down_start]
            }
            (Some((_, up_end)), _) => &body[up_end..],
            (None, Some((down_start, _))) => &body[..down_start],
            (None, None) => body,
        }
    }
}

/// Start and end (past the newline) of the first line equal to `marker`
fn find_marker(body: &str, marker: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    for line in body.split_inclusive('\n') {
        if line.trim() == marker {
            return Some((offset, offset + line.len()));
        }
        offset += line.len();
    }
    None
}

/// Where migrations and their applied state come from
pub trait MigrationSource {
    /// All migrations, ordered by version
    fn migrations(&self) -> HistoryResult<Vec<MigrationRecord>>;

    /// Versions that have been applied to the database
    ///
    /// Returns [`HistoryError::Unavailable`] when this cannot be determined.
    fn applied_versions(&self) -> HistoryResult<BTreeSet<u64>>;
}

/// Migrations stored as `<version>_<snake_name>.<extension>` files
#[derive(Debug, Clone)]
pub struct DirectoryMigrationSource {
    dir: PathBuf,
    extension: String,
    versions: Option<SqliteVersionStore>,
}

impl DirectoryMigrationSource {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
            versions: None,
        }
    }

    /// Reads applied versions from a migration runner's SQLite database
    pub fn with_version_store(mut self, store: SqliteVersionStore) -> Self {
        self.versions = Some(store);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Parses a migration file name into its version and PascalCase name
    pub fn parse_file_name(&self, path: &Path) -> Option<(u64, String)> {
        if path.extension()?.to_str()? != self.extension {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let caps = MIGRATION_STEM_RE.captures(stem)?;
        let version = caps["version"].parse().ok()?;
        Some((version, (&caps["name"]).to_case(Case::Pascal)))
    }
}

impl MigrationSource for DirectoryMigrationSource {
    fn migrations(&self) -> HistoryResult<Vec<MigrationRecord>> {
        if !self.dir.is_dir() {
            tracing::debug!(dir = %self.dir.display(), "Migration directory does not exist");
            return Ok(Vec::new());
        }

        let read_dir_err = |source| HistoryError::ReadDir {
            path: self.dir.clone(),
            source,
        };
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(read_dir_err)? {
            let path = entry.map_err(read_dir_err)?.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut migrations = Vec::new();
        for path in paths {
            let Some((version, name)) = self.parse_file_name(&path) else {
                continue;
            };
            let body = std::fs::read_to_string(&path).map_err(|source| HistoryError::ReadFile {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(version, name = %name, "Read migration");
            migrations.push(MigrationRecord {
                version,
                name,
                path,
                body,
            });
        }

        migrations.sort_by_key(|m| m.version);
        Ok(migrations)
    }

    fn applied_versions(&self) -> HistoryResult<BTreeSet<u64>> {
        match &self.versions {
            Some(store) => store.applied_versions(),
            None => Err(HistoryError::Unavailable(
                "no applied-versions database configured".to_string(),
            )),
        }
    }
}

/// Migrations held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryMigrationSource {
    migrations: Vec<MigrationRecord>,
    applied: Option<BTreeSet<u64>>,
}

impl MemoryMigrationSource {
    pub fn new(migrations: Vec<MigrationRecord>) -> Self {
        Self {
            migrations,
            applied: None,
        }
    }

    pub fn with_applied<I: IntoIterator<Item = u64>>(mut self, versions: I) -> Self {
        self.applied = Some(versions.into_iter().collect());
        self
    }
}

impl MigrationSource for MemoryMigrationSource {
    fn migrations(&self) -> HistoryResult<Vec<MigrationRecord>> {
        let mut migrations = self.migrations.clone();
        migrations.sort_by_key(|m| m.version);
        Ok(migrations)
    }

    fn applied_versions(&self) -> HistoryResult<BTreeSet<u64>> {
        self.applied
            .clone()
            .ok_or_else(|| HistoryError::Unavailable("no applied versions recorded".to_string()))
    }
}

/// The schema snapshot: a baseline of declarations with a version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSnapshot {
    /// Version from the marker line, 0 when there is none
    pub version: u64,
    pub text: String,
}

impl SchemaSnapshot {
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let version = SCHEMA_VERSION_RE
            .captures(&text)
            .and_then(|caps| caps["version"].parse().ok())
            .unwrap_or(0);
        Self { version, text }
    }

    /// Reads the snapshot at `path`, `None` if there is no such file
    pub fn read(path: &Path) -> HistoryResult<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path).map_err(|source| HistoryError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(Self::from_text(text)))
    }

    /// Marker line recording `version`
    pub fn version_marker(version: u64) -> String {
        format!("-- tripwire:schema version={version}")
    }
}
