//! Applied migration versions kept by the migration runner

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};

use super::{HistoryError, HistoryResult};

/// Reads the `schema_migrations` table of a SQLite database
///
/// The store is only ever opened read-only. Versions may be stored as text or
/// integers; anything else is ignored.
#[derive(Debug, Clone)]
pub struct SqliteVersionStore {
    db_path: PathBuf,
}

impl SqliteVersionStore {
    pub fn with_path(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> HistoryResult<Connection> {
        if !self.db_path.is_file() {
            return Err(HistoryError::Unavailable(format!(
                "{} does not exist",
                self.db_path.display()
            )));
        }
        Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            HistoryError::Unavailable(format!("failed to open {}: {e}", self.db_path.display()))
        })
    }

    /// Versions listed in `schema_migrations`
    pub fn applied_versions(&self) -> HistoryResult<BTreeSet<u64>> {
        let conn = self.connect()?;
        let unavailable = |e: rusqlite::Error| HistoryError::Unavailable(e.to_string());

        let mut stmt = conn
            .prepare("SELECT version FROM schema_migrations")
            .map_err(unavailable)?;
        let values = stmt
            .query_map([], |row| row.get::<_, Value>(0))
            .map_err(unavailable)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(unavailable)?;

        Ok(values
            .into_iter()
            .filter_map(|value| match value {
                Value::Integer(version) => u64::try_from(version).ok(),
                Value::Text(version) => version.trim().parse().ok(),
                _ => None,
            })
            .collect())
    }
}
