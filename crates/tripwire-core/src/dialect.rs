//! Database dialects and the trigger features each one supports

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;


/// Database engine a project emits triggers for
///
/// # Examples
///
/// ```
/// use tripwire_core::Dialect;
///
/// let dialect: Dialect = "postgresql".parse().unwrap();
/// assert_eq!(dialect, Dialect::Postgres);
/// assert!(dialect.supports_multiple_events());
/// assert!(!Dialect::Mysql.supports_multiple_events());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// PostgreSQL (trigger function + trigger)
    #[default]
    Postgres,
    /// MySQL / MariaDB
    Mysql,
    /// SQLite
    Sqlite,
    /// Microsoft SQL Server
    MsSql,
}

impl Dialect {
    /// All supported dialects
    pub fn all() -> [Self; 4] {
        [Self::Postgres, Self::Mysql, Self::Sqlite, Self::MsSql]
    }

    /// Parse a dialect from an adapter or driver name
    ///
    /// Matching is case-insensitive and tolerant of common aliases
    /// (`postgresql`, `pg`, `mariadb`, `sqlite3`, `sqlserver`).
    pub fn from_name(name: &str) -> Option<Self> {
        let name_lower = name.trim().to_lowercase();
        if name_lower.contains("postgres") || name_lower == "pg" {
            Some(Self::Postgres)
        } else if name_lower.contains("mysql") || name_lower.contains("mariadb") {
            Some(Self::Mysql)
        } else if name_lower.contains("sqlite") {
            Some(Self::Sqlite)
        } else if name_lower.contains("mssql") || name_lower.contains("sqlserver") {
            Some(Self::MsSql)
        } else {
            None
        }
    }

    /// Canonical lowercase name, as used in config files and body overrides
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Sqlite => "sqlite",
            Self::MsSql => "mssql",
        }
    }

    /// Check if this dialect supports BEFORE triggers
    pub fn supports_before(&self) -> bool {
        !matches!(self, Self::MsSql)
    }

    /// Check if this dialect supports INSTEAD OF triggers
    pub fn supports_instead_of(&self) -> bool {
        !matches!(self, Self::Mysql)
    }

    /// Check if this dialect supports FOR EACH ROW
    pub fn supports_row_level(&self) -> bool {
        !matches!(self, Self::MsSql)
    }

    /// Check if this dialect supports FOR EACH STATEMENT
    pub fn supports_statement_level(&self) -> bool {
        matches!(self, Self::Postgres | Self::MsSql)
    }

    /// Check if a single trigger can fire on more than one event
    ///
    /// Dialects without this capability get one physical trigger per event
    /// (a trigger group).
    pub fn supports_multiple_events(&self) -> bool {
        matches!(self, Self::Postgres | Self::MsSql)
    }

    /// Check if this dialect supports WHEN conditions
    pub fn supports_when_condition(&self) -> bool {
        matches!(self, Self::Postgres | Self::Sqlite)
    }

    /// Check if this dialect supports UPDATE OF columns
    pub fn supports_update_columns(&self) -> bool {
        matches!(self, Self::Postgres | Self::Sqlite)
    }

    /// Check if INSTEAD OF triggers must fire per row
    pub fn instead_of_requires_row(&self) -> bool {
        matches!(self, Self::Postgres | Self::Sqlite)
    }

    /// Check if the trigger body lives in a separate trigger function
    pub fn uses_trigger_function(&self) -> bool {
        matches!(self, Self::Postgres)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ConfigError::UnknownDialect(s.to_string()))
    }
}
