//! Error types for tripwire configuration

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or interpreting project configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown dialect '{0}' (expected postgres, mysql, sqlite or mssql)")]
    UnknownDialect(String),
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
