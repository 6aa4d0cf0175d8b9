//! Error types for migration history

use std::path::PathBuf;

use thiserror::Error;
use tripwire_triggers::TriggerError;

use crate::ExtractError;

/// Errors raised while reading or replaying migration history
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to read migration directory {}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Applied versions cannot be determined, e.g. the database has no
    /// migrations table yet
    #[error("applied migration versions unavailable: {0}")]
    Unavailable(String),

    #[error("invalid trigger declaration in {migration}")]
    Extract {
        migration: String,
        #[source]
        source: ExtractError,
    },

    #[error(transparent)]
    Trigger(#[from] TriggerError),
}

/// Result type for migration history operations
pub type HistoryResult<T> = Result<T, HistoryError>;
