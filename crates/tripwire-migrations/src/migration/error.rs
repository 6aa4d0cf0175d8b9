//! Error types for migration generation

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while writing a migration
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to write migration {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The written file could not be moved to its final name, e.g. because a
    /// file of that name already exists
    #[error("failed to move migration into place at {}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
}

/// Result type for migration generation
pub type EmitResult<T> = Result<T, EmitError>;
