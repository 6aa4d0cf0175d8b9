use std::path::PathBuf;

use thiserror::Error;
use tripwire_triggers::TriggerError;

use crate::ExtractError;

/// Errors raised while collecting declared triggers
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to read model directory {}", path.display())]
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

    /// A model declares triggers that could not be loaded
    #[error("unable to load {model} and its trigger(s) from {}", path.display())]
    DeclarationLoad {
        model: String,
        path: PathBuf,
        #[source]
        source: ExtractError,
    },

    #[error(transparent)]
    Trigger(#[from] TriggerError),
}

/// Result type for collecting declared triggers
pub type CollectResult<T> = Result<T, CollectError>;
