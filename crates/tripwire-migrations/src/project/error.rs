use thiserror::Error;
use tripwire_core::ConfigError;
use tripwire_triggers::RenderError;

use crate::{CollectError, EmitError, HistoryError};

/// Errors raised by [`Project`](super::Project) operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The declared triggers could not be loaded
    #[error(transparent)]
    Declarations(#[from] CollectError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl ProjectError {
    /// Returns true if the declared trigger set could not be determined
    pub fn is_declaration_failure(&self) -> bool {
        matches!(self, ProjectError::Declarations(_))
    }
}

/// Result type for project operations
pub type ProjectResult<T> = Result<T, ProjectError>;
