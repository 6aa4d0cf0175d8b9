//! Error types for declaration extraction

use thiserror::Error;
use tripwire_triggers::TriggerError;

/// Errors raised while extracting trigger declarations
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The declaration does not follow the grammar
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// The declaration parsed but describes an invalid trigger
    #[error("line {line}: {source}")]
    Trigger {
        line: usize,
        #[source]
        source: TriggerError,
    },
}

impl ExtractError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    /// Line of the declaration (1-based)
    pub fn line(&self) -> usize {
        match self {
            Self::Syntax { line, .. } | Self::Trigger { line, .. } => *line,
        }
    }
}

/// Result type for extraction
pub type ExtractResult<T> = Result<T, ExtractError>;
