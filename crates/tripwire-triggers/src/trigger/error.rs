//! Error types for building and preparing triggers

use thiserror::Error;
use tripwire_core::Dialect;

use super::{TriggerScope, TriggerTiming};

/// Reasons a trigger specification is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("table name is required")]
    MissingTable,
    #[error("trigger name is required")]
    MissingName,
    #[error("at least one event (insert/update/delete) must be specified")]
    NoEvents,
    #[error("unknown event '{0}'")]
    UnknownEvent(String),
    #[error("timing (before/after/instead_of) is required")]
    MissingTiming,
    #[error("unknown timing '{0}'")]
    UnknownTiming(String),
    #[error("unknown scope '{0}' (expected row or statement)")]
    UnknownScope(String),
    #[error("{timing} triggers are not supported by {dialect}")]
    TimingNotSupported {
        timing: TriggerTiming,
        dialect: Dialect,
    },
    #[error("{scope} triggers are not supported by {dialect}")]
    ScopeNotSupported { scope: TriggerScope, dialect: Dialect },
    #[error("INSTEAD OF triggers must be row level on {0}")]
    InsteadOfRequiresRow(Dialect),
    #[error("WHEN conditions are not supported by {0}")]
    WhenConditionNotSupported(Dialect),
    #[error("UPDATE OF columns are not supported by {0}")]
    UpdateColumnsNotSupported(Dialect),
    #[error("UPDATE OF columns require an update event")]
    UpdateColumnsWithoutUpdate,
    #[error("no trigger body for {0}")]
    MissingBody(Dialect),
    #[error("unknown dialect '{0}' in body override")]
    UnknownDialect(String),
    #[error("option '{key}' must be {expected}")]
    InvalidOption { key: String, expected: &'static str },
    #[error("SQL is not a CREATE TRIGGER or DROP TRIGGER statement")]
    UnrecognizedSql,
}

/// Errors raised while building or preparing a trigger
#[derive(Debug, Error)]
pub enum TriggerError {
    /// Malformed declaration (the `InvalidTriggerSpec` case)
    #[error("invalid trigger spec for {trigger}: {source}")]
    InvalidSpec {
        trigger: String,
        #[source]
        source: SpecError,
    },

    /// Name template could not be rendered
    #[error("cannot interpolate trigger name '{template}': {source}")]
    Template {
        template: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Result type for trigger operations
pub type TriggerResult<T> = Result<T, TriggerError>;
