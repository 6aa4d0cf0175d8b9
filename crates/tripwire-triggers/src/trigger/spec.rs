//! Declarative trigger specifications

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::OptionValue;

/// What a declaration asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecKind {
    /// A trigger (or trigger group) to create
    #[default]
    Create,
    /// A directive removing a trigger by name
    Drop,
    /// A trigger written as raw SQL
    Manual,
}

/// A trigger as declared, before validation
///
/// Timing, events and scope are kept as the words the declaration used so
/// the builder can report unknown ones precisely.
///
/// # Examples
///
/// ```
/// use tripwire_triggers::TriggerSpec;
///
/// let spec = TriggerSpec::create()
///     .on("users")
///     .after(["update"])
///     .with_body("UPDATE accounts SET touched = 1;");
///
/// assert_eq!(spec.table.as_deref(), Some("users"));
/// assert_eq!(spec.events, vec!["update".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerSpec {
    pub kind: SpecKind,
    pub name: Option<String>,
    pub table: Option<String>,
    pub timing: Option<String>,
    pub events: Vec<String>,
    pub scope: Option<String>,
    pub when: Option<String>,
    pub update_columns: Vec<String>,
    pub body: Option<String>,
    /// Bodies keyed by dialect name
    pub body_overrides: BTreeMap<String, String>,
    /// Raw SQL of a manual trigger
    pub sql: Option<String>,
    pub options: BTreeMap<String, OptionValue>,
}

impl TriggerSpec {
    /// Starts a trigger creation spec
    pub fn create() -> Self {
        Self::default()
    }

    /// Starts a drop directive
    pub fn drop_trigger(name: impl Into<String>) -> Self {
        Self {
            kind: SpecKind::Drop,
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Starts a manual trigger from raw SQL
    pub fn manual(sql: impl Into<String>) -> Self {
        Self {
            kind: SpecKind::Manual,
            sql: Some(sql.into()),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn on(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Sets the timing keyword and the events it applies to
    pub fn with_timing<I, S>(mut self, timing: impl Into<String>, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.timing = Some(timing.into());
        self.events = events.into_iter().map(Into::into).collect();
        self
    }

    pub fn before<I, S>(self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_timing("before", events)
    }

    pub fn after<I, S>(self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_timing("after", events)
    }

    pub fn instead_of<I, S>(self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_timing("instead_of", events)
    }

    /// Sets the scope keyword (`row` or `statement`)
    pub fn for_each(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_when(mut self, condition: impl Into<String>) -> Self {
        self.when = Some(condition.into());
        self
    }

    pub fn with_update_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.update_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_body_override(mut self, dialect: impl Into<String>, body: impl Into<String>) -> Self {
        self.body_overrides.insert(dialect.into(), body.into());
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: OptionValue) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Short description used in error messages
    pub fn label(&self) -> String {
        match (&self.name, &self.table) {
            (Some(name), _) => name.clone(),
            (None, Some(table)) => format!("trigger on {table}"),
            (None, None) => match self.kind {
                SpecKind::Manual => "manual trigger".to_string(),
                _ => "unnamed trigger".to_string(),
            },
        }
    }
}
