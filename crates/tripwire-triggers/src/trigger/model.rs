//! The canonical trigger record

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tripwire_core::Dialect;

use super::{TemplateVars, TriggerError, TriggerResult};

/// Version stamped into generated declarations
pub const COMPATIBILITY_VERSION: i64 = 1;

/// Longest identifier emitted for derived names (PostgreSQL's limit)
const MAX_IDENTIFIER_LEN: usize = 63;

/// When the trigger fires relative to the operation
///
/// # Examples
///
/// ```
/// use tripwire_triggers::TriggerTiming;
///
/// let timing = TriggerTiming::from_keyword("instead_of").unwrap();
/// assert!(timing.is_instead_of());
/// assert_eq!(timing.as_sql(), "INSTEAD OF");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TriggerTiming {
    /// Execute before the triggering statement
    Before,
    /// Execute after the triggering statement
    #[default]
    After,
    /// Execute instead of the triggering statement (views only)
    InsteadOf,
}

impl TriggerTiming {
    /// Check if this is a BEFORE trigger
    pub fn is_before(&self) -> bool {
        matches!(self, TriggerTiming::Before)
    }

    /// Check if this is an AFTER trigger
    pub fn is_after(&self) -> bool {
        matches!(self, TriggerTiming::After)
    }

    /// Check if this is an INSTEAD OF trigger
    pub fn is_instead_of(&self) -> bool {
        matches!(self, TriggerTiming::InsteadOf)
    }

    /// Convert to SQL keyword
    pub fn as_sql(&self) -> &'static str {
        match self {
            TriggerTiming::Before => "BEFORE",
            TriggerTiming::After => "AFTER",
            TriggerTiming::InsteadOf => "INSTEAD OF",
        }
    }

    /// Declaration keyword, also used in derived names
    pub fn keyword(&self) -> &'static str {
        match self {
            TriggerTiming::Before => "before",
            TriggerTiming::After => "after",
            TriggerTiming::InsteadOf => "instead_of",
        }
    }

    /// Parse a declaration keyword (case-insensitive)
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.split_whitespace().join("_").to_lowercase().as_str() {
            "before" => Some(TriggerTiming::Before),
            "after" => Some(TriggerTiming::After),
            "instead_of" => Some(TriggerTiming::InsteadOf),
            _ => None,
        }
    }
}

impl fmt::Display for TriggerTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// The DML event that fires the trigger
///
/// The derived ordering (insert, update, delete) is the canonical render
/// order for event lists.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    /// Trigger fires on INSERT
    Insert,
    /// Trigger fires on UPDATE
    Update,
    /// Trigger fires on DELETE
    Delete,
}

impl TriggerEvent {
    /// Convert to SQL keyword
    pub fn as_sql(&self) -> &'static str {
        match self {
            TriggerEvent::Insert => "INSERT",
            TriggerEvent::Update => "UPDATE",
            TriggerEvent::Delete => "DELETE",
        }
    }

    /// Declaration keyword, also used in derived names
    pub fn keyword(&self) -> &'static str {
        match self {
            TriggerEvent::Insert => "insert",
            TriggerEvent::Update => "update",
            TriggerEvent::Delete => "delete",
        }
    }

    /// Parse a declaration keyword (case-insensitive)
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.trim().to_lowercase().as_str() {
            "insert" => Some(TriggerEvent::Insert),
            "update" => Some(TriggerEvent::Update),
            "delete" => Some(TriggerEvent::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Level at which the trigger executes
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TriggerScope {
    /// Fire once per affected row
    #[default]
    Row,
    /// Fire once per statement
    Statement,
}

impl TriggerScope {
    /// Convert to SQL clause
    pub fn as_sql(&self) -> &'static str {
        match self {
            TriggerScope::Row => "FOR EACH ROW",
            TriggerScope::Statement => "FOR EACH STATEMENT",
        }
    }

    /// Declaration keyword, also used in derived names
    pub fn keyword(&self) -> &'static str {
        match self {
            TriggerScope::Row => "row",
            TriggerScope::Statement => "statement",
        }
    }

    /// Parse a declaration keyword (case-insensitive)
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.trim().to_lowercase().as_str() {
            "row" => Some(TriggerScope::Row),
            "statement" => Some(TriggerScope::Statement),
            _ => None,
        }
    }
}

impl fmt::Display for TriggerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Trigger body with optional per-dialect overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TriggerBody {
    /// Body used when no override matches the dialect
    pub default: Option<String>,
    /// Dialect specific bodies
    pub overrides: BTreeMap<Dialect, String>,
}

impl TriggerBody {
    /// Returns the body to render for a dialect
    pub fn for_dialect(&self, dialect: Dialect) -> Option<&str> {
        self.overrides
            .get(&dialect)
            .or(self.default.as_ref())
            .map(String::as_str)
    }

    /// Returns true if there is no body at all
    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.overrides.is_empty()
    }
}

/// A value in the free-form options bag
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<OptionValue>),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Options attached to a trigger declaration
///
/// `generated` and `compatibility` are bookkeeping written into generated
/// migrations and take no part in equality. Every other field does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerOptions {
    /// This declaration removes a trigger instead of creating one
    pub drop: bool,
    /// Declared through raw SQL rather than the builder
    pub manual: bool,
    /// Written by the migration generator
    pub generated: bool,
    /// Declaration format version of a generated migration
    pub compatibility: Option<i64>,
    /// Logical group a dropped physical trigger belongs to
    pub group: Option<String>,
    /// Any other option, kept verbatim
    pub extra: BTreeMap<String, OptionValue>,
}

/// A trigger or trigger group, as built for one dialect
///
/// Identity is the prepared name: two triggers with the same prepared name
/// describe the same database object and one supersedes the other. Equality
/// (`==`) is stricter and compares every rendered-relevant field, which is
/// what decides whether a migration is needed.
#[derive(Debug, Clone, Serialize)]
pub struct Trigger {
    pub(crate) name: String,
    pub(crate) explicit_name: bool,
    pub(crate) table: String,
    pub(crate) timing: TriggerTiming,
    pub(crate) events: BTreeSet<TriggerEvent>,
    pub(crate) scope: TriggerScope,
    pub(crate) when_condition: Option<String>,
    pub(crate) update_columns: Vec<String>,
    pub(crate) body: TriggerBody,
    pub(crate) manual_sql: Option<String>,
    pub(crate) options: TriggerOptions,
    pub(crate) members: Vec<Trigger>,
    pub(crate) prepared_name: Option<String>,
}

/// Fields that take part in equality and ordering
///
/// Bookkeeping (`generated`, `compatibility`, the raw name template and
/// whether the name was explicit) is left out.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct ComparisonKey<'a> {
    key: &'a str,
    table: &'a str,
    timing: TriggerTiming,
    events: &'a BTreeSet<TriggerEvent>,
    scope: TriggerScope,
    when_condition: Option<&'a str>,
    update_columns: &'a [String],
    body: &'a TriggerBody,
    manual_sql: Option<&'a str>,
    drop: bool,
    manual: bool,
    group: Option<&'a str>,
    extra: &'a BTreeMap<String, OptionValue>,
    members: Vec<ComparisonKey<'a>>,
}

impl Trigger {
    /// Creates a drop directive for an already prepared name
    pub fn drop_of(name: impl Into<String>, table: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            prepared_name: Some(name.clone()),
            name,
            explicit_name: true,
            table: table.into(),
            timing: TriggerTiming::default(),
            events: BTreeSet::new(),
            scope: TriggerScope::default(),
            when_condition: None,
            update_columns: Vec::new(),
            body: TriggerBody::default(),
            manual_sql: None,
            options: TriggerOptions {
                drop: true,
                ..Default::default()
            },
            members: Vec::new(),
        }
    }

    /// Name template (explicit or derived), before interpolation
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the name was supplied rather than derived
    pub fn has_explicit_name(&self) -> bool {
        self.explicit_name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn timing(&self) -> TriggerTiming {
        self.timing
    }

    /// Events in canonical order
    pub fn events(&self) -> impl Iterator<Item = TriggerEvent> + '_ {
        self.events.iter().copied()
    }

    pub fn scope(&self) -> TriggerScope {
        self.scope
    }

    pub fn when_condition(&self) -> Option<&str> {
        self.when_condition.as_deref()
    }

    pub fn update_columns(&self) -> &[String] {
        &self.update_columns
    }

    pub fn body(&self) -> &TriggerBody {
        &self.body
    }

    /// Raw SQL of a manual trigger
    pub fn manual_sql(&self) -> Option<&str> {
        self.manual_sql.as_deref()
    }

    pub fn options(&self) -> &TriggerOptions {
        &self.options
    }

    /// Physical triggers of a group, empty for a single trigger
    pub fn members(&self) -> &[Trigger] {
        &self.members
    }

    pub fn is_group(&self) -> bool {
        !self.members.is_empty()
    }

    /// Whether this is a drop directive rather than a creation
    pub fn is_drop(&self) -> bool {
        self.options.drop
    }

    pub fn is_manual(&self) -> bool {
        self.options.manual
    }

    /// Interpolated name, once [`prepare`](Self::prepare) has run
    pub fn prepared_name(&self) -> Option<&str> {
        self.prepared_name.as_deref()
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared_name.is_some()
    }

    /// Comparison key: the prepared name, or the raw name before preparation
    pub fn key(&self) -> &str {
        self.prepared_name.as_deref().unwrap_or(&self.name)
    }

    /// Key under which replay supersedes earlier declarations
    ///
    /// A drop directive for one member of a group removes the whole group,
    /// so its identity is the group's name.
    pub fn identity(&self) -> &str {
        match (&self.options.group, self.options.drop) {
            (Some(group), true) => group,
            _ => self.key(),
        }
    }

    /// Returns true if both triggers describe the same database object
    pub fn same_identity(&self, other: &Trigger) -> bool {
        self.key() == other.key()
    }

    /// Interpolates template variables into the name
    ///
    /// Idempotent: a prepared trigger keeps its prepared name.
    pub fn prepare(&mut self, vars: &TemplateVars) -> TriggerResult<()> {
        if self.prepared_name.is_none() {
            let prepared = vars
                .interpolate(&self.name)
                .map_err(|source| TriggerError::Template {
                    template: self.name.clone(),
                    source,
                })?;
            self.prepared_name = Some(prepared);
        }
        for member in &mut self.members {
            member.prepare(vars)?;
        }
        Ok(())
    }

    /// Drop directives removing every physical trigger this one created
    ///
    /// A group yields one directive per member, each tagged with the group
    /// name. A drop directive has nothing left to remove.
    pub fn drop_triggers(&self) -> Vec<Trigger> {
        if self.is_drop() {
            return Vec::new();
        }
        if self.is_group() {
            return self
                .members
                .iter()
                .map(|member| {
                    let mut drop = Trigger::drop_of(member.key(), &member.table);
                    drop.options.group = Some(self.key().to_string());
                    drop
                })
                .collect();
        }
        let mut drop = Trigger::drop_of(self.key(), &self.table);
        drop.options.manual = self.is_manual();
        vec![drop]
    }

    /// Marks this trigger as written by the migration generator
    pub fn mark_generated(&mut self) {
        self.options.generated = true;
        self.options.compatibility = Some(COMPATIBILITY_VERSION);
    }

    fn comparison_key(&self) -> ComparisonKey<'_> {
        ComparisonKey {
            key: self.key(),
            table: &self.table,
            timing: self.timing,
            events: &self.events,
            scope: self.scope,
            when_condition: self.when_condition.as_deref(),
            update_columns: &self.update_columns,
            body: &self.body,
            manual_sql: self.manual_sql.as_deref(),
            drop: self.options.drop,
            manual: self.options.manual,
            group: self.options.group.as_deref(),
            extra: &self.options.extra,
            members: self.members.iter().map(Trigger::comparison_key).collect(),
        }
    }
}

impl PartialEq for Trigger {
    fn eq(&self, other: &Self) -> bool {
        self.comparison_key() == other.comparison_key()
    }
}

impl Eq for Trigger {}

impl PartialOrd for Trigger {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Trigger {
    fn cmp(&self, other: &Self) -> Ordering {
        self.comparison_key().cmp(&other.comparison_key())
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_drop() {
            return write!(f, "drop {} on {}", self.key(), self.table);
        }
        if self.is_manual() {
            return write!(f, "{} (manual) on {}", self.key(), self.table);
        }
        write!(
            f,
            "{} {} {} on {} {}",
            self.key(),
            self.timing.as_sql(),
            self.events.iter().map(TriggerEvent::as_sql).join(" OR "),
            self.table,
            self.scope.as_sql()
        )
    }
}

/// Derives `<table>_<timing>_<events>_<scope>`
pub(crate) fn derived_name<'a>(
    table: &str,
    timing: TriggerTiming,
    events: impl IntoIterator<Item = &'a TriggerEvent>,
    scope: TriggerScope,
) -> String {
    let events = events.into_iter().map(TriggerEvent::keyword).join("_");
    sanitize_identifier(&format!(
        "{table}_{}_{events}_{}",
        timing.keyword(),
        scope.keyword()
    ))
}

/// Lower-cases, maps anything outside `[a-z0-9_]` to `_`, collapses runs of
/// `_` and truncates to the identifier limit
pub(crate) fn sanitize_identifier(raw: &str) -> String {
    let mut name: String = raw
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .dedup_by(|a, b| *a == '_' && *b == '_')
        .collect();
    name.truncate(MAX_IDENTIFIER_LEN);
    name
}

/// Canonical form of SQL text kept in a trigger
///
/// Line endings become `\n`, common indentation and trailing whitespace are
/// removed and surrounding blank lines dropped, so the same body written at
/// different indentation levels compares equal.
///
/// ```
/// use tripwire_triggers::normalize_sql;
///
/// assert_eq!(normalize_sql("\n    SELECT 1;\r\n      -- done  \n"), "SELECT 1;\n  -- done");
/// ```
pub fn normalize_sql(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let dedented = unindent::unindent(&format!("\n{text}"));
    let lines: Vec<&str> = dedented.lines().map(str::trim_end).collect();
    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);
    lines[start..end].join("\n")
}
