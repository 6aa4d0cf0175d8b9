//! Recognition of raw-SQL trigger statements
//!
//! Manual triggers are written as SQL rather than through the builder. Only
//! enough is recovered from the statement to give the trigger an identity:
//! its name, table, timing and events. The SQL itself is kept verbatim.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{TriggerEvent, TriggerScope, TriggerTiming};

static CREATE_TRIGGER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)^\s*CREATE\s+(?:OR\s+REPLACE\s+)?(?:DEFINER\s*=\s*\S+\s+)?(?:TEMP(?:ORARY)?\s+)?(?:CONSTRAINT\s+)?TRIGGER\s+(?:IF\s+NOT\s+EXISTS\s+)?(?P<name>(?:"[^"]+"|`[^`]+`|\[[^\]]+\]|[\w$]+)(?:\.(?:"[^"]+"|`[^`]+`|\[[^\]]+\]|[\w$]+))*)\s+(?P<timing>BEFORE|AFTER|INSTEAD\s+OF)\s+(?P<events>.+?)\s+ON\s+(?P<table>(?:"[^"]+"|`[^`]+`|\[[^\]]+\]|[\w$]+)(?:\.(?:"[^"]+"|`[^`]+`|\[[^\]]+\]|[\w$]+))*)"#,
    )
    .expect("valid regex")
});

static CREATE_TRIGGER_ON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)^\s*CREATE\s+(?:OR\s+ALTER\s+)?TRIGGER\s+(?P<name>(?:"[^"]+"|`[^`]+`|\[[^\]]+\]|[\w$]+)(?:\.(?:"[^"]+"|`[^`]+`|\[[^\]]+\]|[\w$]+))*)\s+ON\s+(?P<table>(?:"[^"]+"|`[^`]+`|\[[^\]]+\]|[\w$]+)(?:\.(?:"[^"]+"|`[^`]+`|\[[^\]]+\]|[\w$]+))*)\s+(?:WITH\s+[\w\s,]+?\s+)?(?P<timing>AFTER|INSTEAD\s+OF|FOR)\s+(?P<events>(?:INSERT|UPDATE|DELETE)(?:\s*,\s*(?:INSERT|UPDATE|DELETE))*)"#,
    )
    .expect("valid regex")
});

static DROP_TRIGGER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)^\s*DROP\s+TRIGGER\s+(?:IF\s+EXISTS\s+)?(?P<name>(?:"[^"]+"|`[^`]+`|\[[^\]]+\]|[\w$]+)(?:\.(?:"[^"]+"|`[^`]+`|\[[^\]]+\]|[\w$]+))*)(?:\s+ON\s+(?P<table>(?:"[^"]+"|`[^`]+`|\[[^\]]+\]|[\w$]+)(?:\.(?:"[^"]+"|`[^`]+`|\[[^\]]+\]|[\w$]+))*))?"#,
    )
    .expect("valid regex")
});

static EVENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(INSERT|UPDATE|DELETE)\b").expect("valid regex"));

static STATEMENT_SCOPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bFOR\s+EACH\s+STATEMENT\b").expect("valid regex"));

/// What a raw SQL trigger statement does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManualStatement {
    /// `CREATE TRIGGER ...`
    Create {
        name: String,
        table: String,
        timing: TriggerTiming,
        events: BTreeSet<TriggerEvent>,
        scope: TriggerScope,
    },
    /// `DROP TRIGGER ...`
    Drop { name: String, table: Option<String> },
}

impl ManualStatement {
    /// Recognizes a CREATE TRIGGER or DROP TRIGGER statement
    ///
    /// Returns `None` for any other SQL.
    ///
    /// # Examples
    ///
    /// ```
    /// use tripwire_triggers::ManualStatement;
    ///
    /// let stmt = ManualStatement::parse(
    ///     "CREATE TRIGGER audit AFTER INSERT OR UPDATE ON users FOR EACH ROW EXECUTE FUNCTION audit()",
    /// )
    /// .unwrap();
    /// assert!(matches!(stmt, ManualStatement::Create { ref name, .. } if name == "audit"));
    /// assert!(ManualStatement::parse("CREATE INDEX idx ON users (email)").is_none());
    /// ```
    pub fn parse(sql: &str) -> Option<Self> {
        if let Some(caps) = CREATE_TRIGGER_RE.captures(sql) {
            let scope = if STATEMENT_SCOPE_RE.is_match(sql) {
                TriggerScope::Statement
            } else {
                TriggerScope::Row
            };
            return Self::create_from(&caps, scope);
        }

        if let Some(caps) = CREATE_TRIGGER_ON_RE.captures(sql) {
            return Self::create_from(&caps, TriggerScope::Statement);
        }

        DROP_TRIGGER_RE.captures(sql).map(|caps| ManualStatement::Drop {
            name: unquote(&caps["name"]),
            table: caps.name("table").map(|m| unquote(m.as_str())),
        })
    }

    /// Name of the trigger the statement creates or drops
    pub fn name(&self) -> &str {
        match self {
            ManualStatement::Create { name, .. } | ManualStatement::Drop { name, .. } => name,
        }
    }

    fn create_from(caps: &Captures<'_>, scope: TriggerScope) -> Option<Self> {
        // SQL Server's FOR is a synonym for AFTER
        let timing = match caps["timing"].to_uppercase().as_str() {
            "FOR" => TriggerTiming::After,
            other => TriggerTiming::from_keyword(other)?,
        };
        let events: BTreeSet<TriggerEvent> = EVENT_RE
            .find_iter(&caps["events"])
            .filter_map(|m| TriggerEvent::from_keyword(m.as_str()))
            .collect();
        if events.is_empty() {
            return None;
        }

        Some(ManualStatement::Create {
            name: unquote(&caps["name"]),
            table: unquote(&caps["table"]),
            timing,
            events,
            scope,
        })
    }
}

/// Strips identifier quoting, keeping schema qualification
fn unquote(ident: &str) -> String {
    ident
        .chars()
        .filter(|c| !matches!(c, '"' | '`' | '[' | ']'))
        .collect()
}
