//! CREATE and DROP statements per dialect

use itertools::Itertools;
use thiserror::Error;
use tripwire_core::Dialect;

use crate::trigger::{Trigger, TriggerEvent, TriggerScope};

/// Errors raised while rendering a trigger as SQL
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("trigger '{0}' must be prepared before it can be rendered")]
    NotPrepared(String),

    #[error("trigger '{trigger}' has no body for {dialect}")]
    MissingBody { trigger: String, dialect: Dialect },

    #[error("trigger '{trigger}' fires on several events, which {dialect} cannot express in one trigger")]
    UnsupportedEvents { trigger: String, dialect: Dialect },
}

/// Renders triggers as SQL for one database engine
pub trait SqlRenderer {
    /// Dialect the statements are written in
    fn dialect(&self) -> Dialect;

    /// Statements creating the trigger (every member, for a group)
    fn render_create(&self, trigger: &Trigger) -> Result<Vec<String>, RenderError>;

    /// Statements removing the trigger, or what a drop directive names
    fn render_drop(&self, trigger: &Trigger) -> Vec<String>;

    /// Renders a drop directive as drops and anything else as creates
    fn render(&self, trigger: &Trigger) -> Result<Vec<String>, RenderError> {
        if trigger.is_drop() {
            Ok(self.render_drop(trigger))
        } else {
            self.render_create(trigger)
        }
    }
}

/// [`SqlRenderer`] for the built-in dialects
///
/// # Examples
///
/// ```
/// use tripwire_core::Dialect;
/// use tripwire_triggers::{DialectRenderer, SqlRenderer, TemplateVars, TriggerBuilder, TriggerSpec};
///
/// let spec = TriggerSpec::create()
///     .on("users")
///     .after(["update"])
///     .with_body("UPDATE stats SET user_updates = user_updates + 1;");
/// let mut trigger = TriggerBuilder::new(Dialect::Sqlite).build(&spec).unwrap();
/// trigger.prepare(&TemplateVars::empty()).unwrap();
///
/// let sql = DialectRenderer::new(Dialect::Sqlite).render_create(&trigger).unwrap();
/// assert!(sql[0].starts_with("CREATE TRIGGER users_after_update_row"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DialectRenderer {
    dialect: Dialect,
}

impl DialectRenderer {
    /// Create a new renderer for the specified dialect
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    fn render_postgres(&self, trigger: &Trigger, name: &str, body: &str) -> Vec<String> {
        let function = format!("{}()", self.quote_identifier(name));
        let returned = match (trigger.timing.is_after(), trigger.scope) {
            (false, TriggerScope::Row) if trigger.events.iter().eq([&TriggerEvent::Delete]) => {
                "OLD"
            }
            (false, TriggerScope::Row) => "NEW",
            _ => "NULL",
        };
        let when_clause = trigger
            .when_condition
            .as_ref()
            .map(|c| format!("\n    WHEN ({})", c))
            .unwrap_or_default();

        vec![
            format!(
                "CREATE OR REPLACE FUNCTION {}\nRETURNS TRIGGER\nLANGUAGE plpgsql\nAS $$\nBEGIN\n{}\n    RETURN {};\nEND;\n$$",
                function,
                indent_body(body),
                returned
            ),
            format!(
                "CREATE TRIGGER {}\n    {} {}\n    ON {}\n    {}{}\n    EXECUTE FUNCTION {}",
                self.quote_identifier(name),
                trigger.timing.as_sql(),
                self.events_clause(trigger),
                self.quote_identifier(&trigger.table),
                trigger.scope.as_sql(),
                when_clause,
                function
            ),
        ]
    }

    fn render_mysql(&self, trigger: &Trigger, name: &str, body: &str) -> String {
        format!(
            "CREATE TRIGGER {}\n{} {} ON {}\nFOR EACH ROW\nBEGIN\n{}\nEND",
            self.quote_identifier(name),
            trigger.timing.as_sql(),
            self.events_clause(trigger),
            self.quote_identifier(&trigger.table),
            indent_body(body)
        )
    }

    fn render_sqlite(&self, trigger: &Trigger, name: &str, body: &str) -> String {
        let when_clause = trigger
            .when_condition
            .as_ref()
            .map(|c| format!("\n    WHEN {}", c))
            .unwrap_or_default();

        format!(
            "CREATE TRIGGER {}\n    {} {}\n    ON {}\n    FOR EACH ROW{}\nBEGIN\n{}\nEND",
            self.quote_identifier(name),
            trigger.timing.as_sql(),
            self.events_clause(trigger),
            self.quote_identifier(&trigger.table),
            when_clause,
            indent_body(body)
        )
    }

    fn render_mssql(&self, trigger: &Trigger, name: &str, body: &str) -> String {
        let events = trigger.events.iter().map(TriggerEvent::as_sql).join(", ");
        let timing_clause = if trigger.timing.is_instead_of() {
            "INSTEAD OF"
        } else {
            "AFTER"
        };

        format!(
            "CREATE TRIGGER {}\n    ON {}\n    {} {}\nAS\nBEGIN\n{}\nEND",
            self.quote_identifier(name),
            self.quote_identifier(&trigger.table),
            timing_clause,
            events,
            indent_body(body)
        )
    }

    fn events_clause(&self, trigger: &Trigger) -> String {
        trigger
            .events
            .iter()
            .map(|event| {
                if *event == TriggerEvent::Update && !trigger.update_columns.is_empty() {
                    format!("UPDATE OF {}", trigger.update_columns.join(", "))
                } else {
                    event.as_sql().to_string()
                }
            })
            .join(" OR ")
    }

    fn drop_statements(&self, name: &str, table: &str, with_function: bool) -> Vec<String> {
        let quoted = self.quote_identifier(name);
        match self.dialect {
            Dialect::Postgres => {
                let mut statements = vec![if table.is_empty() {
                    format!("DROP TRIGGER IF EXISTS {}", quoted)
                } else {
                    format!(
                        "DROP TRIGGER IF EXISTS {} ON {}",
                        quoted,
                        self.quote_identifier(table)
                    )
                }];
                if with_function {
                    statements.push(format!("DROP FUNCTION IF EXISTS {}()", quoted));
                }
                statements
            }
            Dialect::Mysql | Dialect::Sqlite => {
                vec![format!("DROP TRIGGER IF EXISTS {}", quoted)]
            }
            Dialect::MsSql => vec![format!(
                "IF OBJECT_ID('{}', 'TR') IS NOT NULL DROP TRIGGER {}",
                name.replace('\'', "''"),
                quoted
            )],
        }
    }

    /// Quote an identifier based on the dialect
    fn quote_identifier(&self, name: &str) -> String {
        if name.contains('.') {
            name.split('.')
                .map(|part| self.quote_single_identifier(part))
                .join(".")
        } else {
            self.quote_single_identifier(name)
        }
    }

    fn quote_single_identifier(&self, name: &str) -> String {
        if !needs_quoting(name) {
            return name.to_string();
        }
        match self.dialect {
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
            Dialect::Mysql => format!("`{}`", name.replace('`', "``")),
            Dialect::MsSql => format!("[{}]", name.replace(']', "]]")),
        }
    }
}

impl SqlRenderer for DialectRenderer {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn render_create(&self, trigger: &Trigger) -> Result<Vec<String>, RenderError> {
        let name = trigger
            .prepared_name()
            .ok_or_else(|| RenderError::NotPrepared(trigger.name().to_string()))?;

        if let Some(sql) = trigger.manual_sql() {
            return Ok(vec![sql.to_string()]);
        }
        if trigger.is_group() {
            return trigger
                .members()
                .iter()
                .map(|member| self.render_create(member))
                .flatten_ok()
                .collect();
        }
        if trigger.events.len() > 1 && !self.dialect.supports_multiple_events() {
            return Err(RenderError::UnsupportedEvents {
                trigger: name.to_string(),
                dialect: self.dialect,
            });
        }
        let body = trigger
            .body()
            .for_dialect(self.dialect)
            .ok_or_else(|| RenderError::MissingBody {
                trigger: name.to_string(),
                dialect: self.dialect,
            })?;

        Ok(match self.dialect {
            Dialect::Postgres => self.render_postgres(trigger, name, body),
            Dialect::Mysql => vec![self.render_mysql(trigger, name, body)],
            Dialect::Sqlite => vec![self.render_sqlite(trigger, name, body)],
            Dialect::MsSql => vec![self.render_mssql(trigger, name, body)],
        })
    }

    fn render_drop(&self, trigger: &Trigger) -> Vec<String> {
        if trigger.is_group() {
            return trigger
                .members()
                .iter()
                .flat_map(|member| self.render_drop(member))
                .collect();
        }
        // Manual triggers manage their own functions
        let with_function = self.dialect.uses_trigger_function() && !trigger.is_manual();
        self.drop_statements(trigger.key(), trigger.table(), with_function)
    }
}

fn indent_body(body: &str) -> String {
    body.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("    {line}")
            }
        })
        .join("\n")
}

fn needs_quoting(name: &str) -> bool {
    let Some(first) = name.chars().next() else {
        return true;
    };
    if !first.is_ascii_alphabetic() && first != '_' {
        return true;
    }
    name.chars().any(|c| !c.is_ascii_alphanumeric() && c != '_')
        || RESERVED_KEYWORDS.contains(&name.to_uppercase().as_str())
}

static RESERVED_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "INSERT", "UPDATE", "DELETE", "CREATE", "DROP", "ALTER", "TABLE",
    "VIEW", "INDEX", "TRIGGER", "AND", "OR", "NOT", "NULL", "TRUE", "FALSE", "AS", "ON", "JOIN",
    "ORDER", "BY", "GROUP", "HAVING", "LIMIT", "UNION", "ALL", "DISTINCT", "INTO", "VALUES",
    "SET", "DEFAULT", "PRIMARY", "KEY", "FOREIGN", "REFERENCES", "CONSTRAINT", "UNIQUE", "CHECK",
    "CASE", "WHEN", "THEN", "ELSE", "END", "IF", "EXISTS", "IN", "IS", "BEGIN", "AFTER", "BEFORE",
    "FOR", "EACH", "ROW", "STATEMENT", "USER",
];
