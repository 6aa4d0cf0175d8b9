//! SQL form of a trigger migration

use tripwire_triggers::{RenderError, SqlRenderer};

use crate::TriggerDiff;

/// A migration as SQL statements with up and down scripts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlMigration {
    /// SQL statements to apply the migration
    pub up_sql: Vec<String>,
    /// SQL statements to revert the migration
    pub down_sql: Vec<String>,
}

impl SqlMigration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a migration with the given up and down statements
    pub fn with_statements(up_sql: Vec<String>, down_sql: Vec<String>) -> Self {
        Self { up_sql, down_sql }
    }

    /// Renders every step of `diff` with `renderer`
    pub fn from_diff(diff: &TriggerDiff, renderer: &dyn SqlRenderer) -> Result<Self, RenderError> {
        let mut migration = Self::new();
        for trigger in diff.up_steps() {
            migration.up_sql.extend(renderer.render(trigger)?);
        }
        for trigger in diff.down_steps() {
            migration.down_sql.extend(renderer.render(trigger)?);
        }
        Ok(migration)
    }

    /// Returns true if the migration has no statements
    pub fn is_empty(&self) -> bool {
        self.up_sql.is_empty() && self.down_sql.is_empty()
    }

    /// Returns the combined up SQL as a single string
    pub fn up_script(&self) -> String {
        script(&self.up_sql)
    }

    /// Returns the combined down SQL as a single string
    pub fn down_script(&self) -> String {
        script(&self.down_sql)
    }

    pub fn add_up(&mut self, sql: impl Into<String>) {
        self.up_sql.push(sql.into());
    }

    pub fn add_down(&mut self, sql: impl Into<String>) {
        self.down_sql.push(sql.into());
    }
}

fn script(statements: &[String]) -> String {
    if statements.is_empty() {
        return String::new();
    }
    statements.join(";\n\n") + ";"
}
