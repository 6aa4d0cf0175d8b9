//! Locating and building trigger declarations in free-form text

use std::sync::LazyLock;

use regex::Regex;
use tripwire_core::Dialect;
use tripwire_triggers::{ManualStatement, SpecKind, Trigger, TriggerBuilder};

use super::parser::{Declaration, Parser};
use super::{ExtractError, ExtractResult};

static DECLARATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(create_trigger|drop_trigger|trigger|execute)[.(]")
        .expect("valid regex")
});

/// Returns true if `text` has at least one line starting a declaration
pub fn contains_declarations(text: &str) -> bool {
    DECLARATION_RE.is_match(text)
}

/// Extraction settings
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Also pick up `execute` statements that create or drop triggers
    pub include_manual_triggers: bool,
    /// Table for declarations that do not call `.on(...)`
    pub default_table: Option<String>,
    /// Reject drop directives and raw SQL; declaration sources only create
    pub creates_only: bool,
}

/// Finds trigger declarations in text and builds them for one dialect
///
/// Declarations must start a line. Text between declarations is skipped, so
/// migrations may freely mix declarations with other SQL and comments.
#[derive(Debug, Clone)]
pub struct DeclarationExtractor {
    builder: TriggerBuilder,
    options: ExtractOptions,
}

impl DeclarationExtractor {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            builder: TriggerBuilder::new(dialect),
            options: ExtractOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_manual_triggers(mut self, include: bool) -> Self {
        self.options.include_manual_triggers = include;
        self
    }

    pub fn with_default_table(mut self, table: impl Into<String>) -> Self {
        self.options.default_table = Some(table.into());
        self
    }

    pub fn with_creates_only(mut self, creates_only: bool) -> Self {
        self.options.creates_only = creates_only;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.builder.dialect()
    }

    /// Extracts every declaration in `text`, in order of appearance
    ///
    /// Triggers are built but not prepared.
    pub fn extract(&self, text: &str) -> ExtractResult<Vec<Trigger>> {
        let mut triggers = Vec::new();
        let mut offset = 0;

        while let Some(caps) = DECLARATION_RE.captures_at(text, offset) {
            let (Some(whole), Some(keyword)) = (caps.get(0), caps.get(1)) else {
                break;
            };
            offset = whole.end();

            let manual = keyword.as_str() == "execute";
            if manual && !self.options.include_manual_triggers {
                continue;
            }

            let declaration = match Parser::new(text, keyword.start()).parse_declaration() {
                Ok(declaration) => declaration,
                // execute is also used for SQL that has nothing to do with triggers
                Err(err) if manual => {
                    tracing::trace!(error = %err, "Skipping unparsable execute statement");
                    continue;
                }
                Err(err) => return Err(err),
            };
            offset = offset.max(declaration.end);

            if let Some(trigger) = self.build(declaration)? {
                triggers.push(trigger);
            }
        }

        tracing::trace!(count = triggers.len(), "Extracted trigger declarations");
        Ok(triggers)
    }

    fn build(&self, declaration: Declaration) -> ExtractResult<Option<Trigger>> {
        let Declaration { mut spec, line, .. } = declaration;

        if self.options.creates_only && spec.kind != SpecKind::Create {
            return Err(ExtractError::syntax(
                line,
                "only trigger creations may be declared here",
            ));
        }

        match spec.kind {
            SpecKind::Manual => {
                let recognized = spec.sql.as_deref().and_then(ManualStatement::parse);
                if recognized.is_none() {
                    return Ok(None);
                }
            }
            SpecKind::Create if spec.table.is_none() => {
                spec.table = self.options.default_table.clone();
            }
            _ => {}
        }

        self.builder
            .build(&spec)
            .map(Some)
            .map_err(|source| ExtractError::Trigger { line, source })
    }
}
