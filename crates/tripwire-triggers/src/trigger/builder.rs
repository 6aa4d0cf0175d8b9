//! Building triggers from specifications

use std::collections::{BTreeMap, BTreeSet};

use tripwire_core::Dialect;

use super::{
    ManualStatement, OptionValue, SpecError, SpecKind, Trigger, TriggerBody, TriggerError,
    TriggerEvent, TriggerOptions, TriggerResult, TriggerScope, TriggerSpec, TriggerTiming,
    derived_name, normalize_sql,
};

/// Builds [`Trigger`]s for one dialect
///
/// Validation follows the dialect's capabilities: a spec asking for
/// something the dialect cannot express is rejected, and a multi-event
/// trigger on a dialect without compound events becomes a trigger group
/// with one physical trigger per event.
///
/// # Examples
///
/// ```
/// use tripwire_core::Dialect;
/// use tripwire_triggers::{TriggerBuilder, TriggerSpec};
///
/// let spec = TriggerSpec::create()
///     .on("users")
///     .after(["insert", "update"])
///     .with_body("INSERT INTO audit (tbl) VALUES ('users');");
///
/// let pg = TriggerBuilder::new(Dialect::Postgres).build(&spec).unwrap();
/// assert!(!pg.is_group());
///
/// let mysql = TriggerBuilder::new(Dialect::Mysql).build(&spec).unwrap();
/// assert_eq!(mysql.members().len(), 2);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerBuilder {
    dialect: Dialect,
}

impl TriggerBuilder {
    /// Create a new builder for the specified dialect
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Get the dialect for this builder
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Validates a spec and builds the trigger it describes
    pub fn build(&self, spec: &TriggerSpec) -> TriggerResult<Trigger> {
        let built = match spec.kind {
            SpecKind::Create => self.build_create(spec),
            SpecKind::Drop => self.build_drop(spec),
            SpecKind::Manual => self.build_manual(spec),
        };
        built.map_err(|source| TriggerError::InvalidSpec {
            trigger: spec.label(),
            source,
        })
    }

    fn build_create(&self, spec: &TriggerSpec) -> Result<Trigger, SpecError> {
        let table = required_table(spec)?;

        if spec.events.is_empty() {
            return Err(SpecError::NoEvents);
        }
        let events = spec
            .events
            .iter()
            .map(|word| {
                TriggerEvent::from_keyword(word).ok_or_else(|| SpecError::UnknownEvent(word.clone()))
            })
            .collect::<Result<BTreeSet<_>, _>>()?;

        let timing_word = spec.timing.as_deref().ok_or(SpecError::MissingTiming)?;
        let timing = TriggerTiming::from_keyword(timing_word)
            .ok_or_else(|| SpecError::UnknownTiming(timing_word.to_string()))?;

        let scope = match spec.scope.as_deref() {
            Some(word) => TriggerScope::from_keyword(word)
                .ok_or_else(|| SpecError::UnknownScope(word.to_string()))?,
            None if self.dialect.supports_row_level() => TriggerScope::Row,
            None => TriggerScope::Statement,
        };

        let when_condition = spec
            .when
            .as_deref()
            .map(normalize_sql)
            .filter(|c| !c.is_empty());
        let update_columns: Vec<String> = spec
            .update_columns
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        self.validate(timing, scope, &events, when_condition.is_some(), &update_columns)?;

        let body = self.build_body(spec)?;
        let options = parse_options(&spec.options)?;

        let explicit = spec.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
        let name = match explicit {
            Some(name) => name.to_string(),
            None => derived_name(&table, timing, &events, scope),
        };

        let mut trigger = Trigger {
            name,
            explicit_name: explicit.is_some(),
            table,
            timing,
            events,
            scope,
            when_condition,
            update_columns,
            body,
            manual_sql: None,
            options,
            members: Vec::new(),
            prepared_name: None,
        };

        if trigger.events.len() > 1 && !self.dialect.supports_multiple_events() {
            trigger.members = expand_group(&trigger);
            tracing::trace!(
                trigger = %trigger.name,
                members = trigger.members.len(),
                dialect = %self.dialect,
                "Expanded trigger group"
            );
        }

        Ok(trigger)
    }

    fn validate(
        &self,
        timing: TriggerTiming,
        scope: TriggerScope,
        events: &BTreeSet<TriggerEvent>,
        has_when: bool,
        update_columns: &[String],
    ) -> Result<(), SpecError> {
        let dialect = self.dialect;

        if (timing.is_before() && !dialect.supports_before())
            || (timing.is_instead_of() && !dialect.supports_instead_of())
        {
            return Err(SpecError::TimingNotSupported { timing, dialect });
        }
        let scope_supported = match scope {
            TriggerScope::Row => dialect.supports_row_level(),
            TriggerScope::Statement => dialect.supports_statement_level(),
        };
        if !scope_supported {
            return Err(SpecError::ScopeNotSupported { scope, dialect });
        }
        if timing.is_instead_of()
            && dialect.instead_of_requires_row()
            && scope != TriggerScope::Row
        {
            return Err(SpecError::InsteadOfRequiresRow(dialect));
        }
        if has_when && !dialect.supports_when_condition() {
            return Err(SpecError::WhenConditionNotSupported(dialect));
        }
        if !update_columns.is_empty() {
            if !dialect.supports_update_columns() {
                return Err(SpecError::UpdateColumnsNotSupported(dialect));
            }
            if !events.contains(&TriggerEvent::Update) {
                return Err(SpecError::UpdateColumnsWithoutUpdate);
            }
        }
        Ok(())
    }

    fn build_body(&self, spec: &TriggerSpec) -> Result<TriggerBody, SpecError> {
        let overrides = spec
            .body_overrides
            .iter()
            .map(|(name, body)| {
                Dialect::from_name(name)
                    .map(|dialect| (dialect, normalize_sql(body)))
                    .ok_or_else(|| SpecError::UnknownDialect(name.clone()))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        let body = TriggerBody {
            default: spec.body.as_deref().map(normalize_sql),
            overrides,
        };
        if body.for_dialect(self.dialect).is_none() {
            return Err(SpecError::MissingBody(self.dialect));
        }
        Ok(body)
    }

    fn build_drop(&self, spec: &TriggerSpec) -> Result<Trigger, SpecError> {
        let name = spec
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(SpecError::MissingName)?;
        let table = spec.table.as_deref().map(str::trim).unwrap_or_default();

        let mut trigger = Trigger::drop_of(name, table);
        trigger.prepared_name = None;
        trigger.options = TriggerOptions {
            drop: true,
            ..parse_options(&spec.options)?
        };
        Ok(trigger)
    }

    fn build_manual(&self, spec: &TriggerSpec) -> Result<Trigger, SpecError> {
        let sql = spec.sql.as_deref().map(normalize_sql).unwrap_or_default();
        let mut options = TriggerOptions {
            manual: true,
            ..parse_options(&spec.options)?
        };

        match ManualStatement::parse(&sql).ok_or(SpecError::UnrecognizedSql)? {
            ManualStatement::Create {
                name,
                table,
                timing,
                events,
                scope,
            } => Ok(Trigger {
                name,
                explicit_name: true,
                table,
                timing,
                events,
                scope,
                when_condition: None,
                update_columns: Vec::new(),
                body: TriggerBody::default(),
                manual_sql: Some(sql),
                options,
                members: Vec::new(),
                prepared_name: None,
            }),
            ManualStatement::Drop { name, table } => {
                let mut trigger = Trigger::drop_of(name, table.unwrap_or_default());
                trigger.prepared_name = None;
                options.drop = true;
                trigger.options = options;
                Ok(trigger)
            }
        }
    }
}

/// One physical trigger per event
fn expand_group(group: &Trigger) -> Vec<Trigger> {
    group
        .events
        .iter()
        .map(|&event| {
            let name = if group.explicit_name {
                format!("{}_{}", group.name, event.keyword())
            } else {
                derived_name(&group.table, group.timing, [&event], group.scope)
            };
            let update_columns = if event == TriggerEvent::Update {
                group.update_columns.clone()
            } else {
                Vec::new()
            };
            Trigger {
                name,
                explicit_name: group.explicit_name,
                table: group.table.clone(),
                timing: group.timing,
                events: BTreeSet::from([event]),
                scope: group.scope,
                when_condition: group.when_condition.clone(),
                update_columns,
                body: group.body.clone(),
                manual_sql: None,
                options: TriggerOptions::default(),
                members: Vec::new(),
                prepared_name: None,
            }
        })
        .collect()
}

fn required_table(spec: &TriggerSpec) -> Result<String, SpecError> {
    spec.table
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or(SpecError::MissingTable)
}

/// Splits the options bag into known flags and extras
fn parse_options(raw: &BTreeMap<String, OptionValue>) -> Result<TriggerOptions, SpecError> {
    let invalid = |key: &str, expected: &'static str| SpecError::InvalidOption {
        key: key.to_string(),
        expected,
    };

    let mut options = TriggerOptions::default();
    for (key, value) in raw {
        match key.as_str() {
            "drop" => options.drop = value.as_bool().ok_or_else(|| invalid(key, "a boolean"))?,
            "manual" => {
                options.manual = value.as_bool().ok_or_else(|| invalid(key, "a boolean"))?
            }
            "generated" => {
                options.generated = value.as_bool().ok_or_else(|| invalid(key, "a boolean"))?
            }
            "compatibility" => {
                options.compatibility =
                    Some(value.as_int().ok_or_else(|| invalid(key, "an integer"))?)
            }
            "group" => {
                options.group = Some(
                    value
                        .as_str()
                        .ok_or_else(|| invalid(key, "a string"))?
                        .to_string(),
                )
            }
            _ => {
                options.extra.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(options)
}
