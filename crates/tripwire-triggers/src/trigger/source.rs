//! Rendering triggers back into declaration source

use itertools::Itertools;

use super::{OptionValue, Trigger, TriggerOptions};

impl Trigger {
    /// Renders a declaration that rebuilds this trigger
    ///
    /// Every line is prefixed with `indent`. Extracting the output again and
    /// building it for the same dialect yields a trigger equal to this one.
    ///
    /// # Examples
    ///
    /// ```
    /// use tripwire_core::Dialect;
    /// use tripwire_triggers::{TriggerBuilder, TriggerSpec};
    ///
    /// let trigger = TriggerBuilder::new(Dialect::Postgres)
    ///     .build(&TriggerSpec::drop_trigger("users_audit").on("users"))
    ///     .unwrap();
    /// assert_eq!(trigger.to_source("  "), "  drop_trigger(\"users_audit\", \"users\")");
    /// ```
    pub fn to_source(&self, indent: &str) -> String {
        let source = if self.is_drop() {
            self.drop_source()
        } else if let Some(sql) = &self.manual_sql {
            format!("execute({})", block_string(sql, ""))
        } else {
            self.create_source()
        };

        source
            .lines()
            .map(|line| {
                if line.is_empty() {
                    String::new()
                } else {
                    format!("{indent}{line}")
                }
            })
            .join("\n")
    }

    fn drop_source(&self) -> String {
        let mut args = vec![quote(self.key())];
        if !self.table.is_empty() {
            args.push(quote(&self.table));
        }
        if self.is_manual() {
            args.push("manual: true".to_string());
        }
        args.extend(option_args(&self.options));
        format!("drop_trigger({})", args.join(", "))
    }

    fn create_source(&self) -> String {
        let mut args = Vec::new();
        if self.explicit_name {
            args.push(quote(&self.name));
        }
        args.extend(option_args(&self.options));

        let mut source = String::from("create_trigger");
        if !args.is_empty() {
            source.push_str(&format!("({})", args.join(", ")));
        }
        source.push_str(&format!(".on({})", quote(&self.table)));
        source.push_str(&format!(
            ".{}({})",
            self.timing.keyword(),
            self.events.iter().map(|e| e.keyword()).join(", ")
        ));
        source.push_str(&format!(".for_each({})", self.scope.keyword()));
        if let Some(condition) = &self.when_condition {
            source.push_str(&format!(".where({})", quote(condition)));
        }
        if !self.update_columns.is_empty() {
            source.push_str(&format!(
                ".of({})",
                self.update_columns.iter().map(|c| quote(c)).join(", ")
            ));
        }

        if self.body.is_empty() {
            return source;
        }
        source.push_str(" {\n");
        if let Some(body) = &self.body.default {
            source.push_str(&format!("  {}\n", block_string(body, "  ")));
        }
        for (dialect, body) in &self.body.overrides {
            source.push_str(&format!("  {dialect}: {}\n", block_string(body, "  ")));
        }
        source.push('}');
        source
    }
}

/// Keyword arguments for options other than `drop` and `manual`
fn option_args(options: &TriggerOptions) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(group) = &options.group {
        args.push(format!("group: {}", quote(group)));
    }
    if options.generated {
        args.push("generated: true".to_string());
    }
    if let Some(compatibility) = options.compatibility {
        args.push(format!("compatibility: {compatibility}"));
    }
    args.extend(
        options
            .extra
            .iter()
            .map(|(key, value)| format!("{key}: {}", render_value(value))),
    );
    args
}

fn render_value(value: &OptionValue) -> String {
    match value {
        OptionValue::Bool(b) => b.to_string(),
        OptionValue::Int(i) => i.to_string(),
        OptionValue::Str(s) => quote(s),
        OptionValue::List(items) => format!("[{}]", items.iter().map(render_value).join(", ")),
    }
}

/// Double-quoted string with `\` escapes
pub(crate) fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Triple-quoted block with its lines indented under `indent`
///
/// Falls back to an escaped string when the text itself contains `"""`.
fn block_string(text: &str, indent: &str) -> String {
    if text.contains("\"\"\"") {
        return quote(text);
    }
    let body = text
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{indent}  {line}")
            }
        })
        .join("\n");
    format!("\"\"\"\n{body}\n{indent}\"\"\"")
}
