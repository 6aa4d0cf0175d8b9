//! Migration names

use std::collections::HashSet;

use convert_case::{Case, Casing};
use itertools::Itertools;

use crate::TriggerDiff;

/// Summarizes a diff as a PascalCase migration name
///
/// Creations win over drops: `CreateTriggerUsersInsertUpdate`,
/// `CreateTriggersUsersInsertAndOrdersDelete`, `DropTriggerUsers`.
pub fn migration_base_name(diff: &TriggerDiff) -> String {
    let summary = if !diff.up_creates.is_empty() {
        format!(
            "create {} {}",
            noun(diff.up_creates.len()),
            diff.up_creates
                .iter()
                .map(|t| format!("{} {}", t.table(), t.events().map(|e| e.keyword()).join(" ")))
                .join(" and ")
        )
    } else {
        format!(
            "drop {} {}",
            noun(diff.up_drops.len()),
            diff.up_drops.iter().map(|t| t.table()).join(" and ")
        )
    };

    let snake: String = summary
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .dedup_by(|a, b| *a == '_' && *b == '_')
        .collect();
    snake.to_case(Case::Pascal)
}

fn noun(count: usize) -> &'static str {
    if count > 1 { "triggers" } else { "trigger" }
}

/// First of `base`, `base1`, `base2`, ... not already taken
pub fn unique_migration_name<'a>(base: &str, taken: impl IntoIterator<Item = &'a str>) -> String {
    let taken: HashSet<&str> = taken.into_iter().collect();
    if !taken.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}{n}"))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}
