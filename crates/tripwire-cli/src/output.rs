//! Terminal tables for triggers, history and diffs

use comfy_table::{Table, presets::UTF8_FULL};
use itertools::Itertools;
use tripwire_migrations::{ReplayedTrigger, SqlMigration, TriggerDiff};
use tripwire_triggers::Trigger;


/// Label for triggers that come from the schema snapshot
const SNAPSHOT: &str = "(schema)";

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header.to_vec());
    table
}

fn kind(trigger: &Trigger) -> &'static str {
    if trigger.is_drop() {
        "drop"
    } else if trigger.is_manual() {
        "manual"
    } else if trigger.is_group() {
        "group"
    } else {
        "create"
    }
}

fn describe(trigger: &Trigger) -> [String; 4] {
    [
        trigger.key().to_string(),
        trigger.table().to_string(),
        format!(
            "{} {}",
            trigger.timing().keyword(),
            trigger.events().map(|event| event.keyword()).join(", ")
        ),
        kind(trigger).to_string(),
    ]
}

pub fn trigger_table(triggers: &[Trigger]) -> Table {
    let mut table = table(&["Trigger", "Table", "Fires", "Kind"]);
    for trigger in triggers {
        table.add_row(describe(trigger));
    }
    table
}

pub fn history_table(replayed: &[ReplayedTrigger]) -> Table {
    let mut table = table(&["Trigger", "Table", "Fires", "Kind", "Migration"]);
    for entry in replayed {
        let [name, on, fires, kind] = describe(&entry.trigger);
        let migration = entry.migration_name.as_deref().unwrap_or(SNAPSHOT);
        table.add_row(vec![name, on, fires, kind, migration.to_string()]);
    }
    table
}

/// One row per step, up steps first
pub fn diff_table(diff: &TriggerDiff) -> Table {
    let mut table = table(&["Direction", "Action", "Trigger", "Table"]);
    let steps = [
        ("up", "drop", &diff.up_drops),
        ("up", "create", &diff.up_creates),
        ("down", "drop", &diff.down_drops),
        ("down", "create", &diff.down_creates),
    ];
    for (direction, action, triggers) in steps {
        for trigger in triggers {
            table.add_row(vec![
                direction.to_string(),
                action.to_string(),
                trigger.key().to_string(),
                trigger.table().to_string(),
            ]);
        }
    }
    table
}

pub fn sql_script(migration: &SqlMigration) -> String {
    format!(
        "-- up\n{}\n\n-- down\n{}",
        migration.up_script(),
        migration.down_script()
    )
}
