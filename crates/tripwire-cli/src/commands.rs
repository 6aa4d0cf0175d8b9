//! Subcommand implementations

use std::process::ExitCode;

use anyhow::Context;
use tripwire_migrations::{Project, ReplayOptions};

use crate::Command;
use crate::output;

pub fn run(project: &Project, command: &Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Triggers { json } => triggers(project, *json),
        Command::History { schema_dump, json } => history(project, *schema_dump, *json),
        Command::Status => status(project),
        Command::Diff { sql } => diff(project, *sql),
        Command::Generate { silent } => generate(project, *silent),
    }
}

fn triggers(project: &Project, json: bool) -> anyhow::Result<ExitCode> {
    let triggers = project
        .current_triggers()
        .context("failed to load declared triggers")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&triggers)?);
    } else {
        println!("{}", output::trigger_table(&triggers));
    }
    Ok(ExitCode::SUCCESS)
}

fn history(project: &Project, schema_dump: bool, json: bool) -> anyhow::Result<ExitCode> {
    let options = if schema_dump {
        ReplayOptions::for_schema_dump()
    } else {
        ReplayOptions::new()
    };
    let replayed = project
        .current_migrations(&options)
        .context("failed to replay migration history")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&replayed)?);
    } else {
        println!("{}", output::history_table(&replayed));
    }
    Ok(ExitCode::SUCCESS)
}

fn status(project: &Project) -> anyhow::Result<ExitCode> {
    if project
        .migrations_current()
        .context("failed to compare migrations with declared triggers")?
    {
        println!("Trigger migrations are up to date");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Trigger migrations are out of date; run `tripwire generate`");
        Ok(ExitCode::FAILURE)
    }
}

fn diff(project: &Project, sql: bool) -> anyhow::Result<ExitCode> {
    let diff = project
        .pending_diff()
        .context("failed to compare migrations with declared triggers")?;
    if diff.is_empty() {
        println!("No trigger changes");
        return Ok(ExitCode::SUCCESS);
    }

    if sql {
        let migration = project
            .render_sql(&diff)
            .context("failed to render trigger SQL")?;
        println!("{}", output::sql_script(&migration));
    } else {
        println!("{}", output::diff_table(&diff));
    }
    Ok(ExitCode::SUCCESS)
}

fn generate(project: &Project, silent: bool) -> anyhow::Result<ExitCode> {
    match project.generate_migration() {
        Ok(Some(migration)) => {
            if !silent {
                println!("Generated {}", migration.path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Ok(None) => {
            if !silent {
                println!("Nothing to do");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) if err.is_declaration_failure() => {
            eprintln!("Error: {:#}", anyhow::Error::new(err));
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err).context("failed to generate trigger migration"),
    }
}
