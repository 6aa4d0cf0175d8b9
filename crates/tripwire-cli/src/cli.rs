//! `tripwire` - keeps trigger migrations in step with declared triggers

mod commands;
mod logging;
mod output;

#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tripwire_core::{Dialect, TripwireConfig};
use tripwire_migrations::Project;

use logging::LoggingConfig;

#[derive(Parser, Debug)]
#[command(name = "tripwire")]
#[command(version)]
#[command(about = "Generate migrations that keep database triggers in step with their declarations")]
pub struct Cli {
    /// Project root; relative config paths are resolved against it
    #[arg(long, global = true, env = "TRIPWIRE_ROOT", default_value = ".")]
    root: PathBuf,

    /// Config file (defaults to tripwire.toml in the project root)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the configured database dialect
    #[arg(long, global = true)]
    dialect: Option<Dialect>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// List the declared triggers
    Triggers {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List the triggers migration history leaves behind
    History {
        /// Replay the way a schema dump sees the database: schema snapshot
        /// first, applied migrations only, raw SQL triggers included
        #[arg(long)]
        schema_dump: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Exit with status 1 if a trigger migration is needed
    Status,
    /// Show the changes the next generated migration would make
    Diff {
        /// Print the SQL for the project's dialect
        #[arg(long)]
        sql: bool,
    },
    /// Write a migration reconciling history with the declared triggers
    Generate {
        /// Print nothing on success
        #[arg(long)]
        silent: bool,
    },
}

impl Cli {
    fn logging(&self) -> LoggingConfig {
        LoggingConfig::from_verbosity(self.verbose).with_json(self.log_json)
    }

    fn load_config(&self) -> anyhow::Result<TripwireConfig> {
        let config = match &self.config {
            Some(path) => TripwireConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => TripwireConfig::discover(&self.root)
                .with_context(|| format!("failed to load config from {}", self.root.display()))?,
        };
        Ok(match self.dialect {
            Some(dialect) => config.with_dialect(dialect),
            None => config,
        })
    }

    fn project(&self) -> anyhow::Result<Project> {
        Ok(Project::open(&self.root, self.load_config()?))
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(&cli.logging())?;

    let project = cli.project()?;
    tracing::debug!(
        root = %project.root().display(),
        dialect = %project.config().dialect,
        "Opened project"
    );

    commands::run(&project, &cli.command)
}
