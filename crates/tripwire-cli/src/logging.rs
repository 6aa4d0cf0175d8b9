//! Logging setup for the `tripwire` binary
//!
//! Logs go to stderr so command output on stdout stays clean. `RUST_LOG`
//! takes precedence over the verbosity flags.

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(test)]
mod tests;

/// Crates whose log level follows `-v`
const TRIPWIRE_TARGETS: [&str; 4] = [
    "tripwire",
    "tripwire_core",
    "tripwire_triggers",
    "tripwire_migrations",
];

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Level for tripwire's own crates
    pub level: &'static str,

    /// Whether to emit JSON lines instead of human readable output
    pub json: bool,

    /// Whether to include file/line information in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::from_verbosity(0)
    }
}

impl LoggingConfig {
    /// Maps the number of `-v` flags to a level
    pub fn from_verbosity(verbose: u8) -> Self {
        let level = match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        Self {
            level,
            json: false,
            include_location: verbose >= 3,
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Filter used when `RUST_LOG` is unset; other crates stay at `warn`
    pub fn default_filter(&self) -> String {
        std::iter::once("warn".to_string())
            .chain(
                TRIPWIRE_TARGETS
                    .iter()
                    .map(|target| format!("{target}={}", self.level)),
            )
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Installs the global subscriber
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_filter()));

    let layer = if config.json {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_filter(env_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.include_location)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .compact()
            .with_filter(env_filter)
            .boxed()
    };

    tracing_subscriber::registry().with(layer).try_init()?;
    tracing::debug!(
        level = config.level,
        json = config.json,
        "Logging initialized"
    );
    Ok(())
}
