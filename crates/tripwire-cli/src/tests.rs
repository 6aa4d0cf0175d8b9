//! Argument parsing and command tests

use super::*;
use clap::CommandFactory;
use indoc::indoc;
use tempfile::TempDir;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("tripwire").chain(args.iter().copied())).unwrap()
}

mod parse_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_subcommands() {
        assert_eq!(parse(&["triggers"]).command, Command::Triggers { json: false });
        assert_eq!(
            parse(&["history", "--schema-dump"]).command,
            Command::History {
                schema_dump: true,
                json: false
            }
        );
        assert_eq!(parse(&["status"]).command, Command::Status);
        assert_eq!(parse(&["diff", "--sql"]).command, Command::Diff { sql: true });
        assert_eq!(
            parse(&["generate", "--silent"]).command,
            Command::Generate { silent: true }
        );
    }

    #[test]
    fn test_global_flags() {
        let cli = parse(&["-vv", "status", "--dialect", "mysql", "--log-json"]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.log_json);
        assert_eq!(cli.dialect, Some(Dialect::Mysql));
        assert_eq!(cli.logging().level, "debug");
    }

    #[test]
    fn test_unknown_dialect_is_rejected() {
        let result = Cli::try_parse_from(["tripwire", "--dialect", "oracle", "status"]);
        assert!(result.is_err());
    }
}

mod command_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cli_for(dir: &TempDir, args: &[&str]) -> Cli {
        let root = dir.path().to_str().unwrap();
        let mut all = vec!["--root", root];
        all.extend_from_slice(args);
        parse(&all)
    }

    fn write_model(dir: &TempDir) {
        let models = dir.path().join("app/triggers");
        std::fs::create_dir_all(&models).unwrap();
        std::fs::write(
            models.join("users.tw"),
            indoc! {r#"
                trigger.after(insert) { "UPDATE stats SET users = users + 1;" }
            "#},
        )
        .unwrap();
    }

    fn run(cli: &Cli) -> ExitCode {
        commands::run(&cli.project().unwrap(), &cli.command).unwrap()
    }

    #[test]
    fn test_dialect_flag_overrides_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("tripwire.toml"), "dialect = \"sqlite\"\n").unwrap();

        let config = cli_for(&dir, &["--dialect", "mssql", "status"]).load_config().unwrap();
        assert_eq!(config.dialect, Dialect::MsSql);
        let config = cli_for(&dir, &["status"]).load_config().unwrap();
        assert_eq!(config.dialect, Dialect::Sqlite);
    }

    #[test]
    fn test_explicit_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "extension = \"trg\"\n").unwrap();

        let cli = cli_for(&dir, &["--config", path.to_str().unwrap(), "status"]);
        assert_eq!(cli.load_config().unwrap().extension, "trg");
    }

    #[test]
    fn test_status_then_generate() {
        let dir = TempDir::new().unwrap();
        write_model(&dir);

        assert_eq!(run(&cli_for(&dir, &["status"])), ExitCode::FAILURE);
        assert_eq!(run(&cli_for(&dir, &["generate", "--silent"])), ExitCode::SUCCESS);
        assert_eq!(run(&cli_for(&dir, &["status"])), ExitCode::SUCCESS);
        assert_eq!(std::fs::read_dir(dir.path().join("db/migrate")).unwrap().count(), 1);
    }

    #[test]
    fn test_generate_reports_unloadable_declarations() {
        let dir = TempDir::new().unwrap();
        let models = dir.path().join("app/triggers");
        std::fs::create_dir_all(&models).unwrap();
        std::fs::write(models.join("users.tw"), "trigger.after(insert).nope()\n").unwrap();

        assert_eq!(run(&cli_for(&dir, &["generate"])), ExitCode::FAILURE);
    }
}
