//! End-to-end tests over a project directory

use super::*;
use crate::ReplayOptions;
use indoc::indoc;
use tempfile::TempDir;
use tripwire_core::{CONFIG_FILE_NAME, Dialect, TripwireConfig};

const USERS_MODEL: &str = indoc! {r#"
    trigger.after(insert) {
      "UPDATE stats SET users = users + 1;"
    }
"#};

fn project(dir: &TempDir) -> Project {
    let config = TripwireConfig::new()
        .with_dialect(Dialect::Postgres)
        .with_timestamped_migrations(false);
    Project::open(dir.path(), config)
}

fn write_model(dir: &TempDir, file: &str, text: &str) {
    let models = dir.path().join("app/triggers");
    std::fs::create_dir_all(&models).unwrap();
    std::fs::write(models.join(file), text).unwrap();
}

mod generate_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_project_is_current() {
        let dir = TempDir::new().unwrap();
        let project = project(&dir);

        assert!(project.migrations_current().unwrap());
        assert_eq!(project.generate_migration().unwrap(), None);
    }

    #[test]
    fn test_generate_then_current() {
        let dir = TempDir::new().unwrap();
        write_model(&dir, "users.tw", USERS_MODEL);
        let project = project(&dir);

        assert!(!project.migrations_current().unwrap());
        let generated = project.generate_migration().unwrap().unwrap();
        assert_eq!(generated.version, 1);
        assert_eq!(generated.name, "CreateTriggerUsersInsert");
        assert!(generated.path.starts_with(dir.path().join("db/migrate")));

        assert!(project.migrations_current().unwrap());
        assert!(project.pending_diff().unwrap().is_empty());
        assert_eq!(project.generate_migration().unwrap(), None);
    }

    #[test]
    fn test_replayed_triggers_name_their_migration() {
        let dir = TempDir::new().unwrap();
        write_model(&dir, "users.tw", USERS_MODEL);
        let project = project(&dir);
        project.generate_migration().unwrap();

        let replayed = project.current_migrations(&ReplayOptions::new()).unwrap();
        assert_eq!(replayed.len(), 1);
        assert_eq!(
            replayed[0].migration_name.as_deref(),
            Some("CreateTriggerUsersInsert")
        );
        assert_eq!(replayed[0].trigger.key(), "users_after_insert_row");
    }

    #[test]
    fn test_changed_body_generates_replacement() {
        let dir = TempDir::new().unwrap();
        write_model(&dir, "users.tw", USERS_MODEL);
        let project = project(&dir);
        project.generate_migration().unwrap();

        write_model(
            &dir,
            "users.tw",
            "trigger.after(insert) { \"UPDATE stats SET users = users + 2;\" }\n",
        );
        let diff = project.pending_diff().unwrap();
        assert_eq!(diff.up_drops.len(), 1);
        assert_eq!(diff.up_creates.len(), 1);

        let generated = project.generate_migration().unwrap().unwrap();
        assert_eq!(generated.version, 2);
        assert_eq!(generated.name, "CreateTriggerUsersInsert1");
        assert!(project.migrations_current().unwrap());
    }

    #[test]
    fn test_removed_model_generates_drop() {
        let dir = TempDir::new().unwrap();
        write_model(&dir, "users.tw", USERS_MODEL);
        let project = project(&dir);
        project.generate_migration().unwrap();

        std::fs::remove_file(dir.path().join("app/triggers/users.tw")).unwrap();
        let generated = project.generate_migration().unwrap().unwrap();
        assert_eq!(generated.name, "DropTriggerUsers");

        let text = std::fs::read_to_string(&generated.path).unwrap();
        assert!(text.contains("drop_trigger(\"users_after_insert_row\", \"users\""));
        assert!(project.migrations_current().unwrap());
        assert!(project.current_migrations(&ReplayOptions::new()).unwrap().is_empty());
    }

    #[test]
    fn test_unloadable_model_is_a_declaration_failure() {
        let dir = TempDir::new().unwrap();
        write_model(&dir, "users.tw", "trigger.after(insert).explode() { \"SELECT 1;\" }\n");

        let err = project(&dir).generate_migration().unwrap_err();
        assert!(err.is_declaration_failure());
        assert!(err.to_string().contains("unable to load Users"));
        assert!(!dir.path().join("db/migrate").exists());
    }
}

mod config_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_discover_reads_config_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            indoc! {r#"
                dialect = "sqlite"
                migration_path = "migrations"
            "#},
        )
        .unwrap();

        let project = Project::discover(dir.path()).unwrap();
        assert_eq!(project.config().dialect, Dialect::Sqlite);
        assert_eq!(
            project.config().migration_path,
            dir.path().join("migrations")
        );
        assert_eq!(project.root(), dir.path());
    }

    #[test]
    fn test_discover_without_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let project = Project::discover(dir.path()).unwrap();
        assert_eq!(project.config().model_path, dir.path().join("app/triggers"));
    }

    #[test]
    fn test_render_sql_uses_project_dialect() {
        let dir = TempDir::new().unwrap();
        write_model(&dir, "users.tw", USERS_MODEL);
        let project = Project::open(
            dir.path(),
            TripwireConfig::new().with_dialect(Dialect::Sqlite),
        );

        let sql = project.render_sql(&project.pending_diff().unwrap()).unwrap();
        assert_eq!(sql.up_sql.len(), 1);
        assert!(sql.up_sql[0].starts_with("CREATE TRIGGER users_after_insert_row"));
        assert_eq!(sql.down_script(), "DROP TRIGGER IF EXISTS users_after_insert_row;");
    }
}
