//! Tests for the trigger model and builder

use super::*;
use indoc::indoc;
use std::collections::BTreeMap;
use tripwire_core::Dialect;

fn audit_spec() -> TriggerSpec {
    TriggerSpec::create()
        .on("users")
        .after(["update"])
        .with_body("UPDATE stats SET n = n + 1;")
}

fn build(dialect: Dialect, spec: &TriggerSpec) -> Trigger {
    let mut trigger = TriggerBuilder::new(dialect).build(spec).unwrap();
    trigger.prepare(&TemplateVars::empty()).unwrap();
    trigger
}

fn spec_error(dialect: Dialect, spec: &TriggerSpec) -> SpecError {
    match TriggerBuilder::new(dialect).build(spec) {
        Err(TriggerError::InvalidSpec { source, .. }) => source,
        other => panic!("expected an invalid spec, got {other:?}"),
    }
}

mod keyword_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_timing_keywords() {
        assert_eq!(TriggerTiming::from_keyword("BEFORE"), Some(TriggerTiming::Before));
        assert_eq!(TriggerTiming::from_keyword("instead of"), Some(TriggerTiming::InsteadOf));
        assert_eq!(TriggerTiming::from_keyword("INSTEAD   OF"), Some(TriggerTiming::InsteadOf));
        assert_eq!(TriggerTiming::from_keyword("during"), None);
        assert_eq!(TriggerTiming::InsteadOf.keyword(), "instead_of");
    }

    #[test]
    fn test_default_timing_is_after() {
        assert!(TriggerTiming::default().is_after());
    }

    #[test]
    fn test_event_order_is_canonical() {
        let mut events = vec![TriggerEvent::Delete, TriggerEvent::Insert, TriggerEvent::Update];
        events.sort();
        assert_eq!(
            events,
            vec![TriggerEvent::Insert, TriggerEvent::Update, TriggerEvent::Delete]
        );
    }

    #[test]
    fn test_scope_keywords() {
        assert_eq!(TriggerScope::from_keyword("Row"), Some(TriggerScope::Row));
        assert_eq!(TriggerScope::from_keyword("statement"), Some(TriggerScope::Statement));
        assert_eq!(TriggerScope::Statement.as_sql(), "FOR EACH STATEMENT");
    }

    #[test]
    fn test_timing_serialization() {
        let json = serde_json::to_string(&TriggerTiming::InsteadOf).unwrap();
        assert_eq!(json, "\"instead_of\"");

        let deserialized: TriggerTiming = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, TriggerTiming::InsteadOf);
    }

    #[test]
    fn test_option_value_is_untagged() {
        let value: OptionValue = serde_json::from_str(r#"[1, "a", true]"#).unwrap();
        assert_eq!(
            value,
            OptionValue::List(vec![
                OptionValue::Int(1),
                OptionValue::Str("a".to_string()),
                OptionValue::Bool(true),
            ])
        );
    }
}

mod builder_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_derived_name() {
        let trigger = build(Dialect::Postgres, &audit_spec());
        assert_eq!(trigger.name(), "users_after_update_row");
        assert!(!trigger.has_explicit_name());
        assert_eq!(trigger.prepared_name(), Some("users_after_update_row"));
    }

    #[test]
    fn test_derived_name_is_sanitized_and_truncated() {
        let spec = audit_spec().on("Public.User-Log");
        assert_eq!(
            build(Dialect::Postgres, &spec).name(),
            "public_user_log_after_update_row"
        );

        let long = audit_spec().on("a".repeat(80));
        assert_eq!(build(Dialect::Postgres, &long).name().len(), 63);
    }

    #[test]
    fn test_multi_event_name_lists_events_in_canonical_order() {
        let spec = audit_spec().after(["delete", "insert"]);
        assert_eq!(
            build(Dialect::Postgres, &spec).name(),
            "users_after_insert_delete_row"
        );
    }

    #[test]
    fn test_default_scope_follows_dialect() {
        assert_eq!(build(Dialect::Postgres, &audit_spec()).scope(), TriggerScope::Row);
        assert_eq!(build(Dialect::MsSql, &audit_spec()).scope(), TriggerScope::Statement);
    }

    #[test]
    fn test_multi_event_on_postgres_is_single_trigger() {
        let spec = audit_spec().after(["insert", "update"]);
        let trigger = build(Dialect::Postgres, &spec);
        assert!(!trigger.is_group());
        assert_eq!(
            trigger.events().collect::<Vec<_>>(),
            vec![TriggerEvent::Insert, TriggerEvent::Update]
        );
    }

    #[test]
    fn test_multi_event_on_mysql_expands_group() {
        let spec = audit_spec().after(["update", "insert"]);
        let trigger = build(Dialect::Mysql, &spec);

        assert!(trigger.is_group());
        let names: Vec<_> = trigger.members().iter().map(Trigger::key).collect();
        assert_eq!(names, vec!["users_after_insert_row", "users_after_update_row"]);
        assert_eq!(trigger.key(), "users_after_insert_update_row");
    }

    #[test]
    fn test_explicit_group_member_names() {
        let spec = audit_spec().with_name("audit").after(["insert", "delete"]);
        let trigger = build(Dialect::Sqlite, &spec);

        let names: Vec<_> = trigger.members().iter().map(Trigger::key).collect();
        assert_eq!(names, vec!["audit_insert", "audit_delete"]);
    }

    #[test]
    fn test_update_columns_only_on_update_member() {
        let spec = audit_spec()
            .after(["insert", "update"])
            .with_update_columns(["email"]);
        let trigger = build(Dialect::Sqlite, &spec);

        assert!(trigger.members()[0].update_columns().is_empty());
        assert_eq!(trigger.members()[1].update_columns(), ["email".to_string()]);
    }

    #[test]
    fn test_body_is_normalized() {
        let indented = audit_spec().with_body("\n      UPDATE stats\n        SET n = n + 1;   \n    ");
        let flat = audit_spec().with_body("UPDATE stats\n  SET n = n + 1;");

        let a = build(Dialect::Postgres, &indented);
        let b = build(Dialect::Postgres, &flat);
        assert_eq!(a.body().default.as_deref(), Some("UPDATE stats\n  SET n = n + 1;"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_body_override_selected_for_dialect() {
        let spec = audit_spec().with_body_override("mysql", "SET @n = 1;");
        let trigger = build(Dialect::Mysql, &spec);
        assert_eq!(trigger.body().for_dialect(Dialect::Mysql), Some("SET @n = 1;"));
        assert_eq!(
            trigger.body().for_dialect(Dialect::Sqlite),
            Some("UPDATE stats SET n = n + 1;")
        );
    }

    #[test]
    fn test_options_split_into_flags_and_extras() {
        let spec = audit_spec()
            .with_option("generated", OptionValue::Bool(true))
            .with_option("compatibility", OptionValue::Int(1))
            .with_option("security", OptionValue::Str("definer".to_string()));
        let trigger = build(Dialect::Postgres, &spec);

        assert!(trigger.options().generated);
        assert_eq!(trigger.options().compatibility, Some(1));
        assert_eq!(
            trigger.options().extra,
            BTreeMap::from([(
                "security".to_string(),
                OptionValue::Str("definer".to_string())
            )])
        );
    }

    #[test]
    fn test_drop_directive() {
        let spec = TriggerSpec::drop_trigger("users_audit").on("users");
        let trigger = build(Dialect::Postgres, &spec);
        assert!(trigger.is_drop());
        assert_eq!(trigger.key(), "users_audit");
        assert_eq!(trigger.table(), "users");
        assert!(trigger.drop_triggers().is_empty());
    }
}

mod validation_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_table() {
        let spec = TriggerSpec::create().after(["insert"]).with_body("SELECT 1;");
        assert_eq!(spec_error(Dialect::Postgres, &spec), SpecError::MissingTable);
    }

    #[test]
    fn test_no_events() {
        let spec = audit_spec().after(Vec::<String>::new());
        assert_eq!(spec_error(Dialect::Postgres, &spec), SpecError::NoEvents);
    }

    #[test]
    fn test_unknown_event() {
        let spec = audit_spec().after(["insert", "truncate"]);
        assert_eq!(
            spec_error(Dialect::Postgres, &spec),
            SpecError::UnknownEvent("truncate".to_string())
        );
    }

    #[test]
    fn test_missing_and_unknown_timing() {
        let mut spec = audit_spec();
        spec.timing = None;
        assert_eq!(spec_error(Dialect::Postgres, &spec), SpecError::MissingTiming);

        let spec = audit_spec().with_timing("around", ["insert"]);
        assert_eq!(
            spec_error(Dialect::Postgres, &spec),
            SpecError::UnknownTiming("around".to_string())
        );
    }

    #[test]
    fn test_unknown_scope() {
        let spec = audit_spec().for_each("table");
        assert_eq!(
            spec_error(Dialect::Postgres, &spec),
            SpecError::UnknownScope("table".to_string())
        );
    }

    #[test]
    fn test_unsupported_timing() {
        let before = audit_spec().before(["insert"]);
        assert_eq!(
            spec_error(Dialect::MsSql, &before),
            SpecError::TimingNotSupported {
                timing: TriggerTiming::Before,
                dialect: Dialect::MsSql
            }
        );

        let instead = audit_spec().instead_of(["insert"]);
        assert!(matches!(
            spec_error(Dialect::Mysql, &instead),
            SpecError::TimingNotSupported { .. }
        ));
    }

    #[test]
    fn test_unsupported_scope() {
        let spec = audit_spec().for_each("statement");
        assert_eq!(
            spec_error(Dialect::Sqlite, &spec),
            SpecError::ScopeNotSupported {
                scope: TriggerScope::Statement,
                dialect: Dialect::Sqlite
            }
        );
    }

    #[test]
    fn test_instead_of_requires_row() {
        let spec = audit_spec().instead_of(["insert"]).for_each("statement");
        assert_eq!(
            spec_error(Dialect::Postgres, &spec),
            SpecError::InsteadOfRequiresRow(Dialect::Postgres)
        );
    }

    #[test]
    fn test_when_not_supported() {
        let spec = audit_spec().with_when("NEW.active");
        assert_eq!(
            spec_error(Dialect::Mysql, &spec),
            SpecError::WhenConditionNotSupported(Dialect::Mysql)
        );
    }

    #[test]
    fn test_update_columns_rules() {
        let spec = audit_spec().with_update_columns(["email"]);
        assert_eq!(
            spec_error(Dialect::MsSql, &spec),
            SpecError::UpdateColumnsNotSupported(Dialect::MsSql)
        );

        let spec = audit_spec().after(["insert"]).with_update_columns(["email"]);
        assert_eq!(
            spec_error(Dialect::Sqlite, &spec),
            SpecError::UpdateColumnsWithoutUpdate
        );
    }

    #[test]
    fn test_body_rules() {
        let mut spec = audit_spec().with_body_override("mysql", "SET @n = 1;");
        spec.body = None;
        assert_eq!(
            spec_error(Dialect::Postgres, &spec),
            SpecError::MissingBody(Dialect::Postgres)
        );

        let spec = audit_spec().with_body_override("oracle", "NULL;");
        assert_eq!(
            spec_error(Dialect::Postgres, &spec),
            SpecError::UnknownDialect("oracle".to_string())
        );
    }

    #[test]
    fn test_option_types_are_checked() {
        let spec = audit_spec().with_option("generated", OptionValue::Str("yes".to_string()));
        assert_eq!(
            spec_error(Dialect::Postgres, &spec),
            SpecError::InvalidOption {
                key: "generated".to_string(),
                expected: "a boolean"
            }
        );
    }

    #[test]
    fn test_drop_requires_name() {
        let spec = TriggerSpec::drop_trigger("  ");
        assert_eq!(spec_error(Dialect::Postgres, &spec), SpecError::MissingName);
    }

    #[test]
    fn test_error_names_the_trigger() {
        let spec = audit_spec().with_name("audit").after(Vec::<String>::new());
        let err = TriggerBuilder::new(Dialect::Postgres).build(&spec).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid trigger spec for audit: at least one event (insert/update/delete) must be specified"
        );
    }
}

mod identity_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identity_is_stable_across_builds() {
        let spec = audit_spec().after(["insert", "update"]);
        let a = build(Dialect::Postgres, &spec);
        let b = build(Dialect::Postgres, &spec);
        assert_eq!(a.prepared_name(), b.prepared_name());
        assert!(a.same_identity(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_prepare_interpolates_template() {
        let vars = TemplateVars::new(BTreeMap::from([(
            "prefix".to_string(),
            "app_".to_string(),
        )]));
        let spec = audit_spec().with_name("{{ prefix }}audit").after(["insert", "update"]);
        let mut trigger = TriggerBuilder::new(Dialect::Mysql).build(&spec).unwrap();
        trigger.prepare(&vars).unwrap();

        assert_eq!(trigger.name(), "{{ prefix }}audit");
        assert_eq!(trigger.key(), "app_audit");
        assert_eq!(trigger.members()[0].key(), "app_audit_insert");
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let spec = audit_spec().with_name("{{ prefix }}audit");
        let mut trigger = TriggerBuilder::new(Dialect::Postgres).build(&spec).unwrap();

        let first = TemplateVars::new(BTreeMap::from([("prefix".to_string(), "a_".to_string())]));
        let second = TemplateVars::new(BTreeMap::from([("prefix".to_string(), "b_".to_string())]));
        trigger.prepare(&first).unwrap();
        trigger.prepare(&second).unwrap();
        assert_eq!(trigger.key(), "a_audit");
    }

    #[test]
    fn test_prepare_rejects_undefined_variable() {
        let spec = audit_spec().with_name("{{ prefix }}audit");
        let mut trigger = TriggerBuilder::new(Dialect::Postgres).build(&spec).unwrap();
        let err = trigger.prepare(&TemplateVars::empty()).unwrap_err();
        assert!(matches!(err, TriggerError::Template { .. }));
        assert!(!trigger.is_prepared());
    }

    #[test]
    fn test_bookkeeping_options_ignored_by_equality() {
        let plain = build(Dialect::Postgres, &audit_spec());
        let mut generated = plain.clone();
        generated.mark_generated();

        assert!(generated.options().generated);
        assert_eq!(generated.options().compatibility, Some(COMPATIBILITY_VERSION));
        assert_eq!(plain, generated);
    }

    #[test]
    fn test_same_identity_different_body() {
        let old = build(Dialect::Postgres, &audit_spec());
        let new = build(Dialect::Postgres, &audit_spec().with_body("SELECT 1;"));
        assert!(old.same_identity(&new));
        assert_ne!(old, new);
    }

    #[test]
    fn test_sort_order_is_by_name_first() {
        let mut triggers = vec![
            build(Dialect::Postgres, &audit_spec().with_name("b")),
            build(Dialect::Postgres, &audit_spec().with_name("a").on("zebras")),
        ];
        triggers.sort();
        let names: Vec<_> = triggers.iter().map(Trigger::key).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}

mod drop_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_trigger_drop() {
        let trigger = build(Dialect::Postgres, &audit_spec());
        let drops = trigger.drop_triggers();

        assert_eq!(drops, vec![Trigger::drop_of("users_after_update_row", "users")]);
        assert_eq!(drops[0].identity(), "users_after_update_row");
    }

    #[test]
    fn test_group_drop_is_complete() {
        let spec = audit_spec().after(["insert", "update", "delete"]);
        let trigger = build(Dialect::Mysql, &spec);
        let drops = trigger.drop_triggers();

        assert_eq!(drops.len(), trigger.members().len());
        for (drop, member) in drops.iter().zip(trigger.members()) {
            assert!(drop.is_drop());
            assert_eq!(drop.key(), member.key());
            assert_eq!(drop.identity(), trigger.key());
            assert_eq!(drop.options().group.as_deref(), Some(trigger.key()));
        }
    }

    #[test]
    fn test_manual_trigger_drop_stays_manual() {
        let trigger = build(
            Dialect::Postgres,
            &TriggerSpec::manual("CREATE TRIGGER legacy AFTER INSERT ON users FOR EACH ROW EXECUTE FUNCTION legacy()"),
        );
        let drops = trigger.drop_triggers();
        assert_eq!(drops.len(), 1);
        assert!(drops[0].is_manual());
        assert_eq!(drops[0].key(), "legacy");
    }
}

mod manual_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_postgres_create() {
        let stmt = ManualStatement::parse(indoc! {"
            CREATE OR REPLACE TRIGGER audit_users
                BEFORE INSERT OR UPDATE OF email ON public.users
                FOR EACH STATEMENT
                EXECUTE FUNCTION audit()
        "})
        .unwrap();

        assert_eq!(
            stmt,
            ManualStatement::Create {
                name: "audit_users".to_string(),
                table: "public.users".to_string(),
                timing: TriggerTiming::Before,
                events: [TriggerEvent::Insert, TriggerEvent::Update].into(),
                scope: TriggerScope::Statement,
            }
        );
    }

    #[test]
    fn test_parse_mysql_create_with_definer() {
        let stmt = ManualStatement::parse(
            "CREATE DEFINER=`root`@`localhost` TRIGGER `touch` AFTER DELETE ON `orders` FOR EACH ROW BEGIN END",
        )
        .unwrap();
        assert!(matches!(
            stmt,
            ManualStatement::Create { ref name, ref table, timing: TriggerTiming::After, .. }
                if name == "touch" && table == "orders"
        ));
    }

    #[test]
    fn test_parse_mssql_create() {
        let stmt = ManualStatement::parse(
            "CREATE TRIGGER [audit] ON [dbo].[users] FOR INSERT, DELETE AS BEGIN SELECT 1 END",
        )
        .unwrap();
        assert_eq!(
            stmt,
            ManualStatement::Create {
                name: "audit".to_string(),
                table: "dbo.users".to_string(),
                timing: TriggerTiming::After,
                events: [TriggerEvent::Insert, TriggerEvent::Delete].into(),
                scope: TriggerScope::Statement,
            }
        );
    }

    #[test]
    fn test_parse_drop() {
        assert_eq!(
            ManualStatement::parse("DROP TRIGGER IF EXISTS audit ON users"),
            Some(ManualStatement::Drop {
                name: "audit".to_string(),
                table: Some("users".to_string()),
            })
        );
        assert_eq!(ManualStatement::parse("drop trigger audit").unwrap().name(), "audit");
    }

    #[test]
    fn test_other_sql_is_not_recognized() {
        assert_eq!(ManualStatement::parse("CREATE INDEX idx ON users (email)"), None);
        assert_eq!(ManualStatement::parse("UPDATE users SET x = 1"), None);
    }

    #[test]
    fn test_build_manual_trigger() {
        let sql = "CREATE TRIGGER legacy AFTER INSERT ON users FOR EACH ROW EXECUTE FUNCTION legacy()";
        let trigger = build(Dialect::Postgres, &TriggerSpec::manual(sql));

        assert!(trigger.is_manual());
        assert!(!trigger.is_drop());
        assert_eq!(trigger.key(), "legacy");
        assert_eq!(trigger.table(), "users");
        assert_eq!(trigger.manual_sql(), Some(sql));
    }

    #[test]
    fn test_build_manual_drop() {
        let trigger = build(Dialect::Sqlite, &TriggerSpec::manual("DROP TRIGGER legacy"));
        assert!(trigger.is_manual());
        assert!(trigger.is_drop());
        assert_eq!(trigger.key(), "legacy");
    }

    #[test]
    fn test_build_unrecognized_sql() {
        let spec = TriggerSpec::manual("ALTER TABLE users ADD COLUMN x int");
        assert_eq!(spec_error(Dialect::Postgres, &spec), SpecError::UnrecognizedSql);
    }
}

mod source_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_source() {
        let mut trigger = build(Dialect::Postgres, &audit_spec());
        trigger.mark_generated();

        assert_eq!(
            trigger.to_source(""),
            indoc! {r#"
                create_trigger(generated: true, compatibility: 1).on("users").after(update).for_each(row) {
                  """
                    UPDATE stats SET n = n + 1;
                  """
                }"#}
        );
    }

    #[test]
    fn test_create_source_with_everything() {
        let spec = audit_spec()
            .with_name("audit")
            .after(["insert", "update"])
            .with_when("NEW.email <> OLD.email")
            .with_update_columns(["email", "name"])
            .with_body_override("sqlite", "SELECT \"quoted\";\n\nSELECT 2;")
            .with_option("group_hint", OptionValue::List(vec![OptionValue::Int(1)]));
        let trigger = build(Dialect::Postgres, &spec);

        assert_eq!(
            trigger.to_source(""),
            indoc! {r#"
                create_trigger("audit", group_hint: [1]).on("users").after(insert, update).for_each(row).where("NEW.email <> OLD.email").of("email", "name") {
                  """
                    UPDATE stats SET n = n + 1;
                  """
                  sqlite: """
                    SELECT "quoted";

                    SELECT 2;
                  """
                }"#}
        );
    }

    #[test]
    fn test_group_member_drop_source() {
        let spec = audit_spec().after(["insert", "update"]);
        let drops = build(Dialect::Mysql, &spec).drop_triggers();

        assert_eq!(
            drops[0].to_source(""),
            r#"drop_trigger("users_after_insert_row", "users", group: "users_after_insert_update_row")"#
        );
    }

    #[test]
    fn test_manual_source() {
        let sql = "CREATE TRIGGER legacy AFTER INSERT ON users\nFOR EACH ROW EXECUTE FUNCTION legacy()";
        let trigger = build(Dialect::Postgres, &TriggerSpec::manual(sql));

        assert_eq!(
            trigger.to_source("  "),
            "  execute(\"\"\"\n    CREATE TRIGGER legacy AFTER INSERT ON users\n    FOR EACH ROW EXECUTE FUNCTION legacy()\n  \"\"\")"
        );
    }

    #[test]
    fn test_triple_quote_in_body_falls_back_to_escaped_string() {
        let trigger = build(Dialect::Postgres, &audit_spec().with_body("SELECT '\"\"\"';"));
        assert!(trigger.to_source("").contains(r#"  "SELECT '\"\"\"';""#));
    }
}
