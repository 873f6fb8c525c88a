//! Alter path against SQLite: one statement per command, failures collected.

mod common;

use common::{create_users, failed, log, memory_grammar, record, strings, succeeded};
use oxide_schema::prelude::*;

#[tokio::test]
async fn test_alter_continues_past_failure() {
    let grammar = memory_grammar().await;
    let mut users = create_users(&grammar).await;

    let log = log();
    users
        .push_command_then(
            CommandKind::AddColumn(Column::new("a", ColumnType::Integer)),
            record(&log, "a"),
        )
        .push_command_then(
            CommandKind::DropColumn("missing".to_string()),
            record(&log, "missing"),
        )
        .push_command_then(
            CommandKind::AddColumn(Column::new("b", ColumnType::Integer)),
            record(&log, "b"),
        );

    let err = grammar.alter_table(&mut users).await.unwrap_err();
    match &err {
        GrammarError::Multiple(errors) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].verb(), Some("DropColumn"));
        }
        other => panic!("unexpected error: {other}"),
    }
    let message = err.to_string();
    assert!(message.starts_with("DropColumn missing"));
    assert!(!message.contains("AddColumn"));

    assert_eq!(succeeded(&log), vec!["a", "b"]);
    assert_eq!(failed(&log), vec!["missing"]);
    assert!(users.has_column("a"));
    assert!(users.has_column("b"));
    assert!(users.commands.is_empty());
}

#[tokio::test]
async fn test_add_and_drop_index() {
    let grammar = memory_grammar().await;
    let mut users = create_users(&grammar).await;

    users
        .add_column(Column::new("age", ColumnType::SmallInteger).unsigned())
        .create_index(Index::new("idx_age", ["age"]))
        .drop_index("idx_name");
    grammar.alter_table(&mut users).await.unwrap();

    assert!(users.has_index("idx_age"));
    assert!(!users.has_index("idx_name"));
    assert_eq!(users.column("age").unwrap().indexes, vec!["idx_age"]);
    assert!(users.column("name").unwrap().indexes.is_empty());
}

#[tokio::test]
async fn test_index_on_unknown_column_is_rejected() {
    let grammar = memory_grammar().await;
    let mut users = create_users(&grammar).await;

    let log = log();
    users
        .push_command_then(
            CommandKind::CreateIndex(Index::new("idx_ghost", ["email", "ghost"])),
            record(&log, "ghost"),
        )
        .push_command_then(
            CommandKind::CreateIndex(Index::new("idx_email_name", ["email", "name"])),
            record(&log, "email_name"),
        );

    let GrammarError::Multiple(errors) = grammar.alter_table(&mut users).await.unwrap_err() else {
        panic!("expected a batch error");
    };
    assert_eq!(errors.len(), 1);
    let GrammarError::Command { source, .. } = &errors[0] else {
        panic!("expected a command error");
    };
    assert!(matches!(
        **source,
        GrammarError::ColumnNotFound { ref column, .. } if column == "ghost"
    ));
    assert_eq!(failed(&log), vec!["ghost"]);
    assert_eq!(succeeded(&log), vec!["email_name"]);

    assert!(!users.has_index("idx_ghost"));
    assert!(users.has_index("idx_email_name"));
    assert!(strings(&grammar, "SELECT name FROM sqlite_master WHERE name = 'idx_ghost'")
        .await
        .is_empty());
}

#[tokio::test]
async fn test_rename_index() {
    let grammar = memory_grammar().await;
    let mut users = create_users(&grammar).await;

    users.rename_index("uniq_email", "users_email_unique");
    grammar.alter_table(&mut users).await.unwrap();

    assert!(!users.has_index("uniq_email"));
    let index = users.index("users_email_unique").unwrap();
    assert_eq!(index.kind, IndexKind::Unique);
    assert_eq!(index.columns, vec!["email"]);
}

#[tokio::test]
async fn test_rename_index_is_not_atomic() {
    let grammar = memory_grammar().await;
    let mut users = create_users(&grammar).await;
    // Indexes and tables share one namespace, so the recreate step fails.
    grammar
        .catalog()
        .execute("CREATE TABLE \"idx_renamed\" (x INTEGER)")
        .await
        .unwrap();

    let log = log();
    users.push_command_then(
        CommandKind::RenameIndex {
            from: "idx_name".to_string(),
            to: "idx_renamed".to_string(),
        },
        record(&log, "rename"),
    );
    let err = grammar.alter_table(&mut users).await.unwrap_err();
    assert!(err.to_string().starts_with("RenameIndex idx_name"));
    assert_eq!(failed(&log), vec!["rename"]);

    assert!(!users.has_index("idx_name"));
    assert!(!users.has_index("idx_renamed"));
    let mut fresh = Table::new("users");
    grammar.get_table(&mut fresh).await.unwrap();
    assert!(!fresh.has_index("idx_name"));
    assert!(!fresh.has_index("idx_renamed"));
}

#[tokio::test]
async fn test_rename_column_keeps_rows_and_indexes() {
    let grammar = memory_grammar().await;
    let mut users = create_users(&grammar).await;
    grammar
        .catalog()
        .execute("INSERT INTO users (email, name) VALUES ('a@example.com', 'Ada')")
        .await
        .unwrap();

    users.rename_column("name", "display_name");
    grammar.alter_table(&mut users).await.unwrap();

    assert_eq!(
        users.column_names(),
        vec!["id", "email", "display_name"]
    );
    assert_eq!(users.index("idx_name").unwrap().columns, vec!["display_name"]);
    assert_eq!(
        strings(&grammar, "SELECT display_name FROM users").await,
        vec!["Ada"]
    );
}

#[tokio::test]
async fn test_change_column_rebuilds_table() {
    let grammar = memory_grammar().await;
    let mut users = create_users(&grammar).await;
    grammar
        .catalog()
        .execute(
            "INSERT INTO users (email, name) VALUES \
             ('a@example.com', 'Ada'), ('b@example.com', 'Brian')",
        )
        .await
        .unwrap();

    users.change_column(
        Column::new("name", ColumnType::Text)
            .not_null()
            .default_value(DefaultValue::String("anonymous".to_string())),
    );
    grammar.alter_table(&mut users).await.unwrap();

    let name = users.column("name").unwrap();
    assert_eq!(name.column_type, ColumnType::Text);
    assert!(!name.nullable);
    assert_eq!(
        name.default,
        Some(DefaultValue::String("anonymous".to_string()))
    );
    assert_eq!(users.column_names(), vec!["id", "email", "name"]);

    let id = users.column("id").unwrap();
    assert!(id.primary);
    assert!(id.is_auto_increment());
    assert!(users.has_index("idx_name"));
    assert_eq!(users.index("uniq_email").unwrap().kind, IndexKind::Unique);
    assert!(!grammar.table_exists("_users_rebuild").await.unwrap());

    assert_eq!(
        strings(&grammar, "SELECT name FROM users ORDER BY id").await,
        vec!["Ada", "Brian"]
    );
}

#[tokio::test]
async fn test_failed_rebuild_rolls_back() {
    let grammar = memory_grammar().await;
    let mut users = create_users(&grammar).await;
    grammar
        .catalog()
        .execute("INSERT INTO users (email) VALUES ('a@example.com')")
        .await
        .unwrap();

    // The existing row has no name, so the copy violates NOT NULL.
    users.change_column(Column::new("name", ColumnType::String).length(20).not_null());
    assert!(grammar.alter_table(&mut users).await.is_err());

    let mut fresh = Table::new("users");
    grammar.get_table(&mut fresh).await.unwrap();
    assert!(fresh.column("name").unwrap().nullable);
    assert!(fresh.has_index("idx_name"));
    assert_eq!(
        strings(&grammar, "SELECT email FROM users").await,
        vec!["a@example.com"]
    );
}

#[tokio::test]
async fn test_missing_targets_are_reported() {
    let grammar = memory_grammar().await;
    let mut users = create_users(&grammar).await;

    let log = log();
    users
        .push_command_then(
            CommandKind::ChangeColumn(Column::new("ghost", ColumnType::Text)),
            record(&log, "change"),
        )
        .push_command_then(
            CommandKind::RenameColumn {
                from: "ghost".to_string(),
                to: "spirit".to_string(),
            },
            record(&log, "rename_column"),
        )
        .push_command_then(
            CommandKind::RenameIndex {
                from: "idx_ghost".to_string(),
                to: "idx_spirit".to_string(),
            },
            record(&log, "rename_index"),
        );

    let err = grammar.alter_table(&mut users).await.unwrap_err();
    let GrammarError::Multiple(errors) = err else {
        panic!("expected a batch error");
    };
    assert_eq!(errors.len(), 3);
    let sources: Vec<&GrammarError> = errors
        .iter()
        .map(|e| match e {
            GrammarError::Command { source, .. } => &**source,
            other => other,
        })
        .collect();
    assert!(matches!(sources[0], GrammarError::ColumnNotFound { .. }));
    assert!(matches!(sources[1], GrammarError::ColumnNotFound { .. }));
    assert!(matches!(sources[2], GrammarError::IndexNotFound { .. }));
    assert_eq!(failed(&log), vec!["change", "rename_column", "rename_index"]);
    assert_eq!(users.column_names(), vec!["id", "email", "name"]);
}

#[tokio::test]
async fn test_create_primary_is_not_an_alter_command() {
    let grammar = memory_grammar().await;
    let mut users = create_users(&grammar).await;

    let log = log();
    users.push_command_then(
        CommandKind::CreatePrimary(Primary::new(["email"])),
        record(&log, "primary"),
    );
    grammar.alter_table(&mut users).await.unwrap();

    assert_eq!(failed(&log), vec!["primary"]);
    assert_eq!(users.primary.as_ref().unwrap().columns, vec!["id"]);
}

#[tokio::test]
async fn test_alter_missing_table_fails_every_command() {
    let grammar = memory_grammar().await;
    let log = log();
    let mut table = Table::new("ghost");
    table
        .push_command_then(
            CommandKind::AddColumn(Column::new("a", ColumnType::Integer)),
            record(&log, "a"),
        )
        .push_command_then(
            CommandKind::DropColumn("b".to_string()),
            record(&log, "b"),
        );

    let err = grammar.alter_table(&mut table).await.unwrap_err();
    assert!(matches!(err, GrammarError::TableNotFound(_)));
    assert_eq!(failed(&log), vec!["a", "b"]);
}
