//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use oxide_schema::prelude::*;

/// Outcomes reported to command callbacks, in firing order.
pub type Log = Arc<Mutex<Vec<(&'static str, std::result::Result<(), String>)>>>;

/// Connects a grammar to a private in-memory database.
pub async fn memory_grammar() -> SqliteGrammar {
    SqliteGrammar::connect("sqlite::memory:").await.unwrap()
}

pub fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

/// Callback appending `label` and the outcome to `log`.
pub fn record(
    log: &Log,
    label: &'static str,
) -> impl FnOnce(std::result::Result<(), &GrammarError>) + Send + 'static {
    let log = Arc::clone(log);
    move |outcome| {
        log.lock()
            .unwrap()
            .push((label, outcome.map_err(ToString::to_string)));
    }
}

/// Labels whose callback reported success.
pub fn succeeded(log: &Log) -> Vec<&'static str> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|(_, outcome)| outcome.is_ok())
        .map(|(label, _)| *label)
        .collect()
}

/// Labels whose callback reported failure.
pub fn failed(log: &Log) -> Vec<&'static str> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|(_, outcome)| outcome.is_err())
        .map(|(label, _)| *label)
        .collect()
}

/// A `users` table: auto-increment key, unique email, indexed name.
pub async fn create_users(grammar: &SqliteGrammar) -> Table {
    let mut users = Table::new("users");
    users
        .add_column(
            Column::new("id", ColumnType::BigInteger)
                .unsigned()
                .not_null()
                .auto_increment()
                .primary(),
        )
        .add_column(Column::new("email", ColumnType::String).length(100).not_null())
        .add_column(Column::new("name", ColumnType::String).length(20))
        .create_index(Index::unique("uniq_email", ["email"]))
        .create_index(Index::new("idx_name", ["name"]));
    grammar.create_table(&mut users).await.unwrap();
    users
}

/// Runs a query returning one text column.
pub async fn strings(grammar: &SqliteGrammar, sql: &str) -> Vec<String> {
    let rows: Vec<(String,)> = sqlx::query_as(sql)
        .fetch_all(grammar.catalog().pool())
        .await
        .unwrap();
    rows.into_iter().map(|(value,)| value).collect()
}
