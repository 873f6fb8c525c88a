//! Catalog access.
//!
//! A [`Catalog`] owns the connection pool of one dialect. It executes DDL
//! and returns raw catalog rows; translating those rows into canonical
//! schema types is the grammar's job.

mod mysql;
mod sqlite;

pub use mysql::MySqlCatalog;
pub use sqlite::SqliteCatalog;

use std::time::Instant;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::Result;
use crate::schema::DefaultValue;

/// One column row, as the catalog reports it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeColumn {
    pub name: String,
    /// 1-based ordinal position.
    pub position: usize,
    /// Full native declaration, e.g. `varchar(36)` or `int unsigned`.
    pub type_name: String,
    pub nullable: bool,
    pub default: Option<DefaultValue>,
    /// `AutoIncrement` when the catalog marks the column as such.
    pub extra: Option<String>,
    pub comment: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    /// Value list of an `IN (...)` check constraint on the column.
    pub check: Option<String>,
}

/// One index row: a single column of a single index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeIndex {
    pub name: String,
    pub column_name: String,
    /// 1-based position of the column within the index.
    pub seq: usize,
    pub unique: bool,
}

/// Table-level storage metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableInfo {
    pub engine: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub rows: Option<i64>,
    pub comment: Option<String>,
    pub create_time: Option<NaiveDateTime>,
}

/// Executes statements and reads catalog metadata for one database.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Executes one statement.
    async fn execute(&self, sql: &str) -> Result<()>;

    /// Executes statements as one unit where the engine allows it.
    async fn execute_atomic(&self, statements: &[String]) -> Result<()>;

    /// Name of the database the connection is using, if any.
    async fn current_database(&self) -> Result<Option<String>>;

    /// Raw server version string.
    async fn version(&self) -> Result<String>;

    async fn table_exists(&self, db_name: &str, table: &str) -> Result<bool>;

    /// Storage metadata, `None` when the catalog has none.
    async fn table_info(&self, db_name: &str, table: &str) -> Result<Option<TableInfo>>;

    /// Column rows in ordinal order. Empty when the table does not exist.
    async fn columns(&self, db_name: &str, table: &str) -> Result<Vec<NativeColumn>>;

    /// Index rows ordered by index name, then sequence.
    async fn indexes(&self, db_name: &str, table: &str) -> Result<Vec<NativeIndex>>;
}

/// Maps an empty catalog string to `None`.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Logs a statement once it has run.
pub(crate) fn trace_sql(sql: &str, started: Instant) {
    debug!(sql = %sql, elapsed_ms = %started.elapsed().as_millis(), "Executed SQL");
}
