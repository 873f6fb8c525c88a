//! MySQL catalog backed by `INFORMATION_SCHEMA`.

use std::time::Instant;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures::TryStreamExt;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Executor, Row};

use crate::error::{GrammarError, Result};
use crate::schema::{DefaultValue, AUTO_INCREMENT};

use super::{non_empty, trace_sql, Catalog, NativeColumn, NativeIndex, TableInfo};

const COLUMNS_SQL: &str = "SELECT CAST(COLUMN_NAME AS CHAR) AS column_name, \
     CAST(ORDINAL_POSITION AS SIGNED) AS position, \
     CAST(COLUMN_TYPE AS CHAR) AS column_type, \
     CAST(DATA_TYPE AS CHAR) AS data_type, \
     CAST(IS_NULLABLE AS CHAR) AS is_nullable, \
     CAST(COLUMN_DEFAULT AS CHAR) AS column_default, \
     CAST(EXTRA AS CHAR) AS extra, \
     CAST(COLUMN_COMMENT AS CHAR) AS column_comment, \
     CAST(CHARACTER_SET_NAME AS CHAR) AS charset, \
     CAST(COLLATION_NAME AS CHAR) AS collation \
     FROM INFORMATION_SCHEMA.COLUMNS \
     WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
     ORDER BY ORDINAL_POSITION";

const INDEXES_SQL: &str = "SELECT CAST(INDEX_NAME AS CHAR) AS index_name, \
     CAST(COLUMN_NAME AS CHAR) AS column_name, \
     CAST(SEQ_IN_INDEX AS SIGNED) AS seq, \
     CAST(NON_UNIQUE AS SIGNED) AS non_unique \
     FROM INFORMATION_SCHEMA.STATISTICS \
     WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
     ORDER BY INDEX_NAME, SEQ_IN_INDEX";

const TABLE_SQL: &str = "SELECT CAST(t.ENGINE AS CHAR) AS engine, \
     CAST(t.TABLE_COLLATION AS CHAR) AS collation, \
     CAST(c.CHARACTER_SET_NAME AS CHAR) AS charset, \
     CAST(t.TABLE_ROWS AS SIGNED) AS table_rows, \
     CAST(t.TABLE_COMMENT AS CHAR) AS table_comment, \
     t.CREATE_TIME AS create_time \
     FROM INFORMATION_SCHEMA.TABLES t \
     LEFT JOIN INFORMATION_SCHEMA.COLLATION_CHARACTER_SET_APPLICABILITY c \
     ON c.COLLATION_NAME = t.TABLE_COLLATION \
     WHERE t.TABLE_SCHEMA = ? AND t.TABLE_NAME = ?";

const TABLE_EXISTS_SQL: &str = "SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLES \
     WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?";

/// Catalog for MySQL-compatible servers.
#[derive(Debug, Clone)]
pub struct MySqlCatalog {
    pool: MySqlPool,
}

impl MySqlCatalog {
    /// Wraps an existing pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .connect(dsn)
            .await?;
        Ok(Self::new(pool))
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    fn column_from_row(row: &MySqlRow) -> Result<NativeColumn> {
        let position: i64 = row.try_get("position")?;
        let data_type: String = row.try_get("data_type")?;
        let extra: String = row.try_get::<Option<String>, _>("extra")?.unwrap_or_default();
        let nullable: String = row.try_get("is_nullable")?;
        let raw_default: Option<String> = row.try_get("column_default")?;

        Ok(NativeColumn {
            name: row.try_get("column_name")?,
            position: usize::try_from(position).unwrap_or_default(),
            type_name: row.try_get("column_type")?,
            nullable: nullable.eq_ignore_ascii_case("YES"),
            default: parse_default(raw_default, &data_type, &extra),
            extra: extra
                .to_ascii_lowercase()
                .contains("auto_increment")
                .then(|| AUTO_INCREMENT.to_string()),
            comment: non_empty(row.try_get("column_comment")?),
            charset: row.try_get("charset")?,
            collation: row.try_get("collation")?,
            check: None,
        })
    }
}

/// Interprets `COLUMN_DEFAULT`. MySQL reports literals unquoted and flags
/// expressions with `DEFAULT_GENERATED`; MariaDB quotes string literals and
/// reports a NULL default as the text `NULL`.
fn parse_default(raw: Option<String>, data_type: &str, extra: &str) -> Option<DefaultValue> {
    let raw = raw?;
    if raw.eq_ignore_ascii_case("NULL") {
        return None;
    }
    if extra.contains("DEFAULT_GENERATED")
        || raw.to_ascii_uppercase().starts_with("CURRENT_TIMESTAMP")
    {
        return Some(DefaultValue::Expression(raw));
    }
    if raw.starts_with('\'') {
        return Some(DefaultValue::from_sql_literal(&raw));
    }
    let numeric = matches!(
        data_type.to_ascii_lowercase().as_str(),
        "tinyint" | "smallint" | "mediumint" | "int" | "bigint" | "decimal" | "float" | "double"
    );
    if numeric {
        return Some(DefaultValue::from_sql_literal(&raw));
    }
    Some(DefaultValue::String(raw))
}

#[async_trait]
impl Catalog for MySqlCatalog {
    async fn execute(&self, sql: &str) -> Result<()> {
        let started = Instant::now();
        self.pool.execute(sql).await?;
        trace_sql(sql, started);
        Ok(())
    }

    /// MySQL commits implicitly around DDL, so statements run in sequence.
    async fn execute_atomic(&self, statements: &[String]) -> Result<()> {
        for sql in statements {
            self.execute(sql).await?;
        }
        Ok(())
    }

    async fn current_database(&self) -> Result<Option<String>> {
        let row: Option<(Option<String>,)> = sqlx::query_as("SELECT DATABASE()")
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.and_then(|(name,)| non_empty(name)))
    }

    async fn version(&self) -> Result<String> {
        let row: Option<(String,)> = sqlx::query_as("SELECT VERSION()")
            .fetch_optional(&self.pool)
            .await?;
        row.map(|(version,)| version)
            .ok_or_else(|| GrammarError::UnknownVersion {
                driver: "mysql".to_string(),
            })
    }

    async fn table_exists(&self, db_name: &str, table: &str) -> Result<bool> {
        let started = Instant::now();
        let (count,): (i64,) = sqlx::query_as(TABLE_EXISTS_SQL)
            .bind(db_name)
            .bind(table)
            .fetch_one(&self.pool)
            .await?;
        trace_sql(TABLE_EXISTS_SQL, started);
        Ok(count > 0)
    }

    async fn table_info(&self, db_name: &str, table: &str) -> Result<Option<TableInfo>> {
        let started = Instant::now();
        let row = sqlx::query(TABLE_SQL)
            .bind(db_name)
            .bind(table)
            .fetch_optional(&self.pool)
            .await?;
        trace_sql(TABLE_SQL, started);

        let Some(row) = row else {
            return Ok(None);
        };
        let create_time: Option<NaiveDateTime> = row.try_get("create_time").ok().flatten();
        Ok(Some(TableInfo {
            engine: non_empty(row.try_get("engine")?),
            charset: non_empty(row.try_get("charset")?),
            collation: non_empty(row.try_get("collation")?),
            rows: row.try_get("table_rows")?,
            comment: non_empty(row.try_get("table_comment")?),
            create_time,
        }))
    }

    async fn columns(&self, db_name: &str, table: &str) -> Result<Vec<NativeColumn>> {
        let started = Instant::now();
        let mut rows = sqlx::query(COLUMNS_SQL)
            .bind(db_name)
            .bind(table)
            .fetch(&self.pool);

        let mut columns = Vec::new();
        while let Some(row) = rows.try_next().await? {
            columns.push(Self::column_from_row(&row)?);
        }
        trace_sql(COLUMNS_SQL, started);
        Ok(columns)
    }

    async fn indexes(&self, db_name: &str, table: &str) -> Result<Vec<NativeIndex>> {
        let started = Instant::now();
        let rows = sqlx::query(INDEXES_SQL)
            .bind(db_name)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;
        trace_sql(INDEXES_SQL, started);

        let mut indexes = Vec::with_capacity(rows.len());
        for row in rows {
            // Functional indexes have no column.
            let Some(column_name) = row.try_get::<Option<String>, _>("column_name")? else {
                continue;
            };
            let seq: i64 = row.try_get("seq")?;
            let non_unique: i64 = row.try_get("non_unique")?;
            indexes.push(NativeIndex {
                name: row.try_get("index_name")?,
                column_name,
                seq: usize::try_from(seq).unwrap_or_default(),
                unique: non_unique == 0,
            });
        }
        Ok(indexes)
    }
}
