//! SQLite catalog backed by the table-valued PRAGMA functions.

use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Instant;

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Executor;

use crate::error::{GrammarError, Result};
use crate::quoter::{AnsiQuoter, Quoter};
use crate::schema::{DefaultValue, AUTO_INCREMENT};

use super::{trace_sql, Catalog, NativeColumn, NativeIndex, TableInfo};

const COLUMNS_SQL: &str =
    "SELECT cid, name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?) ORDER BY cid";
const CREATE_SQL: &str = "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?";
const INDEX_LIST_SQL: &str = "SELECT name, \"unique\", origin FROM pragma_index_list(?)";
const INDEX_INFO_SQL: &str = "SELECT seqno, name FROM pragma_index_info(?) ORDER BY seqno";
const PRIMARY_SQL: &str =
    "SELECT name, pk FROM pragma_table_info(?) WHERE pk > 0 ORDER BY pk";
const TABLE_EXISTS_SQL: &str =
    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?";

/// Sentinel name under which the primary key is reported.
const PRIMARY: &str = "PRIMARY";

/// Column name reported for an index entry over an expression.
const EXPRESSION: &str = "<expression>";

static AUTOINCREMENT: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(
        r"\bPRIMARY\s+KEY\s+(?:(?:ASC|DESC)\s+)?(?:ON\s+CONFLICT\s+\w+\s+)?AUTOINCREMENT\b",
    )
    .case_insensitive(true)
    .build()
    .expect("autoincrement pattern is valid")
});

type ColumnRow = (i64, String, String, i64, Option<String>, i64);

/// Catalog for SQLite databases.
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    /// Wraps an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects a new pool. In-memory databases get a single connection
    /// that is never recycled, since each connection has its own database.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(dsn)?.create_if_missing(true);
        let pool = if dsn.contains(":memory:") || dsn.contains("mode=memory") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };
        Ok(Self::new(pool))
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create_sql(&self, table: &str) -> Result<Option<String>> {
        let row: Option<(Option<String>,)> = sqlx::query_as(CREATE_SQL)
            .bind(table)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.and_then(|(sql,)| sql))
    }
}

/// Pieces of a column definition only visible in the stored `CREATE TABLE`.
#[derive(Debug, Default, PartialEq)]
struct DeclaredColumn {
    comment: Option<String>,
    check: Option<String>,
}

fn declared_column(create_sql: &str, name: &str) -> DeclaredColumn {
    let quoted = regex::escape(&AnsiQuoter.id(name));
    let comment = Regex::new(&format!(r"{quoted}\s*/\*\s*(.*?)\s*\*/"))
        .ok()
        .and_then(|re| re.captures(create_sql))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());
    let check = RegexBuilder::new(&format!(r"CHECK\s*\(\s*{quoted}\s+IN\s*\("))
        .case_insensitive(true)
        .build()
        .ok()
        .and_then(|re| re.find(create_sql))
        .and_then(|m| {
            let rest = &create_sql[m.end()..];
            list_end(rest).map(|end| rest[..end].trim().to_string())
        });
    DeclaredColumn { comment, check }
}

/// Byte offset of the first `)` outside a single-quoted literal.
fn list_end(text: &str) -> Option<usize> {
    let mut quoted = false;
    for (i, c) in text.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            ')' if !quoted => return Some(i),
            _ => {}
        }
    }
    None
}

/// Whether a column is declared `PRIMARY KEY AUTOINCREMENT`. Comments,
/// literals and quoted names are ignored.
fn has_autoincrement(create_sql: &str) -> bool {
    AUTOINCREMENT.is_match(&blank_out_quoted(create_sql))
}

/// Replaces comments, string literals and quoted identifiers with a space.
fn blank_out_quoted(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        let close = match c {
            '\'' | '"' | '`' => c,
            '[' => ']',
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut star = false;
                for next in chars.by_ref() {
                    if star && next == '/' {
                        break;
                    }
                    star = next == '*';
                }
                out.push(' ');
                continue;
            }
            '-' if chars.peek() == Some(&'-') => {
                chars.by_ref().find(|&next| next == '\n');
                out.push('\n');
                continue;
            }
            _ => {
                out.push(c);
                continue;
            }
        };
        chars.by_ref().find(|&next| next == close);
        out.push(' ');
    }
    out
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn execute(&self, sql: &str) -> Result<()> {
        let started = Instant::now();
        self.pool.execute(sql).await?;
        trace_sql(sql, started);
        Ok(())
    }

    async fn execute_atomic(&self, statements: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for sql in statements {
            let started = Instant::now();
            (&mut *tx).execute(sql.as_str()).await?;
            trace_sql(sql, started);
        }
        tx.commit().await?;
        Ok(())
    }

    async fn current_database(&self) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT name FROM pragma_database_list WHERE seq = 0")
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(name,)| name))
    }

    async fn version(&self) -> Result<String> {
        let row: Option<(String,)> = sqlx::query_as("SELECT sqlite_version()")
            .fetch_optional(&self.pool)
            .await?;
        row.map(|(version,)| version)
            .ok_or_else(|| GrammarError::UnknownVersion {
                driver: "sqlite3".to_string(),
            })
    }

    async fn table_exists(&self, _db_name: &str, table: &str) -> Result<bool> {
        let started = Instant::now();
        let (count,): (i64,) = sqlx::query_as(TABLE_EXISTS_SQL)
            .bind(table)
            .fetch_one(&self.pool)
            .await?;
        trace_sql(TABLE_EXISTS_SQL, started);
        Ok(count > 0)
    }

    /// SQLite keeps no storage metadata.
    async fn table_info(&self, _db_name: &str, _table: &str) -> Result<Option<TableInfo>> {
        Ok(None)
    }

    async fn columns(&self, _db_name: &str, table: &str) -> Result<Vec<NativeColumn>> {
        let started = Instant::now();
        let rows: Vec<ColumnRow> = sqlx::query_as(COLUMNS_SQL)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;
        trace_sql(COLUMNS_SQL, started);
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let create_sql = self.create_sql(table).await?.unwrap_or_default();
        let pk_count = rows.iter().filter(|row| row.5 > 0).count();
        let autoincrement = has_autoincrement(&create_sql);

        let columns = rows
            .into_iter()
            .map(|(cid, name, type_name, notnull, dflt_value, pk)| {
                let declared = declared_column(&create_sql, &name);
                // A rowid alias never holds NULL, whatever its declaration.
                let rowid_alias =
                    pk > 0 && pk_count == 1 && type_name.eq_ignore_ascii_case("INTEGER");
                NativeColumn {
                    position: usize::try_from(cid + 1).unwrap_or_default(),
                    nullable: notnull == 0 && !rowid_alias,
                    default: dflt_value.as_deref().map(DefaultValue::from_sql_literal),
                    extra: (rowid_alias && autoincrement).then(|| AUTO_INCREMENT.to_string()),
                    comment: declared.comment,
                    check: declared.check,
                    charset: None,
                    collation: None,
                    name,
                    type_name,
                }
            })
            .collect();
        Ok(columns)
    }

    async fn indexes(&self, _db_name: &str, table: &str) -> Result<Vec<NativeIndex>> {
        let started = Instant::now();
        let list: Vec<(String, i64, String)> = sqlx::query_as(INDEX_LIST_SQL)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;
        trace_sql(INDEX_LIST_SQL, started);

        let mut indexes = Vec::new();
        for (name, unique, origin) in list {
            // Implicit index backing the primary key; reported below.
            if origin == "pk" {
                continue;
            }
            let info: Vec<(i64, Option<String>)> = sqlx::query_as(INDEX_INFO_SQL)
                .bind(&name)
                .fetch_all(&self.pool)
                .await?;
            for (seqno, column_name) in info {
                let Some(column_name) = column_name else {
                    return Err(GrammarError::CatalogDrift {
                        table: table.to_string(),
                        index: name,
                        column: EXPRESSION.to_string(),
                    });
                };
                indexes.push(NativeIndex {
                    name: name.clone(),
                    column_name,
                    seq: usize::try_from(seqno + 1).unwrap_or_default(),
                    unique: unique != 0,
                });
            }
        }

        let primary: Vec<(String, i64)> = sqlx::query_as(PRIMARY_SQL)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;
        indexes.extend(primary.into_iter().map(|(column_name, pk)| NativeIndex {
            name: PRIMARY.to_string(),
            column_name,
            seq: usize::try_from(pk).unwrap_or_default(),
            unique: true,
        }));

        indexes.sort_by(|a, b| a.name.cmp(&b.name).then(a.seq.cmp(&b.seq)));
        Ok(indexes)
    }
}
