//! SQLite dialect.
//!
//! SQLite has no inline index clauses, no `MODIFY` and no native column
//! comments. Indexes become standalone `CREATE INDEX` statements, a column
//! redefinition is a table rebuild, and comments are kept as a block comment
//! right after the column name in the stored `CREATE TABLE` text.

use crate::catalog::NativeColumn;
use crate::error::Result;
use crate::quoter::Quoter;
use crate::schema::{Column, ColumnType, Index, Primary, Table};
use crate::types::TypeRegistry;

use super::{align_primary_flags, ColumnRenderer, Dialect, IndexRenderer};

/// SQLite dialect.
#[derive(Debug, Clone)]
pub struct SqliteDialect {
    types: TypeRegistry,
}

impl Default for SqliteDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub fn new() -> Self {
        let types = TypeRegistry::new(
            "VARCHAR",
            &[
                (ColumnType::BigInteger, "BIGINT"),
                (ColumnType::Integer, "INTEGER"),
                (ColumnType::SmallInteger, "SMALLINT"),
                (ColumnType::TinyInteger, "TINYINT"),
                (ColumnType::MediumInteger, "MEDIUMINT"),
                (ColumnType::Decimal, "DECIMAL"),
                (ColumnType::Float, "FLOAT"),
                (ColumnType::Double, "DOUBLE"),
                (ColumnType::String, "VARCHAR"),
                (ColumnType::Char, "CHAR"),
                (ColumnType::Text, "TEXT"),
                (ColumnType::MediumText, "TEXT"),
                (ColumnType::LongText, "TEXT"),
                (ColumnType::Date, "DATE"),
                (ColumnType::DateTime, "DATETIME"),
                (ColumnType::DateTimeTz, "DATETIME"),
                (ColumnType::Time, "TIME"),
                (ColumnType::TimeTz, "TIME"),
                (ColumnType::Timestamp, "TIMESTAMP"),
                (ColumnType::TimestampTz, "TIMESTAMP"),
                (ColumnType::Boolean, "BOOLEAN"),
                (ColumnType::Binary, "BLOB"),
                (ColumnType::Json, "TEXT"),
                (ColumnType::Jsonb, "TEXT"),
                (ColumnType::Enum, "TEXT"),
                (ColumnType::Uuid, "VARCHAR"),
                (ColumnType::Year, "SMALLINT"),
            ],
        )
        .with_alias("INT", ColumnType::Integer)
        .with_alias("UNSIGNED BIG INT", ColumnType::BigInteger)
        .with_alias("CHARACTER", ColumnType::Char)
        .with_alias("NUMERIC", ColumnType::Decimal)
        .with_alias("REAL", ColumnType::Double)
        .with_alias("CLOB", ColumnType::Text)
        .with_alias("NVARCHAR", ColumnType::String);

        Self { types }
    }

    /// Whether the column carries `PRIMARY KEY` in its own definition.
    fn is_inline_primary(column: &Column) -> bool {
        column.primary || column.is_auto_increment()
    }

    fn shadow_name(table: &str) -> String {
        format!("_{table}_rebuild")
    }
}

impl Quoter for SqliteDialect {
    fn quote_char(&self) -> char {
        '"'
    }
}

impl ColumnRenderer for SqliteDialect {
    fn types(&self) -> &TypeRegistry {
        &self.types
    }

    fn default_length(&self, column_type: &ColumnType) -> Option<u32> {
        match column_type {
            ColumnType::Uuid => Some(36),
            _ => None,
        }
    }

    fn column_type(&self, column: &Column) -> String {
        if column.is_auto_increment() {
            return "INTEGER".to_string();
        }
        match column.column_type {
            ColumnType::BigInteger if column.unsigned => "UNSIGNED BIG INT".to_string(),
            ColumnType::Enum => {
                let options: Vec<String> = column.options.iter().map(|o| self.val(o)).collect();
                if options.is_empty() {
                    "TEXT".to_string()
                } else {
                    format!("TEXT CHECK( {} IN ({}) )", self.id(&column.name), options.join(","))
                }
            }
            _ => {
                let ty = &column.column_type;
                let native = self.types.native_for(ty);
                let length = column
                    .length
                    .filter(|_| ty.accepts_length())
                    .or_else(|| self.default_length(ty));
                match (length, column.precision, column.scale, column.datetime_precision) {
                    (Some(length), ..) => format!("{native}({length})"),
                    (None, Some(p), Some(s), _) if ty.accepts_precision() => {
                        format!("{native}({p},{s})")
                    }
                    (None, Some(p), None, _) if ty.accepts_precision() => format!("{native}({p})"),
                    (None, _, _, Some(p)) if ty.accepts_datetime_precision() => {
                        format!("{native}({p})")
                    }
                    _ => native.to_string(),
                }
            }
        }
    }

    fn column_definition(&self, column: &Column) -> String {
        let mut parts = vec![self.id(&column.name)];

        if let Some(comment) = &column.comment {
            parts.push(format!("/* {} */", comment.replace("*/", "* /")));
        }
        let native = self.column_type(column);
        // Only an INTEGER key is a rowid alias; any other key accepts NULL
        // unless told otherwise.
        let rowid_alias = native == "INTEGER";
        parts.push(native);

        if Self::is_inline_primary(column) {
            parts.push("PRIMARY KEY".to_string());
            if column.is_auto_increment() {
                parts.push("AUTOINCREMENT".to_string());
            }
            if !column.nullable && !rowid_alias {
                parts.push("NOT NULL".to_string());
            }
        } else if column.nullable {
            parts.push("NULL".to_string());
        } else {
            parts.push("NOT NULL".to_string());
        }
        if let Some(default) = &column.default {
            parts.push(format!("DEFAULT {}", default.to_sql(self)));
        }
        if let Some(collation) = &column.collation {
            parts.push(format!("COLLATE {collation}"));
        }

        parts.join(" ")
    }
}

impl IndexRenderer for SqliteDialect {
    /// Indexes are never declared inside `CREATE TABLE`.
    fn index_clause(&self, _index: &Index) -> String {
        String::new()
    }

    fn primary_clause(&self, primary: &Primary, columns: &[Column]) -> String {
        let inline = columns
            .iter()
            .any(|c| Self::is_inline_primary(c) && primary.columns.contains(&c.name));
        if inline || primary.columns.is_empty() {
            return String::new();
        }
        format!("PRIMARY KEY ({})", self.ids(&primary.columns))
    }

    fn deferred_index_statements(&self, table: &str, indexes: &[Index]) -> Vec<String> {
        indexes
            .iter()
            .map(|index| self.create_index_sql(table, index))
            .collect()
    }

    fn create_index_sql(&self, table: &str, index: &Index) -> String {
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.is_unique() { "UNIQUE " } else { "" },
            self.id(&index.name),
            self.id(table),
            self.ids(&index.columns)
        )
    }

    fn drop_index_sql(&self, _table: &str, name: &str) -> String {
        format!("DROP INDEX {}", self.id(name))
    }
}

impl Dialect for SqliteDialect {
    fn driver(&self) -> &'static str {
        "sqlite3"
    }

    fn add_column_sql(&self, table: &str, column: &Column) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.id(table),
            self.column_definition(column)
        )
    }

    /// Rebuilds the table around the redefined column: create a shadow
    /// table, copy the rows, drop the original, rename the shadow and
    /// recreate the indexes. Callers run these in one transaction.
    fn modify_column_sql(&self, table: &Table, column: &Column) -> Vec<String> {
        let mut columns: Vec<Column> = table
            .columns
            .iter()
            .map(|existing| {
                if existing.name == column.name {
                    let mut redefined = column.clone();
                    redefined.primary = existing.primary || column.primary;
                    redefined
                } else {
                    existing.clone()
                }
            })
            .collect();
        align_primary_flags(&mut columns, table.primary.as_ref());

        let shadow = Self::shadow_name(&table.name);
        let fragments = self.table_fragments(&columns, table.primary.as_ref(), &[]);
        let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
        let names = self.ids(&names);

        let mut statements = vec![
            self.create_table_sql(&shadow, table, &fragments),
            format!(
                "INSERT INTO {} ({names}) SELECT {names} FROM {}",
                self.id(&shadow),
                self.id(&table.name)
            ),
            self.drop_table_sql(&table.name, false),
            format!(
                "ALTER TABLE {} RENAME TO {}",
                self.id(&shadow),
                self.id(&table.name)
            ),
        ];
        statements.extend(self.deferred_index_statements(&table.name, &table.indexes));
        statements
    }

    fn rename_column_sql(&self, table: &str, from: &str, column: &Column) -> String {
        format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.id(table),
            self.id(from),
            self.id(&column.name)
        )
    }

    fn rename_table_sql(&self, from: &str, to: &str) -> String {
        format!("ALTER TABLE {} RENAME TO {}", self.id(from), self.id(to))
    }

    /// SQLite always works on the `main` schema.
    fn database_from_dsn(&self, _dsn: &str) -> Result<Option<String>> {
        Ok(Some("main".to_string()))
    }

    /// Auto-increment columns are rowid aliases, which are 64-bit.
    fn refine_type(&self, native: &NativeColumn, column_type: ColumnType) -> ColumnType {
        if column_type == ColumnType::Integer && native.extra.is_some() {
            return ColumnType::BigInteger;
        }
        column_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DefaultValue;

    #[test]
    fn test_autoincrement_forces_integer_primary_key() {
        let d = SqliteDialect::new();
        let id = Column::new("id", ColumnType::BigInteger)
            .unsigned()
            .not_null()
            .auto_increment()
            .primary();
        assert_eq!(d.column_type(&id), "INTEGER");
        assert_eq!(
            d.column_definition(&id),
            "\"id\" INTEGER PRIMARY KEY AUTOINCREMENT"
        );
    }

    #[test]
    fn test_non_integer_key_keeps_not_null() {
        let d = SqliteDialect::new();
        let code = Column::new("code", ColumnType::String)
            .length(10)
            .not_null()
            .primary();
        assert_eq!(
            d.column_definition(&code),
            "\"code\" VARCHAR(10) PRIMARY KEY NOT NULL"
        );

        let id = Column::new("id", ColumnType::Integer).not_null().primary();
        assert_eq!(d.column_definition(&id), "\"id\" INTEGER PRIMARY KEY");
    }

    #[test]
    fn test_native_spellings() {
        let d = SqliteDialect::new();
        let big = Column::new("n", ColumnType::BigInteger).unsigned();
        assert_eq!(d.column_type(&big), "UNSIGNED BIG INT");
        assert_eq!(d.column_type(&Column::new("u", ColumnType::Uuid)), "VARCHAR(36)");
        assert_eq!(d.column_type(&Column::new("j", ColumnType::Json)), "TEXT");
        assert_eq!(d.column_type(&Column::new("y", ColumnType::Year)), "SMALLINT");
        assert_eq!(d.column_type(&Column::new("s", ColumnType::String)), "VARCHAR");

        let status = Column::new("status", ColumnType::Enum).options(["a", "b"]);
        assert_eq!(
            d.column_type(&status),
            "TEXT CHECK( \"status\" IN ('a','b') )"
        );
    }

    #[test]
    fn test_column_definition_order() {
        let d = SqliteDialect::new();
        let column = Column::new("name", ColumnType::String)
            .length(20)
            .not_null()
            .default_value(DefaultValue::String("x".into()))
            .collation("NOCASE")
            .comment("T:string|display */ name");
        assert_eq!(
            d.column_definition(&column),
            "\"name\" /* T:string|display * / name */ VARCHAR(20) NOT NULL \
             DEFAULT 'x' COLLATE NOCASE"
        );
    }

    #[test]
    fn test_primary_clause_skipped_when_inline() {
        let d = SqliteDialect::new();
        let columns = vec![Column::new("id", ColumnType::Integer).auto_increment()];
        let fragments = d.table_fragments(
            &columns,
            Some(&Primary::new(["id"])),
            &[Index::new("idx_id", ["id"])],
        );
        assert_eq!(fragments, vec!["\"id\" INTEGER PRIMARY KEY AUTOINCREMENT"]);

        let columns = vec![
            Column::new("a", ColumnType::Integer).not_null(),
            Column::new("b", ColumnType::Integer).not_null(),
        ];
        let fragments = d.table_fragments(&columns, Some(&Primary::new(["a", "b"])), &[]);
        assert_eq!(fragments.last().unwrap(), "PRIMARY KEY (\"a\", \"b\")");
    }

    #[test]
    fn test_deferred_indexes() {
        let d = SqliteDialect::new();
        let statements = d.deferred_index_statements(
            "users",
            &[
                Index::unique("uniq_email", ["email"]),
                Index::new("idx_name", ["last", "first"]),
            ],
        );
        assert_eq!(
            statements,
            vec![
                "CREATE UNIQUE INDEX \"uniq_email\" ON \"users\" (\"email\")",
                "CREATE INDEX \"idx_name\" ON \"users\" (\"last\", \"first\")",
            ]
        );
        assert_eq!(d.drop_index_sql("users", "idx_name"), "DROP INDEX \"idx_name\"");
    }

    #[test]
    fn test_modify_column_rebuilds_table() {
        let d = SqliteDialect::new();
        let mut table = Table::new("users");
        table.push_column(Column::new("id", ColumnType::Integer).not_null().primary());
        table.push_column(Column::new("name", ColumnType::String));
        table.primary = Some(Primary::new(["id"]));
        table.push_index(Index::new("idx_name", ["name"]));

        let statements =
            d.modify_column_sql(&table, &Column::new("name", ColumnType::Text).not_null());
        assert_eq!(
            statements,
            vec![
                "CREATE TABLE \"_users_rebuild\" (\n  \"id\" INTEGER PRIMARY KEY,\n  \
                 \"name\" TEXT NOT NULL\n)",
                "INSERT INTO \"_users_rebuild\" (\"id\", \"name\") \
                 SELECT \"id\", \"name\" FROM \"users\"",
                "DROP TABLE \"users\"",
                "ALTER TABLE \"_users_rebuild\" RENAME TO \"users\"",
                "CREATE INDEX \"idx_name\" ON \"users\" (\"name\")",
            ]
        );
    }

    #[test]
    fn test_rename_statements() {
        let d = SqliteDialect::new();
        let column = Column::new("title", ColumnType::String);
        assert_eq!(
            d.rename_column_sql("posts", "name", &column),
            "ALTER TABLE \"posts\" RENAME COLUMN \"name\" TO \"title\""
        );
        assert_eq!(
            d.rename_table_sql("posts", "articles"),
            "ALTER TABLE \"posts\" RENAME TO \"articles\""
        );
    }
}
