//! SQL dialects.
//!
//! A dialect renders column definitions, index clauses and DDL statements.
//! The defaults on these traits produce the generic (MySQL-flavoured) SQL;
//! a dialect overrides only what differs.

mod mysql;
mod sqlite;

pub use mysql::MySqlDialect;
pub use sqlite::SqliteDialect;

use crate::catalog::NativeColumn;
use crate::error::{GrammarError, Result};
use crate::quoter::Quoter;
use crate::schema::{Column, ColumnType, Index, IndexKind, Primary, Table};
use crate::types::TypeRegistry;

/// Renders column types and column definitions.
pub trait ColumnRenderer: Quoter {
    /// The dialect's type registry.
    fn types(&self) -> &TypeRegistry;

    /// Length used when a column declares none.
    fn default_length(&self, column_type: &ColumnType) -> Option<u32> {
        match column_type {
            ColumnType::String | ColumnType::Other(_) => Some(255),
            ColumnType::Uuid => Some(36),
            _ => None,
        }
    }

    /// Renders the native type token with its arguments, e.g. `VARCHAR(36)`.
    fn column_type(&self, column: &Column) -> String {
        let ty = &column.column_type;
        let native = self.types().native_for(ty);

        if *ty == ColumnType::Enum && !column.options.is_empty() {
            let options: Vec<String> = column.options.iter().map(|o| self.val(o)).collect();
            return format!("{native}({})", options.join(","));
        }

        let length = column
            .length
            .filter(|_| ty.accepts_length())
            .or_else(|| self.default_length(ty));
        if let Some(length) = length {
            // BLOB(n) reads back without its length.
            if *ty == ColumnType::Binary {
                return format!("VARBINARY({length})");
            }
            return format!("{native}({length})");
        }
        if ty.accepts_precision() {
            if let Some(precision) = column.precision {
                return match column.scale {
                    Some(scale) => format!("{native}({precision},{scale})"),
                    None => format!("{native}({precision})"),
                };
            }
        }
        if ty.accepts_datetime_precision() {
            if let Some(precision) = column.datetime_precision {
                return format!("{native}({precision})");
            }
        }
        native.to_string()
    }

    /// Renders a full column definition for `CREATE TABLE` / `ALTER TABLE`.
    fn column_definition(&self, column: &Column) -> String {
        let mut parts = vec![self.id(&column.name), self.column_type(column)];

        if column.unsigned
            && (column.column_type.is_integer() || column.column_type.accepts_precision())
        {
            parts.push("UNSIGNED".to_string());
        }
        if let Some(charset) = &column.charset {
            parts.push(format!("CHARACTER SET {charset}"));
        }
        if let Some(collation) = &column.collation {
            parts.push(format!("COLLATE {collation}"));
        }
        parts.push(if column.nullable { "NULL" } else { "NOT NULL" }.to_string());
        if let Some(default) = &column.default {
            parts.push(format!("DEFAULT {}", default.to_sql(self)));
        }
        if column.is_auto_increment() {
            parts.push("AUTO_INCREMENT".to_string());
        }
        if let Some(comment) = &column.comment {
            parts.push(format!("COMMENT {}", self.val(comment)));
        }

        parts.join(" ")
    }
}

/// Renders index and primary-key clauses.
pub trait IndexRenderer: Quoter {
    /// Clause placed inside `CREATE TABLE (...)`. May be empty.
    fn index_clause(&self, index: &Index) -> String {
        let columns = self.ids(&index.columns);
        match index.kind {
            IndexKind::Primary => format!("PRIMARY KEY ({columns})"),
            _ if index.is_unique() => {
                format!("UNIQUE KEY {} ({columns})", self.id(&index.name))
            }
            _ => format!("KEY {} ({columns})", self.id(&index.name)),
        }
    }

    /// Primary-key clause. May be empty when the key is declared inline.
    fn primary_clause(&self, primary: &Primary, _columns: &[Column]) -> String {
        if primary.columns.is_empty() {
            return String::new();
        }
        format!("PRIMARY KEY ({})", self.ids(&primary.columns))
    }

    /// Statements run after `CREATE TABLE` to build indexes the dialect
    /// cannot declare inline.
    fn deferred_index_statements(&self, _table: &str, _indexes: &[Index]) -> Vec<String> {
        Vec::new()
    }

    /// Creates one index on an existing table.
    fn create_index_sql(&self, table: &str, index: &Index) -> String {
        format!("ALTER TABLE {} ADD {}", self.id(table), self.index_clause(index))
    }

    /// Drops one index.
    fn drop_index_sql(&self, table: &str, name: &str) -> String {
        format!("ALTER TABLE {} DROP INDEX {}", self.id(table), self.id(name))
    }
}

/// A complete SQL dialect.
pub trait Dialect: ColumnRenderer + IndexRenderer {
    /// Driver identifier, e.g. `mysql`.
    fn driver(&self) -> &'static str;

    /// Index name the catalog uses for the primary key.
    fn primary_sentinel(&self) -> &'static str {
        "PRIMARY"
    }

    /// Storage options appended after the closing parenthesis.
    fn table_options(&self, _table: &Table) -> String {
        String::new()
    }

    /// Assembles the body fragments of a `CREATE TABLE`: column definitions,
    /// then the primary key, then index clauses. Empty fragments are skipped.
    fn table_fragments(
        &self,
        columns: &[Column],
        primary: Option<&Primary>,
        indexes: &[Index],
    ) -> Vec<String> {
        let mut fragments: Vec<String> =
            columns.iter().map(|c| self.column_definition(c)).collect();
        if let Some(primary) = primary {
            fragments.push(self.primary_clause(primary, columns));
        }
        fragments.extend(indexes.iter().map(|i| self.index_clause(i)));
        fragments.retain(|f| !f.is_empty());
        fragments
    }

    /// Renders `CREATE TABLE name (...) options`.
    fn create_table_sql(&self, name: &str, table: &Table, fragments: &[String]) -> String {
        let mut sql = format!(
            "CREATE TABLE {} (\n  {}\n)",
            self.id(name),
            fragments.join(",\n  ")
        );
        let options = self.table_options(table);
        if !options.is_empty() {
            sql.push(' ');
            sql.push_str(&options);
        }
        sql
    }

    fn add_column_sql(&self, table: &str, column: &Column) -> String {
        format!(
            "ALTER TABLE {} ADD {}",
            self.id(table),
            self.column_definition(column)
        )
    }

    /// Statements redefining an existing column. `table` is the current
    /// catalog state.
    fn modify_column_sql(&self, table: &Table, column: &Column) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} MODIFY {}",
            self.id(&table.name),
            self.column_definition(column)
        )]
    }

    /// Renames a column; `column` already carries the new name.
    fn rename_column_sql(&self, table: &str, from: &str, column: &Column) -> String {
        format!(
            "ALTER TABLE {} CHANGE COLUMN {} {}",
            self.id(table),
            self.id(from),
            self.column_definition(column)
        )
    }

    fn drop_column_sql(&self, table: &str, name: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.id(table),
            self.id(name)
        )
    }

    fn drop_table_sql(&self, name: &str, if_exists: bool) -> String {
        let mut sql = String::from("DROP TABLE ");
        if if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.id(name));
        sql
    }

    fn rename_table_sql(&self, from: &str, to: &str) -> String {
        format!("ALTER TABLE {} RENAME {}", self.id(from), self.id(to))
    }

    /// Database named by the DSN, if any.
    fn database_from_dsn(&self, dsn: &str) -> Result<Option<String>> {
        let url = url::Url::parse(dsn).map_err(|e| GrammarError::InvalidDsn {
            dsn: dsn.to_string(),
            message: e.to_string(),
        })?;
        let name = url.path().trim_start_matches('/');
        Ok((!name.is_empty()).then(|| name.to_string()))
    }

    /// Schema name for a database. MySQL treats them as the same thing.
    fn schema_name(&self, db_name: &str) -> String {
        db_name.to_string()
    }

    /// Adjusts the canonical type inferred from the registry.
    fn refine_type(&self, _native: &NativeColumn, column_type: ColumnType) -> ColumnType {
        column_type
    }
}

/// Aligns column-level primary flags with the table's primary key: a single
/// key column is flagged, members of a composite key are not.
pub(crate) fn align_primary_flags(columns: &mut [Column], primary: Option<&Primary>) {
    for column in columns.iter_mut() {
        column.primary = match primary {
            Some(p) if p.columns.len() == 1 => p.columns[0] == column.name,
            _ => false,
        };
    }
}
