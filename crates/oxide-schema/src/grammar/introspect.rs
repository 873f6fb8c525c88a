//! Catalog rows → canonical [`Table`].

use crate::catalog::{Catalog, NativeColumn, NativeIndex, TableInfo};
use crate::dialect::Dialect;
use crate::error::{GrammarError, Result};
use crate::schema::{Column, ColumnType, Index, IndexKind, Primary, Table};
use crate::types::{parse_quoted_list, type_hint, NativeType};

use super::SqlGrammar;

impl<D: Dialect, C: Catalog> SqlGrammar<D, C> {
    /// Re-reads `table` from the catalog.
    pub(crate) async fn load_table(&self, table: &mut Table) -> Result<()> {
        let native_columns = self.catalog.columns(&self.db_name, &table.name).await?;
        if native_columns.is_empty() {
            return Err(GrammarError::TableNotFound(table.name.clone()));
        }
        let native_indexes = self.catalog.indexes(&self.db_name, &table.name).await?;
        let info = self.catalog.table_info(&self.db_name, &table.name).await?;

        let columns = native_columns
            .iter()
            .map(|native| translate_column(&self.dialect, native))
            .collect();
        assemble(table, columns, native_indexes, self.dialect.primary_sentinel())?;

        table.db_name.clone_from(&self.db_name);
        table.schema_name.clone_from(&self.schema_name);
        for column in &mut table.columns {
            column.db_name.clone_from(&self.db_name);
        }
        for index in &mut table.indexes {
            index.db_name.clone_from(&self.db_name);
        }
        if let Some(primary) = &mut table.primary {
            primary.db_name.clone_from(&self.db_name);
        }
        if let Some(info) = info {
            apply_info(table, info);
        }
        Ok(())
    }
}

fn apply_info(table: &mut Table, info: TableInfo) {
    table.engine = info.engine;
    table.charset = info.charset;
    table.collation = info.collation;
    table.rows = info.rows;
    table.comment = info.comment;
    table.create_time = info.create_time;
}

/// Translates one catalog row into a canonical column.
pub(crate) fn translate_column<D: Dialect + ?Sized>(dialect: &D, native: &NativeColumn) -> Column {
    let parsed = NativeType::parse(&native.type_name);
    let inferred = dialect
        .types()
        .to_canonical(&native.type_name)
        .unwrap_or(ColumnType::Text);
    let mut column_type = dialect.refine_type(native, inferred);
    if let Some(hinted) = native.comment.as_deref().and_then(type_hint) {
        column_type = hinted;
    }

    let mut column = Column::new(native.name.clone(), column_type.clone());
    column.position = native.position;
    column.nullable = native.nullable;
    column.unsigned =
        parsed.unsigned && (column_type.is_integer() || column_type.accepts_precision());
    match parsed.args.as_slice() {
        [length] if column_type.accepts_length() => column.length = Some(*length),
        [precision] if column_type.accepts_precision() => column.precision = Some(*precision),
        [precision, scale] if column_type.accepts_precision() => {
            column.precision = Some(*precision);
            column.scale = Some(*scale);
        }
        [precision] if column_type.accepts_datetime_precision() && *precision > 0 => {
            column.datetime_precision = Some(*precision);
        }
        _ => {}
    }
    if column_type == ColumnType::Enum {
        column.options = enum_options(native, &parsed);
    }
    column.default.clone_from(&native.default);
    column.extra.clone_from(&native.extra);
    column.charset.clone_from(&native.charset);
    column.collation.clone_from(&native.collation);
    column.comment.clone_from(&native.comment);
    column
}

/// Allowed values from an `enum('a','b')` declaration or an `IN (...)` check.
fn enum_options(native: &NativeColumn, parsed: &NativeType) -> Vec<String> {
    if parsed.base == "ENUM" {
        if let Some(raw) = &parsed.raw_args {
            return parse_quoted_list(raw);
        }
    }
    native
        .check
        .as_deref()
        .map(parse_quoted_list)
        .unwrap_or_default()
}

/// Attaches index rows to columns, classifies the indexes and extracts the
/// primary key. `table` is only modified when every row resolves.
pub(crate) fn assemble(
    table: &mut Table,
    mut columns: Vec<Column>,
    mut rows: Vec<NativeIndex>,
    primary_sentinel: &str,
) -> Result<()> {
    rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.seq.cmp(&b.seq)));

    let mut indexes: Vec<Index> = Vec::new();
    for row in rows {
        let Some(column) = columns.iter_mut().find(|c| c.name == row.column_name) else {
            return Err(GrammarError::CatalogDrift {
                table: table.name.clone(),
                index: row.name,
                column: row.column_name,
            });
        };
        if !column.indexes.contains(&row.name) {
            column.indexes.push(row.name.clone());
        }

        let position = match indexes.iter().position(|i| i.name == row.name) {
            Some(position) => position,
            None => {
                let kind = if row.name == primary_sentinel {
                    IndexKind::Primary
                } else if row.unique {
                    IndexKind::Unique
                } else {
                    IndexKind::Index
                };
                indexes.push(Index {
                    table_name: table.name.clone(),
                    name: row.name.clone(),
                    kind,
                    unique: row.unique || kind == IndexKind::Primary,
                    ..Index::default()
                });
                indexes.len() - 1
            }
        };
        indexes[position].columns.push(row.column_name);
    }

    let mut primary = None;
    if let Some(position) = indexes.iter().position(|i| i.kind == IndexKind::Primary) {
        let index = indexes.remove(position);
        for column in &mut columns {
            if index.columns.contains(&column.name) {
                column.primary = true;
                column.indexes.clear();
            }
        }
        primary = Some(Primary {
            db_name: index.db_name,
            table_name: table.name.clone(),
            name: index.name,
            columns: index.columns,
        });
    }

    for column in &mut columns {
        column.table_name.clone_from(&table.name);
    }
    table.columns = columns;
    table.indexes = indexes;
    table.primary = primary;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySqlDialect, SqliteDialect};
    use crate::schema::{DefaultValue, AUTO_INCREMENT};

    fn native(name: &str, type_name: &str) -> NativeColumn {
        NativeColumn {
            name: name.to_string(),
            position: 1,
            type_name: type_name.to_string(),
            nullable: true,
            ..NativeColumn::default()
        }
    }

    fn row(name: &str, column: &str, seq: usize, unique: bool) -> NativeIndex {
        NativeIndex {
            name: name.to_string(),
            column_name: column.to_string(),
            seq,
            unique,
        }
    }

    #[test]
    fn test_translate_mysql_types() {
        let d = MySqlDialect::new();

        let c = translate_column(&d, &native("id", "bigint unsigned"));
        assert_eq!(c.column_type, ColumnType::BigInteger);
        assert!(c.unsigned);

        let c = translate_column(&d, &native("flag", "tinyint(1)"));
        assert_eq!(c.column_type, ColumnType::Boolean);
        assert_eq!(c.length, None);

        let c = translate_column(&d, &native("n", "int(11)"));
        assert_eq!(c.column_type, ColumnType::Integer);
        assert_eq!(c.length, None);

        let c = translate_column(&d, &native("amount", "decimal(10,2)"));
        assert_eq!((c.precision, c.scale), (Some(10), Some(2)));

        let c = translate_column(&d, &native("name", "varchar(64)"));
        assert_eq!(c.length, Some(64));

        let c = translate_column(&d, &native("at", "datetime(6)"));
        assert_eq!(c.datetime_precision, Some(6));

        let c = translate_column(&d, &native("status", "enum('on','off')"));
        assert_eq!(c.column_type, ColumnType::Enum);
        assert_eq!(c.options, vec!["on", "off"]);

        let c = translate_column(&d, &native("digest", "varbinary(32)"));
        assert_eq!(c.column_type, ColumnType::Binary);
        assert_eq!(c.length, Some(32));

        let c = translate_column(&d, &native("shape", "geometry"));
        assert_eq!(c.column_type, ColumnType::Text);
    }

    #[test]
    fn test_comment_hint_overrides_inferred_type() {
        let d = SqliteDialect::new();
        let mut payload = native("payload", "TEXT");
        payload.comment = Some("T:json|raw body".to_string());
        assert_eq!(translate_column(&d, &payload).column_type, ColumnType::Json);

        let mut id = native("uuid", "VARCHAR(36)");
        id.comment = Some("T:uuid".to_string());
        let c = translate_column(&d, &id);
        assert_eq!(c.column_type, ColumnType::Uuid);
        assert_eq!(c.length, None);

        let mut status = native("status", "TEXT");
        status.comment = Some("T:enum".to_string());
        status.check = Some("'a','b'".to_string());
        let c = translate_column(&d, &status);
        assert_eq!(c.column_type, ColumnType::Enum);
        assert_eq!(c.options, vec!["a", "b"]);

        let mut unknown = native("x", "TEXT");
        unknown.comment = Some("T:bogus".to_string());
        assert_eq!(translate_column(&d, &unknown).column_type, ColumnType::Text);
    }

    #[test]
    fn test_translate_sqlite_autoincrement() {
        let d = SqliteDialect::new();
        let mut id = native("id", "INTEGER");
        id.nullable = false;
        id.extra = Some(AUTO_INCREMENT.to_string());
        id.default = Some(DefaultValue::Null);
        let c = translate_column(&d, &id);
        assert_eq!(c.column_type, ColumnType::BigInteger);
        assert!(c.is_auto_increment());
        assert!(!c.nullable);
    }

    #[test]
    fn test_assemble_extracts_primary() {
        let mut table = Table::new("users");
        let columns = vec![
            Column::new("id", ColumnType::BigInteger),
            Column::new("email", ColumnType::String),
            Column::new("name", ColumnType::String),
        ];
        let rows = vec![
            row("idx_name", "name", 1, false),
            row("PRIMARY", "id", 1, true),
            row("uniq_email", "email", 1, true),
            row("idx_name", "email", 2, false),
        ];
        assemble(&mut table, columns, rows, "PRIMARY").unwrap();

        let primary = table.primary.as_ref().unwrap();
        assert_eq!(primary.columns, vec!["id"]);
        assert!(table.column("id").unwrap().primary);
        assert!(table.column("id").unwrap().indexes.is_empty());
        assert!(!table.has_index("PRIMARY"));

        let idx = table.index("idx_name").unwrap();
        assert_eq!(idx.kind, IndexKind::Index);
        assert_eq!(idx.columns, vec!["name", "email"]);
        assert_eq!(table.index("uniq_email").unwrap().kind, IndexKind::Unique);

        let email = table.column("email").unwrap();
        assert_eq!(email.indexes, vec!["idx_name", "uniq_email"]);
    }

    #[test]
    fn test_assemble_composite_primary_in_sequence_order() {
        let mut table = Table::new("t");
        let columns = vec![
            Column::new("a", ColumnType::Integer),
            Column::new("b", ColumnType::Integer),
        ];
        let rows = vec![row("PRIMARY", "a", 2, true), row("PRIMARY", "b", 1, true)];
        assemble(&mut table, columns, rows, "PRIMARY").unwrap();
        assert_eq!(table.primary.unwrap().columns, vec!["b", "a"]);
    }

    #[test]
    fn test_assemble_catalog_drift() {
        let mut table = Table::new("t");
        table.push_column(Column::new("keep", ColumnType::Integer));
        let columns = vec![Column::new("a", ColumnType::Integer)];
        let rows = vec![row("idx", "ghost", 1, false)];

        let err = assemble(&mut table, columns, rows, "PRIMARY").unwrap_err();
        assert!(matches!(
            err,
            GrammarError::CatalogDrift { ref column, .. } if column == "ghost"
        ));
        assert_eq!(table.column_names(), vec!["keep"]);
    }
}
