//! Command batches → DDL.

use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::command::{notify, Command, CommandKind};
use crate::dialect::{align_primary_flags, Dialect};
use crate::error::{GrammarError, Result};
use crate::schema::{Column, Primary, Table};

use super::SqlGrammar;

const CREATE_TABLE: &str = "CreateTable";
const ALTER_TABLE: &str = "AlterTable";

/// Statements of a create, the commands they consume and the commands left out.
type CreatePlan = (Result<Vec<String>>, Vec<Command>, Vec<Command>);

/// Fails unless every name in `names` is a column of `columns`.
fn check_columns<'a, I>(table: &str, columns: &[Column], names: I) -> Result<()>
where
    I: IntoIterator<Item = &'a String>,
{
    for name in names {
        if !columns.iter().any(|c| &c.name == name) {
            return Err(GrammarError::ColumnNotFound {
                table: table.to_string(),
                column: name.clone(),
            });
        }
    }
    Ok(())
}

impl<D: Dialect, C: Catalog> SqlGrammar<D, C> {
    /// Renders the statements creating `table` from its queued commands.
    /// Returns the statements and the commands they consume; every other
    /// command is returned separately. Keys naming an undeclared column fail
    /// before any SQL is rendered.
    pub(crate) fn plan_create(&self, table: &Table, commands: Vec<Command>) -> CreatePlan {
        let mut columns = Vec::new();
        let mut indexes = Vec::new();
        let mut primary: Option<Primary> = None;
        let mut consumed = Vec::new();
        let mut ignored = Vec::new();

        for command in commands {
            match &command.kind {
                CommandKind::AddColumn(column) => {
                    let mut column = column.clone();
                    column.table_name.clone_from(&table.name);
                    column.db_name.clone_from(&self.db_name);
                    columns.push(column);
                }
                CommandKind::CreateIndex(index) => {
                    let mut index = index.clone();
                    index.table_name.clone_from(&table.name);
                    indexes.push(index);
                }
                CommandKind::CreatePrimary(p) => primary = Some(p.clone()),
                _ => {
                    ignored.push(command);
                    continue;
                }
            }
            consumed.push(command);
        }

        let primary = primary.or_else(|| {
            let keys: Vec<String> = columns
                .iter()
                .filter(|c| c.primary || c.is_auto_increment())
                .map(|c| c.name.clone())
                .collect();
            (!keys.is_empty()).then(|| Primary::new(keys))
        });
        let keys = indexes
            .iter()
            .flat_map(|i| i.columns.iter())
            .chain(primary.iter().flat_map(|p| p.columns.iter()));
        if let Err(err) = check_columns(&table.name, &columns, keys) {
            return (Err(err), consumed, ignored);
        }

        align_primary_flags(&mut columns, primary.as_ref());
        if let Some(primary) = &primary {
            for column in &mut columns {
                if primary.columns.contains(&column.name) {
                    column.nullable = false;
                }
            }
        }

        let fragments = self
            .dialect
            .table_fragments(&columns, primary.as_ref(), &indexes);
        let mut statements = vec![self.dialect.create_table_sql(&table.name, table, &fragments)];
        statements.extend(self.dialect.deferred_index_statements(&table.name, &indexes));

        (Ok(statements), consumed, ignored)
    }

    /// Create path: one `CREATE TABLE` (plus deferred index statements, run
    /// in the same transaction where the engine allows it).
    pub(crate) async fn create(&self, table: &mut Table) -> Result<()> {
        let commands = std::mem::take(&mut table.commands);
        let (statements, consumed, ignored) = self.plan_create(table, commands);

        for command in ignored {
            let verb = command.verb();
            command.complete(Err(&GrammarError::NotApplicable {
                verb,
                path: CREATE_TABLE,
            }));
        }

        info!(table = %table.name, commands = consumed.len(), "Creating table");
        let callbacks: Vec<_> = consumed
            .into_iter()
            .map(|command| command.into_parts().1)
            .collect();
        let mut outcome = match statements {
            Ok(statements) => self.catalog.execute_atomic(&statements).await,
            Err(err) => Err(err),
        };
        if outcome.is_ok() {
            outcome = self.load_table(table).await;
        }

        for callback in callbacks {
            notify(callback, outcome.as_ref().map(|_| ()));
        }
        outcome
    }

    /// Alter path: each command runs on its own, in order, and the table is
    /// re-read after every successful statement.
    pub(crate) async fn alter(&self, table: &mut Table) -> Result<()> {
        let commands = std::mem::take(&mut table.commands);
        info!(table = %table.name, commands = commands.len(), "Altering table");

        if let Err(err) = self.load_table(table).await {
            for command in commands {
                command.complete(Err(&err));
            }
            return Err(err);
        }

        let mut errors = Vec::new();
        for command in commands {
            let verb = command.verb();
            let target = command.target().map(str::to_string);
            let (kind, callback) = command.into_parts();

            if let CommandKind::CreatePrimary(_) = kind {
                notify(
                    callback,
                    Err(&GrammarError::NotApplicable {
                        verb,
                        path: ALTER_TABLE,
                    }),
                );
                continue;
            }

            match self.apply(table, &kind).await {
                Ok(()) => notify(callback, Ok(())),
                Err(source) => {
                    let err = GrammarError::command(verb, target, source);
                    warn!(table = %table.name, error = %err, "Alter command failed");
                    notify(callback, Err(&err));
                    errors.push(err);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(GrammarError::Multiple(errors))
        }
    }

    async fn apply(&self, table: &mut Table, kind: &CommandKind) -> Result<()> {
        match kind {
            CommandKind::AddColumn(column) => {
                let sql = self.dialect.add_column_sql(&table.name, column);
                self.exec_and_refresh(table, &sql).await
            }
            CommandKind::ChangeColumn(column) => {
                if !table.has_column(&column.name) {
                    return Err(GrammarError::ColumnNotFound {
                        table: table.name.clone(),
                        column: column.name.clone(),
                    });
                }
                let statements = self.dialect.modify_column_sql(table, column);
                self.catalog.execute_atomic(&statements).await?;
                self.load_table(table).await
            }
            CommandKind::RenameColumn { from, to } => {
                let Some(position) = table.columns.iter().position(|c| &c.name == from) else {
                    return Err(GrammarError::ColumnNotFound {
                        table: table.name.clone(),
                        column: from.clone(),
                    });
                };
                table.columns[position].name.clone_from(to);
                let sql = self
                    .dialect
                    .rename_column_sql(&table.name, from, &table.columns[position]);
                match self.catalog.execute(&sql).await {
                    Ok(()) => self.load_table(table).await,
                    Err(err) => {
                        table.columns[position].name.clone_from(from);
                        Err(err)
                    }
                }
            }
            CommandKind::DropColumn(name) => {
                let sql = self.dialect.drop_column_sql(&table.name, name);
                self.exec_and_refresh(table, &sql).await
            }
            CommandKind::CreateIndex(index) => {
                check_columns(&table.name, &table.columns, &index.columns)?;
                let sql = self.dialect.create_index_sql(&table.name, index);
                self.exec_and_refresh(table, &sql).await
            }
            CommandKind::DropIndex(name) => {
                let sql = self.dialect.drop_index_sql(&table.name, name);
                self.exec_and_refresh(table, &sql).await
            }
            CommandKind::RenameIndex { from, to } => {
                let Some(mut index) = table.index(from).cloned() else {
                    return Err(GrammarError::IndexNotFound {
                        table: table.name.clone(),
                        index: from.clone(),
                    });
                };
                check_columns(&table.name, &table.columns, &index.columns)?;
                // Two separate statements: a failed create leaves the old
                // index dropped.
                let drop = self.dialect.drop_index_sql(&table.name, from);
                self.exec_and_refresh(table, &drop).await?;
                index.name.clone_from(to);
                let create = self.dialect.create_index_sql(&table.name, &index);
                self.exec_and_refresh(table, &create).await
            }
            CommandKind::CreatePrimary(_) => Err(GrammarError::NotApplicable {
                verb: "CreatePrimary",
                path: ALTER_TABLE,
            }),
        }
    }

    async fn exec_and_refresh(&self, table: &mut Table, sql: &str) -> Result<()> {
        self.catalog.execute(sql).await?;
        self.load_table(table).await
    }
}
