//! Grammars: introspection, DDL synthesis and quoting for one connection.
//!
//! [`SqlGrammar`] is the shared engine. It pairs a [`Dialect`], which decides
//! what SQL looks like, with a [`Catalog`], which runs it and reads metadata
//! back. Concrete grammars are type aliases over it.

mod introspect;
mod mysql;
mod sqlite;
mod synthesize;

pub use mysql::MySqlGrammar;
pub use sqlite::SqliteGrammar;

use async_trait::async_trait;
use tracing::info;

use crate::catalog::Catalog;
use crate::dialect::Dialect;
use crate::error::{GrammarError, Result};
use crate::quoter::Quoter;
use crate::schema::Table;
use crate::types::TypeRegistry;
use crate::version::Version;

/// Dialect-specific schema operations on one connection.
#[async_trait]
pub trait Grammar: Send + Sync {
    /// Driver identifier.
    fn driver(&self) -> &'static str;

    /// Applies a DSN: derives the database and schema names from it.
    fn config(&mut self, dsn: &str) -> Result<()>;

    fn dsn(&self) -> &str;

    fn db_name(&self) -> &str;

    fn schema_name(&self) -> &str;

    /// Identifier and literal quoting for this dialect.
    fn quoter(&self) -> &dyn Quoter;

    /// Canonical/native type map for this dialect.
    fn types(&self) -> &TypeRegistry;

    /// Probes the server version.
    async fn version(&self) -> Result<Version>;

    async fn table_exists(&self, name: &str) -> Result<bool>;

    /// Loads columns, indexes, primary key and storage metadata into `table`,
    /// replacing what it held. Pending commands are left untouched.
    async fn get_table(&self, table: &mut Table) -> Result<()>;

    /// Creates the table from its `AddColumn`, `CreateIndex` and
    /// `CreatePrimary` commands in a single statement.
    async fn create_table(&self, table: &mut Table) -> Result<()>;

    /// Applies the pending commands one by one. Failures do not stop the
    /// batch; they are collected into [`GrammarError::Multiple`].
    async fn alter_table(&self, table: &mut Table) -> Result<()>;

    async fn drop_table(&self, name: &str) -> Result<()>;

    async fn drop_table_if_exists(&self, name: &str) -> Result<()>;

    /// Renames a table.
    async fn rename(&self, from: &str, to: &str) -> Result<()>;
}

/// Grammar engine shared by every dialect.
#[derive(Debug)]
pub struct SqlGrammar<D, C> {
    dialect: D,
    catalog: C,
    dsn: String,
    db_name: String,
    schema_name: String,
}

impl<D: Dialect, C: Catalog> SqlGrammar<D, C> {
    /// Creates an unconfigured grammar.
    pub fn new(dialect: D, catalog: C) -> Self {
        Self {
            dialect,
            catalog,
            dsn: String::new(),
            db_name: String::new(),
            schema_name: String::new(),
        }
    }

    #[must_use]
    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    #[must_use]
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Resolves the database name from the live connection when the DSN did
    /// not name one, and checks the connection answers.
    pub async fn on_connected(&mut self) -> Result<()> {
        let driver = self.dialect.driver();
        let current = self
            .catalog
            .current_database()
            .await
            .map_err(|e| GrammarError::OnConnected {
                driver: driver.to_string(),
                message: e.to_string(),
            })?;

        if self.db_name.is_empty() {
            let name = current.ok_or_else(|| GrammarError::OnConnected {
                driver: driver.to_string(),
                message: "no database selected".to_string(),
            })?;
            self.schema_name = self.dialect.schema_name(&name);
            self.db_name = name;
        }

        info!(driver = %driver, database = %self.db_name, "Grammar connected");
        Ok(())
    }
}

#[async_trait]
impl<D, C> Grammar for SqlGrammar<D, C>
where
    D: Dialect,
    C: Catalog,
{
    fn driver(&self) -> &'static str {
        self.dialect.driver()
    }

    fn config(&mut self, dsn: &str) -> Result<()> {
        let db_name = self.dialect.database_from_dsn(dsn)?.unwrap_or_default();
        self.schema_name = if db_name.is_empty() {
            String::new()
        } else {
            self.dialect.schema_name(&db_name)
        };
        self.db_name = db_name;
        self.dsn = dsn.to_string();
        Ok(())
    }

    fn dsn(&self) -> &str {
        &self.dsn
    }

    fn db_name(&self) -> &str {
        &self.db_name
    }

    fn schema_name(&self) -> &str {
        &self.schema_name
    }

    fn quoter(&self) -> &dyn Quoter {
        &self.dialect
    }

    fn types(&self) -> &TypeRegistry {
        self.dialect.types()
    }

    async fn version(&self) -> Result<Version> {
        let raw = self.catalog.version().await?;
        Version::parse(self.dialect.driver(), &raw)
    }

    async fn table_exists(&self, name: &str) -> Result<bool> {
        self.catalog.table_exists(&self.db_name, name).await
    }

    async fn get_table(&self, table: &mut Table) -> Result<()> {
        self.load_table(table).await
    }

    async fn create_table(&self, table: &mut Table) -> Result<()> {
        self.create(table).await
    }

    async fn alter_table(&self, table: &mut Table) -> Result<()> {
        self.alter(table).await
    }

    async fn drop_table(&self, name: &str) -> Result<()> {
        let sql = self.dialect.drop_table_sql(name, false);
        self.catalog.execute(&sql).await
    }

    async fn drop_table_if_exists(&self, name: &str) -> Result<()> {
        let sql = self.dialect.drop_table_sql(name, true);
        self.catalog.execute(&sql).await
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let sql = self.dialect.rename_table_sql(from, to);
        self.catalog.execute(&sql).await
    }
}
