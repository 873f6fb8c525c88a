//! SQLite grammar.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::catalog::SqliteCatalog;
use crate::dialect::SqliteDialect;
use crate::error::Result;
use crate::registry::GrammarRegistry;

use super::{Grammar, SqlGrammar};

/// Grammar for SQLite databases.
pub type SqliteGrammar = SqlGrammar<SqliteDialect, SqliteCatalog>;

impl SqliteGrammar {
    /// Connects, applies the DSN and runs the on-connected hook.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let catalog = SqliteCatalog::connect(dsn).await?;
        let mut grammar = Self::new(SqliteDialect::new(), catalog);
        grammar.config(dsn)?;
        grammar.on_connected().await?;
        Ok(grammar)
    }

    /// Registers this grammar under `sqlite3` and `sqlite`.
    pub fn register(registry: &mut GrammarRegistry) {
        registry.register("sqlite3", Self::boxed);
        registry.register("sqlite", Self::boxed);
    }

    fn boxed(dsn: String) -> BoxFuture<'static, Result<Box<dyn Grammar>>> {
        async move {
            let grammar = Self::connect(&dsn).await?;
            Ok(Box::new(grammar) as Box<dyn Grammar>)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_memory() {
        let grammar = SqliteGrammar::connect("sqlite::memory:").await.unwrap();
        assert_eq!(grammar.driver(), "sqlite3");
        assert_eq!(grammar.db_name(), "main");
        assert_eq!(grammar.schema_name(), "main");
        assert_eq!(grammar.dsn(), "sqlite::memory:");
        assert_eq!(grammar.quoter().id("t"), "\"t\"");
    }

    #[tokio::test]
    async fn test_version_query() {
        let grammar = SqliteGrammar::connect("sqlite::memory:").await.unwrap();
        let version = grammar.version().await.unwrap();
        assert_eq!(version.major, 3);
        assert_eq!(version.driver, "sqlite3");
    }
}
