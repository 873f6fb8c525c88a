//! MySQL grammar.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::catalog::MySqlCatalog;
use crate::dialect::MySqlDialect;
use crate::error::Result;
use crate::registry::GrammarRegistry;

use super::{Grammar, SqlGrammar};

/// Grammar for MySQL-compatible servers.
pub type MySqlGrammar = SqlGrammar<MySqlDialect, MySqlCatalog>;

impl MySqlGrammar {
    /// Connects, applies the DSN and runs the on-connected hook.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let catalog = MySqlCatalog::connect(dsn).await?;
        let mut grammar = Self::new(MySqlDialect::new(), catalog);
        grammar.config(dsn)?;
        grammar.on_connected().await?;
        Ok(grammar)
    }

    /// Registers this grammar under `mysql`.
    pub fn register(registry: &mut GrammarRegistry) {
        registry.register("mysql", Self::boxed);
    }

    fn boxed(dsn: String) -> BoxFuture<'static, Result<Box<dyn Grammar>>> {
        async move {
            let grammar = Self::connect(&dsn).await?;
            Ok(Box::new(grammar) as Box<dyn Grammar>)
        }
        .boxed()
    }
}
