//! Driver identifier → grammar constructor.

use std::collections::BTreeMap;

use futures::future::BoxFuture;
use tracing::{debug, info};

use crate::error::{GrammarError, Result};
use crate::grammar::{Grammar, MySqlGrammar, SqliteGrammar};

/// Connects a grammar for a DSN.
pub type GrammarFactory = fn(String) -> BoxFuture<'static, Result<Box<dyn Grammar>>>;

/// Registry of the grammars this build supports.
///
/// Registration is append-only: registering a driver twice keeps the first
/// factory. Build it once at startup and share it by reference.
#[derive(Debug, Clone, Default)]
pub struct GrammarRegistry {
    factories: BTreeMap<String, GrammarFactory>,
}

impl GrammarRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every bundled dialect.
    #[must_use]
    pub fn with_default_dialects() -> Self {
        let mut registry = Self::new();
        MySqlGrammar::register(&mut registry);
        SqliteGrammar::register(&mut registry);
        registry
    }

    /// Registers a factory. Returns `false` if the driver was already taken.
    pub fn register(&mut self, driver: impl Into<String>, factory: GrammarFactory) -> bool {
        let driver = driver.into();
        if self.factories.contains_key(&driver) {
            debug!(driver = %driver, "Driver already registered, keeping the first grammar");
            return false;
        }
        self.factories.insert(driver, factory);
        true
    }

    /// Registered driver identifiers, sorted.
    pub fn drivers(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    #[must_use]
    pub fn supports(&self, driver: &str) -> bool {
        self.factories.contains_key(driver)
    }

    /// Connects the grammar registered for `driver`.
    pub async fn connect(&self, driver: &str, dsn: &str) -> Result<Box<dyn Grammar>> {
        let factory = self
            .factories
            .get(driver)
            .ok_or_else(|| GrammarError::UnsupportedDriver(driver.to_string()))?;
        info!(driver = %driver, "Connecting grammar");
        factory(dsn.to_string()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn refuse(dsn: String) -> BoxFuture<'static, Result<Box<dyn Grammar>>> {
        async move {
            Err(GrammarError::InvalidDsn {
                dsn,
                message: "refused".to_string(),
            })
        }
        .boxed()
    }

    #[test]
    fn test_default_dialects() {
        let registry = GrammarRegistry::with_default_dialects();
        let drivers: Vec<&str> = registry.drivers().collect();
        assert_eq!(drivers, vec!["mysql", "sqlite", "sqlite3"]);
        assert!(registry.supports("sqlite3"));
        assert!(!registry.supports("postgres"));
    }

    #[test]
    fn test_register_keeps_first() {
        let mut registry = GrammarRegistry::with_default_dialects();
        assert!(!registry.register("sqlite3", refuse));
        assert!(registry.register("custom", refuse));
    }

    #[tokio::test]
    async fn test_unsupported_driver() {
        let registry = GrammarRegistry::with_default_dialects();
        let err = registry.connect("postgres", "postgres://localhost/app").await.err().unwrap();
        assert!(matches!(err, GrammarError::UnsupportedDriver(ref d) if d == "postgres"));
    }

    #[tokio::test]
    async fn test_factory_error_is_returned() {
        let mut registry = GrammarRegistry::new();
        registry.register("custom", refuse);
        let err = registry.connect("custom", "custom://x").await.err().unwrap();
        assert!(matches!(err, GrammarError::InvalidDsn { .. }));
    }

    #[tokio::test]
    async fn test_connect_sqlite() {
        let registry = GrammarRegistry::with_default_dialects();
        let grammar = registry.connect("sqlite", "sqlite::memory:").await.unwrap();
        assert_eq!(grammar.driver(), "sqlite3");
        assert!(!grammar.table_exists("nothing").await.unwrap());
    }
}
