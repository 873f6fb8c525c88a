//! Dialect-agnostic schema introspection and DDL synthesis.
//!
//! `oxide-schema` reads a live table into a canonical [`Table`](schema::Table)
//! and turns queued schema changes back into dialect-specific DDL:
//!
//! - **Types** - canonical ↔ native type mapping per dialect, with a comment
//!   hint (`T:json`) for types the database cannot tell apart
//! - **Quoter** - identifier and literal escaping
//! - **Introspection** - columns, indexes and primary key from the catalog
//! - **Synthesis** - `CREATE TABLE` in one statement, `ALTER TABLE` one
//!   command at a time
//! - **Registry** - driver identifier → grammar, chosen at connection setup
//!
//! # Example
//!
//! ```rust,no_run
//! use oxide_schema::prelude::*;
//!
//! # async fn run() -> oxide_schema::error::Result<()> {
//! let registry = GrammarRegistry::with_default_dialects();
//! let grammar = registry.connect("sqlite3", "sqlite:app.db").await?;
//!
//! let mut users = Table::new("users");
//! users
//!     .add_column(
//!         Column::new("id", ColumnType::BigInteger)
//!             .unsigned()
//!             .auto_increment()
//!             .primary(),
//!     )
//!     .add_column(Column::new("email", ColumnType::String).length(255).not_null())
//!     .add_column(Column::new("profile", ColumnType::Json).type_hint())
//!     .create_index(Index::unique("uniq_email", ["email"]));
//! grammar.create_table(&mut users).await?;
//!
//! users.rename_index("uniq_email", "users_email_unique");
//! grammar.alter_table(&mut users).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Print a table as JSON
//! oxide-schema --database sqlite:app.db inspect users
//!
//! # Probe the server version
//! oxide-schema --driver mysql --database mysql://root@localhost/app version
//! ```

pub mod catalog;
pub mod command;
pub mod dialect;
pub mod error;
pub mod grammar;
pub mod quoter;
pub mod registry;
pub mod schema;
pub mod types;
pub mod version;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::catalog::{Catalog, MySqlCatalog, SqliteCatalog};
    pub use crate::command::{Callback, Command, CommandKind};
    pub use crate::dialect::{ColumnRenderer, Dialect, IndexRenderer, MySqlDialect, SqliteDialect};
    pub use crate::error::{GrammarError, Result};
    pub use crate::grammar::{Grammar, MySqlGrammar, SqlGrammar, SqliteGrammar};
    pub use crate::quoter::Quoter;
    pub use crate::registry::{GrammarFactory, GrammarRegistry};
    pub use crate::schema::{
        Column, ColumnType, DefaultValue, Index, IndexKind, Primary, Table, AUTO_INCREMENT,
    };
    pub use crate::types::TypeRegistry;
    pub use crate::version::Version;
}
