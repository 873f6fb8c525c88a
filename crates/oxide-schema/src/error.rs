//! Error types for schema introspection and DDL synthesis.

/// Errors that can occur while talking to a grammar.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    /// No grammar is registered for the requested driver.
    #[error("The {0} driver is not supported")]
    UnsupportedDriver(String),

    /// The DSN could not be parsed.
    #[error("Invalid DSN '{dsn}': {message}")]
    InvalidDsn {
        /// The rejected DSN.
        dsn: String,
        /// Why it was rejected.
        message: String,
    },

    /// The dialect's on-connected hook failed.
    #[error("The {driver} on-connected hook failed: {message}")]
    OnConnected {
        /// Driver identifier.
        driver: String,
        /// Error message.
        message: String,
    },

    /// Database error while executing a statement or reading the catalog.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The catalog reported no columns for the table.
    #[error("The table {0} does not exist")]
    TableNotFound(String),

    /// An index row references a column the column listing did not return.
    #[error("The index {index} of table {table} references the unknown column {column}")]
    CatalogDrift {
        /// Table name.
        table: String,
        /// Index name.
        index: String,
        /// Column referenced by the index.
        column: String,
    },

    /// A command targets a column that does not exist.
    #[error("The column {column} does not exist on table {table}")]
    ColumnNotFound {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// A command targets an index that does not exist.
    #[error("The index {index} does not exist on table {table}")]
    IndexNotFound {
        /// Table name.
        table: String,
        /// Index name.
        index: String,
    },

    /// A command verb that has no meaning in the current synthesis path.
    #[error("{verb} cannot be applied by {path}")]
    NotApplicable {
        /// Command verb.
        verb: &'static str,
        /// Either `CreateTable` or `AlterTable`.
        path: &'static str,
    },

    /// The version query returned no rows.
    #[error("Can't get the {driver} version")]
    UnknownVersion {
        /// Driver identifier.
        driver: String,
    },

    /// The version query returned something that is not a version.
    #[error("Can't parse the {driver} version '{version}'")]
    InvalidVersion {
        /// Driver identifier.
        driver: String,
        /// Raw version string.
        version: String,
    },

    /// A single command of an alter batch failed.
    #[error("{verb}{}: {source}", .target.as_ref().map(|t| format!(" {t}")).unwrap_or_default())]
    Command {
        /// Command verb.
        verb: &'static str,
        /// Column or index the command targets.
        target: Option<String>,
        /// Underlying failure.
        source: Box<GrammarError>,
    },

    /// Multiple errors occurred.
    #[error("{}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n"))]
    Multiple(Vec<GrammarError>),
}

impl GrammarError {
    /// Wraps an error with the verb and target of the command that caused it.
    #[must_use]
    pub fn command(verb: &'static str, target: Option<String>, source: GrammarError) -> Self {
        Self::Command {
            verb,
            target,
            source: Box::new(source),
        }
    }

    /// Returns the command verb for per-command errors.
    #[must_use]
    pub fn verb(&self) -> Option<&'static str> {
        match self {
            Self::Command { verb, .. } => Some(verb),
            _ => None,
        }
    }
}

/// Result type for grammar operations.
pub type Result<T> = std::result::Result<T, GrammarError>;
