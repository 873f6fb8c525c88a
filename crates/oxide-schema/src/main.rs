//! oxide-schema CLI
//!
//! Command-line tool for inspecting and managing table schemas.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_schema::prelude::*;

/// Dialect-agnostic schema introspection and DDL synthesis.
#[derive(Parser)]
#[command(name = "oxide-schema")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database driver (mysql, sqlite3).
    #[arg(long, env = "OXIDE_SCHEMA_DRIVER", default_value = "sqlite3")]
    driver: String,

    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a table's columns, indexes and primary key as JSON.
    Inspect {
        /// Table name.
        table: String,
    },

    /// Print the database server version.
    Version,

    /// Report whether a table exists.
    Exists {
        /// Table name.
        table: String,
    },

    /// Create a table from a JSON definition.
    Create {
        /// JSON file holding the table (columns, indexes, primary key).
        file: PathBuf,
    },

    /// Drop a table.
    Drop {
        /// Table name.
        table: String,

        /// Do not fail when the table is missing.
        #[arg(long)]
        if_exists: bool,
    },

    /// Rename a table.
    Rename {
        /// Current name.
        from: String,

        /// New name.
        to: String,
    },
}

/// Turns a table definition into the commands of the create path.
fn queue_definition(definition: Table) -> Table {
    let mut table = Table::new(definition.name.clone());
    table.engine = definition.engine;
    table.charset = definition.charset;
    table.collation = definition.collation;
    table.comment = definition.comment;
    for column in definition.columns {
        table.add_column(column);
    }
    if let Some(primary) = definition.primary {
        table.create_primary(primary);
    }
    for index in definition.indexes {
        table.create_index(index);
    }
    table
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let registry = GrammarRegistry::with_default_dialects();
    let grammar = registry.connect(&cli.driver, &cli.database).await?;

    match cli.command {
        Commands::Inspect { table } => {
            let mut table = Table::new(table);
            grammar.get_table(&mut table).await?;
            println!("{}", serde_json::to_string_pretty(&table)?);
        }

        Commands::Version => {
            let version = grammar.version().await?;
            println!("{} {}", version.driver, version);
        }

        Commands::Exists { table } => {
            let exists = grammar.table_exists(&table).await?;
            println!("{exists}");
        }

        Commands::Create { file } => {
            let json = std::fs::read_to_string(&file)?;
            let definition: Table = serde_json::from_str(&json)?;
            let mut table = queue_definition(definition);
            grammar.create_table(&mut table).await?;
            info!(table = %table.name, columns = table.columns.len(), "Table created");
        }

        Commands::Drop { table, if_exists } => {
            if if_exists {
                grammar.drop_table_if_exists(&table).await?;
            } else {
                grammar.drop_table(&table).await?;
            }
            info!(table = %table, "Table dropped");
        }

        Commands::Rename { from, to } => {
            grammar.rename(&from, &to).await?;
            info!(from = %from, to = %to, "Table renamed");
        }
    }

    Ok(())
}
