//! Pending schema changes queued on a [`Table`](crate::schema::Table).

use std::fmt;

use crate::error::GrammarError;
use crate::schema::{Column, Index, Primary};

/// Completion callback, invoked once with the command's own outcome.
pub type Callback = Box<dyn FnOnce(Result<(), &GrammarError>) + Send + 'static>;

/// What a command does.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    AddColumn(Column),
    /// Redefines an existing column; the column name selects the target.
    ChangeColumn(Column),
    RenameColumn {
        from: String,
        to: String,
    },
    DropColumn(String),
    CreateIndex(Index),
    DropIndex(String),
    RenameIndex {
        from: String,
        to: String,
    },
    CreatePrimary(Primary),
}

/// A queued schema change with an optional completion callback.
pub struct Command {
    pub kind: CommandKind,
    callback: Option<Callback>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("kind", &self.kind)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl Command {
    #[must_use]
    pub fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            callback: None,
        }
    }

    /// Attaches a completion callback.
    #[must_use]
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(Result<(), &GrammarError>) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// The command verb, as used in error messages.
    #[must_use]
    pub fn verb(&self) -> &'static str {
        match &self.kind {
            CommandKind::AddColumn(_) => "AddColumn",
            CommandKind::ChangeColumn(_) => "ChangeColumn",
            CommandKind::RenameColumn { .. } => "RenameColumn",
            CommandKind::DropColumn(_) => "DropColumn",
            CommandKind::CreateIndex(_) => "CreateIndex",
            CommandKind::DropIndex(_) => "DropIndex",
            CommandKind::RenameIndex { .. } => "RenameIndex",
            CommandKind::CreatePrimary(_) => "CreatePrimary",
        }
    }

    /// Name of the column or index the command targets.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match &self.kind {
            CommandKind::AddColumn(column) | CommandKind::ChangeColumn(column) => {
                Some(&column.name)
            }
            CommandKind::RenameColumn { from, .. } | CommandKind::RenameIndex { from, .. } => {
                Some(from)
            }
            CommandKind::DropColumn(name) | CommandKind::DropIndex(name) => Some(name),
            CommandKind::CreateIndex(index) => Some(&index.name),
            CommandKind::CreatePrimary(_) => None,
        }
    }

    /// Splits the command into its kind and callback.
    #[must_use]
    pub fn into_parts(self) -> (CommandKind, Option<Callback>) {
        (self.kind, self.callback)
    }

    /// Consumes the command, reporting the outcome to its callback.
    pub fn complete(self, outcome: Result<(), &GrammarError>) {
        notify(self.callback, outcome);
    }
}

/// Reports an outcome to a detached callback.
pub(crate) fn notify(callback: Option<Callback>, outcome: Result<(), &GrammarError>) {
    if let Some(callback) = callback {
        callback(outcome);
    }
}

impl From<CommandKind> for Command {
    fn from(kind: CommandKind) -> Self {
        Self::new(kind)
    }
}
