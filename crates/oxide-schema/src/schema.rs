//! Canonical schema types.
//!
//! A [`Table`] is both the result of introspection and the carrier of pending
//! schema changes: callers queue [`Command`]s on it, and a grammar consumes
//! them through `create_table` or `alter_table`.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::command::{Command, CommandKind};
use crate::error::GrammarError;
use crate::quoter::Quoter;

/// Extra marker for auto-incrementing columns.
pub const AUTO_INCREMENT: &str = "AutoIncrement";

/// Canonical, dialect-independent column types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnType {
    BigInteger,
    Integer,
    SmallInteger,
    TinyInteger,
    MediumInteger,
    Decimal,
    Float,
    Double,
    #[default]
    String,
    Char,
    Text,
    MediumText,
    LongText,
    Date,
    DateTime,
    DateTimeTz,
    Time,
    TimeTz,
    Timestamp,
    TimestampTz,
    Boolean,
    Binary,
    Json,
    Jsonb,
    Enum,
    Uuid,
    Year,
    /// A name outside the canonical vocabulary.
    Other(String),
}

impl ColumnType {
    /// Every canonical type, in registry order.
    pub const ALL: [Self; 27] = [
        Self::BigInteger,
        Self::Integer,
        Self::SmallInteger,
        Self::TinyInteger,
        Self::MediumInteger,
        Self::Decimal,
        Self::Float,
        Self::Double,
        Self::String,
        Self::Char,
        Self::Text,
        Self::MediumText,
        Self::LongText,
        Self::Date,
        Self::DateTime,
        Self::DateTimeTz,
        Self::Time,
        Self::TimeTz,
        Self::Timestamp,
        Self::TimestampTz,
        Self::Boolean,
        Self::Binary,
        Self::Json,
        Self::Jsonb,
        Self::Enum,
        Self::Uuid,
        Self::Year,
    ];

    /// Returns the canonical name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::BigInteger => "bigInteger",
            Self::Integer => "integer",
            Self::SmallInteger => "smallInteger",
            Self::TinyInteger => "tinyInteger",
            Self::MediumInteger => "mediumInteger",
            Self::Decimal => "decimal",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Char => "char",
            Self::Text => "text",
            Self::MediumText => "mediumText",
            Self::LongText => "longText",
            Self::Date => "date",
            Self::DateTime => "dateTime",
            Self::DateTimeTz => "dateTimeTz",
            Self::Time => "time",
            Self::TimeTz => "timeTz",
            Self::Timestamp => "timestamp",
            Self::TimestampTz => "timestampTz",
            Self::Boolean => "boolean",
            Self::Binary => "binary",
            Self::Json => "json",
            Self::Jsonb => "jsonb",
            Self::Enum => "enum",
            Self::Uuid => "uuid",
            Self::Year => "year",
            Self::Other(name) => name,
        }
    }

    /// Parses a canonical name, returning `None` for names outside the vocabulary.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.as_str() == name)
    }

    /// Integer types, the only ones that honor the unsigned flag everywhere.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::BigInteger
                | Self::Integer
                | Self::SmallInteger
                | Self::TinyInteger
                | Self::MediumInteger
        )
    }

    /// Types whose length argument survives a round trip.
    #[must_use]
    pub fn accepts_length(&self) -> bool {
        matches!(self, Self::String | Self::Char | Self::Binary)
    }

    /// Types carrying precision and scale.
    #[must_use]
    pub fn accepts_precision(&self) -> bool {
        matches!(self, Self::Decimal | Self::Float | Self::Double)
    }

    /// Types carrying a fractional seconds precision.
    #[must_use]
    pub fn accepts_datetime_precision(&self) -> bool {
        matches!(
            self,
            Self::DateTime
                | Self::DateTimeTz
                | Self::Time
                | Self::TimeTz
                | Self::Timestamp
                | Self::TimestampTz
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ColumnType {
    fn from(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| Self::Other(name.to_string()))
    }
}

impl From<String> for ColumnType {
    fn from(name: String) -> Self {
        Self::parse(&name).unwrap_or(Self::Other(name))
    }
}

impl From<ColumnType> for String {
    fn from(ty: ColumnType) -> Self {
        ty.as_str().to_string()
    }
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// NULL default.
    Null,
    /// Boolean default.
    Bool(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// SQL expression (e.g., "CURRENT_TIMESTAMP").
    Expression(String),
}

impl DefaultValue {
    /// Returns the SQL representation of this default value.
    pub fn to_sql<Q: Quoter + ?Sized>(&self, quoter: &Q) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(true) => "1".to_string(),
            Self::Bool(false) => "0".to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => quoter.val(s),
            Self::Expression(expr) => expr.clone(),
        }
    }

    /// Parses a default as it is stored in SQL text form (`'abc'`, `0`,
    /// `CURRENT_TIMESTAMP`).
    #[must_use]
    pub fn from_sql_literal(text: &str) -> Self {
        let text = text.trim();
        if text.eq_ignore_ascii_case("NULL") {
            return Self::Null;
        }
        if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
            return Self::String(text[1..text.len() - 1].replace("''", "'"));
        }
        if let Ok(i) = text.parse::<i64>() {
            return Self::Integer(i);
        }
        if let Ok(f) = text.parse::<f64>() {
            return Self::Float(f);
        }
        if text.eq_ignore_ascii_case("TRUE") {
            return Self::Bool(true);
        }
        if text.eq_ignore_ascii_case("FALSE") {
            return Self::Bool(false);
        }
        Self::Expression(text.to_string())
    }
}

/// A table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Column {
    /// Database the owning table lives in.
    pub db_name: String,
    /// Owning table.
    pub table_name: String,
    /// Column name.
    pub name: String,
    /// 1-based position in catalog order.
    pub position: usize,
    /// Canonical type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Whether the column allows NULL values.
    pub nullable: bool,
    /// Unsigned numeric column.
    pub unsigned: bool,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub datetime_precision: Option<u32>,
    pub default: Option<DefaultValue>,
    /// Extra marker, e.g. [`AUTO_INCREMENT`].
    pub extra: Option<String>,
    /// Whether this column belongs to the primary key.
    pub primary: bool,
    pub charset: Option<String>,
    pub collation: Option<String>,
    /// Native comment, possibly carrying a `T:<type>` hint.
    pub comment: Option<String>,
    /// Allowed values of an `enum` column.
    pub options: Vec<String>,
    /// Names of the indexes this column participates in.
    pub indexes: Vec<String>,
}

impl Default for Column {
    fn default() -> Self {
        Self {
            db_name: String::new(),
            table_name: String::new(),
            name: String::new(),
            position: 0,
            column_type: ColumnType::default(),
            nullable: true,
            unsigned: false,
            length: None,
            precision: None,
            scale: None,
            datetime_precision: None,
            default: None,
            extra: None,
            primary: false,
            charset: None,
            collation: None,
            comment: None,
            options: Vec::new(),
            indexes: Vec::new(),
        }
    }
}

impl Column {
    /// Creates a new nullable column.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: impl Into<ColumnType>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            ..Self::default()
        }
    }

    /// Sets NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Marks the column unsigned.
    #[must_use]
    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    /// Sets the length.
    #[must_use]
    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Sets precision and scale.
    #[must_use]
    pub fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Sets the fractional seconds precision.
    #[must_use]
    pub fn datetime_precision(mut self, precision: u32) -> Self {
        self.datetime_precision = Some(precision);
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Marks the column as auto-incrementing.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.extra = Some(AUTO_INCREMENT.to_string());
        self
    }

    /// Marks the column as (part of) the primary key.
    #[must_use]
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    #[must_use]
    pub fn collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    /// Sets the native comment verbatim.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Stores the canonical type in the comment so it survives dialects that
    /// cannot represent it natively.
    #[must_use]
    pub fn type_hint(mut self) -> Self {
        let free_text = self.comment.take();
        self.comment = Some(crate::types::encode_type_hint(
            &self.column_type,
            free_text.as_deref(),
        ));
        self
    }

    /// Sets the allowed values of an `enum` column.
    #[must_use]
    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Returns whether the column carries the auto-increment marker.
    #[must_use]
    pub fn is_auto_increment(&self) -> bool {
        self.extra.as_deref() == Some(AUTO_INCREMENT)
    }
}

/// Index classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Primary,
    Unique,
    #[default]
    Index,
}

impl IndexKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Unique => "unique",
            Self::Index => "index",
        }
    }
}

/// A table index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Index {
    pub db_name: String,
    pub table_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: IndexKind,
    /// Indexed columns in sequence order; the sequence number is the 1-based
    /// position in this list.
    pub columns: Vec<String>,
    pub unique: bool,
    pub comment: Option<String>,
}

impl Index {
    /// Creates a plain index.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: IndexKind::Index,
            columns: columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Creates a unique index.
    #[must_use]
    pub fn unique<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = Self::new(name, columns);
        index.kind = IndexKind::Unique;
        index.unique = true;
        index
    }

    /// Whether the index enforces uniqueness.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.unique || matches!(self.kind, IndexKind::Unique | IndexKind::Primary)
    }

    /// Returns the 1-based sequence number of a column in this index.
    #[must_use]
    pub fn seq_of(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|pos| pos + 1)
    }
}

/// The primary key of a table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Primary {
    pub db_name: String,
    pub table_name: String,
    pub name: String,
    /// Key columns in sequence order.
    pub columns: Vec<String>,
}

impl Primary {
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: "PRIMARY".to_string(),
            columns: columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// A table, as introspected or as being declared.
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Table {
    pub db_name: String,
    pub schema_name: String,
    pub name: String,
    pub comment: Option<String>,
    pub engine: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub rows: Option<i64>,
    pub create_time: Option<NaiveDateTime>,
    pub primary: Option<Primary>,
    /// Columns in catalog (or declaration) order.
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
    /// Pending changes, consumed by `create_table` / `alter_table`.
    #[serde(skip)]
    pub commands: Vec<Command>,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("db_name", &self.db_name)
            .field("schema_name", &self.schema_name)
            .field("name", &self.name)
            .field("engine", &self.engine)
            .field("charset", &self.charset)
            .field("collation", &self.collation)
            .field("rows", &self.rows)
            .field("primary", &self.primary)
            .field("columns", &self.columns)
            .field("indexes", &self.indexes)
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}

impl Table {
    /// Creates an empty table description.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    #[must_use]
    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|i| i.name == name)
    }

    pub fn index_mut(&mut self, name: &str) -> Option<&mut Index> {
        self.indexes.iter_mut().find(|i| i.name == name)
    }

    #[must_use]
    pub fn has_index(&self, name: &str) -> bool {
        self.index(name).is_some()
    }

    /// Column names in order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Appends a column, replacing an existing one with the same name in place.
    pub fn push_column(&mut self, mut column: Column) {
        column.table_name.clone_from(&self.name);
        column.db_name.clone_from(&self.db_name);
        match self.column_mut(&column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }

    /// Appends an index, replacing an existing one with the same name in place.
    pub fn push_index(&mut self, mut index: Index) {
        index.table_name.clone_from(&self.name);
        index.db_name.clone_from(&self.db_name);
        match self.index_mut(&index.name) {
            Some(existing) => *existing = index,
            None => self.indexes.push(index),
        }
    }

    /// Queues a command.
    pub fn push_command(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self
    }

    /// Queues `AddColumn`.
    pub fn add_column(&mut self, column: Column) -> &mut Self {
        self.push_command(Command::new(CommandKind::AddColumn(column)))
    }

    /// Queues `ChangeColumn`.
    pub fn change_column(&mut self, column: Column) -> &mut Self {
        self.push_command(Command::new(CommandKind::ChangeColumn(column)))
    }

    /// Queues `RenameColumn`.
    pub fn rename_column(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.push_command(Command::new(CommandKind::RenameColumn {
            from: from.into(),
            to: to.into(),
        }))
    }

    /// Queues `DropColumn`.
    pub fn drop_column(&mut self, name: impl Into<String>) -> &mut Self {
        self.push_command(Command::new(CommandKind::DropColumn(name.into())))
    }

    /// Queues `CreateIndex`.
    pub fn create_index(&mut self, index: Index) -> &mut Self {
        self.push_command(Command::new(CommandKind::CreateIndex(index)))
    }

    /// Queues `DropIndex`.
    pub fn drop_index(&mut self, name: impl Into<String>) -> &mut Self {
        self.push_command(Command::new(CommandKind::DropIndex(name.into())))
    }

    /// Queues `RenameIndex`.
    pub fn rename_index(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.push_command(Command::new(CommandKind::RenameIndex {
            from: from.into(),
            to: to.into(),
        }))
    }

    /// Queues `CreatePrimary`.
    pub fn create_primary(&mut self, primary: Primary) -> &mut Self {
        self.push_command(Command::new(CommandKind::CreatePrimary(primary)))
    }

    /// Queues any command with a completion callback.
    pub fn push_command_then<F>(&mut self, kind: CommandKind, callback: F) -> &mut Self
    where
        F: FnOnce(Result<(), &GrammarError>) + Send + 'static,
    {
        self.push_command(Command::new(kind).on_complete(callback))
    }
}
