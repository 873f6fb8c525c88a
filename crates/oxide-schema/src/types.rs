//! Canonical ↔ native type mapping.
//!
//! Each dialect builds one [`TypeRegistry`] from an ordered list of
//! `(canonical, native)` pairs. The forward map is the source of truth; the
//! flipped map is derived from it and keeps the first canonical type seen for
//! each native token, so ambiguous natives resolve to the dialect default.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::schema::ColumnType;

static TYPE_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^T:([a-zA-Z]+)").expect("type hint pattern is valid"));

/// Bidirectional canonical/native type map for one dialect.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    forward: HashMap<ColumnType, &'static str>,
    flipped: HashMap<String, ColumnType>,
    fallback: &'static str,
}

impl TypeRegistry {
    /// Builds a registry. `fallback` is the native type rendered for
    /// canonical types the dialect does not know.
    #[must_use]
    pub fn new(fallback: &'static str, pairs: &[(ColumnType, &'static str)]) -> Self {
        let mut forward = HashMap::with_capacity(pairs.len());
        let mut flipped = HashMap::with_capacity(pairs.len());
        for (canonical, native) in pairs {
            forward.entry(canonical.clone()).or_insert(*native);
            flipped
                .entry(native.to_ascii_uppercase())
                .or_insert_with(|| canonical.clone());
        }
        Self {
            forward,
            flipped,
            fallback,
        }
    }

    /// Registers an extra native spelling, used only for native → canonical.
    #[must_use]
    pub fn with_alias(mut self, native: &str, canonical: ColumnType) -> Self {
        self.flipped
            .entry(native.to_ascii_uppercase())
            .or_insert(canonical);
        self
    }

    /// Looks up the native type for a canonical name.
    #[must_use]
    pub fn to_native(&self, canonical: &str) -> Option<&'static str> {
        ColumnType::parse(canonical).and_then(|ty| self.forward.get(&ty).copied())
    }

    /// Native type for a canonical type, falling back to the dialect's
    /// variable-length string type.
    #[must_use]
    pub fn native_for(&self, canonical: &ColumnType) -> &'static str {
        self.forward.get(canonical).copied().unwrap_or(self.fallback)
    }

    /// Looks up the canonical type for a native declaration such as
    /// `varchar(36)` or `int unsigned`.
    #[must_use]
    pub fn to_canonical(&self, native: &str) -> Option<ColumnType> {
        let whole = normalize_spaces(native).to_ascii_uppercase();
        if let Some(ty) = self.flipped.get(&whole) {
            return Some(ty.clone());
        }
        let parsed = NativeType::parse(native);
        self.flipped.get(&parsed.base).cloned()
    }

    /// The fallback native type.
    #[must_use]
    pub fn fallback(&self) -> &'static str {
        self.fallback
    }
}

/// A native type declaration split into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NativeType {
    /// Upper-cased type name without arguments or modifiers.
    pub base: String,
    /// Numeric arguments, e.g. `[10, 2]` for `DECIMAL(10,2)`.
    pub args: Vec<u32>,
    /// Raw text between the parentheses.
    pub raw_args: Option<String>,
    pub unsigned: bool,
}

impl NativeType {
    /// Parses a declaration. Never fails; unparsable arguments are dropped.
    #[must_use]
    pub fn parse(declaration: &str) -> Self {
        let declaration = normalize_spaces(declaration);
        let (head, raw_args, tail) = match (declaration.find('('), declaration.rfind(')')) {
            (Some(open), Some(close)) if open < close => (
                declaration[..open].trim().to_string(),
                Some(declaration[open + 1..close].to_string()),
                declaration[close + 1..].trim().to_string(),
            ),
            _ => (declaration.clone(), None, String::new()),
        };

        let mut words: Vec<String> = head
            .split(' ')
            .chain(tail.split(' '))
            .filter(|w| !w.is_empty())
            .map(str::to_ascii_uppercase)
            .collect();

        let mut unsigned = false;
        if words.join(" ") == "UNSIGNED BIG INT" {
            unsigned = true;
        } else {
            words.retain(|w| match w.as_str() {
                "UNSIGNED" => {
                    unsigned = true;
                    false
                }
                "ZEROFILL" | "SIGNED" => false,
                _ => true,
            });
        }

        let args = raw_args
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map_while(|a| a.trim().parse::<u32>().ok())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            base: words.join(" "),
            args,
            raw_args,
            unsigned,
        }
    }
}

fn normalize_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reads the canonical type hint from a column comment (`T:json|free text`).
///
/// Only the first `|` segment is examined; unknown type names yield `None`.
#[must_use]
pub fn type_hint(comment: &str) -> Option<ColumnType> {
    let first = comment.split('|').next()?.trim();
    let caps = TYPE_HINT.captures(first)?;
    ColumnType::parse(caps.get(1)?.as_str())
}

/// Returns the free text following a type hint, or the whole comment when it
/// carries no hint.
#[must_use]
pub fn strip_type_hint(comment: &str) -> Option<&str> {
    if type_hint(comment).is_none() {
        return Some(comment);
    }
    comment.split_once('|').map(|(_, rest)| rest)
}

/// Encodes a canonical type hint, keeping any free text after a `|`.
#[must_use]
pub fn encode_type_hint(ty: &ColumnType, free_text: Option<&str>) -> String {
    let free_text = free_text.and_then(strip_type_hint).unwrap_or_default();
    if free_text.is_empty() {
        format!("T:{ty}")
    } else {
        format!("T:{ty}|{free_text}")
    }
}

/// Parses a list of single-quoted SQL literals, e.g. `'a','b'` → `["a", "b"]`.
#[must_use]
pub fn parse_quoted_list(text: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\'' {
            continue;
        }
        let mut value = String::new();
        loop {
            match chars.next() {
                Some('\'') if chars.peek() == Some(&'\'') => {
                    chars.next();
                    value.push('\'');
                }
                Some('\'') | None => break,
                Some(other) => value.push(other),
            }
        }
        values.push(value);
    }
    values
}
