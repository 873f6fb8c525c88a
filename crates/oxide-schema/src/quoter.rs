//! Identifier and literal quoting.

/// Escapes identifiers and string literals for one dialect.
pub trait Quoter: Send + Sync {
    /// Character used to quote identifiers.
    fn quote_char(&self) -> char;

    /// Quotes an identifier, doubling embedded quote characters.
    fn id(&self, name: &str) -> String {
        let q = self.quote_char();
        let mut out = String::with_capacity(name.len() + 2);
        out.push(q);
        for c in name.chars() {
            if c == q {
                out.push(q);
            }
            out.push(c);
        }
        out.push(q);
        out
    }

    /// Quotes a string literal, doubling embedded single quotes.
    fn val(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Quotes a list of identifiers and joins them with `, `.
    fn ids(&self, names: &[String]) -> String {
        names
            .iter()
            .map(|n| self.id(n))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// ANSI double-quote quoting.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiQuoter;

impl Quoter for AnsiQuoter {
    fn quote_char(&self) -> char {
        '"'
    }
}
