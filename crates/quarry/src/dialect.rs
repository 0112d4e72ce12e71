//! Statement dialect strategies.
//!
//! A [`Dialect`] decides placeholder style and identifier quoting so the same
//! builder can render for different relational stores. Only [`Postgres`]
//! statements are executable through this crate's query layer; the other
//! dialects are render targets for host code driving its own driver.

/// Rendering strategy for one target store.
pub trait Dialect: Send + Sync {
    /// Stable dialect name, recorded on every finalized statement.
    fn name(&self) -> &'static str;

    /// Append the placeholder for the 1-based parameter `index`.
    fn write_placeholder(&self, index: usize, out: &mut String);

    /// Append one quoted identifier part, escaping embedded quote characters.
    fn write_quoted(&self, part: &str, out: &mut String);

    /// Whether the store can hand back generated keys via RETURNING.
    fn supports_returning(&self) -> bool;
}

/// PostgreSQL: `$n` placeholders, double-quoted identifiers, RETURNING.
#[derive(Clone, Copy, Debug, Default)]
pub struct Postgres;

impl Postgres {
    pub const NAME: &'static str = "postgres";
}

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn write_placeholder(&self, index: usize, out: &mut String) {
        out.push('$');
        out.push_str(&index.to_string());
    }

    fn write_quoted(&self, part: &str, out: &mut String) {
        write_quoted_with(part, '"', out);
    }

    fn supports_returning(&self) -> bool {
        true
    }
}

/// SQLite: `?` placeholders, double-quoted identifiers, no RETURNING.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sqlite;

impl Sqlite {
    pub const NAME: &'static str = "sqlite";
}

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn write_placeholder(&self, _index: usize, out: &mut String) {
        out.push('?');
    }

    fn write_quoted(&self, part: &str, out: &mut String) {
        write_quoted_with(part, '"', out);
    }

    fn supports_returning(&self) -> bool {
        false
    }
}

/// MySQL: `?` placeholders, backtick-quoted identifiers, no RETURNING.
#[derive(Clone, Copy, Debug, Default)]
pub struct MySql;

impl MySql {
    pub const NAME: &'static str = "mysql";
}

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn write_placeholder(&self, _index: usize, out: &mut String) {
        out.push('?');
    }

    fn write_quoted(&self, part: &str, out: &mut String) {
        write_quoted_with(part, '`', out);
    }

    fn supports_returning(&self) -> bool {
        false
    }
}

fn write_quoted_with(part: &str, quote: char, out: &mut String) {
    out.push(quote);
    for ch in part.chars() {
        if ch == quote {
            out.push(quote);
        }
        out.push(ch);
    }
    out.push(quote);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_placeholders_are_numbered() {
        let mut out = String::new();
        Postgres.write_placeholder(3, &mut out);
        assert_eq!(out, "$3");
    }

    #[test]
    fn sqlite_placeholders_are_positional() {
        let mut out = String::new();
        Sqlite.write_placeholder(3, &mut out);
        assert_eq!(out, "?");
    }

    #[test]
    fn mysql_quotes_with_backticks() {
        let mut out = String::new();
        MySql.write_quoted("order", &mut out);
        assert_eq!(out, "`order`");
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let mut out = String::new();
        Postgres.write_quoted(r#"has"quote"#, &mut out);
        assert_eq!(out, r#""has""quote""#);
    }
}
