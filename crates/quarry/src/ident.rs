//! Identifier allow-list handling.
//!
//! Every table and column name referenced by a builder passes through
//! [`Ident::parse`] before it reaches statement text. Bare parts must match
//! `[A-Za-z_][A-Za-z0-9_$]*`; anything else must arrive double-quoted with
//! embedded quotes doubled. Dotted notation (`schema.table`) is supported.
//! Rendering defers quoting to the active [`Dialect`].

use crate::dialect::Dialect;
use crate::error::{Error, QueryResult};

/// One dot-separated part of an identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
enum IdentPart {
    /// Matches the bare-identifier pattern; rendered as-is.
    Bare(String),
    /// Arrived quoted; rendered through the dialect's quoting rule.
    Quoted(String),
}

/// A validated SQL identifier (column, table, or schema-qualified name).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    parts: Vec<IdentPart>,
}

impl Ident {
    /// Parse and validate an identifier, supporting dotted and quoted forms.
    pub fn parse(input: &str) -> QueryResult<Ident> {
        if input.is_empty() {
            return Err(Error::validation("identifier cannot be empty"));
        }
        if input.contains('\0') {
            return Err(Error::validation("identifier cannot contain NUL"));
        }

        let mut parts = Vec::new();
        let mut rest = input;
        loop {
            let (part, remainder) = parse_part(rest, input)?;
            parts.push(part);
            match remainder {
                "" => break,
                r if r.starts_with('.') => {
                    rest = &r[1..];
                    if rest.is_empty() {
                        return Err(Error::validation(format!(
                            "trailing '.' in identifier '{input}'"
                        )));
                    }
                }
                r => {
                    return Err(Error::validation(format!(
                        "expected '.' between parts of identifier '{input}', found '{r}'"
                    )));
                }
            }
        }
        Ok(Ident { parts })
    }

    /// Wrap a name as a single quoted part, bypassing the bare-part pattern.
    pub fn quoted(name: &str) -> QueryResult<Ident> {
        if name.is_empty() {
            return Err(Error::validation("quoted identifier cannot be empty"));
        }
        if name.contains('\0') {
            return Err(Error::validation("identifier cannot contain NUL"));
        }
        Ok(Ident {
            parts: vec![IdentPart::Quoted(name.to_string())],
        })
    }

    /// Render through the dialect's quoting rule.
    pub fn write_sql(&self, dialect: &dyn Dialect, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Bare(s) => out.push_str(s),
                IdentPart::Quoted(s) => dialect.write_quoted(s, out),
            }
        }
    }

    pub fn to_sql(&self, dialect: &dyn Dialect) -> String {
        let mut out = String::new();
        self.write_sql(dialect, &mut out);
        out
    }
}

/// Consume one identifier part, returning it and the unparsed remainder.
fn parse_part<'a>(rest: &'a str, whole: &str) -> QueryResult<(IdentPart, &'a str)> {
    if let Some(body) = rest.strip_prefix('"') {
        // Quoted part: scan for the closing quote, un-doubling "" pairs.
        let mut name = String::new();
        let mut chars = body.char_indices();
        while let Some((i, ch)) = chars.next() {
            if ch != '"' {
                name.push(ch);
                continue;
            }
            if body[i + 1..].starts_with('"') {
                name.push('"');
                chars.next();
                continue;
            }
            if name.is_empty() {
                return Err(Error::validation(format!(
                    "empty quoted part in identifier '{whole}'"
                )));
            }
            return Ok((IdentPart::Quoted(name), &body[i + 1..]));
        }
        return Err(Error::validation(format!(
            "unclosed quote in identifier '{whole}'"
        )));
    }

    // Bare part: [A-Za-z_][A-Za-z0-9_$]*
    let end = rest.find('.').unwrap_or(rest.len());
    let part = &rest[..end];
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        Some(c) => {
            return Err(Error::validation(format!(
                "identifier '{whole}' cannot start with '{c}'"
            )));
        }
        None => {
            return Err(Error::validation(format!(
                "empty part in identifier '{whole}'"
            )));
        }
    }
    if let Some(c) = chars.find(|c| !(*c == '_' || *c == '$' || c.is_ascii_alphanumeric())) {
        return Err(Error::validation(format!(
            "invalid character '{c}' in identifier '{whole}'"
        )));
    }
    Ok((IdentPart::Bare(part.to_string()), &rest[end..]))
}
