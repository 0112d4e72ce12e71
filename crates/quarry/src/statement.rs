//! Finalized statements.

use crate::error::{Error, QueryResult};
use crate::value::SqlValue;

/// The relational operation a statement performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    /// Whether the statement mutates rows.
    pub fn is_write(&self) -> bool {
        !matches!(self, StatementKind::Select)
    }
}

/// An immutable, finalized description of one relational operation plus its
/// bound parameters.
///
/// Produced by a builder's `build()`; consumed by [`Query`](crate::Query) or
/// [`QueryBatch`](crate::QueryBatch). The text contains only validated
/// identifiers and placeholders; values travel in `params`.
#[derive(Clone, Debug)]
pub struct Statement {
    kind: StatementKind,
    table: String,
    sql: String,
    params: Vec<SqlValue>,
    returning: Option<String>,
    dialect: &'static str,
}

impl Statement {
    /// Assemble a finalized statement, enforcing the placeholder/binding
    /// invariant: the number of placeholders the builder rendered must equal
    /// the number of values it collected.
    pub(crate) fn new(
        kind: StatementKind,
        table: String,
        sql: String,
        params: Vec<SqlValue>,
        placeholders: usize,
        returning: Option<String>,
        dialect: &'static str,
    ) -> QueryResult<Statement> {
        if placeholders != params.len() {
            return Err(Error::validation(format!(
                "statement on '{table}' rendered {placeholders} placeholders for {} bindings",
                params.len()
            )));
        }
        Ok(Statement {
            kind,
            table,
            sql,
            params,
            returning,
            dialect,
        })
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// The target table, as supplied to the builder.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The compiled statement text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The positional parameter list, in placeholder order.
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// The RETURNING column, when the builder requested key capture.
    pub fn returning(&self) -> Option<&str> {
        self.returning.as_deref()
    }

    /// Name of the dialect this statement was rendered for.
    pub fn dialect(&self) -> &'static str {
        self.dialect
    }
}
