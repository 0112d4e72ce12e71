//! INSERT statement builder.

use crate::dialect::{Dialect, Postgres};
use crate::error::{Error, QueryResult};
use crate::qb::expr::RenderCtx;
use crate::statement::{Statement, StatementKind};
use crate::value::{IntoValue, SqlValue};

/// Fluent INSERT builder.
///
/// Two shapes are supported: column-by-column [`set`] for a single row, or
/// [`columns`] plus repeated [`row`] calls for multi-row inserts. The shapes
/// cannot be mixed.
///
/// [`set`]: InsertBuilder::set
/// [`columns`]: InsertBuilder::columns
/// [`row`]: InsertBuilder::row
#[derive(Clone, Debug)]
pub struct InsertBuilder {
    table: String,
    set_fields: Vec<(String, SqlValue)>,
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
    returning: Option<String>,
}

impl InsertBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            set_fields: Vec::new(),
            columns: Vec::new(),
            rows: Vec::new(),
            returning: None,
        }
    }

    /// Bind one column of a single-row insert.
    pub fn set(mut self, column: &str, value: impl IntoValue) -> Self {
        self.set_fields.push((column.to_string(), value.into_value()));
        self
    }

    /// Bind a column only when the value is present.
    pub fn set_opt<T: IntoValue>(self, column: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Name the column list for multi-row inserts.
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns.extend(columns.iter().map(|c| c.to_string()));
        self
    }

    /// Append one value row for a multi-row insert.
    pub fn row<T: IntoValue>(mut self, values: Vec<T>) -> Self {
        self.rows
            .push(values.into_iter().map(IntoValue::into_value).collect());
        self
    }

    /// Append one value row of mixed kinds.
    pub fn row_values(mut self, values: Vec<SqlValue>) -> Self {
        self.rows.push(values);
        self
    }

    /// Capture the generated key from the named column.
    ///
    /// Only available on dialects with RETURNING support; [`build_for`]
    /// rejects the combination otherwise.
    ///
    /// [`build_for`]: InsertBuilder::build_for
    pub fn returning(mut self, column: &str) -> Self {
        self.returning = Some(column.to_string());
        self
    }

    /// Finalize for the default [`Postgres`] dialect.
    pub fn build(self) -> QueryResult<Statement> {
        self.build_for(&Postgres)
    }

    /// Finalize for the given dialect.
    pub fn build_for(self, dialect: &dyn Dialect) -> QueryResult<Statement> {
        if !self.set_fields.is_empty() && !self.rows.is_empty() {
            return Err(Error::validation(
                "INSERT cannot mix set() with columns()/row()",
            ));
        }
        if self.set_fields.is_empty() && self.rows.iter().all(Vec::is_empty) {
            return Err(Error::validation("INSERT requires at least one value"));
        }
        if let Some(column) = &self.returning
            && !dialect.supports_returning()
        {
            return Err(Error::validation(format!(
                "dialect '{}' cannot return generated column '{column}'",
                dialect.name()
            )));
        }

        let mut ctx = RenderCtx::new(dialect);
        let mut sql = String::from("INSERT INTO ");
        ctx.ident(&self.table, &mut sql)?;

        let (columns, rows) = if self.set_fields.is_empty() {
            (self.columns.clone(), self.rows.clone())
        } else {
            let (cols, vals): (Vec<_>, Vec<_>) = self.set_fields.iter().cloned().unzip();
            (cols, vec![vals])
        };

        if !columns.is_empty() {
            sql.push_str(" (");
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                ctx.ident(column, &mut sql)?;
            }
            sql.push(')');
        }

        sql.push_str(" VALUES ");
        for (i, row) in rows.iter().enumerate() {
            if !columns.is_empty() && row.len() != columns.len() {
                return Err(Error::validation(format!(
                    "INSERT row {i} has {} values for {} columns",
                    row.len(),
                    columns.len()
                )));
            }
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('(');
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    sql.push_str(", ");
                }
                ctx.bind(value.clone(), &mut sql);
            }
            sql.push(')');
        }

        if let Some(column) = &self.returning {
            sql.push_str(" RETURNING ");
            ctx.ident(column, &mut sql)?;
        }

        let (params, placeholders) = ctx.finish();
        Statement::new(
            StatementKind::Insert,
            self.table,
            sql,
            params,
            placeholders,
            self.returning,
            dialect.name(),
        )
    }
}
