//! UPDATE statement builder.

use crate::dialect::{Dialect, Postgres};
use crate::error::{Error, QueryResult};
use crate::qb::expr::{Expr, ExprGroup, RenderCtx};
use crate::statement::{Statement, StatementKind};
use crate::value::{IntoValue, SqlValue};

/// Fluent UPDATE builder.
///
/// An UPDATE with no predicate is refused at build time with
/// [`Error::UnscopedMutation`] unless [`allow_unscoped`] was called.
///
/// [`allow_unscoped`]: UpdateBuilder::allow_unscoped
#[derive(Clone, Debug)]
pub struct UpdateBuilder {
    table: String,
    set_fields: Vec<(String, SqlValue)>,
    where_group: ExprGroup,
    allow_unscoped: bool,
}

impl UpdateBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            set_fields: Vec::new(),
            where_group: ExprGroup::new(),
            allow_unscoped: false,
        }
    }

    /// Bind a new value for a column.
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

    /// Permit building without any predicate (whole-table update).
    pub fn allow_unscoped(mut self) -> Self {
        self.allow_unscoped = true;
        self
    }

    // ==================== Predicates ====================

    pub fn eq(mut self, column: &str, value: impl IntoValue) -> Self {
        self.where_group.push(Expr::eq(column, value));
        self
    }

    pub fn ne(mut self, column: &str, value: impl IntoValue) -> Self {
        self.where_group.push(Expr::ne(column, value));
        self
    }

    pub fn gt(mut self, column: &str, value: impl IntoValue) -> Self {
        self.where_group.push(Expr::gt(column, value));
        self
    }

    pub fn gte(mut self, column: &str, value: impl IntoValue) -> Self {
        self.where_group.push(Expr::gte(column, value));
        self
    }

    pub fn lt(mut self, column: &str, value: impl IntoValue) -> Self {
        self.where_group.push(Expr::lt(column, value));
        self
    }

    pub fn lte(mut self, column: &str, value: impl IntoValue) -> Self {
        self.where_group.push(Expr::lte(column, value));
        self
    }

    pub fn in_list<T: IntoValue>(mut self, column: &str, values: Vec<T>) -> Self {
        self.where_group.push(Expr::in_list(column, values));
        self
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.where_group.push(Expr::is_null(column));
        self
    }

    pub fn is_not_null(mut self, column: &str) -> Self {
        self.where_group.push(Expr::is_not_null(column));
        self
    }

    /// Add a pre-built expression tree (for OR/NOT grouping).
    pub fn and_expr(mut self, expr: Expr) -> Self {
        self.where_group.push(expr);
        self
    }

    // ==================== Finalize ====================

    /// Finalize for the default [`Postgres`] dialect.
    pub fn build(self) -> QueryResult<Statement> {
        self.build_for(&Postgres)
    }

    /// Finalize for the given dialect.
    pub fn build_for(self, dialect: &dyn Dialect) -> QueryResult<Statement> {
        if self.set_fields.is_empty() {
            return Err(Error::validation("UPDATE requires at least one SET value"));
        }
        if self.where_group.is_empty() && !self.allow_unscoped {
            return Err(Error::UnscopedMutation(self.table));
        }

        let mut ctx = RenderCtx::new(dialect);
        let mut sql = String::from("UPDATE ");
        ctx.ident(&self.table, &mut sql)?;
        sql.push_str(" SET ");
        for (i, (column, value)) in self.set_fields.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            ctx.ident(column, &mut sql)?;
            sql.push_str(" = ");
            ctx.bind(value.clone(), &mut sql);
        }

        self.where_group.write_where(&mut ctx, &mut sql)?;

        let (params, placeholders) = ctx.finish();
        Statement::new(
            StatementKind::Update,
            self.table,
            sql,
            params,
            placeholders,
            None,
            dialect.name(),
        )
    }
}
