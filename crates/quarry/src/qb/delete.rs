//! DELETE statement builder.

use crate::dialect::{Dialect, Postgres};
use crate::error::{Error, QueryResult};
use crate::qb::expr::{Expr, ExprGroup, RenderCtx};
use crate::statement::{Statement, StatementKind};
use crate::value::IntoValue;

/// Fluent DELETE builder.
///
/// A DELETE with no predicate is refused at build time with
/// [`Error::UnscopedMutation`] unless [`allow_unscoped`] was called.
///
/// [`allow_unscoped`]: DeleteBuilder::allow_unscoped
#[derive(Clone, Debug)]
pub struct DeleteBuilder {
    table: String,
    where_group: ExprGroup,
    allow_unscoped: bool,
}

impl DeleteBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            where_group: ExprGroup::new(),
            allow_unscoped: false,
        }
    }

    /// Permit building without any predicate (whole-table delete).
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

    pub fn not_in<T: IntoValue>(mut self, column: &str, values: Vec<T>) -> Self {
        self.where_group.push(Expr::not_in(column, values));
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
        if self.where_group.is_empty() && !self.allow_unscoped {
            return Err(Error::UnscopedMutation(self.table));
        }

        let mut ctx = RenderCtx::new(dialect);
        let mut sql = String::from("DELETE FROM ");
        ctx.ident(&self.table, &mut sql)?;
        self.where_group.write_where(&mut ctx, &mut sql)?;

        let (params, placeholders) = ctx.finish();
        Statement::new(
            StatementKind::Delete,
            self.table,
            sql,
            params,
            placeholders,
            None,
            dialect.name(),
        )
    }
}
