//! SELECT statement builder.

use crate::dialect::{Dialect, Postgres};
use crate::error::QueryResult;
use crate::qb::expr::{Expr, ExprGroup, RenderCtx};
use crate::qb::write_table_ref;
use crate::statement::{Statement, StatementKind};
use crate::value::IntoValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

/// An equi-join descriptor: target table (optionally aliased) and the two
/// joined columns.
#[derive(Clone, Debug)]
struct Join {
    kind: JoinKind,
    table: String,
    left: String,
    right: String,
}

/// Fluent SELECT builder.
///
/// Each call returns the builder with the additional clause; [`build`]
/// finalizes into an immutable [`Statement`].
///
/// [`build`]: SelectBuilder::build
#[derive(Clone, Debug)]
pub struct SelectBuilder {
    table: String,
    columns: Vec<String>,
    joins: Vec<Join>,
    where_group: ExprGroup,
    group_by: Vec<String>,
    order_by: Vec<(String, bool)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SelectBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            joins: Vec::new(),
            where_group: ExprGroup::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    // ==================== Columns ====================

    /// Append one result column. With no columns, the statement selects `*`.
    pub fn column(mut self, column: &str) -> Self {
        self.columns.push(column.to_string());
        self
    }

    /// Append several result columns.
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns.extend(columns.iter().map(|c| c.to_string()));
        self
    }

    // ==================== Joins ====================

    /// `INNER JOIN table ON left = right`. The table may carry an alias
    /// (`"orders o"`).
    pub fn inner_join(self, table: &str, left: &str, right: &str) -> Self {
        self.join(JoinKind::Inner, table, left, right)
    }

    /// `LEFT JOIN table ON left = right`.
    pub fn left_join(self, table: &str, left: &str, right: &str) -> Self {
        self.join(JoinKind::Left, table, left, right)
    }

    /// `RIGHT JOIN table ON left = right`.
    pub fn right_join(self, table: &str, left: &str, right: &str) -> Self {
        self.join(JoinKind::Right, table, left, right)
    }

    fn join(mut self, kind: JoinKind, table: &str, left: &str, right: &str) -> Self {
        self.joins.push(Join {
            kind,
            table: table.to_string(),
            left: left.to_string(),
            right: right.to_string(),
        });
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

    pub fn like(mut self, column: &str, pattern: impl IntoValue) -> Self {
        self.where_group.push(Expr::like(column, pattern));
        self
    }

    pub fn not_like(mut self, column: &str, pattern: impl IntoValue) -> Self {
        self.where_group.push(Expr::not_like(column, pattern));
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

    pub fn in_list<T: IntoValue>(mut self, column: &str, values: Vec<T>) -> Self {
        self.where_group.push(Expr::in_list(column, values));
        self
    }

    pub fn not_in<T: IntoValue>(mut self, column: &str, values: Vec<T>) -> Self {
        self.where_group.push(Expr::not_in(column, values));
        self
    }

    pub fn between(mut self, column: &str, low: impl IntoValue, high: impl IntoValue) -> Self {
        self.where_group.push(Expr::between(column, low, high));
        self
    }

    /// Add a condition only when the value is present.
    pub fn eq_opt<T: IntoValue>(self, column: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.eq(column, v),
            None => self,
        }
    }

    /// Add a pre-built expression tree (for OR/NOT grouping).
    pub fn and_expr(mut self, expr: Expr) -> Self {
        self.where_group.push(expr);
        self
    }

    // ==================== Grouping, ordering, pagination ====================

    /// Append a GROUP BY column.
    pub fn group_by(mut self, column: &str) -> Self {
        self.group_by.push(column.to_string());
        self
    }

    /// Append `ORDER BY column ASC`.
    pub fn order_by(mut self, column: &str) -> Self {
        self.order_by.push((column.to_string(), true));
        self
    }

    /// Append `ORDER BY column DESC`.
    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.order_by.push((column.to_string(), false));
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    // ==================== Finalize ====================

    /// Finalize for the default [`Postgres`] dialect.
    pub fn build(self) -> QueryResult<Statement> {
        self.build_for(&Postgres)
    }

    /// Finalize for the given dialect, validating every identifier.
    pub fn build_for(self, dialect: &dyn Dialect) -> QueryResult<Statement> {
        let mut ctx = RenderCtx::new(dialect);
        let mut sql = String::from("SELECT ");

        if self.columns.is_empty() {
            sql.push('*');
        } else {
            for (i, column) in self.columns.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                ctx.ident(column, &mut sql)?;
            }
        }

        sql.push_str(" FROM ");
        write_table_ref(&ctx, &self.table, &mut sql)?;

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join.kind.keyword());
            sql.push(' ');
            write_table_ref(&ctx, &join.table, &mut sql)?;
            sql.push_str(" ON ");
            ctx.ident(&join.left, &mut sql)?;
            sql.push_str(" = ");
            ctx.ident(&join.right, &mut sql)?;
        }

        self.where_group.write_where(&mut ctx, &mut sql)?;

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            for (i, column) in self.group_by.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                ctx.ident(column, &mut sql)?;
            }
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            for (i, (column, asc)) in self.order_by.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                ctx.ident(column, &mut sql)?;
                sql.push_str(if *asc { " ASC" } else { " DESC" });
            }
        }

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ");
            sql.push_str(&limit.to_string());
        }
        if let Some(offset) = self.offset {
            sql.push_str(" OFFSET ");
            sql.push_str(&offset.to_string());
        }

        let (params, placeholders) = ctx.finish();
        Statement::new(
            StatementKind::Select,
            self.table,
            sql,
            params,
            placeholders,
            None,
            dialect.name(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_star_by_default() {
        let stmt = SelectBuilder::new("users").build().unwrap();
        assert_eq!(stmt.sql(), "SELECT * FROM users");
        assert!(stmt.params().is_empty());
    }

    #[test]
    fn select_with_columns_and_predicates() {
        let stmt = SelectBuilder::new("users")
            .columns(&["id", "name"])
            .gte("age", 18)
            .order_by("name")
            .limit(10)
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT id, name FROM users WHERE age >= $1 ORDER BY name ASC LIMIT 10"
        );
        assert_eq!(stmt.params().len(), 1);
    }

    #[test]
    fn select_with_join_and_alias() {
        let stmt = SelectBuilder::new("users u")
            .inner_join("orders o", "o.user_id", "u.id")
            .eq("u.status", "active")
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT * FROM users u INNER JOIN orders o ON o.user_id = u.id WHERE u.status = $1"
        );
    }

    #[test]
    fn select_with_group_by_and_offset() {
        let stmt = SelectBuilder::new("orders")
            .columns(&["user_id"])
            .group_by("user_id")
            .limit(5)
            .offset(10)
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT user_id FROM orders GROUP BY user_id LIMIT 5 OFFSET 10"
        );
    }

    #[test]
    fn or_grouping_via_expr_tree() {
        let stmt = SelectBuilder::new("users")
            .eq("status", "active")
            .and_expr(Expr::or(vec![
                Expr::eq("role", "admin"),
                Expr::eq("role", "owner"),
            ]))
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT * FROM users WHERE status = $1 AND (role = $2 OR role = $3)"
        );
        assert_eq!(stmt.params().len(), 3);
    }

    #[test]
    fn eq_opt_skips_absent_values() {
        let status: Option<&str> = None;
        let stmt = SelectBuilder::new("users")
            .eq_opt("status", status)
            .eq_opt("name", Some("alice"))
            .build()
            .unwrap();
        assert_eq!(stmt.sql(), "SELECT * FROM users WHERE name = $1");
    }

    #[test]
    fn malicious_column_fails_build() {
        let err = SelectBuilder::new("users")
            .column("id; DROP TABLE users")
            .build()
            .unwrap_err();
        assert!(err.is_build_error());
    }

    #[test]
    fn malicious_table_fails_build() {
        assert!(SelectBuilder::new("users WHERE 1=1; --").build().is_err());
    }
}
