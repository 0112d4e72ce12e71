//! Predicate tree for WHERE clauses.
//!
//! Conditions compose as a tree of [`Expr`] nodes (comparisons, null checks,
//! IN lists, BETWEEN, and AND/OR/NOT groups). Rendering walks the tree once,
//! emitting dialect placeholders and collecting bindings in the same pass, so
//! placeholder indices are computed, never patched into strings afterwards.
//! There is deliberately no raw-fragment node: every column name goes through
//! [`Ident`] and every value through a binding.

use crate::dialect::Dialect;
use crate::error::QueryResult;
use crate::ident::Ident;
use crate::value::{IntoValue, SqlValue};

/// Shared render state: the dialect, collected bindings, and the running
/// placeholder count for the whole statement.
pub(crate) struct RenderCtx<'d> {
    dialect: &'d dyn Dialect,
    params: Vec<SqlValue>,
}

impl<'d> RenderCtx<'d> {
    pub(crate) fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            params: Vec::new(),
        }
    }

    /// Emit the next placeholder and collect its binding.
    pub(crate) fn bind(&mut self, value: SqlValue, out: &mut String) {
        self.params.push(value);
        self.dialect.write_placeholder(self.params.len(), out);
    }

    /// Validate and render an identifier.
    pub(crate) fn ident(&self, name: &str, out: &mut String) -> QueryResult<()> {
        Ident::parse(name)?.write_sql(self.dialect, out);
        Ok(())
    }

    /// Bindings collected so far; the count doubles as the placeholder count.
    pub(crate) fn finish(self) -> (Vec<SqlValue>, usize) {
        let count = self.params.len();
        (self.params, count)
    }
}

/// One node of the predicate tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// All children must hold.
    And(Vec<Expr>),
    /// At least one child must hold.
    Or(Vec<Expr>),
    /// Negation of the child.
    Not(Box<Expr>),
    /// `column op <binding>`
    Compare {
        column: String,
        op: &'static str,
        value: SqlValue,
    },
    /// `column IS [NOT] NULL`
    NullCheck { column: String, is_null: bool },
    /// `column [NOT] IN (<bindings>)`
    InList {
        column: String,
        values: Vec<SqlValue>,
        negated: bool,
    },
    /// `column [NOT] BETWEEN <binding> AND <binding>`
    Between {
        column: String,
        low: SqlValue,
        high: SqlValue,
        negated: bool,
    },
    /// Always true; produced by `not_in` with an empty list.
    True,
    /// Always false; produced by `in_list` with an empty list.
    False,
}

impl Expr {
    pub fn and(children: Vec<Expr>) -> Expr {
        Expr::And(children)
    }

    pub fn or(children: Vec<Expr>) -> Expr {
        Expr::Or(children)
    }

    pub fn not(child: Expr) -> Expr {
        Expr::Not(Box::new(child))
    }

    fn compare(column: impl Into<String>, op: &'static str, value: impl IntoValue) -> Expr {
        Expr::Compare {
            column: column.into(),
            op,
            value: value.into_value(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl IntoValue) -> Expr {
        Expr::compare(column, "=", value)
    }

    pub fn ne(column: impl Into<String>, value: impl IntoValue) -> Expr {
        Expr::compare(column, "!=", value)
    }

    pub fn gt(column: impl Into<String>, value: impl IntoValue) -> Expr {
        Expr::compare(column, ">", value)
    }

    pub fn gte(column: impl Into<String>, value: impl IntoValue) -> Expr {
        Expr::compare(column, ">=", value)
    }

    pub fn lt(column: impl Into<String>, value: impl IntoValue) -> Expr {
        Expr::compare(column, "<", value)
    }

    pub fn lte(column: impl Into<String>, value: impl IntoValue) -> Expr {
        Expr::compare(column, "<=", value)
    }

    pub fn like(column: impl Into<String>, pattern: impl IntoValue) -> Expr {
        Expr::compare(column, "LIKE", pattern)
    }

    pub fn not_like(column: impl Into<String>, pattern: impl IntoValue) -> Expr {
        Expr::compare(column, "NOT LIKE", pattern)
    }

    pub fn is_null(column: impl Into<String>) -> Expr {
        Expr::NullCheck {
            column: column.into(),
            is_null: true,
        }
    }

    pub fn is_not_null(column: impl Into<String>) -> Expr {
        Expr::NullCheck {
            column: column.into(),
            is_null: false,
        }
    }

    /// `column IN (values...)`. An empty list can never match.
    pub fn in_list<T: IntoValue>(column: impl Into<String>, values: Vec<T>) -> Expr {
        if values.is_empty() {
            return Expr::False;
        }
        Expr::InList {
            column: column.into(),
            values: values.into_iter().map(IntoValue::into_value).collect(),
            negated: false,
        }
    }

    /// `column NOT IN (values...)`. An empty list always matches.
    pub fn not_in<T: IntoValue>(column: impl Into<String>, values: Vec<T>) -> Expr {
        if values.is_empty() {
            return Expr::True;
        }
        Expr::InList {
            column: column.into(),
            values: values.into_iter().map(IntoValue::into_value).collect(),
            negated: true,
        }
    }

    pub fn between(column: impl Into<String>, low: impl IntoValue, high: impl IntoValue) -> Expr {
        Expr::Between {
            column: column.into(),
            low: low.into_value(),
            high: high.into_value(),
            negated: false,
        }
    }

    pub fn not_between(
        column: impl Into<String>,
        low: impl IntoValue,
        high: impl IntoValue,
    ) -> Expr {
        Expr::Between {
            column: column.into(),
            low: low.into_value(),
            high: high.into_value(),
            negated: true,
        }
    }

    /// Whether the node contributes no condition.
    pub fn is_empty(&self) -> bool {
        match self {
            Expr::And(children) | Expr::Or(children) => children.iter().all(Expr::is_empty),
            Expr::Not(child) => child.is_empty(),
            _ => false,
        }
    }

    /// Render this node, emitting placeholders and bindings through `ctx`.
    pub(crate) fn write_sql(&self, ctx: &mut RenderCtx<'_>, out: &mut String) -> QueryResult<()> {
        match self {
            Expr::And(children) => write_group(children, " AND ", ctx, out),
            Expr::Or(children) => write_group(children, " OR ", ctx, out),
            Expr::Not(child) => {
                if child.is_empty() {
                    return Ok(());
                }
                out.push_str("NOT (");
                child.write_sql(ctx, out)?;
                out.push(')');
                Ok(())
            }
            Expr::Compare { column, op, value } => {
                ctx.ident(column, out)?;
                out.push(' ');
                out.push_str(op);
                out.push(' ');
                ctx.bind(value.clone(), out);
                Ok(())
            }
            Expr::NullCheck { column, is_null } => {
                ctx.ident(column, out)?;
                out.push_str(if *is_null { " IS NULL" } else { " IS NOT NULL" });
                Ok(())
            }
            Expr::InList {
                column,
                values,
                negated,
            } => {
                ctx.ident(column, out)?;
                out.push_str(if *negated { " NOT IN (" } else { " IN (" });
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    ctx.bind(value.clone(), out);
                }
                out.push(')');
                Ok(())
            }
            Expr::Between {
                column,
                low,
                high,
                negated,
            } => {
                ctx.ident(column, out)?;
                out.push_str(if *negated { " NOT BETWEEN " } else { " BETWEEN " });
                ctx.bind(low.clone(), out);
                out.push_str(" AND ");
                ctx.bind(high.clone(), out);
                Ok(())
            }
            Expr::True => {
                out.push_str("1=1");
                Ok(())
            }
            Expr::False => {
                out.push_str("1=0");
                Ok(())
            }
        }
    }
}

/// Render an AND/OR group, parenthesizing children of the opposite
/// connective so precedence survives nesting.
fn write_group(
    children: &[Expr],
    sep: &str,
    ctx: &mut RenderCtx<'_>,
    out: &mut String,
) -> QueryResult<()> {
    let mut first = true;
    for child in children {
        if child.is_empty() {
            continue;
        }
        if !first {
            out.push_str(sep);
        }
        first = false;
        let wrap = matches!(
            (sep, child),
            (" AND ", Expr::Or(_)) | (" OR ", Expr::And(_))
        );
        if wrap {
            out.push('(');
            child.write_sql(ctx, out)?;
            out.push(')');
        } else {
            child.write_sql(ctx, out)?;
        }
    }
    Ok(())
}

/// Accumulator for a builder's WHERE clause: conditions added one at a time,
/// joined by AND.
#[derive(Clone, Debug, Default)]
pub struct ExprGroup {
    exprs: Vec<Expr>,
}

impl ExprGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.iter().all(Expr::is_empty)
    }

    pub fn push(&mut self, expr: Expr) {
        self.exprs.push(expr);
    }

    /// Render ` WHERE ...` if any condition was added.
    pub(crate) fn write_where(&self, ctx: &mut RenderCtx<'_>, out: &mut String) -> QueryResult<()> {
        if self.is_empty() {
            return Ok(());
        }
        out.push_str(" WHERE ");
        Expr::And(self.exprs.clone()).write_sql(ctx, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Postgres, Sqlite};

    fn render(expr: &Expr) -> (String, Vec<SqlValue>) {
        let mut ctx = RenderCtx::new(&Postgres);
        let mut out = String::new();
        expr.write_sql(&mut ctx, &mut out).unwrap();
        let (params, _) = ctx.finish();
        (out, params)
    }

    #[test]
    fn simple_compare() {
        let (sql, params) = render(&Expr::eq("name", "alice"));
        assert_eq!(sql, "name = $1");
        assert_eq!(params, vec![SqlValue::Text("alice".into())]);
    }

    #[test]
    fn and_group_numbers_sequentially() {
        let expr = Expr::and(vec![Expr::eq("status", "active"), Expr::gt("age", 18)]);
        let (sql, params) = render(&expr);
        assert_eq!(sql, "status = $1 AND age > $2");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn or_inside_and_is_parenthesized() {
        let expr = Expr::and(vec![
            Expr::eq("status", "active"),
            Expr::or(vec![Expr::eq("role", "admin"), Expr::eq("role", "owner")]),
        ]);
        let (sql, _) = render(&expr);
        assert_eq!(sql, "status = $1 AND (role = $2 OR role = $3)");
    }

    #[test]
    fn and_inside_or_is_parenthesized() {
        let expr = Expr::or(vec![
            Expr::eq("kind", "bot"),
            Expr::and(vec![Expr::eq("kind", "user"), Expr::is_null("banned_at")]),
        ]);
        let (sql, _) = render(&expr);
        assert_eq!(sql, "kind = $1 OR (kind = $2 AND banned_at IS NULL)");
    }

    #[test]
    fn not_wraps_child() {
        let (sql, _) = render(&Expr::not(Expr::eq("active", true)));
        assert_eq!(sql, "NOT (active = $1)");
    }

    #[test]
    fn in_list_binds_each_value() {
        let (sql, params) = render(&Expr::in_list("id", vec![1, 2, 3]));
        assert_eq!(sql, "id IN ($1, $2, $3)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn empty_in_list_never_matches() {
        let (sql, params) = render(&Expr::in_list::<i64>("id", vec![]));
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn empty_not_in_always_matches() {
        let (sql, _) = render(&Expr::not_in::<i64>("id", vec![]));
        assert_eq!(sql, "1=1");
    }

    #[test]
    fn between_binds_both_ends() {
        let (sql, params) = render(&Expr::between("age", 18, 65));
        assert_eq!(sql, "age BETWEEN $1 AND $2");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn sqlite_placeholders() {
        let mut ctx = RenderCtx::new(&Sqlite);
        let mut out = String::new();
        Expr::and(vec![Expr::eq("a", 1), Expr::eq("b", 2)])
            .write_sql(&mut ctx, &mut out)
            .unwrap();
        assert_eq!(out, "a = ? AND b = ?");
    }

    #[test]
    fn column_names_are_validated() {
        let mut ctx = RenderCtx::new(&Postgres);
        let mut out = String::new();
        let err = Expr::eq("name; DROP TABLE users", 1)
            .write_sql(&mut ctx, &mut out)
            .unwrap_err();
        assert!(err.is_build_error());
    }

    #[test]
    fn group_skips_empty_children() {
        let expr = Expr::and(vec![Expr::And(vec![]), Expr::eq("x", 1)]);
        let (sql, _) = render(&expr);
        assert_eq!(sql, "x = $1");
    }
}
