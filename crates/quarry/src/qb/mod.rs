//! Statement builders.
//!
//! Fluent, consuming builders for the four statement kinds. Values are never
//! interpolated into statement text: every value becomes a bound parameter
//! with its placeholder index computed during the single rendering pass, and
//! every identifier is validated against the allow-list before it is written.
//!
//! # Usage
//!
//! ```ignore
//! use quarry::qb;
//!
//! let stmt = qb::select("users")
//!     .columns(&["id", "name"])
//!     .gte("age", 18)
//!     .order_by("name")
//!     .limit(10)
//!     .build()?;
//!
//! let inserted = qb::insert("users")
//!     .set("name", "alice")
//!     .returning("id")
//!     .build()?;
//!
//! qb::update("users")
//!     .set("status", "inactive")
//!     .eq("id", 7)
//!     .build()?;
//!
//! qb::delete("users")
//!     .eq("id", 7)
//!     .build()?;
//! ```

mod delete;
mod expr;
mod insert;
mod select;
mod update;

pub use delete::DeleteBuilder;
pub use expr::{Expr, ExprGroup};
pub use insert::InsertBuilder;
pub use select::SelectBuilder;
pub use update::UpdateBuilder;

pub(crate) use expr::RenderCtx;

use crate::error::{Error, QueryResult};

/// Create a SELECT builder for the given table.
pub fn select(table: &str) -> SelectBuilder {
    SelectBuilder::new(table)
}

/// Create an INSERT builder for the given table.
pub fn insert(table: &str) -> InsertBuilder {
    InsertBuilder::new(table)
}

/// Alias for [`insert`].
pub fn insert_into(table: &str) -> InsertBuilder {
    InsertBuilder::new(table)
}

/// Create an UPDATE builder for the given table.
pub fn update(table: &str) -> UpdateBuilder {
    UpdateBuilder::new(table)
}

/// Create a DELETE builder for the given table.
pub fn delete(table: &str) -> DeleteBuilder {
    DeleteBuilder::new(table)
}

/// Alias for [`delete`].
pub fn delete_from(table: &str) -> DeleteBuilder {
    DeleteBuilder::new(table)
}

/// Render a table reference that may carry an alias: `orders`, `orders o`,
/// or `orders AS o`. Both the base name and the alias pass identifier
/// validation.
pub(crate) fn write_table_ref(
    ctx: &RenderCtx<'_>,
    table: &str,
    out: &mut String,
) -> QueryResult<()> {
    // Quoted names may contain spaces; no alias syntax for those.
    if table.starts_with('"') {
        return ctx.ident(table, out);
    }
    let parts: Vec<&str> = table.split_whitespace().collect();
    match parts.as_slice() {
        [name] => ctx.ident(name, out),
        [name, alias] => {
            ctx.ident(name, out)?;
            out.push(' ');
            ctx.ident(alias, out)
        }
        [name, kw, alias] if kw.eq_ignore_ascii_case("as") => {
            ctx.ident(name, out)?;
            out.push_str(" AS ");
            ctx.ident(alias, out)
        }
        _ => Err(Error::validation(format!(
            "malformed table reference '{table}'"
        ))),
    }
}

#[cfg(test)]
mod tests;
