//! Demo: building statements for multiple dialects, no database required.
//!
//! Run with:
//!   cargo run --example statement_builder -p quarry

use quarry::dialect::{MySql, Sqlite};
use quarry::{Expr, QueryResult, qb};

fn main() -> QueryResult<()> {
    // A moderately involved SELECT.
    let select = qb::select("users u")
        .columns(&["u.id", "u.name", "o.total"])
        .left_join("orders o", "o.user_id", "u.id")
        .gte("u.age", 18)
        .and_expr(Expr::or(vec![
            Expr::eq("u.role", "admin"),
            Expr::eq("u.role", "owner"),
        ]))
        .order_by("u.name")
        .limit(10);

    let pg = select.clone().build()?;
    println!("postgres: {}", pg.sql());
    println!("  params: {:?}", pg.params());

    let lite = select.clone().build_for(&Sqlite)?;
    println!("sqlite:   {}", lite.sql());

    let my = select.build_for(&MySql)?;
    println!("mysql:    {}", my.sql());

    // Write statements.
    let insert = qb::insert("users")
        .set("name", "alice")
        .set("age", 30)
        .returning("id")
        .build()?;
    println!("insert:   {}", insert.sql());

    let update = qb::update("users")
        .set("age", 31)
        .eq("name", "alice")
        .build()?;
    println!("update:   {}", update.sql());

    // Unscoped mutations refuse to build.
    let err = qb::delete("users").build().unwrap_err();
    println!("unscoped delete: {err}");

    // Hostile identifiers are rejected, hostile values are bound.
    let err = qb::select("users; DROP TABLE users").build().unwrap_err();
    println!("hostile table: {err}");

    let bound = qb::select("users")
        .eq("name", "'; DROP TABLE users; --")
        .build()?;
    println!("hostile value stays bound: {}", bound.sql());

    Ok(())
}
