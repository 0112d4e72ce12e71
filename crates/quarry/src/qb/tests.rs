//! Cross-builder tests: dialect targeting and injection resistance.

use super::*;
use crate::dialect::{MySql, Sqlite};
use crate::statement::StatementKind;
use crate::value::SqlValue;

#[test]
fn facade_constructors_set_statement_kind() {
    assert_eq!(
        select("t").build().unwrap().kind(),
        StatementKind::Select
    );
    assert_eq!(
        insert("t").set("a", 1).build().unwrap().kind(),
        StatementKind::Insert
    );
    assert_eq!(
        update("t").set("a", 1).eq("id", 1).build().unwrap().kind(),
        StatementKind::Update
    );
    assert_eq!(
        delete("t").eq("id", 1).build().unwrap().kind(),
        StatementKind::Delete
    );
}

#[test]
fn same_builder_targets_multiple_dialects() {
    let builder = select("users").eq("name", "alice").limit(1);

    let pg = builder.clone().build().unwrap();
    assert_eq!(pg.sql(), "SELECT * FROM users WHERE name = $1 LIMIT 1");
    assert_eq!(pg.dialect(), "postgres");

    let lite = builder.clone().build_for(&Sqlite).unwrap();
    assert_eq!(lite.sql(), "SELECT * FROM users WHERE name = ? LIMIT 1");

    let my = builder.build_for(&MySql).unwrap();
    assert_eq!(my.sql(), "SELECT * FROM users WHERE name = ? LIMIT 1");
}

#[test]
fn mysql_quotes_quoted_idents_with_backticks() {
    let stmt = select(r#""order""#).build_for(&MySql).unwrap();
    assert_eq!(stmt.sql(), "SELECT * FROM `order`");
}

#[test]
fn builder_reuse_does_not_disturb_built_statements() {
    let base = select("users").eq("status", "active");
    let first = base.clone().build().unwrap();
    let second = base.gt("age", 18).build().unwrap();

    // The earlier statement is unchanged by later builder calls.
    assert_eq!(first.sql(), "SELECT * FROM users WHERE status = $1");
    assert_eq!(
        second.sql(),
        "SELECT * FROM users WHERE status = $1 AND age > $2"
    );
}

#[test]
fn values_never_appear_in_statement_text() {
    let hostile = "'; DROP TABLE users; --";
    let stmt = select("users").eq("name", hostile).build().unwrap();
    assert!(!stmt.sql().contains("DROP"));
    assert_eq!(stmt.params(), &[SqlValue::Text(hostile.into())]);
}

#[test]
fn placeholder_count_matches_binding_count() {
    let stmt = update("users")
        .set("a", 1)
        .set("b", 2)
        .in_list("id", vec![1, 2, 3])
        .build()
        .unwrap();
    let rendered = stmt.sql().matches('$').count();
    assert_eq!(rendered, stmt.params().len());
}

#[test]
fn aliased_join_rejects_malformed_reference() {
    let err = select("users u")
        .inner_join("orders o ON 1=1; --", "o.user_id", "u.id")
        .build()
        .unwrap_err();
    assert!(err.is_build_error());
}
