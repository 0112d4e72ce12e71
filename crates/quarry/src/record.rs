//! Typed, mutable views over result rows.

use crate::error::{Error, QueryResult};
use crate::qb::{Expr, UpdateBuilder};
use crate::statement::Statement;
use crate::value::{IntoValue, SqlValue};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio_postgres::Row;
use uuid::Uuid;

/// A typed, mutable, in-memory view of one result row.
///
/// Holds a name-indexed mapping of column values plus a per-field
/// modified-since-load flag. Records own no connection: mutations stay in
/// memory until written back through [`to_update_statement`].
///
/// [`to_update_statement`]: Record::to_update_statement
#[derive(Clone, Debug, Default)]
pub struct Record {
    /// Column names in result-set order; drives deterministic statement text.
    columns: Vec<String>,
    values: HashMap<String, SqlValue>,
    dirty: HashSet<String>,
}

impl Record {
    /// An empty record with no columns.
    pub fn new() -> Record {
        Record::default()
    }

    /// Materialize a record from one driver row, decoding every column
    /// through the value codec.
    pub fn from_row(row: &Row) -> QueryResult<Record> {
        let mut record = Record::new();
        for idx in 0..row.columns().len() {
            let name = row.columns()[idx].name().to_string();
            let value = SqlValue::from_row_column(row, idx)?;
            // Duplicate names (e.g. from joins): the last occurrence wins,
            // the column is listed once.
            if record.values.insert(name.clone(), value).is_none() {
                record.columns.push(name);
            }
        }
        Ok(record)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names, in result-set order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    /// Fetch a column's current value.
    pub fn get(&self, column: &str) -> QueryResult<&SqlValue> {
        self.values
            .get(column)
            .ok_or_else(|| Error::UnknownColumn(column.to_string()))
    }

    /// Set a column value in memory and mark the field dirty.
    ///
    /// A column that was not part of the originating result set is appended.
    /// Nothing is written through to the store.
    pub fn set(&mut self, column: &str, value: impl IntoValue) {
        if !self.values.contains_key(column) {
            self.columns.push(column.to_string());
        }
        self.values.insert(column.to_string(), value.into_value());
        self.dirty.insert(column.to_string());
    }

    // ==================== Typed getters ====================
    //
    // Each returns Ok(None) for SQL NULL, Err(UnknownColumn) for a column
    // missing from the record, and Err(Decode) when the stored value cannot
    // coerce to the requested type.

    fn coerced<T>(
        &self,
        column: &str,
        kind: &str,
        f: impl FnOnce(&SqlValue) -> Option<T>,
    ) -> QueryResult<Option<T>> {
        let value = self.get(column)?;
        if value.is_null() {
            return Ok(None);
        }
        f(value)
            .map(Some)
            .ok_or_else(|| Error::decode(column, format!("{} does not coerce to {kind}", value.kind())))
    }

    pub fn get_i64(&self, column: &str) -> QueryResult<Option<i64>> {
        self.coerced(column, "int", SqlValue::as_i64)
    }

    pub fn get_f64(&self, column: &str) -> QueryResult<Option<f64>> {
        self.coerced(column, "float", SqlValue::as_f64)
    }

    pub fn get_bool(&self, column: &str) -> QueryResult<Option<bool>> {
        self.coerced(column, "bool", SqlValue::as_bool)
    }

    pub fn get_text(&self, column: &str) -> QueryResult<Option<String>> {
        self.coerced(column, "text", SqlValue::as_text)
    }

    pub fn get_bytes(&self, column: &str) -> QueryResult<Option<Vec<u8>>> {
        self.coerced(column, "bytes", |v| v.as_bytes().map(<[u8]>::to_vec))
    }

    pub fn get_timestamp(&self, column: &str) -> QueryResult<Option<DateTime<Utc>>> {
        self.coerced(column, "timestamp", SqlValue::as_timestamp)
    }

    pub fn get_uuid(&self, column: &str) -> QueryResult<Option<Uuid>> {
        self.coerced(column, "uuid", SqlValue::as_uuid)
    }

    // ==================== Dirty tracking ====================

    pub fn is_dirty(&self, column: &str) -> bool {
        self.dirty.contains(column)
    }

    /// Dirty column names, in result-set order.
    pub fn dirty_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| self.dirty.contains(c.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Forget all modifications (e.g. after a successful write-back).
    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    // ==================== Write-back ====================

    /// Equality predicates over every current field, for locating this
    /// record's row by example. NULL fields become IS NULL checks.
    pub fn to_match_expr(&self) -> Expr {
        let children = self
            .columns
            .iter()
            .map(|column| {
                let value = &self.values[column.as_str()];
                if value.is_null() {
                    Expr::is_null(column.as_str())
                } else {
                    Expr::eq(column.as_str(), value)
                }
            })
            .collect();
        Expr::And(children)
    }

    /// Build an UPDATE touching only dirty fields, keyed by the current
    /// values of `key_columns`.
    ///
    /// Fails with [`Error::NoDirtyFields`] when nothing changed and
    /// [`Error::MissingKeyValue`] when a key column is absent or NULL.
    pub fn to_update_statement(
        &self,
        table: &str,
        key_columns: &[&str],
    ) -> QueryResult<Statement> {
        if self.dirty.is_empty() {
            return Err(Error::NoDirtyFields);
        }

        let mut builder = UpdateBuilder::new(table);
        for column in &self.columns {
            if self.dirty.contains(column.as_str()) {
                builder = builder.set(column, &self.values[column.as_str()]);
            }
        }
        for key in key_columns {
            let value = self
                .values
                .get(*key)
                .filter(|v| !v.is_null())
                .ok_or_else(|| Error::MissingKeyValue((*key).to_string()))?;
            builder = builder.eq(key, value);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(fields: &[(&str, SqlValue)]) -> Record {
        // Build a record the way the query layer would, then reset the dirty
        // set to simulate a freshly loaded row.
        let mut record = Record::new();
        for (name, value) in fields {
            record.set(name, value.clone());
        }
        record.clear_dirty();
        record
    }

    #[test]
    fn get_unknown_column_fails() {
        let record = loaded(&[("a", SqlValue::Int(1))]);
        assert!(matches!(
            record.get("missing").unwrap_err(),
            Error::UnknownColumn(c) if c == "missing"
        ));
    }

    #[test]
    fn typed_getters_coerce() {
        let record = loaded(&[
            ("n", SqlValue::Text("42".into())),
            ("f", SqlValue::Int(3)),
            ("b", SqlValue::Int(1)),
        ]);
        assert_eq!(record.get_i64("n").unwrap(), Some(42));
        assert_eq!(record.get_f64("f").unwrap(), Some(3.0));
        assert_eq!(record.get_bool("b").unwrap(), Some(true));
    }

    #[test]
    fn null_reads_as_none() {
        let record = loaded(&[("a", SqlValue::Null)]);
        assert_eq!(record.get_i64("a").unwrap(), None);
        assert_eq!(record.get_text("a").unwrap(), None);
    }

    #[test]
    fn uncoercible_value_is_a_decode_error() {
        let record = loaded(&[("a", SqlValue::Bytes(vec![1, 2]))]);
        assert!(matches!(
            record.get_i64("a").unwrap_err(),
            Error::Decode { column, .. } if column == "a"
        ));
    }

    #[test]
    fn set_marks_dirty_and_appends_new_columns() {
        let mut record = loaded(&[("a", SqlValue::Int(1))]);
        assert!(!record.is_dirty("a"));

        record.set("a", 2);
        record.set("fresh", "x");
        assert!(record.is_dirty("a"));
        assert_eq!(record.dirty_columns(), vec!["a", "fresh"]);
        assert_eq!(record.columns(), &["a".to_string(), "fresh".to_string()]);
    }

    #[test]
    fn update_statement_touches_only_dirty_fields() {
        let mut record = loaded(&[
            ("id", SqlValue::Int(7)),
            ("a", SqlValue::Int(1)),
            ("b", SqlValue::Int(2)),
            ("c", SqlValue::Int(3)),
        ]);
        record.set("b", 20);

        let stmt = record.to_update_statement("t", &["id"]).unwrap();
        assert_eq!(stmt.sql(), "UPDATE t SET b = $1 WHERE id = $2");
        assert_eq!(
            stmt.params(),
            &[SqlValue::Int(20), SqlValue::Int(7)]
        );
    }

    #[test]
    fn update_statement_without_changes_fails() {
        let record = loaded(&[("id", SqlValue::Int(7))]);
        assert!(matches!(
            record.to_update_statement("t", &["id"]).unwrap_err(),
            Error::NoDirtyFields
        ));
    }

    #[test]
    fn update_statement_requires_key_values() {
        let mut record = loaded(&[("a", SqlValue::Int(1))]);
        record.set("a", 2);
        assert!(matches!(
            record.to_update_statement("t", &["id"]).unwrap_err(),
            Error::MissingKeyValue(c) if c == "id"
        ));
    }

    #[test]
    fn null_key_value_counts_as_missing() {
        let mut record = loaded(&[("id", SqlValue::Null), ("a", SqlValue::Int(1))]);
        record.set("a", 2);
        assert!(matches!(
            record.to_update_statement("t", &["id"]).unwrap_err(),
            Error::MissingKeyValue(c) if c == "id"
        ));
    }

    #[test]
    fn match_expr_covers_all_fields() {
        let record = loaded(&[
            ("id", SqlValue::Int(7)),
            ("name", SqlValue::Text("sam".into())),
            ("deleted_at", SqlValue::Null),
        ]);
        let stmt = crate::qb::select("users")
            .and_expr(record.to_match_expr())
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT * FROM users WHERE id = $1 AND name = $2 AND deleted_at IS NULL"
        );
    }

    #[test]
    fn multi_column_key() {
        let mut record = loaded(&[
            ("guild", SqlValue::Int(1)),
            ("member", SqlValue::Int(2)),
            ("rank", SqlValue::Text("officer".into())),
        ]);
        record.set("rank", "leader");

        let stmt = record.to_update_statement("ranks", &["guild", "member"]).unwrap();
        assert_eq!(
            stmt.sql(),
            "UPDATE ranks SET rank = $1 WHERE guild = $2 AND member = $3"
        );
    }
}
