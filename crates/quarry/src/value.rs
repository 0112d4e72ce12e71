//! Typed values and the wire codec.
//!
//! [`SqlValue`] is the tagged variant behind every bound parameter and every
//! record field. Values never appear in statement text; they travel to the
//! store as bound parameters and come back through [`SqlValue::from_row_column`]
//! with the driver-reported column type as the hint.

use crate::error::{Error, QueryResult};
use bytes::BytesMut;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;
use tokio_postgres::Row;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use uuid::Uuid;

/// A dynamically typed column value.
///
/// Covers the store's scalar kinds: integers are widened to `i64`, floats to
/// `f64`; timestamps are carried in UTC.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    /// SQL NULL
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    Json(serde_json::Value),
}

impl SqlValue {
    /// Name of the value kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "bool",
            SqlValue::Int(_) => "int",
            SqlValue::Float(_) => "float",
            SqlValue::Text(_) => "text",
            SqlValue::Bytes(_) => "bytes",
            SqlValue::Timestamp(_) => "timestamp",
            SqlValue::Uuid(_) => "uuid",
            SqlValue::Json(_) => "json",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Decode one column of a driver row, using the reported column type as
    /// the hint.
    ///
    /// Column types outside the supported set fail with
    /// [`Error::UnsupportedValueType`]; a value the driver cannot map fails
    /// with [`Error::Decode`].
    pub fn from_row_column(row: &Row, idx: usize) -> QueryResult<SqlValue> {
        let column = &row.columns()[idx];
        let name = column.name();
        let ty = column.type_();

        fn get<'a, T>(row: &'a Row, idx: usize, name: &str) -> QueryResult<Option<T>>
        where
            T: tokio_postgres::types::FromSql<'a>,
        {
            row.try_get(idx).map_err(|e| Error::decode(name, e.to_string()))
        }

        // `Type` constants are not usable as match patterns, so dispatch on
        // the type name.
        let value = match ty.name() {
            "bool" => get::<bool>(row, idx, name)?.map(SqlValue::Bool),
            "int2" => get::<i16>(row, idx, name)?.map(|v| SqlValue::Int(v.into())),
            "int4" => get::<i32>(row, idx, name)?.map(|v| SqlValue::Int(v.into())),
            "int8" => get::<i64>(row, idx, name)?.map(SqlValue::Int),
            "float4" => get::<f32>(row, idx, name)?.map(|v| SqlValue::Float(v.into())),
            "float8" => get::<f64>(row, idx, name)?.map(SqlValue::Float),
            "text" | "varchar" | "bpchar" | "name" => {
                get::<String>(row, idx, name)?.map(SqlValue::Text)
            }
            "bytea" => get::<Vec<u8>>(row, idx, name)?.map(SqlValue::Bytes),
            "timestamp" => get::<NaiveDateTime>(row, idx, name)?
                .map(|v| SqlValue::Timestamp(DateTime::from_naive_utc_and_offset(v, Utc))),
            "timestamptz" => get::<DateTime<Utc>>(row, idx, name)?.map(SqlValue::Timestamp),
            "uuid" => get::<Uuid>(row, idx, name)?.map(SqlValue::Uuid),
            "json" | "jsonb" => get::<serde_json::Value>(row, idx, name)?.map(SqlValue::Json),
            other => {
                return Err(Error::unsupported(format!(
                    "column '{name}' has type {other}"
                )));
            }
        };
        Ok(value.unwrap_or(SqlValue::Null))
    }

    // ==================== Coercing accessors ====================

    /// Integer view. Coerces from numeric text.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Float view. Coerces from integers and numeric text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Float(v) => Some(*v),
            SqlValue::Int(v) => Some(*v as f64),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean view. Coerces from 0/1 integers and "true"/"false"/"1"/"0" text.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(v) => Some(*v),
            SqlValue::Int(0) => Some(false),
            SqlValue::Int(_) => Some(true),
            SqlValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Text view. Non-text scalars render via their display form.
    pub fn as_text(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            SqlValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Timestamp view. Coerces from RFC 3339 text.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            SqlValue::Timestamp(t) => Some(*t),
            SqlValue::Text(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|t| t.with_timezone(&Utc)),
            _ => None,
        }
    }

    /// Uuid view. Coerces from text.
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            SqlValue::Uuid(u) => Some(*u),
            SqlValue::Text(s) => Uuid::parse_str(s.trim()).ok(),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            SqlValue::Json(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Bool(v) => write!(f, "{v}"),
            SqlValue::Int(v) => write!(f, "{v}"),
            SqlValue::Float(v) => write!(f, "{v}"),
            SqlValue::Text(v) => f.write_str(v),
            SqlValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            SqlValue::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            SqlValue::Uuid(v) => write!(f, "{v}"),
            SqlValue::Json(v) => write!(f, "{v}"),
        }
    }
}

fn encode_mismatch(value: &SqlValue, ty: &Type) -> Box<dyn std::error::Error + Sync + Send> {
    Box::new(Error::unsupported(format!(
        "cannot encode {} value as column type {ty}",
        value.kind()
    )))
}

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Bool(v) => match ty.name() {
                "bool" => v.to_sql(ty, out),
                _ => Err(encode_mismatch(self, ty)),
            },
            SqlValue::Int(v) => match ty.name() {
                "int2" => i16::try_from(*v)
                    .map_err(|_| encode_mismatch(self, ty))?
                    .to_sql(ty, out),
                "int4" => i32::try_from(*v)
                    .map_err(|_| encode_mismatch(self, ty))?
                    .to_sql(ty, out),
                "int8" => v.to_sql(ty, out),
                _ => Err(encode_mismatch(self, ty)),
            },
            SqlValue::Float(v) => match ty.name() {
                "float4" => (*v as f32).to_sql(ty, out),
                "float8" => v.to_sql(ty, out),
                _ => Err(encode_mismatch(self, ty)),
            },
            SqlValue::Text(v) => match ty.name() {
                "text" | "varchar" | "bpchar" | "name" => v.to_sql(ty, out),
                _ => Err(encode_mismatch(self, ty)),
            },
            SqlValue::Bytes(v) => match ty.name() {
                "bytea" => v.to_sql(ty, out),
                _ => Err(encode_mismatch(self, ty)),
            },
            SqlValue::Timestamp(v) => match ty.name() {
                "timestamp" => v.naive_utc().to_sql(ty, out),
                "timestamptz" => v.to_sql(ty, out),
                _ => Err(encode_mismatch(self, ty)),
            },
            SqlValue::Uuid(v) => match ty.name() {
                "uuid" => v.to_sql(ty, out),
                _ => Err(encode_mismatch(self, ty)),
            },
            SqlValue::Json(v) => match ty.name() {
                "json" | "jsonb" => v.to_sql(ty, out),
                _ => Err(encode_mismatch(self, ty)),
            },
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            ty.name(),
            "bool"
                | "int2"
                | "int4"
                | "int8"
                | "float4"
                | "float8"
                | "text"
                | "varchar"
                | "bpchar"
                | "name"
                | "bytea"
                | "timestamp"
                | "timestamptz"
                | "uuid"
                | "json"
                | "jsonb"
        )
    }

    to_sql_checked!();
}

/// Convert a native value into a [`SqlValue`] binding.
///
/// Implemented for the supported scalar kinds plus `Option<T>`; unsupported
/// types simply do not implement it, so an unencodable value cannot reach a
/// statement.
pub trait IntoValue {
    fn into_value(self) -> SqlValue;
}

impl IntoValue for SqlValue {
    fn into_value(self) -> SqlValue {
        self
    }
}

impl IntoValue for &SqlValue {
    fn into_value(self) -> SqlValue {
        self.clone()
    }
}

impl IntoValue for bool {
    fn into_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

macro_rules! int_into_value {
    ($($t:ty),*) => {$(
        impl IntoValue for $t {
            fn into_value(self) -> SqlValue {
                SqlValue::Int(self as i64)
            }
        }
    )*};
}

int_into_value!(i8, i16, i32, i64, u8, u16, u32);

impl IntoValue for f32 {
    fn into_value(self) -> SqlValue {
        SqlValue::Float(self.into())
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> SqlValue {
        SqlValue::Text(self.to_string())
    }
}

impl IntoValue for String {
    fn into_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl IntoValue for &String {
    fn into_value(self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
}

impl IntoValue for Vec<u8> {
    fn into_value(self) -> SqlValue {
        SqlValue::Bytes(self)
    }
}

impl IntoValue for &[u8] {
    fn into_value(self) -> SqlValue {
        SqlValue::Bytes(self.to_vec())
    }
}

impl IntoValue for DateTime<Utc> {
    fn into_value(self) -> SqlValue {
        SqlValue::Timestamp(self)
    }
}

impl IntoValue for NaiveDateTime {
    fn into_value(self) -> SqlValue {
        SqlValue::Timestamp(DateTime::from_naive_utc_and_offset(self, Utc))
    }
}

impl IntoValue for Uuid {
    fn into_value(self) -> SqlValue {
        SqlValue::Uuid(self)
    }
}

impl IntoValue for serde_json::Value {
    fn into_value(self) -> SqlValue {
        SqlValue::Json(self)
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> SqlValue {
        match self {
            Some(v) => v.into_value(),
            None => SqlValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn into_value_widens_integers() {
        assert_eq!(7i16.into_value(), SqlValue::Int(7));
        assert_eq!(7u32.into_value(), SqlValue::Int(7));
        assert_eq!(7i64.into_value(), SqlValue::Int(7));
    }

    #[test]
    fn into_value_option_null() {
        let none: Option<i64> = None;
        assert_eq!(none.into_value(), SqlValue::Null);
        assert_eq!(Some("x").into_value(), SqlValue::Text("x".into()));
    }

    #[test]
    fn as_i64_coerces_text() {
        assert_eq!(SqlValue::Text(" 42 ".into()).as_i64(), Some(42));
        assert_eq!(SqlValue::Int(42).as_i64(), Some(42));
        assert_eq!(SqlValue::Float(42.0).as_i64(), None);
    }

    #[test]
    fn as_f64_coerces_int_and_text() {
        assert_eq!(SqlValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(SqlValue::Text("2.5".into()).as_f64(), Some(2.5));
    }

    #[test]
    fn as_bool_coercions() {
        assert_eq!(SqlValue::Int(0).as_bool(), Some(false));
        assert_eq!(SqlValue::Int(3).as_bool(), Some(true));
        assert_eq!(SqlValue::Text("TRUE".into()).as_bool(), Some(true));
        assert_eq!(SqlValue::Text("0".into()).as_bool(), Some(false));
        assert_eq!(SqlValue::Text("maybe".into()).as_bool(), None);
    }

    #[test]
    fn as_text_renders_scalars() {
        assert_eq!(SqlValue::Int(5).as_text().as_deref(), Some("5"));
        assert_eq!(SqlValue::Null.as_text(), None);
    }

    #[test]
    fn as_timestamp_parses_rfc3339() {
        let t = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(SqlValue::Timestamp(t).as_timestamp(), Some(t));
        assert_eq!(
            SqlValue::Text("2024-06-01T12:00:00Z".into()).as_timestamp(),
            Some(t)
        );
    }

    #[test]
    fn as_uuid_parses_text() {
        let u = Uuid::new_v4();
        assert_eq!(SqlValue::Uuid(u).as_uuid(), Some(u));
        assert_eq!(SqlValue::Text(u.to_string()).as_uuid(), Some(u));
    }

    #[test]
    fn accepts_covers_supported_types() {
        assert!(<SqlValue as ToSql>::accepts(&Type::INT4));
        assert!(<SqlValue as ToSql>::accepts(&Type::JSONB));
        assert!(!<SqlValue as ToSql>::accepts(&Type::NUMERIC));
    }

    #[test]
    fn encode_rejects_mismatched_kind() {
        let mut buf = BytesMut::new();
        let err = SqlValue::Text("oops".into())
            .to_sql(&Type::INT8, &mut buf)
            .err()
            .unwrap();
        assert!(err.to_string().contains("Unsupported value type"));
    }

    #[test]
    fn encode_null_is_null_for_any_type() {
        let mut buf = BytesMut::new();
        assert!(matches!(
            SqlValue::Null.to_sql(&Type::INT8, &mut buf).unwrap(),
            IsNull::Yes
        ));
    }

    /// Decode a raw wire buffer the way `from_row_column` decodes a row
    /// column, so the round-trip test exercises both halves of the codec.
    fn decode_raw(ty: &Type, buf: &[u8]) -> SqlValue {
        use tokio_postgres::types::FromSql;
        match ty.name() {
            "bool" => SqlValue::Bool(bool::from_sql(ty, buf).unwrap()),
            "int2" => SqlValue::Int(i16::from_sql(ty, buf).unwrap().into()),
            "int4" => SqlValue::Int(i32::from_sql(ty, buf).unwrap().into()),
            "int8" => SqlValue::Int(i64::from_sql(ty, buf).unwrap()),
            "float8" => SqlValue::Float(f64::from_sql(ty, buf).unwrap()),
            "text" => SqlValue::Text(String::from_sql(ty, buf).unwrap()),
            "bytea" => SqlValue::Bytes(Vec::<u8>::from_sql(ty, buf).unwrap()),
            "timestamptz" => SqlValue::Timestamp(DateTime::<Utc>::from_sql(ty, buf).unwrap()),
            "timestamp" => SqlValue::Timestamp(DateTime::from_naive_utc_and_offset(
                NaiveDateTime::from_sql(ty, buf).unwrap(),
                Utc,
            )),
            "uuid" => SqlValue::Uuid(Uuid::from_sql(ty, buf).unwrap()),
            "jsonb" => SqlValue::Json(serde_json::Value::from_sql(ty, buf).unwrap()),
            other => panic!("no decoder for {other}"),
        }
    }

    fn roundtrip(value: SqlValue, ty: Type) -> SqlValue {
        let mut buf = BytesMut::new();
        match value.to_sql(&ty, &mut buf).unwrap() {
            IsNull::Yes => SqlValue::Null,
            IsNull::No => decode_raw(&ty, &buf),
        }
    }

    #[test]
    fn codec_roundtrips_every_supported_kind() {
        // Postgres timestamps carry microsecond precision.
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 45).unwrap()
            + chrono::Duration::microseconds(123_456);
        let cases = [
            (SqlValue::Bool(true), Type::BOOL),
            (SqlValue::Int(-3), Type::INT2),
            (SqlValue::Int(1 << 20), Type::INT4),
            (SqlValue::Int(i64::MAX), Type::INT8),
            (SqlValue::Float(2.75), Type::FLOAT8),
            (SqlValue::Text("héllo".into()), Type::TEXT),
            (SqlValue::Bytes(vec![0, 1, 255]), Type::BYTEA),
            (SqlValue::Timestamp(ts), Type::TIMESTAMPTZ),
            (SqlValue::Timestamp(ts), Type::TIMESTAMP),
            (SqlValue::Uuid(Uuid::new_v4()), Type::UUID),
            (
                SqlValue::Json(serde_json::json!({"a": [1, 2], "b": null})),
                Type::JSONB,
            ),
            (SqlValue::Null, Type::INT8),
        ];
        for (value, ty) in cases {
            assert_eq!(roundtrip(value.clone(), ty.clone()), value, "kind {}", value.kind());
        }
    }
}
