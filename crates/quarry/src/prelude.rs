//! Convenient imports for typical `quarry` usage.
//!
//! ```ignore
//! use quarry::prelude::*;
//! ```

pub use crate::{
    ConnectionSource, Error, Expr, IntoValue, Query, QueryBatch, QueryResult, Record, SqlValue,
    Statement, StatementKind, create_source, create_source_with_config, qb,
};
