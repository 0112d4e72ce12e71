//! # quarry
//!
//! A query-construction and record-mapping layer for relational stores.
//!
//! ## Features
//!
//! - **Injection-safe by construction**: identifiers pass an allow-list,
//!   values always travel as bound parameters, never in statement text
//! - **Fluent builders**: SELECT/INSERT/UPDATE/DELETE assembled clause by
//!   clause, finalized into immutable [`Statement`]s
//! - **Pluggable dialects**: the same builder renders `$n` or `?`
//!   placeholders and store-appropriate identifier quoting
//! - **Safe defaults**: UPDATE/DELETE without a predicate refuse to build
//!   unless explicitly overridden
//! - **Scoped connections**: one borrow per execution, returned on every
//!   exit path, including abandoned row iteration
//! - **All-or-nothing batches**: ordered statements in one transaction, with
//!   the failing index reported after rollback
//! - **Dirty-tracking records**: mutate fields in memory, write back an
//!   UPDATE touching only what changed
//!
//! ## Usage
//!
//! ```ignore
//! use quarry::{qb, Query, QueryBatch};
//!
//! let source = quarry::create_source("postgres://localhost/app")?;
//!
//! // Read, streaming records one row at a time.
//! let adults = Query::new(
//!     qb::select("users")
//!         .columns(&["id", "name"])
//!         .gte("age", 18)
//!         .order_by("name")
//!         .limit(10)
//!         .build()?,
//! )?;
//! let mut rows = adults.fetch(&source).await?;
//! while let Some(record) = rows.next().await {
//!     let record = record?;
//!     println!("{:?}", record.get_text("name")?);
//! }
//!
//! // Write back only what changed.
//! let mut record = adults.fetch_opt(&source).await?.unwrap();
//! record.set("name", "renamed");
//! Query::new(record.to_update_statement("users", &["id"])?)?
//!     .execute(&source)
//!     .await?;
//!
//! // Group writes under one transaction.
//! let mut batch = QueryBatch::new();
//! batch.add(qb::insert("audit").set("event", "rename").build()?)?;
//! batch.add(qb::delete("sessions").eq("user_id", 7).build()?)?;
//! batch.run(&source).await?;
//! ```

pub mod batch;
pub mod dialect;
pub mod error;
pub mod ident;
pub mod qb;
pub mod query;
pub mod record;
pub mod source;
pub mod statement;
pub mod value;

pub use batch::QueryBatch;
pub use dialect::{Dialect, MySql, Postgres, Sqlite};
pub use error::{Error, QueryResult};
pub use ident::Ident;
pub use query::{ExecOutcome, Query, RecordStream};
pub use record::Record;
pub use source::{
    ConnectionSource, PgSource, PooledConnection, create_source, create_source_with_config,
    create_source_with_manager_config, create_source_with_tls,
};
pub use statement::{Statement, StatementKind};
pub use value::{IntoValue, SqlValue};

// Re-export qb surface for easy access
pub use qb::{
    DeleteBuilder, Expr, ExprGroup, InsertBuilder, SelectBuilder, UpdateBuilder, delete,
    delete_from, insert, insert_into, select, update,
};

pub mod prelude;
