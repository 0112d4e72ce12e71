//! Single-shot statement execution.
//!
//! A [`Query`] binds one finalized [`Statement`] to a connection context.
//! Each execution borrows exactly one connection from the
//! [`ConnectionSource`] and releases it on every exit path: the connection
//! rides inside the returned [`RecordStream`] for reads, so dropping the
//! stream mid-iteration returns it to the pool immediately.

use crate::error::{Error, QueryResult};
use crate::record::Record;
use crate::source::{ConnectionSource, PooledConnection};
use crate::statement::Statement;
use crate::value::SqlValue;
use futures_core::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use tokio_postgres::types::ToSql;

/// Result of executing a write statement.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecOutcome {
    /// Number of rows the store reports as affected.
    pub rows_affected: u64,
    /// Generated key captured via RETURNING, when the statement asked for one.
    pub generated_key: Option<SqlValue>,
}

/// Clears the owning query's in-flight flag when the execution finishes,
/// whether by completion, error, or abandonment.
#[derive(Debug)]
struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// A single bound, single-shot executable unit wrapping one [`Statement`].
///
/// Only one execution may be in flight per instance; overlapping calls fail
/// with [`Error::QueryAlreadyRunning`]. Re-running after completion issues a
/// fresh execution against a freshly acquired connection.
pub struct Query {
    stmt: Statement,
    in_flight: Arc<AtomicBool>,
}

impl Query {
    /// Bind a finalized statement.
    ///
    /// Statements rendered for a non-executable dialect are rejected here,
    /// before any connection is touched.
    pub fn new(stmt: Statement) -> QueryResult<Query> {
        if stmt.dialect() != crate::dialect::Postgres::NAME {
            return Err(Error::validation(format!(
                "statement was rendered for dialect '{}'; only postgres statements are executable",
                stmt.dialect()
            )));
        }
        Ok(Query {
            stmt,
            in_flight: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn statement(&self) -> &Statement {
        &self.stmt
    }

    fn begin(&self) -> QueryResult<InFlightGuard> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::QueryAlreadyRunning);
        }
        Ok(InFlightGuard {
            flag: Arc::clone(&self.in_flight),
        })
    }

    fn param_refs(&self) -> impl ExactSizeIterator<Item = &(dyn ToSql + Sync)> {
        self.stmt.params().iter().map(|p| p as &(dyn ToSql + Sync))
    }

    /// Execute a read statement, yielding rows lazily.
    ///
    /// The returned stream is single-pass and forward-only; it owns the
    /// borrowed connection and this query's in-flight slot, releasing both
    /// when dropped.
    pub async fn fetch<S: ConnectionSource>(&self, source: &S) -> QueryResult<RecordStream> {
        if self.stmt.kind().is_write() {
            return Err(Error::validation("fetch requires a SELECT statement"));
        }
        let guard = self.begin()?;
        let conn = source.acquire().await?;
        #[cfg(feature = "tracing")]
        tracing::debug!(sql = self.stmt.sql(), "fetching");
        let rows = conn
            .query_raw(self.stmt.sql(), self.param_refs())
            .await
            .map_err(Error::from_db_error)?;
        Ok(RecordStream {
            rows: Box::pin(rows),
            _conn: conn,
            _guard: guard,
        })
    }

    /// Execute a read statement and collect every row.
    pub async fn fetch_all<S: ConnectionSource>(&self, source: &S) -> QueryResult<Vec<Record>> {
        let mut stream = self.fetch(source).await?;
        let mut records = Vec::new();
        while let Some(record) = stream.next().await {
            records.push(record?);
        }
        Ok(records)
    }

    /// Execute a read statement and take the first row, if any.
    pub async fn fetch_opt<S: ConnectionSource>(&self, source: &S) -> QueryResult<Option<Record>> {
        let mut stream = self.fetch(source).await?;
        stream.next().await.transpose()
    }

    /// Whether the read statement matches at least one row.
    ///
    /// Iteration stops after the first row; the connection is released
    /// immediately.
    pub async fn exists<S: ConnectionSource>(&self, source: &S) -> QueryResult<bool> {
        Ok(self.fetch_opt(source).await?.is_some())
    }

    /// Number of rows the read statement matches.
    pub async fn count<S: ConnectionSource>(&self, source: &S) -> QueryResult<u64> {
        let mut stream = self.fetch(source).await?;
        let mut n = 0u64;
        while let Some(record) = stream.next().await {
            record?;
            n += 1;
        }
        Ok(n)
    }

    /// Execute a write statement, returning the affected-row count and, when
    /// the statement carries RETURNING, the generated key.
    pub async fn execute<S: ConnectionSource>(&self, source: &S) -> QueryResult<ExecOutcome> {
        if !self.stmt.kind().is_write() {
            return Err(Error::validation("execute requires a write statement"));
        }
        let _guard = self.begin()?;
        let conn = source.acquire().await?;
        #[cfg(feature = "tracing")]
        tracing::debug!(sql = self.stmt.sql(), "executing");
        execute_on(&**conn, &self.stmt).await
    }
}

/// Run one write statement on an already-borrowed client.
///
/// Shared between [`Query::execute`] and the batch layer, which supplies a
/// transaction-scoped client.
pub(crate) async fn execute_on(
    client: &impl tokio_postgres::GenericClient,
    stmt: &Statement,
) -> QueryResult<ExecOutcome> {
    let params: Vec<&(dyn ToSql + Sync)> =
        stmt.params().iter().map(|p| p as &(dyn ToSql + Sync)).collect();
    if stmt.returning().is_some() {
        let rows = client
            .query(stmt.sql(), &params)
            .await
            .map_err(Error::from_db_error)?;
        let generated_key = match rows.first() {
            Some(row) => Some(SqlValue::from_row_column(row, 0)?),
            None => None,
        };
        Ok(ExecOutcome {
            rows_affected: rows.len() as u64,
            generated_key,
        })
    } else {
        let rows_affected = client
            .execute(stmt.sql(), &params)
            .await
            .map_err(Error::from_db_error)?;
        Ok(ExecOutcome {
            rows_affected,
            generated_key: None,
        })
    }
}

/// Lazy, single-pass sequence of [`Record`]s.
///
/// Rows are materialized one at a time from the store cursor. The stream
/// owns the borrowed connection; dropping it before exhaustion releases the
/// connection without leaving a dangling cursor.
#[must_use]
pub struct RecordStream {
    rows: Pin<Box<tokio_postgres::RowStream>>,
    _conn: PooledConnection,
    _guard: InFlightGuard,
}

impl RecordStream {
    /// Pull the next record, if any.
    pub async fn next(&mut self) -> Option<QueryResult<Record>> {
        std::future::poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await
    }
}

impl Stream for RecordStream {
    type Item = QueryResult<Record>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.rows.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(row))) => Poll::Ready(Some(Record::from_row(&row))),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(Error::from_db_error(e)))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Sqlite;
    use crate::qb;

    #[test]
    fn query_rejects_render_only_dialects() {
        let stmt = qb::select("users").build_for(&Sqlite).unwrap();
        assert!(Query::new(stmt).is_err());
    }

    #[test]
    fn in_flight_guard_releases_on_drop() {
        let stmt = qb::select("users").build().unwrap();
        let query = Query::new(stmt).unwrap();

        let guard = query.begin().unwrap();
        assert!(matches!(
            query.begin().unwrap_err(),
            Error::QueryAlreadyRunning
        ));
        drop(guard);
        assert!(query.begin().is_ok());
    }
}
