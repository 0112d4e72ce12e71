//! All-or-nothing statement batches.

use crate::error::{Error, QueryResult};
use crate::query::{ExecOutcome, execute_on};
use crate::source::ConnectionSource;
use crate::statement::{Statement, StatementKind};

/// An ordered group of write statements executed under one transactional
/// boundary.
///
/// Statements run in insertion order on a single borrowed connection inside
/// one transaction: they observe each other's effects, and no other
/// connection ever observes a partially applied batch. The first failure
/// rolls everything back and reports the failing statement's index.
#[derive(Debug, Default)]
pub struct QueryBatch {
    stmts: Vec<Statement>,
    sealed: bool,
}

impl QueryBatch {
    pub fn new() -> QueryBatch {
        QueryBatch::default()
    }

    /// Append a write statement to the pending sequence.
    ///
    /// Fails with [`Error::BatchSealed`] once [`run`] has begun, and rejects
    /// read statements (a batch reports affected counts, not rows).
    ///
    /// [`run`]: QueryBatch::run
    pub fn add(&mut self, stmt: Statement) -> QueryResult<&mut QueryBatch> {
        if self.sealed {
            return Err(Error::BatchSealed);
        }
        if stmt.kind() == StatementKind::Select {
            return Err(Error::validation(
                "batches accept only INSERT/UPDATE/DELETE statements",
            ));
        }
        self.stmts.push(stmt);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    /// Drop all pending statements and unseal, leaving a fresh batch.
    pub fn clear(&mut self) {
        self.stmts.clear();
        self.sealed = false;
    }

    /// Execute the batch on one connection inside one transaction.
    ///
    /// On success, commits once and returns each statement's outcome in
    /// insertion order. On the first failure, rolls the transaction back and
    /// returns [`Error::BatchRollback`] naming the failing index; the
    /// rollback completes before the error surfaces, so partial effects are
    /// never observable elsewhere.
    pub async fn run<S: ConnectionSource>(&mut self, source: &S) -> QueryResult<Vec<ExecOutcome>> {
        self.sealed = true;
        if self.stmts.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = source.acquire().await?;
        let tx = conn.transaction().await.map_err(Error::from_db_error)?;

        let mut outcomes = Vec::with_capacity(self.stmts.len());
        for (index, stmt) in self.stmts.iter().enumerate() {
            #[cfg(feature = "tracing")]
            tracing::debug!(index, sql = stmt.sql(), "batch statement");
            match execute_on(&*tx, stmt).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(cause) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(index, error = %cause, "batch failed, rolling back");
                    if let Err(rollback_err) = tx.rollback().await {
                        return Err(Error::Execution(format!(
                            "{cause} (rollback failed: {rollback_err})"
                        )));
                    }
                    return Err(Error::BatchRollback {
                        index,
                        source: Box::new(cause),
                    });
                }
            }
        }

        tx.commit().await.map_err(Error::from_db_error)?;
        Ok(outcomes)
    }
}
