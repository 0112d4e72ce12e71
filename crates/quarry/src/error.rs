//! Error types for quarry

use thiserror::Error;

/// Result type alias for quarry operations
pub type QueryResult<T> = Result<T, Error>;

/// Error types for statement construction and execution
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed statement caught at build time
    #[error("Validation error: {0}")]
    Validation(String),

    /// UPDATE/DELETE built without any predicate and without an explicit override
    #[error("Unscoped mutation on table '{0}': add a predicate or call allow_unscoped()")]
    UnscopedMutation(String),

    /// Column was not part of the originating result set
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Record has no modified fields to write back
    #[error("Record has no dirty fields")]
    NoDirtyFields,

    /// A key column's current value is missing from the record
    #[error("Missing key value for column '{0}'")]
    MissingKeyValue(String),

    /// The codec cannot represent a value or column type
    #[error("Unsupported value type: {0}")]
    UnsupportedValueType(String),

    /// Column decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// The store rejected or failed the statement
    #[error("Execution error: {0}")]
    Execution(String),

    /// The connection source could not supply a connection
    #[error("Connection unavailable: {0}")]
    ConnectionUnavailable(String),

    /// A second execution was started on a query that is already running
    #[error("Query is already running")]
    QueryAlreadyRunning,

    /// A statement was added to a batch after run() began
    #[error("Batch is sealed: run() has already begun")]
    BatchSealed,

    /// A batch statement failed; the transaction was rolled back
    #[error("Batch rolled back at statement {index}: {source}")]
    BatchRollback {
        index: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported-value error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedValueType(message.into())
    }

    /// Check if this is a validation-stage error (raised before anything was sent)
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::UnscopedMutation(_) | Self::UnsupportedValueType(_)
        )
    }

    /// Check if this error wraps a rolled-back batch
    pub fn is_rollback(&self) -> bool {
        matches!(self, Self::BatchRollback { .. })
    }

    /// Map a tokio_postgres error onto the execution taxonomy.
    ///
    /// Server-reported errors keep their SQLSTATE and message; client-side
    /// failures (connection drops, encode errors) keep their display form.
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            return Self::Execution(format!("{}: {}", db_err.code().code(), db_err.message()));
        }
        Self::Execution(err.to_string())
    }
}

impl From<tokio_postgres::Error> for Error {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::from_db_error(err)
    }
}

impl From<deadpool_postgres::PoolError> for Error {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::ConnectionUnavailable(err.to_string())
    }
}
