use crate::Operation;
use thiserror::Error;

/// Closed taxonomy of call-time failures. Every public execution operation
/// returns one of these; no fault crosses the engine boundary unwrapped.
///
/// Codes 1-12 keep the numbering of the original engine; 13-16 are faults
/// the original surfaced as recovered panics or silent fallbacks.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("no statement registered with id `{id}`")]
    NoStatement { id: String },

    #[error("unterminated parameter marker in statement template: {sql}")]
    TemplateCompile { sql: String },

    #[error("driver rejected statement `{id}`")]
    PrepareFailed {
        id: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("query failed for statement `{id}`")]
    QueryFailed {
        id: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("exec failed for statement `{id}`")]
    ExecFailed {
        id: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("cannot introspect result columns for statement `{id}`")]
    ColumnIntrospectionFailed {
        id: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("cannot decode row for statement `{id}`: {reason}")]
    RowDecodeFailed { id: String, reason: String },

    #[error("row stream failed for statement `{id}`")]
    RowIteratorFailed {
        id: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("internal fault: {message}")]
    InternalFault { message: String },

    #[error("statement `{id}` is declared as {declared}, cannot run it as {requested}")]
    OperationMismatch {
        id: String,
        declared: Operation,
        requested: Operation,
    },

    #[error("statement `{id}` produced more than one row")]
    TooManyResults { id: String },

    #[error("driver could not report the outcome of statement `{id}`: {detail}")]
    UnknownFault { id: String, detail: String },

    #[error("column `{column}` has no matching field on `{record}`")]
    FieldNotFound { column: String, record: String },

    #[error("statement `{id}` must produce exactly one column, got {count}")]
    ColumnCountMismatch { id: String, count: usize },

    #[error("no value for parameter `{name}` of statement `{id}`")]
    MissingParameter { id: String, name: String },

    #[error("data source `{name}` has not been started")]
    NotInitialized { name: String },
}

impl DbError {
    pub fn code(&self) -> u32 {
        match self {
            DbError::NoStatement { .. } => 1,
            DbError::TemplateCompile { .. } => 2,
            DbError::PrepareFailed { .. } => 3,
            DbError::QueryFailed { .. } => 4,
            DbError::ExecFailed { .. } => 5,
            DbError::ColumnIntrospectionFailed { .. } => 6,
            DbError::RowDecodeFailed { .. } => 7,
            DbError::RowIteratorFailed { .. } => 8,
            DbError::InternalFault { .. } => 9,
            DbError::OperationMismatch { .. } => 10,
            DbError::TooManyResults { .. } => 11,
            DbError::UnknownFault { .. } => 12,
            DbError::FieldNotFound { .. } => 13,
            DbError::ColumnCountMismatch { .. } => 14,
            DbError::MissingParameter { .. } => 15,
            DbError::NotInitialized { .. } => 16,
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> DbError {
        DbError::InternalFault {
            message: message.into(),
        }
    }
}
