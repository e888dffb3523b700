use crate::{Operation, decode::ResultShape};

/// A compiled, named unit of SQL: standardized text, ordered parameter
/// names and the output descriptor. Built once at startup, immutable and
/// shared across callers afterwards.
#[derive(Debug)]
pub struct Statement {
    pub(crate) id: String,
    pub(crate) operation: Operation,
    pub(crate) sql: String,
    pub(crate) parameters: Vec<String>,
    pub(crate) shape: ResultShape,
    pub(crate) builder: Option<String>,
}

impl Statement {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Name of the dynamic SQL builder associated with this statement, if
    /// any. Consulted by out-of-core dynamic statement construction.
    pub fn builder(&self) -> Option<&str> {
        self.builder.as_deref()
    }
}
