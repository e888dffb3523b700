use crate::{DbError, FieldAccessor, RecordDescriptor, ScalarKind, Value};
use sqlx::any::AnyRow;
use std::{any::Any, collections::HashMap, fmt, sync::Arc};

/// A materialized read result: an owned record instance (downcast by the
/// caller) or an unwrapped scalar.
pub enum Output {
    Record(Box<dyn Any + Send>),
    Scalar(Value),
}

impl Output {
    pub fn into_record<T: 'static>(self) -> Option<T> {
        match self {
            Output::Record(record) => record.downcast::<T>().ok().map(|boxed| *boxed),
            Output::Scalar(..) => None,
        }
    }

    pub fn into_scalar(self) -> Option<Value> {
        match self {
            Output::Scalar(value) => Some(value),
            Output::Record(..) => None,
        }
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Record(..) => f.write_str("Output::Record(..)"),
            Output::Scalar(value) => write!(f, "Output::Scalar({value:?})"),
        }
    }
}

/// One result-map entry after load-time resolution: the field accessor, the
/// column kind to read, and the parsed nil sentinel if declared.
#[derive(Debug)]
pub(crate) struct MappedColumn {
    pub(crate) accessor: Arc<FieldAccessor>,
    pub(crate) kind: ScalarKind,
    pub(crate) nil_value: Option<Value>,
}

/// A compiled result map: explicit column-to-field table over a record
/// descriptor.
#[derive(Debug)]
pub(crate) struct MappedShape {
    pub(crate) record: Arc<RecordDescriptor>,
    pub(crate) columns: HashMap<String, MappedColumn>,
}

/// Output descriptor of a statement, fixed at load time.
#[derive(Debug, Default)]
pub(crate) enum ResultShape {
    /// Writes and DDL produce no decoded rows.
    #[default]
    None,
    /// Exactly one column, returned unwrapped.
    SingleColumn(ScalarKind),
    /// Decode through an explicit result map.
    Mapped(Arc<MappedShape>),
    /// Decode by implicit case-normalized column-to-field matching.
    Record(Arc<RecordDescriptor>),
}

/// Decode targets resolved against the live column list of one result set.
/// Resolution is all-or-nothing: every column must find its accessor before
/// any value is read.
pub(crate) enum DecodePlan {
    Scalar(ScalarKind),
    Record {
        record: Arc<RecordDescriptor>,
        columns: Vec<PlannedColumn>,
    },
}

pub(crate) struct PlannedColumn {
    name: String,
    index: usize,
    kind: ScalarKind,
    nil_value: Option<Value>,
    accessor: Arc<FieldAccessor>,
}

impl ResultShape {
    pub(crate) fn plan(
        &self,
        statement_id: &str,
        columns: &[String],
    ) -> Result<DecodePlan, DbError> {
        match self {
            ResultShape::None => Err(DbError::RowDecodeFailed {
                id: statement_id.to_owned(),
                reason: "statement declares no result shape".to_owned(),
            }),
            ResultShape::SingleColumn(kind) => {
                if columns.len() != 1 {
                    return Err(DbError::ColumnCountMismatch {
                        id: statement_id.to_owned(),
                        count: columns.len(),
                    });
                }
                Ok(DecodePlan::Scalar(*kind))
            }
            ResultShape::Mapped(shape) => {
                let planned = columns
                    .iter()
                    .enumerate()
                    .map(|(index, column)| {
                        let mapped = shape.columns.get(column).ok_or_else(|| {
                            DbError::FieldNotFound {
                                column: column.clone(),
                                record: shape.record.type_name().to_owned(),
                            }
                        })?;
                        Ok(PlannedColumn {
                            name: column.clone(),
                            index,
                            kind: mapped.kind,
                            nil_value: mapped.nil_value.clone(),
                            accessor: mapped.accessor.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>, DbError>>()?;
                Ok(DecodePlan::Record {
                    record: shape.record.clone(),
                    columns: planned,
                })
            }
            ResultShape::Record(record) => {
                let planned = columns
                    .iter()
                    .enumerate()
                    .map(|(index, column)| {
                        let accessor = record.field_for_column(column).ok_or_else(|| {
                            DbError::FieldNotFound {
                                column: column.clone(),
                                record: record.type_name().to_owned(),
                            }
                        })?;
                        Ok(PlannedColumn {
                            name: column.clone(),
                            index,
                            kind: accessor.kind(),
                            nil_value: None,
                            accessor: accessor.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>, DbError>>()?;
                Ok(DecodePlan::Record {
                    record: record.clone(),
                    columns: planned,
                })
            }
        }
    }
}

impl DecodePlan {
    pub(crate) fn materialize(&self, statement_id: &str, row: &AnyRow) -> Result<Output, DbError> {
        match self {
            DecodePlan::Scalar(kind) => {
                let value = kind
                    .read(row, 0)
                    .map_err(|e| read_error(statement_id, e))?;
                Ok(Output::Scalar(value))
            }
            DecodePlan::Record { record, columns } => {
                let mut instance = record.new_record();
                for column in columns {
                    let mut value = column
                        .kind
                        .read(row, column.index)
                        .map_err(|e| read_error(statement_id, e))?;
                    if let Some(nil) = &column.nil_value {
                        if value == *nil {
                            value = Value::Null;
                        }
                    }
                    column
                        .accessor
                        .set(instance.as_mut(), value)
                        .map_err(|e| DbError::RowDecodeFailed {
                            id: statement_id.to_owned(),
                            reason: format!("column `{}`: {e:#}", column.name),
                        })?;
                }
                Ok(Output::Record(instance))
            }
        }
    }
}

fn read_error(statement_id: &str, error: sqlx::Error) -> DbError {
    match error {
        sqlx::Error::ColumnIndexOutOfBounds { .. } | sqlx::Error::ColumnNotFound(..) => {
            DbError::ColumnIntrospectionFailed {
                id: statement_id.to_owned(),
                source: error,
            }
        }
        error => DbError::RowDecodeFailed {
            id: statement_id.to_owned(),
            reason: format!("{error}"),
        },
    }
}
