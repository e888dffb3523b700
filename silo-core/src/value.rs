use sqlx::{Arguments, Row, any::AnyArguments, any::AnyRow, error::BoxDynError};
use std::fmt::{self, Display};

/// Dynamically typed scalar moving between statement parameters and result
/// columns. Every variant carries `Option` so a typed NULL keeps its type.
///
/// The set is restricted to what every supported backend can bind and
/// produce through the `any` driver.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Varchar(Option<String>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::Int16(v) => v.is_none(),
            Value::Int32(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::Float32(v) => v.is_none(),
            Value::Float64(v) => v.is_none(),
            Value::Varchar(v) => v.is_none(),
        }
    }

    /// Append this value to a positional argument list.
    pub(crate) fn add_to<'q>(&self, arguments: &mut AnyArguments<'q>) -> Result<(), BoxDynError> {
        match self {
            Value::Null => arguments.add(Option::<i32>::None),
            Value::Boolean(v) => arguments.add(*v),
            Value::Int16(v) => arguments.add(*v),
            Value::Int32(v) => arguments.add(*v),
            Value::Int64(v) => arguments.add(*v),
            Value::Float32(v) => arguments.add(*v),
            Value::Float64(v) => arguments.add(*v),
            Value::Varchar(v) => arguments.add(v.clone()),
        }
    }
}

/// Column kinds the engine knows how to read out of a result row. Declared
/// result-map entries and single-column statements resolve to one of these
/// at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Boolean,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Varchar,
}

impl ScalarKind {
    /// Resolve a declared scalar type name. Accepts both the configuration
    /// aliases inherited from the original definition documents and the
    /// native Rust spellings.
    pub fn from_name(name: &str) -> Option<ScalarKind> {
        Some(match name {
            "bool" | "boolean" => ScalarKind::Boolean,
            "i16" | "int16" => ScalarKind::Int16,
            "i32" | "int32" => ScalarKind::Int32,
            "i64" | "int64" | "int" | "uint" | "uint64" => ScalarKind::Int64,
            "f32" | "float32" => ScalarKind::Float32,
            "f64" | "float64" => ScalarKind::Float64,
            "string" | "str" => ScalarKind::Varchar,
            _ => return None,
        })
    }

    /// Read the column at `index` as this kind.
    pub(crate) fn read(&self, row: &AnyRow, index: usize) -> Result<Value, sqlx::Error> {
        Ok(match self {
            ScalarKind::Boolean => Value::Boolean(row.try_get(index)?),
            ScalarKind::Int16 => Value::Int16(row.try_get(index)?),
            ScalarKind::Int32 => Value::Int32(row.try_get(index)?),
            ScalarKind::Int64 => Value::Int64(row.try_get(index)?),
            ScalarKind::Float32 => Value::Float32(row.try_get(index)?),
            ScalarKind::Float64 => Value::Float64(row.try_get(index)?),
            ScalarKind::Varchar => Value::Varchar(row.try_get(index)?),
        })
    }

    /// Parse a configuration literal (e.g. a nil sentinel) into a value of
    /// this kind.
    pub fn parse_literal(&self, text: &str) -> crate::Result<Value> {
        let context = || format!("cannot parse `{text}` as {self:?}");
        Ok(match self {
            ScalarKind::Boolean => Value::Boolean(Some(
                text.parse().map_err(|_| anyhow::anyhow!(context()))?,
            )),
            ScalarKind::Int16 => Value::Int16(Some(
                text.parse().map_err(|_| anyhow::anyhow!(context()))?,
            )),
            ScalarKind::Int32 => Value::Int32(Some(
                text.parse().map_err(|_| anyhow::anyhow!(context()))?,
            )),
            ScalarKind::Int64 => Value::Int64(Some(
                text.parse().map_err(|_| anyhow::anyhow!(context()))?,
            )),
            ScalarKind::Float32 => Value::Float32(Some(
                text.parse().map_err(|_| anyhow::anyhow!(context()))?,
            )),
            ScalarKind::Float64 => Value::Float64(Some(
                text.parse().map_err(|_| anyhow::anyhow!(context()))?,
            )),
            ScalarKind::Varchar => Value::Varchar(Some(text.to_owned())),
        })
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt<T: Display>(f: &mut fmt::Formatter<'_>, v: &Option<T>) -> fmt::Result {
            match v {
                Some(v) => write!(f, "{v}"),
                None => write!(f, "NULL"),
            }
        }
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(v) => opt(f, v),
            Value::Int16(v) => opt(f, v),
            Value::Int32(v) => opt(f, v),
            Value::Int64(v) => opt(f, v),
            Value::Float32(v) => opt(f, v),
            Value::Float64(v) => opt(f, v),
            Value::Varchar(v) => opt(f, v),
        }
    }
}
