use crate::{Error, Result, ScalarKind, Value};
use std::any;

/// Conversion between native Rust types and the dynamically typed [`Value`]
/// representation that backs query parameters and row decoding.
///
/// `kind()` names the column kind the engine reads from a result row before
/// handing the value to `try_from_value`; `as_value` is the parameter-side
/// direction. Numeric implementations accept narrower integer variants and
/// range-check wider ones, so a backend that reports `BIGINT` for every
/// integer column still decodes into `i32` fields when the value fits.
pub trait AsValue: Sized {
    /// The column kind to request when decoding into `Self`.
    fn kind() -> ScalarKind;
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>;
}

fn mismatch<T>(value: &Value) -> Error {
    Error::msg(format!(
        "cannot convert `{value:?}` into {}",
        any::type_name::<T>()
    ))
}

impl AsValue for bool {
    fn kind() -> ScalarKind {
        ScalarKind::Boolean
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::Int16(Some(v)) => Ok(v != 0),
            Value::Int32(Some(v)) => Ok(v != 0),
            Value::Int64(Some(v)) => Ok(v != 0),
            v => Err(mismatch::<Self>(&v)),
        }
    }
}

impl AsValue for i16 {
    fn kind() -> ScalarKind {
        ScalarKind::Int16
    }
    fn as_value(self) -> Value {
        Value::Int16(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int16(Some(v)) => Ok(v),
            Value::Int32(Some(v)) => v.try_into().map_err(|_| mismatch::<Self>(&value)),
            Value::Int64(Some(v)) => v.try_into().map_err(|_| mismatch::<Self>(&value)),
            v => Err(mismatch::<Self>(&v)),
        }
    }
}

impl AsValue for i32 {
    fn kind() -> ScalarKind {
        ScalarKind::Int32
    }
    fn as_value(self) -> Value {
        Value::Int32(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int16(Some(v)) => Ok(v.into()),
            Value::Int32(Some(v)) => Ok(v),
            Value::Int64(Some(v)) => v.try_into().map_err(|_| mismatch::<Self>(&value)),
            v => Err(mismatch::<Self>(&v)),
        }
    }
}

impl AsValue for i64 {
    fn kind() -> ScalarKind {
        ScalarKind::Int64
    }
    fn as_value(self) -> Value {
        Value::Int64(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int16(Some(v)) => Ok(v.into()),
            Value::Int32(Some(v)) => Ok(v.into()),
            Value::Int64(Some(v)) => Ok(v),
            v => Err(mismatch::<Self>(&v)),
        }
    }
}

impl AsValue for f32 {
    fn kind() -> ScalarKind {
        ScalarKind::Float32
    }
    fn as_value(self) -> Value {
        Value::Float32(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float32(Some(v)) => Ok(v),
            v => Err(mismatch::<Self>(&v)),
        }
    }
}

impl AsValue for f64 {
    fn kind() -> ScalarKind {
        ScalarKind::Float64
    }
    fn as_value(self) -> Value {
        Value::Float64(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float32(Some(v)) => Ok(v.into()),
            Value::Float64(Some(v)) => Ok(v),
            v => Err(mismatch::<Self>(&v)),
        }
    }
}

impl AsValue for String {
    fn kind() -> ScalarKind {
        ScalarKind::Varchar
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            v => Err(mismatch::<Self>(&v)),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn kind() -> ScalarKind {
        T::kind()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => Value::Null,
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        value.as_value()
    }
}
impl From<i16> for Value {
    fn from(value: i16) -> Self {
        value.as_value()
    }
}
impl From<i32> for Value {
    fn from(value: i32) -> Self {
        value.as_value()
    }
}
impl From<i64> for Value {
    fn from(value: i64) -> Self {
        value.as_value()
    }
}
impl From<f32> for Value {
    fn from(value: f32) -> Self {
        value.as_value()
    }
}
impl From<f64> for Value {
    fn from(value: f64) -> Self {
        value.as_value()
    }
}
impl From<String> for Value {
    fn from(value: String) -> Self {
        value.as_value()
    }
}
impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.to_owned()))
    }
}
impl<T> From<Option<T>> for Value
where
    T: AsValue,
{
    fn from(value: Option<T>) -> Self {
        value.as_value()
    }
}
