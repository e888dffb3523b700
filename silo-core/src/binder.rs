use crate::{DbError, Value};
use std::collections::BTreeMap;

/// A call argument able to resolve parameter names to values.
///
/// Implement this for records that feed statement parameters; the binder
/// queries one name at a time, in the statement's declared order.
pub trait ParamSource: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Value>;
}

/// The closed set of call-argument shapes accepted by every execution
/// operation.
#[derive(Default)]
pub enum Params {
    /// No argument; every parameter binds NULL.
    #[default]
    None,
    /// Keyed mapping, resolved by direct lookup.
    Map(BTreeMap<String, Value>),
    /// Field-bearing record, resolved through [`ParamSource`].
    Record(Box<dyn ParamSource>),
    /// A single positional value; only satisfies statements with exactly
    /// one parameter.
    Scalar(Value),
}

impl Params {
    pub fn map<K, V, I>(entries: I) -> Params
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Params::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn record(source: impl ParamSource + 'static) -> Params {
        Params::Record(Box::new(source))
    }

    pub fn scalar(value: impl Into<Value>) -> Params {
        Params::Scalar(value.into())
    }
}

// Lowercase parameter names are accepted as aliases for the conventionally
// capitalized field name. This is a compatibility accommodation, not a
// general case-insensitive match.
fn capitalize_first(name: &str) -> Option<String> {
    let first = name.chars().next()?;
    if !first.is_ascii_lowercase() {
        return None;
    }
    let mut out = String::with_capacity(name.len());
    out.push(first.to_ascii_uppercase());
    out.push_str(&name[first.len_utf8()..]);
    Some(out)
}

/// Produce the positional argument list for a statement's ordered parameter
/// names. Order always matches the declaration order, repeats included; the
/// same value is read once per occurrence. An unresolved name is a hard
/// error.
pub(crate) fn bind(
    statement_id: &str,
    names: &[String],
    params: &Params,
) -> Result<Vec<Value>, DbError> {
    let missing = |name: &str| DbError::MissingParameter {
        id: statement_id.to_owned(),
        name: name.to_owned(),
    };
    match params {
        Params::None => Ok(vec![Value::Null; names.len()]),
        Params::Map(map) => names
            .iter()
            .map(|name| map.get(name).cloned().ok_or_else(|| missing(name)))
            .collect(),
        Params::Record(source) => names
            .iter()
            .map(|name| {
                source
                    .resolve(name)
                    .or_else(|| capitalize_first(name).and_then(|alias| source.resolve(&alias)))
                    .ok_or_else(|| missing(name))
            })
            .collect(),
        Params::Scalar(value) => {
            if names.len() != 1 {
                return Err(DbError::MissingParameter {
                    id: statement_id.to_owned(),
                    name: format!(
                        "a scalar argument satisfies exactly 1 parameter, statement declares {}",
                        names.len()
                    ),
                });
            }
            Ok(vec![value.clone()])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_owned()).collect()
    }

    #[test]
    fn none_binds_null_for_every_parameter() {
        let bound = bind("s", &names(&["a", "b"]), &Params::None).unwrap();
        assert_eq!(bound, vec![Value::Null, Value::Null]);
        assert!(bind("s", &[], &Params::None).unwrap().is_empty());
    }

    #[test]
    fn map_resolves_by_key_in_declared_order() {
        let params = Params::map([
            ("name", Value::from("li")),
            ("Count", Value::from(3i64)),
        ]);
        let bound = bind("s", &names(&["name", "Count", "name"]), &params).unwrap();
        assert_eq!(
            bound,
            vec![
                Value::Varchar(Some("li".to_owned())),
                Value::Int64(Some(3)),
                Value::Varchar(Some("li".to_owned())),
            ]
        );
    }

    #[test]
    fn map_missing_key_is_a_hard_error() {
        let params = Params::map([("name", Value::from("li"))]);
        let error = bind("s", &names(&["name", "age"]), &params).unwrap_err();
        assert!(matches!(error, DbError::MissingParameter { ref name, .. } if name == "age"));
    }

    struct Dept {
        name: String,
        count: i64,
    }

    impl ParamSource for Dept {
        fn resolve(&self, name: &str) -> Option<Value> {
            match name {
                "name" => Some(self.name.clone().into()),
                // conventionally capitalized field
                "Count" => Some(self.count.into()),
                _ => None,
            }
        }
    }

    #[test]
    fn record_resolves_lowercase_alias_for_capitalized_field() {
        let params = Params::record(Dept {
            name: "ops".to_owned(),
            count: 7,
        });
        let bound = bind("s", &names(&["name", "count"]), &params).unwrap();
        assert_eq!(
            bound,
            vec![Value::Varchar(Some("ops".to_owned())), Value::Int64(Some(7))]
        );
        let error = bind("s", &names(&["missing"]), &params).unwrap_err();
        assert!(matches!(error, DbError::MissingParameter { .. }));
    }

    #[test]
    fn scalar_satisfies_exactly_one_parameter() {
        let params = Params::scalar(5i64);
        assert_eq!(
            bind("s", &names(&["id"]), &params).unwrap(),
            vec![Value::Int64(Some(5))]
        );
        assert!(bind("s", &names(&["a", "b"]), &params).is_err());
        assert!(bind("s", &[], &params).is_err());
    }
}
