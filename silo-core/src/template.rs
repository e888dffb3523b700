use crate::DbError;
use std::fmt::{self, Display};

/// SQL operation kind, used for dispatch validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
    Generic,
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Select => "SELECT",
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::Generic => "GENERIC",
        })
    }
}

/// Positional placeholder syntax of the target backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `?`, accepted by sqlite and mysql.
    Question,
    /// `$1`, `$2`, ... as used by postgres.
    Numbered,
}

impl Placeholder {
    pub fn for_driver(driver: &str) -> Placeholder {
        match driver {
            "postgres" | "postgresql" => Placeholder::Numbered,
            _ => Placeholder::Question,
        }
    }
}

/// Compile a `$name$` delimited template into standard placeholder SQL plus
/// the ordered parameter names.
///
/// A single left-to-right scan: text outside a marker pair is copied
/// verbatim, the trimmed text between two `$` becomes a parameter name and
/// the output gains one placeholder. Duplicate names are kept; order
/// determines positional binding. A scan that ends inside an open marker
/// fails with [`DbError::TemplateCompile`] and produces no partial output.
pub fn standardize(sql: &str, placeholder: Placeholder) -> Result<(String, Vec<String>), DbError> {
    let mut out = String::with_capacity(sql.len());
    let mut names = Vec::new();
    let mut name = String::new();
    let mut inside = false;
    for c in sql.chars() {
        match (inside, c) {
            (true, '$') => {
                names.push(name.trim().to_owned());
                name.clear();
                inside = false;
                match placeholder {
                    Placeholder::Question => out.push('?'),
                    Placeholder::Numbered => {
                        out.push('$');
                        out.push_str(&names.len().to_string());
                    }
                }
            }
            (false, '$') => inside = true,
            (true, c) => name.push(c),
            (false, c) => out.push(c),
        }
    }
    if inside {
        return Err(DbError::TemplateCompile {
            sql: sql.to_owned(),
        });
    }
    Ok((out, names))
}

/// Infer the operation kind from the first six non-whitespace characters of
/// the raw SQL text. Anything that is not one of the four known verbs
/// classifies as generic.
pub fn infer_operation(sql: &str) -> Operation {
    let sql = sql.trim_start();
    if sql.len() < 6 {
        return Operation::Generic;
    }
    let Some(verb) = sql.get(..6) else {
        return Operation::Generic;
    };
    match verb.to_ascii_uppercase().as_str() {
        "SELECT" => Operation::Select,
        "INSERT" => Operation::Insert,
        "UPDATE" => Operation::Update,
        "DELETE" => Operation::Delete,
        _ => Operation::Generic,
    }
}
