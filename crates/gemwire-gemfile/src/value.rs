use std::fmt;

use serde::Serialize;

/// A value assigned to a gem keyword argument.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum GemValue {
    Bool(bool),
    Str(String),
    Symbol(String),
    Int(i64),
    Array(Vec<GemValue>),
}

impl GemValue {
    /// Flatten strings and symbols into `out`, recursing through arrays.
    /// Booleans and integers cannot be represented and are skipped.
    pub fn push_strings(&self, out: &mut Vec<String>) {
        match self {
            GemValue::Str(s) | GemValue::Symbol(s) => out.push(s.clone()),
            GemValue::Array(items) => {
                for item in items {
                    item.push_strings(out);
                }
            }
            GemValue::Bool(_) | GemValue::Int(_) => {}
        }
    }
}

impl fmt::Display for GemValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GemValue::Bool(b) => write!(f, "{}", b),
            GemValue::Str(s) => write!(f, "\"{}\"", s),
            GemValue::Symbol(s) => write!(f, ":{}", s),
            GemValue::Int(v) => write!(f, "{}", v),
            GemValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}
