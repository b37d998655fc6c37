use crate::principal::Principal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Typed argument or result value carried by a contract call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    #[serde(rename = "uint")]
    UInt(u64),
    Utf8(String),
    Principal(Principal),
    Optional(Option<Box<Value>>),
    Tuple(BTreeMap<String, Value>),
}

impl Value {
    pub fn utf8(text: impl Into<String>) -> Self {
        Value::Utf8(text.into())
    }

    pub fn none() -> Self {
        Value::Optional(None)
    }

    pub fn some(value: Value) -> Self {
        Value::Optional(Some(Box::new(value)))
    }

    /// Build a tuple from `(name, value)` pairs.
    pub fn tuple<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Tuple(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Value::UInt(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_utf8(&self) -> Option<&str> {
        match self {
            Value::Utf8(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_principal(&self) -> Option<&Principal> {
        match self {
            Value::Principal(p) => Some(p),
            _ => None,
        }
    }

    /// Inner value of an `optional`; `None` for both `none` and non-optionals.
    pub fn as_some(&self) -> Option<&Value> {
        match self {
            Value::Optional(inner) => inner.as_deref(),
            _ => None,
        }
    }

    /// Field lookup on a tuple.
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            Value::Tuple(fields) => fields.get(field),
            _ => None,
        }
    }

    /// Short type name used in malformed-input messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::UInt(_) => "uint",
            Value::Utf8(_) => "utf8",
            Value::Principal(_) => "principal",
            Value::Optional(_) => "optional",
            Value::Tuple(_) => "tuple",
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Principal> for Value {
    fn from(value: Principal) -> Self {
        Value::Principal(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::UInt(n) => write!(f, "u{n}"),
            Value::Utf8(s) => write!(f, "u{s:?}"),
            Value::Principal(p) => write!(f, "'{p}"),
            Value::Optional(None) => f.write_str("none"),
            Value::Optional(Some(inner)) => write!(f, "(some {inner})"),
            Value::Tuple(fields) => {
                f.write_str("(tuple")?;
                for (name, value) in fields {
                    write!(f, " ({name} {value})")?;
                }
                f.write_str(")")
            }
        }
    }
}
