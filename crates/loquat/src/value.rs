//! Bind-parameter values.
//!
//! Every parameter a compiled query carries is a [`Value`]: a tagged union
//! resolved once at compile time and carried explicitly through to binding,
//! instead of being re-inferred at each use.

use bytes::BytesMut;
use serde::Serialize;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

/// A dynamically-typed bind value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Parse a rendered literal whose type could not be classified at
    /// compile time ("origin" placeholders): `true`/`false` become booleans,
    /// numeric literals become ints or floats, everything else stays text.
    pub fn sniff(raw: &str) -> Value {
        if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("false") {
            return Value::Bool(raw.eq_ignore_ascii_case("true"));
        }
        if raw.contains('.') {
            if let Ok(f) = raw.parse::<f64>() {
                return Value::Float(f);
            }
        } else if let Ok(i) = raw.parse::<i64>() {
            return Value::Int(i);
        }
        Value::Str(raw.to_string())
    }

    /// Parse a rendered literal declared as numeric: floats carry a `.`,
    /// everything else is an integer. Unparseable input falls back to 0,
    /// matching the lenient numeric coercion of the template language.
    pub fn number(raw: &str) -> Value {
        if raw.contains('.') {
            Value::Float(raw.parse::<f64>().unwrap_or(0.0))
        } else {
            Value::Int(raw.parse::<i64>().unwrap_or(0))
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// A value is blank when it is null or an empty string. Criteria setters
    /// reject blank values.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Str(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Str(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            other => Value::Str(other.to_string()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => b.to_sql(ty, out),
            Value::Int(i) => i.to_sql(ty, out),
            Value::Float(f) => f.to_sql(ty, out),
            Value::Str(s) => s.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // The concrete wire encoding is only known per variant; let the
        // server-side type drive the inner impls at bind time.
        true
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_classifies_literals() {
        assert_eq!(Value::sniff("true"), Value::Bool(true));
        assert_eq!(Value::sniff("FALSE"), Value::Bool(false));
        assert_eq!(Value::sniff("42"), Value::Int(42));
        assert_eq!(Value::sniff("4.5"), Value::Float(4.5));
        assert_eq!(Value::sniff("abc"), Value::Str("abc".into()));
        assert_eq!(Value::sniff("1.2.3"), Value::Str("1.2.3".into()));
    }

    #[test]
    fn number_prefers_int_without_dot() {
        assert_eq!(Value::number("7"), Value::Int(7));
        assert_eq!(Value::number("7.0"), Value::Float(7.0));
    }

    #[test]
    fn blank_is_null_or_empty_string() {
        assert!(Value::Null.is_blank());
        assert!(Value::Str(String::new()).is_blank());
        assert!(!Value::Str("x".into()).is_blank());
        assert!(!Value::Int(0).is_blank());
    }
}
