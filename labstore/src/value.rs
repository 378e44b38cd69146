use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell. Scalar columns hold everything but `List`; encoded columns may hold any value.
#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    List(Vec<Value>),
}

/// Storage class a scalar column converts incoming values to, when the conversion is lossless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Affinity {
    Integer,
    Real,
    Text,
    Blob,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to `f64`.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
            Value::List(_) => "list",
        }
    }

    /// Converts the value towards `affinity`. Values that do not convert losslessly are kept as they are,
    /// only lists are refused since scalar columns cannot hold them.
    pub fn coerce(self, affinity: Affinity) -> Result<Value, Value> {
        match (self, affinity) {
            (Value::List(items), _) => Err(Value::List(items)),
            (Value::Null, _) => Ok(Value::Null),
            (value, Affinity::Blob) => Ok(value),
            (Value::Real(f), Affinity::Integer) => Ok(real_to_integer(f).map(Value::Integer).unwrap_or(Value::Real(f))),
            (Value::Text(s), Affinity::Integer) => Ok(parse_numeric(&s, true).unwrap_or(Value::Text(s))),
            (Value::Integer(i), Affinity::Real) => Ok(Value::Real(i as f64)),
            (Value::Text(s), Affinity::Real) => Ok(parse_numeric(&s, false).unwrap_or(Value::Text(s))),
            (Value::Integer(i), Affinity::Text) => Ok(Value::Text(i.to_string())),
            (Value::Real(f), Affinity::Text) => Ok(Value::Text(render_real(f))),
            (value, _) => Ok(value),
        }
    }

    /// Equality used by filters: integers and reals compare numerically, everything else structurally.
    pub fn matches(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Real(b)) | (Value::Real(b), Value::Integer(a)) => (*a as f64) == *b,
            (a, b) => a == b,
        }
    }

    /// Key under which unique indexes store the value. Values that [`Value::matches`] treats as
    /// equal share one key, so `-0.0`, `0.0` and `0` collide.
    pub(crate) fn index_key(&self) -> Value {
        match self {
            Value::Real(f) => real_to_integer(*f).map(Value::Integer).unwrap_or(Value::Real(*f)),
            other => other.clone(),
        }
    }

    /// Text rendering used by substring replacement. `None` for null and list values.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null | Value::List(_) => None,
            Value::Integer(i) => Some(i.to_string()),
            Value::Real(f) => Some(render_real(*f)),
            Value::Text(s) => Some(s.clone()),
            Value::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
        }
    }
}

fn real_to_integer(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
        Some(f as i64)
    } else {
        None
    }
}

fn parse_numeric(s: &str, prefer_integer: bool) -> Option<Value> {
    let trimmed = s.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(if prefer_integer { Value::Integer(i) } else { Value::Real(i as f64) });
    }
    let f = trimmed.parse::<f64>().ok().filter(|f| f.is_finite())?;
    if prefer_integer {
        Some(real_to_integer(f).map(Value::Integer).unwrap_or(Value::Real(f)))
    } else {
        Some(Value::Real(f))
    }
}

/// Whole reals keep one decimal so `5.0` does not turn into `5` when rendered as text.
pub fn render_real(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1.0e15 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", render_real(*r)),
            Value::Text(s) => write!(f, "{}", s),
            Value::Blob(b) => write!(f, "<blob {} bytes>", b.len()),
            Value::List(items) => {
                write!(f, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_affinity_parses_numeric_text() {
        assert_eq!(Value::from("5.5").coerce(Affinity::Real), Ok(Value::Real(5.5)));
        assert_eq!(Value::from(" 7 ").coerce(Affinity::Real), Ok(Value::Real(7.0)));
        assert_eq!(Value::from(3).coerce(Affinity::Real), Ok(Value::Real(3.0)));
        assert_eq!(Value::from("high").coerce(Affinity::Real), Ok(Value::Text("high".to_string())));
    }

    #[test]
    fn integer_affinity_keeps_fractional_reals() {
        assert_eq!(Value::Real(4.0).coerce(Affinity::Integer), Ok(Value::Integer(4)));
        assert_eq!(Value::Real(4.5).coerce(Affinity::Integer), Ok(Value::Real(4.5)));
        assert_eq!(Value::from("12").coerce(Affinity::Integer), Ok(Value::Integer(12)));
        assert_eq!(Value::from("2.0").coerce(Affinity::Integer), Ok(Value::Integer(2)));
    }

    #[test]
    fn text_affinity_renders_numbers() {
        assert_eq!(Value::Real(5.0).coerce(Affinity::Text), Ok(Value::Text("5.0".to_string())));
        assert_eq!(Value::Integer(42).coerce(Affinity::Text), Ok(Value::Text("42".to_string())));
    }

    #[test]
    fn lists_are_refused_by_scalar_affinities() {
        let list = Value::List(vec![Value::from("a")]);
        assert!(list.clone().coerce(Affinity::Text).is_err());
        assert!(list.coerce(Affinity::Blob).is_err());
        assert_eq!(Value::Null.coerce(Affinity::Integer), Ok(Value::Null));
    }

    #[test]
    fn numeric_match_crosses_integer_and_real() {
        assert!(Value::Integer(3).matches(&Value::Real(3.0)));
        assert!(!Value::Integer(3).matches(&Value::Real(3.5)));
        assert!(!Value::Text("3".to_string()).matches(&Value::Integer(3)));
        assert!(!Value::Null.matches(&Value::Integer(0)));
    }

    #[test]
    fn display_and_text_rendering() {
        assert_eq!(Value::Real(5.0).to_string(), "5.0");
        assert_eq!(Value::Real(0.25).to_text(), Some("0.25".to_string()));
        assert_eq!(Value::List(vec![Value::from(1), Value::from("x")]).to_string(), "[1, x]");
        assert_eq!(Value::Null.to_text(), None);
        assert_eq!(Value::from(None::<f64>), Value::Null);
    }
}
