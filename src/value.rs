use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// One record of a table, keyed by field name. Fields a column refers to may be absent.
pub type Row = HashMap<String, Value>;

pub const FIRST_NAME: &str = "firstName";
pub const LAST_NAME: &str = "lastName";

/// A dynamically typed cell value as delivered by the backend.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    /// Integers stay exact, ids and phone numbers included.
    Int(i64),
    Number(f64),
    Text(String),
    /// Date-like string, kept verbatim.
    Date(String),
    List(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

pub(crate) static NULL: Value = Value::Null;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// `firstName + " " + lastName` of an object value. Missing parts are empty.
    pub fn person_name(&self) -> Option<String> {
        let fields = self.as_object()?;
        let part = |key: &str| fields.get(key).map(Value::to_string).unwrap_or_default();
        Some(format!("{} {}", part(FIRST_NAME), part(LAST_NAME)))
    }

    fn has_person_name(&self) -> bool {
        self.as_object()
            .is_some_and(|f| f.contains_key(FIRST_NAME) || f.contains_key(LAST_NAME))
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Number(_) => 2,
            Value::Text(_) | Value::Date(_) => 3,
            Value::List(_) => 4,
            Value::Object(_) => 5,
        }
    }

    /// Total order used for sorting.
    ///
    /// Values of the same kind compare naturally (numbers numerically, strings and dates
    /// lexicographically). Values of different kinds are ordered by kind:
    /// null < bool < number < text/date < list < object.
    ///
    /// Number filters match against the display form, which is Rust's `f64` formatting:
    /// no exponent notation, so `1e21` shows all 22 digits and `1e-7` shows `0.0000001`.
    pub fn natural_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Int(a), Value::Number(b)) => (*a as f64).total_cmp(b),
            (Value::Number(a), Value::Int(b)) => a.total_cmp(&(*b as f64)),
            (Value::Text(a) | Value::Date(a), Value::Text(b) | Value::Date(b)) => a.cmp(b),
            (Value::List(_), Value::List(_)) | (Value::Object(_), Value::Object(_)) => {
                self.to_string().cmp(&other.to_string())
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            // -0 shows as 0
            Value::Number(n) if *n == 0.0 => f.write_str("0"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) | Value::Date(s) => f.write_str(s),
            Value::List(items) => {
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Object(_) if self.has_person_name() => {
                f.write_str(&self.person_name().unwrap_or_default())
            }
            Value::Object(_) => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

/// Falls back to a float only above `i64::MAX`.
impl From<u64> for Value {
    fn from(n: u64) -> Self {
        i64::try_from(n)
            .map(Value::Int)
            .unwrap_or(Value::Number(n as f64))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Value::Int(i),
                (None, Some(u)) => Value::from(u),
                _ => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Builds a row from `(field, value)` pairs.
pub fn row<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Row
where
    K: Into<String>,
    V: Into<Value>,
{
    fields
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Builds an object value holding a person name.
pub fn person(first_name: &str, last_name: &str) -> Value {
    Value::Object(BTreeMap::from([
        (FIRST_NAME.to_string(), Value::from(first_name)),
        (LAST_NAME.to_string(), Value::from(last_name)),
    ]))
}
