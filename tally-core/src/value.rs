//! Runtime values in Tally
//!
//! Values can be numbers, text, booleans, datetimes, objects, lists, null,
//! or errors. Errors propagate through calls instead of panicking.

use crate::{TallyDateTime, TallyError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A business record as supplied by the CRUD layer: field name to value.
pub type Record = HashMap<String, Value>;

/// Runtime value in Tally
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    DateTime(TallyDateTime),
    Object(HashMap<String, Value>),
    List(Vec<Value>),
    #[default]
    Null,
    Error(TallyError),
}

impl Value {
    // ========== Safe Accessors (never panic) ==========

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&TallyDateTime> {
        match self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    // ========== Object Field Access ==========

    /// Get field from object. Returns Error value if not found or not an object.
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Object(map) => map
                .get(key)
                .cloned()
                .unwrap_or_else(|| Value::Error(TallyError::undefined_field(key))),
            Value::Error(e) => Value::Error(e.clone()),
            _ => Value::Error(TallyError::type_error("Object", self.type_name())),
        }
    }

    /// Type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Text(_) => "Text",
            Value::Bool(_) => "Bool",
            Value::DateTime(_) => "DateTime",
            Value::Object(_) => "Object",
            Value::List(_) => "List",
            Value::Null => "Null",
            Value::Error(_) => "Error",
        }
    }

    // ========== Type Coercion ==========

    /// Convert to number. Text holding a decimal literal is accepted, since
    /// form fields reach the engine as strings.
    pub fn to_number(&self) -> Value {
        match self {
            Value::Number(n) => Value::Number(*n),
            Value::Text(s) => match s.trim().parse::<f64>() {
                Ok(n) => Value::Number(n),
                Err(_) => Value::Error(TallyError::parse_error(format!("'{}' is not a number", s))),
            },
            Value::Bool(b) => Value::Number(if *b { 1.0 } else { 0.0 }),
            Value::Error(e) => Value::Error(e.clone()),
            _ => Value::Error(TallyError::type_error("Number", self.type_name())),
        }
    }

    /// Convert to datetime. Numbers are Unix milliseconds.
    pub fn to_datetime(&self) -> Value {
        match self {
            Value::DateTime(dt) => Value::DateTime(dt.clone()),
            Value::Text(s) => match TallyDateTime::parse(s) {
                Ok(dt) => Value::DateTime(dt),
                Err(e) => Value::Error(e.into()),
            },
            Value::Number(n) => match TallyDateTime::from_unix_millis_f64(*n) {
                Ok(dt) => Value::DateTime(dt),
                Err(e) => Value::Error(e.into()),
            },
            Value::Error(e) => Value::Error(e.clone()),
            _ => Value::Error(TallyError::type_error("DateTime", self.type_name())),
        }
    }

    /// Text used when the value labels a category
    pub fn to_label(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::DateTime(dt) => write!(f, "{}", dt),
            Value::Object(obj) => write!(f, "[Object: {} fields]", obj.len()),
            Value::List(items) => {
                // Show values for small lists, count for large
                if items.len() <= 5 {
                    let contents: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                    write!(f, "[{}]", contents.join(", "))
                } else {
                    write!(f, "[{}]", items.len())
                }
            }
            Value::Null => write!(f, "null"),
            Value::Error(e) => write!(f, "#ERROR: {}", e.code),
        }
    }
}

// From implementations for convenience
impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
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

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<TallyDateTime> for Value {
    fn from(dt: TallyDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<TallyError> for Value {
    fn from(e: TallyError) -> Self {
        Value::Error(e)
    }
}

impl From<Vec<f64>> for Value {
    fn from(values: Vec<f64>) -> Self {
        Value::List(values.into_iter().map(Value::Number).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_coerces_to_number() {
        assert_eq!(Value::from(" 12.5 ").to_number(), Value::Number(12.5));
        assert!(Value::from("abc").to_number().is_error());
        assert!(Value::Null.to_number().is_error());
    }

    #[test]
    fn test_number_is_unix_millis() {
        let v = Value::Number(86_400_000.0).to_datetime();
        let dt = v.as_datetime().unwrap();
        assert_eq!(dt.to_date_string(), "1970-01-02");

        match Value::Number(-1e300).to_datetime() {
            Value::Error(e) => assert_eq!(e.code, crate::codes::INVALID_DATE),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_get_field() {
        let mut map = HashMap::new();
        map.insert("amount".to_string(), Value::Number(3.0));
        let obj = Value::Object(map);
        assert_eq!(obj.get("amount"), Value::Number(3.0));
        assert!(obj.get("missing").is_error());
        assert!(Value::Number(1.0).get("x").is_error());
    }

    #[test]
    fn test_labels() {
        assert_eq!(Value::from("Marketing").to_label(), "Marketing");
        assert_eq!(Value::Number(7.0).to_label(), "7");
        assert_eq!(Value::Bool(true).to_label(), "true");
    }

    #[test]
    fn test_option_and_vec_conversions() {
        assert_eq!(Value::from(None::<f64>), Value::Null);
        assert_eq!(Value::from(Some(2.0)), Value::Number(2.0));
        assert_eq!(Value::from(vec![1.0, 2.0]).as_list().map(|l| l.len()), Some(2));
    }
}
