//! Dynamically typed values carried by command messages.
//!
//! Raw tokens enter the parser as strings or booleans; after coercion an
//! option or argument may hold a number, a list (repeated options, variadic
//! arguments) or a [`CustomValue`] built by a user type hook.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value as Json;

/// A parsed option or argument value.
///
/// # Examples
///
/// ```
/// use cmdtree_core::Value;
///
/// assert_eq!(Value::from(3.0).to_string(), "3");
/// assert_eq!(Value::from("a b").to_string(), "a b");
/// assert_eq!(Value::from(vec![Value::from("1"), Value::from("2")]).to_string(), "1,2");
/// assert!(Value::Null.is_null());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Custom(CustomValue),
}

impl Value {
    /// Wraps a user type as a [`Value::Custom`].
    pub fn custom<T>(value: T) -> Self
    where
        T: Any + Send + Sync + fmt::Display,
    {
        Self::Custom(CustomValue::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` only for `Bool(true)`.
    pub fn is_true(&self) -> bool {
        matches!(self, Self::Bool(true))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Downcasts a custom value to its concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Custom(custom) => custom.downcast_ref(),
            _ => None,
        }
    }

    /// Appends `other` to this value, turning a scalar into a list.
    pub(crate) fn push(&mut self, other: Value) {
        match self {
            Self::List(items) => items.push(other),
            _ => {
                let first = std::mem::take(self);
                *self = Self::List(vec![first, other]);
            }
        }
    }

    /// Converts to JSON. Custom values become their display text.
    pub fn to_json(&self) -> Json {
        match self {
            Self::Null => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .unwrap_or_else(|| Json::String(format_number(*n))),
            Self::String(s) => Json::String(s.clone()),
            Self::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Self::Custom(custom) => Json::String(custom.to_string()),
        }
    }

    /// Converts from JSON. Objects are kept as their compact JSON text.
    pub fn from_json(json: &Json) -> Self {
        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(*b),
            Json::Number(n) => n.as_f64().map(Self::Number).unwrap_or(Self::Null),
            Json::String(s) => Self::String(s.clone()),
            Json::Array(items) => Self::List(items.iter().map(Value::from_json).collect()),
            Json::Object(_) => Self::String(json.to_string()),
        }
    }
}

/// Formats a number the way a script runtime stringifies it: integral values
/// have no fractional part.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        (if n > 0.0 { "Infinity" } else { "-Infinity" }).to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::String(s) => f.write_str(s),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Self::Custom(custom) => write!(f, "{custom}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::String(s.clone())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// A value produced by a custom type hook.
///
/// Holds the concrete value behind an `Arc` together with its type name and
/// display text, so messages stay cloneable and printable without knowing
/// the concrete type.
#[derive(Clone)]
pub struct CustomValue {
    type_name: &'static str,
    display: String,
    inner: Arc<dyn Any + Send + Sync>,
}

impl CustomValue {
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync + fmt::Display,
    {
        Self {
            type_name: short_type_name::<T>(),
            display: value.to_string(),
            inner: Arc::new(value),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.type_name == other.type_name && self.display == other.display)
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomValue")
            .field("type_name", &self.type_name)
            .field("display", &self.display)
            .finish()
    }
}

impl fmt::Display for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Last path segment of a type name (`my_crate::Point` → `Point`).
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Point(i32, i32);

    impl fmt::Display for Point {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{},{}", self.0, self.1)
        }
    }

    #[test]
    fn test_number_display_matches_script_stringification() {
        assert_eq!(Value::from(10.0).to_string(), "10");
        assert_eq!(Value::from(-2.5).to_string(), "-2.5");
        assert_eq!(Value::from(f64::INFINITY).to_string(), "Infinity");
    }

    #[test]
    fn test_push_turns_scalar_into_list() {
        let mut value = Value::from("1");
        value.push(Value::from("2"));
        value.push(Value::from("3"));

        assert_eq!(
            value,
            Value::List(vec![Value::from("1"), Value::from("2"), Value::from("3")])
        );
    }

    #[test]
    fn test_custom_value_downcast_and_display() {
        let value = Value::custom(Point(1, 2));

        assert_eq!(value.downcast_ref::<Point>(), Some(&Point(1, 2)));
        assert!(value.downcast_ref::<String>().is_none());
        assert_eq!(value.to_string(), "1,2");
        match &value {
            Value::Custom(custom) => assert_eq!(custom.type_name(), "Point"),
            other => panic!("expected custom value, got {other:?}"),
        }
    }

    #[test]
    fn test_json_conversion() {
        let value = Value::List(vec![Value::from(true), Value::from(2.0), Value::Null]);
        let json = value.to_json();

        assert_eq!(json, serde_json::json!([true, 2.0, null]));
        assert_eq!(Value::from_json(&json), value);
    }
}
