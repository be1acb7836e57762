//! Coercion of raw option and argument values to their declared types.

use crate::error::{CommandError, Result};
use crate::option::ValueType;
use crate::value::Value;

/// Converts a raw value to `value_type`, reporting failures under `name`.
///
/// Lists (repeated options, variadic arguments) are converted item by item,
/// except for [`ValueType::Factory`] hooks, which receive the raw value as
/// a whole.
///
/// # Errors
///
/// - [`ErrorKind::InvalidNumber`](crate::ErrorKind::InvalidNumber) when a
///   number cannot be read.
/// - [`ErrorKind::InvalidEnumValue`](crate::ErrorKind::InvalidEnumValue)
///   when a value is outside the declared set.
/// - [`ErrorKind::TypeConversionFailure`](crate::ErrorKind::TypeConversionFailure)
///   when a factory hook fails.
/// - Whatever a constructible hook returns.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{convert_value, Value, ValueType};
///
/// let n = convert_value(&Value::from("0x10"), &ValueType::Number, "count").unwrap();
/// assert_eq!(n, Value::Number(16.0));
///
/// let b = convert_value(&Value::from("false"), &ValueType::Bool, "debug").unwrap();
/// assert_eq!(b, Value::Bool(false));
///
/// let err = convert_value(&Value::from("ten"), &ValueType::Number, "count").unwrap_err();
/// assert!(err.message().contains("Invalid number for count"));
/// ```
pub fn convert_value(value: &Value, value_type: &ValueType, name: &str) -> Result<Value> {
    match (value, value_type) {
        (_, ValueType::Factory { name: type_name, from }) => from(value)
            .map_err(|err| CommandError::type_conversion(name, value.to_json(), type_name, &err)),
        (Value::List(items), _) => items
            .iter()
            .map(|item| convert_value(item, value_type, name))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        (_, ValueType::Bool) => Ok(Value::Bool(
            !matches!(value, Value::Bool(false)) && value.as_str() != Some("false"),
        )),
        (_, ValueType::Number) => {
            let n = to_number(value);
            if n.is_nan() {
                Err(CommandError::invalid_number(name, &value.to_string()))
            } else {
                Ok(Value::Number(n))
            }
        }
        (_, ValueType::String) => Ok(Value::String(value.to_string())),
        (_, ValueType::Enum(valid)) => {
            let text = value.to_string();
            if valid.contains(&text) {
                Ok(Value::String(text))
            } else {
                Err(CommandError::invalid_enum_value(name, &text, valid))
            }
        }
        (_, ValueType::StringFactory { name: type_name, from_str }) => from_str(&value.to_string())
            .map_err(|err| CommandError::type_conversion(name, value.to_json(), type_name, &err)),
        (_, ValueType::Constructible { construct, .. }) => construct(value.clone()),
    }
}

fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => *n,
        Value::String(s) => parse_number(s),
        Value::List(items) => match items.as_slice() {
            [] => 0.0,
            [single] => to_number(single),
            _ => f64::NAN,
        },
        Value::Custom(custom) => parse_number(&custom.to_string()),
    }
}

/// Reads a number the way a script runtime does: surrounding whitespace is
/// ignored, empty text is zero, `0x`/`0o`/`0b` prefixes select a radix.
fn parse_number(text: &str) -> f64 {
    let t = text.trim();
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = t.strip_prefix(prefix) {
            if digits.is_empty() || digits.starts_with(['+', '-']) {
                return f64::NAN;
            }
            return u64::from_str_radix(digits, radix)
                .map(|n| n as f64)
                .unwrap_or(f64::NAN);
        }
    }
    // Rust also accepts "inf" and "nan" spellings.
    if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use super::*;
    use crate::error::{BoxError, ErrorKind};

    #[derive(Debug, Clone, PartialEq)]
    struct Complex {
        count: f64,
        value: String,
    }

    impl fmt::Display for Complex {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}\n{}", self.count, self.value)
        }
    }

    impl Complex {
        fn from_string(raw: &str) -> Result<Self> {
            let mut lines = raw.split('\n');
            let count = parse_number(lines.next().unwrap_or_default());
            let value = lines.collect::<Vec<_>>().join("\n");
            if count.is_nan() || count <= 0.0 {
                return Err(CommandError::new(
                    "Count must be greater than zero",
                    serde_json::json!({ "count": count.to_string() }),
                ));
            }
            Ok(Self { count, value })
        }
    }

    #[test]
    fn test_bool_rules() {
        let t = |v: Value| convert_value(&v, &ValueType::Bool, "flag").unwrap();
        assert_eq!(t(Value::Bool(true)), Value::Bool(true));
        assert_eq!(t(Value::Bool(false)), Value::Bool(false));
        assert_eq!(t(Value::from("false")), Value::Bool(false));
        assert_eq!(t(Value::from("no")), Value::Bool(true));
        assert_eq!(t(Value::from("")), Value::Bool(true));
    }

    #[test]
    fn test_number_parsing() {
        assert_eq!(parse_number(" 42 "), 42.0);
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("1e3"), 1000.0);
        assert_eq!(parse_number("-2.5"), -2.5);
        assert_eq!(parse_number("0b101"), 5.0);
        assert_eq!(parse_number("-Infinity"), f64::NEG_INFINITY);
        assert!(parse_number("inf").is_nan());
        assert!(parse_number("NaN").is_nan());
        assert!(parse_number("12px").is_nan());
        assert!(parse_number("0x").is_nan());
    }

    #[test]
    fn test_invalid_number_error() {
        let err = convert_value(&Value::from("not-a-number"), &ValueType::Number, "count")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidNumber);
        assert_eq!(err.message(), "Invalid number for count: not-a-number");
        assert_eq!(err.data()["providedValue"], "not-a-number");
    }

    #[test]
    fn test_enum_membership() {
        let formats = ValueType::enumeration(["json", "yaml"]);
        assert_eq!(
            convert_value(&Value::from("yaml"), &formats, "format").unwrap(),
            Value::from("yaml")
        );

        let err = convert_value(&Value::from("xml"), &formats, "format").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidEnumValue);
        assert_eq!(err.data()["validValues"], serde_json::json!(["json", "yaml"]));
    }

    #[test]
    fn test_lists_convert_item_by_item() {
        let raw = Value::List(vec![Value::from("1"), Value::from("2")]);
        let converted = convert_value(&raw, &ValueType::Number, "n").unwrap();
        assert_eq!(converted, Value::List(vec![Value::from(1), Value::from(2)]));
    }

    #[test]
    fn test_factory_receives_whole_list() {
        let count = ValueType::factory("Count", |v: &Value| {
            Ok(Value::from(v.as_list().map_or(1, |items| items.len() as i64)))
        });
        let raw = Value::List(vec![Value::from("a"), Value::from("b")]);
        assert_eq!(convert_value(&raw, &count, "tags").unwrap(), Value::from(2));
    }

    #[test]
    fn test_string_factory_failure_is_wrapped() {
        let port = ValueType::parsed::<u16>();
        assert_eq!(
            convert_value(&Value::from("8080"), &port, "port")
                .unwrap()
                .downcast_ref::<u16>(),
            Some(&8080)
        );

        let err = convert_value(&Value::from("99999"), &port, "port").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeConversionFailure);
        assert!(err.message().starts_with("Failed to parse port: "));
        assert_eq!(err.data()["type"], "u16");
        assert_eq!(err.data()["value"], "99999");
    }

    #[test]
    fn test_factory_error_is_wrapped() {
        let strict = ValueType::factory("Strict", |_: &Value| -> std::result::Result<Value, BoxError> {
            Err("rejected".into())
        });
        let err = convert_value(&Value::from("x"), &strict, "thing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeConversionFailure);
        assert_eq!(err.data()["error"], "rejected");
    }

    #[test]
    fn test_constructible_error_propagates_unchanged() {
        let complex = ValueType::constructible("Complex", |v: Value| {
            Complex::from_string(&v.to_string()).map(Value::custom)
        });

        let ok = convert_value(&Value::from("5\ntest"), &complex, "complex").unwrap();
        assert_eq!(
            ok.downcast_ref::<Complex>(),
            Some(&Complex {
                count: 5.0,
                value: "test".into()
            })
        );

        let err = convert_value(&Value::from("0\ntest"), &complex, "complex").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Custom);
        assert_eq!(err.message(), "Count must be greater than zero");
    }
}
