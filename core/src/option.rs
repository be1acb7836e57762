//! Option and argument declarations.
//!
//! A [`CommandOption`] describes one named option (`--name`, `-n`) or one
//! positional argument: its [`ValueType`], default, help text, alias and
//! whether it is required. The value type is a closed set chosen when the
//! option is declared; custom types plug in through the hook variants.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{BoxError, Result};
use crate::value::{Value, short_type_name};

type FromFn = dyn Fn(&Value) -> std::result::Result<Value, BoxError> + Send + Sync;
type FromStrFn = dyn Fn(&str) -> std::result::Result<Value, BoxError> + Send + Sync;
type ConstructFn = dyn Fn(Value) -> Result<Value> + Send + Sync;

/// Target type of an option or argument value.
///
/// # Examples
///
/// ```
/// use cmdtree_core::ValueType;
///
/// assert_eq!(ValueType::Number.label(), "Number");
/// assert_eq!(ValueType::enumeration(["json", "yaml"]).label(), "json|yaml");
///
/// let port = ValueType::parsed::<u16>();
/// assert_eq!(port.label(), "u16");
/// ```
#[derive(Clone, Default)]
pub enum ValueType {
    /// `true` unless the raw value is `"false"` or `false`.
    Bool,
    /// Script-style numeric conversion; NaN is rejected.
    Number,
    /// Stringification.
    #[default]
    String,
    /// One of a fixed set of literals.
    Enum(Vec<String>),
    /// A hook receiving the raw value, errors reported as conversion failures.
    Factory { name: String, from: Arc<FromFn> },
    /// A hook receiving the raw value's text, errors reported as conversion
    /// failures.
    StringFactory { name: String, from_str: Arc<FromStrFn> },
    /// A constructor whose own [`CommandError`](crate::CommandError)
    /// propagates unchanged.
    Constructible { name: String, construct: Arc<ConstructFn> },
}

impl ValueType {
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum(values.into_iter().map(Into::into).collect())
    }

    pub fn factory<F>(name: impl Into<String>, from: F) -> Self
    where
        F: Fn(&Value) -> std::result::Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self::Factory {
            name: name.into(),
            from: Arc::new(from),
        }
    }

    pub fn string_factory<F>(name: impl Into<String>, from_str: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self::StringFactory {
            name: name.into(),
            from_str: Arc::new(from_str),
        }
    }

    pub fn constructible<F>(name: impl Into<String>, construct: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self::Constructible {
            name: name.into(),
            construct: Arc::new(construct),
        }
    }

    /// A string factory backed by [`FromStr`], storing the parsed value as a
    /// [`Value::Custom`].
    pub fn parsed<T>() -> Self
    where
        T: FromStr + fmt::Display + Send + Sync + 'static,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        Self::string_factory(short_type_name::<T>(), |raw| {
            raw.parse::<T>()
                .map(Value::custom)
                .map_err(|err| Box::new(err) as BoxError)
        })
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    /// Human-readable type label used in help output.
    pub fn label(&self) -> String {
        match self {
            Self::Bool => "Boolean".to_string(),
            Self::Number => "Number".to_string(),
            Self::String => "String".to_string(),
            Self::Enum(values) => values.join("|"),
            Self::Factory { name, .. }
            | Self::StringFactory { name, .. }
            | Self::Constructible { name, .. } => name.clone(),
        }
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("Bool"),
            Self::Number => f.write_str("Number"),
            Self::String => f.write_str("String"),
            Self::Enum(values) => f.debug_tuple("Enum").field(values).finish(),
            Self::Factory { name, .. } => f.debug_tuple("Factory").field(name).finish(),
            Self::StringFactory { name, .. } => {
                f.debug_tuple("StringFactory").field(name).finish()
            }
            Self::Constructible { name, .. } => {
                f.debug_tuple("Constructible").field(name).finish()
            }
        }
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool, Self::Bool)
            | (Self::Number, Self::Number)
            | (Self::String, Self::String) => true,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::Factory { from: a, .. }, Self::Factory { from: b, .. }) => Arc::ptr_eq(a, b),
            (
                Self::StringFactory { from_str: a, .. },
                Self::StringFactory { from_str: b, .. },
            ) => Arc::ptr_eq(a, b),
            (
                Self::Constructible { construct: a, .. },
                Self::Constructible { construct: b, .. },
            ) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Declaration of one option or positional argument.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{CommandOption, Value, ValueType};
///
/// let count = CommandOption::new("count", ValueType::Number)
///     .with_default(10)
///     .with_help("Number of items")
///     .with_alias('c');
/// assert_eq!(count.get_default(), &Value::from(10));
/// assert!(count.is_optional());
///
/// let record = count.to_object();
/// assert_eq!(record.type_label, "Number");
/// assert_eq!(record.default_text, " (default: 10)");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOption {
    pub name: String,
    pub value_type: ValueType,
    pub default: Value,
    pub help: String,
    pub alias: Option<char>,
    pub required: bool,
}

impl CommandOption {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            default: Value::Null,
            help: String::new(),
            alias: None,
            required: false,
        }
    }

    /// A boolean flag defaulting to `false`.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Bool).with_default(false)
    }

    /// A string option with an empty default, the shape of a bare-name
    /// declaration.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::String).with_default("")
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Number)
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn with_alias(mut self, alias: char) -> Self {
        self.alias = Some(alias);
        self
    }

    /// Marks a positional argument as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// The configured default, verbatim.
    pub fn get_default(&self) -> &Value {
        &self.default
    }

    /// `true` unless required with no usable default.
    pub fn is_optional(&self) -> bool {
        !self.required || !self.default.is_null()
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == "*"
    }

    /// Display record used to build help rows.
    pub fn to_object(&self) -> OptionDisplay {
        let default_text = if self.default.is_null() {
            String::new()
        } else {
            format!(" (default: {})", self.default)
        };
        OptionDisplay {
            name: self.name.clone(),
            type_label: self.value_type.label(),
            default_text,
            help: self.help.clone(),
            alias: self.alias,
        }
    }
}

impl From<&str> for CommandOption {
    fn from(name: &str) -> Self {
        Self::string(name)
    }
}

/// Flattened view of a [`CommandOption`] for help rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDisplay {
    pub name: String,
    pub type_label: String,
    /// `" (default: …)"` or empty when there is no default.
    pub default_text: String,
    pub help: String,
    pub alias: Option<char>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_name_is_string_with_empty_default() {
        let option = CommandOption::from("file");
        assert_eq!(option.name, "file");
        assert_eq!(option.value_type, ValueType::String);
        assert_eq!(option.default, Value::from(""));
        assert!(option.alias.is_none());
    }

    #[test]
    fn test_required_without_default_is_not_optional() {
        let option = CommandOption::new("target", ValueType::String).required();
        assert!(!option.is_optional());

        let with_default = option.clone().with_default("here");
        assert!(with_default.is_optional());
    }

    #[test]
    fn test_to_object_for_enum_without_default() {
        let option = CommandOption::new("format", ValueType::enumeration(["json", "yaml"]))
            .with_help("Output format");
        let record = option.to_object();

        assert_eq!(record.type_label, "json|yaml");
        assert_eq!(record.default_text, "");
        assert_eq!(record.help, "Output format");
    }

    #[test]
    fn test_boolean_default_text() {
        let record = CommandOption::boolean("verbose").to_object();
        assert_eq!(record.type_label, "Boolean");
        assert_eq!(record.default_text, " (default: false)");
    }

    #[test]
    fn test_hook_types_compare_by_identity() {
        let a = ValueType::factory("Thing", |v| Ok(v.clone()));
        let b = ValueType::factory("Thing", |v| Ok(v.clone()));

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(format!("{a:?}"), "Factory(\"Thing\")");
    }
}
