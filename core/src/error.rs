//! Structured parse errors.
//!
//! Every failure in the parsing core is reported as a [`CommandError`]: an
//! [`ErrorKind`] for matching, a human-readable message, and a JSON `data`
//! payload carrying the context (offending value, valid choices, missing
//! names). Errors are never recovered internally; they propagate to the
//! caller of [`Command::parse`](crate::Command::parse).

use std::fmt;

use serde_json::{Value as Json, json};
use thiserror::Error;

/// Boxed error returned by custom type hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classification of a [`CommandError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The tokenizer reached end of input inside a quoted span.
    UnmatchedQuote,
    /// Numeric coercion produced NaN.
    InvalidNumber,
    /// A value is not a member of the declared enum set.
    InvalidEnumValue,
    /// One or more required positional arguments were not supplied.
    MissingRequiredArguments,
    /// A positional token did not match any registered subcommand.
    UnknownSubcommand,
    /// A custom type hook rejected the value.
    TypeConversionFailure,
    /// A combined short flag group named an option that takes a value.
    CombinedFlagNotBoolean,
    /// An option, argument or subcommand declaration is malformed.
    InvalidDeclaration,
    /// Raised by user code, e.g. a constructible type's validation.
    Custom,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::UnmatchedQuote => "unmatched quote",
            Self::InvalidNumber => "invalid number",
            Self::InvalidEnumValue => "invalid enum value",
            Self::MissingRequiredArguments => "missing required arguments",
            Self::UnknownSubcommand => "unknown subcommand",
            Self::TypeConversionFailure => "type conversion failure",
            Self::CombinedFlagNotBoolean => "combined flag not boolean",
            Self::InvalidDeclaration => "invalid declaration",
            Self::Custom => "custom",
        };
        f.write_str(label)
    }
}

/// Error raised while declaring or parsing commands.
///
/// `Display` renders the message followed by the pretty-printed `data`
/// payload, unless the payload is null.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{CommandError, ErrorKind};
/// use serde_json::json;
///
/// let err = CommandError::new("Count must be greater than zero", json!({ "count": 0 }));
/// assert_eq!(err.kind(), ErrorKind::Custom);
/// assert_eq!(err.message(), "Count must be greater than zero");
/// assert!(err.to_string().contains("\"count\": 0"));
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", render(.message, .data))]
pub struct CommandError {
    kind: ErrorKind,
    message: String,
    data: Json,
}

impl CommandError {
    /// Creates a [`ErrorKind::Custom`] error with a context payload.
    pub fn new(message: impl Into<String>, data: Json) -> Self {
        Self::with_kind(ErrorKind::Custom, message, data)
    }

    /// Creates an error of a specific kind.
    pub fn with_kind(kind: ErrorKind, message: impl Into<String>, data: Json) -> Self {
        Self {
            kind,
            message: message.into(),
            data,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> &Json {
        &self.data
    }

    pub(crate) fn unmatched_quote(input: &str) -> Self {
        Self::with_kind(
            ErrorKind::UnmatchedQuote,
            format!("Unmatched quote in argument: {input}"),
            json!({ "input": input }),
        )
    }

    pub(crate) fn invalid_number(name: &str, value: &str) -> Self {
        Self::with_kind(
            ErrorKind::InvalidNumber,
            format!("Invalid number for {name}: {value}"),
            json!({ "providedValue": value }),
        )
    }

    pub(crate) fn invalid_enum_value(name: &str, value: &str, valid: &[String]) -> Self {
        Self::with_kind(
            ErrorKind::InvalidEnumValue,
            format!(
                "Invalid value for {name}: {value}\nValid values: {}",
                valid.join(", ")
            ),
            json!({ "validValues": valid, "providedValue": value }),
        )
    }

    pub(crate) fn type_conversion(name: &str, value: Json, type_name: &str, err: &BoxError) -> Self {
        Self::with_kind(
            ErrorKind::TypeConversionFailure,
            format!("Failed to parse {name}: {err}"),
            json!({ "value": value, "type": type_name, "error": err.to_string() }),
        )
    }

    pub(crate) fn invalid_declaration(message: impl Into<String>, data: Json) -> Self {
        Self::with_kind(ErrorKind::InvalidDeclaration, message, data)
    }
}

fn render(message: &str, data: &Json) -> String {
    if data.is_null() {
        return message.to_string();
    }
    let data = serde_json::to_string_pretty(data).unwrap_or_default();
    format!("{message}\n{data}")
}

/// Convenience alias for results with [`CommandError`].
pub type Result<T> = std::result::Result<T, CommandError>;
