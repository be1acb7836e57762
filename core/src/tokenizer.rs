//! Quote-aware splitting of raw command lines.
//!
//! A command line arrives either as a single string (typed by a user,
//! received over a chat channel) or as an already split argv. [`IntoArgv`]
//! turns both into an [`Argv`]: the token list plus the raw body that is
//! kept on the resulting message.

use crate::error::{CommandError, Result};

/// Tokens of a command line together with its raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Argv {
    /// The original string, or the tokens re-joined with quoting.
    pub body: String,
    pub tokens: Vec<String>,
}

impl Argv {
    /// Builds an argv from pre-split tokens.
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        let body = join_tokens(&tokens);
        Self { body, tokens }
    }
}

/// Conversion into a tokenized command line.
///
/// Strings are tokenized with [`tokenize`]; sequences of strings pass
/// through unchanged.
pub trait IntoArgv {
    fn into_argv(self) -> Result<Argv>;
}

impl IntoArgv for Argv {
    fn into_argv(self) -> Result<Argv> {
        Ok(self)
    }
}

impl IntoArgv for &str {
    fn into_argv(self) -> Result<Argv> {
        Ok(Argv {
            body: self.to_string(),
            tokens: tokenize(self)?,
        })
    }
}

impl IntoArgv for String {
    fn into_argv(self) -> Result<Argv> {
        self.as_str().into_argv()
    }
}

impl IntoArgv for &String {
    fn into_argv(self) -> Result<Argv> {
        self.as_str().into_argv()
    }
}

impl IntoArgv for Vec<String> {
    fn into_argv(self) -> Result<Argv> {
        Ok(Argv::from_tokens(self))
    }
}

impl IntoArgv for &[String] {
    fn into_argv(self) -> Result<Argv> {
        Ok(Argv::from_tokens(self.to_vec()))
    }
}

impl IntoArgv for Vec<&str> {
    fn into_argv(self) -> Result<Argv> {
        self.as_slice().into_argv()
    }
}

impl IntoArgv for &[&str] {
    fn into_argv(self) -> Result<Argv> {
        Ok(Argv::from_tokens(self.iter().map(|s| s.to_string()).collect()))
    }
}

impl<const N: usize> IntoArgv for [&str; N] {
    fn into_argv(self) -> Result<Argv> {
        self.as_slice().into_argv()
    }
}

/// Splits a command line into tokens.
///
/// Runs of whitespace, line breaks included, separate tokens. A token
/// starting with `"` or `'` extends to the matching closing quote; the
/// quotes are dropped and inner whitespace kept. Inside a quoted span, `\` escapes the quote character and itself.
///
/// # Errors
///
/// Returns [`ErrorKind::UnmatchedQuote`](crate::ErrorKind::UnmatchedQuote)
/// when the input ends inside a quoted span.
///
/// # Examples
///
/// ```
/// use cmdtree_core::tokenize;
///
/// let tokens = tokenize(r#"git commit -m "Initial commit" --verbose"#).unwrap();
/// assert_eq!(tokens, ["git", "commit", "-m", "Initial commit", "--verbose"]);
///
/// assert!(tokenize("echo 'oops").is_err());
/// ```
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    let chars: Vec<char> = input.trim().chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }

        if chars[i] == '"' || chars[i] == '\'' {
            let quote = chars[i];
            i += 1;
            let mut token = String::new();
            loop {
                match chars.get(i) {
                    None => return Err(CommandError::unmatched_quote(input)),
                    Some(&c) if c == quote => {
                        i += 1;
                        break;
                    }
                    Some('\\') if matches!(chars.get(i + 1), Some(&n) if n == quote || n == '\\') => {
                        token.push(chars[i + 1]);
                        i += 2;
                    }
                    Some(&c) => {
                        token.push(c);
                        i += 1;
                    }
                }
            }
            tokens.push(token);
        } else {
            let start = i;
            while i < chars.len() && !chars[i].is_whitespace() {
                i += 1;
            }
            tokens.push(chars[start..i].iter().collect());
        }
    }

    Ok(tokens)
}

/// Quotes a token when reading it back would otherwise split or unquote it.
pub(crate) fn quote(token: &str) -> String {
    let needs_quotes = token.is_empty()
        || token.contains(char::is_whitespace)
        || token.starts_with('"')
        || token.starts_with('\'');
    if !needs_quotes {
        return token.to_string();
    }
    let mut quoted = String::with_capacity(token.len() + 2);
    quoted.push('"');
    for c in token.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

pub(crate) fn join_tokens(tokens: &[String]) -> String {
    tokens.iter().map(|t| quote(t)).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_tokenize_preserves_quoted_spaces() {
        let tokens = tokenize(r#"complex --ignore-rules "some operators and" -v values"#).unwrap();
        assert_eq!(
            tokens,
            ["complex", "--ignore-rules", "some operators and", "-v", "values"]
        );
    }

    #[test]
    fn test_tokenize_single_quotes_and_runs_of_spaces() {
        let tokens = tokenize("  say   'hello   world'  now ").unwrap();
        assert_eq!(tokens, ["say", "hello   world", "now"]);
    }

    #[test]
    fn test_tokenize_escaped_quote_inside_span() {
        let tokens = tokenize(r#"echo "a \"b\" c\\d""#).unwrap();
        assert_eq!(tokens, ["echo", r#"a "b" c\d"#]);
    }

    #[test]
    fn test_tokenize_backslash_without_escape_is_literal() {
        let tokens = tokenize(r#"open "C:\My Docs""#).unwrap();
        assert_eq!(tokens, ["open", r"C:\My Docs"]);
    }

    #[test]
    fn test_tokenize_splits_on_line_breaks_and_tabs() {
        let tokens = tokenize("git --verbose\n  commit\t--all 'a\nb'").unwrap();
        assert_eq!(tokens, ["git", "--verbose", "commit", "--all", "a\nb"]);
    }

    #[test]
    fn test_tokenize_unmatched_quote() {
        let err = tokenize(r#"say "hello"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnmatchedQuote);
        assert!(err.message().starts_with("Unmatched quote in argument"));
    }

    #[test]
    fn test_tokenize_empty_input() {
        assert!(tokenize("   ").unwrap().is_empty());
        assert_eq!(tokenize(r#""""#).unwrap(), [""]);
    }

    #[test]
    fn test_sequences_pass_through() {
        let argv = ["a b", "--x"].into_argv().unwrap();
        assert_eq!(argv.tokens, ["a b", "--x"]);
        assert_eq!(argv.body, r#""a b" --x"#);
    }

    #[test]
    fn test_quote_round_trips_through_tokenize() {
        for token in ["plain", "two words", "", "\"lead", r"back\slash q", "'x", "2\nok", "tab\there"] {
            let quoted = quote(token);
            assert_eq!(tokenize(&quoted).unwrap(), [token], "token {token:?}");
        }
    }
}
