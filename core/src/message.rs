//! Parsed command messages.
//!
//! [`CommandMessage::parse`] is the flat, schema-free view of a command
//! line: the first bare token is the command name, later bare tokens are
//! positional values and everything dash-prefixed becomes an option. The
//! same type carries the typed result of [`Command::parse`](crate::Command::parse),
//! where values are coerced and subcommand messages hang off `children`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as Json, json};

use crate::error::{CommandError, Result};
use crate::tokenizer::{IntoArgv, quote};
use crate::value::Value;

/// Options keyed by name. Ordered so rendering is deterministic.
pub type Opts = BTreeMap<String, Value>;

/// A command line split into name, positional values, options and
/// subcommand messages.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{CommandMessage, Value};
///
/// let msg = CommandMessage::parse(r#"git commit -m "Initial commit" --verbose"#).unwrap();
/// assert_eq!(msg.name(), "git");
/// assert_eq!(msg.argv(), [Value::from("commit")]);
/// assert_eq!(msg.opt("m"), Some(&Value::from("Initial commit")));
/// assert_eq!(msg.opt("verbose"), Some(&Value::Bool(true)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommandMessage {
    name: String,
    argv: Vec<Value>,
    opts: Opts,
    children: Vec<CommandMessage>,
    body: String,
}

impl CommandMessage {
    /// Creates a message and derives its body from the parts.
    pub fn new(name: impl Into<String>, argv: Vec<Value>, opts: Opts) -> Self {
        let mut msg = Self {
            name: name.into(),
            argv,
            opts,
            children: Vec::new(),
            body: String::new(),
        };
        msg.body = msg.to_string();
        msg
    }

    /// Assembles a typed message, keeping the raw body as given.
    pub(crate) fn from_parts(
        name: String,
        argv: Vec<Value>,
        opts: Opts,
        children: Vec<CommandMessage>,
        body: String,
    ) -> Self {
        Self {
            name,
            argv,
            opts,
            children,
            body,
        }
    }

    /// Parses a command line without any declarations.
    ///
    /// # Errors
    ///
    /// Only tokenizing can fail, with
    /// [`ErrorKind::UnmatchedQuote`](crate::ErrorKind::UnmatchedQuote).
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdtree_core::{CommandMessage, Value};
    ///
    /// let msg = CommandMessage::parse("cmd -abc --x 1 --x 2").unwrap();
    /// assert_eq!(msg.opt("a"), Some(&Value::Bool(true)));
    /// assert_eq!(msg.opt("c"), Some(&Value::Bool(true)));
    /// assert_eq!(
    ///     msg.opt("x"),
    ///     Some(&Value::List(vec![Value::from("1"), Value::from("2")]))
    /// );
    /// ```
    pub fn parse(input: impl IntoArgv) -> Result<Self> {
        let argv = input.into_argv()?;
        let scan = scan(&argv.tokens);
        let mut positionals = scan.positionals.into_iter().map(|(_, token)| token);
        let name = positionals.next().unwrap_or_default();
        Ok(Self {
            name,
            argv: positionals.map(Value::String).collect(),
            opts: scan.opts,
            children: Vec::new(),
            body: argv.body,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Positional values, not including the name.
    pub fn argv(&self) -> &[Value] {
        &self.argv
    }

    /// The full positional list: the name followed by `argv`.
    pub fn args(&self) -> Vec<Value> {
        let mut args = Vec::with_capacity(self.argv.len() + 1);
        if !self.name.is_empty() {
            args.push(Value::String(self.name.clone()));
        }
        args.extend(self.argv.iter().cloned());
        args
    }

    pub fn opts(&self) -> &Opts {
        &self.opts
    }

    pub fn opt(&self, key: &str) -> Option<&Value> {
        self.opts.get(key)
    }

    pub fn children(&self) -> &[CommandMessage] {
        &self.children
    }

    /// The raw command line this message was parsed from, or the rendered
    /// form after a setter ran.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Name of the first subcommand, if one was invoked.
    pub fn sub_command(&self) -> Option<&str> {
        self.children.first().map(|c| c.name.as_str())
    }

    pub fn sub_command_message(&self) -> Option<&CommandMessage> {
        self.children.first()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.refresh_body();
    }

    pub fn set_argv(&mut self, argv: Vec<Value>) {
        self.argv = argv;
        self.refresh_body();
    }

    pub fn set_opts(&mut self, opts: Opts) {
        self.opts = opts;
        self.refresh_body();
    }

    /// Attaches a subcommand message.
    pub fn add(&mut self, child: CommandMessage) {
        self.children.push(child);
        self.refresh_body();
    }

    fn refresh_body(&mut self) {
        self.body = self.to_string();
    }

    /// Deserializes the options into a typed struct.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdtree_core::CommandMessage;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct CommitOpts {
    ///     m: String,
    ///     #[serde(default)]
    ///     verbose: bool,
    /// }
    ///
    /// let msg = CommandMessage::parse(r#"git commit -m "Initial commit" --verbose"#).unwrap();
    /// let opts: CommitOpts = msg.opts_as().unwrap();
    /// assert_eq!(opts.m, "Initial commit");
    /// assert!(opts.verbose);
    /// ```
    pub fn opts_as<T: DeserializeOwned>(&self) -> Result<T> {
        let map: Map<String, Json> = self
            .opts
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        serde_json::from_value(Json::Object(map)).map_err(|err| {
            CommandError::new(
                format!("Cannot read options of {}: {err}", self.name),
                json!({ "opts": self.opts }),
            )
        })
    }

    /// Converts the whole tree to JSON.
    pub fn to_json(&self) -> Json {
        serde_json::to_value(self).unwrap_or(Json::Null)
    }

    fn write_line(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if !self.name.is_empty() {
            parts.push(quote(&self.name));
        }
        let argv: Vec<String> = self.argv.iter().map(ToString::to_string).collect();
        // Positionals that look like options go after `--`.
        let after_options = argv.iter().any(|arg| arg.starts_with('-'));
        if !after_options {
            parts.extend(argv.iter().map(|arg| quote(arg)));
        }
        for (key, value) in &self.opts {
            render_option(&mut parts, key, value);
        }
        if after_options {
            parts.push("--".to_string());
            parts.extend(argv.iter().map(|arg| quote(arg)));
        }
        write!(f, "{}{}", "  ".repeat(depth), parts.join(" "))?;
        for child in &self.children {
            writeln!(f)?;
            child.write_line(f, depth + 1)?;
        }
        Ok(())
    }
}

fn render_option(parts: &mut Vec<String>, key: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(true) => parts.push(format!("--{key}")),
        Value::List(items) => {
            for item in items {
                render_option(parts, key, item);
            }
        }
        other => {
            let text = other.to_string();
            if text.starts_with('-') {
                parts.push(quote(&format!("--{key}={text}")));
            } else {
                parts.push(format!("--{key}"));
                parts.push(quote(&text));
            }
        }
    }
}

impl fmt::Display for CommandMessage {
    /// Renders the canonical command line, one line per message in the tree.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_line(f, 0)
    }
}

impl FromStr for CommandMessage {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Result of classifying tokens without declarations.
#[derive(Debug, Default)]
pub(crate) struct Scan {
    /// Bare tokens with their index in the token list.
    pub positionals: Vec<(usize, String)>,
    pub opts: Opts,
    /// Keys set from combined short flag groups such as `-abc`.
    pub combined: BTreeSet<String>,
}

fn set_option(opts: &mut Opts, key: &str, value: Value) {
    match opts.get_mut(key) {
        Some(existing) => existing.push(value),
        None => {
            opts.insert(key.to_string(), value);
        }
    }
}

/// Classifies tokens into positional values and options.
pub(crate) fn scan(tokens: &[String]) -> Scan {
    let mut scan = Scan::default();
    let mut i = 0;

    // The next token is a value unless it looks like another option.
    let value_at = |i: usize| -> Option<&String> {
        tokens.get(i).filter(|next| !next.starts_with('-'))
    };

    while i < tokens.len() {
        let token = &tokens[i];

        if token == "--" {
            scan.positionals
                .extend(tokens.iter().enumerate().skip(i + 1).map(|(j, t)| (j, t.clone())));
            break;
        }

        if let Some(long) = token.strip_prefix("--") {
            if let Some((key, value)) = long.split_once('=') {
                set_option(&mut scan.opts, key, Value::from(value));
                i += 1;
            } else if let Some(value) = value_at(i + 1) {
                set_option(&mut scan.opts, long, Value::from(value));
                i += 2;
            } else {
                set_option(&mut scan.opts, long, Value::Bool(true));
                i += 1;
            }
            continue;
        }

        match token.strip_prefix('-') {
            Some(short) if short.chars().count() > 1 => {
                for c in short.chars() {
                    let key = c.to_string();
                    set_option(&mut scan.opts, &key, Value::Bool(true));
                    scan.combined.insert(key);
                }
                i += 1;
            }
            Some(short) if !short.is_empty() => {
                if let Some(value) = value_at(i + 1) {
                    set_option(&mut scan.opts, short, Value::from(value));
                    i += 2;
                } else {
                    set_option(&mut scan.opts, short, Value::Bool(true));
                    i += 1;
                }
            }
            _ => {
                scan.positionals.push((i, token.clone()));
                i += 1;
            }
        }
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn strings(values: &[&str]) -> Vec<Value> {
        values.iter().map(|v| Value::from(*v)).collect()
    }

    #[test]
    fn test_parse_only_arguments() {
        let msg = CommandMessage::parse(["cmd", "arg1", "arg2"]).unwrap();
        assert_eq!(msg.args(), strings(&["cmd", "arg1", "arg2"]));
        assert!(msg.opts().is_empty());
    }

    #[test]
    fn test_parse_long_flags() {
        let msg = CommandMessage::parse("cmd --help --version").unwrap();
        assert_eq!(msg.args(), strings(&["cmd"]));
        assert_eq!(msg.opt("help"), Some(&Value::Bool(true)));
        assert_eq!(msg.opt("version"), Some(&Value::Bool(true)));
        assert_eq!(msg.opts().len(), 2);
    }

    #[test]
    fn test_parse_short_options_with_values() {
        let msg = CommandMessage::parse(["cmd", "-f", "file.txt", "-v"]).unwrap();
        assert_eq!(msg.args(), strings(&["cmd"]));
        assert_eq!(msg.opt("f"), Some(&Value::from("file.txt")));
        assert_eq!(msg.opt("v"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_parse_equals_syntax_splits_at_first_equals() {
        let msg = CommandMessage::parse("run --define=a=b --empty=").unwrap();
        assert_eq!(msg.opt("define"), Some(&Value::from("a=b")));
        assert_eq!(msg.opt("empty"), Some(&Value::from("")));
    }

    #[test]
    fn test_parse_complex_string() {
        let msg = CommandMessage::parse(
            r#"complex --ignore-rules "some operators and" -v values --but --with --no -eol"#,
        )
        .unwrap();

        assert_eq!(msg.args(), strings(&["complex"]));
        let expected: Opts = [
            ("ignore-rules", Value::from("some operators and")),
            ("v", Value::from("values")),
            ("but", Value::Bool(true)),
            ("with", Value::Bool(true)),
            ("no", Value::Bool(true)),
            ("e", Value::Bool(true)),
            ("o", Value::Bool(true)),
            ("l", Value::Bool(true)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        assert_eq!(msg.opts(), &expected);
    }

    #[test]
    fn test_combined_flags_never_consume_values() {
        let msg = CommandMessage::parse("-abc value").unwrap();
        assert_eq!(msg.name(), "value");
        for key in ["a", "b", "c"] {
            assert_eq!(msg.opt(key), Some(&Value::Bool(true)));
        }
    }

    #[test]
    fn test_repeated_keys_become_lists() {
        let msg = CommandMessage::parse("--x 1 --x 2 --x=3").unwrap();
        assert_eq!(msg.opt("x"), Some(&Value::List(strings(&["1", "2", "3"]))));
    }

    #[test]
    fn test_double_dash_ends_options() {
        let msg = CommandMessage::parse("rm -- -file --other").unwrap();
        assert_eq!(msg.args(), strings(&["rm", "-file", "--other"]));
        assert!(msg.opts().is_empty());
    }

    #[test]
    fn test_lone_dash_is_positional() {
        let msg = CommandMessage::parse("cat - --number").unwrap();
        assert_eq!(msg.argv(), strings(&["-"]));
        assert_eq!(msg.opt("number"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_string_input_keeps_body() {
        let msg = CommandMessage::parse("simple command").unwrap();
        assert_eq!(msg.args(), strings(&["simple", "command"]));
        assert_eq!(msg.body(), "simple command");
    }

    #[test]
    fn test_to_string_quotes_and_renders_flags() {
        let mut opts = Opts::new();
        opts.insert("flag".into(), Value::Bool(true));
        opts.insert("file".into(), Value::from("test.txt"));
        opts.insert("title".into(), Value::from("a b"));
        let msg = CommandMessage::new("test", strings(&["arg1", "arg2"]), opts);

        assert_eq!(
            msg.to_string(),
            r#"test arg1 arg2 --file test.txt --flag --title "a b""#
        );
        assert_eq!(msg.body(), msg.to_string());
    }

    #[test]
    fn test_round_trip_scalar_options() {
        let original = CommandMessage::parse(
            r#"deploy "my app" prod --region eu --dry-run --note "two words" --offset=-3"#,
        )
        .unwrap();
        let reparsed: CommandMessage = original.to_string().parse().unwrap();

        assert_eq!(reparsed.name(), original.name());
        assert_eq!(reparsed.argv(), original.argv());
        assert_eq!(reparsed.opts(), original.opts());
    }

    #[test]
    fn test_dash_positionals_render_after_terminator() {
        let original = CommandMessage::parse("rm --force -- -file keep").unwrap();
        assert_eq!(original.argv(), strings(&["-file", "keep"]));

        let rendered = original.to_string();
        assert_eq!(rendered, "rm --force -- -file keep");

        let reparsed: CommandMessage = rendered.parse().unwrap();
        assert_eq!(reparsed.argv(), original.argv());
        assert_eq!(reparsed.opts(), original.opts());
    }

    #[test]
    fn test_rendered_tree_lines_read_back() {
        let mut parent_opts = Opts::new();
        parent_opts.insert("verbose".into(), Value::Bool(false));
        let mut parent = CommandMessage::new("git", Vec::new(), parent_opts);
        let mut child_opts = Opts::new();
        child_opts.insert("message".into(), Value::from("first line\nsecond"));
        child_opts.insert("all".into(), Value::Bool(true));
        parent.add(CommandMessage::new("commit", Vec::new(), child_opts.clone()));

        let rendered = parent.to_string();
        let tokens = tokenize(&rendered).unwrap();
        assert!(tokens.iter().all(|t| !t.ends_with('\n') && !t.starts_with(' ')));

        let lines: Vec<&str> = rendered.split("\n  ").collect();
        assert_eq!(lines.len(), 2);
        let child = CommandMessage::parse(lines[1]).unwrap();
        assert_eq!(child.name(), "commit");
        assert_eq!(child.opts(), &child_opts);

        let root = CommandMessage::parse(lines[0]).unwrap();
        assert_eq!(root.opt("verbose"), Some(&Value::from("false")));
    }

    #[test]
    fn test_children_render_indented() {
        let mut parent = CommandMessage::new("git", Vec::new(), Opts::new());
        let mut child_opts = Opts::new();
        child_opts.insert("all".into(), Value::Bool(true));
        parent.add(CommandMessage::new("commit", Vec::new(), child_opts));

        assert_eq!(parent.to_string(), "git\n  commit --all");
        assert_eq!(parent.sub_command(), Some("commit"));
    }

    #[test]
    fn test_setters_rederive_body() {
        let mut msg = CommandMessage::parse("a b").unwrap();
        msg.set_name("x");
        assert_eq!(msg.body(), "x b");
        msg.set_argv(Vec::new());
        assert_eq!(msg.body(), "x");
    }
}
