//! Declarative command trees.
//!
//! A [`Command`] owns named options, ordered positional arguments and named
//! subcommands. [`Command::parse`] turns a command line into a typed
//! [`CommandMessage`]: aliases are resolved, values coerced, defaults filled,
//! required arguments checked, and the first positional token naming a
//! subcommand hands the rest of the line to that subcommand.
//!
//! A built tree is read-only while parsing; every call returns a fresh
//! message tree, so one `Command` can serve any number of parses, from any
//! number of threads.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use indexmap::IndexMap;
use serde_json::json;
use tracing::{debug, trace};

use crate::convert::convert_value;
use crate::error::{CommandError, ErrorKind, Result};
use crate::help::{PaddedTable, TableFormat};
use crate::message::{CommandMessage, Opts, scan};
use crate::option::CommandOption;
use crate::tokenizer::{IntoArgv, join_tokens};
use crate::value::Value;

/// Name of the variadic argument that collects every remaining value.
pub const WILDCARD: &str = "*";

/// A command node: options, arguments and subcommands.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{Command, CommandOption, Value};
///
/// let commit = Command::builder("commit")
///     .help("Record changes")
///     .option(CommandOption::string("message").with_alias('m'))
///     .build()
///     .unwrap();
/// let git = Command::builder("git")
///     .option(CommandOption::boolean("verbose").with_alias('v'))
///     .subcommand(commit)
///     .build()
///     .unwrap();
///
/// let msg = git.parse(r#"git commit -m "Initial commit""#).unwrap();
/// assert_eq!(msg.opt("verbose"), Some(&Value::Bool(false)));
/// assert_eq!(msg.opt("help"), Some(&Value::Bool(false)));
///
/// let sub = msg.sub_command_message().unwrap();
/// assert_eq!(sub.name(), "commit");
/// assert_eq!(sub.opt("message"), Some(&Value::from("Initial commit")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Command {
    name: String,
    help: String,
    usage: String,
    options: IndexMap<String, CommandOption>,
    arguments: IndexMap<String, CommandOption>,
    subcommands: IndexMap<String, Command>,
    aliases: BTreeMap<char, String>,
    strict_subcommands: bool,
}

impl Command {
    /// Creates a command with only the built-in `help` and `version` flags.
    pub fn new(name: impl Into<String>) -> Self {
        let mut command = Self {
            name: name.into(),
            ..Default::default()
        };
        command.init();
        command
    }

    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder::new(name)
    }

    /// Adds the built-in `help` (`-h`) and `version` (`-V`) flags unless
    /// options with those names already exist. Running it again is a no-op.
    ///
    /// A built-in flag whose alias letter is already taken is added without
    /// an alias.
    pub fn init(&mut self) {
        self.inject_flag("help", 'h', "Show help");
        self.inject_flag("version", 'V', "Show version");
    }

    fn inject_flag(&mut self, name: &str, alias: char, help: &str) {
        if self.options.contains_key(name) {
            return;
        }
        let mut option = CommandOption::boolean(name).with_help(help);
        if !self.aliases.contains_key(&alias) {
            option = option.with_alias(alias);
            self.aliases.insert(alias, name.to_string());
        }
        self.options.insert(name.to_string(), option);
    }

    /// Adds or replaces an option.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::InvalidDeclaration`] when the name is empty or starts
    /// with `-`, or when the alias is `-`, whitespace, or already bound to
    /// another option.
    pub fn add_option(&mut self, option: impl Into<CommandOption>) -> Result<&mut Self> {
        let option = option.into();
        validate_name("option", &option.name)?;

        if let Some(alias) = option.alias {
            if alias == '-' || alias.is_whitespace() {
                return Err(CommandError::invalid_declaration(
                    format!("Invalid alias for --{}: {alias:?}", option.name),
                    json!({ "option": option.name, "alias": alias.to_string() }),
                ));
            }
            if let Some(owner) = self.aliases.get(&alias) {
                if owner != &option.name {
                    return Err(CommandError::invalid_declaration(
                        format!("Alias -{alias} is already bound to --{owner}"),
                        json!({ "option": option.name, "alias": alias.to_string(), "boundTo": owner }),
                    ));
                }
            }
        }

        if let Some(previous) = self.options.get(&option.name) {
            if let Some(alias) = previous.alias {
                self.aliases.remove(&alias);
            }
        }
        if let Some(alias) = option.alias {
            self.aliases.insert(alias, option.name.clone());
        }
        self.options.insert(option.name.clone(), option);
        Ok(self)
    }

    /// Appends a positional argument.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::InvalidDeclaration`] for an empty or duplicate name, or
    /// for any argument declared after the wildcard `"*"`.
    pub fn add_argument(&mut self, argument: impl Into<CommandOption>) -> Result<&mut Self> {
        let argument = argument.into();
        if argument.name.is_empty() {
            return Err(CommandError::invalid_declaration(
                "Argument name cannot be empty",
                json!({ "command": self.name }),
            ));
        }
        if self.arguments.contains_key(WILDCARD) {
            return Err(CommandError::invalid_declaration(
                format!(
                    "Argument {} is declared after the wildcard argument, which must be last",
                    argument.name
                ),
                json!({ "command": self.name, "argument": argument.name }),
            ));
        }
        if self.arguments.contains_key(&argument.name) {
            return Err(CommandError::invalid_declaration(
                format!("Duplicate argument: {}", argument.name),
                json!({ "command": self.name, "argument": argument.name }),
            ));
        }
        self.arguments.insert(argument.name.clone(), argument);
        Ok(self)
    }

    /// Adds or replaces a subcommand.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::InvalidDeclaration`] when the subcommand name is empty or
    /// starts with `-`.
    pub fn add_subcommand(&mut self, subcommand: Command) -> Result<&mut Self> {
        validate_name("subcommand", &subcommand.name)?;
        self.subcommands.insert(subcommand.name.clone(), subcommand);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn options(&self) -> &IndexMap<String, CommandOption> {
        &self.options
    }

    pub fn arguments(&self) -> &IndexMap<String, CommandOption> {
        &self.arguments
    }

    pub fn subcommands(&self) -> &IndexMap<String, Command> {
        &self.subcommands
    }

    pub fn is_strict(&self) -> bool {
        self.strict_subcommands
    }

    pub fn get_option(&self, name: &str) -> Option<&CommandOption> {
        self.options.get(name)
    }

    pub fn get_argument(&self, name: &str) -> Option<&CommandOption> {
        self.arguments.get(name)
    }

    pub fn get_command(&self, name: &str) -> Option<&Command> {
        self.subcommands.get(name)
    }

    /// Canonical option name bound to a short alias.
    pub fn resolve_alias(&self, alias: char) -> Option<&str> {
        self.aliases.get(&alias).map(String::as_str)
    }

    /// Walks nested subcommands by name.
    ///
    /// An empty path returns `self`.
    pub fn find_command<S: AsRef<str>>(&self, path: &[S]) -> Option<&Command> {
        path.iter()
            .try_fold(self, |command, name| command.get_command(name.as_ref()))
    }

    /// Parses a command line into a typed message.
    ///
    /// # Errors
    ///
    /// Any [`CommandError`]: unmatched quotes, failed coercions, missing
    /// required arguments, an unknown subcommand under
    /// [`strict_subcommands`](CommandBuilder::strict_subcommands), or a
    /// value-taking option inside a combined flag group.
    pub fn parse(&self, input: impl IntoArgv) -> Result<CommandMessage> {
        let argv = input.into_argv()?;
        self.parse_tokens(&argv.tokens, argv.body)
    }

    fn parse_tokens(&self, tokens: &[String], body: String) -> Result<CommandMessage> {
        debug!(command = %self.name, tokens = tokens.len(), "Parsing command line");
        let flat = scan(tokens);
        let invoked = flat.positionals.first();

        // The leading token may repeat this command's own name.
        let candidate = match invoked {
            Some((_, token)) if *token == self.name => flat.positionals.get(1),
            other => other,
        };

        if let Some((index, token)) = candidate {
            if let Some(subcommand) = self.subcommands.get(token) {
                trace!(command = %self.name, subcommand = %token, "Delegating to subcommand");
                let rest = &tokens[*index..];
                let child = subcommand.parse_tokens(rest, join_tokens(rest))?;
                // The parent still reads every option on the line, so global
                // flags work after the subcommand name.
                return self.finish(
                    self.name.clone(),
                    &[],
                    flat.opts,
                    &flat.combined,
                    vec![child],
                    body,
                );
            }
            if self.strict_subcommands && !self.subcommands.is_empty() {
                return Err(CommandError::with_kind(
                    ErrorKind::UnknownSubcommand,
                    format!("Cannot find a sub-command: {token}"),
                    json!({
                        "command": self.name,
                        "subcommand": token,
                        "available": self.subcommands.keys().collect::<Vec<_>>(),
                    }),
                ));
            }
        }

        let name = invoked.map(|(_, token)| token.clone()).unwrap_or_default();
        let argv: Vec<String> = flat
            .positionals
            .iter()
            .skip(1)
            .map(|(_, token)| token.clone())
            .collect();
        self.finish(name, &argv, flat.opts, &flat.combined, Vec::new(), body)
    }

    fn finish(
        &self,
        name: String,
        argv: &[String],
        raw: Opts,
        combined: &BTreeSet<String>,
        children: Vec<CommandMessage>,
        body: String,
    ) -> Result<CommandMessage> {
        self.check_combined(combined)?;

        let mut opts = self.resolve_aliases(raw);
        for (option_name, option) in &self.options {
            let value = match opts.remove(option_name) {
                Some(raw) => convert_value(&raw, &option.value_type, option_name)?,
                None => option.get_default().clone(),
            };
            opts.insert(option_name.clone(), value);
        }

        // Positionals after a subcommand belong to it; the parent only gets
        // defaults and is not checked for required arguments.
        let args = self.bind_arguments(argv, children.is_empty())?;
        Ok(CommandMessage::from_parts(name, args, opts, children, body))
    }

    fn canonical_key<'a>(&'a self, key: &'a str) -> &'a str {
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => self.resolve_alias(c).unwrap_or(key),
            _ => key,
        }
    }

    fn resolve_aliases(&self, raw: Opts) -> Opts {
        let mut opts = Opts::new();
        for (key, value) in raw {
            let canonical = self.canonical_key(&key).to_string();
            match opts.get_mut(&canonical) {
                Some(existing) => match value {
                    Value::List(items) => items.into_iter().for_each(|item| existing.push(item)),
                    single => existing.push(single),
                },
                None => {
                    opts.insert(canonical, value);
                }
            }
        }
        opts
    }

    /// Letters of a combined group (`-abc`) are booleans; reject any that
    /// name an option taking a value.
    fn check_combined(&self, combined: &BTreeSet<String>) -> Result<()> {
        for key in combined {
            let canonical = self.canonical_key(key);
            if let Some(option) = self.options.get(canonical) {
                if !option.value_type.is_bool() {
                    return Err(CommandError::with_kind(
                        ErrorKind::CombinedFlagNotBoolean,
                        format!(
                            "Option -{key} (--{canonical}) takes a value and cannot be combined with other flags"
                        ),
                        json!({
                            "flag": key,
                            "option": canonical,
                            "type": option.value_type.label(),
                        }),
                    ));
                }
            }
        }
        Ok(())
    }

    fn bind_arguments(&self, argv: &[String], check_required: bool) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(argv.len().max(self.arguments.len()));
        let mut missing = Vec::new();

        for (index, (arg_name, argument)) in self.arguments.iter().enumerate() {
            if argument.is_wildcard() {
                for raw in argv.iter().skip(index) {
                    values.push(convert_value(&Value::from(raw), &argument.value_type, arg_name)?);
                }
                if argument.required && argv.len() <= index {
                    missing.push(arg_name.as_str());
                }
            } else if let Some(raw) = argv.get(index) {
                values.push(convert_value(&Value::from(raw), &argument.value_type, arg_name)?);
            } else {
                if argument.required {
                    missing.push(arg_name.as_str());
                }
                values.push(argument.get_default().clone());
            }
        }

        if !self.arguments.contains_key(WILDCARD) && argv.len() > self.arguments.len() {
            debug!(
                command = %self.name,
                dropped = argv.len() - self.arguments.len(),
                "Ignoring undeclared positional values"
            );
        }

        if check_required && !missing.is_empty() {
            let expected: Vec<&str> = self
                .arguments
                .values()
                .filter(|a| a.required)
                .map(|a| a.name.as_str())
                .collect();
            return Err(CommandError::with_kind(
                ErrorKind::MissingRequiredArguments,
                format!("Missing required arguments: {}", missing.join(", ")),
                json!({
                    "command": self.name,
                    "missing": missing,
                    "expected": expected,
                    "provided": argv,
                }),
            ));
        }

        Ok(values)
    }

    /// Returns the help text. Callers decide whether to print it.
    pub fn run_help(&self) -> String {
        self.generate_help()
    }

    /// Renders help with the default [`PaddedTable`] layout.
    pub fn generate_help(&self) -> String {
        self.generate_help_with(&PaddedTable::default())
    }

    /// Renders help: usage, description, then tables of arguments, options
    /// and subcommands.
    pub fn generate_help_with(&self, table: &dyn TableFormat) -> String {
        let mut lines = vec![format!("Usage: {}", self.usage_line()), String::new()];

        if !self.help.is_empty() {
            lines.push(self.help.clone());
            lines.push(String::new());
        }

        if !self.arguments.is_empty() {
            lines.push("Arguments:".to_string());
            let rows: Vec<Vec<String>> = self
                .arguments
                .values()
                .map(|arg| {
                    let record = arg.to_object();
                    vec![
                        format!("  {}", argument_placeholder(arg)),
                        format!("{}{}", record.help, record.default_text),
                    ]
                })
                .collect();
            lines.extend(table.render(&rows));
            lines.push(String::new());
        }

        if !self.options.is_empty() {
            lines.push("Options:".to_string());
            let rows: Vec<Vec<String>> = self
                .options
                .values()
                .map(|opt| {
                    let record = opt.to_object();
                    let mut flag = format!("  --{}", record.name);
                    if let Some(alias) = record.alias {
                        flag.push_str(&format!(", -{alias}"));
                    }
                    vec![flag, format!("{}{}", record.help, record.default_text)]
                })
                .collect();
            lines.extend(table.render(&rows));
            lines.push(String::new());
        }

        if !self.subcommands.is_empty() {
            lines.push("Subcommands:".to_string());
            let rows: Vec<Vec<String>> = self
                .subcommands
                .values()
                .map(|sub| {
                    let help = if sub.help.is_empty() {
                        "No description"
                    } else {
                        sub.help.as_str()
                    };
                    vec![format!("  {}", sub.name), format!(" - {help}")]
                })
                .collect();
            lines.extend(table.render(&rows));
            lines.push(String::new());
        }

        lines.join("\n")
    }

    fn usage_line(&self) -> String {
        if !self.usage.is_empty() {
            return self.usage.clone();
        }
        let mut usage = self.name.clone();
        for option in self.options.keys() {
            usage.push_str(&format!(" [--{option}]"));
        }
        for argument in self.arguments.values() {
            usage.push(' ');
            usage.push_str(&argument_placeholder(argument));
        }
        usage
    }
}

fn argument_placeholder(argument: &CommandOption) -> String {
    if argument.is_wildcard() {
        "[args...]".to_string()
    } else if argument.is_optional() {
        format!("[{}]", argument.name)
    } else {
        format!("<{}>", argument.name)
    }
}

fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('-') || name.contains(char::is_whitespace) {
        return Err(CommandError::invalid_declaration(
            format!("Invalid {kind} name: {name:?}"),
            json!({ "kind": kind, "name": name }),
        ));
    }
    Ok(())
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.generate_help())
    }
}

/// Collects declarations and validates them into a [`Command`].
///
/// Options, arguments and subcommands are registered in the order given;
/// the built-in `help`/`version` flags are added last.
#[derive(Debug, Default)]
pub struct CommandBuilder {
    name: String,
    help: String,
    usage: String,
    options: Vec<CommandOption>,
    arguments: Vec<CommandOption>,
    subcommands: Vec<Command>,
    strict_subcommands: bool,
}

impl CommandBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Overrides the generated usage line.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn option(mut self, option: impl Into<CommandOption>) -> Self {
        self.options.push(option.into());
        self
    }

    pub fn argument(mut self, argument: impl Into<CommandOption>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    pub fn subcommand(mut self, subcommand: Command) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    /// When set, a first positional token that names no subcommand is an
    /// [`ErrorKind::UnknownSubcommand`] error instead of a plain argument.
    pub fn strict_subcommands(mut self, strict: bool) -> Self {
        self.strict_subcommands = strict;
        self
    }

    /// Validates every declaration and runs [`Command::init`].
    ///
    /// # Errors
    ///
    /// The first [`ErrorKind::InvalidDeclaration`] found.
    pub fn build(self) -> Result<Command> {
        let mut command = Command {
            name: self.name,
            help: self.help,
            usage: self.usage,
            strict_subcommands: self.strict_subcommands,
            ..Default::default()
        };
        for option in self.options {
            command.add_option(option)?;
        }
        for argument in self.arguments {
            command.add_argument(argument)?;
        }
        for subcommand in self.subcommands {
            command.add_subcommand(subcommand)?;
        }
        command.init();
        Ok(command)
    }
}
