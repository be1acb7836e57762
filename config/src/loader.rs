//! Building [`Command`] trees from declarations.
//!
//! ```no_run
//! use cmdtree_config::CommandLoader;
//! use cmdtree_core::ValueType;
//!
//! let git = CommandLoader::new()
//!     .with_type("Port", ValueType::parsed::<u16>())
//!     .load_path("commands/git.yaml")
//!     .unwrap();
//! let msg = git.parse("git commit -m 'Initial commit'").unwrap();
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use cmdtree_core::{Command, CommandOption, Value, ValueType};
use serde_json::Value as Json;
use tracing::debug;

use crate::decl::{CommandConfig, OptionDecl, OptionFields, TypeDecl};
use crate::error::{ConfigError, Result};
use crate::registry::TypeRegistry;

/// Turns [`CommandConfig`] declarations into validated [`Command`] trees,
/// resolving type names through a [`TypeRegistry`].
#[derive(Debug, Clone, Default)]
pub struct CommandLoader {
    registry: TypeRegistry,
}

impl CommandLoader {
    /// A loader knowing only the built-in type names.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: TypeRegistry) -> Self {
        Self { registry }
    }

    /// Registers a custom type name.
    pub fn with_type(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.registry.register(name, value_type);
        self
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Reads a declaration file. `.json` files are read as JSON, anything
    /// else as YAML.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be opened,
    /// [`ConfigError::Json`] or [`ConfigError::Yaml`] if it does not parse.
    pub fn read_config(path: impl AsRef<Path>) -> Result<CommandConfig> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: CommandConfig = if path.extension().and_then(|e| e.to_str()) == Some("json") {
            serde_json::from_reader(reader)?
        } else {
            serde_yaml::from_reader(reader)?
        };
        debug!(path = %path.display(), "Read command declaration");
        Ok(config)
    }

    /// Reads and builds a declaration file.
    ///
    /// # Errors
    ///
    /// Anything [`read_config`](Self::read_config) or
    /// [`build`](Self::build) returns.
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<Command> {
        let config = Self::read_config(path)?;
        self.build(&config)
    }

    pub fn from_yaml_str(&self, yaml: &str) -> Result<Command> {
        let config: CommandConfig = serde_yaml::from_str(yaml)?;
        self.build(&config)
    }

    pub fn from_json_str(&self, json: &str) -> Result<Command> {
        let config: CommandConfig = serde_json::from_str(json)?;
        self.build(&config)
    }

    /// Builds a command and, recursively, its subcommands.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidDeclaration`] for a missing command name or a
    ///   malformed option shape.
    /// - [`ConfigError::UnknownType`] for an unregistered type name.
    /// - [`ConfigError::Command`] when the tree itself rejects a declaration.
    pub fn build(&self, config: &CommandConfig) -> Result<Command> {
        if config.name.is_empty() {
            return Err(ConfigError::InvalidDeclaration(
                "command name is required".to_string(),
            ));
        }
        debug!(
            command = %config.name,
            options = config.options.len(),
            arguments = config.arguments.len(),
            subcommands = config.subcommands.len(),
            "Building command"
        );

        let mut builder = Command::builder(&config.name)
            .help(&config.help)
            .usage(&config.usage)
            .strict_subcommands(config.strict_subcommands);
        for (key, decl) in config.options.entries() {
            builder = builder.option(self.option(key, decl)?);
        }
        for (key, decl) in config.arguments.entries() {
            builder = builder.argument(self.option(key, decl)?);
        }
        for subcommand in &config.subcommands {
            builder = builder.subcommand(self.build(subcommand)?);
        }
        Ok(builder.build()?)
    }

    /// Normalizes one declaration. `key` is the map key, if any.
    pub fn option(&self, key: Option<&str>, decl: &OptionDecl) -> Result<CommandOption> {
        match decl {
            OptionDecl::Text(text) => Ok(match key {
                Some(name) => CommandOption::string(name).with_help(text),
                None => CommandOption::string(text),
            }),
            OptionDecl::Tuple(items) => self.tuple_option(key, items),
            OptionDecl::Fields(fields) => self.fields_option(key, fields),
        }
    }

    fn tuple_option(&self, key: Option<&str>, items: &[Json]) -> Result<CommandOption> {
        let (name, slots) = match key {
            Some(name) => (name.to_string(), items),
            None => match items.split_first() {
                Some((Json::String(name), rest)) => (name.clone(), rest),
                _ => {
                    return Err(ConfigError::InvalidDeclaration(format!(
                        "list declaration must start with a name: {}",
                        Json::from(items.to_vec())
                    )));
                }
            },
        };
        if slots.len() > 4 {
            return Err(ConfigError::InvalidDeclaration(format!(
                "too many fields for {name}: expected type, default, help and alias"
            )));
        }

        let default = slots.get(1).map(Value::from_json).unwrap_or_default();
        let value_type = match slots.first() {
            None | Some(Json::Null) => infer_type(&default),
            Some(decl) => {
                let decl: TypeDecl = serde_json::from_value(decl.clone())?;
                self.registry.resolve(&decl)?
            }
        };
        let mut option = CommandOption::new(name, value_type).with_default(default);

        match slots.get(2) {
            None | Some(Json::Null) => {}
            Some(Json::String(help)) => option.help = help.clone(),
            Some(other) => {
                return Err(ConfigError::InvalidDeclaration(format!(
                    "help for {} must be a string, got {other}",
                    option.name
                )));
            }
        }
        match slots.get(3) {
            None | Some(Json::Null) => {}
            Some(Json::String(alias)) => option.alias = Some(parse_alias(&option.name, alias)?),
            Some(Json::Bool(required)) => option.required = *required,
            Some(other) => {
                return Err(ConfigError::InvalidDeclaration(format!(
                    "last field for {} must be an alias or a required flag, got {other}",
                    option.name
                )));
            }
        }
        Ok(option)
    }

    fn fields_option(&self, key: Option<&str>, fields: &OptionFields) -> Result<CommandOption> {
        let name = match (key, fields.name.as_deref()) {
            (Some(key), _) => key.to_string(),
            (None, Some(name)) => name.to_string(),
            (None, None) => {
                return Err(ConfigError::InvalidDeclaration(
                    "listed declaration is missing a name".to_string(),
                ));
            }
        };
        let default = fields.default.as_ref().map(Value::from_json).unwrap_or_default();
        let value_type = match &fields.value_type {
            Some(decl) => self.registry.resolve(decl)?,
            None => infer_type(&default),
        };

        let mut option = CommandOption::new(name, value_type)
            .with_default(default)
            .with_help(&fields.help);
        if let Some(alias) = &fields.alias {
            option.alias = Some(parse_alias(&option.name, alias)?);
        }
        option.required = fields.required;
        Ok(option)
    }
}

/// Untyped declarations take the type of their default.
fn infer_type(default: &Value) -> ValueType {
    match default {
        Value::Bool(_) => ValueType::Bool,
        Value::Number(_) => ValueType::Number,
        _ => ValueType::String,
    }
}

fn parse_alias(name: &str, alias: &str) -> Result<char> {
    let mut chars = alias.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ConfigError::InvalidDeclaration(format!(
            "alias for {name} must be a single character, got {alias:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use cmdtree_core::ErrorKind;

    use super::*;

    fn load(yaml: &str) -> Result<Command> {
        CommandLoader::new().from_yaml_str(yaml)
    }

    #[test]
    fn test_text_declaration_under_key_is_help() {
        let cmd = load("name: x\noptions:\n  file: Input file\n").unwrap();
        let file = cmd.get_option("file").unwrap();
        assert_eq!(file.value_type, ValueType::String);
        assert_eq!(file.default, Value::from(""));
        assert_eq!(file.help, "Input file");
    }

    #[test]
    fn test_tuple_declaration() {
        let cmd = load("name: x\noptions:\n  count: [Number, 10, How many, c]\n").unwrap();
        let count = cmd.get_option("count").unwrap();
        assert_eq!(count.value_type, ValueType::Number);
        assert_eq!(count.default, Value::from(10));
        assert_eq!(count.help, "How many");
        assert_eq!(count.alias, Some('c'));
        assert_eq!(cmd.resolve_alias('c'), Some("count"));
    }

    #[test]
    fn test_tuple_required_slot() {
        let cmd = load("name: x\narguments:\n  - [source, String, null, Source path, true]\n")
            .unwrap();
        let source = cmd.get_argument("source").unwrap();
        assert!(source.required);
        assert!(source.alias.is_none());
        assert!(source.default.is_null());
    }

    #[test]
    fn test_fields_with_def_and_inferred_type() {
        let cmd = load("name: x\noptions:\n  dry: { def: false, alias: d }\n").unwrap();
        let dry = cmd.get_option("dry").unwrap();
        assert_eq!(dry.value_type, ValueType::Bool);
        assert_eq!(dry.default, Value::Bool(false));
    }

    #[test]
    fn test_multi_char_alias_is_rejected() {
        let err = load("name: x\noptions:\n  verbose: [Boolean, false, Verbose, vv]\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDeclaration(_)));
    }

    #[test]
    fn test_list_tuple_without_name_is_rejected() {
        let err = load("name: x\narguments:\n  - [1, 2]\n").unwrap_err();
        assert!(err.to_string().contains("must start with a name"));
    }

    #[test]
    fn test_duplicate_alias_surfaces_command_error() {
        let yaml = "name: x\noptions:\n  all: [Boolean, false, All, a]\n  any: [Boolean, false, Any, a]\n";
        match load(yaml).unwrap_err() {
            ConfigError::Command(err) => assert_eq!(err.kind(), ErrorKind::InvalidDeclaration),
            other => panic!("expected command error, got {other:?}"),
        }
    }

    #[test]
    fn test_custom_type_resolves() {
        let cmd = CommandLoader::new()
            .with_type("Port", ValueType::parsed::<u16>())
            .from_yaml_str("name: serve\noptions:\n  port: { type: Port, alias: p }\n")
            .unwrap();
        let msg = cmd.parse("serve -p 8080").unwrap();
        assert_eq!(msg.opt("port").unwrap().downcast_ref::<u16>(), Some(&8080));
    }

    #[test]
    fn test_missing_name() {
        let err = CommandLoader::new().build(&CommandConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "invalid declaration: command name is required");
    }
}
