//! Serde shapes of a declarative command tree.
//!
//! A tree is a [`CommandConfig`] whose `options` and `arguments` are either a
//! map keyed by name or a list of named declarations. Each entry is one of
//! three [`OptionDecl`] shapes:
//!
//! ```yaml
//! options:
//!   file: "Input file"                  # help text, String type, "" default
//!   count: [Number, 10, "How many", c]  # type, default, help, alias
//!   format: { type: [json, yaml], def: json, alias: f }
//! arguments:
//!   - target                            # name only
//!   - [source, String, null, "Source path", true]  # trailing bool = required
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// One command node as written in a YAML or JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandConfig {
    pub name: String,
    #[serde(default)]
    pub help: String,
    #[serde(default)]
    pub usage: String,
    #[serde(default)]
    pub strict_subcommands: bool,
    #[serde(default)]
    pub options: Declarations,
    #[serde(default)]
    pub arguments: Declarations,
    #[serde(default)]
    pub subcommands: Vec<CommandConfig>,
}

/// Options or arguments, keyed by name or listed in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Declarations {
    Map(IndexMap<String, OptionDecl>),
    List(Vec<OptionDecl>),
}

impl Default for Declarations {
    fn default() -> Self {
        Self::Map(IndexMap::new())
    }
}

impl Declarations {
    /// Entries in declaration order, with the map key when there is one.
    pub fn entries(&self) -> Vec<(Option<&str>, &OptionDecl)> {
        match self {
            Self::Map(map) => map
                .iter()
                .map(|(key, decl)| (Some(key.as_str()), decl))
                .collect(),
            Self::List(list) => list.iter().map(|decl| (None, decl)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Map(map) => map.len(),
            Self::List(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single option or argument declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionDecl {
    /// Under a map key: the help text. In a list: the name.
    Text(String),
    /// `[name?, type, default, help, alias | required]`; the name slot is
    /// absent under a map key.
    Tuple(Vec<Json>),
    Fields(OptionFields),
}

/// Named-field form of an [`OptionDecl`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<TypeDecl>,
    #[serde(default, alias = "def", skip_serializing_if = "Option::is_none")]
    pub default: Option<Json>,
    #[serde(default)]
    pub help: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// A registered type name or an inline list of allowed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeDecl {
    Named(String),
    Enum(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_and_list_shapes_deserialize() {
        let yaml = r#"
name: tool
options:
  file: "Input file"
  count: [Number, 10, "How many", c]
  format: { type: [json, yaml], def: json }
arguments:
  - target
  - [source, String, null, "Source path", true]
  - { name: rest, type: String }
"#;
        let config: CommandConfig = serde_yaml::from_str(yaml).unwrap();

        let options = config.options.entries();
        assert_eq!(options.len(), 3);
        assert_eq!(options[0], (Some("file"), &OptionDecl::Text("Input file".into())));
        assert!(matches!(options[1].1, OptionDecl::Tuple(items) if items.len() == 4));
        match options[2].1 {
            OptionDecl::Fields(fields) => {
                assert_eq!(
                    fields.value_type,
                    Some(TypeDecl::Enum(vec!["json".into(), "yaml".into()]))
                );
                assert_eq!(fields.default, Some(Json::from("json")));
            }
            other => panic!("expected fields, got {other:?}"),
        }

        let arguments = config.arguments.entries();
        assert!(matches!(arguments[0], (None, OptionDecl::Text(name)) if name == "target"));
        assert!(matches!(arguments[2].1, OptionDecl::Fields(_)));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = serde_yaml::from_str::<CommandConfig>("name: x\nflags: {}\n").unwrap_err();
        assert!(err.to_string().contains("flags"));
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let config: CommandConfig = serde_json::from_str(r#"{"name": "x"}"#).unwrap();
        assert!(config.options.is_empty());
        assert!(config.arguments.is_empty());
        assert!(config.subcommands.is_empty());
        assert!(!config.strict_subcommands);
    }
}
