//! Declarative command trees loaded from YAML or JSON.
//!
//! A declaration file describes a [`Command`](cmdtree_core::Command) and
//! its subcommands; [`CommandLoader`] normalizes every option shape,
//! resolves type names through a [`TypeRegistry`] and builds the validated
//! tree.
//!
//! # Example
//!
//! ```
//! use cmdtree_config::CommandLoader;
//! use cmdtree_core::Value;
//!
//! let yaml = r#"
//! name: git
//! help: Version control
//! strict_subcommands: true
//! options:
//!   verbose: [Boolean, false, "Verbose output", v]
//! subcommands:
//!   - name: commit
//!     options:
//!       message: { type: String, alias: m }
//! "#;
//! let git = CommandLoader::new().from_yaml_str(yaml).unwrap();
//!
//! let msg = git.parse(r#"git commit -m "Initial commit""#).unwrap();
//! let commit = msg.sub_command_message().unwrap();
//! assert_eq!(commit.opt("message"), Some(&Value::from("Initial commit")));
//! assert!(git.parse("git comit").is_err());
//! ```

mod decl;
mod error;
mod loader;
mod registry;

pub use decl::{CommandConfig, Declarations, OptionDecl, OptionFields, TypeDecl};
pub use error::{ConfigError, Result};
pub use loader::CommandLoader;
pub use registry::TypeRegistry;
