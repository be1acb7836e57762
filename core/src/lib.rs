//! Command-line tokenizing, typed options and recursive command trees.
//!
//! The crate turns a raw command line, either one string or a pre-split
//! argv, into a structured [`CommandMessage`]:
//!
//! - [`tokenize`] splits a string on spaces, keeping quoted spans whole.
//! - [`CommandMessage::parse`] classifies tokens into a name, positional
//!   values and options without any declarations.
//! - [`Command`] declares typed [`CommandOption`]s, positional arguments and
//!   nested subcommands, and [`Command::parse`] resolves aliases, coerces
//!   values ([`convert_value`]), fills defaults and checks required
//!   arguments.
//! - [`Command::generate_help`] renders usage and option tables through a
//!   pluggable [`TableFormat`].
//!
//! Every failure is a [`CommandError`] carrying an [`ErrorKind`], a message
//! and a JSON payload describing the offending input.
//!
//! # Example
//!
//! ```
//! use cmdtree_core::*;
//!
//! let serve = Command::builder("serve")
//!     .help("Start the server")
//!     .option(CommandOption::number("port").with_default(8080).with_alias('p'))
//!     .option(CommandOption::new("log", ValueType::enumeration(["info", "debug"])).with_default("info"))
//!     .argument(CommandOption::string("root").required())
//!     .build()
//!     .unwrap();
//! let app = Command::builder("app").subcommand(serve).build().unwrap();
//!
//! let msg = app.parse("app serve ./public -p 3000").unwrap();
//! let serve = msg.sub_command_message().unwrap();
//! assert_eq!(serve.argv(), [Value::from("./public")]);
//! assert_eq!(serve.opt("port"), Some(&Value::from(3000)));
//! assert_eq!(serve.opt("log"), Some(&Value::from("info")));
//!
//! let err = app.parse("app serve").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::MissingRequiredArguments);
//! ```

mod command;
mod convert;
mod error;
mod help;
mod message;
mod option;
mod tokenizer;
mod value;

pub use command::{Command, CommandBuilder, WILDCARD};
pub use convert::convert_value;
pub use error::{BoxError, CommandError, ErrorKind, Result};
pub use help::{PaddedTable, TableFormat};
pub use message::{CommandMessage, Opts};
pub use option::{CommandOption, OptionDisplay, ValueType};
pub use tokenizer::{Argv, IntoArgv, tokenize};
pub use value::{CustomValue, Value};
