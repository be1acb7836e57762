use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use cmdtree_config::{CommandLoader, ConfigError};
use cmdtree_core::{Argv, Command, CommandError, CommandMessage, tokenize};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Output format for parsed messages.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum CliOutputFormat {
    #[default]
    Json,
    Yaml,
    Text,
}

#[derive(Debug, Parser)]
#[command(name = "cmdtree", version, disable_help_subcommand = true)]
#[command(about = "Tokenize and parse command lines against declared command trees")]
struct Cli {
    /// Log parser decisions to stderr.
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Split a command line into tokens and print them as JSON.
    Tokenize(TokenizeArgs),
    /// Parse a command line against a declaration file.
    Parse(ParseArgs),
    /// Print help for a declared command or one of its subcommands.
    Help(HelpArgs),
    /// Load a declaration file and report the command tree.
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
struct TokenizeArgs {
    /// Raw command line, quoted as one shell argument.
    input: String,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// YAML or JSON declaration file.
    #[arg(long)]
    config: PathBuf,
    /// Output format.
    #[arg(long, value_enum, default_value_t = CliOutputFormat::Json)]
    format: CliOutputFormat,
    /// Raw command line to parse, tokenized with quote handling.
    #[arg(long, conflicts_with = "args")]
    line: Option<String>,
    /// Pre-split command line, starting with the command name.
    #[arg(last = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct HelpArgs {
    /// YAML or JSON declaration file.
    #[arg(long)]
    config: PathBuf,
    /// Subcommand path, e.g. `remote add`.
    path: Vec<String>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// YAML or JSON declaration file.
    #[arg(long)]
    config: PathBuf,
}

/// A failed run: parse errors exit with 2, everything else with 1.
#[derive(Debug)]
enum Failure {
    Parse(CommandError),
    Other(String),
}

impl Failure {
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Parse(_) => ExitCode::from(2),
            Self::Other(_) => ExitCode::from(1),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "{err}"),
            Self::Other(message) => f.write_str(message),
        }
    }
}

impl From<CommandError> for Failure {
    fn from(err: CommandError) -> Self {
        Self::Parse(err)
    }
}

impl From<ConfigError> for Failure {
    fn from(err: ConfigError) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Self::Other(message)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = match cli.command {
        CliCommand::Tokenize(args) => run_tokenize(args),
        CliCommand::Parse(args) => run_parse(args),
        CliCommand::Help(args) => run_help(args),
        CliCommand::Validate(args) => run_validate(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            err.exit_code()
        }
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load(config: &Path) -> Result<Command, Failure> {
    let command = CommandLoader::new().load_path(config)?;
    debug!(command = command.name(), config = %config.display(), "Loaded command tree");
    Ok(command)
}

fn run_tokenize(args: TokenizeArgs) -> Result<(), Failure> {
    let tokens = tokenize(&args.input)?;
    let json = serde_json::to_string_pretty(&tokens)
        .map_err(|e| format!("Failed to serialize tokens: {e}"))?;
    println!("{json}");
    Ok(())
}

fn run_parse(args: ParseArgs) -> Result<(), Failure> {
    let command = load(&args.config)?;
    let message = match args.line {
        Some(line) => command.parse(line)?,
        None if args.args.is_empty() => {
            return Err(Failure::Other(
                "nothing to parse: pass --line or arguments after --".to_string(),
            ));
        }
        None => command.parse(Argv::from_tokens(args.args))?,
    };
    print!("{}", format_message(&message, args.format)?);
    Ok(())
}

fn format_message(message: &CommandMessage, format: CliOutputFormat) -> Result<String, String> {
    match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(&message.to_json())
            .map(|json| format!("{json}\n"))
            .map_err(|e| format!("Failed to serialize message: {e}")),
        CliOutputFormat::Yaml => serde_yaml::to_string(message)
            .map_err(|e| format!("Failed to serialize message: {e}")),
        CliOutputFormat::Text => Ok(format!("{message}\n")),
    }
}

fn run_help(args: HelpArgs) -> Result<(), Failure> {
    let root = load(&args.config)?;
    let command = root.find_command(&args.path).ok_or_else(|| {
        format!(
            "'{}' has no subcommand path '{}'",
            root.name(),
            args.path.join(" ")
        )
    })?;
    println!("{}", command.generate_help());
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), Failure> {
    let command = load(&args.config)?;
    let totals = TreeTotals::of(&command);
    println!(
        "Validated command tree '{}': {} command(s), {} option(s), {} argument(s).",
        command.name(),
        totals.commands,
        totals.options,
        totals.arguments
    );
    Ok(())
}

#[derive(Debug, Default)]
struct TreeTotals {
    commands: usize,
    options: usize,
    arguments: usize,
}

impl TreeTotals {
    fn of(command: &Command) -> Self {
        let mut totals = Self::default();
        totals.add(command);
        totals
    }

    fn add(&mut self, command: &Command) {
        self.commands += 1;
        self.options += command.options().len();
        self.arguments += command.arguments().len();
        for subcommand in command.subcommands().values() {
            self.add(subcommand);
        }
    }
}
