//! Command line definitions and error reporting

use clap::{Parser, Subcommand, ValueEnum};
use miette::{Diagnostic, Report};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// Output could not be written exit code
pub const EXIT_OUTPUT: i32 = 1;
/// CLI or configuration error exit code
pub const EXIT_CLI: i32 = 2;
/// Secret resolution error exit code
pub const EXIT_RESOLVE: i32 = 3;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// CLI or configuration error (exit code 2)
    #[error("CLI/configuration error: {message}")]
    #[diagnostic(code(kvconfig::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Writing the result failed (exit code 1)
    #[error("Failed to write output")]
    #[diagnostic(
        code(kvconfig::cli::output),
        help("stdout was closed or is out of space; the document may be truncated")
    )]
    Output {
        /// Underlying write error
        #[source]
        source: io::Error,
    },
    /// Resolution failed (exit code 3)
    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] kvconfig::Error),
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } | CliError::Resolve(kvconfig::Error::Configuration { .. }) => {
            EXIT_CLI
        }
        CliError::Output { .. } => EXIT_OUTPUT,
        CliError::Resolve(_) => EXIT_RESOLVE,
    }
}

/// Write the command's result to `out` and flush it
///
/// # Errors
///
/// Returns [`CliError::Output`] if writing or flushing fails.
pub fn write_output(out: &mut impl Write, text: &str) -> Result<(), CliError> {
    out.write_all(text.as_bytes())
        .and_then(|()| out.flush())
        .map_err(|source| CliError::Output { source })
}

/// Render an error to stderr through miette
#[allow(clippy::print_stderr)]
pub fn render_error(err: CliError) {
    let report = Report::new(err);
    eprintln!("{report:?}");
    // Ensure output is flushed before potential process exit
    let _ = io::stderr().flush();
}

/// Document format
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Format {
    /// JSON document
    Json,
    /// YAML document
    Yaml,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        })
    }
}

/// Resolve Azure Key Vault references in JSON and YAML configuration
#[derive(Parser, Debug)]
#[command(name = "kvconfig", version, about)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replace every secret reference in a document with its value
    Resolve(ResolveArgs),
    /// List the secret references in a document without resolving them
    Check(CheckArgs),
}

/// Arguments for `kvconfig resolve`
#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    /// JSON or YAML document to resolve
    pub file: PathBuf,

    /// Cache resolved secrets on disk, encrypted. Useful during development.
    /// Also enabled by `KVCONFIG_CACHE`.
    #[arg(long)]
    pub cache: bool,

    /// Cache directory, defaults to `KVCONFIG_CACHE_DIR` or the system
    /// temporary directory
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Rewrite FILE instead of printing to stdout
    #[arg(long)]
    pub in_place: bool,

    /// Maximum number of secrets fetched at once
    #[arg(long, default_value_t = kvconfig::DEFAULT_CONCURRENCY, value_name = "N")]
    pub concurrency: usize,

    /// Document format, detected from the file extension when omitted
    #[arg(long, value_enum)]
    pub format: Option<Format>,

    /// Azure CLI executable used to fetch secrets
    #[arg(long, env = "KVCONFIG_AZ", default_value = "az", value_name = "PATH")]
    pub az: PathBuf,
}

/// Arguments for `kvconfig check`
#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// JSON or YAML document to inspect
    pub file: PathBuf,

    /// Document format, detected from the file extension when omitted
    #[arg(long, value_enum)]
    pub format: Option<Format>,
}

/// Parse command line arguments
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
