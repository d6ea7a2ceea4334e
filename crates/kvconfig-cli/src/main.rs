//! kvconfig CLI
//!
//! Resolves Azure Key Vault references in JSON and YAML documents using the
//! Azure CLI login session.

// CLI binary needs to output to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

use kvconfig_cli::cli::{self, Command, EXIT_OK, exit_code_for, render_error, write_output};
use kvconfig_cli::commands;

fn main() {
    let cli = cli::parse();

    // Logs go to stderr so stdout stays a clean document
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };

    let result = runtime
        .block_on(async {
            match cli.command {
                Command::Resolve(args) => commands::resolve(args).await,
                Command::Check(args) => commands::check(args).await.map(Some),
            }
        })
        .and_then(|output| match output {
            Some(text) => write_output(&mut std::io::stdout().lock(), &text),
            None => Ok(()),
        });

    match result {
        Ok(()) => std::process::exit(EXIT_OK),
        Err(err) => {
            let code = exit_code_for(&err);
            render_error(err);
            std::process::exit(code);
        }
    }
}
