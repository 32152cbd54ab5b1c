//! cli
//!
//! Command-line interface layer for Konstruct.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Format typed core errors as one-line diagnostics
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches into
//! [`crate::app`]; all algorithms live in the core modules, which never
//! print. This is the only layer that writes to stdout.

pub mod args;
pub mod commands;

pub use args::Cli;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    init_tracing(cli.debug);

    let ctx = commands::Context {
        cwd: cli.cwd.clone(),
        quiet: cli.quiet,
    };
    commands::dispatch(cli.command, &ctx)
}

/// Initialize the tracing subscriber.
///
/// `--debug` escalates this crate to debug level; otherwise `RUST_LOG`
/// applies, defaulting to warnings only.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("warn,konstruct=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
