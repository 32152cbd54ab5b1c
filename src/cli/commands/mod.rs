//! cli::commands
//!
//! Command handlers: thin glue between parsed arguments and the app layer.

mod dep;
mod init;
mod lib_cmd;
mod registry_cmd;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::args::{Command, DepCommand, LibCommand, RegistryCommand};

/// Execution context shared by all commands.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Run as if started in this directory.
    pub cwd: Option<PathBuf>,
    /// Minimal output.
    pub quiet: bool,
}

impl Context {
    /// The effective working directory.
    pub fn workdir(&self) -> Result<PathBuf> {
        match &self.cwd {
            Some(cwd) => Ok(cwd.clone()),
            None => std::env::current_dir().context("cannot determine working directory"),
        }
    }
}

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init { name, api_spec } => init::init(ctx, &name, api_spec.as_deref()),
        Command::Dep(DepCommand::Add { spec, registry }) => {
            dep::add(ctx, &spec, registry.as_deref())
        }
        Command::Dep(DepCommand::Remove { name }) => dep::remove(ctx, &name),
        Command::Dep(DepCommand::List) => dep::list(ctx),
        Command::Lib(LibCommand::Generate { api_spec, env }) => {
            lib_cmd::generate(ctx, &api_spec, &env)
        }
        Command::Registry(RegistryCommand::List) => registry_cmd::list(ctx),
        Command::Registry(RegistryCommand::Describe { name }) => registry_cmd::describe(ctx, &name),
    }
}

/// Build the single-threaded runtime commands use for async core work.
///
/// Commands are one-shot, so a current-thread runtime per invocation keeps
/// the dispatch layer synchronous without a process-wide executor.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")
}
