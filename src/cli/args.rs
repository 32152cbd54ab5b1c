//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Konstruct - Kubernetes application configuration, generated libraries,
/// and versioned template dependencies
#[derive(Parser, Debug)]
#[command(name = "kst")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if kst was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a konstruct application
    #[command(
        long_about = "Initialize a konstruct application in a new directory.\n\n\
            Generates a typed template library from a Kubernetes API schema and \
            scaffolds the application tree. By default the schema comes from the \
            cluster of the current kubeconfig context; with no reachable cluster \
            a pinned release schema is used.",
        after_help = "\
EXAMPLES:
    # Initialize using the current cluster context
    kst init guestbook

    # Initialize against a pinned Kubernetes release
    kst init guestbook --api-spec version:v1.7.1

    # Initialize from a local OpenAPI specification
    kst init guestbook --api-spec file:swagger.json"
    )]
    Init {
        /// Name of the application directory to create
        name: String,

        /// Schema origin: 'version:<tag>' or 'file:<path>'
        #[arg(long)]
        api_spec: Option<String>,
    },

    /// Manage library dependencies
    #[command(subcommand)]
    Dep(DepCommand),

    /// Manage generated libraries
    #[command(subcommand)]
    Lib(LibCommand),

    /// Inspect configured registries
    #[command(subcommand)]
    Registry(RegistryCommand),
}

/// Dependency subcommands.
#[derive(Subcommand, Debug)]
pub enum DepCommand {
    /// Declare a dependency and vendor it
    #[command(after_help = "\
EXAMPLES:
    # Latest published version from the highest-priority registry
    kst dep add nginx

    # Exact version from a specific registry
    kst dep add nginx@0.0.2 --registry incubator")]
    Add {
        /// Library to add, as 'name' or 'name@version'
        spec: String,

        /// Resolve only against this registry
        #[arg(long)]
        registry: Option<String>,
    },

    /// Remove a declared dependency
    Remove {
        /// Library name to remove
        name: String,
    },

    /// List resolved dependencies from the lockfile
    List,
}

/// Generated-library subcommands.
#[derive(Subcommand, Debug)]
pub enum LibCommand {
    /// Regenerate an environment's typed library from a schema
    Generate {
        /// Schema origin: 'version:<tag>' or 'file:<path>'
        #[arg(long)]
        api_spec: String,

        /// Environment whose library to regenerate
        #[arg(long, default_value = "default")]
        env: String,
    },
}

/// Registry subcommands.
#[derive(Subcommand, Debug)]
pub enum RegistryCommand {
    /// List configured registries
    List,

    /// Show a registry's published index
    Describe {
        /// Configured registry name
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_init_with_api_spec() {
        let cli = Cli::try_parse_from(["kst", "init", "guestbook", "--api-spec", "file:s.json"])
            .unwrap();
        match cli.command {
            Command::Init { name, api_spec } => {
                assert_eq!(name, "guestbook");
                assert_eq!(api_spec.as_deref(), Some("file:s.json"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_dep_add_with_registry() {
        let cli = Cli::try_parse_from(["kst", "dep", "add", "nginx@0.0.2", "--registry", "incubator"])
            .unwrap();
        match cli.command {
            Command::Dep(DepCommand::Add { spec, registry }) => {
                assert_eq!(spec, "nginx@0.0.2");
                assert_eq!(registry.as_deref(), Some("incubator"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn lib_generate_defaults_env() {
        let cli =
            Cli::try_parse_from(["kst", "lib", "generate", "--api-spec", "version:v1.7.0"]).unwrap();
        match cli.command {
            Command::Lib(LibCommand::Generate { env, .. }) => assert_eq!(env, "default"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn global_flags_parse_anywhere() {
        let cli = Cli::try_parse_from(["kst", "dep", "list", "--quiet", "--debug"]).unwrap();
        assert!(cli.quiet);
        assert!(cli.debug);
    }
}
