//! init command - Initialize a konstruct application

use anyhow::{Context as _, Result};

use super::{runtime, Context};
use crate::app::{self, InitOptions};
use crate::schema::SchemaSpecifier;

/// Initialize a new application directory.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `name` - Name of the application directory to create
/// * `api_spec` - Optional schema specifier string
pub fn init(ctx: &Context, name: &str, api_spec: Option<&str>) -> Result<()> {
    let root = ctx.workdir()?.join(name);

    let api_spec = api_spec
        .map(SchemaSpecifier::parse)
        .transpose()
        .context("invalid --api-spec")?;

    let rt = runtime()?;
    let summary = rt.block_on(app::init(
        &root,
        InitOptions {
            api_spec,
            kubeconfig: None,
        },
    ))?;

    if !ctx.quiet {
        println!(
            "Initialized application at {} (schema {})",
            summary.root.display(),
            summary.schema_version
        );
        if let Some(server) = &summary.server {
            match &summary.namespace {
                Some(namespace) => {
                    println!("Default environment targets {} ({})", server, namespace)
                }
                None => println!("Default environment targets {}", server),
            }
        }
    }
    Ok(())
}
